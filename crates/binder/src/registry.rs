use dashmap::DashSet;

use crate::surface::ElementId;

/// Typed already-bound registry keyed by stable element identity.
///
/// Once an element is marked it stays marked for the life of the page;
/// repeated scans and re-entrant `bind_all` calls see the same set.
#[derive(Debug, Default)]
pub struct BindRegistry {
    bound: DashSet<ElementId>,
}

impl BindRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim an element. Returns `true` exactly once per element; the
    /// caller that gets `true` owns the enhancement.
    pub fn mark(&self, id: ElementId) -> bool {
        self.bound.insert(id)
    }

    pub fn is_bound(&self, id: ElementId) -> bool {
        self.bound.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.bound.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }
}
