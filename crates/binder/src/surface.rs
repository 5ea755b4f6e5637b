use std::sync::Arc;

use async_trait::async_trait;

use chatbridge_core_types::{ActionContext, TriggerSource};

/// Stable element identity. Ids are assigned in document order, so sorting
/// by id restores document order after a multi-selector scan.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ElementKind {
    Anchor,
    Button,
    Other,
}

impl ElementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ElementKind::Anchor => "anchor",
            ElementKind::Button => "button",
            ElementKind::Other => "other",
        }
    }
}

#[derive(Clone, Debug)]
pub struct ElementInfo {
    pub kind: ElementKind,
    pub label: String,
    pub href: Option<String>,
}

/// Where bound clicks are delivered; the embedder wires the dispatcher in.
/// Implementations absorb their own failures; nothing propagates back to
/// the click site.
#[async_trait]
pub trait TriggerSink: Send + Sync {
    async fn trigger(&self, source: TriggerSource, context: ActionContext);
}

/// A fully-formed click handler as stored on an element.
#[async_trait]
pub trait ClickHandler: Send + Sync {
    async fn click(&self);
}

/// The page surface consumed by the binder.
pub trait PageSurface: Send + Sync {
    /// Elements matching the selector, in document order.
    fn select(&self, selector: &str) -> Vec<ElementId>;
    fn info(&self, id: ElementId) -> Option<ElementInfo>;
    /// Remove a pre-existing inline trigger so the bound handler cannot
    /// double-fire.
    fn clear_inline_trigger(&self, id: ElementId);
    /// Attach the handler; `suppress_default` drops the element's default
    /// action (e.g. link navigation) when the handler fires.
    fn set_click_handler(
        &self,
        id: ElementId,
        handler: Arc<dyn ClickHandler>,
        suppress_default: bool,
    );
    /// Replace `from` with `to` in the visible label and set the
    /// accessibility title.
    fn rewrite_label(&self, id: ElementId, from: &str, to: &str, title: &str);
}
