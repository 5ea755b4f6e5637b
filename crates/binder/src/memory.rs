use std::sync::Arc;

use parking_lot::Mutex;

use crate::surface::{ClickHandler, ElementId, ElementInfo, ElementKind, PageSurface};

/// Description of an element added to a [`MemoryPage`].
#[derive(Clone, Debug)]
pub struct ElementSpec {
    pub kind: ElementKind,
    pub label: String,
    /// Selector patterns this element matches; the memory page matches
    /// selectors literally.
    pub selectors: Vec<String>,
    pub href: Option<String>,
    pub inline_trigger: Option<String>,
}

struct ElementState {
    spec: ElementSpec,
    title: Option<String>,
    handler: Option<Arc<dyn ClickHandler>>,
    suppress_default: bool,
    handler_attaches: usize,
    default_navigations: usize,
}

/// In-memory page surface for unit tests and the demo CLI.
///
/// Ids are assigned in insertion order, which doubles as document order.
#[derive(Default)]
pub struct MemoryPage {
    elements: Mutex<Vec<ElementState>>,
}

impl MemoryPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, spec: ElementSpec) -> ElementId {
        let mut elements = self.elements.lock();
        elements.push(ElementState {
            spec,
            title: None,
            handler: None,
            suppress_default: false,
            handler_attaches: 0,
            default_navigations: 0,
        });
        ElementId(elements.len() as u64 - 1)
    }

    /// Deliver a synthetic click. Falls back to the default action (a
    /// navigation for anchors) when no handler is attached or navigation is
    /// not suppressed.
    pub async fn click(&self, id: ElementId) {
        let handler = {
            let mut elements = self.elements.lock();
            let Some(element) = elements.get_mut(id.0 as usize) else {
                return;
            };
            let handler = element.handler.clone();
            if element.spec.href.is_some() && (handler.is_none() || !element.suppress_default) {
                element.default_navigations += 1;
            }
            handler
        };
        if let Some(handler) = handler {
            handler.click().await;
        }
    }

    pub fn label(&self, id: ElementId) -> Option<String> {
        self.elements
            .lock()
            .get(id.0 as usize)
            .map(|e| e.spec.label.clone())
    }

    pub fn title(&self, id: ElementId) -> Option<String> {
        self.elements
            .lock()
            .get(id.0 as usize)
            .and_then(|e| e.title.clone())
    }

    pub fn inline_trigger(&self, id: ElementId) -> Option<String> {
        self.elements
            .lock()
            .get(id.0 as usize)
            .and_then(|e| e.spec.inline_trigger.clone())
    }

    pub fn handler_attach_count(&self, id: ElementId) -> usize {
        self.elements
            .lock()
            .get(id.0 as usize)
            .map(|e| e.handler_attaches)
            .unwrap_or(0)
    }

    pub fn default_navigation_count(&self, id: ElementId) -> usize {
        self.elements
            .lock()
            .get(id.0 as usize)
            .map(|e| e.default_navigations)
            .unwrap_or(0)
    }

    pub fn element_count(&self) -> usize {
        self.elements.lock().len()
    }
}

impl PageSurface for MemoryPage {
    fn select(&self, selector: &str) -> Vec<ElementId> {
        self.elements
            .lock()
            .iter()
            .enumerate()
            .filter(|(_, e)| e.spec.selectors.iter().any(|s| s == selector))
            .map(|(idx, _)| ElementId(idx as u64))
            .collect()
    }

    fn info(&self, id: ElementId) -> Option<ElementInfo> {
        self.elements.lock().get(id.0 as usize).map(|e| ElementInfo {
            kind: e.spec.kind,
            label: e.spec.label.clone(),
            href: e.spec.href.clone(),
        })
    }

    fn clear_inline_trigger(&self, id: ElementId) {
        if let Some(element) = self.elements.lock().get_mut(id.0 as usize) {
            element.spec.inline_trigger = None;
        }
    }

    fn set_click_handler(
        &self,
        id: ElementId,
        handler: Arc<dyn ClickHandler>,
        suppress_default: bool,
    ) {
        if let Some(element) = self.elements.lock().get_mut(id.0 as usize) {
            element.handler = Some(handler);
            element.suppress_default = suppress_default;
            element.handler_attaches += 1;
        }
    }

    fn rewrite_label(&self, id: ElementId, from: &str, to: &str, title: &str) {
        if let Some(element) = self.elements.lock().get_mut(id.0 as usize) {
            element.spec.label = element.spec.label.replace(from, to);
            element.title = Some(title.to_string());
        }
    }
}
