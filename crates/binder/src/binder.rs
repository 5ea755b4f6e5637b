use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use chatbridge_core_types::{ActionContext, TriggerSource};

use crate::policy::BindPolicy;
use crate::registry::BindRegistry;
use crate::surface::{ClickHandler, PageSurface, TriggerSink};

/// Discovers contact elements and enhances each exactly once.
pub struct EnhancementBinder {
    policy: BindPolicy,
    registry: BindRegistry,
    sink: Arc<dyn TriggerSink>,
}

/// Click handler bound to one element: fixed source and context captured at
/// bind time, delivered to the sink on every click.
struct ElementHandler {
    sink: Arc<dyn TriggerSink>,
    source: TriggerSource,
    context: ActionContext,
}

#[async_trait]
impl ClickHandler for ElementHandler {
    async fn click(&self) {
        self.sink
            .trigger(self.source.clone(), self.context.clone())
            .await;
    }
}

impl EnhancementBinder {
    pub fn new(policy: BindPolicy, sink: Arc<dyn TriggerSink>) -> Self {
        Self {
            policy,
            registry: BindRegistry::new(),
            sink,
        }
    }

    pub fn registry(&self) -> &BindRegistry {
        &self.registry
    }

    /// Scan the page and enhance every matching element not yet bound.
    ///
    /// Elements matching several selectors are processed once, in document
    /// order. The registry marker is set before any behavior is attached,
    /// so a re-entrant scan can never double-bind. Returns the count newly
    /// bound by this call.
    pub fn bind_all(&self, page: &dyn PageSurface) -> usize {
        let mut seen = HashSet::new();
        let mut matched = Vec::new();
        for selector in &self.policy.selectors {
            for id in page.select(selector) {
                if seen.insert(id) {
                    matched.push(id);
                }
            }
        }
        matched.sort_unstable();

        let mut bound = 0usize;
        for (index, &id) in matched.iter().enumerate() {
            if !self.registry.mark(id) {
                continue;
            }
            let Some(element) = page.info(id) else {
                // Vanished between select and info; the marker stays set.
                continue;
            };

            page.clear_inline_trigger(id);

            let context = ActionContext::new()
                .with("elementIndex", index)
                .with("elementKind", element.kind.as_str())
                .with("elementLabel", element.label.clone());
            page.set_click_handler(
                id,
                Arc::new(ElementHandler {
                    sink: Arc::clone(&self.sink),
                    source: TriggerSource::ContactButton { index },
                    context,
                }),
                self.policy.suppress_navigation,
            );

            if element.label.contains(&self.policy.label_match)
                && !element.label.contains(&self.policy.label_replacement)
            {
                page.rewrite_label(
                    id,
                    &self.policy.label_match,
                    &self.policy.label_replacement,
                    &self.policy.label_title,
                );
            }

            debug!(element = id.0, label = %element.label, "element enhanced");
            bound += 1;
        }

        if bound > 0 {
            info!(bound, total = self.registry.len(), "contact elements enhanced");
        }
        bound
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{ElementSpec, MemoryPage};
    use crate::surface::{ElementId, ElementKind};
    use chatbridge_core_types::ContextValue;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        calls: Mutex<Vec<(TriggerSource, ActionContext)>>,
    }

    #[async_trait]
    impl TriggerSink for RecordingSink {
        async fn trigger(&self, source: TriggerSource, context: ActionContext) {
            self.calls.lock().push((source, context));
        }
    }

    fn contact_page() -> MemoryPage {
        let page = MemoryPage::new();
        page.add(ElementSpec {
            kind: ElementKind::Anchor,
            label: "Contact Us".into(),
            selectors: vec!["a[href*='contact']".into()],
            href: Some("contact.html".into()),
            inline_trigger: Some("contactSupport()".into()),
        });
        page.add(ElementSpec {
            kind: ElementKind::Button,
            label: "Start Chat".into(),
            selectors: vec![".start-chat".into()],
            href: None,
            inline_trigger: None,
        });
        page
    }

    #[tokio::test]
    async fn second_scan_binds_nothing_new() {
        let page = contact_page();
        let sink = Arc::new(RecordingSink::default());
        let binder = EnhancementBinder::new(BindPolicy::default(), sink);

        assert_eq!(binder.bind_all(&page), 2);
        assert_eq!(binder.bind_all(&page), 0);

        let id = page.add(ElementSpec {
            kind: ElementKind::Button,
            label: "Live Chat".into(),
            selectors: vec![".live-chat".into()],
            href: None,
            inline_trigger: None,
        });
        assert_eq!(binder.bind_all(&page), 1);
        assert!(binder.registry().is_bound(id));
    }

    #[tokio::test]
    async fn element_matching_two_selectors_gets_one_handler() {
        let page = MemoryPage::new();
        let id = page.add(ElementSpec {
            kind: ElementKind::Anchor,
            label: "Start Chat".into(),
            selectors: vec![".start-chat".into(), "a[href*='contact']".into()],
            href: Some("/contact.html".into()),
            inline_trigger: None,
        });
        let sink = Arc::new(RecordingSink::default());
        let binder = EnhancementBinder::new(BindPolicy::default(), sink);

        assert_eq!(binder.bind_all(&page), 1);
        assert_eq!(page.handler_attach_count(id), 1);
    }

    #[tokio::test]
    async fn click_delivers_per_element_context() {
        let page = contact_page();
        let sink = Arc::new(RecordingSink::default());
        let binder = EnhancementBinder::new(BindPolicy::default(), Arc::clone(&sink) as _);
        binder.bind_all(&page);

        page.click(ElementId(0)).await;
        page.click(ElementId(1)).await;

        let calls = sink.calls.lock();
        assert_eq!(calls.len(), 2);
        let (source, context) = &calls[0];
        assert_eq!(*source, TriggerSource::ContactButton { index: 0 });
        assert_eq!(
            context.get("elementKind"),
            Some(&ContextValue::Text("anchor".into()))
        );
        assert_eq!(
            context.get("elementLabel"),
            Some(&ContextValue::Text("Contact Us".into()))
        );
        let (source, _) = &calls[1];
        assert_eq!(*source, TriggerSource::ContactButton { index: 1 });
    }

    #[tokio::test]
    async fn labels_are_rewritten_with_title() {
        let page = contact_page();
        let sink = Arc::new(RecordingSink::default());
        let binder = EnhancementBinder::new(BindPolicy::default(), sink);
        binder.bind_all(&page);

        assert_eq!(page.label(ElementId(0)).unwrap(), "Live Chat Us");
        assert_eq!(
            page.title(ElementId(0)).unwrap(),
            "Start a live conversation with our support team"
        );
        // No "Contact" in the label, so it stays as authored.
        assert_eq!(page.label(ElementId(1)).unwrap(), "Start Chat");
        assert!(page.title(ElementId(1)).is_none());
    }

    #[tokio::test]
    async fn inline_triggers_are_cleared() {
        let page = contact_page();
        let sink = Arc::new(RecordingSink::default());
        let binder = EnhancementBinder::new(BindPolicy::default(), sink);

        assert!(page.inline_trigger(ElementId(0)).is_some());
        binder.bind_all(&page);
        assert!(page.inline_trigger(ElementId(0)).is_none());
    }

    #[tokio::test]
    async fn unmatched_elements_stay_untouched() {
        let page = contact_page();
        let plain = page.add(ElementSpec {
            kind: ElementKind::Button,
            label: "Submit Claim".into(),
            selectors: vec![".submit".into()],
            href: None,
            inline_trigger: None,
        });
        let sink = Arc::new(RecordingSink::default());
        let binder = EnhancementBinder::new(BindPolicy::default(), sink);

        assert_eq!(binder.bind_all(&page), 2);
        assert!(!binder.registry().is_bound(plain));
        assert_eq!(page.handler_attach_count(plain), 0);
    }
}
