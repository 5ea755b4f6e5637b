use chrono::Utc;
use serde::{Deserialize, Serialize};

use chatbridge_core_types::{ActionContext, TriggerId, TriggerSource};

use crate::ports::NavigationPort;

/// Static route classification table: longest matching prefix wins.
///
/// This is configuration, not inference; unmatched paths fall back to the
/// catch-all row.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RouteRule {
    pub prefix: String,
    pub category: String,
    pub section: String,
    pub intent: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RouteCategories {
    rules: Vec<RouteRule>,
}

impl RouteCategories {
    pub fn new(rules: Vec<RouteRule>) -> Self {
        Self { rules }
    }

    pub fn classify(&self, path: &str) -> RouteMatch<'_> {
        self.rules
            .iter()
            .filter(|rule| path.starts_with(rule.prefix.as_str()))
            .max_by_key(|rule| rule.prefix.len())
            .map(|rule| RouteMatch {
                category: &rule.category,
                section: &rule.section,
                intent: &rule.intent,
            })
            .unwrap_or(RouteMatch {
                category: "other",
                section: "general",
                intent: "general-inquiry",
            })
    }
}

impl Default for RouteCategories {
    fn default() -> Self {
        let rule = |prefix: &str, category: &str, section: &str, intent: &str| RouteRule {
            prefix: prefix.into(),
            category: category.into(),
            section: section.into(),
            intent: intent.into(),
        };
        Self::new(vec![
            rule("/home", "landing", "general", "general-inquiry"),
            rule("/submit-claim", "claims-submission", "claims", "file-claim"),
            rule("/track-claims", "claims-tracking", "claims", "track-claim"),
            rule("/contact", "customer-support", "support", "general-support"),
        ])
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RouteMatch<'a> {
    pub category: &'a str,
    pub section: &'a str,
    pub intent: &'a str,
}

/// Base context derived from navigation state, merged with the caller's
/// context; caller keys win on conflict. Built fresh per invocation and
/// never mutated after emission.
pub fn merged_context(
    nav: &dyn NavigationPort,
    routes: &RouteCategories,
    source: &TriggerSource,
    caller: &ActionContext,
) -> ActionContext {
    let path = nav.current_path();
    let route = routes.classify(&path);
    let mut context = ActionContext::new()
        .with("currentPage", path.clone())
        .with("pageTitle", nav.page_title())
        .with("timestamp", Utc::now().to_rfc3339())
        .with("trigger", source.label())
        .with("section", route.section)
        .with("intent", route.intent);
    context.merge(caller);
    context
}

/// Outcome of one dispatch invocation, for diagnostics and tests.
#[derive(Clone, Debug)]
pub struct DispatchReport {
    pub trigger_id: TriggerId,
    /// Not-ready deferrals plus emission retries consumed.
    pub attempts: u32,
    pub opened_via_launcher: bool,
    /// Commands accepted by the bus, telemetry included.
    pub commands_emitted: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::StaticNav;
    use chatbridge_core_types::ContextValue;

    #[test]
    fn longest_prefix_wins() {
        let routes = RouteCategories::new(vec![
            RouteRule {
                prefix: "/claims".into(),
                category: "claims".into(),
                section: "claims".into(),
                intent: "file-claim".into(),
            },
            RouteRule {
                prefix: "/claims/track".into(),
                category: "claims-tracking".into(),
                section: "claims".into(),
                intent: "track-claim".into(),
            },
        ]);
        assert_eq!(routes.classify("/claims/track/42").category, "claims-tracking");
        assert_eq!(routes.classify("/claims/new").category, "claims");
    }

    #[test]
    fn unmatched_path_falls_back() {
        let routes = RouteCategories::default();
        let route = routes.classify("/careers");
        assert_eq!(route.category, "other");
        assert_eq!(route.intent, "general-inquiry");
    }

    #[test]
    fn default_table_covers_the_portal_routes() {
        let routes = RouteCategories::default();
        assert_eq!(routes.classify("/submit-claim").intent, "file-claim");
        assert_eq!(routes.classify("/track-claims").category, "claims-tracking");
        assert_eq!(routes.classify("/contact").section, "support");
    }

    #[test]
    fn caller_context_wins_on_conflict() {
        let nav = StaticNav::new("/contact", "Contact Us");
        let routes = RouteCategories::default();
        let caller = ActionContext::new()
            .with("intent", "file-claim")
            .with("claimId", "CLM-2024-000001");

        let merged = merged_context(&nav, &routes, &TriggerSource::Manual, &caller);
        assert_eq!(
            merged.get("intent"),
            Some(&ContextValue::Text("file-claim".into()))
        );
        assert_eq!(
            merged.get("currentPage"),
            Some(&ContextValue::Text("/contact".into()))
        );
        assert!(merged.contains_key("timestamp"));
        assert!(merged.contains_key("claimId"));
    }
}
