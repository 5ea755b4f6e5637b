use serde::{Deserialize, Serialize};

/// What to scan for and how to relabel it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BindPolicy {
    /// Selector patterns, scanned in order.
    pub selectors: Vec<String>,
    /// Label substring that gets rewritten.
    pub label_match: String,
    /// Replacement for the matched substring.
    pub label_replacement: String,
    /// Accessibility title set alongside the rewrite.
    pub label_title: String,
    /// Drop the element's default action when the bound handler fires.
    pub suppress_navigation: bool,
}

impl Default for BindPolicy {
    fn default() -> Self {
        Self {
            selectors: vec![
                "a[href*='contact']".to_string(),
                ".contact-support".to_string(),
                ".start-chat".to_string(),
                ".live-chat".to_string(),
            ],
            label_match: "Contact".to_string(),
            label_replacement: "Live Chat".to_string(),
            label_title: "Start a live conversation with our support team".to_string(),
            suppress_navigation: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_targets_contact_elements() {
        let policy = BindPolicy::default();
        assert!(policy.selectors.iter().any(|s| s.contains("contact")));
        assert_eq!(policy.label_match, "Contact");
        assert!(policy.suppress_navigation);
    }
}
