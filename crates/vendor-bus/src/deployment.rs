use serde::{Deserialize, Serialize};

/// Static configuration carried by the one-time bootstrap injection.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeploymentConfig {
    pub environment: String,
    pub deployment_id: String,
}

impl DeploymentConfig {
    pub fn new(environment: impl Into<String>, deployment_id: impl Into<String>) -> Self {
        Self {
            environment: environment.into(),
            deployment_id: deployment_id.into(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.environment.is_empty() && !self.deployment_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_requires_both_fields() {
        assert!(!DeploymentConfig::default().is_configured());
        assert!(!DeploymentConfig::new("prod-euw2", "").is_configured());
        assert!(DeploymentConfig::new("prod-euw2", "7953b9f3").is_configured());
    }
}
