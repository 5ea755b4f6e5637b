use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::info;

use chatbridge_binder::BindPolicy;
use chatbridge_dispatcher::{DispatchPolicy, RouteCategories};
use chatbridge_readiness::GatePolicy;
use chatbridge_vendor_bus::DeploymentConfig;

use crate::errors::IntegrationError;

/// Effective runtime configuration. Every section has working defaults, so
/// a config file only needs to state the overrides.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub deployment: DeploymentConfig,
    pub gate: GatePolicy,
    pub dispatch: DispatchPolicy,
    pub bind: BindPolicy,
    pub routes: RouteCategories,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            deployment: DeploymentConfig::default(),
            gate: GatePolicy::default(),
            dispatch: DispatchPolicy::default(),
            bind: BindPolicy::default(),
            routes: RouteCategories::default(),
            log_level: "info".to_string(),
        }
    }
}

pub struct LoadedConfig {
    pub config: AppConfig,
    /// `None` when running on pure defaults.
    pub path: Option<PathBuf>,
}

/// Load configuration with the usual lookup order:
/// explicit path > ./config/chatbridge.yaml > ~/.config/chatbridge/config.yaml.
pub fn load_config(explicit: Option<&PathBuf>) -> Result<LoadedConfig, IntegrationError> {
    let path = match explicit {
        Some(path) => Some(path.clone()),
        None => {
            let local = PathBuf::from("config/chatbridge.yaml");
            if local.exists() {
                Some(local)
            } else {
                dirs::config_dir()
                    .map(|mut dir| {
                        dir.push("chatbridge");
                        dir.push("config.yaml");
                        dir
                    })
                    .filter(|candidate| candidate.exists())
            }
        }
    };

    match path {
        Some(path) => {
            let raw = fs::read_to_string(&path).map_err(|err| {
                IntegrationError::Config(format!("failed to read {}: {err}", path.display()))
            })?;
            let config: AppConfig = serde_yaml::from_str(&raw).map_err(|err| {
                IntegrationError::Config(format!("failed to parse {}: {err}", path.display()))
            })?;
            info!(path = %path.display(), "configuration loaded");
            Ok(LoadedConfig {
                config,
                path: Some(path),
            })
        }
        None => Ok(LoadedConfig {
            config: AppConfig::default(),
            path: None,
        }),
    }
}
