// ABOUTME: Configuration types and parsing for taskroll.yml.
// ABOUTME: Handles YAML parsing, env var interpolation, and defaults for every stage.

mod env_value;
mod retry;
mod session;

pub use env_value::EnvValue;
pub use retry::RetryPolicy;
pub use session::SessionConfig;

use crate::error::{Error, Result};
use crate::platform::SessionSpec;
use crate::types::RoleArn;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "taskroll.yml";
pub const CONFIG_FILENAME_ALT: &str = "taskroll.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".taskroll/config.yml";

/// Environment variable the deployment role is read from by default.
pub const DEPLOYMENT_ROLE_VAR: &str = "ECS_DEPLOYMENT_ROLE_ARN";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Role every stage assumes before calling the platform.
    #[serde(default = "default_deployment_role")]
    pub deployment_role: EnvValue,

    #[serde(default)]
    pub session: SessionConfig,

    /// Retry policy for validation that has not converged yet.
    #[serde(default)]
    pub validation: RetryPolicy,

    /// Overrides `LOG_LEVEL`.
    #[serde(default)]
    pub log_level: Option<String>,

    /// Platform snapshot used when `--platform` is not given.
    #[serde(default)]
    pub platform: Option<PathBuf>,
}

fn default_deployment_role() -> EnvValue {
    EnvValue::from_env(DEPLOYMENT_ROLE_VAR)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            deployment_role: default_deployment_role(),
            session: SessionConfig::default(),
            validation: RetryPolicy::default(),
            log_level: None,
            platform: None,
        }
    }
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Relative snapshot paths are resolved against the config file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&content)?;
        if let (Some(platform), Some(base)) = (config.platform.as_mut(), path.parent())
            && platform.is_relative()
        {
            *platform = base.join(&*platform);
        }
        Ok(config)
    }

    /// Load the first config file found in `dir`, or defaults if there is none.
    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                tracing::debug!(path = %path.display(), "loading configuration");
                return Self::load(path);
            }
        }

        Ok(Self::default())
    }

    fn validate(&self) -> Result<()> {
        if !self.validation.is_valid() {
            return Err(Error::InvalidConfig(format!(
                "validation backoff_rate must be at least 1.0, got {}",
                self.validation.backoff_rate
            )));
        }
        Ok(())
    }

    /// Resolve the deployment role, from the environment if configured so.
    pub fn deployment_role(&self) -> Result<RoleArn> {
        let raw = self.deployment_role.resolve()?;
        RoleArn::parse(&raw)
            .map_err(|e| Error::InvalidConfig(format!("deployment_role: {e}")))
    }

    pub fn session_spec(&self) -> Result<SessionSpec> {
        self.session.spec()
    }
}
