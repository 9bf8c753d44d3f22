// ABOUTME: Role session settings used when assuming the deployment role.
// ABOUTME: Defaults the session name to the local hostname.

use serde::Deserialize;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::platform::SessionSpec;

const SESSION_PREFIX: &str = "taskroll-";
const MAX_SESSION_NAME: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionConfig {
    /// Defaults to `taskroll-<hostname>`.
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default = "default_duration", with = "humantime_serde")]
    pub duration: Duration,
}

fn default_duration() -> Duration {
    Duration::from_secs(30 * 60)
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            name: None,
            duration: default_duration(),
        }
    }
}

impl SessionConfig {
    pub fn spec(&self) -> Result<SessionSpec> {
        let name = match &self.name {
            Some(name) => name.clone(),
            None => default_session_name(&gethostname::gethostname().to_string_lossy()),
        };
        if name.is_empty() || name.len() > MAX_SESSION_NAME {
            return Err(Error::InvalidConfig(format!(
                "session name must be 1 to {MAX_SESSION_NAME} characters, got {name:?}"
            )));
        }
        if self.duration.is_zero() {
            return Err(Error::InvalidConfig("session duration must be positive".to_string()));
        }
        Ok(SessionSpec {
            name,
            duration: self.duration,
        })
    }
}

/// Session names only allow `[A-Za-z0-9_+=,.@-]`; anything else becomes `-`.
fn default_session_name(hostname: &str) -> String {
    let mut name: String = SESSION_PREFIX
        .chars()
        .chain(hostname.chars().map(|c| {
            if c.is_ascii_alphanumeric() || "_+=,.@-".contains(c) {
                c
            } else {
                '-'
            }
        }))
        .collect();
    name.truncate(MAX_SESSION_NAME);
    name
}
