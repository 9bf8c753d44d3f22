// ABOUTME: Command handlers for the taskroll CLI.
// ABOUTME: Shared input, output, and platform snapshot handling.

mod run;
mod stages;

pub use run::run;
pub use stages::{deploy_service, deploy_task, init, validate};

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::Read;
use std::path::PathBuf;
use taskroll::config::Config;
use taskroll::error::{Error, Result};
use taskroll::platform::MemoryPlatform;
use taskroll::stage::Stages;

/// Everything a command needs besides its own input.
pub struct Context {
    pub config: Config,
    platform: Option<PathBuf>,
}

impl Context {
    /// `platform` from the command line wins over the config file.
    pub fn new(config: Config, platform: Option<PathBuf>) -> Self {
        let platform = platform.or_else(|| config.platform.clone());
        Self { config, platform }
    }

    /// Open the platform snapshot. Mutations are written back with [`Context::save`].
    pub fn open_platform(&self) -> Result<(MemoryPlatform, PathBuf)> {
        let path = self.platform.clone().ok_or(Error::MissingPlatform)?;
        if !path.exists() {
            return Err(Error::SnapshotNotFound(path));
        }
        let platform = MemoryPlatform::load(&path)?;
        tracing::debug!(path = %path.display(), "loaded platform snapshot");
        Ok((platform, path))
    }

    pub fn stages<'a>(
        &self,
        platform: &'a MemoryPlatform,
    ) -> Result<Stages<'a, MemoryPlatform, MemoryPlatform>> {
        Ok(Stages::new(platform, platform, self.config.session_spec()?))
    }
}

/// Parse JSON from a file, or from stdin when `input` is `-`.
pub fn read_input<T: DeserializeOwned>(input: &str) -> Result<T> {
    let content = if input == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(input)?
    };
    serde_json::from_str(&content).map_err(|e| Error::InvalidInput(input.to_string(), e))
}

/// Print a record for the next stage on stdout.
pub fn write_output<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
