// ABOUTME: Library root for taskroll - rolls container images out to services and scheduled tasks.
// ABOUTME: The main binary is in main.rs.

pub mod config;
pub mod deploy;
pub mod diagnostics;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod output;
pub mod platform;
pub mod stage;
pub mod types;
