// ABOUTME: Orchestration platform surface consumed by the deployment pipeline.
// ABOUTME: Capability traits, resource shapes, errors, and the in-memory implementation.

mod error;
mod memory;
pub mod traits;
mod types;

pub use error::PlatformError;
pub use memory::{ClusterState, MemoryPlatform, PlatformSnapshot, RuleState, ServiceState};
pub use traits::*;
pub use types::*;
