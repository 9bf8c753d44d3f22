// ABOUTME: Schedule rule target operations trait for the orchestration platform.
// ABOUTME: Read and resubmit the target records attached to a rule.

use async_trait::async_trait;

use crate::platform::{PlatformError, ResponseMetadata, RuleTarget};
use crate::types::RuleName;

/// Schedule rule target operations.
#[async_trait]
pub trait RuleOps: Send + Sync {
    /// List up to `limit` targets of a rule.
    async fn list_targets_by_rule(
        &self,
        rule: &RuleName,
        limit: u32,
    ) -> Result<Vec<RuleTarget>, PlatformError>;

    /// Create or replace targets, matched by their `Id`. Records are replaced whole.
    async fn put_targets(
        &self,
        rule: &RuleName,
        targets: &[RuleTarget],
    ) -> Result<ResponseMetadata, PlatformError>;
}
