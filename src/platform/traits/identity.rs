// ABOUTME: Identity and client construction traits.
// ABOUTME: Exchange a role for credentials, then build a platform client from them.

use async_trait::async_trait;

use super::FullPlatform;
use crate::platform::{Credentials, PlatformError, SessionSpec};
use crate::types::RoleArn;

/// Identity provider: trades a role reference for short-lived credentials.
#[async_trait]
pub trait IdentityOps: Send + Sync {
    async fn assume_role(
        &self,
        role: &RoleArn,
        session: &SessionSpec,
    ) -> Result<Credentials, PlatformError>;
}

/// Builds a platform client scoped to a set of credentials.
pub trait Connect: Send + Sync {
    type Client: FullPlatform;

    fn connect(&self, credentials: &Credentials) -> Result<Self::Client, PlatformError>;
}
