// ABOUTME: Stage runners that act as the deployment role before touching the platform.
// ABOUTME: Unifies identity, connection, and deployment failures with the SNAFU pattern.

use snafu::{ResultExt, Snafu};
use tracing::info;

use crate::deploy::{
    Applied, DeployError, DeployErrorKind, Deployment, Phase, ServiceTarget, Target, Validated,
    WorkItem,
};
use crate::diagnostics::{Diagnostics, Warning};
use crate::platform::{Connect, IdentityOps, PlatformError, SessionSpec};
use crate::types::RoleArn;

/// Unified stage error for identity, connection, and deployment failures.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum StageError {
    #[snafu(display("unable to assume role {role}: {source}"))]
    AssumeRole { role: RoleArn, source: PlatformError },

    #[snafu(display("unable to connect with assumed credentials: {source}"))]
    Connect { source: PlatformError },

    #[snafu(display("{source}"))]
    Deploy { source: DeployError },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageErrorKind {
    /// The deployment role could not be assumed.
    Identity,
    /// Credentials were issued but no client could be built from them.
    Connection,
    /// The deployment itself failed.
    Deploy(DeployErrorKind),
}

impl StageError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> StageErrorKind {
        match self {
            StageError::AssumeRole { .. } => StageErrorKind::Identity,
            StageError::Connect { .. } => StageErrorKind::Connection,
            StageError::Deploy { source } => StageErrorKind::Deploy(source.kind()),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, StageError::Deploy { source } if source.is_retryable())
    }

    pub fn phase(&self) -> Phase {
        match self {
            StageError::Deploy { source } => source.phase(),
            _ => Phase::Failed,
        }
    }
}

impl From<DeployError> for StageError {
    fn from(source: DeployError) -> Self {
        StageError::Deploy { source }
    }
}

/// Runs the deploy and validate stages with credentials for each work item's role.
pub struct Stages<'a, I, C> {
    identity: &'a I,
    connector: &'a C,
    session: SessionSpec,
}

impl<'a, I: IdentityOps, C: Connect> Stages<'a, I, C> {
    pub fn new(identity: &'a I, connector: &'a C, session: SessionSpec) -> Self {
        Self {
            identity,
            connector,
            session,
        }
    }

    pub fn session(&self) -> &SessionSpec {
        &self.session
    }

    async fn client(&self, role: &RoleArn) -> Result<C::Client, StageError> {
        info!(%role, session = %self.session.name, "assuming deployment role");
        let credentials = self
            .identity
            .assume_role(role, &self.session)
            .await
            .context(AssumeRoleSnafu { role: role.clone() })?;
        self.connector.connect(&credentials).context(ConnectSnafu)
    }

    /// Deploy stage: resolve the target and roll the image out if needed.
    ///
    /// # Errors
    ///
    /// Fails if the role cannot be assumed or any deployment step fails.
    pub async fn deploy<T: Target>(
        &self,
        item: WorkItem<T>,
        diag: &mut Diagnostics,
    ) -> Result<Deployment<T, Applied>, StageError> {
        let client = self.client(&item.assume_role).await?;
        let resolved = Deployment::new(item).resolve(&client).await?;
        if resolved.used_fallback() {
            diag.warn(Warning::container_fallback(format!(
                "{}: no container image contains \"{}\", updating {} instead",
                resolved.target(),
                resolved.target().container_hint(),
                resolved.current_image()
            )));
        }
        Ok(resolved.apply(&client).await?)
    }

    /// Validate stage for one service.
    ///
    /// Skips the role and the platform entirely when nothing was deployed.
    ///
    /// # Errors
    ///
    /// Returns the deployment with the error so validation can be retried.
    pub async fn validate(
        &self,
        deployment: Deployment<ServiceTarget, Applied>,
        diag: &mut Diagnostics,
    ) -> Result<Deployment<ServiceTarget, Validated>, (Deployment<ServiceTarget, Applied>, StageError)>
    {
        let deployment = match deployment.finish_unchanged() {
            Ok(done) => return Ok(done),
            Err(pending) => pending,
        };
        let client = match self.client(deployment.role()).await {
            Ok(client) => client,
            Err(e) => return Err((deployment, e)),
        };
        match deployment.validate(&client).await {
            Ok(validated) => {
                if let Some(warning) = validated.warning() {
                    diag.warn(Warning::no_running_tasks(warning));
                }
                Ok(validated)
            }
            Err((deployment, e)) => Err((deployment, e.into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TaskDefinitionArn;

    #[test]
    fn retryable_only_for_pending_convergence() {
        let pending: StageError = DeployError::Convergence {
            service: "service prod/web".to_string(),
            found: TaskDefinitionArn::new("web:1"),
            expected: TaskDefinitionArn::new("web:2"),
        }
        .into();
        assert!(pending.is_retryable());
        assert_eq!(pending.phase(), Phase::ConvergencePending);
        assert_eq!(
            pending.kind(),
            StageErrorKind::Deploy(DeployErrorKind::ConvergencePending)
        );

        let denied = StageError::AssumeRole {
            role: RoleArn::new("arn:aws:iam::1:role/deploy"),
            source: PlatformError::AccessDenied("nope".to_string()),
        };
        assert!(!denied.is_retryable());
        assert_eq!(denied.kind(), StageErrorKind::Identity);
        assert_eq!(denied.phase(), Phase::Failed);
    }

    #[test]
    fn deploy_errors_display_unwrapped() {
        let err: StageError = DeployError::NoServiceTargets.into();
        assert_eq!(err.to_string(), "no services found for deployment");
    }
}
