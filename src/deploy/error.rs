// ABOUTME: Error types for deployment stages.
// ABOUTME: Separates fatal failures from the retryable convergence check.

use crate::platform::PlatformError;
use crate::types::TaskDefinitionArn;

use super::state::Phase;

/// Errors that can occur during deployment state transitions.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// A release must deploy at least one service.
    #[error("no services found for deployment")]
    NoServiceTargets,

    /// Neither the target nor the release names an image.
    #[error("no image given for {0} and the release has no default image")]
    MissingImage(String),

    /// The service or rule does not exist, or the rule has no usable target.
    #[error("target not found: {0}")]
    TargetNotFound(String),

    /// No container in the task definition runs the hinted image.
    #[error("couldn't find any image containing {hint} in task definition {task_definition}")]
    ContainerNotFound {
        hint: String,
        task_definition: TaskDefinitionArn,
    },

    /// The platform answered the repoint call with a non-success status.
    #[error("unable to update {target} with task definition {task_definition}: status {status}")]
    DeploymentApply {
        target: String,
        task_definition: TaskDefinitionArn,
        status: u16,
    },

    /// A running task still uses another revision. Retry later.
    #[error(
        "found task definition {found} still deployed in {service}, expected {expected}; retry after a delay"
    )]
    Convergence {
        service: String,
        found: TaskDefinitionArn,
        expected: TaskDefinitionArn,
    },

    /// A platform call failed outright.
    #[error("{action} failed: {source}")]
    Platform {
        action: &'static str,
        #[source]
        source: PlatformError,
    },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployErrorKind {
    /// The release itself is unusable.
    InvalidRelease,
    /// The target or its container could not be found.
    NotFound,
    /// The platform refused the repoint.
    ApplyRejected,
    /// Running tasks have not all moved to the new revision yet.
    ConvergencePending,
    /// Platform call failure.
    Platform,
}

impl DeployError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> DeployErrorKind {
        match self {
            DeployError::NoServiceTargets | DeployError::MissingImage(_) => {
                DeployErrorKind::InvalidRelease
            }
            DeployError::TargetNotFound(_) | DeployError::ContainerNotFound { .. } => {
                DeployErrorKind::NotFound
            }
            DeployError::DeploymentApply { .. } => DeployErrorKind::ApplyRejected,
            DeployError::Convergence { .. } => DeployErrorKind::ConvergencePending,
            DeployError::Platform { .. } => DeployErrorKind::Platform,
        }
    }

    /// Only convergence is worth retrying; everything else is terminal.
    pub fn is_retryable(&self) -> bool {
        self.kind() == DeployErrorKind::ConvergencePending
    }

    /// The pipeline phase a target ends up in when this error is raised.
    pub fn phase(&self) -> Phase {
        if self.is_retryable() {
            Phase::ConvergencePending
        } else {
            Phase::Failed
        }
    }

    /// Wrap a platform failure with the call that produced it.
    pub(crate) fn platform(action: &'static str) -> impl FnOnce(PlatformError) -> DeployError {
        move |source| DeployError::Platform { action, source }
    }
}
