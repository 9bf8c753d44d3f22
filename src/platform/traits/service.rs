// ABOUTME: Service operations trait for the orchestration platform.
// ABOUTME: Describe a service and repoint it at a task definition revision.

use async_trait::async_trait;

use crate::platform::{PlatformError, ResponseMetadata, Service};
use crate::types::{ClusterArn, ClusterName, ServiceName, TaskDefinitionArn};

/// Long-running service operations.
#[async_trait]
pub trait ServiceOps: Send + Sync {
    /// Describe a single service in a cluster.
    ///
    /// Returns `PlatformError::NotFound` when the cluster has no such service.
    async fn describe_service(
        &self,
        cluster: &ClusterName,
        service: &ServiceName,
    ) -> Result<Service, PlatformError>;

    /// Point the service at a task definition revision.
    ///
    /// The platform starts replacing tasks after this returns; the call
    /// itself only swaps the pointer.
    async fn update_service(
        &self,
        cluster: &ClusterArn,
        service: &ServiceName,
        task_definition: &TaskDefinitionArn,
    ) -> Result<ResponseMetadata, PlatformError>;
}
