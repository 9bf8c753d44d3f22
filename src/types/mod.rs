// ABOUTME: Type-safe resource references and validated domain names.
// ABOUTME: Uses phantom types to prevent ARN confusion at compile time.

mod arn;
mod image_ref;
mod names;

pub use arn::{
    Arn, ArnError, ClusterArn, RoleArn, ServiceArn, TaskArn, TaskDefinitionArn,
};
pub use image_ref::{ImageRef, ParseImageRefError};
pub use names::{ClusterName, ContainerHint, NameError, RuleName, ServiceName};
