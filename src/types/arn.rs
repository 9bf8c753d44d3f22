// ABOUTME: Phantom-typed resource references for compile-time type safety.
// ABOUTME: Prevents accidental swapping of task definition, service, cluster, task, and role ARNs.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use thiserror::Error;

/// Marker types for phantom type parameters.
pub enum TaskDefinitionMarker {}
pub enum ServiceMarker {}
pub enum ClusterMarker {}
pub enum TaskMarker {}
pub enum RoleMarker {}

#[derive(Debug, Error)]
pub enum ArnError {
    #[error("resource reference cannot be empty")]
    Empty,

    #[error("resource reference contains whitespace: {0:?}")]
    Whitespace(String),
}

/// A platform resource reference, usually a full ARN.
///
/// The platform also accepts short forms (`family:revision` for task
/// definitions, a bare name for clusters), so the value is kept verbatim and
/// only checked for emptiness and whitespace. Equality is exact string
/// equality, which is what convergence checks rely on.
#[must_use = "ARNs reference platform resources and should not be ignored"]
pub struct Arn<T> {
    value: String,
    _marker: PhantomData<T>,
}

impl<T> Arn<T> {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            _marker: PhantomData,
        }
    }

    /// Validate and wrap a reference received from outside the platform.
    pub fn parse(value: &str) -> Result<Self, ArnError> {
        if value.is_empty() {
            return Err(ArnError::Empty);
        }
        if value.chars().any(char::is_whitespace) {
            return Err(ArnError::Whitespace(value.to_string()));
        }
        Ok(Self::new(value))
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// The trailing resource segment, e.g. `web:7` for
    /// `arn:aws:ecs:eu-west-1:123:task-definition/web:7`.
    pub fn resource(&self) -> &str {
        self.value
            .rsplit_once('/')
            .map(|(_, tail)| tail)
            .unwrap_or(&self.value)
    }
}

// T is only a marker, so these impls must not require T to implement anything.

impl<T> std::fmt::Debug for Arn<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Arn").field(&self.value).finish()
    }
}

impl<T> Clone for Arn<T> {
    fn clone(&self) -> Self {
        Self::new(self.value.clone())
    }
}

impl<T> PartialEq for Arn<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Arn<T> {}

impl<T> Hash for Arn<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T> std::fmt::Display for Arn<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value)
    }
}

impl<T> Serialize for Arn<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for Arn<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(serde::de::Error::custom)
    }
}

pub type TaskDefinitionArn = Arn<TaskDefinitionMarker>;
pub type ServiceArn = Arn<ServiceMarker>;
pub type ClusterArn = Arn<ClusterMarker>;
pub type TaskArn = Arn<TaskMarker>;
pub type RoleArn = Arn<RoleMarker>;
