// ABOUTME: Release input, per-target work items, and the initializer stage.
// ABOUTME: Fans a release out into work items stamped with the deployment role.

use nonempty::NonEmpty;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::info;

use crate::types::{ImageRef, RoleArn};

use super::error::DeployError;
use super::target::{ScheduledTaskTarget, ServiceTarget, Target};

/// A deployment request as handed over by whoever triggered it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Release {
    /// Free-form label, carried through for logs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,

    /// Image for every target that does not name its own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageRef>,

    #[serde(default)]
    pub services: Vec<TargetEntry<ServiceTarget>>,

    /// Scheduled tasks are optional; `null` reads as none.
    #[serde(default, deserialize_with = "deserialize_null_as_empty")]
    pub tasks: Vec<TargetEntry<ScheduledTaskTarget>>,
}

/// One target as listed in a release.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetEntry<T> {
    #[serde(flatten)]
    pub target: T,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageRef>,
}

impl<T> TargetEntry<T> {
    pub fn new(target: T) -> Self {
        Self {
            target,
            image: None,
        }
    }

    pub fn with_image(mut self, image: ImageRef) -> Self {
        self.image = Some(image);
        self
    }
}

/// A target paired with the image it should run and the role to act as.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItem<T> {
    #[serde(flatten)]
    pub target: T,
    pub image: ImageRef,
    pub assume_role: RoleArn,
}

/// The initializer's output: every target of a release, ready to deploy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleasePlan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,

    #[serde(
        serialize_with = "serialize_nonempty",
        deserialize_with = "deserialize_nonempty"
    )]
    pub services: NonEmpty<WorkItem<ServiceTarget>>,

    #[serde(default, deserialize_with = "deserialize_null_as_empty")]
    pub tasks: Vec<WorkItem<ScheduledTaskTarget>>,
}

impl ReleasePlan {
    /// Number of work items across both target kinds.
    pub fn target_count(&self) -> usize {
        self.services.len() + self.tasks.len()
    }
}

/// Initializer stage: fan the release out and stamp `role` on every target.
///
/// Pure; nothing is read from or written to the platform.
///
/// # Errors
///
/// `DeployError::NoServiceTargets` if the release lists no services, and
/// `DeployError::MissingImage` if a target has no image to deploy.
pub fn initialize(release: Release, role: &RoleArn) -> Result<ReleasePlan, DeployError> {
    info!(
        release = release.release.as_deref().unwrap_or("-"),
        services = release.services.len(),
        tasks = release.tasks.len(),
        "processing release"
    );

    let default_image = release.image;
    let services = release
        .services
        .into_iter()
        .map(|entry| work_item(entry, default_image.as_ref(), role))
        .collect::<Result<Vec<_>, _>>()?;
    let services = NonEmpty::from_vec(services).ok_or(DeployError::NoServiceTargets)?;

    let tasks = release
        .tasks
        .into_iter()
        .map(|entry| work_item(entry, default_image.as_ref(), role))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ReleasePlan {
        release: release.release,
        services,
        tasks,
    })
}

fn work_item<T: Target>(
    entry: TargetEntry<T>,
    default_image: Option<&ImageRef>,
    role: &RoleArn,
) -> Result<WorkItem<T>, DeployError> {
    let image = entry
        .image
        .or_else(|| default_image.cloned())
        .ok_or_else(|| DeployError::MissingImage(entry.target.to_string()))?;
    Ok(WorkItem {
        target: entry.target,
        image,
        assume_role: role.clone(),
    })
}

// Custom (de)serializers

fn serialize_nonempty<S, T>(items: &NonEmpty<T>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: Serialize,
{
    serializer.collect_seq(items.iter())
}

fn deserialize_nonempty<'de, D, T>(deserializer: D) -> Result<NonEmpty<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let items = Vec::<T>::deserialize(deserializer)?;
    NonEmpty::from_vec(items)
        .ok_or_else(|| serde::de::Error::custom("at least one service is required"))
}

fn deserialize_null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
