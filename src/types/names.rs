// ABOUTME: Validated platform resource names for services, clusters, and schedule rules.
// ABOUTME: Also holds the container hint used to pick a container out of a task definition.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NameError {
    #[error("{kind} cannot be empty")]
    Empty { kind: &'static str },

    #[error("{kind} exceeds maximum length of {max} characters")]
    TooLong { kind: &'static str, max: usize },

    #[error("invalid character in {kind}: '{found}'")]
    InvalidChar { kind: &'static str, found: char },
}

fn validate(
    value: &str,
    kind: &'static str,
    max: usize,
    allowed: impl Fn(char) -> bool,
) -> Result<(), NameError> {
    if value.is_empty() {
        return Err(NameError::Empty { kind });
    }
    if value.chars().count() > max {
        return Err(NameError::TooLong { kind, max });
    }
    match value.chars().find(|c| !allowed(*c)) {
        Some(found) => Err(NameError::InvalidChar { kind, found }),
        None => Ok(()),
    }
}

fn service_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

macro_rules! validated_name {
    ($(#[$meta:meta])* $name:ident, $check:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: &str) -> Result<Self, NameError> {
                let check: fn(&str) -> Result<(), NameError> = $check;
                check(value)?;
                Ok(Self(value.to_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                self.0.serialize(serializer)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                $name::new(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

validated_name!(
    /// Name of a long-running service: up to 255 letters, digits, hyphens and underscores.
    ServiceName,
    |v| validate(v, "service name", 255, service_char)
);

validated_name!(
    /// Cluster name or full cluster ARN.
    ClusterName,
    |v| {
        if v.starts_with("arn:") {
            validate(v, "cluster arn", 2048, |c| !c.is_whitespace())
        } else {
            validate(v, "cluster name", 255, service_char)
        }
    }
);

validated_name!(
    /// Name of a schedule rule: up to 64 letters, digits, dots, hyphens and underscores.
    RuleName,
    |v| validate(v, "rule name", 64, |c| service_char(c) || c == '.')
);

validated_name!(
    /// Logical name of the workload, matched as a substring of container image
    /// references to find the container to update among sidecars.
    ContainerHint,
    |v| validate(v, "container hint", 255, |c| !c.is_whitespace())
);

impl ContainerHint {
    /// Whether a container running `image` is the one this hint names.
    pub fn matches_image(&self, image: &str) -> bool {
        image.contains(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_name_allows_underscores_and_hyphens() {
        assert!(ServiceName::new("billing_api-v2").is_ok());
    }

    #[test]
    fn service_name_rejects_dots() {
        assert_eq!(
            ServiceName::new("billing.api"),
            Err(NameError::InvalidChar {
                kind: "service name",
                found: '.'
            })
        );
    }

    #[test]
    fn cluster_accepts_arn() {
        let cluster = ClusterName::new("arn:aws:ecs:eu-west-1:123456789012:cluster/prod").unwrap();
        assert_eq!(cluster.as_str(), "arn:aws:ecs:eu-west-1:123456789012:cluster/prod");
    }

    #[test]
    fn rule_name_length_is_bounded() {
        let long = "r".repeat(65);
        assert!(matches!(
            RuleName::new(&long),
            Err(NameError::TooLong { max: 64, .. })
        ));
        assert!(RuleName::new("nightly.report-job").is_ok());
    }

    #[test]
    fn hint_matches_substring_of_image() {
        let hint = ContainerHint::new("app").unwrap();
        assert!(hint.matches_image("x/app:2"));
        assert!(!hint.matches_image("x/other:1"));
    }

    #[test]
    fn empty_names_are_rejected() {
        assert!(matches!(ContainerHint::new(""), Err(NameError::Empty { .. })));
        assert!(matches!(RuleName::new(""), Err(NameError::Empty { .. })));
    }
}
