//! Container settings.

use serde::{Deserialize, Serialize};

/// What to do with a declared property that has no registered setter
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingSetterPolicy {
    /// Log a warning and leave the property unset
    #[default]
    Warn,
    /// Abort the build
    Error,
}

/// What to do when two declarations share an identifier
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateIdPolicy {
    /// Log a warning, the last declaration wins
    #[default]
    Overwrite,
    /// Abort the build
    Reject,
}

/// Settings applied by the graph builder
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    pub missing_setter: MissingSetterPolicy,
    pub duplicate_ids: DuplicateIdPolicy,
}

impl ContainerConfig {
    /// Fail on missing setters and on duplicate identifiers
    pub fn strict() -> Self {
        Self {
            missing_setter: MissingSetterPolicy::Error,
            duplicate_ids: DuplicateIdPolicy::Reject,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_the_defaults() {
        let config: ContainerConfig = serde_json::from_str(r#"{"missing_setter":"error"}"#).unwrap();
        assert_eq!(config.missing_setter, MissingSetterPolicy::Error);
        assert_eq!(config.duplicate_ids, DuplicateIdPolicy::Overwrite);

        let config: ContainerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ContainerConfig::default());

        let config: ContainerConfig =
            serde_json::from_str(r#"{"missing_setter":"error","duplicate_ids":"reject"}"#).unwrap();
        assert_eq!(config, ContainerConfig::strict());
    }
}
