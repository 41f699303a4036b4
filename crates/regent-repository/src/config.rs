//! Bundle configuration types
//!
//! Describes where a bundle lives and how its files are laid out.

use serde::{Deserialize, Serialize};

/// Bundle source type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BundleSource {
    /// Load from a directory on disk
    #[default]
    FileSystem,
    /// Content is supplied in memory by the embedding host
    Memory,
}

fn default_rule_extension() -> String {
    "rego".to_string()
}

fn default_config_path() -> String {
    "data.json".to_string()
}

/// Bundle configuration
///
/// # Examples
///
/// ```rust
/// use regent_repository::BundleConfig;
///
/// // Directory on disk with the default layout
/// let config = BundleConfig::file_system("policies");
///
/// // Custom configuration document location
/// let config = BundleConfig::file_system("policies").with_config_path("config/data.yaml");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleConfig {
    /// Configuration source type
    #[serde(default)]
    pub source: BundleSource,

    /// Root directory (required for FileSystem source)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,

    /// Extension identifying rule-source files, without the dot
    #[serde(default = "default_rule_extension")]
    pub rule_extension: String,

    /// Relative path of the configuration document
    #[serde(default = "default_config_path")]
    pub config_path: String,
}

impl BundleConfig {
    /// Create a file system bundle configuration
    pub fn file_system(path: impl Into<String>) -> Self {
        Self {
            source: BundleSource::FileSystem,
            base_path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Create a memory bundle configuration
    pub fn memory() -> Self {
        Self {
            source: BundleSource::Memory,
            ..Self::default()
        }
    }

    pub fn with_rule_extension(mut self, extension: impl Into<String>) -> Self {
        self.rule_extension = extension.into();
        self
    }

    pub fn with_config_path(mut self, path: impl Into<String>) -> Self {
        self.config_path = path.into();
        self
    }

    /// Validate the configuration
    ///
    /// Returns an error if required fields are missing for the selected source.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source == BundleSource::FileSystem && self.base_path.is_none() {
            return Err(ConfigError::MissingField {
                source_type: "FileSystem".to_string(),
                field: "base_path".to_string(),
            });
        }
        if self.rule_extension.is_empty() || self.rule_extension.starts_with('.') {
            return Err(ConfigError::InvalidField {
                field: "rule_extension".to_string(),
                reason: "must be a bare extension such as `rego`".to_string(),
            });
        }
        if self.config_path.is_empty() {
            return Err(ConfigError::InvalidField {
                field: "config_path".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            source: BundleSource::default(),
            base_path: None,
            rule_extension: default_rule_extension(),
            config_path: default_config_path(),
        }
    }
}

/// Configuration error
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// A required field is missing for the selected source
    #[error("{source_type} source requires {field} to be set")]
    MissingField { source_type: String, field: String },

    /// A field has an unusable value
    #[error("invalid {field}: {reason}")]
    InvalidField { field: String, reason: String },
}
