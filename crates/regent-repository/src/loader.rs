//! Bundle loader
//!
//! Reads every rule module and the configuration document out of a
//! [`Bundle`]. Loading is all-or-nothing: any unreadable module or a missing
//! or malformed configuration document fails the whole load.

use crate::bundle::Bundle;
use crate::config::{BundleConfig, BundleSource};
use crate::file_system::FileSystemBundle;
use regent_core::{
    Cancellation, ConfigDocument, LoadError, LoadErrorKind, RegentError, Result, RuleModule,
};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

const STAGE: &str = "load";

/// Where rule modules and the configuration document live inside a bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleLayout {
    /// Extension of rule-source files, without the dot
    pub rule_extension: String,

    /// Relative path of the configuration document
    pub config_path: String,
}

impl Default for BundleLayout {
    fn default() -> Self {
        Self {
            rule_extension: "rego".to_string(),
            config_path: "data.json".to_string(),
        }
    }
}

impl From<&BundleConfig> for BundleLayout {
    fn from(config: &BundleConfig) -> Self {
        Self {
            rule_extension: config.rule_extension.clone(),
            config_path: config.config_path.clone(),
        }
    }
}

/// Everything read out of a bundle
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedBundle {
    /// Rule modules sorted by id
    pub modules: Vec<RuleModule>,

    /// Parsed configuration document
    pub config: ConfigDocument,
}

/// Loads rule modules and the configuration document from a bundle
///
/// # Example
///
/// ```rust,ignore
/// use regent_repository::{BundleLoader, MemoryBundle};
///
/// let bundle = MemoryBundle::new()
///     .with_file("authz.rego", "package authz")
///     .with_file("data.json", "{}");
/// let loaded = BundleLoader::new(Arc::new(bundle)).load_all(&Cancellation::new()).await?;
/// ```
#[derive(Clone)]
pub struct BundleLoader {
    bundle: Arc<dyn Bundle>,
    layout: BundleLayout,
}

impl BundleLoader {
    /// Create a loader over `bundle` with the default layout
    pub fn new(bundle: Arc<dyn Bundle>) -> Self {
        Self {
            bundle,
            layout: BundleLayout::default(),
        }
    }

    pub fn with_layout(mut self, layout: BundleLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Open the bundle described by `config`
    ///
    /// Only file system sources can be opened from configuration alone. A
    /// memory source has no content until the host supplies a bundle handle
    /// through [`BundleLoader::new`], so it is rejected here.
    pub fn from_config(config: &BundleConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| RegentError::Config(e.to_string()))?;

        let bundle: Arc<dyn Bundle> = match config.source {
            BundleSource::FileSystem => {
                let base_path = config.base_path.as_deref().unwrap_or_default();
                Arc::new(FileSystemBundle::new(base_path)?)
            }
            BundleSource::Memory => {
                return Err(RegentError::Config(
                    "memory bundle source needs a bundle handle supplied by the host"
                        .to_string(),
                ))
            }
        };

        Ok(Self::new(bundle).with_layout(BundleLayout::from(config)))
    }

    pub fn layout(&self) -> &BundleLayout {
        &self.layout
    }

    /// Load all rule modules and the configuration document
    pub async fn load_all(&self, cancel: &Cancellation) -> Result<LoadedBundle> {
        cancel.check(STAGE)?;
        info!("Loading bundle from {}", self.bundle.describe());

        let files = cancel.run(STAGE, self.bundle.list_files()).await??;

        let mut modules = Vec::new();
        for path in files.iter().filter(|p| self.is_rule_file(p)) {
            let bytes = cancel.run(STAGE, self.bundle.read_file(path)).await??;
            let source = String::from_utf8(bytes).map_err(|e| {
                LoadError::new(LoadErrorKind::ReadFailure, path.as_str(), e.to_string())
            })?;
            debug!("Loaded rule module {} ({} bytes)", path, source.len());
            modules.push(RuleModule::new(path.as_str(), source));
        }
        modules.sort_by(|a, b| a.id.cmp(&b.id));

        let config = self.load_config_document(cancel).await?;

        info!(
            "Loaded {} rule modules and configuration document {}",
            modules.len(),
            self.layout.config_path
        );

        Ok(LoadedBundle { modules, config })
    }

    /// Read and parse the configuration document
    async fn load_config_document(&self, cancel: &Cancellation) -> Result<ConfigDocument> {
        let path = self.layout.config_path.as_str();
        let bytes = cancel.run(STAGE, self.bundle.read_file(path)).await??;
        Ok(parse_config_document(path, &bytes)?)
    }

    fn is_rule_file(&self, path: &str) -> bool {
        path != self.layout.config_path
            && Path::new(path).extension().and_then(|ext| ext.to_str())
                == Some(self.layout.rule_extension.as_str())
    }
}

/// Parse a configuration document, YAML for `.yaml`/`.yml`, JSON otherwise
pub fn parse_config_document(
    path: &str,
    bytes: &[u8],
) -> std::result::Result<ConfigDocument, LoadError> {
    let parse_failure =
        |detail: String| LoadError::new(LoadErrorKind::ParseFailure, path, detail);

    let value: Value = match Path::new(path).extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => {
            serde_yaml::from_slice(bytes).map_err(|e| parse_failure(e.to_string()))?
        }
        _ => serde_json::from_slice(bytes).map_err(|e| parse_failure(e.to_string()))?,
    };

    ConfigDocument::from_value(value).ok_or_else(|| {
        parse_failure("configuration document must be an object or an array".to_string())
    })
}
