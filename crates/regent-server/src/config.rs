//! Server configuration

use regent_sdk::{BindingStrategy, BundleConfig, EngineConfig};
use serde::{Deserialize, Serialize};

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Server configuration
///
/// Missing keys fall back to [`ServerConfig::default`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host
    pub host: String,

    /// Server port (HTTP)
    pub port: u16,

    /// Bundle holding rule modules and the configuration document
    pub bundle: BundleConfig,

    /// How the configuration document is exposed to rules
    pub strategy: BindingStrategy,

    /// Dotted data namespace of the configuration document
    pub namespace: String,

    /// Queries prepared at startup and on every reload
    pub queries: Vec<String>,

    /// Per-request evaluation deadline in milliseconds
    pub request_timeout_ms: Option<u64>,

    /// Log output format
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            bundle: BundleConfig::file_system("policies"),
            strategy: BindingStrategy::default(),
            namespace: "config".to_string(),
            queries: Vec::new(),
            request_timeout_ms: None,
            log_format: LogFormat::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables and config file
    ///
    /// A missing `config/server.*` file means defaults; a malformed one, or
    /// a `REGENT_*` value of the wrong type, is an error.
    pub fn load() -> anyhow::Result<Self> {
        // Load .env file if exists
        dotenvy::dotenv().ok();

        Self::from_file(config::File::with_name("config/server").required(false))
    }

    /// Layer `REGENT_*` environment variables over `file`
    pub fn from_file<S>(file: S) -> anyhow::Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("REGENT")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("queries")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to read config: {}", e))?
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!("Failed to deserialize config: {}", e))
    }

    /// Engine configuration for the SDK
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            bundle: Some(self.bundle.clone()),
            strategy: self.strategy,
            namespace: self.namespace.clone(),
            queries: self.queries.clone(),
            timeout_ms: self.request_timeout_ms,
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regent_sdk::BundleSource;

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.bundle.source, BundleSource::FileSystem);
        assert_eq!(config.bundle.base_path.as_deref(), Some("policies"));
        assert_eq!(config.strategy, BindingStrategy::ParsedValue);
        assert_eq!(config.namespace, "config");
        assert!(config.queries.is_empty());
        assert!(config.request_timeout_ms.is_none());
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn test_engine_config_conversion() {
        let config = ServerConfig {
            strategy: BindingStrategy::InputNamespace,
            queries: vec!["data.authz.allow".to_string()],
            request_timeout_ms: Some(500),
            ..ServerConfig::default()
        };

        let engine = config.engine_config();

        assert_eq!(engine.strategy, BindingStrategy::InputNamespace);
        assert_eq!(engine.queries, vec!["data.authz.allow".to_string()]);
        assert_eq!(engine.timeout_ms, Some(500));
        assert_eq!(engine.bundle, Some(config.bundle.clone()));
    }

    #[test]
    fn test_deserialize_from_yaml_source() {
        let yaml = r#"
host: 0.0.0.0
port: 9000
bundle:
  source: memory
strategy: synthetic_module
queries:
  - data.authz.allow
log_format: json
"#;
        let config: ServerConfig = config::Config::builder()
            .add_source(config::File::from_str(yaml, config::FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.address(), "0.0.0.0:9000");
        assert_eq!(config.bundle.source, BundleSource::Memory);
        assert_eq!(config.bundle.config_path, "data.json");
        assert_eq!(config.strategy, BindingStrategy::SyntheticModule);
        assert_eq!(config.namespace, "config");
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let file = config::File::from_str(
            "port: [8080\nstrategy: store\n",
            config::FileFormat::Yaml,
        );

        let err = ServerConfig::from_file(file).unwrap_err();

        assert!(err.to_string().contains("Failed to read config"));
    }

    #[test]
    fn test_wrongly_typed_value_is_an_error() {
        let file = config::File::from_str(
            "port: eighty\nstrategy: store\n",
            config::FileFormat::Yaml,
        );

        let err = ServerConfig::from_file(file).unwrap_err();

        assert!(err.to_string().contains("Failed to deserialize config"));
    }

    #[test]
    fn test_unknown_strategy_is_an_error() {
        let file = config::File::from_str("strategy: telepathy\n", config::FileFormat::Yaml);

        assert!(ServerConfig::from_file(file).is_err());
    }

    #[test]
    fn test_from_file_applies_file_values() {
        let file = config::File::from_str(
            "port: 9100\nstrategy: store\nnamespace: app\n",
            config::FileFormat::Yaml,
        );

        let config = ServerConfig::from_file(file).unwrap();

        assert_eq!(config.port, 9100);
        assert_eq!(config.strategy, BindingStrategy::Store);
        assert_eq!(config.namespace, "app");
        assert_eq!(config.host, "127.0.0.1");
    }

    #[test]
    fn test_server_config_debug_format() {
        let config = ServerConfig::default();
        let debug_str = format!("{:?}", config);

        assert!(debug_str.contains("ServerConfig"));
        assert!(debug_str.contains("127.0.0.1"));
        assert!(debug_str.contains("8080"));
    }
}
