//! CLI configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use stats_core::GatewayConfig;

/// CLI configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// SPARQL gateway configuration.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Process log configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CliConfig {
    /// Load config from a file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;
        Self::parse(path, &content)
    }

    /// Parse config text, choosing the format by file extension.
    pub fn parse(path: &str, content: &str) -> Result<Self> {
        if path.ends_with(".json") {
            serde_json::from_str(content)
                .with_context(|| format!("Failed to parse JSON config: {}", path))
        } else {
            toml::from_str(content).with_context(|| format!("Failed to parse TOML config: {}", path))
        }
    }

    /// Save config to a file.
    pub fn save(&self, path: &str) -> Result<()> {
        let content = if path.ends_with(".json") {
            serde_json::to_string_pretty(self)?
        } else {
            toml::to_string_pretty(self)?
        };

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path))
    }

    /// Gateway configuration with environment overrides applied.
    pub fn resolved_gateway(&self) -> Result<GatewayConfig> {
        let mut gateway = self.gateway.clone();
        gateway
            .apply_env()
            .context("Invalid environment override")?;
        Ok(gateway)
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address.
    #[serde(default = "default_addr")]
    pub addr: String,
}

fn default_addr() -> String {
    "127.0.0.1:3000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
        }
    }
}

/// Process log configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

/// Generate a default stats.toml config file.
pub fn generate_default_config(endpoint: &str) -> String {
    format!(
        r#"# Archive statistics configuration

[gateway]
endpoint = "{endpoint}"
# Seconds a cached result stays fresh
cache_ttl_secs = 3600
request_timeout_secs = 30
connect_timeout_secs = 5
# "development" enables info logs; "production" logs errors only
environment = "production"

[server]
addr = "127.0.0.1:3000"

[logging]
# filter = "info,stats_server=debug"
"#,
        endpoint = endpoint
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use stats_core::Environment;

    #[test]
    fn test_generated_config_parses() {
        let text = generate_default_config("http://localhost:7200/repositories/news");
        let config = CliConfig::parse("stats.toml", &text).unwrap();

        assert_eq!(
            config.gateway.endpoint(),
            Some("http://localhost:7200/repositories/news")
        );
        assert_eq!(config.gateway.cache_ttl_secs, 3600);
        assert_eq!(config.gateway.environment, Environment::Production);
        assert_eq!(config.server.addr, "127.0.0.1:3000");
        assert!(config.logging.filter.is_none());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = CliConfig::parse("stats.toml", "").unwrap();
        assert_eq!(config.gateway.endpoint(), None);
        assert_eq!(config.server.addr, "127.0.0.1:3000");
    }

    #[test]
    fn test_json_config() {
        let config = CliConfig::parse(
            "stats.json",
            r#"{"gateway": {"endpoint": "https://graph/sparql", "environment": "development"}}"#,
        )
        .unwrap();
        assert!(config.gateway.environment.is_development());
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let err = CliConfig::parse("stats.toml", "[gateway\n").unwrap_err();
        assert!(err.to_string().contains("stats.toml"));
    }
}
