use std::env;

use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub auth: AuthConfig,
    pub alias: AliasConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// Token signing secret; at least 32 bytes.
    pub secret: String,
    /// Time-to-live window applied relative to a token's marker.
    pub ttl_seconds: i64,
    /// Header under which clients present tokens.
    pub header: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AliasConfig {
    pub ttl_seconds: u64,
    pub capacity: usize,
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (AUTH__SECRET, ALIAS__TTL_SECONDS, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: AUTH__TTL_SECONDS=3600 overrides auth.ttl_seconds
            .add_source(Environment::with_prefix("").separator("__"))
            .build()?;

        let config: Config = configuration.try_deserialize()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use config::FileFormat;

    use super::*;

    #[test]
    fn test_deserializes_from_toml() {
        let raw = r#"
            [auth]
            secret = "test_secret_key_at_least_32_bytes!"
            ttl_seconds = 3600
            header = "x-auth-token"

            [alias]
            ttl_seconds = 300
            capacity = 1024
        "#;

        let config: Config = ConfigBuilder::builder()
            .add_source(File::from_str(raw, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.auth.ttl_seconds, 3600);
        assert_eq!(config.auth.header, "x-auth-token");
        assert_eq!(config.alias.ttl_seconds, 300);
        assert_eq!(config.alias.capacity, 1024);
    }
}
