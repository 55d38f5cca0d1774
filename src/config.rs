//! Configuration with layered resolution using figment.
//!
//! Resolution order (highest priority last):
//! 1. User config: `~/.config/neoquent/config.toml` (XDG) or platform config dir
//! 2. Project config: `.neoquent.toml`
//! 3. Environment variables: `NEOQUENT_*`, nested with `__`
//!    (e.g. `NEOQUENT_QUERY__BATCH_SIZE=100`)
//!
//! # Example
//!
//! ```toml
//! [neo4j]
//! uri = "127.0.0.1:7687"
//! user = "neo4j"
//! password = "secret"
//!
//! [query]
//! batch_size = 250
//! per_page = 20
//! ```

use std::ops::Deref;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;

/// Boxed wrapper for figment::Error to reduce Result size on the stack.
#[derive(Debug)]
pub struct ConfigError(Box<figment::Error>);

impl Deref for ConfigError {
    type Target = figment::Error;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self(Box::new(err))
    }
}

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub neo4j: Neo4jConfig,
    #[serde(default)]
    pub query: QueryConfig,
}

/// Neo4j connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Neo4jConfig {
    /// Bolt address, e.g. `127.0.0.1:7687` or `neo4j://host:7687`.
    pub uri: String,
    #[serde(default = "default_user")]
    pub user: String,
    #[serde(default)]
    pub password: Option<String>,
}

/// Query builder and mapper tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryConfig {
    /// Rows per round trip for bulk inserts.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Page size used when the caller does not pick one.
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            per_page: default_per_page(),
        }
    }
}

fn default_user() -> String {
    "neo4j".to_string()
}

fn default_batch_size() -> usize {
    500
}

fn default_per_page() -> u64 {
    15
}

impl Config {
    /// Load config with layered resolution (user → project → env).
    pub fn load() -> Result<Self, ConfigError> {
        let figment = Figment::new()
            // Layer 1: User config (lowest priority)
            .merge(Toml::file(Self::user_config_path()))
            // Layer 2: Project config
            .merge(Toml::file(".neoquent.toml"))
            // Layer 3: Environment variables (highest priority)
            .merge(Env::prefixed("NEOQUENT_").split("__"));

        Self::from_figment(figment)
    }

    /// Extracts the configuration from an already assembled figment.
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        figment.extract().map_err(ConfigError::from)
    }

    /// User config path: ~/.config/neoquent/config.toml (XDG) or platform config dir.
    fn user_config_path() -> std::path::PathBuf {
        if let Some(home) = dirs::home_dir() {
            let xdg_path = home.join(".config").join("neoquent").join("config.toml");
            if xdg_path.exists() {
                return xdg_path;
            }
        }
        dirs::config_dir()
            .map(|p| p.join("neoquent").join("config.toml"))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied() {
        let figment = Figment::new().merge(Toml::string(
            r#"
            [neo4j]
            uri = "127.0.0.1:7687"
            "#,
        ));

        let config = Config::from_figment(figment).unwrap();
        assert_eq!(config.neo4j.user, "neo4j");
        assert_eq!(config.neo4j.password, None);
        assert_eq!(config.query.batch_size, 500);
        assert_eq!(config.query.per_page, 15);
    }

    #[test]
    fn test_later_layer_wins() {
        let figment = Figment::new()
            .merge(Toml::string(
                r#"
                [neo4j]
                uri = "127.0.0.1:7687"
                [query]
                batch_size = 100
                "#,
            ))
            .merge(Toml::string(
                r#"
                [query]
                batch_size = 25
                "#,
            ));

        let config = Config::from_figment(figment).unwrap();
        assert_eq!(config.query.batch_size, 25);
    }

    #[test]
    fn test_missing_uri_is_error() {
        let figment = Figment::new().merge(Toml::string("[query]\nper_page = 3\n"));
        assert!(Config::from_figment(figment).is_err());
    }
}
