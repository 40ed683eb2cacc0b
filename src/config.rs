//! Relation settings loaded from `config/config.toml` or the environment.
//!
//! ```toml
//! [relations]
//! default_name = "owner"
//! ```
//!
//! or `LINEAGE__RELATIONS__DEFAULT_NAME=owner`.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::relation::{RelationOptions, DEFAULT_RELATION_NAME};

const CONFIG_FILE: &str = "config/config.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RelationsConfig {
    #[serde(default = "default_relation_name")]
    pub default_name: String,
}

fn default_relation_name() -> String {
    DEFAULT_RELATION_NAME.to_string()
}

impl Default for RelationsConfig {
    fn default() -> Self {
        Self {
            default_name: default_relation_name(),
        }
    }
}

impl RelationsConfig {
    /// Load the `relations` section from `config/config.toml`, falling back to env vars.
    /// A missing section yields the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix("LINEAGE").separator("__"));

        let settings = match builder.build() {
            Ok(cfg) => cfg,
            Err(err) => {
                if std::path::Path::new(CONFIG_FILE).exists() {
                    log::warn!("failed to load {}, falling back to env: {}", CONFIG_FILE, err);
                }
                Config::builder()
                    .add_source(Environment::with_prefix("LINEAGE").separator("__"))
                    .build()
                    .map_err(|env_err| {
                        ConfigError::Message(format!(
                            "Failed to load configuration from file and env: {}, then env-only error: {}",
                            err, env_err
                        ))
                    })?
            }
        };

        Self::from_config(&settings)
    }

    fn from_config(settings: &Config) -> Result<Self, ConfigError> {
        match settings.get::<RelationsConfig>("relations") {
            Ok(config) => Ok(config),
            Err(ConfigError::NotFound(_)) => Ok(Self::default()),
            Err(e) => Err(ConfigError::Message(format!(
                "Relations configuration could not be loaded from file or environment: {}",
                e
            ))),
        }
    }

    /// Inclusion options using the configured default name
    pub fn options(&self) -> RelationOptions {
        RelationOptions::named(self.default_name.clone())
    }
}
