//! Process configuration: defaults, then an optional TOML file, then flags/env.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use subjects_graph::{GraphConfig, ServiceConfig};

use crate::commands::ConnectionArgs;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub graph: GraphConfig,
    pub service: ServiceConfig,
}

impl AppConfig {
    /// Load from `path` when given, otherwise start from defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file {}", path.display()))?;
                Self::parse(&raw)
                    .with_context(|| format!("Invalid config file {}", path.display()))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Apply flag and environment overrides on top of file values.
    pub fn apply(mut self, args: &ConnectionArgs) -> Result<Self> {
        if let Some(uri) = &args.neo_url {
            self.graph.uri = uri.clone();
        }
        if let Some(user) = &args.neo_user {
            self.graph.user = user.clone();
        }
        if let Some(password) = &args.neo_password {
            self.graph.password = password.clone();
        }
        if let Some(database) = &args.neo_database {
            self.graph.database = database.clone();
        }
        if let Some(batch_size) = args.batch_size {
            self.service.batch_size = batch_size;
        }
        if self.service.batch_size == 0 {
            anyhow::bail!("batch size must be at least 1");
        }
        if self.service.request_timeout_secs == 0 {
            anyhow::bail!("request timeout must be at least 1 second");
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partial_file() {
        let config = AppConfig::parse(
            r#"
            [graph]
            uri = "bolt://neo4j.internal:7687"

            [service]
            batch_size = 64
            "#,
        )
        .unwrap();
        assert_eq!(config.graph.uri, "bolt://neo4j.internal:7687");
        assert_eq!(config.graph.user, "neo4j");
        assert_eq!(config.service.batch_size, 64);
        assert_eq!(config.service.request_timeout_secs, 30);
    }

    #[test]
    fn test_flags_override_file() {
        let args = ConnectionArgs {
            neo_url: Some("bolt://override:7687".into()),
            batch_size: Some(8),
            ..ConnectionArgs::default()
        };
        let config = AppConfig::parse("[service]\nbatch_size = 64\n")
            .unwrap()
            .apply(&args)
            .unwrap();
        assert_eq!(config.graph.uri, "bolt://override:7687");
        assert_eq!(config.service.batch_size, 8);
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let args = ConnectionArgs {
            batch_size: Some(0),
            ..ConnectionArgs::default()
        };
        assert!(AppConfig::default().apply(&args).is_err());
    }

    #[test]
    fn test_zero_request_timeout_rejected() {
        let config = AppConfig::parse("[service]\nrequest_timeout_secs = 0\n").unwrap();
        let err = config.apply(&ConnectionArgs::default()).unwrap_err();
        assert!(err.to_string().contains("request timeout"));
    }

    #[test]
    fn test_unknown_types_rejected() {
        assert!(AppConfig::parse("[service]\nbatch_size = \"lots\"\n").is_err());
    }
}
