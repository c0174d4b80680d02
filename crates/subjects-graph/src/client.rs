//! Neo4j connection client.

use neo4rs::{ConfigBuilder, Graph, Query};
use serde::Deserialize;
use tracing::info;

use crate::error::GraphResult;

/// Configuration for connecting to Neo4j.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub max_connections: usize,
    pub fetch_size: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: "neo4j".to_string(),
            database: "neo4j".to_string(),
            max_connections: 16,
            fetch_size: 200,
        }
    }
}

/// Client for Neo4j operations.
#[derive(Clone)]
pub struct GraphClient {
    graph: Graph,
    uri: String,
}

impl GraphClient {
    /// Create a new GraphClient from config.
    ///
    /// `Graph::connect` only builds the pool; the `RETURN 1` ping forces a real
    /// bolt handshake so an unreachable store fails here instead of on first use.
    pub async fn connect(config: &GraphConfig) -> GraphResult<Self> {
        let neo4j_config = ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.user)
            .password(&config.password)
            .db(config.database.as_str())
            .max_connections(config.max_connections)
            .fetch_size(config.fetch_size)
            .build()?;

        let graph = Graph::connect(neo4j_config).await?;
        graph.run(Query::new("RETURN 1".to_string())).await?;

        info!(uri = %config.uri, database = %config.database, "Connected to Neo4j");
        Ok(Self {
            graph,
            uri: config.uri.clone(),
        })
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Get a reference to the underlying neo4rs Graph.
    pub fn inner(&self) -> &Graph {
        &self.graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_falls_back_to_defaults() {
        let config: GraphConfig =
            serde_json::from_str(r#"{"uri":"bolt://neo4j.internal:7687"}"#).unwrap();
        assert_eq!(config.uri, "bolt://neo4j.internal:7687");
        assert_eq!(config.user, GraphConfig::default().user);
        assert_eq!(config.max_connections, 16);
    }
}
