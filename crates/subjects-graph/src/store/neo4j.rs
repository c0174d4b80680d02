//! Neo4j gateway. Each batch runs inside one explicit transaction.

use std::time::Duration;

use async_trait::async_trait;
use neo4rs::{BoltNull, BoltType, Query, Row, Txn};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::client::GraphClient;
use crate::error::{GraphError, GraphResult};
use crate::schema::UniqueConstraint;
use crate::statement::{Param, Record, Statement, StatementResult, LABELS_REMOVED, SUBJECT_COUNT};
use crate::store::GraphStore;

pub struct Neo4jStore {
    client: GraphClient,
    timeout: Duration,
}

impl Neo4jStore {
    pub fn new(client: GraphClient, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    async fn run_in_txn(&self, batch: &[Statement]) -> GraphResult<Vec<StatementResult>> {
        let mut txn = self.client.inner().start_txn().await?;
        let mut results = Vec::with_capacity(batch.len());

        for (index, statement) in batch.iter().enumerate() {
            match run_statement(&mut txn, statement).await {
                Ok(result) => results.push(result),
                Err(e) => {
                    if let Err(rollback) = txn.rollback().await {
                        warn!(error = %rollback, "Rollback after failed statement also failed");
                    }
                    return Err(GraphError::execution(index, e));
                }
            }
        }

        txn.commit().await?;
        Ok(results)
    }
}

#[async_trait]
impl GraphStore for Neo4jStore {
    async fn run_batch(&self, batch: &[Statement]) -> GraphResult<Vec<StatementResult>> {
        tokio::time::timeout(self.timeout, self.run_in_txn(batch))
            .await
            .map_err(|_| GraphError::Timeout(self.timeout))?
    }

    async fn ensure_constraints(&self, constraints: &[UniqueConstraint]) -> GraphResult<()> {
        for constraint in constraints {
            self.client
                .inner()
                .run(Query::new(constraint.cypher()))
                .await
                .map_err(|e| GraphError::ConstraintSetup {
                    label: constraint.label.to_string(),
                    property: constraint.property.to_string(),
                    reason: e.to_string(),
                })?;
            debug!(name = %constraint.name(), "Constraint ensured");
        }
        info!(count = constraints.len(), "Neo4j constraints ensured");
        Ok(())
    }

    async fn check(&self) -> GraphResult<()> {
        let probe = self.client.inner().run(Query::new("RETURN 1".to_string()));
        tokio::time::timeout(self.timeout, probe)
            .await
            .map_err(|_| GraphError::Timeout(self.timeout))??;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("Neo4j at {}", self.client.uri())
    }
}

/// Render a statement as a bound neo4rs query.
pub fn to_query(statement: &Statement) -> Query {
    statement
        .params()
        .into_iter()
        .fold(Query::new(statement.cypher()), |query, (name, value)| match value {
            Param::Text(text) => query.param(name, text),
            Param::Null => query.param(name, BoltType::Null(BoltNull)),
        })
}

async fn run_statement(txn: &mut Txn, statement: &Statement) -> GraphResult<StatementResult> {
    let mut stream = txn.execute(to_query(statement)).await?;
    let mut rows = Vec::new();
    while let Some(row) = stream.next(txn.handle()).await? {
        rows.push(decode_row(statement, &row)?);
    }
    Ok(StatementResult { rows })
}

fn decode_row(statement: &Statement, row: &Row) -> GraphResult<Record> {
    let mut record = Record::new();
    match statement {
        Statement::ReadSubject { .. } => {
            let uuid: String = get(row, "uuid")?;
            let pref_label: Option<String> = get(row, "prefLabel")?;
            record.insert("uuid".into(), Value::from(uuid));
            record.insert("prefLabel".into(), pref_label.map_or(Value::Null, Value::from));
            for column in ["types", "uuids", "tme"] {
                let values: Vec<String> = get(row, column)?;
                record.insert(column.into(), Value::from(values));
            }
        }
        Statement::ClearSubject { .. } => {
            let removed: i64 = get(row, LABELS_REMOVED)?;
            record.insert(LABELS_REMOVED.into(), Value::from(removed));
        }
        Statement::CountSubjects => {
            let count: i64 = get(row, SUBJECT_COUNT)?;
            record.insert(SUBJECT_COUNT.into(), Value::from(count));
        }
        _ => {}
    }
    Ok(record)
}

fn get<T: serde::de::DeserializeOwned>(row: &Row, column: &str) -> GraphResult<T> {
    row.get(column)
        .map_err(|e| GraphError::decode(format!("column '{column}': {e:?}")))
}
