//! Subject reconciliation engine.
//!
//! Every operation is one batch submitted to the store gateway. The engine
//! never retries and keeps no state between calls beyond its configuration.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use subjects_core::subject::model::canonical_types;
use subjects_core::{decode_subject, validate, AlternativeIdentifiers, EntityService, Subject, SubjectsResult};
use tracing::{debug, info};

use crate::error::{GraphError, GraphResult};
use crate::queries::subjects as queries;
use crate::schema::SUBJECT_CONSTRAINTS;
use crate::statement::{Record, Statement, StatementResult, LABELS_REMOVED, SUBJECT_COUNT};
use crate::store::GraphStore;

/// Engine settings fixed at startup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Statement count above which a batch is logged as oversized. A single
    /// entity's batch always runs as one transaction whatever its size.
    pub batch_size: usize,
    /// Upper bound on a single batch round trip.
    pub request_timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            batch_size: 1024,
            request_timeout_secs: 30,
        }
    }
}

impl ServiceConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Reads and reconciles Subjects against a [`GraphStore`].
pub struct SubjectService<S> {
    store: S,
    config: ServiceConfig,
}

impl<S: GraphStore> SubjectService<S> {
    pub fn new(store: S, config: ServiceConfig) -> Self {
        Self { store, config }
    }

    async fn submit(&self, batch: &[Statement]) -> GraphResult<Vec<StatementResult>> {
        if batch.len() > self.config.batch_size {
            debug!(
                statements = batch.len(),
                batch_size = self.config.batch_size,
                "Batch exceeds batch size, running as one transaction"
            );
        }
        let results = self.store.run_batch(batch).await?;
        if results.len() != batch.len() {
            return Err(GraphError::decode(format!(
                "expected {} statement results, got {}",
                batch.len(),
                results.len()
            )));
        }
        Ok(results)
    }

    async fn submit_one(&self, statement: Statement) -> GraphResult<StatementResult> {
        let mut results = self.submit(std::slice::from_ref(&statement)).await?;
        results
            .pop()
            .ok_or_else(|| GraphError::decode("empty result set"))
    }
}

#[derive(Deserialize)]
struct SubjectRow {
    uuid: String,
    #[serde(rename = "prefLabel")]
    pref_label: Option<String>,
    #[serde(default)]
    types: Vec<String>,
    #[serde(default)]
    uuids: Vec<String>,
    #[serde(default)]
    tme: Vec<String>,
}

impl From<SubjectRow> for Subject {
    fn from(row: SubjectRow) -> Self {
        Subject {
            uuid: row.uuid,
            pref_label: row.pref_label,
            alternative_identifiers: AlternativeIdentifiers {
                tme: row.tme,
                uuids: row.uuids,
            }
            .normalized(),
            types: canonical_types(row.types),
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(record: &Record) -> GraphResult<T> {
    serde_json::from_value(serde_json::Value::Object(record.clone()))
        .map_err(|e| GraphError::decode(e.to_string()))
}

fn int_column(record: &Record, column: &str) -> GraphResult<i64> {
    record
        .get(column)
        .and_then(serde_json::Value::as_i64)
        .ok_or_else(|| GraphError::decode(format!("missing integer column '{column}'")))
}

#[async_trait]
impl<S: GraphStore> EntityService for SubjectService<S> {
    type Entity = Subject;
    type Error = GraphError;

    fn decode_json(&self, input: &[u8]) -> SubjectsResult<(Subject, String)> {
        let subject = decode_subject(input)?;
        let uuid = subject.uuid.clone();
        Ok((subject, uuid))
    }

    async fn initialise(&self) -> GraphResult<()> {
        self.store.ensure_constraints(SUBJECT_CONSTRAINTS).await?;
        info!(store = %self.store.describe(), "Subject constraints initialised");
        Ok(())
    }

    async fn read(&self, uuid: &str) -> GraphResult<Option<Subject>> {
        let result = self.submit_one(queries::read_statement(uuid)).await?;
        match result.first() {
            Some(record) => Ok(Some(decode::<SubjectRow>(record)?.into())),
            None => {
                debug!(uuid, "Subject not found");
                Ok(None)
            }
        }
    }

    async fn write(&self, subject: &Subject) -> GraphResult<()> {
        validate(subject)?;
        let batch = queries::write_batch(subject);
        debug!(uuid = %subject.uuid, statements = batch.len(), "Writing subject");
        self.submit(&batch).await?;
        Ok(())
    }

    async fn delete(&self, uuid: &str) -> GraphResult<bool> {
        let batch = queries::delete_batch(uuid);
        let results = self.submit(&batch).await?;

        // A returned row means the node matched and its properties were reset.
        // Deletion is only reported when classification labels came off too, so
        // an already skeletal node reads as not found.
        let deleted = match results[0].first() {
            Some(record) => int_column(record, LABELS_REMOVED)? > 0,
            None => false,
        };
        debug!(uuid, deleted, "Deleted subject");
        Ok(deleted)
    }

    async fn count(&self) -> GraphResult<u64> {
        let result = self.submit_one(queries::count_statement()).await?;
        let record = result
            .first()
            .ok_or_else(|| GraphError::decode("count returned no rows"))?;
        let count = int_column(record, SUBJECT_COUNT)?;
        u64::try_from(count).map_err(|_| GraphError::decode(format!("negative count {count}")))
    }

    async fn check(&self) -> GraphResult<()> {
        self.store.check().await
    }

    fn describe(&self) -> String {
        self.store.describe()
    }
}
