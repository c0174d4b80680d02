//! Newline-delimited subject feed ingestion.
//!
//! Each line is one full Subject document. When a uuid appears more than once
//! only its last line is written: writes replace the whole subject, so this is
//! the state applying the feed in order would leave behind. Distinct uuids are
//! written concurrently.

use std::collections::HashMap;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use futures::stream::{self, StreamExt};
use subjects_core::EntityService;
use tracing::{info, warn};

use super::read_input;

#[derive(Debug, Args)]
pub struct IngestArgs {
    /// Feed file, or `-` for stdin
    pub input: String,

    /// Maximum writes in flight
    #[arg(long, default_value = "4")]
    pub concurrency: usize,

    /// Do not declare constraints before writing
    #[arg(long)]
    pub skip_init: bool,
}

/// One decodable feed line.
pub struct FeedRecord<E> {
    pub line: usize,
    pub uuid: String,
    pub entity: E,
}

pub struct FeedPlan<E> {
    pub records: Vec<FeedRecord<E>>,
    pub malformed: Vec<(usize, String)>,
    pub superseded: usize,
}

/// Decode every line of a feed and keep the last record per uuid.
pub fn plan_feed<S: EntityService>(service: &S, raw: &str) -> FeedPlan<S::Entity> {
    let mut records: Vec<FeedRecord<S::Entity>> = Vec::new();
    let mut latest: HashMap<String, usize> = HashMap::new();
    let mut malformed = Vec::new();
    let mut superseded = 0;

    for (index, text) in raw.lines().enumerate() {
        let line = index + 1;
        if text.trim().is_empty() {
            continue;
        }
        match service.decode_json(text.as_bytes()) {
            Ok((entity, uuid)) => {
                let record = FeedRecord {
                    line,
                    uuid: uuid.clone(),
                    entity,
                };
                match latest.get(&uuid) {
                    Some(&slot) => {
                        records[slot] = record;
                        superseded += 1;
                    }
                    None => {
                        latest.insert(uuid, records.len());
                        records.push(record);
                    }
                }
            }
            Err(e) => malformed.push((line, e.to_string())),
        }
    }

    FeedPlan {
        records,
        malformed,
        superseded,
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub written: usize,
    pub failed: usize,
    pub malformed: usize,
    pub superseded: usize,
}

/// Write a planned feed, returning what happened.
pub async fn run_feed<S: EntityService>(
    service: &S,
    plan: FeedPlan<S::Entity>,
    concurrency: usize,
) -> IngestSummary {
    for (line, reason) in &plan.malformed {
        warn!(line, reason = %reason, "Skipping malformed record");
    }

    let outcomes: Vec<_> = stream::iter(plan.records)
        .map(|record| async move {
            let outcome = service.write(&record.entity).await;
            (record.line, record.uuid, outcome)
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let mut summary = IngestSummary {
        malformed: plan.malformed.len(),
        superseded: plan.superseded,
        ..IngestSummary::default()
    };
    for (line, uuid, outcome) in outcomes {
        match outcome {
            Ok(()) => summary.written += 1,
            Err(e) => {
                warn!(line, uuid = %uuid, error = %e, "Failed to write subject");
                summary.failed += 1;
            }
        }
    }
    summary
}

pub async fn execute<S: EntityService>(service: &S, args: IngestArgs) -> Result<()> {
    if !args.skip_init {
        service
            .initialise()
            .await
            .context("Failed to set up constraints")?;
    }

    let raw = read_input(&args.input).await?;
    let plan = plan_feed(service, &raw);
    info!(records = plan.records.len(), "Ingesting feed");
    let summary = run_feed(service, plan, args.concurrency).await;

    println!("{}", "Ingest complete:".bold());
    println!("  Written:    {}", summary.written.to_string().green());
    println!("  Superseded: {}", summary.superseded.to_string().dimmed());
    println!("  Malformed:  {}", summary.malformed.to_string().yellow());
    println!("  Failed:     {}", summary.failed.to_string().red());

    if summary.failed > 0 {
        bail!("{} subjects failed to write", summary.failed);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use subjects_graph::{MemoryStore, ServiceConfig, SubjectService};

    use super::*;

    fn service() -> SubjectService<Arc<MemoryStore>> {
        SubjectService::new(Arc::new(MemoryStore::new()), ServiceConfig::default())
    }

    const FEED: &str = r#"{"uuid":"1","prefLabel":"First","alternativeIdentifiers":{"TME":["T1"],"uuids":["1"]}}

{"uuid":"2","prefLabel":"Second"}
{"prefLabel":"No uuid"}
not json at all
{"uuid":"1","prefLabel":"First again","alternativeIdentifiers":{"uuids":["1"]}}
"#;

    #[test]
    fn test_plan_keeps_last_record_per_uuid() {
        let plan = plan_feed(&service(), FEED);

        assert_eq!(plan.records.len(), 2);
        assert_eq!(plan.records[0].uuid, "1");
        assert_eq!(plan.records[0].line, 6);
        assert_eq!(plan.records[0].entity.pref_label.as_deref(), Some("First again"));
        assert_eq!(plan.records[1].uuid, "2");
        assert_eq!(plan.superseded, 1);
        assert_eq!(
            plan.malformed.iter().map(|(line, _)| *line).collect::<Vec<_>>(),
            vec![4, 5]
        );
    }

    #[tokio::test]
    async fn test_run_feed_writes_latest_state() {
        let service = service();
        service.initialise().await.unwrap();
        let plan = plan_feed(&service, FEED);

        let summary = run_feed(&service, plan, 4).await;
        assert_eq!(
            summary,
            IngestSummary {
                written: 2,
                failed: 0,
                malformed: 2,
                superseded: 1,
            }
        );

        let first = service.read("1").await.unwrap().unwrap();
        assert_eq!(first.pref_label.as_deref(), Some("First again"));
        assert!(first.alternative_identifiers.tme.is_empty());
        assert_eq!(service.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_run_feed_counts_store_failures() {
        let service = service();
        service.initialise().await.unwrap();
        let feed = r#"{"uuid":"a","alternativeIdentifiers":{"TME":["shared"]}}
{"uuid":"b","alternativeIdentifiers":{"TME":["shared"]}}"#;

        let summary = run_feed(&service, plan_feed(&service, feed), 1).await;
        assert_eq!(summary.written, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(service.count().await.unwrap(), 1);
    }
}
