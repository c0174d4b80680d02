//! Single-subject commands.

use anyhow::{bail, Context, Result};
use colored::Colorize;
use subjects_core::EntityService;

use super::read_input;

pub async fn cmd_init<S: EntityService>(service: &S) -> Result<()> {
    service
        .initialise()
        .await
        .context("Failed to set up constraints")?;
    println!("{}", "Constraints ensured.".green());
    Ok(())
}

pub async fn cmd_read<S: EntityService>(service: &S, uuid: &str) -> Result<()> {
    match service.read(uuid).await? {
        Some(entity) => {
            println!("{}", serde_json::to_string_pretty(&entity)?);
            Ok(())
        }
        None => bail!("Subject {uuid} not found"),
    }
}

pub async fn cmd_write<S: EntityService>(service: &S, input: &str) -> Result<()> {
    let raw = read_input(input).await?;
    let (entity, uuid) = service
        .decode_json(raw.as_bytes())
        .with_context(|| format!("Invalid subject in {input}"))?;

    service
        .write(&entity)
        .await
        .with_context(|| format!("Failed to write subject {uuid}"))?;
    println!("{} {}", "Written".green(), uuid.cyan());
    Ok(())
}

pub async fn cmd_delete<S: EntityService>(service: &S, uuid: &str) -> Result<()> {
    if service.delete(uuid).await? {
        println!("{} {}", "Deleted".green(), uuid.cyan());
        Ok(())
    } else {
        bail!("Subject {uuid} not found")
    }
}

pub async fn cmd_count<S: EntityService>(service: &S) -> Result<()> {
    let count = service.count().await?;
    println!("{}", count);
    Ok(())
}

/// Probe the store, returning the status line naming what was probed.
pub async fn check_report<S: EntityService>(service: &S) -> Result<String> {
    let store = service.describe();
    match service.check().await {
        Ok(()) => Ok(format!("OK {store}")),
        Err(e) => {
            tracing::warn!(store = %store, error = %e, "Health check failed");
            Err(anyhow::Error::new(e).context(format!(
                "Cannot read/write subjects: cannot connect to {store}"
            )))
        }
    }
}

pub async fn cmd_check<S: EntityService>(service: &S) -> Result<()> {
    let report = check_report(service).await?;
    println!("{}", report.green().bold());
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use subjects_graph::{MemoryStore, ServiceConfig, SubjectService};

    use super::*;

    #[tokio::test]
    async fn test_check_report_names_store() {
        let store = Arc::new(MemoryStore::new());
        let service = SubjectService::new(store.clone(), ServiceConfig::default());

        assert_eq!(check_report(&service).await.unwrap(), "OK in-memory graph");

        store.set_available(false);
        let err = check_report(&service).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot read/write subjects: cannot connect to in-memory graph"
        );
        assert!(format!("{err:#}").contains("memory store is offline"));
    }
}
