//! In-memory property graph gateway.
//!
//! Applies statements with the same semantics the Cypher renderings have on
//! Neo4j: MERGE on `Thing.uuid`, refusing to delete nodes that still have
//! relationships, and enforcing declared uniqueness constraints after every
//! statement. A batch is applied to a copy of the graph that replaces the live
//! one only when every statement succeeded.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;
use subjects_core::subject::model::{
    CLASSIFICATION_LABELS, IDENTIFIER_LABEL, IDENTIFIES, THING_LABEL,
};
use subjects_core::IdentifierScheme;
use tracing::debug;

use crate::error::{GraphError, GraphResult};
use crate::schema::UniqueConstraint;
use crate::statement::{Record, Statement, StatementResult, LABELS_REMOVED, SUBJECT_COUNT};
use crate::store::GraphStore;

type NodeId = u64;

#[derive(Debug, Clone, Default)]
struct Node {
    labels: BTreeSet<String>,
    props: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Relationship {
    from: NodeId,
    rel_type: String,
    to: NodeId,
}

#[derive(Debug, Clone, Default)]
struct Graph {
    nodes: BTreeMap<NodeId, Node>,
    relationships: Vec<Relationship>,
    next_id: NodeId,
    constraints: Vec<UniqueConstraint>,
}

/// Read-only view of a stored node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeView {
    pub labels: Vec<String>,
    pub props: BTreeMap<String, String>,
    pub relationships: usize,
}

impl Graph {
    fn find(&self, label: &str, uuid: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|(_, node)| {
                node.labels.contains(label) && node.props.get("uuid").map(String::as_str) == Some(uuid)
            })
            .map(|(id, _)| *id)
    }

    fn create_node(&mut self, labels: &[&str], props: BTreeMap<String, String>) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        self.nodes.insert(
            id,
            Node {
                labels: labels.iter().map(|l| l.to_string()).collect(),
                props,
            },
        );
        id
    }

    fn merge_thing(&mut self, uuid: &str) -> NodeId {
        match self.find(THING_LABEL, uuid) {
            Some(id) => id,
            None => self.create_node(&[THING_LABEL], uuid_props(uuid)),
        }
    }

    fn node_mut(&mut self, id: NodeId) -> GraphResult<&mut Node> {
        self.nodes
            .get_mut(&id)
            .ok_or_else(|| GraphError::Rejected(format!("node {id} vanished mid-statement")))
    }

    fn degree(&self, id: NodeId) -> usize {
        self.relationships
            .iter()
            .filter(|rel| rel.from == id || rel.to == id)
            .count()
    }

    fn delete_node(&mut self, id: NodeId) -> GraphResult<()> {
        if self.degree(id) > 0 {
            return Err(GraphError::Rejected(format!(
                "Cannot delete node {id}, because it still has relationships"
            )));
        }
        self.nodes.remove(&id);
        Ok(())
    }

    /// Identifier nodes pointing at `target`, optionally restricted to a label.
    fn identifiers_of(&self, target: NodeId, label: Option<&str>) -> Vec<NodeId> {
        self.relationships
            .iter()
            .filter(|rel| rel.to == target && rel.rel_type == IDENTIFIES)
            .map(|rel| rel.from)
            .filter(|from| match label {
                Some(label) => self.nodes.get(from).is_some_and(|n| n.labels.contains(label)),
                None => true,
            })
            .collect()
    }

    /// Drop the IDENTIFIES links from `sources` to `target`, then the sources.
    fn delete_identifiers(&mut self, target: NodeId, sources: &[NodeId]) -> GraphResult<()> {
        self.relationships.retain(|rel| {
            !(rel.to == target && rel.rel_type == IDENTIFIES && sources.contains(&rel.from))
        });
        for source in sources {
            self.delete_node(*source)?;
        }
        Ok(())
    }

    fn values_of(&self, target: NodeId, scheme: IdentifierScheme) -> Vec<String> {
        let values: BTreeSet<String> = self
            .identifiers_of(target, Some(scheme.label()))
            .into_iter()
            .filter_map(|id| self.nodes.get(&id)?.props.get("value").cloned())
            .collect();
        values.into_iter().collect()
    }

    fn check_constraints(&self) -> GraphResult<()> {
        for constraint in &self.constraints {
            let mut seen = BTreeSet::new();
            for node in self.nodes.values() {
                if !node.labels.contains(constraint.label) {
                    continue;
                }
                if let Some(value) = node.props.get(constraint.property) {
                    if !seen.insert(value) {
                        return Err(GraphError::ConstraintViolation {
                            label: constraint.label.to_string(),
                            property: constraint.property.to_string(),
                            value: value.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    fn apply(&mut self, statement: &Statement) -> GraphResult<StatementResult> {
        let mut result = StatementResult::default();
        match statement {
            Statement::DetachIdentifiers { uuid } => {
                if let Some(thing) = self.find(THING_LABEL, uuid) {
                    let linked = self.identifiers_of(thing, None);
                    self.delete_identifiers(thing, &linked)?;
                }
            }
            Statement::UpsertSubject { uuid, pref_label } => {
                let id = self.merge_thing(uuid);
                let node = self.node_mut(id)?;
                node.props = uuid_props(uuid);
                if let Some(label) = pref_label {
                    node.props.insert("prefLabel".into(), label.clone());
                }
                node.labels
                    .extend(CLASSIFICATION_LABELS.iter().map(|l| l.to_string()));
            }
            Statement::AttachIdentifier {
                uuid,
                scheme,
                value,
            } => {
                let thing = self.merge_thing(uuid);
                let props = BTreeMap::from([("value".to_string(), value.clone())]);
                let identifier = self.create_node(&[IDENTIFIER_LABEL, scheme.label()], props);
                self.relationships.push(Relationship {
                    from: identifier,
                    rel_type: IDENTIFIES.to_string(),
                    to: thing,
                });
            }
            Statement::ClearSubject { uuid } => {
                let Some(thing) = self.find(THING_LABEL, uuid) else {
                    return Ok(result);
                };
                let identifiers = self.identifiers_of(thing, Some(IDENTIFIER_LABEL));
                self.delete_identifiers(thing, &identifiers)?;

                let node = self.node_mut(thing)?;
                let removed = CLASSIFICATION_LABELS
                    .iter()
                    .filter(|label| node.labels.remove(**label))
                    .count();
                node.props = uuid_props(uuid);

                let mut row = Record::new();
                row.insert(LABELS_REMOVED.into(), Value::from(removed as i64));
                result.rows.push(row);
            }
            Statement::PurgeIfOrphaned { uuid } => {
                if let Some(thing) = self.find(THING_LABEL, uuid) {
                    if self.degree(thing) == 0 {
                        self.delete_node(thing)?;
                    }
                }
            }
            Statement::ReadSubject { uuid } => {
                if let Some(id) = self.find("Subject", uuid) {
                    let node = &self.nodes[&id];
                    let mut row = Record::new();
                    row.insert("uuid".into(), Value::from(uuid.as_str()));
                    row.insert(
                        "prefLabel".into(),
                        node.props
                            .get("prefLabel")
                            .map_or(Value::Null, |label| Value::from(label.as_str())),
                    );
                    row.insert(
                        "types".into(),
                        Value::from(node.labels.iter().cloned().collect::<Vec<_>>()),
                    );
                    row.insert("uuids".into(), Value::from(self.values_of(id, IdentifierScheme::Upp)));
                    row.insert("tme".into(), Value::from(self.values_of(id, IdentifierScheme::Tme)));
                    result.rows.push(row);
                }
            }
            Statement::CountSubjects => {
                let count = self
                    .nodes
                    .values()
                    .filter(|node| node.labels.contains("Subject"))
                    .count();
                let mut row = Record::new();
                row.insert(SUBJECT_COUNT.into(), Value::from(count as i64));
                result.rows.push(row);
            }
        }
        self.check_constraints()?;
        Ok(result)
    }
}

fn uuid_props(uuid: &str) -> BTreeMap<String, String> {
    BTreeMap::from([("uuid".to_string(), uuid.to_string())])
}

/// Graph store held entirely in process memory.
#[derive(Debug)]
pub struct MemoryStore {
    graph: Mutex<Graph>,
    available: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            graph: Mutex::new(Graph::default()),
            available: AtomicBool::new(true),
        }
    }

    /// Simulate the store going away (or coming back).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn lock(&self) -> GraphResult<MutexGuard<'_, Graph>> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(GraphError::Unavailable("memory store is offline".into()));
        }
        self.graph
            .lock()
            .map_err(|_| GraphError::Unavailable("memory store lock poisoned".into()))
    }

    /// Link the `Thing` nodes for two uuids, creating bare nodes as needed.
    pub fn relate(&self, from_uuid: &str, rel_type: &str, to_uuid: &str) -> GraphResult<()> {
        let mut graph = self.lock()?;
        let from = graph.merge_thing(from_uuid);
        let to = graph.merge_thing(to_uuid);
        graph.relationships.push(Relationship {
            from,
            rel_type: rel_type.to_string(),
            to,
        });
        Ok(())
    }

    /// The `Thing` node stored for `uuid`, if any.
    pub fn node(&self, uuid: &str) -> GraphResult<Option<NodeView>> {
        let graph = self.lock()?;
        Ok(graph.find(THING_LABEL, uuid).map(|id| {
            let node = &graph.nodes[&id];
            NodeView {
                labels: node.labels.iter().cloned().collect(),
                props: node.props.clone(),
                relationships: graph.degree(id),
            }
        }))
    }

    /// Number of identifier nodes of a scheme anywhere in the graph.
    pub fn identifier_count(&self, scheme: IdentifierScheme) -> GraphResult<usize> {
        let graph = self.lock()?;
        Ok(graph
            .nodes
            .values()
            .filter(|node| node.labels.contains(scheme.label()))
            .count())
    }

    pub fn node_count(&self) -> GraphResult<usize> {
        Ok(self.lock()?.nodes.len())
    }
}

#[async_trait]
impl GraphStore for MemoryStore {
    async fn run_batch(&self, batch: &[Statement]) -> GraphResult<Vec<StatementResult>> {
        let mut graph = self.lock()?;
        let mut staged = graph.clone();
        let mut results = Vec::with_capacity(batch.len());

        for (index, statement) in batch.iter().enumerate() {
            let result = staged
                .apply(statement)
                .map_err(|e| GraphError::execution(index, e))?;
            results.push(result);
        }

        *graph = staged;
        debug!(statements = batch.len(), "Memory batch committed");
        Ok(results)
    }

    async fn ensure_constraints(&self, constraints: &[UniqueConstraint]) -> GraphResult<()> {
        let mut graph = self.lock()?;
        let mut staged = graph.clone();
        for constraint in constraints {
            if !staged.constraints.contains(constraint) {
                staged.constraints.push(*constraint);
            }
            staged
                .check_constraints()
                .map_err(|e| GraphError::ConstraintSetup {
                    label: constraint.label.to_string(),
                    property: constraint.property.to_string(),
                    reason: e.to_string(),
                })?;
        }
        *graph = staged;
        Ok(())
    }

    async fn check(&self) -> GraphResult<()> {
        self.lock().map(|_| ())
    }

    fn describe(&self) -> String {
        "in-memory graph".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SUBJECT_CONSTRAINTS;

    fn attach(uuid: &str, scheme: IdentifierScheme, value: &str) -> Statement {
        Statement::AttachIdentifier {
            uuid: uuid.into(),
            scheme,
            value: value.into(),
        }
    }

    #[tokio::test]
    async fn test_failed_batch_leaves_graph_untouched() {
        let store = MemoryStore::new();
        store.ensure_constraints(SUBJECT_CONSTRAINTS).await.unwrap();
        store
            .run_batch(&[attach("a", IdentifierScheme::Tme, "T1")])
            .await
            .unwrap();
        let before = store.node_count().unwrap();

        let err = store
            .run_batch(&[
                Statement::UpsertSubject {
                    uuid: "b".into(),
                    pref_label: Some("B".into()),
                },
                attach("b", IdentifierScheme::Tme, "T1"),
            ])
            .await
            .unwrap_err();

        match &err {
            GraphError::Execution { index, source } => {
                assert_eq!(*index, 1);
                assert!(matches!(**source, GraphError::ConstraintViolation { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(store.node_count().unwrap(), before);
        assert!(store.node("b").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_constraints_only_apply_once_declared() {
        let store = MemoryStore::new();
        let batch = [
            attach("a", IdentifierScheme::Upp, "dup"),
            attach("b", IdentifierScheme::Upp, "dup"),
        ];
        store.run_batch(&batch).await.unwrap();

        let err = store.ensure_constraints(SUBJECT_CONSTRAINTS).await.unwrap_err();
        assert!(matches!(
            err,
            GraphError::ConstraintSetup { label, .. } if label == "UPPIdentifier"
        ));
    }

    #[tokio::test]
    async fn test_ensure_constraints_is_idempotent() {
        let store = MemoryStore::new();
        store.ensure_constraints(SUBJECT_CONSTRAINTS).await.unwrap();
        store.ensure_constraints(SUBJECT_CONSTRAINTS).await.unwrap();
    }

    #[tokio::test]
    async fn test_detach_refuses_shared_identifier_nodes() {
        let store = MemoryStore::new();
        store
            .run_batch(&[attach("a", IdentifierScheme::Tme, "T1")])
            .await
            .unwrap();
        // An identifier node that also points elsewhere cannot be deleted.
        {
            let mut graph = store.lock().unwrap();
            let identifier = graph.relationships[0].from;
            let other = graph.merge_thing("other");
            graph.relationships.push(Relationship {
                from: identifier,
                rel_type: "MENTIONS".into(),
                to: other,
            });
        }

        let err = store
            .run_batch(&[Statement::DetachIdentifiers { uuid: "a".into() }])
            .await
            .unwrap_err();
        match err {
            GraphError::Execution { index, source } => {
                assert_eq!(index, 0);
                assert!(matches!(*source, GraphError::Rejected(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(store.identifier_count(IdentifierScheme::Tme).unwrap(), 1);
    }

    #[tokio::test]
    async fn test_offline_store() {
        let store = MemoryStore::new();
        store.set_available(false);
        assert!(matches!(store.check().await, Err(GraphError::Unavailable(_))));
        assert!(store.run_batch(&[Statement::CountSubjects]).await.is_err());

        store.set_available(true);
        store.check().await.unwrap();
    }
}
