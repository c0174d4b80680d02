//! Graph statements emitted by the query builder.
//!
//! Each statement is a typed description of one mutation or read. The Neo4j
//! gateway renders it to parameterised Cypher; the in-memory gateway applies
//! it directly. Caller values only ever travel as parameters.

use serde_json::{Map, Value};
use subjects_core::IdentifierScheme;

/// A parameter value bound into a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    Text(String),
    Null,
}

impl From<&str> for Param {
    fn from(value: &str) -> Self {
        Param::Text(value.to_string())
    }
}

impl From<Option<&str>> for Param {
    fn from(value: Option<&str>) -> Self {
        value.map_or(Param::Null, Param::from)
    }
}

/// One row returned by a statement, keyed by column name.
pub type Record = Map<String, Value>;

/// Rows produced by one statement of a batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatementResult {
    pub rows: Vec<Record>,
}

impl StatementResult {
    pub fn first(&self) -> Option<&Record> {
        self.rows.first()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// Delete every identifier node linked to `Thing{uuid}` and its link.
    DetachIdentifiers { uuid: String },
    /// Merge `Thing{uuid}`, replace its properties and apply the Subject labels.
    UpsertSubject {
        uuid: String,
        pref_label: Option<String>,
    },
    /// Create one identifier node of `scheme` and link it to `Thing{uuid}`.
    AttachIdentifier {
        uuid: String,
        scheme: IdentifierScheme,
        value: String,
    },
    /// Strip a Subject down to a bare `Thing{uuid}`; returns `labels_removed`.
    ClearSubject { uuid: String },
    /// Delete `Thing{uuid}` when it has no relationships left.
    PurgeIfOrphaned { uuid: String },
    ReadSubject { uuid: String },
    CountSubjects,
}

pub const LABELS_REMOVED: &str = "labels_removed";
pub const SUBJECT_COUNT: &str = "c";
pub const READ_COLUMNS: &[&str] = &["uuid", "prefLabel", "types", "uuids", "tme"];

impl Statement {
    /// The Cypher text for this statement.
    pub fn cypher(&self) -> String {
        match self {
            Statement::DetachIdentifiers { .. } => "MATCH (t:Thing {uuid: $uuid})
                 OPTIONAL MATCH (t)<-[iden:IDENTIFIES]-(i)
                 DELETE iden, i"
                .to_string(),
            Statement::UpsertSubject { .. } => "MERGE (n:Thing {uuid: $uuid})
                 SET n = {uuid: $uuid, prefLabel: $prefLabel}
                 SET n:Concept:Classification:Subject"
                .to_string(),
            Statement::AttachIdentifier { scheme, .. } => format!(
                "MERGE (t:Thing {{uuid: $uuid}})
                 CREATE (i:Identifier {{value: $value}})
                 MERGE (t)<-[:IDENTIFIES]-(i)
                 SET i:{label}",
                label = scheme.label()
            ),
            Statement::ClearSubject { .. } => "MATCH (s:Thing {uuid: $uuid})
                 OPTIONAL MATCH (s)<-[iden:IDENTIFIES]-(i:Identifier)
                 WITH s, collect(iden) AS idens, collect(i) AS ids,
                      size([l IN labels(s) WHERE l IN ['Concept', 'Classification', 'Subject']]) AS labels_removed
                 FOREACH (r IN idens | DELETE r)
                 FOREACH (n IN ids | DELETE n)
                 REMOVE s:Concept:Classification:Subject
                 SET s = {uuid: $uuid}
                 RETURN labels_removed"
                .to_string(),
            Statement::PurgeIfOrphaned { .. } => "MATCH (s:Thing {uuid: $uuid})
                 OPTIONAL MATCH (s)-[a]-(x)
                 WITH s, count(a) AS relCount
                 WHERE relCount = 0
                 DELETE s"
                .to_string(),
            Statement::ReadSubject { .. } => "MATCH (n:Subject {uuid: $uuid})
                 OPTIONAL MATCH (upp:UPPIdentifier)-[:IDENTIFIES]->(n)
                 OPTIONAL MATCH (tme:TMEIdentifier)-[:IDENTIFIES]->(n)
                 RETURN n.uuid AS uuid, n.prefLabel AS prefLabel, labels(n) AS types,
                        collect(DISTINCT upp.value) AS uuids, collect(DISTINCT tme.value) AS tme"
                .to_string(),
            Statement::CountSubjects => "MATCH (n:Subject) RETURN count(n) AS c".to_string(),
        }
    }

    /// Parameters bound into [`Statement::cypher`].
    pub fn params(&self) -> Vec<(&'static str, Param)> {
        match self {
            Statement::DetachIdentifiers { uuid }
            | Statement::ClearSubject { uuid }
            | Statement::PurgeIfOrphaned { uuid }
            | Statement::ReadSubject { uuid } => vec![("uuid", Param::from(uuid.as_str()))],
            Statement::UpsertSubject { uuid, pref_label } => vec![
                ("uuid", Param::from(uuid.as_str())),
                ("prefLabel", Param::from(pref_label.as_deref())),
            ],
            Statement::AttachIdentifier { uuid, value, .. } => vec![
                ("uuid", Param::from(uuid.as_str())),
                ("value", Param::from(value.as_str())),
            ],
            Statement::CountSubjects => Vec::new(),
        }
    }

    /// Columns the statement returns, empty for pure mutations.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Statement::ClearSubject { .. } => &[LABELS_REMOVED],
            Statement::ReadSubject { .. } => READ_COLUMNS,
            Statement::CountSubjects => &[SUBJECT_COUNT],
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_placeholder_has_a_param() {
        let statements = [
            Statement::DetachIdentifiers { uuid: "u".into() },
            Statement::UpsertSubject {
                uuid: "u".into(),
                pref_label: None,
            },
            Statement::AttachIdentifier {
                uuid: "u".into(),
                scheme: IdentifierScheme::Upp,
                value: "v".into(),
            },
            Statement::ClearSubject { uuid: "u".into() },
            Statement::PurgeIfOrphaned { uuid: "u".into() },
            Statement::ReadSubject { uuid: "u".into() },
            Statement::CountSubjects,
        ];

        for statement in &statements {
            let cypher = statement.cypher();
            for (name, _) in statement.params() {
                assert!(
                    cypher.contains(&format!("${name}")),
                    "{name} unused in {cypher}"
                );
            }
            for column in statement.columns() {
                assert!(cypher.contains(column), "{column} not returned by {cypher}");
            }
        }
    }

    #[test]
    fn test_absent_pref_label_binds_null() {
        let statement = Statement::UpsertSubject {
            uuid: "u".into(),
            pref_label: None,
        };
        assert_eq!(statement.params()[1], ("prefLabel", Param::Null));
    }

    #[test]
    fn test_identifier_label_comes_from_scheme() {
        let statement = Statement::AttachIdentifier {
            uuid: "u".into(),
            scheme: IdentifierScheme::Tme,
            value: "x'; DETACH DELETE n //".into(),
        };
        let cypher = statement.cypher();
        assert!(cypher.contains("SET i:TMEIdentifier"));
        assert!(!cypher.contains("DETACH"));
    }
}
