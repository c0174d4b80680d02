//! Statement batches for Subject reconciliation.
//!
//! Writes replace the identifier set wholesale: every identifier linked to the
//! uuid is dropped first, then the node is upserted, then one identifier node
//! is attached per value. Re-running the same batch converges on the same state.

use subjects_core::{IdentifierScheme, Subject};

use crate::statement::Statement;

/// Statements that make the store hold exactly `subject`.
pub fn write_batch(subject: &Subject) -> Vec<Statement> {
    let uuid = subject.uuid.as_str();
    let ids = &subject.alternative_identifiers;

    let mut batch = vec![
        Statement::DetachIdentifiers {
            uuid: uuid.to_string(),
        },
        Statement::UpsertSubject {
            uuid: uuid.to_string(),
            pref_label: subject.pref_label.clone(),
        },
    ];

    for scheme in IdentifierScheme::ALL {
        // A repeated value would trip the (scheme, value) uniqueness constraint.
        for value in ids.distinct_values(scheme) {
            batch.push(Statement::AttachIdentifier {
                uuid: uuid.to_string(),
                scheme,
                value: value.to_string(),
            });
        }
    }

    batch
}

/// Statements that demote `uuid` to a skeletal node and purge it if orphaned.
///
/// The first statement's `labels_removed` column decides whether anything was
/// deleted.
pub fn delete_batch(uuid: &str) -> Vec<Statement> {
    vec![
        Statement::ClearSubject {
            uuid: uuid.to_string(),
        },
        Statement::PurgeIfOrphaned {
            uuid: uuid.to_string(),
        },
    ]
}

pub fn read_statement(uuid: &str) -> Statement {
    Statement::ReadSubject {
        uuid: uuid.to_string(),
    }
}

pub fn count_statement() -> Statement {
    Statement::CountSubjects
}
