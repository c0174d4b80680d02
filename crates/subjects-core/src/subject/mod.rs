//! Subject taxonomy entity.

pub mod model;

use crate::error::{SubjectsError, SubjectsResult};
use model::Subject;

/// Decode a caller-supplied JSON document into a Subject.
///
/// Only field presence is checked: `uuid` must be a non-blank string. Any
/// `types` sent by the caller are discarded since they are derived by the store.
pub fn decode_subject(input: &[u8]) -> SubjectsResult<Subject> {
    let mut subject: Subject = serde_json::from_slice(input)?;
    validate(&subject)?;
    subject.types.clear();
    Ok(subject)
}

/// Check that a Subject can be written.
pub fn validate(subject: &Subject) -> SubjectsResult<()> {
    if subject.uuid.trim().is_empty() {
        return Err(SubjectsError::MissingField("uuid"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_full_document() {
        let input = br#"{
            "uuid": "12345",
            "prefLabel": "Test 'special chars",
            "alternativeIdentifiers": { "TME": ["TME_ID"], "uuids": ["12345"] }
        }"#;
        let subject = decode_subject(input).unwrap();
        assert_eq!(subject.uuid, "12345");
        assert_eq!(subject.pref_label.as_deref(), Some("Test 'special chars"));
        assert_eq!(subject.alternative_identifiers.tme, vec!["TME_ID"]);
        assert_eq!(subject.alternative_identifiers.uuids, vec!["12345"]);
    }

    #[test]
    fn test_decode_discards_caller_types() {
        let input = br#"{"uuid":"1","types":["Brand"]}"#;
        let subject = decode_subject(input).unwrap();
        assert!(subject.types.is_empty());
    }

    #[test]
    fn test_decode_requires_uuid() {
        let err = decode_subject(br#"{"prefLabel":"x"}"#).unwrap_err();
        assert!(matches!(err, SubjectsError::MissingField("uuid")));

        let err = decode_subject(br#"{"uuid":"   "}"#).unwrap_err();
        assert!(matches!(err, SubjectsError::MissingField("uuid")));
    }

    #[test]
    fn test_decode_rejects_malformed_json() {
        let err = decode_subject(b"{not json").unwrap_err();
        assert!(matches!(err, SubjectsError::Malformed(_)));

        let err = decode_subject(br#"{"uuid": 42}"#).unwrap_err();
        assert!(matches!(err, SubjectsError::Malformed(_)));
    }

    #[test]
    fn test_validate_accepts_blank_identifier_values() {
        let subject = Subject::new("1", "x").with_tme([""]).with_uuids(["1"]);
        validate(&subject).unwrap();
    }
}
