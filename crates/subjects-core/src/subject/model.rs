//! Subject model types.

use serde::{Deserialize, Serialize};

/// Label carried by every concept node; uniqueness of `uuid` is scoped to it.
pub const THING_LABEL: &str = "Thing";

/// Labels stripped from a Subject node when it is deleted.
pub const CLASSIFICATION_LABELS: [&str; 3] = ["Concept", "Classification", "Subject"];

/// Full label set applied to a Subject node on every write, in canonical order.
pub const SUBJECT_TYPES: [&str; 4] = ["Thing", "Concept", "Classification", "Subject"];

/// Base label shared by all identifier nodes.
pub const IDENTIFIER_LABEL: &str = "Identifier";

/// Relationship type linking an identifier node to the node it identifies.
pub const IDENTIFIES: &str = "IDENTIFIES";

/// Scheme an alternative identifier value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IdentifierScheme {
    /// Legacy taxonomy-management-system identifier.
    Tme,
    /// Platform-assigned identifier.
    Upp,
}

impl IdentifierScheme {
    pub const ALL: [IdentifierScheme; 2] = [IdentifierScheme::Tme, IdentifierScheme::Upp];

    /// The Neo4j node label for identifiers of this scheme.
    pub fn label(&self) -> &'static str {
        match self {
            IdentifierScheme::Tme => "TMEIdentifier",
            IdentifierScheme::Upp => "UPPIdentifier",
        }
    }

    /// Parse a node label back into a scheme.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "TMEIdentifier" => Some(Self::Tme),
            "UPPIdentifier" => Some(Self::Upp),
            _ => None,
        }
    }
}

/// Alternative identifiers grouped by scheme.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlternativeIdentifiers {
    #[serde(rename = "TME", default, skip_serializing_if = "Vec::is_empty")]
    pub tme: Vec<String>,
    #[serde(default)]
    pub uuids: Vec<String>,
}

impl AlternativeIdentifiers {
    /// Values held for a scheme, as supplied.
    pub fn values(&self, scheme: IdentifierScheme) -> &[String] {
        match scheme {
            IdentifierScheme::Tme => &self.tme,
            IdentifierScheme::Upp => &self.uuids,
        }
    }

    /// Values for a scheme with duplicates collapsed, first occurrence wins.
    pub fn distinct_values(&self, scheme: IdentifierScheme) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.values(scheme)
            .iter()
            .map(String::as_str)
            .filter(|value| seen.insert(*value))
            .collect()
    }

    /// Sort and dedup both groups so that comparisons ignore order.
    pub fn normalized(mut self) -> Self {
        for group in [&mut self.tme, &mut self.uuids] {
            group.sort();
            group.dedup();
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.tme.is_empty() && self.uuids.is_empty()
    }
}

/// A hierarchical classification concept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    #[serde(default)]
    pub uuid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pref_label: Option<String>,
    #[serde(default)]
    pub alternative_identifiers: AlternativeIdentifiers,
    /// Labels on the stored node. Populated by reads only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<String>,
}

impl Subject {
    pub fn new(uuid: impl Into<String>, pref_label: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            pref_label: Some(pref_label.into()),
            ..Self::default()
        }
    }

    pub fn with_tme<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.alternative_identifiers.tme = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_uuids<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.alternative_identifiers.uuids = values.into_iter().map(Into::into).collect();
        self
    }

    /// The same subject with the label set every write assigns.
    pub fn with_subject_types(mut self) -> Self {
        self.types = SUBJECT_TYPES.iter().map(|t| t.to_string()).collect();
        self
    }
}

/// Order node labels canonically: the Subject label set first, anything else after, sorted.
pub fn canonical_types(mut labels: Vec<String>) -> Vec<String> {
    labels.sort_by_key(|label| {
        let rank = SUBJECT_TYPES
            .iter()
            .position(|known| known == label)
            .unwrap_or(SUBJECT_TYPES.len());
        (rank, label.clone())
    });
    labels.dedup();
    labels
}
