//! Neo4j schema: uniqueness constraints the reconciliation relies on.

/// A `(label, property)` pair that must be unique across nodes with that label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniqueConstraint {
    pub label: &'static str,
    pub property: &'static str,
}

impl UniqueConstraint {
    pub const fn new(label: &'static str, property: &'static str) -> Self {
        Self { label, property }
    }

    /// Stable constraint name, e.g. `tmeidentifier_value`.
    pub fn name(&self) -> String {
        format!("{}_{}", self.label.to_lowercase(), self.property)
    }

    /// Cypher declaring the constraint. Safe to re-run.
    pub fn cypher(&self) -> String {
        format!(
            "CREATE CONSTRAINT {name} IF NOT EXISTS FOR (n:{label}) REQUIRE n.{property} IS UNIQUE",
            name = self.name(),
            label = self.label,
            property = self.property,
        )
    }
}

/// Constraints declared by `initialise`.
pub const SUBJECT_CONSTRAINTS: &[UniqueConstraint] = &[
    UniqueConstraint::new("Thing", "uuid"),
    UniqueConstraint::new("Concept", "uuid"),
    UniqueConstraint::new("Classification", "uuid"),
    UniqueConstraint::new("Subject", "uuid"),
    UniqueConstraint::new("TMEIdentifier", "value"),
    UniqueConstraint::new("UPPIdentifier", "value"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_cypher() {
        let constraint = UniqueConstraint::new("TMEIdentifier", "value");
        assert_eq!(
            constraint.cypher(),
            "CREATE CONSTRAINT tmeidentifier_value IF NOT EXISTS FOR (n:TMEIdentifier) REQUIRE n.value IS UNIQUE"
        );
    }

    #[test]
    fn test_constraint_names_are_distinct() {
        let mut names: Vec<_> = SUBJECT_CONSTRAINTS.iter().map(|c| c.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), SUBJECT_CONSTRAINTS.len());
    }
}
