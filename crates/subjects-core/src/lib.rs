//! Subjects Core Library
//!
//! Model for the Subject taxonomy concept and the service contract used to
//! read and reconcile it against a graph store.

pub mod error;
pub mod service;
pub mod subject;

pub use error::{SubjectsError, SubjectsResult};
pub use service::EntityService;
pub use subject::model::{AlternativeIdentifiers, IdentifierScheme, Subject};
pub use subject::{decode_subject, validate};
