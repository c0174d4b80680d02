//! Query builders.

pub mod subjects;
