//! Capability contract that the outer service layer drives.
//!
//! Callers hold a concrete `EntityService` and never the entity type erased:
//! input is decoded through [`EntityService::decode_json`] at the boundary and
//! every other operation takes the service's own `Entity`.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::SubjectsResult;

#[async_trait]
pub trait EntityService: Send + Sync {
    type Entity: Serialize + DeserializeOwned + Send + Sync;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Decode one entity from JSON, returning it with its uuid.
    fn decode_json(&self, input: &[u8]) -> SubjectsResult<(Self::Entity, String)>;

    /// Declare the store constraints this service relies on. Idempotent.
    async fn initialise(&self) -> Result<(), Self::Error>;

    /// `Ok(None)` when nothing with this uuid exists.
    async fn read(&self, uuid: &str) -> Result<Option<Self::Entity>, Self::Error>;

    /// Create or fully replace the stored entity.
    async fn write(&self, entity: &Self::Entity) -> Result<(), Self::Error>;

    /// `Ok(false)` when nothing was found to delete.
    async fn delete(&self, uuid: &str) -> Result<bool, Self::Error>;

    async fn count(&self) -> Result<u64, Self::Error>;

    /// Liveness of the backing store.
    async fn check(&self) -> Result<(), Self::Error>;

    /// Where the backing store lives, for health output.
    fn describe(&self) -> String;
}
