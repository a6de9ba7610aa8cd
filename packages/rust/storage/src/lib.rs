//! Document store layer for the knowledge base and symptom collections.
//!
//! [`SymptomStore`] is the seam the cleanup pipeline talks to. Two backends:
//! - [`MongoStore`]: the `dokter` MongoDB database, via the official driver
//! - [`MemoryStore`]: in-memory collections for tests and local experiments
//!
//! The handle is always passed explicitly; nothing here holds global state.

mod documents;
mod memory;
mod mongo;

use async_trait::async_trait;
use bson::Bson;
use symptomfix_shared::{KnowledgeBaseRecord, Result};

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// Server-assigned name of the unique index on the symptom lookup's `name`
/// field. The backend's models create it under this name too, so the index
/// is requested without a custom name.
pub const SYMPTOM_NAME_INDEX: &str = "name_1";

/// Operations the cleanup pipeline needs from a document store.
#[async_trait]
pub trait SymptomStore: Send + Sync {
    /// Read every knowledge base record (`_id` and `symptoms` only).
    async fn load_knowledge_bases(&self) -> Result<Vec<KnowledgeBaseRecord>>;

    /// Replace the symptom list of the record whose `_id` equals `id`.
    /// `updatedAt` is only refreshed when `changed` is set.
    async fn replace_symptoms(
        &self,
        id: &Bson,
        symptoms: &[String],
        changed: bool,
    ) -> Result<()>;

    /// Make sure the lookup has a unique index on `name`.
    ///
    /// An existing unique index with the default name (`name_1`) is reused.

    async fn ensure_symptom_index(&self) -> Result<()>;

    /// Whether a lookup entry with exactly this name exists.
    async fn symptom_exists(&self, name: &str) -> Result<bool>;

    /// Insert a lookup entry unless one already exists.
    /// Returns `true` when a new entry was created.
    async fn upsert_symptom(&self, name: &str) -> Result<bool>;
}
