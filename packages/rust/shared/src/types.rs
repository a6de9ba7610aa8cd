//! Core domain types for the knowledge base and symptom collections.

use bson::Bson;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Field names
// ---------------------------------------------------------------------------

/// Document identifier field.
pub const ID_FIELD: &str = "_id";
/// Symptom list on a knowledge base document.
pub const SYMPTOMS_FIELD: &str = "symptoms";
/// Unique name on a symptom document.
pub const NAME_FIELD: &str = "name";
/// Creation timestamp maintained by the backend models.
pub const CREATED_AT_FIELD: &str = "createdAt";
/// Modification timestamp maintained by the backend models.
pub const UPDATED_AT_FIELD: &str = "updatedAt";

// ---------------------------------------------------------------------------
// KnowledgeBaseRecord
// ---------------------------------------------------------------------------

/// The part of a knowledge base document this tool reads and rewrites.
///
/// Every other field on the stored document is left alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBaseRecord {
    /// Document `_id`. Usually an ObjectId, but any BSON value is accepted.
    #[serde(rename = "_id")]
    pub id: Bson,
    /// Free-text symptoms. A missing field reads as empty.
    #[serde(default)]
    pub symptoms: Vec<String>,
}

// ---------------------------------------------------------------------------
// SymptomRecord
// ---------------------------------------------------------------------------

/// A symptom lookup entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymptomRecord {
    pub name: String,
}
