//! In-memory backend for tests and local experiments.

use std::collections::HashSet;

use async_trait::async_trait;
use bson::{Bson, DateTime, Document};
use symptomfix_shared::{
    ID_FIELD, KnowledgeBaseRecord, NAME_FIELD, Result, SYMPTOMS_FIELD, SymptomFixError,
    UPDATED_AT_FIELD,
};
use tokio::sync::RwLock;

use crate::{SymptomStore, documents};

/// In-memory stand-in for the two collections.
///
/// Documents are kept whole, so fields the cleanup never reads survive a
/// run just like they do in MongoDB. The unique `name` index is tracked by
/// name only: [`SymptomStore::ensure_symptom_index`] reuses an index with the
/// same name, rejects one with a different name, and fails on duplicate names
/// the way a server-side index build would.
pub struct MemoryStore {
    knowledge_bases: RwLock<Vec<Document>>,
    symptoms: RwLock<Vec<Document>>,
    name_index: RwLock<Option<String>>,
    timestamps: bool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store that does not stamp timestamps.
    pub fn new() -> Self {
        Self {
            knowledge_bases: RwLock::new(Vec::new()),
            symptoms: RwLock::new(Vec::new()),
            name_index: RwLock::new(None),
            timestamps: false,
        }
    }

    /// Stamp `createdAt`/`updatedAt` on writes.
    pub fn with_timestamps(mut self, timestamps: bool) -> Self {
        self.timestamps = timestamps;
        self
    }

    /// Seed the knowledge base collection.
    pub fn with_knowledge_bases(mut self, docs: impl IntoIterator<Item = Document>) -> Self {
        self.knowledge_bases.get_mut().extend(docs);
        self
    }

    /// Seed the symptom lookup, duplicates allowed (as in an unindexed collection).
    pub fn with_symptoms<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.symptoms
            .get_mut()
            .extend(names.into_iter().map(|n| documents::new_symptom(&n.into(), None)));
        self
    }

    /// Seed an existing unique index on `name`, as the backend models create it.
    pub fn with_symptom_index(mut self, index_name: impl Into<String>) -> Self {
        *self.name_index.get_mut() = Some(index_name.into());
        self
    }

    /// Name of the unique `name` index, if one exists.
    pub async fn symptom_index(&self) -> Option<String> {
        self.name_index.read().await.clone()
    }

    /// Snapshot of the stored knowledge base documents.
    pub async fn knowledge_base_documents(&self) -> Vec<Document> {
        self.knowledge_bases.read().await.clone()
    }

    /// Snapshot of the stored symptom documents.
    pub async fn symptom_documents(&self) -> Vec<Document> {
        self.symptoms.read().await.clone()
    }

    /// Names in the lookup, in insertion order.
    pub async fn symptom_names(&self) -> Vec<String> {
        self.symptoms
            .read()
            .await
            .iter()
            .filter_map(|d| d.get_str(NAME_FIELD).ok().map(String::from))
            .collect()
    }

    fn now(&self) -> Option<DateTime> {
        self.timestamps.then(DateTime::now)
    }
}

fn has_name(doc: &Document, name: &str) -> bool {
    doc.get_str(NAME_FIELD).is_ok_and(|n| n == name)
}

#[async_trait]
impl SymptomStore for MemoryStore {
    async fn load_knowledge_bases(&self) -> Result<Vec<KnowledgeBaseRecord>> {
        self.knowledge_bases
            .read()
            .await
            .iter()
            .map(|doc| {
                bson::from_document(doc.clone())
                    .map_err(|e| SymptomFixError::decode(format!("knowledge base record: {e}")))
            })
            .collect()
    }

    async fn replace_symptoms(
        &self,
        id: &Bson,
        symptoms: &[String],
        changed: bool,
    ) -> Result<()> {
        let mut docs = self.knowledge_bases.write().await;
        if let Some(doc) = docs.iter_mut().find(|d| d.get(ID_FIELD) == Some(id)) {
            doc.insert(SYMPTOMS_FIELD, symptoms.to_vec());
            if let Some(now) = self.now().filter(|_| changed) {
                doc.insert(UPDATED_AT_FIELD, now);
            }
        } else {
            tracing::warn!(%id, "knowledge base record disappeared before update");
        }
        Ok(())
    }

    async fn ensure_symptom_index(&self) -> Result<()> {
        let wanted = documents::index_name(&documents::symptom_name_index());
        let mut existing = self.name_index.write().await;
        match existing.as_deref() {
            Some(name) if name == wanted => return Ok(()),
            Some(name) => {
                return Err(SymptomFixError::storage(format!(
                    "creating unique index on symptom names (duplicates present?): \
                     Index already exists with a different name: {name}"
                )));
            }
            None => {}
        }

        let symptoms = self.symptoms.read().await;
        let mut seen = HashSet::new();
        for name in symptoms.iter().filter_map(|d| d.get_str(NAME_FIELD).ok()) {
            if !seen.insert(name) {
                return Err(SymptomFixError::storage(format!(
                    "creating unique index on symptom names (duplicates present?): \
                     duplicate key {{ name: \"{name}\" }}"
                )));
            }
        }
        *existing = Some(wanted);
        Ok(())
    }

    async fn symptom_exists(&self, name: &str) -> Result<bool> {
        Ok(self.symptoms.read().await.iter().any(|d| has_name(d, name)))
    }

    async fn upsert_symptom(&self, name: &str) -> Result<bool> {
        let mut symptoms = self.symptoms.write().await;
        if symptoms.iter().any(|d| has_name(d, name)) {
            return Ok(false);
        }
        symptoms.push(documents::new_symptom(name, self.now()));
        Ok(true)
    }
}
