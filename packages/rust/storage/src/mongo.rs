//! MongoDB backend.

use async_trait::async_trait;
use bson::{Bson, DateTime, doc};
use futures::TryStreamExt;
use mongodb::{Client, Collection};
use symptomfix_shared::{KnowledgeBaseRecord, Result, StoreConfig, SymptomFixError, SymptomRecord};
use tracing::{debug, info, warn};

use crate::SymptomStore;
use crate::documents;

/// Storage handle wrapping a MongoDB client and the two collections.
pub struct MongoStore {
    #[allow(dead_code)]
    client: Client,
    knowledge_bases: Collection<KnowledgeBaseRecord>,
    symptoms: Collection<SymptomRecord>,
    timestamps: bool,
}

impl MongoStore {
    /// Connect to the server and verify it answers a `ping`.
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let client = Client::with_uri_str(&config.uri)
            .await
            .map_err(|e| SymptomFixError::storage(format!("invalid connection string: {e}")))?;

        let db = client.database(&config.database);
        db.run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| {
                SymptomFixError::storage(format!(
                    "cannot reach database '{}': {e}",
                    config.database
                ))
            })?;

        info!(
            database = %config.database,
            knowledge_bases = %config.knowledge_base_collection,
            symptoms = %config.symptom_collection,
            "connected to document store"
        );

        Ok(Self {
            knowledge_bases: db.collection(&config.knowledge_base_collection),
            symptoms: db.collection(&config.symptom_collection),
            timestamps: config.timestamps,
            client,
        })
    }

    fn now(&self) -> Option<DateTime> {
        self.timestamps.then(DateTime::now)
    }
}

#[async_trait]
impl SymptomStore for MongoStore {
    async fn load_knowledge_bases(&self) -> Result<Vec<KnowledgeBaseRecord>> {
        let cursor = self
            .knowledge_bases
            .find(doc! {})
            .projection(documents::knowledge_base_projection())
            .await
            .map_err(SymptomFixError::storage)?;

        let records: Vec<KnowledgeBaseRecord> = cursor
            .try_collect()
            .await
            .map_err(|e| SymptomFixError::storage(format!("reading knowledge bases: {e}")))?;

        debug!(count = records.len(), "loaded knowledge base records");
        Ok(records)
    }

    async fn replace_symptoms(
        &self,
        id: &Bson,
        symptoms: &[String],
        changed: bool,
    ) -> Result<()> {
        let now = self.now().filter(|_| changed);
        let result = self
            .knowledge_bases
            .update_one(documents::by_id(id), documents::set_symptoms(symptoms, now))
            .await
            .map_err(|e| SymptomFixError::storage(format!("updating record {id}: {e}")))?;

        if result.matched_count == 0 {
            warn!(%id, "knowledge base record disappeared before update");
        }
        Ok(())
    }

    async fn ensure_symptom_index(&self) -> Result<()> {
        let index = documents::symptom_name_index();
        debug!(index = %documents::index_name(&index), "ensuring symptom name index");

        self.symptoms.create_index(index).await.map_err(|e| {
            SymptomFixError::storage(format!(
                "creating unique index on symptom names (duplicates present?): {e}"
            ))
        })?;
        Ok(())
    }

    async fn symptom_exists(&self, name: &str) -> Result<bool> {
        let count = self
            .symptoms
            .count_documents(documents::by_name(name))
            .limit(1)
            .await
            .map_err(SymptomFixError::storage)?;
        Ok(count > 0)
    }

    async fn upsert_symptom(&self, name: &str) -> Result<bool> {
        let result = self
            .symptoms
            .update_one(
                documents::by_name(name),
                documents::upsert_symptom(name, self.now()),
            )
            .upsert(true)
            .await
            .map_err(|e| SymptomFixError::storage(format!("upserting symptom '{name}': {e}")))?;
        Ok(result.upserted_id.is_some())
    }
}
