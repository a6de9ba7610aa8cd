//! End-to-end cleanup: knowledge base pass → symptom lookup pass → report.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use symptomfix_shared::Result;
use symptomfix_storage::SymptomStore;
use tracing::{info, instrument};

use crate::inserter::insert_missing_symptoms;
use crate::updater::update_knowledge_bases;

/// Options for one cleanup run.
#[derive(Debug, Clone, Default)]
pub struct CleanupOptions {
    /// Compute everything, write nothing.
    pub dry_run: bool,
}

/// Result of [`run_cleanup`].
#[derive(Debug, Clone, Serialize)]
pub struct CleanupReport {
    /// Knowledge base records processed.
    pub processed: usize,
    /// Records whose list changed under normalization.
    pub changed: usize,
    /// Distinct normalized symptom names across all records.
    pub distinct_symptoms: usize,
    /// Lookup entries created by this run.
    pub inserted: usize,
    /// Names that already had a lookup entry.
    pub already_present: usize,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    /// Total elapsed time.
    #[serde(rename = "elapsed_ms", serialize_with = "as_millis")]
    pub elapsed: Duration,
}

impl CleanupReport {
    /// The one-line summary printed at the end of a run.
    pub fn summary_line(&self) -> String {
        let prefix = if self.dry_run { "[dry run] " } else { "" };
        format!(
            "{prefix}Updated {} knowledge base documents and added {} unique symptoms.",
            self.processed, self.distinct_symptoms
        )
    }
}

fn as_millis<S: serde::Serializer>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

/// Progress callback for reporting cleanup status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each knowledge base record.
    fn record_updated(&self, current: usize, total: usize);
    /// Called after each symptom name is checked or inserted.
    fn symptom_checked(&self, name: &str, current: usize, total: usize);
    /// Called when the run completes.
    fn done(&self, report: &CleanupReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn record_updated(&self, _current: usize, _total: usize) {}
    fn symptom_checked(&self, _name: &str, _current: usize, _total: usize) {}
    fn done(&self, _report: &CleanupReport) {}
}

/// Run the cleanup against `store`.
///
/// 1. Normalize and write back every knowledge base record
/// 2. Give each distinct normalized name a lookup entry
///
/// Errors are not retried and nothing is rolled back.
#[instrument(skip_all, fields(dry_run = options.dry_run))]
pub async fn run_cleanup(
    store: &dyn SymptomStore,
    options: &CleanupOptions,
    progress: &dyn ProgressReporter,
) -> Result<CleanupReport> {
    let started_at = Utc::now();
    let start = Instant::now();

    progress.phase("Normalizing knowledge base symptoms");
    let updated = update_knowledge_bases(store, options.dry_run, progress).await?;

    progress.phase("Populating symptom lookup");
    let inserted =
        insert_missing_symptoms(store, &updated.names, options.dry_run, progress).await?;

    let report = CleanupReport {
        processed: updated.processed,
        changed: updated.changed,
        distinct_symptoms: updated.names.len(),
        inserted: inserted.inserted,
        already_present: inserted.existing,
        dry_run: options.dry_run,
        started_at,
        elapsed: start.elapsed(),
    };

    info!(
        processed = report.processed,
        changed = report.changed,
        distinct = report.distinct_symptoms,
        inserted = report.inserted,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "cleanup finished"
    );

    progress.done(&report);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use async_trait::async_trait;
    use bson::{Bson, doc};
    use symptomfix_shared::{KnowledgeBaseRecord, SymptomFixError};
    use symptomfix_storage::MemoryStore;

    fn seeded_store() -> MemoryStore {
        MemoryStore::new().with_knowledge_bases([
            doc! { "_id": 1, "symptoms": ["fever_", "chest_pain   severe"], "diagnosis": "a" },
            doc! { "_id": 2, "symptoms": ["fever_", "  cough"], "diagnosis": "b" },
            doc! { "_id": 3, "symptoms": ["cough"], "diagnosis": "c" },
        ])
    }

    async fn referenced_names(store: &MemoryStore) -> BTreeSet<String> {
        store
            .load_knowledge_bases()
            .await
            .expect("load")
            .into_iter()
            .flat_map(|r| r.symptoms)
            .collect()
    }

    #[tokio::test]
    async fn shared_symptom_gets_one_lookup_entry() {
        let store = seeded_store();
        let report = run_cleanup(&store, &CleanupOptions::default(), &SilentProgress)
            .await
            .expect("cleanup");

        assert_eq!(report.processed, 3);
        assert_eq!(report.changed, 2);
        assert_eq!(report.distinct_symptoms, 3);
        assert_eq!(report.inserted, 3);

        let names = store.symptom_names().await;
        assert_eq!(names.iter().filter(|n| n.as_str() == "fever").count(), 1);
    }

    #[tokio::test]
    async fn every_referenced_name_is_in_lookup() {
        let store = seeded_store().with_symptoms(["unrelated"]);
        run_cleanup(&store, &CleanupOptions::default(), &SilentProgress)
            .await
            .expect("cleanup");

        let lookup: BTreeSet<String> = store.symptom_names().await.into_iter().collect();
        let referenced = referenced_names(&store).await;
        assert!(referenced.is_subset(&lookup), "{referenced:?} not within {lookup:?}");
        assert!(lookup.contains("unrelated"));
    }

    #[tokio::test]
    async fn reuses_lookup_index_created_by_backend() {
        let store = seeded_store()
            .with_symptoms(["fever"])
            .with_symptom_index(symptomfix_storage::SYMPTOM_NAME_INDEX);

        let report = run_cleanup(&store, &CleanupOptions::default(), &SilentProgress)
            .await
            .expect("cleanup against an indexed lookup");

        assert_eq!(report.inserted, 2);
        assert_eq!(report.already_present, 1);
        let lookup: BTreeSet<String> = store.symptom_names().await.into_iter().collect();
        assert!(referenced_names(&store).await.is_subset(&lookup));
    }

    #[tokio::test]
    async fn idempotent_rerun_leaves_documents_unchanged() {
        let store = seeded_store().with_timestamps(true);
        run_cleanup(&store, &CleanupOptions::default(), &SilentProgress)
            .await
            .expect("first");
        let kb_before = store.knowledge_base_documents().await;
        let lookup_before = store.symptom_documents().await;

        run_cleanup(&store, &CleanupOptions::default(), &SilentProgress)
            .await
            .expect("second");

        assert_eq!(store.knowledge_base_documents().await, kb_before);
        assert_eq!(store.symptom_documents().await, lookup_before);
    }

    #[tokio::test]
    async fn second_run_adds_no_duplicates() {
        let store = seeded_store();
        let first = run_cleanup(&store, &CleanupOptions::default(), &SilentProgress)
            .await
            .expect("first");
        let second = run_cleanup(&store, &CleanupOptions::default(), &SilentProgress)
            .await
            .expect("second");

        assert_eq!(second.inserted, 0);
        assert_eq!(second.already_present, first.distinct_symptoms);
        assert_eq!(second.changed, 0);

        let names = store.symptom_names().await;
        let unique: BTreeSet<&String> = names.iter().collect();
        assert_eq!(names.len(), unique.len());
    }

    #[tokio::test]
    async fn dry_run_reports_without_writing() {
        let store = seeded_store();
        let before = store.knowledge_base_documents().await;

        let report = run_cleanup(&store, &CleanupOptions { dry_run: true }, &SilentProgress)
            .await
            .expect("dry run");

        assert!(report.dry_run);
        assert_eq!(report.inserted, 3);
        assert_eq!(store.knowledge_base_documents().await, before);
        assert!(store.symptom_names().await.is_empty());
        assert!(report.summary_line().starts_with("[dry run] "));
    }

    #[tokio::test]
    async fn summary_line_matches_counts() {
        let store = seeded_store();
        let report = run_cleanup(&store, &CleanupOptions::default(), &SilentProgress)
            .await
            .expect("cleanup");
        assert_eq!(
            report.summary_line(),
            "Updated 3 knowledge base documents and added 3 unique symptoms."
        );
    }

    #[tokio::test]
    async fn report_serializes_elapsed_as_millis() {
        let report = run_cleanup(&MemoryStore::new(), &CleanupOptions::default(), &SilentProgress)
            .await
            .expect("cleanup");
        let json = serde_json::to_value(&report).expect("json");
        assert_eq!(json["processed"], 0);
        assert!(json["elapsed_ms"].is_u64());
        assert!(json.get("elapsed").is_none());
    }

    /// Store whose writes fail after a fixed number of successes.
    struct FailingStore {
        inner: MemoryStore,
        writes_left: AtomicUsize,
        lookups: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SymptomStore for FailingStore {
        async fn load_knowledge_bases(&self) -> Result<Vec<KnowledgeBaseRecord>> {
            self.inner.load_knowledge_bases().await
        }

        async fn replace_symptoms(
            &self,
            id: &Bson,
            symptoms: &[String],
            changed: bool,
        ) -> Result<()> {
            if self.writes_left.load(Ordering::SeqCst) == 0 {
                return Err(SymptomFixError::storage("write refused"));
            }
            self.writes_left.fetch_sub(1, Ordering::SeqCst);
            self.inner.replace_symptoms(id, symptoms, changed).await
        }

        async fn ensure_symptom_index(&self) -> Result<()> {
            self.inner.ensure_symptom_index().await
        }

        async fn symptom_exists(&self, name: &str) -> Result<bool> {
            self.inner.symptom_exists(name).await
        }

        async fn upsert_symptom(&self, name: &str) -> Result<bool> {
            self.lookups.lock().expect("lock").push(name.to_string());
            self.inner.upsert_symptom(name).await
        }
    }

    #[tokio::test]
    async fn failed_write_stops_the_run() {
        let store = FailingStore {
            inner: seeded_store(),
            writes_left: AtomicUsize::new(1),
            lookups: Mutex::new(Vec::new()),
        };

        let err = run_cleanup(&store, &CleanupOptions::default(), &SilentProgress)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("write refused"));

        // First record was written, the rest were not, and the lookup pass never ran.
        let docs = store.inner.knowledge_base_documents().await;
        assert_eq!(docs[0].get_array("symptoms").expect("symptoms")[0].as_str(), Some("fever"));
        assert_eq!(docs[1].get_array("symptoms").expect("symptoms")[0].as_str(), Some("fever_"));
        assert!(store.lookups.lock().expect("lock").is_empty());
    }
}
