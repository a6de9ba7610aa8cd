//! Batch update of knowledge base symptom lists.

use std::collections::BTreeSet;

use symptomfix_shared::Result;
use symptomfix_storage::SymptomStore;
use tracing::{debug, info, instrument};

use crate::normalize::normalize_all;
use crate::pipeline::ProgressReporter;

/// What the batch update did.
#[derive(Debug, Default)]
pub struct UpdateOutcome {
    /// Records read (and, outside dry runs, written back).
    pub processed: usize,
    /// Records whose symptom list differed after normalization.
    pub changed: usize,
    /// Every distinct normalized symptom seen across all records.
    pub names: BTreeSet<String>,
}

/// Normalize every knowledge base record and write each list back.
///
/// Every record is written, changed or not, but only changed records get a
/// fresh `updatedAt`. The first failing write aborts the batch; records
/// written before it stay written.
#[instrument(skip_all, fields(dry_run = dry_run))]
pub async fn update_knowledge_bases(
    store: &dyn SymptomStore,
    dry_run: bool,
    progress: &dyn ProgressReporter,
) -> Result<UpdateOutcome> {
    let records = store.load_knowledge_bases().await?;
    let total = records.len();
    info!(total, "normalizing knowledge base symptoms");

    let mut outcome = UpdateOutcome::default();

    for (i, record) in records.into_iter().enumerate() {
        let normalized = normalize_all(&record.symptoms);

        let changed = normalized != record.symptoms;
        if changed {
            outcome.changed += 1;
            debug!(
                id = %record.id,
                before = ?record.symptoms,
                after = ?normalized,
                "symptoms rewritten"
            );
        }

        if !dry_run {
            store.replace_symptoms(&record.id, &normalized, changed).await?;
        }

        outcome.names.extend(normalized);
        outcome.processed += 1;
        progress.record_updated(i + 1, total);
    }

    info!(
        processed = outcome.processed,
        changed = outcome.changed,
        distinct = outcome.names.len(),
        "knowledge base pass finished"
    );
    Ok(outcome)
}
