//! Deduplicated population of the symptom lookup.

use std::collections::BTreeSet;

use symptomfix_shared::Result;
use symptomfix_storage::SymptomStore;
use tracing::{debug, info, instrument};

use crate::pipeline::ProgressReporter;

/// What the lookup pass did.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct InsertOutcome {
    /// Entries created (or, in a dry run, that would be created).
    pub inserted: usize,
    /// Names that already had an entry.
    pub existing: usize,
}

/// Give every name in `names` exactly one lookup entry.
///
/// A unique index on `name` is ensured first and each name is upserted, so
/// two runs racing each other still cannot create duplicates. A dry run only
/// checks which names are missing.
#[instrument(skip_all, fields(count = names.len(), dry_run = dry_run))]
pub async fn insert_missing_symptoms(
    store: &dyn SymptomStore,
    names: &BTreeSet<String>,
    dry_run: bool,
    progress: &dyn ProgressReporter,
) -> Result<InsertOutcome> {
    if !dry_run {
        store.ensure_symptom_index().await?;
    }

    let total = names.len();
    let mut outcome = InsertOutcome::default();

    for (i, name) in names.iter().enumerate() {
        let created = if dry_run {
            !store.symptom_exists(name).await?
        } else {
            store.upsert_symptom(name).await?
        };

        if created {
            outcome.inserted += 1;
            debug!(symptom = %name, "symptom added to lookup");
        } else {
            outcome.existing += 1;
        }
        progress.symptom_checked(name, i + 1, total);
    }

    info!(
        inserted = outcome.inserted,
        existing = outcome.existing,
        "symptom lookup pass finished"
    );
    Ok(outcome)
}
