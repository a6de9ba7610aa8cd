//! Filter and update documents shared by the store backends.

use bson::{Bson, DateTime, Document, doc};
use mongodb::IndexModel;
use mongodb::options::IndexOptions;
use symptomfix_shared::{CREATED_AT_FIELD, ID_FIELD, NAME_FIELD, SYMPTOMS_FIELD, UPDATED_AT_FIELD};

/// Match a knowledge base record by `_id`.
pub(crate) fn by_id(id: &Bson) -> Document {
    doc! { ID_FIELD: id.clone() }
}

/// Match a symptom entry by exact name.
pub(crate) fn by_name(name: &str) -> Document {
    doc! { NAME_FIELD: name }
}

/// Only the fields the cleanup reads.
pub(crate) fn knowledge_base_projection() -> Document {
    doc! { ID_FIELD: 1, SYMPTOMS_FIELD: 1 }
}

/// `$set` replacing the symptom list, refreshing `updatedAt` when stamped.
pub(crate) fn set_symptoms(symptoms: &[String], now: Option<DateTime>) -> Document {
    let mut set = doc! { SYMPTOMS_FIELD: symptoms.to_vec() };
    if let Some(now) = now {
        set.insert(UPDATED_AT_FIELD, now);
    }
    doc! { "$set": set }
}

/// Body of a new symptom entry.
pub(crate) fn new_symptom(name: &str, now: Option<DateTime>) -> Document {
    let mut entry = doc! { NAME_FIELD: name };
    if let Some(now) = now {
        entry.insert(CREATED_AT_FIELD, now);
        entry.insert(UPDATED_AT_FIELD, now);
    }
    entry
}

/// Unique index on `name`, left unnamed so the server picks `name_1`.
///
/// Giving it any other name makes `createIndexes` fail with
/// IndexOptionsConflict against the index the backend already created.
pub(crate) fn symptom_name_index() -> IndexModel {
    IndexModel::builder()
        .keys(doc! { NAME_FIELD: 1 })
        .options(IndexOptions::builder().unique(true).build())
        .build()
}

/// The name the server gives an index that was created without one.
pub(crate) fn index_name(index: &IndexModel) -> String {
    if let Some(name) = index.options.as_ref().and_then(|o| o.name.clone()) {
        return name;
    }
    index
        .keys
        .iter()
        .map(|(field, order)| match order {
            Bson::Int32(n) => format!("{field}_{n}"),
            Bson::Int64(n) => format!("{field}_{n}"),
            Bson::String(kind) => format!("{field}_{kind}"),
            other => format!("{field}_{other}"),
        })
        .collect::<Vec<_>>()
        .join("_")
}

/// `$setOnInsert` so an existing entry is never modified.
pub(crate) fn upsert_symptom(name: &str, now: Option<DateTime>) -> Document {
    doc! { "$setOnInsert": new_symptom(name, now) }
}
