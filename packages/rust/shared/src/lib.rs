//! Shared types, error model, and configuration for symptomfix.
//!
//! This crate is the foundation depended on by all other symptomfix crates.
//! It provides:
//! - [`SymptomFixError`] — the unified error type
//! - Domain types ([`KnowledgeBaseRecord`], [`SymptomRecord`]) and field names
//! - Configuration ([`AppConfig`], [`RunConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CleanupSection, RunConfig, RunOverrides, StoreConfig, StoreSection, config_dir,
    config_file_path, init_config, load_config, load_config_from,
};
pub use error::{Result, SymptomFixError};
pub use types::{
    CREATED_AT_FIELD, ID_FIELD, KnowledgeBaseRecord, NAME_FIELD, SYMPTOMS_FIELD, SymptomRecord,
    UPDATED_AT_FIELD,
};
