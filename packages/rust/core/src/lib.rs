//! Cleanup logic for the knowledge base symptom data.
//!
//! [`normalize`] holds the string transform, [`updater`] and [`inserter`]
//! the two passes over the store, and [`pipeline`] ties them together into
//! [`pipeline::run_cleanup`].

pub mod inserter;
pub mod normalize;
pub mod pipeline;
pub mod updater;

pub use pipeline::{CleanupOptions, CleanupReport, ProgressReporter, SilentProgress, run_cleanup};
