//! Batch enrichment pipeline for mobile-banking app reviews: collect, clean,
//! classify sentiment, assign a theme, persist to SQLite, and verify the
//! stored aggregates against the source dataset.

#![deny(missing_docs)]

pub mod config;
pub mod db;
pub mod models;
pub mod pipeline;
pub mod records;
pub mod schema;
pub mod sentiment;
pub mod snapshot;
pub mod store;
pub mod text;
pub mod themes;
pub mod verify;
