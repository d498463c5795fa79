//! Database utilities for connections and schema provisioning.
//!
//! This module provides:
//! - SQLite connection helpers: [`connection::connect_sqlite`] applies WAL, foreign_keys=ON, and a 5000ms busy_timeout.
//! - Schema provisioning: [`provision::provision`] drops dependent tables before the
//!   tables they reference, then recreates both plus the secondary indexes.
//!
//! Provisioning is a full replace: the pipeline persists one batch run per
//! database, and re-provisioning an already-provisioned store is always safe.

pub mod connection;
pub mod provision;
