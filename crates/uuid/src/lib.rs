//! Identifier and sharded-path utilities.
//!
//! HEMO identifies donors, hospitals, requests and donations with UUIDs, and stores per-hospital
//! inventory under sharded directories derived from the hospital UUID.
//!
//! To keep path derivation deterministic, HEMO uses a *canonical* UUID representation for every
//! identifier: **32 lowercase hexadecimal characters** (no hyphens).
//!
//! This crate provides:
//! - [`RecordId`], a wrapper that *guarantees* the canonical format once constructed.
//! - Shared sharding logic to derive a record's directory from its identifier.
//! - [`TimestampId`], a time-prefixed identifier used for inventory movements.
//!
//! ## Canonical UUID form
//! - Length: 32
//! - Characters: `0-9` and `a-f` only
//! - Example: `550e8400e29b41d4a716446655440000`
//!
//! Non-canonical values (uppercase, hyphenated, wrong length, non-hex) are rejected.
//!
//! ## Sharded directory layout
//! For a canonical UUID `u`, data lives under:
//! `parent_dir/<u[0..2]>/<u[2..4]>/<u>/`
//!
//! Example:
//! `inventory_data/55/0e/550e8400e29b41d4a716446655440000/`

mod service;

pub use service::{RecordId, TimestampId};

/// Error type for identifier operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type UuidResult<T> = Result<T, UuidError>;
