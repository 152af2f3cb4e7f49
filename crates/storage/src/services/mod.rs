//! Transactional operations: load and lock, call the engine, persist, commit.
//!
//! Every function takes the [`Database`](crate::Database) explicitly and opens
//! its own transaction, so a failed step rolls back everything before it.

pub mod captures;
pub mod competitors;
pub mod editions;
pub mod ranking;
pub mod registrations;
pub mod rulers;
pub mod stages;

use crate::error::{Result, StorageError};

/// Converts an engine refusal, logging it as a rejected operation.
pub(crate) fn checked<T>(operation: &'static str, result: engine::Result<T>) -> Result<T> {
    result.map_err(|e| {
        tracing::warn!("{} rejected: {}", operation, e);
        StorageError::from(e)
    })
}
