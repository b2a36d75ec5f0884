pub mod finalize;
pub mod read;

pub use finalize::FinalizationCoordinator;
pub use read::MergeReadCoordinator;

use std::future::Future;
use std::time::Duration;

use crate::core::{Result, StoreError, StoreKind};

/// Bound a canonical store call. Elapsing the timeout aborts the whole
/// operation, like any other canonical failure.
pub(crate) async fn canonical_call<T, F>(timeout: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout {
            kind: StoreKind::Canonical,
            timeout,
        }),
    }
}

/// Bound a flexible-attribute or ephemeral store call. Elapsing the
/// timeout is treated exactly like a hard failure of that store.
pub(crate) async fn secondary_call<T, F>(kind: StoreKind, timeout: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout { kind, timeout }),
    }
}
