use std::time::Duration;
use thiserror::Error;

/// Which of the three stores an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Canonical,
    Flexible,
    Ephemeral,
}

impl std::fmt::Display for StoreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Canonical => write!(f, "canonical"),
            Self::Flexible => write!(f, "flexible-attribute"),
            Self::Ephemeral => write!(f, "ephemeral"),
        }
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Entity '{0}' not found")]
    EntityNotFound(u64),

    #[error("Entity type '{0}' not found")]
    TypeNotFound(u64),

    #[error("Canonical store unavailable: {0}")]
    CanonicalUnavailable(String),

    #[error("{kind} store unavailable: {reason}")]
    SecondaryUnavailable { kind: StoreKind, reason: String },

    #[error("{kind} store call timed out after {timeout:?}")]
    Timeout { kind: StoreKind, timeout: Duration },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Finalization already in progress for entity '{0}'")]
    FinalizeConflict(u64),

    #[error("Finalization of entity '{entity}' failed before live state was cleared: {reason}")]
    FinalizePartial { entity: u64, reason: String },
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    /// Whether a caller may safely retry the failed operation.
    ///
    /// Finalization failures never clear live state, so retrying them is
    /// always safe; unavailability and timeouts are transient by nature.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::CanonicalUnavailable(_)
                | Self::SecondaryUnavailable { .. }
                | Self::Timeout { .. }
                | Self::FinalizePartial { .. }
        )
    }

    /// The store this error is attributed to, when one is identifiable.
    pub fn store_kind(&self) -> Option<StoreKind> {
        match self {
            Self::CanonicalUnavailable(_) => Some(StoreKind::Canonical),
            Self::SecondaryUnavailable { kind, .. } | Self::Timeout { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
