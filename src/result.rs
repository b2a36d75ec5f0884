use serde::{Deserialize, Serialize};

use crate::core::{
    CustomData, Entity, EntityId, EntityTypeRow, FieldDef, PresenceSnapshot, StoreError,
};

/// One section of a composite result, sourced from a store whose failure
/// is tolerated. Degradation is explicit: a consumer can always tell "no
/// data exists" apart from "the store holding it was unreachable".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum Section<T> {
    Available(T),
    /// The store answered and holds nothing under this key.
    Missing,
    /// The store failed or timed out; the reason is passed through verbatim.
    Unavailable { reason: String },
}

impl<T> Section<T> {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }

    pub fn available(self) -> Option<T> {
        match self {
            Self::Available(data) => Some(data),
            _ => None,
        }
    }

    pub(crate) fn from_store_result(
        result: crate::core::Result<Option<T>>,
    ) -> Self {
        match result {
            Ok(Some(data)) => Self::Available(data),
            Ok(None) => Self::Missing,
            Err(err) => Self::Unavailable {
                reason: err.to_string(),
            },
        }
    }
}

/// The merged, partial-failure-tolerant view of one entity across all
/// three stores. The canonical part is always present; its absence is an
/// error, never a degraded view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositeView {
    pub entity: Entity,
    /// Count of durable attendance rows already finalized for this entity.
    pub finalized_count: usize,
    pub custom_data: Section<CustomData>,
    pub schema: Section<Vec<FieldDef>>,
    pub presence: Section<PresenceSnapshot>,
}

/// Outcome of the secondary half of a two-store write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SecondaryWriteStatus {
    Ok,
    /// Nothing was written because the command carried no secondary payload.
    Skipped,
    /// The canonical write landed but this one did not. The canonical row
    /// is marked incomplete for later repair.
    Failed { reason: String },
}

impl SecondaryWriteStatus {
    pub fn from_error(err: &StoreError) -> Self {
        Self::Failed {
            reason: err.to_string(),
        }
    }
}

/// Result of an entity or type write command: the canonical outcome plus
/// the explicit status of the companion flexible-store write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteOutcome<Id> {
    pub id: Id,
    pub secondary: SecondaryWriteStatus,
}

pub type EntityWriteOutcome = WriteOutcome<EntityId>;

/// A type definition merged back together from both stores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityTypeView {
    #[serde(flatten)]
    pub row: EntityTypeRow,
    pub fields: Section<Vec<FieldDef>>,
}

/// Result of a finalization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalizeOutcome {
    pub entity_id: EntityId,
    /// Records written durably by this run.
    pub members_finalized: usize,
    /// Members skipped because an earlier run already finalized them.
    pub already_finalized: usize,
}
