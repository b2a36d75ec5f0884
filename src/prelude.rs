//! Convenience re-exports for the common path: construct an [`EventDb`],
//! issue commands, read composite views.

pub use crate::config::{DbConfig, ValidationMode};
pub use crate::core::{
    CustomData, Entity, EntityFields, EntityId, FieldDef, FieldType, FinalizedRecord, MemberId,
    PresenceSnapshot, PresenceState, Result, StoreError, StoreKind, TypeId, Value,
};
pub use crate::facade::{EntityDraft, EventDb};
pub use crate::interface::EventClient;
pub use crate::result::{
    CompositeView, EntityTypeView, FinalizeOutcome, Section, SecondaryWriteStatus, WriteOutcome,
};
