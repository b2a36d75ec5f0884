// ============================================================================
// AttenDB Library
// ============================================================================
//
// Coordination layer for one logical entity whose facts span three
// independently-available stores:
//
//   - canonical store          identity, core fields, finalized attendance
//   - flexible-attribute store type schemas, per-entity custom data
//   - ephemeral store          live presence, cleared on finalization
//
// There is no shared transaction across stores. The layer implements the
// pattern that keeps them coherent anyway: best-effort fan-out writes with
// explicit repair markers, one-way promotion of live state into canonical
// records, and fan-out reads that tolerate partial unavailability of
// everything except the canonical store.

pub mod config;
pub mod coordinator;
pub mod core;
pub mod facade;
pub mod interface;
pub mod prelude;
pub mod registry;
pub mod result;
pub mod storage;

// Re-export main types for convenience
pub use config::{DbConfig, ValidationMode};
pub use core::{
    CustomData, Entity, EntityFields, EntityId, EntityTypeRow, FieldDef, FieldType,
    FinalizedRecord, MemberId, PresenceSnapshot, PresenceState, Result, StoreError, StoreKind,
    TypeId, Value,
};
pub use facade::{EntityDraft, EventDb};
pub use interface::EventClient;
pub use result::{
    CompositeView, EntityTypeView, EntityWriteOutcome, FinalizeOutcome, Section,
    SecondaryWriteStatus, WriteOutcome,
};
pub use storage::{
    CanonicalStore, EphemeralStore, FlexibleStore, InMemoryCanonicalStore,
    InMemoryEphemeralStore, InMemoryFlexibleStore,
};
