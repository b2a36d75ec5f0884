pub mod error;
pub mod types;
pub mod value;

pub use error::{Result, StoreError, StoreKind};
pub use types::{
    CustomData, Entity, EntityFields, EntityId, EntityTypeRow, FieldDef, FinalizedRecord,
    MemberId, PresenceSnapshot, PresenceState, TypeId,
};
pub use value::{FieldType, Value};
