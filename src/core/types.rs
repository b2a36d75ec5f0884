use std::collections::{HashMap, HashSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{FieldType, Value};

macro_rules! id_newtype {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }
    };
}

id_newtype! {
    /// Canonical entity identity. Assigned by the canonical store on
    /// creation; unique and monotonic, never reused.
    EntityId
}

id_newtype! {
    /// Canonical entity-type identity. The same id keys the schema document
    /// in the flexible-attribute store, by convention only.
    TypeId
}

id_newtype! {
    /// Member identity. Supplied by the caller, not assigned here.
    MemberId
}

/// Mutable core fields of an entity, used for create and update commands.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityFields {
    pub description: String,
    pub location: String,
    pub type_id: Option<TypeId>,
}

impl EntityFields {
    pub fn new(description: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            location: location.into(),
            type_id: None,
        }
    }

    pub fn with_type(mut self, type_id: TypeId) -> Self {
        self.type_id = Some(type_id);
        self
    }
}

/// The canonical entity record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub description: String,
    pub location: String,
    pub type_id: Option<TypeId>,
    /// Set when a custom-data write failed after the canonical write
    /// landed; cleared by the next successful custom-data write.
    pub custom_data_incomplete: bool,
}

/// Canonical half of an entity type. The field definitions live in the
/// flexible-attribute store under the same id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityTypeRow {
    pub id: TypeId,
    pub name: String,
    pub description: Option<String>,
    /// Set when the schema write failed after the canonical write landed;
    /// cleared by the next successful schema write.
    pub schema_incomplete: bool,
}

/// One custom field declaration inside a type schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Per-entity custom attribute values. Replaced wholesale on every write.
pub type CustomData = HashMap<String, Value>;

/// Whether a member is currently present, as reported by a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PresenceState {
    Present,
    Absent,
}

/// Live presence data for one entity, as read from the ephemeral store.
///
/// The three parts are advisory with respect to each other: a reader may
/// observe a member in `present` whose timestamps have not become visible
/// yet. Finalization works from the union of the two timestamp maps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PresenceSnapshot {
    pub present: HashSet<MemberId>,
    pub first_seen: HashMap<MemberId, DateTime<Utc>>,
    pub last_seen: HashMap<MemberId, DateTime<Utc>>,
}

impl PresenceSnapshot {
    pub fn present_count(&self) -> usize {
        self.present.len()
    }

    pub fn is_empty(&self) -> bool {
        self.present.is_empty() && self.first_seen.is_empty() && self.last_seen.is_empty()
    }

    /// Every member that ever checked in, present or not.
    pub fn all_members(&self) -> HashSet<MemberId> {
        self.first_seen
            .keys()
            .chain(self.last_seen.keys())
            .copied()
            .collect()
    }
}

/// Durable attendance row, written once per (entity, member) at
/// finalization. `last_seen` is `None` for members still present when the
/// entity was finalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalizedRecord {
    pub entity_id: EntityId,
    pub member_id: MemberId,
    pub first_seen: DateTime<Utc>,
    pub last_seen: Option<DateTime<Utc>>,
}
