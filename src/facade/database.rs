use std::sync::Arc;

use tracing::warn;

use crate::config::{DbConfig, ValidationMode};
use crate::coordinator::{canonical_call, secondary_call, FinalizationCoordinator, MergeReadCoordinator};
use crate::core::{
    CustomData, Entity, EntityFields, EntityId, FieldDef, FinalizedRecord, MemberId,
    PresenceSnapshot, PresenceState, Result, StoreError, StoreKind, TypeId,
};
use crate::registry::EntityTypeRegistry;
use crate::result::{
    CompositeView, EntityTypeView, EntityWriteOutcome, FinalizeOutcome, SecondaryWriteStatus,
    WriteOutcome,
};
use crate::storage::{
    CanonicalStore, EphemeralStore, FlexibleStore, InMemoryCanonicalStore, InMemoryEphemeralStore,
    InMemoryFlexibleStore,
};

/// Payload for entity creation: the canonical core fields plus an optional
/// custom-attribute document destined for the flexible store.
#[derive(Debug, Clone, Default)]
pub struct EntityDraft {
    pub fields: EntityFields,
    pub custom_data: Option<CustomData>,
}

impl EntityDraft {
    pub fn new(fields: EntityFields) -> Self {
        Self {
            fields,
            custom_data: None,
        }
    }

    pub fn with_custom_data(mut self, data: CustomData) -> Self {
        self.custom_data = Some(data);
        self
    }
}

/// The command/query front door over the three stores.
///
/// All store handles are injected at construction and shared with the
/// coordinators; nothing is global. The in-memory constructor wires the
/// reference store implementations, which is what tests and embedded use
/// run on; production callers pass their own adapters.
///
/// # Examples
///
/// ```
/// use attendb::{EntityDraft, EntityFields, EventDb};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> attendb::Result<()> {
/// let db = EventDb::in_memory();
///
/// let outcome = db
///     .create_entity(EntityDraft::new(EntityFields::new("Fall Retreat", "Camp Pinewood")))
///     .await?;
/// let view = db.composite_view(outcome.id).await?;
/// assert_eq!(view.entity.description, "Fall Retreat");
/// # Ok(())
/// # }
/// ```
pub struct EventDb {
    canonical: Arc<dyn CanonicalStore>,
    flexible: Arc<dyn FlexibleStore>,
    ephemeral: Arc<dyn EphemeralStore>,
    registry: EntityTypeRegistry,
    finalizer: FinalizationCoordinator,
    reader: MergeReadCoordinator,
    config: DbConfig,
}

impl EventDb {
    /// All three stores in-memory, default configuration.
    pub fn in_memory() -> Self {
        Self::in_memory_with_config(DbConfig::default())
    }

    pub fn in_memory_with_config(config: DbConfig) -> Self {
        Self::with_stores(
            Arc::new(InMemoryCanonicalStore::new()),
            Arc::new(InMemoryFlexibleStore::new()),
            Arc::new(InMemoryEphemeralStore::new()),
            config,
        )
    }

    /// Wire the coordination layer over caller-provided store adapters.
    pub fn with_stores(
        canonical: Arc<dyn CanonicalStore>,
        flexible: Arc<dyn FlexibleStore>,
        ephemeral: Arc<dyn EphemeralStore>,
        config: DbConfig,
    ) -> Self {
        let registry = EntityTypeRegistry::new(
            Arc::clone(&canonical),
            Arc::clone(&flexible),
            config.clone(),
        );
        let finalizer = FinalizationCoordinator::new(
            Arc::clone(&canonical),
            Arc::clone(&ephemeral),
            config.clone(),
        );
        let reader = MergeReadCoordinator::new(
            Arc::clone(&canonical),
            Arc::clone(&flexible),
            Arc::clone(&ephemeral),
            config.clone(),
        );
        Self {
            canonical,
            flexible,
            ephemeral,
            registry,
            finalizer,
            reader,
            config,
        }
    }

    // ========================================================================
    // Entity commands
    // ========================================================================

    /// Create an entity: canonical write first (assigning the identity),
    /// then the custom-data write keyed by it. A failed custom-data write
    /// does not undo the creation; it is reported in the outcome and the
    /// entity is marked for repair.
    pub async fn create_entity(&self, draft: EntityDraft) -> Result<EntityWriteOutcome> {
        if let Some(data) = &draft.custom_data {
            self.validate_custom_data(draft.fields.type_id, data).await?;
        }

        let id = canonical_call(
            self.config.canonical_timeout,
            self.canonical.create_entity(draft.fields),
        )
        .await?;

        let secondary = match draft.custom_data {
            None => SecondaryWriteStatus::Skipped,
            Some(data) => self.write_custom_data(id, data).await,
        };

        Ok(WriteOutcome { id, secondary })
    }

    /// Update the canonical core fields of an entity.
    pub async fn update_entity(&self, id: EntityId, fields: EntityFields) -> Result<Entity> {
        canonical_call(
            self.config.canonical_timeout,
            self.canonical.update_entity(id, fields),
        )
        .await
    }

    /// Delete an entity and, best-effort, everything keyed by its identity
    /// in the other two stores. Secondary cleanup failures are logged, not
    /// surfaced: the canonical row is gone either way.
    pub async fn delete_entity(&self, id: EntityId) -> Result<()> {
        canonical_call(
            self.config.canonical_timeout,
            self.canonical.delete_entity(id),
        )
        .await?;

        if let Err(err) = secondary_call(
            StoreKind::Flexible,
            self.config.secondary_timeout,
            self.flexible.delete_custom_data(id),
        )
        .await
        {
            warn!(entity_id = %id, error = %err, "custom data not cleaned up after delete");
        }
        if let Err(err) = secondary_call(
            StoreKind::Ephemeral,
            self.config.secondary_timeout,
            self.ephemeral.clear(id),
        )
        .await
        {
            warn!(entity_id = %id, error = %err, "live presence not cleaned up after delete");
        }
        Ok(())
    }

    pub async fn entity(&self, id: EntityId) -> Result<Entity> {
        canonical_call(self.config.canonical_timeout, self.canonical.get_entity(id)).await
    }

    pub async fn entities(&self) -> Result<Vec<Entity>> {
        canonical_call(self.config.canonical_timeout, self.canonical.list_entities()).await
    }

    // ========================================================================
    // Custom data
    // ========================================================================

    /// Replace an entity's custom data wholesale. The entity must exist
    /// canonically; the write itself targets only the flexible store, and
    /// its failure is reported in the outcome rather than as an error.
    pub async fn set_custom_data(
        &self,
        id: EntityId,
        data: CustomData,
    ) -> Result<EntityWriteOutcome> {
        let entity = self.entity(id).await?;
        self.validate_custom_data(entity.type_id, &data).await?;
        let secondary = self.write_custom_data(id, data).await;
        Ok(WriteOutcome { id, secondary })
    }

    /// Direct custom-data read. The flexible store is the sole source
    /// here, so its failure is surfaced instead of degraded.
    pub async fn custom_data(&self, id: EntityId) -> Result<Option<CustomData>> {
        secondary_call(
            StoreKind::Flexible,
            self.config.secondary_timeout,
            self.flexible.get_custom_data(id),
        )
        .await
    }

    // ========================================================================
    // Entity types
    // ========================================================================

    pub async fn define_type(
        &self,
        name: impl Into<String>,
        description: Option<String>,
        fields: Vec<FieldDef>,
    ) -> Result<WriteOutcome<TypeId>> {
        self.registry.define(name, description, fields).await
    }

    pub async fn update_type(
        &self,
        type_id: TypeId,
        name: impl Into<String>,
        description: Option<String>,
        fields: Vec<FieldDef>,
    ) -> Result<WriteOutcome<TypeId>> {
        self.registry.update(type_id, name, description, fields).await
    }

    pub async fn entity_type(&self, type_id: TypeId) -> Result<EntityTypeView> {
        self.registry.get(type_id).await
    }

    pub async fn entity_types(&self) -> Result<Vec<EntityTypeView>> {
        self.registry.list().await
    }

    // ========================================================================
    // Live presence
    // ========================================================================

    /// Arrive/depart toggle. Writes only to the ephemeral store; the
    /// canonical store is untouched until finalization.
    pub async fn toggle_presence(
        &self,
        entity_id: EntityId,
        member_id: MemberId,
    ) -> Result<PresenceState> {
        secondary_call(
            StoreKind::Ephemeral,
            self.config.secondary_timeout,
            self.ephemeral.toggle_presence(entity_id, member_id),
        )
        .await
    }

    /// Live attendance snapshot straight from the ephemeral store.
    pub async fn live_presence(&self, entity_id: EntityId) -> Result<PresenceSnapshot> {
        secondary_call(
            StoreKind::Ephemeral,
            self.config.secondary_timeout,
            self.ephemeral.get_presence(entity_id),
        )
        .await
    }

    /// Uniformly random currently-present member, if anyone is checked in.
    pub async fn random_present(&self, entity_id: EntityId) -> Result<Option<MemberId>> {
        secondary_call(
            StoreKind::Ephemeral,
            self.config.secondary_timeout,
            self.ephemeral.random_present(entity_id),
        )
        .await
    }

    // ========================================================================
    // Finalization and composite reads
    // ========================================================================

    /// Promote an entity's live presence into durable attendance rows and
    /// clear the live record. See [`FinalizationCoordinator`].
    pub async fn finalize(&self, entity_id: EntityId) -> Result<FinalizeOutcome> {
        self.finalizer.finalize(entity_id).await
    }

    /// Durable attendance rows already finalized for an entity.
    pub async fn finalized_attendance(&self, entity_id: EntityId) -> Result<Vec<FinalizedRecord>> {
        canonical_call(
            self.config.canonical_timeout,
            self.canonical.finalized_for_entity(entity_id),
        )
        .await
    }

    /// The merged three-store view. See [`MergeReadCoordinator`].
    pub async fn composite_view(&self, entity_id: EntityId) -> Result<CompositeView> {
        self.reader.composite_view(entity_id).await
    }

    pub async fn ping(&self) -> Result<()> {
        canonical_call(self.config.canonical_timeout, self.canonical.ping()).await
    }

    // ========================================================================
    // Internals
    // ========================================================================

    async fn write_custom_data(&self, id: EntityId, data: CustomData) -> SecondaryWriteStatus {
        match secondary_call(
            StoreKind::Flexible,
            self.config.secondary_timeout,
            self.flexible.put_custom_data(id, data),
        )
        .await
        {
            Ok(()) => {
                if let Err(err) = self.canonical.set_custom_data_incomplete(id, false).await {
                    warn!(entity_id = %id, error = %err, "failed to clear custom-data marker");
                }
                SecondaryWriteStatus::Ok
            }
            Err(err) => {
                warn!(entity_id = %id, error = %err, "custom data write failed; entity marked incomplete");
                if let Err(mark_err) = self.canonical.set_custom_data_incomplete(id, true).await {
                    warn!(entity_id = %id, error = %mark_err, "failed to set custom-data marker");
                }
                SecondaryWriteStatus::from_error(&err)
            }
        }
    }

    /// Strict-mode payload validation against the entity type's field
    /// list. Degrades to permissive when the schema cannot be read, since
    /// a flexible-store outage must never fail a canonical write.
    async fn validate_custom_data(
        &self,
        type_id: Option<TypeId>,
        data: &CustomData,
    ) -> Result<()> {
        if self.config.validation == ValidationMode::Permissive {
            return Ok(());
        }
        let Some(type_id) = type_id else {
            return Ok(());
        };
        let fields = match self.registry.schema_for(type_id).await {
            Ok(Some(fields)) => fields,
            // No schema document: nothing is declared, nothing to enforce.
            Ok(None) => return Ok(()),
            Err(err) => {
                warn!(%type_id, error = %err, "schema unreadable; accepting payload unvalidated");
                return Ok(());
            }
        };

        for (name, value) in data {
            match fields.iter().find(|f| f.name == *name) {
                None => {
                    return Err(StoreError::Validation(format!(
                        "Unknown field '{}' for type '{}'",
                        name, type_id
                    )));
                }
                Some(field) if !field.field_type.is_compatible(value) => {
                    return Err(StoreError::Validation(format!(
                        "Field '{}' expects {}, got {}",
                        name,
                        field.field_type,
                        value.type_name()
                    )));
                }
                Some(_) => {}
            }
        }
        for field in fields.iter().filter(|f| f.required) {
            match data.get(&field.name) {
                Some(value) if !value.is_null() => {}
                _ => {
                    return Err(StoreError::Validation(format!(
                        "Required field '{}' is missing",
                        field.name
                    )));
                }
            }
        }
        Ok(())
    }
}
