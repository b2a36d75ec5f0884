use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::core::{
    Entity, EntityFields, EntityId, EntityTypeRow, FinalizedRecord, Result, StoreError, TypeId,
};

/// The store of record. Owns identity assignment, the fixed core fields,
/// the canonical half of entity types, and finalized attendance rows.
///
/// Every operation is individually atomic. Failures here are fatal to the
/// operation that invoked them; this is the only store whose failure is not
/// tolerated anywhere in the coordination layer.
#[async_trait]
pub trait CanonicalStore: Send + Sync {
    async fn create_entity(&self, fields: EntityFields) -> Result<EntityId>;
    async fn get_entity(&self, id: EntityId) -> Result<Entity>;
    async fn update_entity(&self, id: EntityId, fields: EntityFields) -> Result<Entity>;
    async fn delete_entity(&self, id: EntityId) -> Result<()>;
    async fn list_entities(&self) -> Result<Vec<Entity>>;

    /// Flip the repair marker left behind by a failed custom-data write.
    async fn set_custom_data_incomplete(&self, id: EntityId, incomplete: bool) -> Result<()>;

    async fn create_type(&self, name: String, description: Option<String>) -> Result<TypeId>;
    async fn get_type(&self, id: TypeId) -> Result<EntityTypeRow>;
    async fn update_type(
        &self,
        id: TypeId,
        name: String,
        description: Option<String>,
    ) -> Result<()>;
    async fn list_types(&self) -> Result<Vec<EntityTypeRow>>;
    async fn set_schema_incomplete(&self, id: TypeId, incomplete: bool) -> Result<()>;

    /// Append finalized attendance rows for one entity as a single batch.
    async fn append_finalized(&self, records: Vec<FinalizedRecord>) -> Result<()>;
    async fn finalized_for_entity(&self, id: EntityId) -> Result<Vec<FinalizedRecord>>;

    /// Cheap liveness probe.
    async fn ping(&self) -> Result<()>;
}

#[derive(Default)]
struct CanonicalState {
    entities: HashMap<EntityId, Entity>,
    types: HashMap<TypeId, EntityTypeRow>,
    finalized: Vec<FinalizedRecord>,
}

/// Reference canonical store: all tables under one lock, ids from atomic
/// counters so identity assignment never depends on lock order.
pub struct InMemoryCanonicalStore {
    state: RwLock<CanonicalState>,
    next_entity_id: AtomicU64,
    next_type_id: AtomicU64,
}

impl InMemoryCanonicalStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(CanonicalState::default()),
            next_entity_id: AtomicU64::new(1),
            next_type_id: AtomicU64::new(1),
        }
    }
}

impl Default for InMemoryCanonicalStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CanonicalStore for InMemoryCanonicalStore {
    async fn create_entity(&self, fields: EntityFields) -> Result<EntityId> {
        if let Some(type_id) = fields.type_id {
            let state = self.state.read().await;
            if !state.types.contains_key(&type_id) {
                return Err(StoreError::TypeNotFound(type_id.0));
            }
        }

        let id = EntityId(self.next_entity_id.fetch_add(1, Ordering::SeqCst));
        let entity = Entity {
            id,
            description: fields.description,
            location: fields.location,
            type_id: fields.type_id,
            custom_data_incomplete: false,
        };

        let mut state = self.state.write().await;
        state.entities.insert(id, entity);
        Ok(id)
    }

    async fn get_entity(&self, id: EntityId) -> Result<Entity> {
        let state = self.state.read().await;
        state
            .entities
            .get(&id)
            .cloned()
            .ok_or(StoreError::EntityNotFound(id.0))
    }

    async fn update_entity(&self, id: EntityId, fields: EntityFields) -> Result<Entity> {
        let mut state = self.state.write().await;
        if let Some(type_id) = fields.type_id {
            if !state.types.contains_key(&type_id) {
                return Err(StoreError::TypeNotFound(type_id.0));
            }
        }
        let entity = state
            .entities
            .get_mut(&id)
            .ok_or(StoreError::EntityNotFound(id.0))?;
        entity.description = fields.description;
        entity.location = fields.location;
        entity.type_id = fields.type_id;
        Ok(entity.clone())
    }

    async fn delete_entity(&self, id: EntityId) -> Result<()> {
        let mut state = self.state.write().await;
        if state.entities.remove(&id).is_none() {
            return Err(StoreError::EntityNotFound(id.0));
        }
        state.finalized.retain(|r| r.entity_id != id);
        Ok(())
    }

    async fn list_entities(&self) -> Result<Vec<Entity>> {
        let state = self.state.read().await;
        let mut entities: Vec<Entity> = state.entities.values().cloned().collect();
        entities.sort_by_key(|e| e.id);
        Ok(entities)
    }

    async fn set_custom_data_incomplete(&self, id: EntityId, incomplete: bool) -> Result<()> {
        let mut state = self.state.write().await;
        let entity = state
            .entities
            .get_mut(&id)
            .ok_or(StoreError::EntityNotFound(id.0))?;
        entity.custom_data_incomplete = incomplete;
        Ok(())
    }

    async fn create_type(&self, name: String, description: Option<String>) -> Result<TypeId> {
        let id = TypeId(self.next_type_id.fetch_add(1, Ordering::SeqCst));
        let row = EntityTypeRow {
            id,
            name,
            description,
            schema_incomplete: false,
        };
        let mut state = self.state.write().await;
        state.types.insert(id, row);
        Ok(id)
    }

    async fn get_type(&self, id: TypeId) -> Result<EntityTypeRow> {
        let state = self.state.read().await;
        state
            .types
            .get(&id)
            .cloned()
            .ok_or(StoreError::TypeNotFound(id.0))
    }

    async fn update_type(
        &self,
        id: TypeId,
        name: String,
        description: Option<String>,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        let row = state
            .types
            .get_mut(&id)
            .ok_or(StoreError::TypeNotFound(id.0))?;
        row.name = name;
        row.description = description;
        Ok(())
    }

    async fn list_types(&self) -> Result<Vec<EntityTypeRow>> {
        let state = self.state.read().await;
        let mut types: Vec<EntityTypeRow> = state.types.values().cloned().collect();
        types.sort_by_key(|t| t.id);
        Ok(types)
    }

    async fn set_schema_incomplete(&self, id: TypeId, incomplete: bool) -> Result<()> {
        let mut state = self.state.write().await;
        let row = state
            .types
            .get_mut(&id)
            .ok_or(StoreError::TypeNotFound(id.0))?;
        row.schema_incomplete = incomplete;
        Ok(())
    }

    async fn append_finalized(&self, records: Vec<FinalizedRecord>) -> Result<()> {
        let mut state = self.state.write().await;
        state.finalized.extend(records);
        Ok(())
    }

    async fn finalized_for_entity(&self, id: EntityId) -> Result<Vec<FinalizedRecord>> {
        let state = self.state.read().await;
        Ok(state
            .finalized
            .iter()
            .filter(|r| r.entity_id == id)
            .cloned()
            .collect())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
