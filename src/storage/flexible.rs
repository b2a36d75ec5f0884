use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::core::{CustomData, EntityId, FieldDef, Result, TypeId};

/// Schema-less storage for variable-shaped data, keyed by canonical ids.
///
/// Holds exactly two logical collections: type schemas (field-definition
/// lists) and per-entity custom data. Keys are unique per collection; a
/// second write with the same key overwrites the previous document, which
/// is what gives updates their replace-wholesale semantics.
///
/// Callers must treat failures here as non-fatal: a canonical write that
/// succeeded stays succeeded even when the companion write here does not.
#[async_trait]
pub trait FlexibleStore: Send + Sync {
    async fn put_schema(&self, type_id: TypeId, fields: Vec<FieldDef>) -> Result<()>;
    async fn get_schema(&self, type_id: TypeId) -> Result<Option<Vec<FieldDef>>>;
    async fn delete_schema(&self, type_id: TypeId) -> Result<()>;

    async fn put_custom_data(&self, entity_id: EntityId, data: CustomData) -> Result<()>;
    async fn get_custom_data(&self, entity_id: EntityId) -> Result<Option<CustomData>>;
    async fn delete_custom_data(&self, entity_id: EntityId) -> Result<()>;
}

/// Reference flexible-attribute store: two maps under independent locks.
pub struct InMemoryFlexibleStore {
    schemas: RwLock<HashMap<TypeId, Vec<FieldDef>>>,
    custom_data: RwLock<HashMap<EntityId, CustomData>>,
}

impl InMemoryFlexibleStore {
    pub fn new() -> Self {
        Self {
            schemas: RwLock::new(HashMap::new()),
            custom_data: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryFlexibleStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FlexibleStore for InMemoryFlexibleStore {
    async fn put_schema(&self, type_id: TypeId, fields: Vec<FieldDef>) -> Result<()> {
        self.schemas.write().await.insert(type_id, fields);
        Ok(())
    }

    async fn get_schema(&self, type_id: TypeId) -> Result<Option<Vec<FieldDef>>> {
        Ok(self.schemas.read().await.get(&type_id).cloned())
    }

    async fn delete_schema(&self, type_id: TypeId) -> Result<()> {
        self.schemas.write().await.remove(&type_id);
        Ok(())
    }

    async fn put_custom_data(&self, entity_id: EntityId, data: CustomData) -> Result<()> {
        self.custom_data.write().await.insert(entity_id, data);
        Ok(())
    }

    async fn get_custom_data(&self, entity_id: EntityId) -> Result<Option<CustomData>> {
        Ok(self.custom_data.read().await.get(&entity_id).cloned())
    }

    async fn delete_custom_data(&self, entity_id: EntityId) -> Result<()> {
        self.custom_data.write().await.remove(&entity_id);
        Ok(())
    }
}
