use async_trait::async_trait;

use crate::core::{Entity, EntityFields, EntityId, MemberId, PresenceState, Result};
use crate::facade::{EntityDraft, EventDb};
use crate::result::{CompositeView, EntityWriteOutcome, FinalizeOutcome};

/// A generic trait for event coordination clients.
///
/// This trait allows writing code that is agnostic to where the
/// coordination layer runs. Use `EventDb` (the embedded implementation)
/// for tests and single-process apps, or wrap a remote deployment behind
/// the same surface for production use.
#[async_trait]
pub trait EventClient: Send + Sync {
    async fn create_entity(&self, draft: EntityDraft) -> Result<EntityWriteOutcome>;

    async fn update_entity(&self, id: EntityId, fields: EntityFields) -> Result<Entity>;

    async fn delete_entity(&self, id: EntityId) -> Result<()>;

    async fn toggle_presence(
        &self,
        entity_id: EntityId,
        member_id: MemberId,
    ) -> Result<PresenceState>;

    async fn finalize(&self, entity_id: EntityId) -> Result<FinalizeOutcome>;

    async fn composite_view(&self, entity_id: EntityId) -> Result<CompositeView>;

    /// Check that the canonical store is reachable
    async fn ping(&self) -> Result<()>;
}

#[async_trait]
impl EventClient for EventDb {
    async fn create_entity(&self, draft: EntityDraft) -> Result<EntityWriteOutcome> {
        EventDb::create_entity(self, draft).await
    }

    async fn update_entity(&self, id: EntityId, fields: EntityFields) -> Result<Entity> {
        EventDb::update_entity(self, id, fields).await
    }

    async fn delete_entity(&self, id: EntityId) -> Result<()> {
        EventDb::delete_entity(self, id).await
    }

    async fn toggle_presence(
        &self,
        entity_id: EntityId,
        member_id: MemberId,
    ) -> Result<PresenceState> {
        EventDb::toggle_presence(self, entity_id, member_id).await
    }

    async fn finalize(&self, entity_id: EntityId) -> Result<FinalizeOutcome> {
        EventDb::finalize(self, entity_id).await
    }

    async fn composite_view(&self, entity_id: EntityId) -> Result<CompositeView> {
        EventDb::composite_view(self, entity_id).await
    }

    async fn ping(&self) -> Result<()> {
        EventDb::ping(self).await
    }
}
