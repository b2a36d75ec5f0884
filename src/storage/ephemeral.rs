use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rand::seq::SliceRandom;
use tokio::sync::RwLock;

use crate::core::{EntityId, MemberId, PresenceSnapshot, PresenceState, Result};

/// Volatile, high-churn storage for live presence state, keyed by entity.
///
/// `toggle_presence` is the core primitive: arrive if absent, depart if
/// present, atomically per (entity, member) pair. The per-entity record
/// (present-set plus the two timestamp maps) is created implicitly on the
/// first toggle and destroyed as a unit by `clear`, which only the
/// finalization path is supposed to call.
#[async_trait]
pub trait EphemeralStore: Send + Sync {
    async fn toggle_presence(&self, entity_id: EntityId, member_id: MemberId)
        -> Result<PresenceState>;
    async fn get_presence(&self, entity_id: EntityId) -> Result<PresenceSnapshot>;
    /// Uniformly random member of the current present-set, if any.
    async fn random_present(&self, entity_id: EntityId) -> Result<Option<MemberId>>;
    async fn clear(&self, entity_id: EntityId) -> Result<()>;
}

/// Reference ephemeral store. Each entity record sits behind its own lock
/// handle, so same-pair toggles serialize while toggles on different
/// entities never contend; the outer map lock is only held long enough to
/// resolve a handle.
pub struct InMemoryEphemeralStore {
    records: RwLock<HashMap<EntityId, Arc<RwLock<PresenceSnapshot>>>>,
}

impl InMemoryEphemeralStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    async fn record_handle(&self, entity_id: EntityId) -> Arc<RwLock<PresenceSnapshot>> {
        if let Some(handle) = self.records.read().await.get(&entity_id) {
            return Arc::clone(handle);
        }
        let mut records = self.records.write().await;
        Arc::clone(
            records
                .entry(entity_id)
                .or_insert_with(|| Arc::new(RwLock::new(PresenceSnapshot::default()))),
        )
    }
}

impl Default for InMemoryEphemeralStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EphemeralStore for InMemoryEphemeralStore {
    async fn toggle_presence(
        &self,
        entity_id: EntityId,
        member_id: MemberId,
    ) -> Result<PresenceState> {
        let handle = self.record_handle(entity_id).await;
        let mut record = handle.write().await;
        let now = Utc::now();

        if record.present.remove(&member_id) {
            record.last_seen.insert(member_id, now);
            Ok(PresenceState::Absent)
        } else {
            record.present.insert(member_id);
            // First arrival wins; a later re-arrival keeps the original.
            record.first_seen.entry(member_id).or_insert(now);
            Ok(PresenceState::Present)
        }
    }

    async fn get_presence(&self, entity_id: EntityId) -> Result<PresenceSnapshot> {
        let handle = self.records.read().await.get(&entity_id).cloned();
        match handle {
            Some(handle) => Ok(handle.read().await.clone()),
            None => Ok(PresenceSnapshot::default()),
        }
    }

    async fn random_present(&self, entity_id: EntityId) -> Result<Option<MemberId>> {
        let snapshot = self.get_presence(entity_id).await?;
        let members: Vec<MemberId> = snapshot.present.iter().copied().collect();
        let mut rng = rand::thread_rng();
        Ok(members.choose(&mut rng).copied())
    }

    async fn clear(&self, entity_id: EntityId) -> Result<()> {
        self.records.write().await.remove(&entity_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_toggle_cycle() {
        let store = InMemoryEphemeralStore::new();
        let entity = EntityId(1);
        let member = MemberId(42);

        assert_eq!(
            store.toggle_presence(entity, member).await.unwrap(),
            PresenceState::Present
        );
        let snapshot = store.get_presence(entity).await.unwrap();
        assert!(snapshot.present.contains(&member));
        assert!(snapshot.first_seen.contains_key(&member));
        assert!(!snapshot.last_seen.contains_key(&member));

        assert_eq!(
            store.toggle_presence(entity, member).await.unwrap(),
            PresenceState::Absent
        );
        let snapshot = store.get_presence(entity).await.unwrap();
        assert!(!snapshot.present.contains(&member));
        assert!(snapshot.last_seen.contains_key(&member));
    }

    #[tokio::test]
    async fn test_first_seen_survives_rearrival() {
        let store = InMemoryEphemeralStore::new();
        let entity = EntityId(1);
        let member = MemberId(9);

        store.toggle_presence(entity, member).await.unwrap();
        let first = store.get_presence(entity).await.unwrap().first_seen[&member];
        store.toggle_presence(entity, member).await.unwrap();
        store.toggle_presence(entity, member).await.unwrap();

        let snapshot = store.get_presence(entity).await.unwrap();
        assert_eq!(snapshot.first_seen[&member], first);
        assert!(snapshot.present.contains(&member));
    }

    #[tokio::test]
    async fn test_clear_removes_record_as_unit() {
        let store = InMemoryEphemeralStore::new();
        let entity = EntityId(3);
        store.toggle_presence(entity, MemberId(1)).await.unwrap();
        store.toggle_presence(entity, MemberId(2)).await.unwrap();

        store.clear(entity).await.unwrap();
        let snapshot = store.get_presence(entity).await.unwrap();
        assert!(snapshot.is_empty());
    }

    #[tokio::test]
    async fn test_random_present_only_picks_present_members() {
        let store = InMemoryEphemeralStore::new();
        let entity = EntityId(4);
        store.toggle_presence(entity, MemberId(1)).await.unwrap();
        store.toggle_presence(entity, MemberId(2)).await.unwrap();
        // Member 2 departs and must never be drawn.
        store.toggle_presence(entity, MemberId(2)).await.unwrap();

        for _ in 0..20 {
            let winner = store.random_present(entity).await.unwrap();
            assert_eq!(winner, Some(MemberId(1)));
        }

        store.clear(entity).await.unwrap();
        assert_eq!(store.random_present(entity).await.unwrap(), None);
    }
}
