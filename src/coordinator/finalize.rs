use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::config::DbConfig;
use crate::coordinator::{canonical_call, secondary_call};
use crate::core::{EntityId, FinalizedRecord, MemberId, Result, StoreError, StoreKind};
use crate::result::FinalizeOutcome;
use crate::storage::{CanonicalStore, EphemeralStore};

/// One-way promotion of live presence data into durable attendance rows.
///
/// Per entity the lifecycle has two states: LIVE (presence exists only in
/// the ephemeral store) and FINALIZED (rows copied to the canonical store,
/// ephemeral record deleted). The transition runs read → write → clear,
/// and the clear is strictly conditioned on the write landing, so a failed
/// run always leaves the live data intact for a retry.
///
/// Retries are idempotent: members that already have a finalized record
/// for the entity are skipped before anything is written. Concurrent runs
/// for the same entity are rejected outright rather than serialized; the
/// second caller gets a conflict and can re-issue once the first finishes.
pub struct FinalizationCoordinator {
    canonical: Arc<dyn CanonicalStore>,
    ephemeral: Arc<dyn EphemeralStore>,
    config: DbConfig,
    in_flight: Arc<Mutex<HashSet<EntityId>>>,
}

/// Releases the per-entity finalize slot when the run ends, error or not.
struct FinalizeGuard {
    in_flight: Arc<Mutex<HashSet<EntityId>>>,
    entity_id: EntityId,
}

impl Drop for FinalizeGuard {
    fn drop(&mut self) {
        if let Ok(mut set) = self.in_flight.lock() {
            set.remove(&self.entity_id);
        }
    }
}

impl FinalizationCoordinator {
    pub fn new(
        canonical: Arc<dyn CanonicalStore>,
        ephemeral: Arc<dyn EphemeralStore>,
        config: DbConfig,
    ) -> Self {
        Self {
            canonical,
            ephemeral,
            config,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    fn acquire(&self, entity_id: EntityId) -> Result<FinalizeGuard> {
        let mut set = self
            .in_flight
            .lock()
            .map_err(|e| StoreError::CanonicalUnavailable(e.to_string()))?;
        if !set.insert(entity_id) {
            return Err(StoreError::FinalizeConflict(entity_id.0));
        }
        Ok(FinalizeGuard {
            in_flight: Arc::clone(&self.in_flight),
            entity_id,
        })
    }

    pub async fn finalize(&self, entity_id: EntityId) -> Result<FinalizeOutcome> {
        // Unknown entities fail before any store is touched.
        canonical_call(
            self.config.canonical_timeout,
            self.canonical.get_entity(entity_id),
        )
        .await?;

        let _guard = self.acquire(entity_id)?;

        let snapshot = secondary_call(
            StoreKind::Ephemeral,
            self.config.secondary_timeout,
            self.ephemeral.get_presence(entity_id),
        )
        .await?;

        // Everyone who ever checked in gets finalized, present or not.
        let mut members: Vec<MemberId> = snapshot.all_members().into_iter().collect();
        members.sort();

        let already: HashSet<MemberId> = canonical_call(
            self.config.canonical_timeout,
            self.canonical.finalized_for_entity(entity_id),
        )
        .await?
        .into_iter()
        .map(|r| r.member_id)
        .collect();

        let mut records = Vec::new();
        let mut skipped = 0usize;
        for member_id in members {
            if already.contains(&member_id) {
                skipped += 1;
                continue;
            }
            // Members come from the union of the two maps; a member seen
            // only in last_seen uses that timestamp as first_seen.
            let first_seen = match snapshot
                .first_seen
                .get(&member_id)
                .or_else(|| snapshot.last_seen.get(&member_id))
            {
                Some(ts) => *ts,
                None => continue,
            };
            records.push(FinalizedRecord {
                entity_id,
                member_id,
                first_seen,
                last_seen: snapshot.last_seen.get(&member_id).copied(),
            });
        }

        let written = records.len();
        if written > 0 {
            debug!(%entity_id, records = written, skipped, "writing finalized attendance batch");
            canonical_call(
                self.config.canonical_timeout,
                self.canonical.append_finalized(records),
            )
            .await
            .map_err(|err| StoreError::FinalizePartial {
                entity: entity_id.0,
                reason: err.to_string(),
            })?;
        }

        // Only after the batch is durable may the live record go away.
        if let Err(err) = secondary_call(
            StoreKind::Ephemeral,
            self.config.secondary_timeout,
            self.ephemeral.clear(entity_id),
        )
        .await
        {
            warn!(%entity_id, error = %err, "finalized records written but live state not cleared");
            return Err(StoreError::FinalizePartial {
                entity: entity_id.0,
                reason: format!("live state not cleared: {}", err),
            });
        }

        info!(%entity_id, members_finalized = written, already_finalized = skipped, "entity finalized");
        Ok(FinalizeOutcome {
            entity_id,
            members_finalized: written,
            already_finalized: skipped,
        })
    }
}
