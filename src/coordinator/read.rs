use std::sync::Arc;

use tracing::warn;

use crate::config::DbConfig;
use crate::coordinator::{canonical_call, secondary_call};
use crate::core::{EntityId, Result, StoreError, StoreKind};
use crate::result::{CompositeView, Section};
use crate::storage::{CanonicalStore, EphemeralStore, FlexibleStore};

/// Fan-out read across all three stores, merged into one view.
///
/// The three store queries are issued concurrently so latency is bounded
/// by the slowest store, not the sum. Only the canonical query is allowed
/// to fail the read; the other two degrade into explicit unavailability
/// markers that travel with the result.
pub struct MergeReadCoordinator {
    canonical: Arc<dyn CanonicalStore>,
    flexible: Arc<dyn FlexibleStore>,
    ephemeral: Arc<dyn EphemeralStore>,
    config: DbConfig,
}

impl MergeReadCoordinator {
    pub fn new(
        canonical: Arc<dyn CanonicalStore>,
        flexible: Arc<dyn FlexibleStore>,
        ephemeral: Arc<dyn EphemeralStore>,
        config: DbConfig,
    ) -> Self {
        Self {
            canonical,
            flexible,
            ephemeral,
            config,
        }
    }

    pub async fn composite_view(&self, entity_id: EntityId) -> Result<CompositeView> {
        let canonical_part = async {
            let entity = canonical_call(
                self.config.canonical_timeout,
                self.canonical.get_entity(entity_id),
            )
            .await?;
            let finalized = canonical_call(
                self.config.canonical_timeout,
                self.canonical.finalized_for_entity(entity_id),
            )
            .await?;
            Ok::<_, StoreError>((entity, finalized.len()))
        };

        let custom_part = secondary_call(
            StoreKind::Flexible,
            self.config.secondary_timeout,
            self.flexible.get_custom_data(entity_id),
        );

        let presence_part = secondary_call(
            StoreKind::Ephemeral,
            self.config.secondary_timeout,
            self.ephemeral.get_presence(entity_id),
        );

        let (canonical_res, custom_res, presence_res) =
            tokio::join!(canonical_part, custom_part, presence_part);

        // The canonical store is the only fatal path.
        let (entity, finalized_count) = canonical_res?;

        let custom_data = Section::from_store_result(custom_res);
        if let Section::Unavailable { reason } = &custom_data {
            warn!(%entity_id, %reason, "custom data omitted from composite view");
        }

        let presence = match presence_res {
            Ok(snapshot) if snapshot.is_empty() => Section::Missing,
            Ok(snapshot) => Section::Available(snapshot),
            Err(err) => {
                warn!(%entity_id, error = %err, "live presence omitted from composite view");
                Section::Unavailable {
                    reason: err.to_string(),
                }
            }
        };

        // The schema is keyed by the entity's type reference, so this leg
        // can only start once the canonical record has resolved.
        let schema = match entity.type_id {
            Some(type_id) => Section::from_store_result(
                secondary_call(
                    StoreKind::Flexible,
                    self.config.secondary_timeout,
                    self.flexible.get_schema(type_id),
                )
                .await,
            ),
            None => Section::Missing,
        };

        Ok(CompositeView {
            entity,
            finalized_count,
            custom_data,
            schema,
            presence,
        })
    }
}
