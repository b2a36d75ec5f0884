use std::sync::Arc;

use futures::future::join_all;
use tracing::warn;

use crate::config::DbConfig;
use crate::coordinator::{canonical_call, secondary_call};
use crate::core::{FieldDef, Result, StoreKind, TypeId};
use crate::result::{EntityTypeView, Section, SecondaryWriteStatus, WriteOutcome};
use crate::storage::{CanonicalStore, FlexibleStore};

/// Manages entity type definitions, which live half in each store: the
/// name and description in the canonical store, the field-definition list
/// in the flexible-attribute store, joined by the canonical id.
///
/// There is no cross-store transaction. A define or update performs the
/// canonical write first; if the schema write then fails, the canonical
/// row is marked `schema_incomplete` and the command still reports
/// success, carrying the failure as an explicit secondary status. The next
/// successful schema write through [`update`](Self::update) repairs the
/// marker.
pub struct EntityTypeRegistry {
    canonical: Arc<dyn CanonicalStore>,
    flexible: Arc<dyn FlexibleStore>,
    config: DbConfig,
}

impl EntityTypeRegistry {
    pub fn new(
        canonical: Arc<dyn CanonicalStore>,
        flexible: Arc<dyn FlexibleStore>,
        config: DbConfig,
    ) -> Self {
        Self {
            canonical,
            flexible,
            config,
        }
    }

    pub async fn define(
        &self,
        name: impl Into<String>,
        description: Option<String>,
        fields: Vec<FieldDef>,
    ) -> Result<WriteOutcome<TypeId>> {
        let type_id = canonical_call(
            self.config.canonical_timeout,
            self.canonical.create_type(name.into(), description),
        )
        .await?;

        let secondary = self.write_schema(type_id, fields).await;
        Ok(WriteOutcome {
            id: type_id,
            secondary,
        })
    }

    pub async fn update(
        &self,
        type_id: TypeId,
        name: impl Into<String>,
        description: Option<String>,
        fields: Vec<FieldDef>,
    ) -> Result<WriteOutcome<TypeId>> {
        canonical_call(
            self.config.canonical_timeout,
            self.canonical.update_type(type_id, name.into(), description),
        )
        .await?;

        let secondary = self.write_schema(type_id, fields).await;
        Ok(WriteOutcome {
            id: type_id,
            secondary,
        })
    }

    pub async fn get(&self, type_id: TypeId) -> Result<EntityTypeView> {
        let row = canonical_call(
            self.config.canonical_timeout,
            self.canonical.get_type(type_id),
        )
        .await?;

        let fields = Section::from_store_result(
            secondary_call(
                StoreKind::Flexible,
                self.config.secondary_timeout,
                self.flexible.get_schema(type_id),
            )
            .await,
        );
        if let Section::Unavailable { reason } = &fields {
            warn!(%type_id, %reason, "schema omitted from type read");
        }

        Ok(EntityTypeView { row, fields })
    }

    pub async fn list(&self) -> Result<Vec<EntityTypeView>> {
        let rows = canonical_call(self.config.canonical_timeout, self.canonical.list_types())
            .await?;

        let schemas = join_all(rows.iter().map(|row| {
            secondary_call(
                StoreKind::Flexible,
                self.config.secondary_timeout,
                self.flexible.get_schema(row.id),
            )
        }))
        .await;

        Ok(rows
            .into_iter()
            .zip(schemas)
            .map(|(row, schema)| EntityTypeView {
                row,
                fields: Section::from_store_result(schema),
            })
            .collect())
    }

    /// Schema lookup for validation: `None` when the schema is genuinely
    /// absent, an error only when the store itself failed.
    pub(crate) async fn schema_for(&self, type_id: TypeId) -> Result<Option<Vec<FieldDef>>> {
        secondary_call(
            StoreKind::Flexible,
            self.config.secondary_timeout,
            self.flexible.get_schema(type_id),
        )
        .await
    }

    async fn write_schema(&self, type_id: TypeId, fields: Vec<FieldDef>) -> SecondaryWriteStatus {
        match secondary_call(
            StoreKind::Flexible,
            self.config.secondary_timeout,
            self.flexible.put_schema(type_id, fields),
        )
        .await
        {
            Ok(()) => {
                if let Err(err) = self.canonical.set_schema_incomplete(type_id, false).await {
                    warn!(%type_id, error = %err, "failed to clear schema-incomplete marker");
                }
                SecondaryWriteStatus::Ok
            }
            Err(err) => {
                warn!(%type_id, error = %err, "schema write failed; type row marked incomplete");
                if let Err(mark_err) = self.canonical.set_schema_incomplete(type_id, true).await {
                    warn!(%type_id, error = %mark_err, "failed to set schema-incomplete marker");
                }
                SecondaryWriteStatus::from_error(&err)
            }
        }
    }
}
