//! Shared test support: store wrappers with switchable fault injection.
//!
//! Each wrapper delegates to the corresponding in-memory store and can be
//! flipped into an "outage" at runtime, so tests can exercise the
//! partial-failure paths without real external stores.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use attendb::core::{
    CustomData, Entity, EntityFields, EntityId, EntityTypeRow, FieldDef, FinalizedRecord,
    MemberId, PresenceSnapshot, PresenceState, Result, StoreError, StoreKind, TypeId,
};
use attendb::{
    CanonicalStore, EphemeralStore, FlexibleStore, InMemoryCanonicalStore,
    InMemoryEphemeralStore, InMemoryFlexibleStore,
};

fn canonical_outage<T>() -> Result<T> {
    Err(StoreError::CanonicalUnavailable("injected outage".into()))
}

fn secondary_outage<T>(kind: StoreKind) -> Result<T> {
    Err(StoreError::SecondaryUnavailable {
        kind,
        reason: "injected outage".into(),
    })
}

// ============================================================================
// Canonical
// ============================================================================

pub struct FlakyCanonicalStore {
    inner: InMemoryCanonicalStore,
    down: AtomicBool,
    fail_append: AtomicBool,
}

impl FlakyCanonicalStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: InMemoryCanonicalStore::new(),
            down: AtomicBool::new(false),
            fail_append: AtomicBool::new(false),
        })
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    /// Fail only the finalized-batch write, leaving everything else up.
    pub fn set_fail_append(&self, fail: bool) {
        self.fail_append.store(fail, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.down.load(Ordering::SeqCst) {
            canonical_outage()
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CanonicalStore for FlakyCanonicalStore {
    async fn create_entity(&self, fields: EntityFields) -> Result<EntityId> {
        self.check()?;
        self.inner.create_entity(fields).await
    }

    async fn get_entity(&self, id: EntityId) -> Result<Entity> {
        self.check()?;
        self.inner.get_entity(id).await
    }

    async fn update_entity(&self, id: EntityId, fields: EntityFields) -> Result<Entity> {
        self.check()?;
        self.inner.update_entity(id, fields).await
    }

    async fn delete_entity(&self, id: EntityId) -> Result<()> {
        self.check()?;
        self.inner.delete_entity(id).await
    }

    async fn list_entities(&self) -> Result<Vec<Entity>> {
        self.check()?;
        self.inner.list_entities().await
    }

    async fn set_custom_data_incomplete(&self, id: EntityId, incomplete: bool) -> Result<()> {
        self.check()?;
        self.inner.set_custom_data_incomplete(id, incomplete).await
    }

    async fn create_type(&self, name: String, description: Option<String>) -> Result<TypeId> {
        self.check()?;
        self.inner.create_type(name, description).await
    }

    async fn get_type(&self, id: TypeId) -> Result<EntityTypeRow> {
        self.check()?;
        self.inner.get_type(id).await
    }

    async fn update_type(
        &self,
        id: TypeId,
        name: String,
        description: Option<String>,
    ) -> Result<()> {
        self.check()?;
        self.inner.update_type(id, name, description).await
    }

    async fn list_types(&self) -> Result<Vec<EntityTypeRow>> {
        self.check()?;
        self.inner.list_types().await
    }

    async fn set_schema_incomplete(&self, id: TypeId, incomplete: bool) -> Result<()> {
        self.check()?;
        self.inner.set_schema_incomplete(id, incomplete).await
    }

    async fn append_finalized(&self, records: Vec<FinalizedRecord>) -> Result<()> {
        self.check()?;
        if self.fail_append.load(Ordering::SeqCst) {
            return canonical_outage();
        }
        self.inner.append_finalized(records).await
    }

    async fn finalized_for_entity(&self, id: EntityId) -> Result<Vec<FinalizedRecord>> {
        self.check()?;
        self.inner.finalized_for_entity(id).await
    }

    async fn ping(&self) -> Result<()> {
        self.check()?;
        self.inner.ping().await
    }
}

// ============================================================================
// Flexible
// ============================================================================

pub struct FlakyFlexibleStore {
    inner: InMemoryFlexibleStore,
    down: AtomicBool,
    fail_schema_reads: AtomicBool,
}

impl FlakyFlexibleStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: InMemoryFlexibleStore::new(),
            down: AtomicBool::new(false),
            fail_schema_reads: AtomicBool::new(false),
        })
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    /// Fail only schema reads, leaving writes and custom data up.
    pub fn set_fail_schema_reads(&self, fail: bool) {
        self.fail_schema_reads.store(fail, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.down.load(Ordering::SeqCst) {
            secondary_outage(StoreKind::Flexible)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl FlexibleStore for FlakyFlexibleStore {
    async fn put_schema(&self, type_id: TypeId, fields: Vec<FieldDef>) -> Result<()> {
        self.check()?;
        self.inner.put_schema(type_id, fields).await
    }

    async fn get_schema(&self, type_id: TypeId) -> Result<Option<Vec<FieldDef>>> {
        self.check()?;
        if self.fail_schema_reads.load(Ordering::SeqCst) {
            return secondary_outage(StoreKind::Flexible);
        }
        self.inner.get_schema(type_id).await
    }

    async fn delete_schema(&self, type_id: TypeId) -> Result<()> {
        self.check()?;
        self.inner.delete_schema(type_id).await
    }

    async fn put_custom_data(&self, entity_id: EntityId, data: CustomData) -> Result<()> {
        self.check()?;
        self.inner.put_custom_data(entity_id, data).await
    }

    async fn get_custom_data(&self, entity_id: EntityId) -> Result<Option<CustomData>> {
        self.check()?;
        self.inner.get_custom_data(entity_id).await
    }

    async fn delete_custom_data(&self, entity_id: EntityId) -> Result<()> {
        self.check()?;
        self.inner.delete_custom_data(entity_id).await
    }
}

// ============================================================================
// Ephemeral
// ============================================================================

pub struct FlakyEphemeralStore {
    inner: InMemoryEphemeralStore,
    down: AtomicBool,
    fail_clear: AtomicBool,
    read_delay_ms: AtomicU64,
}

impl FlakyEphemeralStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: InMemoryEphemeralStore::new(),
            down: AtomicBool::new(false),
            fail_clear: AtomicBool::new(false),
            read_delay_ms: AtomicU64::new(0),
        })
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    /// Fail only `clear`, so finalize can land its batch but not delete.
    pub fn set_fail_clear(&self, fail: bool) {
        self.fail_clear.store(fail, Ordering::SeqCst);
    }

    /// Slow down presence reads, to hold a finalize run in flight.
    pub fn set_read_delay(&self, delay: Duration) {
        self.read_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.down.load(Ordering::SeqCst) {
            secondary_outage(StoreKind::Ephemeral)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl EphemeralStore for FlakyEphemeralStore {
    async fn toggle_presence(
        &self,
        entity_id: EntityId,
        member_id: MemberId,
    ) -> Result<PresenceState> {
        self.check()?;
        self.inner.toggle_presence(entity_id, member_id).await
    }

    async fn get_presence(&self, entity_id: EntityId) -> Result<PresenceSnapshot> {
        self.check()?;
        let delay = self.read_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        self.inner.get_presence(entity_id).await
    }

    async fn random_present(&self, entity_id: EntityId) -> Result<Option<MemberId>> {
        self.check()?;
        self.inner.random_present(entity_id).await
    }

    async fn clear(&self, entity_id: EntityId) -> Result<()> {
        self.check()?;
        if self.fail_clear.load(Ordering::SeqCst) {
            return secondary_outage(StoreKind::Ephemeral);
        }
        self.inner.clear(entity_id).await
    }
}

// ============================================================================
// Harness
// ============================================================================

/// An `EventDb` over flaky stores, with the switches kept reachable.
pub struct FlakyHarness {
    pub db: attendb::EventDb,
    pub canonical: Arc<FlakyCanonicalStore>,
    pub flexible: Arc<FlakyFlexibleStore>,
    pub ephemeral: Arc<FlakyEphemeralStore>,
}

impl FlakyHarness {
    pub fn new() -> Self {
        Self::with_config(attendb::DbConfig::default())
    }

    pub fn with_config(config: attendb::DbConfig) -> Self {
        let canonical = FlakyCanonicalStore::new();
        let flexible = FlakyFlexibleStore::new();
        let ephemeral = FlakyEphemeralStore::new();
        let db = attendb::EventDb::with_stores(
            Arc::clone(&canonical) as Arc<dyn CanonicalStore>,
            Arc::clone(&flexible) as Arc<dyn FlexibleStore>,
            Arc::clone(&ephemeral) as Arc<dyn EphemeralStore>,
            config,
        );
        Self {
            db,
            canonical,
            flexible,
            ephemeral,
        }
    }
}
