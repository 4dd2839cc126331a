use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use strata_client::{IntegritySeed, StorageClient};
use strata_config::AdapterOptions;
use strata_fault::FaultRegistry;
use strata_kvs::FakeKvService;
use strata_types::{
    BufVec, EntityId, ExtentVec, KvOpcode, ObjOpcode, OpKind, OpState, Operation, UfidGenerator,
};

use crate::error::{AdapterError, AdapterResult};

/// Result code for operations failed by the fault-injection launch path.
const EIO: i32 = 5;

/// The adapter between the S3 front end and the storage client.
///
/// Owns the dispatch policy; owns nothing about storage semantics. Every
/// launch is classified by [`OpKind`] and lands on exactly one of four
/// paths, checked in this order:
///
/// 1. fake-completion (kind marked as faked in the options),
/// 2. fake KV service (KV kind, `fake_kv_service` on),
/// 3. fault-injection failure (the kind's launch fault point is armed),
/// 4. the real storage client.
///
/// A launch that takes one of the first three paths never reaches the
/// storage client.
pub struct StorageAdapter {
    client: Arc<dyn StorageClient>,
    options: Arc<AdapterOptions>,
    faults: Arc<FaultRegistry>,
    kvs: FakeKvService,
    ufid: UfidGenerator,
}

impl StorageAdapter {
    /// Build an adapter with an empty fault registry.
    pub fn new(client: Arc<dyn StorageClient>, options: Arc<AdapterOptions>) -> Self {
        Self::with_faults(client, options, Arc::new(FaultRegistry::new()))
    }

    /// Build an adapter sharing a fault registry with the test harness.
    pub fn with_faults(
        client: Arc<dyn StorageClient>,
        options: Arc<AdapterOptions>,
        faults: Arc<FaultRegistry>,
    ) -> Self {
        Self {
            client,
            options,
            faults,
            kvs: FakeKvService::new(),
            ufid: UfidGenerator::new(),
        }
    }

    /// The fault registry consulted by this adapter.
    pub fn faults(&self) -> &FaultRegistry {
        &self.faults
    }

    /// The options controlling dispatch.
    pub fn options(&self) -> &AdapterOptions {
        &self.options
    }

    /// The fake KV service backing the fake-KV dispatch path.
    pub fn kv_service(&self) -> &FakeKvService {
        &self.kvs
    }

    // -------------------------------------------------------------------
    // Launch dispatch
    // -------------------------------------------------------------------

    /// Launch a batch of operations of one kind.
    ///
    /// `request_id` correlates the batch with the front-end request that
    /// produced it; every operation is logged against it before dispatch.
    pub async fn launch(
        &self,
        request_id: u64,
        ops: &[Arc<Operation>],
        kind: OpKind,
    ) -> AdapterResult<()> {
        for op in ops {
            debug!(request_id, op_id = op.id(), %kind, "request-to-client");
        }

        if self.options.is_faked(kind) {
            debug!(request_id, %kind, "launching on the fake-completion path");
            self.complete_detached(ops, 0);
            return Ok(());
        }

        if self.options.use_fake_kv_service(kind) {
            debug!(request_id, %kind, "launching on the fake KV service");
            for op in ops {
                self.kvs.execute(op);
            }
            return Ok(());
        }

        if self.faults.is_enabled(kind.fault_point()) {
            debug!(request_id, %kind, point = kind.fault_point(), "launch failed by fault point");
            self.complete_detached(ops, -EIO);
            return Ok(());
        }

        self.client.launch(ops).await?;
        Ok(())
    }

    /// Complete every operation off the caller's stack, the way a real
    /// client would: waiters must observe completion, not be completed
    /// from under their own call frame.
    fn complete_detached(&self, ops: &[Arc<Operation>], rc: i32) {
        for op in ops {
            op.mark_launched();
            let op = Arc::clone(op);
            tokio::spawn(async move {
                op.complete(rc);
            });
        }
    }

    // -------------------------------------------------------------------
    // Operation builders
    // -------------------------------------------------------------------

    /// Build an entity-create operation, unless `entity_create_fail` is
    /// armed.
    pub fn entity_create(&self, id: EntityId, kind: OpKind) -> AdapterResult<Operation> {
        if self.faults.is_enabled("entity_create_fail") {
            return Err(AdapterError::FaultInjected("entity_create_fail"));
        }
        Ok(self.client.entity_create(id, kind)?)
    }

    /// Build an entity-open operation, unless `entity_open_fail` is armed.
    pub fn entity_open(&self, id: EntityId, kind: OpKind) -> AdapterResult<Operation> {
        if self.faults.is_enabled("entity_open_fail") {
            return Err(AdapterError::FaultInjected("entity_open_fail"));
        }
        Ok(self.client.entity_open(id, kind)?)
    }

    /// Build an entity-delete operation, unless `entity_delete_fail` is
    /// armed.
    pub fn entity_delete(&self, id: EntityId, kind: OpKind) -> AdapterResult<Operation> {
        if self.faults.is_enabled("entity_delete_fail") {
            return Err(AdapterError::FaultInjected("entity_delete_fail"));
        }
        Ok(self.client.entity_delete(id, kind)?)
    }

    /// Build an object I/O operation.
    ///
    /// When object reads are fabricated (faked create/open/read), a read
    /// operation is built locally and never consults the client: there is
    /// nothing real to read from.
    pub fn obj_op(
        &self,
        id: EntityId,
        opcode: ObjOpcode,
        extents: ExtentVec,
        data: BufVec,
        attrs: BufVec,
        flags: u32,
    ) -> AdapterResult<Operation> {
        if self.options.fakes_object_read(opcode) {
            let data = if data.is_empty() {
                BufVec::with_slots(extents.len())
            } else {
                data
            };
            return Ok(Operation::object(
                OpKind::ReadObject,
                id,
                opcode,
                extents,
                data,
                attrs,
                flags,
            ));
        }
        Ok(self.client.obj_op(id, opcode, extents, data, attrs, flags)?)
    }

    /// Build a key-value batch operation, unless `idx_op_fail` is armed.
    pub fn idx_op(
        &self,
        index: EntityId,
        opcode: KvOpcode,
        keys: BufVec,
        vals: BufVec,
        flags: u32,
    ) -> AdapterResult<Operation> {
        if self.faults.is_enabled("idx_op_fail") {
            return Err(AdapterError::FaultInjected("idx_op_fail"));
        }
        Ok(self.client.idx_op(index, opcode, keys, vals, flags)?)
    }

    // -------------------------------------------------------------------
    // Sync barriers
    // -------------------------------------------------------------------

    /// Build a sync barrier, unless `sync_op_init_fail` is armed.
    pub fn sync_op_init(&self) -> AdapterResult<Operation> {
        if self.faults.is_enabled("sync_op_init_fail") {
            return Err(AdapterError::FaultInjected("sync_op_init_fail"));
        }
        Ok(self.client.sync_op_init()?)
    }

    /// Record an entity in a sync barrier.
    ///
    /// A no-op when sync is faked: barriers over writes the client never
    /// saw must not reach it.
    pub fn sync_entity_add(&self, sync_op: &Operation, id: EntityId) -> AdapterResult<()> {
        if self.options.fake_sync() {
            return Ok(());
        }
        Ok(self.client.sync_entity_add(sync_op, id)?)
    }

    /// Record an operation in a sync barrier. No-op when sync is faked.
    pub fn sync_op_add(&self, sync_op: &Operation, op: &Operation) -> AdapterResult<()> {
        if self.options.fake_sync() {
            return Ok(());
        }
        Ok(self.client.sync_op_add(sync_op, op)?)
    }

    // -------------------------------------------------------------------
    // Pass-throughs
    // -------------------------------------------------------------------

    /// Await an operation's terminal state, up to `timeout`.
    pub async fn op_wait(&self, op: &Operation, timeout: Duration) -> AdapterResult<OpState> {
        Ok(op.wait(timeout).await?)
    }

    /// An operation's result code.
    pub fn op_rc(&self, op: &Operation) -> i32 {
        op.rc()
    }

    /// Compute an integrity digest, logging the seed it is bound to.
    pub fn compute_integrity(
        &self,
        seed: Option<&IntegritySeed>,
        data: &BufVec,
    ) -> AdapterResult<[u8; 32]> {
        match seed {
            Some(seed) => {
                debug!(id = %seed.id, unit_offset = seed.unit_offset, "computing integrity digest")
            }
            None => debug!("computing integrity digest without seed"),
        }
        Ok(self.client.compute_integrity(seed, data)?)
    }

    /// Allocate the next unique entity ID.
    pub fn ufid_next(&self) -> EntityId {
        self.ufid.next()
    }
}

impl std::fmt::Debug for StorageAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageAdapter")
            .field("options", &self.options)
            .field("faults", &self.faults)
            .finish()
    }
}
