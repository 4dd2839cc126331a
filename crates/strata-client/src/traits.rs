use std::sync::Arc;

use async_trait::async_trait;

use strata_types::{BufVec, EntityId, ExtentVec, KvOpcode, ObjOpcode, OpKind, Operation};

use crate::error::ClientResult;

/// Seed for an integrity digest: binds the digest to an object and a
/// position within it, so identical data at different offsets (or in
/// different objects) produces different digests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IntegritySeed {
    /// The object the data belongs to.
    pub id: EntityId,
    /// Byte offset of the data unit within the object.
    pub unit_offset: u64,
}

/// The storage client's asynchronous operation-submission API.
///
/// Implementations build operations (without executing them), accept
/// batches for launch, and complete each operation through its handle.
/// All build calls are cheap and synchronous; only `launch` does work.
///
/// The adapter is the only intended caller. It holds the client as
/// `Arc<dyn StorageClient>` and layers fakes and fault injection on top.
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Build an entity-create operation (object or index, per `kind`).
    fn entity_create(&self, id: EntityId, kind: OpKind) -> ClientResult<Operation>;

    /// Build an entity-open operation.
    fn entity_open(&self, id: EntityId, kind: OpKind) -> ClientResult<Operation>;

    /// Build an entity-delete operation.
    fn entity_delete(&self, id: EntityId, kind: OpKind) -> ClientResult<Operation>;

    /// Build an object I/O operation. Extents pair positionally with data
    /// buffers.
    fn obj_op(
        &self,
        id: EntityId,
        opcode: ObjOpcode,
        extents: ExtentVec,
        data: BufVec,
        attrs: BufVec,
        flags: u32,
    ) -> ClientResult<Operation>;

    /// Build a key-value batch operation against one index.
    fn idx_op(
        &self,
        index: EntityId,
        opcode: KvOpcode,
        keys: BufVec,
        vals: BufVec,
        flags: u32,
    ) -> ClientResult<Operation>;

    /// Build an empty sync barrier operation.
    fn sync_op_init(&self) -> ClientResult<Operation>;

    /// Record an entity in a sync barrier.
    ///
    /// Returns `InvalidOperation` if `sync_op` is not a sync operation.
    fn sync_entity_add(&self, sync_op: &Operation, id: EntityId) -> ClientResult<()>;

    /// Record a launched operation in a sync barrier.
    ///
    /// Returns `InvalidOperation` if `sync_op` is not a sync operation.
    fn sync_op_add(&self, sync_op: &Operation, op: &Operation) -> ClientResult<()>;

    /// Submit a batch of operations for asynchronous execution.
    ///
    /// Each operation is completed through its handle; callers observe
    /// results via [`Operation::wait`].
    async fn launch(&self, ops: &[Arc<Operation>]) -> ClientResult<()>;

    /// Compute the integrity digest of a buffer vector.
    fn compute_integrity(&self, seed: Option<&IntegritySeed>, data: &BufVec)
        -> ClientResult<[u8; 32]>;
}
