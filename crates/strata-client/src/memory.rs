use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use bytes::Bytes;
use tracing::debug;

use strata_types::{
    BufVec, EntityId, ExtentVec, KvOpcode, ObjOpcode, OpKind, OpPayload, Operation,
};

use crate::error::{ClientError, ClientResult};
use crate::traits::{IntegritySeed, StorageClient};

const ENOENT: i32 = 2;
const EEXIST: i32 = 17;
const EINVAL: i32 = 22;

#[derive(Default)]
struct Stores {
    /// Object contents, dense from offset zero. Reads past the end are
    /// zero-filled, matching sparse-object semantics.
    objects: HashMap<EntityId, Vec<u8>>,
    indexes: HashMap<EntityId, BTreeMap<Vec<u8>, Vec<u8>>>,
}

/// In-process reference implementation of [`StorageClient`].
///
/// Objects and indexes live in memory behind an `RwLock`. `launch` executes
/// each operation on a spawned task and completes it through the handle, so
/// callers exercise the same wait-for-completion path as with a real
/// client. Unlike the fake KV service, index lifecycle is strict: KV
/// operations against an index that was never created fail.
#[derive(Clone, Default)]
pub struct MemoryClient {
    stores: Arc<RwLock<Stores>>,
}

impl MemoryClient {
    /// Create an empty client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the object exists.
    pub fn contains_object(&self, id: EntityId) -> bool {
        self.stores
            .read()
            .expect("stores lock poisoned")
            .objects
            .contains_key(&id)
    }

    /// Returns `true` if the index exists.
    pub fn contains_index(&self, id: EntityId) -> bool {
        self.stores
            .read()
            .expect("stores lock poisoned")
            .indexes
            .contains_key(&id)
    }

    /// Current byte length of an object, or `None` if it does not exist.
    pub fn object_len(&self, id: EntityId) -> Option<usize> {
        self.stores
            .read()
            .expect("stores lock poisoned")
            .objects
            .get(&id)
            .map(|o| o.len())
    }

    fn execute(stores: &RwLock<Stores>, op: &Operation) -> i32 {
        let mut payload = op.payload();
        match &mut *payload {
            OpPayload::Entity { id } => Self::execute_entity(stores, op.kind(), *id),
            OpPayload::Object {
                id,
                opcode,
                extents,
                data,
                ..
            } => Self::execute_object(stores, *id, *opcode, extents, data),
            OpPayload::Kv {
                index,
                opcode,
                keys,
                vals,
                rcs,
            } => Self::execute_kv(stores, *index, *opcode, keys, vals, rcs),
            // Everything already launched is durable in memory.
            OpPayload::Sync { .. } => 0,
        }
    }

    fn execute_entity(stores: &RwLock<Stores>, kind: OpKind, id: EntityId) -> i32 {
        let mut stores = stores.write().expect("stores lock poisoned");
        match kind {
            OpKind::CreateObject => {
                if stores.objects.contains_key(&id) {
                    -EEXIST
                } else {
                    stores.objects.insert(id, Vec::new());
                    0
                }
            }
            OpKind::OpenObject => {
                if stores.objects.contains_key(&id) {
                    0
                } else {
                    -ENOENT
                }
            }
            OpKind::DeleteObject => {
                if stores.objects.remove(&id).is_some() {
                    0
                } else {
                    -ENOENT
                }
            }
            OpKind::CreateIndex => {
                if stores.indexes.contains_key(&id) {
                    -EEXIST
                } else {
                    stores.indexes.insert(id, BTreeMap::new());
                    0
                }
            }
            OpKind::DeleteIndex => {
                if stores.indexes.remove(&id).is_some() {
                    0
                } else {
                    -ENOENT
                }
            }
            _ => -EINVAL,
        }
    }

    fn execute_object(
        stores: &RwLock<Stores>,
        id: EntityId,
        opcode: ObjOpcode,
        extents: &ExtentVec,
        data: &mut BufVec,
    ) -> i32 {
        let mut stores = stores.write().expect("stores lock poisoned");
        let Some(object) = stores.objects.get_mut(&id) else {
            return -ENOENT;
        };
        match opcode {
            ObjOpcode::Read => {
                for (i, ext) in extents.iter().enumerate() {
                    let mut buf = vec![0u8; ext.len as usize];
                    let start = (ext.offset as usize).min(object.len());
                    let end = (ext.end() as usize).min(object.len());
                    buf[..end - start].copy_from_slice(&object[start..end]);
                    data.set(i, Bytes::from(buf));
                }
            }
            ObjOpcode::Write => {
                for (i, ext) in extents.iter().enumerate() {
                    let end = ext.end() as usize;
                    if object.len() < end {
                        object.resize(end, 0);
                    }
                    let src = match data.get(i) {
                        Some(buf) => buf,
                        None => return -EINVAL,
                    };
                    let n = (ext.len as usize).min(src.len());
                    let start = ext.offset as usize;
                    object[start..start + n].copy_from_slice(&src[..n]);
                }
            }
            ObjOpcode::Alloc => {
                for ext in extents.iter() {
                    let end = ext.end() as usize;
                    if object.len() < end {
                        object.resize(end, 0);
                    }
                }
            }
            ObjOpcode::Free => {
                for ext in extents.iter() {
                    let start = (ext.offset as usize).min(object.len());
                    let end = (ext.end() as usize).min(object.len());
                    object[start..end].fill(0);
                }
            }
        }
        0
    }

    fn execute_kv(
        stores: &RwLock<Stores>,
        index: EntityId,
        opcode: KvOpcode,
        keys: &mut BufVec,
        vals: &mut BufVec,
        rcs: &mut [i32],
    ) -> i32 {
        let mut stores = stores.write().expect("stores lock poisoned");
        let Some(map) = stores.indexes.get_mut(&index) else {
            rcs.fill(-ENOENT);
            return -ENOENT;
        };
        let mut rc = 0;
        match opcode {
            KvOpcode::Get => {
                for (i, key) in keys.iter().enumerate() {
                    match map.get(key.as_ref()) {
                        Some(val) => {
                            vals.set(i, Bytes::copy_from_slice(val));
                            rcs[i] = 0;
                        }
                        None => {
                            rcs[i] = -ENOENT;
                            if rc == 0 {
                                rc = -ENOENT;
                            }
                        }
                    }
                }
            }
            KvOpcode::Put => {
                for (i, key) in keys.iter().enumerate() {
                    let val = vals.get(i).cloned().unwrap_or_default();
                    map.insert(key.to_vec(), val.to_vec());
                    rcs[i] = 0;
                }
            }
            KvOpcode::Del => {
                for (i, key) in keys.iter().enumerate() {
                    if map.remove(key.as_ref()).is_some() {
                        rcs[i] = 0;
                    } else {
                        rcs[i] = -ENOENT;
                        if rc == 0 {
                            rc = -ENOENT;
                        }
                    }
                }
            }
            KvOpcode::Next => {
                let start: Vec<u8> = keys.get(0).map(|k| k.to_vec()).unwrap_or_default();
                let mut found = 0;
                for (key, val) in map.range(start..) {
                    if found >= keys.len() {
                        break;
                    }
                    keys.set(found, Bytes::copy_from_slice(key));
                    vals.set(found, Bytes::copy_from_slice(val));
                    rcs[found] = 0;
                    found += 1;
                }
                for slot in rcs.iter_mut().skip(found) {
                    *slot = -ENOENT;
                }
            }
        }
        rc
    }
}

#[async_trait::async_trait]
impl StorageClient for MemoryClient {
    fn entity_create(&self, id: EntityId, kind: OpKind) -> ClientResult<Operation> {
        Ok(Operation::entity(kind, id))
    }

    fn entity_open(&self, id: EntityId, kind: OpKind) -> ClientResult<Operation> {
        Ok(Operation::entity(kind, id))
    }

    fn entity_delete(&self, id: EntityId, kind: OpKind) -> ClientResult<Operation> {
        Ok(Operation::entity(kind, id))
    }

    fn obj_op(
        &self,
        id: EntityId,
        opcode: ObjOpcode,
        extents: ExtentVec,
        data: BufVec,
        attrs: BufVec,
        flags: u32,
    ) -> ClientResult<Operation> {
        if opcode == ObjOpcode::Write && extents.len() != data.len() {
            return Err(ClientError::InvalidOperation(format!(
                "extent/buffer count mismatch: {} extents, {} buffers",
                extents.len(),
                data.len()
            )));
        }
        let data = if opcode == ObjOpcode::Read && data.is_empty() {
            BufVec::with_slots(extents.len())
        } else {
            data
        };
        let kind = match opcode {
            ObjOpcode::Read => OpKind::ReadObject,
            ObjOpcode::Write | ObjOpcode::Alloc | ObjOpcode::Free => OpKind::WriteObject,
        };
        Ok(Operation::object(kind, id, opcode, extents, data, attrs, flags))
    }

    fn idx_op(
        &self,
        index: EntityId,
        opcode: KvOpcode,
        keys: BufVec,
        vals: BufVec,
        _flags: u32,
    ) -> ClientResult<Operation> {
        if opcode == KvOpcode::Put && keys.len() != vals.len() {
            return Err(ClientError::InvalidOperation(format!(
                "key/value count mismatch: {} keys, {} values",
                keys.len(),
                vals.len()
            )));
        }
        let kind = match opcode {
            KvOpcode::Get | KvOpcode::Next => OpKind::GetKv,
            KvOpcode::Put => OpKind::PutKv,
            KvOpcode::Del => OpKind::DeleteKv,
        };
        Ok(Operation::kv(kind, index, opcode, keys, vals))
    }

    fn sync_op_init(&self) -> ClientResult<Operation> {
        Ok(Operation::sync())
    }

    fn sync_entity_add(&self, sync_op: &Operation, id: EntityId) -> ClientResult<()> {
        match &mut *sync_op.payload() {
            OpPayload::Sync { entities, .. } => {
                entities.push(id);
                Ok(())
            }
            _ => Err(ClientError::InvalidOperation(
                "sync_entity_add on a non-sync operation".into(),
            )),
        }
    }

    fn sync_op_add(&self, sync_op: &Operation, op: &Operation) -> ClientResult<()> {
        match &mut *sync_op.payload() {
            OpPayload::Sync { ops, .. } => {
                ops.push(op.id());
                Ok(())
            }
            _ => Err(ClientError::InvalidOperation(
                "sync_op_add on a non-sync operation".into(),
            )),
        }
    }

    async fn launch(&self, ops: &[Arc<Operation>]) -> ClientResult<()> {
        for op in ops {
            op.mark_launched();
            let op = Arc::clone(op);
            let stores = Arc::clone(&self.stores);
            tokio::spawn(async move {
                let rc = Self::execute(&stores, &op);
                op.mark_executed();
                debug!(op_id = op.id(), kind = %op.kind(), rc, "memory client completed op");
                op.complete(rc);
            });
        }
        Ok(())
    }

    fn compute_integrity(
        &self,
        seed: Option<&IntegritySeed>,
        data: &BufVec,
    ) -> ClientResult<[u8; 32]> {
        let mut hasher = blake3::Hasher::new();
        if let Some(seed) = seed {
            hasher.update(&seed.id.to_bytes());
            hasher.update(&seed.unit_offset.to_le_bytes());
        }
        for buf in data {
            hasher.update(buf);
        }
        Ok(*hasher.finalize().as_bytes())
    }
}

impl std::fmt::Debug for MemoryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stores = self.stores.read().expect("stores lock poisoned");
        f.debug_struct("MemoryClient")
            .field("objects", &stores.objects.len())
            .field("indexes", &stores.indexes.len())
            .finish()
    }
}
