use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use bytes::Bytes;
use tracing::debug;

use strata_types::{EntityId, KvOpcode, OpPayload, Operation};

/// Per-key result for a key that was not found.
const ENOENT: i32 = 2;

type IndexMap = BTreeMap<Vec<u8>, Vec<u8>>;

/// Ordered in-memory KV store that executes operations in place.
///
/// One `BTreeMap` per index. `put` auto-creates its index; reads against a
/// missing index see an empty one. Operations are completed synchronously:
/// `execute` fills the op's values and per-key result codes, then completes
/// it.
#[derive(Default)]
pub struct FakeKvService {
    indexes: RwLock<HashMap<EntityId, IndexMap>>,
}

impl FakeKvService {
    /// Create an empty service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Explicitly create an index. Returns `false` if it already existed.
    pub fn create_index(&self, id: EntityId) -> bool {
        let mut indexes = self.indexes.write().expect("kvs lock poisoned");
        match indexes.entry(id) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(BTreeMap::new());
                true
            }
        }
    }

    /// Drop an index and all its keys. Returns `true` if it existed.
    pub fn drop_index(&self, id: EntityId) -> bool {
        self.indexes
            .write()
            .expect("kvs lock poisoned")
            .remove(&id)
            .is_some()
    }

    /// Number of keys in an index (0 for a missing index).
    pub fn key_count(&self, id: EntityId) -> usize {
        self.indexes
            .read()
            .expect("kvs lock poisoned")
            .get(&id)
            .map(|m| m.len())
            .unwrap_or(0)
    }

    /// Remove all indexes.
    pub fn clear(&self) {
        self.indexes.write().expect("kvs lock poisoned").clear();
    }

    /// Execute and complete a KV operation.
    ///
    /// An operation whose payload is not `Kv` is completed successfully
    /// untouched: the launcher routed it here by configuration, not because
    /// it has index semantics.
    pub fn execute(&self, op: &Operation) {
        let rc = {
            let mut payload = op.payload();
            match &mut *payload {
                OpPayload::Kv {
                    index,
                    opcode,
                    keys,
                    vals,
                    rcs,
                } => {
                    debug!(op_id = op.id(), index = %index, opcode = ?opcode, keys = keys.len(), "fake kvs executing");
                    match opcode {
                        KvOpcode::Get => self.get(*index, keys, vals, rcs),
                        KvOpcode::Put => self.put(*index, keys, vals, rcs),
                        KvOpcode::Del => self.del(*index, keys, rcs),
                        KvOpcode::Next => self.next(*index, keys, vals, rcs),
                    }
                }
                other => {
                    debug!(op_id = op.id(), payload = ?other, "not a kv op, completing untouched");
                    0
                }
            }
        };
        op.mark_launched();
        op.complete(rc);
    }

    fn get(
        &self,
        index: EntityId,
        keys: &strata_types::BufVec,
        vals: &mut strata_types::BufVec,
        rcs: &mut [i32],
    ) -> i32 {
        let indexes = self.indexes.read().expect("kvs lock poisoned");
        let map = indexes.get(&index);
        let mut rc = 0;
        for (i, key) in keys.iter().enumerate() {
            match map.and_then(|m| m.get(key.as_ref())) {
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
        rc
    }

    fn put(
        &self,
        index: EntityId,
        keys: &strata_types::BufVec,
        vals: &strata_types::BufVec,
        rcs: &mut [i32],
    ) -> i32 {
        let mut indexes = self.indexes.write().expect("kvs lock poisoned");
        let map = indexes.entry(index).or_default();
        for (i, key) in keys.iter().enumerate() {
            let val = vals.get(i).cloned().unwrap_or_default();
            map.insert(key.to_vec(), val.to_vec());
            rcs[i] = 0;
        }
        0
    }

    fn del(&self, index: EntityId, keys: &strata_types::BufVec, rcs: &mut [i32]) -> i32 {
        let mut indexes = self.indexes.write().expect("kvs lock poisoned");
        let mut map = indexes.get_mut(&index);
        let mut rc = 0;
        for (i, key) in keys.iter().enumerate() {
            let removed = map
                .as_mut()
                .map(|m| m.remove(key.as_ref()).is_some())
                .unwrap_or(false);
            if removed {
                rcs[i] = 0;
            } else {
                rcs[i] = -ENOENT;
                if rc == 0 {
                    rc = -ENOENT;
                }
            }
        }
        rc
    }

    /// Ordered scan: slot 0 holds the start key; every slot is filled with
    /// the following entries in key order. A scan that runs off the end of
    /// the index is not an error; unfilled slots get `-ENOENT`.
    fn next(
        &self,
        index: EntityId,
        keys: &mut strata_types::BufVec,
        vals: &mut strata_types::BufVec,
        rcs: &mut [i32],
    ) -> i32 {
        let indexes = self.indexes.read().expect("kvs lock poisoned");
        let empty = IndexMap::new();
        let map = indexes.get(&index).unwrap_or(&empty);

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
        for rc in rcs.iter_mut().skip(found) {
            *rc = -ENOENT;
        }
        0
    }
}

impl std::fmt::Debug for FakeKvService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let indexes = self.indexes.read().expect("kvs lock poisoned");
        f.debug_struct("FakeKvService")
            .field("index_count", &indexes.len())
            .finish()
    }
}
