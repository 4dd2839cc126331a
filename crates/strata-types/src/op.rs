//! The asynchronous operation handle.
//!
//! An [`Operation`] is built by the adapter (or the storage client), then
//! launched, then waited on. Whoever executes the operation completes it
//! through the handle; waiters observe the state through a watch channel.

use std::fmt;
use std::sync::atomic::{AtomicI32, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;

use crate::bufvec::{BufVec, ExtentVec};
use crate::entity::EntityId;
use crate::opcode::{KvOpcode, ObjOpcode, OpKind, OpState};

/// Process-wide operation ID counter. IDs are never reused.
static NEXT_OP_ID: AtomicU64 = AtomicU64::new(1);

/// Error returned by [`Operation::wait`] when the deadline passes before
/// the operation reaches a terminal state.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WaitError {
    #[error("operation did not complete within {0:?}")]
    Timeout(Duration),
}

/// The operation's payload: what it carries to (and back from) the backend.
#[derive(Clone, Debug)]
pub enum OpPayload {
    /// Entity lifecycle operation (create/open/delete of an object or index).
    Entity { id: EntityId },
    /// Object I/O: extents pair positionally with data buffers.
    Object {
        id: EntityId,
        opcode: ObjOpcode,
        extents: ExtentVec,
        data: BufVec,
        attrs: BufVec,
        flags: u32,
    },
    /// Key-value batch against one index. `vals` and `rcs` are filled by
    /// the executing backend; `rcs[i]` is the per-key result for `keys[i]`.
    Kv {
        index: EntityId,
        opcode: KvOpcode,
        keys: BufVec,
        vals: BufVec,
        rcs: Vec<i32>,
    },
    /// Sync barrier over previously launched operations and touched entities.
    Sync {
        entities: Vec<EntityId>,
        ops: Vec<u64>,
    },
}

/// Handle for one asynchronous storage operation.
///
/// The state machine only moves forward: `Initialised` → `Launched` →
/// `Executed` → `Stable` | `Failed`. Completion on an already-terminal
/// operation is a no-op. The handle is shared (`Arc`) between the launcher,
/// the executing backend, and any waiters.
pub struct Operation {
    id: u64,
    kind: OpKind,
    payload: Mutex<OpPayload>,
    rc: AtomicI32,
    state_tx: watch::Sender<OpState>,
}

impl Operation {
    /// Build an operation in the `Initialised` state.
    pub fn new(kind: OpKind, payload: OpPayload) -> Self {
        let (state_tx, _) = watch::channel(OpState::Initialised);
        Self {
            id: NEXT_OP_ID.fetch_add(1, Ordering::Relaxed),
            kind,
            payload: Mutex::new(payload),
            rc: AtomicI32::new(0),
            state_tx,
        }
    }

    /// Build an entity lifecycle operation.
    pub fn entity(kind: OpKind, id: EntityId) -> Self {
        Self::new(kind, OpPayload::Entity { id })
    }

    /// Build an object I/O operation.
    pub fn object(
        kind: OpKind,
        id: EntityId,
        opcode: ObjOpcode,
        extents: ExtentVec,
        data: BufVec,
        attrs: BufVec,
        flags: u32,
    ) -> Self {
        Self::new(
            kind,
            OpPayload::Object {
                id,
                opcode,
                extents,
                data,
                attrs,
                flags,
            },
        )
    }

    /// Build a key-value batch operation. Value slots and per-key result
    /// codes are sized to the key count.
    pub fn kv(kind: OpKind, index: EntityId, opcode: KvOpcode, keys: BufVec, vals: BufVec) -> Self {
        let n = keys.len();
        let vals = if vals.is_empty() && opcode != KvOpcode::Put {
            BufVec::with_slots(n)
        } else {
            vals
        };
        Self::new(
            kind,
            OpPayload::Kv {
                index,
                opcode,
                keys,
                vals,
                rcs: vec![0; n],
            },
        )
    }

    /// Build an empty sync barrier operation.
    pub fn sync() -> Self {
        Self::new(
            OpKind::Sync,
            OpPayload::Sync {
                entities: Vec::new(),
                ops: Vec::new(),
            },
        )
    }

    /// Process-unique operation ID.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn kind(&self) -> OpKind {
        self.kind
    }

    /// Current state.
    pub fn state(&self) -> OpState {
        *self.state_tx.borrow()
    }

    /// Result code: 0 on success, negative errno-style code on failure.
    /// Meaningful once the operation is terminal.
    pub fn rc(&self) -> i32 {
        self.rc.load(Ordering::Acquire)
    }

    /// Lock the payload for inspection or for filling in results.
    pub fn payload(&self) -> std::sync::MutexGuard<'_, OpPayload> {
        self.payload.lock().expect("payload lock poisoned")
    }

    /// Advance to `Launched`. No-op if the operation is already past it.
    pub fn mark_launched(&self) {
        self.advance(OpState::Launched);
    }

    /// Advance to `Executed`. No-op if the operation is already past it.
    pub fn mark_executed(&self) {
        self.advance(OpState::Executed);
    }

    /// Complete the operation: `Stable` if `rc >= 0`, `Failed` otherwise.
    ///
    /// Completing an already-terminal operation changes nothing, so racing
    /// completers are harmless.
    pub fn complete(&self, rc: i32) {
        self.state_tx.send_if_modified(|state| {
            if state.is_terminal() {
                return false;
            }
            self.rc.store(rc, Ordering::Release);
            *state = if rc >= 0 {
                OpState::Stable
            } else {
                OpState::Failed
            };
            true
        });
    }

    /// Await a terminal state, up to `timeout`.
    pub async fn wait(&self, timeout: Duration) -> Result<OpState, WaitError> {
        let mut rx = self.state_tx.subscribe();
        let result = match tokio::time::timeout(timeout, rx.wait_for(|s| s.is_terminal())).await {
            Ok(Ok(state)) => Ok(*state),
            // The sender lives inside `self`, so the channel cannot close
            // while we hold a reference.
            Ok(Err(_)) => Ok(self.state()),
            Err(_) => Err(WaitError::Timeout(timeout)),
        };
        result
    }

    /// Subscribe to state transitions.
    pub fn watch(&self) -> watch::Receiver<OpState> {
        self.state_tx.subscribe()
    }

    fn advance(&self, to: OpState) {
        self.state_tx.send_if_modified(|state| {
            if to.rank() > state.rank() {
                *state = to;
                true
            } else {
                false
            }
        });
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("state", &self.state())
            .field("rc", &self.rc())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn some_id() -> EntityId {
        EntityId::new(0x10, 0x20)
    }

    #[test]
    fn new_op_is_initialised() {
        let op = Operation::entity(OpKind::CreateObject, some_id());
        assert_eq!(op.state(), OpState::Initialised);
        assert_eq!(op.rc(), 0);
    }

    #[test]
    fn ids_are_unique() {
        let a = Operation::sync();
        let b = Operation::sync();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn complete_with_success() {
        let op = Operation::entity(OpKind::DeleteObject, some_id());
        op.mark_launched();
        op.complete(0);
        assert_eq!(op.state(), OpState::Stable);
        assert_eq!(op.rc(), 0);
    }

    #[test]
    fn complete_with_failure() {
        let op = Operation::entity(OpKind::DeleteObject, some_id());
        op.complete(-5);
        assert_eq!(op.state(), OpState::Failed);
        assert_eq!(op.rc(), -5);
    }

    #[test]
    fn complete_is_idempotent() {
        let op = Operation::entity(OpKind::OpenObject, some_id());
        op.complete(0);
        op.complete(-5);
        // First completion wins.
        assert_eq!(op.state(), OpState::Stable);
        assert_eq!(op.rc(), 0);
    }

    #[test]
    fn state_only_moves_forward() {
        let op = Operation::entity(OpKind::OpenObject, some_id());
        op.mark_executed();
        op.mark_launched();
        assert_eq!(op.state(), OpState::Executed);
    }

    #[test]
    fn kv_op_sizes_slots_to_keys() {
        let mut keys = BufVec::new();
        keys.push(Bytes::from_static(b"k1"));
        keys.push(Bytes::from_static(b"k2"));
        let op = Operation::kv(
            OpKind::GetKv,
            some_id(),
            KvOpcode::Get,
            keys,
            BufVec::new(),
        );
        match &*op.payload() {
            OpPayload::Kv { vals, rcs, .. } => {
                assert_eq!(vals.len(), 2);
                assert_eq!(rcs.len(), 2);
            }
            other => panic!("unexpected payload {other:?}"),
        };
    }

    #[tokio::test]
    async fn wait_returns_terminal_state() {
        let op = std::sync::Arc::new(Operation::entity(OpKind::CreateObject, some_id()));
        let waiter = std::sync::Arc::clone(&op);
        let handle = tokio::spawn(async move { waiter.wait(Duration::from_secs(1)).await });
        op.complete(0);
        assert_eq!(handle.await.unwrap(), Ok(OpState::Stable));
    }

    #[tokio::test]
    async fn wait_observes_already_terminal_op() {
        let op = Operation::entity(OpKind::CreateObject, some_id());
        op.complete(-2);
        assert_eq!(op.wait(Duration::from_millis(10)).await, Ok(OpState::Failed));
    }

    #[tokio::test(start_paused = true)]
    async fn wait_times_out() {
        let op = Operation::entity(OpKind::CreateObject, some_id());
        let err = op.wait(Duration::from_millis(50)).await.unwrap_err();
        assert_eq!(err, WaitError::Timeout(Duration::from_millis(50)));
    }
}
