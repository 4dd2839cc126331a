use std::fmt;

use serde::{Deserialize, Serialize};

/// Object I/O opcodes understood by the storage client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjOpcode {
    /// Read object extents.
    Read,
    /// Write object extents.
    Write,
    /// Pre-allocate object extents.
    Alloc,
    /// Punch holes in object extents.
    Free,
}

/// Index (key-value) opcodes understood by the storage client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KvOpcode {
    /// Look up values for the given keys.
    Get,
    /// Insert or overwrite key-value pairs.
    Put,
    /// Delete the given keys.
    Del,
    /// Ordered scan starting at the given key.
    Next,
}

/// Adapter-level classification of an operation, used for dispatch.
///
/// The adapter decides per kind whether a launch goes to the real storage
/// client, the fake-completion path, the fake KV service, or the
/// fault-injection path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpKind {
    OpenObject,
    CreateObject,
    WriteObject,
    ReadObject,
    DeleteObject,
    CreateIndex,
    DeleteIndex,
    GetKv,
    PutKv,
    DeleteKv,
    Sync,
}

impl OpKind {
    /// Returns `true` for the key-value operation kinds.
    ///
    /// These are the kinds the fake KV service can stand in for.
    pub fn is_kv(&self) -> bool {
        matches!(self, Self::GetKv | Self::PutKv | Self::DeleteKv)
    }

    /// The fault point name checked by the adapter before launching
    /// operations of this kind.
    pub fn fault_point(&self) -> &'static str {
        match self {
            Self::OpenObject => "obj_open_fail",
            Self::CreateObject => "obj_create_fail",
            Self::WriteObject => "obj_write_fail",
            Self::ReadObject => "obj_read_fail",
            Self::DeleteObject => "obj_delete_fail",
            Self::CreateIndex => "idx_create_fail",
            Self::DeleteIndex => "idx_delete_fail",
            Self::GetKv => "kv_get_fail",
            Self::PutKv => "kv_put_fail",
            Self::DeleteKv => "kv_delete_fail",
            Self::Sync => "sync_fail",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::OpenObject => "open-object",
            Self::CreateObject => "create-object",
            Self::WriteObject => "write-object",
            Self::ReadObject => "read-object",
            Self::DeleteObject => "delete-object",
            Self::CreateIndex => "create-index",
            Self::DeleteIndex => "delete-index",
            Self::GetKv => "get-kv",
            Self::PutKv => "put-kv",
            Self::DeleteKv => "delete-kv",
            Self::Sync => "sync",
        };
        f.write_str(name)
    }
}

/// Lifecycle states of an asynchronous operation.
///
/// States only move forward; `Stable` and `Failed` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpState {
    /// Built but not yet submitted.
    Initialised,
    /// Submitted to the executing backend.
    Launched,
    /// Executed but not yet persisted.
    Executed,
    /// Completed successfully (terminal).
    Stable,
    /// Completed with an error (terminal).
    Failed,
}

impl OpState {
    /// Returns `true` for the two terminal states.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stable | Self::Failed)
    }

    /// Position in the forward-only ordering, for transition checks.
    pub(crate) fn rank(&self) -> u8 {
        match self {
            Self::Initialised => 0,
            Self::Launched => 1,
            Self::Executed => 2,
            Self::Stable | Self::Failed => 3,
        }
    }
}
