//! Foundation types for the Strata storage adapter.
//!
//! This crate provides the operation model shared by the adapter, the
//! storage-client seam, and the fake backends. Every other Strata crate
//! depends on `strata-types`.
//!
//! # Key Types
//!
//! - [`EntityId`] — 128-bit identifier for objects and indexes
//! - [`UfidGenerator`] — time-ordered unique ID generator
//! - [`OpKind`] — adapter-level operation classification used for dispatch
//! - [`ObjOpcode`] / [`KvOpcode`] — object I/O and index opcodes
//! - [`Operation`] — asynchronous operation handle with observable state
//! - [`BufVec`] / [`ExtentVec`] — payload buffer and extent vectors

pub mod bufvec;
pub mod entity;
pub mod error;
pub mod op;
pub mod opcode;

pub use bufvec::{BufVec, Extent, ExtentVec};
pub use entity::{EntityId, UfidGenerator};
pub use error::TypeError;
pub use op::{OpPayload, Operation, WaitError};
pub use opcode::{KvOpcode, ObjOpcode, OpKind, OpState};
