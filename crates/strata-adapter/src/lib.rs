//! The Strata adapter.
//!
//! [`StorageAdapter`] sits between an S3-compatible front end and the
//! distributed storage client. Every object, index, and sync operation the
//! front end issues goes through here, and the adapter decides where it
//! lands:
//!
//! 1. kinds marked as faked complete immediately with fake success,
//! 2. KV kinds routed to the fake KV service execute in memory,
//! 3. kinds with an armed fault point complete with a deliberate failure,
//! 4. everything else is forwarded to the real storage client.
//!
//! The decision order is fixed: fake beats fake-KV beats fault beats real.

pub mod adapter;
pub mod error;

pub use adapter::StorageAdapter;
pub use error::{AdapterError, AdapterResult};
