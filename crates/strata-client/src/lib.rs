//! The storage-client seam for the Strata adapter.
//!
//! The real distributed storage client lives outside this codebase; Strata
//! talks to it exclusively through the [`StorageClient`] trait: build
//! operations, launch them, and observe completion through the operation
//! handles.
//!
//! [`MemoryClient`] is an in-process reference implementation of the same
//! trait, used by adapter tests and embedding. It executes launched
//! operations on spawned tasks, so completion is observed the same way as
//! with a real client.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{ClientError, ClientResult};
pub use memory::MemoryClient;
pub use traits::{IntegritySeed, StorageClient};
