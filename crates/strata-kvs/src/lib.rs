//! In-memory fake KV service for the Strata adapter.
//!
//! When the adapter is configured with `fake_kv_service`, KV operations are
//! executed here instead of being forwarded to the storage client. The
//! service keeps one ordered map per index and completes operations in
//! place, filling values and per-key result codes the way the real client
//! would.
//!
//! This is a test double for index semantics only: no durability, no
//! distribution, no transactions.

pub mod service;

pub use service::FakeKvService;
