//! Named fault-injection points for the Strata adapter.
//!
//! A fault point is a process-local switch consulted on hot paths by name
//! (e.g. `"entity_create_fail"`). Tests arm points with a trigger mode and
//! the adapter checks them before forwarding work to the storage client,
//! turning would-be-forwarded operations into deliberate failures.
//!
//! # Key Types
//!
//! - [`FaultRegistry`] — the set of armed points
//! - [`TriggerMode`] — when an armed point actually fires
//!
//! Checking an unarmed point is the common case and costs one read-lock
//! acquisition.

pub mod registry;
pub mod trigger;

pub use registry::FaultRegistry;
pub use trigger::TriggerMode;
