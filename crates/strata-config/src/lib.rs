//! Adapter options for Strata.
//!
//! [`AdapterOptions`] decides, per operation kind, whether a launch goes to
//! the real storage client, the immediate fake-success path, or the
//! in-memory fake KV service. The default is everything real; test
//! deployments flip kinds to fake through a TOML file or the builder
//! methods.

pub mod error;
pub mod options;

pub use error::{ConfigError, ConfigResult};
pub use options::AdapterOptions;
