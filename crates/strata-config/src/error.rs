use thiserror::Error;

/// Errors from loading or parsing adapter options.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Result alias for config operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
