//! Configuration loading errors.

/// Config load error
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Value out of its valid range
    #[error("Invalid config: {0}")]
    Invalid(String),
}
