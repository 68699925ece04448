//! Error types for the perception pipeline.

/// Result type alias
pub type Result<T> = std::result::Result<T, PipelineError>;

/// A scan frame rejected by ingest validation.
///
/// The frame is dropped; map and particle state are left untouched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FrameError {
    /// Frame carries no readings
    #[error("Empty scan frame")]
    Empty,

    /// Reading count disagrees with the declared count
    #[error("Reading count mismatch: declared {declared}, received {received}")]
    CountMismatch {
        /// Declared distance count
        declared: usize,
        /// Number of ranges present
        received: usize,
    },

    /// Angular increment is zero or not finite
    #[error("Invalid angle increment: {0}")]
    InvalidIncrement(f32),

    /// Start angle is not finite
    #[error("Invalid start angle: {0}")]
    InvalidStartAngle(f32),

    /// Distance band is empty or not finite
    #[error("Invalid distance bounds: [{minimum}, {maximum}]")]
    InvalidDistanceBounds {
        /// Minimum valid distance
        minimum: f32,
        /// Maximum valid distance
        maximum: f32,
    },

    /// Odometry delta is not finite
    #[error("Invalid odometry delta")]
    InvalidOdometry,
}

/// Pipeline pass failure.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    /// Frame failed validation
    #[error("Frame rejected: {0}")]
    Frame(#[from] FrameError),

    /// Pass abandoned before commit
    #[error("Pipeline pass cancelled")]
    Cancelled,
}
