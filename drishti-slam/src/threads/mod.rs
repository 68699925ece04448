//! Worker thread that drives the pipeline.
//!
//! - `PipelineThread`: consumes scan frames from a bounded channel, newest
//!   frame first, and abandons a pass when a newer frame arrives

mod pipeline_thread;

pub use pipeline_thread::{FrameInput, PipelineThread, PipelineThreadConfig};
