//! Frame-synchronous perception pipeline.
//!
//! # Contents
//!
//! - [`Pipeline`]: one pass per scan frame (ingest, segment, features,
//!   filter, fusion) with an atomically published [`PipelineOutput`]
//! - [`CancelToken`]: abandons a pass between stages

mod cancel;
mod pipeline;

pub use cancel::CancelToken;
pub use pipeline::{FrameReport, Pipeline, PipelineConfig, PipelineOutput};
