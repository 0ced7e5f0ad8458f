//! Log processing for podtail
//!
//! This crate reads a followed log byte stream in fixed-size chunks, frames
//! and extracts records, filters them, and writes matches to an output.

mod emitter;
mod extractor;
mod filter;
mod framing;
mod pipeline;
mod reader;

pub use emitter::Emitter;
pub use extractor::RecordExtractor;
pub use filter::LogFilter;
pub use framing::{EndOfStream, MAX_RESIDUAL, RecordAssembler};
pub use pipeline::{LogPipeline, PipelineOptions, PipelineStats};
pub use reader::{ReadOutcome, StreamReader};

// Re-export types used in our public API
pub use podtail_types::{ExtractMode, FilterSpec, Framing, LogChunk, LogRecord, TailError};
