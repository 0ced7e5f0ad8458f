use std::io::Write;

use futures::AsyncRead;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use podtail_types::{DEFAULT_CHUNK_CAPACITY, ExtractMode, FilterSpec, Framing, TailError};

use crate::emitter::Emitter;
use crate::extractor::RecordExtractor;
use crate::filter::LogFilter;
use crate::framing::RecordAssembler;
use crate::reader::{ReadOutcome, StreamReader};

/// How the pipeline turns stream bytes into output
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineOptions {
    pub mode: ExtractMode,
    pub framing: Framing,
    pub filter: FilterSpec,
    pub chunk_capacity: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            mode: ExtractMode::default(),
            framing: Framing::default(),
            filter: FilterSpec::default(),
            chunk_capacity: DEFAULT_CHUNK_CAPACITY,
        }
    }
}

/// Counters for one pipeline run
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub chunks: u64,
    pub bytes: u64,
    pub empty_reads: u64,
    pub records_emitted: u64,
    pub extraction_misses: u64,
    pub filtered_out: u64,

    /// The stream ended in the middle of a record
    pub truncated: bool,

    /// The run was stopped through the cancellation token
    pub cancelled: bool,
}

/// READ → EXTRACT → FILTER → EMIT over one log stream
pub struct LogPipeline<R, W: Write> {
    reader: StreamReader<R>,
    assembler: RecordAssembler,
    extractor: RecordExtractor,
    filter: LogFilter,
    emitter: Emitter<W>,
    stats: PipelineStats,
}

impl<R: AsyncRead + Unpin, W: Write> LogPipeline<R, W> {
    pub fn new(stream: R, out: W, options: &PipelineOptions) -> Self {
        Self {
            reader: StreamReader::with_capacity(stream, options.chunk_capacity),
            assembler: RecordAssembler::new(options.framing),
            extractor: RecordExtractor::new(options.mode),
            filter: LogFilter::new(options.filter.clone()),
            emitter: Emitter::new(out),
            stats: PipelineStats::default(),
        }
    }

    /// Run until the stream ends, a fatal error occurs, or `cancel` fires
    pub async fn run(mut self, cancel: CancellationToken) -> Result<PipelineStats, TailError> {
        debug!(
            mode = %self.extractor.mode(),
            framing = %self.assembler.framing(),
            capacity = self.reader.capacity(),
            filter = self.filter.pattern(),
            "Streaming"
        );

        let mut frames: Vec<String> = Vec::new();
        loop {
            let outcome = tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    self.stats.cancelled = true;
                    break;
                }

                outcome = self.reader.next_chunk() => outcome?,
            };

            match outcome {
                ReadOutcome::Data(chunk) => {
                    self.stats.chunks += 1;
                    self.stats.bytes += chunk.len() as u64;
                    self.assembler.push(chunk, &mut frames);
                }
                ReadOutcome::Empty => {
                    self.stats.empty_reads += 1;
                    continue;
                }
                ReadOutcome::End => {
                    let end = self.assembler.finish();
                    if end.truncated {
                        self.stats.truncated = true;
                        warn!(
                            "Buffer too small to read log: stream ended mid-record ({} byte buffer)",
                            self.reader.capacity()
                        );
                    }
                    frames.extend(end.residual);
                    for frame in frames.drain(..) {
                        self.handle_frame(&frame)?;
                    }
                    break;
                }
            }

            for frame in frames.drain(..) {
                self.handle_frame(&frame)?;
            }
        }

        if self.stats.cancelled {
            info!("Log streaming cancelled");
        } else {
            info!("Log stream ended");
        }
        debug!(stats = ?self.stats, "Pipeline finished");
        Ok(self.stats)
    }

    fn handle_frame(&mut self, text: &str) -> Result<(), TailError> {
        let Some(record) = self.extractor.extract(text) else {
            self.stats.extraction_misses += 1;
            trace!(len = text.len(), "No complete record in frame");
            return Ok(());
        };

        let line = record.to_string();
        if !self.filter.matches(&line) {
            self.stats.filtered_out += 1;
            return Ok(());
        }

        self.emitter.emit(&line)?;
        self.stats.records_emitted = self.emitter.lines();
        Ok(())
    }
}
