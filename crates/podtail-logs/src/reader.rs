use std::io;
use std::time::Duration;

use futures::{AsyncRead, AsyncReadExt};
use tracing::trace;

use podtail_types::{DEFAULT_CHUNK_CAPACITY, LogChunk, TailError};

/// First delay after an empty read
const INITIAL_BACKOFF: Duration = Duration::from_millis(1);

/// Longest delay between consecutive empty reads
const MAX_BACKOFF: Duration = Duration::from_millis(100);

/// Result of one read from the stream
#[derive(Debug)]
pub enum ReadOutcome<'a> {
    /// Bytes were read
    Data(LogChunk<'a>),
    /// Nothing was read but the stream is still open
    Empty,
    /// The stream has ended
    End,
}

/// Pulls fixed-size chunks from a log stream, reusing one buffer
pub struct StreamReader<R> {
    stream: R,
    buf: Vec<u8>,
    backoff: Duration,
}

impl<R: AsyncRead + Unpin> StreamReader<R> {
    pub fn new(stream: R) -> Self {
        Self::with_capacity(stream, DEFAULT_CHUNK_CAPACITY)
    }

    pub fn with_capacity(stream: R, capacity: usize) -> Self {
        Self {
            stream,
            buf: vec![0u8; capacity.max(1)],
            backoff: INITIAL_BACKOFF,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Perform one read.
    ///
    /// `Interrupted` and `WouldBlock` count as an empty read: the reader sleeps
    /// for the current backoff and returns [`ReadOutcome::Empty`]. Any other
    /// error is fatal.
    pub async fn next_chunk(&mut self) -> Result<ReadOutcome<'_>, TailError> {
        match self.stream.read(&mut self.buf).await {
            Ok(0) => Ok(ReadOutcome::End),
            Ok(n) => {
                self.backoff = INITIAL_BACKOFF;
                Ok(ReadOutcome::Data(LogChunk::new(&self.buf[..n], self.buf.len())))
            }
            Err(e) if is_transient(&e) => {
                let delay = self.backoff;
                trace!(?delay, "Empty read, backing off");
                tokio::time::sleep(delay).await;
                self.backoff = (delay * 2).min(MAX_BACKOFF);
                Ok(ReadOutcome::Empty)
            }
            Err(e) => Err(TailError::StreamRead(e)),
        }
    }
}

fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock
    )
}
