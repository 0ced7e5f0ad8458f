use tracing::warn;

use podtail_types::{Framing, LogChunk};

/// Largest unterminated line carried across chunks (1 MiB)
pub const MAX_RESIDUAL: usize = 1024 * 1024;

/// What was left over when the stream ended
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EndOfStream {
    /// The last record was probably cut short
    pub truncated: bool,

    /// Unterminated bytes still held (line framing only)
    pub residual: Option<String>,
}

/// Turns chunks into candidate records.
///
/// With [`Framing::Chunk`] every chunk is one candidate and nothing survives
/// the chunk, so a record split across two reads is seen as two fragments.
/// With [`Framing::Line`] bytes are carried until a newline arrives.
#[derive(Debug)]
pub struct RecordAssembler {
    framing: Framing,
    residual: Vec<u8>,
    /// Leading bytes of `residual` already known to hold no newline
    scanned: usize,
    /// The last chunk filled the buffer or did not end in a newline
    last_chunk_open: bool,
}

impl RecordAssembler {
    pub fn new(framing: Framing) -> Self {
        Self {
            framing,
            residual: Vec::new(),
            scanned: 0,
            last_chunk_open: false,
        }
    }

    pub fn framing(&self) -> Framing {
        self.framing
    }

    /// Bytes waiting for a newline
    pub fn residual_len(&self) -> usize {
        self.residual.len()
    }

    /// Feed one chunk, appending complete candidates to `out`
    pub fn push(&mut self, chunk: LogChunk<'_>, out: &mut Vec<String>) {
        self.last_chunk_open = chunk.is_full() || !chunk.bytes().ends_with(b"\n");
        match self.framing {
            Framing::Chunk => out.push(chunk.text().into_owned()),
            Framing::Line => {
                self.residual.extend_from_slice(chunk.bytes());
                let mut start = 0;
                let mut from = self.scanned;
                while let Some(pos) = self.residual[from..].iter().position(|b| *b == b'\n') {
                    let end = from + pos;
                    out.push(line_text(&self.residual[start..end]));
                    start = end + 1;
                    from = start;
                }
                self.residual.drain(..start);
                self.scanned = self.residual.len();

                if self.residual.len() > MAX_RESIDUAL {
                    warn!(
                        "Unterminated log line exceeded {} bytes; emitting it as a record",
                        MAX_RESIDUAL
                    );
                    out.push(line_text(&self.residual));
                    self.residual.clear();
                    self.scanned = 0;
                }
            }
        }
    }

    /// Close the assembler at end of stream
    pub fn finish(&mut self) -> EndOfStream {
        match self.framing {
            Framing::Chunk => EndOfStream {
                truncated: self.last_chunk_open,
                residual: None,
            },
            Framing::Line => {
                if self.residual.is_empty() {
                    return EndOfStream::default();
                }
                let rest = line_text(&self.residual);
                self.residual.clear();
                self.scanned = 0;
                EndOfStream {
                    truncated: true,
                    residual: Some(rest),
                }
            }
        }
    }
}

fn line_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}
