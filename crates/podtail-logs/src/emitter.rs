use std::io::Write;

use podtail_types::TailError;

/// Writes one line per matched record and flushes immediately
pub struct Emitter<W: Write> {
    out: W,
    lines: u64,
}

impl<W: Write> Emitter<W> {
    pub fn new(out: W) -> Self {
        Self { out, lines: 0 }
    }

    /// Write `line` followed by exactly one newline.
    /// Trailing line terminators already on `line` are dropped.
    pub fn emit(&mut self, line: &str) -> Result<(), TailError> {
        let line = line.trim_end_matches(['\n', '\r']);
        self.out
            .write_all(line.as_bytes())
            .and_then(|()| self.out.write_all(b"\n"))
            .and_then(|()| self.out.flush())
            .map_err(TailError::Output)?;
        self.lines += 1;
        Ok(())
    }

    /// Lines written so far
    pub fn lines(&self) -> u64 {
        self.lines
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
