//! Shared types for podtail
//!
//! This crate contains data structures and the error taxonomy used across
//! the podtail crates.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Default read buffer capacity for one log chunk
pub const DEFAULT_CHUNK_CAPACITY: usize = 2048;

/// Upper bound accepted for a configured chunk capacity (1 MiB)
pub const MAX_CHUNK_CAPACITY: usize = 1024 * 1024;

/// Namespace used when none is configured
pub const DEFAULT_NAMESPACE: &str = "default";

// ============================================================================
// Kubernetes Resource Types
// ============================================================================

/// What to tail: a namespace and a substring of the pod name
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetDescriptor {
    pub namespace: String,
    pub name_substring: String,
}

impl TargetDescriptor {
    pub fn new(namespace: impl Into<String>, name_substring: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name_substring: name_substring.into(),
        }
    }

    /// Case-sensitive, unanchored substring match against a pod name
    pub fn matches(&self, instance_name: &str) -> bool {
        instance_name.contains(&self.name_substring)
    }
}

/// A pod as returned by the cluster listing
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstanceInfo {
    pub name: String,
    pub phase: Option<String>,
}

impl InstanceInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phase: None,
        }
    }

    pub fn with_phase(mut self, phase: impl Into<String>) -> Self {
        self.phase = Some(phase.into());
        self
    }

    /// Whether the pod has finished (Succeeded or Failed)
    pub fn is_terminated(&self) -> bool {
        matches!(self.phase.as_deref(), Some("Succeeded") | Some("Failed"))
    }
}

// ============================================================================
// Log Types
// ============================================================================

/// One read result from the log stream.
///
/// Only the bytes reported by the read are held; the capacity of the buffer
/// they came from is kept so callers can tell whether the read filled it.
#[derive(Clone, Copy, Debug)]
pub struct LogChunk<'a> {
    data: &'a [u8],
    capacity: usize,
}

impl<'a> LogChunk<'a> {
    pub fn new(data: &'a [u8], capacity: usize) -> Self {
        debug_assert!(data.len() <= capacity);
        Self { data, capacity }
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The read used the whole buffer, so a record may continue in the next chunk
    pub fn is_full(&self) -> bool {
        self.data.len() == self.capacity
    }

    /// Valid bytes as text, replacing invalid UTF-8 sequences
    pub fn text(&self) -> Cow<'a, str> {
        String::from_utf8_lossy(self.data)
    }
}

/// A log record ready for filtering and output
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogRecord {
    /// Value of the `env_time` field (structured mode only)
    pub timestamp: Option<String>,

    /// Extracted message, or the raw text in raw mode
    pub message: String,
}

impl LogRecord {
    pub fn raw(text: impl Into<String>) -> Self {
        Self {
            timestamp: None,
            message: text.into(),
        }
    }

    pub fn structured(timestamp: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: Some(timestamp.into()),
            message: message.into(),
        }
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.timestamp {
            Some(ts) => write!(f, "{} {}", ts, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Substring filter; the empty pattern matches everything
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterSpec(String);

impl FilterSpec {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self(pattern.into())
    }

    pub fn pattern(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// How records are pulled out of the stream text
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractMode {
    /// Text is passed through as-is
    #[default]
    Raw,
    /// `env_time` and `message` are extracted from JSON-ish text
    Structured,
}

impl ExtractMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractMode::Raw => "raw",
            ExtractMode::Structured => "structured",
        }
    }
}

impl FromStr for ExtractMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "raw" => Ok(ExtractMode::Raw),
            "structured" | "json" => Ok(ExtractMode::Structured),
            other => Err(format!(
                "unknown mode '{}' (expected 'raw' or 'structured')",
                other
            )),
        }
    }
}

impl fmt::Display for ExtractMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How chunks are turned into candidate records
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Framing {
    /// Every chunk is one candidate record; nothing is carried over
    #[default]
    Chunk,
    /// Bytes are carried across chunks and split on newlines
    Line,
}

impl Framing {
    pub fn as_str(&self) -> &'static str {
        match self {
            Framing::Chunk => "chunk",
            Framing::Line => "line",
        }
    }
}

impl FromStr for Framing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "chunk" => Ok(Framing::Chunk),
            "line" => Ok(Framing::Line),
            other => Err(format!(
                "unknown framing '{}' (expected 'chunk' or 'line')",
                other
            )),
        }
    }
}

impl fmt::Display for Framing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Fatal conditions surfaced to the top-level handler
#[derive(Debug, thiserror::Error)]
pub enum TailError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("no pod matching '{substring}' in namespace '{namespace}'")]
    NotFound { namespace: String, substring: String },

    #[error("failed to list pods in namespace '{namespace}': {message}")]
    List { namespace: String, message: String },

    #[error("failed to open log stream for pod '{pod}': {message}")]
    StreamOpen { pod: String, message: String },

    #[error("failed to read log stream: {0}")]
    StreamRead(#[source] std::io::Error),

    #[error("failed to write output: {0}")]
    Output(#[source] std::io::Error),
}

impl TailError {
    pub fn config(message: impl Into<String>) -> Self {
        TailError::Config(message.into())
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            TailError::Config(_) => 2,
            TailError::NotFound { .. } => 3,
            TailError::List { .. } => 4,
            TailError::StreamOpen { .. } => 5,
            TailError::StreamRead(_) => 6,
            TailError::Output(_) => 7,
        }
    }

    /// The reader of our stdout went away (e.g. piped into `head`)
    pub fn is_closed_output(&self) -> bool {
        matches!(self, TailError::Output(e) if e.kind() == std::io::ErrorKind::BrokenPipe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_matches_substring() {
        let target = TargetDescriptor::new("default", "checkout");
        assert!(target.matches("checkout-7f"));
        assert!(target.matches("web-checkout-1"));
        assert!(!target.matches("Checkout-7f"));
        assert!(!target.matches("billing-1"));
    }

    #[test]
    fn test_chunk_is_full() {
        let buf = [b'x'; 8];
        assert!(LogChunk::new(&buf, 8).is_full());
        assert!(!LogChunk::new(&buf[..3], 8).is_full());
        assert_eq!(LogChunk::new(&buf[..3], 8).len(), 3);
    }

    #[test]
    fn test_chunk_text_is_lossy() {
        let bytes = [b'o', b'k', 0xff, b'!'];
        let chunk = LogChunk::new(&bytes, 16);
        assert_eq!(chunk.text(), "ok\u{fffd}!");
    }

    #[test]
    fn test_record_display() {
        let record = LogRecord::structured("2024-01-01T00:00:00Z", "boot complete");
        assert_eq!(record.to_string(), "2024-01-01T00:00:00Z boot complete");

        let raw = LogRecord::raw("ERROR db timeout");
        assert_eq!(raw.to_string(), "ERROR db timeout");
    }

    #[test]
    fn test_mode_and_framing_from_str() {
        assert_eq!("raw".parse::<ExtractMode>(), Ok(ExtractMode::Raw));
        assert_eq!("Structured".parse::<ExtractMode>(), Ok(ExtractMode::Structured));
        assert!("yaml".parse::<ExtractMode>().is_err());
        assert_eq!("line".parse::<Framing>(), Ok(Framing::Line));
        assert!("word".parse::<Framing>().is_err());
    }

    #[test]
    fn test_exit_codes_are_distinct_and_nonzero() {
        let errors = [
            TailError::config("x"),
            TailError::NotFound {
                namespace: "ns".into(),
                substring: "svc".into(),
            },
            TailError::List {
                namespace: "ns".into(),
                message: "denied".into(),
            },
            TailError::StreamOpen {
                pod: "p".into(),
                message: "gone".into(),
            },
            TailError::StreamRead(std::io::Error::other("reset")),
            TailError::Output(std::io::Error::other("full")),
        ];
        let mut codes: Vec<u8> = errors.iter().map(TailError::exit_code).collect();
        assert!(codes.iter().all(|c| *c != 0));
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_broken_pipe_is_closed_output() {
        let err = TailError::Output(std::io::Error::from(std::io::ErrorKind::BrokenPipe));
        assert!(err.is_closed_output());
        assert!(!TailError::config("x").is_closed_output());
    }

    #[test]
    fn test_terminated_phase() {
        assert!(InstanceInfo::new("a").with_phase("Failed").is_terminated());
        assert!(!InstanceInfo::new("a").with_phase("Running").is_terminated());
        assert!(!InstanceInfo::new("a").is_terminated());
    }
}
