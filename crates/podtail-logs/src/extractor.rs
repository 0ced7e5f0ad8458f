use std::sync::LazyLock;

use regex::Regex;

use podtail_types::{ExtractMode, LogRecord};

static MESSAGE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""message":"(.*?)","#).expect("static message pattern"));

static TIMESTAMP_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""env_time":"(.*?)","#).expect("static env_time pattern"));

/// Pulls a [`LogRecord`] out of candidate text
#[derive(Clone, Copy, Debug)]
pub struct RecordExtractor {
    mode: ExtractMode,
}

impl RecordExtractor {
    pub fn new(mode: ExtractMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> ExtractMode {
        self.mode
    }

    /// Extract a record, or `None` when the text holds no complete record.
    ///
    /// In structured mode both `"message":"…",` and `"env_time":"…",` must
    /// appear with their closing `",` inside `text`; the two fields are
    /// matched independently and only the quoted values are kept.
    pub fn extract(&self, text: &str) -> Option<LogRecord> {
        match self.mode {
            ExtractMode::Raw => Some(LogRecord::raw(text)),
            ExtractMode::Structured => {
                let message = capture(&MESSAGE_PATTERN, text)?;
                let timestamp = capture(&TIMESTAMP_PATTERN, text)?;
                Some(LogRecord::structured(timestamp, message))
            }
        }
    }
}

fn capture<'t>(pattern: &Regex, text: &'t str) -> Option<&'t str> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn structured() -> RecordExtractor {
        RecordExtractor::new(ExtractMode::Structured)
    }

    #[test]
    fn test_structured_boot_record() {
        let text = r#"{"env_time":"2024-01-01T00:00:00Z","message":"boot complete","level":"info"}"#;
        let record = structured().extract(text).unwrap();
        assert_eq!(record.timestamp.as_deref(), Some("2024-01-01T00:00:00Z"));
        assert_eq!(record.message, "boot complete");
        assert_eq!(record.to_string(), "2024-01-01T00:00:00Z boot complete");
    }

    #[test]
    fn test_structured_field_order_does_not_matter() {
        let text = r#"{"message":"ready","pid":7,"env_time":"12:00:01","x":1}"#;
        let record = structured().extract(text).unwrap();
        assert_eq!(record.to_string(), "12:00:01 ready");
    }

    #[test]
    fn test_structured_match_is_non_greedy() {
        let text = r#"{"message":"one","env_time":"t1","message":"two","env_time":"t2",}"#;
        let record = structured().extract(text).unwrap();
        assert_eq!(record.message, "one");
        assert_eq!(record.timestamp.as_deref(), Some("t1"));
    }

    #[test]
    fn test_structured_partial_message_is_dropped() {
        assert!(structured().extract(r#"{"message":"partial"#).is_none());
        assert!(structured().extract(r#"{"env_time":"2024-01-01T00:00:00Z","message":"partial"#).is_none());
    }

    #[test]
    fn test_structured_missing_timestamp_is_dropped() {
        assert!(structured().extract(r#"{"message":"no time","level":"info"}"#).is_none());
    }

    #[test]
    fn test_structured_last_field_without_comma_is_dropped() {
        // The closing delimiter is `",`, so a final field before `}` never matches.
        let text = r#"{"env_time":"t","message":"tail"}"#;
        assert!(structured().extract(text).is_none());
    }

    #[test]
    fn test_raw_passes_text_through() {
        let record = RecordExtractor::new(ExtractMode::Raw)
            .extract("ERROR db timeout")
            .unwrap();
        assert_eq!(record, LogRecord::raw("ERROR db timeout"));
    }
}
