use podtail_types::FilterSpec;

/// Substring filter for emitted lines
#[derive(Clone, Debug, Default)]
pub struct LogFilter {
    spec: FilterSpec,
}

impl LogFilter {
    pub fn new(spec: FilterSpec) -> Self {
        Self { spec }
    }

    /// True when the pattern is empty or `content` contains it.
    /// Case-sensitive and unanchored.
    pub fn matches(&self, content: &str) -> bool {
        self.spec.is_empty() || content.contains(self.spec.pattern())
    }

    pub fn pattern(&self) -> &str {
        self.spec.pattern()
    }

    /// Check if filter is empty (matches everything)
    pub fn is_empty(&self) -> bool {
        self.spec.is_empty()
    }
}
