use serde::{Deserialize, Serialize};

pub const DEFAULT_FLUSH_THRESHOLD: usize = 64 * 1024;

/// Tuning knobs for a binary import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    /// Encoded bytes buffered before they are sent to the server. Buffers are
    /// only flushed between rows, so a single large row may exceed it.
    pub flush_threshold: usize,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            flush_threshold: DEFAULT_FLUSH_THRESHOLD,
        }
    }
}

impl ImportSettings {
    pub fn with_flush_threshold(mut self, flush_threshold: usize) -> Self {
        self.flush_threshold = flush_threshold;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings: ImportSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, ImportSettings::default());
        assert_eq!(settings.flush_threshold, 64 * 1024);
    }

    #[test]
    fn test_flush_threshold_override() {
        let settings: ImportSettings =
            serde_json::from_str(r#"{ "flush_threshold": 1024 }"#).unwrap();
        assert_eq!(settings.flush_threshold, 1024);
        assert_eq!(
            ImportSettings::default().with_flush_threshold(1),
            ImportSettings { flush_threshold: 1 }
        );
    }
}
