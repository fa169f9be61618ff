use chunkwise_core::{ChunkerError, TextSplitter};
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::separator::split_on_separator;


/// Cuts text at every occurrence of a fixed separator and appends a fixed
/// suffix to each piece.
///
/// There is no size bound and no overlap: one chunk per non-empty piece. The
/// separator itself is dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuffixTextSplitter {
    pub separator: String,
    pub suffix: String,
}

impl SuffixTextSplitter {
    pub fn new(separator: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
            suffix: suffix.into(),
        }
    }
}

impl TextSplitter for SuffixTextSplitter {
    fn split_text(&self, text: &str) -> Result<Vec<String>, ChunkerError> {
        let chunks: Vec<String> = split_on_separator(text, &self.separator, false)
            .with_suffix(&self.suffix)
            .collect();
        trace!(num_chunks = chunks.len(), "Suffix splitting finished");
        Ok(chunks)
    }

    fn name(&self) -> &str {
        "suffix"
    }
}
