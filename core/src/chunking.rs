use std::sync::Arc;
use thiserror::Error;


/// Trait for policies that split source text into an ordered sequence of pieces.
///
/// Implementations of this trait define specific strategies for determining
/// chunk boundaries (e.g., a single separator with greedy merging, a recursive
/// separator hierarchy, token windows, or a fixed separator with a suffix).
///
/// Everything downstream of a splitter (document assembly, loaders, the
/// splitter factory) depends only on this trait, so new policies can be plugged
/// in without touching the callers.
///
/// Splitting is pure and synchronous: the same text and configuration always
/// produce the same output, and implementations are expected to be shareable
/// across threads.
pub trait TextSplitter: Send + Sync {
    /// Splits the provided text according to the implementation's strategy.
    ///
    /// # Arguments
    ///
    /// * `text`: The source text to be split.
    ///
    /// # Returns
    ///
    /// A `Result` containing either:
    /// * `Ok(Vec<String>)`: The chunks, in the order they appear in `text`.
    ///                      Consecutive chunks may share an overlapping region.
    /// * `Err(ChunkerError)`: An error that occurred during splitting.
    fn split_text(&self, text: &str) -> Result<Vec<String>, ChunkerError>;

    /// A short name identifying the policy, used in log output.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<T: TextSplitter + ?Sized> TextSplitter for Box<T> {
    fn split_text(&self, text: &str) -> Result<Vec<String>, ChunkerError> {
        (**self).split_text(text)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<T: TextSplitter + ?Sized> TextSplitter for Arc<T> {
    fn split_text(&self, text: &str) -> Result<Vec<String>, ChunkerError> {
        (**self).split_text(text)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Errors that can occur during the chunking process.
#[derive(Debug, Error)]
pub enum ChunkerError {
    /// The configuration provided or inherent to the splitter is invalid.
    ///
    /// Always raised before any chunk is produced.
    #[error("Invalid chunker configuration: {0}")]
    InvalidConfig(String),

    /// The arguments passed to a splitting call are inconsistent.
    #[error("Invalid chunker input: {0}")]
    InvalidInput(String),

    /// A general error occurred during chunk processing logic.
    #[error("Chunker processing failed: {0}")]
    Processing(String),
}

impl ChunkerError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub fn processing(msg: impl Into<String>) -> Self {
        Self::Processing(msg.into())
    }
}
