use chunkwise_core::{ChunkerError, SplitterConfig, TextSplitter};
use tracing::{debug, instrument, trace};

use super::merge::{merge_pieces, whole_text, GlueAccounting, Piece};
use super::separator::split_on_separator;


/// Splits text on a single separator and greedily merges the pieces into
/// chunks of at most `chunk_size`, with optional whole-piece overlap between
/// consecutive chunks.
///
/// Only the first entry of `config.separators` is used. Pieces longer than
/// `chunk_size` are kept whole. Text that already fits in one chunk is
/// returned unchanged, separators included.
#[derive(Debug, Clone)]
pub struct CharacterTextSplitter {
    config: SplitterConfig,
    separator: String,
}

impl CharacterTextSplitter {
    /// Creates a new `CharacterTextSplitter` instance.
    ///
    /// # Returns
    ///
    /// * `Ok(CharacterTextSplitter)`: The configured splitter.
    /// * `Err(ChunkerError::InvalidConfig)`: If `chunk_size` is 0, `chunk_overlap`
    ///                                      is greater than or equal to `chunk_size`,
    ///                                      or no separator is configured.
    pub fn new(config: SplitterConfig) -> Result<Self, ChunkerError> {
        config.validate()?;
        let separator = config.separators.first().cloned().ok_or_else(|| {
            ChunkerError::invalid_config("Character splitter needs a separator")
        })?;

        Ok(Self { config, separator })
    }

    /// Returns the configured maximum chunk size.
    pub fn chunk_size(&self) -> usize {
        self.config.chunk_size
    }

    /// Returns the configured overlap size.
    pub fn chunk_overlap(&self) -> usize {
        self.config.chunk_overlap
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }
}

impl TextSplitter for CharacterTextSplitter {
    #[instrument(skip(self, text), fields(text_len = text.len(), chunk_size = self.config.chunk_size))]
    fn split_text(&self, text: &str) -> Result<Vec<String>, ChunkerError> {
        if let Some(chunks) = whole_text(text, &self.config) {
            trace!("Text fits in a single chunk");
            return Ok(chunks);
        }

        let keep = self.config.keep_separator;
        let glue = if keep { "" } else { self.separator.as_str() };

        let pieces: Vec<Piece> = split_on_separator(text, &self.separator, keep)
            .map(|piece| Piece::new(piece, glue))
            .collect();
        let chunks = merge_pieces(&pieces, &self.config, GlueAccounting::IncomingOnly);

        debug!(num_pieces = pieces.len(), num_chunks = chunks.len(), "Character splitting finished");
        Ok(chunks)
    }

    fn name(&self) -> &str {
        "character"
    }
}
