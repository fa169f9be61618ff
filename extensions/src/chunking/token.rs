use std::{fmt, str::FromStr};

use chunkwise_core::{ChunkerError, LengthFunction, SplitterConfig, TextSplitter};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tiktoken_rs::{cl100k_base, o200k_base, p50k_base, r50k_base, CoreBPE, Rank};
use tracing::{debug, instrument, trace};


/// A tiktoken byte-pair encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenEncoding {
    #[default]
    Cl100kBase,
    O200kBase,
    P50kBase,
    R50kBase,
}

static CL100K_BASE: OnceCell<CoreBPE> = OnceCell::new();
static O200K_BASE: OnceCell<CoreBPE> = OnceCell::new();
static P50K_BASE: OnceCell<CoreBPE> = OnceCell::new();
static R50K_BASE: OnceCell<CoreBPE> = OnceCell::new();

impl TokenEncoding {
    pub fn name(&self) -> &'static str {
        match self {
            TokenEncoding::Cl100kBase => "cl100k_base",
            TokenEncoding::O200kBase => "o200k_base",
            TokenEncoding::P50kBase => "p50k_base",
            TokenEncoding::R50kBase => "r50k_base",
        }
    }

    /// Returns the shared tokenizer for this encoding, building it on first use.
    pub fn tokenizer(&self) -> Result<&'static CoreBPE, ChunkerError> {
        match self {
            TokenEncoding::Cl100kBase => cached(&CL100K_BASE, self.name(), cl100k_base),
            TokenEncoding::O200kBase => cached(&O200K_BASE, self.name(), o200k_base),
            TokenEncoding::P50kBase => cached(&P50K_BASE, self.name(), p50k_base),
            TokenEncoding::R50kBase => cached(&R50K_BASE, self.name(), r50k_base),
        }
    }
}

fn cached<E: fmt::Display>(
    cell: &'static OnceCell<CoreBPE>,
    name: &str,
    init: impl FnOnce() -> Result<CoreBPE, E>,
) -> Result<&'static CoreBPE, ChunkerError> {
    cell.get_or_try_init(|| {
        debug!(encoding = name, "Initializing tokenizer");
        init().map_err(|e| {
            ChunkerError::InvalidConfig(format!("Failed to initialize tokenizer '{}': {}", name, e))
        })
    })
}

impl fmt::Display for TokenEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TokenEncoding {
    type Err = ChunkerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "cl100k_base" => Ok(TokenEncoding::Cl100kBase),
            "o200k_base" => Ok(TokenEncoding::O200kBase),
            "p50k_base" => Ok(TokenEncoding::P50kBase),
            "r50k_base" => Ok(TokenEncoding::R50kBase),
            other => Err(ChunkerError::InvalidConfig(format!(
                "Unsupported tokenizer model: {}",
                other
            ))),
        }
    }
}

/// A [`LengthFunction`] that counts tokens instead of characters, for
/// token-bounded character or recursive splitting.
pub fn tiktoken_length(encoding: TokenEncoding) -> Result<LengthFunction, ChunkerError> {
    let tokenizer = encoding.tokenizer()?;
    Ok(LengthFunction::new(encoding.name(), move |text| {
        tokenizer.encode_with_special_tokens(text).len()
    }))
}


/// Splits text into windows of `chunk_size` tokens, each starting
/// `chunk_size - chunk_overlap` tokens after the previous one, and decodes
/// every window back to text.
///
/// A multi-byte character can be spread over several tokens. Window edges are
/// moved back to the nearest token that starts a character, so every window
/// decodes to whole characters; a window only grows past `chunk_size` when a
/// single character needs more tokens than that.
pub struct TokenTextSplitter {
    encoding: TokenEncoding,
    chunk_size: usize,
    chunk_overlap: usize,
    tokenizer: &'static CoreBPE,
}

impl fmt::Debug for TokenTextSplitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenTextSplitter")
            .field("encoding", &self.encoding)
            .field("chunk_size", &self.chunk_size)
            .field("chunk_overlap", &self.chunk_overlap)
            .finish()
    }
}

impl TokenTextSplitter {
    /// Creates a new `TokenTextSplitter`, loading the tokenizer eagerly so that
    /// an unusable encoding fails here rather than on the first split.
    ///
    /// # Returns
    ///
    /// * `Ok(TokenTextSplitter)`: The configured splitter.
    /// * `Err(ChunkerError::InvalidConfig)`: If `chunk_size` is 0, `chunk_overlap`
    ///                                      is greater than or equal to `chunk_size`,
    ///                                      or the tokenizer cannot be built.
    pub fn new(encoding: TokenEncoding, chunk_size: usize, chunk_overlap: usize) -> Result<Self, ChunkerError> {
        SplitterConfig::new(chunk_size, chunk_overlap).validate()?;
        let tokenizer = encoding.tokenizer()?;
        Ok(Self {
            encoding,
            chunk_size,
            chunk_overlap,
            tokenizer,
        })
    }

    /// Takes the size bounds from `config`; separators and the length
    /// function do not apply to token windows.
    pub fn from_config(encoding: TokenEncoding, config: &SplitterConfig) -> Result<Self, ChunkerError> {
        Self::new(encoding, config.chunk_size, config.chunk_overlap)
    }

    pub fn encoding(&self) -> TokenEncoding {
        self.encoding
    }

    /// Token positions, in ascending order, at which a character starts,
    /// including `0` and `tokens.len()`.
    ///
    /// Decoding from one boundary succeeds exactly up to the next token that
    /// completes a character, which makes that token's end the next boundary.
    fn char_boundaries(&self, tokens: &[Rank]) -> Vec<usize> {
        let mut boundaries = vec![0];
        let mut last = 0;
        for end in 1..=tokens.len() {
            if self.tokenizer.decode(tokens[last..end].to_vec()).is_ok() {
                boundaries.push(end);
                last = end;
            }
        }
        if last != tokens.len() {
            boundaries.push(tokens.len());
        }
        boundaries
    }
}

/// The last boundary after `start` and no later than `target`, or the first
/// boundary after `start` when there is none.
fn snap_to_boundary(boundaries: &[usize], start: usize, target: usize) -> usize {
    let after_start = boundaries.partition_point(|&b| b <= start);
    let through_target = boundaries.partition_point(|&b| b <= target);
    if through_target > after_start {
        boundaries[through_target - 1]
    } else {
        boundaries.get(after_start).copied().unwrap_or(start)
    }
}

impl TextSplitter for TokenTextSplitter {
    #[instrument(skip(self, text), fields(text_len = text.len(), encoding = self.encoding.name()))]
    fn split_text(&self, text: &str) -> Result<Vec<String>, ChunkerError> {
        let tokens = self.tokenizer.encode_with_special_tokens(text);
        let stride = self.chunk_size - self.chunk_overlap;
        let boundaries = self.char_boundaries(&tokens);
        trace!(num_tokens = tokens.len(), num_boundaries = boundaries.len(), stride, "Encoded text");

        let mut chunks = Vec::new();
        let mut start = 0;
        while start < tokens.len() {
            let end = snap_to_boundary(&boundaries, start, start + self.chunk_size);
            let chunk = self.tokenizer.decode(tokens[start..end].to_vec()).map_err(|e| {
                ChunkerError::processing(format!("Failed to decode tokens {}..{}: {}", start, end, e))
            })?;
            chunks.push(chunk);

            if end == tokens.len() {
                break;
            }
            start = snap_to_boundary(&boundaries, start, start + stride);
        }

        debug!(num_chunks = chunks.len(), "Token splitting finished");
        Ok(chunks)
    }

    fn name(&self) -> &str {
        "token"
    }
}
