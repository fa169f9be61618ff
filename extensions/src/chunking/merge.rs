//! Greedy, size-bounded merging of pieces into chunks.

use chunkwise_core::SplitterConfig;
use tracing::{trace, warn};


/// A piece of text waiting to be merged, together with its glue: the text
/// re-inserted between it and the piece before it when both land in the same chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece<'a> {
    pub text: &'a str,
    pub glue: &'a str,
}

impl<'a> Piece<'a> {
    pub fn new(text: &'a str, glue: &'a str) -> Self {
        Self { text, glue }
    }
}

/// How glue counts against the chunk size while merging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlueAccounting {
    /// Only the glue in front of the incoming piece is counted; glue already
    /// inside the open chunk is not. A chunk of several pieces may end up
    /// longer than the chunk size by that glue.
    IncomingOnly,
    /// Every glue inside the chunk is counted, so a chunk of several pieces
    /// never exceeds the chunk size.
    Full,
}

/// Returns `text` as the only chunk when it already fits in one chunk.
///
/// Empty text yields `None` so the caller's regular path produces no chunks.
pub fn whole_text(text: &str, config: &SplitterConfig) -> Option<Vec<String>> {
    if text.is_empty() || config.measure(text) > config.chunk_size {
        return None;
    }
    if !config.strip_whitespace {
        return Some(vec![text.to_string()]);
    }
    let trimmed = text.trim();
    Some(if trimmed.is_empty() { Vec::new() } else { vec![trimmed.to_string()] })
}

/// Merges consecutive pieces into chunks bounded by `config.chunk_size`.
///
/// Pieces are appended to the open chunk while its length, plus the incoming
/// piece and its glue, stays within the chunk size; `accounting` decides
/// whether the glue already inside the open chunk is part of that length.
/// When the next piece does not fit, the open chunk is sealed and the next one
/// is seeded with the shortest run of trailing whole pieces that reaches
/// `config.chunk_overlap`, minus any leading pieces that would keep the
/// incoming piece from fitting.
///
/// A piece that is larger than the chunk size on its own becomes a chunk by
/// itself; it is never cut.
pub fn merge_pieces(pieces: &[Piece<'_>], config: &SplitterConfig, accounting: GlueAccounting) -> Vec<String> {
    let lengths: Vec<usize> = pieces.iter().map(|p| config.measure(p.text)).collect();
    let glue_lengths: Vec<usize> = pieces.iter().map(|p| config.measure(p.glue)).collect();
    let full = accounting == GlueAccounting::Full;

    let mut chunks = Vec::new();
    let mut start = 0; // first piece of the open chunk
    let mut total = 0; // length of pieces[start..i] under `accounting`

    for i in 0..pieces.len() {
        let fits = |start: usize, total: usize| {
            start == i || total + glue_lengths[i] + lengths[i] <= config.chunk_size
        };
        // glue between piece `k` and its predecessor, if both stay in the run ending before `i`
        let inner_glue = |k: usize| if full && k < i { glue_lengths[k] } else { 0 };

        if !fits(start, total) {
            seal(&pieces[start..i], config, &mut chunks);

            let mut seed_start = i;
            let mut seed_total = 0;
            while seed_start > start && seed_total < config.chunk_overlap {
                seed_start -= 1;
                seed_total += lengths[seed_start] + inner_glue(seed_start + 1);
            }
            while !fits(seed_start, seed_total) {
                seed_total -= lengths[seed_start] + inner_glue(seed_start + 1);
                seed_start += 1;
            }
            trace!(seeded_pieces = i - seed_start, seeded_length = seed_total, "Seeded overlap");

            start = seed_start;
            total = seed_total;
        }

        if full && start < i {
            total += glue_lengths[i];
        }
        total += lengths[i];
    }

    if start < pieces.len() {
        seal(&pieces[start..], config, &mut chunks);
    }
    chunks
}

/// Joins `pieces` with their glue and pushes the result.
fn seal(pieces: &[Piece<'_>], config: &SplitterConfig, chunks: &mut Vec<String>) {
    let mut chunk = String::new();
    for (k, piece) in pieces.iter().enumerate() {
        if k > 0 {
            chunk.push_str(piece.glue);
        }
        chunk.push_str(piece.text);
    }

    let length = config.measure(&chunk);
    if length > config.chunk_size {
        warn!(
            chunk_length = length,
            chunk_size = config.chunk_size,
            "Created a chunk of size {}, which is longer than the specified {}",
            length,
            config.chunk_size
        );
    }

    if config.strip_whitespace {
        let trimmed = chunk.trim();
        if trimmed.is_empty() {
            trace!("Skipping whitespace-only chunk");
            return;
        }
        if trimmed.len() != chunk.len() {
            chunk = trimmed.to_string();
        }
    }
    chunks.push(chunk);
}
