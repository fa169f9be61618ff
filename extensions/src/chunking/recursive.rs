use chunkwise_core::{ChunkerError, SplitterConfig, TextSplitter};
use tracing::{debug, instrument, trace};

use super::merge::{merge_pieces, whole_text, GlueAccounting, Piece};
use super::separator::split_on_separator;


/// Splits text along a hierarchy of separators, from coarse to fine.
///
/// The text is first cut with the coarsest separator that occurs in it; any
/// piece still longer than `chunk_size` is cut again with the finer
/// separators, and finally into single characters once the list is used up.
/// The resulting pieces are then merged back into chunks of at most
/// `chunk_size`, glue included, with `chunk_overlap` of trailing context
/// repeated between chunks. Only a single character measuring more than
/// `chunk_size` can produce a longer chunk.
#[derive(Debug, Clone)]
pub struct RecursiveCharacterTextSplitter {
    config: SplitterConfig,
}

impl RecursiveCharacterTextSplitter {
    /// Creates a new `RecursiveCharacterTextSplitter` instance.
    ///
    /// # Returns
    ///
    /// * `Ok(RecursiveCharacterTextSplitter)`: The configured splitter.
    /// * `Err(ChunkerError::InvalidConfig)`: If the size bounds are invalid or
    ///                                      `config.separators` is empty.
    pub fn new(config: SplitterConfig) -> Result<Self, ChunkerError> {
        config.validate()?;
        if config.separators.is_empty() {
            return Err(ChunkerError::InvalidConfig(
                "Recursive splitter needs at least one separator".to_string(),
            ));
        }
        Ok(Self { config })
    }

    /// Uses the default separator hierarchy (`"\n\n"`, `"\n"`, `" "`, `""`)
    /// with separators kept attached to their pieces.
    pub fn with_defaults(chunk_size: usize, chunk_overlap: usize) -> Result<Self, ChunkerError> {
        Self::new(
            SplitterConfig::recursive()
                .with_chunk_size(chunk_size)
                .with_chunk_overlap(chunk_overlap),
        )
    }

    pub fn config(&self) -> &SplitterConfig {
        &self.config
    }
}

impl TextSplitter for RecursiveCharacterTextSplitter {
    #[instrument(skip(self, text), fields(text_len = text.len(), chunk_size = self.config.chunk_size))]
    fn split_text(&self, text: &str) -> Result<Vec<String>, ChunkerError> {
        if let Some(chunks) = whole_text(text, &self.config) {
            trace!("Text fits in a single chunk");
            return Ok(chunks);
        }

        let pieces = decompose(text, &self.config.separators, &self.config);
        let chunks = merge_pieces(&pieces, &self.config, GlueAccounting::Full);

        debug!(num_pieces = pieces.len(), num_chunks = chunks.len(), "Recursive splitting finished");
        Ok(chunks)
    }

    fn name(&self) -> &str {
        "recursive"
    }
}

/// Breaks `text` into pieces no longer than `config.chunk_size`, trying
/// `separators` in order.
///
/// Each piece carries the glue of the level that produced it. Once the
/// separators run out, oversized pieces are split per character, so only a
/// single character can be returned oversized.
pub fn decompose<'a>(text: &'a str, separators: &'a [String], config: &SplitterConfig) -> Vec<Piece<'a>> {
    let mut pieces = Vec::new();
    decompose_into(text, separators, "", config, &mut pieces);
    pieces
}

fn decompose_into<'a>(
    text: &'a str,
    separators: &'a [String],
    leading_glue: &'a str,
    config: &SplitterConfig,
    out: &mut Vec<Piece<'a>>,
) {
    let (separator, finer) = select_separator(text, separators);
    let glue = if config.keep_separator { "" } else { separator };
    trace!(separator, remaining = finer.len(), "Decomposing text");

    for (k, piece) in split_on_separator(text, separator, config.keep_separator).enumerate() {
        // the first piece re-joins whatever preceded the text being split
        let piece_glue = if k == 0 { leading_glue } else { glue };

        if separator.is_empty() || config.measure(piece) <= config.chunk_size {
            out.push(Piece::new(piece, piece_glue));
        } else {
            decompose_into(piece, finer, piece_glue, config, out);
        }
    }
}

/// Picks the separator to split `text` with and the finer separators left
/// for its oversized pieces.
///
/// `""` matches any text and leaves nothing finer. When no separator occurs in
/// `text`, including when `separators` is empty, it is split per character.
fn select_separator<'a>(text: &str, separators: &'a [String]) -> (&'a str, &'a [String]) {
    for (i, separator) in separators.iter().enumerate() {
        if separator.is_empty() {
            return ("", &[]);
        }
        if text.contains(separator.as_str()) {
            return (separator.as_str(), &separators[i + 1..]);
        }
    }
    ("", &[])
}


#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::{fmt, EnvFilter};

    const NEKO: &str = "吾輩は猫である。名前はまだない。どこで生れたか頓と見当がつかぬ。何でも薄暗いじめじめした所でニャーニャー泣いていた事だけは記憶している。";

    fn setup_tracing() {
        let _ = fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn separators(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_new_rejects_empty_separator_list() {
        let config = SplitterConfig::recursive().with_chunk_size(10).with_chunk_overlap(0);
        let err = RecursiveCharacterTextSplitter::new(config.with_separators(Vec::<String>::new())).unwrap_err();
        assert!(matches!(err, ChunkerError::InvalidConfig(_)));
    }

    #[test]
    fn test_new_rejects_invalid_bounds() {
        assert!(RecursiveCharacterTextSplitter::with_defaults(0, 0).is_err());
        assert!(RecursiveCharacterTextSplitter::with_defaults(10, 10).is_err());
        assert!(RecursiveCharacterTextSplitter::with_defaults(10, 9).is_ok());
    }

    #[test]
    fn test_select_separator() {
        let list = separators(&["\n\n", "\n", " ", ""]);
        let (sep, finer) = select_separator("a b\nc", &list);
        assert_eq!(sep, "\n");
        assert_eq!(finer, &list[2..]);

        let (sep, finer) = select_separator("abc", &list);
        assert_eq!(sep, "");
        assert!(finer.is_empty());

        let unmatched = separators(&["|", "-"]);
        let (sep, finer) = select_separator("abc", &unmatched);
        assert_eq!(sep, "");
        assert!(finer.is_empty());

        let (sep, finer) = select_separator("abc", &[]);
        assert_eq!(sep, "");
        assert!(finer.is_empty());
    }

    #[test]
    fn test_decompose_recurses_only_into_oversized_pieces() {
        let config = SplitterConfig::recursive().with_chunk_size(6).with_chunk_overlap(0);
        let list = separators(&["\n", " ", ""]);
        let pieces = decompose("short\nfar too long", &list, &config);
        let texts: Vec<&str> = pieces.iter().map(|p| p.text).collect();
        assert_eq!(texts, vec!["short\n", "far ", "too ", "long"]);
        assert!(pieces.iter().all(|p| p.glue.is_empty()));
    }

    #[test]
    fn test_decompose_falls_back_to_characters_once_separators_run_out() {
        let config = SplitterConfig::new(4, 0).with_separators([" "]);
        let list = separators(&[" "]);
        let pieces = decompose("ab abcdefgh cd", &list, &config);
        let texts: Vec<&str> = pieces.iter().map(|p| p.text).collect();
        assert_eq!(texts, vec!["ab", "a", "b", "c", "d", "e", "f", "g", "h", "cd"]);
        assert_eq!(pieces[1].glue, " ");
        assert_eq!(pieces[2].glue, "");
    }

    #[test]
    fn test_oversized_word_is_split_the_same_alone_or_between_words() {
        let chunker = RecursiveCharacterTextSplitter::new(SplitterConfig::new(4, 0).with_separators([" "])).unwrap();
        assert_eq!(chunker.split_text("abcdefgh").unwrap(), vec!["abcd", "efgh"]);
        assert_eq!(chunker.split_text("ab abcdefgh cd").unwrap(), vec!["ab a", "bcde", "fgh", "cd"]);
    }

    #[test]
    fn test_dropped_separators_count_toward_chunk_size() {
        setup_tracing();
        let config = SplitterConfig::new(5, 0).with_separators([" ", ""]);
        let chunker = RecursiveCharacterTextSplitter::new(config).unwrap();
        let chunks = chunker.split_text("a b c d e f g h").unwrap();
        assert_eq!(chunks, vec!["a b c", "d e f", "g h"]);
        assert!(chunks.iter().all(|c| c.chars().count() <= 5));
    }

    #[test]
    fn test_short_text_is_returned_verbatim() {
        let config = SplitterConfig::new(20, 5).with_separators(["。"]);
        let chunker = RecursiveCharacterTextSplitter::new(config).unwrap();
        assert_eq!(chunker.split_text("短い文章です。").unwrap(), vec!["短い文章です。"]);
    }

    #[test]
    fn test_decompose_glue_follows_producing_level() {
        let config = SplitterConfig::new(5, 0).with_separators(["\n", " "]);
        let list = separators(&["\n", " "]);
        let pieces = decompose("aa\nbb cc dd", &list, &config);
        assert_eq!(
            pieces,
            vec![
                Piece::new("aa", ""),
                Piece::new("bb", "\n"),
                Piece::new("cc", " "),
                Piece::new("dd", " "),
            ]
        );
    }

    #[test]
    fn test_split_without_kept_separators_rejoins_with_level_separator() {
        setup_tracing();
        let config = SplitterConfig::new(5, 0).with_separators(["\n", " "]);
        let chunker = RecursiveCharacterTextSplitter::new(config).unwrap();
        assert_eq!(chunker.split_text("aa\nbb cc dd").unwrap(), vec!["aa\nbb", "cc dd"]);
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunker = RecursiveCharacterTextSplitter::with_defaults(100, 20).unwrap();
        let text = "Short paragraph.\n\nAnother one.";
        assert_eq!(chunker.split_text(text).unwrap(), vec![text]);
    }

    #[test]
    fn test_empty_text() {
        let chunker = RecursiveCharacterTextSplitter::with_defaults(10, 2).unwrap();
        assert!(chunker.split_text("").unwrap().is_empty());
    }

    #[test]
    fn test_per_character_windows_with_overlap() {
        setup_tracing();
        let chunker = RecursiveCharacterTextSplitter::with_defaults(20, 10).unwrap();
        let chunks = chunker.split_text(NEKO).unwrap();

        assert_eq!(chunks.len(), 6);
        assert_eq!(chunks[0], "吾輩は猫である。名前はまだない。どこで生");
        assert_eq!(chunks[1], "はまだない。どこで生れたか頓と見当がつか");
        assert_eq!(chunks[5], "ャー泣いていた事だけは記憶している。");
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 20);
        }
    }

    #[test]
    fn test_paragraphs_are_preferred_boundaries() {
        let chunker = RecursiveCharacterTextSplitter::with_defaults(20, 0).unwrap();
        let text = "first paragraph\n\nsecond paragraph";
        assert_eq!(chunker.split_text(text).unwrap(), vec!["first paragraph\n\n", "second paragraph"]);
    }

    #[test]
    fn test_size_invariant_holds_when_characters_are_available() {
        let chunker = RecursiveCharacterTextSplitter::with_defaults(12, 3).unwrap();
        let text = "The quick brown fox\njumps over the lazy dog.\n\nPack my box with five dozen liquor jugs.";
        for chunk in chunker.split_text(text).unwrap() {
            assert!(chunk.chars().count() <= 12, "chunk too long: {:?}", chunk);
        }
    }
}
