use futures::future::try_join_all;
use serde_json::{json, Value};
use tracing::{debug, instrument, trace};

use crate::chunking::{ChunkerError, TextSplitter};
use crate::document::{Document, Metadata, LOC_KEY, START_INDEX_KEY};
use crate::loader::{fetch, LoaderError, TextSource};


/// Turns chunk strings into [`Document`]s.
///
/// By default every document carries exactly the metadata of the text it was
/// split from. Positional metadata is only added when requested:
///
/// * [`with_line_locations`](Self::with_line_locations) adds
///   `loc.lines.from`/`loc.lines.to`, the 1-based line range of the chunk.
/// * [`with_start_index`](Self::with_start_index) adds `startIndex`, the
///   character offset of the chunk.
///
/// Chunks are located by searching the source text left to right, so chunks
/// that do not occur verbatim (e.g. suffixed or trimmed ones) simply get no
/// positional keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentAssembler {
    line_locations: bool,
    start_index: bool,
}

impl DocumentAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_line_locations(mut self, enabled: bool) -> Self {
        self.line_locations = enabled;
        self
    }

    pub fn with_start_index(mut self, enabled: bool) -> Self {
        self.start_index = enabled;
        self
    }

    /// Wraps already computed chunks, giving each a copy of `metadata`.
    ///
    /// No source text is available here, so no positional metadata is added.
    pub fn assemble_chunks<I, S>(&self, chunks: I, metadata: &Metadata) -> Vec<Document>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        chunks
            .into_iter()
            .map(|chunk| Document::with_metadata(chunk, metadata.clone()))
            .collect()
    }

    /// Splits every text with `splitter` and assembles the chunks into documents.
    ///
    /// # Arguments
    ///
    /// * `splitter`: Any splitting policy.
    /// * `texts`: The source texts, processed in order.
    /// * `metadatas`: Either empty, or one metadata map per text which is
    ///                copied onto every chunk of that text.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<Document>)`: The documents of all texts, in source order.
    /// * `Err(ChunkerError::InvalidInput)`: If `metadatas` is non-empty and its
    ///                                     length differs from `texts`.
    /// * `Err(ChunkerError)`: Any error raised by the splitter.
    #[instrument(skip_all, fields(splitter = splitter.name(), num_texts = texts.len()))]
    pub fn create_documents<S: AsRef<str>>(
        &self,
        splitter: &dyn TextSplitter,
        texts: &[S],
        metadatas: &[Metadata],
    ) -> Result<Vec<Document>, ChunkerError> {
        if !metadatas.is_empty() && metadatas.len() != texts.len() {
            return Err(ChunkerError::InvalidInput(format!(
                "Got {} metadata entries for {} texts",
                metadatas.len(),
                texts.len()
            )));
        }

        let empty = Metadata::new();
        let mut documents = Vec::new();
        for (i, text) in texts.iter().enumerate() {
            let text = text.as_ref();
            let metadata = metadatas.get(i).unwrap_or(&empty);
            let chunks = splitter.split_text(text)?;
            trace!(text_index = i, num_chunks = chunks.len(), "Split text");
            documents.extend(self.assemble(text, chunks, metadata));
        }

        debug!(num_documents = documents.len(), "Assembled documents");
        Ok(documents)
    }

    /// Re-splits existing documents, keeping each document's metadata on its chunks.
    pub fn split_documents(
        &self,
        splitter: &dyn TextSplitter,
        documents: &[Document],
    ) -> Result<Vec<Document>, ChunkerError> {
        let mut result = Vec::new();
        for document in documents {
            let chunks = splitter.split_text(&document.content)?;
            result.extend(self.assemble(&document.content, chunks, &document.metadata));
        }
        Ok(result)
    }

    /// Awaits `source` once, then splits its text.
    pub async fn load_and_split<S: TextSource + ?Sized>(
        &self,
        source: &S,
        splitter: &dyn TextSplitter,
        metadata: &Metadata,
    ) -> Result<Vec<Document>, LoaderError> {
        let text = fetch(source).await?;
        Ok(self.create_documents(splitter, &[text], std::slice::from_ref(metadata))?)
    }

    /// Loads several independent sources concurrently, then splits them in the
    /// order given. The first failing source aborts the whole call.
    pub async fn load_and_split_all<S: TextSource>(
        &self,
        sources: &[S],
        splitter: &dyn TextSplitter,
    ) -> Result<Vec<Document>, LoaderError> {
        let texts = try_join_all(sources.iter().map(|source| fetch(source))).await?;
        Ok(self.create_documents(splitter, &texts, &[])?)
    }

    fn assemble(&self, text: &str, chunks: Vec<String>, metadata: &Metadata) -> Vec<Document> {
        if !self.line_locations && !self.start_index {
            return self.assemble_chunks(chunks, metadata);
        }

        let mut locator = ChunkLocator::new(text);
        chunks
            .into_iter()
            .map(|chunk| {
                let mut metadata = metadata.clone();
                match locator.locate(&chunk) {
                    Some(position) => self.add_position(&mut metadata, &position),
                    None => trace!(chunk = %chunk, "Chunk not found verbatim in source, no position added"),
                }
                Document::with_metadata(chunk, metadata)
            })
            .collect()
    }

    fn add_position(&self, metadata: &mut Metadata, position: &Position) {
        if self.line_locations {
            let lines = json!({ "from": position.line_from, "to": position.line_to });
            // Keep any caller supplied `loc` fields alongside the line range
            let loc = match metadata.remove(LOC_KEY) {
                Some(Value::Object(mut loc)) => {
                    loc.insert("lines".to_string(), lines);
                    Value::Object(loc)
                }
                _ => json!({ "lines": lines }),
            };
            metadata.insert(LOC_KEY.to_string(), loc);
        }
        if self.start_index {
            metadata.insert(START_INDEX_KEY.to_string(), json!(position.start_char));
        }
    }
}


struct Position {
    start_char: usize,
    line_from: usize,
    line_to: usize,
}

/// Finds successive chunks in their source text.
///
/// Each search starts one character after the previous match, so overlapping
/// chunks are found in order. Line and character counts are accumulated
/// incrementally between matches.
struct ChunkLocator<'a> {
    text: &'a str,
    search_from: usize,
    counted_to: usize,
    chars_before: usize,
    newlines_before: usize,
}

impl<'a> ChunkLocator<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            search_from: 0,
            counted_to: 0,
            chars_before: 0,
            newlines_before: 0,
        }
    }

    fn locate(&mut self, chunk: &str) -> Option<Position> {
        let found = self.search_from + self.text.get(self.search_from..)?.find(chunk)?;

        let skipped = &self.text[self.counted_to..found];
        self.chars_before += skipped.chars().count();
        self.newlines_before += skipped.matches('\n').count();
        self.counted_to = found;
        self.search_from = found + chunk.chars().next().map_or(1, char::len_utf8);

        let line_from = self.newlines_before + 1;
        Some(Position {
            start_char: self.chars_before,
            line_from,
            line_to: line_from + chunk.matches('\n').count(),
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    use crate::loader::from_fn;

    /// Splits on newlines and keeps every line as its own chunk.
    struct Lines;

    impl TextSplitter for Lines {
        fn split_text(&self, text: &str) -> Result<Vec<String>, ChunkerError> {
            Ok(text.lines().filter(|l| !l.is_empty()).map(str::to_string).collect())
        }
    }

    /// Fixed windows of three characters advancing by two.
    struct Windows;

    impl TextSplitter for Windows {
        fn split_text(&self, text: &str) -> Result<Vec<String>, ChunkerError> {
            let chars: Vec<char> = text.chars().collect();
            let mut out = Vec::new();
            let mut start = 0;
            while start < chars.len() {
                let end = (start + 3).min(chars.len());
                out.push(chars[start..end].iter().collect());
                if end == chars.len() {
                    break;
                }
                start += 2;
            }
            Ok(out)
        }
    }

    fn metadata(pairs: &[(&str, Value)]) -> Metadata {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn chunks_carry_only_shared_metadata_by_default() {
        let shared = metadata(&[("source", json!("a.txt"))]);
        let docs = DocumentAssembler::new()
            .create_documents(&Lines, &["one\ntwo"], &[shared.clone()])
            .unwrap();

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].content, "one");
        assert_eq!(docs[1].content, "two");
        assert_eq!(docs[0].metadata, shared);
        assert_eq!(docs[1].metadata, shared);
    }

    #[test]
    fn missing_metadata_means_empty_metadata() {
        let docs = DocumentAssembler::new()
            .create_documents(&Lines, &["a", "b"], &[])
            .unwrap();
        assert_eq!(docs.len(), 2);
        assert!(docs.iter().all(|d| d.metadata.is_empty()));
    }

    #[test]
    fn mismatched_metadata_is_rejected() {
        let err = DocumentAssembler::new()
            .create_documents(&Lines, &["a", "b"], &[Metadata::new()])
            .unwrap_err();
        assert!(matches!(err, ChunkerError::InvalidInput(_)));
    }

    #[test]
    fn assemble_chunks_copies_metadata() {
        let shared = metadata(&[("page", json!(4))]);
        let docs = DocumentAssembler::new().assemble_chunks(vec!["x", "y"], &shared);
        assert_eq!(docs, vec![
            Document::with_metadata("x", shared.clone()),
            Document::with_metadata("y", shared.clone()),
        ]);
    }

    #[test]
    fn line_locations_follow_the_source() {
        let text = "alpha\n\nbeta\ngamma";
        let docs = DocumentAssembler::new()
            .with_line_locations(true)
            .create_documents(&Lines, &[text], &[])
            .unwrap();

        let ranges: Vec<_> = docs.iter().map(|d| d.line_range().unwrap()).collect();
        assert_eq!(ranges, vec![(1, 1), (3, 3), (4, 4)]);
    }

    #[test]
    fn line_locations_merge_into_existing_loc() {
        let shared = metadata(&[(LOC_KEY, json!({"page": 2}))]);
        let docs = DocumentAssembler::new()
            .with_line_locations(true)
            .create_documents(&Lines, &["a\nb"], &[shared])
            .unwrap();

        assert_eq!(docs[1].get(LOC_KEY), Some(&json!({"page": 2, "lines": {"from": 2, "to": 2}})));
    }

    #[test]
    fn start_index_counts_characters_across_overlaps() {
        let text = "吾輩は猫である";
        let docs = DocumentAssembler::new()
            .with_start_index(true)
            .create_documents(&Windows, &[text], &[])
            .unwrap();

        let contents: Vec<&str> = docs.iter().map(|d| d.content.as_str()).collect();
        assert_eq!(contents, vec!["吾輩は", "は猫で", "である"]);
        let starts: Vec<_> = docs.iter().map(|d| d.start_index().unwrap()).collect();
        assert_eq!(starts, vec![0, 2, 4]);
    }

    #[test]
    fn unlocatable_chunks_get_no_position() {
        struct Shout;
        impl TextSplitter for Shout {
            fn split_text(&self, text: &str) -> Result<Vec<String>, ChunkerError> {
                Ok(vec![text.to_uppercase()])
            }
        }

        let docs = DocumentAssembler::new()
            .with_line_locations(true)
            .with_start_index(true)
            .create_documents(&Shout, &["quiet"], &[])
            .unwrap();
        assert_eq!(docs[0].content, "QUIET");
        assert!(docs[0].metadata.is_empty());
    }

    #[test]
    fn split_documents_keeps_metadata() {
        let source = Document::with_metadata("a\nb", metadata(&[("lineNumber", json!(7))]));
        let docs = DocumentAssembler::new().split_documents(&Lines, &[source]).unwrap();
        assert_eq!(docs.len(), 2);
        assert!(docs.iter().all(|d| d.line_number() == Some(7)));
    }

    #[tokio::test]
    async fn load_and_split_awaits_the_source() {
        let shared = metadata(&[("source", json!("memory"))]);
        let docs = DocumentAssembler::new()
            .load_and_split(&"x\ny".to_string(), &Lines, &shared)
            .await
            .unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].get("source"), Some(&json!("memory")));
    }

    #[tokio::test]
    async fn load_and_split_propagates_source_failure() {
        let source = from_fn(|| async { Err::<String, _>(io::Error::other("timeout")) });
        let err = DocumentAssembler::new()
            .load_and_split(&source, &Lines, &Metadata::new())
            .await
            .unwrap_err();
        assert!(matches!(err, LoaderError::SourceUnavailable(_)));
    }

    #[tokio::test]
    async fn load_and_split_all_keeps_source_order() {
        let sources = vec!["one\ntwo".to_string(), "three".to_string()];
        let docs = DocumentAssembler::new()
            .load_and_split_all(&sources, &Lines)
            .await
            .unwrap();
        let contents: Vec<&str> = docs.iter().map(|d| d.content.as_str()).collect();
        assert_eq!(contents, vec!["one", "two", "three"]);
    }
}
