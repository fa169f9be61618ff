use std::error::Error as StdError;
use std::future::Future;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error, instrument};

use crate::assembler::DocumentAssembler;
use crate::chunking::{ChunkerError, TextSplitter};
use crate::document::{Document, Metadata, LINE_NUMBER_KEY};

/// Boxed error returned by a failing [`TextSource`].
pub type SourceError = Box<dyn StdError + Send + Sync>;

#[derive(Debug, Error)]
pub enum LoaderError {
    /// The upstream text source failed. The underlying error is kept as the source;
    /// no retry is attempted.
    #[error("Text source unavailable: {0}")]
    SourceUnavailable(#[source] SourceError),

    /// Splitting the loaded text failed.
    #[error(transparent)]
    Split(#[from] ChunkerError),
}


/// Something that asynchronously produces the full text of one document,
/// e.g. a file, a network fetch or an in-memory string.
///
/// The loaders await `load_text` exactly once per load.
#[async_trait]
pub trait TextSource: Send + Sync {
    async fn load_text(&self) -> Result<String, SourceError>;
}

#[async_trait]
impl TextSource for String {
    async fn load_text(&self) -> Result<String, SourceError> {
        Ok(self.clone())
    }
}

#[async_trait]
impl TextSource for &'static str {
    async fn load_text(&self) -> Result<String, SourceError> {
        Ok(self.to_string())
    }
}

/// Awaits `source` and maps its failure to [`LoaderError::SourceUnavailable`].
pub(crate) async fn fetch<S: TextSource + ?Sized>(source: &S) -> Result<String, LoaderError> {
    source.load_text().await.map_err(|e| {
        error!(error = %e, "Text source failed");
        LoaderError::SourceUnavailable(e)
    })
}


/// A [`TextSource`] backed by an async closure.
pub struct FnSource<F> {
    load: F,
}

/// Wraps an async closure as a [`TextSource`].
///
/// ```ignore
/// let source = from_fn(|| async { Ok::<_, std::io::Error>("今日は\n朝から".to_string()) });
/// ```
pub fn from_fn<F, Fut, E>(load: F) -> FnSource<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<String, E>> + Send + 'static,
    E: Into<SourceError> + 'static,
{
    FnSource { load }
}

#[async_trait]
impl<F, Fut, E> TextSource for FnSource<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<String, E>> + Send + 'static,
    E: Into<SourceError> + 'static,
{
    async fn load_text(&self) -> Result<String, SourceError> {
        (self.load)().await.map_err(Into::into)
    }
}


/// A [`TextSource`] reading a UTF-8 file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TextSource for FileSource {
    async fn load_text(&self) -> Result<String, SourceError> {
        Ok(tokio::fs::read_to_string(&self.path).await?)
    }
}


/// Loads one [`Document`] per non-empty line of a text source.
///
/// Each document carries its 1-based line number in the source under
/// [`LINE_NUMBER_KEY`]; skipped empty lines still count.
pub struct LineLoader<S> {
    source: S,
}

impl<S: TextSource> LineLoader<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<Vec<Document>, LoaderError> {
        let text = fetch(&self.source).await?;

        let documents: Vec<Document> = text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.is_empty())
            .map(|(index, line)| {
                let mut metadata = Metadata::new();
                metadata.insert(LINE_NUMBER_KEY.to_string(), json!(index + 1));
                Document::with_metadata(line, metadata)
            })
            .collect();

        debug!(num_documents = documents.len(), "Loaded line documents");
        Ok(documents)
    }

    /// Loads the lines and re-splits each of them with `splitter`, keeping the
    /// line metadata on every resulting chunk.
    pub async fn load_and_split(&self, splitter: &dyn TextSplitter) -> Result<Vec<Document>, LoaderError> {
        let documents = self.load().await?;
        Ok(DocumentAssembler::new().split_documents(splitter, &documents)?)
    }
}
