//! Core types for chunkwise.
//!
//! * [`chunking`]: the [`TextSplitter`] capability every splitting policy implements,
//!   and [`ChunkerError`].
//! * [`config`]: [`SplitterConfig`] and the pluggable [`LengthFunction`].
//! * [`document`]: the [`Document`] value handed to indexing code.
//! * [`assembler`]: turning chunks into documents.
//! * [`loader`]: asynchronous text sources and the line loader.
//!
//! Concrete splitters live in the `chunkwise_extensions` crate.

pub mod assembler;
pub mod chunking;
pub mod config;
pub mod document;
pub mod loader;

pub use assembler::DocumentAssembler;
pub use chunking::{ChunkerError, TextSplitter};
pub use config::{LengthFunction, SplitterConfig};
pub use document::{Document, Metadata};
pub use loader::{FileSource, FnSource, LineLoader, LoaderError, SourceError, TextSource, from_fn};
