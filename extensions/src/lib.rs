//! Splitting policies for chunkwise.
//!
//! Every splitter here implements [`chunkwise_core::TextSplitter`], so it can be
//! handed to a [`chunkwise_core::DocumentAssembler`] or a
//! [`chunkwise_core::LineLoader`].

pub mod chunking;

pub use chunking::character::CharacterTextSplitter;
pub use chunking::merge::{merge_pieces, Piece};
pub use chunking::recursive::{decompose, RecursiveCharacterTextSplitter};
pub use chunking::separator::{split_on_separator, SeparatorSplit};
pub use chunking::suffix::SuffixTextSplitter;
pub use chunking::token::{tiktoken_length, TokenEncoding, TokenTextSplitter};
pub use chunking::{build_splitter, SplitterKind};
