use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Metadata attached to a [`Document`]. Key order carries no meaning.
pub type Metadata = serde_json::Map<String, Value>;

/// 1-based source line of a document produced by the line loader.
pub const LINE_NUMBER_KEY: &str = "lineNumber";

/// Line range of a chunk within its source text: `{"lines": {"from": n, "to": m}}`.
pub const LOC_KEY: &str = "loc";

/// Character offset of a chunk within its source text.
pub const START_INDEX_KEY: &str = "startIndex";


/// One retrievable unit of text together with its metadata.
///
/// Documents are produced by the document assembler and the loaders; the
/// library never modifies a document after handing it out.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Document {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(content: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }

    /// Looks up a metadata value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    /// The `lineNumber` metadata value, if present.
    pub fn line_number(&self) -> Option<u64> {
        self.get(LINE_NUMBER_KEY).and_then(Value::as_u64)
    }

    /// The `(from, to)` line range stored under `loc.lines`, if present.
    pub fn line_range(&self) -> Option<(u64, u64)> {
        let lines = self.get(LOC_KEY)?.get("lines")?;
        Some((lines.get("from")?.as_u64()?, lines.get("to")?.as_u64()?))
    }

    /// The `startIndex` metadata value, if present.
    pub fn start_index(&self) -> Option<u64> {
        self.get(START_INDEX_KEY).and_then(Value::as_u64)
    }
}
