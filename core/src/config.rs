use std::{borrow::Cow, fmt, sync::Arc};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chunking::ChunkerError;

pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;
pub const DEFAULT_SEPARATOR: &str = "\n\n";

/// Paragraphs, then lines, then words, then single characters.
pub const RECURSIVE_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Environment variables read by [`SplitterConfig::from_env`].
pub const ENV_CHUNK_SIZE: &str = "CHUNK_SIZE";
pub const ENV_CHUNK_OVERLAP: &str = "CHUNK_OVERLAP";
pub const ENV_SEPARATORS: &str = "CHUNK_SEPARATORS";
pub const ENV_KEEP_SEPARATOR: &str = "CHUNK_KEEP_SEPARATOR";
pub const ENV_STRIP_WHITESPACE: &str = "CHUNK_STRIP_WHITESPACE";


/// Measures the size of a piece of text.
///
/// Chunk sizes and overlaps are expressed in whatever unit this function
/// returns. The default counts Unicode scalar values, so multi-byte scripts
/// are measured in characters rather than bytes.
#[derive(Clone)]
pub struct LengthFunction {
    name: Cow<'static, str>,
    measure: Arc<dyn Fn(&str) -> usize + Send + Sync>,
}

impl LengthFunction {
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        measure: impl Fn(&str) -> usize + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            measure: Arc::new(measure),
        }
    }

    /// Counts Unicode scalar values.
    pub fn chars() -> Self {
        Self::new("chars", |text| text.chars().count())
    }

    /// Counts UTF-8 bytes.
    pub fn bytes() -> Self {
        Self::new("bytes", str::len)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn measure(&self, text: &str) -> usize {
        (self.measure)(text)
    }
}

impl Default for LengthFunction {
    fn default() -> Self {
        Self::chars()
    }
}

impl fmt::Debug for LengthFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LengthFunction").field(&self.name).finish()
    }
}


/// Configuration shared by the size-bounded splitters.
///
/// The plain-data fields can be deserialized from any serde format (missing
/// fields take their defaults) or read from the environment with
/// [`SplitterConfig::from_env`]. The length function is not serializable and
/// always starts out as [`LengthFunction::chars`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitterConfig {
    /// Separators ordered from coarsest to finest. The character splitter
    /// only uses the first entry.
    pub separators: Vec<String>,
    /// Maximum chunk size, as measured by `length_function`.
    pub chunk_size: usize,
    /// Amount of trailing content of one chunk repeated at the start of the next.
    pub chunk_overlap: usize,
    /// Keep separators attached to the pieces they terminate instead of
    /// re-inserting them between merged pieces.
    pub keep_separator: bool,
    /// Trim every chunk and drop chunks that end up empty.
    pub strip_whitespace: bool,
    #[serde(skip)]
    pub length_function: LengthFunction,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            separators: vec![DEFAULT_SEPARATOR.to_string()],
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            keep_separator: false,
            strip_whitespace: false,
            length_function: LengthFunction::default(),
        }
    }
}

impl SplitterConfig {
    /// Creates a configuration with the given size bounds and default
    /// separator settings. Call [`validate`](Self::validate) (or hand it to a
    /// splitter constructor) to check the bounds.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
            ..Self::default()
        }
    }

    /// Defaults for recursive splitting: the full paragraph/line/word/character
    /// hierarchy with separators kept attached to their pieces.
    pub fn recursive() -> Self {
        Self {
            separators: RECURSIVE_SEPARATORS.iter().map(|s| s.to_string()).collect(),
            keep_separator: true,
            ..Self::default()
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_chunk_overlap(mut self, chunk_overlap: usize) -> Self {
        self.chunk_overlap = chunk_overlap;
        self
    }

    pub fn with_separator(self, separator: impl Into<String>) -> Self {
        self.with_separators([separator])
    }

    pub fn with_separators<I, S>(mut self, separators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.separators = separators.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_keep_separator(mut self, keep_separator: bool) -> Self {
        self.keep_separator = keep_separator;
        self
    }

    pub fn with_strip_whitespace(mut self, strip_whitespace: bool) -> Self {
        self.strip_whitespace = strip_whitespace;
        self
    }

    pub fn with_length_function(mut self, length_function: LengthFunction) -> Self {
        self.length_function = length_function;
        self
    }

    /// Measures `text` with the configured length function.
    pub fn measure(&self, text: &str) -> usize {
        self.length_function.measure(text)
    }

    /// Checks the size bounds.
    ///
    /// # Returns
    ///
    /// * `Ok(())`: The bounds are usable.
    /// * `Err(ChunkerError::InvalidConfig)`: If `chunk_size` is 0 or `chunk_overlap`
    ///                                      is greater than or equal to `chunk_size`.
    pub fn validate(&self) -> Result<(), ChunkerError> {
        if self.chunk_size == 0 {
            return Err(ChunkerError::InvalidConfig(
                "Chunk size must be greater than 0".to_string(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(ChunkerError::InvalidConfig(format!(
                "Chunk overlap ({}) must be less than chunk size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }

    /// Reads a configuration from the process environment, loading a `.env`
    /// file first if one is present.
    ///
    /// Unset variables keep their default values. `CHUNK_SEPARATORS` is a JSON
    /// array of strings, e.g. `["\n\n", "\n", " ", ""]`.
    pub fn from_env() -> Result<Self, ChunkerError> {
        dotenv::dotenv().ok(); // Load .env file if present
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup, using the same
    /// variable names as [`from_env`](Self::from_env).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ChunkerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_CHUNK_SIZE) {
            config.chunk_size = parse_usize(ENV_CHUNK_SIZE, &value)?;
        }
        if let Some(value) = lookup(ENV_CHUNK_OVERLAP) {
            config.chunk_overlap = parse_usize(ENV_CHUNK_OVERLAP, &value)?;
        }
        if let Some(value) = lookup(ENV_SEPARATORS) {
            config.separators = serde_json::from_str(&value).map_err(|e| {
                ChunkerError::InvalidConfig(format!(
                    "{} must be a JSON array of strings: {}",
                    ENV_SEPARATORS, e
                ))
            })?;
        }
        if let Some(value) = lookup(ENV_KEEP_SEPARATOR) {
            config.keep_separator = parse_bool(ENV_KEEP_SEPARATOR, &value)?;
        }
        if let Some(value) = lookup(ENV_STRIP_WHITESPACE) {
            config.strip_whitespace = parse_bool(ENV_STRIP_WHITESPACE, &value)?;
        }

        config.validate()?;
        debug!(
            chunk_size = config.chunk_size,
            chunk_overlap = config.chunk_overlap,
            separators = ?config.separators,
            "Loaded splitter configuration"
        );
        Ok(config)
    }
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ChunkerError> {
    value.trim().parse().map_err(|_| {
        ChunkerError::InvalidConfig(format!(
            "{} must be a non-negative integer, got {:?}",
            key, value
        ))
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ChunkerError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ChunkerError::InvalidConfig(format!(
            "{} must be a boolean, got {:?}",
            key, value
        ))),
    }
}
