use chunkwise_core::{ChunkerError, SplitterConfig, TextSplitter};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

pub mod character;
pub mod merge;
pub mod recursive;
pub mod separator;
pub mod suffix;
pub mod token;

use character::CharacterTextSplitter;
use recursive::RecursiveCharacterTextSplitter;
use suffix::SuffixTextSplitter;
use token::{TokenEncoding, TokenTextSplitter};

pub const ENV_SPLITTER: &str = "CHUNK_SPLITTER";
pub const ENV_SUFFIX: &str = "CHUNK_SUFFIX";
pub const ENV_ENCODING: &str = "CHUNK_ENCODING";


/// Which splitting policy to build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SplitterKind {
    #[default]
    Character,
    Recursive,
    Suffix {
        suffix: String,
    },
    Token {
        #[serde(default)]
        encoding: TokenEncoding,
    },
}

impl SplitterKind {
    /// Reads the policy from `CHUNK_SPLITTER` (`character`, `recursive`,
    /// `suffix` or `token`), with `CHUNK_SUFFIX` and `CHUNK_ENCODING` for the
    /// policies that need them.
    pub fn from_env() -> Result<Self, ChunkerError> {
        dotenv::dotenv().ok(); // Load .env file if present
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ChunkerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let Some(kind) = lookup(ENV_SPLITTER) else {
            return Ok(Self::default());
        };
        match kind.trim() {
            "character" => Ok(SplitterKind::Character),
            "recursive" => Ok(SplitterKind::Recursive),
            "suffix" => Ok(SplitterKind::Suffix {
                suffix: lookup(ENV_SUFFIX).unwrap_or_default(),
            }),
            "token" => Ok(SplitterKind::Token {
                encoding: match lookup(ENV_ENCODING) {
                    Some(name) => name.parse()?,
                    None => TokenEncoding::default(),
                },
            }),
            other => Err(ChunkerError::InvalidConfig(format!(
                "{} must be one of character, recursive, suffix or token, got {:?}",
                ENV_SPLITTER, other
            ))),
        }
    }
}

/// Builds the splitter selected by `kind`.
///
/// The suffix splitter uses the first configured separator (or `""`) and
/// ignores the size bounds. The token splitter only uses the size bounds.
pub fn build_splitter(kind: &SplitterKind, config: SplitterConfig) -> Result<Box<dyn TextSplitter>, ChunkerError> {
    let splitter: Result<Box<dyn TextSplitter>, ChunkerError> = match kind {
        SplitterKind::Character => CharacterTextSplitter::new(config).map(|s| Box::new(s) as _),
        SplitterKind::Recursive => RecursiveCharacterTextSplitter::new(config).map(|s| Box::new(s) as _),
        SplitterKind::Suffix { suffix } => {
            let separator = config.separators.first().cloned().unwrap_or_default();
            Ok(Box::new(SuffixTextSplitter::new(separator, suffix.clone())))
        }
        SplitterKind::Token { encoding } => {
            TokenTextSplitter::from_config(*encoding, &config).map(|s| Box::new(s) as _)
        }
    };

    match &splitter {
        Ok(s) => debug!(splitter = s.name(), "Built splitter"),
        Err(e) => error!("Error creating splitter: {:?}", e),
    }
    splitter
}
