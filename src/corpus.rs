//! Reference quotes used to steer the tone of inspired quotes.

use std::io::ErrorKind;
use std::path::Path;

use tracing::{info, warn};

use crate::constants::DEFAULT_REFERENCE_QUOTES;

/// Read-only list of example quotes, loaded once at startup.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReferenceCorpus {
    quotes: Vec<String>,
}

impl ReferenceCorpus {
    /// Loads one quote per line from `path`, falling back to the built-in list when
    /// the file is missing, unreadable or has no quotes in it.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                let corpus = Self::parse(&contents);
                if corpus.is_empty() {
                    warn!("Corpus {} has no quotes, using built-in list", path.display());
                    return Self::builtin();
                }
                info!("Loaded {} reference quotes from {}", corpus.len(), path.display());
                corpus
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!("No corpus at {}, using built-in list", path.display());
                Self::builtin()
            }
            Err(err) => {
                warn!("Failed to read corpus {}: {}", path.display(), err);
                Self::builtin()
            }
        }
    }

    /// Parses corpus text: trimmed lines, blank lines skipped.
    pub fn parse(contents: &str) -> Self {
        Self::from_quotes(
            contents
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    /// The fallback list shipped with the binary.
    pub fn builtin() -> Self {
        Self::from_quotes(
            DEFAULT_REFERENCE_QUOTES
                .iter()
                .map(|quote| quote.to_string())
                .collect(),
        )
    }

    /// Wraps an existing list.
    pub fn from_quotes(quotes: Vec<String>) -> Self {
        Self { quotes }
    }

    /// Number of quotes.
    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    /// True when there are no quotes.
    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// Picks `min(k, len)` distinct quotes at random.
    pub fn sample(&self, k: usize) -> Vec<&str> {
        let amount = k.min(self.quotes.len());
        rand::seq::index::sample(&mut rand::rng(), self.quotes.len(), amount)
            .into_iter()
            .map(|idx| self.quotes[idx].as_str())
            .collect()
    }
}
