//! Per-item stage definitions for the fetch-parse-store pipeline
//!
//! Every story link moves through the same linear sequence of stages. Only the
//! fetch step can fail; everything after it either completes or the pipeline
//! aborts on a storage error.
use std::fmt;

/// Represents how far a single story link has progressed through the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemStage {
    /// Link is waiting to be fetched
    Pending,

    /// Raw page bytes have been downloaded
    Fetched,

    /// Story paragraphs and quotes have been extracted
    Parsed,

    /// Page record has been inserted into the collection
    Persisted,

    /// Post-item delay has elapsed
    Paced,
}

impl ItemStage {
    /// Returns the stage that follows this one, or None for the final stage
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Pending => Some(Self::Fetched),
            Self::Fetched => Some(Self::Parsed),
            Self::Parsed => Some(Self::Persisted),
            Self::Persisted => Some(Self::Paced),
            Self::Paced => None,
        }
    }

    /// Returns true if moving from this stage to `to` is a legal transition
    pub fn can_transition_to(&self, to: Self) -> bool {
        self.next() == Some(to)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fetched => "fetched",
            Self::Parsed => "parsed",
            Self::Persisted => "persisted",
            Self::Paced => "paced",
        }
    }
}

impl fmt::Display for ItemStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
