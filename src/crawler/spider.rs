use clap::ValueEnum;
use std::fmt;

/// A story source the crawler knows how to walk
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Spider {
    /// Aesop's fables from the Library of Congress
    Aesop,
}

impl Spider {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Aesop => "aesop",
        }
    }
}

impl fmt::Display for Spider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
