//! Step keywords recognised in feature documents

use serde::{Deserialize, Serialize};
use std::fmt;

/// Keyword that opens a step line.
///
/// Matching is exact-case: `given` is not a keyword here. The tabulator does
/// its own case-insensitive match and only consults this type to decide
/// whether a step continues an assertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepKeyword {
    Given,
    When,
    Then,
    And,
    But,
}

impl StepKeyword {
    /// All keywords in declaration order
    pub const ALL: [StepKeyword; 5] = [
        StepKeyword::Given,
        StepKeyword::When,
        StepKeyword::Then,
        StepKeyword::And,
        StepKeyword::But,
    ];

    /// Return the keyword as written in a document
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Given => "Given",
            Self::When => "When",
            Self::Then => "Then",
            Self::And => "And",
            Self::But => "But",
        }
    }

    /// Parse an exact-case keyword
    pub fn from_exact(word: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == word)
    }

    /// `Given`, `When` and `Then` open a new step group; `And`/`But` continue one
    pub fn is_primary(&self) -> bool {
        matches!(self, Self::Given | Self::When | Self::Then)
    }

    /// Split a trimmed line into its keyword and the rest of the step.
    ///
    /// The keyword must be followed by at least one whitespace character,
    /// so `Givenness` and a bare `Given` are not steps.
    pub fn split_step(line: &str) -> Option<(Self, &str)> {
        Self::ALL.into_iter().find_map(|keyword| {
            let rest = line.strip_prefix(keyword.as_str())?;
            rest.starts_with(char::is_whitespace)
                .then(|| (keyword, rest.trim_start()))
        })
    }
}

impl fmt::Display for StepKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
