//! Feed names and feed lists
//!
//! A subscribe or publish call targets one feed or an ordered list of feeds.
//! Duplicates are preserved: a name listed twice is handled twice.

use std::fmt;

/// Feed used when a caller does not name one
pub const DEFAULT_FEED: &str = "default feed";

/// Ordered list of feed names targeted by one call
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Feeds(Vec<String>);

impl Feeds {
    /// Create a feed list from any iterator of names
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    /// A list containing a single feed
    pub fn one(name: impl Into<String>) -> Self {
        Self(vec![name.into()])
    }

    /// A list targeting no feed at all
    pub fn none() -> Self {
        Self(Vec::new())
    }

    /// Iterate over the names, in order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Number of names (duplicates included)
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the list names no feed
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for Feeds {
    fn default() -> Self {
        Self::one(DEFAULT_FEED)
    }
}

impl fmt::Display for Feeds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

impl From<&str> for Feeds {
    fn from(name: &str) -> Self {
        Self::one(name)
    }
}

impl From<String> for Feeds {
    fn from(name: String) -> Self {
        Self::one(name)
    }
}

impl From<&String> for Feeds {
    fn from(name: &String) -> Self {
        Self::one(name.clone())
    }
}

impl<S: Into<String>> From<Vec<S>> for Feeds {
    fn from(names: Vec<S>) -> Self {
        Self::new(names)
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for Feeds {
    fn from(names: [S; N]) -> Self {
        Self::new(names)
    }
}

impl From<&[&str]> for Feeds {
    fn from(names: &[&str]) -> Self {
        Self::new(names.iter().copied())
    }
}

impl IntoIterator for Feeds {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
