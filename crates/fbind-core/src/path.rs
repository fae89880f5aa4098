#![forbid(unsafe_code)]

//! Dot-separated expression paths (`user.profile.name`).

use std::fmt;

use smallvec::SmallVec;

use crate::error::{BindError, Result};

/// A parsed expression path: a non-empty sequence of property keys.
///
/// ```
/// use fbind_core::Path;
///
/// let path = Path::parse(" user.name ").unwrap();
/// assert_eq!(path.segments(), ["user", "name"]);
/// assert_eq!(path.to_string(), "user.name");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Path {
    segments: SmallVec<[String; 4]>,
}

impl Path {
    /// Parse `expr`, trimming whitespace around the expression and each segment.
    pub fn parse(expr: &str) -> Result<Self> {
        let trimmed = expr.trim();
        let segments: SmallVec<[String; 4]> =
            trimmed.split('.').map(|s| s.trim().to_owned()).collect();
        if trimmed.is_empty() || segments.iter().any(String::is_empty) {
            return Err(BindError::InvalidPath {
                expr: expr.to_owned(),
            });
        }
        Ok(Self { segments })
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The first key (the top-level property the path starts from).
    #[must_use]
    pub fn head(&self) -> &str {
        &self.segments[0]
    }

    /// Split into parent segments and the final key.
    #[must_use]
    pub fn split_last(&self) -> (&[String], &str) {
        let (last, parent) = self
            .segments
            .split_last()
            .map(|(l, p)| (l.as_str(), p))
            .unwrap_or(("", &[]));
        (parent, last)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always false; parsing rejects empty paths.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

impl std::str::FromStr for Path {
    type Err = BindError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
