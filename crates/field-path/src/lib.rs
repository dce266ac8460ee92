//! Field path addressing.
//!
//! Form fields name their state by dotted/bracketed paths such as
//! `user.addresses[0].city`. This crate normalizes those strings into a
//! segment list and resolves segments against `serde_json::Value` trees.
//!
//! # Example
//!
//! ```
//! use field_path::FieldPath;
//!
//! let path = FieldPath::parse("user.addresses[0].city").unwrap();
//! assert_eq!(path.segments(), ["user", "addresses", "0", "city"]);
//! assert_eq!(path.entire(), "user.addresses.0.city");
//! assert_eq!(path.to_pointer(), "/user/addresses/0/city");
//!
//! let doc = serde_json::json!({"user": {"addresses": [{"city": "Oslo"}]}});
//! assert_eq!(path.get(&doc), Some(&serde_json::json!("Oslo")));
//! ```

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

pub mod get;
pub mod util;

pub use get::{get, get_mut};
pub use util::{escape_component, format_pointer, is_child, is_valid_index, unescape_component};

/// Maximum number of segments a path may resolve to.
pub const MAX_PATH_LENGTH: usize = 256;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("empty segment at offset {0}")]
    EmptySegment(usize),
    #[error("unclosed bracket at offset {0}")]
    UnclosedBracket(usize),
    #[error("unexpected character {1:?} at offset {0}")]
    UnexpectedChar(usize, char),
    #[error("path too long")]
    PathTooLong,
    #[error("path has no parent")]
    NoParent,
}

/// A normalized field path.
///
/// The empty path addresses the root value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// The root path.
    pub fn root() -> Self {
        Self::default()
    }

    /// Build a path from already-split segments.
    pub fn from_segments<I, S>(segments: I) -> Result<Self, PathError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.len() > MAX_PATH_LENGTH {
            return Err(PathError::PathTooLong);
        }
        Ok(Self { segments })
    }

    /// Parse a dotted/bracketed path.
    ///
    /// Accepted forms: `a.b.c`, `a[0]`, `a['x.y']`, `a["x"]`, and any mix.
    /// A bare numeric dotted segment (`a.0`) is equivalent to `a[0]`.
    pub fn parse(input: &str) -> Result<Self, PathError> {
        let mut segments = Vec::new();
        let chars: Vec<(usize, char)> = input.char_indices().collect();
        let mut i = 0;
        let mut current = String::new();
        // Set after `]` so that `a[0].b` and `a[0][1]` do not produce empty segments.
        let mut after_bracket = false;

        while i < chars.len() {
            let (offset, ch) = chars[i];
            match ch {
                '.' => {
                    if current.is_empty() && !after_bracket {
                        return Err(PathError::EmptySegment(offset));
                    }
                    if !current.is_empty() {
                        segments.push(std::mem::take(&mut current));
                    }
                    after_bracket = false;
                    i += 1;
                    if i == chars.len() {
                        return Err(PathError::EmptySegment(input.len()));
                    }
                }
                '[' => {
                    if !current.is_empty() {
                        segments.push(std::mem::take(&mut current));
                    }
                    let (segment, next) = parse_bracket(&chars, i)?;
                    segments.push(segment);
                    after_bracket = true;
                    i = next;
                }
                ']' => return Err(PathError::UnexpectedChar(offset, ch)),
                _ => {
                    if after_bracket {
                        return Err(PathError::UnexpectedChar(offset, ch));
                    }
                    current.push(ch);
                    i += 1;
                }
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }
        Self::from_segments(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// First segment, i.e. the top-level state key this path lives under.
    pub fn head(&self) -> Option<&str> {
        self.segments.first().map(String::as_str)
    }

    /// Canonical dotted form used as a field name.
    pub fn entire(&self) -> String {
        self.segments.join(".")
    }

    /// RFC 6901 pointer form.
    pub fn to_pointer(&self) -> String {
        format_pointer(&self.segments)
    }

    pub fn parent(&self) -> Result<FieldPath, PathError> {
        if self.segments.is_empty() {
            return Err(PathError::NoParent);
        }
        Ok(FieldPath {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    pub fn child(&self, segment: impl Into<String>) -> FieldPath {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        FieldPath { segments }
    }

    /// Whether `other` lies strictly below this path.
    pub fn contains(&self, other: &FieldPath) -> bool {
        is_child(&self.segments, &other.segments)
    }

    pub fn get<'a>(&self, value: &'a serde_json::Value) -> Option<&'a serde_json::Value> {
        get(value, &self.segments)
    }

    pub fn get_mut<'a>(
        &self,
        value: &'a mut serde_json::Value,
    ) -> Option<&'a mut serde_json::Value> {
        get_mut(value, &self.segments)
    }
}

fn parse_bracket(chars: &[(usize, char)], open: usize) -> Result<(String, usize), PathError> {
    let open_offset = chars[open].0;
    let mut i = open + 1;
    let quote = match chars.get(i) {
        Some((_, q @ ('\'' | '"'))) => {
            i += 1;
            Some(*q)
        }
        Some(_) => None,
        None => return Err(PathError::UnclosedBracket(open_offset)),
    };
    let mut segment = String::new();
    loop {
        let Some(&(offset, ch)) = chars.get(i) else {
            return Err(PathError::UnclosedBracket(open_offset));
        };
        match quote {
            Some(q) if ch == q => {
                match chars.get(i + 1) {
                    Some((_, ']')) => return Ok((segment, i + 2)),
                    Some(&(o, c)) => return Err(PathError::UnexpectedChar(o, c)),
                    None => return Err(PathError::UnclosedBracket(open_offset)),
                }
            }
            None if ch == ']' => {
                let trimmed = segment.trim();
                if trimmed.is_empty() {
                    return Err(PathError::EmptySegment(offset));
                }
                return Ok((trimmed.to_string(), i + 1));
            }
            _ => {
                segment.push(ch);
                i += 1;
            }
        }
    }
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldPath::parse(s)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.entire())
    }
}
