//! Field paths
//!
//! A `FieldPath` addresses a field inside a document, possibly descending into
//! embedded documents and embedded lists:
//!
//! | Syntax | Meaning |
//! |--------|---------|
//! | `name` | Top-level field |
//! | `child.name` | Field of an embedded document |
//! | `children.1.name` | Field of element 1 of an embedded list |
//! | `children[1].name` | Same, bracket form |
//!
//! Paths always render in the dotted form, which is also the form used in
//! persistence diffs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Maximum path length in segments
pub const MAX_PATH_LENGTH: usize = 64;

/// Error type for field path parsing
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathParseError {
    /// Empty path string
    #[error("empty path")]
    Empty,
    /// Empty segment, e.g. `a..b` or a trailing dot
    #[error("empty segment at position {position} in '{input}'")]
    EmptySegment {
        /// Full input
        input: String,
        /// Byte position of the empty segment
        position: usize,
    },
    /// Bracket opened but never closed
    #[error("unclosed bracket at position {position} in '{input}'")]
    UnclosedBracket {
        /// Full input
        input: String,
        /// Position of the opening bracket
        position: usize,
    },
    /// Bracket contents are not a non-negative integer
    #[error("invalid index '{index}' in '{input}'")]
    InvalidIndex {
        /// Full input
        input: String,
        /// Bracket contents
        index: String,
    },
    /// Character not allowed in a field name
    #[error("unexpected character '{ch}' at position {position} in '{input}'")]
    UnexpectedChar {
        /// Full input
        input: String,
        /// Offending character
        ch: char,
        /// Its position
        position: usize,
    },
    /// Path exceeds [`MAX_PATH_LENGTH`]
    #[error("path '{input}' has {length} segments, maximum is {max}")]
    TooLong {
        /// Full input
        input: String,
        /// Number of segments
        length: usize,
        /// Limit
        max: usize,
    },
}

impl PathParseError {
    /// The string that failed to parse
    pub fn input(&self) -> &str {
        match self {
            PathParseError::Empty => "",
            PathParseError::EmptySegment { input, .. }
            | PathParseError::UnclosedBracket { input, .. }
            | PathParseError::InvalidIndex { input, .. }
            | PathParseError::UnexpectedChar { input, .. }
            | PathParseError::TooLong { input, .. } => input,
        }
    }
}

/// A segment in a field path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathSegment {
    /// Named field
    Field(String),
    /// Element of an embedded list
    Index(usize),
}

impl PathSegment {
    /// The field name, if this is a field segment
    pub fn as_field(&self) -> Option<&str> {
        match self {
            PathSegment::Field(name) => Some(name),
            PathSegment::Index(_) => None,
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Field(name) => write!(f, "{}", name),
            PathSegment::Index(i) => write!(f, "{}", i),
        }
    }
}

/// A path to a field within a document
///
/// # Examples
///
/// ```
/// use docmap_core::FieldPath;
///
/// let path: FieldPath = "children[1].name".parse().unwrap();
/// assert_eq!(path.to_string(), "children.1.name");
///
/// let child = FieldPath::field("child");
/// let child_name = child.clone().key("name");
/// assert!(child.is_strict_ancestor_of(&child_name));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    /// The empty path, used as a prefix when building nested paths
    pub fn root() -> Self {
        FieldPath {
            segments: Vec::new(),
        }
    }

    /// A single-field path
    pub fn field(name: impl Into<String>) -> Self {
        FieldPath {
            segments: vec![PathSegment::Field(name.into())],
        }
    }

    /// Create a path from a vector of segments
    pub fn from_segments(segments: Vec<PathSegment>) -> Self {
        FieldPath { segments }
    }

    /// Get the path segments
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Number of segments
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// True for the root path
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Append a field segment (builder pattern)
    pub fn key(mut self, name: impl Into<String>) -> Self {
        self.segments.push(PathSegment::Field(name.into()));
        self
    }

    /// Append an index segment (builder pattern)
    pub fn index(mut self, idx: usize) -> Self {
        self.segments.push(PathSegment::Index(idx));
        self
    }

    /// Concatenate `self` and `suffix`
    pub fn join(&self, suffix: &FieldPath) -> FieldPath {
        let mut segments = self.segments.clone();
        segments.extend(suffix.segments.iter().cloned());
        FieldPath { segments }
    }

    /// First segment and the remaining path
    pub fn split_first(&self) -> Option<(&PathSegment, FieldPath)> {
        self.segments
            .split_first()
            .map(|(head, rest)| (head, FieldPath::from_segments(rest.to_vec())))
    }

    /// Name of the top-level field this path starts with
    pub fn head_field(&self) -> Option<&str> {
        self.segments.first().and_then(PathSegment::as_field)
    }

    /// Get the parent path (None if root)
    pub fn parent(&self) -> Option<FieldPath> {
        if self.segments.is_empty() {
            None
        } else {
            let mut parent = self.clone();
            parent.segments.pop();
            Some(parent)
        }
    }

    /// Check if this path is an ancestor of another (or equal)
    pub fn is_ancestor_of(&self, other: &FieldPath) -> bool {
        if self.segments.len() > other.segments.len() {
            return false;
        }
        self.segments
            .iter()
            .zip(other.segments.iter())
            .all(|(a, b)| a == b)
    }

    /// Check if this path is a strict ancestor of another (not equal)
    pub fn is_strict_ancestor_of(&self, other: &FieldPath) -> bool {
        self.segments.len() < other.segments.len() && self.is_ancestor_of(other)
    }

    /// Check if this path is a strict descendant of another (not equal)
    pub fn is_strict_descendant_of(&self, other: &FieldPath) -> bool {
        other.is_strict_ancestor_of(self)
    }

    /// Check if two paths overlap (one is ancestor/descendant of the other)
    pub fn overlaps(&self, other: &FieldPath) -> bool {
        self.is_ancestor_of(other) || other.is_ancestor_of(self)
    }

    /// Dotted string form
    pub fn to_path_string(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(".")
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || c == '$'
}

impl FromStr for FieldPath {
    type Err = PathParseError;

    /// Parse a dotted path
    ///
    /// All-digit dotted segments are list indices, so `children.1.name` and
    /// `children[1].name` parse to the same path.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(PathParseError::Empty);
        }

        let chars: Vec<char> = s.chars().collect();
        let mut segments = Vec::new();
        let mut i = 0;
        // A segment is required at the start and after every dot.
        let mut expect_segment = true;

        while i < chars.len() {
            let c = chars[i];
            if c == '.' {
                if expect_segment {
                    return Err(PathParseError::EmptySegment {
                        input: s.to_string(),
                        position: i,
                    });
                }
                expect_segment = true;
                i += 1;
            } else if c == '[' {
                if segments.is_empty() {
                    return Err(PathParseError::UnexpectedChar {
                        input: s.to_string(),
                        ch: c,
                        position: i,
                    });
                }
                let start = i;
                i += 1;
                let idx_start = i;
                while i < chars.len() && chars[i] != ']' {
                    i += 1;
                }
                if i >= chars.len() {
                    return Err(PathParseError::UnclosedBracket {
                        input: s.to_string(),
                        position: start,
                    });
                }
                let idx_str: String = chars[idx_start..i].iter().collect();
                let idx = idx_str
                    .parse::<usize>()
                    .map_err(|_| PathParseError::InvalidIndex {
                        input: s.to_string(),
                        index: idx_str.clone(),
                    })?;
                segments.push(PathSegment::Index(idx));
                expect_segment = false;
                i += 1;
            } else if is_name_char(c) {
                if !expect_segment {
                    return Err(PathParseError::UnexpectedChar {
                        input: s.to_string(),
                        ch: c,
                        position: i,
                    });
                }
                let start = i;
                while i < chars.len() && is_name_char(chars[i]) {
                    i += 1;
                }
                let name: String = chars[start..i].iter().collect();
                if !segments.is_empty() && name.chars().all(|c| c.is_ascii_digit()) {
                    let idx = name
                        .parse::<usize>()
                        .map_err(|_| PathParseError::InvalidIndex {
                            input: s.to_string(),
                            index: name.clone(),
                        })?;
                    segments.push(PathSegment::Index(idx));
                } else {
                    segments.push(PathSegment::Field(name));
                }
                expect_segment = false;
            } else {
                return Err(PathParseError::UnexpectedChar {
                    input: s.to_string(),
                    ch: c,
                    position: i,
                });
            }
        }

        if expect_segment {
            return Err(PathParseError::EmptySegment {
                input: s.to_string(),
                position: chars.len(),
            });
        }
        if segments.len() > MAX_PATH_LENGTH {
            return Err(PathParseError::TooLong {
                input: s.to_string(),
                length: segments.len(),
                max: MAX_PATH_LENGTH,
            });
        }

        Ok(FieldPath { segments })
    }
}

/// Conversion into a [`FieldPath`], parsing string forms
///
/// Lets mutation entry points accept `"child.name"` as well as prebuilt paths.
pub trait IntoFieldPath {
    /// Convert, parsing if needed
    fn into_field_path(self) -> Result<FieldPath, PathParseError>;
}

impl IntoFieldPath for FieldPath {
    fn into_field_path(self) -> Result<FieldPath, PathParseError> {
        Ok(self)
    }
}

impl IntoFieldPath for &FieldPath {
    fn into_field_path(self) -> Result<FieldPath, PathParseError> {
        Ok(self.clone())
    }
}

impl IntoFieldPath for &str {
    fn into_field_path(self) -> Result<FieldPath, PathParseError> {
        self.parse()
    }
}

impl IntoFieldPath for String {
    fn into_field_path(self) -> Result<FieldPath, PathParseError> {
        self.parse()
    }
}

impl IntoFieldPath for &String {
    fn into_field_path(self) -> Result<FieldPath, PathParseError> {
        self.parse()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_path_string())
    }
}
