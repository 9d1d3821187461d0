//! Property path grammar.
//!
//! A path is a sequence of segments separated by `.`; each segment is a
//! property name followed by zero or more `[argument]` indexers:
//!
//! ```text
//! Address1.Line1
//! Items[3].Name
//! Grid[1][2]
//! Lookup[home].City
//! ```
//!
//! [`PropertyPath`] builds paths and [`split_segments`] parses them. The two
//! agree exactly: every `PropertyPath` renders to a string that
//! `split_segments` accepts.

use std::fmt;

use smallvec::SmallVec;

use crate::error::PathSyntaxError;

/// Separates member segments.
pub const MEMBER_SEPARATOR: char = '.';
/// Opens an indexer.
pub const INDEX_OPEN: char = '[';
/// Closes an indexer.
pub const INDEX_CLOSE: char = ']';

// ============================================================================
// BUILDER
// ============================================================================

/// One step of a [`PropertyPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathPart {
    /// Named property.
    Member(String),
    /// Positional indexer.
    Index(usize),
    /// Keyed indexer.
    Key(String),
}

/// A structured property path.
///
/// ```rust,ignore
/// let path = PropertyPath::member("Items").index(2).child("Name");
/// assert_eq!(path.to_string(), "Items[2].Name");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PropertyPath {
    parts: SmallVec<[PathPart; 4]>,
}

impl PropertyPath {
    /// The empty path.
    pub fn new() -> Self {
        Self::default()
    }

    /// A path of a single property.
    pub fn member(name: impl Into<String>) -> Self {
        Self::new().child(name)
    }

    /// Appends a property.
    pub fn child(mut self, name: impl Into<String>) -> Self {
        self.parts.push(PathPart::Member(name.into()));
        self
    }

    /// Appends a positional indexer.
    pub fn index(mut self, index: usize) -> Self {
        self.parts.push(PathPart::Index(index));
        self
    }

    /// Appends a keyed indexer.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.parts.push(PathPart::Key(key.into()));
        self
    }

    /// The parts of the path.
    pub fn parts(&self) -> &[PathPart] {
        &self.parts
    }

    /// Whether the path has no parts.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Renders `tail` (a rendered path relative to `self`) as a path from
    /// the same root as `self`.
    pub fn join(&self, tail: &str) -> String {
        match (self.is_empty(), tail.is_empty()) {
            (true, _) => tail.to_owned(),
            (false, true) => self.to_string(),
            (false, false) if tail.starts_with(INDEX_OPEN) => format!("{self}{tail}"),
            (false, false) => format!("{self}{MEMBER_SEPARATOR}{tail}"),
        }
    }

    /// Parses a rendered path. Indexer arguments that parse as `usize`
    /// become [`PathPart::Index`], everything else [`PathPart::Key`].
    pub fn parse(path: &str) -> Result<Self, PathSyntaxError> {
        let mut parsed = Self::new();
        for segment in split_segments(path)? {
            parsed = parsed.child(segment.name);
            for arg in segment.indexers {
                parsed = match arg.parse::<usize>() {
                    Ok(index) => parsed.index(index),
                    Err(_) => parsed.key(arg),
                };
            }
        }
        Ok(parsed)
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.parts.iter().enumerate() {
            match part {
                PathPart::Member(name) if i == 0 => f.write_str(name)?,
                PathPart::Member(name) => write!(f, "{MEMBER_SEPARATOR}{name}")?,
                PathPart::Index(index) => write!(f, "{INDEX_OPEN}{index}{INDEX_CLOSE}")?,
                PathPart::Key(key) => write!(f, "{INDEX_OPEN}{key}{INDEX_CLOSE}")?,
            }
        }
        Ok(())
    }
}

// ============================================================================
// PARSER
// ============================================================================

/// One parsed segment, borrowing from the path string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment<'a> {
    /// The full segment text, indexers included (`Items[3]`).
    pub text: &'a str,
    /// The property name (`Items`).
    pub name: &'a str,
    /// Raw indexer arguments in order (`["3"]`).
    pub indexers: SmallVec<[&'a str; 2]>,
}

impl<'a> PathSegment<'a> {
    fn parse(text: &'a str, offset: usize) -> Result<Self, PathSyntaxError> {
        let name_end = text.find(INDEX_OPEN).unwrap_or(text.len());
        let name = &text[..name_end];
        if name.is_empty() {
            return Err(PathSyntaxError::EmptySegment { position: offset });
        }

        let mut indexers = SmallVec::new();
        let mut rest = &text[name_end..];
        while !rest.is_empty() {
            let Some(body) = rest.strip_prefix(INDEX_OPEN) else {
                return Err(PathSyntaxError::Malformed {
                    segment: text.to_owned(),
                    position: offset + text.len() - rest.len(),
                });
            };
            let close = body
                .find(INDEX_CLOSE)
                .ok_or_else(|| PathSyntaxError::UnclosedIndexer {
                    segment: text.to_owned(),
                })?;
            if close == 0 {
                return Err(PathSyntaxError::EmptyIndexer {
                    segment: text.to_owned(),
                });
            }
            indexers.push(&body[..close]);
            rest = &body[close + 1..];
        }

        Ok(Self {
            text,
            name,
            indexers,
        })
    }
}

/// Splits `path` into segments.
///
/// Separators inside an indexer belong to the key (`Lookup[a.b]` is one
/// segment).
pub fn split_segments(path: &str) -> Result<Vec<PathSegment<'_>>, PathSyntaxError> {
    if path.is_empty() {
        return Err(PathSyntaxError::Empty);
    }

    let mut segments = Vec::new();
    let mut start = 0;
    let mut in_indexer = false;
    for (i, c) in path.char_indices() {
        match c {
            INDEX_OPEN if in_indexer => return Err(malformed(path, start, i)),
            INDEX_OPEN => in_indexer = true,
            INDEX_CLOSE if !in_indexer => return Err(malformed(path, start, i)),
            INDEX_CLOSE => in_indexer = false,
            MEMBER_SEPARATOR if !in_indexer => {
                segments.push(PathSegment::parse(&path[start..i], start)?);
                start = i + MEMBER_SEPARATOR.len_utf8();
            }
            _ => {}
        }
    }
    if in_indexer {
        return Err(PathSyntaxError::UnclosedIndexer {
            segment: path[start..].to_owned(),
        });
    }
    segments.push(PathSegment::parse(&path[start..], start)?);
    Ok(segments)
}

fn malformed(path: &str, start: usize, position: usize) -> PathSyntaxError {
    PathSyntaxError::Malformed {
        segment: path[start..=position].to_owned(),
        position,
    }
}
