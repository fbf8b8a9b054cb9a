//! Field path representation and parsing.
//!
//! A field path mixes dot-separated object keys with bracketed array indices,
//! e.g. `items[0].name`. Parsing produces a sequence of typed segments so that
//! readers and writers never split strings ad hoc.

use crate::error::PathError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single segment in a field path.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Seg {
    /// Object key access: `name`
    Key(String),
    /// Array index access: `[index]`
    Index(usize),
}

impl Seg {
    /// Create a key segment.
    #[inline]
    pub fn key(k: impl Into<String>) -> Self {
        Seg::Key(k.into())
    }

    /// Create an index segment.
    #[inline]
    pub fn index(i: usize) -> Self {
        Seg::Index(i)
    }

    /// Returns true if this is an index segment.
    #[inline]
    pub fn is_index(&self) -> bool {
        matches!(self, Seg::Index(_))
    }

    /// Get the key if this is a key segment.
    #[inline]
    pub fn as_key(&self) -> Option<&str> {
        match self {
            Seg::Key(k) => Some(k),
            Seg::Index(_) => None,
        }
    }
}

impl From<String> for Seg {
    fn from(s: String) -> Self {
        Seg::Key(s)
    }
}

impl From<&str> for Seg {
    fn from(s: &str) -> Self {
        Seg::Key(s.to_owned())
    }
}

impl From<usize> for Seg {
    fn from(i: usize) -> Self {
        Seg::Index(i)
    }
}

/// A parsed field path.
///
/// # Examples
///
/// ```
/// use tirea_form::{parse_path, Path};
///
/// let path = Path::root().key("items").index(0).key("name");
/// assert_eq!(path.to_string(), "items[0].name");
/// assert_eq!(parse_path("items[0].name").unwrap(), path);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Path(Vec<Seg>);

impl Path {
    /// Create an empty path (root).
    #[inline]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Append a key segment and return self (builder pattern).
    #[inline]
    pub fn key(mut self, k: impl Into<String>) -> Self {
        self.0.push(Seg::Key(k.into()));
        self
    }

    /// Append an index segment and return self (builder pattern).
    #[inline]
    pub fn index(mut self, i: usize) -> Self {
        self.0.push(Seg::Index(i));
        self
    }

    /// Push a segment onto the path.
    #[inline]
    pub fn push(&mut self, seg: Seg) {
        self.0.push(seg);
    }

    /// Get the segments of this path.
    #[inline]
    pub fn segments(&self) -> &[Seg] {
        &self.0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Get the parent path (path without the last segment).
    pub fn parent(&self) -> Option<Path> {
        let (_, rest) = self.0.split_last()?;
        Some(Path(rest.to_vec()))
    }

    /// Check if this path is a prefix of another path.
    ///
    /// A path is a prefix of itself; use [`Path::is_nested_in`] for the strict form.
    #[inline]
    pub fn is_prefix_of(&self, other: &Path) -> bool {
        other.0.starts_with(&self.0)
    }

    /// True when `self` lies strictly below `ancestor`.
    #[inline]
    pub fn is_nested_in(&self, ancestor: &Path) -> bool {
        self.len() > ancestor.len() && ancestor.is_prefix_of(self)
    }

    /// Iterate over the segments.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Seg> {
        self.0.iter()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.0.iter().enumerate() {
            match seg {
                Seg::Key(k) if i == 0 => write!(f, "{k}")?,
                Seg::Key(k) => write!(f, ".{k}")?,
                Seg::Index(idx) => write!(f, "[{idx}]")?,
            }
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_path(s)
    }
}

impl FromIterator<Seg> for Path {
    fn from_iter<I: IntoIterator<Item = Seg>>(iter: I) -> Self {
        Path(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a Seg;
    type IntoIter = std::slice::Iter<'a, Seg>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl std::ops::Index<usize> for Path {
    type Output = Seg;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

/// Largest array index a field path may address.
///
/// Writes pad arrays up to the index, so the bound also caps the allocation a
/// single path can cause.
pub const MAX_INDEX: usize = 65_535;

/// Parse a field path string of the form `segment ('.' segment | '[' digits ']')*`.
///
/// Keys may contain any character except `.`, `[` and `]`. Indices above
/// [`MAX_INDEX`] are rejected.
pub fn parse_path(input: &str) -> Result<Path, PathError> {
    if input.is_empty() {
        return Err(PathError::Empty);
    }

    let err_at = |position: usize| PathError::UnexpectedCharacter {
        path: input.to_owned(),
        position,
    };

    let bytes = input.as_bytes();
    let mut segments = Vec::new();
    let mut pos = 0;

    if bytes[0] == b'[' {
        return Err(PathError::LeadingIndex {
            path: input.to_owned(),
        });
    }

    while pos < bytes.len() {
        match bytes[pos] {
            b'[' => {
                let close = input[pos..]
                    .find(']')
                    .map(|off| pos + off)
                    .ok_or_else(|| PathError::UnclosedBracket {
                        path: input.to_owned(),
                    })?;
                let digits = &input[pos + 1..close];
                if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(PathError::InvalidIndex {
                        path: input.to_owned(),
                        index: digits.to_owned(),
                    });
                }
                let index = digits
                    .parse::<usize>()
                    .ok()
                    .filter(|index| *index <= MAX_INDEX)
                    .ok_or_else(|| PathError::InvalidIndex {
                        path: input.to_owned(),
                        index: digits.to_owned(),
                    })?;
                segments.push(Seg::Index(index));
                pos = close + 1;
                // After `]` only `.`, `[` or the end may follow.
                match bytes.get(pos) {
                    None | Some(b'[') => {}
                    Some(b'.') => {
                        pos += 1;
                        if pos >= bytes.len() {
                            return Err(PathError::EmptySegment {
                                path: input.to_owned(),
                                position: pos,
                            });
                        }
                    }
                    Some(_) => return Err(err_at(pos)),
                }
            }
            b']' => return Err(err_at(pos)),
            _ => {
                let start = pos;
                while pos < bytes.len() && !matches!(bytes[pos], b'.' | b'[' | b']') {
                    pos += 1;
                }
                if start == pos {
                    return Err(PathError::EmptySegment {
                        path: input.to_owned(),
                        position: start,
                    });
                }
                segments.push(Seg::Key(input[start..pos].to_owned()));
                if bytes.get(pos) == Some(&b'.') {
                    pos += 1;
                    if pos >= bytes.len() || bytes[pos] == b'.' || bytes[pos] == b'[' {
                        return Err(PathError::EmptySegment {
                            path: input.to_owned(),
                            position: pos,
                        });
                    }
                }
            }
        }
    }

    Ok(Path(segments))
}

/// Construct a `Path` from a sequence of segments.
///
/// ```
/// use tirea_form::path;
///
/// let p = path!("items", 0, "name");
/// assert_eq!(p.to_string(), "items[0].name");
/// ```
#[macro_export]
macro_rules! path {
    () => {
        $crate::Path::root()
    };
    ($($seg:expr),+ $(,)?) => {{
        let mut p = $crate::Path::root();
        $(
            p.push($crate::Seg::from($seg));
        )+
        p
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_key() {
        let p = parse_path("name").unwrap();
        assert_eq!(p.segments(), &[Seg::key("name")]);
    }

    #[test]
    fn test_parse_mixed_path() {
        let p = parse_path("items[0].name").unwrap();
        assert_eq!(p, path!("items", 0usize, "name"));

        let p = parse_path("matrix[1][2]").unwrap();
        assert_eq!(p, path!("matrix", 1usize, 2usize));

        let p = parse_path("shipping.street").unwrap();
        assert_eq!(p, path!("shipping", "street"));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!(parse_path(""), Err(PathError::Empty)));
        assert!(matches!(parse_path("a..b"), Err(PathError::EmptySegment { .. })));
        assert!(matches!(parse_path("a."), Err(PathError::EmptySegment { .. })));
        assert!(matches!(parse_path("a[1"), Err(PathError::UnclosedBracket { .. })));
        assert!(matches!(parse_path("a[x]"), Err(PathError::InvalidIndex { .. })));
        assert!(matches!(parse_path("a[]"), Err(PathError::InvalidIndex { .. })));
        assert!(matches!(parse_path("[0].a"), Err(PathError::LeadingIndex { .. })));
        assert!(matches!(parse_path("a[0]b"), Err(PathError::UnexpectedCharacter { .. })));
        assert!(matches!(parse_path("a]"), Err(PathError::UnexpectedCharacter { .. })));
    }

    #[test]
    fn test_display_round_trips() {
        for s in ["name", "items[0].name", "a.b.c", "grid[3][4].cell"] {
            assert_eq!(parse_path(s).unwrap().to_string(), s);
        }
    }

    #[test]
    fn test_nesting() {
        let parent = parse_path("items[0]").unwrap();
        let child = parse_path("items[0].name").unwrap();
        assert!(parent.is_prefix_of(&child));
        assert!(child.is_nested_in(&parent));
        assert!(!parent.is_nested_in(&parent));
        assert_eq!(child.parent(), Some(parent));
    }

    #[test]
    fn test_parse_rejects_index_above_limit() {
        assert_eq!(parse_path("a[65535]").unwrap(), Path::root().key("a").index(MAX_INDEX));
        for input in ["a[65536]", "a[18446744073709551615]", "a[99999999999999999999999]"] {
            assert!(
                matches!(parse_path(input), Err(PathError::InvalidIndex { .. })),
                "{input} should be rejected"
            );
        }
    }
}
