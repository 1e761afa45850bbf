//! Coding paths: the keys and indices leading from the document root to a node.
//!
//! Paths are rebuilt on demand by walking parent links in the document tape and are only
//! materialized for diagnostics.

use std::fmt;

use smallvec::SmallVec;

/// One step of a coding path.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Member of an object, by (possibly case-normalized) key.
    Key(String),
    /// Element of an array, by zero-based index.
    Index(usize),
}

impl PathSegment {
    /// The key, if this segment addresses an object member.
    pub fn as_key(&self) -> Option<&str> {
        match self {
            PathSegment::Key(key) => Some(key),
            PathSegment::Index(_) => None,
        }
    }

    /// The index, if this segment addresses an array element.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            PathSegment::Key(_) => None,
            PathSegment::Index(index) => Some(*index),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(value: &str) -> Self {
        PathSegment::Key(value.to_owned())
    }
}

impl From<String> for PathSegment {
    fn from(value: String) -> Self {
        PathSegment::Key(value)
    }
}

impl From<usize> for PathSegment {
    fn from(value: usize) -> Self {
        PathSegment::Index(value)
    }
}

/// Ordered sequence of segments from the root to a node. Empty for the root itself.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct CodingPath {
    segments: SmallVec<[PathSegment; 8]>,
}

impl CodingPath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Append a segment and return the extended path.
    pub fn join<T: Into<PathSegment>>(mut self, segment: T) -> Self {
        self.segments.push(segment.into());
        self
    }

    pub(crate) fn push(&mut self, segment: PathSegment) {
        self.segments.push(segment);
    }

    pub(crate) fn reverse(&mut self) {
        self.segments.reverse();
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The last segment, if any.
    pub fn leaf(&self) -> Option<&PathSegment> {
        self.segments.last()
    }
}

impl<S: Into<PathSegment>> FromIterator<S> for CodingPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Renders `a[0].b`; the empty path renders as `<root>`.
impl fmt::Display for CodingPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("<root>");
        }
        for (idx, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Index(index) => write!(f, "[{index}]")?,
                PathSegment::Key(key) => {
                    if idx > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(key)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_mixes_keys_and_indices() {
        let path = CodingPath::root().join("a").join(0usize).join("b");
        assert_eq!(path.to_string(), "a[0].b");
        assert_eq!(CodingPath::root().to_string(), "<root>");
        assert_eq!(CodingPath::root().join(3usize).join("x").to_string(), "[3].x");
    }

    #[test]
    fn collects_from_segments() {
        let path: CodingPath = vec![PathSegment::from("items"), PathSegment::from(2usize)]
            .into_iter()
            .collect();
        assert_eq!(path.len(), 2);
        assert_eq!(path.leaf().and_then(PathSegment::as_index), Some(2));
        assert_eq!(path.segments()[0].as_key(), Some("items"));
    }
}
