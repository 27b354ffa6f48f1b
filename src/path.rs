//! Path addressing for nested form trees.
//!
//! A [`FieldPath`] is the ordered address of one node inside a form tree:
//! object keys for sections, numeric indices for array elements. Mutations are
//! routed through [`WriteTarget`], which names the shapes a wizard actually
//! writes to instead of guessing intent from argument positions.

use std::fmt;

/// One step into a nested form tree: an object key or an array index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Ordered address of a single node inside a form tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    /// Parses a dotted path such as `otherVehicles.2.driverName`.
    ///
    /// Purely numeric segments become array indices, everything else an
    /// object key.
    pub fn parse(text: &str) -> Self {
        let segments = text
            .split('.')
            .filter(|part| !part.is_empty())
            .map(|part| match part.parse::<usize>() {
                Ok(index) => PathSegment::Index(index),
                Err(_) => PathSegment::Key(part.to_string()),
            })
            .collect();
        Self { segments }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns a new path with `key` appended.
    pub fn join_key(&self, key: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Key(key.to_string()));
        Self { segments }
    }

    /// Returns a new path with an array index appended.
    pub fn join_index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Index(index));
        Self { segments }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, segment) in self.segments.iter().enumerate() {
            if position > 0 {
                f.write_str(".")?;
            }
            match segment {
                PathSegment::Key(key) => f.write_str(key)?,
                PathSegment::Index(index) => write!(f, "{}", index)?,
            }
        }
        Ok(())
    }
}

impl From<&str> for FieldPath {
    fn from(text: &str) -> Self {
        Self::parse(text)
    }
}

/// Mutation address resolved at the call site and dispatched by pattern
/// match.
///
/// Wizard screens only ever write three shapes: a scalar leaf, one key of one
/// record inside an array section, and a leaf one level below a named
/// section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteTarget {
    /// A single leaf anywhere in the tree.
    Scalar(FieldPath),
    /// One key of the record at `index` inside the array at `array`.
    ArrayItem {
        array: FieldPath,
        index: usize,
        key: String,
    },
    /// A leaf called `key` directly below the section at `section`.
    NestedScalar { section: FieldPath, key: String },
}

impl WriteTarget {
    pub fn scalar(path: impl Into<FieldPath>) -> Self {
        WriteTarget::Scalar(path.into())
    }

    pub fn array_item(array: impl Into<FieldPath>, index: usize, key: &str) -> Self {
        WriteTarget::ArrayItem {
            array: array.into(),
            index,
            key: key.to_string(),
        }
    }

    pub fn nested_scalar(section: impl Into<FieldPath>, key: &str) -> Self {
        WriteTarget::NestedScalar {
            section: section.into(),
            key: key.to_string(),
        }
    }
}
