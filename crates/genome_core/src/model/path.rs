//! Canonical node addressing: `n0[i].n1_sections[j]...`.
//!
//! # Responsibility
//! - Parse path strings, accepting short level tokens (`n1`, `n2`, `n3`).
//! - Render paths in canonical form only.
//! - Own the navigation error taxonomy shared by every path consumer.
//!
//! # Invariants
//! - A `GenomePath` has between 1 and `MAX_DEPTH` segments.
//! - Segment `k` always addresses level `k`; the key is implied by position.

use crate::model::level::{Level, MAX_DEPTH};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Result type for navigation and path resolution.
pub type NavResult<T> = Result<T, NavigationError>;

/// Structured navigation failure. Never raised as a panic, never mutates state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    /// Path string is empty.
    EmptyPath,
    /// A segment is not of the form `key[index]`.
    MalformedSegment { path: String, segment: String },
    /// Segment key is unknown or belongs to another level.
    UnknownLevelKey {
        path: String,
        key: String,
        expected: &'static str,
    },
    /// Path has more segments than the tree has levels.
    TooDeep { path: String },
    /// Index does not exist in its parent's child collection.
    IndexOutOfBounds {
        parent: Option<String>,
        level: Level,
        index: usize,
        len: usize,
    },
    /// Drill-down requested below the leaf level.
    MaxDepthReached { path: String },
    /// Node has an empty child collection.
    NoChildren { path: String },
    /// Drill-up requested from a level-0 node.
    AboveRoot { path: String },
}

impl Display for NavigationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyPath => write!(f, "path must not be empty"),
            Self::MalformedSegment { path, segment } => write!(
                f,
                "malformed path `{path}`: segment `{segment}` must look like `key[index]`"
            ),
            Self::UnknownLevelKey {
                path,
                key,
                expected,
            } => write!(
                f,
                "unknown level key `{key}` in path `{path}`; expected `{expected}`"
            ),
            Self::TooDeep { path } => write!(
                f,
                "path `{path}` is deeper than the {MAX_DEPTH} genome levels"
            ),
            Self::IndexOutOfBounds {
                parent,
                level,
                index,
                len,
            } => {
                let owner = parent.as_deref().unwrap_or("genome root");
                if *len == 0 {
                    write!(
                        f,
                        "index {index} out of bounds under `{owner}`: no {} nodes exist",
                        level.label()
                    )
                } else {
                    write!(
                        f,
                        "index {index} out of bounds under `{owner}`: valid {} range is 0..={}",
                        level.label(),
                        len - 1
                    )
                }
            }
            Self::MaxDepthReached { path } => write!(
                f,
                "cannot drill down from `{path}`: already at the deepest level"
            ),
            Self::NoChildren { path } => write!(f, "node `{path}` has no children"),
            Self::AboveRoot { path } => {
                write!(f, "cannot drill up from `{path}`: already at the root level")
            }
        }
    }
}

impl Error for NavigationError {}

/// Parsed genome path. Displays in canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GenomePath {
    indices: Vec<usize>,
}

impl GenomePath {
    /// Path of the level-0 node at `index`.
    pub fn root(index: usize) -> Self {
        Self {
            indices: vec![index],
        }
    }

    /// Parses a path, normalizing short level tokens to canonical keys.
    pub fn parse(input: &str) -> NavResult<Self> {
        if input.is_empty() {
            return Err(NavigationError::EmptyPath);
        }

        let mut indices = Vec::new();
        for (depth, segment) in input.split('.').enumerate() {
            let Some(expected) = Level::from_depth(depth) else {
                return Err(NavigationError::TooDeep {
                    path: input.to_string(),
                });
            };
            let (key, index) = split_segment(segment).ok_or_else(|| {
                NavigationError::MalformedSegment {
                    path: input.to_string(),
                    segment: segment.to_string(),
                }
            })?;
            if Level::from_key(key) != Some(expected) {
                return Err(NavigationError::UnknownLevelKey {
                    path: input.to_string(),
                    key: key.to_string(),
                    expected: expected.path_key(),
                });
            }
            indices.push(index);
        }
        Ok(Self { indices })
    }

    /// Builds a path from raw indices, one per level.
    pub fn from_indices(indices: Vec<usize>) -> Option<Self> {
        if indices.is_empty() || indices.len() > MAX_DEPTH {
            return None;
        }
        Some(Self { indices })
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Level of the addressed node.
    pub fn level(&self) -> Level {
        Level::from_depth(self.indices.len() - 1).unwrap_or(Level::Atome)
    }

    /// Index of the addressed node within its parent collection.
    pub fn last_index(&self) -> usize {
        self.indices[self.indices.len() - 1]
    }

    pub fn is_root_level(&self) -> bool {
        self.indices.len() == 1
    }

    pub fn parent(&self) -> Option<Self> {
        if self.is_root_level() {
            return None;
        }
        Some(Self {
            indices: self.indices[..self.indices.len() - 1].to_vec(),
        })
    }

    /// Path of the child at `index`, `None` when this path is at the leaf level.
    pub fn child(&self, index: usize) -> Option<Self> {
        if self.indices.len() >= MAX_DEPTH {
            return None;
        }
        let mut indices = self.indices.clone();
        indices.push(index);
        Some(Self { indices })
    }

    /// Same parent, different position.
    pub fn with_last_index(&self, index: usize) -> Self {
        let mut indices = self.indices.clone();
        let last = indices.len() - 1;
        indices[last] = index;
        Self { indices }
    }

    /// The first `depth + 1` segments of this path.
    pub fn prefix(&self, depth: usize) -> Option<Self> {
        if depth >= self.indices.len() {
            return None;
        }
        Some(Self {
            indices: self.indices[..=depth].to_vec(),
        })
    }

    /// Every prefix from the level-0 node down to this path, inclusive.
    pub fn prefixes(&self) -> impl Iterator<Item = GenomePath> + '_ {
        (0..self.indices.len()).filter_map(|depth| self.prefix(depth))
    }
}

fn split_segment(segment: &str) -> Option<(&str, usize)> {
    let open = segment.find('[')?;
    let key = &segment[..open];
    let digits = segment[open + 1..].strip_suffix(']')?;
    if key.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let index = digits.parse().ok()?;
    Some((key, index))
}

impl Display for GenomePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (depth, index) in self.indices.iter().enumerate() {
            if depth > 0 {
                f.write_str(".")?;
            }
            let key = Level::from_depth(depth).map_or("?", Level::path_key);
            write!(f, "{key}[{index}]")?;
        }
        Ok(())
    }
}

impl FromStr for GenomePath {
    type Err = NavigationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for GenomePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for GenomePath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
