//! Persistent four-level genome tree.
//!
//! # Responsibility
//! - Model each level as its own node type with a typed child collection.
//! - Produce new trees by path copying; the source tree is never mutated.
//!
//! # Invariants
//! - Depth is bounded by construction: `Atome` has no child collection.
//! - `with_property` rebuilds only the nodes from the root to the target;
//!   every other subtree is shared by `Arc` with the source tree.

use crate::model::level::Level;
use crate::model::path::{GenomePath, NavResult, NavigationError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Semantic property map carried by every node.
pub type Properties = BTreeMap<String, Value>;

/// Property read as a node's display name.
pub const NAME_PROPERTY: &str = "name";

/// Level-3 node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Atome {
    #[serde(flatten)]
    pub properties: Properties,
}

/// Level-2 node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Cellule {
    #[serde(flatten)]
    pub properties: Properties,
    #[serde(rename = "n3_ui_elements", default)]
    pub atomes: Vec<Arc<Atome>>,
}

/// Level-1 node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Organe {
    #[serde(flatten)]
    pub properties: Properties,
    #[serde(rename = "n2_features", default)]
    pub cellules: Vec<Arc<Cellule>>,
}

/// Level-0 node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Corps {
    #[serde(flatten)]
    pub properties: Properties,
    #[serde(rename = "n1_sections", default)]
    pub organes: Vec<Arc<Organe>>,
}

/// Whole genome document: document-level metadata plus level-0 nodes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GenomeTree {
    #[serde(flatten)]
    pub metadata: Properties,
    #[serde(rename = "n0_phases", default)]
    pub corps: Vec<Arc<Corps>>,
}

/// Borrowed view of a node at any level.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Corps(&'a Corps),
    Organe(&'a Organe),
    Cellule(&'a Cellule),
    Atome(&'a Atome),
}

impl<'a> NodeRef<'a> {
    pub fn level(&self) -> Level {
        match self {
            Self::Corps(_) => Level::Corps,
            Self::Organe(_) => Level::Organe,
            Self::Cellule(_) => Level::Cellule,
            Self::Atome(_) => Level::Atome,
        }
    }

    pub fn properties(&self) -> &'a Properties {
        match self {
            Self::Corps(node) => &node.properties,
            Self::Organe(node) => &node.properties,
            Self::Cellule(node) => &node.properties,
            Self::Atome(node) => &node.properties,
        }
    }

    pub fn property(&self, name: &str) -> Option<&'a Value> {
        self.properties().get(name)
    }

    /// Value of the `name` property when it is a string.
    pub fn display_name(&self) -> Option<&'a str> {
        self.property(NAME_PROPERTY).and_then(Value::as_str)
    }

    /// Number of nodes in the next level's collection; always 0 for `Atome`.
    pub fn child_count(&self) -> usize {
        match self {
            Self::Corps(node) => node.organes.len(),
            Self::Organe(node) => node.cellules.len(),
            Self::Cellule(node) => node.atomes.len(),
            Self::Atome(_) => 0,
        }
    }

    pub fn child(&self, index: usize) -> Option<NodeRef<'a>> {
        match self {
            Self::Corps(node) => node.organes.get(index).map(|n| NodeRef::Organe(n)),
            Self::Organe(node) => node.cellules.get(index).map(|n| NodeRef::Cellule(n)),
            Self::Cellule(node) => node.atomes.get(index).map(|n| NodeRef::Atome(n)),
            Self::Atome(_) => None,
        }
    }

    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let node = *self;
        (0..node.child_count()).filter_map(move |index| node.child(index))
    }
}

impl GenomeTree {
    pub fn new(corps: Vec<Corps>) -> Self {
        Self {
            metadata: Properties::new(),
            corps: corps.into_iter().map(Arc::new).collect(),
        }
    }

    /// Level-0 node at `index`.
    pub fn root(&self, index: usize) -> Option<NodeRef<'_>> {
        self.corps.get(index).map(|node| NodeRef::Corps(node))
    }

    pub fn roots(&self) -> impl Iterator<Item = NodeRef<'_>> {
        self.corps.iter().map(|node| NodeRef::Corps(node))
    }

    /// Resolves `path`, checking every index against its parent's collection.
    pub fn node(&self, path: &GenomePath) -> NavResult<NodeRef<'_>> {
        let indices = path.indices();
        let mut current = self.root(indices[0]).ok_or(NavigationError::IndexOutOfBounds {
            parent: None,
            level: Level::Corps,
            index: indices[0],
            len: self.corps.len(),
        })?;

        for (depth, &index) in indices.iter().enumerate().skip(1) {
            let len = current.child_count();
            current = current
                .child(index)
                .ok_or_else(|| out_of_bounds(path, depth, index, len))?;
        }
        Ok(current)
    }

    /// Number of nodes in the collection that holds `path`'s node.
    pub fn sibling_count(&self, path: &GenomePath) -> NavResult<usize> {
        match path.parent() {
            None => Ok(self.corps.len()),
            Some(parent) => Ok(self.node(&parent)?.child_count()),
        }
    }

    /// Total number of nodes across all levels.
    pub fn node_count(&self) -> usize {
        fn count(node: NodeRef<'_>) -> usize {
            1 + node.children().map(count).sum::<usize>()
        }
        self.roots().map(count).sum()
    }

    /// Returns a new tree with `property` set to `value` on the node at
    /// `path`, and the value previously stored there.
    ///
    /// `self` is left untouched; only the root-to-target spine is copied.
    pub fn with_property(
        &self,
        path: &GenomePath,
        property: &str,
        value: Value,
    ) -> NavResult<(GenomeTree, Option<Value>)> {
        let mut next = self.clone();
        let indices = path.indices();

        let corps = Arc::make_mut(slot(&mut next.corps, path, 0, indices[0])?);
        let properties = match indices.len() {
            1 => &mut corps.properties,
            _ => {
                let organe = Arc::make_mut(slot(&mut corps.organes, path, 1, indices[1])?);
                match indices.len() {
                    2 => &mut organe.properties,
                    _ => {
                        let cellule =
                            Arc::make_mut(slot(&mut organe.cellules, path, 2, indices[2])?);
                        match indices.len() {
                            3 => &mut cellule.properties,
                            _ => {
                                let atome =
                                    Arc::make_mut(slot(&mut cellule.atomes, path, 3, indices[3])?);
                                &mut atome.properties
                            }
                        }
                    }
                }
            }
        };

        let previous = properties.insert(property.to_string(), value);
        Ok((next, previous))
    }
}

fn slot<'v, T>(
    items: &'v mut [Arc<T>],
    path: &GenomePath,
    depth: usize,
    index: usize,
) -> NavResult<&'v mut Arc<T>> {
    let len = items.len();
    items
        .get_mut(index)
        .ok_or_else(|| out_of_bounds(path, depth, index, len))
}

fn out_of_bounds(path: &GenomePath, depth: usize, index: usize, len: usize) -> NavigationError {
    NavigationError::IndexOutOfBounds {
        parent: depth
            .checked_sub(1)
            .and_then(|parent_depth| path.prefix(parent_depth))
            .map(|parent| parent.to_string()),
        level: Level::from_depth(depth).unwrap_or(Level::Atome),
        index,
        len,
    }
}

#[cfg(test)]
mod tests {
    use super::{Atome, Cellule, Corps, GenomeTree, Organe, Properties};
    use crate::model::path::{GenomePath, NavigationError};
    use serde_json::json;
    use std::sync::Arc;

    fn named(name: &str) -> Properties {
        let mut properties = Properties::new();
        properties.insert("name".to_string(), json!(name));
        properties
    }

    fn sample() -> GenomeTree {
        let cellule = Cellule {
            properties: named("Login"),
            atomes: vec![Arc::new(Atome {
                properties: named("Submit"),
            })],
        };
        let organe = Organe {
            properties: named("Header"),
            cellules: vec![Arc::new(cellule)],
        };
        GenomeTree::new(vec![
            Corps {
                properties: named("Frontend"),
                organes: vec![Arc::new(organe), Arc::new(Organe::default())],
            },
            Corps {
                properties: named("Backend"),
                organes: Vec::new(),
            },
        ])
    }

    #[test]
    fn with_property_copies_only_the_spine() {
        let tree = sample();
        let path = GenomePath::parse("n0[0].n1[0].n2[0].n3[0]").unwrap();
        let (next, previous) = tree.with_property(&path, "role", json!("action")).unwrap();

        assert_eq!(previous, None);
        assert!(tree.node(&path).unwrap().property("role").is_none());
        assert_eq!(next.node(&path).unwrap().property("role"), Some(&json!("action")));

        assert!(Arc::ptr_eq(&tree.corps[1], &next.corps[1]));
        assert!(Arc::ptr_eq(&tree.corps[0].organes[1], &next.corps[0].organes[1]));
        assert!(!Arc::ptr_eq(&tree.corps[0], &next.corps[0]));
    }

    #[test]
    fn with_property_returns_previous_value() {
        let tree = sample();
        let path = GenomePath::root(0);
        let (next, previous) = tree.with_property(&path, "name", json!("Web")).unwrap();
        assert_eq!(previous, Some(json!("Frontend")));
        assert_eq!(next.root(0).unwrap().display_name(), Some("Web"));
    }

    #[test]
    fn node_reports_bounds_with_parent_path() {
        let tree = sample();
        let path = GenomePath::parse("n0[0].n1[5]").unwrap();
        let err = tree.node(&path).unwrap_err();
        assert_eq!(
            err,
            NavigationError::IndexOutOfBounds {
                parent: Some("n0[0]".to_string()),
                level: crate::model::level::Level::Organe,
                index: 5,
                len: 2,
            }
        );
        assert!(err.to_string().contains("0..=1"));
    }

    #[test]
    fn node_count_covers_all_levels() {
        assert_eq!(sample().node_count(), 6);
    }
}
