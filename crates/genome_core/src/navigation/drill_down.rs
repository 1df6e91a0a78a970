//! Path algebra over one tree snapshot.
//!
//! # Responsibility
//! - Move between levels (drill down / up) and describe where a path points.
//! - Build bounded previews of a subtree for navigation UIs.
//!
//! # Invariants
//! - Holds no state besides the borrowed tree; every call re-resolves its path.
//! - Every returned path is canonical and resolves in the borrowed tree.

use crate::model::level::Level;
use crate::model::path::{GenomePath, NavResult, NavigationError};
use crate::model::tree::{GenomeTree, NodeRef};
use serde::Serialize;

/// One breadcrumb step from the root towards the current node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreadcrumbEntry {
    pub name: String,
    pub path: GenomePath,
}

/// Derived description of a node's position; never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationContext {
    pub current_path: GenomePath,
    pub current_level: Level,
    /// Root first, current node last.
    pub breadcrumb: Vec<BreadcrumbEntry>,
    pub parent_path: Option<GenomePath>,
    pub children_count: usize,
    pub has_children: bool,
}

/// Compact description of one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeSummary {
    pub path: GenomePath,
    pub name: String,
    pub level: Level,
    pub children_count: usize,
}

/// Eagerly expanded subtree, cut at a maximum depth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationTreeNode {
    #[serde(flatten)]
    pub summary: NodeSummary,
    /// Empty when the depth budget ran out or the node is a leaf.
    pub children: Vec<NavigationTreeNode>,
    /// True when children exist but were not expanded.
    pub truncated: bool,
}

/// Navigation over a borrowed tree.
#[derive(Debug, Clone, Copy)]
pub struct DrillDownManager<'t> {
    tree: &'t GenomeTree,
}

impl<'t> DrillDownManager<'t> {
    pub fn new(tree: &'t GenomeTree) -> Self {
        Self { tree }
    }

    /// Path of child `child_index` under `path`.
    ///
    /// # Errors
    /// - `path` is malformed or does not resolve.
    /// - `path` is already at `Atome` level.
    /// - The node has no children, or `child_index` is out of range.
    pub fn drill_down(&self, path: &str, child_index: usize) -> NavResult<GenomePath> {
        let path = GenomePath::parse(path)?;
        let node = self.tree.node(&path)?;
        let Some(child_path) = path.child(child_index) else {
            return Err(NavigationError::MaxDepthReached {
                path: path.to_string(),
            });
        };

        let len = node.child_count();
        if len == 0 {
            return Err(NavigationError::NoChildren {
                path: path.to_string(),
            });
        }
        if child_index >= len {
            return Err(NavigationError::IndexOutOfBounds {
                parent: Some(path.to_string()),
                level: child_path.level(),
                index: child_index,
                len,
            });
        }
        Ok(child_path)
    }

    /// Parent of `path`; fails only for level-0 paths.
    pub fn drill_up(&self, path: &str) -> NavResult<GenomePath> {
        let path = GenomePath::parse(path)?;
        self.tree.node(&path)?;
        path.parent().ok_or(NavigationError::AboveRoot {
            path: path.to_string(),
        })
    }

    pub fn context(&self, path: &str) -> NavResult<NavigationContext> {
        let path = GenomePath::parse(path)?;
        let node = self.tree.node(&path)?;

        let breadcrumb = path
            .prefixes()
            .map(|prefix| {
                let name = node_name(self.tree.node(&prefix)?, &prefix);
                Ok(BreadcrumbEntry { name, path: prefix })
            })
            .collect::<NavResult<Vec<_>>>()?;

        let children_count = node.child_count();
        Ok(NavigationContext {
            current_level: path.level(),
            parent_path: path.parent(),
            breadcrumb,
            children_count,
            has_children: children_count > 0,
            current_path: path,
        })
    }

    /// Level-0 nodes of the tree.
    pub fn roots(&self) -> Vec<NodeSummary> {
        (0..self.tree.corps.len())
            .filter_map(|index| {
                let path = GenomePath::root(index);
                self.tree.root(index).map(|node| summarize(node, path))
            })
            .collect()
    }

    /// Direct children of `path`, in collection order.
    pub fn children(&self, path: &str) -> NavResult<Vec<NodeSummary>> {
        let path = GenomePath::parse(path)?;
        let node = self.tree.node(&path)?;
        Ok(child_summaries(node, &path))
    }

    /// Every node sharing `path`'s parent collection, `path` itself included.
    ///
    /// For level-0 paths this is every level-0 node.
    pub fn siblings(&self, path: &str) -> NavResult<Vec<NodeSummary>> {
        let path = GenomePath::parse(path)?;
        self.tree.node(&path)?;
        match path.parent() {
            None => Ok(self.roots()),
            Some(parent) => {
                let parent_node = self.tree.node(&parent)?;
                Ok(child_summaries(parent_node, &parent))
            }
        }
    }

    /// Ancestors of `path`, nearest first; empty for level-0 paths.
    pub fn ancestors(&self, path: &str) -> NavResult<Vec<NodeSummary>> {
        let path = GenomePath::parse(path)?;
        self.tree.node(&path)?;
        let mut ancestors = Vec::new();
        let mut cursor = path.parent();
        while let Some(current) = cursor {
            let node = self.tree.node(&current)?;
            cursor = current.parent();
            ancestors.push(summarize(node, current));
        }
        Ok(ancestors)
    }

    /// Subtree rooted at `path`, expanded at most `max_depth` levels below it.
    pub fn build_navigation_tree(
        &self,
        path: &str,
        max_depth: usize,
    ) -> NavResult<NavigationTreeNode> {
        let path = GenomePath::parse(path)?;
        let node = self.tree.node(&path)?;
        Ok(expand(node, path, max_depth))
    }
}

fn node_name(node: NodeRef<'_>, path: &GenomePath) -> String {
    node.display_name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("{} {}", node.level().label(), path.last_index()))
}

fn summarize(node: NodeRef<'_>, path: GenomePath) -> NodeSummary {
    NodeSummary {
        name: node_name(node, &path),
        level: node.level(),
        children_count: node.child_count(),
        path,
    }
}

fn child_summaries(node: NodeRef<'_>, path: &GenomePath) -> Vec<NodeSummary> {
    node.children()
        .enumerate()
        .filter_map(|(index, child)| path.child(index).map(|child_path| summarize(child, child_path)))
        .collect()
}

fn expand(node: NodeRef<'_>, path: GenomePath, remaining: usize) -> NavigationTreeNode {
    let children = if remaining == 0 {
        Vec::new()
    } else {
        node.children()
            .enumerate()
            .filter_map(|(index, child)| {
                path.child(index)
                    .map(|child_path| expand(child, child_path, remaining - 1))
            })
            .collect()
    };
    let truncated = children.is_empty() && node.child_count() > 0;
    NavigationTreeNode {
        summary: summarize(node, path),
        children,
        truncated,
    }
}
