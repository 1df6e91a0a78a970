//! Three-tier component resolution for genome nodes.
//!
//! # Responsibility
//! - Map a node name and level to a tier strategy: catalog hit, adaptable
//!   template, or generation request.
//! - Attach the node's semantic hints so renderers need not re-read the tree.
//!
//! # Invariants
//! - Resolution is a pure function of (name, level) and the injected catalogs.
//! - Tier confidences are fixed constants, not measured probabilities.
//!
//! # See also
//! - `crate::resolve::catalog` for the lookup contracts.

use crate::model::level::{Level, MAX_DEPTH};
use crate::model::path::{GenomePath, NavResult};
use crate::model::tree::{GenomeTree, NodeRef, Properties};
use crate::resolve::catalog::{AdaptableTemplate, CatalogEntry, ComponentCatalog, TemplateCatalog};
use crate::similarity::similarity;
use log::debug;
use serde::Serialize;

pub const EXACT_MATCH_CONFIDENCE: f64 = 0.95;
pub const TEMPLATE_CONFIDENCE: f64 = 0.75;
pub const GENERATION_CONFIDENCE: f64 = 0.5;
/// Fuzzy matches must score strictly above this.
pub const FUZZY_MATCH_THRESHOLD: f64 = 0.7;
/// Fuzzy confidence = similarity * this factor.
///
/// Chosen here, not prescribed: it only keeps a fuzzy hit (at most 0.9) below
/// [`EXACT_MATCH_CONFIDENCE`] so callers can tell the two apart.
pub const FUZZY_CONFIDENCE_SCALE: f64 = 0.9;

/// Node properties copied into [`ComponentContext::semantic_hints`].
pub const SEMANTIC_HINT_PROPERTIES: [&str; 8] = [
    "visual_hint",
    "role",
    "description",
    "layout_type",
    "density",
    "importance",
    "accent_color",
    "confidence",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Tier {
    /// Known component from the catalog.
    Exact = 1,
    /// Generic template adapted to the node.
    Adaptable = 2,
    /// Nothing reusable; a component must be generated.
    Generate = 3,
}

impl Tier {
    pub fn number(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchedEntity {
    Catalog {
        entry: CatalogEntry,
        /// 1.0 for exact name matches.
        similarity: f64,
    },
    Template { template: AdaptableTemplate },
}

/// Work order for a component that does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationRequest {
    pub name: String,
    pub level: Level,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierStrategy {
    pub tier: Tier,
    pub matched: Option<MatchedEntity>,
    pub confidence: f64,
    /// Present only for [`Tier::Generate`].
    pub generation_request: Option<GenerationRequest>,
}

/// Resolution result for one tree node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentContext {
    pub path: GenomePath,
    pub level: Level,
    pub name: String,
    pub strategy: TierStrategy,
    pub semantic_hints: Properties,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogStatistics {
    pub total_entries: usize,
    /// Indexed by level depth.
    pub entries_per_level: [usize; MAX_DEPTH],
    pub template_count: usize,
}

/// Resolves nodes against a component catalog and a template library.
#[derive(Debug, Clone)]
pub struct ComponentContextualizer<C, T> {
    catalog: C,
    templates: T,
}

impl<C: ComponentCatalog, T: TemplateCatalog> ComponentContextualizer<C, T> {
    pub fn new(catalog: C, templates: T) -> Self {
        Self { catalog, templates }
    }

    pub fn resolve(&self, name: &str, level: Level) -> TierStrategy {
        let strategy = self.resolve_inner(name, level);
        debug!(
            "event=component_resolve module=contextualizer status=ok level={} tier={}",
            level.depth(),
            strategy.tier.number()
        );
        strategy
    }

    fn resolve_inner(&self, name: &str, level: Level) -> TierStrategy {
        let entries = self.catalog.entries(level);
        let lowered = name.to_lowercase();

        if let Some(entry) = entries
            .iter()
            .find(|entry| entry.name.to_lowercase() == lowered)
        {
            return TierStrategy {
                tier: Tier::Exact,
                matched: Some(MatchedEntity::Catalog {
                    entry: entry.clone(),
                    similarity: 1.0,
                }),
                confidence: EXACT_MATCH_CONFIDENCE,
                generation_request: None,
            };
        }

        if let Some((entry, score)) = best_fuzzy_match(entries, &lowered) {
            return TierStrategy {
                tier: Tier::Exact,
                matched: Some(MatchedEntity::Catalog {
                    entry: entry.clone(),
                    similarity: score,
                }),
                confidence: score * FUZZY_CONFIDENCE_SCALE,
                generation_request: None,
            };
        }

        if let Some(template) = self.templates.find_for_name(name) {
            return TierStrategy {
                tier: Tier::Adaptable,
                matched: Some(MatchedEntity::Template {
                    template: template.clone(),
                }),
                confidence: TEMPLATE_CONFIDENCE,
                generation_request: None,
            };
        }

        TierStrategy {
            tier: Tier::Generate,
            matched: None,
            confidence: GENERATION_CONFIDENCE,
            generation_request: Some(GenerationRequest {
                name: name.to_string(),
                level,
            }),
        }
    }

    /// Resolves `node` and collects its semantic hints.
    ///
    /// Unnamed nodes resolve under their positional label, e.g. `Atome 2`.
    pub fn contextualize(&self, path: &GenomePath, node: NodeRef<'_>) -> ComponentContext {
        let level = node.level();
        let name = node
            .display_name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} {}", level.label(), path.last_index()));

        let semantic_hints = SEMANTIC_HINT_PROPERTIES
            .iter()
            .filter_map(|key| {
                node.property(key)
                    .map(|value| (key.to_string(), value.clone()))
            })
            .collect();

        ComponentContext {
            path: path.clone(),
            level,
            strategy: self.resolve(&name, level),
            name,
            semantic_hints,
        }
    }

    /// Resolves the node at `path` in `tree`.
    pub fn contextualize_path(&self, tree: &GenomeTree, path: &str) -> NavResult<ComponentContext> {
        let path = GenomePath::parse(path)?;
        let node = tree.node(&path)?;
        Ok(self.contextualize(&path, node))
    }

    pub fn statistics(&self) -> CatalogStatistics {
        let entries_per_level = Level::ALL.map(|level| self.catalog.entries(level).len());
        CatalogStatistics {
            total_entries: entries_per_level.iter().sum(),
            entries_per_level,
            template_count: self.templates.template_count(),
        }
    }
}

/// Highest-scoring entry strictly above [`FUZZY_MATCH_THRESHOLD`]; first wins ties.
fn best_fuzzy_match<'e>(entries: &'e [CatalogEntry], lowered: &str) -> Option<(&'e CatalogEntry, f64)> {
    let mut best: Option<(&CatalogEntry, f64)> = None;
    for entry in entries {
        let score = similarity(lowered, &entry.name.to_lowercase());
        if score <= FUZZY_MATCH_THRESHOLD {
            continue;
        }
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((entry, score));
        }
    }
    best
}
