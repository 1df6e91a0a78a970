//! Externally maintained catalogs consulted during component resolution.
//!
//! # Responsibility
//! - Partition known components by tree level for exact and fuzzy lookup.
//! - Map name keywords to adaptable templates.
//!
//! # Invariants
//! - Catalog contents are read-only during resolution.
//! - Template keywords are lowercase; matching is substring on a lowercased name.

use crate::model::level::{Level, MAX_DEPTH};
use crate::model::tree::Properties;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// One known, directly renderable component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    pub level: Level,
    /// Identifier the rendering layer uses to instantiate the component.
    pub component: String,
    #[serde(default)]
    pub properties: Properties,
}

impl CatalogEntry {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        level: Level,
        component: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            level,
            component: component.into(),
            properties: Properties::new(),
        }
    }
}

/// Level-partitioned component lookup.
pub trait ComponentCatalog {
    /// Entries registered for `level`, in insertion order.
    fn entries(&self, level: Level) -> &[CatalogEntry];

    fn total_entries(&self) -> usize {
        Level::ALL.iter().map(|level| self.entries(*level).len()).sum()
    }
}

/// Catalog held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryComponentCatalog {
    partitions: [Vec<CatalogEntry>; MAX_DEPTH],
}

impl InMemoryComponentCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        let mut catalog = Self::new();
        for entry in entries {
            catalog.insert(entry);
        }
        catalog
    }

    /// Adds an entry to its level's partition.
    pub fn insert(&mut self, entry: CatalogEntry) {
        self.partitions[entry.level.depth()].push(entry);
    }

    /// Parses a JSON array of entries.
    pub fn from_json_str(input: &str) -> Result<Self, serde_json::Error> {
        let entries: Vec<CatalogEntry> = serde_json::from_str(input)?;
        Ok(Self::from_entries(entries))
    }
}

impl ComponentCatalog for InMemoryComponentCatalog {
    fn entries(&self, level: Level) -> &[CatalogEntry] {
        &self.partitions[level.depth()]
    }
}

/// Generic component that can be adapted to a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptableTemplate {
    /// Template type, e.g. `button`.
    pub kind: String,
    /// Lowercase name fragments that select this template.
    pub keywords: Vec<String>,
    /// Defaults the rendering layer starts from.
    #[serde(default)]
    pub defaults: Properties,
}

impl AdaptableTemplate {
    pub fn new(kind: &str, keywords: &[&str], defaults: Properties) -> Self {
        Self {
            kind: kind.to_string(),
            keywords: keywords.iter().map(|keyword| keyword.to_lowercase()).collect(),
            defaults,
        }
    }

    fn matches(&self, lowered_name: &str) -> bool {
        self.keywords
            .iter()
            .any(|keyword| lowered_name.contains(keyword.as_str()))
    }
}

/// Keyword-partitioned template lookup.
pub trait TemplateCatalog {
    /// First template whose keyword occurs in `name` (case-insensitive).
    fn find_for_name(&self, name: &str) -> Option<&AdaptableTemplate>;

    fn template_count(&self) -> usize;
}

/// Ordered template list; earlier templates win keyword ties.
#[derive(Debug, Clone, Default)]
pub struct TemplateLibrary {
    templates: Vec<AdaptableTemplate>,
}

impl TemplateLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Button, input, card, navbar, modal and form templates.
    pub fn builtin() -> Self {
        let defaults = |pairs: &[(&str, &str)]| -> Properties {
            pairs
                .iter()
                .map(|(key, value)| (key.to_string(), json!(value)))
                .collect()
        };

        let mut library = Self::new();
        library.push(AdaptableTemplate::new(
            "button",
            &["button", "bouton", "btn"],
            defaults(&[("interaction_type", "click"), ("importance", "primary")]),
        ));
        library.push(AdaptableTemplate::new(
            "input",
            &["input", "champ", "field", "saisie"],
            defaults(&[("interaction_type", "input")]),
        ));
        library.push(AdaptableTemplate::new(
            "card",
            &["card", "carte", "tile"],
            defaults(&[("layout_type", "stack"), ("density", "comfortable")]),
        ));
        library.push(AdaptableTemplate::new(
            "navbar",
            &["navbar", "nav", "menu"],
            defaults(&[("role", "navigation"), ("layout_type", "flow")]),
        ));
        library.push(AdaptableTemplate::new(
            "modal",
            &["modal", "dialog", "popup"],
            defaults(&[("layout_type", "centered")]),
        ));
        library.push(AdaptableTemplate::new(
            "form",
            &["form", "formulaire"],
            defaults(&[("role", "form"), ("layout_type", "stack")]),
        ));
        library
    }

    pub fn push(&mut self, template: AdaptableTemplate) {
        self.templates.push(template);
    }

    pub fn iter(&self) -> impl Iterator<Item = &AdaptableTemplate> {
        self.templates.iter()
    }
}

impl TemplateCatalog for TemplateLibrary {
    fn find_for_name(&self, name: &str) -> Option<&AdaptableTemplate> {
        let lowered = name.to_lowercase();
        self.templates
            .iter()
            .find(|template| template.matches(&lowered))
    }

    fn template_count(&self) -> usize {
        self.templates.len()
    }
}

#[cfg(test)]
mod tests {
    use super::{
        CatalogEntry, ComponentCatalog, InMemoryComponentCatalog, TemplateCatalog, TemplateLibrary,
    };
    use crate::model::level::Level;

    #[test]
    fn entries_land_in_their_level_partition() {
        let catalog = InMemoryComponentCatalog::from_entries([
            CatalogEntry::new("c1", "Frontend", Level::Corps, "PhaseShell"),
            CatalogEntry::new("a1", "Submit", Level::Atome, "PrimaryButton"),
            CatalogEntry::new("a2", "Cancel", Level::Atome, "GhostButton"),
        ]);

        assert_eq!(catalog.entries(Level::Corps).len(), 1);
        assert!(catalog.entries(Level::Organe).is_empty());
        assert_eq!(catalog.entries(Level::Atome).len(), 2);
        assert_eq!(catalog.total_entries(), 3);
    }

    #[test]
    fn catalog_parses_from_json() {
        let catalog = InMemoryComponentCatalog::from_json_str(
            r#"[{"id":"s1","name":"Header","level":"organe","component":"HeaderBar"}]"#,
        )
        .unwrap();
        assert_eq!(catalog.entries(Level::Organe)[0].component, "HeaderBar");
    }

    #[test]
    fn builtin_templates_match_french_and_english_keywords() {
        let library = TemplateLibrary::builtin();
        assert_eq!(library.template_count(), 6);
        assert_eq!(library.find_for_name("Bouton Valider").unwrap().kind, "button");
        assert_eq!(library.find_for_name("Email Field").unwrap().kind, "input");
        assert_eq!(library.find_for_name("Main Menu").unwrap().kind, "navbar");
        assert_eq!(library.find_for_name("Confirm Dialog").unwrap().kind, "modal");
        assert_eq!(library.find_for_name("Formulaire contact").unwrap().kind, "form");
        assert!(library.find_for_name("Zorb").is_none());
    }
}
