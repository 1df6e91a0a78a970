//! Semantic property catalog and the forbidden presentation set.
//!
//! # Invariants
//! - Catalog names are unique; a later insert replaces an earlier definition.
//! - The forbidden set is independent of the catalog: a name may appear in
//!   both, and the forbidden set still wins during validation.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};

/// Property grouping used for browsing and event attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyCategory {
    Layout,
    Visual,
    Interaction,
    Content,
    Metadata,
}

impl PropertyCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Layout => "layout",
            Self::Visual => "visual",
            Self::Interaction => "interaction",
            Self::Content => "content",
            Self::Metadata => "metadata",
        }
    }
}

impl Display for PropertyCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepted values for one property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValueDomain {
    /// Exactly one of the listed strings.
    Enumeration { values: Vec<String> },
    /// Any string.
    FreeString,
    /// Any JSON number, optionally bounded (inclusive).
    Number { min: Option<f64>, max: Option<f64> },
    /// `#RGB` or `#RRGGBB`.
    HexColor,
}

impl ValueDomain {
    pub fn enumeration(values: &[&str]) -> Self {
        Self::Enumeration {
            values: values.iter().map(|value| value.to_string()).collect(),
        }
    }
}

/// Catalog entry for one semantic property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDefinition {
    pub name: String,
    pub category: PropertyCategory,
    pub domain: ValueDomain,
    pub description: String,
}

impl PropertyDefinition {
    pub fn new(
        name: impl Into<String>,
        category: PropertyCategory,
        domain: ValueDomain,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            category,
            domain,
            description: description.into(),
        }
    }
}

/// Set of known semantic properties, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct PropertyCatalog {
    definitions: BTreeMap<String, PropertyDefinition>,
}

impl PropertyCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog shipped with the core.
    pub fn builtin() -> Self {
        use PropertyCategory::{Content, Interaction, Layout, Metadata, Visual};

        let mut catalog = Self::new();
        for definition in [
            PropertyDefinition::new(
                "layout_type",
                Layout,
                ValueDomain::enumeration(&["grid", "list", "stack", "flow", "split", "centered"]),
                "Arrangement strategy for the node's children",
            ),
            PropertyDefinition::new(
                "density",
                Layout,
                ValueDomain::enumeration(&["compact", "comfortable", "spacious"]),
                "How much breathing room the content gets",
            ),
            PropertyDefinition::new(
                "distribution",
                Layout,
                ValueDomain::enumeration(&[
                    "start",
                    "center",
                    "end",
                    "space_between",
                    "space_around",
                ]),
                "How children share the available space",
            ),
            PropertyDefinition::new(
                "visual_hint",
                Visual,
                ValueDomain::FreeString,
                "Free-form visual intent, e.g. `hero`, `subtle`, `dashboard-card`",
            ),
            PropertyDefinition::new(
                "accent_color",
                Visual,
                ValueDomain::HexColor,
                "Brand accent associated with the node",
            ),
            PropertyDefinition::new(
                "importance",
                Visual,
                ValueDomain::enumeration(&["primary", "secondary", "tertiary"]),
                "Relative emphasis among siblings",
            ),
            PropertyDefinition::new(
                "tone",
                Visual,
                ValueDomain::enumeration(&["neutral", "positive", "warning", "critical"]),
                "Emotional register of the node",
            ),
            PropertyDefinition::new(
                "interaction_type",
                Interaction,
                ValueDomain::enumeration(&["click", "hover", "drag", "input", "scroll", "none"]),
                "Primary way a user engages with the node",
            ),
            PropertyDefinition::new(
                "state",
                Interaction,
                ValueDomain::enumeration(&["default", "active", "disabled", "loading"]),
                "Interaction state the node starts in",
            ),
            PropertyDefinition::new(
                "name",
                Content,
                ValueDomain::FreeString,
                "Display name of the node",
            ),
            PropertyDefinition::new(
                "description",
                Content,
                ValueDomain::FreeString,
                "What the node is for, in plain language",
            ),
            PropertyDefinition::new(
                "role",
                Content,
                ValueDomain::FreeString,
                "Functional role, e.g. `navigation`, `form`, `summary`",
            ),
            PropertyDefinition::new(
                "label",
                Content,
                ValueDomain::FreeString,
                "User-facing text carried by the node",
            ),
            PropertyDefinition::new(
                "id",
                Metadata,
                ValueDomain::FreeString,
                "Stable identifier from the source document",
            ),
            PropertyDefinition::new(
                "confidence",
                Metadata,
                ValueDomain::Number {
                    min: Some(0.0),
                    max: Some(1.0),
                },
                "Confidence of the inference that produced the node",
            ),
            PropertyDefinition::new(
                "priority",
                Metadata,
                ValueDomain::Number {
                    min: Some(0.0),
                    max: None,
                },
                "Ordering hint; lower comes first",
            ),
            PropertyDefinition::new(
                "source",
                Metadata,
                ValueDomain::FreeString,
                "Origin of the node (import, manual edit, inference)",
            ),
        ] {
            catalog.insert(definition);
        }
        catalog
    }

    /// Adds or replaces a definition.
    pub fn insert(&mut self, definition: PropertyDefinition) {
        self.definitions.insert(definition.name.clone(), definition);
    }

    pub fn get(&self, name: &str) -> Option<&PropertyDefinition> {
        self.definitions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Definitions sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = &PropertyDefinition> {
        self.definitions.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }
}

const BUILTIN_FORBIDDEN: &[&str] = &[
    // box model
    "margin",
    "margin-top",
    "margin-right",
    "margin-bottom",
    "margin-left",
    "padding",
    "padding-top",
    "padding-right",
    "padding-bottom",
    "padding-left",
    "width",
    "height",
    "min-width",
    "min-height",
    "max-width",
    "max-height",
    "border",
    "border-width",
    "border-color",
    "border-radius",
    "box-shadow",
    "box-sizing",
    // layout engine
    "display",
    "position",
    "top",
    "right",
    "bottom",
    "left",
    "float",
    "clear",
    "z-index",
    "overflow",
    "flex",
    "flex-direction",
    "flex-wrap",
    "justify-content",
    "align-items",
    "align-self",
    "gap",
    "grid",
    "grid-template-columns",
    "grid-template-rows",
    "grid-area",
    // typography
    "font",
    "font-family",
    "font-size",
    "font-weight",
    "font-style",
    "line-height",
    "letter-spacing",
    "text-align",
    "text-decoration",
    "text-transform",
    // paint
    "color",
    "background",
    "background-color",
    "background-image",
    "opacity",
    "transform",
    "transition",
    "animation",
    "cursor",
    "visibility",
    "class",
    "classname",
    "style",
];

static CAMEL_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("camel-case boundary regex is valid"));

/// Presentation-layer names that can never be stored in the genome.
#[derive(Debug, Clone)]
pub struct ForbiddenPropertySet {
    names: BTreeSet<String>,
}

impl Default for ForbiddenPropertySet {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ForbiddenPropertySet {
    /// CSS-like box-model, layout, typography and paint keys.
    pub fn builtin() -> Self {
        Self::from_names(BUILTIN_FORBIDDEN.iter().copied())
    }

    pub fn from_names<'n>(names: impl IntoIterator<Item = &'n str>) -> Self {
        Self {
            names: names.into_iter().map(normalize_css_name).collect(),
        }
    }

    /// Membership after folding case, `_` and camelCase to kebab-case.
    pub fn contains(&self, property: &str) -> bool {
        self.names.contains(&normalize_css_name(property))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

/// `backgroundColor` / `background_color` / `Background-Color` -> `background-color`.
fn normalize_css_name(name: &str) -> String {
    CAMEL_BOUNDARY
        .replace_all(name.trim(), "${1}-${2}")
        .replace('_', "-")
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::{normalize_css_name, ForbiddenPropertySet, PropertyCatalog};

    #[test]
    fn css_names_fold_to_kebab_case() {
        assert_eq!(normalize_css_name("backgroundColor"), "background-color");
        assert_eq!(normalize_css_name("font_size"), "font-size");
        assert_eq!(normalize_css_name("Z-Index"), "z-index");
    }

    #[test]
    fn builtin_forbidden_set_matches_spelling_variants() {
        let forbidden = ForbiddenPropertySet::builtin();
        assert!(forbidden.contains("background-color"));
        assert!(forbidden.contains("backgroundColor"));
        assert!(forbidden.contains("margin_top"));
        assert!(!forbidden.contains("accent_color"));
        assert!(!forbidden.contains("density"));
    }

    #[test]
    fn builtin_catalog_has_no_forbidden_names() {
        let forbidden = ForbiddenPropertySet::builtin();
        let catalog = PropertyCatalog::builtin();
        assert!(catalog.names().all(|name| !forbidden.contains(name)));
    }
}
