//! Legality checks for `(property, value)` pairs.
//!
//! # Responsibility
//! - Be the only authority deciding whether a property change is storable.
//! - Offer authoring aids (category browsing, intent suggestions) that never
//!   influence validation.
//!
//! # Invariants
//! - Check order is fixed: forbidden set, structural keys, null values, then
//!   catalog domain, then unknown.
//! - A forbidden name is rejected whatever the value and whatever the catalog says.
//! - Unknown names are accepted with a warning unless they collide with a
//!   level collection key.

use crate::model::level::Level;
use crate::semantic::catalog::{
    ForbiddenPropertySet, PropertyCatalog, PropertyCategory, PropertyDefinition, ValueDomain,
};
use crate::similarity::closest_matches;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

const SUGGESTION_CUTOFF: f64 = 0.6;
const MAX_SUGGESTIONS: usize = 3;

static HEX_COLOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("valid hex color regex")
});

/// Authoring-aid table: lowercase keyword fragment -> suggested properties.
const INTENT_KEYWORDS: &[(&str, &[&str])] = &[
    ("espace", &["density", "distribution"]),
    ("space", &["density", "distribution"]),
    ("aéré", &["density"]),
    ("dense", &["density"]),
    ("compact", &["density"]),
    ("couleur", &["accent_color", "visual_hint"]),
    ("color", &["accent_color", "visual_hint"]),
    ("colour", &["accent_color", "visual_hint"]),
    ("important", &["importance"]),
    ("priorit", &["importance", "priority"]),
    ("dispos", &["layout_type", "distribution"]),
    ("layout", &["layout_type", "distribution"]),
    ("grille", &["layout_type"]),
    ("grid", &["layout_type"]),
    ("align", &["distribution"]),
    ("clic", &["interaction_type"]),
    ("click", &["interaction_type"]),
    ("interact", &["interaction_type", "state"]),
    ("désactiv", &["state"]),
    ("disabled", &["state"]),
    ("texte", &["label", "description"]),
    ("text", &["label", "description"]),
    ("rôle", &["role"]),
    ("role", &["role"]),
    ("ambiance", &["tone", "visual_hint"]),
    ("mood", &["tone", "visual_hint"]),
    ("confian", &["confidence"]),
];

/// Reason a property change is rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Presentation attribute; never storable.
    ForbiddenProperty { property: String },
    /// Name of a level collection (`n1`, `n1_sections`, ...).
    ReservedKey { property: String },
    /// `null` is the log's marker for an absent value.
    NullValue { property: String },
    /// Value is not one of the enumerated options.
    NotInEnumeration {
        property: String,
        value: String,
        allowed: Vec<String>,
    },
    ExpectedString { property: String },
    ExpectedNumber { property: String },
    OutOfRange {
        property: String,
        value: f64,
        min: Option<f64>,
        max: Option<f64>,
    },
    InvalidHexColor { property: String, value: String },
}

impl ValidationError {
    pub fn property(&self) -> &str {
        match self {
            Self::ForbiddenProperty { property }
            | Self::ReservedKey { property }
            | Self::NullValue { property }
            | Self::NotInEnumeration { property, .. }
            | Self::ExpectedString { property }
            | Self::ExpectedNumber { property }
            | Self::OutOfRange { property, .. }
            | Self::InvalidHexColor { property, .. } => property,
        }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ForbiddenProperty { property } => write!(
                f,
                "property `{property}` is forbidden: presentation attributes cannot be stored in the genome"
            ),
            Self::NotInEnumeration {
                property,
                value,
                allowed,
            } => write!(
                f,
                "value `{value}` is not allowed for `{property}`; expected one of: {}",
                allowed.join(", ")
            ),
            Self::ReservedKey { property } => write!(
                f,
                "property `{property}` is reserved: it names a level collection"
            ),
            Self::NullValue { property } => {
                write!(f, "property `{property}` cannot be set to null")
            }
            Self::ExpectedString { property } => {
                write!(f, "property `{property}` expects a string value")
            }
            Self::ExpectedNumber { property } => {
                write!(f, "property `{property}` expects a numeric value")
            }
            Self::OutOfRange {
                property,
                value,
                min,
                max,
            } => {
                let low = min.map_or("-inf".to_string(), |v| v.to_string());
                let high = max.map_or("+inf".to_string(), |v| v.to_string());
                write!(
                    f,
                    "value {value} for `{property}` is outside [{low}, {high}]"
                )
            }
            Self::InvalidHexColor { property, value } => write!(
                f,
                "value `{value}` for `{property}` is not a #RGB or #RRGGBB hex color"
            ),
        }
    }
}

impl Error for ValidationError {}

/// Outcome of one validation call.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub valid: bool,
    pub error: Option<ValidationError>,
    /// Non-fatal notes, e.g. unknown property names.
    pub warnings: Vec<String>,
    /// Catalog names close to an unknown property.
    pub suggestions: Vec<String>,
}

impl ValidationReport {
    fn accepted() -> Self {
        Self {
            valid: true,
            error: None,
            warnings: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    fn rejected(error: ValidationError) -> Self {
        Self {
            valid: false,
            error: Some(error),
            warnings: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    /// Converts into `Ok(warnings)` or `Err(error)`.
    pub fn into_result(self) -> Result<Vec<String>, ValidationError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.warnings),
        }
    }
}

/// Validator over a property catalog and a forbidden set.
#[derive(Debug, Clone)]
pub struct SemanticPropertySystem {
    catalog: PropertyCatalog,
    forbidden: ForbiddenPropertySet,
}

impl Default for SemanticPropertySystem {
    fn default() -> Self {
        Self::new(PropertyCatalog::builtin(), ForbiddenPropertySet::builtin())
    }
}

impl SemanticPropertySystem {
    pub fn new(catalog: PropertyCatalog, forbidden: ForbiddenPropertySet) -> Self {
        Self { catalog, forbidden }
    }

    /// Validates one property change.
    pub fn validate(&self, property: &str, value: &Value) -> ValidationReport {
        if self.forbidden.contains(property) {
            return ValidationReport::rejected(ValidationError::ForbiddenProperty {
                property: property.to_string(),
            });
        }
        if Level::from_key(property).is_some() {
            return ValidationReport::rejected(ValidationError::ReservedKey {
                property: property.to_string(),
            });
        }
        if value.is_null() {
            return ValidationReport::rejected(ValidationError::NullValue {
                property: property.to_string(),
            });
        }

        if let Some(definition) = self.catalog.get(property) {
            return match check_domain(definition, value) {
                Ok(()) => ValidationReport::accepted(),
                Err(error) => ValidationReport::rejected(error),
            };
        }

        let suggestions: Vec<String> =
            closest_matches(property, self.catalog.names(), MAX_SUGGESTIONS, SUGGESTION_CUTOFF)
                .into_iter()
                .map(|(name, _)| name.to_string())
                .collect();
        let mut warning = format!("unknown semantic property `{property}`");
        if !suggestions.is_empty() {
            warning.push_str(&format!("; did you mean: {}?", suggestions.join(", ")));
        }

        let mut report = ValidationReport::accepted();
        report.warnings.push(warning);
        report.suggestions = suggestions;
        report
    }

    pub fn is_forbidden(&self, property: &str) -> bool {
        self.forbidden.contains(property)
    }

    pub fn definition(&self, property: &str) -> Option<&PropertyDefinition> {
        self.catalog.get(property)
    }

    pub fn properties_by_category(&self, category: PropertyCategory) -> Vec<&PropertyDefinition> {
        self.catalog
            .iter()
            .filter(|definition| definition.category == category)
            .collect()
    }

    pub fn all_properties(&self) -> Vec<&PropertyDefinition> {
        self.catalog.iter().collect()
    }

    /// Candidate properties for a free-text authoring intent.
    ///
    /// Keyword lookup only; the result never affects `validate`.
    pub fn suggest_for_intent(&self, intent: &str) -> Vec<&PropertyDefinition> {
        let lowered = intent.to_lowercase();
        let mut found: Vec<&PropertyDefinition> = Vec::new();
        for (keyword, properties) in INTENT_KEYWORDS {
            if !lowered.contains(keyword) {
                continue;
            }
            for name in properties.iter() {
                if let Some(definition) = self.catalog.get(name) {
                    if !found.iter().any(|known| known.name == definition.name) {
                        found.push(definition);
                    }
                }
            }
        }
        found
    }
}

fn check_domain(definition: &PropertyDefinition, value: &Value) -> Result<(), ValidationError> {
    let property = || definition.name.clone();
    match &definition.domain {
        ValueDomain::FreeString => value
            .as_str()
            .map(|_| ())
            .ok_or_else(|| ValidationError::ExpectedString {
                property: property(),
            }),
        ValueDomain::Enumeration { values } => {
            let text = value.as_str().ok_or_else(|| ValidationError::ExpectedString {
                property: property(),
            })?;
            if values.iter().any(|allowed| allowed == text) {
                Ok(())
            } else {
                Err(ValidationError::NotInEnumeration {
                    property: property(),
                    value: text.to_string(),
                    allowed: values.clone(),
                })
            }
        }
        ValueDomain::Number { min, max } => {
            let number = value.as_f64().ok_or_else(|| ValidationError::ExpectedNumber {
                property: property(),
            })?;
            let below = min.is_some_and(|min| number < min);
            let above = max.is_some_and(|max| number > max);
            if below || above {
                return Err(ValidationError::OutOfRange {
                    property: property(),
                    value: number,
                    min: *min,
                    max: *max,
                });
            }
            Ok(())
        }
        ValueDomain::HexColor => {
            let text = value.as_str().ok_or_else(|| ValidationError::ExpectedString {
                property: property(),
            })?;
            if HEX_COLOR_RE.is_match(text) {
                Ok(())
            } else {
                Err(ValidationError::InvalidHexColor {
                    property: property(),
                    value: text.to_string(),
                })
            }
        }
    }
}
