use genome_core::{
    ForbiddenPropertySet, PropertyCatalog, PropertyCategory, PropertyDefinition,
    SemanticPropertySystem, ValidationError, ValueDomain,
};
use serde_json::json;

#[test]
fn every_builtin_forbidden_name_is_rejected() {
    let system = SemanticPropertySystem::default();
    let forbidden = ForbiddenPropertySet::builtin();
    assert!(!forbidden.is_empty());

    for name in forbidden.iter() {
        let report = system.validate(name, &json!("anything"));
        assert!(!report.valid, "{name} was accepted");
        assert!(matches!(
            report.error,
            Some(ValidationError::ForbiddenProperty { .. })
        ));
    }
}

#[test]
fn forbidden_error_names_the_property() {
    let system = SemanticPropertySystem::default();
    let report = system.validate("background-color", &json!("#FF5722"));

    let error = report.error.unwrap();
    assert_eq!(error.property(), "background-color");
    assert!(error.to_string().contains("background-color"));
    assert!(error.to_string().contains("forbidden"));
}

#[test]
fn forbidden_set_wins_over_catalog_entry() {
    let mut catalog = PropertyCatalog::builtin();
    catalog.insert(PropertyDefinition::new(
        "color",
        PropertyCategory::Visual,
        ValueDomain::FreeString,
        "clashes with the presentation set",
    ));
    let system = SemanticPropertySystem::new(catalog, ForbiddenPropertySet::builtin());

    let report = system.validate("color", &json!("red"));
    assert!(matches!(
        report.error,
        Some(ValidationError::ForbiddenProperty { .. })
    ));
}

#[test]
fn spelling_variants_of_forbidden_names_are_rejected() {
    let system = SemanticPropertySystem::default();
    for name in ["backgroundColor", "font_size", "Margin-Top", "zIndex"] {
        assert!(system.is_forbidden(name), "{name}");
        assert!(!system.validate(name, &json!(1)).valid);
    }
}

#[test]
fn catalog_domains_are_enforced() {
    let system = SemanticPropertySystem::default();

    assert!(system.validate("density", &json!("compact")).valid);
    assert!(matches!(
        system.validate("density", &json!("cramped")).error,
        Some(ValidationError::NotInEnumeration { .. })
    ));
    assert!(matches!(
        system.validate("density", &json!(3)).error,
        Some(ValidationError::ExpectedString { .. })
    ));

    assert!(system.validate("accent_color", &json!("#FF5722")).valid);
    assert!(system.validate("accent_color", &json!("#abc")).valid);
    assert!(matches!(
        system.validate("accent_color", &json!("#FF572")).error,
        Some(ValidationError::InvalidHexColor { .. })
    ));
    assert!(matches!(
        system.validate("accent_color", &json!("red")).error,
        Some(ValidationError::InvalidHexColor { .. })
    ));

    assert!(system.validate("confidence", &json!(0.8)).valid);
    assert!(matches!(
        system.validate("confidence", &json!(1.5)).error,
        Some(ValidationError::OutOfRange { .. })
    ));
    assert!(matches!(
        system.validate("confidence", &json!("high")).error,
        Some(ValidationError::ExpectedNumber { .. })
    ));
}

#[test]
fn unknown_property_is_accepted_with_suggestions() {
    let system = SemanticPropertySystem::default();
    let report = system.validate("densty", &json!("compact"));

    assert!(report.valid);
    assert!(report.error.is_none());
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("densty"));
    assert_eq!(report.suggestions.first().map(String::as_str), Some("density"));
    assert!(report.suggestions.len() <= 3);
}

#[test]
fn unrelated_unknown_property_gets_no_suggestions() {
    let system = SemanticPropertySystem::default();
    let report = system.validate("zzqx", &json!(true));

    assert!(report.valid);
    assert!(report.suggestions.is_empty());
    assert_eq!(report.warnings.len(), 1);
}

#[test]
fn level_collection_keys_are_reserved() {
    let system = SemanticPropertySystem::default();

    for key in ["n0", "n0_phases", "n1", "n1_sections", "n2_features", "n3_ui_elements"] {
        let report = system.validate(key, &json!("oops"));
        assert!(!report.valid, "{key} accepted");
        assert_eq!(
            report.error,
            Some(ValidationError::ReservedKey {
                property: key.to_string()
            })
        );
    }
    assert!(system.validate("n4", &json!("x")).valid);
}

#[test]
fn null_values_are_rejected_for_any_name() {
    let system = SemanticPropertySystem::default();

    for property in ["density", "draft_note"] {
        let report = system.validate(property, &json!(null));
        assert!(matches!(
            report.error,
            Some(ValidationError::NullValue { .. })
        ));
        assert!(report.warnings.is_empty());
    }
}

#[test]
fn lookups_and_browsing() {
    let system = SemanticPropertySystem::default();

    let definition = system.definition("accent_color").unwrap();
    assert_eq!(definition.category, PropertyCategory::Visual);
    assert!(system.definition("margin").is_none());

    let layout = system.properties_by_category(PropertyCategory::Layout);
    assert!(layout.iter().any(|definition| definition.name == "density"));
    assert!(layout
        .iter()
        .all(|definition| definition.category == PropertyCategory::Layout));
    assert_eq!(
        system.all_properties().len(),
        PropertyCatalog::builtin().len()
    );
}

#[test]
fn intent_suggestions_cover_french_and_english() {
    let system = SemanticPropertySystem::default();

    let spacing = system.suggest_for_intent("Plus d'espace entre les cartes");
    assert!(spacing.iter().any(|definition| definition.name == "density"));

    let color = system.suggest_for_intent("change the brand color");
    assert!(color.iter().any(|definition| definition.name == "accent_color"));

    assert!(system.suggest_for_intent("qwerty").is_empty());
}
