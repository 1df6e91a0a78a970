use genome_core::resolve::contextualizer::{
    EXACT_MATCH_CONFIDENCE, FUZZY_CONFIDENCE_SCALE, GENERATION_CONFIDENCE, TEMPLATE_CONFIDENCE,
};
use genome_core::similarity::similarity;
use genome_core::{
    load_genome_value, CatalogEntry, ComponentContextualizer, InMemoryComponentCatalog, Level,
    MatchedEntity, TemplateLibrary, Tier,
};
use serde_json::json;

fn contextualizer() -> ComponentContextualizer<InMemoryComponentCatalog, TemplateLibrary> {
    let catalog = InMemoryComponentCatalog::from_entries([
        CatalogEntry::new("phase-frontend", "Frontend", Level::Corps, "PhaseShell"),
        CatalogEntry::new("section-header", "Header", Level::Organe, "HeaderBar"),
        CatalogEntry::new("feature-search", "Product Search", Level::Cellule, "SearchPanel"),
        CatalogEntry::new("atom-submit", "Submit Button", Level::Atome, "PrimaryButton"),
    ]);
    ComponentContextualizer::new(catalog, TemplateLibrary::builtin())
}

#[test]
fn exact_catalog_name_resolves_to_tier_one() {
    let strategy = contextualizer().resolve("Frontend", Level::Corps);

    assert_eq!(strategy.tier, Tier::Exact);
    assert_eq!(strategy.confidence, EXACT_MATCH_CONFIDENCE);
    assert_eq!(strategy.confidence, 0.95);
    assert!(strategy.generation_request.is_none());
    match strategy.matched {
        Some(MatchedEntity::Catalog { entry, similarity: score }) => {
            assert_eq!(entry.component, "PhaseShell");
            assert_eq!(score, 1.0);
        }
        other => panic!("unexpected match: {other:?}"),
    }
}

#[test]
fn exact_match_ignores_case_but_not_level() {
    let resolver = contextualizer();

    assert_eq!(resolver.resolve("frontEND", Level::Corps).tier, Tier::Exact);
    // same name in another level partition does not match
    let strategy = resolver.resolve("Frontend", Level::Atome);
    assert_eq!(strategy.tier, Tier::Generate);
}

#[test]
fn close_name_resolves_through_fuzzy_match() {
    let strategy = contextualizer().resolve("Product Serch", Level::Cellule);

    let expected = similarity("product serch", "product search");
    assert!(expected > 0.7);
    assert_eq!(strategy.tier, Tier::Exact);
    assert!((strategy.confidence - expected * FUZZY_CONFIDENCE_SCALE).abs() < 1e-9);
    assert!(strategy.confidence < EXACT_MATCH_CONFIDENCE);
    assert!(matches!(
        strategy.matched,
        Some(MatchedEntity::Catalog { ref entry, .. }) if entry.id == "feature-search"
    ));
}

#[test]
fn keyword_name_resolves_to_template() {
    let resolver = contextualizer();

    let strategy = resolver.resolve("Bouton Annuler", Level::Atome);
    assert_eq!(strategy.tier, Tier::Adaptable);
    assert_eq!(strategy.confidence, TEMPLATE_CONFIDENCE);
    match strategy.matched {
        Some(MatchedEntity::Template { template }) => assert_eq!(template.kind, "button"),
        other => panic!("unexpected match: {other:?}"),
    }

    let modal = resolver.resolve("Delete confirmation dialog", Level::Cellule);
    assert_eq!(modal.tier, Tier::Adaptable);
}

#[test]
fn unknown_name_requires_generation() {
    let strategy = contextualizer().resolve("ZorbMcNonexistent", Level::Atome);

    assert_eq!(strategy.tier, Tier::Generate);
    assert_eq!(strategy.tier.number(), 3);
    assert_eq!(strategy.confidence, GENERATION_CONFIDENCE);
    assert_eq!(strategy.confidence, 0.5);
    assert!(strategy.matched.is_none());
    let request = strategy.generation_request.unwrap();
    assert_eq!(request.name, "ZorbMcNonexistent");
    assert_eq!(request.level, Level::Atome);
}

#[test]
fn contextualize_copies_allow_listed_hints() {
    let tree = load_genome_value(json!({
        "n0": [{
            "name": "Frontend",
            "role": "shell",
            "density": "compact",
            "accent_color": "#FF5722",
            "source": "import",
            "id": "p-1",
            "n1": [{ "visual_hint": "hero" }]
        }]
    }))
    .unwrap();
    let resolver = contextualizer();

    let context = resolver.contextualize_path(&tree, "n0[0]").unwrap();
    assert_eq!(context.name, "Frontend");
    assert_eq!(context.level, Level::Corps);
    assert_eq!(context.strategy.tier, Tier::Exact);
    assert_eq!(context.semantic_hints.len(), 3);
    assert_eq!(context.semantic_hints["role"], json!("shell"));
    assert_eq!(context.semantic_hints["accent_color"], json!("#FF5722"));
    assert!(!context.semantic_hints.contains_key("source"));
    assert!(!context.semantic_hints.contains_key("name"));

    let unnamed = resolver.contextualize_path(&tree, "n0[0].n1[0]").unwrap();
    assert_eq!(unnamed.name, "Organe 0");
    assert_eq!(unnamed.path.to_string(), "n0[0].n1_sections[0]");
    assert_eq!(unnamed.semantic_hints["visual_hint"], json!("hero"));

    assert!(resolver.contextualize_path(&tree, "n0[3]").is_err());
}

#[test]
fn statistics_count_entries_per_level() {
    let stats = contextualizer().statistics();

    assert_eq!(stats.total_entries, 4);
    assert_eq!(stats.entries_per_level, [1, 1, 1, 1]);
    assert_eq!(stats.template_count, 6);
}
