//! Integration tests - document observation to generated rules
//!
//! Tests the complete workflow: attributes → mutations → reconciliation →
//! inline custom properties, marker lists and the rule sheet.

use std::collections::BTreeMap;

use atomic_dom::{Document, NodeId, ShadowRootMode, StyleSheet, Storage};
use atomic_engine::{Engine, EngineError, Root, Settings, StyleError};

fn theme() -> Box<BTreeMap<String, String>> {
    Box::new(
        [
            ("--brand".to_string(), "#0af".to_string()),
            ("--btn--mixin".to_string(), "px:${0=4};radius:md".to_string()),
        ]
        .into_iter()
        .collect(),
    )
}

fn engine(settings: Settings) -> Engine<NodeId> {
    Engine::new(settings, theme(), StyleSheet::new())
}

fn element(doc: &mut Document, parent: NodeId, css: Option<&str>) -> NodeId {
    let node = doc.create_element("div");
    doc.append_child(parent, node).unwrap();
    if let Some(css) = css {
        doc.set_attribute(node, "css", css).unwrap();
    }
    node
}

fn markers(doc: &Document, node: NodeId) -> Vec<String> {
    doc.get_attribute(node, "atoms")
        .map(|m| m.split(' ').map(str::to_string).collect())
        .unwrap_or_default()
}

// ============================================================================
// OBSERVATION
// ============================================================================

#[test]
fn test_initial_observation() {
    let mut doc = Document::new();
    let body = doc.body();
    let a = element(&mut doc, body, Some("color:red"));
    let b = element(&mut doc, a, Some("md|p:2;color.hover:@brand"));
    let plain = element(&mut doc, a, None);

    let mut engine = engine(Settings::default());
    engine.attach(&mut doc);
    let root = doc.document_element();
    assert_eq!(engine.observe(&mut doc, root).unwrap(), 2);

    assert_eq!(markers(&doc, a).len(), 1);
    assert_eq!(markers(&doc, b).len(), 2);
    assert!(markers(&doc, plain).is_empty());
    assert_eq!(engine.sheet().len(), 3);

    let hover = &engine.observer().entries(b).unwrap()[1];
    assert_eq!(hover.name, "color.hover");
    assert_eq!(
        doc.style(b).unwrap().get_property_value(&hover.property),
        Some("var(--brand)")
    );
}

#[test]
fn test_attribute_change_diffs() {
    let mut doc = Document::new();
    let body = doc.body();
    let node = element(&mut doc, body, Some("color:red;opacity:0.5"));
    let mut engine = engine(Settings::default());
    engine.attach(&mut doc);
    let root = doc.document_element();
    engine.observe(&mut doc, root).unwrap();
    let before = engine.observer().entries(node).unwrap().to_vec();

    doc.set_attribute(node, "css", "opacity:0.5;z:3").unwrap();
    engine.sync(&mut doc).unwrap();

    let after = engine.observer().entries(node).unwrap();
    let style = doc.style(node).unwrap();
    assert!(style.get_property_value(&before[0].property).is_none());
    assert_eq!(style.get_property_value(&before[1].property), Some("0.5"));
    assert_eq!(style.get_property_value(&after[1].property), Some("3"));
    assert_eq!(
        markers(&doc, node),
        vec![after[0].entry.clone(), after[1].entry.clone()]
    );
}

#[test]
fn test_attribute_removed() {
    let mut doc = Document::new();
    let body = doc.body();
    let node = element(&mut doc, body, Some("color:red"));
    let mut engine = engine(Settings::default());
    engine.attach(&mut doc);
    let root = doc.document_element();
    engine.observe(&mut doc, root).unwrap();

    doc.remove_attribute(node, "css").unwrap();
    engine.sync(&mut doc).unwrap();

    assert!(doc.style(node).unwrap().is_empty());
    assert!(doc.get_attribute(node, "atoms").is_none());
    assert!(!engine.observer().is_tracked(node));
}

#[test]
fn test_added_subtree_discovered() {
    let mut doc = Document::new();
    let body = doc.body();
    let mut engine = engine(Settings::default());
    engine.attach(&mut doc);
    let root = doc.document_element();
    engine.observe(&mut doc, root).unwrap();

    let card = doc.create_element("section");
    doc.set_attribute(card, "css", "p:4").unwrap();
    let title = doc.create_element("h2");
    doc.set_attribute(title, "css", "fs:lg").unwrap();
    doc.append_child(card, title).unwrap();
    doc.append_child(body, card).unwrap();
    engine.sync(&mut doc).unwrap();

    assert!(engine.observer().is_tracked(card));
    assert!(engine.observer().is_tracked(title));
    let entry = &engine.observer().entries(title).unwrap()[0];
    assert_eq!(entry.value, "var(--font-size-lg)");
}

#[test]
fn test_removed_subtree_forgotten() {
    let mut doc = Document::new();
    let body = doc.body();
    let outer = element(&mut doc, body, Some("p:1"));
    let inner = element(&mut doc, outer, Some("m:1"));
    let mut engine = engine(Settings::default());
    engine.attach(&mut doc);
    let root = doc.document_element();
    engine.observe(&mut doc, root).unwrap();
    assert_eq!(engine.observer().len(), 2);

    doc.remove_child(body, outer).unwrap();
    engine.sync(&mut doc).unwrap();
    assert!(!engine.observer().is_tracked(outer));
    assert!(!engine.observer().is_tracked(inner));
}

#[test]
fn test_removed_with_attribute_change_not_retracked() {
    let mut doc = Document::new();
    let body = doc.body();
    let outer = element(&mut doc, body, Some("p:1"));
    let inner = element(&mut doc, outer, Some("m:1"));
    let mut engine = engine(Settings::default());
    engine.attach(&mut doc);
    let root = doc.document_element();
    engine.observe(&mut doc, root).unwrap();

    doc.set_attribute(inner, "css", "m:2").unwrap();
    doc.remove_child(body, outer).unwrap();
    engine.sync(&mut doc).unwrap();

    assert!(!engine.observer().is_tracked(outer));
    assert!(!engine.observer().is_tracked(inner));
    assert_eq!(engine.observer().len(), 0);
}

#[test]
fn test_detached_node_ignored() {
    let mut doc = Document::new();
    let mut engine = engine(Settings::default());
    engine.attach(&mut doc);
    let root = doc.document_element();
    engine.observe(&mut doc, root).unwrap();
    let rules = engine.sheet().len();

    let detached = doc.create_element("div");
    doc.set_attribute(detached, "css", "color:red").unwrap();
    engine.sync(&mut doc).unwrap();

    assert!(!engine.observer().is_tracked(detached));
    assert!(doc.style(detached).unwrap().is_empty());
    assert!(markers(&doc, detached).is_empty());
    assert_eq!(engine.sheet().len(), rules);

    // Attaching it later picks it up
    let body = doc.body();
    doc.append_child(body, detached).unwrap();
    engine.sync(&mut doc).unwrap();
    assert!(engine.observer().is_tracked(detached));
    assert_eq!(markers(&doc, detached).len(), 1);
}

#[test]
fn test_unobserve() {
    let mut doc = Document::new();
    let body = doc.body();
    let node = element(&mut doc, body, Some("p:1"));
    let mut engine = engine(Settings::default());
    let root = doc.document_element();
    engine.observe(&mut doc, root).unwrap();
    engine.unobserve(&doc, body);
    assert!(!engine.observer().is_tracked(node));
}

#[test]
fn test_shadow_root_children() {
    let mut doc = Document::new();
    let body = doc.body();
    let host = element(&mut doc, body, None);
    doc.attach_shadow(host, ShadowRootMode::Open).unwrap();
    let inside = doc.create_element("span");
    doc.set_attribute(inside, "css", "color:red").unwrap();
    doc.append_shadow_child(host, inside).unwrap();

    let mut engine = engine(Settings::default());
    let root = doc.document_element();
    engine.observe(&mut doc, root).unwrap();
    assert!(engine.observer().is_tracked(inside));
}

// ============================================================================
// COMPOSITION
// ============================================================================

#[test]
fn test_apply_attribute() {
    let mut doc = Document::new();
    let body = doc.body();
    let node = element(&mut doc, body, Some("justify-content:start"));
    doc.set_attribute(node, "apply", "center;btn:2").unwrap();

    let mut engine = engine(Settings::default());
    let root = doc.document_element();
    engine.observe(&mut doc, root).unwrap();

    let entries = engine.observer().entries(node).unwrap();
    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "display",
            "align-items",
            "justify-content",
            "padding-left",
            "padding-right",
            "border-radius",
        ]
    );
    // The literal declaration overrides the mixin's value in place
    assert_eq!(entries[2].value, "start");
}

#[test]
fn test_legacy_attributes() {
    let mut doc = Document::new();
    let body = doc.body();
    let node = element(&mut doc, body, Some("color:blue"));
    doc.set_attribute(node, "x-color", "red").unwrap();
    doc.set_attribute(node, "x-flex", "").unwrap();

    let settings = Settings {
        legacy_attributes: true,
        ..Settings::default()
    };
    let mut engine = engine(settings);
    engine.attach(&mut doc);
    let root = doc.document_element();
    engine.observe(&mut doc, root).unwrap();

    let entries = engine.observer().entries(node).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].value, "blue");

    doc.set_attribute(node, "x-opacity", "0.2").unwrap();
    engine.sync(&mut doc).unwrap();
    assert_eq!(engine.observer().entries(node).unwrap().len(), 3);
}

#[test]
fn test_custom_mixin_cycle_is_error() {
    let mut doc = Document::new();
    let body = doc.body();
    let node = element(&mut doc, body, None);
    let mut engine = engine(Settings::default());
    engine.register_mixin("a", |_: &Settings, _: &[String]| "^b");
    engine.register_mixin("b", |_: &Settings, _: &[String]| "^a");
    engine.attach(&mut doc);
    let root = doc.document_element();
    engine.observe(&mut doc, root).unwrap();

    doc.set_attribute(node, "apply", "a").unwrap();
    let err = engine.sync(&mut doc).unwrap_err();
    assert!(matches!(
        err,
        EngineError::Style(StyleError::MixinCycle { ref path }) if path == "a->b->a"
    ));
    assert!(doc.style(node).unwrap().is_empty());
}

// ============================================================================
// CACHE
// ============================================================================

fn cached(version: &str) -> Settings {
    Settings {
        cache_key: Some("atoms".to_string()),
        cache_version: version.to_string(),
        ..Settings::default()
    }
}

#[test]
fn test_persist_and_restore() {
    let mut store = Storage::new();

    let mut doc = Document::new();
    let body = doc.body();
    element(&mut doc, body, Some("color:red;md|p:2;child!m:1"));
    let mut first = engine(cached("1"));
    assert_eq!(first.restore(&mut store), 0);
    let root = doc.document_element();
    first.observe(&mut doc, root).unwrap();
    first.persist(&mut store).unwrap();
    assert_eq!(store.get_item("atoms"), Some("1"));

    let mut second = engine(cached("1"));
    assert_eq!(second.restore(&mut store), 3);
    assert_eq!(second.sheet().rules(), first.sheet().rules());

    let mut other = Document::new();
    let body = other.body();
    element(&mut other, body, Some("color:red"));
    let root = other.document_element();
    second.observe(&mut other, root).unwrap();
    assert_eq!(second.sheet().len(), 3);
}

#[test]
fn test_version_bump_evicts() {
    let mut store = Storage::new();
    let mut doc = Document::new();
    let body = doc.body();
    element(&mut doc, body, Some("color:red"));

    let mut first = engine(cached("1"));
    first.restore(&mut store);
    let root = doc.document_element();
    first.observe(&mut doc, root).unwrap();
    first.persist(&mut store).unwrap();

    let mut second = engine(cached("2"));
    assert_eq!(second.restore(&mut store), 0);
    assert_eq!(store.get_item("atoms"), Some("2"));
    assert!(store.get_item("atoms:1").is_none());
    assert!(second.sheet().is_empty());
}

#[test]
fn test_corrupt_cache_ignored() {
    let mut store = Storage::new();
    store.set_item("atoms", "1");
    store.set_item("atoms:1", "{broken");
    let mut engine = engine(cached("1"));
    assert_eq!(engine.restore(&mut store), 0);
    assert!(store.get_item("atoms:1").is_none());
}

#[test]
fn test_with_root() {
    let engine: Engine<NodeId> =
        Engine::with_root(Settings::default(), Root::empty(), StyleSheet::new());
    assert!(engine.sheet().is_empty());
    assert!(engine.observer().is_empty());
}
