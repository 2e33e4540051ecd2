//! Comprehensive tests for atomic-css
//!
//! Resolution, ranking and reconciliation against the atomic-dom
//! document and stylesheet.

use std::collections::BTreeMap;

use atomic_css::{
    rank_key, AppliedEntry, Root, Settings, StyleError, StyleHandler, UNRENDERABLE,
};
use atomic_dom::{Document, NodeId, StyleSheet};

fn theme() -> Root {
    let vars: BTreeMap<String, String> = [
        ("--brand".to_string(), "#0af".to_string()),
        ("--card--mixin".to_string(), "p:${0=4};radius:${1=md}".to_string()),
        ("--hocus--scope".to_string(), "$selector:is(:hover,:focus){$body}".to_string()),
        ("--field-sizing--register".to_string(), "true".to_string()),
    ]
    .into_iter()
    .collect();
    Root::load(Box::new(vars))
}

fn setup() -> (Document, NodeId, StyleHandler<StyleSheet>) {
    let mut doc = Document::new();
    let div = doc.create_element("div");
    doc.append_child(doc.body(), div).unwrap();
    let handler = StyleHandler::new(Settings::default(), theme(), StyleSheet::new());
    (doc, div, handler)
}

fn apply(
    handler: &mut StyleHandler<StyleSheet>,
    doc: &mut Document,
    node: NodeId,
    previous: &[AppliedEntry],
    content: &str,
) -> Vec<AppliedEntry> {
    handler
        .handle_change(doc, node, previous, Some(content))
        .unwrap()
}

#[test]
fn test_identifier_determinism() {
    let scopes = vec!["child".to_string()];
    for property in [0, 7, 120] {
        for media in 0..6 {
            for state in [0, 3, 14] {
                let a = rank_key(property, media, state, "child", &scopes);
                let b = rank_key(property, media, state, "child", &scopes);
                assert_eq!(a, b);
            }
        }
    }
}

#[test]
fn test_declaration_names_match_fixtures() {
    let (_, _, handler) = setup();
    for (content, name) in [
        ("color:red", "color"),
        ("color.hover:red", "color.hover"),
        ("md|color:red", "md|color"),
        ("md|color.hover:red", "md|color.hover"),
    ] {
        let decls = handler.resolve(content).unwrap();
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].name(), name);
    }
    assert!(handler.resolve("zz|color:red").unwrap().is_empty());
}

#[test]
fn test_inline_style_and_marker() {
    let (mut doc, div, mut handler) = setup();
    let applied = apply(&mut handler, &mut doc, div, &[], "color:@brand;px:4");

    assert_eq!(applied.len(), 3);
    let style = doc.style(div).unwrap();
    assert_eq!(
        style.get_property_value(&applied[0].property),
        Some("var(--brand)")
    );
    assert_eq!(
        style.get_property_value(&applied[1].property),
        Some("calc(4 * var(--unit))")
    );
    let marker: Vec<&str> = doc.get_attribute(div, "atoms").unwrap().split(' ').collect();
    let ids: Vec<&str> = applied.iter().map(|e| e.entry.as_str()).collect();
    assert_eq!(marker, ids);
}

#[test]
fn test_diff_a_b_to_b_c() {
    let (mut doc, div, mut handler) = setup();
    let first = apply(&mut handler, &mut doc, div, &[], "color:red;opacity:0.5");
    let second = apply(&mut handler, &mut doc, div, &first, "opacity:0.5;z:10");

    let style = doc.style(div).unwrap();
    assert!(style.get_property_value(&first[0].property).is_none());
    assert_eq!(style.get_property_value(&first[1].property), Some("0.5"));
    assert_eq!(style.get_property_value(&second[1].property), Some("10"));
    assert_eq!(style.len(), 2);
    assert_eq!(
        doc.get_attribute(div, "atoms"),
        Some(format!("{} {}", second[0].entry, second[1].entry).as_str())
    );
}

#[test]
fn test_stylesheet_order_follows_rank() {
    let (mut doc, div, mut handler) = setup();
    let mut previous = Vec::new();
    for content in [
        "xl|color:red",
        "hocus!color:red",
        "color:red",
        "color.active:red",
        "m:2",
        "sm|m:1",
        "child!bg:white",
    ] {
        previous = apply(&mut handler, &mut doc, div, &previous, content);
    }
    let ranks = handler.tracker().ranks();
    assert_eq!(ranks.len(), handler.sheet().len());
    assert!(ranks.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(handler.sheet().rules(), handler.tracker().rules());
}

#[test]
fn test_no_duplicate_rules() {
    let (mut doc, div, mut handler) = setup();
    let other = doc.create_element("span");
    doc.append_child(div, other).unwrap();

    apply(&mut handler, &mut doc, div, &[], "color:red;md|p:2");
    apply(&mut handler, &mut doc, other, &[], "color:blue;md|p:8");
    assert_eq!(handler.sheet().len(), 2);
}

#[test]
fn test_root_mixin_and_registration() {
    let (mut doc, div, mut handler) = setup();
    let applied = apply(&mut handler, &mut doc, div, &[], "^card:2;field-sizing:content");
    let names: Vec<&str> = applied.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["padding", "border-radius", "field-sizing"]);
    assert_eq!(applied[0].value, "calc(2 * var(--unit))");
    assert_eq!(applied[1].value, "var(--radius-md)");
}

#[test]
fn test_custom_scope_template() {
    let (mut doc, div, mut handler) = setup();
    let applied = apply(&mut handler, &mut doc, div, &[], "hocus!color:red");
    let id = &applied[0].entry;
    assert_eq!(
        handler.sheet().rules()[0],
        format!("[atoms~=\"{id}\"]:is(:hover,:focus){{color:var(--{id}) !important}}")
    );
}

#[test]
fn test_unknown_scope_unrenderable() {
    let (_, _, handler) = setup();
    let decls = handler.resolve("nope!color:red").unwrap();
    assert_eq!(decls[0].rank(), UNRENDERABLE);
}

#[test]
fn test_rejected_rule_recovers() {
    let mut doc = Document::new();
    let div = doc.create_element("div");
    let mut sheet = StyleSheet::new();
    sheet.reject("::placeholder");
    let mut handler = StyleHandler::new(Settings::default(), theme(), sheet);

    let applied = apply(
        &mut handler,
        &mut doc,
        div,
        &[],
        "placeholder!color:gray;color:black",
    );
    assert_eq!(applied.len(), 2);
    assert_eq!(handler.sheet().len(), 1);
    assert!(handler.tracker().is_seen(&applied[0].entry));
}

#[test]
fn test_mixin_cycle_propagates() {
    let (mut doc, div, mut handler) = setup();
    handler.register_mixin("a", |_: &Settings, _: &[String]| "^b");
    handler.register_mixin("b", |_: &Settings, _: &[String]| "color:red;^a");

    let err = handler
        .handle_change(&mut doc, div, &[], Some("^a"))
        .unwrap_err();
    assert_eq!(
        err,
        StyleError::MixinCycle {
            path: "a->b->a".to_string()
        }
    );
    assert!(doc.style(div).unwrap().is_empty());
    assert!(handler.sheet().is_empty());
}

#[test]
fn test_desktop_first_queries() {
    let mut doc = Document::new();
    let div = doc.create_element("div");
    let settings = Settings {
        desktop_first: true,
        ..Settings::default()
    };
    let mut handler = StyleHandler::new(settings, Root::empty(), StyleSheet::new());
    let applied = apply(&mut handler, &mut doc, div, &[], "md|color:red");
    assert_eq!(applied[0].name, "md|color");
    assert!(handler.sheet().rules()[0].starts_with("@media (max-width: 767.98px){"));
}
