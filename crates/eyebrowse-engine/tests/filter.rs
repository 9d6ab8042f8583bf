//! Filter engine tests
//!
//! Apply/remove round trips against parsed pages, switching between filters,
//! and media inserted after a color-vision filter is active.

use eyebrowse_dom::{Document, NodeId};
use eyebrowse_engine::{EngineState, FilterEngine, FilterType};
use eyebrowse_html::{parse_document, serialize};
use proptest::prelude::*;

const PAGE: &str = r#"<!DOCTYPE html>
<html><head><title>Gallery</title><style>p { color: #333 }</style></head>
<body><h1>Gallery</h1><img src="a.png" style="filter: blur(2px)"><video src="v.mp4"></video>
<div style="background-image: url(bg.png)">Backdrop</div><canvas></canvas>
<p>Caption</p></body></html>"#;

fn load() -> Document {
    parse_document(PAGE, "https://example.com/gallery").unwrap()
}

fn filters(doc: &Document) -> Vec<(NodeId, Option<String>)> {
    doc.query_selector_all("*")
        .unwrap()
        .into_iter()
        .map(|n| (n, doc.style_property(n, "filter")))
        .collect()
}

fn style_count(doc: &Document) -> usize {
    doc.query_selector_all("style").unwrap().len()
}

fn dispatch(doc: &mut Document, state: &mut EngineState) -> usize {
    let EngineState { ledger, observers } = state;
    observers.dispatch(doc, ledger)
}

// ============================================================================
// APPLY / REMOVE
// ============================================================================

#[test]
fn test_every_filter_round_trips() {
    for filter in FilterType::ALL {
        let mut doc = load();
        let mut state = EngineState::new();
        let mut engine = FilterEngine::new();
        let before = serialize(&doc);
        let probed = filters(&doc);
        let styles = style_count(&doc);

        engine.apply(&mut doc, &mut state, filter).unwrap();
        assert_eq!(engine.active(), filter);
        engine.remove(&mut doc, &mut state);

        assert_eq!(engine.active(), FilterType::Off);
        assert_eq!(filters(&doc), probed, "{filter} left inline filters behind");
        assert_eq!(style_count(&doc), styles, "{filter} left a stylesheet behind");
        assert_eq!(serialize(&doc), before);
        assert!(state.ledger.is_empty());
    }
}

#[test]
fn test_grayscale_injects_single_style() {
    let mut doc = load();
    let mut state = EngineState::new();
    let mut engine = FilterEngine::new();
    engine.apply(&mut doc, &mut state, FilterType::Grayscale).unwrap();
    engine.apply(&mut doc, &mut state, FilterType::Grayscale).unwrap();

    let style = doc.get_element_by_id("eyebrowse-grayscale-style").unwrap();
    assert!(doc.tree().text_content(style).contains("grayscale"));
    assert_eq!(style_count(&doc), 2);
    let img = doc.query_selector("img").unwrap().unwrap();
    assert_eq!(doc.style_property(img, "filter").as_deref(), Some("blur(2px)"));
    assert!(!state.observers.is_subscribed(eyebrowse_engine::Concern::Filter));
}

#[test]
fn test_color_vision_filter_targets_media() {
    let mut doc = load();
    let mut state = EngineState::new();
    let mut engine = FilterEngine::new();
    engine.apply(&mut doc, &mut state, FilterType::Protanopia).unwrap();

    assert_eq!(doc.query_selector_all("#protanopia-filter").unwrap().len(), 1);
    let container = doc.get_element_by_id("eyebrowse-protanopia-filter").unwrap();
    assert_eq!(doc.tree().parent(container), doc.body());
    let matrix = doc.query_selector("feColorMatrix").unwrap().unwrap();
    assert_eq!(
        doc.get_attribute(matrix, "values").as_deref(),
        Some("0.567 0.433 0 0 0 0.558 0.442 0 0 0 0 0.242 0.758 0 0 0 0 0 1 0")
    );

    for selector in ["img", "video", "canvas", "div[style*=\"background-image\"]"] {
        let node = doc.query_selector(selector).unwrap().unwrap();
        assert_eq!(
            doc.style_property(node, "filter").as_deref(),
            Some("url(#protanopia-filter)"),
            "{selector}"
        );
    }
    let svg = doc.query_selector("#eyebrowse-protanopia-filter svg").unwrap().unwrap();
    assert_eq!(doc.style_property(svg, "filter"), None);
    let p = doc.query_selector("p").unwrap().unwrap();
    assert_eq!(doc.style_property(p, "filter"), None);
}

// ============================================================================
// SWITCHING
// ============================================================================

#[test]
fn test_switching_fully_replaces_previous_filter() {
    let mut doc = load();
    let mut state = EngineState::new();
    let mut engine = FilterEngine::new();
    let before = serialize(&doc);

    engine.apply(&mut doc, &mut state, FilterType::Protanopia).unwrap();
    engine.apply(&mut doc, &mut state, FilterType::Dark).unwrap();
    assert!(doc.get_element_by_id("eyebrowse-protanopia-filter").is_none());
    assert!(doc.get_element_by_id("eyebrowse-protanopia-style").is_none());
    let img = doc.query_selector("img").unwrap().unwrap();
    assert_eq!(doc.style_property(img, "filter").as_deref(), Some("blur(2px)"));

    engine.apply(&mut doc, &mut state, FilterType::Tritanopia).unwrap();
    assert_eq!(doc.live_observer_count(), 1);
    engine.apply(&mut doc, &mut state, FilterType::Off).unwrap();

    assert_eq!(serialize(&doc), before);
    assert_eq!(doc.live_observer_count(), 0);
}

#[test]
fn test_remove_without_apply_is_noop() {
    let mut doc = load();
    let mut state = EngineState::new();
    let before = serialize(&doc);
    let report = FilterEngine::new().remove(&mut doc, &mut state);
    assert_eq!(report, Default::default());
    assert_eq!(serialize(&doc), before);
}

// ============================================================================
// DYNAMIC CONTENT
// ============================================================================

#[test]
fn test_inserted_media_receives_filter() {
    let mut doc = load();
    let mut state = EngineState::new();
    let mut engine = FilterEngine::new();
    engine.apply(&mut doc, &mut state, FilterType::Deuteranopia).unwrap();

    let body = doc.body().unwrap();
    let figure = doc.create_element("figure");
    let img = doc.create_element("img");
    doc.append_child(figure, img).unwrap();
    doc.append_child(body, figure).unwrap();
    let text = doc.create_element("p");
    doc.append_child(body, text).unwrap();

    assert_eq!(dispatch(&mut doc, &mut state), 1);
    assert_eq!(
        doc.style_property(img, "filter").as_deref(),
        Some("url(#deuteranopia-filter)")
    );
    assert_eq!(doc.style_property(text, "filter"), None);

    engine.remove(&mut doc, &mut state);
    assert_eq!(doc.style_property(img, "filter"), None);
}

#[test]
fn test_no_delivery_after_remove() {
    let mut doc = load();
    let mut state = EngineState::new();
    let mut engine = FilterEngine::new();
    engine.apply(&mut doc, &mut state, FilterType::Tritanopia).unwrap();
    engine.remove(&mut doc, &mut state);

    let body = doc.body().unwrap();
    let img = doc.create_element("img");
    doc.append_child(body, img).unwrap();
    assert_eq!(dispatch(&mut doc, &mut state), 0);
    assert_eq!(doc.style_property(img, "filter"), None);
}

// ============================================================================
// PROPERTIES
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_any_sequence_then_off_restores_page(
        sequence in prop::collection::vec(prop::sample::select(FilterType::ALL.to_vec()), 1..6)
    ) {
        let mut doc = load();
        let mut state = EngineState::new();
        let mut engine = FilterEngine::new();
        let before = serialize(&doc);

        for filter in sequence {
            engine.apply(&mut doc, &mut state, filter).unwrap();
            prop_assert!(state.observers.active_count() <= 1);
            prop_assert!(doc.live_observer_count() <= 1);
            prop_assert!(doc.query_selector_all("style[id^=\"eyebrowse-\"]").unwrap().len() <= 1);
        }
        engine.apply(&mut doc, &mut state, FilterType::Off).unwrap();

        prop_assert_eq!(serialize(&doc), before);
        prop_assert!(doc.query_selector_all("[id^=\"eyebrowse-\"]").unwrap().is_empty());
    }
}
