//! Coordinator tests
//!
//! Whole-configuration application, failure isolation between engines, and
//! the reset sweep.

use eyebrowse_dom::Document;
use eyebrowse_engine::{
    Concern, Configuration, ContrastMode, FilterType, FontChoice, SettingsCoordinator, TextSetting,
};
use eyebrowse_html::{parse_document, serialize};

const PAGE: &str = r#"<!DOCTYPE html>
<html lang="en"><head><title>News</title></head>
<body><h1>Headline</h1><p>Story text</p><ul><li>Point</li></ul>
<img src="photo.jpg"><div id="nav" style="position: fixed">Nav</div></body></html>"#;

fn load() -> Document {
    parse_document(PAGE, "https://news.example.com/story").unwrap()
}

fn size(doc: &Document, selector: &str) -> Option<String> {
    let node = doc.query_selector(selector).unwrap().unwrap();
    doc.style_property(node, "font-size")
}

fn eyebrowse_classes(doc: &Document) -> Vec<String> {
    [doc.document_element(), doc.body()]
        .into_iter()
        .flatten()
        .flat_map(|n| {
            doc.tree()
                .element(n)
                .map(|e| e.classes.iter().map(str::to_string).collect::<Vec<_>>())
                .unwrap_or_default()
        })
        .filter(|c| c.starts_with("eyebrowse-"))
        .collect()
}

fn scenario() -> Configuration {
    Configuration {
        filter: FilterType::Deuteranopia,
        text_size_factor: 1.5,
        line_spacing: 1.5,
        ..Configuration::default()
    }
}

// ============================================================================
// APPLY ALL
// ============================================================================

#[test]
fn test_apply_all_scenario() {
    let mut doc = load();
    let mut coordinator = SettingsCoordinator::new();
    let report = coordinator.apply_all(&mut doc, &scenario());
    assert!(report.is_ok(), "{:?}", report.failures);

    assert_eq!(doc.query_selector_all("#deuteranopia-filter").unwrap().len(), 1);
    let root = doc.document_element().unwrap();
    assert_eq!(doc.style_property(root, "--line-spacing-factor").as_deref(), Some("1.5"));
    assert_eq!(size(&doc, "p").as_deref(), Some("18.4px"));
    assert_eq!(size(&doc, "h1").as_deref(), Some("36.8px"));
    let img = doc.query_selector("img").unwrap().unwrap();
    assert_eq!(
        doc.style_property(img, "filter").as_deref(),
        Some("url(#deuteranopia-filter)")
    );
    assert_eq!(coordinator.active_filter(), FilterType::Deuteranopia);
    assert!((coordinator.text_size_factor() - 1.15).abs() < 1e-9);
    assert_eq!(coordinator.zoom_factor(), 1.0);
    assert!(doc.get_element_by_id("eyebrowse-zoom-style").is_none());
}

#[test]
fn test_apply_all_is_idempotent() {
    let mut doc = load();
    let mut coordinator = SettingsCoordinator::new();
    coordinator.apply_all(&mut doc, &scenario());
    let styles = doc.query_selector_all("style").unwrap().len();
    coordinator.apply_all(&mut doc, &scenario());

    assert_eq!(doc.query_selector_all("style").unwrap().len(), styles);
    assert_eq!(doc.query_selector_all("#deuteranopia-filter").unwrap().len(), 1);
    assert_eq!(size(&doc, "p").as_deref(), Some("18.4px"));
    assert_eq!(coordinator.state().observers.active_count(), 1);
}

#[test]
fn test_apply_all_switches_configurations() {
    let mut doc = load();
    let mut coordinator = SettingsCoordinator::new();
    coordinator.apply_all(&mut doc, &scenario());

    let next = Configuration {
        filter: FilterType::Grayscale,
        font: FontChoice::OpenDyslexic,
        zoom_factor: 1.25,
        high_contrast: true,
        contrast_mode: ContrastMode::Inverted,
        ..Configuration::default()
    };
    let report = coordinator.apply_all(&mut doc, &next);
    assert!(report.is_ok());

    assert!(doc.get_element_by_id("eyebrowse-deuteranopia-filter").is_none());
    assert!(doc.get_element_by_id("eyebrowse-grayscale-style").is_some());
    assert_eq!(size(&doc, "p"), None);
    let root = doc.document_element().unwrap();
    assert!(doc.has_class(root, "eyebrowse-high-contrast-inverted"));
    assert!(doc.has_class(root, "eyebrowse-font-opendyslexic"));
    assert_eq!(doc.style_property(root, "--line-spacing-factor").as_deref(), Some("1"));
    assert_eq!(doc.style_property(root, "--zoom-factor").as_deref(), Some("1.25"));
    let nav = doc.get_element_by_id("nav").unwrap();
    assert_eq!(doc.style_property(nav, "transform").as_deref(), Some("scale(0.8)"));
}

#[test]
fn test_failures_are_isolated() {
    let mut doc = Document::empty("https://example.com/");
    let mut coordinator = SettingsCoordinator::new();
    let config = Configuration {
        filter: FilterType::Grayscale,
        font: FontChoice::Arial,
        ..Configuration::default()
    };
    let report = coordinator.apply_all(&mut doc, &config);

    let failed: Vec<Concern> = report.failures.iter().map(|(c, _)| *c).collect();
    assert_eq!(failed, vec![Concern::Filter, Concern::Font]);
    assert_eq!(coordinator.active_filter(), FilterType::Off);
}

// ============================================================================
// INDIVIDUAL SETTINGS
// ============================================================================

#[test]
fn test_individual_setters() {
    let mut doc = load();
    let mut coordinator = SettingsCoordinator::new();
    coordinator.set_filter(&mut doc, FilterType::Dark).unwrap();
    coordinator.set_font(&mut doc, &FontChoice::Arial).unwrap();
    coordinator.adjust_text_size(&mut doc, 200.0).unwrap();
    coordinator.set_page_zoom(&mut doc, 2.0).unwrap();
    coordinator
        .set_text_setting(&mut doc, &TextSetting::ColumnWidth(70))
        .unwrap();

    assert!(doc.get_element_by_id("eyebrowse-dark-mode-style").is_some());
    assert_eq!(coordinator.active_font(), &FontChoice::Arial);
    assert_eq!(size(&doc, "p").as_deref(), Some("20.8px"));
    assert_eq!(coordinator.zoom_factor(), 2.0);
    assert!(coordinator.text_metrics().has_active_customization());
}

#[test]
fn test_process_mutations_reaches_every_subscription() {
    let mut doc = load();
    let mut coordinator = SettingsCoordinator::new();
    coordinator.set_filter(&mut doc, FilterType::Protanopia).unwrap();
    coordinator.set_font(&mut doc, &FontChoice::ComicSans).unwrap();

    let body = doc.body().unwrap();
    let img = doc.create_element("img");
    let p = doc.create_element("p");
    doc.append_child(body, img).unwrap();
    doc.append_child(body, p).unwrap();

    assert_eq!(coordinator.process_mutations(&mut doc), 2);
    assert_eq!(
        doc.style_property(img, "filter").as_deref(),
        Some("url(#protanopia-filter)")
    );
    assert_eq!(
        doc.style_property(p, "font-family").as_deref(),
        Some("'Comic Sans MS', cursive, sans-serif")
    );
}

// ============================================================================
// RESET
// ============================================================================

#[test]
fn test_reset_all_leaves_no_trace() {
    let mut doc = load();
    let mut coordinator = SettingsCoordinator::new();
    let before = serialize(&doc);
    let config = Configuration {
        font: FontChoice::OpenDyslexic,
        zoom_factor: 1.5,
        text_guide: true,
        high_contrast: true,
        ..scenario()
    };
    coordinator.apply_all(&mut doc, &config);

    coordinator.reset_all(&mut doc);

    assert!(doc.query_selector_all("[id^=\"eyebrowse-\"]").unwrap().is_empty());
    assert!(eyebrowse_classes(&doc).is_empty());
    assert!(doc.query_selector_all("[data-original-size], [data-zoom-processed]").unwrap().is_empty());
    assert_eq!(doc.live_observer_count(), 0);
    assert!(coordinator.state().ledger.is_empty());
    assert_eq!(serialize(&doc), before);
}

#[test]
fn test_reset_all_sweeps_foreign_residue() {
    let mut doc = load();
    let root = doc.document_element().unwrap();
    let body = doc.body().unwrap();
    doc.add_class(root, "eyebrowse-font-arial").unwrap();
    doc.add_class(body, "eyebrowse-stale").unwrap();
    doc.add_class(body, "page-theme").unwrap();
    doc.set_style_property(root, "--zoom-factor", "2", false).unwrap();
    let stray = doc.create_element("style");
    doc.set_attribute(stray, "id", "eyebrowse-grayscale-style").unwrap();
    doc.append_child(body, stray).unwrap();

    SettingsCoordinator::new().reset_all(&mut doc);

    assert!(eyebrowse_classes(&doc).is_empty());
    assert!(doc.has_class(body, "page-theme"));
    assert_eq!(doc.style_property(root, "--zoom-factor"), None);
    assert!(!doc.is_connected(stray));
}
