//! Document-level tests for eyebrowse-dom
//!
//! Cover structure lookup, selector queries, recorded mutations and the
//! observer pump the engine depends on.

use eyebrowse_dom::{Document, MutationObserverInit, MutationType, NodeId};

fn page() -> (Document, NodeId, NodeId) {
    let mut doc = Document::new("https://example.com/");
    let body = doc.body().unwrap();
    let p = doc.create_element("p");
    doc.append_child(body, p).unwrap();
    let img = doc.create_element("img");
    doc.append_child(p, img).unwrap();
    (doc, p, img)
}

// ============================================================================
// STRUCTURE
// ============================================================================

#[test]
fn test_new_document_has_head_and_body() {
    let doc = Document::new("about:blank");
    let html = doc.document_element().unwrap();
    assert_eq!(doc.tree().parent(doc.head().unwrap()), Some(html));
    assert_eq!(doc.tree().parent(doc.body().unwrap()), Some(html));
}

#[test]
fn test_empty_document_has_no_body() {
    let doc = Document::empty("about:blank");
    assert!(doc.document_element().is_none());
    assert!(doc.body().is_none());
    assert!(doc.query_selector_all("p").unwrap().is_empty());
}

#[test]
fn test_title_and_get_by_id() {
    let mut doc = Document::new("about:blank");
    let head = doc.head().unwrap();
    let title = doc.create_element("title");
    doc.append_child(head, title).unwrap();
    doc.set_text_content(title, "  Reader  ").unwrap();
    assert_eq!(doc.title(), "Reader");

    let body = doc.body().unwrap();
    let div = doc.create_element("div");
    doc.append_child(body, div).unwrap();
    doc.set_attribute(div, "id", "eyebrowse-protanopia-filter").unwrap();
    assert_eq!(doc.get_element_by_id("eyebrowse-protanopia-filter"), Some(div));
}

#[test]
fn test_removed_node_is_disconnected() {
    let (mut doc, p, img) = page();
    assert!(doc.is_connected(img));
    assert!(doc.remove(p));
    assert!(!doc.is_connected(img));
    assert!(!doc.remove(p));
}

// ============================================================================
// QUERIES
// ============================================================================

#[test]
fn test_query_selector_all_document_order() {
    let (mut doc, p, img) = page();
    let body = doc.body().unwrap();
    let video = doc.create_element("video");
    doc.append_child(body, video).unwrap();

    let media = doc.query_selector_all("video, img").unwrap();
    assert_eq!(media, vec![img, video]);
    assert_eq!(doc.query_selector("body > p").unwrap(), Some(p));
    assert!(doc.matches(img, "p img").unwrap());
}

#[test]
fn test_query_rejects_unsupported_selector() {
    let (doc, _, _) = page();
    assert!(doc.query_selector_all("p:first-child").is_err());
}

#[test]
fn test_style_attribute_selector_sees_inline_style() {
    let (mut doc, p, _) = page();
    doc.set_style_property(p, "position", "fixed", false).unwrap();
    let fixed = doc
        .query_selector_all("[style*=\"position: fixed\"]")
        .unwrap();
    assert_eq!(fixed, vec![p]);
}

// ============================================================================
// MUTATIONS & OBSERVERS
// ============================================================================

#[test]
fn test_style_property_round_trip() {
    let (mut doc, p, _) = page();
    doc.set_style_property(p, "filter", "url(#protanopia-filter)", false)
        .unwrap();
    assert_eq!(
        doc.style_property(p, "filter").as_deref(),
        Some("url(#protanopia-filter)")
    );
    assert_eq!(
        doc.remove_style_property(p, "filter").unwrap().as_deref(),
        Some("url(#protanopia-filter)")
    );
    assert_eq!(doc.get_attribute(p, "style"), None);
}

#[test]
fn test_text_node_is_not_an_element() {
    let mut doc = Document::new("about:blank");
    let text = doc.create_text("hello");
    assert!(doc.set_attribute(text, "id", "x").is_err());
    assert!(doc.add_class(text, "a").is_err());
}

#[test]
fn test_observer_sees_body_insertions() {
    let (mut doc, p, _) = page();
    let body = doc.body().unwrap();
    let observer = doc.observe(body, MutationObserverInit::subtree_insertions());

    let span = doc.create_element("span");
    doc.append_child(p, span).unwrap();
    doc.set_attribute(span, "title", "ignored").unwrap();

    let records = doc.take_records(observer);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].mutation_type, MutationType::ChildList);
    assert_eq!(records[0].added_nodes, vec![span]);
}

#[test]
fn test_move_reports_removal_and_addition() {
    let (mut doc, p, img) = page();
    let body = doc.body().unwrap();
    let observer = doc.observe(body, MutationObserverInit::subtree_insertions());
    doc.append_child(body, img).unwrap();

    let records = doc.take_records(observer);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].target, p);
    assert_eq!(records[0].removed_nodes, vec![img]);
    assert_eq!(records[1].added_nodes, vec![img]);
}

#[test]
fn test_disconnect_stops_delivery() {
    let (mut doc, p, _) = page();
    let body = doc.body().unwrap();
    let observer = doc.observe(body, MutationObserverInit::subtree_insertions());
    assert_eq!(doc.live_observer_count(), 1);
    doc.disconnect(observer);
    let span = doc.create_element("span");
    doc.append_child(p, span).unwrap();
    assert!(doc.take_records(observer).is_empty());
    assert_eq!(doc.live_observer_count(), 0);
}

#[test]
fn test_class_helpers() {
    let (mut doc, _, _) = page();
    let html = doc.document_element().unwrap();
    assert!(doc.add_class(html, "eyebrowse-font-arial").unwrap());
    assert!(!doc.add_class(html, "eyebrowse-font-arial").unwrap());
    doc.add_class(html, "site-theme").unwrap();
    let dropped = doc
        .remove_classes_where(html, |c| c.starts_with("eyebrowse-font-"))
        .unwrap();
    assert_eq!(dropped, 1);
    assert!(doc.has_class(html, "site-theme"));
}

#[test]
fn test_scroll_clamps_and_layout_flush_counts() {
    let mut doc = Document::default();
    doc.scroll_to(-5.0, 240.0);
    assert_eq!(doc.viewport().scroll_x, 0.0);
    assert_eq!(doc.viewport().scroll_y, 240.0);
    doc.flush_layout();
    doc.flush_layout();
    assert_eq!(doc.layout_flushes(), 2);
}
