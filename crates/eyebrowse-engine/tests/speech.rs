//! Reading queue and hover announcement tests

use eyebrowse_dom::Document;
use eyebrowse_engine::{
    MemoryStore, NO_CONTENT_ANNOUNCEMENT, ReadingQueue, SpeechSettings, describe_for_hover,
};
use eyebrowse_html::parse_document;
use serde_json::json;

fn load(html: &str) -> Document {
    parse_document(html, "https://example.com/").unwrap()
}

fn first(doc: &Document, selector: &str) -> eyebrowse_dom::NodeId {
    doc.query_selector(selector).unwrap().unwrap()
}

// ============================================================================
// READING QUEUE
// ============================================================================

const ARTICLE: &str = concat!(
    "<html><body><main><h1>Welcome home</h1><p>First paragraph here.</p>",
    "<p style=\"display: none\">Hidden text here</p><p>Hi</p>",
    "<ul><li>List item one</li></ul></main></body></html>",
);

#[test]
fn test_queue_skips_hidden_short_and_wrappers() {
    let doc = load(ARTICLE);
    let queue = ReadingQueue::collect(&doc);

    let texts: Vec<&str> = queue.utterances().iter().map(|u| u.text.as_str()).collect();
    assert_eq!(texts, vec!["Welcome home", "First paragraph here.", "List item one"]);
    assert_eq!(queue.text(), "Welcome home First paragraph here. List item one");
    assert!(!queue.is_empty());
}

#[test]
fn test_element_at_follows_word_boundaries() {
    let doc = load(ARTICLE);
    let queue = ReadingQueue::collect(&doc);
    let h1 = first(&doc, "h1");
    let p = first(&doc, "p");
    let li = first(&doc, "li");

    assert_eq!(queue.element_at(0), Some(h1));
    assert_eq!(queue.element_at("Welcome home ".len()), Some(p));
    let li_start = queue.text().find("List").unwrap();
    assert_eq!(queue.element_at(li_start), Some(li));
    assert_eq!(queue.element_at(10_000), Some(li));
}

#[test]
fn test_empty_page_announces_no_content() {
    let doc = load("<html><body><div>tiny</div></body></html>");
    let queue = ReadingQueue::collect(&doc);
    assert!(queue.is_empty());
    assert_eq!(queue.text(), NO_CONTENT_ANNOUNCEMENT);
    assert_eq!(queue.element_at(0), None);
}

#[test]
fn test_wrapper_with_own_text_is_kept() {
    let doc = load("<html><body><section>Intro words <p>Nested paragraph</p></section></body></html>");
    let queue = ReadingQueue::collect(&doc);
    assert_eq!(queue.utterances().len(), 2);
    assert_eq!(queue.utterances()[0].node, first(&doc, "section"));
}

// ============================================================================
// HOVER
// ============================================================================

const CONTROLS: &str = concat!(
    "<html><body><h2>Settings</h2><div role=\"heading\" aria-level=\"3\">Audio</div>",
    "<a href=\"/docs\">Read the docs</a><a id=\"bare\">Anchor only</a><button>Save</button>",
    "<img src=\"cat.png\" alt=\"A sleeping cat\"><img src=\"x.png\" alt=\"\">",
    "<label for=\"q\">Search site</label><input id=\"q\" type=\"search\" value=\"rust\">",
    "<input type=\"email\" placeholder=\"you@example.com\"><input type=\"checkbox\" aria-label=\"Remember me\" value=\"on\">",
    "<input type=\"button\" value=\"Go\">",
    "<span style=\"display: none\">secret</span></body></html>",
);

#[test]
fn test_hover_roles() {
    let doc = load(CONTROLS);
    let describe = |selector: &str| describe_for_hover(&doc, first(&doc, selector));

    assert_eq!(describe("h2").as_deref(), Some("Heading level 2: Settings"));
    assert_eq!(describe("[role=\"heading\"]").as_deref(), Some("Heading level 3: Audio"));
    assert_eq!(describe("a[href]").as_deref(), Some("Link: Read the docs"));
    assert_eq!(describe("#bare").as_deref(), Some("Anchor only"));
    assert_eq!(describe("button").as_deref(), Some("Button: Save"));
    assert_eq!(describe("img[alt=\"A sleeping cat\"]").as_deref(), Some("Image: A sleeping cat"));
    assert_eq!(describe("img[src=\"x.png\"]"), None);
}

#[test]
fn test_hover_form_fields() {
    let doc = load(CONTROLS);
    let describe = |selector: &str| describe_for_hover(&doc, first(&doc, selector));

    assert_eq!(
        describe("#q").as_deref(),
        Some("search field, Search site, current value: rust")
    );
    assert_eq!(
        describe("[type=\"email\"]").as_deref(),
        Some("email field, you@example.com")
    );
    assert_eq!(
        describe("[type=\"checkbox\"]").as_deref(),
        Some("checkbox field, Remember me")
    );
    assert_eq!(describe("span"), None);
}

#[test]
fn test_hover_truncates_long_text() {
    let long = "word ".repeat(60);
    let doc = load(&format!("<html><body><p>{long}</p></body></html>"));
    let text = describe_for_hover(&doc, first(&doc, "p")).unwrap();
    assert_eq!(text.chars().count(), 153);
    assert!(text.ends_with("..."));
}

// ============================================================================
// SETTINGS
// ============================================================================

#[test]
fn test_speech_settings_from_store() {
    let store = MemoryStore::from_value(json!({
        "ttsEnabled": true,
        "ttsRate": 25,
        "ttsPitch": "0.5",
        "ttsVoice": "Samantha",
        "ttsHoverEnabled": 1,
    }));
    let settings = SpeechSettings::load(&store);
    assert_eq!(settings.rate, 10.0);
    assert_eq!(settings.pitch, 0.5);
    assert_eq!(settings.voice, "Samantha");
    assert!(settings.reads_on_hover());

    assert_eq!(SpeechSettings::load(&MemoryStore::new()), SpeechSettings::default());
}
