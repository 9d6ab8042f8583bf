//! Text-to-speech support
//!
//! Speech synthesis itself belongs to the host. This module decides what is
//! read: the page reading queue, hover announcements, and voice settings.

use eyebrowse_css::StyleResolver;
use eyebrowse_dom::{Document, NodeData, NodeId};
use serde_json::{Value, json};

use crate::config::{clamp_f64, keys, read_f64, truthy};
use crate::store::SettingsStore;

/// Announcement for a page with nothing to read
pub const NO_CONTENT_ANNOUNCEMENT: &str = "No readable content found on this page.";

const READABLE_SELECTOR: &str = concat!(
    "p, h1, h2, h3, h4, h5, h6, article, section, main, li, td, th, ",
    "[role=\"article\"], [role=\"main\"], [role=\"contentinfo\"]",
);

/// Shortest text worth reading
const MIN_TEXT_CHARS: usize = 5;

/// Longest hover announcement before truncation
const MAX_HOVER_CHARS: usize = 150;

/// Input types whose current value is announced
const VALUE_INPUT_TYPES: &[&str] = &["text", "email", "number", "search"];

/// Voice settings
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechSettings {
    pub enabled: bool,
    pub rate: f64,
    pub pitch: f64,
    /// Platform voice index, empty for the default voice
    pub voice: String,
    pub hover_enabled: bool,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            rate: 1.0,
            pitch: 1.0,
            voice: String::new(),
            hover_enabled: false,
        }
    }
}

impl SpeechSettings {
    pub fn load(store: &dyn SettingsStore) -> Self {
        let positive = |key: &str| read_f64(store, key).filter(|v| *v > 0.0);
        Self {
            enabled: store.get(keys::TTS_ENABLED).is_some_and(|v| truthy(&v)),
            rate: positive(keys::TTS_RATE).map_or(1.0, |v| clamp_f64(v, (0.1, 10.0))),
            pitch: positive(keys::TTS_PITCH).map_or(1.0, |v| clamp_f64(v, (0.1, 2.0))),
            voice: match store.get(keys::TTS_VOICE) {
                Some(Value::String(s)) => s,
                Some(Value::Number(n)) => n.to_string(),
                _ => String::new(),
            },
            hover_enabled: store.get(keys::TTS_HOVER).is_some_and(|v| truthy(&v)),
        }
    }

    pub(crate) fn to_entries(&self) -> Vec<(&'static str, Value)> {
        vec![
            (keys::TTS_ENABLED, json!(self.enabled)),
            (keys::TTS_RATE, json!(self.rate)),
            (keys::TTS_PITCH, json!(self.pitch)),
            (keys::TTS_VOICE, json!(self.voice)),
            (keys::TTS_HOVER, json!(self.hover_enabled)),
        ]
    }

    /// Whether hovering should trigger announcements
    pub fn reads_on_hover(&self) -> bool {
        self.enabled && self.hover_enabled
    }
}

/// One element's worth of text
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub node: NodeId,
    pub text: String,
}

/// Page content in reading order
#[derive(Debug, Clone, Default)]
pub struct ReadingQueue {
    utterances: Vec<Utterance>,
    text: String,
}

impl ReadingQueue {
    /// Gather the readable content of `doc`
    pub fn collect(doc: &Document) -> Self {
        let tree = doc.tree();
        let candidates = doc.query_selector_all(READABLE_SELECTOR).unwrap_or_default();
        let resolver = StyleResolver::new(doc);

        let utterances: Vec<_> = candidates
            .iter()
            .copied()
            .filter(|&node| !resolver.is_hidden(node))
            .filter_map(|node| {
                let text = tree.text_content(node).trim().to_string();
                if text.chars().count() < MIN_TEXT_CHARS {
                    return None;
                }
                let wraps_readable = candidates
                    .iter()
                    .any(|&other| other != node && tree.contains(node, other));
                if wraps_readable && !has_direct_text(doc, node) {
                    return None;
                }
                Some(Utterance { node, text })
            })
            .collect();

        if utterances.is_empty() {
            tracing::debug!("Nothing readable on {}", doc.url());
            return Self {
                utterances,
                text: NO_CONTENT_ANNOUNCEMENT.to_string(),
            };
        }

        let text = utterances
            .iter()
            .map(|u| u.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        tracing::debug!("Reading queue of {} elements", utterances.len());
        Self { utterances, text }
    }

    pub fn utterances(&self) -> &[Utterance] {
        &self.utterances
    }

    /// Text handed to the synthesizer
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.utterances.is_empty()
    }

    /// Element being read when the synthesizer reports `char_index`
    pub fn element_at(&self, char_index: usize) -> Option<NodeId> {
        let last = self.utterances.last()?;
        let end = (0..=char_index.min(self.text.len()))
            .rev()
            .find(|&i| self.text.is_char_boundary(i))
            .unwrap_or(0);
        let words_read = self.text[..end].split_whitespace().count();

        let mut cumulative = 0;
        for utterance in &self.utterances {
            cumulative += utterance.text.split_whitespace().count();
            if words_read < cumulative {
                return Some(utterance.node);
            }
        }
        Some(last.node)
    }
}

fn has_direct_text(doc: &Document, node: NodeId) -> bool {
    doc.tree()
        .children(node)
        .any(|(_, child)| matches!(&child.data, NodeData::Text(t) if !t.trim().is_empty()))
}

fn heading_level(doc: &Document, node: NodeId) -> Option<String> {
    let elem = doc.tree().element(node)?;
    let tag = elem.tag().to_ascii_lowercase();
    if let Some(level) = tag.strip_prefix('h').filter(|l| matches!(*l, "1" | "2" | "3" | "4" | "5" | "6")) {
        return Some(level.to_string());
    }
    if elem.get_attr("role").as_deref() == Some("heading") {
        return Some(elem.get_attr("aria-level").unwrap_or_else(|| "1".to_string()));
    }
    None
}

fn input_label(doc: &Document, node: NodeId) -> Option<String> {
    let elem = doc.tree().element(node)?;
    if let Some(id) = elem.id() {
        let label = doc
            .query_selector_all("label[for]")
            .unwrap_or_default()
            .into_iter()
            .find(|&l| doc.get_attribute(l, "for").as_deref() == Some(id));
        if let Some(label) = label {
            return Some(doc.tree().text_content(label).trim().to_string());
        }
    }
    elem.get_attr("aria-label")
        .filter(|s| !s.is_empty())
        .or_else(|| elem.get_attr("placeholder").filter(|s| !s.is_empty()))
}

/// Announcement for a hovered element, `None` when there is nothing to say
pub fn describe_for_hover(doc: &Document, node: NodeId) -> Option<String> {
    let elem = doc.tree().element(node)?;
    if StyleResolver::new(doc).is_hidden(node) {
        return None;
    }
    let text = doc.tree().text_content(node).trim().to_string();
    let input_type = elem
        .get_attr("type")
        .map(|t| t.to_ascii_lowercase())
        .unwrap_or_else(|| "text".to_string());

    let mut announcement = text.clone();
    if let Some(level) = heading_level(doc, node) {
        announcement = format!("Heading level {level}: {text}");
    }
    if elem.is("img") {
        if let Some(alt) = elem.get_attr("alt").filter(|a| !a.is_empty()) {
            announcement = format!("Image: {alt}");
        }
    }
    if elem.is("a") && elem.has_attr("href") {
        announcement = format!("Link: {announcement}");
    }
    if elem.is("button") || (elem.is("input") && input_type == "button") {
        announcement = format!("Button: {announcement}");
    }
    if elem.is("input") && input_type != "button" {
        announcement = match input_label(doc, node) {
            Some(label) => format!("{input_type} field, {label}"),
            None => format!("{input_type} field"),
        };
        if let Some(value) = elem.get_attr("value").filter(|v| !v.is_empty()) {
            if VALUE_INPUT_TYPES.contains(&input_type.as_str()) {
                announcement.push_str(&format!(", current value: {value}"));
            }
        }
    }

    if announcement.trim().is_empty() {
        return None;
    }
    if announcement.chars().count() > MAX_HOVER_CHARS {
        announcement = announcement.chars().take(MAX_HOVER_CHARS).collect::<String>() + "...";
    }
    Some(announcement)
}
