//! Font substitution engine

use eyebrowse_dom::{Document, NodeId};

use crate::config::FontChoice;
use crate::error::EngineResult;
use crate::ledger::{Concern, RestoreReport};
use crate::stylesheet::{force_reflow, inject_style, is_engine_owned, remove_matching, root_element, select};
use crate::{CLASS_PREFIX, EngineState};

const FONT_STYLE_ID: &str = "eyebrowse-font-style";

const TEXT_SELECTOR: &str = "p, h1, h2, h3, h4, h5, h6, li, span, div, a, button, label";

const TEXT_TAGS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "li", "span", "div", "a", "button", "label",
];

/// Elements whose own font must survive substitution
const EXCLUDED_TAGS: &[&str] = &["pre", "code", "textarea", "input"];

/// Body properties the injected rule overrides
const BODY_PROPERTIES: &[&str] = &["font-family", "letter-spacing", "word-spacing", "line-height"];

const OPEN_DYSLEXIC_BASE: &str = "https://cdn.jsdelivr.net/npm/open-dyslexic@1.0.3/woff";

/// Spacing applied alongside a named font
#[derive(Debug, Clone, Copy, PartialEq)]
struct Preset {
    letter_spacing: &'static str,
    word_spacing: &'static str,
    line_height: &'static str,
}

impl FontChoice {
    /// CSS `font-family` value, `None` for the page default
    pub fn font_stack(&self) -> Option<String> {
        let stack = match self {
            FontChoice::Default => return None,
            FontChoice::OpenDyslexic => "'OpenDyslexic', Arial, sans-serif".to_string(),
            FontChoice::Arial => "Arial, sans-serif".to_string(),
            FontChoice::ComicSans => "'Comic Sans MS', cursive, sans-serif".to_string(),
            FontChoice::Other(name) => format!("{}, sans-serif", quote_family(name)),
        };
        Some(stack)
    }

    /// Hosted font files the stylesheet depends on
    pub fn resource_urls(&self) -> Vec<String> {
        match self {
            FontChoice::OpenDyslexic => ["Regular", "Bold"]
                .iter()
                .map(|w| format!("{OPEN_DYSLEXIC_BASE}/OpenDyslexic-{w}.woff"))
                .collect(),
            _ => Vec::new(),
        }
    }

    fn preset(&self) -> Option<Preset> {
        match self {
            FontChoice::OpenDyslexic => Some(Preset {
                letter_spacing: "0.15em",
                word_spacing: "0.25em",
                line_height: "1.4",
            }),
            FontChoice::Arial | FontChoice::ComicSans => Some(Preset {
                letter_spacing: "0.05em",
                word_spacing: "0.1em",
                line_height: "1.3",
            }),
            FontChoice::Default | FontChoice::Other(_) => None,
        }
    }
}

/// Quote a family name unless it is a single CSS identifier
fn quote_family(name: &str) -> String {
    let name = name.trim();
    let bare = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if bare {
        name.to_string()
    } else {
        format!("'{}'", name.replace(['\'', '\\'], ""))
    }
}

fn font_css(font: &FontChoice, stack: &str) -> String {
    let mut css = String::new();
    if let FontChoice::OpenDyslexic = font {
        for (url, weight) in font.resource_urls().iter().zip(["normal", "bold"]) {
            css.push_str(&format!(
                "@font-face {{ font-family: 'OpenDyslexic'; src: url('{url}') format('woff'); font-weight: {weight}; font-style: normal; }}\n"
            ));
        }
    }
    css.push_str(&format!("body {{ font-family: {stack} !important;"));
    if let Some(preset) = font.preset() {
        css.push_str(&format!(
            " letter-spacing: {} !important; word-spacing: {} !important; line-height: {} !important;",
            preset.letter_spacing, preset.word_spacing, preset.line_height
        ));
    }
    css.push_str(" }");
    css
}

/// Text-bearing element the font should be forced on
fn is_text_bearing(doc: &Document, node: NodeId) -> bool {
    let tree = doc.tree();
    let Some(elem) = tree.element(node) else {
        return false;
    };
    if !elem.is_any(TEXT_TAGS) || is_engine_owned(doc, node) {
        return false;
    }
    !std::iter::once(node)
        .chain(tree.ancestors(node))
        .filter_map(|n| tree.element(n))
        .any(|e| e.is_any(EXCLUDED_TAGS))
}

/// Page font substitution
#[derive(Debug, Default)]
pub struct FontEngine {
    active: FontChoice,
}

impl FontEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> &FontChoice {
        &self.active
    }

    /// Replace the current font with `font`
    pub fn apply(
        &mut self,
        doc: &mut Document,
        state: &mut EngineState,
        font: &FontChoice,
    ) -> EngineResult<()> {
        self.remove(doc, state);
        let Some(stack) = font.font_stack() else {
            return Ok(());
        };

        if let Err(e) = self.install(doc, state, font, &stack) {
            tracing::warn!("Applying font {} failed, rolling back: {}", font, e);
            self.remove(doc, state);
            return Err(e);
        }
        self.active = font.clone();
        tracing::info!("Applied font {}", font);
        Ok(())
    }

    fn install(
        &mut self,
        doc: &mut Document,
        state: &mut EngineState,
        font: &FontChoice,
        stack: &str,
    ) -> EngineResult<()> {
        let root = root_element(doc)?;

        if let Some(body) = doc.body() {
            for property in BODY_PROPERTIES {
                state.ledger.record_style(doc, Concern::Font, body, property);
            }
        }
        inject_style(doc, &mut state.ledger, Concern::Font, FONT_STYLE_ID, &font_css(font, stack))?;

        let targets: Vec<_> = select(doc, TEXT_SELECTOR)
            .into_iter()
            .filter(|&n| is_text_bearing(doc, n))
            .collect();
        for &node in &targets {
            state
                .ledger
                .set_style(doc, Concern::Font, node, "font-family", stack, false)?;
        }
        tracing::debug!("Set font-family on {} elements", targets.len());

        doc.add_class(root, &format!("{CLASS_PREFIX}font-{}", font.slug()))?;

        let stack = stack.to_string();
        state.observers.subscribe(
            doc,
            Concern::Font,
            is_text_bearing,
            Box::new(move |doc, ledger, node| {
                if let Err(e) = ledger.set_style(doc, Concern::Font, node, "font-family", &stack, false) {
                    tracing::warn!("Could not set font on inserted {}: {}", node, e);
                }
            }),
        );
        Ok(())
    }

    /// Undo every font mutation. Safe to call when nothing is applied.
    pub fn remove(&mut self, doc: &mut Document, state: &mut EngineState) -> RestoreReport {
        state.observers.unsubscribe(doc, Concern::Font);
        let mut report = state.ledger.restore(doc, Concern::Font);
        report.removed += remove_matching(doc, "style[id^=\"eyebrowse-font\"]");

        let prefix = format!("{CLASS_PREFIX}font-");
        if let Some(root) = doc.document_element() {
            if let Err(e) = doc.remove_classes_where(root, |c| c.starts_with(&prefix)) {
                tracing::warn!("Could not clear font classes: {}", e);
            }
        }

        let previous = std::mem::take(&mut self.active);
        if previous != FontChoice::Default {
            tracing::debug!("Removed font {}", previous);
        }
        force_reflow(doc);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_quoting() {
        assert_eq!(quote_family("Verdana"), "Verdana");
        assert_eq!(quote_family("Times New Roman"), "'Times New Roman'");
        assert_eq!(quote_family("3Dumb"), "'3Dumb'");
    }

    #[test]
    fn test_font_stacks() {
        assert_eq!(FontChoice::Default.font_stack(), None);
        assert_eq!(
            FontChoice::from("Georgia").font_stack().as_deref(),
            Some("Georgia, sans-serif")
        );
        assert_eq!(FontChoice::OpenDyslexic.resource_urls().len(), 2);
        assert!(FontChoice::Arial.resource_urls().is_empty());
    }

    #[test]
    fn test_css_contains_preset() {
        let css = font_css(&FontChoice::OpenDyslexic, "'OpenDyslexic', Arial, sans-serif");
        assert_eq!(css.matches("@font-face").count(), 2);
        assert!(css.contains("letter-spacing: 0.15em !important"));
        assert!(eyebrowse_css::minify(&css).is_ok());

        let generic = font_css(&FontChoice::from("Georgia"), "Georgia, sans-serif");
        assert!(!generic.contains("letter-spacing"));
    }
}
