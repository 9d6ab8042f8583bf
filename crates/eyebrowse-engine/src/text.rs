//! Text metrics engine
//!
//! Two independent mechanisms:
//!
//! - **Text size**: per-element inline `font-size`, scaled from a baseline
//!   captured once in `data-original-size` so repeated calls never compound.
//! - **Customization**: root-level custom properties consumed by one injected
//!   stylesheet, plus class toggles for the text guide and high contrast.

use eyebrowse_css::{StyleResolver, format_px};
use eyebrowse_dom::{Document, NodeId};

use crate::config::{ContrastMode, TextCustomization, TextSetting, keys};
use crate::error::{EngineError, EngineResult};
use crate::ledger::{Concern, LedgerTarget, RestoreReport};
use crate::stylesheet::{css_number, inject_style, is_engine_owned, remove_by_id, root_element, select};
use crate::{EngineState, ORIGINAL_SIZE_ATTR};

/// Share of the requested change actually applied
const DAMPING: f64 = 0.3;

const TEXT_SELECTOR: &str =
    "p, h1, h2, h3, h4, h5, h6, li, td, th, span, div, a, button, input, textarea, label";

/// Elements containing these keep their size
const EMBEDDED_MEDIA: &[&str] = &["img", "video", "iframe", "canvas", "svg"];

const ADJUSTED_CLASS: &str = "eyebrowse-text-adjusted";
const TEXT_STYLE_ID: &str = "eyebrowse-text-customization";
const TEXT_GUIDE_CLASS: &str = "eyebrowse-text-guide";
const HIGH_CONTRAST_CLASS: &str = "eyebrowse-high-contrast";
const HIGH_CONTRAST_INVERTED_CLASS: &str = "eyebrowse-high-contrast-inverted";

const LINE_SPACING_VAR: &str = "--line-spacing-factor";
const LETTER_SPACING_VAR: &str = "--letter-spacing-value";
const WORD_SPACING_VAR: &str = "--word-spacing-value";
const COLUMN_WIDTH_VAR: &str = "--column-width-percent";
const PARAGRAPH_SPACING_VAR: &str = "--paragraph-spacing-factor";

/// Custom properties written on the root element
pub(crate) const CUSTOM_PROPERTIES: &[&str] = &[
    LINE_SPACING_VAR,
    LETTER_SPACING_VAR,
    WORD_SPACING_VAR,
    COLUMN_WIDTH_VAR,
    PARAGRAPH_SPACING_VAR,
];

const CUSTOMIZATION_CSS: &str = r#"
body * {
  line-height: calc(1.4 * var(--line-spacing-factor, 1)) !important;
  letter-spacing: var(--letter-spacing-value, normal) !important;
  word-spacing: var(--word-spacing-value, normal) !important;
}
body p {
  margin-bottom: calc(1em * var(--paragraph-spacing-factor, 1)) !important;
}
body p, body li, body h1, body h2, body h3, body h4, body h5, body h6, body blockquote {
  max-width: var(--column-width-percent, 100%) !important;
}
html.eyebrowse-text-guide p, html.eyebrowse-text-guide li, html.eyebrowse-text-guide label {
  border-left: 3px solid rgba(0, 0, 0, 0.2) !important;
  padding-left: 10px !important;
}
html.eyebrowse-high-contrast body, html.eyebrowse-high-contrast body * {
  background-color: #fff !important;
  color: #000 !important;
  border-color: #000 !important;
}
html.eyebrowse-high-contrast a {
  color: #00e !important;
  text-decoration: underline !important;
}
html.eyebrowse-high-contrast-inverted body, html.eyebrowse-high-contrast-inverted body * {
  background-color: #000 !important;
  color: #fff !important;
  border-color: #fff !important;
}
html.eyebrowse-high-contrast-inverted a {
  color: #ff0 !important;
  text-decoration: underline !important;
}
"#;

/// Multiplier applied to every baseline for a requested percentage
pub fn damped_factor(percentage: f64) -> f64 {
    1.0 + (percentage / 100.0 - 1.0) * DAMPING
}

fn has_embedded_media(doc: &Document, node: NodeId) -> bool {
    let tree = doc.tree();
    tree.descendants(node)
        .into_iter()
        .filter_map(|n| tree.element(n))
        .any(|e| e.is_any(EMBEDDED_MEDIA))
}

fn original_size(doc: &Document, node: NodeId) -> Option<f64> {
    doc.get_attribute(node, ORIGINAL_SIZE_ATTR)?
        .trim()
        .trim_end_matches("px")
        .parse::<f64>()
        .ok()
        .filter(|px| px.is_finite() && *px > 0.0)
}

/// Text size and text customization state
#[derive(Debug, Clone, PartialEq)]
pub struct TextMetricsEngine {
    size_factor: f64,
    customization: TextCustomization,
}

impl Default for TextMetricsEngine {
    fn default() -> Self {
        Self {
            size_factor: 1.0,
            customization: TextCustomization::default(),
        }
    }
}

impl TextMetricsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Damped factor of the last size adjustment
    pub fn size_factor(&self) -> f64 {
        self.size_factor
    }

    pub fn customization(&self) -> &TextCustomization {
        &self.customization
    }

    /// Scale every text element to `percentage` of its captured baseline
    pub fn adjust_text_size(
        &mut self,
        doc: &mut Document,
        state: &mut EngineState,
        percentage: f64,
    ) -> EngineResult<()> {
        if !percentage.is_finite() || percentage <= 0.0 {
            return Err(EngineError::invalid(keys::TEXT_SIZE, percentage));
        }
        let factor = damped_factor(percentage);
        let root = root_element(doc)?;

        let targets: Vec<_> = select(doc, TEXT_SELECTOR)
            .into_iter()
            .filter(|&n| !is_engine_owned(doc, n) && !has_embedded_media(doc, n))
            .collect();

        // Baselines first, so nothing is measured after a parent was scaled
        let baselines: Vec<(NodeId, f64)> = {
            let resolver = StyleResolver::new(doc);
            targets
                .iter()
                .filter(|&&n| original_size(doc, n).is_none())
                .map(|&n| (n, resolver.font_size_px(n)))
                .collect()
        };
        for (node, px) in &baselines {
            doc.set_attribute(*node, ORIGINAL_SIZE_ATTR, &css_number(*px))?;
        }

        let mut scaled = 0;
        for &node in &targets {
            let Some(original) = original_size(doc, node) else {
                continue;
            };
            state.ledger.set_style(
                doc,
                Concern::TextSize,
                node,
                "font-size",
                &format_px(original * factor),
                false,
            )?;
            scaled += 1;
        }
        doc.add_class(root, ADJUSTED_CLASS)?;
        self.size_factor = factor;
        tracing::info!(
            "Text size {}% (factor {}) applied to {} elements",
            percentage,
            css_number(factor),
            scaled
        );
        Ok(())
    }

    /// Put every element back to its size before the first adjustment
    pub fn reset_text_size(&mut self, doc: &mut Document, state: &mut EngineState) -> RestoreReport {
        let font_size = LedgerTarget::Style("font-size".to_string());
        let marked = select(doc, "[data-original-size]");
        let untracked: Vec<_> = marked
            .iter()
            .copied()
            .filter(|&n| !state.ledger.is_recorded(n, &font_size))
            .collect();

        let mut report = state.ledger.restore(doc, Concern::TextSize);
        for node in untracked {
            if let Some(px) = original_size(doc, node) {
                if doc.set_style_property(node, "font-size", &format_px(px), false).is_ok() {
                    report.restored += 1;
                }
            }
        }
        for node in marked {
            let _ = doc.remove_attribute(node, ORIGINAL_SIZE_ATTR);
        }
        if let Some(root) = doc.document_element() {
            let _ = doc.remove_class(root, ADJUSTED_CLASS);
        }
        self.size_factor = 1.0;
        tracing::debug!("Text size reset ({} restored)", report.restored);
        report
    }

    /// Apply one text setting
    pub fn set_text_setting(
        &mut self,
        doc: &mut Document,
        state: &mut EngineState,
        setting: &TextSetting,
    ) -> EngineResult<()> {
        let root = root_element(doc)?;
        self.customization.update(setting);
        match *setting {
            TextSetting::LineSpacing(v) => {
                self.write_var(doc, state, root, LINE_SPACING_VAR, &css_number(v))?
            }
            TextSetting::ParagraphSpacing(v) => {
                self.write_var(doc, state, root, PARAGRAPH_SPACING_VAR, &css_number(v))?
            }
            TextSetting::LetterSpacing(px) => {
                self.write_var(doc, state, root, LETTER_SPACING_VAR, &format!("{px}px"))?
            }
            TextSetting::WordSpacing(px) => {
                self.write_var(doc, state, root, WORD_SPACING_VAR, &format!("{px}px"))?
            }
            TextSetting::ColumnWidth(pct) => {
                self.write_var(doc, state, root, COLUMN_WIDTH_VAR, &format!("{pct}%"))?
            }
            TextSetting::TextGuide(on) => {
                doc.remove_class(root, TEXT_GUIDE_CLASS)?;
                if on {
                    doc.add_class(root, TEXT_GUIDE_CLASS)?;
                }
            }
            TextSetting::HighContrast(_) | TextSetting::ContrastMode(_) => {
                self.sync_contrast_classes(doc, root)?;
            }
        }
        self.sync_stylesheet(doc, state)?;
        tracing::debug!("Text setting {:?} applied", setting);
        Ok(())
    }

    /// Apply a whole customization snapshot
    pub fn apply_customization(
        &mut self,
        doc: &mut Document,
        state: &mut EngineState,
        customization: &TextCustomization,
    ) -> EngineResult<()> {
        if !customization.is_active() && !self.customization.is_active() {
            self.customization = *customization;
            return Ok(());
        }
        for setting in [
            TextSetting::LineSpacing(customization.line_spacing),
            TextSetting::ParagraphSpacing(customization.paragraph_spacing),
            TextSetting::LetterSpacing(customization.letter_spacing),
            TextSetting::WordSpacing(customization.word_spacing),
            TextSetting::ColumnWidth(customization.column_width),
            TextSetting::TextGuide(customization.text_guide),
            TextSetting::ContrastMode(customization.contrast_mode),
            TextSetting::HighContrast(customization.high_contrast),
        ] {
            self.set_text_setting(doc, state, &setting)?;
        }
        Ok(())
    }

    /// Whether any customization differs from its inactive state
    pub fn has_active_customization(&self) -> bool {
        self.customization.is_active()
    }

    /// Drop every custom property, toggle class and the stylesheet
    pub fn reset_text_settings(&mut self, doc: &mut Document, state: &mut EngineState) -> RestoreReport {
        let mut report = state.ledger.restore(doc, Concern::TextSettings);
        report.removed += usize::from(remove_by_id(doc, TEXT_STYLE_ID));
        if let Some(root) = doc.document_element() {
            for property in CUSTOM_PROPERTIES {
                let _ = doc.remove_style_property(root, property);
            }
            for class in [TEXT_GUIDE_CLASS, HIGH_CONTRAST_CLASS, HIGH_CONTRAST_INVERTED_CLASS] {
                let _ = doc.remove_class(root, class);
            }
        }
        self.customization = TextCustomization::default();
        report
    }

    fn write_var(
        &self,
        doc: &mut Document,
        state: &mut EngineState,
        root: NodeId,
        name: &str,
        value: &str,
    ) -> EngineResult<()> {
        state
            .ledger
            .set_style(doc, Concern::TextSettings, root, name, value, false)?;
        Ok(())
    }

    fn sync_contrast_classes(&self, doc: &mut Document, root: NodeId) -> EngineResult<()> {
        doc.remove_class(root, HIGH_CONTRAST_CLASS)?;
        doc.remove_class(root, HIGH_CONTRAST_INVERTED_CLASS)?;
        if self.customization.high_contrast {
            let class = match self.customization.contrast_mode {
                ContrastMode::Normal => HIGH_CONTRAST_CLASS,
                ContrastMode::Inverted => HIGH_CONTRAST_INVERTED_CLASS,
            };
            doc.add_class(root, class)?;
        }
        Ok(())
    }

    fn sync_stylesheet(&self, doc: &mut Document, state: &mut EngineState) -> EngineResult<()> {
        if self.customization.is_active() {
            inject_style(
                doc,
                &mut state.ledger,
                Concern::TextSettings,
                TEXT_STYLE_ID,
                CUSTOMIZATION_CSS,
            )?;
        } else if remove_by_id(doc, TEXT_STYLE_ID) {
            tracing::debug!("No active text customization, stylesheet removed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_damped_factor() {
        assert!((damped_factor(150.0) - 1.15).abs() < 1e-9);
        assert!((damped_factor(100.0) - 1.0).abs() < 1e-9);
        assert!((damped_factor(50.0) - 0.85).abs() < 1e-9);
    }

    #[test]
    fn test_customization_css_parses() {
        assert!(eyebrowse_css::minify(CUSTOMIZATION_CSS).is_ok());
    }

    #[test]
    fn test_invalid_percentage_rejected() {
        let mut doc = Document::new("about:blank");
        let mut state = EngineState::new();
        let mut engine = TextMetricsEngine::new();
        for bad in [f64::NAN, f64::INFINITY, 0.0, -20.0] {
            assert!(engine.adjust_text_size(&mut doc, &mut state, bad).is_err());
        }
        assert!(state.ledger.is_empty());
        let root = doc.document_element().unwrap();
        assert!(!doc.has_class(root, ADJUSTED_CLASS));
    }
}
