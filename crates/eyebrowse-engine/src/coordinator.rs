//! Settings coordinator
//!
//! One per page load. Owns the engine state and routes configuration changes
//! to the individual engines in a fixed order.

use eyebrowse_dom::Document;

use crate::config::{Configuration, FilterType, FontChoice, TextSetting};
use crate::error::{EngineError, EngineResult};
use crate::filter::FilterEngine;
use crate::font::FontEngine;
use crate::ledger::{Concern, RestoreReport};
use crate::stylesheet::{remove_matching, select};
use crate::text::{CUSTOM_PROPERTIES, TextMetricsEngine};
use crate::zoom::{ZOOM_VAR, ZoomEngine};
use crate::{CLASS_PREFIX, EngineState, ORIGINAL_SIZE_ATTR, ZOOM_PROCESSED_ATTR};

/// Outcome of [`SettingsCoordinator::apply_all`]
#[derive(Debug, Default)]
pub struct ApplyReport {
    /// Engines that failed, with the error they reported
    pub failures: Vec<(Concern, EngineError)>,
}

impl ApplyReport {
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }

    fn check(&mut self, concern: Concern, result: EngineResult<()>) {
        if let Err(e) = result {
            tracing::warn!("Applying {} failed: {}", concern, e);
            self.failures.push((concern, e));
        }
    }
}

/// Per-document engine owner
#[derive(Debug, Default)]
pub struct SettingsCoordinator {
    state: EngineState,
    filter: FilterEngine,
    font: FontEngine,
    text: TextMetricsEngine,
    zoom: ZoomEngine,
}

impl SettingsCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn active_filter(&self) -> FilterType {
        self.filter.active()
    }

    pub fn active_font(&self) -> &FontChoice {
        self.font.active()
    }

    pub fn zoom_factor(&self) -> f64 {
        self.zoom.factor()
    }

    pub fn text_size_factor(&self) -> f64 {
        self.text.size_factor()
    }

    pub fn text_metrics(&self) -> &TextMetricsEngine {
        &self.text
    }

    /// Bring the document in line with `config`.
    ///
    /// Every engine runs even when an earlier one fails.
    pub fn apply_all(&mut self, doc: &mut Document, config: &Configuration) -> ApplyReport {
        let mut report = ApplyReport::default();

        let result = self.set_filter(doc, config.filter);
        report.check(Concern::Filter, result);

        let result = self.set_font(doc, &config.font);
        report.check(Concern::Font, result);

        let result = if (config.zoom_factor - 1.0).abs() > f64::EPSILON {
            self.set_page_zoom(doc, config.zoom_factor)
        } else {
            self.zoom.reset_zoom(doc, &mut self.state);
            Ok(())
        };
        report.check(Concern::Zoom, result);

        let result = if (config.text_size_factor - 1.0).abs() > f64::EPSILON {
            self.adjust_text_size(doc, config.text_size_factor * 100.0)
        } else {
            self.text.reset_text_size(doc, &mut self.state);
            Ok(())
        };
        report.check(Concern::TextSize, result);

        let result = self
            .text
            .apply_customization(doc, &mut self.state, &config.text_customization());
        report.check(Concern::TextSettings, result);

        tracing::info!(
            "Applied settings to {} ({} failures)",
            doc.url(),
            report.failures.len()
        );
        report
    }

    /// Undo everything, then sweep any engine residue left behind
    pub fn reset_all(&mut self, doc: &mut Document) -> RestoreReport {
        let mut report = RestoreReport::default();
        for part in [
            self.filter.remove(doc, &mut self.state),
            self.font.remove(doc, &mut self.state),
            self.zoom.reset_zoom(doc, &mut self.state),
            self.text.reset_text_size(doc, &mut self.state),
            self.text.reset_text_settings(doc, &mut self.state),
        ] {
            report.merge(part);
        }

        let roots: Vec<_> = [doc.document_element(), doc.body()].into_iter().flatten().collect();
        for node in roots {
            if let Err(e) = doc.remove_classes_where(node, |c| c.starts_with(CLASS_PREFIX)) {
                tracing::warn!("Could not strip classes from {}: {}", node, e);
            }
        }
        if let Some(root) = doc.document_element() {
            for property in CUSTOM_PROPERTIES.iter().chain([&ZOOM_VAR]) {
                let _ = doc.remove_style_property(root, property);
            }
        }
        report.removed += remove_matching(doc, "[id^=\"eyebrowse-\"]");
        for attr in [ORIGINAL_SIZE_ATTR, ZOOM_PROCESSED_ATTR] {
            for node in select(doc, &format!("[{attr}]")) {
                let _ = doc.remove_attribute(node, attr);
            }
        }

        report.merge(self.state.ledger.restore_all(doc));
        self.state.observers.unsubscribe_all(doc);

        tracing::info!(
            "Reset {}: {} values restored, {} elements removed",
            doc.url(),
            report.restored,
            report.removed
        );
        report
    }

    pub fn set_filter(&mut self, doc: &mut Document, filter: FilterType) -> EngineResult<()> {
        self.filter.apply(doc, &mut self.state, filter)
    }

    pub fn set_font(&mut self, doc: &mut Document, font: &FontChoice) -> EngineResult<()> {
        self.font.apply(doc, &mut self.state, font)
    }

    pub fn set_text_setting(&mut self, doc: &mut Document, setting: &TextSetting) -> EngineResult<()> {
        self.text.set_text_setting(doc, &mut self.state, setting)
    }

    /// Scale text to `percentage` of its original size
    pub fn adjust_text_size(&mut self, doc: &mut Document, percentage: f64) -> EngineResult<()> {
        self.text.adjust_text_size(doc, &mut self.state, percentage)
    }

    pub fn set_page_zoom(&mut self, doc: &mut Document, factor: f64) -> EngineResult<()> {
        self.zoom.set_page_zoom(doc, &mut self.state, factor)
    }

    /// Deliver pending mutation records to the live subscriptions
    pub fn process_mutations(&mut self, doc: &mut Document) -> usize {
        let EngineState { ledger, observers } = &mut self.state;
        observers.dispatch(doc, ledger)
    }
}
