//! Page zoom engine
//!
//! The body is scaled through a root custom property. Fixed and sticky
//! elements get the inverse scale so they keep their on-screen size.

use eyebrowse_dom::Document;

use crate::config::keys;
use crate::error::{EngineError, EngineResult};
use crate::ledger::{Concern, RestoreReport};
use crate::stylesheet::{css_number, inject_style, is_engine_owned, remove_by_id, root_element, select};
use crate::{EngineState, ZOOM_PROCESSED_ATTR};

const ZOOM_STYLE_ID: &str = "eyebrowse-zoom-style";

pub(crate) const ZOOM_VAR: &str = "--zoom-factor";

const ZOOM_CSS: &str = "body { transform: scale(var(--zoom-factor, 1)); transform-origin: 0 0; }";

const FIXED_SELECTOR: &str = concat!(
    "[style*=\"position: fixed\"], [style*=\"position:fixed\"], .fixed, [class*=\"sticky\"], ",
    "[style*=\"position: sticky\"], [style*=\"position:sticky\"], [data-zoom-processed]",
);

/// Page zoom state
#[derive(Debug, Clone, PartialEq)]
pub struct ZoomEngine {
    factor: f64,
}

impl Default for ZoomEngine {
    fn default() -> Self {
        Self { factor: 1.0 }
    }
}

impl ZoomEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current zoom factor
    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Scale the page to `factor`.
    ///
    /// Fixed elements are corrected from scratch on every call.
    pub fn set_page_zoom(
        &mut self,
        doc: &mut Document,
        state: &mut EngineState,
        factor: f64,
    ) -> EngineResult<()> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(EngineError::invalid(keys::ZOOM, factor));
        }
        let root = root_element(doc)?;
        let body = doc.body().ok_or(EngineError::MissingElement("body"))?;
        let value = css_number(factor);

        state
            .ledger
            .set_style(doc, Concern::Zoom, root, ZOOM_VAR, &value, false)?;
        inject_style(doc, &mut state.ledger, Concern::Zoom, ZOOM_STYLE_ID, ZOOM_CSS)?;
        state.ledger.set_style(
            doc,
            Concern::Zoom,
            body,
            "min-height",
            &format!("calc(100vh / {value})"),
            false,
        )?;

        self.rescale_scroll(doc, factor);

        let inverse = format!("scale({})", css_number(1.0 / factor));
        let fixed: Vec<_> = select(doc, FIXED_SELECTOR)
            .into_iter()
            .filter(|&n| n != root && n != body && !is_engine_owned(doc, n))
            .collect();
        for &node in &fixed {
            state
                .ledger
                .set_style(doc, Concern::Zoom, node, "transform", &inverse, false)?;
            state
                .ledger
                .set_style(doc, Concern::Zoom, node, "transform-origin", "left top", false)?;
            state
                .ledger
                .set_attribute(doc, Concern::Zoom, node, ZOOM_PROCESSED_ATTR, "true")?;
        }

        self.factor = factor;
        tracing::info!("Page zoom {} ({} fixed elements corrected)", value, fixed.len());
        Ok(())
    }

    /// Undo every zoom mutation and scroll back
    pub fn reset_zoom(&mut self, doc: &mut Document, state: &mut EngineState) -> RestoreReport {
        let mut report = state.ledger.restore(doc, Concern::Zoom);
        report.removed += usize::from(remove_by_id(doc, ZOOM_STYLE_ID));
        for node in select(doc, "[data-zoom-processed]") {
            let _ = doc.remove_attribute(node, ZOOM_PROCESSED_ATTR);
        }
        if let Some(root) = doc.document_element() {
            let _ = doc.remove_style_property(root, ZOOM_VAR);
        }
        self.rescale_scroll(doc, 1.0);
        self.factor = 1.0;
        report
    }

    fn rescale_scroll(&self, doc: &mut Document, factor: f64) {
        if factor == self.factor {
            return;
        }
        let viewport = doc.viewport();
        doc.scroll_to(
            viewport.scroll_x * factor / self.factor,
            viewport.scroll_y * factor / self.factor,
        );
    }
}
