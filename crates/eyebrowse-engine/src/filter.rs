//! Color filter engine
//!
//! Whole-page filters are a single injected stylesheet. The color-vision
//! filters additionally inject an SVG color matrix and point every media
//! element at it, including media inserted later.

use eyebrowse_dom::{Document, NodeId};

use crate::config::FilterType;
use crate::error::{EngineError, EngineResult};
use crate::ledger::{Concern, RestoreReport, StyleLedger};
use crate::stylesheet::{force_reflow, inject_style, is_engine_owned, remove_by_id, select};
use crate::EngineState;

/// Elements whose pixels the SVG matrix is applied to
const MEDIA_SELECTOR: &str = "img, video, canvas, svg, [style*=\"background-image\"]";

const MEDIA_TAGS: &[&str] = &["img", "video", "canvas", "svg"];

const SVG_NS: &str = "http://www.w3.org/2000/svg";

fn css_for(filter: FilterType) -> Option<String> {
    let css = match filter {
        FilterType::Off => return None,
        FilterType::Grayscale => "html { filter: grayscale(100%) !important; }".to_string(),
        FilterType::Dark => concat!(
            "html { filter: invert(90%) hue-rotate(180deg) brightness(0.8) !important; }\n",
            "img, picture, video, canvas, svg { filter: invert(100%) hue-rotate(180deg) !important; }",
        )
        .to_string(),
        cvd => format!(
            "html {{ filter: brightness(1.05) saturate({}) !important; }}",
            saturation(cvd)
        ),
    };
    Some(css)
}

fn saturation(filter: FilterType) -> f64 {
    match filter {
        FilterType::Protanopia => 1.2,
        FilterType::Deuteranopia => 1.1,
        _ => 1.0,
    }
}

/// 4x5 `feColorMatrix` values
fn color_matrix(filter: FilterType) -> Option<&'static str> {
    match filter {
        FilterType::Protanopia => Some("0.567 0.433 0 0 0 0.558 0.442 0 0 0 0 0.242 0.758 0 0 0 0 0 1 0"),
        FilterType::Deuteranopia => Some("0.625 0.375 0 0 0 0.7 0.3 0 0 0 0 0.3 0.7 0 0 0 0 0 1 0"),
        FilterType::Tritanopia => Some("0.95 0.05 0 0 0 0 0.433 0.567 0 0 0 0.475 0.525 0 0 0 0 0 1 0"),
        _ => None,
    }
}

/// Media element not created by the engine
fn is_media(doc: &Document, node: NodeId) -> bool {
    let Some(elem) = doc.tree().element(node) else {
        return false;
    };
    let media = elem.is_any(MEDIA_TAGS)
        || elem
            .style
            .get("background-image")
            .is_some_and(|v| !v.eq_ignore_ascii_case("none"));
    media && !is_engine_owned(doc, node)
}

fn svg_reference(filter: FilterType) -> Option<String> {
    filter.svg_filter_id().map(|id| format!("url(#{id})"))
}

/// Page color filter state machine
#[derive(Debug, Default)]
pub struct FilterEngine {
    active: FilterType,
}

impl FilterEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently applied filter
    pub fn active(&self) -> FilterType {
        self.active
    }

    /// Replace whatever filter is active with `filter`.
    ///
    /// A failure part way through leaves the page unfiltered.
    pub fn apply(
        &mut self,
        doc: &mut Document,
        state: &mut EngineState,
        filter: FilterType,
    ) -> EngineResult<()> {
        self.remove(doc, state);
        if filter == FilterType::Off {
            return Ok(());
        }

        if let Err(e) = self.install(doc, state, filter) {
            tracing::warn!("Applying {} failed, rolling back: {}", filter, e);
            self.remove(doc, state);
            return Err(e);
        }
        self.active = filter;
        tracing::info!("Applied {} filter", filter);
        Ok(())
    }

    fn install(
        &mut self,
        doc: &mut Document,
        state: &mut EngineState,
        filter: FilterType,
    ) -> EngineResult<()> {
        let (Some(id), Some(css)) = (filter.style_id(), css_for(filter)) else {
            return Ok(());
        };
        inject_style(doc, &mut state.ledger, Concern::Filter, &id, &css)?;

        let (Some(reference), Some(matrix)) = (svg_reference(filter), color_matrix(filter)) else {
            return Ok(());
        };

        let media: Vec<_> = select(doc, MEDIA_SELECTOR)
            .into_iter()
            .filter(|&n| !is_engine_owned(doc, n))
            .collect();
        for &node in &media {
            state
                .ledger
                .set_style(doc, Concern::Filter, node, "filter", &reference, false)?;
        }
        tracing::debug!("Pointed {} media elements at {}", media.len(), reference);

        self.insert_svg(doc, &mut state.ledger, filter, matrix)?;

        state.observers.subscribe(
            doc,
            Concern::Filter,
            is_media,
            Box::new(move |doc, ledger, node| {
                if let Err(e) =
                    ledger.set_style(doc, Concern::Filter, node, "filter", &reference, false)
                {
                    tracing::warn!("Could not filter inserted {}: {}", node, e);
                }
            }),
        );
        Ok(())
    }

    fn insert_svg(
        &self,
        doc: &mut Document,
        ledger: &mut StyleLedger,
        filter: FilterType,
        matrix: &str,
    ) -> EngineResult<()> {
        let (Some(container_id), Some(filter_id)) = (filter.container_id(), filter.svg_filter_id())
        else {
            return Ok(());
        };
        remove_by_id(doc, &container_id);

        let container = doc.create_element("div");
        doc.set_attribute(container, "id", &container_id)?;
        let svg = doc.create_element("svg");
        doc.set_attribute(svg, "xmlns", SVG_NS)?;
        doc.set_style_property(svg, "display", "none", false)?;
        let svg_filter = doc.create_element("filter");
        doc.set_attribute(svg_filter, "id", &filter_id)?;
        let fe = doc.create_element("feColorMatrix");
        doc.set_attribute(fe, "type", "matrix")?;
        doc.set_attribute(fe, "values", matrix)?;

        doc.append_child(svg_filter, fe)?;
        doc.append_child(svg, svg_filter)?;
        doc.append_child(container, svg)?;

        let parent = doc
            .body()
            .or_else(|| doc.document_element())
            .ok_or(EngineError::MissingElement("body"))?;
        doc.append_child(parent, container)?;
        ledger.adopt(Concern::Filter, container);
        Ok(())
    }

    /// Undo every filter mutation. Safe to call when nothing is applied.
    pub fn remove(&mut self, doc: &mut Document, state: &mut EngineState) -> RestoreReport {
        state.observers.unsubscribe(doc, Concern::Filter);
        let mut report = state.ledger.restore(doc, Concern::Filter);

        // Leftovers from an earlier injection of the page script
        for filter in FilterType::ALL {
            if let Some(id) = filter.style_id() {
                report.removed += usize::from(remove_by_id(doc, &id));
            }
            if let Some(id) = filter.container_id() {
                report.removed += usize::from(remove_by_id(doc, &id));
            }
        }

        let previous = std::mem::take(&mut self.active);
        if previous != FilterType::Off || report != RestoreReport::default() {
            tracing::debug!("Removed {} filter", previous);
        }
        force_reflow(doc);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_css_per_filter() {
        assert!(css_for(FilterType::Off).is_none());
        assert!(css_for(FilterType::Grayscale).unwrap().contains("grayscale(100%)"));
        assert!(css_for(FilterType::Protanopia).unwrap().contains("saturate(1.2)"));
        assert!(css_for(FilterType::Tritanopia).unwrap().contains("saturate(1)"));
        assert!(css_for(FilterType::Dark).unwrap().contains("picture"));
    }

    #[test]
    fn test_matrices_have_twenty_entries() {
        for filter in FilterType::ALL {
            if let Some(matrix) = color_matrix(filter) {
                assert!(filter.is_color_vision());
                assert_eq!(matrix.split_whitespace().count(), 20);
            }
        }
    }
}
