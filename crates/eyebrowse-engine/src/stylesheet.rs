//! Injected stylesheets and shared DOM helpers

use eyebrowse_dom::{Document, NodeId};

use crate::error::{EngineError, EngineResult};
use crate::ledger::{Concern, StyleLedger};
use crate::ID_PREFIX;

/// Ensure `<style id=...>` holds `css`, creating it in `<head>` if needed.
///
/// The CSS is validated and minified before it touches the document.
pub(crate) fn inject_style(
    doc: &mut Document,
    ledger: &mut StyleLedger,
    concern: Concern,
    id: &str,
    css: &str,
) -> EngineResult<NodeId> {
    let text = eyebrowse_css::minify(css)?;

    if let Some(existing) = doc.get_element_by_id(id) {
        doc.set_text_content(existing, &text)?;
        ledger.adopt(concern, existing);
        return Ok(existing);
    }

    let parent = doc
        .head()
        .or_else(|| doc.document_element())
        .ok_or(EngineError::MissingElement("head"))?;
    let style = doc.create_element("style");
    doc.set_attribute(style, "id", id)?;
    doc.set_text_content(style, &text)?;
    doc.append_child(parent, style)?;
    ledger.adopt(concern, style);
    tracing::debug!("Injected style #{}", id);
    Ok(style)
}

/// Remove the element with `id`, if present
pub(crate) fn remove_by_id(doc: &mut Document, id: &str) -> bool {
    match doc.get_element_by_id(id) {
        Some(node) => doc.remove(node),
        None => false,
    }
}

/// Remove every element whose id matches `selector`. Returns the count.
pub(crate) fn remove_matching(doc: &mut Document, selector: &str) -> usize {
    let nodes = match doc.query_selector_all(selector) {
        Ok(nodes) => nodes,
        Err(e) => {
            tracing::warn!("Bad cleanup selector {}: {}", selector, e);
            return 0;
        }
    };
    nodes.into_iter().filter(|&n| doc.remove(n)).count()
}

/// Nudge the body so the renderer recomputes layout, leaving its inline style as it was
pub(crate) fn force_reflow(doc: &mut Document) {
    let Some(body) = doc.body() else {
        return;
    };
    let prior = doc
        .tree()
        .element(body)
        .and_then(|e| e.style.get("transform").map(|v| (v.to_string(), e.style.is_important("transform"))));

    if doc
        .set_style_property(body, "transform", "translateZ(0)", false)
        .is_err()
    {
        return;
    }
    doc.flush_layout();
    let restored = match prior {
        Some((value, important)) => doc.set_style_property(body, "transform", &value, important),
        None => doc.remove_style_property(body, "transform").map(|_| ()),
    };
    if let Err(e) = restored {
        tracing::warn!("Could not restore body transform: {}", e);
    }
}

/// Whether the node sits inside an engine-created element
pub(crate) fn is_engine_owned(doc: &Document, node: NodeId) -> bool {
    let tree = doc.tree();
    std::iter::once(node)
        .chain(tree.ancestors(node))
        .filter_map(|n| tree.element(n))
        .any(|e| e.id().is_some_and(|id| id.starts_with(ID_PREFIX)))
}

/// The `<html>` element, required by every root-level write
pub(crate) fn root_element(doc: &Document) -> EngineResult<NodeId> {
    doc.document_element()
        .ok_or(EngineError::MissingElement("html"))
}

/// Elements matching `selector`, or none when the selector is rejected
pub(crate) fn select(doc: &Document, selector: &str) -> Vec<NodeId> {
    doc.query_selector_all(selector).unwrap_or_else(|e| {
        tracing::warn!("Selector {} rejected: {}", selector, e);
        Vec::new()
    })
}

/// Number as written into CSS, at most six decimals
pub(crate) fn css_number(value: f64) -> String {
    let rounded = (value * 1e6).round() / 1e6;
    if rounded == 0.0 {
        return "0".to_string();
    }
    format!("{rounded}")
}
