//! Style cascade
//!
//! Resolves computed values for a snapshot of a document: user-agent rules,
//! every connected `<style>` element, and inline styles. Ranking follows
//! importance, origin, inline-ness, specificity and source order.

use std::cell::RefCell;
use std::collections::HashMap;

use eyebrowse_dom::{Document, NodeId, Selector, Specificity};

use crate::values::{format_px, parse_font_size, substitute_vars};
use crate::{CssParser, Declaration};

/// Initial `font-size` of the root element
pub const DEFAULT_FONT_SIZE_PX: f64 = 16.0;

const USER_AGENT_CSS: &str = r#"
head, style, script, template, title, meta, link, base, noscript { display: none }
html, body, div, p, h1, h2, h3, h4, h5, h6, ul, ol, article, section, main,
header, footer, nav, aside, table, form, pre, blockquote, figure { display: block }
li { display: list-item }
h1 { font-size: 2em }
h2 { font-size: 1.5em }
h3 { font-size: 1.17em }
h4 { font-size: 1em }
h5 { font-size: 0.83em }
h6 { font-size: 0.67em }
small { font-size: smaller }
pre, code, kbd, samp, tt { font-family: monospace }
"#;

const INHERITED: &[&str] = &[
    "color",
    "font-family",
    "font-size",
    "font-style",
    "font-weight",
    "letter-spacing",
    "line-height",
    "text-align",
    "visibility",
    "white-space",
    "word-spacing",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Origin {
    UserAgent,
    Author,
}

#[derive(Debug)]
struct IndexedRule {
    selectors: Vec<Selector>,
    declarations: Vec<Declaration>,
    origin: Origin,
    order: usize,
}

/// (important, origin, inline, specificity, rule order, declaration order)
type Rank = (bool, Origin, bool, Specificity, usize, usize);

/// Computed-style resolver over a document snapshot
pub struct StyleResolver<'a> {
    doc: &'a Document,
    rules: Vec<IndexedRule>,
    font_sizes: RefCell<HashMap<NodeId, f64>>,
}

impl<'a> StyleResolver<'a> {
    /// Collect user-agent rules and every connected `<style>` element
    pub fn new(doc: &'a Document) -> Self {
        let mut resolver = Self {
            doc,
            rules: Vec::new(),
            font_sizes: RefCell::new(HashMap::new()),
        };
        resolver.add_sheet(USER_AGENT_CSS, Origin::UserAgent);

        let styles = doc.query_selector_all("style").unwrap_or_default();
        for style in styles {
            let text = doc.tree().text_content(style);
            resolver.add_sheet(&text, Origin::Author);
        }
        tracing::debug!("Style resolver built with {} rules", resolver.rules.len());
        resolver
    }

    fn add_sheet(&mut self, css: &str, origin: Origin) {
        let sheet = match CssParser::lenient().parse(css) {
            Ok(sheet) => sheet,
            Err(e) => {
                tracing::warn!("Ignoring unparsable stylesheet: {}", e);
                return;
            }
        };
        for rule in sheet.rules {
            let order = self.rules.len();
            self.rules.push(IndexedRule {
                selectors: rule.selectors,
                declarations: rule.declarations,
                origin,
                order,
            });
        }
    }

    /// Number of rules taking part in the cascade
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    fn element_or_parent(&self, node: NodeId) -> Option<NodeId> {
        let tree = self.doc.tree();
        if tree.element(node).is_some() {
            return Some(node);
        }
        tree.parent(node).filter(|&p| tree.element(p).is_some())
    }

    fn parent_element(&self, node: NodeId) -> Option<NodeId> {
        let tree = self.doc.tree();
        tree.parent(node).filter(|&p| tree.element(p).is_some())
    }

    /// Winning declared value before `var()` substitution
    fn cascaded(&self, node: NodeId, property: &str) -> Option<String> {
        let tree = self.doc.tree();
        let elem = tree.element(node)?;
        let mut best: Option<(Rank, String)> = None;

        for rule in &self.rules {
            let Some(specificity) = rule
                .selectors
                .iter()
                .filter(|s| s.matches(tree, node))
                .map(Selector::specificity)
                .max()
            else {
                continue;
            };
            for (i, decl) in rule.declarations.iter().enumerate() {
                if decl.property == property {
                    let rank = (decl.important, rule.origin, false, specificity, rule.order, i);
                    keep_best(&mut best, rank, &decl.value);
                }
            }
        }

        if let Some(value) = elem.style.get(property) {
            let rank = (
                elem.style.is_important(property),
                Origin::Author,
                true,
                Specificity::default(),
                usize::MAX,
                0,
            );
            keep_best(&mut best, rank, value);
        }
        best.map(|(_, v)| v)
    }

    fn raw_custom_property(&self, node: NodeId, name: &str) -> Option<String> {
        let mut current = self.element_or_parent(node);
        while let Some(n) = current {
            if let Some(value) = self.cascaded(n, name) {
                if !value.eq_ignore_ascii_case("inherit") {
                    return Some(value);
                }
            }
            current = self.parent_element(n);
        }
        None
    }

    /// Inherited custom property value with nested `var()` resolved
    pub fn custom_property(&self, node: NodeId, name: &str) -> Option<String> {
        let raw = self.raw_custom_property(node, name)?;
        substitute_vars(&raw, &|n| self.raw_custom_property(node, n))
    }

    /// Cascaded value with `var()` references substituted
    fn specified(&self, node: NodeId, property: &str) -> Option<String> {
        let value = self.cascaded(node, property)?;
        if !value.contains("var(") {
            return Some(value);
        }
        let substituted = substitute_vars(&value, &|n| self.raw_custom_property(node, n));
        if substituted.is_none() {
            tracing::debug!("Invalid var() reference in {}: {}", property, value);
        }
        substituted
    }

    /// `getComputedStyle(node).getPropertyValue(property)`
    pub fn computed_value(&self, node: NodeId, property: &str) -> Option<String> {
        let property = normalize(property);
        if property.starts_with("--") {
            return self.custom_property(node, &property);
        }
        let node = self.element_or_parent(node)?;
        if property == "font-size" {
            return Some(format_px(self.font_size_px(node)));
        }

        let inherited = INHERITED.contains(&property.as_str());
        match self.specified(node, &property) {
            Some(v) if v.eq_ignore_ascii_case("initial") => initial_value(&property),
            Some(v) if v.eq_ignore_ascii_case("inherit") => self.inherit(node, &property),
            Some(v) if v.eq_ignore_ascii_case("unset") => {
                if inherited {
                    self.inherit(node, &property)
                } else {
                    initial_value(&property)
                }
            }
            Some(v) => Some(v),
            None if inherited => self.inherit(node, &property),
            None => initial_value(&property),
        }
    }

    fn inherit(&self, node: NodeId, property: &str) -> Option<String> {
        match self.parent_element(node) {
            Some(parent) => self.computed_value(parent, property),
            None => initial_value(property),
        }
    }

    /// Computed `font-size` in pixels
    pub fn font_size_px(&self, node: NodeId) -> f64 {
        let Some(node) = self.element_or_parent(node) else {
            return DEFAULT_FONT_SIZE_PX;
        };
        if let Some(&cached) = self.font_sizes.borrow().get(&node) {
            return cached;
        }

        let parent_px = self
            .parent_element(node)
            .map(|p| self.font_size_px(p))
            .unwrap_or(DEFAULT_FONT_SIZE_PX);
        let root = self.doc.document_element();
        let root_px = match root {
            Some(r) if r != node => self.font_size_px(r),
            _ => DEFAULT_FONT_SIZE_PX,
        };

        let px = match self.specified(node, "font-size") {
            Some(v) if v.eq_ignore_ascii_case("initial") => DEFAULT_FONT_SIZE_PX,
            Some(v) => parse_font_size(&v, parent_px, root_px).unwrap_or(parent_px),
            None => parent_px,
        };
        self.font_sizes.borrow_mut().insert(node, px);
        px
    }

    /// Computed `font-family`
    pub fn font_family(&self, node: NodeId) -> String {
        self.computed_value(node, "font-family")
            .unwrap_or_else(|| "serif".to_string())
    }

    /// Whether the element is not rendered or fully transparent
    pub fn is_hidden(&self, node: NodeId) -> bool {
        if !self.doc.is_connected(node) {
            return true;
        }
        let Some(elem) = self.element_or_parent(node) else {
            return false;
        };
        let mut current = Some(elem);
        while let Some(n) = current {
            if self
                .computed_value(n, "display")
                .is_some_and(|d| d.eq_ignore_ascii_case("none"))
            {
                return true;
            }
            let opacity = self
                .computed_value(n, "opacity")
                .and_then(|o| o.trim().parse::<f64>().ok());
            if opacity == Some(0.0) {
                return true;
            }
            current = self.parent_element(n);
        }
        self.computed_value(elem, "visibility")
            .is_some_and(|v| v.eq_ignore_ascii_case("hidden") || v.eq_ignore_ascii_case("collapse"))
    }
}

fn keep_best(best: &mut Option<(Rank, String)>, rank: Rank, value: &str) {
    if best.as_ref().is_none_or(|(b, _)| rank > *b) {
        *best = Some((rank, value.to_string()));
    }
}

fn normalize(property: &str) -> String {
    let property = property.trim();
    if property.starts_with("--") {
        property.to_string()
    } else {
        property.to_ascii_lowercase()
    }
}

fn initial_value(property: &str) -> Option<String> {
    let value = match property {
        "color" => "canvastext",
        "display" => "inline",
        "filter" | "transform" => "none",
        "font-family" => "serif",
        "font-style" => "normal",
        "font-weight" => "400",
        "letter-spacing" | "word-spacing" | "line-height" | "white-space" => "normal",
        "min-height" | "height" | "width" => "auto",
        "opacity" => "1",
        "position" => "static",
        "text-align" => "start",
        "transform-origin" => "50% 50%",
        "visibility" => "visible",
        _ => return None,
    };
    Some(value.to_string())
}
