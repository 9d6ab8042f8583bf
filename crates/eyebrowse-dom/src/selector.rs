//! Selector matching
//!
//! Supports the subset the engine and its stylesheets rely on: type and
//! universal selectors, `#id`, `.class`, attribute selectors
//! (`=`, `~=`, `|=`, `^=`, `$=`, `*=`), `:root`, and the descendant and
//! child combinators. Anything else is rejected as unsupported.

use crate::style::split_top_level;
use crate::{DomError, DomResult, DomTree, NodeId};

/// Selector specificity (ids, classes/attributes, types)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Specificity(pub u32, pub u32, pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttrOp {
    Equals,
    Includes,
    DashMatch,
    Prefix,
    Suffix,
    Contains,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrSelector {
    name: String,
    op: Option<(AttrOp, String)>,
}

impl AttrSelector {
    fn matches(&self, actual: Option<&str>) -> bool {
        let Some(actual) = actual else {
            return false;
        };
        let Some((op, expected)) = &self.op else {
            return true;
        };
        match op {
            AttrOp::Equals => actual == expected,
            AttrOp::Includes => actual.split_whitespace().any(|w| w == expected),
            AttrOp::DashMatch => {
                actual == expected || actual.starts_with(&format!("{expected}-"))
            }
            AttrOp::Prefix => !expected.is_empty() && actual.starts_with(expected.as_str()),
            AttrOp::Suffix => !expected.is_empty() && actual.ends_with(expected.as_str()),
            AttrOp::Contains => !expected.is_empty() && actual.contains(expected.as_str()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    ids: Vec<String>,
    classes: Vec<String>,
    attrs: Vec<AttrSelector>,
    root: bool,
}

impl Compound {
    fn matches(&self, tree: &DomTree, node: NodeId) -> bool {
        let Some(elem) = tree.element(node) else {
            return false;
        };
        if let Some(tag) = &self.tag {
            if !elem.is(tag) {
                return false;
            }
        }
        if self.root && tree.parent(node) != Some(tree.root()) {
            return false;
        }
        if !self.ids.iter().all(|id| elem.id() == Some(id.as_str())) {
            return false;
        }
        if !self.classes.iter().all(|c| elem.classes.contains(c)) {
            return false;
        }
        self.attrs
            .iter()
            .all(|a| a.matches(elem.get_attr(&a.name).as_deref()))
    }

    fn specificity(&self) -> Specificity {
        Specificity(
            self.ids.len() as u32,
            (self.classes.len() + self.attrs.len() + usize::from(self.root)) as u32,
            u32::from(self.tag.is_some()),
        )
    }
}

/// A complex selector (compounds joined by combinators)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    text: String,
    compounds: Vec<Compound>,
    combinators: Vec<Combinator>,
}

impl Selector {
    /// Parse a single complex selector
    pub fn parse(input: &str) -> DomResult<Self> {
        let text = input.trim();
        let unsupported = || DomError::InvalidSelector(text.to_string());
        let mut cursor = Cursor::new(text);
        let mut compounds = vec![cursor.compound().ok_or_else(unsupported)?];
        let mut combinators = Vec::new();
        loop {
            let had_space = cursor.skip_ws();
            if cursor.eof() {
                break;
            }
            let combinator = if cursor.eat('>') {
                cursor.skip_ws();
                Combinator::Child
            } else if had_space {
                Combinator::Descendant
            } else {
                return Err(unsupported());
            };
            combinators.push(combinator);
            compounds.push(cursor.compound().ok_or_else(unsupported)?);
        }
        Ok(Self {
            text: text.to_string(),
            compounds,
            combinators,
        })
    }

    pub fn specificity(&self) -> Specificity {
        self.compounds.iter().fold(Specificity::default(), |acc, c| {
            let s = c.specificity();
            Specificity(acc.0 + s.0, acc.1 + s.1, acc.2 + s.2)
        })
    }

    /// Test an element against this selector
    pub fn matches(&self, tree: &DomTree, node: NodeId) -> bool {
        self.matches_at(tree, node, self.compounds.len() - 1)
    }

    fn matches_at(&self, tree: &DomTree, node: NodeId, idx: usize) -> bool {
        if !self.compounds[idx].matches(tree, node) {
            return false;
        }
        if idx == 0 {
            return true;
        }
        match self.combinators[idx - 1] {
            Combinator::Child => tree
                .parent(node)
                .is_some_and(|p| self.matches_at(tree, p, idx - 1)),
            Combinator::Descendant => {
                let mut current = tree.parent(node);
                while let Some(p) = current {
                    if self.matches_at(tree, p, idx - 1) {
                        return true;
                    }
                    current = tree.parent(p);
                }
                false
            }
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Comma-separated selector list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectorList {
    selectors: Vec<Selector>,
}

impl SelectorList {
    /// Parse a list; any unsupported member fails the whole list
    pub fn parse(input: &str) -> DomResult<Self> {
        let selectors = split_top_level(input, ',')
            .into_iter()
            .map(Selector::parse)
            .collect::<DomResult<Vec<_>>>()?;
        Ok(Self { selectors })
    }

    /// Parse a list, dropping members this engine cannot match
    pub fn parse_lenient(input: &str) -> Self {
        let selectors = split_top_level(input, ',')
            .into_iter()
            .filter_map(|s| match Selector::parse(s) {
                Ok(sel) => Some(sel),
                Err(e) => {
                    tracing::debug!("Skipping selector: {}", e);
                    None
                }
            })
            .collect();
        Self { selectors }
    }

    pub fn matches(&self, tree: &DomTree, node: NodeId) -> bool {
        self.selectors.iter().any(|s| s.matches(tree, node))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Selector> {
        self.selectors.iter()
    }

    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }
}

struct Cursor {
    chars: Vec<char>,
    pos: usize,
}

impl Cursor {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn eof(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos != start
    }

    fn ident(&mut self) -> Option<String> {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                self.pos += 1;
                out.push(self.peek()?);
                self.pos += 1;
            } else if c.is_alphanumeric() || c == '-' || c == '_' || !c.is_ascii() {
                out.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        (!out.is_empty()).then_some(out)
    }

    fn quoted(&mut self) -> Option<String> {
        let quote = self.peek().filter(|c| *c == '"' || *c == '\'')?;
        self.pos += 1;
        let mut out = String::new();
        loop {
            let c = self.peek()?;
            self.pos += 1;
            match c {
                '\\' => {
                    out.push(self.peek()?);
                    self.pos += 1;
                }
                c if c == quote => return Some(out),
                c => out.push(c),
            }
        }
    }

    fn compound(&mut self) -> Option<Compound> {
        let mut compound = Compound::default();
        let mut any = false;
        if self.eat('*') {
            any = true;
        } else if self.peek().is_some_and(|c| c.is_alphabetic() || c == '_' || c == '\\') {
            compound.tag = Some(self.ident()?);
            any = true;
        }
        loop {
            match self.peek() {
                Some('#') => {
                    self.pos += 1;
                    compound.ids.push(self.ident()?);
                }
                Some('.') => {
                    self.pos += 1;
                    compound.classes.push(self.ident()?);
                }
                Some('[') => {
                    self.pos += 1;
                    compound.attrs.push(self.attribute()?);
                }
                Some(':') => {
                    self.pos += 1;
                    match self.ident()?.to_ascii_lowercase().as_str() {
                        "root" => compound.root = true,
                        _ => return None,
                    }
                }
                _ => break,
            }
            any = true;
        }
        any.then_some(compound)
    }

    fn attribute(&mut self) -> Option<AttrSelector> {
        self.skip_ws();
        let name = self.ident()?.to_ascii_lowercase();
        self.skip_ws();
        if self.eat(']') {
            return Some(AttrSelector { name, op: None });
        }
        let op = match self.peek()? {
            '=' => AttrOp::Equals,
            '~' => AttrOp::Includes,
            '|' => AttrOp::DashMatch,
            '^' => AttrOp::Prefix,
            '$' => AttrOp::Suffix,
            '*' => AttrOp::Contains,
            _ => return None,
        };
        self.pos += 1;
        if op != AttrOp::Equals && !self.eat('=') {
            return None;
        }
        self.skip_ws();
        let value = match self.peek()? {
            '"' | '\'' => self.quoted()?,
            _ => self.ident()?,
        };
        self.skip_ws();
        self.eat(']').then_some(AttrSelector {
            name,
            op: Some((op, value)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (DomTree, NodeId, NodeId, NodeId) {
        let mut tree = DomTree::new();
        let html = tree.create_element("html");
        let body = tree.create_element("body");
        let img = tree.create_element("img");
        tree.append_child(tree.root(), html).unwrap();
        tree.append_child(html, body).unwrap();
        tree.append_child(body, img).unwrap();
        tree.element_mut(html).unwrap().set_attr("class", "eyebrowse-font-arial");
        tree.element_mut(img)
            .unwrap()
            .set_attr("style", "background-image: url(a.png)");
        (tree, html, body, img)
    }

    #[test]
    fn test_type_and_combinators() {
        let (tree, html, body, img) = sample();
        assert!(Selector::parse("html body img").unwrap().matches(&tree, img));
        assert!(Selector::parse("body > img").unwrap().matches(&tree, img));
        assert!(!Selector::parse("html > img").unwrap().matches(&tree, img));
        assert!(Selector::parse(":root").unwrap().matches(&tree, html));
        assert!(!Selector::parse(":root").unwrap().matches(&tree, body));
    }

    #[test]
    fn test_attribute_operators() {
        let (tree, html, _, img) = sample();
        let list = SelectorList::parse("video, [style*=\"background-image\"]").unwrap();
        assert!(list.matches(&tree, img));
        assert!(Selector::parse("[class^=eyebrowse-font]").unwrap().matches(&tree, html));
        assert!(Selector::parse("html[class~='eyebrowse-font-arial']").unwrap().matches(&tree, html));
        assert!(!Selector::parse("[class$=dyslexic]").unwrap().matches(&tree, html));
    }

    #[test]
    fn test_specificity() {
        let sel = Selector::parse("html.a #b > p[x]").unwrap();
        assert_eq!(sel.specificity(), Specificity(1, 2, 2));
    }

    #[test]
    fn test_unsupported_pseudo() {
        assert!(Selector::parse("p:hover").is_err());
        assert!(Selector::parse("p::before").is_err());
        let list = SelectorList::parse_lenient("p:hover, li");
        assert_eq!(list.len(), 1);
    }
}
