//! DOM Node
//!
//! Nodes link to parent and siblings by [`NodeId`] instead of pointers.
//! `class` and `style` are reflected into structured fields so engines can
//! edit them without reparsing the attribute string.

use crate::{ClassList, NodeId, StyleDeclaration};

/// DOM Node - Core structure
#[derive(Debug, Clone)]
pub struct Node {
    /// Parent node (NONE if detached or root)
    pub parent: NodeId,
    /// First child
    pub first_child: NodeId,
    /// Last child (for O(1) append)
    pub last_child: NodeId,
    /// Previous sibling
    pub prev_sibling: NodeId,
    /// Next sibling
    pub next_sibling: NodeId,
    /// Node-specific data
    pub data: NodeData,
}

impl Node {
    fn with_data(data: NodeData) -> Self {
        Self {
            parent: NodeId::NONE,
            first_child: NodeId::NONE,
            last_child: NodeId::NONE,
            prev_sibling: NodeId::NONE,
            next_sibling: NodeId::NONE,
            data,
        }
    }

    /// Create a new element node
    pub fn element(tag: &str) -> Self {
        Self::with_data(NodeData::Element(ElementData::new(tag)))
    }

    /// Create a new text node
    pub fn text(content: &str) -> Self {
        Self::with_data(NodeData::Text(content.to_string()))
    }

    /// Create a comment node
    pub fn comment(content: &str) -> Self {
        Self::with_data(NodeData::Comment(content.to_string()))
    }

    /// Create a doctype node
    pub fn doctype(name: &str) -> Self {
        Self::with_data(NodeData::Doctype {
            name: name.to_string(),
        })
    }

    /// Create a document node
    pub fn document() -> Self {
        Self::with_data(NodeData::Document)
    }

    #[inline]
    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self.data, NodeData::Text(_))
    }

    #[inline]
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    #[inline]
    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(t) => Some(t),
            _ => None,
        }
    }
}

/// Node-specific data
#[derive(Debug, Clone)]
pub enum NodeData {
    /// Document root
    Document,
    /// DOCTYPE
    Doctype { name: String },
    /// Element
    Element(ElementData),
    /// Text content
    Text(String),
    /// Comment
    Comment(String),
}

/// Plain attribute (everything except `class` and `style`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// Element-specific data
#[derive(Debug, Clone)]
pub struct ElementData {
    /// Tag name as created; compare with [`ElementData::is`]
    tag: String,
    attrs: Vec<Attribute>,
    /// `class` attribute
    pub classes: ClassList,
    /// `style` attribute
    pub style: StyleDeclaration,
}

impl ElementData {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attrs: Vec::new(),
            classes: ClassList::new(),
            style: StyleDeclaration::new(),
        }
    }

    /// Tag name
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Case-insensitive tag comparison
    #[inline]
    pub fn is(&self, tag: &str) -> bool {
        self.tag.eq_ignore_ascii_case(tag)
    }

    /// Whether the tag is one of `tags`
    pub fn is_any(&self, tags: &[&str]) -> bool {
        tags.iter().any(|t| self.is(t))
    }

    /// `id` attribute
    pub fn id(&self) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name == "id")
            .map(|a| a.value.as_str())
    }

    /// Get an attribute value
    pub fn get_attr(&self, name: &str) -> Option<String> {
        let name = name.to_ascii_lowercase();
        match name.as_str() {
            "class" if !self.classes.is_empty() => Some(self.classes.value()),
            "style" if !self.style.is_empty() => Some(self.style.css_text()),
            "class" | "style" => None,
            _ => self
                .attrs
                .iter()
                .find(|a| a.name == name)
                .map(|a| a.value.clone()),
        }
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.get_attr(name).is_some()
    }

    /// Set an attribute
    pub fn set_attr(&mut self, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        match name.as_str() {
            "class" => self.classes.set_value(value),
            "style" => self.style.set_css_text(value),
            _ => match self.attrs.iter_mut().find(|a| a.name == name) {
                Some(attr) => attr.value = value.to_string(),
                None => self.attrs.push(Attribute {
                    name,
                    value: value.to_string(),
                }),
            },
        }
    }

    /// Remove an attribute, returning the old value
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let old = self.get_attr(name);
        let name = name.to_ascii_lowercase();
        match name.as_str() {
            "class" => self.classes = ClassList::new(),
            "style" => self.style = StyleDeclaration::new(),
            _ => self.attrs.retain(|a| a.name != name),
        }
        old
    }

    /// All attributes in serialization order
    pub fn attributes(&self) -> Vec<Attribute> {
        let mut all = self.attrs.clone();
        if !self.classes.is_empty() {
            all.push(Attribute {
                name: "class".into(),
                value: self.classes.value(),
            });
        }
        if !self.style.is_empty() {
            all.push(Attribute {
                name: "style".into(),
                value: self.style.css_text(),
            });
        }
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reflected_attributes() {
        let mut elem = ElementData::new("DIV");
        elem.set_attr("Class", "a b");
        elem.set_attr("style", "color: red");
        elem.set_attr("id", "main");

        assert!(elem.is("div"));
        assert_eq!(elem.id(), Some("main"));
        assert!(elem.classes.contains("b"));
        assert_eq!(elem.style.get("color"), Some("red"));
        assert_eq!(elem.get_attr("class").as_deref(), Some("a b"));
        assert_eq!(elem.attributes().len(), 3);
    }

    #[test]
    fn test_remove_attr_returns_old() {
        let mut elem = ElementData::new("img");
        elem.set_attr("data-original-size", "16");
        assert_eq!(elem.remove_attr("data-original-size").as_deref(), Some("16"));
        assert!(!elem.has_attr("data-original-size"));
        assert_eq!(elem.remove_attr("class"), None);
    }
}
