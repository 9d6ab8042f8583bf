//! Document - High-level document API
//!
//! Every structural, attribute and inline-style change made through this type
//! is reported to the registered mutation observers.

use crate::{
    DomError, DomResult, DomTree, MutationObserverInit, MutationObserverManager, MutationRecord,
    NodeId, ObserverId, SelectorList,
};

/// Visible area and scroll position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub scroll_x: f64,
    pub scroll_y: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 800.0,
            scroll_x: 0.0,
            scroll_y: 0.0,
        }
    }
}

/// HTML Document
#[derive(Debug)]
pub struct Document {
    tree: DomTree,
    url: String,
    observers: MutationObserverManager,
    viewport: Viewport,
    layout_flushes: u64,
}

impl Document {
    /// Create a document with `html`, `head` and `body`
    pub fn new(url: &str) -> Self {
        let mut tree = DomTree::new();
        let html = tree.create_element("html");
        let head = tree.create_element("head");
        let body = tree.create_element("body");
        // Freshly created nodes under the document node cannot violate hierarchy rules
        let _ = tree.append_child(NodeId::ROOT, html);
        let _ = tree.append_child(html, head);
        let _ = tree.append_child(html, body);
        Self::from_tree(url, tree)
    }

    /// Create a document with no structure
    pub fn empty(url: &str) -> Self {
        Self::from_tree(url, DomTree::new())
    }

    /// Wrap an already built tree
    pub fn from_tree(url: &str, tree: DomTree) -> Self {
        Self {
            tree,
            url: url.to_string(),
            observers: MutationObserverManager::new(),
            viewport: Viewport::default(),
            layout_flushes: 0,
        }
    }

    /// Document URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Read-only access to the tree
    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    /// `<html>` element
    pub fn document_element(&self) -> Option<NodeId> {
        self.tree
            .children(self.tree.root())
            .find(|(_, n)| n.as_element().is_some_and(|e| e.is("html")))
            .map(|(id, _)| id)
    }

    fn html_child(&self, tag: &str) -> Option<NodeId> {
        let html = self.document_element()?;
        self.tree
            .children(html)
            .find(|(_, n)| n.as_element().is_some_and(|e| e.is(tag)))
            .map(|(id, _)| id)
    }

    /// `<head>` element
    pub fn head(&self) -> Option<NodeId> {
        self.html_child("head")
    }

    /// `<body>` element
    pub fn body(&self) -> Option<NodeId> {
        self.html_child("body")
    }

    /// Document title
    pub fn title(&self) -> String {
        self.head()
            .and_then(|head| {
                self.tree
                    .children(head)
                    .find(|(_, n)| n.as_element().is_some_and(|e| e.is("title")))
            })
            .map(|(id, _)| self.tree.text_content(id).trim().to_string())
            .unwrap_or_default()
    }

    /// Get element by ID
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.tree
            .descendants(self.tree.root())
            .into_iter()
            .find(|&n| self.tree.element(n).and_then(|e| e.id()) == Some(id))
    }

    /// Whether the node is reachable from the document node
    pub fn is_connected(&self, node: NodeId) -> bool {
        self.tree.contains(self.tree.root(), node)
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    /// Elements matching `selector` in document order
    pub fn query_selector_all(&self, selector: &str) -> DomResult<Vec<NodeId>> {
        self.query_selector_all_in(self.tree.root(), selector)
    }

    /// Matching descendants of `scope` in document order
    pub fn query_selector_all_in(&self, scope: NodeId, selector: &str) -> DomResult<Vec<NodeId>> {
        let list = SelectorList::parse(selector)?;
        Ok(self
            .tree
            .descendants(scope)
            .into_iter()
            .filter(|&n| list.matches(&self.tree, n))
            .collect())
    }

    /// First element matching `selector`
    pub fn query_selector(&self, selector: &str) -> DomResult<Option<NodeId>> {
        let list = SelectorList::parse(selector)?;
        Ok(self
            .tree
            .descendants(self.tree.root())
            .into_iter()
            .find(|&n| list.matches(&self.tree, n)))
    }

    /// `Element.matches`
    pub fn matches(&self, node: NodeId, selector: &str) -> DomResult<bool> {
        Ok(SelectorList::parse(selector)?.matches(&self.tree, node))
    }

    // ---------------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------------

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.tree.create_element(tag)
    }

    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.tree.create_text(content)
    }

    /// Append `child` to `parent`, moving it if already attached
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` before `reference` (or at the end)
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> DomResult<NodeId> {
        let old_parent = self.tree.parent(child);
        self.tree.insert_before(parent, child, reference)?;
        if let Some(old) = old_parent {
            self.notify(MutationRecord::child_list(old, Vec::new(), vec![child]));
        }
        self.notify(MutationRecord::child_list(parent, vec![child], Vec::new()));
        Ok(child)
    }

    /// Detach a node from its parent. Returns false when it was not attached.
    pub fn remove(&mut self, node: NodeId) -> bool {
        match self.tree.detach(node) {
            Some(parent) => {
                self.notify(MutationRecord::child_list(parent, Vec::new(), vec![node]));
                true
            }
            None => false,
        }
    }

    /// Replace all children with a single text node
    pub fn set_text_content(&mut self, node: NodeId, text: &str) -> DomResult<()> {
        if self.tree.get(node).is_none() {
            return Err(DomError::NotFound(node));
        }
        let removed: Vec<NodeId> = self.tree.children(node).map(|(id, _)| id).collect();
        for &child in &removed {
            self.tree.detach(child);
        }
        let added = if text.is_empty() {
            Vec::new()
        } else {
            let text_node = self.tree.create_text(text);
            self.tree.append_child(node, text_node)?;
            vec![text_node]
        };
        if !removed.is_empty() || !added.is_empty() {
            self.notify(MutationRecord::child_list(node, added, removed));
        }
        Ok(())
    }

    /// Get an attribute value
    pub fn get_attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.tree.element(node)?.get_attr(name)
    }

    /// Set an attribute
    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> DomResult<()> {
        let elem = self
            .tree
            .element_mut(node)
            .ok_or(DomError::NotAnElement(node))?;
        let old = elem.get_attr(name);
        elem.set_attr(name, value);
        self.notify(MutationRecord::attribute(node, &name.to_ascii_lowercase(), old));
        Ok(())
    }

    /// Remove an attribute, returning the old value
    pub fn remove_attribute(&mut self, node: NodeId, name: &str) -> DomResult<Option<String>> {
        let elem = self
            .tree
            .element_mut(node)
            .ok_or(DomError::NotAnElement(node))?;
        let old = elem.remove_attr(name);
        if old.is_some() {
            self.notify(MutationRecord::attribute(
                node,
                &name.to_ascii_lowercase(),
                old.clone(),
            ));
        }
        Ok(old)
    }

    /// Inline style property value
    pub fn style_property(&self, node: NodeId, name: &str) -> Option<String> {
        self.tree
            .element(node)?
            .style
            .get(name)
            .map(str::to_string)
    }

    /// `element.style.setProperty(name, value, priority)`
    pub fn set_style_property(
        &mut self,
        node: NodeId,
        name: &str,
        value: &str,
        important: bool,
    ) -> DomResult<()> {
        let elem = self
            .tree
            .element_mut(node)
            .ok_or(DomError::NotAnElement(node))?;
        let old = elem.get_attr("style");
        elem.style.set_property(name, value, important);
        self.notify(MutationRecord::attribute(node, "style", old));
        Ok(())
    }

    /// `element.style.removeProperty(name)`
    pub fn remove_style_property(&mut self, node: NodeId, name: &str) -> DomResult<Option<String>> {
        let elem = self
            .tree
            .element_mut(node)
            .ok_or(DomError::NotAnElement(node))?;
        let old_attr = elem.get_attr("style");
        let removed = elem.style.remove_property(name);
        if removed.is_some() {
            self.notify(MutationRecord::attribute(node, "style", old_attr));
        }
        Ok(removed)
    }

    pub fn has_class(&self, node: NodeId, token: &str) -> bool {
        self.tree
            .element(node)
            .is_some_and(|e| e.classes.contains(token))
    }

    /// `classList.add`; returns whether the token was added
    pub fn add_class(&mut self, node: NodeId, token: &str) -> DomResult<bool> {
        let elem = self
            .tree
            .element_mut(node)
            .ok_or(DomError::NotAnElement(node))?;
        let old = elem.get_attr("class");
        let added = elem.classes.add(token);
        if added {
            self.notify(MutationRecord::attribute(node, "class", old));
        }
        Ok(added)
    }

    /// `classList.remove`; returns whether the token was present
    pub fn remove_class(&mut self, node: NodeId, token: &str) -> DomResult<bool> {
        let elem = self
            .tree
            .element_mut(node)
            .ok_or(DomError::NotAnElement(node))?;
        let old = elem.get_attr("class");
        let removed = elem.classes.remove(token);
        if removed {
            self.notify(MutationRecord::attribute(node, "class", old));
        }
        Ok(removed)
    }

    /// Remove every class token for which `pred` holds. Returns the count.
    pub fn remove_classes_where(
        &mut self,
        node: NodeId,
        mut pred: impl FnMut(&str) -> bool,
    ) -> DomResult<usize> {
        let elem = self
            .tree
            .element_mut(node)
            .ok_or(DomError::NotAnElement(node))?;
        let old = elem.get_attr("class");
        let dropped = elem.classes.retain(|t| !pred(t));
        if dropped > 0 {
            self.notify(MutationRecord::attribute(node, "class", old));
        }
        Ok(dropped)
    }

    fn notify(&mut self, record: MutationRecord) {
        self.observers.notify(&self.tree, &record);
    }

    // ---------------------------------------------------------------------
    // Observers
    // ---------------------------------------------------------------------

    /// Create an observer watching `target`
    pub fn observe(&mut self, target: NodeId, options: MutationObserverInit) -> ObserverId {
        let id = self.observers.create();
        self.observers.observe(id, target, options);
        id
    }

    /// Disconnect and forget an observer
    pub fn disconnect(&mut self, id: ObserverId) {
        self.observers.disconnect(id);
        self.observers.remove(id);
    }

    /// Drain records queued for an observer
    pub fn take_records(&mut self, id: ObserverId) -> Vec<MutationRecord> {
        self.observers.take_records(id)
    }

    pub fn has_pending_records(&self, id: ObserverId) -> bool {
        self.observers.has_pending(id)
    }

    /// Observers currently watching a target
    pub fn live_observer_count(&self) -> usize {
        self.observers.live_count()
    }

    // ---------------------------------------------------------------------
    // Viewport
    // ---------------------------------------------------------------------

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport_size(&mut self, width: f64, height: f64) {
        self.viewport.width = width;
        self.viewport.height = height;
    }

    /// `window.scrollTo`; negative offsets clamp to zero
    pub fn scroll_to(&mut self, x: f64, y: f64) {
        self.viewport.scroll_x = x.max(0.0);
        self.viewport.scroll_y = y.max(0.0);
    }

    /// Force a synchronous layout (reading `offsetHeight`)
    pub fn flush_layout(&mut self) {
        self.layout_flushes += 1;
    }

    /// Number of forced layouts so far
    pub fn layout_flushes(&self) -> u64 {
        self.layout_flushes
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new("about:blank")
    }
}
