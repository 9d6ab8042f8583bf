//! Markup serializer

use eyebrowse_dom::{Document, DomTree, NodeData, NodeId};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Serialize the whole document
pub fn serialize(doc: &Document) -> String {
    let tree = doc.tree();
    let mut out = String::new();
    for (child, _) in tree.children(tree.root()) {
        write_node(tree, child, false, &mut out);
    }
    out
}

/// Serialize one node and its subtree (`outerHTML`)
pub fn serialize_node(doc: &Document, node: NodeId) -> String {
    let tree = doc.tree();
    let raw = tree
        .parent(node)
        .and_then(|p| tree.element(p))
        .is_some_and(|e| e.is_any(RAW_TEXT_ELEMENTS));
    let mut out = String::new();
    write_node(tree, node, raw, &mut out);
    out
}

fn write_node(tree: &DomTree, id: NodeId, raw_text: bool, out: &mut String) {
    let Some(node) = tree.get(id) else {
        return;
    };
    match &node.data {
        NodeData::Document => {
            for (child, _) in tree.children(id) {
                write_node(tree, child, false, out);
            }
        }
        NodeData::Doctype { name } => {
            out.push_str("<!DOCTYPE ");
            out.push_str(name);
            out.push('>');
        }
        NodeData::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        NodeData::Text(text) if raw_text => out.push_str(text),
        NodeData::Text(text) => escape_into(text, false, out),
        NodeData::Element(elem) => {
            out.push('<');
            out.push_str(elem.tag());
            for attr in elem.attributes() {
                out.push(' ');
                out.push_str(&attr.name);
                out.push_str("=\"");
                escape_into(&attr.value, true, out);
                out.push('"');
            }
            out.push('>');
            if elem.is_any(VOID_ELEMENTS) {
                return;
            }
            let raw = elem.is_any(RAW_TEXT_ELEMENTS);
            for (child, _) in tree.children(id) {
                write_node(tree, child, raw, out);
            }
            out.push_str("</");
            out.push_str(elem.tag());
            out.push('>');
        }
    }
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '"' if attribute => out.push_str("&quot;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}
