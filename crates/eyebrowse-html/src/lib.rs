//! EyeBrowse HTML
//!
//! Loads pages into an [`eyebrowse_dom::Document`] with html5ever and writes
//! them back out as markup.

mod parser;
mod serializer;

pub use parser::HtmlParser;
pub use serializer::{serialize, serialize_node};

use eyebrowse_dom::Document;

/// Parse an HTML string into a document at `url`
pub fn parse_document(html: &str, url: &str) -> Result<Document, HtmlError> {
    HtmlParser::new().parse_with_url(html, url)
}

/// HTML loading errors
#[derive(Debug, thiserror::Error)]
pub enum HtmlError {
    #[error("Failed to read HTML input: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed tree: {0}")]
    Tree(#[from] eyebrowse_dom::DomError),
}
