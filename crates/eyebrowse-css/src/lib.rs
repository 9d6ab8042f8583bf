//! EyeBrowse CSS
//!
//! Stylesheet parsing on top of lightningcss and a small cascade that
//! computes the property values the reconciliation engine reads back
//! (the `getComputedStyle` subset: font metrics, visibility, custom
//! properties).

mod cascade;
mod parser;
mod values;

pub use cascade::StyleResolver;
pub use parser::CssParser;
pub use values::{format_px, parse_font_size, substitute_vars};

use eyebrowse_dom::Selector;

/// Parse a CSS stylesheet strictly
pub fn parse_stylesheet(css: &str) -> Result<Stylesheet, CssError> {
    CssParser::new().parse(css)
}

/// Validate `css` and return its minified form
pub fn minify(css: &str) -> Result<String, CssError> {
    CssParser::new().minify(css)
}

/// Parsed stylesheet
#[derive(Debug, Default)]
pub struct Stylesheet {
    pub rules: Vec<Rule>,
    pub font_faces: Vec<FontFace>,
}

impl Stylesheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of style rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Style rule with the selectors this engine can match
#[derive(Debug)]
pub struct Rule {
    pub selectors: Vec<Selector>,
    pub declarations: Vec<Declaration>,
}

/// CSS declaration (property: value)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub property: String,
    pub value: String,
    pub important: bool,
}

/// `@font-face` rule
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FontFace {
    pub family: String,
    pub sources: Vec<String>,
}

/// CSS errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum CssError {
    #[error("Parse error at line {line}: {message}")]
    Parse { line: u32, message: String },

    #[error("Failed to print stylesheet: {0}")]
    Print(String),
}
