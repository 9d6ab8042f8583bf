//! CSS Parser using lightningcss
//!
//! Converts lightningcss rules into our representation. Values are kept as
//! printed text; selectors are re-parsed by the DOM selector engine and the
//! ones it cannot match are dropped.

use eyebrowse_dom::SelectorList;
use lightningcss::declaration::DeclarationBlock;
use lightningcss::printer::PrinterOptions;
use lightningcss::rules::CssRule;
use lightningcss::stylesheet::{ParserOptions, StyleSheet};
use lightningcss::traits::ToCss;

use crate::{CssError, Declaration, FontFace, Rule, Stylesheet};

/// CSS Parser
#[derive(Debug, Default, Clone, Copy)]
pub struct CssParser {
    error_recovery: bool,
}

impl CssParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parser that drops invalid rules instead of failing (page stylesheets)
    pub fn lenient() -> Self {
        Self {
            error_recovery: true,
        }
    }

    fn options<'i>(&self) -> ParserOptions<'i> {
        ParserOptions {
            error_recovery: self.error_recovery,
            ..ParserOptions::default()
        }
    }

    /// Parse a CSS stylesheet
    pub fn parse(&self, css: &str) -> Result<Stylesheet, CssError> {
        let sheet = StyleSheet::parse(css, self.options()).map_err(|e| CssError::Parse {
            line: e.loc.as_ref().map(|l| l.line + 1).unwrap_or(0),
            message: e.kind.to_string(),
        })?;

        let mut result = Stylesheet::new();
        for rule in sheet.rules.0.iter() {
            self.convert_rule(rule, &mut result);
        }
        Ok(result)
    }

    /// Parse and print minified
    pub fn minify(&self, css: &str) -> Result<String, CssError> {
        let sheet = StyleSheet::parse(css, self.options()).map_err(|e| CssError::Parse {
            line: e.loc.as_ref().map(|l| l.line + 1).unwrap_or(0),
            message: e.kind.to_string(),
        })?;
        let printed = sheet
            .to_css(PrinterOptions {
                minify: true,
                ..PrinterOptions::default()
            })
            .map_err(|e| CssError::Print(e.to_string()))?;
        Ok(printed.code)
    }

    fn convert_rule(&self, rule: &CssRule, out: &mut Stylesheet) {
        match rule {
            CssRule::Style(style_rule) => {
                let text = match rule.to_css_string(PrinterOptions::default()) {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::debug!("Skipping unprintable rule: {}", e);
                        return;
                    }
                };
                let prelude = text.split('{').next().unwrap_or_default();
                let selectors: Vec<_> = SelectorList::parse_lenient(prelude)
                    .iter()
                    .cloned()
                    .collect();
                if selectors.is_empty() {
                    return;
                }
                out.rules.push(Rule {
                    selectors,
                    declarations: self.convert_declarations(&style_rule.declarations),
                });
            }
            CssRule::FontFace(face) => match face.to_css_string(PrinterOptions::default()) {
                Ok(text) => out.font_faces.push(font_face_from_text(&text)),
                Err(e) => tracing::debug!("Skipping @font-face: {}", e),
            },
            // Media queries, keyframes and the rest do not take part in the cascade here
            _ => {}
        }
    }

    fn convert_declarations(&self, block: &DeclarationBlock) -> Vec<Declaration> {
        let normal = block.declarations.iter().map(|d| (d, false));
        let important = block.important_declarations.iter().map(|d| (d, true));
        normal
            .chain(important)
            .filter_map(|(decl, important)| {
                let text = decl.to_css_string(false, PrinterOptions::default()).ok()?;
                let (property, value) = text.split_once(':')?;
                Some(Declaration {
                    property: property.trim().to_string(),
                    value: value.trim().to_string(),
                    important,
                })
            })
            .collect()
    }
}

fn font_face_from_text(text: &str) -> FontFace {
    let family = text
        .find("font-family:")
        .map(|i| &text[i + "font-family:".len()..])
        .and_then(|rest| rest.split([';', '}']).next())
        .map(|v| v.trim().trim_matches(['"', '\'']).to_string())
        .unwrap_or_default();

    let mut sources = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find("url(") {
        rest = &rest[start + 4..];
        let Some(end) = rest.find(')') else {
            break;
        };
        sources.push(rest[..end].trim().trim_matches(['"', '\'']).to_string());
        rest = &rest[end..];
    }
    FontFace { family, sources }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty() {
        let sheet = CssParser::new().parse("").unwrap();
        assert!(sheet.is_empty());
    }

    #[test]
    fn test_important_declarations_flagged() {
        let sheet = CssParser::new()
            .parse("html { filter: grayscale(100%) !important; color: red }")
            .unwrap();
        assert_eq!(sheet.len(), 1);
        let decls = &sheet.rules[0].declarations;
        let filter = decls.iter().find(|d| d.property == "filter").unwrap();
        assert!(filter.important);
        let color = decls.iter().find(|d| d.property == "color").unwrap();
        assert!(!color.important);
    }

    #[test]
    fn test_unsupported_selectors_dropped() {
        let sheet = CssParser::new()
            .parse("a:hover { color: blue } p, li::marker { color: red }")
            .unwrap();
        assert_eq!(sheet.len(), 1);
        assert_eq!(sheet.rules[0].selectors.len(), 1);
    }

    #[test]
    fn test_font_face_sources() {
        let css = "@font-face { font-family: 'OpenDyslexic'; src: url('https://cdn.example/a.woff') format('woff'); }";
        let sheet = CssParser::new().parse(css).unwrap();
        assert_eq!(sheet.font_faces.len(), 1);
        assert_eq!(sheet.font_faces[0].family, "OpenDyslexic");
        assert_eq!(sheet.font_faces[0].sources, vec!["https://cdn.example/a.woff"]);
    }

    #[test]
    fn test_minify_keeps_priority() {
        let out = CssParser::new()
            .minify("html {\n  filter: grayscale(100%) !important;\n}")
            .unwrap();
        assert!(out.starts_with("html{"), "{}", out);
        assert!(out.contains("!important"));
        assert!(!out.contains('\n'));
    }
}
