//! Inline style declarations (CSSStyleDeclaration)
//!
//! Backs the `style` attribute. Declarations keep insertion order so the
//! serialized attribute is stable across reads and writes.

/// One `name: value` pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleProperty {
    pub name: String,
    pub value: String,
    pub important: bool,
}

/// Ordered list of inline declarations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleDeclaration {
    properties: Vec<StyleProperty>,
}

impl StyleDeclaration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `style` attribute value
    pub fn parse(css_text: &str) -> Self {
        let mut decl = Self::new();
        decl.set_css_text(css_text);
        decl
    }

    /// Replace all declarations from CSS text
    pub fn set_css_text(&mut self, css_text: &str) {
        self.properties.clear();
        for chunk in split_top_level(css_text, ';') {
            let Some((name, value)) = chunk.split_once(':') else {
                continue;
            };
            let name = normalize_name(name.trim());
            let mut value = value.trim();
            let mut important = false;
            if let Some(stripped) = strip_important(value) {
                value = stripped;
                important = true;
            }
            if name.is_empty() || value.is_empty() {
                continue;
            }
            self.set_property(&name, value, important);
        }
    }

    /// Serialize back to attribute form
    pub fn css_text(&self) -> String {
        let mut out = String::new();
        for prop in &self.properties {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(&prop.name);
            out.push_str(": ");
            out.push_str(&prop.value);
            if prop.important {
                out.push_str(" !important");
            }
            out.push(';');
        }
        out
    }

    /// Get a property value
    pub fn get(&self, name: &str) -> Option<&str> {
        let name = normalize_name(name);
        self.properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }

    /// Whether a property was declared `!important`
    pub fn is_important(&self, name: &str) -> bool {
        let name = normalize_name(name);
        self.properties.iter().any(|p| p.name == name && p.important)
    }

    /// Set a property. An empty value removes it, as `style.setProperty` does.
    pub fn set_property(&mut self, name: &str, value: &str, important: bool) {
        let name = normalize_name(name);
        let value = value.trim();
        if value.is_empty() {
            self.remove_property(&name);
            return;
        }
        match self.properties.iter_mut().find(|p| p.name == name) {
            Some(existing) => {
                existing.value = value.to_string();
                existing.important = important;
            }
            None => self.properties.push(StyleProperty {
                name,
                value: value.to_string(),
                important,
            }),
        }
    }

    /// Remove a property, returning the old value
    pub fn remove_property(&mut self, name: &str) -> Option<String> {
        let name = normalize_name(name);
        let pos = self.properties.iter().position(|p| p.name == name)?;
        Some(self.properties.remove(pos).value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StyleProperty> {
        self.properties.iter()
    }
}

/// Custom properties are case-sensitive, everything else is not
fn normalize_name(name: &str) -> String {
    if name.starts_with("--") {
        name.to_string()
    } else {
        name.to_ascii_lowercase()
    }
}

fn strip_important(value: &str) -> Option<&str> {
    let lower = value.to_ascii_lowercase();
    let idx = lower.rfind("!important")?;
    if lower[idx + "!important".len()..].trim().is_empty() {
        Some(value[..idx].trim_end())
    } else {
        None
    }
}

/// Split on `sep` outside of parentheses and quotes
pub(crate) fn split_top_level(input: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in input.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '"' | '\'' => quote = Some(c),
                '(' | '[' => depth += 1,
                ')' | ']' => depth = depth.saturating_sub(1),
                c if c == sep && depth == 0 => {
                    parts.push(&input[start..i]);
                    start = i + c.len_utf8();
                }
                _ => {}
            },
        }
    }
    parts.push(&input[start..]);
    parts
}
