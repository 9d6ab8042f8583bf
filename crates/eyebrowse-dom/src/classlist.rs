//! ClassList (DOMTokenList for the `class` attribute)

/// Ordered set of class tokens
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassList {
    tokens: Vec<String>,
}

impl ClassList {
    /// Create empty token list
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from space-separated string
    pub fn from_string(s: &str) -> Self {
        let mut list = Self::new();
        for token in s.split_whitespace() {
            list.add(token);
        }
        list
    }

    /// Number of tokens
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Check if token exists
    pub fn contains(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t == token)
    }

    /// Add a token, returns true if it was not present
    pub fn add(&mut self, token: &str) -> bool {
        if token.is_empty() || self.contains(token) {
            return false;
        }
        self.tokens.push(token.to_string());
        true
    }

    /// Remove a token, returns true if it was present
    pub fn remove(&mut self, token: &str) -> bool {
        let before = self.tokens.len();
        self.tokens.retain(|t| t != token);
        before != self.tokens.len()
    }

    /// Toggle token, returns new state
    pub fn toggle(&mut self, token: &str, force: Option<bool>) -> bool {
        match force {
            Some(true) => {
                self.add(token);
                true
            }
            Some(false) => {
                self.remove(token);
                false
            }
            None => {
                if self.remove(token) {
                    false
                } else {
                    self.add(token);
                    true
                }
            }
        }
    }

    /// Replace token in place
    pub fn replace(&mut self, old_token: &str, new_token: &str) -> bool {
        match self.tokens.iter().position(|t| t == old_token) {
            Some(pos) => {
                if self.contains(new_token) {
                    self.tokens.remove(pos);
                } else {
                    self.tokens[pos] = new_token.to_string();
                }
                true
            }
            None => false,
        }
    }

    /// Keep only tokens matching the predicate, returns how many were dropped
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) -> usize {
        let before = self.tokens.len();
        self.tokens.retain(|t| keep(t));
        before - self.tokens.len()
    }

    /// Attribute value
    pub fn value(&self) -> String {
        self.tokens.join(" ")
    }

    /// Set from attribute value
    pub fn set_value(&mut self, value: &str) {
        *self = Self::from_string(value);
    }

    /// Iterate over tokens
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(|s| s.as_str())
    }
}

impl std::fmt::Display for ClassList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classlist_dedupes() {
        let list = ClassList::from_string("a  b a\tc");
        assert_eq!(list.value(), "a b c");
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn test_classlist_toggle() {
        let mut list = ClassList::new();
        assert!(list.toggle("x", None));
        assert!(!list.toggle("x", None));
        assert!(list.toggle("x", Some(true)));
        assert!(list.toggle("x", Some(true)));
        assert_eq!(list.len(), 1);
        assert!(!list.toggle("x", Some(false)));
        assert!(list.is_empty());
    }

    #[test]
    fn test_classlist_replace_and_retain() {
        let mut list = ClassList::from_string("eyebrowse-a page eyebrowse-b");
        assert!(list.replace("page", "site"));
        assert_eq!(list.retain(|t| !t.starts_with("eyebrowse-")), 2);
        assert_eq!(list.value(), "site");
    }
}
