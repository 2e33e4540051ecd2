//! Inline Style Declarations
//!
//! The per-element `style` declaration block. Only the operations the
//! style engine needs: set, remove, read and serialize.

/// Inline style declaration block (ordered)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineStyle {
    declarations: Vec<(String, String)>,
}

impl InlineStyle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a property; replaces an existing value in place
    pub fn set_property(&mut self, name: &str, value: &str) {
        match self.declarations.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self.declarations.push((name.to_string(), value.to_string())),
        }
    }

    /// Remove a property, returning its previous value
    pub fn remove_property(&mut self, name: &str) -> Option<String> {
        let pos = self.declarations.iter().position(|(n, _)| n == name)?;
        Some(self.declarations.remove(pos).1)
    }

    /// Property value, if set
    pub fn get_property_value(&self, name: &str) -> Option<&str> {
        self.declarations
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.declarations.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}
