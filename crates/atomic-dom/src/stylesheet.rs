//! Style Sheet
//!
//! A CSSOM-like ordered rule list. `insert_rule` performs the cheap
//! structural checks a browser would reject on and can be told to refuse
//! selectors containing given fragments, which stands in for runtimes
//! that do not support a pseudo-class or pseudo-element.

use crate::{DomError, DomResult};

/// Ordered list of CSS rule texts
#[derive(Debug, Clone, Default)]
pub struct StyleSheet {
    rules: Vec<String>,
    unsupported: Vec<String>,
}

impl StyleSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse any rule containing `fragment`
    pub fn reject(&mut self, fragment: &str) {
        self.unsupported.push(fragment.to_string());
    }

    /// Insert a rule at `index`, returning the index
    pub fn insert_rule(&mut self, rule: &str, index: usize) -> DomResult<usize> {
        if index > self.rules.len() {
            return Err(DomError::IndexSize {
                index,
                length: self.rules.len(),
            });
        }
        validate(rule)?;
        if let Some(fragment) = self.unsupported.iter().find(|f| rule.contains(f.as_str())) {
            tracing::debug!("Refusing rule containing {}", fragment);
            return Err(DomError::Syntax(format!("unsupported: {fragment}")));
        }
        self.rules.insert(index, rule.trim().to_string());
        Ok(index)
    }

    pub fn rules(&self) -> &[String] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn validate(rule: &str) -> DomResult<()> {
    let rule = rule.trim();
    if rule.is_empty() || rule.starts_with('{') || !rule.ends_with('}') {
        return Err(DomError::Syntax(rule.to_string()));
    }
    let mut depth: i32 = 0;
    let mut blocks = 0;
    for c in rule.chars() {
        match c {
            '{' => {
                depth += 1;
                blocks += 1;
            }
            '}' => {
                depth -= 1;
                if depth < 0 {
                    return Err(DomError::Syntax(rule.to_string()));
                }
            }
            _ => {}
        }
    }
    if depth != 0 || blocks == 0 {
        return Err(DomError::Syntax(rule.to_string()));
    }
    Ok(())
}
