//! Rule Tracker
//!
//! Remembers which identifiers already have a backing rule and keeps the
//! ranks of inserted rules sorted in parallel with the stylesheet, so a
//! new rule always lands at its rank position.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::StyleError;

/// Destination of generated rules (a CSSOM rule list)
pub trait RuleSink {
    /// Insert `rule` at `index`
    fn insert_rule(&mut self, rule: &str, index: usize) -> Result<(), StyleError>;

    /// Rules currently in the sink
    fn rule_count(&self) -> usize;
}

/// Identifiers seen plus the rank-sorted rules inserted so far
#[derive(Debug, Clone, Default)]
pub struct RuleTracker {
    seen: HashSet<String>,
    ranks: Vec<i64>,
    rules: Vec<String>,
}

impl RuleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_seen(&self, identifier: &str) -> bool {
        self.seen.contains(identifier)
    }

    /// Mark an identifier; returns true the first time
    pub fn mark_seen(&mut self, identifier: &str) -> bool {
        if self.seen.contains(identifier) {
            return false;
        }
        self.seen.insert(identifier.to_string())
    }

    /// Index a rule of `rank` would be inserted at (after equal ranks)
    pub fn position(&self, rank: i64) -> usize {
        self.ranks.partition_point(|r| *r <= rank)
    }

    /// Insert a rule into `sink` at its rank position.
    ///
    /// On rejection the bookkeeping is rolled back; the identifier stays
    /// seen so the rule is not retried.
    pub fn insert<S: RuleSink + ?Sized>(
        &mut self,
        sink: &mut S,
        rule: &str,
        rank: i64,
    ) -> Result<usize, StyleError> {
        if sink.rule_count() != self.ranks.len() {
            tracing::warn!(
                "Stylesheet holds {} rules but {} were generated; rule order may drift",
                sink.rule_count(),
                self.ranks.len()
            );
        }
        let index = self.position(rank);
        self.ranks.insert(index, rank);
        self.rules.insert(index, rule.to_string());
        if let Err(err) = sink.insert_rule(rule, index) {
            self.ranks.remove(index);
            self.rules.remove(index);
            return Err(err);
        }
        tracing::debug!("Inserted rule at {}: {}", index, rule);
        Ok(index)
    }

    /// Seen identifiers, sorted
    pub fn seen(&self) -> Vec<String> {
        let mut seen: Vec<String> = self.seen.iter().cloned().collect();
        seen.sort();
        seen
    }

    pub fn ranks(&self) -> &[i64] {
        &self.ranks
    }

    /// Inserted rules in stylesheet order
    pub fn rules(&self) -> &[String] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Inserted rules, one per line
    pub fn content(&self) -> String {
        self.rules.join("\n")
    }
}

fn rule_var() -> &'static Regex {
    static RULE_VAR: OnceLock<Regex> = OnceLock::new();
    RULE_VAR.get_or_init(|| {
        Regex::new(r"var\(--([0-9a-f]+(?:-[A-Za-z0-9-]+)?)\) !important")
            .unwrap_or_else(|err| panic!("invalid rule regex: {err}"))
    })
}

/// Identifier a generated rule binds its property to
pub fn rule_identifier(rule: &str) -> Option<&str> {
    rule_var()
        .captures(rule)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Split stylesheet text into top-level rules
pub fn split_rules(content: &str) -> Vec<String> {
    let mut rules = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in content.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    let rule = content[start..=i].trim();
                    if !rule.is_empty() {
                        rules.push(rule.to_string());
                    }
                    start = i + 1;
                }
            }
            _ => {}
        }
    }
    rules
}
