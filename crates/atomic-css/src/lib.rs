//! Atomic CSS - attribute-driven atomic style engine
//!
//! Parses compact style attributes such as `md|color.hover:red`, expands
//! mixins, ranks every declaration and reconciles elements against their
//! previous state while generating one `!important` rule per identifier
//! in rank order.

mod grammar;
mod handler;
mod host;
mod mixins;
mod properties;
mod rank;
mod resolve;
mod root;
mod settings;
mod tracker;

pub use grammar::{
    parse_item, parse_items, split_args, split_declarations, DeclarationToken, Item, MixinRef,
    MIXIN_MARKER,
};
pub use handler::{AppliedEntry, StyleHandler, StyleHost};
pub use mixins::{substitute_args, MixinFn, MixinOutput, MixinRegistry};
pub use properties::{
    alias, default_value, state_index, state_name, state_selector, transform_value, Alias,
    PropertyTable, Resolved, Target, STATES,
};
pub use rank::{
    base_rank, identifier, rank_key, rank_of_identifier, scope_rank, RankKey, MAX_MEDIA,
    MAX_PROPERTIES, SCOPE_STRIDE, STATE_COUNT, UNRENDERABLE,
};
pub use resolve::{substitute_references, Declaration, Resolver};
pub use root::{Registration, Root, ThemeSource, BUILTIN_SCOPES};
pub use settings::{Breakpoint, Media, Settings};
pub use tracker::{rule_identifier, split_rules, RuleSink, RuleTracker};

/// Style engine errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StyleError {
    /// Mixin expansion revisited a mixin already on the stack
    #[error("Mixin cycle: {path}")]
    MixinCycle { path: String },

    /// The stylesheet refused a generated rule
    #[error("Rule rejected ({reason}): {rule}")]
    Insert { rule: String, reason: String },
}
