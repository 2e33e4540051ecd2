//! Mixin/Macro Expander
//!
//! `^name:args` references expand into declaration strings which are
//! parsed again, so mixins may reference other mixins. Expansion runs on
//! an explicit stack of frames; a name that is already on the stack is a
//! cycle and aborts the whole expansion.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use regex::{Captures, Regex};

use crate::grammar::{parse_items, DeclarationToken, Item, MixinRef};
use crate::root::Root;
use crate::settings::Settings;
use crate::StyleError;

/// What a mixin callback returns
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MixinOutput {
    /// A declaration string
    Text(String),
    /// Property/value pairs, joined as `property:value`
    Map(Vec<(String, String)>),
}

impl MixinOutput {
    /// Flatten into a declaration string
    pub fn into_content(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Map(pairs) => pairs
                .into_iter()
                .map(|(property, value)| format!("{property}:{value}"))
                .collect::<Vec<_>>()
                .join(";"),
        }
    }
}

impl From<String> for MixinOutput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for MixinOutput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Vec<(String, String)>> for MixinOutput {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self::Map(pairs)
    }
}

/// Mixin callback: settings and positional arguments
pub type MixinFn = Arc<dyn Fn(&Settings, &[String]) -> MixinOutput + Send + Sync>;

/// Named mixins; the last registration for a name wins
#[derive(Clone)]
pub struct MixinRegistry {
    mixins: HashMap<String, MixinFn>,
}

impl fmt::Debug for MixinRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.mixins.keys().collect();
        names.sort();
        f.debug_struct("MixinRegistry").field("mixins", &names).finish()
    }
}

impl Default for MixinRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

fn arg<'a>(args: &'a [String], index: usize, default: &'a str) -> &'a str {
    args.get(index)
        .map(String::as_str)
        .filter(|a| !a.is_empty())
        .unwrap_or(default)
}

fn space(_: &Settings, args: &[String]) -> MixinOutput {
    let size = arg(args, 0, "4");
    match arg(args, 1, "y") {
        "x" => format!("sibling!ml:{size}").into(),
        _ => format!("sibling!mt:{size}").into(),
    }
}

fn stack(_: &Settings, args: &[String]) -> MixinOutput {
    let mut out = format!("flex;flex-direction:column;gap:{}", arg(args, 0, "4"));
    if let Some(align) = args.get(1).filter(|a| !a.is_empty()) {
        out.push_str(&format!(";align-items:{align}"));
    }
    out.into()
}

fn row(_: &Settings, args: &[String]) -> MixinOutput {
    format!(
        "flex;flex-direction:row;align-items:{};gap:{}",
        arg(args, 1, "center"),
        arg(args, 0, "4")
    )
    .into()
}

fn grid(_: &Settings, args: &[String]) -> MixinOutput {
    format!("grid;cols:{};gap:{}", arg(args, 0, "1"), arg(args, 1, "4")).into()
}

fn sr_only(_: &Settings, _: &[String]) -> MixinOutput {
    "position:absolute;width:1px;height:1px;padding:0;margin:-1px;overflow:hidden;\
     clip:rect(0, 0, 0, 0);white-space:nowrap;border-width:0"
        .into()
}

fn container(settings: &Settings, _: &[String]) -> MixinOutput {
    let breakpoints: Vec<_> = settings
        .media()
        .into_iter()
        .skip(1)
        .filter_map(|m| {
            let width = settings.breakpoints.iter().find(|b| b.name == m.name)?.width;
            Some((m.name, width))
        })
        .collect();

    let mut out = vec!["w:100%".to_string(), "mx:auto".to_string()];
    if settings.desktop_first {
        // Widest first; below each breakpoint cap at the next one down
        if let Some((_, widest)) = breakpoints.first() {
            out.push(format!("max-width:{widest}px"));
        }
        for (i, (name, _)) in breakpoints.iter().enumerate() {
            match breakpoints.get(i + 1) {
                Some((_, next)) => out.push(format!("{name}|max-width:{next}px")),
                None => out.push(format!("{name}|max-width:100%")),
            }
        }
    } else {
        for (name, width) in &breakpoints {
            out.push(format!("{name}|max-width:{width}px"));
        }
    }
    out.join(";").into()
}

fn center(_: &Settings, _: &[String]) -> MixinOutput {
    "flex;align-items:center;justify-content:center".into()
}

fn truncate(_: &Settings, _: &[String]) -> MixinOutput {
    "overflow:hidden;text-overflow:ellipsis;white-space:nowrap".into()
}

fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\$\{(\d+)(?:=([^}]*))?\}")
            .unwrap_or_else(|err| panic!("invalid placeholder regex: {err}"))
    })
}

/// Substitute `${n}` and `${n=default}` with positional arguments
pub fn substitute_args(template: &str, args: &[String]) -> String {
    placeholder()
        .replace_all(template, |caps: &Captures<'_>| {
            let supplied = caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|i| args.get(i))
                .filter(|a| !a.is_empty());
            match supplied {
                Some(value) => value.clone(),
                None => caps.get(2).map_or("", |m| m.as_str()).to_string(),
            }
        })
        .into_owned()
}

/// A mixin whose expansion is in progress
struct Frame {
    name: Option<String>,
    items: std::vec::IntoIter<Item>,
}

impl MixinRegistry {
    /// Registry without any mixins
    pub fn empty() -> Self {
        Self {
            mixins: HashMap::new(),
        }
    }

    /// Registry with the built-in layout and visibility mixins
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register("space", space);
        registry.register("stack", stack);
        registry.register("row", row);
        registry.register("grid", grid);
        registry.register("sr-only", sr_only);
        registry.register("container", container);
        registry.register("center", center);
        registry.register("truncate", truncate);
        registry
    }

    /// Register a mixin, replacing any previous one with the same name
    pub fn register<F, O>(&mut self, name: &str, callback: F)
    where
        F: Fn(&Settings, &[String]) -> O + Send + Sync + 'static,
        O: Into<MixinOutput>,
    {
        self.mixins.insert(
            name.to_string(),
            Arc::new(move |settings: &Settings, args: &[String]| -> MixinOutput {
                callback(settings, args).into()
            }),
        );
    }

    pub fn contains(&self, name: &str) -> bool {
        self.mixins.contains_key(name)
    }

    /// Expansion text of one reference.
    ///
    /// Registered callbacks win; otherwise the root `--<name>--mixin`
    /// template is used. Unknown mixins expand to nothing.
    pub fn expand_one(&self, mixin: &MixinRef, settings: &Settings, root: &Root) -> String {
        if let Some(callback) = self.mixins.get(&mixin.name) {
            return callback(settings, &mixin.args).into_content();
        }
        root.mixin_template(&mixin.name)
            .map(|template| substitute_args(&template, &mixin.args))
            .unwrap_or_default()
    }

    /// Flatten items into declaration tokens, expanding mixins recursively
    pub fn expand(
        &self,
        items: Vec<Item>,
        settings: &Settings,
        root: &Root,
    ) -> Result<Vec<DeclarationToken>, StyleError> {
        let mut out = Vec::new();
        let mut stack = vec![Frame {
            name: None,
            items: items.into_iter(),
        }];

        while let Some(frame) = stack.last_mut() {
            let Some(item) = frame.items.next() else {
                stack.pop();
                continue;
            };
            match item {
                Item::Declaration(token) => out.push(token),
                Item::Mixin(mixin) => {
                    let active = stack.iter().filter_map(|f| f.name.as_deref());
                    if active.clone().any(|name| name == mixin.name) {
                        let path: Vec<&str> =
                            active.chain(std::iter::once(mixin.name.as_str())).collect();
                        return Err(StyleError::MixinCycle {
                            path: path.join("->"),
                        });
                    }
                    let content = self.expand_one(&mixin, settings, root);
                    stack.push(Frame {
                        name: Some(mixin.name),
                        items: parse_items(&content).into_iter(),
                    });
                }
            }
        }
        Ok(out)
    }
}
