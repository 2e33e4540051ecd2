//! Atomic Engine
//!
//! Runtime facade over the atomic style core: observes a document,
//! reconciles elements as their style attributes change and persists
//! generated rules between sessions.
//!
//! # Example
//! ```rust,ignore
//! use atomic_engine::{Engine, Settings};
//! use atomic_dom::{Document, StyleSheet};
//!
//! let mut doc = Document::new();
//! let mut engine = Engine::new(Settings::default(), Box::new(theme), StyleSheet::new());
//! engine.attach(&mut doc);
//! engine.observe(&mut doc, doc.document_element())?;
//! // ... mutate the document ...
//! engine.sync(&mut doc)?;
//! ```

mod cache;
mod observer;

use std::fmt;
use std::hash::Hash;

use tracing_subscriber::EnvFilter;

pub use cache::{Cache, CacheEntry, Store};
pub use observer::{effective_content, Mutation, Observer, LEGACY_PREFIX};

pub use atomic_css::{
    AppliedEntry, MixinOutput, Root, RuleSink, Settings, StyleError, StyleHandler, StyleHost,
    ThemeSource,
};

// Re-export sub-crates for advanced usage
pub use atomic_css as css;
pub use atomic_dom as dom;

use atomic_dom::{Document, NodeId, StyleSheet};

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine errors
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Style(#[from] StyleError),

    #[error("Cache error: {0}")]
    Cache(#[from] serde_json::Error),
}

/// Install a `tracing` subscriber filtered by `RUST_LOG` (default `info`).
///
/// Safe to call more than once.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Style engine: one handler, one rule sheet and the observed node state
pub struct Engine<N, S = StyleSheet> {
    handler: StyleHandler<S>,
    observer: Observer<N>,
}

impl<N: fmt::Debug, S: fmt::Debug> fmt::Debug for Engine<N, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("handler", &self.handler)
            .field("observer", &self.observer)
            .finish()
    }
}

impl<N, S> Engine<N, S>
where
    N: Copy + Eq + Hash + fmt::Debug,
    S: RuleSink,
{
    /// Create an engine reading scopes and registrations from `theme`
    pub fn new(settings: Settings, theme: Box<dyn ThemeSource>, sheet: S) -> Self {
        Self::with_root(settings, Root::load(theme), sheet)
    }

    pub fn with_root(settings: Settings, root: Root, sheet: S) -> Self {
        tracing::info!(
            "Atomic engine v{} starting ({} media, {} scopes)",
            VERSION,
            settings.media().len(),
            root.scopes().len()
        );
        Self {
            handler: StyleHandler::new(settings, root, sheet),
            observer: Observer::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        self.handler.settings()
    }

    pub fn handler(&self) -> &StyleHandler<S> {
        &self.handler
    }

    pub fn observer(&self) -> &Observer<N> {
        &self.observer
    }

    pub fn sheet(&self) -> &S {
        self.handler.sheet()
    }

    /// Register a mixin; the last registration for a name wins
    pub fn register_mixin<F, O>(&mut self, name: &str, callback: F)
    where
        F: Fn(&Settings, &[String]) -> O + Send + Sync + 'static,
        O: Into<MixinOutput>,
    {
        self.handler.register_mixin(name, callback);
    }

    /// Append a canonical property; false when the table is full
    pub fn register_property(&mut self, name: &str, variants: &[String]) -> bool {
        self.handler.register_property(name, variants)
    }

    fn cache(&self) -> Option<Cache> {
        let settings = self.handler.settings();
        let key = settings.cache_key.as_deref()?;
        Some(Cache::new(key, &settings.cache_version))
    }

    /// Restore cached rules, evicting a stale version first.
    ///
    /// Returns the number of rules re-inserted. A corrupt entry is
    /// dropped and logged.
    pub fn restore<T: Store + ?Sized>(&mut self, store: &mut T) -> usize {
        let Some(cache) = self.cache() else {
            return 0;
        };
        cache.activate(store);
        let entry = match cache.load(store) {
            Ok(Some(entry)) => entry,
            Ok(None) => return 0,
            Err(err) => {
                tracing::warn!("Discarding corrupt style cache {}: {}", cache.entry_key(), err);
                return 0;
            }
        };
        let rules = atomic_css::split_rules(&entry.content);
        let restored = self.handler.restore(&rules, &entry.tracker);
        tracing::info!(
            "Restored {} rules and {} identifiers from {}",
            restored,
            entry.tracker.len(),
            cache.entry_key()
        );
        restored
    }

    /// Write the current rules and identifiers to the store
    pub fn persist<T: Store + ?Sized>(&self, store: &mut T) -> Result<(), EngineError> {
        let Some(cache) = self.cache() else {
            return Ok(());
        };
        let tracker = self.handler.tracker();
        let entry = CacheEntry {
            content: tracker.content(),
            tracker: tracker.seen(),
        };
        cache.save(store, &entry)?;
        tracing::debug!("Persisted {} rules to {}", tracker.len(), cache.entry_key());
        Ok(())
    }

    /// Reconcile `root` and its subtree; returns the nodes reconciled
    pub fn observe<H>(&mut self, host: &mut H, root: N) -> Result<usize, EngineError>
    where
        H: StyleHost<Node = N>,
    {
        Ok(self.observer.observe(&mut self.handler, host, root)?)
    }

    /// Handle one batch of host mutations
    pub fn process<H, I>(&mut self, host: &mut H, mutations: I) -> Result<(), EngineError>
    where
        H: StyleHost<Node = N>,
        I: IntoIterator<Item = Mutation<N>>,
    {
        Ok(self.observer.process(&mut self.handler, host, mutations)?)
    }

    /// Stop tracking `node` and its subtree
    pub fn unobserve<H>(&mut self, host: &H, node: N)
    where
        H: StyleHost<Node = N>,
    {
        self.observer.unobserve(host, node);
    }
}

impl<S: RuleSink> Engine<NodeId, S> {
    /// Limit the document's attribute records to the watched attributes
    pub fn attach(&self, doc: &mut Document) {
        let settings = self.handler.settings();
        let queue = doc.mutations_mut();
        queue.set_attribute_filter([
            settings.style_attribute.clone(),
            settings.apply_attribute.clone(),
        ]);
        queue.set_attribute_prefix(settings.legacy_attributes.then_some(LEGACY_PREFIX));
    }

    /// Process every pending mutation record of the document
    pub fn sync(&mut self, doc: &mut Document) -> Result<(), EngineError> {
        let records = doc.take_records();
        if records.is_empty() {
            return Ok(());
        }
        let result = self.process(doc, records.into_iter().map(Mutation::from));
        // Drop the records for marker updates made while reconciling
        doc.take_records();
        result
    }
}
