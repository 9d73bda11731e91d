#![forbid(unsafe_code)]
//! `andon` compiles a declarative dashboard document into an initial widget
//! tree plus a set of reactive bindings, with a memoized, user-scoped data
//! cache in between.
//!
//! The document describes a grid layout, a flat namespace of components
//! (filters, charts, tables, stores, widgets) and a subscription map wiring
//! trigger components to dependents. Sealing a [`Blueprint`] validates the
//! document, eagerly loads and renders every component that is not a
//! subscription target, and registers one [`Binding`] per dependent. The
//! hosting reactive runtime watches each binding's trigger fields and calls
//! [`Binding::invoke`] (or [`Dashboard::refresh`]) whenever a value changes;
//! the result is written into the dependent's input field.
//!
//! External collaborators stay behind traits: [`TaskExecutor`] produces the
//! data, [`CacheStore`] memoizes it, [`SessionProvider`] scopes it to a user
//! and [`Renderer`] turns it into widgets.
//!
//! ```no_run
//! use andon::{Dashboard, Params, TaskExecutor, TaskOutput, TaskResult};
//! use serde_json::json;
//!
//! struct Exec;
//!
//! impl TaskExecutor for Exec {
//!     fn execute(&self, task: &str, params: &Params) -> TaskResult<TaskOutput> {
//!         Ok(json!([]).into())
//!     }
//! }
//!
//! let dashboard = Dashboard::design("sales")
//!     .document_value(json!({
//!         "displayName": "Sales overview",
//!         "components": {
//!             "region": { "type": "filter", "subType": "selector", "task": "load_regions" },
//!             "sales": { "type": "chart", "subType": "bar", "task": "load_sales" },
//!         },
//!         "layout": [
//!             { "columns": [
//!                 { "width": "half", "type": "component", "component": "region" },
//!                 { "width": "half", "type": "component", "component": "sales" },
//!             ]},
//!         ],
//!         "subscribes": {
//!             "sales": [{ "key": "region", "as": "region_value" }],
//!         },
//!     }))?
//!     .executor(Exec)
//!     .finish()?;
//!
//! let layout = dashboard.layout();
//! for binding in dashboard.bindings() {
//!     // register binding.triggers / binding.field with the host runtime
//! }
//! # Ok::<(), andon::DashboardError>(())
//! ```

mod cache;
mod document;
mod error;
mod graph;
mod layout;
mod loader;
mod registry;
mod render;
mod session;
mod table;
mod widget;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use serde_json::Value;

pub use crate::cache::{CacheStore, DEFAULT_CACHE_TTL, MemoryCache};
pub use crate::document::{
    Column, ColumnKind, ComponentKind, ComponentSpec, Document, Row, SubscriptionInput,
};
pub use crate::error::{ConfigError, DashboardError, TaskResult};
pub use crate::graph::{Binding, Field, Trigger};
pub use crate::loader::{Params, TaskExecutor, TaskOutput};
pub use crate::registry::{Registry, Renderer};
pub use crate::session::{Identity, SessionProvider};
pub use crate::table::DataTable;
pub use crate::widget::Widget;

use crate::graph::GraphBuilder;
use crate::layout::LayoutCompiler;
use crate::loader::DataLoader;
use crate::registry::Converters;

/// A fully constructed dashboard: the compiled widget tree and the reactive
/// bindings derived from the subscription map. Immutable after construction.
pub struct Dashboard {
    name: String,
    doc: Document,
    layout: Widget,
    bindings: Vec<Binding>,
}

impl Dashboard {
    /// Start designing a dashboard. The name becomes the element-id prefix
    /// and the cache-key prefix, so it should be stable across restarts.
    pub fn design(name: impl Into<String>) -> Blueprint {
        Blueprint::new(name.into())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn display_name(&self) -> &str {
        &self.doc.display_name
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// The compiled initial widget tree.
    pub fn layout(&self) -> &Widget {
        &self.layout
    }

    /// The registered reactive bindings, one per subscription dependent.
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn binding(&self, target: &str) -> Option<&Binding> {
        self.bindings
            .iter()
            .find(|binding| binding.target == target)
    }

    /// Invoke the binding registered for `target` with its triggers' current
    /// values, in declared order. This is what the hosting reactive runtime
    /// calls when any trigger field changes.
    pub fn refresh(&self, target: &str, inputs: &[Value]) -> TaskResult<Value> {
        let binding = self
            .binding(target)
            .ok_or_else(|| anyhow!("no binding registered for component '{target}'"))?;
        binding.invoke(inputs)
    }
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("name", &self.name)
            .field("bindings", &self.bindings)
            .finish_non_exhaustive()
    }
}

/// Builder for a [`Dashboard`]. Collects the document and the collaborators,
/// then [`finish`](Self::finish) validates and compiles everything.
pub struct Blueprint {
    name: String,
    document: Option<Document>,
    executor: Option<Arc<dyn TaskExecutor>>,
    session: Option<Arc<dyn SessionProvider>>,
    cache: Arc<dyn CacheStore>,
    ttl: Duration,
    registry: Registry,
    converters: Converters,
}

impl Blueprint {
    fn new(name: String) -> Self {
        Self {
            name,
            document: None,
            executor: None,
            session: None,
            cache: Arc::new(MemoryCache::new()),
            ttl: DEFAULT_CACHE_TTL,
            registry: Registry::with_builtins(),
            converters: Converters::default(),
        }
    }

    /// Use an already parsed document.
    pub fn document(mut self, document: Document) -> Self {
        self.document = Some(document);
        self
    }

    /// Parse the document from a JSON value. Hosts using another
    /// serialization parse it into a `serde_json::Value` first.
    pub fn document_value(mut self, value: Value) -> Result<Self, DashboardError> {
        self.document = Some(serde_json::from_value(value)?);
        Ok(self)
    }

    /// The external task-execution engine producing component data.
    pub fn executor(mut self, executor: impl TaskExecutor + 'static) -> Self {
        self.executor = Some(Arc::new(executor));
        self
    }

    /// The session/identity provider. Enables user-scoped cache keys and the
    /// hidden session markers in the compiled layout.
    pub fn session(mut self, provider: impl SessionProvider + 'static) -> Self {
        self.session = Some(Arc::new(provider));
        self
    }

    /// Replace the default in-memory cache store.
    pub fn cache(mut self, store: impl CacheStore + 'static) -> Self {
        self.cache = Arc::new(store);
        self
    }

    /// Override the memoization TTL (default 10 seconds).
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Register a rendering adapter for an extension subtype.
    pub fn add_renderer(
        mut self,
        kind: ComponentKind,
        subtype: impl AsRef<str>,
        renderer: impl Renderer + 'static,
    ) -> Self {
        self.registry
            .register(kind, Some(subtype.as_ref()), Arc::new(renderer));
        self
    }

    /// Register a named record post-processor referenced by `convert` fields.
    pub fn add_converter(
        mut self,
        name: impl Into<String>,
        convert: impl Fn(Value) -> TaskResult<Value> + Send + Sync + 'static,
    ) -> Self {
        self.converters.insert(name, convert);
        self
    }

    /// Validate the document and compile the dashboard. All configuration
    /// errors surface here; a returned [`Dashboard`] is internally
    /// consistent.
    pub fn finish(self) -> Result<Dashboard, DashboardError> {
        let doc = self.document.ok_or(ConfigError::MissingDocument)?;
        doc.validate()?;

        if self.executor.is_none() {
            if let Some((key, _)) = doc
                .components
                .iter()
                .find(|(_, spec)| spec.task.is_some())
            {
                return Err(ConfigError::MissingExecutor(key.clone()).into());
            }
        }

        // Resolve every renderable component's adapter and every declared
        // converter up front, so reactive callbacks cannot hit a
        // configuration error later.
        let renderers = doc
            .components
            .iter()
            .filter(|(_, spec)| spec.kind != ComponentKind::Store)
            .map(|(key, spec)| Ok((key.clone(), self.registry.resolve(key, spec)?)))
            .collect::<Result<HashMap<_, _>, ConfigError>>()?;

        for spec in doc.components.values() {
            if let Some(name) = &spec.convert {
                self.converters.resolve(name)?;
            }
        }

        let loader = Arc::new(DataLoader::new(self.executor.clone()));

        // Components referenced from the layout render eagerly unless they
        // are subscription targets; their data loads up front, in parallel.
        let mut seen = HashSet::new();
        let eager_keys: Vec<&str> = doc
            .layout_component_keys()
            .into_iter()
            .filter(|key| {
                doc.components.contains_key(*key)
                    && !doc.subscribes.contains_key(*key)
                    && seen.insert(*key)
            })
            .collect();

        let eager = eager_keys
            .par_iter()
            .map(|key| {
                let spec = &doc.components[*key];
                let data = loader
                    .load(spec, &Params::new())
                    .map_err(|e| DashboardError::Component(key.to_string(), e))?;
                Ok((key.to_string(), data))
            })
            .collect::<Result<HashMap<_, _>, DashboardError>>()?;
        tracing::debug!(count = eager.len(), "loaded eager component data");

        let compiler = LayoutCompiler {
            name: &self.name,
            doc: &doc,
            renderers: &renderers,
            eager: &eager,
        };
        let rows = compiler.compile().map_err(DashboardError::Layout)?;

        let mut layout = Widget::node("div")
            .with_class("andon-dashboard")
            .with_children(rows);
        if let Some(session) = &self.session {
            layout = layout.with_child(hidden_marker(
                format!("{}_session-id", self.name),
                Some(session.session_id()),
            ));
            layout = layout.with_child(hidden_marker(
                format!("{}_user-id", self.name),
                session.current_identity().map(|identity| identity.id),
            ));
        }

        let bindings = GraphBuilder {
            name: &self.name,
            doc: &doc,
            loader,
            cache: self.cache,
            ttl: self.ttl,
            session: self.session,
            renderers: &renderers,
            converters: &self.converters,
        }
        .build()?;

        tracing::info!(
            name = %self.name,
            components = doc.components.len(),
            bindings = bindings.len(),
            "dashboard compiled"
        );

        Ok(Dashboard {
            name: self.name,
            doc,
            layout,
            bindings,
        })
    }
}

fn hidden_marker(id: String, text: Option<String>) -> Widget {
    let mut widget = Widget::node("div")
        .with_id(id)
        .with_prop("style", serde_json::json!({ "display": "none" }));
    if let Some(text) = text {
        widget = widget.with_text(text);
    }
    widget
}

/// Install a `tracing` subscriber reading `RUST_LOG`.
#[cfg(feature = "logging")]
pub fn init_logging() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}
