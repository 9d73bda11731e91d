//! The subscription graph builder.
//!
//! The `subscribes` map declares a many-triggers-to-one-dependent wiring.
//! Building it yields one [`Binding`] per dependent, carrying everything the
//! hosting reactive runtime needs: the element ids and fields to watch, the
//! field to overwrite, and a self-contained render callback. The graph is
//! validated up front; a dependent feeding back into one of its own triggers
//! would make the host runtime re-fire forever, so cycles are rejected at
//! construction time.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use petgraph::algo::toposort;
use petgraph::graph::{Graph, NodeIndex};
use serde_json::Value;

use crate::cache::{CacheStore, cache_key};
use crate::document::{ComponentKind, ComponentSpec, Document};
use crate::error::{ConfigError, TaskResult};
use crate::loader::{DataLoader, Params};
use crate::registry::{Converters, Renderer};
use crate::session::SessionProvider;

/// The widget field a reactive value is read from or written into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Options,
    Data,
    Children,
    Value,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Options => "options",
            Field::Data => "data",
            Field::Children => "children",
            Field::Value => "value",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The field the reactive runtime overwrites on the dependent. Kinds outside
/// the three special-cased ones default to `children` rather than failing.
pub(crate) fn input_field(kind: ComponentKind) -> Field {
    match kind {
        ComponentKind::Filter => Field::Options,
        ComponentKind::Store => Field::Data,
        _ => Field::Children,
    }
}

/// The field the reactive runtime reads from a trigger to detect change.
pub(crate) fn output_field(kind: ComponentKind) -> Field {
    match kind {
        ComponentKind::Store => Field::Data,
        _ => Field::Value,
    }
}

/// One trigger input of a binding.
#[derive(Debug, Clone)]
pub struct Trigger {
    /// Component key of the trigger.
    pub key: String,
    /// Element id of the trigger widget.
    pub id: String,
    /// Field read from the trigger.
    pub field: Field,
    /// Keyword-parameter name the trigger's value is bound to.
    pub param: String,
}

type RenderFn = Arc<dyn Fn(&[Value]) -> TaskResult<Value> + Send + Sync>;

/// A registered reactive binding: many triggers feeding one dependent.
pub struct Binding {
    /// Component key of the dependent.
    pub target: String,
    /// Element id of the dependent widget.
    pub id: String,
    /// Field on the dependent overwritten with the callback's result.
    pub field: Field,
    /// Ordered triggers; their positional values are zipped with the declared
    /// parameter names when the callback fires.
    pub triggers: Vec<Trigger>,
    render: RenderFn,
}

impl Binding {
    /// Run the render callback with the triggers' current values, in declared
    /// order: load (through the cache layer when enabled), convert, render.
    pub fn invoke(&self, inputs: &[Value]) -> TaskResult<Value> {
        (self.render)(inputs)
    }
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("target", &self.target)
            .field("field", &self.field)
            .field("triggers", &self.triggers)
            .finish_non_exhaustive()
    }
}

pub(crate) struct GraphBuilder<'a> {
    pub name: &'a str,
    pub doc: &'a Document,
    pub loader: Arc<DataLoader>,
    pub cache: Arc<dyn CacheStore>,
    pub ttl: Duration,
    pub session: Option<Arc<dyn SessionProvider>>,
    pub renderers: &'a HashMap<String, Arc<dyn Renderer>>,
    pub converters: &'a Converters,
}

impl GraphBuilder<'_> {
    pub(crate) fn build(self) -> Result<Vec<Binding>, ConfigError> {
        self.check_acyclic()?;

        let mut bindings = Vec::with_capacity(self.doc.subscribes.len());
        for (target, inputs) in &self.doc.subscribes {
            let spec = self
                .doc
                .components
                .get(target)
                .ok_or_else(|| ConfigError::UnknownComponent(target.clone()))?;

            let triggers = inputs
                .iter()
                .map(|input| {
                    let trigger_spec = self
                        .doc
                        .components
                        .get(&input.key)
                        .ok_or_else(|| ConfigError::UnknownComponent(input.key.clone()))?;
                    Ok(Trigger {
                        key: input.key.clone(),
                        id: format!("{}_{}", self.name, input.key),
                        field: output_field(trigger_spec.kind),
                        param: input.param.clone(),
                    })
                })
                .collect::<Result<Vec<_>, ConfigError>>()?;

            let binding = Binding {
                target: target.clone(),
                id: format!("{}_{}", self.name, target),
                field: input_field(spec.kind),
                render: self.render_fn(target, spec, &triggers)?,
                triggers,
            };

            tracing::debug!(
                component = %target,
                field = %binding.field,
                triggers = binding.triggers.len(),
                "registered binding"
            );
            bindings.push(binding);
        }

        Ok(bindings)
    }

    /// Build the self-contained render callback for one dependent. All
    /// collaborators are resolved here so invoking the binding can no longer
    /// hit a configuration error.
    fn render_fn(
        &self,
        target: &str,
        spec: &ComponentSpec,
        triggers: &[Trigger],
    ) -> Result<RenderFn, ConfigError> {
        let convert = spec
            .convert
            .as_deref()
            .map(|name| self.converters.resolve(name))
            .transpose()?;

        // Store dependents are never rendered; their binding yields the
        // loaded data itself.
        let renderer = match spec.kind {
            ComponentKind::Store => None,
            _ => Some(self.renderers[target].clone()),
        };

        let spec = spec.clone();
        let names: Vec<String> = triggers.iter().map(|t| t.param.clone()).collect();
        let loader = self.loader.clone();
        let cache = self.cache.clone();
        let session = self.session.clone();
        let dashboard = self.name.to_owned();
        let target = target.to_owned();
        let ttl = self.ttl;

        Ok(Arc::new(move |values: &[Value]| {
            let params: Params = names
                .iter()
                .cloned()
                .zip(values.iter().cloned())
                .collect();

            let data = if spec.cache {
                let identity = session
                    .as_ref()
                    .and_then(|provider| provider.current_identity())
                    .map(|identity| identity.token);
                let key = cache_key(&dashboard, identity.as_deref(), &target, &params);
                cache.get_or_compute(&key, ttl, &|| loader.load(&spec, &params))?
            } else {
                loader.load(&spec, &params)?
            };

            let data = match &convert {
                Some(convert) => convert(data)?,
                None => data,
            };

            match &renderer {
                Some(renderer) => renderer.refresh_layout(&spec, &data),
                None => Ok(data),
            }
        }))
    }

    /// Reject self-loops and cycles before any binding is registered.
    fn check_acyclic(&self) -> Result<(), ConfigError> {
        let mut graph = Graph::<&str, ()>::new();
        let mut nodes: HashMap<&str, NodeIndex> = HashMap::new();

        for (target, inputs) in &self.doc.subscribes {
            for input in inputs {
                if input.key == *target {
                    return Err(ConfigError::SelfSubscription(target.clone()));
                }

                let trigger = *nodes
                    .entry(input.key.as_str())
                    .or_insert_with(|| graph.add_node(input.key.as_str()));
                let dependent = *nodes
                    .entry(target.as_str())
                    .or_insert_with(|| graph.add_node(target.as_str()));
                graph.add_edge(trigger, dependent, ());
            }
        }

        toposort(&graph, None)
            .map(|_| ())
            .map_err(|cycle| ConfigError::SubscriptionCycle(graph[cycle.node_id()].to_string()))
    }
}
