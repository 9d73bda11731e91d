//! Adapter and converter registries.
//!
//! Rendering adapters are looked up by component kind plus optional subtype.
//! Built-ins cover the stock filter, chart, table and widget subtypes; the
//! embedding application can register additional subtypes before sealing the
//! blueprint. Converters are named post-processors applied to loaded records;
//! both registries resolve eagerly at construction time so a typo in the
//! document is a typed configuration error, never a runtime surprise.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::document::{ComponentKind, ComponentSpec};
use crate::error::{ConfigError, TaskResult};
use crate::widget::Widget;

/// The two-capability contract every rendering adapter satisfies. The same
/// adapter instance services both calls for a given component kind+subtype.
pub trait Renderer: Send + Sync {
    /// First paint: produce the initial widget carrying the component's
    /// element id. `data` is the eagerly loaded component data, or an empty
    /// sequence for components whose data arrives reactively.
    fn init_layout(&self, id: &str, spec: &ComponentSpec, data: &Value) -> TaskResult<Widget>;

    /// Subsequent reactive paints: produce the value written into the
    /// dependent's input field by the hosting reactive runtime.
    fn refresh_layout(&self, spec: &ComponentSpec, data: &Value) -> TaskResult<Value>;
}

type RendererKey = (ComponentKind, Option<String>);

/// Static adapter registry.
pub struct Registry {
    adapters: HashMap<RendererKey, Arc<dyn Renderer>>,
}

impl Registry {
    /// Registry pre-populated with the built-in adapters.
    pub fn with_builtins() -> Self {
        let mut registry = Self {
            adapters: HashMap::new(),
        };
        crate::render::register_builtins(&mut registry);
        registry
    }

    /// Register an adapter for a kind+subtype pair. `None` registers the
    /// kind's default adapter, used when a component declares no subtype.
    pub fn register(
        &mut self,
        kind: ComponentKind,
        subtype: Option<&str>,
        renderer: Arc<dyn Renderer>,
    ) {
        self.adapters
            .insert((kind, subtype.map(str::to_owned)), renderer);
    }

    pub(crate) fn resolve(
        &self,
        component: &str,
        spec: &ComponentSpec,
    ) -> Result<Arc<dyn Renderer>, ConfigError> {
        self.adapters
            .get(&(spec.kind, spec.subtype.clone()))
            .cloned()
            .ok_or_else(|| ConfigError::UnknownRenderer {
                component: component.to_owned(),
                kind: spec.kind,
                subtype: spec.subtype.clone().unwrap_or_else(|| "default".into()),
            })
    }
}

/// A registered record post-processor.
pub type ConvertFn = Arc<dyn Fn(Value) -> TaskResult<Value> + Send + Sync>;

/// Explicit converter registry supplied by the embedding application.
#[derive(Default)]
pub struct Converters {
    map: HashMap<String, ConvertFn>,
}

impl Converters {
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        convert: impl Fn(Value) -> TaskResult<Value> + Send + Sync + 'static,
    ) {
        self.map.insert(name.into(), Arc::new(convert));
    }

    pub(crate) fn resolve(&self, name: &str) -> Result<ConvertFn, ConfigError> {
        self.map
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownConverter(name.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spec(value: Value) -> ComponentSpec {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_builtins_resolve() {
        let registry = Registry::with_builtins();
        for value in [
            json!({ "type": "filter", "subType": "selector" }),
            json!({ "type": "filter", "subType": "checklist" }),
            json!({ "type": "chart", "subType": "bar" }),
            json!({ "type": "chart", "subType": "pie" }),
            json!({ "type": "table" }),
            json!({ "type": "widget" }),
        ] {
            let spec = spec(value.clone());
            assert!(registry.resolve("c", &spec).is_ok(), "no adapter for {value}");
        }
    }

    #[test]
    fn test_unknown_subtype_is_config_error() {
        let registry = Registry::with_builtins();
        let spec = spec(json!({ "type": "chart", "subType": "funnel" }));
        assert!(matches!(
            registry.resolve("sales", &spec),
            Err(ConfigError::UnknownRenderer { component, subtype, .. })
                if component == "sales" && subtype == "funnel"
        ));
    }

    #[test]
    fn test_external_registration() {
        struct Funnel;

        impl Renderer for Funnel {
            fn init_layout(&self, id: &str, _: &ComponentSpec, _: &Value) -> TaskResult<Widget> {
                Ok(Widget::node("funnel").with_id(id))
            }

            fn refresh_layout(&self, _: &ComponentSpec, data: &Value) -> TaskResult<Value> {
                Ok(data.clone())
            }
        }

        let mut registry = Registry::with_builtins();
        registry.register(ComponentKind::Chart, Some("funnel"), Arc::new(Funnel));

        let spec = spec(json!({ "type": "chart", "subType": "funnel" }));
        assert!(registry.resolve("sales", &spec).is_ok());
    }

    #[test]
    fn test_converter_resolution() {
        let mut converters = Converters::default();
        converters.insert("noop", Ok);

        assert!(converters.resolve("noop").is_ok());
        assert!(matches!(
            converters.resolve("ghost"),
            Err(ConfigError::UnknownConverter(name)) if name == "ghost"
        ));
    }
}
