//! The typed model of the dashboard configuration document.
//!
//! A document is authored as a nested mapping in whatever serialization the
//! host prefers; it reaches this crate either as a ready [`Document`] value or
//! as a `serde_json::Value` handed to [`Blueprint::document_value`]. Unknown
//! component or column types are rejected during deserialization, so the rest
//! of the crate only ever sees well-shaped trees.
//!
//! [`Blueprint::document_value`]: crate::Blueprint::document_value

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::ConfigError;

/// A parsed dashboard configuration document. Read-only after load.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Human-readable name shown by the host.
    pub display_name: String,
    /// Component definitions, keyed by their unique component key.
    pub components: BTreeMap<String, ComponentSpec>,
    /// Ordered rows making up the dashboard grid.
    pub layout: Vec<Row>,
    /// Reactive wiring: dependent component key to its ordered trigger inputs.
    /// Absent means no reactivity, every component renders eagerly.
    #[serde(default)]
    pub subscribes: BTreeMap<String, Vec<SubscriptionInput>>,
}

impl Document {
    /// Structural validation of the document invariants which do not require
    /// any registry: store/task pairing, mandatory subtypes, stores referenced
    /// from layout and subscription keys resolving to declared components.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, spec) in &self.components {
            match spec.kind {
                ComponentKind::Store if spec.task.is_none() => {
                    return Err(ConfigError::StoreWithoutTask(key.clone()));
                }
                ComponentKind::Filter | ComponentKind::Chart if spec.subtype.is_none() => {
                    return Err(ConfigError::MissingSubtype {
                        component: key.clone(),
                        kind: spec.kind,
                    });
                }
                _ => {}
            }
        }

        for key in self.layout_component_keys() {
            if let Some(spec) = self.components.get(key) {
                if spec.kind == ComponentKind::Store {
                    return Err(ConfigError::StoreInLayout(key.to_string()));
                }
            }
        }

        for (target, inputs) in &self.subscribes {
            if !self.components.contains_key(target) {
                return Err(ConfigError::UnknownComponent(target.clone()));
            }
            for input in inputs {
                if !self.components.contains_key(&input.key) {
                    return Err(ConfigError::UnknownComponent(input.key.clone()));
                }
            }
        }

        Ok(())
    }

    /// Every component key referenced from the layout, in layout order.
    /// Keys missing from `components` are included; the layout compiler
    /// renders those as inline markers.
    pub(crate) fn layout_component_keys(&self) -> Vec<&str> {
        let mut keys = Vec::new();
        collect_keys(&self.layout, &mut keys);
        keys
    }
}

fn collect_keys<'a>(rows: &'a [Row], keys: &mut Vec<&'a str>) {
    for row in rows {
        for column in &row.columns {
            match &column.kind {
                ColumnKind::Container { rows } => collect_keys(rows, keys),
                ColumnKind::Component {
                    component: Some(key),
                } => keys.push(key),
                _ => {}
            }
        }
    }
}

/// The closed set of component kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Filter,
    Chart,
    Table,
    Store,
    Widget,
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ComponentKind::Filter => "filter",
            ComponentKind::Chart => "chart",
            ComponentKind::Table => "table",
            ComponentKind::Store => "store",
            ComponentKind::Widget => "widget",
        };
        write!(f, "{name}")
    }
}

/// Declaration of a single dashboard component.
///
/// Adapter-specific settings which are not part of the core contract land in
/// [`args`](Self::args) and are forwarded verbatim to the rendering adapter.
#[derive(Debug, Clone, Deserialize)]
pub struct ComponentSpec {
    #[serde(rename = "type")]
    pub kind: ComponentKind,
    /// Adapter subtype, required for `filter` and `chart` components.
    #[serde(rename = "subType", default)]
    pub subtype: Option<String>,
    /// Name of the data task executed by the external task engine.
    #[serde(default)]
    pub task: Option<String>,
    /// Whether reactive loads for this component go through the cache layer.
    #[serde(default)]
    pub cache: bool,
    /// Name of a registered post-processor applied to loaded records.
    #[serde(default)]
    pub convert: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(flatten)]
    pub args: Map<String, Value>,
}

/// One layout row, an ordered sequence of columns.
#[derive(Debug, Clone, Deserialize)]
pub struct Row {
    pub columns: Vec<Column>,
}

/// One layout column. The width is an opaque sizing token forwarded to the
/// style layer.
#[derive(Debug, Clone, Deserialize)]
pub struct Column {
    pub width: String,
    #[serde(flatten)]
    pub kind: ColumnKind,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ColumnKind {
    /// Nested rows wrapped as a grouping node.
    Container { rows: Vec<Row> },
    /// A leaf cell referencing a declared component. A missing reference
    /// renders as an empty placeholder.
    Component {
        #[serde(default)]
        component: Option<String>,
    },
    /// An empty cell styled by its width.
    Spacer,
}

/// Binds a named keyword parameter of the dependent's render function to
/// another component's current output value.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionInput {
    pub key: String,
    #[serde(rename = "as")]
    pub param: String,
}
