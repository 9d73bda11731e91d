//! The layout compiler.
//!
//! Walks the document's row/column tree in order and produces the initial
//! widget tree. Leaf `component` cells dispatch to the matching rendering
//! adapter; a key missing from the component map degrades to a visible
//! inline marker instead of failing the whole dashboard.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::document::{Column, ColumnKind, Document, Row};
use crate::error::TaskResult;
use crate::registry::Renderer;
use crate::widget::Widget;

pub(crate) struct LayoutCompiler<'a> {
    pub name: &'a str,
    pub doc: &'a Document,
    /// Adapter per renderable component key, resolved during validation.
    pub renderers: &'a HashMap<String, Arc<dyn Renderer>>,
    /// Preloaded data for eagerly rendered components.
    pub eager: &'a HashMap<String, Value>,
}

impl LayoutCompiler<'_> {
    pub(crate) fn compile(&self) -> TaskResult<Vec<Widget>> {
        self.compile_rows(&self.doc.layout)
    }

    fn compile_rows(&self, rows: &[Row]) -> TaskResult<Vec<Widget>> {
        rows.iter()
            .map(|row| {
                Ok(Widget::node("div")
                    .with_class("andon-row")
                    .with_children(self.compile_row(row)?))
            })
            .collect()
    }

    fn compile_row(&self, row: &Row) -> TaskResult<Vec<Widget>> {
        row.columns
            .iter()
            .map(|column| self.compile_column(column))
            .collect()
    }

    fn compile_column(&self, column: &Column) -> TaskResult<Widget> {
        let width = &column.width;
        match &column.kind {
            ColumnKind::Container { rows } => Ok(Widget::node("div")
                .with_class(format!("andon-col {width}"))
                .with_children(self.compile_rows(rows)?)),
            ColumnKind::Component {
                component: Some(key),
            } => self.init_component(key, width),
            ColumnKind::Component { component: None } => Ok(Widget::node("div")
                .with_class(format!("andon-widget {width}"))
                .with_text("HOLDER")),
            ColumnKind::Spacer => Ok(Widget::node("div").with_class(width.clone())),
        }
    }

    /// Initialize one component cell. Unknown keys become inline markers;
    /// known keys dispatch to their adapter with eagerly loaded data, or an
    /// empty sequence for subscription targets that render reactively.
    fn init_component(&self, key: &str, width: &str) -> TaskResult<Widget> {
        let class = format!("andon-widget {width}");

        let Some(spec) = self.doc.components.get(key) else {
            tracing::warn!(key, "layout references an undeclared component");
            return Ok(Widget::node("div")
                .with_class(class)
                .with_text(format!("INVALID COMPONENT [{key}]")));
        };

        let id = format!("{}_{}", self.name, key);
        let data = self
            .eager
            .get(key)
            .cloned()
            .unwrap_or_else(|| Value::Array(Vec::new()));

        // Present for every renderable component once validation passed.
        let renderer = &self.renderers[key];
        let widget = renderer.init_layout(&id, spec, &data)?;

        Ok(Widget::node("div").with_class(class).with_child(widget))
    }
}
