//! Table and generic container adapters.

use anyhow::ensure;
use serde_json::{Value, json};

use crate::document::{ComponentKind, ComponentSpec};
use crate::error::TaskResult;
use crate::registry::Renderer;
use crate::table::DataTable;
use crate::widget::Widget;

/// Titled data table. `refresh_layout` yields the children written into the
/// component's container div: a heading plus, when there is data, the table
/// widget itself.
pub(super) struct CoreTable;

impl CoreTable {
    fn render(&self, spec: &ComponentSpec, data: &Value) -> TaskResult<Vec<Widget>> {
        let title = spec.title.clone().unwrap_or_default();
        let mut children = vec![Widget::node("h4").with_text(title)];

        let table = DataTable::from_value(data)?;
        if !table.is_empty() {
            let columns: Vec<Value> = table
                .columns()
                .iter()
                .map(|column| json!({ "id": column, "name": column }))
                .collect();

            let mut widget = Widget::node("table")
                .with_prop("data", data.clone())
                .with_prop("columns", columns);
            for (name, value) in &spec.args {
                widget = widget.with_prop(name.clone(), value.clone());
            }

            children.push(Widget::node("div").with_child(widget));
        }

        Ok(children)
    }
}

impl Renderer for CoreTable {
    fn init_layout(&self, id: &str, spec: &ComponentSpec, data: &Value) -> TaskResult<Widget> {
        Ok(Widget::node("div")
            .with_id(id)
            .with_children(self.render(spec, data)?))
    }

    fn refresh_layout(&self, spec: &ComponentSpec, data: &Value) -> TaskResult<Value> {
        ensure!(spec.kind == ComponentKind::Table, "invalid table component");
        let children: Vec<Value> = self
            .render(spec, data)?
            .into_iter()
            .map(Widget::into_value)
            .collect();
        Ok(Value::Array(children))
    }
}

/// Generic container for `widget` components: an empty div carrying the
/// element id, filled reactively with whatever the upstream binding loads.
pub(super) struct Container;

impl Renderer for Container {
    fn init_layout(&self, id: &str, _spec: &ComponentSpec, _data: &Value) -> TaskResult<Widget> {
        Ok(Widget::node("div").with_id(id))
    }

    fn refresh_layout(&self, _spec: &ComponentSpec, data: &Value) -> TaskResult<Value> {
        Ok(data.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(value: Value) -> ComponentSpec {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_table_refresh_has_title_and_rows() {
        let spec = spec(json!({ "type": "table", "title": "Revenue" }));
        let data = json!([{ "region": "emea", "total": 3 }]);

        let children = CoreTable.refresh_layout(&spec, &data).unwrap();
        let children = children.as_array().unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0]["text"], json!("Revenue"));

        let table = &children[1]["children"][0];
        assert_eq!(table["props"]["data"], data);
        assert_eq!(
            table["props"]["columns"],
            json!([{ "id": "region", "name": "region" }, { "id": "total", "name": "total" }])
        );
    }

    #[test]
    fn test_empty_table_renders_title_only() {
        let spec = spec(json!({ "type": "table", "title": "Revenue" }));
        let children = CoreTable.refresh_layout(&spec, &json!([])).unwrap();
        assert_eq!(children.as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_refresh_rejects_wrong_kind() {
        let spec = spec(json!({ "type": "chart", "subType": "bar" }));
        assert!(CoreTable.refresh_layout(&spec, &json!([])).is_err());
    }

    #[test]
    fn test_container_ignores_data_on_init() {
        let spec = spec(json!({ "type": "widget" }));
        let widget = Container
            .init_layout("d_w", &spec, &json!([1, 2]))
            .unwrap();
        assert!(widget.children.is_empty());
        assert_eq!(widget.id.as_deref(), Some("d_w"));
    }
}
