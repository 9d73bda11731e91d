//! Chart adapters.
//!
//! Each chart turns normalized row records into a plotly-style figure value:
//! `{ "data": [traces...], "layout": {...} }`. The external chart engine is
//! only ever handed this value; nothing here depends on a concrete plotting
//! library.
//!
//! The shared [`Frame`] resolves the index column (a column literally named
//! `key`, else the column named by the `key` arg), detects the numeric
//! category columns and fills their missing values with the `placeholder`
//! arg. A malformed placeholder falls back to zero.

use anyhow::{anyhow, ensure};
use serde_json::{Value, json};

use super::has_records;
use crate::document::ComponentSpec;
use crate::error::TaskResult;
use crate::registry::Renderer;
use crate::table::DataTable;
use crate::widget::Widget;

const DEFAULT_INDEX_COLUMN: &str = "key";

/// Adapter wrapping one figure builder. `init_layout` produces the id-carrying
/// container div so the reactive runtime can overwrite its children;
/// `refresh_layout` produces those children.
pub(super) struct Chart(pub(super) fn(&ComponentSpec, &Value) -> TaskResult<Value>);

impl Renderer for Chart {
    fn init_layout(&self, id: &str, spec: &ComponentSpec, data: &Value) -> TaskResult<Widget> {
        let mut node = Widget::node("div").with_id(id);
        if has_records(data) {
            node = node.with_child(graph((self.0)(spec, data)?));
        }
        Ok(node)
    }

    fn refresh_layout(&self, spec: &ComponentSpec, data: &Value) -> TaskResult<Value> {
        Ok(graph((self.0)(spec, data)?).into_value())
    }
}

fn graph(figure: Value) -> Widget {
    Widget::node("graph").with_prop("figure", figure)
}

struct Frame {
    table: DataTable,
    index: String,
    categories: Vec<String>,
}

impl Frame {
    fn build(spec: &ComponentSpec, data: &Value) -> TaskResult<Self> {
        let mut table = DataTable::from_value(data)?;

        let index = if table.columns().iter().any(|c| c == DEFAULT_INDEX_COLUMN) {
            DEFAULT_INDEX_COLUMN.to_string()
        } else {
            spec.args
                .get("key")
                .and_then(Value::as_str)
                .filter(|key| table.columns().iter().any(|c| c == key))
                .map(str::to_owned)
                .ok_or_else(|| anyhow!("the index column not found"))?
        };

        let placeholder = placeholder(spec);
        let mut categories = Vec::new();
        for column in table.columns().to_vec() {
            if column != index && table.is_numeric(&column) {
                table.fill_missing(&column, placeholder);
                categories.push(column);
            }
        }
        ensure!(!categories.is_empty(), "no category column provided");

        Ok(Self {
            table,
            index,
            categories,
        })
    }

    fn index_values(&self) -> Vec<Value> {
        self.table.column(&self.index).unwrap_or_default()
    }
}

fn placeholder(spec: &ComponentSpec) -> f64 {
    match spec.args.get("placeholder") {
        Some(Value::Number(number)) => number.as_f64().unwrap_or(0.0),
        Some(Value::String(text)) => text.parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

pub(super) fn bar(spec: &ComponentSpec, data: &Value) -> TaskResult<Value> {
    let frame = Frame::build(spec, data)?;
    let x = frame.index_values();

    let traces: Vec<Value> = frame
        .categories
        .iter()
        .map(|category| {
            json!({
                "type": "bar",
                "name": category,
                "x": x,
                "y": frame.table.column(category),
            })
        })
        .collect();

    let mut layout = json!({});
    if let Some(barmode) = spec.args.get("barmode") {
        layout["barmode"] = barmode.clone();
    }

    Ok(json!({ "data": traces, "layout": layout }))
}

pub(super) fn pie(spec: &ComponentSpec, data: &Value) -> TaskResult<Value> {
    let frame = Frame::build(spec, data)?;
    let labels = frame.index_values();

    let traces: Vec<Value> = frame
        .categories
        .iter()
        .map(|category| {
            json!({
                "type": "pie",
                "name": category,
                "labels": labels,
                "values": frame.table.column(category),
            })
        })
        .collect();

    let showlegend = spec.args.get("showlegend").is_some_and(truthy_flag);

    Ok(json!({ "data": traces, "layout": { "showlegend": showlegend } }))
}

pub(super) fn scatter(spec: &ComponentSpec, data: &Value) -> TaskResult<Value> {
    let frame = Frame::build(spec, data)?;
    let x = frame.index_values();
    let mode = arg_str(spec, "mode").unwrap_or("markers");

    let traces: Vec<Value> = frame
        .categories
        .iter()
        .map(|category| {
            json!({
                "type": "scatter",
                "mode": mode,
                "name": category,
                "x": x,
                "y": frame.table.column(category),
            })
        })
        .collect();

    Ok(json!({ "data": traces, "layout": {} }))
}

pub(super) fn heatmap(spec: &ComponentSpec, data: &Value) -> TaskResult<Value> {
    let table = DataTable::from_value(data)?;

    let x_column = arg_str(spec, "x_column").ok_or_else(|| anyhow!("the x_column not found"))?;
    let y_column = arg_str(spec, "y_column").ok_or_else(|| anyhow!("the y_column not found"))?;
    let z_column = arg_str(spec, "z_column").ok_or_else(|| anyhow!("the z_column not found"))?;
    ensure!(table.is_numeric(z_column), "the z_column is not numeric");

    let trace = json!({
        "type": "heatmap",
        "x": table.column(x_column),
        "y": table.column(y_column),
        "z": table.column(z_column),
        "colorscale": "Viridis",
    });

    Ok(json!({ "data": [trace], "layout": {} }))
}

pub(super) fn radar(spec: &ComponentSpec, data: &Value) -> TaskResult<Value> {
    let frame = Frame::build(spec, data)?;

    // One polar trace per row, spanning every category column.
    let traces: Vec<Value> = frame
        .table
        .to_records()
        .into_iter()
        .map(|record| {
            let r: Vec<Value> = frame
                .categories
                .iter()
                .map(|category| record.get(category).cloned().unwrap_or(Value::Null))
                .collect();
            json!({
                "type": "scatterpolar",
                "r": r,
                "theta": frame.categories,
                "fill": "toself",
                "name": record.get(&frame.index).cloned().unwrap_or(Value::Null),
            })
        })
        .collect();

    let showlegend = spec.args.get("showlegend").is_some_and(truthy_flag);

    Ok(json!({
        "data": traces,
        "layout": {
            "polar": { "radialaxis": { "visible": true } },
            "showlegend": showlegend,
        },
    }))
}

fn arg_str<'a>(spec: &'a ComponentSpec, name: &str) -> Option<&'a str> {
    spec.args.get(name).and_then(Value::as_str)
}

/// Document flags arrive either as booleans or as the string `"true"`.
fn truthy_flag(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::String(text) => text.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn spec(value: Value) -> ComponentSpec {
        serde_json::from_value(value).unwrap()
    }

    fn records() -> Value {
        json!([
            { "key": "north", "q1": 10, "q2": 20 },
            { "key": "south", "q1": 5, "q2": null },
        ])
    }

    #[test]
    fn test_bar_traces_per_category() {
        let spec = spec(json!({ "type": "chart", "subType": "bar", "barmode": "stack" }));
        let figure = bar(&spec, &records()).unwrap();

        assert_eq!(figure["data"].as_array().unwrap().len(), 2);
        assert_eq!(figure["data"][0]["x"], json!(["north", "south"]));
        assert_eq!(figure["data"][0]["y"], json!([10, 5]));
        // Missing q2 value filled with the default placeholder.
        assert_eq!(figure["data"][1]["y"], json!([20, 0.0]));
        assert_eq!(figure["layout"]["barmode"], json!("stack"));
    }

    #[test]
    fn test_malformed_placeholder_falls_back_to_zero() {
        let spec = spec(json!({
            "type": "chart", "subType": "bar", "placeholder": "not-a-number",
        }));
        let figure = bar(&spec, &records()).unwrap();
        assert_eq!(figure["data"][1]["y"], json!([20, 0.0]));
    }

    #[test]
    fn test_explicit_placeholder() {
        let spec = spec(json!({ "type": "chart", "subType": "bar", "placeholder": "-1" }));
        let figure = bar(&spec, &records()).unwrap();
        assert_eq!(figure["data"][1]["y"], json!([20, -1.0]));
    }

    #[test]
    fn test_index_column_from_arg() {
        let spec = spec(json!({ "type": "chart", "subType": "bar", "key": "region" }));
        let data = json!([{ "region": "emea", "total": 3 }]);
        let figure = bar(&spec, &data).unwrap();
        assert_eq!(figure["data"][0]["x"], json!(["emea"]));
    }

    #[test]
    fn test_missing_index_column_fails() {
        let spec = spec(json!({ "type": "chart", "subType": "bar" }));
        let data = json!([{ "region": "emea", "total": 3 }]);
        assert!(bar(&spec, &data).is_err());
    }

    #[test]
    fn test_no_numeric_categories_fails() {
        let spec = spec(json!({ "type": "chart", "subType": "bar" }));
        let data = json!([{ "key": "a", "label": "b" }]);
        assert!(bar(&spec, &data).is_err());
    }

    #[test]
    fn test_pie_uses_labels() {
        let spec = spec(json!({ "type": "chart", "subType": "pie", "showlegend": "true" }));
        let figure = pie(&spec, &records()).unwrap();
        assert_eq!(figure["data"][0]["labels"], json!(["north", "south"]));
        assert_eq!(figure["layout"]["showlegend"], json!(true));
    }

    #[test]
    fn test_scatter_mode() {
        let spec = spec(json!({ "type": "chart", "subType": "scatter", "mode": "lines" }));
        let figure = scatter(&spec, &records()).unwrap();
        assert_eq!(figure["data"][0]["mode"], json!("lines"));
    }

    #[test]
    fn test_heatmap_requires_named_columns() {
        let spec = spec(json!({
            "type": "chart", "subType": "heatmap",
            "x_column": "x", "y_column": "y", "z_column": "z",
        }));
        let data = json!([
            { "x": "a", "y": "b", "z": 1 },
            { "x": "a", "y": "c", "z": 2 },
        ]);
        let figure = heatmap(&spec, &data).unwrap();
        assert_eq!(figure["data"][0]["z"], json!([1, 2]));

        let missing = spec.clone();
        let bad = json!([{ "x": "a", "y": "b", "z": "text" }]);
        assert!(heatmap(&missing, &bad).is_err());
    }

    #[test]
    fn test_radar_one_trace_per_row() {
        let spec = spec(json!({ "type": "chart", "subType": "radar" }));
        let figure = radar(&spec, &records()).unwrap();
        let traces = figure["data"].as_array().unwrap();
        assert_eq!(traces.len(), 2);
        assert_eq!(traces[0]["name"], json!("north"));
        assert_eq!(traces[0]["theta"], json!(["q1", "q2"]));
        assert_eq!(traces[0]["r"], json!([10, 20]));
    }

    #[test]
    fn test_chart_adapter_wraps_figure() {
        let spec = spec(json!({ "type": "chart", "subType": "bar" }));
        let adapter = Chart(bar);

        let widget = adapter.init_layout("d_sales", &spec, &records()).unwrap();
        assert_eq!(widget.id.as_deref(), Some("d_sales"));
        assert_eq!(widget.children[0].kind, "graph");

        // Deferred components start with no figure at all.
        let empty = adapter.init_layout("d_sales", &spec, &json!([])).unwrap();
        assert!(empty.children.is_empty());

        let refreshed = adapter.refresh_layout(&spec, &records()).unwrap();
        assert_eq!(refreshed["kind"], json!("graph"));
    }
}
