//! Built-in rendering adapters, one thin module per component family.

mod chart;
mod filter;
mod table;

use std::sync::Arc;

use serde_json::Value;

use crate::document::{ComponentKind, ComponentSpec};
use crate::registry::Registry;
use crate::widget::Widget;

pub(crate) fn register_builtins(registry: &mut Registry) {
    registry.register(ComponentKind::Filter, Some("selector"), Arc::new(filter::Selector));
    registry.register(ComponentKind::Filter, Some("checklist"), Arc::new(filter::Checklist));
    registry.register(ComponentKind::Filter, Some("radio"), Arc::new(filter::RadioItems));
    registry.register(ComponentKind::Filter, Some("slide"), Arc::new(filter::Slide));
    registry.register(ComponentKind::Filter, Some("rangeslide"), Arc::new(filter::RangeSlide));
    registry.register(ComponentKind::Filter, Some("input"), Arc::new(filter::InputText));
    registry.register(ComponentKind::Filter, Some("date"), Arc::new(filter::DateSingle));
    registry.register(ComponentKind::Filter, Some("daterange"), Arc::new(filter::DateRange));
    registry.register(ComponentKind::Filter, Some("markdown"), Arc::new(filter::Markdown));

    registry.register(ComponentKind::Chart, Some("bar"), Arc::new(chart::Chart(chart::bar)));
    registry.register(ComponentKind::Chart, Some("pie"), Arc::new(chart::Chart(chart::pie)));
    registry.register(ComponentKind::Chart, Some("scatter"), Arc::new(chart::Chart(chart::scatter)));
    registry.register(ComponentKind::Chart, Some("heatmap"), Arc::new(chart::Chart(chart::heatmap)));
    registry.register(ComponentKind::Chart, Some("radar"), Arc::new(chart::Chart(chart::radar)));

    registry.register(ComponentKind::Table, None, Arc::new(table::CoreTable));
    registry.register(ComponentKind::Table, Some("core"), Arc::new(table::CoreTable));

    registry.register(ComponentKind::Widget, None, Arc::new(table::Container));
}

/// Copy a declared arg into a widget prop when present.
pub(super) fn opt_arg(widget: Widget, spec: &ComponentSpec, name: &str) -> Widget {
    match spec.args.get(name) {
        Some(value) => widget.with_prop(name, value.clone()),
        None => widget,
    }
}

/// A declared arg, or a default when absent.
pub(super) fn arg_or(spec: &ComponentSpec, name: &str, default: Value) -> Value {
    spec.args.get(name).cloned().unwrap_or(default)
}

/// Whether normalized component data holds any records.
pub(super) fn has_records(data: &Value) -> bool {
    data.as_array().is_some_and(|items| !items.is_empty())
}
