//! Filter adapters.
//!
//! Filters are the interactive trigger widgets. Their `init_layout` builds
//! the control carrying the component's element id; `refresh_layout` passes
//! option data straight through, because a filter's reactive input field is
//! its `options` property, not a rebuilt widget.

use serde_json::{Value, json};

use super::{arg_or, opt_arg};
use crate::document::ComponentSpec;
use crate::error::TaskResult;
use crate::registry::Renderer;
use crate::widget::Widget;

pub(super) struct Selector;

impl Renderer for Selector {
    fn init_layout(&self, id: &str, spec: &ComponentSpec, data: &Value) -> TaskResult<Widget> {
        let mut widget = Widget::node("dropdown")
            .with_id(id)
            .with_prop("options", data.clone())
            .with_prop("clearable", arg_or(spec, "clearable", json!(false)))
            .with_prop("multi", arg_or(spec, "multi", json!(false)));
        if let Some(title) = &spec.title {
            widget = widget.with_prop("placeholder", title.clone());
        }
        Ok(opt_arg(widget, spec, "className"))
    }

    fn refresh_layout(&self, _spec: &ComponentSpec, data: &Value) -> TaskResult<Value> {
        Ok(data.clone())
    }
}

pub(super) struct Checklist;

impl Renderer for Checklist {
    fn init_layout(&self, id: &str, spec: &ComponentSpec, data: &Value) -> TaskResult<Widget> {
        let mut widget = Widget::node("checklist")
            .with_id(id)
            .with_prop("options", data.clone())
            .with_prop("value", json!([]));
        for name in ["inputStyle", "inputClassName", "labelStyle", "labelClassName", "style", "className"] {
            widget = opt_arg(widget, spec, name);
        }
        Ok(widget)
    }

    fn refresh_layout(&self, _spec: &ComponentSpec, data: &Value) -> TaskResult<Value> {
        Ok(data.clone())
    }
}

pub(super) struct RadioItems;

impl Renderer for RadioItems {
    fn init_layout(&self, id: &str, spec: &ComponentSpec, data: &Value) -> TaskResult<Widget> {
        let mut widget = Widget::node("radio")
            .with_id(id)
            .with_prop("options", data.clone())
            .with_prop("value", json!([]));
        for name in ["style", "inputStyle", "inputClassName", "labelStyle", "labelClassName", "className"] {
            widget = opt_arg(widget, spec, name);
        }
        Ok(widget)
    }

    fn refresh_layout(&self, _spec: &ComponentSpec, data: &Value) -> TaskResult<Value> {
        Ok(data.clone())
    }
}

pub(super) struct Slide;

impl Renderer for Slide {
    fn init_layout(&self, id: &str, spec: &ComponentSpec, data: &Value) -> TaskResult<Widget> {
        // Malformed or absent initial data falls back to zero.
        let value = data
            .as_array()
            .and_then(|items| items.first())
            .and_then(Value::as_f64)
            .unwrap_or(0.0);

        let widget = Widget::node("slider")
            .with_id(id)
            .with_prop("min", arg_or(spec, "min", json!(0)))
            .with_prop("max", arg_or(spec, "max", json!(100)))
            .with_prop("step", arg_or(spec, "step", json!(1)))
            .with_prop("value", value);
        Ok(opt_arg(widget, spec, "className"))
    }

    fn refresh_layout(&self, _spec: &ComponentSpec, data: &Value) -> TaskResult<Value> {
        Ok(data.clone())
    }
}

pub(super) struct RangeSlide;

impl Renderer for RangeSlide {
    fn init_layout(&self, id: &str, spec: &ComponentSpec, data: &Value) -> TaskResult<Widget> {
        let value = match data.as_array() {
            Some(items) if items.len() == 2 => data.clone(),
            _ => json!([0, 100]),
        };

        let widget = Widget::node("rangeslider")
            .with_id(id)
            .with_prop("min", arg_or(spec, "min", json!(0)))
            .with_prop("max", arg_or(spec, "max", json!(100)))
            .with_prop("step", arg_or(spec, "step", json!(1)))
            .with_prop("value", value);
        Ok(opt_arg(widget, spec, "className"))
    }

    fn refresh_layout(&self, _spec: &ComponentSpec, data: &Value) -> TaskResult<Value> {
        Ok(data.clone())
    }
}

pub(super) struct InputText;

impl Renderer for InputText {
    fn init_layout(&self, id: &str, spec: &ComponentSpec, data: &Value) -> TaskResult<Widget> {
        let mut widget = Widget::node("input")
            .with_id(id)
            .with_prop("type", arg_or(spec, "input_type", json!("text")))
            .with_prop("placeholder", arg_or(spec, "placeholder", json!("")))
            .with_prop("debounce", arg_or(spec, "debounce", json!(true)))
            .with_prop("value", data.clone());
        for name in ["className", "style"] {
            widget = opt_arg(widget, spec, name);
        }
        Ok(widget)
    }

    fn refresh_layout(&self, _spec: &ComponentSpec, data: &Value) -> TaskResult<Value> {
        Ok(data.clone())
    }
}

pub(super) struct DateSingle;

impl Renderer for DateSingle {
    fn init_layout(&self, id: &str, spec: &ComponentSpec, data: &Value) -> TaskResult<Widget> {
        let mut widget = Widget::node("datepicker")
            .with_id(id)
            .with_prop("date", data.clone())
            .with_prop("clearable", arg_or(spec, "clearable", json!(false)))
            .with_prop(
                "calendar_orientation",
                arg_or(spec, "calendar_orientation", json!("horizontal")),
            );
        for name in ["placeholder", "style", "className", "min_date_allowed", "max_date_allowed"] {
            widget = opt_arg(widget, spec, name);
        }
        Ok(widget)
    }

    fn refresh_layout(&self, _spec: &ComponentSpec, data: &Value) -> TaskResult<Value> {
        Ok(data.clone())
    }
}

pub(super) struct DateRange;

impl Renderer for DateRange {
    fn init_layout(&self, id: &str, spec: &ComponentSpec, _data: &Value) -> TaskResult<Widget> {
        let picker = Widget::node("daterangepicker").with_id(id);
        let mut wrapper = Widget::node("div").with_child(picker);
        if let Some(title) = &spec.title {
            wrapper = wrapper.with_child(Widget::node("label").with_text(title.clone()));
        }
        Ok(wrapper)
    }

    fn refresh_layout(&self, _spec: &ComponentSpec, data: &Value) -> TaskResult<Value> {
        Ok(data.clone())
    }
}

pub(super) struct Markdown;

impl Renderer for Markdown {
    fn init_layout(&self, id: &str, spec: &ComponentSpec, data: &Value) -> TaskResult<Widget> {
        let mut widget = Widget::node("markdown")
            .with_id(id)
            .with_prop("children", data.clone());
        for name in ["className", "style"] {
            widget = opt_arg(widget, spec, name);
        }
        Ok(widget)
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
    fn test_selector_defaults_and_args() {
        let spec = spec(json!({
            "type": "filter", "subType": "selector",
            "title": "Region", "multi": true,
        }));
        let options = json!([{ "label": "EMEA", "value": "emea" }]);
        let widget = Selector.init_layout("d_region", &spec, &options).unwrap();

        assert_eq!(widget.kind, "dropdown");
        assert_eq!(widget.id.as_deref(), Some("d_region"));
        assert_eq!(widget.props["options"], options);
        assert_eq!(widget.props["clearable"], json!(false));
        assert_eq!(widget.props["multi"], json!(true));
        assert_eq!(widget.props["placeholder"], json!("Region"));
    }

    #[test]
    fn test_slide_value_fallback() {
        let spec = spec(json!({ "type": "filter", "subType": "slide", "max": 10 }));

        let widget = Slide.init_layout("d_s", &spec, &json!([7])).unwrap();
        assert_eq!(widget.props["value"], json!(7.0));
        assert_eq!(widget.props["max"], json!(10));

        // Non-numeric initial data degrades to the default instead of failing.
        let widget = Slide.init_layout("d_s", &spec, &json!(["oops"])).unwrap();
        assert_eq!(widget.props["value"], json!(0.0));
    }

    #[test]
    fn test_rangeslide_needs_exactly_two_bounds() {
        let spec = spec(json!({ "type": "filter", "subType": "rangeslide" }));
        let widget = RangeSlide.init_layout("d_r", &spec, &json!([1])).unwrap();
        assert_eq!(widget.props["value"], json!([0, 100]));

        let widget = RangeSlide.init_layout("d_r", &spec, &json!([3, 9])).unwrap();
        assert_eq!(widget.props["value"], json!([3, 9]));
    }

    #[test]
    fn test_refresh_passes_options_through() {
        let spec = spec(json!({ "type": "filter", "subType": "checklist" }));
        let options = json!([{ "label": "a", "value": "a" }]);
        assert_eq!(Checklist.refresh_layout(&spec, &options).unwrap(), options);
    }
}
