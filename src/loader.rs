//! Data loading through the external task-execution engine.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::document::ComponentSpec;
use crate::error::TaskResult;
use crate::table::DataTable;

/// Keyword parameters passed to a data task. A `BTreeMap` keeps iteration
/// lexicographic by parameter name, which the cache key derivation relies on.
pub type Params = BTreeMap<String, Value>;

/// Raw result of a data task.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutput {
    /// Tabular result, normalized to row records before rendering.
    Table(DataTable),
    /// Anything else, passed through unchanged.
    Raw(Value),
}

impl From<DataTable> for TaskOutput {
    fn from(value: DataTable) -> Self {
        TaskOutput::Table(value)
    }
}

impl From<Value> for TaskOutput {
    fn from(value: Value) -> Self {
        TaskOutput::Raw(value)
    }
}

/// The external task-execution engine. Implementations must be idempotent for
/// identical parameters within a dashboard's lifetime, otherwise caching is
/// meaningless.
pub trait TaskExecutor: Send + Sync {
    fn execute(&self, task: &str, params: &Params) -> TaskResult<TaskOutput>;
}

/// Invokes the task executor for a component and normalizes the result.
pub(crate) struct DataLoader {
    executor: Option<Arc<dyn TaskExecutor>>,
}

impl DataLoader {
    pub(crate) fn new(executor: Option<Arc<dyn TaskExecutor>>) -> Self {
        Self { executor }
    }

    /// Load data for a component. Components without a task are fed purely
    /// from upstream bindings: their `data` parameter is used directly,
    /// defaulting to an empty sequence.
    pub(crate) fn load(&self, spec: &ComponentSpec, params: &Params) -> TaskResult<Value> {
        let raw = match &spec.task {
            Some(task) => match &self.executor {
                Some(executor) => {
                    tracing::debug!(%task, "executing data task");
                    executor.execute(task, params)?
                }
                None => anyhow::bail!("no task executor configured for task '{task}'"),
            },
            None => TaskOutput::Raw(
                params
                    .get("data")
                    .cloned()
                    .unwrap_or_else(|| Value::Array(Vec::new())),
            ),
        };

        Ok(normalize(raw))
    }
}

/// Normalize a task result into the uniform shape every rendering adapter
/// accepts: tables become an array of row records, anything else passes
/// through unchanged.
pub(crate) fn normalize(output: TaskOutput) -> Value {
    match output {
        TaskOutput::Table(table) => Value::Array(
            table
                .to_records()
                .into_iter()
                .map(Value::Object)
                .collect(),
        ),
        TaskOutput::Raw(value) => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spec(value: Value) -> ComponentSpec {
        serde_json::from_value(value).unwrap()
    }

    struct Echo;

    impl TaskExecutor for Echo {
        fn execute(&self, task: &str, params: &Params) -> TaskResult<TaskOutput> {
            match task {
                "table" => {
                    let mut table = DataTable::new(["key", "value"]);
                    table.push_row(vec![json!("a"), json!(1)]);
                    Ok(table.into())
                }
                _ => Ok(json!({ "params": params.len() }).into()),
            }
        }
    }

    #[test]
    fn test_table_results_normalize_to_records() {
        let loader = DataLoader::new(Some(Arc::new(Echo)));
        let spec = spec(json!({ "type": "chart", "subType": "bar", "task": "table" }));
        let data = loader.load(&spec, &Params::new()).unwrap();
        assert_eq!(data, json!([{ "key": "a", "value": 1 }]));
    }

    #[test]
    fn test_raw_results_pass_through() {
        let loader = DataLoader::new(Some(Arc::new(Echo)));
        let spec = spec(json!({ "type": "widget", "task": "raw" }));
        let data = loader.load(&spec, &Params::new()).unwrap();
        assert_eq!(data, json!({ "params": 0 }));
    }

    #[test]
    fn test_taskless_component_reads_data_param() {
        let loader = DataLoader::new(None);
        let spec = spec(json!({ "type": "widget" }));

        let mut params = Params::new();
        params.insert("data".into(), json!([1, 2, 3]));
        assert_eq!(loader.load(&spec, &params).unwrap(), json!([1, 2, 3]));

        // Defaults to an empty sequence when upstream supplied nothing.
        assert_eq!(loader.load(&spec, &Params::new()).unwrap(), json!([]));
    }
}
