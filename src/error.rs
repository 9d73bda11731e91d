use thiserror::Error;

use crate::document::ComponentKind;

/// Result type for userland code: task executors, rendering adapters and
/// converters all report failures through `anyhow`.
pub type TaskResult<T> = anyhow::Result<T, anyhow::Error>;

/// Fatal configuration errors detected while sealing a [`Blueprint`].
///
/// Every variant corresponds to a document invariant; none of these can occur
/// after construction succeeded.
///
/// [`Blueprint`]: crate::Blueprint
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("dashboard document was not provided")]
    MissingDocument,

    #[error("component '{0}' of type 'store' must declare a task")]
    StoreWithoutTask(String),

    #[error("component '{component}' of type '{kind}' must declare a subType")]
    MissingSubtype {
        component: String,
        kind: ComponentKind,
    },

    #[error("store component '{0}' cannot be rendered from the layout")]
    StoreInLayout(String),

    #[error("subscription references unknown component '{0}'")]
    UnknownComponent(String),

    #[error("component '{0}' subscribes to its own output")]
    SelfSubscription(String),

    #[error("subscription graph contains a cycle through component '{0}'")]
    SubscriptionCycle(String),

    #[error("no renderer registered for {kind} '{subtype}' (component '{component}')")]
    UnknownRenderer {
        component: String,
        kind: ComponentKind,
        subtype: String,
    },

    #[error("unknown converter '{0}'")]
    UnknownConverter(String),

    #[error("component '{0}' declares a task, but no task executor is configured")]
    MissingExecutor(String),
}

/// Top-level error returned while constructing a [`Dashboard`].
///
/// [`Dashboard`]: crate::Dashboard
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Couldn't parse the dashboard document.\n{0}")]
    Document(#[from] serde_json::Error),

    #[error("Component '{0}': {1}")]
    Component(String, anyhow::Error),

    #[error("Layout: {0}")]
    Layout(anyhow::Error),
}
