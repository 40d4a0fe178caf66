//! Error types for the reconciler, component registry and runtime.

use thiserror::Error;

use crate::engine::ComponentId;
use crate::vnode::NodeKind;

/// Crate-wide result alias.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that stop a render pass or a registration.
///
/// Structural errors (`UnsupportedNode`, `UnknownComponent`) are never
/// retried. The scheduler only renders an instance again if it is marked
/// dirty again.
#[derive(Debug, Error)]
pub enum Error {
    /// A virtual node kind the reconciler cannot place in a document.
    #[error("unsupported virtual node kind: {kind}")]
    UnsupportedNode { kind: NodeKind },

    /// A tag that is neither a registered component nor a host element.
    #[error("unknown component <{tag}>")]
    UnknownComponent { tag: String },

    /// A component constructor reported failure.
    #[error("failed to construct component <{tag}>: {source}")]
    Construction {
        tag: String,
        #[source]
        source: ComponentError,
    },

    /// A component name that collides with a host element tag.
    #[error("component name `{name}` is a reserved element tag")]
    ReservedName { name: String },

    /// A handle to an instance that has been unmounted.
    #[error("component {0} is no longer mounted")]
    StaleComponent(ComponentId),

    /// Invalid configuration document.
    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    /// Failed to start the render worker.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure reported by a component constructor.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ComponentError {
    message: String,
}

impl ComponentError {
    /// Create an error with a human readable message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The message passed to [`ComponentError::new`].
    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = Error::UnknownComponent {
            tag: "widget".into(),
        };
        assert_eq!(err.to_string(), "unknown component <widget>");

        let err = Error::Construction {
            tag: "clock".into(),
            source: ComponentError::new("no timer"),
        };
        assert_eq!(
            err.to_string(),
            "failed to construct component <clock>: no timer"
        );
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_unsupported_node_message() {
        let err = Error::UnsupportedNode {
            kind: NodeKind::Comment,
        };
        assert_eq!(err.to_string(), "unsupported virtual node kind: comment");
    }
}
