//! Framework configuration.
//!
//! Every field has a default, so an empty document is a valid config:
//!
//! ```
//! use spark_vdom::Config;
//!
//! let config = Config::from_toml_str("strict_tags = false").unwrap();
//! assert!(!config.strict_tags);
//! assert_eq!(config.marker_attribute, "__spark_attr__");
//! ```

use serde::{Deserialize, Serialize};

use crate::document::MARKER_ATTRIBUTE;
use crate::error::Result;

/// Options for a [`Vdom`](crate::Vdom) instance and its runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Property that tags framework-owned document nodes.
    #[serde(default = "default_marker_attribute")]
    pub marker_attribute: String,
    /// Reject tags that are neither registered components nor host elements.
    #[serde(default = "default_true")]
    pub strict_tags: bool,
    /// Render `Async` prop updates of mounted components immediately.
    #[serde(default = "default_true")]
    pub sync_component_updates: bool,
    /// Name of the background drain thread.
    #[serde(default = "default_worker_name")]
    pub worker_name: String,
}

fn default_marker_attribute() -> String {
    MARKER_ATTRIBUTE.to_string()
}

fn default_true() -> bool {
    true
}

fn default_worker_name() -> String {
    "spark-vdom-render".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            marker_attribute: default_marker_attribute(),
            strict_tags: true,
            sync_component_updates: true,
            worker_name: default_worker_name(),
        }
    }
}

impl Config {
    /// Parse a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }
}
