//! Configuration.
//!
//! Load allocation settings from TOML to change weighting, objective
//! semantics and search budgets without code changes.
//!
//! ```
//! use u_response::config::AllocationConfig;
//! use u_response::models::ObjectiveMode;
//!
//! let config = AllocationConfig::from_toml_str(r#"
//!     [emergency]
//!     weighting_base = 3
//!     objective = "cumulative"
//!
//!     [search]
//!     node_limit = 5000
//! "#).unwrap();
//!
//! assert_eq!(config.emergency.weighting_base, Some(3));
//! assert_eq!(config.emergency.objective, ObjectiveMode::Cumulative);
//! assert!(config.emergency.auto_select_home);
//! assert_eq!(config.search.node_limit, 5000);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::models::ObjectiveMode;

/// Default expansion budget for search solvers.
pub const DEFAULT_NODE_LIMIT: usize = 1_000_000;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct AllocationConfig {
    #[serde(default)]
    pub emergency: EmergencyConfig,

    #[serde(default)]
    pub search: SearchConfig,
}

impl AllocationConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<()> {
        if self.emergency.weighting_base == Some(0) {
            return Err(ModelError::Config(
                "emergency.weighting_base must be at least 1".into(),
            ));
        }
        if self.search.node_limit == 0 {
            return Err(ModelError::Config(
                "search.node_limit must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Emergency model settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EmergencyConfig {
    /// Exponential base of the distance weighting.
    ///
    /// `None` reuses the number of roles as the base.
    #[serde(default)]
    pub weighting_base: Option<u64>,

    /// How `select` updates the objective fluent.
    #[serde(default)]
    pub objective: ObjectiveMode,

    /// Operators at location 0 start selected.
    #[serde(default = "default_true")]
    pub auto_select_home: bool,
}

impl Default for EmergencyConfig {
    fn default() -> Self {
        Self {
            weighting_base: None,
            objective: ObjectiveMode::Maximum,
            auto_select_home: true,
        }
    }
}

/// Search solver settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Expanded nodes after which a search gives up as inconclusive.
    #[serde(default = "default_node_limit")]
    pub node_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            node_limit: DEFAULT_NODE_LIMIT,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_node_limit() -> usize {
    DEFAULT_NODE_LIMIT
}
