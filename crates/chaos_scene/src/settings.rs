//! Scene configuration.
//!
//! ```rust,ignore
//! use chaos_scene::SceneSettings;
//!
//! let settings = SceneSettings {
//!     script_slice: 4,
//!     ..Default::default()
//! };
//!
//! // or from a JSON config file, missing fields fall back to defaults
//! let settings = SceneSettings::from_json(r#"{ "root_tag": "stage" }"#)?;
//! ```

use chaos_core::errors::Result;
use serde::{Deserialize, Serialize};

/// Tunables of a [`Scene`](crate::Scene) and its update pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneSettings {
    /// Budget handed to each script slice.
    pub script_slice: u32,
    /// Log node destruction at debug level.
    pub log_lifecycle: bool,
    /// Tag of the root node created with the scene.
    pub root_tag: String,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            script_slice: 1,
            log_lifecycle: cfg!(debug_assertions),
            root_tag: "root".to_owned(),
        }
    }
}

impl SceneSettings {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
