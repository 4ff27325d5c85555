//! Deck configuration.
//!
//! Every field has a default matching the rendered notebook theme, so an
//! empty JSON object (or no file at all) is a valid configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DeckError;
use crate::present::PresentationConfig;

/// Where to find the page content and how to wire the presentation library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeckConfig {
    /// Id of the element whose first element child holds the notebook body.
    pub content_root_id: String,
    /// Class of the page container hidden once the deck is mounted.
    pub hidden_container_class: String,
    /// Options handed to the presentation library's constructor.
    pub presentation: PresentationConfig,
    /// Stylesheets and scripts injected into the page head.
    pub assets: AssetConfig,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            content_root_id: "main-content".to_string(),
            hidden_container_class: "container-xl".to_string(),
            presentation: PresentationConfig::default(),
            assets: AssetConfig::default(),
        }
    }
}

/// Static assets the presentation library needs on the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// `href`s of `<link rel="stylesheet">` elements, in load order.
    pub stylesheets: Vec<String>,
    /// `src`s of `<script>` elements, in load order.
    pub scripts: Vec<String>,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            stylesheets: vec![
                "_static/vendor/reveal.css".to_string(),
                "_static/vendor/simple.css".to_string(),
                "_static/fix-theme.css".to_string(),
            ],
            scripts: vec!["_static/vendor/reveal.js".to_string()],
        }
    }
}

impl DeckConfig {
    /// Parse a configuration from JSON text. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns the JSON error if the text is not a valid configuration.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`DeckError::Config`] if the file cannot be read or is not a
    /// valid configuration.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, DeckError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| DeckError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content).map_err(|source| DeckError::Config {
            path: path.to_path_buf(),
            source: source.into(),
        })
    }
}
