//! The seam to the in-browser presentation library.
//!
//! The library itself runs in the reader's browser. Here it is an opaque
//! collaborator that is constructed against the deck's `.reveal` element and
//! then initialized; [`RevealJs`] does that by wiring reveal.js into the page.

use serde::{Deserialize, Serialize};

use nbdeck_common::warning::status;
use nbdeck_dom::{DomTree, NodeId};

use crate::config::AssetConfig;
use crate::error::DeckError;

/// Options passed to the library constructor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresentationConfig {
    /// Whether the slide overview mode is available.
    pub overview: bool,
}

impl PresentationConfig {
    /// Serialize to the compact JSON object literal handed to the library.
    ///
    /// # Errors
    ///
    /// Returns [`DeckError::PresentationUnavailable`] if serialization fails.
    pub fn to_json(&self) -> Result<String, DeckError> {
        serde_json::to_string(self).map_err(|e| DeckError::PresentationUnavailable {
            reason: format!("cannot serialize configuration: {e}"),
        })
    }
}

/// A presentation library that can be pointed at a deck.
pub trait PresentationLibrary {
    /// A constructed, not yet initialized, presentation.
    type Instance: Presentation;

    /// Construct a presentation for the deck mounted at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`DeckError::PresentationUnavailable`] if the library cannot be
    /// used on this page.
    fn construct(
        &self,
        tree: &mut DomTree,
        root: NodeId,
        config: &PresentationConfig,
    ) -> Result<Self::Instance, DeckError>;
}

/// A constructed presentation.
pub trait Presentation {
    /// Start the presentation.
    ///
    /// # Errors
    ///
    /// Returns [`DeckError::PresentationUnavailable`] if the page cannot host it.
    fn initialize(self, tree: &mut DomTree) -> Result<(), DeckError>;
}

/// reveal.js, loaded from the page's static assets.
#[derive(Debug, Clone, Default)]
pub struct RevealJs {
    assets: AssetConfig,
}

impl RevealJs {
    /// Use the given stylesheets and scripts.
    #[must_use]
    pub const fn new(assets: AssetConfig) -> Self {
        Self { assets }
    }

    /// The configured assets.
    #[must_use]
    pub const fn assets(&self) -> &AssetConfig {
        &self.assets
    }
}

impl PresentationLibrary for RevealJs {
    type Instance = RevealDeck;

    fn construct(
        &self,
        tree: &mut DomTree,
        root: NodeId,
        config: &PresentationConfig,
    ) -> Result<RevealDeck, DeckError> {
        if self.assets.scripts.is_empty() {
            return Err(DeckError::PresentationUnavailable {
                reason: "no reveal.js script configured".to_string(),
            });
        }
        if !tree.as_element(root).is_some_and(|e| e.has_class("reveal")) {
            return Err(DeckError::PresentationUnavailable {
                reason: "presentation root is not a .reveal element".to_string(),
            });
        }
        Ok(RevealDeck {
            assets: self.assets.clone(),
            config_json: config.to_json()?,
        })
    }
}

/// A reveal.js presentation waiting to be initialized.
#[derive(Debug, Clone)]
pub struct RevealDeck {
    assets: AssetConfig,
    config_json: String,
}

impl RevealDeck {
    /// The script that constructs and starts reveal.js in the browser.
    #[must_use]
    pub fn init_script(&self) -> String {
        format!(
            "new Reveal(document.querySelector(\".reveal\"), {}).initialize();",
            self.config_json
        )
    }
}

impl Presentation for RevealDeck {
    fn initialize(self, tree: &mut DomTree) -> Result<(), DeckError> {
        let head = tree.head().ok_or_else(|| DeckError::PresentationUnavailable {
            reason: "document has no <head> for the reveal.js assets".to_string(),
        })?;
        let body = tree.body().ok_or(DeckError::MissingBody)?;

        for href in &self.assets.stylesheets {
            if has_element_with(tree, head, "link", "href", href) {
                continue;
            }
            let link = tree.create_element("link");
            tree.set_attribute(link, "rel", "stylesheet");
            tree.set_attribute(link, "href", href);
            tree.append_child(head, link);
        }
        for src in &self.assets.scripts {
            if has_element_with(tree, head, "script", "src", src) {
                continue;
            }
            let script = tree.create_element("script");
            tree.set_attribute(script, "src", src);
            tree.append_child(head, script);
        }

        let init = tree.create_element("script");
        let code = tree.create_text(&self.init_script());
        tree.append_child(init, code);
        tree.append_child(body, init);

        status("Present", "deck mounted, initializing reveal.js");
        Ok(())
    }
}

fn has_element_with(tree: &DomTree, scope: NodeId, tag: &str, attr: &str, value: &str) -> bool {
    tree.elements_by_tag_name(scope, tag)
        .into_iter()
        .any(|id| tree.attribute(id, attr) == Some(value))
}
