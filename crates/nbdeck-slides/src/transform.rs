//! Turning a parsed page into a presentation.

use nbdeck_common::warning::status;
use nbdeck_dom::{DomTree, NodeId, outer_html};
use nbdeck_html::parse_document;

use crate::builder::{Deck, DeckBuilder};
use crate::cell::group_cells;
use crate::config::DeckConfig;
use crate::content::flatten_content;
use crate::error::DeckError;
use crate::present::{Presentation, PresentationLibrary};

/// The first element child of the content root element.
///
/// # Errors
///
/// Returns [`DeckError::MissingRoot`] if there is no element with the
/// configured id, or it has no element child.
pub fn content_root(tree: &DomTree, config: &DeckConfig) -> Result<NodeId, DeckError> {
    tree.get_element_by_id(&config.content_root_id)
        .and_then(|main| tree.element_children(main).next())
        .ok_or_else(|| DeckError::MissingRoot {
            id: config.content_root_id.clone(),
        })
}

/// Restructure the page into a slide deck and start the presentation.
///
/// The steps run in a fixed order:
/// 1. find the container to hide and the content root,
/// 2. flatten the content, group it into cells and build the deck,
/// 3. mount the deck at the end of `<body>`,
/// 4. hide the original container with `display: none`,
/// 5. construct and initialize the presentation library on `.reveal`.
///
/// # Errors
///
/// Returns [`DeckError::MissingContainer`], [`DeckError::MissingRoot`] or
/// [`DeckError::MissingBody`] if the page doesn't have the expected shape,
/// [`DeckError::MalformedMetadata`] for a bad cell marker, and
/// [`DeckError::PresentationUnavailable`] if the library can't be started.
/// Lookup and metadata errors are raised before the tree is modified.
pub fn present_document<L: PresentationLibrary>(
    tree: &mut DomTree,
    config: &DeckConfig,
    library: &L,
) -> Result<Deck, DeckError> {
    status("Transform", "starting presentation...");

    let container = tree
        .first_element_with_class(&config.hidden_container_class)
        .ok_or_else(|| DeckError::MissingContainer {
            class: config.hidden_container_class.clone(),
        })?;
    let main = content_root(tree, config)?;
    let body = tree.body().ok_or(DeckError::MissingBody)?;

    let content = flatten_content(tree, main);
    let mut cells = group_cells(tree, &content)?;

    let mut builder = DeckBuilder::new(tree);
    builder.push_cells(&mut cells);
    let deck = builder.finish();

    tree.append_child(body, deck.root);
    tree.set_style_property(container, "display", "none");

    let presentation = library.construct(tree, deck.reveal, &config.presentation)?;
    presentation.initialize(tree)?;
    Ok(deck)
}

/// Parse an HTML page, present it, and serialize the result.
///
/// # Errors
///
/// Returns any error from [`present_document`].
pub fn convert_html<L: PresentationLibrary>(
    source: &str,
    config: &DeckConfig,
    library: &L,
) -> Result<String, DeckError> {
    let mut tree = parse_document(source);
    let _ = present_document(&mut tree, config, library)?;
    Ok(serialize_document(&tree))
}

/// Serialize the whole document, doctype included.
#[must_use]
pub fn serialize_document(tree: &DomTree) -> String {
    tree.children(NodeId::ROOT)
        .iter()
        .map(|&child| outer_html(tree, child))
        .collect()
}
