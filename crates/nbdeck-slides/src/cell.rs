//! Grouping flattened content into notebook cells.
//!
//! Each notebook cell is rendered as a marker followed by the cell's output
//! elements. A marker looks like:
//!
//! ```html
//! <script type="application/json" data-cell-meta="">{"slideshow": {"slide_type": "slide"}}</script>
//! ```

use serde_json::Value;
use strum_macros::{Display, EnumString};

use nbdeck_common::warning::{status, warn_once};
use nbdeck_dom::{DomTree, NodeId};

use crate::error::DeckError;

/// Attribute that turns a `script` element into a cell marker.
pub const MARKER_ATTRIBUTE: &str = "data-cell-meta";

/// How a cell participates in the deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum SlideType {
    /// Starts a new horizontal slide.
    Slide,
    /// Starts a new vertical slide under the current slide.
    Subslide,
    /// Revealed step by step inside the current subslide.
    Fragment,
    /// Speaker notes for the current subslide.
    Notes,
    /// Left out of the deck.
    Skip,
    /// Continues whatever is currently being filled.
    Content,
}

impl SlideType {
    /// Normalize the `slideshow.slide_type` value of a cell marker.
    ///
    /// A missing value, `null`, `""` and `"-"` are plain content. Strings
    /// outside the known set and non-string values are treated as content
    /// too, with a warning.
    #[must_use]
    pub fn from_metadata(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => Self::Content,
            Some(Value::String(s)) if s.is_empty() || s == "-" => Self::Content,
            Some(Value::String(s)) => s.parse().unwrap_or_else(|_| {
                warn_once(
                    "Cells",
                    &format!("unknown slide type '{s}', treating as content"),
                );
                Self::Content
            }),
            Some(other) => {
                warn_once(
                    "Cells",
                    &format!("slide type {other} is not a string, treating as content"),
                );
                Self::Content
            }
        }
    }

    /// Whether a cell of this type counts as visible deck content.
    #[must_use]
    pub const fn is_content(self) -> bool {
        !matches!(self, Self::Notes | Self::Skip)
    }
}

/// A marker and the content elements that follow it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    /// Normalized slide type from the marker metadata.
    pub slide_type: SlideType,
    /// Content elements, in document order.
    pub children: Vec<NodeId>,
    /// The fragment container created for this cell, once the deck is built.
    pub fragment: Option<NodeId>,
}

impl Cell {
    /// An empty cell of the given type.
    #[must_use]
    pub const fn new(slide_type: SlideType) -> Self {
        Self {
            slide_type,
            children: Vec::new(),
            fragment: None,
        }
    }
}

/// Returns true if `id` is a `<script>` carrying the cell marker attribute.
#[must_use]
pub fn is_marker(tree: &DomTree, id: NodeId) -> bool {
    tree.as_element(id)
        .is_some_and(|element| element.is("script") && element.has_attribute(MARKER_ATTRIBUTE))
}

/// Parse the JSON text of a marker.
///
/// # Errors
///
/// Returns [`DeckError::MalformedMetadata`] if the text is not valid JSON.
pub fn marker_metadata(tree: &DomTree, marker: NodeId) -> Result<Value, DeckError> {
    serde_json::from_str(&tree.text_content(marker))
        .map_err(|source| DeckError::MalformedMetadata { source })
}

/// Partition a flat element list into cells.
///
/// Every marker opens a new cell; the elements after it, up to the next
/// marker, become its children. Elements before the first marker belong to
/// no cell and are discarded.
///
/// # Errors
///
/// Returns [`DeckError::MalformedMetadata`] for the first marker whose text is
/// not valid JSON. No cells are returned in that case.
pub fn group_cells(tree: &DomTree, elements: &[NodeId]) -> Result<Vec<Cell>, DeckError> {
    let mut cells: Vec<Cell> = Vec::new();
    let mut discarded = 0usize;

    for &id in elements {
        if is_marker(tree, id) {
            let meta = marker_metadata(tree, id)?;
            let slide_type = meta.get("slideshow").and_then(|s| s.get("slide_type"));
            cells.push(Cell::new(SlideType::from_metadata(slide_type)));
        } else if let Some(cell) = cells.last_mut() {
            cell.children.push(id);
        } else {
            discarded += 1;
        }
    }

    if discarded > 0 {
        status(
            "Cells",
            &format!("discarded {discarded} element(s) before the first cell marker"),
        );
    }
    Ok(cells)
}

/// Returns true if the page was exported with slideshow metadata: at least
/// one marker's JSON object carries a top-level `slideshow` key.
///
/// # Errors
///
/// Returns [`DeckError::MalformedMetadata`] if a marker's text is not valid JSON.
pub fn is_slideshow(tree: &DomTree, elements: &[NodeId]) -> Result<bool, DeckError> {
    for &id in elements {
        if is_marker(tree, id) && marker_metadata(tree, id)?.get("slideshow").is_some() {
            return Ok(true);
        }
    }
    Ok(false)
}
