//! Slide deck construction for rendered notebook pages.
//!
//! A rendered notebook page keeps each cell's slideshow metadata in a JSON
//! `<script data-cell-meta>` marker placed before the cell's output. This
//! crate reads those markers and moves the page content into the container
//! hierarchy reveal.js expects:
//!
//! - [`content`]: flatten the page body, unwrapping `section` elements
//! - [`cell`]: group the flat content into cells at each marker
//! - [`builder`]: walk the cells and build slides, subslides, fragments and notes
//! - [`transform`]: mount the deck, hide the original page, start the library
//! - [`present`]: the presentation library seam and its reveal.js implementation
//!
//! # Example
//!
//! ```ignore
//! use nbdeck_slides::{DeckConfig, RevealJs, convert_html};
//!
//! let config = DeckConfig::default();
//! let html = convert_html(&page, &config, &RevealJs::new(config.assets.clone()))?;
//! ```

pub mod builder;
pub mod cell;
pub mod config;
pub mod content;
/// Error type for deck transformations.
pub mod error;
pub mod present;
pub mod transform;

pub use builder::{Deck, DeckBuilder, DeckSummary, build_deck};
pub use cell::{Cell, SlideType, group_cells, is_marker, is_slideshow};
pub use config::{AssetConfig, DeckConfig};
pub use content::{flatten_content, flatten_elements};
pub use error::DeckError;
pub use present::{Presentation, PresentationConfig, PresentationLibrary, RevealDeck, RevealJs};
pub use transform::{content_root, convert_html, present_document, serialize_document};
