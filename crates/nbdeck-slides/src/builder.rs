//! Building the slide tree from cells.
//!
//! The deck has a fixed shape:
//!
//! ```text
//! div (full-viewport overlay)
//! └── div.reveal
//!     └── div.slides
//!         └── section                      one per slide
//!             └── section#slide-{s}-{u}    one per subslide
//!                 ├── content elements
//!                 ├── div.fragment         one per fragment cell
//!                 └── aside.notes          one per notes cell
//! ```
//!
//! Cells are walked once. Slide, subslide and fragment cells open new
//! containers, but only after the first visible cell has been placed: the
//! first slide and subslide exist from the start and take everything up to
//! and including that cell.

use core::fmt;

use nbdeck_common::warning::status;
use nbdeck_dom::{DomTree, NodeId};

use crate::cell::{Cell, SlideType};

/// Inline style of the overlay that holds the deck.
const ROOT_STYLE: &[(&str, &str)] = &[
    ("width", "100vw"),
    ("height", "100vh"),
    ("position", "absolute"),
    ("left", "0"),
    ("top", "0"),
];

/// Counts describing a built deck.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeckSummary {
    /// Slide containers.
    pub slides: usize,
    /// Subslide containers, across all slides.
    pub subslides: usize,
    /// Fragment containers.
    pub fragments: usize,
    /// Notes containers.
    pub notes: usize,
    /// Cells processed.
    pub cells: usize,
    /// Content elements moved into the deck.
    pub placed_elements: usize,
    /// Content elements left behind by skip cells.
    pub skipped_elements: usize,
}

impl fmt::Display for DeckSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} slide(s), {} subslide(s), {} fragment(s), {} notes from {} cell(s); \
             {} element(s) placed, {} skipped",
            self.slides,
            self.subslides,
            self.fragments,
            self.notes,
            self.cells,
            self.placed_elements,
            self.skipped_elements
        )
    }
}

/// A built deck, not yet mounted in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deck {
    /// The full-viewport overlay holding everything else.
    pub root: NodeId,
    /// The `.reveal` element the presentation library is pointed at.
    pub reveal: NodeId,
    /// The `.slides` element holding the slide containers.
    pub slides: NodeId,
    /// What went into the deck.
    pub summary: DeckSummary,
}

/// Walks cells and moves their content into a new slide tree.
pub struct DeckBuilder<'a> {
    tree: &'a mut DomTree,
    root: NodeId,
    reveal: NodeId,
    slides: NodeId,

    /// Index of the current slide; -1 before the first slide exists.
    slide_index: i64,
    /// Index of the current subslide within the current slide.
    subslide_index: i64,
    slide: NodeId,
    subslide: NodeId,
    /// Where content cells are placed: the current subslide or fragment.
    fragment_target: NodeId,
    /// Set once the first cell that is neither notes nor skip was placed.
    content_seen: bool,

    summary: DeckSummary,
}

impl<'a> DeckBuilder<'a> {
    /// Create the overlay, `.reveal`, `.slides`, and the first slide and
    /// subslide. The new nodes are detached from the document until mounted.
    pub fn new(tree: &'a mut DomTree) -> Self {
        let root = tree.create_element("div");
        for (property, value) in ROOT_STYLE {
            tree.set_style_property(root, property, value);
        }

        let reveal = tree.create_element("div");
        tree.add_class(reveal, "reveal");
        tree.append_child(root, reveal);

        let slides = tree.create_element("div");
        tree.add_class(slides, "slides");
        tree.append_child(reveal, slides);

        let mut builder = Self {
            tree,
            root,
            reveal,
            slides,
            slide_index: -1,
            subslide_index: -1,
            slide: slides,
            subslide: slides,
            fragment_target: slides,
            content_seen: false,
            summary: DeckSummary::default(),
        };
        builder.new_slide();
        builder.new_subslide();
        builder
    }

    /// Index of the current slide.
    #[must_use]
    pub const fn slide_index(&self) -> i64 {
        self.slide_index
    }

    /// Index of the current subslide within the current slide.
    #[must_use]
    pub const fn subslide_index(&self) -> i64 {
        self.subslide_index
    }

    /// The current subslide container.
    #[must_use]
    pub const fn current_subslide(&self) -> NodeId {
        self.subslide
    }

    /// Where the next content cell would be placed.
    #[must_use]
    pub const fn fragment_target(&self) -> NodeId {
        self.fragment_target
    }

    fn new_slide(&mut self) {
        self.slide_index += 1;
        self.subslide_index = -1;
        let section = self.tree.create_element("section");
        self.tree.append_child(self.slides, section);
        self.slide = section;
        self.summary.slides += 1;
    }

    fn new_subslide(&mut self) {
        self.subslide_index += 1;
        let section = self.tree.create_element("section");
        let id = format!("slide-{}-{}", self.slide_index, self.subslide_index);
        self.tree.set_attribute(section, "id", &id);
        self.tree.append_child(self.slide, section);
        self.subslide = section;
        self.fragment_target = section;
        self.summary.subslides += 1;
    }

    fn new_fragment(&mut self) -> NodeId {
        let fragment = self.tree.create_element("div");
        self.tree.add_class(fragment, "fragment");
        self.tree.append_child(self.subslide, fragment);
        self.fragment_target = fragment;
        self.summary.fragments += 1;
        fragment
    }

    /// Open the containers the cell's type calls for.
    fn transition(&mut self, cell: &mut Cell) {
        if !self.content_seen {
            if cell.slide_type.is_content() {
                self.content_seen = true;
            }
            return;
        }
        match cell.slide_type {
            SlideType::Slide => {
                self.new_slide();
                self.new_subslide();
            }
            SlideType::Subslide => self.new_subslide(),
            SlideType::Fragment => cell.fragment = Some(self.new_fragment()),
            SlideType::Notes | SlideType::Skip | SlideType::Content => {}
        }
    }

    fn move_children(&mut self, children: &[NodeId], target: NodeId) {
        for &child in children {
            self.tree.append_child(target, child);
        }
        self.summary.placed_elements += children.len();
    }

    /// Process one cell: open containers, then move its content.
    pub fn push_cell(&mut self, cell: &mut Cell) {
        self.summary.cells += 1;
        self.transition(cell);

        match cell.slide_type {
            SlideType::Notes => {
                let aside = self.tree.create_element("aside");
                self.tree.add_class(aside, "notes");
                self.move_children(&cell.children, aside);
                self.tree.append_child(self.subslide, aside);
                self.summary.notes += 1;
            }
            // Skipped content stays where it was, inside the hidden container.
            SlideType::Skip => self.summary.skipped_elements += cell.children.len(),
            _ => self.move_children(&cell.children, self.fragment_target),
        }
    }

    /// Process cells in order.
    pub fn push_cells(&mut self, cells: &mut [Cell]) {
        for cell in cells {
            self.push_cell(cell);
        }
    }

    /// Finish building and hand back the deck.
    #[must_use]
    pub fn finish(self) -> Deck {
        status("Deck", &self.summary.to_string());
        Deck {
            root: self.root,
            reveal: self.reveal,
            slides: self.slides,
            summary: self.summary,
        }
    }
}

/// Build a deck from cells in one call.
pub fn build_deck(tree: &mut DomTree, cells: &mut [Cell]) -> Deck {
    let mut builder = DeckBuilder::new(tree);
    builder.push_cells(cells);
    builder.finish()
}
