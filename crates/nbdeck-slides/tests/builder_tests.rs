//! Tests for the deck builder state machine.

use nbdeck_dom::{DomTree, NodeId};
use nbdeck_slides::{Cell, DeckBuilder, DeckSummary, SlideType, build_deck};
use pretty_assertions::assert_eq;

/// A document with a container of named `<p>` elements standing in for cell
/// content. Returns the tree, the container and the elements.
fn content_tree(names: &[&str]) -> (DomTree, NodeId, Vec<NodeId>) {
    let mut tree = DomTree::new();
    let container = tree.create_element("div");
    tree.append_child(NodeId::ROOT, container);
    let elements = names
        .iter()
        .map(|name| {
            let p = tree.create_element("p");
            tree.set_attribute(p, "id", name);
            tree.append_child(container, p);
            p
        })
        .collect();
    (tree, container, elements)
}

fn cell(slide_type: SlideType, children: &[NodeId]) -> Cell {
    Cell {
        children: children.to_vec(),
        ..Cell::new(slide_type)
    }
}

/// Helper to describe an element as `tag#id.class`
fn describe(tree: &DomTree, id: NodeId) -> String {
    let Some(element) = tree.as_element(id) else {
        return "#text".to_string();
    };
    let mut out = element.tag_name.clone();
    if let Some(element_id) = element.id() {
        out.push('#');
        out.push_str(element_id);
    }
    for class in element.classes() {
        out.push('.');
        out.push_str(class);
    }
    out
}

fn children_of(tree: &DomTree, id: NodeId) -> Vec<String> {
    tree.children(id)
        .iter()
        .map(|&child| describe(tree, child))
        .collect()
}

#[test]
fn test_initial_structure() {
    let mut tree = DomTree::new();
    let builder = DeckBuilder::new(&mut tree);
    assert_eq!(builder.slide_index(), 0);
    assert_eq!(builder.subslide_index(), 0);
    assert_eq!(builder.fragment_target(), builder.current_subslide());
    let deck = builder.finish();

    assert_eq!(children_of(&tree, deck.root), vec!["div.reveal"]);
    assert_eq!(children_of(&tree, deck.reveal), vec!["div.slides"]);
    assert_eq!(children_of(&tree, deck.slides), vec!["section"]);
    let slide = tree.children(deck.slides)[0];
    assert_eq!(children_of(&tree, slide), vec!["section#slide-0-0"]);
    assert_eq!(
        tree.attribute(deck.root, "style"),
        Some("width: 100vw; height: 100vh; position: absolute; left: 0; top: 0;")
    );
    assert_eq!(tree.parent(deck.root), None);
}

#[test]
fn test_full_transition_table() {
    let (mut tree, container, el) = content_tree(&["A", "B", "C", "D", "E", "F"]);
    let mut cells = vec![
        cell(SlideType::Content, &[el[0]]),
        cell(SlideType::Slide, &[el[1]]),
        cell(SlideType::Subslide, &[el[2]]),
        cell(SlideType::Fragment, &[el[3]]),
        cell(SlideType::Notes, &[el[4]]),
        cell(SlideType::Skip, &[el[5]]),
    ];
    let deck = build_deck(&mut tree, &mut cells);

    let slides = tree.children(deck.slides).to_vec();
    assert_eq!(slides.len(), 2);
    assert_eq!(children_of(&tree, slides[0]), vec!["section#slide-0-0"]);
    assert_eq!(
        children_of(&tree, slides[1]),
        vec!["section#slide-1-0", "section#slide-1-1"]
    );

    let s00 = tree.children(slides[0])[0];
    assert_eq!(children_of(&tree, s00), vec!["p#A"]);

    let s10 = tree.children(slides[1])[0];
    assert_eq!(children_of(&tree, s10), vec!["p#B"]);

    let s11 = tree.children(slides[1])[1];
    assert_eq!(
        children_of(&tree, s11),
        vec!["p#C", "div.fragment", "aside.notes"]
    );
    let fragment = tree.children(s11)[1];
    assert_eq!(children_of(&tree, fragment), vec!["p#D"]);
    assert_eq!(cells[3].fragment, Some(fragment));
    let notes = tree.children(s11)[2];
    assert_eq!(children_of(&tree, notes), vec!["p#E"]);

    // F was skipped: still in the original container, not in the deck
    assert_eq!(tree.parent(el[5]), Some(container));
    assert!(!tree.is_descendant_of(el[5], deck.root));
    assert_eq!(children_of(&tree, container), vec!["p#F"]);

    assert_eq!(
        deck.summary,
        DeckSummary {
            slides: 2,
            subslides: 3,
            fragments: 1,
            notes: 1,
            cells: 6,
            placed_elements: 5,
            skipped_elements: 1,
        }
    );
}

#[test]
fn test_first_visible_cell_does_not_open_a_slide() {
    let (mut tree, _, el) = content_tree(&["N", "S", "T", "U"]);
    let mut cells = vec![
        cell(SlideType::Notes, &[el[0]]),
        cell(SlideType::Skip, &[el[1]]),
        cell(SlideType::Slide, &[el[2]]),
        cell(SlideType::Slide, &[el[3]]),
    ];
    let deck = build_deck(&mut tree, &mut cells);

    let slides = tree.children(deck.slides).to_vec();
    assert_eq!(slides.len(), 2);
    let s00 = tree.children(slides[0])[0];
    assert_eq!(children_of(&tree, s00), vec!["aside.notes", "p#T"]);
    let s10 = tree.children(slides[1])[0];
    assert_eq!(describe(&tree, s10), "section#slide-1-0");
    assert_eq!(children_of(&tree, s10), vec!["p#U"]);
}

#[test]
fn test_leading_fragment_is_placed_without_container() {
    let (mut tree, _, el) = content_tree(&["A", "B"]);
    let mut cells = vec![
        cell(SlideType::Fragment, &[el[0]]),
        cell(SlideType::Fragment, &[el[1]]),
    ];
    let deck = build_deck(&mut tree, &mut cells);

    let s00 = tree.children(tree.children(deck.slides)[0])[0];
    assert_eq!(children_of(&tree, s00), vec!["p#A", "div.fragment"]);
    assert_eq!(cells[0].fragment, None);
    assert!(cells[1].fragment.is_some());
    assert_eq!(deck.summary.fragments, 1);
}

#[test]
fn test_content_after_fragment_stays_in_fragment() {
    let (mut tree, _, el) = content_tree(&["A", "B", "C", "D"]);
    let mut cells = vec![
        cell(SlideType::Content, &[el[0]]),
        cell(SlideType::Fragment, &[el[1]]),
        cell(SlideType::Content, &[el[2]]),
        cell(SlideType::Subslide, &[el[3]]),
    ];
    let deck = build_deck(&mut tree, &mut cells);

    let slide = tree.children(deck.slides)[0];
    let s00 = tree.children(slide)[0];
    let fragment = tree.children(s00)[1];
    assert_eq!(children_of(&tree, fragment), vec!["p#B", "p#C"]);
    let s01 = tree.children(slide)[1];
    assert_eq!(describe(&tree, s01), "section#slide-0-1");
    assert_eq!(children_of(&tree, s01), vec!["p#D"]);
}

#[test]
fn test_notes_go_to_subslide_not_fragment() {
    let (mut tree, _, el) = content_tree(&["A", "B", "N"]);
    let mut cells = vec![
        cell(SlideType::Content, &[el[0]]),
        cell(SlideType::Fragment, &[el[1]]),
        cell(SlideType::Notes, &[el[2]]),
    ];
    let deck = build_deck(&mut tree, &mut cells);

    let s00 = tree.children(tree.children(deck.slides)[0])[0];
    assert_eq!(
        children_of(&tree, s00),
        vec!["p#A", "div.fragment", "aside.notes"]
    );
}

#[test]
fn test_subslide_counter_resets_on_new_slide() {
    let (mut tree, _, el) = content_tree(&["A", "B", "C", "D"]);
    let mut builder = DeckBuilder::new(&mut tree);
    builder.push_cell(&mut cell(SlideType::Content, &[el[0]]));
    builder.push_cell(&mut cell(SlideType::Subslide, &[el[1]]));
    assert_eq!((builder.slide_index(), builder.subslide_index()), (0, 1));
    builder.push_cell(&mut cell(SlideType::Slide, &[el[2]]));
    assert_eq!((builder.slide_index(), builder.subslide_index()), (1, 0));
    builder.push_cell(&mut cell(SlideType::Subslide, &[el[3]]));
    assert_eq!((builder.slide_index(), builder.subslide_index()), (1, 1));
    let deck = builder.finish();
    assert_eq!(deck.summary.slides, 2);
    assert_eq!(deck.summary.subslides, 4);
}

#[test]
fn test_multiple_children_keep_order() {
    let (mut tree, _, el) = content_tree(&["A", "B", "C"]);
    let mut cells = vec![cell(SlideType::Content, &el)];
    let deck = build_deck(&mut tree, &mut cells);
    let s00 = tree.children(tree.children(deck.slides)[0])[0];
    assert_eq!(children_of(&tree, s00), vec!["p#A", "p#B", "p#C"]);
}
