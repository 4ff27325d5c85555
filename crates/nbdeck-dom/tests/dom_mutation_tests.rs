//! Tests for DOM tree mutation methods: append_child (move semantics),
//! remove_child, detach, attribute and inline style editing.

use nbdeck_dom::{DomTree, NodeId};

/// Helper to create an element attached to `parent`.
fn append_element(tree: &mut DomTree, parent: NodeId, tag: &str) -> NodeId {
    let id = tree.create_element(tag);
    tree.append_child(parent, id);
    id
}

// ========== append_child ==========

#[test]
fn test_append_child_links_siblings() {
    let mut tree = DomTree::new();
    let parent = append_element(&mut tree, NodeId::ROOT, "div");
    let a = append_element(&mut tree, parent, "a");
    let b = append_element(&mut tree, parent, "b");

    assert_eq!(tree.children(parent), &[a, b]);
    assert_eq!(tree.parent(a), Some(parent));
    assert_eq!(tree.next_sibling(a), Some(b));
    assert_eq!(tree.prev_sibling(b), Some(a));
}

#[test]
fn test_append_child_moves_attached_node() {
    let mut tree = DomTree::new();
    let from = append_element(&mut tree, NodeId::ROOT, "div");
    let to = append_element(&mut tree, NodeId::ROOT, "section");
    let a = append_element(&mut tree, from, "p");
    let b = append_element(&mut tree, from, "p");
    let c = append_element(&mut tree, from, "p");

    tree.append_child(to, b);

    // b left its old parent and the gap closed
    assert_eq!(tree.children(from), &[a, c]);
    assert_eq!(tree.next_sibling(a), Some(c));
    assert_eq!(tree.prev_sibling(c), Some(a));

    assert_eq!(tree.children(to), &[b]);
    assert_eq!(tree.parent(b), Some(to));
    assert_eq!(tree.prev_sibling(b), None);
    assert_eq!(tree.next_sibling(b), None);
}

#[test]
fn test_append_child_moves_subtree() {
    let mut tree = DomTree::new();
    let from = append_element(&mut tree, NodeId::ROOT, "div");
    let to = append_element(&mut tree, NodeId::ROOT, "div");
    let outer = append_element(&mut tree, from, "figure");
    let inner = append_element(&mut tree, outer, "img");

    tree.append_child(to, outer);

    assert!(tree.children(from).is_empty());
    assert_eq!(tree.children(outer), &[inner]);
    assert!(tree.is_descendant_of(inner, to));
}

#[test]
fn test_append_child_to_same_parent_moves_to_end() {
    let mut tree = DomTree::new();
    let parent = append_element(&mut tree, NodeId::ROOT, "div");
    let a = append_element(&mut tree, parent, "a");
    let b = append_element(&mut tree, parent, "b");

    tree.append_child(parent, a);

    assert_eq!(tree.children(parent), &[b, a]);
    assert_eq!(tree.prev_sibling(b), None);
    assert_eq!(tree.next_sibling(b), Some(a));
}

// ========== remove_child / detach ==========

#[test]
fn test_remove_child_middle_of_three() {
    let mut tree = DomTree::new();
    let parent = append_element(&mut tree, NodeId::ROOT, "div");
    let a = append_element(&mut tree, parent, "a");
    let b = append_element(&mut tree, parent, "b");
    let c = append_element(&mut tree, parent, "c");

    tree.remove_child(parent, b);

    assert_eq!(tree.children(parent), &[a, c]);
    assert_eq!(tree.next_sibling(a), Some(c));
    assert_eq!(tree.prev_sibling(c), Some(a));
    assert_eq!(tree.parent(b), None);
    assert!(!tree.is_connected(b));
}

#[test]
fn test_remove_child_wrong_parent_is_noop() {
    let mut tree = DomTree::new();
    let parent = append_element(&mut tree, NodeId::ROOT, "div");
    let other = append_element(&mut tree, NodeId::ROOT, "div");
    let a = append_element(&mut tree, parent, "a");

    tree.remove_child(other, a);

    assert_eq!(tree.parent(a), Some(parent));
}

#[test]
fn test_detach_unattached_is_noop() {
    let mut tree = DomTree::new();
    let lone = tree.create_element("p");
    tree.detach(lone);
    assert_eq!(tree.parent(lone), None);
}

// ========== attributes and style ==========

#[test]
fn test_add_class_appends_once() {
    let mut tree = DomTree::new();
    let div = append_element(&mut tree, NodeId::ROOT, "div");

    tree.add_class(div, "reveal");
    tree.add_class(div, "reveal");
    tree.add_class(div, "dark");

    assert_eq!(tree.attribute(div, "class"), Some("reveal dark"));
}

#[test]
fn test_set_style_property_keeps_other_declarations() {
    let mut tree = DomTree::new();
    let div = append_element(&mut tree, NodeId::ROOT, "div");
    tree.set_attribute(div, "style", "color: red; display:block");

    tree.set_style_property(div, "display", "none");

    assert_eq!(tree.style_property(div, "display").as_deref(), Some("none"));
    assert_eq!(tree.style_property(div, "color").as_deref(), Some("red"));
    assert_eq!(
        tree.attribute(div, "style"),
        Some("color: red; display: none;")
    );
}

#[test]
fn test_set_style_property_on_unstyled_element() {
    let mut tree = DomTree::new();
    let div = append_element(&mut tree, NodeId::ROOT, "div");

    tree.set_style_property(div, "width", "100vw");
    tree.set_style_property(div, "left", "0");

    assert_eq!(tree.attribute(div, "style"), Some("width: 100vw; left: 0;"));
}

#[test]
fn test_set_style_property_keeps_semicolons_inside_values() {
    let mut tree = DomTree::new();
    let div = append_element(&mut tree, NodeId::ROOT, "div");
    tree.set_attribute(
        div,
        "style",
        r#"background: url('data:image/png;base64,AAA'); font-family: "a;b", serif"#,
    );

    tree.set_style_property(div, "display", "none");

    assert_eq!(
        tree.style_property(div, "background").as_deref(),
        Some("url('data:image/png;base64,AAA')")
    );
    assert_eq!(
        tree.attribute(div, "style"),
        Some(
            r#"background: url('data:image/png;base64,AAA'); font-family: "a;b", serif; display: none;"#
        )
    );
}

#[test]
fn test_set_style_property_with_unquoted_data_url() {
    let mut tree = DomTree::new();
    let div = append_element(&mut tree, NodeId::ROOT, "div");
    tree.set_attribute(div, "style", "background:url(data:image/png;base64,AAA)");

    tree.set_style_property(div, "display", "none");

    assert_eq!(
        tree.attribute(div, "style"),
        Some("background: url(data:image/png;base64,AAA); display: none;")
    );
}

#[test]
fn test_text_nodes_ignore_attributes() {
    let mut tree = DomTree::new();
    let text = tree.create_text("hi");
    tree.set_attribute(text, "id", "x");
    assert_eq!(tree.attribute(text, "id"), None);
}
