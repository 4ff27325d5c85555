//! Flattening the notebook body into a list of content elements.

use nbdeck_dom::{DomTree, NodeId};

/// Tag of the wrapper elements that are unwrapped during flattening.
const WRAPPER_TAG: &str = "section";

fn is_wrapper(tree: &DomTree, id: NodeId) -> bool {
    tree.is_element_named(id, WRAPPER_TAG)
}

/// Collect the content elements under `root` in document order.
///
/// Element children tagged `section` are replaced by their own flattened
/// children, to any depth. Text and comment nodes are not content.
#[must_use]
pub fn flatten_content(tree: &DomTree, root: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    push_flattened_children(tree, root, &mut out);
    out
}

/// Apply the flattening rule to an already collected list of elements.
///
/// Returns the list unchanged when it contains no wrappers.
#[must_use]
pub fn flatten_elements(tree: &DomTree, elements: &[NodeId]) -> Vec<NodeId> {
    let mut out = Vec::with_capacity(elements.len());
    for &id in elements {
        push_flattened(tree, id, &mut out);
    }
    out
}

fn push_flattened_children(tree: &DomTree, parent: NodeId, out: &mut Vec<NodeId>) {
    for child in tree.element_children(parent) {
        push_flattened(tree, child, out);
    }
}

fn push_flattened(tree: &DomTree, id: NodeId, out: &mut Vec<NodeId>) {
    if is_wrapper(tree, id) {
        push_flattened_children(tree, id, out);
    } else {
        out.push(id);
    }
}
