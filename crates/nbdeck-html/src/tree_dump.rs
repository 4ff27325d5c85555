use core::fmt::Write;

use nbdeck_dom::{DomTree, NodeId, NodeType};

/// Render the subtree at `id` as an indented outline, one node per line.
///
/// Text nodes show newlines as `\n` and spaces as `·` so whitespace-only
/// nodes stay visible.
#[must_use]
pub fn format_tree(tree: &DomTree, id: NodeId) -> String {
    let mut out = String::new();
    write_node(tree, id, 0, &mut out);
    out
}

/// Print the subtree at `id` to stdout, starting at the given indent level.
pub fn print_tree(tree: &DomTree, id: NodeId, indent: usize) {
    let mut out = String::new();
    write_node(tree, id, indent, &mut out);
    print!("{out}");
}

fn write_node(tree: &DomTree, id: NodeId, indent: usize, out: &mut String) {
    let Some(node) = tree.get(id) else {
        return;
    };
    let prefix = "  ".repeat(indent);
    let _ = match &node.node_type {
        NodeType::Document => writeln!(out, "{prefix}Document"),
        NodeType::Doctype(name) => writeln!(out, "{prefix}<!DOCTYPE {name}>"),
        NodeType::Element(data) if data.attrs.is_empty() => {
            writeln!(out, "{prefix}<{}>", data.tag_name)
        }
        NodeType::Element(data) => {
            let attrs: Vec<String> = data
                .attrs
                .iter()
                .map(|(k, v)| {
                    if v.is_empty() {
                        k.clone()
                    } else {
                        format!("{k}=\"{v}\"")
                    }
                })
                .collect();
            writeln!(out, "{prefix}<{} {}>", data.tag_name, attrs.join(" "))
        }
        NodeType::Text(data) => {
            let display = data.replace('\n', "\\n").replace(' ', "\u{00B7}");
            writeln!(out, "{prefix}\"{display}\"")
        }
        NodeType::Comment(data) => writeln!(out, "{prefix}<!-- {data} -->"),
    };
    for &child in tree.children(id) {
        write_node(tree, child, indent + 1, out);
    }
}
