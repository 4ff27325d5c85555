//! Integration tests for the HTML parser.

use nbdeck_dom::{DomTree, NodeId, NodeType, outer_html};
use nbdeck_html::{
    HTMLParser, HTMLTokenizer, format_tree, parse_document, parse_document_with_issues,
};
use pretty_assertions::assert_eq;

/// Helper to parse HTML and return the DOM tree
fn parse(html: &str) -> DomTree {
    let mut tokenizer = HTMLTokenizer::new(html.to_string());
    tokenizer.run();
    let parser = HTMLParser::new(tokenizer.into_tokens());
    parser.run()
}

/// Helper to get element by tag name (first match, depth-first)
fn find_element(tree: &DomTree, tag: &str) -> Option<NodeId> {
    tree.descendants(NodeId::ROOT)
        .find(|&id| tree.is_element_named(id, tag))
}

/// Helper to serialize the body element
fn body_html(tree: &DomTree) -> String {
    tree.body().map(|body| outer_html(tree, body)).unwrap_or_default()
}

#[test]
fn test_document_structure() {
    let tree = parse("<!DOCTYPE html><html><head></head><body></body></html>");

    let children = tree.children(NodeId::ROOT);
    assert_eq!(children.len(), 2);
    assert!(matches!(
        tree.get(children[0]).map(|n| &n.node_type),
        Some(NodeType::Doctype(name)) if name == "html"
    ));

    let html = tree.document_element().expect("html element");
    assert!(tree.is_element_named(html, "html"));
    assert!(tree.head().is_some());
    assert!(tree.body().is_some());
}

#[test]
fn test_implied_html_head_body() {
    let tree = parse_document("<p>Hello</p>");
    let html = tree.document_element().expect("html element");
    let names: Vec<&str> = tree
        .element_children(html)
        .filter_map(|id| tree.as_element(id).map(|e| e.tag_name.as_str()))
        .collect();
    assert_eq!(names, vec!["head", "body"]);
    assert_eq!(body_html(&tree), "<body><p>Hello</p></body>");
}

#[test]
fn test_head_content_goes_to_head() {
    let tree = parse_document(
        "<html><head><title>T</title><link rel=stylesheet href=a.css><script src=x.js></script></head><body></body></html>",
    );
    let head = tree.head().expect("head");
    let names: Vec<&str> = tree
        .element_children(head)
        .filter_map(|id| tree.as_element(id).map(|e| e.tag_name.as_str()))
        .collect();
    assert_eq!(names, vec!["title", "link", "script"]);
    let title = find_element(&tree, "title").expect("title");
    assert_eq!(tree.text_content(title), "T");
}

#[test]
fn test_text_nodes_are_merged() {
    let tree = parse_document("<div>a &amp; b</div>");
    let div = find_element(&tree, "div").expect("div");
    assert_eq!(tree.children(div).len(), 1);
    assert_eq!(tree.text_content(div), "a & b");
}

#[test]
fn test_comment_nodes() {
    let tree = parse_document("<!-- top --><body><!-- inner --></body>");
    let first = tree.children(NodeId::ROOT)[0];
    assert!(matches!(
        tree.get(first).map(|n| &n.node_type),
        Some(NodeType::Comment(data)) if data == " top "
    ));
    assert_eq!(body_html(&tree), "<body><!-- inner --></body>");
}

#[test]
fn test_void_elements_have_no_children() {
    let tree = parse_document("<body><img src=a.png><br><p>after</p></body>");
    let img = find_element(&tree, "img").expect("img");
    assert!(tree.children(img).is_empty());
    assert_eq!(
        body_html(&tree),
        r#"<body><img src="a.png"><br><p>after</p></body>"#
    );
}

#[test]
fn test_block_start_tag_closes_paragraph() {
    let tree = parse_document("<body><p>one<div>two</div></body>");
    assert_eq!(body_html(&tree), "<body><p>one</p><div>two</div></body>");
}

#[test]
fn test_list_items_auto_close() {
    let tree = parse_document("<ul><li>a<li>b</ul>");
    assert_eq!(body_html(&tree), "<body><ul><li>a</li><li>b</li></ul></body>");
}

#[test]
fn test_table_cells_auto_close() {
    let tree = parse_document("<table><tr><td>a<td>b<tr><td>c</table>");
    assert_eq!(
        body_html(&tree),
        "<body><table><tr><td>a</td><td>b</td></tr><tr><td>c</td></tr></table></body>"
    );
}

#[test]
fn test_unclosed_inline_closed_by_block_end() {
    let tree = parse_document("<div><span>x</div><p>y</p>");
    assert_eq!(
        body_html(&tree),
        "<body><div><span>x</span></div><p>y</p></body>"
    );
}

#[test]
fn test_stray_end_tag_is_ignored() {
    let (tree, issues) = parse_document_with_issues("<div>x</span></div>");
    assert_eq!(body_html(&tree), "<body><div>x</div></body>");
    assert!(!issues.is_empty());
}

#[test]
fn test_stray_paragraph_end_tag_inserts_empty_paragraph() {
    let tree = parse_document("<body></p></body>");
    assert_eq!(body_html(&tree), "<body><p></p></body>");
}

#[test]
fn test_script_contents_preserved() {
    let json = r#"{"slideshow": {"slide_type": "slide"}}"#;
    let html = format!(r#"<body><script type="application/json" data-cell-meta>{json}</script><p>x</p></body>"#);
    let tree = parse_document(&html);
    let script = find_element(&tree, "script").expect("script");
    assert_eq!(tree.text_content(script), json);
    assert_eq!(tree.parent(script), tree.body());
    assert!(find_element(&tree, "p").is_some_and(|p| tree.parent(p) == tree.body()));
}

#[test]
fn test_sections_nest() {
    let tree = parse_document(
        r#"<div id="main-content"><section id="a"><h1>A</h1><section id="b"><p>B</p></section></section></div>"#,
    );
    let a = tree.get_element_by_id("a").expect("a");
    let b = tree.get_element_by_id("b").expect("b");
    assert_eq!(tree.parent(b), Some(a));
}

#[test]
fn test_svg_self_closing_children() {
    let tree = parse_document(r#"<div><svg><path d="M0"/><circle r="1"/></svg>after</div>"#);
    let svg = find_element(&tree, "svg").expect("svg");
    assert_eq!(tree.element_children(svg).count(), 2);
    let div = find_element(&tree, "div").expect("div");
    assert_eq!(tree.text_content(div), "after");
}

#[test]
fn test_content_after_body_is_reparented() {
    let tree = parse_document("<body><p>a</p></body><div>late</div>");
    assert_eq!(body_html(&tree), "<body><p>a</p><div>late</div></body>");
}

#[test]
fn test_format_tree() {
    let tree = parse_document("<!DOCTYPE html><p class=x>a b</p>");
    let dump = format_tree(&tree, NodeId::ROOT);
    let expected = "\
Document
  <!DOCTYPE html>
  <html>
    <head>
    <body>
      <p class=\"x\">
        \"a\u{00B7}b\"
";
    assert_eq!(dump, expected);
}

#[test]
fn test_formatting_reopened_in_next_paragraph() {
    let tree = parse_document("<p>one <b>bold<p>two</b>");
    assert_eq!(
        body_html(&tree),
        "<body><p>one <b>bold</b></p><p><b>two</b></p></body>"
    );
}

#[test]
fn test_misnested_formatting_end_tag_moves_block() {
    let (tree, issues) = parse_document_with_issues("<b>1<p>2</b>3</p>");
    assert_eq!(body_html(&tree), "<body><b>1</b><p><b>2</b>3</p></body>");
    assert!(issues.iter().any(|issue| issue.message.contains("</b>")));
}

#[test]
fn test_formatting_does_not_leak_across_cells() {
    let tree = parse_document("<table><tr><td><b>x</td><td>y</td></tr></table>");
    assert_eq!(
        body_html(&tree),
        "<body><table><tr><td><b>x</b></td><td>y</td></tr></table></body>"
    );
}

#[test]
fn test_nested_anchor_closes_outer_anchor() {
    let tree = parse_document(r#"<a href="1">x<a href="2">y</a>"#);
    assert_eq!(
        body_html(&tree),
        r#"<body><a href="1">x</a><a href="2">y</a></body>"#
    );
}

#[test]
fn test_named_references_serialize_as_characters() {
    let tree = parse_document(r#"<p id="t">caf&eacute; &theta; &rArr; &check;</p>"#);
    let p = tree.get_element_by_id("t").expect("p");
    assert_eq!(
        outer_html(&tree, p),
        "<p id=\"t\">caf\u{00E9} \u{03B8} \u{21D2} \u{2713}</p>"
    );
}
