//! End-to-end tests for presenting a rendered notebook page.

use std::cell::RefCell;

use nbdeck_dom::{DomTree, NodeId};
use nbdeck_html::parse_document;
use nbdeck_slides::{
    AssetConfig, DeckConfig, DeckError, Presentation, PresentationConfig, PresentationLibrary,
    RevealJs, content_root, convert_html, present_document,
};
use pretty_assertions::assert_eq;

fn marker(slide_type: &str) -> String {
    format!(
        r#"<script type="application/json" data-cell-meta="">{{"slideshow": {{"slide_type": "{slide_type}"}}}}</script>"#
    )
}

/// A rendered notebook page with two slides, a notes cell and a skipped cell.
fn notebook_page() -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Deck</title></head>
<body>
<div class="container-xl" style="margin: 0">
<main id="main-content">
<div>
<section id="intro">{slide}<h1 id="title">Hi</h1>{notes}<p id="note">say hi</p></section>
<section>{slide}<p id="second">Two</p>{skip}<p id="hidden">x</p></section>
</div>
</main>
</div>
</body>
</html>"#,
        slide = marker("slide"),
        notes = marker("notes"),
        skip = marker("skip"),
    )
}

fn element_children(tree: &DomTree, id: NodeId) -> Vec<NodeId> {
    tree.element_children(id).collect()
}

#[test]
fn test_present_document_builds_and_mounts_deck() {
    let mut tree = parse_document(&notebook_page());
    let config = DeckConfig::default();
    let deck = present_document(&mut tree, &config, &RevealJs::default()).expect("presented");

    let body = tree.body().expect("body");
    let mounted: Vec<NodeId> = element_children(&tree, body)
        .into_iter()
        .filter(|&id| id == deck.root)
        .collect();
    assert_eq!(mounted.len(), 1);

    let slides = element_children(&tree, deck.slides);
    assert_eq!(slides.len(), 2);

    let s00 = element_children(&tree, slides[0])[0];
    assert_eq!(tree.attribute(s00, "id"), Some("slide-0-0"));
    let first = element_children(&tree, s00);
    assert_eq!(tree.attribute(first[0], "id"), Some("title"));
    assert!(tree.as_element(first[1]).is_some_and(|e| e.has_class("notes")));
    assert_eq!(tree.text_content(first[1]), "say hi");

    let s10 = element_children(&tree, slides[1])[0];
    assert_eq!(tree.attribute(s10, "id"), Some("slide-1-0"));
    let second = tree.get_element_by_id("second").expect("second");
    assert_eq!(tree.parent(second), Some(s10));

    let hidden = tree.get_element_by_id("hidden").expect("skipped element");
    assert!(!tree.is_descendant_of(hidden, deck.root));

    assert_eq!(deck.summary.slides, 2);
    assert_eq!(deck.summary.notes, 1);
    assert_eq!(deck.summary.skipped_elements, 1);
}

#[test]
fn test_original_container_is_hidden_not_removed() {
    let mut tree = parse_document(&notebook_page());
    let _ = present_document(&mut tree, &DeckConfig::default(), &RevealJs::default())
        .expect("presented");

    let container = tree
        .first_element_with_class("container-xl")
        .expect("container still present");
    assert!(tree.is_connected(container));
    assert_eq!(
        tree.style_property(container, "display"),
        Some("none".to_string())
    );
    assert_eq!(
        tree.attribute(container, "style"),
        Some("margin: 0; display: none;")
    );
}

#[test]
fn test_hiding_keeps_container_style_with_data_url() {
    let page = notebook_page().replace(
        r#"style="margin: 0""#,
        r#"style="background: url('data:image/png;base64,AAA'); color: red""#,
    );
    let html = convert_html(&page, &DeckConfig::default(), &RevealJs::default())
        .expect("converted");

    assert!(html.contains(
        r#"style="background: url('data:image/png;base64,AAA'); color: red; display: none;""#
    ));
}

#[test]
fn test_reveal_assets_and_init_script() {
    let mut tree = parse_document(&notebook_page());
    let _ = present_document(&mut tree, &DeckConfig::default(), &RevealJs::default())
        .expect("presented");

    let head = tree.head().expect("head");
    let hrefs: Vec<&str> = tree
        .elements_by_tag_name(head, "link")
        .into_iter()
        .filter_map(|id| tree.attribute(id, "href"))
        .collect();
    assert_eq!(
        hrefs,
        vec![
            "_static/vendor/reveal.css",
            "_static/vendor/simple.css",
            "_static/fix-theme.css",
        ]
    );
    let srcs: Vec<&str> = tree
        .elements_by_tag_name(head, "script")
        .into_iter()
        .filter_map(|id| tree.attribute(id, "src"))
        .collect();
    assert_eq!(srcs, vec!["_static/vendor/reveal.js"]);

    let body = tree.body().expect("body");
    let last = element_children(&tree, body)
        .last()
        .copied()
        .expect("init script");
    assert_eq!(
        tree.text_content(last),
        r#"new Reveal(document.querySelector(".reveal"), {"overview":false}).initialize();"#
    );
}

#[test]
fn test_existing_assets_are_not_duplicated() {
    let page = notebook_page().replace(
        "<title>Deck</title>",
        r#"<title>Deck</title><link rel="stylesheet" href="_static/vendor/reveal.css"><script src="_static/vendor/reveal.js"></script>"#,
    );
    let mut tree = parse_document(&page);
    let _ = present_document(&mut tree, &DeckConfig::default(), &RevealJs::default())
        .expect("presented");

    let head = tree.head().expect("head");
    assert_eq!(tree.elements_by_tag_name(head, "link").len(), 3);
    assert_eq!(tree.elements_by_tag_name(head, "script").len(), 1);
}

#[test]
fn test_missing_container() {
    let page = notebook_page().replace("container-xl", "container");
    let mut tree = parse_document(&page);
    let nodes = tree.len();
    let err = present_document(&mut tree, &DeckConfig::default(), &RevealJs::default())
        .expect_err("no container");
    assert!(matches!(err, DeckError::MissingContainer { class } if class == "container-xl"));
    assert_eq!(tree.len(), nodes);
}

#[test]
fn test_missing_root() {
    let page = notebook_page().replace("main-content", "other-content");
    let mut tree = parse_document(&page);
    let err = present_document(&mut tree, &DeckConfig::default(), &RevealJs::default())
        .expect_err("no root");
    assert!(matches!(err, DeckError::MissingRoot { id } if id == "main-content"));
}

#[test]
fn test_root_without_element_child() {
    let tree = parse_document(
        r#"<body><div class="container-xl"><main id="main-content">only text</main></div></body>"#,
    );
    let err = content_root(&tree, &DeckConfig::default()).expect_err("no element child");
    assert!(matches!(err, DeckError::MissingRoot { .. }));
}

#[test]
fn test_missing_body() {
    let mut tree = DomTree::new();
    let html = tree.create_element("html");
    let container = tree.create_element("div");
    tree.add_class(container, "container-xl");
    let main = tree.create_element("div");
    tree.set_attribute(main, "id", "main-content");
    let inner = tree.create_element("div");
    tree.append_child(NodeId::ROOT, html);
    tree.append_child(html, container);
    tree.append_child(container, main);
    tree.append_child(main, inner);

    let nodes = tree.len();
    let err = present_document(&mut tree, &DeckConfig::default(), &RevealJs::default())
        .expect_err("no body");
    assert!(matches!(err, DeckError::MissingBody));
    assert_eq!(tree.len(), nodes);
    assert_eq!(tree.attribute(container, "style"), None);
}

#[test]
fn test_malformed_metadata_leaves_page_untouched() {
    let page = notebook_page().replacen(
        r#"{"slideshow": {"slide_type": "notes"}}"#,
        "{broken",
        1,
    );
    let mut tree = parse_document(&page);
    let nodes = tree.len();
    let err = present_document(&mut tree, &DeckConfig::default(), &RevealJs::default())
        .expect_err("malformed");
    assert!(matches!(err, DeckError::MalformedMetadata { .. }));
    assert_eq!(tree.len(), nodes);
    let container = tree.first_element_with_class("container-xl").expect("container");
    assert_eq!(tree.style_property(container, "display"), None);
}

#[test]
fn test_presentation_unavailable_without_script() {
    let mut tree = parse_document(&notebook_page());
    let library = RevealJs::new(AssetConfig {
        scripts: Vec::new(),
        ..AssetConfig::default()
    });
    let err = present_document(&mut tree, &DeckConfig::default(), &library)
        .expect_err("no script");
    assert!(matches!(err, DeckError::PresentationUnavailable { .. }));
}

/// Records what the transformation hands to the library.
#[derive(Default)]
struct RecordingLibrary {
    constructed: RefCell<Option<(NodeId, PresentationConfig)>>,
    initialized: RefCell<bool>,
}

struct RecordingPresentation<'a> {
    library: &'a RecordingLibrary,
}

impl<'a> PresentationLibrary for &'a RecordingLibrary {
    type Instance = RecordingPresentation<'a>;

    fn construct(
        &self,
        _tree: &mut DomTree,
        root: NodeId,
        config: &PresentationConfig,
    ) -> Result<Self::Instance, DeckError> {
        *self.constructed.borrow_mut() = Some((root, *config));
        Ok(RecordingPresentation { library: *self })
    }
}

impl Presentation for RecordingPresentation<'_> {
    fn initialize(self, _tree: &mut DomTree) -> Result<(), DeckError> {
        *self.library.initialized.borrow_mut() = true;
        Ok(())
    }
}

#[test]
fn test_library_is_constructed_on_reveal_element() {
    let mut tree = parse_document(&notebook_page());
    let library = RecordingLibrary::default();
    let mut config = DeckConfig::default();
    config.presentation.overview = true;

    let deck = present_document(&mut tree, &config, &&library).expect("presented");

    let constructed = *library.constructed.borrow();
    assert_eq!(
        constructed,
        Some((deck.reveal, PresentationConfig { overview: true }))
    );
    assert!(tree.as_element(deck.reveal).is_some_and(|e| e.has_class("reveal")));
    assert!(*library.initialized.borrow());
}

#[test]
fn test_custom_root_and_container() {
    let page = r#"<body><div class="page" id="wrap"><div id="nb"><div>
        <script data-cell-meta>{}</script><p id="only">x</p>
    </div></div></div></body>"#;
    let config = DeckConfig::from_json_str(
        r#"{"content_root_id": "nb", "hidden_container_class": "page"}"#,
    )
    .expect("valid config");
    let mut tree = parse_document(page);
    let deck = present_document(&mut tree, &config, &RevealJs::default()).expect("presented");

    let only = tree.get_element_by_id("only").expect("only");
    assert!(tree.is_descendant_of(only, deck.slides));
    let wrap = tree.get_element_by_id("wrap").expect("wrap");
    assert_eq!(tree.style_property(wrap, "display"), Some("none".to_string()));
}

#[test]
fn test_convert_html_serializes_page() {
    let html = convert_html(&notebook_page(), &DeckConfig::default(), &RevealJs::default())
        .expect("converted");
    assert!(html.starts_with("<!DOCTYPE html><html>"));
    assert!(html.contains(r#"<section id="slide-1-0"><p id="second">Two</p></section>"#));
    assert!(html.contains(r#"<aside class="notes"><p id="note">say hi</p></aside>"#));
    assert!(html.contains(
        r#"<script>new Reveal(document.querySelector(".reveal"), {"overview":false}).initialize();</script>"#
    ));
    assert!(html.contains(r#"<div class="container-xl" style="margin: 0; display: none;">"#));
    assert!(html.ends_with("</html>"));
}
