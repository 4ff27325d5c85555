//! Integration tests for the HTML tokenizer.

use nbdeck_html::{HTMLTokenizer, Token};
use pretty_assertions::assert_eq;

/// Helper to tokenize a string and return the tokens
fn tokenize(input: &str) -> Vec<Token> {
    let mut tokenizer = HTMLTokenizer::new(input.to_string());
    tokenizer.run();
    tokenizer.into_tokens()
}

/// Helper to collect the character tokens into a string
fn text_of(tokens: &[Token]) -> String {
    tokens
        .iter()
        .filter_map(|token| match token {
            Token::Character { data } => Some(*data),
            _ => None,
        })
        .collect()
}

#[test]
fn test_plain_text() {
    let tokens = tokenize("Hello");
    assert_eq!(tokens.len(), 6); // 5 chars + EOF
    assert!(matches!(tokens[0], Token::Character { data: 'H' }));
    assert!(matches!(tokens[4], Token::Character { data: 'o' }));
    assert!(matches!(tokens[5], Token::EndOfFile));
}

#[test]
fn test_doctype() {
    let tokens = tokenize("<!DOCTYPE html>");
    assert_eq!(tokens.len(), 2);
    match &tokens[0] {
        Token::Doctype { name, force_quirks } => {
            assert_eq!(name.as_deref(), Some("html"));
            assert!(!force_quirks);
        }
        _ => panic!("Expected DOCTYPE token"),
    }
}

#[test]
fn test_lowercase_doctype_with_identifiers() {
    let tokens = tokenize(r#"<!doctype HTML PUBLIC "-//W3C//DTD HTML 4.01//EN">"#);
    assert_eq!(tokens.len(), 2);
    assert!(matches!(&tokens[0], Token::Doctype { name: Some(name), .. } if name == "html"));
}

#[test]
fn test_start_tag_with_attributes() {
    let tokens = tokenize(r#"<div id="main-content" CLASS='a b' hidden data-x=1>"#);
    assert_eq!(tokens.len(), 2);
    match &tokens[0] {
        Token::StartTag {
            name,
            self_closing,
            attributes,
        } => {
            assert_eq!(name, "div");
            assert!(!self_closing);
            let pairs: Vec<(&str, &str)> = attributes
                .iter()
                .map(|a| (a.name.as_str(), a.value.as_str()))
                .collect();
            assert_eq!(
                pairs,
                vec![
                    ("id", "main-content"),
                    ("class", "a b"),
                    ("hidden", ""),
                    ("data-x", "1"),
                ]
            );
        }
        _ => panic!("Expected StartTag token"),
    }
}

#[test]
fn test_end_tag() {
    let tokens = tokenize("</DIV>");
    assert!(tokens[0].is_end_tag("div"));
}

#[test]
fn test_self_closing_tag() {
    let tokens = tokenize("<br/>");
    assert!(matches!(
        &tokens[0],
        Token::StartTag { name, self_closing: true, .. } if name == "br"
    ));
}

#[test]
fn test_duplicate_attribute_keeps_first() {
    let mut tokenizer = HTMLTokenizer::new(r#"<p a="1" a="2">"#.to_string());
    tokenizer.run();
    assert!(tokenizer.errors().contains(&"duplicate-attribute"));
    let tokens = tokenizer.into_tokens();
    match &tokens[0] {
        Token::StartTag { attributes, .. } => {
            assert_eq!(attributes.len(), 1);
            assert_eq!(attributes[0].value, "1");
        }
        _ => panic!("Expected StartTag token"),
    }
}

#[test]
fn test_comment() {
    let tokens = tokenize("<!-- hello -- world -->");
    assert_eq!(tokens[0], Token::new_comment(" hello -- world "));
}

#[test]
fn test_bogus_comment() {
    let tokens = tokenize("<?xml version?>");
    assert_eq!(tokens[0], Token::new_comment("?xml version?"));
}

#[test]
fn test_named_character_references() {
    let tokens = tokenize("a &amp; b &lt;c&gt; &nbsp;&copy &unknown;");
    assert_eq!(text_of(&tokens), "a & b <c> \u{00A0}\u{00A9} &unknown;");
}

#[test]
fn test_named_references_outside_common_set() {
    let tokens = tokenize("caf&eacute; &theta; &rArr; &check; &notin;");
    assert_eq!(
        text_of(&tokens),
        "caf\u{00E9} \u{03B8} \u{21D2} \u{2713} \u{2209}"
    );
}

#[test]
fn test_legacy_references_without_semicolon() {
    let tokens = tokenize("caf&eacute au &Uuml;ber &notit");
    assert_eq!(text_of(&tokens), "caf\u{00E9} au \u{00DC}ber \u{00AC}it");
}

#[test]
fn test_numeric_character_references() {
    let tokens = tokenize("&#65;&#x42;&#0;&#xD800;");
    assert_eq!(text_of(&tokens), "AB\u{FFFD}\u{FFFD}");
}

#[test]
fn test_character_reference_in_attribute() {
    let tokens = tokenize(r#"<a href="?x=1&amp;y=2&copy=3">"#);
    match &tokens[0] {
        Token::StartTag { attributes, .. } => {
            assert_eq!(attributes[0].value, "?x=1&y=2&copy=3");
        }
        _ => panic!("Expected StartTag token"),
    }
}

#[test]
fn test_script_body_is_raw_text() {
    let tokens = tokenize(r#"<script type="application/json">{"a": "<b>&amp;</b>"}</script>"#);
    assert!(tokens[0].is_start_tag("script"));
    assert_eq!(text_of(&tokens), r#"{"a": "<b>&amp;</b>"}"#);
    assert!(tokens[tokens.len() - 2].is_end_tag("script"));
}

#[test]
fn test_title_is_rcdata() {
    let tokens = tokenize("<title>A &amp; <b>B</b></title>");
    assert_eq!(text_of(&tokens), "A & <b>B</b>");
    assert!(tokens[tokens.len() - 2].is_end_tag("title"));
}

#[test]
fn test_raw_text_ignores_other_end_tags() {
    let tokens = tokenize("<style>a</div>b</style>x");
    assert_eq!(text_of(&tokens), "a</div>bx");
}

#[test]
fn test_always_ends_with_single_eof() {
    for input in ["", "<", "<div", "<!--", "<script>x", "&"] {
        let tokens = tokenize(input);
        let eofs = tokens.iter().filter(|t| **t == Token::EndOfFile).count();
        assert_eq!(eofs, 1, "input {input:?}");
        assert_eq!(tokens.last(), Some(&Token::EndOfFile));
    }
}
