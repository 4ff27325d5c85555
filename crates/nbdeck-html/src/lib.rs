//! HTML tokenizer and parser for nbdeck.
//!
//! # Scope
//!
//! This crate implements enough of the WHATWG parsing algorithm to load
//! rendered notebook pages into a [`DomTree`]:
//! - **HTML Tokenizer** ([WHATWG § 13.2.5](https://html.spec.whatwg.org/multipage/parsing.html#tokenization))
//!   - Data, RCDATA and RAWTEXT states (script and style bodies are raw text)
//!   - Tags, attributes, comments, DOCTYPE and character references
//!
//! - **HTML Parser / Tree Builder** ([WHATWG § 13.2.6](https://html.spec.whatwg.org/multipage/parsing.html#tree-construction))
//!   - Insertion modes: Initial, BeforeHtml, BeforeHead, InHead, AfterHead, InBody, Text, AfterBody
//!   - Implied `html`/`head`/`body`, implied `</p>`, list item and table cell auto-closing
//!
//! # Not Yet Implemented
//!
//! - Script data escape states
//! - Table insertion modes and foster parenting
//! - Adoption agency algorithm
//! - Namespaces for foreign content

/// HTML parser and tree construction.
pub mod parser;
/// HTML tokenizer for converting input into tokens.
pub mod tokenizer;
/// Human-readable tree dumps for debugging.
pub mod tree_dump;

pub use parser::{HTMLParser, InsertionMode, ParseIssue};
pub use tokenizer::{Attribute, HTMLTokenizer, Token};
pub use tree_dump::{format_tree, print_tree};

use nbdeck_dom::DomTree;

/// Tokenize and parse a complete HTML document.
#[must_use]
pub fn parse_document(html: &str) -> DomTree {
    parse_document_with_issues(html).0
}

/// Tokenize and parse a complete HTML document, also returning the tree
/// construction issues that were recovered from.
#[must_use]
pub fn parse_document_with_issues(html: &str) -> (DomTree, Vec<ParseIssue>) {
    let mut tokenizer = HTMLTokenizer::new(html.to_string());
    tokenizer.run();
    HTMLParser::new(tokenizer.into_tokens()).run_with_issues()
}
