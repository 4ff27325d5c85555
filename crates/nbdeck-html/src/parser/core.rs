use strum_macros::Display;

use nbdeck_common::warning::warn_once;
use nbdeck_dom::{AttributesMap, DomTree, ElementData, NodeId, NodeType};

use crate::tokenizer::{Attribute, Token};

/// [§ 13.2.4.1 The insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-insertion-mode)
///
/// "The insertion mode is a state variable that controls the primary operation
/// of the tree construction stage."
///
/// Table, select, template and frameset modes are folded into [`InBody`](Self::InBody).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum InsertionMode {
    /// [§ 13.2.6.4.1 The "initial" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-initial-insertion-mode)
    Initial,
    /// [§ 13.2.6.4.2 The "before html" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-before-html-insertion-mode)
    BeforeHtml,
    /// [§ 13.2.6.4.3 The "before head" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-before-head-insertion-mode)
    BeforeHead,
    /// [§ 13.2.6.4.4 The "in head" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inhead)
    InHead,
    /// [§ 13.2.6.4.6 The "after head" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-after-head-insertion-mode)
    AfterHead,
    /// [§ 13.2.6.4.7 The "in body" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inbody)
    InBody,
    /// [§ 13.2.6.4.8 The "text" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-incdata)
    Text,
    /// [§ 13.2.6.4.19 The "after body" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-afterbody)
    AfterBody,
}

/// [§ 13.2.2 Parse errors](https://html.spec.whatwg.org/multipage/parsing.html#parse-errors)
///
/// A tree construction problem the parser recovered from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIssue {
    /// Description of the parse error.
    pub message: String,
    /// Index into the token stream where this error was encountered.
    pub token_index: usize,
}

/// Elements that are inserted and immediately popped.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "basefont", "bgsound", "br", "col", "embed", "frame", "hr", "img", "input",
    "keygen", "link", "meta", "param", "source", "track", "wbr",
];

/// Start tags that close an open `p` element in button scope.
const CLOSES_P: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "center",
    "details",
    "dialog",
    "dir",
    "div",
    "dl",
    "fieldset",
    "figcaption",
    "figure",
    "footer",
    "form",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "hgroup",
    "hr",
    "listing",
    "main",
    "menu",
    "nav",
    "ol",
    "p",
    "pre",
    "search",
    "section",
    "summary",
    "table",
    "ul",
    "xmp",
];

/// Head content that is processed "using the rules for the in head insertion
/// mode" wherever it appears.
const HEAD_CONTENT: &[&str] = &[
    "base", "basefont", "bgsound", "link", "meta", "noframes", "script", "style", "template",
    "title",
];

/// Elements whose content the tokenizer delivers as raw text or RCDATA.
const TEXT_ELEMENTS: &[&str] = &[
    "iframe", "noembed", "noframes", "script", "style", "textarea", "title", "xmp",
];

/// Table structure end tags, closed using table scope.
const TABLE_PARTS: &[&str] = &[
    "caption", "colgroup", "table", "tbody", "td", "tfoot", "th", "thead", "tr",
];

/// [§ 13.2.4.2 Has an element in scope](https://html.spec.whatwg.org/multipage/parsing.html#has-an-element-in-the-specific-scope)
const DEFAULT_SCOPE: &[&str] = &[
    "applet",
    "caption",
    "html",
    "table",
    "td",
    "th",
    "marquee",
    "object",
    "template",
    "foreignobject",
    "desc",
    "mi",
    "mo",
    "mn",
    "ms",
    "mtext",
    "annotation-xml",
];

/// "Has an element in table scope": html, table, template.
const TABLE_SCOPE: &[&str] = &["html", "table", "template"];

/// [§ 13.2.6.3 Generate implied end tags](https://html.spec.whatwg.org/multipage/parsing.html#generate-implied-end-tags)
const IMPLIED_END_TAGS: &[&str] = &[
    "dd", "dt", "li", "optgroup", "option", "p", "rb", "rp", "rt", "rtc",
];

/// [§ 13.2.4.3 The list of active formatting elements](https://html.spec.whatwg.org/multipage/parsing.html#list-of-active-formatting-elements)
///
/// "The list contains elements in the formatting category, and markers."
const FORMATTING_ELEMENTS: &[&str] = &[
    "a", "b", "big", "code", "em", "font", "i", "nobr", "s", "small", "strike", "strong", "tt",
    "u",
];

/// Elements that push a marker onto the list of active formatting elements
/// when opened, and clear up to it when closed.
const MARKER_ELEMENTS: &[&str] = &["applet", "marquee", "object", "td", "th"];

/// An entry in the list of active formatting elements.
#[derive(Debug, Clone)]
enum FormattingEntry {
    /// A formatting element, with the tag it was created from so it can be
    /// recreated by reconstruction or the adoption agency.
    Element {
        node: NodeId,
        tag_name: String,
        attributes: Vec<Attribute>,
    },
    /// "A marker is an entry in the list of active formatting elements that is
    /// distinct from any element."
    Marker,
}

/// [§ 13.2.6 Tree construction](https://html.spec.whatwg.org/multipage/parsing.html#tree-construction)
///
/// The HTML parser builds a DOM tree from a stream of tokens.
pub struct HTMLParser {
    /// [§ 13.2.4.1 The insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-insertion-mode)
    insertion_mode: InsertionMode,

    /// [§ 13.2.4.2 The original insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#original-insertion-mode)
    original_insertion_mode: Option<InsertionMode>,

    /// [§ 13.2.4.3 The stack of open elements](https://html.spec.whatwg.org/multipage/parsing.html#the-stack-of-open-elements)
    stack_of_open_elements: Vec<NodeId>,

    /// [§ 13.2.4.3 The list of active formatting elements](https://html.spec.whatwg.org/multipage/parsing.html#list-of-active-formatting-elements)
    active_formatting_elements: Vec<FormattingEntry>,

    /// [§ 13.2.4.4 The element pointers](https://html.spec.whatwg.org/multipage/parsing.html#the-element-pointers)
    head_element_pointer: Option<NodeId>,

    /// `NodeId::ROOT` (index 0) is the Document node.
    tree: DomTree,

    /// Input tokens from the tokenizer.
    tokens: Vec<Token>,

    /// Current position in token stream.
    token_index: usize,

    /// Whether we've stopped parsing.
    stopped: bool,

    /// Parse issues encountered during parsing.
    issues: Vec<ParseIssue>,
}

impl HTMLParser {
    /// Create a new parser from a token stream.
    #[must_use]
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            insertion_mode: InsertionMode::Initial,
            original_insertion_mode: None,
            stack_of_open_elements: Vec::new(),
            active_formatting_elements: Vec::new(),
            head_element_pointer: None,
            tree: DomTree::new(),
            tokens,
            token_index: 0,
            stopped: false,
            issues: Vec::new(),
        }
    }

    /// Get all parse issues encountered so far.
    #[must_use]
    pub fn get_issues(&self) -> &[ParseIssue] {
        &self.issues
    }

    /// Run the parser and return the DOM tree.
    #[must_use]
    pub fn run(self) -> DomTree {
        self.run_with_issues().0
    }

    /// Run the parser and return both the `DomTree` and any parse issues.
    #[must_use]
    pub fn run_with_issues(mut self) -> (DomTree, Vec<ParseIssue>) {
        while !self.stopped && self.token_index < self.tokens.len() {
            let token = self.tokens[self.token_index].clone();
            self.process_token(&token);
            self.token_index += 1;
        }
        (self.tree, self.issues)
    }

    /// Record a recoverable parse error.
    ///
    /// Logs via nbdeck-common's warning system and stores the issue for later retrieval.
    fn parse_warning(&mut self, message: &str) {
        warn_once("HTML Parser", message);
        self.issues.push(ParseIssue {
            message: message.to_string(),
            token_index: self.token_index,
        });
    }

    /// [§ 13.2.6 Tree construction dispatcher](https://html.spec.whatwg.org/multipage/parsing.html#tree-construction-dispatcher)
    fn process_token(&mut self, token: &Token) {
        match self.insertion_mode {
            InsertionMode::Initial => self.handle_initial_mode(token),
            InsertionMode::BeforeHtml => self.handle_before_html_mode(token),
            InsertionMode::BeforeHead => self.handle_before_head_mode(token),
            InsertionMode::InHead => self.handle_in_head_mode(token),
            InsertionMode::AfterHead => self.handle_after_head_mode(token),
            InsertionMode::InBody => self.handle_in_body_mode(token),
            InsertionMode::Text => self.handle_text_mode(token),
            InsertionMode::AfterBody => self.handle_after_body_mode(token),
        }
    }

    /// "Reprocess the token" in the current insertion mode.
    fn reprocess_token(&mut self, token: &Token) {
        self.process_token(token);
    }

    const fn is_whitespace(c: char) -> bool {
        matches!(c, '\t' | '\n' | '\x0C' | '\r' | ' ')
    }

    fn is_whitespace_token(token: &Token) -> bool {
        matches!(token, Token::Character { data } if Self::is_whitespace(*data))
    }

    // =========================================================================
    // Node creation and insertion
    // =========================================================================

    /// "The current node is the bottommost node in this stack of open elements."
    fn current_node(&self) -> Option<NodeId> {
        self.stack_of_open_elements.last().copied()
    }

    /// [§ 13.2.6.1 Appropriate place for inserting a node](https://html.spec.whatwg.org/multipage/parsing.html#appropriate-place-for-inserting-a-node)
    ///
    /// Without foster parenting this is always the end of the current node.
    fn insertion_location(&self) -> NodeId {
        self.current_node().unwrap_or(NodeId::ROOT)
    }

    fn attributes_to_map(attributes: &[Attribute]) -> AttributesMap {
        attributes
            .iter()
            .map(|attr| (attr.name.clone(), attr.value.clone()))
            .collect()
    }

    /// [§ 13.2.6.1 Create an element for the token](https://html.spec.whatwg.org/multipage/parsing.html#create-an-element-for-the-token)
    fn create_element(&mut self, tag_name: &str, attributes: &[Attribute]) -> NodeId {
        self.tree.alloc(NodeType::Element(ElementData {
            tag_name: tag_name.to_string(),
            attrs: Self::attributes_to_map(attributes),
        }))
    }

    /// [§ 13.2.6.1 Insert an HTML element](https://html.spec.whatwg.org/multipage/parsing.html#insert-an-html-element)
    ///
    /// Creates the element, appends it at the insertion location and pushes
    /// it onto the stack of open elements.
    fn insert_html_element(&mut self, tag_name: &str, attributes: &[Attribute]) -> NodeId {
        let parent = self.insertion_location();
        let id = self.create_element(tag_name, attributes);
        self.tree.append_child(parent, id);
        self.stack_of_open_elements.push(id);
        id
    }

    /// Insert an element for a start tag token.
    fn insert_element_for_token(&mut self, token: &Token) -> Option<NodeId> {
        match token {
            Token::StartTag {
                name, attributes, ..
            } => Some(self.insert_html_element(name, attributes)),
            _ => None,
        }
    }

    /// [§ 13.2.6.1 Insert a character](https://html.spec.whatwg.org/multipage/parsing.html#insert-a-character)
    ///
    /// "If there is a Text node immediately before the adjusted insertion
    /// location, then append data to that Text node's data. Otherwise, create
    /// a new Text node whose data is data ... and insert the newly created node
    /// at the adjusted insertion location."
    fn insert_character(&mut self, c: char) {
        let parent = self.insertion_location();
        if parent == NodeId::ROOT {
            // "The Document can't have Text children"
            return;
        }
        if let Some(last) = self.tree.last_child(parent)
            && let Some(node) = self.tree.get_mut(last)
            && let NodeType::Text(ref mut data) = node.node_type
        {
            data.push(c);
            return;
        }
        let text = self.tree.alloc(NodeType::Text(c.to_string()));
        self.tree.append_child(parent, text);
    }

    /// [§ 13.2.6.1 Insert a comment](https://html.spec.whatwg.org/multipage/parsing.html#insert-a-comment)
    fn insert_comment(&mut self, data: &str, parent: NodeId) {
        let comment = self.tree.alloc(NodeType::Comment(data.to_string()));
        self.tree.append_child(parent, comment);
    }

    fn tag_name_of(&self, id: NodeId) -> Option<&str> {
        self.tree.as_element(id).map(|e| e.tag_name.as_str())
    }

    fn current_node_is(&self, tag_name: &str) -> bool {
        self.current_node()
            .and_then(|id| self.tag_name_of(id))
            .is_some_and(|name| name == tag_name)
    }

    /// Pop elements until one with `tag_name` has been popped.
    ///
    /// Popping a cell or an `applet`, `marquee` or `object` element clears the
    /// list of active formatting elements up to the marker it pushed.
    fn pop_until_tag(&mut self, tag_name: &str) {
        while let Some(id) = self.stack_of_open_elements.pop() {
            let name = self.tag_name_of(id);
            let pushed_marker = name.is_some_and(|name| MARKER_ELEMENTS.contains(&name));
            let found = name == Some(tag_name);
            if pushed_marker {
                self.clear_formatting_to_last_marker();
            }
            if found {
                break;
            }
        }
    }

    fn stack_position(&self, id: NodeId) -> Option<usize> {
        self.stack_of_open_elements.iter().position(|&open| open == id)
    }

    /// Copy attributes the element doesn't already have, for repeated
    /// `<html>` and `<body>` start tags.
    fn merge_missing_attributes(&mut self, id: NodeId, attributes: &[Attribute]) {
        if let Some(element) = self.tree.as_element_mut(id) {
            for attribute in attributes {
                let _ = element
                    .attrs
                    .entry(attribute.name.clone())
                    .or_insert_with(|| attribute.value.clone());
            }
        }
    }

    // =========================================================================
    // Scope checks and implied end tags
    // =========================================================================

    /// [§ 13.2.4.2 Has an element in the specific scope](https://html.spec.whatwg.org/multipage/parsing.html#has-an-element-in-the-specific-scope)
    fn has_element_in_specific_scope(&self, tag_name: &str, scope_markers: &[&str]) -> bool {
        for &id in self.stack_of_open_elements.iter().rev() {
            let Some(name) = self.tag_name_of(id) else {
                continue;
            };
            if name == tag_name {
                return true;
            }
            if scope_markers.contains(&name) {
                return false;
            }
        }
        false
    }

    fn has_element_in_scope(&self, tag_name: &str) -> bool {
        self.has_element_in_specific_scope(tag_name, DEFAULT_SCOPE)
    }

    /// "the list of element types above, plus ol, ul" for list item scope.
    fn has_element_in_list_item_scope(&self, tag_name: &str) -> bool {
        let mut markers = DEFAULT_SCOPE.to_vec();
        markers.extend(["ol", "ul"]);
        self.has_element_in_specific_scope(tag_name, &markers)
    }

    /// "the list of element types above, plus button" for button scope.
    fn has_element_in_button_scope(&self, tag_name: &str) -> bool {
        let mut markers = DEFAULT_SCOPE.to_vec();
        markers.push("button");
        self.has_element_in_specific_scope(tag_name, &markers)
    }

    fn has_element_in_table_scope(&self, tag_name: &str) -> bool {
        self.has_element_in_specific_scope(tag_name, TABLE_SCOPE)
    }

    /// [§ 13.2.6.3 Generate implied end tags](https://html.spec.whatwg.org/multipage/parsing.html#generate-implied-end-tags)
    ///
    /// "while the current node is a dd element, a dt element, an li element,
    /// ... a p element ... the UA must pop the current node off the stack of
    /// open elements." If `exclude` is given, that element is left open.
    fn generate_implied_end_tags(&mut self, exclude: Option<&str>) {
        while let Some(id) = self.current_node() {
            let Some(name) = self.tag_name_of(id) else {
                break;
            };
            if Some(name) == exclude || !IMPLIED_END_TAGS.contains(&name) {
                break;
            }
            let _ = self.stack_of_open_elements.pop();
        }
    }

    /// [§ 13.2.6.4.7](https://html.spec.whatwg.org/multipage/parsing.html#close-a-p-element)
    ///
    /// "Generate implied end tags, except for p elements. If the current node
    /// is not a p element, then this is a parse error. Pop elements from the
    /// stack of open elements until a p element has been popped from the stack."
    fn close_p_element(&mut self) {
        self.generate_implied_end_tags(Some("p"));
        if !self.current_node_is("p") {
            self.parse_warning("unexpected element while closing p");
        }
        self.pop_until_tag("p");
    }

    fn close_p_if_in_button_scope(&mut self) {
        if self.has_element_in_button_scope("p") {
            self.close_p_element();
        }
    }

    /// Close an element that is in scope, generating implied end tags first.
    /// Returns false if the element wasn't in scope.
    fn close_element_in_scope(&mut self, tag_name: &str, in_table_scope: bool) -> bool {
        let in_scope = if in_table_scope {
            self.has_element_in_table_scope(tag_name)
        } else {
            self.has_element_in_scope(tag_name)
        };
        if !in_scope {
            return false;
        }
        self.generate_implied_end_tags(Some(tag_name));
        if !self.current_node_is(tag_name) {
            self.parse_warning(&format!("end tag </{tag_name}> closes unclosed children"));
        }
        self.pop_until_tag(tag_name);
        true
    }

    /// True while any open element is an `svg` or `math` root.
    fn in_foreign_content(&self) -> bool {
        self.stack_of_open_elements
            .iter()
            .any(|&id| matches!(self.tag_name_of(id), Some("svg" | "math")))
    }

    /// [§ 13.2.6.4.7](https://html.spec.whatwg.org/multipage/parsing.html#special)
    ///
    /// Elements in the special category stop the "any other end tag" search.
    fn is_special_element(tag_name: &str) -> bool {
        matches!(
            tag_name,
            "address"
                | "applet"
                | "area"
                | "article"
                | "aside"
                | "base"
                | "basefont"
                | "bgsound"
                | "blockquote"
                | "body"
                | "br"
                | "button"
                | "caption"
                | "center"
                | "col"
                | "colgroup"
                | "dd"
                | "details"
                | "dir"
                | "div"
                | "dl"
                | "dt"
                | "embed"
                | "fieldset"
                | "figcaption"
                | "figure"
                | "footer"
                | "form"
                | "frame"
                | "frameset"
                | "h1"
                | "h2"
                | "h3"
                | "h4"
                | "h5"
                | "h6"
                | "head"
                | "header"
                | "hgroup"
                | "hr"
                | "html"
                | "iframe"
                | "img"
                | "input"
                | "keygen"
                | "li"
                | "link"
                | "listing"
                | "main"
                | "marquee"
                | "menu"
                | "meta"
                | "nav"
                | "noembed"
                | "noframes"
                | "noscript"
                | "object"
                | "ol"
                | "p"
                | "param"
                | "plaintext"
                | "pre"
                | "script"
                | "search"
                | "section"
                | "select"
                | "source"
                | "style"
                | "summary"
                | "table"
                | "tbody"
                | "td"
                | "template"
                | "textarea"
                | "tfoot"
                | "th"
                | "thead"
                | "title"
                | "tr"
                | "track"
                | "ul"
                | "wbr"
                | "xmp"
        )
    }

    /// [§ 13.2.6.4.7 "Any other end tag"](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inbody)
    fn any_other_end_tag(&mut self, tag_name: &str) {
        for index in (0..self.stack_of_open_elements.len()).rev() {
            let id = self.stack_of_open_elements[index];
            let Some(name) = self.tag_name_of(id) else {
                continue;
            };
            // "If node is an HTML element with the same tag name as the token, then:
            // Generate implied end tags, except for HTML elements with the same tag
            // name as the token. ... Pop all the nodes from the current node up to
            // node, including node, then stop these steps."
            if name == tag_name {
                self.generate_implied_end_tags(Some(tag_name));
                self.stack_of_open_elements.truncate(index);
                return;
            }
            // "Otherwise, if node is in the special category, then this is a parse
            // error; ignore the token, and return."
            if Self::is_special_element(name) {
                self.parse_warning(&format!("stray end tag </{tag_name}>"));
                return;
            }
        }
    }

    // =========================================================================
    // Active formatting elements
    // =========================================================================

    fn formatting_index_of(&self, node: NodeId) -> Option<usize> {
        self.active_formatting_elements.iter().position(
            |entry| matches!(entry, FormattingEntry::Element { node: n, .. } if *n == node),
        )
    }

    /// The last entry named `tag_name` between the end of the list and the
    /// last marker.
    fn last_formatting_element(&self, tag_name: &str) -> Option<usize> {
        for (index, entry) in self.active_formatting_elements.iter().enumerate().rev() {
            match entry {
                FormattingEntry::Marker => return None,
                FormattingEntry::Element { tag_name: name, .. } if name == tag_name => {
                    return Some(index);
                }
                FormattingEntry::Element { .. } => {}
            }
        }
        None
    }

    /// [§ 13.2.4.3 Push onto the list of active formatting elements](https://html.spec.whatwg.org/multipage/parsing.html#push-onto-the-list-of-active-formatting-elements)
    ///
    /// "If there are already three elements in the list of active formatting
    /// elements after the last marker, if any, or anywhere in the list if there
    /// are no markers, that have the same tag name, namespace, and attributes
    /// as element, then remove the earliest such element from the list"
    fn push_formatting_element(&mut self, node: NodeId, tag_name: &str, attributes: &[Attribute]) {
        let matching: Vec<usize> = self
            .active_formatting_elements
            .iter()
            .enumerate()
            .rev()
            .take_while(|(_, entry)| !matches!(entry, FormattingEntry::Marker))
            .filter(|(_, entry)| {
                matches!(entry, FormattingEntry::Element { tag_name: name, attributes: attrs, .. }
                    if name == tag_name && attrs.as_slice() == attributes)
            })
            .map(|(index, _)| index)
            .collect();
        if matching.len() >= 3
            && let Some(&earliest) = matching.last()
        {
            let _ = self.active_formatting_elements.remove(earliest);
        }
        self.active_formatting_elements.push(FormattingEntry::Element {
            node,
            tag_name: tag_name.to_string(),
            attributes: attributes.to_vec(),
        });
    }

    /// [§ 13.2.4.3 Clear the list of active formatting elements up to the last marker](https://html.spec.whatwg.org/multipage/parsing.html#clear-the-list-of-active-formatting-elements-up-to-the-last-marker)
    fn clear_formatting_to_last_marker(&mut self) {
        while let Some(entry) = self.active_formatting_elements.pop() {
            if matches!(entry, FormattingEntry::Marker) {
                break;
            }
        }
    }

    fn is_marker_or_open(&self, index: usize) -> bool {
        match &self.active_formatting_elements[index] {
            FormattingEntry::Marker => true,
            FormattingEntry::Element { node, .. } => self.stack_of_open_elements.contains(node),
        }
    }

    /// [§ 13.2.4.3 Reconstruct the active formatting elements](https://html.spec.whatwg.org/multipage/parsing.html#reconstruct-the-active-formatting-elements)
    ///
    /// Reopens formatting elements that were implicitly closed, so
    /// `<p><b>one<p>two` puts "two" in a new `b` inside the second paragraph.
    fn reconstruct_active_formatting_elements(&mut self) {
        let len = self.active_formatting_elements.len();
        if len == 0 || self.is_marker_or_open(len - 1) {
            return;
        }

        // Rewind to the entry after the last marker or open element.
        let mut start = len - 1;
        while start > 0 && !self.is_marker_or_open(start - 1) {
            start -= 1;
        }

        // Create: recreate each entry and replace it in the list.
        for index in start..len {
            let FormattingEntry::Element {
                tag_name,
                attributes,
                ..
            } = self.active_formatting_elements[index].clone()
            else {
                continue;
            };
            let node = self.insert_html_element(&tag_name, &attributes);
            self.active_formatting_elements[index] = FormattingEntry::Element {
                node,
                tag_name,
                attributes,
            };
        }
    }

    /// [§ 13.2.6.4.7 The adoption agency algorithm](https://html.spec.whatwg.org/multipage/parsing.html#adoption-agency-algorithm)
    ///
    /// Handles the end tag of a formatting element. When block content was
    /// opened inside the formatting element, the block is moved out and the
    /// formatting is cloned into it, so `<b>1<p>2</b>3` keeps "2" bold.
    fn run_adoption_agency(&mut self, subject: &str) {
        // "If the current node is an HTML element whose tag name is subject, and
        // the current node is not in the list of active formatting elements,
        // then pop the current node off the stack of open elements and return."
        if let Some(current) = self.current_node()
            && self.tag_name_of(current) == Some(subject)
            && self.formatting_index_of(current).is_none()
        {
            let _ = self.stack_of_open_elements.pop();
            return;
        }

        for _ in 0..8 {
            let Some(formatting_index) = self.last_formatting_element(subject) else {
                self.any_other_end_tag(subject);
                return;
            };
            let FormattingEntry::Element {
                node: formatting_element,
                tag_name,
                attributes,
            } = self.active_formatting_elements[formatting_index].clone()
            else {
                return;
            };

            let Some(formatting_position) = self.stack_position(formatting_element) else {
                self.parse_warning(&format!("</{subject}> for an element that is no longer open"));
                let _ = self.active_formatting_elements.remove(formatting_index);
                return;
            };
            if !self.has_element_in_scope(subject) {
                self.parse_warning(&format!("</{subject}> out of scope"));
                return;
            }
            if self.current_node() != Some(formatting_element) {
                self.parse_warning(&format!("misnested </{subject}>"));
            }

            // "Let furthest block be the topmost node in the stack of open elements
            // that is lower in the stack than formatting element, and is an element
            // in the special category."
            let furthest_block = self.stack_of_open_elements[formatting_position + 1..]
                .iter()
                .copied()
                .find(|&id| self.tag_name_of(id).is_some_and(Self::is_special_element));
            let Some(furthest_block) = furthest_block else {
                self.stack_of_open_elements.truncate(formatting_position);
                let _ = self.active_formatting_elements.remove(formatting_index);
                return;
            };
            let Some(&common_ancestor) = formatting_position
                .checked_sub(1)
                .and_then(|index| self.stack_of_open_elements.get(index))
            else {
                return;
            };

            let mut bookmark = formatting_index;
            let Some(mut node_position) = self.stack_position(furthest_block) else {
                return;
            };
            let mut last_node = furthest_block;
            let mut inner_loop_counter = 0;

            // Formatting elements between the formatting element and the furthest
            // block are recreated around the furthest block; others are dropped
            // from the stack.
            loop {
                inner_loop_counter += 1;
                node_position -= 1;
                let node = self.stack_of_open_elements[node_position];
                if node == formatting_element {
                    break;
                }

                if inner_loop_counter > 3
                    && let Some(index) = self.formatting_index_of(node)
                {
                    let _ = self.active_formatting_elements.remove(index);
                    if bookmark > index {
                        bookmark -= 1;
                    }
                }

                let Some(node_index) = self.formatting_index_of(node) else {
                    let _ = self.stack_of_open_elements.remove(node_position);
                    continue;
                };
                let FormattingEntry::Element {
                    tag_name: node_tag,
                    attributes: node_attributes,
                    ..
                } = self.active_formatting_elements[node_index].clone()
                else {
                    break;
                };
                let replacement = self.create_element(&node_tag, &node_attributes);
                self.active_formatting_elements[node_index] = FormattingEntry::Element {
                    node: replacement,
                    tag_name: node_tag,
                    attributes: node_attributes,
                };
                self.stack_of_open_elements[node_position] = replacement;

                if last_node == furthest_block {
                    bookmark = node_index + 1;
                }
                self.tree.append_child(replacement, last_node);
                last_node = replacement;
            }

            self.tree.append_child(common_ancestor, last_node);

            // "Create an element for the token for which formatting element was
            // created ... Take all of the child nodes of furthest block and append
            // them to the element created in the last step. Append that new element
            // to furthest block."
            let replacement = self.create_element(&tag_name, &attributes);
            let children = self.tree.children(furthest_block).to_vec();
            for child in children {
                self.tree.append_child(replacement, child);
            }
            self.tree.append_child(furthest_block, replacement);

            if let Some(old) = self.formatting_index_of(formatting_element) {
                let _ = self.active_formatting_elements.remove(old);
                if bookmark > old {
                    bookmark -= 1;
                }
            }
            let bookmark = bookmark.min(self.active_formatting_elements.len());
            self.active_formatting_elements.insert(
                bookmark,
                FormattingEntry::Element {
                    node: replacement,
                    tag_name,
                    attributes,
                },
            );

            self.stack_of_open_elements
                .retain(|&id| id != formatting_element);
            if let Some(position) = self.stack_position(furthest_block) {
                self.stack_of_open_elements.insert(position + 1, replacement);
            }
        }
    }

    // =========================================================================
    // Insertion modes
    // =========================================================================

    /// [§ 13.2.6.4.1 The "initial" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-initial-insertion-mode)
    fn handle_initial_mode(&mut self, token: &Token) {
        match token {
            // "A character token that is one of ... whitespace - Ignore the token."
            t if Self::is_whitespace_token(t) => {}
            Token::Comment { data } => self.insert_comment(data, NodeId::ROOT),
            // "A DOCTYPE token - ... Append a DocumentType node to the Document node"
            Token::Doctype { name, .. } => {
                let doctype = self
                    .tree
                    .alloc(NodeType::Doctype(name.clone().unwrap_or_default()));
                self.tree.append_child(NodeId::ROOT, doctype);
                self.insertion_mode = InsertionMode::BeforeHtml;
            }
            _ => {
                self.insertion_mode = InsertionMode::BeforeHtml;
                self.reprocess_token(token);
            }
        }
    }

    /// [§ 13.2.6.4.2 The "before html" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-before-html-insertion-mode)
    fn handle_before_html_mode(&mut self, token: &Token) {
        match token {
            Token::Doctype { .. } => self.parse_warning("unexpected DOCTYPE"),
            Token::Comment { data } => self.insert_comment(data, NodeId::ROOT),
            t if Self::is_whitespace_token(t) => {}
            Token::StartTag {
                name, attributes, ..
            } if name == "html" => {
                let _ = self.insert_html_element(name, attributes);
                self.insertion_mode = InsertionMode::BeforeHead;
            }
            Token::EndTag { name } if !matches!(name.as_str(), "head" | "body" | "html" | "br") => {
                self.parse_warning(&format!("unexpected end tag </{name}> before html"));
            }
            // "Anything else - Create an html element whose node document is the
            // Document object. Append it to the Document object. Put this element
            // in the stack of open elements. Switch to "before head"; reprocess."
            _ => {
                let _ = self.insert_html_element("html", &[]);
                self.insertion_mode = InsertionMode::BeforeHead;
                self.reprocess_token(token);
            }
        }
    }

    /// [§ 13.2.6.4.3 The "before head" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-before-head-insertion-mode)
    fn handle_before_head_mode(&mut self, token: &Token) {
        match token {
            t if Self::is_whitespace_token(t) => {}
            Token::Comment { data } => self.insert_comment(data, self.insertion_location()),
            Token::Doctype { .. } => self.parse_warning("unexpected DOCTYPE"),
            Token::StartTag { name, .. } if name == "html" => self.handle_in_body_mode(token),
            Token::StartTag {
                name, attributes, ..
            } if name == "head" => {
                let head = self.insert_html_element(name, attributes);
                self.head_element_pointer = Some(head);
                self.insertion_mode = InsertionMode::InHead;
            }
            Token::EndTag { name } if !matches!(name.as_str(), "head" | "body" | "html" | "br") => {
                self.parse_warning(&format!("unexpected end tag </{name}> before head"));
            }
            _ => {
                let head = self.insert_html_element("head", &[]);
                self.head_element_pointer = Some(head);
                self.insertion_mode = InsertionMode::InHead;
                self.reprocess_token(token);
            }
        }
    }

    /// Insert head content (`meta`, `link`, `script`, `style`, `title`, ...)
    /// at the current insertion location.
    ///
    /// Void elements are popped right away; raw text elements switch to the
    /// "text" insertion mode.
    fn insert_head_content(&mut self, token: &Token) {
        let Some(name) = token.tag_name() else {
            return;
        };
        let name = name.to_string();
        let _ = self.insert_element_for_token(token);
        if VOID_ELEMENTS.contains(&name.as_str()) {
            let _ = self.stack_of_open_elements.pop();
        } else if TEXT_ELEMENTS.contains(&name.as_str()) {
            self.original_insertion_mode = Some(self.insertion_mode);
            self.insertion_mode = InsertionMode::Text;
        }
    }

    /// [§ 13.2.6.4.4 The "in head" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inhead)
    fn handle_in_head_mode(&mut self, token: &Token) {
        match token {
            Token::Character { data } if Self::is_whitespace(*data) => {
                self.insert_character(*data);
            }
            Token::Comment { data } => self.insert_comment(data, self.insertion_location()),
            Token::Doctype { .. } => self.parse_warning("unexpected DOCTYPE"),
            Token::StartTag { name, .. } if name == "html" => self.handle_in_body_mode(token),
            Token::StartTag { name, .. } if HEAD_CONTENT.contains(&name.as_str()) => {
                self.insert_head_content(token);
            }
            Token::StartTag { name, .. } if name == "head" => {
                self.parse_warning("nested <head>");
            }
            // "An end tag whose tag name is "head" - Pop the current node (which
            // will be the head element) off the stack of open elements. Switch the
            // insertion mode to "after head"."
            Token::EndTag { name } if name == "head" => {
                let _ = self.stack_of_open_elements.pop();
                self.insertion_mode = InsertionMode::AfterHead;
            }
            Token::EndTag { name } if !matches!(name.as_str(), "body" | "html" | "br") => {
                self.parse_warning(&format!("unexpected end tag </{name}> in head"));
            }
            _ => {
                let _ = self.stack_of_open_elements.pop();
                self.insertion_mode = InsertionMode::AfterHead;
                self.reprocess_token(token);
            }
        }
    }

    /// [§ 13.2.6.4.8 The "text" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-incdata)
    fn handle_text_mode(&mut self, token: &Token) {
        let original = self.original_insertion_mode.take().unwrap_or(InsertionMode::InBody);
        match token {
            Token::Character { data } => {
                self.insert_character(*data);
                self.original_insertion_mode = Some(original);
            }
            // "An end-of-file token - This is a parse error. ... Pop the current
            // node off the stack of open elements. Switch the insertion mode to the
            // original insertion mode and reprocess the token."
            Token::EndOfFile => {
                self.parse_warning("end of file inside raw text element");
                let _ = self.stack_of_open_elements.pop();
                self.insertion_mode = original;
                self.reprocess_token(token);
            }
            // "Any other end tag - Pop the current node off the stack of open
            // elements. Switch the insertion mode to the original insertion mode."
            _ => {
                let _ = self.stack_of_open_elements.pop();
                self.insertion_mode = original;
            }
        }
    }

    /// [§ 13.2.6.4.6 The "after head" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-after-head-insertion-mode)
    fn handle_after_head_mode(&mut self, token: &Token) {
        match token {
            Token::Character { data } if Self::is_whitespace(*data) => {
                self.insert_character(*data);
            }
            Token::Comment { data } => self.insert_comment(data, self.insertion_location()),
            Token::Doctype { .. } => self.parse_warning("unexpected DOCTYPE"),
            Token::StartTag { name, .. } if name == "html" => self.handle_in_body_mode(token),
            Token::StartTag {
                name, attributes, ..
            } if name == "body" || name == "frameset" => {
                let _ = self.insert_html_element(name, attributes);
                self.insertion_mode = InsertionMode::InBody;
            }
            // "Push the node pointed to by the head element pointer onto the stack
            // of open elements. Process the token using the rules for the "in head"
            // insertion mode. Remove the node pointed to by the head element pointer
            // from the stack of open elements."
            Token::StartTag { name, .. } if HEAD_CONTENT.contains(&name.as_str()) => {
                self.parse_warning(&format!("<{name}> after </head>"));
                if let Some(head) = self.head_element_pointer {
                    self.stack_of_open_elements.push(head);
                    self.insert_head_content(token);
                    self.stack_of_open_elements.retain(|&id| id != head);
                }
            }
            Token::StartTag { name, .. } if name == "head" => {
                self.parse_warning("second <head>");
            }
            Token::EndTag { name } if !matches!(name.as_str(), "body" | "html" | "br") => {
                self.parse_warning(&format!("unexpected end tag </{name}> after head"));
            }
            _ => {
                let _ = self.insert_html_element("body", &[]);
                self.insertion_mode = InsertionMode::InBody;
                self.reprocess_token(token);
            }
        }
    }

    /// [§ 13.2.6.4.7 The "in body" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inbody)
    fn handle_in_body_mode(&mut self, token: &Token) {
        match token {
            Token::Character { data: '\0' } => {
                self.parse_warning("unexpected null character");
            }
            Token::Character { data } => {
                self.reconstruct_active_formatting_elements();
                self.insert_character(*data);
            }
            Token::Comment { data } => self.insert_comment(data, self.insertion_location()),
            Token::Doctype { .. } => self.parse_warning("unexpected DOCTYPE"),
            Token::StartTag {
                name, attributes, ..
            } => self.handle_in_body_start_tag(token, name, attributes),
            Token::EndTag { name } => self.handle_in_body_end_tag(name),
            // "An end-of-file token - Stop parsing."
            Token::EndOfFile => self.stopped = true,
        }
    }

    fn handle_in_body_start_tag(&mut self, token: &Token, name: &str, attributes: &[Attribute]) {
        let self_closing = matches!(
            token,
            Token::StartTag {
                self_closing: true,
                ..
            }
        );

        match name {
            // "A start tag whose tag name is "html" - Parse error. ... add the
            // attribute and its corresponding value to that element"
            "html" => {
                self.parse_warning("unexpected <html>");
                if let Some(&html) = self.stack_of_open_elements.first() {
                    self.merge_missing_attributes(html, attributes);
                }
            }
            "body" => {
                self.parse_warning("unexpected <body>");
                if let Some(&body) = self.stack_of_open_elements.get(1)
                    && self.tag_name_of(body) == Some("body")
                {
                    self.merge_missing_attributes(body, attributes);
                }
            }
            _ if HEAD_CONTENT.contains(&name) => self.insert_head_content(token),
            // "If the stack of open elements has a p element in button scope, then
            // close a p element. If the current node is an HTML element whose tag
            // name is one of "h1", ..., "h6", then this is a parse error; pop the
            // current node off the stack of open elements."
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                self.close_p_if_in_button_scope();
                if self
                    .current_node()
                    .and_then(|id| self.tag_name_of(id))
                    .is_some_and(|current| {
                        matches!(current, "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
                    })
                {
                    self.parse_warning("nested heading");
                    let _ = self.stack_of_open_elements.pop();
                }
                let _ = self.insert_html_element(name, attributes);
            }
            "hr" => {
                self.close_p_if_in_button_scope();
                let _ = self.insert_html_element(name, attributes);
                let _ = self.stack_of_open_elements.pop();
            }
            "xmp" => {
                self.close_p_if_in_button_scope();
                self.reconstruct_active_formatting_elements();
                self.insert_head_content(token);
            }
            "textarea" | "iframe" | "noembed" => self.insert_head_content(token),
            _ if CLOSES_P.contains(&name) => {
                self.close_p_if_in_button_scope();
                let _ = self.insert_html_element(name, attributes);
            }
            "li" => {
                self.close_list_item(&["li"], &["ol", "ul"]);
                self.close_p_if_in_button_scope();
                let _ = self.insert_html_element(name, attributes);
            }
            "dd" | "dt" => {
                self.close_list_item(&["dd", "dt"], &["dl"]);
                self.close_p_if_in_button_scope();
                let _ = self.insert_html_element(name, attributes);
            }
            "tr" => {
                for part in ["td", "th", "tr"] {
                    let _ = self.close_element_in_scope(part, true);
                }
                let _ = self.insert_html_element(name, attributes);
            }
            "td" | "th" => {
                for cell in ["td", "th"] {
                    let _ = self.close_element_in_scope(cell, true);
                }
                let _ = self.insert_html_element(name, attributes);
                self.active_formatting_elements.push(FormattingEntry::Marker);
            }
            "applet" | "marquee" | "object" => {
                self.reconstruct_active_formatting_elements();
                let _ = self.insert_html_element(name, attributes);
                self.active_formatting_elements.push(FormattingEntry::Marker);
            }
            // "If the list of active formatting elements contains an a element
            // between the end of the list and the last marker on the list ...
            // run the adoption agency algorithm for the token, then remove that
            // element from the list of active formatting elements and the stack
            // of open elements if the adoption agency algorithm didn't already
            // remove it"
            "a" => {
                if let Some(index) = self.last_formatting_element("a")
                    && let FormattingEntry::Element { node, .. } =
                        self.active_formatting_elements[index]
                {
                    self.parse_warning("nested <a>");
                    self.run_adoption_agency("a");
                    self.active_formatting_elements.retain(
                        |entry| !matches!(entry, FormattingEntry::Element { node: n, .. } if *n == node),
                    );
                    self.stack_of_open_elements.retain(|&id| id != node);
                }
                self.insert_formatting_element(name, attributes);
            }
            "nobr" => {
                self.reconstruct_active_formatting_elements();
                if self.has_element_in_scope("nobr") {
                    self.parse_warning("nested <nobr>");
                    self.run_adoption_agency("nobr");
                }
                self.insert_formatting_element(name, attributes);
            }
            _ if FORMATTING_ELEMENTS.contains(&name) => {
                self.insert_formatting_element(name, attributes);
            }
            _ if VOID_ELEMENTS.contains(&name) => {
                if !matches!(name, "param" | "source" | "track") {
                    self.reconstruct_active_formatting_elements();
                }
                let _ = self.insert_html_element(name, attributes);
                let _ = self.stack_of_open_elements.pop();
            }
            // Self-closing tags are honoured inside svg and math, where
            // `<path ... />` is the norm, and on the foreign roots themselves.
            _ => {
                self.reconstruct_active_formatting_elements();
                let foreign = self.in_foreign_content() || matches!(name, "svg" | "math");
                let _ = self.insert_html_element(name, attributes);
                if self_closing && foreign {
                    let _ = self.stack_of_open_elements.pop();
                } else if self_closing {
                    self.parse_warning(&format!("self-closing flag on non-void <{name}>"));
                }
            }
        }
    }

    /// Reconstruct, insert and push a formatting element (`b`, `em`, `a`, ...).
    fn insert_formatting_element(&mut self, name: &str, attributes: &[Attribute]) {
        self.reconstruct_active_formatting_elements();
        let node = self.insert_html_element(name, attributes);
        self.push_formatting_element(node, name, attributes);
    }

    /// `li`, `dd` and `dt` start tags implicitly close an open item of the
    /// same family, unless a list container or a special element other than
    /// `address`, `div` and `p` lies in between.
    fn close_list_item(&mut self, items: &[&str], containers: &[&str]) {
        for index in (0..self.stack_of_open_elements.len()).rev() {
            let id = self.stack_of_open_elements[index];
            let Some(name) = self.tag_name_of(id).map(str::to_string) else {
                continue;
            };
            if items.contains(&name.as_str()) {
                self.generate_implied_end_tags(Some(&name));
                if !self.current_node_is(&name) {
                    self.parse_warning(&format!("unclosed children inside <{name}>"));
                }
                self.stack_of_open_elements.truncate(index);
                return;
            }
            if containers.contains(&name.as_str())
                || (Self::is_special_element(&name)
                    && !matches!(name.as_str(), "address" | "div" | "p"))
            {
                return;
            }
        }
    }

    fn handle_in_body_end_tag(&mut self, name: &str) {
        match name {
            // "An end tag whose tag name is "body" - If the stack of open elements
            // does not have a body element in scope, this is a parse error; ignore
            // the token. ... Switch the insertion mode to "after body"."
            "body" | "html" => {
                if !self.has_element_in_scope("body") {
                    self.parse_warning(&format!("</{name}> without open body"));
                    return;
                }
                self.insertion_mode = InsertionMode::AfterBody;
            }
            // "If the stack of open elements does not have a p element in button
            // scope, then this is a parse error; insert an HTML element for a "p"
            // start tag token with no attributes. Close a p element."
            "p" => {
                if !self.has_element_in_button_scope("p") {
                    self.parse_warning("</p> without open p");
                    let _ = self.insert_html_element("p", &[]);
                }
                self.close_p_element();
            }
            "li" => {
                if !self.has_element_in_list_item_scope("li") {
                    self.parse_warning("</li> without open li");
                    return;
                }
                let _ = self.close_element_in_scope("li", false);
            }
            // "An end tag whose tag name is "br" - Parse error. Drop the attributes
            // from the token, and act as described in the next entry; i.e. act as if
            // this was a "br" start tag token with no attributes"
            "br" => {
                self.parse_warning("</br> treated as <br>");
                self.reconstruct_active_formatting_elements();
                let _ = self.insert_html_element("br", &[]);
                let _ = self.stack_of_open_elements.pop();
            }
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let open_heading = ["h1", "h2", "h3", "h4", "h5", "h6"]
                    .into_iter()
                    .find(|heading| self.has_element_in_scope(heading));
                let Some(open_heading) = open_heading else {
                    self.parse_warning(&format!("</{name}> without open heading"));
                    return;
                };
                self.generate_implied_end_tags(None);
                self.pop_until_tag(open_heading);
            }
            _ if FORMATTING_ELEMENTS.contains(&name) => self.run_adoption_agency(name),
            "applet" | "marquee" | "object" => {
                if !self.close_element_in_scope(name, false) {
                    self.parse_warning(&format!("stray end tag </{name}>"));
                }
            }
            _ if TABLE_PARTS.contains(&name) => {
                if !self.close_element_in_scope(name, true) {
                    self.parse_warning(&format!("stray end tag </{name}>"));
                }
            }
            _ if CLOSES_P.contains(&name) || matches!(name, "dd" | "dt" | "button") => {
                if !self.close_element_in_scope(name, false) {
                    self.parse_warning(&format!("stray end tag </{name}>"));
                }
            }
            _ => self.any_other_end_tag(name),
        }
    }

    /// [§ 13.2.6.4.19 The "after body" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-afterbody)
    fn handle_after_body_mode(&mut self, token: &Token) {
        match token {
            t if Self::is_whitespace_token(t) => self.handle_in_body_mode(token),
            // "A comment token - Insert a comment as the last child of the first
            // element in the stack of open elements (the html element)."
            Token::Comment { data } => {
                let html = self
                    .stack_of_open_elements
                    .first()
                    .copied()
                    .unwrap_or(NodeId::ROOT);
                self.insert_comment(data, html);
            }
            Token::Doctype { .. } => self.parse_warning("unexpected DOCTYPE"),
            Token::StartTag { name, .. } if name == "html" => self.handle_in_body_mode(token),
            Token::EndTag { name } if name == "html" || name == "body" => {}
            Token::EndOfFile => self.stopped = true,
            // "Anything else - Parse error. Switch the insertion mode to "in body"
            // and reprocess the token."
            _ => {
                self.parse_warning("content after </body>");
                self.insertion_mode = InsertionMode::InBody;
                self.reprocess_token(token);
            }
        }
    }
}
