//! Helper functions for the HTML tokenizer.
//!
//! [§ 13.2.5 Tokenization](https://html.spec.whatwg.org/multipage/parsing.html#tokenization)
//!
//! This module contains utility functions used throughout the tokenizer:
//! - State transitions ("Switch to", "Reconsume in")
//! - Input/character handling ("Consume the next input character")
//! - Token emission ("Emit the current token")
//! - RCDATA/RAWTEXT helpers for raw text elements

use nbdeck_common::warning::warn_once;

use super::character_reference::match_character_reference;
use super::core::{HTMLTokenizer, TokenizerState};
use super::token::Token;

// =============================================================================
// State Transition Helpers
// =============================================================================

impl HTMLTokenizer {
    /// "Switch to the X state"
    ///
    /// Transitions to a new state. The next character will be consumed on the
    /// next iteration of the main loop.
    pub(super) const fn switch_to(&mut self, new_state: TokenizerState) {
        self.state = new_state;
    }

    /// "Reconsume in the X state"
    ///
    /// Transitions to a new state without consuming the current character.
    pub(super) const fn reconsume_in(&mut self, new_state: TokenizerState) {
        self.reconsume = true;
        self.state = new_state;
    }
}

// =============================================================================
// Input/Character Helpers
// =============================================================================

impl HTMLTokenizer {
    /// "Consume the next input character"
    ///
    /// Returns None if we've reached the end of input.
    pub(super) fn consume(&mut self) -> Option<char> {
        let c = self.input[self.current_pos..].chars().next()?;
        self.current_pos += c.len_utf8();
        Some(c)
    }

    /// "If the next few characters are..."
    #[must_use]
    pub fn next_few_characters_are(&self, target: &str) -> bool {
        self.input[self.current_pos..].starts_with(target)
    }

    /// "ASCII case-insensitive match for the word 'DOCTYPE'"
    #[must_use]
    pub fn next_few_characters_are_case_insensitive(&self, target: &str) -> bool {
        self.input[self.current_pos..]
            .get(..target.len())
            .is_some_and(|candidate| candidate.eq_ignore_ascii_case(target))
    }

    /// Consume the given string from the input.
    /// Caller must have already verified the characters are present.
    pub(super) const fn consume_string(&mut self, target: &str) {
        self.current_pos += target.len();
    }

    /// [§ 12.1.4 ASCII whitespace](https://infra.spec.whatwg.org/#ascii-whitespace)
    ///
    /// NOTE: CR is included because input is not newline-normalized first.
    pub(super) const fn is_whitespace_char(input_char: char) -> bool {
        matches!(input_char, ' ' | '\t' | '\n' | '\x0C' | '\r')
    }

    /// "ASCII upper alpha - Append the lowercase version of the current input
    /// character" / "U+0000 NULL - ... Append a U+FFFD REPLACEMENT CHARACTER"
    pub(super) const fn lowercase_or_replacement(c: char) -> char {
        if c == '\0' {
            '\u{FFFD}'
        } else {
            c.to_ascii_lowercase()
        }
    }

    /// [§ 13.2.5.14](https://html.spec.whatwg.org/multipage/parsing.html#appropriate-end-tag-token)
    ///
    /// "An appropriate end tag token is an end tag token whose tag name matches
    /// the tag name of the last start tag to have been emitted from this
    /// tokenizer, if any."
    pub(super) fn is_appropriate_end_tag(&self) -> bool {
        match (&self.current_token, &self.last_start_tag_name) {
            (Some(Token::EndTag { name }), Some(last)) => name == last,
            _ => false,
        }
    }
}

// =============================================================================
// Token Emission Helpers
// =============================================================================

impl HTMLTokenizer {
    /// "Emit the current token" - adds the token to the output stream.
    pub(super) fn emit_token(&mut self) {
        let Some(mut token) = self.current_token.take() else {
            return;
        };

        if token.remove_duplicate_attributes() {
            self.log_parse_error("duplicate-attribute");
        }

        if let Token::StartTag { ref name, .. } = token {
            self.last_start_tag_name = Some(name.clone());

            // NOTE: The tree builder normally switches the tokenizer state. Since
            // we run the tokenizer before the parser, raw text elements are
            // detected here.
            match name.as_str() {
                // "Follow the generic RCDATA element parsing algorithm."
                "title" | "textarea" => self.switch_to(TokenizerState::RCDATA),
                // "Follow the generic raw text element parsing algorithm."
                // Script data is treated the same way.
                "style" | "xmp" | "iframe" | "noembed" | "noframes" | "script" => {
                    self.switch_to(TokenizerState::RAWTEXT);
                }
                _ => {}
            }
        }
        self.token_stream.push(token);
    }

    /// "Emit the current input character as a character token."
    pub(super) fn emit_character_token(&mut self, c: char) {
        self.token_stream.push(Token::new_character(c));
    }

    /// "Emit an end-of-file token."
    pub(super) fn emit_eof_token(&mut self) {
        self.token_stream.push(Token::EndOfFile);
        self.at_eof = true;
    }

    /// "emit a character token for each of the characters in the temporary buffer"
    pub(super) fn flush_temporary_buffer(&mut self) {
        let buffer = std::mem::take(&mut self.temporary_buffer);
        for c in buffer.chars() {
            self.emit_character_token(c);
        }
    }

    /// Character reference in data or RCDATA: emit the replacement, or a
    /// literal `&` if nothing matched.
    pub(super) fn emit_character_reference(&mut self) {
        match match_character_reference(&self.input[self.current_pos..], false) {
            Some(reference) => {
                if let Some(code) = reference.error {
                    self.log_parse_error(code);
                }
                self.current_pos += reference.consumed;
                for c in reference.replacement.chars() {
                    self.emit_character_token(c);
                }
            }
            None => self.emit_character_token('&'),
        }
    }

    /// Character reference inside an attribute value.
    pub(super) fn append_character_reference_to_attribute(&mut self) {
        let replacement = match match_character_reference(&self.input[self.current_pos..], true)
        {
            Some(reference) => {
                if let Some(code) = reference.error {
                    self.log_parse_error(code);
                }
                self.current_pos += reference.consumed;
                reference.replacement
            }
            None => "&".to_string(),
        };
        if let Some(ref mut token) = self.current_token {
            for c in replacement.chars() {
                token.append_to_current_attribute_value(c);
            }
        }
    }

    /// "Append the current input character to the comment token's data."
    pub(super) fn append_to_comment(&mut self, c: char) {
        let c = if c == '\0' { '\u{FFFD}' } else { c };
        if let Some(ref mut token) = self.current_token {
            let mut buf = [0u8; 4];
            token.append_to_comment(c.encode_utf8(&mut buf));
        }
    }

    /// Append several characters to the comment token's data.
    pub(super) fn append_str_to_comment(&mut self, s: &str) {
        if let Some(ref mut token) = self.current_token {
            token.append_to_comment(s);
        }
    }

    /// [§ 13.2.2 Parse errors](https://html.spec.whatwg.org/multipage/parsing.html#parse-errors)
    ///
    /// Records the error code and reports it once per code.
    pub(super) fn log_parse_error(&mut self, code: &'static str) {
        self.errors.push(code);
        warn_once("HTML Tokenizer", &format!("parse error: {code}"));
    }
}
