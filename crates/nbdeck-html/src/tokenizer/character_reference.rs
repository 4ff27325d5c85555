//! Character reference matching for the HTML tokenizer.
//!
//! [§ 13.2.5.72 Character reference state](https://html.spec.whatwg.org/multipage/parsing.html#character-reference-state)
//!
//! The tokenizer calls [`match_character_reference`] right after consuming
//! `&`; the matcher only looks at the remaining input and reports how much of
//! it forms the reference.

/// Names that also match without a trailing semicolon, besides the Latin-1
/// names in [`LEGACY_LATIN1`].
const LEGACY_ASCII: &[(&str, char)] = &[
    ("AMP", '&'),
    ("amp", '&'),
    ("GT", '>'),
    ("gt", '>'),
    ("LT", '<'),
    ("lt", '<'),
    ("QUOT", '"'),
    ("quot", '"'),
    ("COPY", '\u{00A9}'),
    ("REG", '\u{00AE}'),
];

/// Legacy names for U+00A0 through U+00FF, in code point order. All of them
/// match with or without the semicolon.
const LEGACY_LATIN1: [&str; 96] = [
    "nbsp", "iexcl", "cent", "pound", "curren", "yen", "brvbar", "sect", "uml", "copy", "ordf",
    "laquo", "not", "shy", "reg", "macr", "deg", "plusmn", "sup2", "sup3", "acute", "micro",
    "para", "middot", "cedil", "sup1", "ordm", "raquo", "frac14", "frac12", "frac34", "iquest",
    "Agrave", "Aacute", "Acirc", "Atilde", "Auml", "Aring", "AElig", "Ccedil", "Egrave", "Eacute",
    "Ecirc", "Euml", "Igrave", "Iacute", "Icirc", "Iuml", "ETH", "Ntilde", "Ograve", "Oacute",
    "Ocirc", "Otilde", "Ouml", "times", "Oslash", "Ugrave", "Uacute", "Ucirc", "Uuml", "Yacute",
    "THORN", "szlig", "agrave", "aacute", "acirc", "atilde", "auml", "aring", "aelig", "ccedil",
    "egrave", "eacute", "ecirc", "euml", "igrave", "iacute", "icirc", "iuml", "eth", "ntilde",
    "ograve", "oacute", "ocirc", "otilde", "ouml", "divide", "oslash", "ugrave", "uacute", "ucirc",
    "uuml", "yacute", "thorn", "yuml",
];

/// Longest legacy name that `rest` starts with.
fn match_legacy_name(rest: &str) -> Option<(&'static str, char)> {
    let ascii = LEGACY_ASCII.iter().copied();
    let latin1 = ('\u{00A0}'..='\u{00FF}')
        .zip(LEGACY_LATIN1)
        .map(|(c, name)| (name, c));
    ascii
        .chain(latin1)
        .filter(|(name, _)| rest.starts_with(name))
        .max_by_key(|(name, _)| name.len())
}

/// Resolve `name;` against the full table of named character references.
fn match_terminated_name(rest: &str) -> Option<CharacterReference> {
    let name_len = rest
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(rest.len());
    if name_len == 0 || !rest[name_len..].starts_with(';') {
        return None;
    }
    let reference = format!("&{}", &rest[..=name_len]);
    let decoded = html_escape::decode_html_entities(&reference);
    if decoded == reference.as_str() {
        return None;
    }
    Some(CharacterReference {
        consumed: name_len + 1,
        replacement: decoded.into_owned(),
        error: None,
    })
}

/// A recognized character reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterReference {
    /// Bytes of input after the `&` that belong to the reference.
    pub consumed: usize,
    /// Replacement text.
    pub replacement: String,
    /// Parse error raised while matching, if any.
    pub error: Option<&'static str>,
}

/// Match a character reference at the start of `rest` (the input just after
/// the `&`). Returns `None` when the `&` must be emitted literally.
///
/// "If the character reference was consumed as part of an attribute ... and
/// the last character matched is not a U+003B SEMICOLON character (;), and
/// the next input character is either a U+003D EQUALS SIGN character (=) or
/// an ASCII alphanumeric, then, for historical reasons, flush code points
/// consumed as a character reference and switch to the return state."
#[must_use]
pub fn match_character_reference(rest: &str, in_attribute: bool) -> Option<CharacterReference> {
    if rest.starts_with('#') {
        return match_numeric_reference(rest);
    }

    if let Some(reference) = match_terminated_name(rest) {
        return Some(reference);
    }

    // "&notin" without a semicolon still matches the legacy "&not".
    let (name, replacement) = match_legacy_name(rest)?;
    if in_attribute {
        let next = rest[name.len()..].chars().next();
        if next.is_some_and(|c| c == '=' || c.is_ascii_alphanumeric()) {
            return None;
        }
    }

    Some(CharacterReference {
        consumed: name.len(),
        replacement: replacement.to_string(),
        error: Some("missing-semicolon-after-character-reference"),
    })
}

/// [§ 13.2.5.75 Numeric character reference state](https://html.spec.whatwg.org/multipage/parsing.html#numeric-character-reference-state)
fn match_numeric_reference(rest: &str) -> Option<CharacterReference> {
    let (radix, digits_start) = match rest[1..].chars().next() {
        Some('x' | 'X') => (16, 2),
        _ => (10, 1),
    };
    let digits: String = rest[digits_start..]
        .chars()
        .take_while(|c| c.is_digit(radix))
        .collect();
    if digits.is_empty() {
        // "absence-of-digits-in-numeric-character-reference parse error ...
        // Flush code points consumed as a character reference."
        return None;
    }

    let mut consumed = digits_start + digits.len();
    let mut error = None;
    if rest[consumed..].starts_with(';') {
        consumed += 1;
    } else {
        error = Some("missing-semicolon-after-character-reference");
    }

    let code = u32::from_str_radix(&digits, radix).unwrap_or(u32::MAX);
    let (c, range_error) = numeric_reference_to_char(code);
    Some(CharacterReference {
        consumed,
        replacement: c.to_string(),
        error: range_error.or(error),
    })
}

/// [§ 13.2.5.80 Numeric character reference end state](https://html.spec.whatwg.org/multipage/parsing.html#numeric-character-reference-end-state)
///
/// "If the number is 0x00 ... null-character-reference parse error. Set the
/// character reference code to 0xFFFD."
/// "If the number is greater than 0x10FFFF ... character-reference-outside-
/// unicode-range parse error. Set the character reference code to 0xFFFD."
/// "If the number is a surrogate ... surrogate-character-reference parse
/// error. Set the character reference code to 0xFFFD."
fn numeric_reference_to_char(code: u32) -> (char, Option<&'static str>) {
    if code == 0 {
        return ('\u{FFFD}', Some("null-character-reference"));
    }
    if code > 0x0010_FFFF {
        return ('\u{FFFD}', Some("character-reference-outside-unicode-range"));
    }
    char::from_u32(code).map_or(('\u{FFFD}', Some("surrogate-character-reference")), |c| {
        (c, None)
    })
}
