//! Escape-layer normalization for embedded payloads.
//!
//! Listing pages ship their JSON inside a script-string, so every structural
//! quote arrives as `\"` (or `\\\"` when the blob went through two layers).
//! [`normalize`] decodes HTML entities and strips escaping layers until the
//! text is stable, leaving exactly one level of JSON string-escaping, the
//! level the bracket matcher and `serde_json` expect.
//!
//! The layer-strip only fires when the text's *structural* quotes (those
//! adjacent to `{`, `[`, `:` or `,`) are predominantly backslash-escaped.
//! Escaped quotes inside ordinary string values (`{"a":"\""}`) never look
//! structural, so already-normalized text passes through untouched and the
//! whole function is idempotent.

use std::iter::Peekable;
use std::str::CharIndices;

use crate::errors::ExtractError;

/// Backstop against pathological inputs; real pages settle in one or two passes.
const MAX_PASSES: usize = 6;

/// Reduces N layers of string-escaping to one, decoding HTML entities along
/// the way. Idempotent. Fails only when an escape sequence cannot be decoded
/// to valid text; "nothing to unescape" is not an error.
pub fn normalize(text: &str) -> Result<String, ExtractError> {
    let mut cur = text.to_string();
    for _ in 0..MAX_PASSES {
        let mut next = decode_entities(&cur);
        if has_extra_layer(&next) {
            next = strip_layer(&next)?;
        }
        if next == cur {
            break;
        }
        cur = next;
    }
    Ok(cur)
}

const ENTITIES: &[(&str, char)] = &[
    ("&quot;", '"'),
    ("&#34;", '"'),
    ("&#x22;", '"'),
    ("&apos;", '\''),
    ("&#39;", '\''),
    ("&#x27;", '\''),
    ("&lt;", '<'),
    ("&gt;", '>'),
    ("&amp;", '&'),
];

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        match ENTITIES.iter().find(|(entity, _)| rest.starts_with(entity)) {
            Some((entity, ch)) => {
                out.push(*ch);
                rest = &rest[entity.len()..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// True when structural quotes are predominantly backslash-escaped, meaning
/// at least one more escaping layer sits on top of the payload.
fn has_extra_layer(text: &str) -> bool {
    let (escaped, plain) = structural_quote_counts(text);
    escaped > plain
}

fn structural_quote_counts(text: &str) -> (usize, usize) {
    let bytes = text.as_bytes();
    let mut escaped = 0usize;
    let mut plain = 0usize;
    for (i, &b) in bytes.iter().enumerate() {
        if b != b'"' {
            continue;
        }
        let next_structural = matches!(bytes.get(i + 1), Some(b':') | Some(b','));
        if i > 0 && bytes[i - 1] == b'\\' {
            let opener_before = i >= 2 && matches!(bytes[i - 2], b'{' | b'[' | b',' | b':');
            if next_structural || opener_before {
                escaped += 1;
            }
        } else {
            let prev_structural =
                i > 0 && matches!(bytes[i - 1], b'{' | b'[' | b',' | b':');
            if next_structural || prev_structural {
                plain += 1;
            }
        }
    }
    (escaped, plain)
}

/// Removes one layer of JSON string-escaping from the whole text. Sequences
/// that are not JSON escapes (a stray `\x` in page scripts) pass through
/// unchanged; an undecodable `\u` sequence is a hard error.
fn strip_layer(text: &str) -> Result<String, ExtractError> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.char_indices().peekable();
    while let Some((i, ch)) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.peek().map(|&(_, c)| c) {
            Some('"') => {
                out.push('"');
                chars.next();
            }
            Some('\\') => {
                out.push('\\');
                chars.next();
            }
            Some('/') => {
                out.push('/');
                chars.next();
            }
            Some('n') => {
                out.push('\n');
                chars.next();
            }
            Some('t') => {
                out.push('\t');
                chars.next();
            }
            Some('r') => {
                out.push('\r');
                chars.next();
            }
            Some('b') => {
                out.push('\u{0008}');
                chars.next();
            }
            Some('f') => {
                out.push('\u{000C}');
                chars.next();
            }
            Some('u') => {
                chars.next();
                out.push(decode_unicode_escape(&mut chars, i)?);
            }
            _ => out.push('\\'),
        }
    }
    Ok(out)
}

fn decode_unicode_escape(
    chars: &mut Peekable<CharIndices<'_>>,
    offset: usize,
) -> Result<char, ExtractError> {
    let unit = read_hex4(chars, offset)?;
    if (0xD800..0xDC00).contains(&unit) {
        // high surrogate: a low-surrogate escape must follow
        let followed = chars.next_if(|&(_, c)| c == '\\').is_some()
            && chars.next_if(|&(_, c)| c == 'u').is_some();
        if !followed {
            return Err(ExtractError::Normalization { offset });
        }
        let low = read_hex4(chars, offset)?;
        if !(0xDC00..0xE000).contains(&low) {
            return Err(ExtractError::Normalization { offset });
        }
        let code = 0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
        return char::from_u32(code).ok_or(ExtractError::Normalization { offset });
    }
    if (0xDC00..0xE000).contains(&unit) {
        return Err(ExtractError::Normalization { offset });
    }
    char::from_u32(unit).ok_or(ExtractError::Normalization { offset })
}

fn read_hex4(
    chars: &mut Peekable<CharIndices<'_>>,
    offset: usize,
) -> Result<u32, ExtractError> {
    let mut value = 0u32;
    for _ in 0..4 {
        let digit = chars
            .next()
            .and_then(|(_, c)| c.to_digit(16))
            .ok_or(ExtractError::Normalization { offset })?;
        value = value * 16 + digit;
    }
    Ok(value)
}
