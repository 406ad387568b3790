//! Text escaping and the rich-text scrub pipeline.
//!
//! [`add_slashes`] and [`strip_slashes`] are exact inverses, so text written
//! through the default escape policy reads back byte for byte. The scrub
//! pipeline ([`scrub_rich_text`]) runs entity decode, newline-to-break,
//! URL-decode, and markup strip in that order, which catches markup that
//! arrives URL-encoded.

/// Backslash-escape the characters MySQL-style escaping cares about.
#[must_use]
pub fn add_slashes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\0' => out.push_str("\\0"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{1a}' => out.push_str("\\Z"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            _ => out.push(c),
        }
    }
    out
}

/// Undo [`add_slashes`]. A dangling trailing backslash is dropped.
#[must_use]
pub fn strip_slashes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('0') => out.push('\0'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('Z') => out.push('\u{1a}'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

/// Decode a small set of named HTML entities plus numeric references.
///
/// Single pass: output is not re-scanned, so `&amp;lt;` becomes `&lt;`.
/// Unrecognized or unterminated entities are left as written.
#[must_use]
pub fn decode_html_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '&' {
            out.push(c);
            continue;
        }
        let mut body = String::new();
        let mut terminated = false;
        while let Some(&next) = chars.peek() {
            if next == ';' {
                chars.next();
                terminated = true;
                break;
            }
            // Entity bodies are short; a stray '&' starts over.
            if body.len() >= 30 || next == '&' || next.is_whitespace() {
                break;
            }
            body.push(next);
            chars.next();
        }
        match decode_entity(&body) {
            Some(decoded) if terminated => out.push(decoded),
            _ => {
                out.push('&');
                out.push_str(&body);
                if terminated {
                    out.push(';');
                }
            }
        }
    }
    out
}

fn decode_entity(body: &str) -> Option<char> {
    if let Some(num) = body.strip_prefix('#') {
        let code = if let Some(hex) = num.strip_prefix(['x', 'X']) {
            u32::from_str_radix(hex, 16).ok()?
        } else {
            num.parse::<u32>().ok()?
        };
        return char::from_u32(code);
    }
    match body {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => None,
    }
}

/// Insert `<br />` before every newline sequence, keeping the newline.
/// `\r\n` and `\n\r` pairs count as one sequence.
#[must_use]
pub fn newlines_to_breaks(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' | '\n' => {
                out.push_str("<br />");
                out.push(c);
                if let Some(&next) = chars.peek() {
                    if (next == '\r' || next == '\n') && next != c {
                        out.push(next);
                        chars.next();
                    }
                }
            }
            _ => out.push(c),
        }
    }
    out
}

/// Decode `+` to space and `%XX` sequences. Malformed sequences are kept as
/// written; invalid UTF-8 after decoding is replaced, never an error.
#[must_use]
pub fn url_decode(text: &str) -> String {
    let plus_to_space = text.replace('+', " ");
    let decoded = urlencoding::decode_binary(plus_to_space.as_bytes());
    String::from_utf8_lossy(&decoded).into_owned()
}

/// Remove `<...>` markup runs, including comments. An unterminated tag or
/// comment swallows the rest of the input.
#[must_use]
pub fn strip_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        let after = &rest[open..];
        if let Some(comment) = after.strip_prefix("<!--") {
            match comment.find("-->") {
                Some(end) => rest = &comment[end + 3..],
                None => return out,
            }
        } else {
            match after.find('>') {
                Some(end) => rest = &after[end + 1..],
                None => return out,
            }
        }
    }
    out.push_str(rest);
    out
}

/// The full scrub applied to rich-text parameters before driver escaping.
#[must_use]
pub fn scrub_rich_text(text: &str) -> String {
    let decoded = decode_html_entities(text);
    let with_breaks = newlines_to_breaks(&decoded);
    let unencoded = url_decode(&with_breaks);
    strip_markup(&unencoded)
}
