//! Payload normalization.
//!
//! # Responsibilities
//! - Decode layered percent-encoding (bounded, fixpoint-stopped)
//! - Decode HTML entities and fold Unicode to NFKC
//! - Collapse whitespace and cap value length
//! - Build the combined `key=value` payload the detector scans
//!
//! # Design Decisions
//! - Normalization never fails a request: every stage is total, and lossy
//!   UTF-8 decoding keeps whatever could be decoded
//! - Idempotent once percent-decoding reaches its fixpoint

use percent_encoding::percent_decode_str;
use serde_json::Value;
use unicode_normalization::UnicodeNormalization;

use crate::http::request::RequestContext;

/// Decode rounds for nested percent-encoding. Bounded so malformed input
/// cannot loop; stops early at a fixpoint.
const MAX_DECODE_ROUNDS: usize = 3;

/// Normalize a single parameter value.
///
/// Steps, in order: repeated `+`-as-space percent-decoding (up to
/// [`MAX_DECODE_ROUNDS`]), HTML entity decoding, Unicode NFKC, whitespace
/// trim-and-collapse, truncation to `max_len` characters.
pub fn normalize_value(value: &str, max_len: usize) -> String {
    let mut current = value.to_string();
    for _ in 0..MAX_DECODE_ROUNDS {
        let decoded = percent_decode_plus(&current);
        if decoded == current {
            break;
        }
        current = decoded;
    }

    let decoded = decode_entities(&current);
    let folded: String = decoded.nfkc().collect();
    let collapsed = folded.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_chars(collapsed, max_len)
}

/// One percent-decoding pass with `+` treated as space.
fn percent_decode_plus(input: &str) -> String {
    let spaced = input.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

/// Decode named core entities plus `&#NNN;` / `&#xHH;` numeric forms.
/// Unknown or malformed entities are kept verbatim.
fn decode_entities(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        // Entity names are short; a distant semicolon is not an entity.
        if let Some(semi) = after.find(';').filter(|&off| (1..=32).contains(&off)) {
            if let Some(decoded) = decode_entity(&after[..semi]) {
                out.push(decoded);
                rest = &after[semi + 1..];
                continue;
            }
        }
        out.push('&');
        rest = after;
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let rest = name.strip_prefix('#')?;
            let code = if let Some(hex) = rest.strip_prefix(['x', 'X']) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                rest.parse::<u32>().ok()?
            };
            char::from_u32(code)
        }
    }
}

/// HTML-escape a payload the way a template layer would (`&`, `<`, `>`,
/// `"`, `'`). Used for the second detection pass.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
    out
}

fn truncate_chars(mut value: String, max_len: usize) -> String {
    if let Some((idx, _)) = value.char_indices().nth(max_len) {
        value.truncate(idx);
    }
    value
}

/// Build the combined detection payload for a request: `key=value` tokens for
/// every query pair, form field, and JSON top-level member (non-string values
/// rendered as JSON), each value independently normalized, followed by the
/// normalized raw body, joined with single spaces.
pub fn combined_payload(ctx: &RequestContext, max_len: usize) -> String {
    let mut parts: Vec<String> = Vec::new();

    for (key, value) in &ctx.query {
        parts.push(format!("{key}={}", normalize_value(value, max_len)));
    }
    for (key, value) in &ctx.form {
        parts.push(format!("{key}={}", normalize_value(value, max_len)));
    }
    match &ctx.json {
        Some(Value::Object(map)) => {
            for (key, value) in map {
                let rendered = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                parts.push(format!("{key}={}", normalize_value(&rendered, max_len)));
            }
        }
        Some(Value::Null) | None => {}
        Some(other) => parts.push(normalize_value(&other.to_string(), max_len)),
    }

    if !ctx.raw_body.is_empty() {
        let raw = String::from_utf8_lossy(&ctx.raw_body);
        parts.push(normalize_value(&raw, max_len));
    }

    parts.retain(|p| !p.is_empty());
    parts.join(" ")
}
