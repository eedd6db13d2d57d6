//! Structural checks applied to raw model output before it can become part
//! of a record. Output is cleaned of wrapping quotes and fences, then either
//! accepted as-is or rejected. Nothing is truncated to make it fit.

use ng_core::{Category, FieldKind, ValidationFailure, ValidationReason};

const QUOTE_PAIRS: &[(char, char)] = &[
    ('"', '"'),
    ('\'', '\''),
    ('`', '`'),
    ('\u{201C}', '\u{201D}'),
    ('\u{2018}', '\u{2019}'),
    ('\u{00AB}', '\u{00BB}'),
];

pub fn validate(kind: FieldKind, raw: &str) -> Result<String, ValidationFailure> {
    let value = normalize(raw);
    let reject = |reason| Err(ValidationFailure::new(kind, reason));

    if value.chars().all(is_quote_char) {
        return reject(ValidationReason::Empty);
    }

    match kind.max_chars() {
        Some(max) => {
            if matches!(kind, FieldKind::Title | FieldKind::Headline) && value.contains('\n') {
                return reject(ValidationReason::MultiLine);
            }
            let len = value.chars().count();
            if len > max {
                return reject(ValidationReason::TooLong { len, max });
            }
            Ok(value.to_string())
        }
        None => {
            match value.parse::<Category>() {
                Ok(category) => Ok(category.as_str().to_string()),
                Err(_) => reject(ValidationReason::NotInVocabulary(value.to_string())),
            }
        }
    }
}

fn is_quote_char(c: char) -> bool {
    QUOTE_PAIRS.iter().any(|&(open, close)| c == open || c == close)
}

/// Trim whitespace, a surrounding code fence and any wrapping quote pair that
/// encloses the whole value.
pub fn normalize(raw: &str) -> &str {
    let mut value = strip_fence(raw.trim()).trim();

    loop {
        let stripped = strip_quote_pair(value);
        if stripped.len() == value.len() {
            return value;
        }
        value = stripped.trim();
    }
}

fn strip_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let Some(inner) = rest.strip_suffix("```") else {
        return text;
    };
    // Drop an info string such as ```text on the opening line.
    match inner.split_once('\n') {
        Some((info, body)) if !info.trim().contains(' ') => body,
        _ => inner,
    }
}

fn strip_quote_pair(text: &str) -> &str {
    let mut chars = text.chars();
    let (Some(first), Some(last)) = (chars.next(), chars.next_back()) else {
        return text;
    };
    let Some(&(open, close)) = QUOTE_PAIRS
        .iter()
        .find(|&&(open, close)| first == open && last == close)
    else {
        return text;
    };
    let inner = &text[first.len_utf8()..text.len() - last.len_utf8()];
    // Only a pair that wraps everything; "A" and "B" keeps its quotes.
    if inner.contains(open) || inner.contains(close) {
        text
    } else {
        inner
    }
}
