//! Object key case normalization (`snake_case` → `camelCase`).
//!
//! Rules:
//! - Only `_` is a word separator. Other punctuation is copied verbatim.
//! - Leading and trailing underscores are preserved (`_id`, `value_`, `__init__`).
//! - A run of interior underscores is removed as a whole and the character that follows
//!   the run is uppercased (`user_id` → `userId`, `a__b` → `aB`).
//! - Nothing is lowercased, so `HTTP_status` becomes `HTTPStatus` and `user_ID` stays `userID`.
//!
//! After one pass no interior underscore survives, so the conversion is idempotent.

use std::borrow::Cow;

/// Convert a single key. Borrows the input when it contains no interior separator.
pub fn snake_to_camel(key: &str) -> Cow<'_, str> {
    let Some((start, end)) = interior_bounds(key) else {
        return Cow::Borrowed(key);
    };
    let interior = &key[start..end];
    if !interior.contains('_') {
        return Cow::Borrowed(key);
    }

    let mut out = String::with_capacity(key.len());
    out.push_str(&key[..start]);
    let mut uppercase_next = false;
    for ch in interior.chars() {
        if ch == '_' {
            uppercase_next = true;
        } else if uppercase_next {
            out.extend(ch.to_uppercase());
            uppercase_next = false;
        } else {
            out.push(ch);
        }
    }
    out.push_str(&key[end..]);
    Cow::Owned(out)
}

/// Convert `key` in place, returning whether it changed.
pub(crate) fn normalize_in_place(key: &mut Box<str>) -> bool {
    match snake_to_camel(key) {
        Cow::Borrowed(_) => false,
        Cow::Owned(converted) => {
            *key = converted.into_boxed_str();
            true
        }
    }
}

/// Byte range of `key` between its leading and trailing underscore runs.
///
/// Returns `None` when the key is empty or consists of underscores only.
fn interior_bounds(key: &str) -> Option<(usize, usize)> {
    let start = key.find(|c: char| c != '_')?;
    let end = key.rfind(|c: char| c != '_')?;
    let last_len = key[end..].chars().next().map_or(1, char::len_utf8);
    Some((start, end + last_len))
}
