//! Slot-marker extraction from node display names.
//!
//! A node opts into binding by carrying `#identifier` somewhere in its
//! name (`"#title"`, `"Card #Product_Name"`). The first `#` followed by a
//! word character starts the marker; the body runs to the end of the name
//! and is normalized with [`normalize_key`]. That same normalization turns
//! spreadsheet column labels into row keys, so a `"My Tag!"` column and a
//! `"#My Tag!"` node meet at the identifier `my_tag`.

use regex::Regex;
use std::sync::LazyLock;

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#([A-Za-z0-9_].*)").expect("valid tag pattern"));

/// Lowercase and collapse every non-`[a-z0-9]` run to a single underscore.
/// Leading and trailing runs are dropped rather than kept as underscores,
/// so `"My Tag!"` and `"my_tag"` normalize identically.
pub fn normalize_key(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_sep = false;
    for c in s.chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(c);
        } else {
            pending_sep = true;
        }
    }
    out
}

/// Extract the slot identifier from a display name, if any.
///
/// Never fails on arbitrary input; a name without a marker simply has no
/// identifier and is excluded from binding.
pub fn find_tag(name: &str) -> Option<String> {
    let body = &TAG_RE.captures(name)?[1];
    let key = normalize_key(body);
    if key.is_empty() { None } else { Some(key) }
}
