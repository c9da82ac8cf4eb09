//! Reserved value directives.
//!
//! `show` / `hide` toggle node visibility instead of writing content. On
//! fill-capable nodes the bare word is enough; on text nodes the value
//! must carry the special marker (`/show`) so that literal text equal to
//! the word "show" still renders as text. Any other `/`-prefixed value on
//! a text node is a special directive (currently color-on-text); an
//! unrecognized special is skipped, never written out literally.

/// Reserved leading character distinguishing directives from literal text.
pub const SPECIAL_MARKER: char = '/';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityAction {
    Show,
    Hide,
}

impl VisibilityAction {
    pub fn visible(self) -> bool {
        matches!(self, VisibilityAction::Show)
    }
}

/// Whether a raw value carries the special marker.
pub fn is_special_prefixed(raw: &str) -> bool {
    raw.trim().starts_with(SPECIAL_MARKER)
}

/// Strip the special marker and surrounding whitespace, if present.
pub fn strip_special_prefix(raw: &str) -> &str {
    let s = raw.trim();
    s.strip_prefix(SPECIAL_MARKER).map(str::trim).unwrap_or(s)
}

/// Interpret a raw value as a visibility directive.
///
/// `requires_marker` is true for text nodes, where only `/show` / `/hide`
/// count; fill-capable nodes accept the bare words.
pub fn visibility_action(raw: &str, requires_marker: bool) -> Option<VisibilityAction> {
    let s = raw.trim();
    let word = if requires_marker {
        if !s.starts_with(SPECIAL_MARKER) {
            return None;
        }
        strip_special_prefix(s)
    } else {
        s
    };
    match word.to_ascii_lowercase().as_str() {
        "show" => Some(VisibilityAction::Show),
        "hide" => Some(VisibilityAction::Hide),
        _ => None,
    }
}
