//! Content-type classification for cell values.
//!
//! Classification is layered: empty values short-circuit to text, slot-name
//! hints (`variant`, `color`, image vocabulary) come next, then value-shape
//! sniffing (URL, hex literal, `=` pairs), and finally text as the catch-all.
//! Ambiguity is never an error: anything unmatched is plain text.

use url::Url;

use super::color::HEX_LITERAL_RE;

/// Which update strategy applies to a cell value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Link,
    Image,
    Color,
    Variant,
}

/// Slot-name vocabulary that marks a slot as image-bearing.
const IMAGE_VOCAB: [&str; 8] = [
    "image",
    "img",
    "photo",
    "picture",
    "thumbnail",
    "thumb",
    "avatar",
    "icon",
];

/// Whether a slot identifier names an image slot (`cover_image`, `avatar2`).
pub fn tag_is_image(tag: &str) -> bool {
    let tag = tag.to_ascii_lowercase();
    IMAGE_VOCAB.iter().any(|word| tag.contains(word))
}

fn tag_is_color(tag: &str) -> bool {
    let tag = tag.to_ascii_lowercase();
    tag.contains("color") || tag.contains("colour")
}

fn tag_is_variant(tag: &str) -> bool {
    tag.to_ascii_lowercase().contains("variant")
}

const IMAGE_EXTENSIONS: [&str; 6] = [".png", ".jpg", ".jpeg", ".gif", ".webp", ".svg"];

/// Hosts that serve raw image content (CDN / user-content / cloud drive).
fn host_serves_images(host: &str) -> bool {
    host.ends_with("googleusercontent.com") || host.contains("drive.google.com")
}

fn classify_url(value: &str) -> FieldKind {
    // A malformed string that still starts with the scheme is a link,
    // never downgraded to text.
    let Ok(url) = Url::parse(value) else {
        return FieldKind::Link;
    };
    let host = url.host_str().unwrap_or("").to_ascii_lowercase();
    let path = url.path().to_ascii_lowercase();
    if IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) || host_serves_images(&host) {
        FieldKind::Image
    } else {
        FieldKind::Link
    }
}

/// Classify a raw cell value, optionally hinted by its slot identifier.
/// Precedence is fixed; the first matching rule wins.
pub fn classify(value: &str, tag: Option<&str>) -> FieldKind {
    let v = value.trim();
    if v.is_empty() {
        return FieldKind::Text;
    }
    if let Some(tag) = tag {
        if tag_is_variant(tag) {
            return FieldKind::Variant;
        }
        if tag_is_color(tag) {
            return FieldKind::Color;
        }
        if tag_is_image(tag) {
            return FieldKind::Image;
        }
    }
    if v.starts_with("http://") || v.starts_with("https://") {
        return classify_url(v);
    }
    if HEX_LITERAL_RE.is_match(v) {
        return FieldKind::Color;
    }
    if v.contains('=') {
        return FieldKind::Variant;
    }
    FieldKind::Text
}

/// Final override applied by the row binder: an image-named slot forces
/// `Image` regardless of what the value looked like, unless the classifier
/// already said `Image`.
pub fn apply_image_override(tag: &str, kind: FieldKind) -> FieldKind {
    if kind != FieldKind::Image && tag_is_image(tag) {
        FieldKind::Image
    } else {
        kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_is_text_before_any_hint() {
        assert_eq!(classify("", Some("cover_image")), FieldKind::Text);
        assert_eq!(classify("   ", Some("variant_kind")), FieldKind::Text);
    }

    #[test]
    fn name_hints_take_precedence_over_value_shape() {
        // A plain word in an image-named slot classifies as image.
        assert_eq!(classify("notes", Some("cover_image")), FieldKind::Image);
        assert_eq!(classify("#F00", Some("primary_variant")), FieldKind::Variant);
        assert_eq!(
            classify("https://a.example/x", Some("brand_colour")),
            FieldKind::Color
        );
    }

    #[test]
    fn url_extension_and_host_rules() {
        assert_eq!(
            classify("https://cdn.example.com/a.png", None),
            FieldKind::Image
        );
        assert_eq!(
            classify("https://lh3.googleusercontent.com/abc", None),
            FieldKind::Image
        );
        assert_eq!(
            classify("https://drive.google.com/file/d/ID/view", None),
            FieldKind::Image
        );
        assert_eq!(classify("https://example.com/page", None), FieldKind::Link);
    }

    #[test]
    fn malformed_url_with_scheme_stays_link() {
        assert_eq!(classify("http://", None), FieldKind::Link);
        assert_eq!(classify("https://exa mple", None), FieldKind::Link);
    }

    #[test]
    fn value_shape_rules() {
        assert_eq!(classify("#F00", None), FieldKind::Color);
        assert_eq!(classify("#0000FFAA", None), FieldKind::Color);
        // 1- and 2-digit forms are codec territory, not classifier territory.
        assert_eq!(classify("#A", None), FieldKind::Text);
        assert_eq!(classify("Size=Large", None), FieldKind::Variant);
        assert_eq!(classify("hello world", None), FieldKind::Text);
    }

    #[test]
    fn image_override_never_downgrades() {
        assert_eq!(
            apply_image_override("photo_link", FieldKind::Link),
            FieldKind::Image
        );
        assert_eq!(
            apply_image_override("cover_image", FieldKind::Image),
            FieldKind::Image
        );
        assert_eq!(apply_image_override("title", FieldKind::Text), FieldKind::Text);
    }
}
