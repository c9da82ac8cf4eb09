//! # Row-to-Template Binding Engine
//!
//! Everything between a normalized data row and a mutated clone subtree:
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`tag`] | Slot-marker extraction and key normalization |
//! | [`classify`] | Content-type classification with layered heuristics |
//! | [`color`] | Compact hex color literals |
//! | [`variants`] | Variant-assignment parsing and validation |
//! | [`images`] | Byte fetch capability, drive-link normalization |
//! | [`special`] | Reserved value directives (`show`/`hide`, `/` marker) |
//! | [`scan`] | One-pass node bucketing by slot identifier |
//! | [`binder`] | Per-clone dispatch and outcome tallying |
//!
//! The engine only touches the scene through the capability surface in
//! [`crate::scene`] and only touches the network through [`ImageFetcher`].

pub mod binder;
pub mod classify;
pub mod color;
pub mod images;
pub mod scan;
pub mod special;
pub mod tag;
pub mod variants;

pub use binder::{BindOutcome, bind_row};
pub use classify::{FieldKind, apply_image_override, classify};
pub use color::parse_hex_color;
pub use images::{
    BridgeFetcher, BridgeMessage, DEFAULT_FETCH_TIMEOUT, FetchRequest, FetchResponse,
    HttpImageFetcher, ImageFetcher, normalize_image_url,
};
pub use scan::{NodeBuckets, collect_nodes_by_tag};
pub use special::{VisibilityAction, visibility_action};
pub use tag::{find_tag, normalize_key};
pub use variants::{Assignment, VariantFamily, parse_assignments, resolve_lenient, resolve_strict};
