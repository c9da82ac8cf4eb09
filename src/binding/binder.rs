//! Applying one row to one clone.
//!
//! The binder unions the clone's slot identifiers, classifies each row
//! value, and dispatches the matching update strategy across every node
//! bucketed under that identifier. Failures are counted, never fatal:
//! a missing row key records the identifier as missing without touching
//! any node; a failed mutation counts the node as skipped; a failed
//! per-identifier resource (image fetch, color parse) skips every node
//! that was waiting on it.
//!
//! Binding the same (clone, row) pair twice settles on the same node
//! states, apart from remote image bytes changing under the URL.

use std::collections::BTreeSet;
use tracing::debug;

use super::classify::{FieldKind, apply_image_override, classify};
use super::color::parse_hex_color;
use super::images::{ImageFetcher, normalize_image_url};
use super::scan::collect_nodes_by_tag;
use super::special::{is_special_prefixed, strip_special_prefix, visibility_action};
use super::variants::{VariantFamily, resolve_strict};
use crate::error::SheetSyncError;
use crate::ingest::Row;
use crate::scene::{NodeId, Paint, Scene};

/// Tally of one clone's binding. Counts only ever grow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindOutcome {
    /// Nodes whose content, fills, visibility, or properties changed.
    pub updated: usize,
    /// Nodes left untouched because their update failed or did not apply.
    pub skipped: usize,
    /// Slot identifiers discovered in the clone but absent from the row.
    pub missing: BTreeSet<String>,
}

impl BindOutcome {
    /// Fold another clone's outcome into a batch total.
    pub fn absorb(&mut self, other: BindOutcome) {
        self.updated += other.updated;
        self.skipped += other.skipped;
        self.missing.extend(other.missing);
    }
}

/// Bind one row to the clone rooted at `root`.
pub async fn bind_row(
    scene: &mut Scene,
    root: NodeId,
    row: &Row,
    fetcher: &dyn ImageFetcher,
) -> BindOutcome {
    let buckets = collect_nodes_by_tag(scene, root);
    let mut out = BindOutcome::default();

    for tag in buckets.tags() {
        let Some(value) = row.get(&tag) else {
            out.missing.insert(tag);
            continue;
        };
        let kind = apply_image_override(&tag, classify(value, Some(&tag)));
        debug!(%tag, ?kind, "binding slot");

        if let Some(ids) = buckets.text.get(&tag) {
            for &id in ids {
                bind_text_node(scene, id, value, kind, &mut out);
            }
        }
        if let Some(ids) = buckets.fillable.get(&tag) {
            bind_fillable_nodes(scene, ids, value, kind, fetcher, &mut out).await;
        }
        if let Some(ids) = buckets.instances.get(&tag) {
            bind_instance_nodes(scene, ids, value, &mut out);
        }
    }
    out
}

fn bind_text_node(
    scene: &mut Scene,
    id: NodeId,
    value: &str,
    kind: FieldKind,
    out: &mut BindOutcome,
) {
    // Directives come before content: /show and /hide toggle visibility.
    if let Some(action) = visibility_action(value, true) {
        scene.set_visible(id, action.visible());
        out.updated += 1;
        return;
    }
    // Any other special-prefixed value is a directive, never literal
    // text. The only recognized one is color-on-text.
    if is_special_prefixed(value) {
        let directive = strip_special_prefix(value);
        match parse_hex_color(directive) {
            Some(color) if scene.set_text_fill(id, color).is_ok() => out.updated += 1,
            _ => out.skipped += 1,
        }
        return;
    }
    match scene.set_characters(id, value) {
        Ok(()) => {
            // A text node cannot bear an image fill; non-link kinds fall
            // back to their literal string. Link annotation failure is
            // swallowed; the content set still counts.
            if kind == FieldKind::Link {
                let _ = scene.set_hyperlink(id, value.trim());
            }
            out.updated += 1;
        }
        Err(e) => {
            debug!(error = %e, "text mutation failed, skipping node");
            out.skipped += 1;
        }
    }
}

async fn bind_fillable_nodes(
    scene: &mut Scene,
    ids: &[NodeId],
    value: &str,
    kind: FieldKind,
    fetcher: &dyn ImageFetcher,
    out: &mut BindOutcome,
) {
    // Visibility applies unprefixed here, independent of classified type.
    if let Some(action) = visibility_action(value, false) {
        for &id in ids {
            scene.set_visible(id, action.visible());
            out.updated += 1;
        }
        return;
    }
    match kind {
        FieldKind::Image => {
            // One fetch per identifier, shared across every matching node.
            match fetch_image_fill(scene, value, fetcher).await {
                Ok(paint) => {
                    for &id in ids {
                        match scene.set_fills(id, vec![paint.clone()]) {
                            Ok(()) => out.updated += 1,
                            Err(_) => out.skipped += 1,
                        }
                    }
                }
                Err(e) => {
                    debug!(error = %e, "image fetch failed, skipping {} node(s)", ids.len());
                    out.skipped += ids.len();
                }
            }
        }
        FieldKind::Color => match parse_hex_color(value) {
            Some(color) => {
                for &id in ids {
                    match scene.set_fills(id, vec![Paint::solid(color)]) {
                        Ok(()) => out.updated += 1,
                        Err(_) => out.skipped += 1,
                    }
                }
            }
            None => out.skipped += ids.len(),
        },
        // Text, links, and variant expressions have no meaning on a
        // bare shape; the fill stays untouched.
        _ => out.skipped += ids.len(),
    }
}

async fn fetch_image_fill(
    scene: &mut Scene,
    value: &str,
    fetcher: &dyn ImageFetcher,
) -> Result<Paint, SheetSyncError> {
    let url = normalize_image_url(value.trim());
    let bytes = fetcher.fetch(&url).await?;
    let handle = scene.create_image(&bytes)?;
    Ok(Paint::image(handle))
}

fn bind_instance_nodes(scene: &mut Scene, ids: &[NodeId], value: &str, out: &mut BindOutcome) {
    if value.contains('=') {
        // Strict variant assignment, all-or-nothing per instance.
        for &id in ids {
            let updates = scene
                .resolve_instance_origin(id)
                .and_then(|origin| VariantFamily::from_scene(scene, origin))
                .and_then(|family| resolve_strict(&family, value));
            match updates {
                Some(updates) if scene.set_instance_properties(id, &updates).is_ok() => {
                    out.updated += 1
                }
                _ => out.skipped += 1,
            }
        }
    } else {
        // A bare value names a component to swap in.
        match scene.find_component_by_name(scene.root, value) {
            Some(component) => {
                for &id in ids {
                    match scene.swap_instance(id, component) {
                        Ok(()) => out.updated += 1,
                        Err(_) => out.skipped += 1,
                    }
                }
            }
            None => out.skipped += ids.len(),
        }
    }
}
