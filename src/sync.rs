//! Batch orchestration: one clone per selected row.
//!
//! The orchestrator checks batch preconditions, then walks the rows in
//! order (clone, position, bind) and sums the per-clone outcomes into
//! one report. Clones are processed strictly sequentially so in-flight
//! image fetches for one clone can never resolve into another. A row
//! whose binding fails never stops the rows after it; failures are
//! counted, not fatal. Only precondition failures abort the batch, and
//! they abort it before any clone exists.

use serde::Serialize;
use tracing::{debug, info};

use crate::binding::{BindOutcome, ImageFetcher, bind_row};
use crate::error::SheetSyncError;
use crate::ingest::Row;
use crate::scene::{NodeId, NodeKind, Scene};

/// Vertical gap between stacked clones, in scene units.
pub const CLONE_GAP: f64 = 40.0;

/// Aggregated result of one sync batch, in the shape the UI collaborator
/// consumes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub clones_created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub missing_fields: Vec<String>,
}

impl SyncReport {
    /// One-line human summary for a completion notification.
    pub fn summary(&self) -> String {
        format!(
            "Created {} clone(s): {} updated, {} skipped, {} missing field(s)",
            self.clones_created,
            self.updated,
            self.skipped,
            self.missing_fields.len()
        )
    }
}

/// Clone the template once per row, bind each clone, and aggregate.
///
/// Preconditions checked up front, each fatal to the whole batch:
/// the template node must have an attachable parent, and the batch must
/// contain at least one row.
pub async fn sync_rows(
    scene: &mut Scene,
    template: NodeId,
    rows: &[Row],
    fetcher: &dyn ImageFetcher,
) -> Result<SyncReport, SheetSyncError> {
    let parent = scene.parent(template).ok_or_else(|| {
        SheetSyncError::Precondition(
            "the selected template has no parent to attach clones to".into(),
        )
    })?;
    if rows.is_empty() {
        return Err(SheetSyncError::Precondition(
            "no rows selected for sync".into(),
        ));
    }

    let template_name = scene.get(template).name.clone();
    let (base_x, base_y, step) = {
        let t = scene.get(template);
        (t.x, t.y, t.height + CLONE_GAP)
    };
    info!(template = %template_name, rows = rows.len(), "sync batch starting");

    let mut total = BindOutcome::default();
    let mut clones_created = 0usize;

    for (index, row) in rows.iter().enumerate() {
        debug!(row = index, phase = "cloning");
        let clone = create_clone(scene, template, parent);
        scene.get_mut(clone).name = format!("{} {}", template_name, index + 1);
        scene.set_position(clone, base_x, base_y + step * (index + 1) as f64);
        clones_created += 1;

        debug!(row = index, phase = "binding");
        let outcome = bind_row(scene, clone, row, fetcher).await;
        debug!(
            row = index,
            updated = outcome.updated,
            skipped = outcome.skipped,
            missing = outcome.missing.len(),
            "row bound"
        );
        total.absorb(outcome);
    }

    debug!(phase = "reporting");
    let report = SyncReport {
        clones_created,
        updated: total.updated,
        skipped: total.skipped,
        missing_fields: total.missing.into_iter().collect(),
    };
    info!("{}", report.summary());
    Ok(report)
}

/// Produce one clone of the template under `parent`.
///
/// A component template yields a live instance, and an instance template
/// with a resolvable origin yields a fresh instance of that origin; both
/// keep component semantics intact. Anything else, including an instance
/// whose origin does not resolve, falls back to a generic deep copy.
fn create_clone(scene: &mut Scene, template: NodeId, parent: NodeId) -> NodeId {
    match &scene.get(template).kind {
        NodeKind::Component(_) => scene
            .instantiate(template, parent)
            .unwrap_or_else(|_| scene.clone_subtree(template, parent)),
        NodeKind::Instance(_) => match scene.resolve_instance_origin(template) {
            Some(origin) => scene
                .instantiate(origin, parent)
                .unwrap_or_else(|_| scene.clone_subtree(template, parent)),
            None => scene.clone_subtree(template, parent),
        },
        _ => scene.clone_subtree(template, parent),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    struct NoFetch;

    #[async_trait]
    impl ImageFetcher for NoFetch {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>, SheetSyncError> {
            Err(SheetSyncError::Fetch(format!("no network in tests: {url}")))
        }
    }

    fn row(pairs: &[(&str, &str)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn template_scene() -> (Scene, NodeId) {
        let mut scene = Scene::new("Page");
        let card = scene.add_frame(scene.root, "Card");
        scene.get_mut(card).height = 120.0;
        scene.add_text(card, "#title", "placeholder");
        (scene, card)
    }

    #[tokio::test]
    async fn empty_batch_is_a_precondition_error() {
        let (mut scene, card) = template_scene();
        let err = sync_rows(&mut scene, card, &[], &NoFetch).await.unwrap_err();
        assert!(matches!(err, SheetSyncError::Precondition(_)));
        // No partial work: the page still only holds the template.
        assert_eq!(scene.children(scene.root).len(), 1);
    }

    #[tokio::test]
    async fn detached_template_is_a_precondition_error() {
        let (mut scene, _) = template_scene();
        let root = scene.root;
        let err = sync_rows(&mut scene, root, &[row(&[])], &NoFetch)
            .await
            .unwrap_err();
        assert!(matches!(err, SheetSyncError::Precondition(_)));
    }

    #[tokio::test]
    async fn clones_are_named_and_stacked_in_row_order() {
        let (mut scene, card) = template_scene();
        let rows = vec![row(&[("title", "A")]), row(&[("title", "B")])];
        let report = sync_rows(&mut scene, card, &rows, &NoFetch).await.unwrap();
        assert_eq!(report.clones_created, 2);
        assert_eq!(report.updated, 2);

        let page_children = scene.children(scene.root).to_vec();
        assert_eq!(page_children.len(), 3);
        let c1 = scene.get(page_children[1]);
        let c2 = scene.get(page_children[2]);
        assert_eq!(c1.name, "Card 1");
        assert_eq!(c2.name, "Card 2");
        assert_eq!(c1.y, 120.0 + CLONE_GAP);
        assert_eq!(c2.y, 2.0 * (120.0 + CLONE_GAP));
    }

    #[tokio::test]
    async fn component_template_clones_as_instances() {
        let mut scene = Scene::new("Page");
        let comp = scene.add_component(scene.root, "Card", vec![]);
        scene.add_text(comp, "#title", "placeholder");
        let report = sync_rows(&mut scene, comp, &[row(&[("title", "A")])], &NoFetch)
            .await
            .unwrap();
        assert_eq!(report.clones_created, 1);
        let clone = *scene.children(scene.root).last().unwrap();
        assert!(scene.get(clone).is_instance());
        assert_eq!(scene.resolve_instance_origin(clone), Some(comp));
    }

    #[tokio::test]
    async fn failures_are_counted_and_later_rows_still_bind() {
        let (mut scene, card) = template_scene();
        scene.add_shape(card, "#photo");
        let rows = vec![
            // Image fetch fails: photo skipped, title still updates.
            row(&[("title", "A"), ("photo", "https://x.test/a.png")]),
            row(&[("title", "B"), ("photo", "hide")]),
        ];
        let report = sync_rows(&mut scene, card, &rows, &NoFetch).await.unwrap();
        assert_eq!(report.clones_created, 2);
        assert_eq!(report.updated, 3);
        assert_eq!(report.skipped, 1);
        assert!(report.missing_fields.is_empty());
    }

    #[tokio::test]
    async fn missing_fields_are_deduplicated_across_rows() {
        let (mut scene, card) = template_scene();
        let rows = vec![row(&[]), row(&[])];
        let report = sync_rows(&mut scene, card, &rows, &NoFetch).await.unwrap();
        assert_eq!(report.missing_fields, vec!["title".to_string()]);
        assert_eq!(report.updated, 0);
        assert_eq!(report.skipped, 0);
    }

    #[test]
    fn report_serializes_with_the_ui_contract_field_names() {
        let report = SyncReport {
            clones_created: 2,
            updated: 3,
            skipped: 1,
            missing_fields: vec!["price".into()],
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["clonesCreated"], 2);
        assert_eq!(json["updated"], 3);
        assert_eq!(json["skipped"], 1);
        assert_eq!(json["missingFields"], serde_json::json!(["price"]));
    }
}
