//! One-pass bucketing of a subtree's tagged nodes.
//!
//! Every node in the clone is routed to at most one bucket by capability
//! precedence: instance > text > generic fill. Untagged nodes are
//! traversed through but never bucketed. Buckets are built fresh per
//! clone and discarded after binding; node ids from one clone must never
//! leak into another's binding pass.

use std::collections::{BTreeMap, BTreeSet};

use super::tag::find_tag;
use crate::scene::{NodeId, Scene};

/// Tagged nodes of one clone, keyed by slot identifier. Within a key,
/// nodes appear in document (pre-order) order.
#[derive(Debug, Default)]
pub struct NodeBuckets {
    pub text: BTreeMap<String, Vec<NodeId>>,
    pub fillable: BTreeMap<String, Vec<NodeId>>,
    pub instances: BTreeMap<String, Vec<NodeId>>,
}

impl NodeBuckets {
    /// Union of slot identifiers across all three buckets, in a stable
    /// (sorted) iteration order.
    pub fn tags(&self) -> BTreeSet<String> {
        self.text
            .keys()
            .chain(self.fillable.keys())
            .chain(self.instances.keys())
            .cloned()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.fillable.is_empty() && self.instances.is_empty()
    }
}

/// Walk the subtree at `root` once and bucket tagged descendants.
///
/// A pure function of the subtree's current state: re-run per clone,
/// never cached across clones.
pub fn collect_nodes_by_tag(scene: &Scene, root: NodeId) -> NodeBuckets {
    let mut buckets = NodeBuckets::default();
    for id in scene.descendants(root) {
        let node = scene.get(id);
        let Some(tag) = find_tag(&node.name) else {
            continue;
        };
        if node.is_instance() {
            buckets.instances.entry(tag).or_default().push(id);
        } else if node.is_text() {
            buckets.text.entry(tag).or_default().push(id);
        } else if node.fills().is_some() {
            buckets.fillable.entry(tag).or_default().push(id);
        }
    }
    buckets
}
