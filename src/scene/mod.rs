//! # In-Memory Scene Graph
//!
//! A single type hierarchy that is both the Rust API and the JSON API.
//! `Scene` is constructible in Rust and deserializable from JSON, so a
//! template can be authored as a `.json` file and bound directly.
//!
//! ```ignore
//! use sheetsync::scene::*;
//!
//! let mut scene = Scene::new("Page 1");
//! let frame = scene.add_frame(scene.root, "Card #template");
//! scene.add_text(frame, "#title", "placeholder");
//! ```
//!
//! The scene stands in for the host document API: it provides exactly the
//! capability surface the binding engine consumes: traversal, subtree
//! cloning, component instantiation and swapping, font loading before text
//! mutation, and image registration for fills. Host-specific concerns
//! (rendering, persistence of image bytes) stay out.

pub mod node;

pub use node::{
    ComponentNode, FontName, FrameNode, ImageHandle, InstanceNode, Node, NodeId, NodeKind, Paint,
    Rgba, ScaleMode, ShapeNode, TextNode,
};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use crate::error::SheetSyncError;

/// Arena-backed scene graph.
///
/// Nodes live in a flat arena and reference each other by [`NodeId`].
/// Detached nodes (e.g. the previous children of a swapped instance) stay
/// in the arena but are unreachable from the root; the arena never frees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    nodes: Vec<Node>,
    pub root: NodeId,
    /// Fonts the host can load. Empty means every font is available,
    /// which is the right default for templates loaded from JSON.
    #[serde(default)]
    available_fonts: Vec<FontName>,
    /// Registered image bytes by content hash. Not serialized; fills
    /// reference images by hash only.
    #[serde(skip)]
    images: HashMap<String, Vec<u8>>,
}

impl Scene {
    /// Create a scene whose root is a frame with the given name.
    pub fn new(root_name: impl Into<String>) -> Self {
        let root = Node::new(root_name, NodeKind::Frame(FrameNode::default()));
        Self {
            nodes: vec![root],
            root: NodeId(0),
            available_fonts: Vec::new(),
            images: HashMap::new(),
        }
    }

    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Append a node under `parent` and return its id.
    pub fn add(&mut self, parent: NodeId, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        let mut node = node;
        node.parent = Some(parent);
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn add_frame(&mut self, parent: NodeId, name: impl Into<String>) -> NodeId {
        self.add(parent, Node::new(name, NodeKind::Frame(FrameNode::default())))
    }

    pub fn add_text(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        characters: impl Into<String>,
    ) -> NodeId {
        self.add(
            parent,
            Node::new(name, NodeKind::Text(TextNode::new(characters))),
        )
    }

    pub fn add_shape(&mut self, parent: NodeId, name: impl Into<String>) -> NodeId {
        self.add(parent, Node::new(name, NodeKind::Shape(ShapeNode::default())))
    }

    pub fn add_component_set(&mut self, parent: NodeId, name: impl Into<String>) -> NodeId {
        self.add(parent, Node::new(name, NodeKind::ComponentSet))
    }

    pub fn add_component(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        variant_properties: Vec<(String, String)>,
    ) -> NodeId {
        self.add(
            parent,
            Node::new(name, NodeKind::Component(ComponentNode { variant_properties })),
        )
    }

    // ------------------------------------------------------------------
    // Access
    // ------------------------------------------------------------------

    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Pre-order traversal of the subtree rooted at `id`, root included.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            out.push(n);
            for child in self.nodes[n.0].children.iter().rev() {
                stack.push(*child);
            }
        }
        out
    }

    /// Check the integrity of a scene that did not come from this API,
    /// e.g. a hand-edited template JSON. Every node reference (children,
    /// parents, instance origins) must be in range, and the tree reachable
    /// from the root must be acyclic with each node attached exactly once.
    pub fn validate(&self) -> Result<(), SheetSyncError> {
        let in_range = |id: NodeId| id.0 < self.nodes.len();
        if !in_range(self.root) {
            return Err(SheetSyncError::Scene(format!(
                "root id {} is out of range",
                self.root.0
            )));
        }
        for node in &self.nodes {
            for &child in &node.children {
                if !in_range(child) {
                    return Err(SheetSyncError::Scene(format!(
                        "'{}' references missing child node {}",
                        node.name, child.0
                    )));
                }
            }
            if let Some(parent) = node.parent
                && !in_range(parent)
            {
                return Err(SheetSyncError::Scene(format!(
                    "'{}' references missing parent node {}",
                    node.name, parent.0
                )));
            }
            if let Some(inst) = node.as_instance()
                && let Some(main) = inst.main
                && !in_range(main)
            {
                return Err(SheetSyncError::Scene(format!(
                    "'{}' references missing component node {}",
                    node.name, main.0
                )));
            }
        }
        let mut seen = vec![false; self.nodes.len()];
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if seen[id.0] {
                return Err(SheetSyncError::Scene(format!(
                    "'{}' is attached more than once (cycle or shared child)",
                    self.nodes[id.0].name
                )));
            }
            seen[id.0] = true;
            stack.extend(self.nodes[id.0].children.iter().copied());
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Cloning and component semantics
    // ------------------------------------------------------------------

    /// Deep-copy the subtree at `src` under `parent`, preserving kinds,
    /// geometry, and instance origin references.
    pub fn clone_subtree(&mut self, src: NodeId, parent: NodeId) -> NodeId {
        let mut copy = self.nodes[src.0].clone();
        copy.children = Vec::new();
        copy.parent = Some(parent);
        let id = NodeId(self.nodes.len());
        self.nodes.push(copy);
        self.nodes[parent.0].children.push(id);
        let kids = self.nodes[src.0].children.clone();
        for kid in kids {
            self.clone_subtree(kid, id);
        }
        id
    }

    /// Create a live instance of `component` under `parent`.
    ///
    /// The instance inherits the component's name, geometry, and variant
    /// property values, and gets a deep copy of the component's children.
    pub fn instantiate(
        &mut self,
        component: NodeId,
        parent: NodeId,
    ) -> Result<NodeId, SheetSyncError> {
        let (name, props, geom) = {
            let n = &self.nodes[component.0];
            let comp = n.as_component().ok_or_else(|| {
                SheetSyncError::Scene(format!("'{}' is not a component", n.name))
            })?;
            (
                n.name.clone(),
                comp.variant_properties.clone(),
                (n.x, n.y, n.width, n.height),
            )
        };
        let mut inst = Node::new(
            name,
            NodeKind::Instance(InstanceNode {
                main: Some(component),
                properties: props,
            }),
        );
        (inst.x, inst.y, inst.width, inst.height) = geom;
        let id = self.add(parent, inst);
        let kids = self.nodes[component.0].children.clone();
        for kid in kids {
            self.clone_subtree(kid, id);
        }
        Ok(id)
    }

    /// The component an instance originates from, when it resolves.
    pub fn resolve_instance_origin(&self, instance: NodeId) -> Option<NodeId> {
        let main = self.nodes[instance.0].as_instance()?.main?;
        self.nodes.get(main.0)?.as_component()?;
        Some(main)
    }

    /// Swap an instance's underlying component, rebuilding its children
    /// from the new component. The old children are detached.
    pub fn swap_instance(
        &mut self,
        instance: NodeId,
        component: NodeId,
    ) -> Result<(), SheetSyncError> {
        let props = self.nodes[component.0]
            .as_component()
            .ok_or_else(|| {
                SheetSyncError::Scene(format!(
                    "swap target '{}' is not a component",
                    self.nodes[component.0].name
                ))
            })?
            .variant_properties
            .clone();
        {
            let node = &mut self.nodes[instance.0];
            let inst = node.as_instance_mut().ok_or_else(|| {
                SheetSyncError::Scene("swap target node is not an instance".into())
            })?;
            inst.main = Some(component);
            inst.properties = props;
        }
        for old_child in std::mem::take(&mut self.nodes[instance.0].children) {
            self.nodes[old_child.0].parent = None;
        }
        let kids = self.nodes[component.0].children.clone();
        for kid in kids {
            self.clone_subtree(kid, instance);
        }
        Ok(())
    }

    /// Find a component whose display name exactly equals `name`,
    /// searching the subtree at `scope` in document order.
    pub fn find_component_by_name(&self, scope: NodeId, name: &str) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|id| self.nodes[id.0].as_component().is_some() && self.nodes[id.0].name == name)
    }

    /// Sibling components sharing a family with `component`: the children
    /// of its component-set parent, or just the component itself when it
    /// has no set parent.
    pub fn family_members(&self, component: NodeId) -> Vec<NodeId> {
        if let Some(parent) = self.nodes[component.0].parent
            && matches!(self.nodes[parent.0].kind, NodeKind::ComponentSet)
        {
            return self.nodes[parent.0]
                .children
                .iter()
                .copied()
                .filter(|id| self.nodes[id.0].as_component().is_some())
                .collect();
        }
        vec![component]
    }

    // ------------------------------------------------------------------
    // Fonts and text mutation
    // ------------------------------------------------------------------

    /// Restrict loadable fonts. An empty set (the default) loads anything.
    pub fn set_available_fonts(&mut self, fonts: Vec<FontName>) {
        self.available_fonts = fonts;
    }

    /// Load the fonts a text node needs before its characters can change.
    pub fn load_fonts(&self, id: NodeId) -> Result<(), SheetSyncError> {
        let node = &self.nodes[id.0];
        let text = node
            .as_text()
            .ok_or_else(|| SheetSyncError::Scene(format!("'{}' is not a text node", node.name)))?;
        if self.available_fonts.is_empty() || self.available_fonts.contains(&text.font) {
            Ok(())
        } else {
            Err(SheetSyncError::Scene(format!(
                "font {} {} is not available",
                text.font.family, text.font.style
            )))
        }
    }

    /// Set a text node's characters. Fails when the node's font cannot
    /// be loaded, leaving the characters untouched.
    pub fn set_characters(&mut self, id: NodeId, characters: &str) -> Result<(), SheetSyncError> {
        self.load_fonts(id)?;
        let text = self.nodes[id.0].as_text_mut().expect("checked by load_fonts");
        text.characters = characters.to_string();
        Ok(())
    }

    /// Attach a hyperlink annotation over the full text range.
    /// Fails on an empty range.
    pub fn set_hyperlink(&mut self, id: NodeId, url: &str) -> Result<(), SheetSyncError> {
        let node = &mut self.nodes[id.0];
        let name = node.name.clone();
        let text = node
            .as_text_mut()
            .ok_or_else(|| SheetSyncError::Scene(format!("'{name}' is not a text node")))?;
        if text.characters.is_empty() {
            return Err(SheetSyncError::Scene(format!(
                "cannot hyperlink empty text range on '{name}'"
            )));
        }
        text.hyperlink = Some(url.to_string());
        Ok(())
    }

    /// Set the fill color of a text node's characters.
    pub fn set_text_fill(&mut self, id: NodeId, color: Rgba) -> Result<(), SheetSyncError> {
        let node = &mut self.nodes[id.0];
        let name = node.name.clone();
        let text = node
            .as_text_mut()
            .ok_or_else(|| SheetSyncError::Scene(format!("'{name}' is not a text node")))?;
        text.fill = Some(color);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Fills and images
    // ------------------------------------------------------------------

    /// Replace the fills of a fill-capable node.
    pub fn set_fills(&mut self, id: NodeId, fills: Vec<Paint>) -> Result<(), SheetSyncError> {
        let node = &mut self.nodes[id.0];
        let name = node.name.clone();
        match node.fills_mut() {
            Some(f) => {
                *f = fills;
                Ok(())
            }
            None => Err(SheetSyncError::Scene(format!(
                "'{name}' is not fill-capable"
            ))),
        }
    }

    /// Register image bytes with the scene, returning a content-hashed
    /// handle. Bytes that do not decode as an image are rejected, so a
    /// fill is never built from garbage.
    pub fn create_image(&mut self, bytes: &[u8]) -> Result<ImageHandle, SheetSyncError> {
        image::load_from_memory(bytes)
            .map_err(|e| SheetSyncError::Fetch(format!("undecodable image bytes: {e}")))?;
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        bytes.hash(&mut hasher);
        let hash = format!("{:016x}", hasher.finish());
        self.images.insert(hash.clone(), bytes.to_vec());
        Ok(ImageHandle { hash })
    }

    /// Bytes backing a registered image handle.
    pub fn image_bytes(&self, handle: &ImageHandle) -> Option<&[u8]> {
        self.images.get(&handle.hash).map(Vec::as_slice)
    }

    // ------------------------------------------------------------------
    // Visibility, properties, geometry
    // ------------------------------------------------------------------

    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        self.nodes[id.0].visible = visible;
    }

    /// Update exactly the named variant properties on an instance,
    /// preserving every other current value.
    pub fn set_instance_properties(
        &mut self,
        id: NodeId,
        updates: &[(String, String)],
    ) -> Result<(), SheetSyncError> {
        let node = &mut self.nodes[id.0];
        let name = node.name.clone();
        let inst = node
            .as_instance_mut()
            .ok_or_else(|| SheetSyncError::Scene(format!("'{name}' is not an instance")))?;
        for (key, value) in updates {
            match inst.properties.iter_mut().find(|(k, _)| k == key) {
                Some(slot) => slot.1 = value.clone(),
                None => inst.properties.push((key.clone(), value.clone())),
            }
        }
        Ok(())
    }

    pub fn set_position(&mut self, id: NodeId, x: f64, y: f64) {
        let node = &mut self.nodes[id.0];
        node.x = x;
        node.y = y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn scene_with_family() -> (Scene, NodeId, NodeId) {
        let mut scene = Scene::new("Page");
        let set = scene.add_component_set(scene.root, "Button");
        let a = scene.add_component(
            set,
            "Size=Large, Color=Red",
            vec![
                ("Size".into(), "Large".into()),
                ("Color".into(), "Red".into()),
            ],
        );
        let b = scene.add_component(
            set,
            "Size=Small, Color=Blue",
            vec![
                ("Size".into(), "Small".into()),
                ("Color".into(), "Blue".into()),
            ],
        );
        (scene, a, b)
    }

    #[test]
    fn clone_subtree_copies_descendants() {
        let mut scene = Scene::new("Page");
        let frame = scene.add_frame(scene.root, "Card #item");
        scene.add_text(frame, "#title", "hello");
        scene.add_shape(frame, "#photo");

        let copy = scene.clone_subtree(frame, scene.root);
        assert_eq!(scene.descendants(copy).len(), 3);
        assert_eq!(scene.get(copy).name, "Card #item");
        // Original untouched
        assert_eq!(scene.descendants(frame).len(), 3);
    }

    #[test]
    fn instantiate_copies_component_children_and_props() {
        let (mut scene, comp, _) = scene_with_family();
        let root = scene.root;
        scene.add_text(comp, "#label", "x");

        let inst = scene.instantiate(comp, root).unwrap();
        let node = scene.get(inst);
        assert!(node.is_instance());
        assert_eq!(scene.children(inst).len(), 1);
        assert_eq!(
            node.as_instance().unwrap().properties,
            vec![
                ("Size".to_string(), "Large".to_string()),
                ("Color".to_string(), "Red".to_string()),
            ]
        );
        assert_eq!(scene.resolve_instance_origin(inst), Some(comp));
    }

    #[test]
    fn swap_instance_rebuilds_children() {
        let (mut scene, a, b) = scene_with_family();
        let root = scene.root;
        scene.add_text(a, "#label", "a");
        scene.add_text(b, "#label", "b");
        scene.add_text(b, "#extra", "b2");

        let inst = scene.instantiate(a, root).unwrap();
        scene.swap_instance(inst, b).unwrap();
        assert_eq!(scene.children(inst).len(), 2);
        assert_eq!(scene.resolve_instance_origin(inst), Some(b));
        assert_eq!(
            scene.get(inst).as_instance().unwrap().properties[0],
            ("Size".to_string(), "Small".to_string())
        );
    }

    #[test]
    fn load_fonts_respects_available_set() {
        let mut scene = Scene::new("Page");
        let text = scene.add_text(scene.root, "#t", "x");
        assert!(scene.load_fonts(text).is_ok());

        scene.set_available_fonts(vec![FontName::new("Roboto", "Bold")]);
        assert!(scene.load_fonts(text).is_err());
        assert!(scene.set_characters(text, "new").is_err());
        assert_eq!(scene.get(text).as_text().unwrap().characters, "x");
    }

    #[test]
    fn hyperlink_requires_nonempty_range() {
        let mut scene = Scene::new("Page");
        let text = scene.add_text(scene.root, "#t", "");
        assert!(scene.set_hyperlink(text, "https://example.com").is_err());
        scene.set_characters(text, "link").unwrap();
        assert!(scene.set_hyperlink(text, "https://example.com").is_ok());
    }

    #[test]
    fn create_image_rejects_garbage() {
        let mut scene = Scene::new("Page");
        assert!(scene.create_image(b"not an image").is_err());
    }

    #[test]
    fn set_instance_properties_preserves_others() {
        let (mut scene, a, _) = scene_with_family();
        let root = scene.root;
        let inst = scene.instantiate(a, root).unwrap();
        scene
            .set_instance_properties(inst, &[("Color".to_string(), "Blue".to_string())])
            .unwrap();
        assert_eq!(
            scene.get(inst).as_instance().unwrap().properties,
            vec![
                ("Size".to_string(), "Large".to_string()),
                ("Color".to_string(), "Blue".to_string()),
            ]
        );
    }

    #[test]
    fn validate_rejects_dangling_and_cyclic_references() {
        let mut scene = Scene::new("Page");
        let frame = scene.add_frame(scene.root, "Card");
        scene.add_text(frame, "#title", "hello");
        assert!(scene.validate().is_ok());

        // A hand-edited template can point at a node that does not exist.
        let mut dangling = scene.clone();
        dangling.get_mut(frame).children.push(NodeId(99));
        let err = dangling.validate().unwrap_err();
        assert!(err.to_string().contains("missing child"));

        // Or wire a node back into its own ancestry.
        let mut cyclic = scene.clone();
        let root = cyclic.root;
        cyclic.get_mut(frame).children.push(root);
        assert!(cyclic.validate().is_err());

        // Or attach the same child under two parents.
        let mut shared = scene.clone();
        let text = shared.children(frame)[0];
        let root = shared.root;
        shared.get_mut(root).children.push(text);
        assert!(shared.validate().is_err());
    }

    #[test]
    fn scene_round_trips_through_json() {
        let mut scene = Scene::new("Page");
        let frame = scene.add_frame(scene.root, "Card");
        scene.add_text(frame, "#title", "hello");
        let json = serde_json::to_string(&scene).unwrap();
        let back: Scene = serde_json::from_str(&json).unwrap();
        assert_eq!(back.descendants(back.root).len(), 3);
        assert_eq!(back.get(frame).name, "Card");
    }
}
