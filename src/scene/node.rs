//! Node types for the in-memory scene graph.
//!
//! All types derive `Serialize + Deserialize` so the same types work for
//! both Rust API construction and JSON deserialization, so a template can be
//! built in code or loaded from a `.json` file and bound either way.
//!
//! Node capabilities are a closed set of tagged variants ([`NodeKind`]),
//! determined once at construction and carried as data. Binding code
//! matches on the tag instead of re-querying capabilities per visit.

use serde::{Deserialize, Serialize};

/// Index of a node within a [`Scene`](super::Scene) arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// A font reference, matched exactly by family and style.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FontName {
    pub family: String,
    pub style: String,
}

impl FontName {
    pub fn new(family: impl Into<String>, style: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            style: style.into(),
        }
    }
}

impl Default for FontName {
    fn default() -> Self {
        Self::new("Inter", "Regular")
    }
}

/// Normalized color with each channel in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };

    pub fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }
}

/// Opaque reference to image bytes registered with a scene.
///
/// The hash is content-derived, so two fills built from identical bytes
/// compare equal and fills from different bytes compare unequal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageHandle {
    pub hash: String,
}

/// How an image fill maps onto its shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleMode {
    /// Cover the shape, cropping overflow.
    #[default]
    Fill,
    /// Letterbox inside the shape.
    Fit,
}

/// Visual content painted into a fill-capable node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Paint {
    Solid { color: Rgba },
    Image { image: ImageHandle, scale_mode: ScaleMode },
}

impl Paint {
    pub fn solid(color: Rgba) -> Self {
        Paint::Solid { color }
    }

    pub fn image(handle: ImageHandle) -> Self {
        Paint::Image {
            image: handle,
            scale_mode: ScaleMode::Fill,
        }
    }
}

/// A text node: characters plus styling the binder can touch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextNode {
    pub characters: String,
    #[serde(default)]
    pub font: FontName,
    /// Fill of the characters themselves (color-on-text directives target this).
    #[serde(default)]
    pub fill: Option<Rgba>,
    /// Hyperlink annotation over the full text range.
    #[serde(default)]
    pub hyperlink: Option<String>,
}

impl TextNode {
    pub fn new(characters: impl Into<String>) -> Self {
        Self {
            characters: characters.into(),
            font: FontName::default(),
            fill: None,
            hyperlink: None,
        }
    }
}

/// A generic fill-capable shape (rectangle, ellipse, vector, ...).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShapeNode {
    #[serde(default)]
    pub fills: Vec<Paint>,
}

/// A container frame. Frames have fills of their own, so they are
/// fill-capable in addition to holding children.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrameNode {
    #[serde(default)]
    pub fills: Vec<Paint>,
}

/// An instance of a component, carrying its current variant property values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstanceNode {
    /// The originating component, when resolvable.
    #[serde(default)]
    pub main: Option<NodeId>,
    /// Current (property, value) pairs, in the component's declared order.
    #[serde(default)]
    pub properties: Vec<(String, String)>,
}

/// A component definition. Its variant property pairs are ordered;
/// the first entry is the family's first declared property.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComponentNode {
    #[serde(default)]
    pub variant_properties: Vec<(String, String)>,
}

/// Closed set of node capabilities.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    Text(TextNode),
    Shape(ShapeNode),
    Frame(FrameNode),
    Instance(InstanceNode),
    Component(ComponentNode),
    /// Groups sibling component variants into one family.
    ComponentSet,
    /// Anything the binder has no strategy for (slices, guides, ...).
    Other,
}

/// One node in the scene arena: identity, geometry, kind, and tree links.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    pub kind: NodeKind,
    #[serde(default)]
    pub children: Vec<NodeId>,
    #[serde(default)]
    pub parent: Option<NodeId>,
}

fn default_visible() -> bool {
    true
}

impl Node {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            visible: true,
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            kind,
            children: Vec::new(),
            parent: None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, NodeKind::Text(_))
    }

    pub fn is_instance(&self) -> bool {
        matches!(self.kind, NodeKind::Instance(_))
    }

    /// Fill access for generic fill-capable kinds (shapes and frames).
    /// Instances are deliberately excluded: the scanner routes them to the
    /// instance bucket before the fill check applies.
    pub fn fills(&self) -> Option<&Vec<Paint>> {
        match &self.kind {
            NodeKind::Shape(s) => Some(&s.fills),
            NodeKind::Frame(f) => Some(&f.fills),
            _ => None,
        }
    }

    pub fn fills_mut(&mut self) -> Option<&mut Vec<Paint>> {
        match &mut self.kind {
            NodeKind::Shape(s) => Some(&mut s.fills),
            NodeKind::Frame(f) => Some(&mut f.fills),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextNode> {
        match &self.kind {
            NodeKind::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut TextNode> {
        match &mut self.kind {
            NodeKind::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<&InstanceNode> {
        match &self.kind {
            NodeKind::Instance(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_instance_mut(&mut self) -> Option<&mut InstanceNode> {
        match &mut self.kind {
            NodeKind::Instance(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_component(&self) -> Option<&ComponentNode> {
        match &self.kind {
            NodeKind::Component(c) => Some(c),
            _ => None,
        }
    }
}
