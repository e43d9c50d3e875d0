//! Data models for scene objects (palettes, colors, nodes, override modules)

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Opaque unique key referencing a color record, independent of its
/// display value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorId(pub String);

impl ColorId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ColorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a palette within the scene.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaletteId(pub String);

impl fmt::Display for PaletteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a drawing-bearing node in the scene graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a timing column linking frames to stored drawings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnId(pub String);

/// Content reference: the stored drawing artwork unit that one or more
/// frames may share. Rewriting it once rewires every frame that shares it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CelId(pub String);

impl fmt::Display for CelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of an override module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(pub String);

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One stop of a gradient color value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    pub offset: f32,
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// A color's visual value - copied field-for-field when a color is forked,
/// so the rendered appearance never changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ColorValue {
    Solid { r: u8, g: u8, b: u8, a: u8 },
    Gradient { stops: Vec<GradientStop> },
}

/// A named color record. Owned by exactly one palette at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub id: ColorId,
    pub name: String,
    pub value: ColorValue,
}

/// An ordered collection of colors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    pub id: PaletteId,
    pub name: String,
    pub colors: Vec<Color>,
}

impl Palette {
    /// Color ids in palette order.
    pub fn color_ids(&self) -> Vec<ColorId> {
        self.colors.iter().map(|c| c.id.clone()).collect()
    }
}

/// A single vector stroke inside a stored drawing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub color_id: ColorId,
    /// Path data, irrelevant to recoloring and preserved as-is.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub path: Option<String>,
}

/// The stored artwork a content reference resolves to.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Drawing {
    pub strokes: Vec<Stroke>,
}

impl Drawing {
    /// Deduplicated set of color ids this drawing uses.
    pub fn used_color_ids(&self) -> HashSet<ColorId> {
        self.strokes.iter().map(|s| s.color_id.clone()).collect()
    }
}

/// A timing column: per-frame exposure of content references.
/// Index 0 holds frame 1; `None` means the frame exposes nothing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Column {
    pub exposures: Vec<Option<CelId>>,
}

/// A drawing-bearing element in the scene graph with a timeline of frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    /// True when the node keys its drawing by element timing; false when it
    /// uses a custom per-frame timing column.
    pub element_mode: bool,
    /// Linked columns by attribute name.
    pub columns: HashMap<String, ColumnId>,
}

/// A scene element whose configuration independently stores color
/// references as serialized text, outside the drawing-to-palette link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideModule {
    pub id: ModuleId,
    pub name: String,
    pub kind: String,
    /// Configuration attributes as serialized text, keyed by field name.
    pub attrs: HashMap<String, String>,
}

/// One record of an override module's serialized reference list: a known
/// `colorId` field plus an opaque bag of remaining fields preserved
/// verbatim on rewrite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideRecord {
    #[serde(rename = "colorId")]
    pub color_id: String,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}
