//! Collaborator interfaces between the remap engine and its host scene
//!
//! The engine never touches scene storage directly: palettes, the node
//! graph, the renderer, override modules and the undo log are all reached
//! through these traits. [`crate::scene::Scene`] implements every one of
//! them for the JSON scene document; a host application can supply its own
//! implementations instead.

use std::collections::HashSet;
use thiserror::Error;

use crate::models::{CelId, Color, ColorId, ColorValue, ColumnId, ModuleId, NodeId, Palette, PaletteId};

/// Error from a host collaborator call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// Referenced palette does not exist
    #[error("palette '{0}' not found")]
    PaletteNotFound(String),
    /// Destination palette cannot accept another color
    #[error("palette '{palette}' cannot accept color '{color}': {reason}")]
    PaletteFull {
        palette: String,
        color: String,
        reason: String,
    },
    /// Color missing from the palette it was expected in
    #[error("color '{color}' not found in palette '{palette}'")]
    ColorNotFound { palette: String, color: String },
    /// Node has no linked column under the requested attribute
    #[error("node '{node}' has no linked column '{attr}'")]
    MissingColumn { node: String, attr: String },
    /// Node missing from the scene graph
    #[error("node '{0}' not found")]
    NodeNotFound(String),
    /// Module missing, or missing the requested attribute
    #[error("module '{module}' has no attribute '{attr}'")]
    MissingAttr { module: String, attr: String },
    /// The renderer could not apply a color substitution
    #[error("recolor failed on node '{node}' frame {frame}: {reason}")]
    Recolor {
        node: String,
        frame: u32,
        reason: String,
    },
}

/// A single from/to identifier substitution handed to the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorSwap {
    pub from: ColorId,
    pub to: ColorId,
}

/// Palette storage: create palettes, look them up, and add or remove colors.
///
/// `add_color` is the allocation primitive: the store mints a fresh,
/// project-unique identifier for every inserted color and never reuses one.
pub trait PaletteStore {
    /// Create a palette. The store seeds it with one auto-created
    /// placeholder color, mirroring what scene hosts do.
    fn create_palette(&mut self, name: &str) -> PaletteId;

    fn palette(&self, id: &PaletteId) -> Option<&Palette>;

    fn find_palette_by_name(&self, name: &str) -> Option<PaletteId>;

    /// Append a color with a freshly minted unique id; returns the new id.
    fn add_color(
        &mut self,
        palette: &PaletteId,
        name: &str,
        value: ColorValue,
    ) -> Result<ColorId, HostError>;

    fn color_by_index(&self, palette: &PaletteId, index: usize) -> Option<&Color>;

    fn remove_color(&mut self, palette: &PaletteId, color: &ColorId) -> Result<(), HostError>;
}

/// Read-only view of the node graph and its frame timing.
pub trait SceneGraph {
    /// All drawing-bearing nodes.
    fn drawing_nodes(&self) -> Vec<NodeId>;

    /// Whether the node keys its drawing by element timing rather than a
    /// custom per-frame timing column.
    fn uses_element_timing(&self, node: &NodeId) -> Result<bool, HostError>;

    /// Resolve the column linked under `attr` for this node.
    fn linked_column(&self, node: &NodeId, attr: &str) -> Result<ColumnId, HostError>;

    /// Total frame count of the scene timeline.
    fn frame_count(&self) -> u32;

    /// The content reference exposed by `column` at `frame` (1-based), if any.
    fn content_reference(&self, column: &ColumnId, frame: u32) -> Option<CelId>;
}

/// The rendering collaborator that owns drawing pixels/strokes.
pub trait RenderingEngine {
    /// Color ids actually used by the drawing shown at (node, frame).
    /// Unexposed frames report an empty set.
    fn used_color_ids(&self, node: &NodeId, frame: u32) -> HashSet<ColorId>;

    /// Replace identifiers inside the drawing shown at (node, frame).
    /// Substitution is idempotent per occurrence.
    fn recolor(&mut self, node: &NodeId, frame: u32, swaps: &[ColorSwap]) -> Result<(), HostError>;
}

/// Storage of override modules and their serialized configuration.
pub trait OverrideStore {
    fn modules_of_kind(&self, kind: &str) -> Vec<ModuleId>;

    fn module_name(&self, module: &ModuleId) -> String;

    fn config_text(&self, module: &ModuleId, attr: &str) -> Result<String, HostError>;

    fn set_config_text(
        &mut self,
        module: &ModuleId,
        attr: &str,
        text: &str,
    ) -> Result<(), HostError>;
}

/// The host's undo-transaction boundary. One begin/end pair wraps a whole
/// remap run so the user sees a single undoable unit.
pub trait TransactionLog {
    fn begin(&mut self, label: &str);
    fn end(&mut self);
}

/// Asks the user to accept or decline before a run starts. Declining means
/// the run is never invoked.
pub trait ConfirmationPrompt {
    fn confirm(&mut self, summary: &str) -> bool;
}

/// Everything the remap coordinator needs from the host.
pub trait Host:
    PaletteStore + SceneGraph + RenderingEngine + OverrideStore + TransactionLog
{
}

impl<T> Host for T where
    T: PaletteStore + SceneGraph + RenderingEngine + OverrideStore + TransactionLog
{
}
