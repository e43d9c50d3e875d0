//! In-memory scene document backing the host collaborator traits
//!
//! A [`Scene`] is the JSON document the CLI loads and saves: palettes, the
//! drawing-node graph with its timing columns and stored drawings, and
//! override modules. It implements every trait in [`crate::host`], minting
//! color ids from a persisted serial that is checked against all ids
//! already present in the project so a minted id can never collide.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::host::{
    ColorSwap, HostError, OverrideStore, PaletteStore, RenderingEngine, SceneGraph, TransactionLog,
};
use crate::models::{
    CelId, Color, ColorId, ColorValue, Column, ColumnId, Drawing, ModuleId, Node, NodeId,
    OverrideModule, Palette, PaletteId,
};
use crate::usage::{ELEMENT_COLUMN, TIMING_COLUMN};

/// Name of the color every freshly created palette starts with.
pub const PLACEHOLDER_COLOR_NAME: &str = "Default";

/// Error loading or saving a scene document.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("scene parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// An entry in the in-memory transaction log. Kept so tests can assert
/// that runs are wrapped in exactly one begin/end pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxEvent {
    Begin(String),
    End,
}

/// The whole scene: palettes, nodes, columns, stored drawings, modules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    pub frame_count: u32,
    pub palettes: Vec<Palette>,
    pub nodes: Vec<Node>,
    pub columns: HashMap<ColumnId, Column>,
    pub cels: HashMap<CelId, Drawing>,
    pub modules: Vec<OverrideModule>,
    /// Serial feeding the color id mint; persisted so ids are never reused
    /// across sessions.
    #[serde(default)]
    pub next_color_serial: u64,
    #[serde(default)]
    pub next_palette_serial: u64,
    /// Cap on colors per palette, when the host storage is bounded.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub max_palette_colors: Option<usize>,
    #[serde(skip)]
    pub transactions: Vec<TxEvent>,
}

impl Scene {
    /// Load a scene document from a JSON file.
    pub fn load(path: &Path) -> Result<Self, SceneError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Save the scene document as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), SceneError> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text)?;
        Ok(())
    }

    fn palette_mut(&mut self, id: &PaletteId) -> Option<&mut Palette> {
        self.palettes.iter_mut().find(|p| &p.id == id)
    }

    fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    /// Every color id currently present anywhere in the project.
    fn existing_color_ids(&self) -> HashSet<String> {
        let mut ids = HashSet::new();
        for palette in &self.palettes {
            for color in &palette.colors {
                ids.insert(color.id.0.clone());
            }
        }
        for drawing in self.cels.values() {
            for stroke in &drawing.strokes {
                ids.insert(stroke.color_id.0.clone());
            }
        }
        ids
    }

    /// Mint a color id guaranteed unique across the whole project. The
    /// serial only moves forward, so minted ids are never reused even
    /// after colors are deleted.
    fn mint_color_id(&mut self) -> ColorId {
        let taken = self.existing_color_ids();
        loop {
            self.next_color_serial += 1;
            let candidate = format!("{:016x}", self.next_color_serial);
            if !taken.contains(&candidate) {
                return ColorId(candidate);
            }
        }
    }

    fn mint_palette_id(&mut self) -> PaletteId {
        loop {
            self.next_palette_serial += 1;
            let candidate = PaletteId(format!("pal-{}", self.next_palette_serial));
            if !self.palettes.iter().any(|p| p.id == candidate) {
                return candidate;
            }
        }
    }

    /// Resolve the content reference shown at (node, frame) the way the
    /// renderer would: through the node's active timing column.
    fn resolve_cel(&self, node: &NodeId, frame: u32) -> Option<CelId> {
        let node = self.node(node)?;
        let attr = if node.element_mode {
            ELEMENT_COLUMN
        } else {
            TIMING_COLUMN
        };
        let column = node.columns.get(attr)?;
        self.content_reference(column, frame)
    }
}

impl PaletteStore for Scene {
    fn create_palette(&mut self, name: &str) -> PaletteId {
        let id = self.mint_palette_id();
        let placeholder_id = self.mint_color_id();
        self.palettes.push(Palette {
            id: id.clone(),
            name: name.to_string(),
            colors: vec![Color {
                id: placeholder_id,
                name: PLACEHOLDER_COLOR_NAME.to_string(),
                value: ColorValue::Solid {
                    r: 255,
                    g: 255,
                    b: 255,
                    a: 255,
                },
            }],
        });
        id
    }

    fn palette(&self, id: &PaletteId) -> Option<&Palette> {
        self.palettes.iter().find(|p| &p.id == id)
    }

    fn find_palette_by_name(&self, name: &str) -> Option<PaletteId> {
        self.palettes
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.id.clone())
    }

    fn add_color(
        &mut self,
        palette: &PaletteId,
        name: &str,
        value: ColorValue,
    ) -> Result<ColorId, HostError> {
        let cap = self.max_palette_colors;
        let id = self.mint_color_id();
        let target = self
            .palette_mut(palette)
            .ok_or_else(|| HostError::PaletteNotFound(palette.0.clone()))?;
        if let Some(cap) = cap {
            if target.colors.len() >= cap {
                return Err(HostError::PaletteFull {
                    palette: target.name.clone(),
                    color: name.to_string(),
                    reason: format!("palette is limited to {cap} colors"),
                });
            }
        }
        target.colors.push(Color {
            id: id.clone(),
            name: name.to_string(),
            value,
        });
        Ok(id)
    }

    fn color_by_index(&self, palette: &PaletteId, index: usize) -> Option<&Color> {
        self.palette(palette).and_then(|p| p.colors.get(index))
    }

    fn remove_color(&mut self, palette: &PaletteId, color: &ColorId) -> Result<(), HostError> {
        let target = self
            .palette_mut(palette)
            .ok_or_else(|| HostError::PaletteNotFound(palette.0.clone()))?;
        let position = target.colors.iter().position(|c| &c.id == color).ok_or_else(|| {
            HostError::ColorNotFound {
                palette: target.name.clone(),
                color: color.0.clone(),
            }
        })?;
        target.colors.remove(position);
        Ok(())
    }
}

impl SceneGraph for Scene {
    fn drawing_nodes(&self) -> Vec<NodeId> {
        self.nodes.iter().map(|n| n.id.clone()).collect()
    }

    fn uses_element_timing(&self, node: &NodeId) -> Result<bool, HostError> {
        self.node(node)
            .map(|n| n.element_mode)
            .ok_or_else(|| HostError::NodeNotFound(node.0.clone()))
    }

    fn linked_column(&self, node: &NodeId, attr: &str) -> Result<ColumnId, HostError> {
        let found = self
            .node(node)
            .ok_or_else(|| HostError::NodeNotFound(node.0.clone()))?;
        found
            .columns
            .get(attr)
            .cloned()
            .ok_or_else(|| HostError::MissingColumn {
                node: found.name.clone(),
                attr: attr.to_string(),
            })
    }

    fn frame_count(&self) -> u32 {
        self.frame_count
    }

    fn content_reference(&self, column: &ColumnId, frame: u32) -> Option<CelId> {
        if frame == 0 {
            return None;
        }
        self.columns
            .get(column)
            .and_then(|c| c.exposures.get((frame - 1) as usize))
            .and_then(|cel| cel.clone())
    }
}

impl RenderingEngine for Scene {
    fn used_color_ids(&self, node: &NodeId, frame: u32) -> HashSet<ColorId> {
        self.resolve_cel(node, frame)
            .and_then(|cel| self.cels.get(&cel))
            .map(|drawing| drawing.used_color_ids())
            .unwrap_or_default()
    }

    fn recolor(&mut self, node: &NodeId, frame: u32, swaps: &[ColorSwap]) -> Result<(), HostError> {
        let cel = self
            .resolve_cel(node, frame)
            .ok_or_else(|| HostError::Recolor {
                node: node.0.clone(),
                frame,
                reason: "no drawing exposed at this frame".to_string(),
            })?;
        let drawing = self.cels.get_mut(&cel).ok_or_else(|| HostError::Recolor {
            node: node.0.clone(),
            frame,
            reason: format!("missing drawing content '{cel}'"),
        })?;
        for stroke in &mut drawing.strokes {
            if let Some(swap) = swaps.iter().find(|s| s.from == stroke.color_id) {
                stroke.color_id = swap.to.clone();
            }
        }
        Ok(())
    }
}

impl OverrideStore for Scene {
    fn modules_of_kind(&self, kind: &str) -> Vec<ModuleId> {
        self.modules
            .iter()
            .filter(|m| m.kind == kind)
            .map(|m| m.id.clone())
            .collect()
    }

    fn module_name(&self, module: &ModuleId) -> String {
        self.modules
            .iter()
            .find(|m| &m.id == module)
            .map(|m| m.name.clone())
            .unwrap_or_else(|| module.0.clone())
    }

    fn config_text(&self, module: &ModuleId, attr: &str) -> Result<String, HostError> {
        self.modules
            .iter()
            .find(|m| &m.id == module)
            .and_then(|m| m.attrs.get(attr))
            .cloned()
            .ok_or_else(|| HostError::MissingAttr {
                module: self.module_name(module),
                attr: attr.to_string(),
            })
    }

    fn set_config_text(
        &mut self,
        module: &ModuleId,
        attr: &str,
        text: &str,
    ) -> Result<(), HostError> {
        let name = self.module_name(module);
        let found = self
            .modules
            .iter_mut()
            .find(|m| &m.id == module)
            .ok_or_else(|| HostError::MissingAttr {
                module: name.clone(),
                attr: attr.to_string(),
            })?;
        found.attrs.insert(attr.to_string(), text.to_string());
        Ok(())
    }
}

impl TransactionLog for Scene {
    fn begin(&mut self, label: &str) {
        self.transactions.push(TxEvent::Begin(label.to_string()));
    }

    fn end(&mut self) {
        self.transactions.push(TxEvent::End);
    }
}
