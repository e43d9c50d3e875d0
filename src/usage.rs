//! Drawing usage indexing - which content references use which colors
//!
//! The index walks every drawing node's timeline once, collapsing frames
//! that expose the same content reference, and records the color ids each
//! distinct reference uses. Per-color queries then answer from the index
//! without rescanning any frames.

use std::collections::HashSet;

use crate::host::{HostError, RenderingEngine, SceneGraph};
use crate::models::{CelId, ColorId, NodeId};

/// Attribute naming the column linked by element-timed nodes.
pub const ELEMENT_COLUMN: &str = "drawing.element";
/// Attribute naming the column linked by custom-timed nodes.
pub const TIMING_COLUMN: &str = "drawing.customName.timing";

/// One deduplicated drawing usage: a node together with one distinct
/// content reference it exposes, plus an exemplar frame the renderer can
/// be pointed at to reach that content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawingUsage {
    pub node: NodeId,
    pub cel: CelId,
    pub frame: u32,
}

#[derive(Debug)]
struct ContentEntry {
    cel: CelId,
    frame: u32,
    used: HashSet<ColorId>,
}

#[derive(Debug)]
struct NodeContent {
    node: NodeId,
    entries: Vec<ContentEntry>,
}

/// Per-run index of every node's distinct content references and the
/// colors they use.
#[derive(Debug)]
pub struct DrawingUsageIndex {
    nodes: Vec<NodeContent>,
}

impl DrawingUsageIndex {
    /// Walk every drawing node's frame range once. A content reference
    /// shared by several frames of a node is resolved and queried exactly
    /// once; frames exposing nothing are skipped.
    pub fn build<H>(host: &H) -> Result<Self, HostError>
    where
        H: SceneGraph + RenderingEngine,
    {
        let mut nodes = Vec::new();
        for node in host.drawing_nodes() {
            let attr = if host.uses_element_timing(&node)? {
                ELEMENT_COLUMN
            } else {
                TIMING_COLUMN
            };
            let column = host.linked_column(&node, attr)?;

            let mut seen: HashSet<CelId> = HashSet::new();
            let mut entries = Vec::new();
            for frame in 1..=host.frame_count() {
                let Some(cel) = host.content_reference(&column, frame) else {
                    continue;
                };
                if !seen.insert(cel.clone()) {
                    continue;
                }
                let used = host.used_color_ids(&node, frame);
                entries.push(ContentEntry { cel, frame, used });
            }
            nodes.push(NodeContent { node, entries });
        }
        Ok(Self { nodes })
    }

    /// All (node, content reference) pairs that use `color`. Each pair
    /// appears exactly once, regardless of how many frames share the
    /// content reference.
    pub fn usages_of(&self, color: &ColorId) -> Vec<DrawingUsage> {
        let mut usages = Vec::new();
        for node in &self.nodes {
            for entry in &node.entries {
                if entry.used.contains(color) {
                    usages.push(DrawingUsage {
                        node: node.node.clone(),
                        cel: entry.cel.clone(),
                        frame: entry.frame,
                    });
                }
            }
        }
        usages
    }

    /// Number of distinct (node, content reference) pairs in the index.
    pub fn distinct_content_count(&self) -> usize {
        self.nodes.iter().map(|n| n.entries.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Column, ColumnId, Drawing, Node, Stroke};
    use crate::scene::Scene;
    use std::collections::HashMap;

    fn color(id: &str) -> ColorId {
        ColorId(id.to_string())
    }

    fn stroke(id: &str) -> Stroke {
        Stroke {
            color_id: color(id),
            path: None,
        }
    }

    /// A node whose column exposes the given cels over the scene timeline.
    fn add_node(scene: &mut Scene, name: &str, element_mode: bool, exposures: Vec<Option<CelId>>) {
        let column = ColumnId(format!("{name}-col"));
        let attr = if element_mode {
            ELEMENT_COLUMN
        } else {
            TIMING_COLUMN
        };
        scene.columns.insert(column.clone(), Column { exposures });
        scene.nodes.push(Node {
            id: NodeId(name.to_string()),
            name: name.to_string(),
            element_mode,
            columns: HashMap::from([(attr.to_string(), column)]),
        });
    }

    fn cel(id: &str) -> Option<CelId> {
        Some(CelId(id.to_string()))
    }

    #[test]
    fn test_shared_content_reference_indexed_once() {
        let mut scene = Scene {
            frame_count: 5,
            ..Scene::default()
        };
        scene
            .cels
            .insert(CelId("held".to_string()), Drawing { strokes: vec![stroke("c2")] });
        // one cel held across all 5 frames
        add_node(
            &mut scene,
            "body",
            true,
            vec![cel("held"), cel("held"), cel("held"), cel("held"), cel("held")],
        );

        let index = DrawingUsageIndex::build(&scene).unwrap();
        assert_eq!(index.distinct_content_count(), 1);

        let usages = index.usages_of(&color("c2"));
        assert_eq!(usages.len(), 1);
        assert_eq!(usages[0].cel, CelId("held".to_string()));
        assert_eq!(usages[0].frame, 1);
    }

    #[test]
    fn test_distinct_content_references_indexed_separately() {
        let mut scene = Scene {
            frame_count: 2,
            ..Scene::default()
        };
        scene
            .cels
            .insert(CelId("a".to_string()), Drawing { strokes: vec![stroke("c2")] });
        scene
            .cels
            .insert(CelId("b".to_string()), Drawing { strokes: vec![stroke("c2")] });
        add_node(&mut scene, "mouth", false, vec![cel("a"), cel("b")]);

        let index = DrawingUsageIndex::build(&scene).unwrap();
        let usages = index.usages_of(&color("c2"));
        assert_eq!(usages.len(), 2);
    }

    #[test]
    fn test_usages_filtered_by_color() {
        let mut scene = Scene {
            frame_count: 2,
            ..Scene::default()
        };
        scene
            .cels
            .insert(CelId("a".to_string()), Drawing { strokes: vec![stroke("red")] });
        scene
            .cels
            .insert(CelId("b".to_string()), Drawing { strokes: vec![stroke("blue")] });
        add_node(&mut scene, "fx", true, vec![cel("a"), cel("b")]);

        let index = DrawingUsageIndex::build(&scene).unwrap();
        assert_eq!(index.usages_of(&color("red")).len(), 1);
        assert_eq!(index.usages_of(&color("blue")).len(), 1);
        assert!(index.usages_of(&color("green")).is_empty());
    }

    #[test]
    fn test_unexposed_frames_skipped() {
        let mut scene = Scene {
            frame_count: 3,
            ..Scene::default()
        };
        scene
            .cels
            .insert(CelId("a".to_string()), Drawing { strokes: vec![stroke("red")] });
        add_node(&mut scene, "prop", true, vec![None, cel("a"), None]);

        let index = DrawingUsageIndex::build(&scene).unwrap();
        assert_eq!(index.distinct_content_count(), 1);
        assert_eq!(index.usages_of(&color("red"))[0].frame, 2);
    }

    #[test]
    fn test_missing_linked_column_is_an_error() {
        let mut scene = Scene {
            frame_count: 1,
            ..Scene::default()
        };
        scene.nodes.push(Node {
            id: NodeId("orphan".to_string()),
            name: "orphan".to_string(),
            element_mode: true,
            columns: HashMap::new(),
        });
        let err = DrawingUsageIndex::build(&scene).unwrap_err();
        assert!(matches!(err, HostError::MissingColumn { .. }));
    }
}
