//! Drawing rewrite - swap one color id inside one content reference
//!
//! Thin seam in front of the rendering collaborator: the coordinator never
//! talks to the renderer directly. One call rewires every frame that
//! shares the content reference, so it must be made once per
//! (node, content reference) pair per color.

use crate::host::{ColorSwap, HostError, RenderingEngine};
use crate::models::ColorId;
use crate::usage::DrawingUsage;

/// Replace `old` with `new` inside the content reference behind `usage`.
pub fn rewrite_drawing<H: RenderingEngine>(
    host: &mut H,
    usage: &DrawingUsage,
    old: &ColorId,
    new: &ColorId,
) -> Result<(), HostError> {
    host.recolor(
        &usage.node,
        usage.frame,
        &[ColorSwap {
            from: old.clone(),
            to: new.clone(),
        }],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CelId, Column, ColumnId, Drawing, Node, NodeId, Stroke};
    use crate::scene::Scene;
    use crate::usage::ELEMENT_COLUMN;
    use std::collections::HashMap;

    fn scene_with_drawing() -> (Scene, DrawingUsage) {
        let mut scene = Scene {
            frame_count: 1,
            ..Scene::default()
        };
        let cel = CelId("cel".to_string());
        scene.cels.insert(
            cel.clone(),
            Drawing {
                strokes: vec![
                    Stroke {
                        color_id: ColorId("old".to_string()),
                        path: Some("M0,0 L1,1".to_string()),
                    },
                    Stroke {
                        color_id: ColorId("other".to_string()),
                        path: None,
                    },
                ],
            },
        );
        let column = ColumnId("col".to_string());
        scene.columns.insert(
            column.clone(),
            Column {
                exposures: vec![Some(cel.clone())],
            },
        );
        scene.nodes.push(Node {
            id: NodeId("node".to_string()),
            name: "node".to_string(),
            element_mode: true,
            columns: HashMap::from([(ELEMENT_COLUMN.to_string(), column)]),
        });
        let usage = DrawingUsage {
            node: NodeId("node".to_string()),
            cel,
            frame: 1,
        };
        (scene, usage)
    }

    #[test]
    fn test_rewrite_swaps_only_matching_strokes() {
        let (mut scene, usage) = scene_with_drawing();
        let old = ColorId("old".to_string());
        let new = ColorId("new".to_string());

        rewrite_drawing(&mut scene, &usage, &old, &new).unwrap();

        let drawing = &scene.cels[&usage.cel];
        assert_eq!(drawing.strokes[0].color_id, new);
        assert_eq!(drawing.strokes[0].path.as_deref(), Some("M0,0 L1,1"));
        assert_eq!(drawing.strokes[1].color_id, ColorId("other".to_string()));
    }

    #[test]
    fn test_rewrite_is_idempotent_per_occurrence() {
        let (mut scene, usage) = scene_with_drawing();
        let old = ColorId("old".to_string());
        let new = ColorId("new".to_string());

        rewrite_drawing(&mut scene, &usage, &old, &new).unwrap();
        rewrite_drawing(&mut scene, &usage, &old, &new).unwrap();

        let drawing = &scene.cels[&usage.cel];
        assert_eq!(drawing.strokes[0].color_id, new);
    }

    #[test]
    fn test_rewrite_unexposed_frame_fails() {
        let (mut scene, mut usage) = scene_with_drawing();
        usage.frame = 9;
        let err = rewrite_drawing(
            &mut scene,
            &usage,
            &ColorId("old".to_string()),
            &ColorId("new".to_string()),
        )
        .unwrap_err();
        assert!(matches!(err, HostError::Recolor { .. }));
    }
}
