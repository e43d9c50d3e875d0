//! Remap coordination - fork a whole palette and rewire every consumer
//!
//! One run copies each color of the source palette into a fresh
//! destination palette under a new id, then points every drawing content
//! reference and override module that used the old id at the new one. The
//! source palette itself is never modified; after a successful run nothing
//! in the scene references its ids anymore, so it can be removed by hand.

use std::collections::HashSet;
use thiserror::Error;

use crate::allocator::allocate;
use crate::host::{Host, HostError, TransactionLog};
use crate::models::{ColorId, ModuleId, PaletteId};
use crate::overrides::{find_override_modules, rewrite_override};
use crate::rewrite::rewrite_drawing;
use crate::usage::DrawingUsageIndex;

/// Suffix appended to the source palette's name for the copy.
pub const NEW_PALETTE_SUFFIX: &str = "_NewID";
/// Undo-transaction label the whole run is recorded under.
pub const TRANSACTION_LABEL: &str = "Copy Palette With New Color IDs";

/// A remap run failed. Rewrites already applied before the failure remain;
/// the host's transaction boundary is the unit of recovery.
#[derive(Debug, Error)]
pub enum RemapError {
    #[error("palette '{palette}' not found")]
    PaletteNotFound { palette: String },
    /// Precondition failure: nothing was done, no transaction was opened.
    #[error("palette '{palette}' has no colors to copy")]
    EmptyPalette { palette: String },
    /// Fatal: the destination palette cannot accept the copy.
    #[error("cannot allocate copy of color '{color}' into palette '{palette}': {source}")]
    AllocationFailed {
        palette: String,
        color: String,
        source: HostError,
    },
    /// Fatal: leaving a drawing half-recolored is worse than aborting.
    #[error("drawing rewrite failed on node '{node}' for color '{color}': {source}")]
    DrawingRewrite {
        node: String,
        color: String,
        source: HostError,
    },
    #[error("scene query failed: {0}")]
    Host(#[from] HostError),
}

/// The old-id to new-id mapping built during one run. Injective by
/// construction: every new id comes from the store's mint, which never
/// hands out the same id twice. Transient; discardable after the run.
#[derive(Debug, Clone, Default)]
pub struct SubstitutionMap {
    entries: Vec<(ColorId, ColorId)>,
}

impl SubstitutionMap {
    pub fn insert(&mut self, old: ColorId, new: ColorId) {
        self.entries.push((old, new));
    }

    pub fn get(&self, old: &ColorId) -> Option<&ColorId> {
        self.entries
            .iter()
            .find(|(from, _)| from == old)
            .map(|(_, to)| to)
    }

    /// Pairs in the order colors were processed (palette order).
    pub fn iter(&self) -> impl Iterator<Item = &(ColorId, ColorId)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// An override module skipped because its reference list would not parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedModule {
    pub module: ModuleId,
    pub name: String,
    pub detail: String,
}

/// What a successful run did.
#[derive(Debug)]
pub struct RemapReport {
    pub source_palette: String,
    pub destination_palette: PaletteId,
    pub destination_name: String,
    pub substitutions: SubstitutionMap,
    pub drawings_rewritten: usize,
    pub override_records_rewritten: usize,
    /// Modules whose reference list could not be parsed. Reported, never
    /// silently dropped.
    pub skipped_modules: Vec<SkippedModule>,
}

/// Run `f` inside one transaction. The log is closed on success and on
/// error, so the host never sees an unbalanced begin.
fn with_transaction<H, T, E>(
    host: &mut H,
    label: &str,
    f: impl FnOnce(&mut H) -> Result<T, E>,
) -> Result<T, E>
where
    H: TransactionLog,
{
    host.begin(label);
    let result = f(host);
    host.end();
    result
}

/// Fork `source` and rewire every consumer of its colors.
///
/// Colors are processed strictly in palette order. For each color the copy
/// is allocated first, then its drawing usages are rewritten, then every
/// candidate override module is attempted. The candidate module set and
/// the drawing usage index are both computed once for the whole palette.
pub fn run<H: Host>(host: &mut H, source: &PaletteId) -> Result<RemapReport, RemapError> {
    let palette = host
        .palette(source)
        .ok_or_else(|| RemapError::PaletteNotFound {
            palette: source.to_string(),
        })?;
    if palette.colors.is_empty() {
        return Err(RemapError::EmptyPalette {
            palette: palette.name.clone(),
        });
    }
    let source_name = palette.name.clone();
    let source_colors = palette.colors.clone();
    let source_ids = palette.color_ids();

    with_transaction(host, TRANSACTION_LABEL, |host| {
        let destination_name = format!("{source_name}{NEW_PALETTE_SUFFIX}");
        let destination = host.create_palette(&destination_name);
        // drop the auto-created placeholder so the copy ends up with
        // exactly the source palette's colors
        if let Some(placeholder) = host.color_by_index(&destination, 0).map(|c| c.id.clone()) {
            host.remove_color(&destination, &placeholder)?;
        }

        let candidates = find_override_modules(host, &source_ids);
        let index = DrawingUsageIndex::build(host)?;

        let mut substitutions = SubstitutionMap::default();
        let mut skipped: Vec<SkippedModule> = Vec::new();
        let mut skipped_ids: HashSet<ModuleId> = HashSet::new();
        let mut drawings_rewritten = 0;
        let mut override_records_rewritten = 0;

        for color in &source_colors {
            let new_id = allocate(host, color, &destination).map_err(|source| {
                RemapError::AllocationFailed {
                    palette: destination_name.clone(),
                    color: color.name.clone(),
                    source,
                }
            })?;
            substitutions.insert(color.id.clone(), new_id.clone());

            for usage in index.usages_of(&color.id) {
                rewrite_drawing(host, &usage, &color.id, &new_id).map_err(|source| {
                    RemapError::DrawingRewrite {
                        node: usage.node.to_string(),
                        color: color.id.to_string(),
                        source,
                    }
                })?;
                drawings_rewritten += 1;
            }

            for module in &candidates {
                if skipped_ids.contains(module) {
                    continue;
                }
                match rewrite_override(host, module, &color.id, &new_id) {
                    Ok(count) => override_records_rewritten += count,
                    Err(err) => {
                        skipped_ids.insert(module.clone());
                        skipped.push(SkippedModule {
                            module: module.clone(),
                            name: err.module,
                            detail: err.detail,
                        });
                    }
                }
            }
        }

        Ok(RemapReport {
            source_palette: source_name.clone(),
            destination_palette: destination,
            destination_name,
            substitutions,
            drawings_rewritten,
            override_records_rewritten,
            skipped_modules: skipped,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::PaletteStore;
    use crate::models::ColorValue;
    use crate::scene::{Scene, TxEvent};

    fn scene_with_colors(names: &[&str]) -> (Scene, PaletteId) {
        let mut scene = Scene {
            frame_count: 1,
            ..Scene::default()
        };
        let palette = scene.create_palette("Char_A");
        let placeholder = scene.color_by_index(&palette, 0).unwrap().id.clone();
        scene.remove_color(&palette, &placeholder).unwrap();
        for (i, name) in names.iter().enumerate() {
            scene
                .add_color(
                    &palette,
                    name,
                    ColorValue::Solid {
                        r: i as u8,
                        g: 0,
                        b: 0,
                        a: 255,
                    },
                )
                .unwrap();
        }
        (scene, palette)
    }

    #[test]
    fn test_empty_palette_opens_no_transaction() {
        let (mut scene, palette) = scene_with_colors(&[]);
        let err = run(&mut scene, &palette).unwrap_err();
        assert!(matches!(err, RemapError::EmptyPalette { .. }));
        assert!(scene.transactions.is_empty());
        // no destination palette was created either
        assert_eq!(scene.palettes.len(), 1);
    }

    #[test]
    fn test_unknown_palette_reported() {
        let (mut scene, _) = scene_with_colors(&["red"]);
        let missing = PaletteId("pal-404".to_string());
        let err = run(&mut scene, &missing).unwrap_err();
        assert!(matches!(err, RemapError::PaletteNotFound { .. }));
    }

    #[test]
    fn test_run_is_wrapped_in_one_transaction() {
        let (mut scene, palette) = scene_with_colors(&["red", "blue"]);
        run(&mut scene, &palette).unwrap();
        assert_eq!(
            scene.transactions,
            vec![TxEvent::Begin(TRANSACTION_LABEL.to_string()), TxEvent::End]
        );
    }

    #[test]
    fn test_transaction_closed_on_failure() {
        let (mut scene, palette) = scene_with_colors(&["red", "blue"]);
        scene.max_palette_colors = Some(1);
        let err = run(&mut scene, &palette).unwrap_err();
        assert!(matches!(err, RemapError::AllocationFailed { .. }));
        assert_eq!(
            scene.transactions,
            vec![TxEvent::Begin(TRANSACTION_LABEL.to_string()), TxEvent::End]
        );
    }

    #[test]
    fn test_destination_mirrors_source_values_in_order() {
        let (mut scene, palette) = scene_with_colors(&["red", "blue", "green"]);
        let source_colors = scene.palette(&palette).unwrap().colors.clone();

        let report = run(&mut scene, &palette).unwrap();
        assert_eq!(report.destination_name, "Char_A_NewID");

        let destination = scene.palette(&report.destination_palette).unwrap();
        assert_eq!(destination.colors.len(), source_colors.len());
        for (src, dst) in source_colors.iter().zip(&destination.colors) {
            assert_eq!(src.name, dst.name);
            assert_eq!(src.value, dst.value);
            assert_ne!(src.id, dst.id);
        }
        // source palette untouched
        assert_eq!(scene.palette(&palette).unwrap().colors, source_colors);
    }

    #[test]
    fn test_substitution_map_is_injective() {
        let (mut scene, palette) = scene_with_colors(&["a", "b", "c", "d"]);
        let report = run(&mut scene, &palette).unwrap();
        let news: std::collections::HashSet<_> =
            report.substitutions.iter().map(|(_, to)| to.clone()).collect();
        assert_eq!(news.len(), report.substitutions.len());
    }

    #[test]
    fn test_two_runs_make_disjoint_palettes() {
        let (mut scene, palette) = scene_with_colors(&["red", "blue"]);
        let first = run(&mut scene, &palette).unwrap();
        let second = run(&mut scene, &palette).unwrap();
        assert_ne!(first.destination_palette, second.destination_palette);

        let first_ids: std::collections::HashSet<_> = scene
            .palette(&first.destination_palette)
            .unwrap()
            .color_ids()
            .into_iter()
            .collect();
        let second_ids: std::collections::HashSet<_> = scene
            .palette(&second.destination_palette)
            .unwrap()
            .color_ids()
            .into_iter()
            .collect();
        assert!(first_ids.is_disjoint(&second_ids));
    }
}
