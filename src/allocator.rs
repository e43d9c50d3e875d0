//! Color allocation - fork a source color into a destination palette
//!
//! The copy keeps the source color's display name and its exact value;
//! only the identifier is new. The store's mint guarantees the new id is
//! unique across the whole project and never reused.

use crate::host::{HostError, PaletteStore};
use crate::models::{Color, ColorId, PaletteId};

/// Append a copy of `source` to `destination` under a freshly minted id.
pub fn allocate<H: PaletteStore>(
    host: &mut H,
    source: &Color,
    destination: &PaletteId,
) -> Result<ColorId, HostError> {
    host.add_color(destination, &source.name, source.value.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ColorValue;
    use crate::scene::Scene;

    #[test]
    fn test_allocate_copies_name_and_value() {
        let mut scene = Scene::default();
        let source_pal = scene.create_palette("src");
        let dest_pal = scene.create_palette("dst");
        let source_id = scene
            .add_color(&source_pal, "ink", ColorValue::Solid { r: 10, g: 20, b: 30, a: 255 })
            .unwrap();
        let source = scene.color_by_index(&source_pal, 1).unwrap().clone();
        assert_eq!(source.id, source_id);

        let new_id = allocate(&mut scene, &source, &dest_pal).unwrap();
        assert_ne!(new_id, source.id);

        let copy = scene
            .palette(&dest_pal)
            .unwrap()
            .colors
            .iter()
            .find(|c| c.id == new_id)
            .unwrap();
        assert_eq!(copy.name, "ink");
        assert_eq!(copy.value, source.value);
    }

    #[test]
    fn test_allocate_reports_full_palette() {
        let mut scene = Scene::default();
        let source_pal = scene.create_palette("src");
        let dest_pal = scene.create_palette("dst");
        scene.max_palette_colors = Some(1);
        let source = scene.color_by_index(&source_pal, 0).unwrap().clone();

        let err = allocate(&mut scene, &source, &dest_pal).unwrap_err();
        assert!(matches!(err, HostError::PaletteFull { .. }));
    }
}
