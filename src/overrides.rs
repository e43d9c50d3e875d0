//! Override modules - indexing and rewriting serialized color references
//!
//! Override modules (color selectors) store an ordered list of records as
//! serialized JSON text in their configuration; each record names a color
//! id plus arbitrary other fields. The candidate scan runs once per
//! palette over the raw text; the rewrite parses the list, substitutes
//! matching ids and writes the list back with record order and all other
//! fields untouched.

use thiserror::Error;

use crate::host::{HostError, OverrideStore};
use crate::models::{ColorId, ModuleId, OverrideRecord};

/// Module kind whose configuration embeds a color reference list.
pub const COLOR_SELECTOR_KIND: &str = "color-selector";
/// Configuration field holding the serialized reference list.
pub const SELECTED_COLORS_ATTR: &str = "selectedcolors";

/// A module's reference list could not be read or parsed. The module is
/// skipped and reported; the run continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("module '{module}': malformed override data: {detail}")]
pub struct MalformedOverrideData {
    pub module: String,
    pub detail: String,
}

/// All color-selector modules whose raw reference-list text mentions any
/// of `palette_color_ids`. Computed once per palette: the same candidate
/// set serves every color of the palette being remapped. Modules without
/// the reference-list attribute are not candidates.
pub fn find_override_modules<H: OverrideStore>(
    host: &H,
    palette_color_ids: &[ColorId],
) -> Vec<ModuleId> {
    let mut found = Vec::new();
    for module in host.modules_of_kind(COLOR_SELECTOR_KIND) {
        let Ok(text) = host.config_text(&module, SELECTED_COLORS_ATTR) else {
            continue;
        };
        if palette_color_ids.iter().any(|id| text.contains(id.as_str())) {
            found.push(module);
        }
    }
    found
}

/// Replace `old` with `new` in every record of the module's reference
/// list. Returns how many records were substituted; the list is only
/// written back when at least one record changed.
pub fn rewrite_override<H: OverrideStore>(
    host: &mut H,
    module: &ModuleId,
    old: &ColorId,
    new: &ColorId,
) -> Result<usize, MalformedOverrideData> {
    let text = host
        .config_text(module, SELECTED_COLORS_ATTR)
        .map_err(|e| malformed(host, module, e))?;
    let mut records: Vec<OverrideRecord> =
        serde_json::from_str(&text).map_err(|e| MalformedOverrideData {
            module: host.module_name(module),
            detail: e.to_string(),
        })?;

    let mut replaced = 0;
    for record in &mut records {
        if record.color_id == old.as_str() {
            record.color_id = new.as_str().to_string();
            replaced += 1;
        }
    }
    if replaced == 0 {
        return Ok(0);
    }

    let updated = serde_json::to_string(&records).map_err(|e| MalformedOverrideData {
        module: host.module_name(module),
        detail: e.to_string(),
    })?;
    host.set_config_text(module, SELECTED_COLORS_ATTR, &updated)
        .map_err(|e| malformed(host, module, e))?;
    Ok(replaced)
}

fn malformed<H: OverrideStore>(
    host: &H,
    module: &ModuleId,
    error: HostError,
) -> MalformedOverrideData {
    MalformedOverrideData {
        module: host.module_name(module),
        detail: error.to_string(),
    }
}
