//! Command-line interface implementation

use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::host::{ConfirmationPrompt, PaletteStore};
use crate::overrides::find_override_modules;
use crate::remap;
use crate::scene::Scene;
use crate::usage::DrawingUsageIndex;

/// Exit codes
const EXIT_SUCCESS: u8 = 0;
const EXIT_ERROR: u8 = 1;
const EXIT_INVALID_ARGS: u8 = 2;

/// palfork - Fork a scene palette with new color ids and rewire every consumer
#[derive(Parser)]
#[command(name = "palfork")]
#[command(about = "Fork a scene palette with new color ids and rewire every consumer")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Copy a palette with new color ids and recolor every drawing and
    /// override module that used the originals
    Fork {
        /// Scene document (JSON)
        scene: PathBuf,

        /// Name of the palette to copy
        #[arg(short, long)]
        palette: String,

        /// Output path (default: rewrite the scene in place)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// List drawing usages and override-module candidates for a palette
    /// without modifying the scene
    Inspect {
        /// Scene document (JSON)
        scene: PathBuf,

        /// Name of the palette to inspect
        #[arg(short, long)]
        palette: String,
    },
}

/// Run the CLI application
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Fork {
            scene,
            palette,
            output,
            yes,
        } => run_fork(&scene, &palette, output.as_deref(), yes),
        Commands::Inspect { scene, palette } => run_inspect(&scene, &palette),
    }
}

/// The human-readable summary shown before a fork starts.
fn confirmation_summary(palette_name: &str) -> String {
    format!(
        "You are about to make a copy of: {palette_name}\n\
         All colors in the copied palette will have new color ids.\n\
         All drawings and override modules that use colors on the original \
         palette will be recolored with the copied colors."
    )
}

/// Confirmation prompt backed by stdin: prints the summary and asks y/N.
struct StdinPrompt;

impl ConfirmationPrompt for StdinPrompt {
    fn confirm(&mut self, summary: &str) -> bool {
        println!("{summary}");
        print!("Proceed? [y/N] ");
        if io::stdout().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim(), "y" | "Y" | "yes")
    }
}

/// Execute the fork command
fn run_fork(scene_path: &Path, palette_name: &str, output: Option<&Path>, yes: bool) -> ExitCode {
    let mut scene = match Scene::load(scene_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: Cannot open scene '{}': {}", scene_path.display(), e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    let Some(palette_id) = scene.find_palette_by_name(palette_name) else {
        eprintln!("Error: No palette named '{palette_name}' found in scene");
        return ExitCode::from(EXIT_INVALID_ARGS);
    };

    // checked before prompting so an empty palette never asks a question
    let is_empty = scene
        .palette(&palette_id)
        .map(|p| p.colors.is_empty())
        .unwrap_or(true);
    if is_empty {
        eprintln!("Error: Palette '{palette_name}' has no colors to copy");
        return ExitCode::from(EXIT_ERROR);
    }

    if !yes && !StdinPrompt.confirm(&confirmation_summary(palette_name)) {
        println!("Cancelled.");
        return ExitCode::from(EXIT_SUCCESS);
    }

    let report = match remap::run(&mut scene, &palette_id) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let destination = output.unwrap_or(scene_path);
    if let Err(e) = scene.save(destination) {
        eprintln!("Error: Cannot write scene '{}': {}", destination.display(), e);
        return ExitCode::from(EXIT_ERROR);
    }

    println!(
        "Created palette '{}' ({} colors copied from '{}')",
        report.destination_name,
        report.substitutions.len(),
        report.source_palette
    );
    println!(
        "Rewrote {} drawing(s) and {} override record(s)",
        report.drawings_rewritten, report.override_records_rewritten
    );
    for skipped in &report.skipped_modules {
        eprintln!("Warning: skipped module '{}': {}", skipped.name, skipped.detail);
    }

    ExitCode::from(EXIT_SUCCESS)
}

/// Execute the inspect command
fn run_inspect(scene_path: &Path, palette_name: &str) -> ExitCode {
    let scene = match Scene::load(scene_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: Cannot open scene '{}': {}", scene_path.display(), e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    let Some(palette_id) = scene.find_palette_by_name(palette_name) else {
        eprintln!("Error: No palette named '{palette_name}' found in scene");
        return ExitCode::from(EXIT_INVALID_ARGS);
    };
    let palette = match scene.palette(&palette_id) {
        Some(p) => p.clone(),
        None => {
            eprintln!("Error: No palette named '{palette_name}' found in scene");
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    let index = match DrawingUsageIndex::build(&scene) {
        Ok(i) => i,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(EXIT_ERROR);
        }
    };

    for color in &palette.colors {
        let usages = index.usages_of(&color.id);
        println!("{} ({}): {} drawing usage(s)", color.name, color.id, usages.len());
        for usage in usages {
            println!("  node '{}' content '{}' (frame {})", usage.node, usage.cel, usage.frame);
        }
    }

    let candidates = find_override_modules(&scene, &palette.color_ids());
    println!("{} override module candidate(s)", candidates.len());
    for module in candidates {
        println!("  module '{module}'");
    }

    ExitCode::from(EXIT_SUCCESS)
}
