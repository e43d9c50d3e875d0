//! palfork - Command-line tool for forking scene palettes with new color ids

use std::process::ExitCode;

use palette_fork::cli;

fn main() -> ExitCode {
    cli::run()
}
