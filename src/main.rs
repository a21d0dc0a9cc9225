//! Main entry point for the `cqt` CLI.

use code_quality_tool::cli;
use console::style;
use std::process::ExitCode;

fn main() -> ExitCode {
    match cli::run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {e}", style("Error:").red().bold());
            ExitCode::from(e.exit_code())
        },
    }
}
