//! euk - EUK console
//!
//! CLI entry point.

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use clap::Parser;
use std::process::ExitCode;

use euk::cli::Cli;
use euk::core::logging;
use euk::util::should_use_color;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    logging::init(&logging::LogSettings::resolve(
        cli.log_level.as_deref(),
        cli.log_format.as_deref(),
        cli.verbose,
    ));

    let format = cli.effective_format();
    let pretty = cli.pretty;
    let color = should_use_color(cli.no_color || std::env::var_os("NO_COLOR").is_some());
    colored::control::set_override(color);

    match euk::cli::run(cli).await {
        Ok(output) => {
            if !output.is_empty() {
                if output.ends_with('\n') {
                    print!("{output}");
                } else {
                    println!("{output}");
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::debug!(code = e.error_code(), error = %e, "command failed");
            eprintln!("{}", euk::render::render_error(&e, format, color, pretty));
            ExitCode::from(e.exit_code() as u8)
        }
    }
}
