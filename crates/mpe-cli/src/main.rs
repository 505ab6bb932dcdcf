#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod command;
mod config;
mod layout;

use std::process;

use crate::config::Cli;

// Tracing target constants
pub const TRACING_TARGET_COMMAND: &str = "mpe_cli::command";
pub const TRACING_TARGET_CONFIG: &str = "mpe_cli::config";

fn main() {
    let Err(error) = run() else {
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_COMMAND,
            error = %error,
            "Command failed"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::init();

    Cli::init_tracing();
    cli.log();

    cli.command.run(&cli.layout)
}
