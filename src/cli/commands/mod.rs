//! Subcommands module for Stacksmith CLI
//!
//! This module contains all the subcommand implementations.

pub mod graph;
pub mod list;
pub mod show;
pub mod synth;

use crate::cli::output::OutputFormatter;
use crate::cli::{Cli, OutputFormat};
use stacksmith::app::App;
use stacksmith::config::Config;

/// Common context shared between commands
pub struct CommandContext {
    /// Configuration
    pub config: Config,
    /// Output formatter
    pub output: OutputFormatter,
    /// Requested output format
    pub format: OutputFormat,
}

impl CommandContext {
    /// Create a new command context from CLI arguments
    pub fn new(cli: &Cli, config: Config) -> Self {
        let use_color = !cli.no_color && config.output.color;
        let output = OutputFormatter::new(use_color, cli.output, cli.verbosity());

        Self {
            config,
            output,
            format: cli.output,
        }
    }
}

/// A subcommand run against the built app
pub trait Runnable {
    /// Execute the command, returning the process exit code
    fn run(&self, ctx: &CommandContext, app: &App) -> anyhow::Result<i32>;
}
