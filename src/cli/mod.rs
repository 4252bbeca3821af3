//! CLI module for Stacksmith
//!
//! This module provides the command-line interface for Stacksmith,
//! including argument parsing and subcommand handling.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand, ValueEnum};
use stacksmith::stack::Environment;
use std::path::PathBuf;

/// Stacksmith - declarative infrastructure stacks
///
/// Builds the default stack from the environment and synthesizes it into a
/// CloudFormation cloud assembly.
#[derive(Parser, Debug, Clone)]
#[command(name = "stacksmith")]
#[command(author = "Stacksmith Contributors")]
#[command(version)]
#[command(about = "Declarative infrastructure stacks synthesized to CloudFormation", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short = 'c', long, global = true, env = "STACKSMITH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Human)]
    pub output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Bind the stack to this region
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Bind the stack to this account
    #[arg(long, global = true)]
    pub account: Option<String>,
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output with colors
    #[default]
    Human,
    /// JSON output for scripting
    Json,
    /// YAML output
    Yaml,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Synthesize the cloud assembly
    Synth(commands::synth::SynthArgs),

    /// List registered stacks
    List(commands::list::ListArgs),

    /// Show the resources of a stack
    Show(commands::show::ShowArgs),

    /// Print the resource dependency graph
    Graph(commands::graph::GraphArgs),
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Get the effective verbosity level (0-3)
    pub fn verbosity(&self) -> u8 {
        self.verbose.min(3)
    }

    /// Target environment bound by `--account`/`--region`
    pub fn environment(&self) -> Environment {
        Environment::new(self.account.clone(), self.region.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "stacksmith",
            "synth",
            "--region",
            "us-east-1",
            "--account",
            "123456789012",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.verbosity(), 2);
        assert_eq!(
            cli.environment().to_string(),
            "aws://123456789012/us-east-1"
        );
    }

    #[test]
    fn test_default_environment_is_agnostic() {
        let cli = Cli::try_parse_from(["stacksmith", "list"]).unwrap();
        assert!(cli.environment().is_agnostic());
        assert_eq!(cli.output, OutputFormat::Human);
    }
}
