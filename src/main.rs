//! Stacksmith - declarative infrastructure stacks
//!
//! This is the main entry point for the Stacksmith CLI. Deployment parameters
//! are read from the environment exactly once, here.

mod cli;

use anyhow::Result;
use cli::commands::{CommandContext, Runnable};
use cli::output::OutputFormatter;
use cli::{Cli, Commands};
use stacksmith::app::App;
use stacksmith::config::Config;
use stacksmith::error::Error;
use stacksmith::logging::LoggingBuilder;
use stacksmith::params::DeploymentParameters;
use stacksmith::stack::{StackProps, DEFAULT_STACK_ID};

/// Application version information
const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() {
    // Parse command line arguments
    let cli = Cli::parse_args();

    let exit_code = match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            let output = OutputFormatter::new(!cli.no_color, cli.output, cli.verbosity());
            output.error(&format!("{e:#}"));
            e.downcast_ref::<Error>().map_or(1, Error::exit_code)
        }
    };

    std::process::exit(exit_code);
}

fn run(cli: &Cli) -> Result<i32> {
    // Load configuration
    let config = Config::load(cli.config.as_ref())?;

    // Initialize logging based on verbosity and config
    LoggingBuilder::from_config(config.logging.clone())
        .with_verbosity(cli.verbosity())
        .with_ansi(!cli.no_color && config.output.color)
        .init()?;

    if cli.verbosity() >= 2 {
        eprintln!("Stacksmith v{VERSION}");
    }

    let params = DeploymentParameters::from_env();
    let props = StackProps::new(params, config.settings()).with_env(cli.environment());

    let mut app = App::new();
    app.add_stack(DEFAULT_STACK_ID, props)?;

    let ctx = CommandContext::new(cli, config);

    // Execute the appropriate command
    match &cli.command {
        Commands::Synth(args) => args.run(&ctx, &app),
        Commands::List(args) => args.run(&ctx, &app),
        Commands::Show(args) => args.run(&ctx, &app),
        Commands::Graph(args) => args.run(&ctx, &app),
    }
}
