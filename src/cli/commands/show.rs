//! Show command
//!
//! Prints the resource graph of one stack, either as a table or serialized.

use super::{CommandContext, Runnable};
use crate::cli::OutputFormat;
use anyhow::Result;
use clap::{Parser, ValueEnum};
use serde_json::json;
use stacksmith::app::App;
use stacksmith::stack::DEFAULT_STACK_ID;

/// Serialization format of the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GraphFormat {
    /// JSON
    Json,
    /// YAML
    Yaml,
}

/// Arguments for the show command
#[derive(Parser, Debug, Clone)]
pub struct ShowArgs {
    /// Stack to show
    #[arg(long, default_value = DEFAULT_STACK_ID)]
    pub stack: String,

    /// Serialize the graph instead of printing a table
    #[arg(long, value_enum)]
    pub format: Option<GraphFormat>,
}

impl Runnable for ShowArgs {
    fn run(&self, ctx: &CommandContext, app: &App) -> Result<i32> {
        let stack = app.stack(&self.stack)?;

        let format = match (self.format, ctx.format) {
            (Some(GraphFormat::Json), _) => OutputFormat::Json,
            (Some(GraphFormat::Yaml), _) => OutputFormat::Yaml,
            (None, format) => format,
        };

        if format != OutputFormat::Human {
            ctx.output.data_as(
                &json!({
                    "stack": stack.id(),
                    "environment": stack.env().to_string(),
                    "graph": stack.graph(),
                }),
                format,
            )?;
            return Ok(0);
        }

        let graph = stack.graph();
        ctx.output.banner(&format!("STACK {}", stack.id()));

        let rows: Vec<Vec<String>> = graph
            .nodes()
            .map(|node| {
                let depends_on: Vec<String> = node
                    .resource
                    .references()
                    .iter()
                    .map(|r| r.target.id.to_string())
                    .collect();
                vec![
                    node.id.to_string(),
                    node.resource.kind().to_string(),
                    depends_on.join(", "),
                ]
            })
            .collect();
        ctx.output.table(&["RESOURCE", "KIND", "DEPENDS ON"], &rows);

        for (id, script) in graph.boot_scripts() {
            let steps: Vec<String> = script
                .commands()
                .iter()
                .map(|c| format!("{}: {}", c.name, c.line))
                .collect();
            ctx.output.list(&format!("{id} steps"), &steps);
        }

        ctx.output.section("Environment");
        println!("{}", stack.env());
        Ok(0)
    }
}
