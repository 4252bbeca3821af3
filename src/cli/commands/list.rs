//! List command

use super::{CommandContext, Runnable};
use anyhow::Result;
use clap::Parser;
use serde_json::json;
use stacksmith::app::App;

/// Arguments for the list command
#[derive(Parser, Debug, Clone)]
pub struct ListArgs {}

impl Runnable for ListArgs {
    fn run(&self, ctx: &CommandContext, app: &App) -> Result<i32> {
        if ctx.output.is_human() {
            let rows: Vec<Vec<String>> = app
                .stacks()
                .map(|stack| {
                    vec![
                        stack.id().to_string(),
                        stack.env().to_string(),
                        stack.graph().len().to_string(),
                    ]
                })
                .collect();
            ctx.output.table(&["STACK", "ENVIRONMENT", "RESOURCES"], &rows);
            return Ok(0);
        }

        let stacks: Vec<_> = app
            .stacks()
            .map(|stack| {
                json!({
                    "id": stack.id(),
                    "environment": stack.env().to_string(),
                    "resources": stack.graph().len(),
                })
            })
            .collect();
        ctx.output.data(&stacks)?;
        Ok(0)
    }
}
