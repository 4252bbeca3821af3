//! Graph command

use super::{CommandContext, Runnable};
use anyhow::Result;
use clap::Parser;
use stacksmith::app::App;
use stacksmith::stack::DEFAULT_STACK_ID;

/// Arguments for the graph command
#[derive(Parser, Debug, Clone)]
pub struct GraphArgs {
    /// Stack to print
    #[arg(long, default_value = DEFAULT_STACK_ID)]
    pub stack: String,

    /// Print the deployment order instead of DOT
    #[arg(long)]
    pub order: bool,
}

impl Runnable for GraphArgs {
    fn run(&self, ctx: &CommandContext, app: &App) -> Result<i32> {
        let stack = app.stack(&self.stack)?;
        let graph = stack.graph();

        if self.order {
            let order = graph.deployment_order()?;
            if ctx.output.is_human() {
                for (position, id) in order.iter().enumerate() {
                    println!("{:>2}. {}", position + 1, id);
                }
            } else {
                ctx.output.data(&order)?;
            }
            return Ok(0);
        }

        print!("{}", graph.to_dot(stack.id()));
        ctx.output.flush();
        Ok(0)
    }
}
