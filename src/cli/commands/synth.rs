//! Synth command
//!
//! Writes the cloud assembly of every registered stack.

use super::{CommandContext, Runnable};
use anyhow::Result;
use clap::Parser;
use serde_json::json;
use stacksmith::app::App;
use stacksmith::synth::{CloudFormationSynthesizer, Synthesizer};
use std::path::PathBuf;

/// Arguments for the synth command
#[derive(Parser, Debug, Clone)]
pub struct SynthArgs {
    /// Assembly directory (overrides `[output] directory`)
    #[arg(short = 'o', long)]
    pub out: Option<PathBuf>,

    /// Write compact JSON instead of indented JSON
    #[arg(long)]
    pub compact: bool,
}

impl Runnable for SynthArgs {
    fn run(&self, ctx: &CommandContext, app: &App) -> Result<i32> {
        let out = self
            .out
            .clone()
            .unwrap_or_else(|| ctx.config.output.directory.clone());
        let pretty = ctx.config.output.pretty && !self.compact;

        let synthesizer = CloudFormationSynthesizer::new();
        ctx.output.banner("STACKSMITH SYNTH");
        ctx.output
            .info(&format!("Using the {} synthesizer", synthesizer.name()));

        for stack in app.stacks() {
            for (_, sg) in stack.graph().security_groups() {
                if sg.ingress.iter().any(|r| r.is_open_to_world()) {
                    ctx.output.warning(&format!(
                        "{}: security group admits traffic from 0.0.0.0/0",
                        stack.id()
                    ));
                }
            }
        }

        let assembly = app.synth(&synthesizer)?;
        let written = assembly.write(&out, pretty)?;

        if ctx.output.is_human() {
            for artifact in assembly.artifacts() {
                ctx.output.success(&format!(
                    "{} ({}) -> {}",
                    artifact.stack_id,
                    artifact.environment,
                    out.join(artifact.template_file()).display()
                ));
            }
        } else {
            let files: Vec<String> = written.iter().map(|p| p.display().to_string()).collect();
            ctx.output.data(&json!({
                "directory": out.display().to_string(),
                "files": files,
                "manifest": assembly.manifest(),
            }))?;
        }

        Ok(0)
    }
}
