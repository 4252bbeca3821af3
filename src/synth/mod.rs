//! Synthesis adapters.
//!
//! A [`Synthesizer`] turns one built [`Stack`] into a [`StackArtifact`]: the
//! template an external deployment engine consumes plus the bookkeeping the
//! assembly manifest needs. Synthesis never talks to a cloud API.

pub mod assembly;
pub mod cloudformation;

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::Result;
use crate::stack::{Environment, Stack};

pub use assembly::Assembly;
pub use cloudformation::CloudFormationSynthesizer;

/// Translates a stack into a target engine format.
pub trait Synthesizer {
    /// Short name of the target format
    fn name(&self) -> &'static str;

    /// Synthesize one stack.
    fn synthesize(&self, stack: &Stack) -> Result<StackArtifact>;
}

/// The synthesized form of one stack.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StackArtifact {
    /// Stack id
    pub stack_id: String,
    /// Artifact type recorded in the manifest
    pub artifact_type: String,
    /// Target environment
    pub environment: Environment,
    /// Engine template
    pub template: serde_json::Value,
    /// Engine logical id to construct path
    pub construct_paths: IndexMap<String, String>,
}

impl StackArtifact {
    /// File name of the template inside the assembly.
    pub fn template_file(&self) -> String {
        format!("{}.template.json", self.stack_id)
    }
}
