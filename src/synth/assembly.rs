//! Cloud assembly: the on-disk output of a synthesis run.
//!
//! ```text
//! <dir>/
//!   <StackId>.template.json
//!   manifest.json
//!   tree.json
//! ```

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{json, Map, Value};

use super::StackArtifact;
use crate::error::{ErrorContext, Result};

/// Manifest file name.
pub const MANIFEST_FILE: &str = "manifest.json";
/// Construct tree file name.
pub const TREE_FILE: &str = "tree.json";

const ASSEMBLY_VERSION: &str = "1.0.0";

/// Every artifact of one synthesis run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Assembly {
    artifacts: Vec<StackArtifact>,
}

impl Assembly {
    /// Create an empty assembly.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stack artifact.
    pub fn push(&mut self, artifact: StackArtifact) {
        self.artifacts.push(artifact);
    }

    /// Artifacts in synthesis order.
    pub fn artifacts(&self) -> &[StackArtifact] {
        &self.artifacts
    }

    /// Look up the artifact of one stack.
    pub fn artifact(&self, stack_id: &str) -> Option<&StackArtifact> {
        self.artifacts.iter().find(|a| a.stack_id == stack_id)
    }

    /// Manifest describing every artifact and its environment.
    pub fn manifest(&self) -> Value {
        let artifacts: Map<String, Value> = self
            .artifacts
            .iter()
            .map(|a| {
                (
                    a.stack_id.clone(),
                    json!({
                        "type": a.artifact_type,
                        "environment": a.environment.to_string(),
                        "properties": {
                            "templateFile": a.template_file(),
                        },
                    }),
                )
            })
            .collect();

        json!({
            "version": ASSEMBLY_VERSION,
            "artifacts": artifacts,
        })
    }

    /// Logical id to construct path, per stack.
    pub fn tree(&self) -> Value {
        let stacks: Map<String, Value> = self
            .artifacts
            .iter()
            .map(|a| (a.stack_id.clone(), json!(a.construct_paths)))
            .collect();

        json!({
            "version": ASSEMBLY_VERSION,
            "stacks": stacks,
        })
    }

    /// Write the assembly into `dir`, creating it if needed.
    ///
    /// Returns the written paths. Output bytes depend only on the assembly
    /// contents.
    pub fn write(&self, dir: impl AsRef<Path>, pretty: bool) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create assembly directory {}", dir.display()))?;

        let mut written = Vec::with_capacity(self.artifacts.len() + 2);
        for artifact in &self.artifacts {
            let path = dir.join(artifact.template_file());
            write_json(&path, &artifact.template, pretty)?;
            written.push(path);
        }

        let manifest = dir.join(MANIFEST_FILE);
        write_json(&manifest, &self.manifest(), pretty)?;
        written.push(manifest);

        let tree = dir.join(TREE_FILE);
        write_json(&tree, &self.tree(), pretty)?;
        written.push(tree);

        tracing::info!("Wrote {} files to {}", written.len(), dir.display());
        Ok(written)
    }
}

fn write_json(path: &Path, value: &Value, pretty: bool) -> Result<()> {
    let mut body = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    body.push('\n');
    std::fs::write(path, body).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::debug!("Wrote {}", path.display());
    Ok(())
}
