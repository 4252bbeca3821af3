//! First-boot scripts.
//!
//! A boot script is an ordered list of shell commands run once when an
//! instance first starts. Commands are rendered one per line under a
//! `#!/bin/bash` header. Without `halt_on_error` the shell keeps going after a
//! failing command and nothing is reported back.
//!
//! Commands may be declared from minijinja templates; see
//! [`BootScript::add_templates`].

use minijinja::{Environment, UndefinedBehavior};
use serde::{Deserialize, Serialize};

use super::LogicalId;
use crate::error::{Error, Result};

const SHEBANG: &str = "#!/bin/bash";

/// One named command of a boot script.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BootCommand {
    /// Short step name, e.g. `install-java`
    pub name: String,
    /// Shell line
    pub line: String,
}

/// Ordered first-boot command sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootScript {
    commands: Vec<BootCommand>,
    halt_on_error: bool,
}

impl BootScript {
    /// An empty Linux boot script.
    pub fn for_linux() -> Self {
        Self::default()
    }

    /// Stop at the first failing command (`set -e`).
    pub fn with_halt_on_error(mut self, halt: bool) -> Self {
        self.halt_on_error = halt;
        self
    }

    /// Whether the script stops at the first failure.
    pub fn halt_on_error(&self) -> bool {
        self.halt_on_error
    }

    /// Append one command.
    pub fn add_command(&mut self, name: impl Into<String>, line: impl Into<String>) {
        self.commands.push(BootCommand {
            name: name.into(),
            line: line.into(),
        });
    }

    /// Render each `(name, template)` pair against `context` and append the
    /// results in order. Undefined variables are errors, and nothing is
    /// appended unless every template renders.
    pub fn add_templates<S: Serialize>(
        &mut self,
        templates: &[(&str, &str)],
        context: S,
    ) -> Result<()> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        let ctx = minijinja::Value::from_serialize(&context);

        let rendered = templates
            .iter()
            .map(|(name, source)| {
                env.render_str(source, &ctx)
                    .map(|line| BootCommand {
                        name: (*name).to_string(),
                        line,
                    })
                    .map_err(|e| Error::TemplateRender {
                        template: (*name).to_string(),
                        message: e.to_string(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        self.commands.extend(rendered);
        Ok(())
    }

    /// Commands in declaration order.
    pub fn commands(&self) -> &[BootCommand] {
        &self.commands
    }

    /// Step names in declaration order.
    pub fn step_names(&self) -> Vec<&str> {
        self.commands.iter().map(|c| c.name.as_str()).collect()
    }

    /// Number of commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// True when no command was declared.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// The full script body.
    pub fn render(&self) -> String {
        let mut lines = vec![SHEBANG];
        if self.halt_on_error {
            lines.push("set -e");
        }
        lines.extend(self.commands.iter().map(|c| c.line.as_str()));
        lines.join("\n")
    }

    pub(crate) fn validate(&self, id: &LogicalId) -> Result<()> {
        if let Some(cmd) = self.commands.iter().find(|c| c.line.contains('\n')) {
            return Err(Error::invalid_descriptor(
                id.as_str(),
                format!("command '{}' spans multiple lines", cmd.name),
            ));
        }
        // EC2 caps raw user data at 16 KiB
        if self.render().len() > 16 * 1024 {
            return Err(Error::invalid_descriptor(
                id.as_str(),
                "rendered script exceeds 16 KiB",
            ));
        }
        Ok(())
    }
}
