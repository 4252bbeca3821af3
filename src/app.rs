//! Application root.

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::stack::{Stack, StackProps};
use crate::synth::{Assembly, Synthesizer};

/// Owns every stack of a run, in registration order.
#[derive(Debug, Default)]
pub struct App {
    stacks: IndexMap<String, Stack>,
}

impl App {
    /// Create an empty app.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build and register a stack.
    ///
    /// Nothing is registered if the id is taken or the stack fails to build.
    pub fn add_stack(&mut self, id: impl Into<String>, props: StackProps) -> Result<&Stack> {
        let id = id.into();
        if self.stacks.contains_key(&id) {
            return Err(Error::DuplicateStack(id));
        }

        let stack = Stack::new(id.clone(), props)?;
        let entry = self.stacks.entry(id).or_insert(stack);
        Ok(entry)
    }

    /// Registered stacks.
    pub fn stacks(&self) -> impl Iterator<Item = &Stack> {
        self.stacks.values()
    }

    /// Look up a stack by id.
    pub fn stack(&self, id: &str) -> Result<&Stack> {
        self.stacks
            .get(id)
            .ok_or_else(|| Error::StackNotFound(id.to_string()))
    }

    /// Number of stacks.
    pub fn len(&self) -> usize {
        self.stacks.len()
    }

    /// True when no stack is registered.
    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }

    /// Synthesize every stack into one assembly.
    pub fn synth(&self, synthesizer: &dyn Synthesizer) -> Result<Assembly> {
        let mut assembly = Assembly::new();
        for stack in self.stacks.values() {
            tracing::info!("Synthesizing stack '{}'", stack.id());
            assembly.push(synthesizer.synthesize(stack)?);
        }
        Ok(assembly)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::DeploymentParameters;
    use crate::stack::{StackSettings, DEFAULT_STACK_ID};

    fn props() -> StackProps {
        StackProps::new(DeploymentParameters::default(), StackSettings::default())
    }

    #[test]
    fn test_add_stack() {
        let mut app = App::new();
        let stack = app.add_stack(DEFAULT_STACK_ID, props()).unwrap();
        assert_eq!(stack.id(), DEFAULT_STACK_ID);
        assert!(stack.env().is_agnostic());
        assert_eq!(app.len(), 1);
        assert!(app.stack(DEFAULT_STACK_ID).is_ok());
    }

    #[test]
    fn test_duplicate_stack() {
        let mut app = App::new();
        app.add_stack(DEFAULT_STACK_ID, props()).unwrap();
        let err = app.add_stack(DEFAULT_STACK_ID, props()).unwrap_err();
        assert!(matches!(err, Error::DuplicateStack(_)));
        assert_eq!(app.len(), 1);
    }

    #[test]
    fn test_failed_stack_is_not_registered() {
        let mut app = App::new();
        let mut settings = StackSettings::default();
        settings.network.max_azs = 0;
        let result = app.add_stack(
            "Broken",
            StackProps::new(DeploymentParameters::default(), settings),
        );
        assert!(result.is_err());
        assert!(app.is_empty());
        assert!(matches!(
            app.stack("Broken").unwrap_err(),
            Error::StackNotFound(_)
        ));
    }
}
