//! # Stacksmith - Declarative Infrastructure Stacks
//!
//! Stacksmith models cloud infrastructure as a graph of typed resource
//! descriptors. A stack definition is a pure function from deployment
//! parameters to a [`ResourceGraph`](resource::ResourceGraph); a synthesizer
//! then translates that graph into an artifact an external deployment engine
//! understands (CloudFormation JSON for the built-in adapter).
//!
//! ## Core Concepts
//!
//! - **Deployment parameters**: project name, region and account id, read once
//!   from the environment at the process boundary
//! - **Resource descriptors**: network, security group, boot script and
//!   compute instance records with explicit reference fields
//! - **Resource graph**: the descriptors plus their reference edges, validated
//!   and ordered with petgraph
//! - **Stacks and the app**: the application root owns named stacks, each
//!   bound to an optional target environment
//! - **Synthesis**: one-shot translation of every stack into a cloud assembly
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        CLI Interface                          │
//! │          (clap parsing, env params, config loading)           │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    App  ──owns──▶  Stack                      │
//! │              (stack::define builds the graph)                 │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       ResourceGraph                           │
//! │   Network ◀── SecurityGroup ◀── Instance ──▶ BootScript       │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │           Synthesizer (CloudFormation adapter)                │
//! │        template.json + manifest.json + tree.json              │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use stacksmith::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let params = DeploymentParameters::from_env();
//!
//!     let mut app = App::new();
//!     app.add_stack(DEFAULT_STACK_ID, StackProps::new(params, StackSettings::default()))?;
//!
//!     let assembly = app.synth(&CloudFormationSynthesizer::new())?;
//!     assembly.write("cdk.out", true)?;
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod prelude {
    //! Convenient re-exports of commonly used types.

    pub use crate::app::App;
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorContext, Result};
    pub use crate::params::DeploymentParameters;
    pub use crate::resource::{
        BootScript, ComputeInstanceDescriptor, IngressRule, Ipv4Cidr, LogicalId, MachineImage,
        NetworkDescriptor, Resource, ResourceGraph, ResourceKind, ResourceRef,
        SecurityGroupDescriptor,
    };
    pub use crate::stack::{Environment, Stack, StackProps, StackSettings, DEFAULT_STACK_ID};
    pub use crate::synth::{Assembly, CloudFormationSynthesizer, StackArtifact, Synthesizer};
}

/// Error types and result aliases.
///
/// Graph validation, configuration and synthesis failures all surface through
/// the single [`Error`](error::Error) enum.
pub mod error;

/// Deployment parameters sourced from the process environment.
pub mod params;

/// Configuration loading and merging.
///
/// Reads TOML, YAML or JSON files from the standard locations, applies
/// environment overrides and projects the result into
/// [`StackSettings`](stack::StackSettings).
pub mod config;

/// Global tracing subscriber setup.
pub mod logging;

/// Typed resource descriptors and the resource graph.
pub mod resource;

/// Stack definition and stack properties.
///
/// [`define`](stack::define) is the pure function that declares the network,
/// security group, boot script and instance of the default stack.
pub mod stack;

/// The application root that owns stacks.
pub mod app;

/// Synthesis adapters and cloud assembly output.
pub mod synth;

/// Returns the current version of Stacksmith.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
