//! Lockstep context manager
//!
//! A [`LockstepContext`] owns a host component model together with the actor
//! runtime compiled from it. Model edits go through `update` scopes that
//! trigger a rebuild; `inspect` scopes only read. A rebuild recompiles every
//! component, rewires and verifies the tick schedule before the previous
//! runtime is replaced, so a failed rebuild never leaves a half-built network.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod context;
pub mod error;

pub use config::ContextConfig;
pub use context::{LifecycleState, LockstepContext};
pub use error::{ContextError, Result};

// Re-export the layers a caller needs to describe a model and read results
pub use lockstep_compiler::CompilerError;
pub use lockstep_model::{value, Bindings, Component, Model, PureFunction, Topology, Value, ValueRecord};
pub use lockstep_runtime::{ActorInstance, RunReport, RuntimeConfig};
