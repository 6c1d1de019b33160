//! Lockstep actor runtime
//!
//! Compiled actor templates are instantiated into live actors, bound to each
//! other through one channel per wiring edge and advanced one tick at a time.
//! Within a tick every lagged actor first publishes its previous outputs;
//! the rest receive, compute and emit in dependency order.

#![deny(missing_docs)]
#![warn(clippy::all)]

// Core modules
pub mod actor;
pub mod config;
pub mod error;
pub mod network;
pub mod port;
pub mod runtime;
pub mod schedule;
pub mod template;

// Re-export essential types
pub use actor::{ActorInstance, ActorPhase};
pub use config::RuntimeConfig;
pub use error::{Result, RuntimeError};
pub use network::{NetworkBuilder, WiringEdge};
pub use port::{accumulate, InputPort, OutputPort};
pub use runtime::{LockstepRuntime, RunReport, RunState};
pub use schedule::{CycleError, Schedule};
pub use template::{ActorTemplate, PortSpec, StateVariable};
