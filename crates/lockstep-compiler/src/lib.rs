#![doc = "Component-to-actor compiler.\n\nTurns every component of a host model into an actor template, resolves the model's connections into wiring edges and verifies the result before it is lowered onto the lockstep runtime.\n\nStages:\n- Extraction (extract): resolve a named pure function and snapshot the values it reads and writes\n- Actor compilation (compile): state variables, input ports for connection destinations, output ports for written compartments, optional reset\n- Wiring (wire): one edge per (source, destination) pair; fan-in edges accumulate\n- Passes: port verification and the lag-cycle check (every cycle needs a lagged actor)\n- Lowering (CompiledNetwork::into_runtime): instantiate actors and bind one channel per edge\n"]

#![deny(missing_docs)]

use std::collections::BTreeMap;

use lockstep_model::Model;
use lockstep_runtime::{ActorTemplate, LockstepRuntime, NetworkBuilder, RuntimeConfig, WiringEdge};

pub mod actor;
pub mod error;
pub mod extract;
pub mod passes;
pub mod wiring;

pub use actor::compile;
pub use error::{CompilerError, Result};
pub use extract::{extract, Extraction};
pub use passes::{LagCyclePass, Pass, PassManager, VerifyPortsPass};
pub use wiring::wire;

/// Templates and edges that passed verification, ready to be lowered
#[derive(Debug, Clone, Default)]
pub struct CompiledNetwork {
    templates: BTreeMap<String, ActorTemplate>,
    edges: Vec<WiringEdge>,
}

impl CompiledNetwork {
    /// Assemble a network from templates and edges without verifying it
    pub fn new(templates: Vec<ActorTemplate>, edges: Vec<WiringEdge>) -> Self {
        Self {
            templates: templates
                .into_iter()
                .map(|t| (t.name().to_string(), t))
                .collect(),
            edges,
        }
    }

    /// Template by actor name
    pub fn template(&self, name: &str) -> Option<&ActorTemplate> {
        self.templates.get(name)
    }

    /// All templates, ordered by name
    pub fn templates(&self) -> impl Iterator<Item = &ActorTemplate> {
        self.templates.values()
    }

    /// Wiring edges
    pub fn edges(&self) -> &[WiringEdge] {
        &self.edges
    }

    /// Number of actors
    pub fn actor_count(&self) -> usize {
        self.templates.len()
    }

    /// Instantiate the actors and bind the edges
    pub fn into_runtime(self, config: RuntimeConfig) -> Result<LockstepRuntime> {
        let mut builder = NetworkBuilder::new().with_config(config);
        for template in self.templates.into_values() {
            builder = builder.add_actor(template);
        }
        for edge in self.edges {
            builder = builder.add_edge(edge);
        }
        Ok(builder.build()?)
    }
}

/// Compile every component of `model`, wire them and run the standard passes.
///
/// `lag` decides each component's lag flag by name. Any failure aborts the
/// whole compile.
pub fn compile_model(model: &Model, lag: impl Fn(&str) -> bool) -> Result<CompiledNetwork> {
    compile_with_passes(model, lag, &PassManager::standard())
}

/// Like [`compile_model`] with a caller-supplied pass pipeline
pub fn compile_with_passes(
    model: &Model,
    lag: impl Fn(&str) -> bool,
    passes: &PassManager,
) -> Result<CompiledNetwork> {
    let mut templates = BTreeMap::new();
    for component in model.components() {
        let template = compile(component, lag(component.name()))?;
        templates.insert(component.name().to_string(), template);
    }

    let edges = wire(&templates, model)?;
    let network = CompiledNetwork { templates, edges };
    passes.run(&network)?;

    log::info!(
        "Compiled model '{}': {} actors, {} edges",
        model.name(),
        network.actor_count(),
        network.edges().len()
    );
    Ok(network)
}
