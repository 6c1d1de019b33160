//! Verification passes run over a compiled network before it is lowered

use std::collections::BTreeMap;

use lockstep_runtime::Schedule;

use crate::{
    error::{CompilerError, Result},
    CompiledNetwork,
};

/// A verification pass over a compiled network
pub trait Pass {
    /// Human-readable pass name
    fn name(&self) -> &'static str;
    /// Check the network, failing the whole compile on error
    fn run(&self, network: &CompiledNetwork) -> Result<()>;
}

/// Runs passes in sequence, stopping at the first failure
#[derive(Default)]
pub struct PassManager {
    passes: Vec<Box<dyn Pass>>,
}

impl PassManager {
    /// Create an empty pass manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Pipeline used by [`crate::compile_model`]
    pub fn standard() -> Self {
        let mut pm = Self::new();
        pm.add(Box::new(VerifyPortsPass));
        pm.add(Box::new(LagCyclePass));
        pm
    }

    /// Append a pass to the pipeline
    pub fn add(&mut self, pass: Box<dyn Pass>) {
        self.passes.push(pass);
    }

    /// Number of registered passes
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    /// True if no pass is registered
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Run all passes in order
    pub fn run(&self, network: &CompiledNetwork) -> Result<()> {
        for p in &self.passes {
            log::debug!("Running pass '{}'", p.name());
            p.run(network)?;
        }
        Ok(())
    }
}

/// Every edge endpoint names a compiled actor and an existing port
pub struct VerifyPortsPass;

impl Pass for VerifyPortsPass {
    fn name(&self) -> &'static str {
        "verify-ports"
    }

    fn run(&self, network: &CompiledNetwork) -> Result<()> {
        for edge in network.edges() {
            let producer = network
                .template(&edge.producer)
                .ok_or_else(|| CompilerError::unresolved(&edge.producer, "producer not compiled"))?;
            if producer.output(&edge.output).is_none() {
                return Err(CompilerError::unresolved(
                    format!("{}/{}", edge.producer, edge.output),
                    "no such output port",
                ));
            }
            let consumer = network
                .template(&edge.consumer)
                .ok_or_else(|| CompilerError::unresolved(&edge.consumer, "consumer not compiled"))?;
            if consumer.input(&edge.input).is_none() {
                return Err(CompilerError::unresolved(
                    format!("{}/{}", edge.consumer, edge.input),
                    "no such input port",
                ));
            }
        }
        Ok(())
    }
}

/// Every cycle of the wiring graph passes through a lagged actor
pub struct LagCyclePass;

impl Pass for LagCyclePass {
    fn name(&self) -> &'static str {
        "lag-cycle"
    }

    fn run(&self, network: &CompiledNetwork) -> Result<()> {
        let names: Vec<String> = network.templates().map(|t| t.name().to_string()).collect();
        let lagged: Vec<bool> = network.templates().map(|t| t.is_lagged()).collect();
        let index: BTreeMap<&str, usize> = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.as_str(), i))
            .collect();

        let mut pairs = Vec::with_capacity(network.edges().len());
        for edge in network.edges() {
            if let (Some(&p), Some(&c)) = (
                index.get(edge.producer.as_str()),
                index.get(edge.consumer.as_str()),
            ) {
                pairs.push((p, c));
            }
        }

        let schedule = Schedule::build(&names, &lagged, &pairs)
            .map_err(|e| CompilerError::CyclicWiring { actors: e.involved })?;
        log::debug!(
            "Schedule verified: {} levels, {} lagged",
            schedule.levels().len(),
            schedule.lagged().len()
        );
        Ok(())
    }
}
