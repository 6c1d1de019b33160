//! Assembling templates and wiring edges into a runnable actor network

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use crate::{
    actor::ActorInstance,
    config::RuntimeConfig,
    error::*,
    port::edge_channel,
    runtime::LockstepRuntime,
    schedule::Schedule,
    template::ActorTemplate,
};

/// A binding from one output port to one input port
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct WiringEdge {
    /// Producing actor
    pub producer: String,
    /// Output port on the producer
    pub output: String,
    /// Consuming actor
    pub consumer: String,
    /// Input port on the consumer
    pub input: String,
}

impl WiringEdge {
    /// Create an edge `producer.output -> consumer.input`
    pub fn new(
        producer: impl Into<String>,
        output: impl Into<String>,
        consumer: impl Into<String>,
        input: impl Into<String>,
    ) -> Self {
        Self {
            producer: producer.into(),
            output: output.into(),
            consumer: consumer.into(),
            input: input.into(),
        }
    }
}

impl Display for WiringEdge {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{} -> {}.{}", self.producer, self.output, self.consumer, self.input)
    }
}

/// Builder for a [`LockstepRuntime`]
#[derive(Debug, Default)]
pub struct NetworkBuilder {
    templates: Vec<ActorTemplate>,
    edges: Vec<WiringEdge>,
    config: RuntimeConfig,
}

impl NetworkBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an actor template
    pub fn add_actor(mut self, template: ActorTemplate) -> Self {
        self.templates.push(template);
        self
    }

    /// Add a wiring edge
    pub fn add_edge(mut self, edge: WiringEdge) -> Self {
        self.edges.push(edge);
        self
    }

    /// Set runtime configuration
    pub fn with_config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Instantiate every template, open one channel per edge and order the tick
    pub fn build(self) -> Result<LockstepRuntime> {
        self.config.validate()?;

        let mut index: BTreeMap<String, usize> = BTreeMap::new();
        for (i, t) in self.templates.iter().enumerate() {
            if index.insert(t.name().to_string(), i).is_some() {
                return Err(RuntimeError::network_topology(format!(
                    "actor '{}' defined twice",
                    t.name()
                )));
            }
        }

        let mut pairs = Vec::with_capacity(self.edges.len());
        for edge in &self.edges {
            let producer = lookup(&index, &edge.producer)?;
            let consumer = lookup(&index, &edge.consumer)?;
            let out = self.templates[producer]
                .output(&edge.output)
                .ok_or_else(|| RuntimeError::unknown_port(&edge.producer, &edge.output, "output"))?;
            let inp = self.templates[consumer]
                .input(&edge.input)
                .ok_or_else(|| RuntimeError::unknown_port(&edge.consumer, &edge.input, "input"))?;
            let out_len: usize = out.shape.iter().product();
            let in_len: usize = inp.shape.iter().product();
            if out_len != in_len {
                return Err(RuntimeError::shape_mismatch(
                    &edge.consumer,
                    &edge.input,
                    &inp.shape,
                    &out.shape,
                ));
            }
            pairs.push((producer, consumer));
        }

        let names: Vec<String> = self.templates.iter().map(|t| t.name().to_string()).collect();
        let lagged: Vec<bool> = self.templates.iter().map(|t| t.is_lagged()).collect();
        let schedule = Schedule::build(&names, &lagged, &pairs)
            .map_err(|e| RuntimeError::network_topology(e.to_string()))?;

        let mut actors: Vec<ActorInstance> = self
            .templates
            .into_iter()
            .map(|t| ActorInstance::new(Arc::new(t)))
            .collect();

        for (edge, &(producer, consumer)) in self.edges.iter().zip(&pairs) {
            let (tx, rx) = edge_channel(self.config.channel_capacity);
            actors[producer].bind_output(&edge.output, tx)?;
            actors[consumer].bind_input(&edge.input, rx)?;
            log::debug!("Wired {}", edge);
        }

        log::info!(
            "Built actor network: {} actors, {} edges, {} levels, {} lagged",
            actors.len(),
            self.edges.len(),
            schedule.levels().len(),
            schedule.lagged().len()
        );

        Ok(LockstepRuntime::new(actors, index, schedule, self.edges, self.config))
    }
}

fn lookup(index: &BTreeMap<String, usize>, name: &str) -> Result<usize> {
    index
        .get(name)
        .copied()
        .ok_or_else(|| RuntimeError::ActorNotFound { name: name.to_string() })
}
