//! Lockstep execution of a wired actor network

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::time::{Duration, Instant};

use lockstep_model::Value;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::{
    actor::ActorInstance, config::RuntimeConfig, error::*, network::WiringEdge,
    schedule::Schedule,
};

/// Lifecycle of one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Built, never started
    Idle,
    /// Started and accepting ticks
    Running,
    /// Between `run` calls
    Paused,
    /// Terminal; the actor set cannot tick again
    Stopped,
}

impl Display for RunState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RunState::Idle => write!(f, "idle"),
            RunState::Running => write!(f, "running"),
            RunState::Paused => write!(f, "paused"),
            RunState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Outcome of one `run` call
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Ticks executed by this call
    pub ticks_executed: u64,
    /// Total ticks since the run started
    pub total_ticks: u64,
    /// Wall-clock time of this call
    pub elapsed: Duration,
}

/// A wired set of actor instances executed tick by tick
#[derive(Debug)]
pub struct LockstepRuntime {
    actors: Vec<ActorInstance>,
    index: BTreeMap<String, usize>,
    schedule: Schedule,
    edges: Vec<WiringEdge>,
    config: RuntimeConfig,
    state: RunState,
    tick: u64,
}

impl LockstepRuntime {
    pub(crate) fn new(
        actors: Vec<ActorInstance>,
        index: BTreeMap<String, usize>,
        schedule: Schedule,
        edges: Vec<WiringEdge>,
        config: RuntimeConfig,
    ) -> Self {
        Self {
            actors,
            index,
            schedule,
            edges,
            config,
            state: RunState::Idle,
            tick: 0,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Ticks executed since start
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Tick schedule
    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Wiring edges the network was built from
    pub fn edges(&self) -> &[WiringEdge] {
        &self.edges
    }

    /// Runtime configuration
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Number of actors
    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    /// Actor by name
    pub fn actor(&self, name: &str) -> Option<&ActorInstance> {
        self.index.get(name).map(|&i| &self.actors[i])
    }

    /// Actor by name, for mutation
    pub fn actor_mut(&mut self, name: &str) -> Result<&mut ActorInstance> {
        let i = self.index_of(name)?;
        Ok(&mut self.actors[i])
    }

    fn index_of(&self, name: &str) -> Result<usize> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| RuntimeError::ActorNotFound { name: name.to_string() })
    }

    /// All actors in build order
    pub fn actors(&self) -> impl Iterator<Item = &ActorInstance> {
        self.actors.iter()
    }

    /// Open the run lifecycle
    pub fn start(&mut self) -> Result<()> {
        if self.state != RunState::Idle {
            return Err(RuntimeError::invalid_lifecycle("start", self.state));
        }
        self.state = RunState::Running;
        log::info!("Runtime started with {} actors", self.actors.len());
        Ok(())
    }

    /// Pause a started runtime
    pub fn pause(&mut self) -> Result<()> {
        match self.state {
            RunState::Running => {
                self.state = RunState::Paused;
                Ok(())
            }
            RunState::Paused => Ok(()),
            state => Err(RuntimeError::invalid_lifecycle("pause", state)),
        }
    }

    /// Terminate the run lifecycle
    pub fn stop(&mut self) {
        if self.state != RunState::Stopped {
            log::info!("Runtime stopped after {} ticks", self.tick);
        }
        self.state = RunState::Stopped;
    }

    /// Execute `ticks` ticks, then pause.
    ///
    /// Starts the runtime if it was idle. A failing tick leaves channels in
    /// an unknown state, so the runtime is stopped before the error returns.
    pub fn run(&mut self, ticks: u64) -> Result<RunReport> {
        match self.state {
            RunState::Idle => self.start()?,
            RunState::Paused => self.state = RunState::Running,
            RunState::Running => {}
            RunState::Stopped => return Err(RuntimeError::invalid_lifecycle("run", self.state)),
        }

        log::info!("Running {} ticks from tick {}", ticks, self.tick);
        let started = Instant::now();

        for _ in 0..ticks {
            if let Err(e) = self.step() {
                log::error!("Tick {} failed: {}", self.tick, e);
                self.stop();
                return Err(e);
            }
            self.tick += 1;

            if self.config.progress_interval > 0 && self.tick % self.config.progress_interval == 0 {
                log::debug!("Tick {} complete", self.tick);
            }
        }
        self.state = RunState::Paused;

        Ok(RunReport {
            ticks_executed: ticks,
            total_ticks: self.tick,
            elapsed: started.elapsed(),
        })
    }

    fn step(&mut self) -> Result<()> {
        let timeout = self.config.receive_timeout();
        let tick = self.tick;

        for &i in self.schedule.lagged() {
            self.actors[i].emit_lagged(timeout)?;
        }
        for (level, members) in self.schedule.levels().iter().enumerate() {
            advance_level(&mut self.actors, &self.schedule, level, members, timeout, tick)?;
        }
        Ok(())
    }

    /// Hold an actor's state variable at `value` on every tick
    pub fn clamp(&mut self, actor: &str, slot: &str, value: Value) -> Result<()> {
        self.ensure_usable("clamp")?;
        self.actor_mut(actor)?.clamp(slot, value)
    }

    /// Install several `(actor, slot, value)` clamps. Every triple is checked
    /// first; if any is invalid no clamp is installed.
    pub fn clamp_all(&mut self, clamps: &[(&str, &str, Value)]) -> Result<()> {
        self.ensure_usable("clamp")?;
        let mut prepared = Vec::with_capacity(clamps.len());
        for (actor, slot, value) in clamps {
            let i = self.index_of(actor)?;
            let v = self.actors[i].prepare_clamp(slot, value.clone())?;
            prepared.push((i, *slot, v));
        }
        for (i, slot, v) in prepared {
            self.actors[i].install_clamp(slot, v);
        }
        Ok(())
    }

    /// Release every clamp
    pub fn clear_clamps(&mut self) {
        for actor in &mut self.actors {
            actor.clear_clamps();
        }
    }

    /// Overwrite a state variable directly
    pub fn set_state(&mut self, actor: &str, slot: &str, value: Value) -> Result<()> {
        self.ensure_usable("set state")?;
        self.actor_mut(actor)?.set_state(slot, value)
    }

    /// Reset one actor; `false` when it has no reset function
    pub fn reset_actor(&mut self, name: &str) -> Result<bool> {
        self.ensure_usable("reset")?;
        self.actor_mut(name)?.reset()
    }

    /// Reset every actor that has a reset function; returns how many ran
    pub fn reset_all(&mut self) -> Result<usize> {
        self.ensure_usable("reset")?;
        let mut count = 0;
        for actor in &mut self.actors {
            if actor.reset()? {
                count += 1;
            }
        }
        Ok(count)
    }

    fn ensure_usable(&self, action: &str) -> Result<()> {
        if self.state == RunState::Stopped {
            return Err(RuntimeError::invalid_lifecycle(action, self.state));
        }
        Ok(())
    }
}

#[cfg(feature = "parallel")]
fn advance_level(
    actors: &mut [ActorInstance],
    schedule: &Schedule,
    level: usize,
    members: &[usize],
    timeout: Duration,
    tick: u64,
) -> Result<()> {
    if members.len() == 1 {
        return actors[members[0]].advance(timeout, tick);
    }
    actors
        .par_iter_mut()
        .enumerate()
        .filter(|(i, _)| schedule.level_of(*i) == Some(level))
        .try_for_each(|(_, actor)| actor.advance(timeout, tick))
}

#[cfg(not(feature = "parallel"))]
fn advance_level(
    actors: &mut [ActorInstance],
    _schedule: &Schedule,
    _level: usize,
    members: &[usize],
    timeout: Duration,
    tick: u64,
) -> Result<()> {
    for &i in members {
        actors[i].advance(timeout, tick)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::NetworkBuilder;
    use crate::template::ActorTemplate;
    use lockstep_model::{value, Bindings, PureFunction};

    fn counter(name: &str) -> ActorTemplate {
        let update = PureFunction::new("advance_state", |b: &Bindings<'_>| {
            Ok(vec![value::scalar(b.scalar("n")? + 1.0)])
        })
        .with_compartments(&["n"])
        .with_outputs(&["n"]);
        let mut t = ActorTemplate::new(name, update, false);
        t.add_state("n", value::scalar(0.0));
        t.add_output("n").unwrap();
        t
    }

    fn runtime() -> LockstepRuntime {
        NetworkBuilder::new().add_actor(counter("c")).build().unwrap()
    }

    #[test]
    fn test_lifecycle_transitions() {
        let mut rt = runtime();
        assert_eq!(rt.state(), RunState::Idle);
        assert!(rt.pause().is_err());

        rt.start().unwrap();
        assert!(matches!(rt.start(), Err(RuntimeError::InvalidLifecycle { .. })));

        rt.run(3).unwrap();
        assert_eq!(rt.state(), RunState::Paused);
        assert_eq!(rt.tick(), 3);

        rt.run(2).unwrap();
        assert_eq!(rt.tick(), 5);

        rt.stop();
        assert_eq!(rt.state(), RunState::Stopped);
        assert!(rt.run(1).is_err());
        assert!(rt.start().is_err());
        assert!(rt.reset_all().is_err());
    }

    #[test]
    fn test_run_from_idle_starts() {
        let mut rt = runtime();
        let report = rt.run(4).unwrap();
        assert_eq!(report.ticks_executed, 4);
        assert_eq!(value::first(rt.actor("c").unwrap().state("n").unwrap()), 4.0);
    }

    #[test]
    fn test_clamp_all_is_all_or_nothing() {
        let mut rt = runtime();
        let err = rt
            .clamp_all(&[("c", "n", value::scalar(5.0)), ("ghost", "n", value::scalar(1.0))])
            .unwrap_err();
        assert!(matches!(err, RuntimeError::ActorNotFound { .. }));
        assert!(rt.actor("c").unwrap().clamps().is_empty());

        assert!(rt
            .clamp_all(&[("c", "n", value::scalar(5.0)), ("c", "n", value::zeros(&[2]))])
            .is_err());
        assert!(rt.actor("c").unwrap().clamps().is_empty());

        rt.clamp_all(&[("c", "n", value::scalar(5.0))]).unwrap();
        rt.run(2).unwrap();
        assert_eq!(value::first(rt.actor("c").unwrap().state("n").unwrap()), 6.0);
    }
}
