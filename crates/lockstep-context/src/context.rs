//! Rebuild and lifecycle management for a compiled host model

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::path::Path;

use lockstep_compiler::compile_model;
use lockstep_model::{Model, Topology, Value};
use lockstep_runtime::{ActorInstance, LockstepRuntime, RunReport, RunState};

use crate::{
    config::ContextConfig,
    error::{ContextError, Result},
};

/// Where a context is in its life
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// No actor set compiled yet
    NotBuilt,
    /// Compiled and idle
    Built,
    /// Started, ticks may execute
    Running,
    /// Started, between runs
    Paused,
    /// Terminated until the next rebuild
    Stopped,
}

impl Display for LifecycleState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NotBuilt => "not built",
            Self::Built => "built",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// Owns a host model and the actor runtime compiled from it.
///
/// The runtime is replaced only by a rebuild that fully succeeds, so a
/// failed rebuild leaves the previous actors in place and usable.
#[derive(Debug)]
pub struct LockstepContext {
    model: Model,
    config: ContextConfig,
    lag: BTreeMap<String, bool>,
    runtime: Option<LockstepRuntime>,
}

impl LockstepContext {
    /// Create an empty, unbuilt context
    pub fn new(name: impl Into<String>, config: ContextConfig) -> Self {
        Self {
            model: Model::new(name),
            config,
            lag: BTreeMap::new(),
            runtime: None,
        }
    }

    /// Create a context, populate its model in `setup` and rebuild when
    /// `auto_rebuild` is on
    pub fn build<F>(name: impl Into<String>, config: ContextConfig, setup: F) -> Result<Self>
    where
        F: FnOnce(&mut Model) -> lockstep_model::Result<()>,
    {
        let mut ctx = Self::new(name, config);
        setup(&mut ctx.model)?;
        if ctx.config.auto_rebuild {
            ctx.rebuild()?;
        }
        Ok(ctx)
    }

    /// Current lifecycle state
    pub fn state(&self) -> LifecycleState {
        match &self.runtime {
            None => LifecycleState::NotBuilt,
            Some(rt) => match rt.state() {
                RunState::Idle => LifecycleState::Built,
                RunState::Running => LifecycleState::Running,
                RunState::Paused => LifecycleState::Paused,
                RunState::Stopped => LifecycleState::Stopped,
            },
        }
    }

    /// Host model
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Context configuration
    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Current runtime, if built
    pub fn runtime(&self) -> Option<&LockstepRuntime> {
        self.runtime.as_ref()
    }

    /// Ticks executed by the current runtime
    pub fn tick(&self) -> u64 {
        self.runtime.as_ref().map_or(0, |rt| rt.tick())
    }

    /// Edit the host model, then rebuild when `auto_rebuild` is on.
    ///
    /// The edit runs on a copy of the model; if it fails part way the model
    /// is left as it was and no rebuild happens.
    pub fn update<F, R>(&mut self, edit: F) -> Result<R>
    where
        F: FnOnce(&mut Model) -> lockstep_model::Result<R>,
    {
        self.guard("update", &[
            LifecycleState::NotBuilt,
            LifecycleState::Built,
            LifecycleState::Paused,
            LifecycleState::Stopped,
        ])?;
        let mut model = self.model.clone();
        let out = edit(&mut model)?;
        self.model = model;
        if self.config.auto_rebuild {
            self.rebuild()?;
        }
        Ok(out)
    }

    /// Read the host model without triggering a rebuild
    pub fn inspect<F, R>(&self, view: F) -> R
    where
        F: FnOnce(&Model) -> R,
    {
        view(&self.model)
    }

    /// Recompile every component, rewire and swap in the new runtime
    pub fn rebuild(&mut self) -> Result<()> {
        self.guard("rebuild", &[
            LifecycleState::NotBuilt,
            LifecycleState::Built,
            LifecycleState::Paused,
            LifecycleState::Stopped,
        ])?;

        let runtime = self.compile(&self.model, &self.lag)?;
        self.runtime = Some(runtime);
        Ok(())
    }

    fn compile(&self, model: &Model, lag: &BTreeMap<String, bool>) -> Result<LockstepRuntime> {
        let default_lag = self.config.default_lag;
        let network = compile_model(model, |name| {
            lag.get(name).copied().unwrap_or(default_lag)
        })?;
        let runtime = network.into_runtime(self.config.runtime.clone())?;

        log::info!(
            "Rebuilt '{}': {} actors, {} edges",
            model.name(),
            runtime.actor_count(),
            runtime.edges().len()
        );
        Ok(runtime)
    }

    /// Set a component's lag flag; applies at the next rebuild
    pub fn set_lag(&mut self, name: &str, lag: bool) {
        if self.model.component(name).is_none() {
            log::warn!("Setting lag on unknown component '{}'", name);
        }
        self.lag.insert(name.to_string(), lag);
    }

    /// Lag flag that the next rebuild will use for `name`
    pub fn is_lagging(&self, name: &str) -> bool {
        self.lag.get(name).copied().unwrap_or(self.config.default_lag)
    }

    /// Actor compiled from component `name`
    pub fn get_actor(&self, name: &str) -> Option<&ActorInstance> {
        let found = self.runtime.as_ref().and_then(|rt| rt.actor(name));
        if found.is_none() {
            log::warn!("No actor named '{}'", name);
        }
        found
    }

    /// Actors for `names`, skipping the missing ones
    pub fn get_actors(&self, names: &[&str]) -> Vec<&ActorInstance> {
        names.iter().filter_map(|name| self.get_actor(name)).collect()
    }

    /// Copy actor state back into the host model's compartments.
    ///
    /// Parameters and names that are not compartments are left alone.
    /// Returns the number of values written.
    pub fn sync_back(&mut self) -> Result<usize> {
        let runtime = match &self.runtime {
            Some(rt) => rt,
            None => return Err(self.lifecycle_error("sync back")),
        };

        let mut written = 0;
        for actor in runtime.actors() {
            let component = self.model.component_mut(actor.name())?;
            for (name, value) in actor.states() {
                if component.is_compartment(name) {
                    component.set_compartment(name, value.clone())?;
                    written += 1;
                }
            }
        }
        log::debug!("Synced {} values back to '{}'", written, self.model.name());
        Ok(written)
    }

    /// Open the run lifecycle
    pub fn start(&mut self) -> Result<()> {
        self.guard("start", &[LifecycleState::Built])?;
        self.runtime_mut("start")?.start()?;
        Ok(())
    }

    /// Execute `ticks` ticks, starting first if only built, then pause
    pub fn run(&mut self, ticks: u64) -> Result<RunReport> {
        self.guard("run", &[
            LifecycleState::Built,
            LifecycleState::Running,
            LifecycleState::Paused,
        ])?;
        Ok(self.runtime_mut("run")?.run(ticks)?)
    }

    /// Pause a started context
    pub fn pause(&mut self) -> Result<()> {
        self.guard("pause", &[LifecycleState::Running, LifecycleState::Paused])?;
        self.runtime_mut("pause")?.pause()?;
        Ok(())
    }

    /// Terminate; actors are unusable until the next rebuild
    pub fn stop(&mut self) -> Result<()> {
        self.runtime_mut("stop")?.stop();
        Ok(())
    }

    /// Hold `actor`'s state variable `slot` at `value` on every tick
    pub fn clamp(&mut self, actor: &str, slot: &str, value: Value) -> Result<()> {
        self.guard("clamp", &[
            LifecycleState::Built,
            LifecycleState::Running,
            LifecycleState::Paused,
        ])?;
        self.runtime_mut("clamp")?.clamp(actor, slot, value)?;
        Ok(())
    }

    /// Release every clamp
    pub fn clear_clamps(&mut self) {
        if let Some(rt) = self.runtime.as_mut() {
            rt.clear_clamps();
        }
    }

    /// Install `clamps` as `(actor, slot, value)` triples, then run `ticks`
    /// ticks. An invalid triple installs none of them.
    pub fn run_with_input(&mut self, clamps: &[(&str, &str, Value)], ticks: u64) -> Result<RunReport> {
        self.guard("clamp", &[
            LifecycleState::Built,
            LifecycleState::Running,
            LifecycleState::Paused,
        ])?;
        self.runtime_mut("clamp")?.clamp_all(clamps)?;
        self.run(ticks)
    }

    /// Reset every actor with a reset function; returns how many ran
    pub fn reset(&mut self) -> Result<usize> {
        Ok(self.runtime_mut("reset")?.reset_all()?)
    }

    /// Reset one actor; `false` when it has no reset function
    pub fn reset_actor(&mut self, name: &str) -> Result<bool> {
        Ok(self.runtime_mut("reset")?.reset_actor(name)?)
    }

    /// Sync state back, then write the model and lag flags as a JSON topology
    pub fn save(&mut self, path: &Path) -> Result<()> {
        if self.runtime.is_some() {
            self.sync_back()?;
        }
        Topology::capture(&self.model, |name| self.is_lagging(name)).save(path)?;
        log::info!("Saved '{}' to {}", self.model.name(), path.display());
        Ok(())
    }

    /// Restore values and lag flags from a topology file, then rebuild.
    ///
    /// Values and flags are applied to copies and kept only once the rebuild
    /// succeeds; a file that does not match or no longer wires changes nothing.
    pub fn load(&mut self, path: &Path) -> Result<()> {
        self.guard("load", &[
            LifecycleState::NotBuilt,
            LifecycleState::Built,
            LifecycleState::Paused,
            LifecycleState::Stopped,
        ])?;

        let topology = Topology::load(path)?;
        let mut model = self.model.clone();
        topology.apply(&mut model)?;

        let mut lag = self.lag.clone();
        lag.extend(topology.lag_table());
        let runtime = self.compile(&model, &lag)?;

        self.model = model;
        self.lag = lag;
        self.runtime = Some(runtime);
        log::info!("Loaded '{}' from {}", topology.name, path.display());
        Ok(())
    }

    fn runtime_mut(&mut self, action: &str) -> Result<&mut LockstepRuntime> {
        match self.runtime.as_mut() {
            Some(rt) => Ok(rt),
            None => {
                log::warn!("Cannot {} while {}", action, LifecycleState::NotBuilt);
                Err(ContextError::invalid_lifecycle(action, LifecycleState::NotBuilt))
            }
        }
    }

    fn guard(&self, action: &str, allowed: &[LifecycleState]) -> Result<()> {
        if allowed.contains(&self.state()) {
            Ok(())
        } else {
            Err(self.lifecycle_error(action))
        }
    }

    fn lifecycle_error(&self, action: &str) -> ContextError {
        let state = self.state();
        log::warn!("Cannot {} while {}", action, state);
        ContextError::invalid_lifecycle(action, state)
    }
}
