//! Saving a context to a topology file and loading it into a fresh one.

use lockstep_context::{
    value, Bindings, CompilerError, Component, ContextConfig, ContextError, LifecycleState,
    LockstepContext, PureFunction, Topology, ValueRecord,
};

/// `n' = n + step`, emitting `n`
fn counter(name: &str) -> Component {
    let update = PureFunction::new("advance_state", |b: &Bindings<'_>| {
        Ok(vec![b.get("n")? + b.scalar("step")?])
    })
    .with_parameters(&["step"])
    .with_compartments(&["n"])
    .with_outputs(&["n"]);
    Component::new(name)
        .with_parameter("step", value::scalar(1.0))
        .with_compartment("n", value::scalar(0.0))
        .with_function(update)
}

/// `outputs' = inputs`
fn relay(name: &str) -> Component {
    let update = PureFunction::new("advance_state", |b: &Bindings<'_>| {
        Ok(vec![b.get("inputs")?.clone()])
    })
    .with_compartments(&["inputs"])
    .with_outputs(&["outputs"]);
    Component::new(name)
        .with_compartment("inputs", value::scalar(0.0))
        .with_compartment("outputs", value::scalar(0.0))
        .with_function(update)
}

fn manual() -> ContextConfig {
    ContextConfig {
        auto_rebuild: false,
        ..Default::default()
    }
}

#[test]
fn save_and_load_restore_values_and_lag_flags() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("net.json");

    let mut ctx = LockstepContext::new("net", manual());
    ctx.update(|m| {
        m.add(counter("x"))?;
        m.add(counter("y"))
    })
    .unwrap();
    ctx.set_lag("x", true);
    ctx.rebuild().unwrap();
    ctx.run(3).unwrap();
    ctx.save(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("\"lagging\": true"));

    let mut fresh = LockstepContext::build("net", manual(), |m| {
        m.add(counter("x"))?;
        m.add(counter("y"))
    })
    .unwrap();
    assert_eq!(fresh.state(), LifecycleState::NotBuilt);

    fresh.load(&path).unwrap();
    assert_eq!(fresh.state(), LifecycleState::Built);
    assert!(fresh.is_lagging("x"));
    assert!(!fresh.is_lagging("y"));
    assert!(fresh.get_actor("x").unwrap().is_lagged());
    assert_eq!(value::first(fresh.model().compartment("x/n").unwrap()), 3.0);
    assert_eq!(value::first(fresh.get_actor("y").unwrap().state("n").unwrap()), 3.0);
}

#[test]
fn load_into_mismatched_model_changes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("net.json");

    let mut ctx =
        LockstepContext::build("net", ContextConfig::default(), |m| m.add(counter("x"))).unwrap();
    ctx.run(2).unwrap();
    ctx.save(&path).unwrap();

    let mut other =
        LockstepContext::build("other", ContextConfig::default(), |m| m.add(counter("q"))).unwrap();
    assert!(matches!(other.load(&path), Err(ContextError::Model(_))));
    assert_eq!(value::first(other.model().compartment("q/n").unwrap()), 0.0);
    assert!(!other.is_lagging("x"));
    assert_eq!(other.state(), LifecycleState::Built);
}

#[test]
fn load_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx =
        LockstepContext::build("net", ContextConfig::default(), |m| m.add(counter("x"))).unwrap();
    assert!(ctx.load(&dir.path().join("absent.json")).is_err());
    assert_eq!(ctx.state(), LifecycleState::Built);
}

#[test]
fn load_that_no_longer_wires_changes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chain.json");

    let mut ctx = LockstepContext::build("chain", ContextConfig::default(), |m| {
        m.add(relay("a"))?;
        m.add(relay("b"))?;
        m.connect("b/inputs", &["a/outputs"])
    })
    .unwrap();
    ctx.save(&path).unwrap();

    // widen a/outputs so it no longer fits b/inputs
    let mut topology = Topology::load(&path).unwrap();
    let a = topology.components.iter_mut().find(|c| c.name == "a").unwrap();
    a.lagging = true;
    a.compartments
        .insert("outputs".to_string(), Some(ValueRecord::from(&value::zeros(&[3]))));
    topology.save(&path).unwrap();

    let err = ctx.load(&path).unwrap_err();
    assert!(matches!(err, ContextError::Compiler(CompilerError::ShapeMismatch { .. })));

    assert_eq!(ctx.model().compartment("a/outputs").unwrap().shape(), &[1]);
    assert!(!ctx.is_lagging("a"));
    assert_eq!(ctx.state(), LifecycleState::Built);
    assert_eq!(ctx.get_actor("a").unwrap().state("outputs").unwrap().shape(), &[1]);
    ctx.run(1).unwrap();
}
