//! Context behaviour end to end: rebuilds, lifecycle guards, clamps, reset.

use lockstep_context::{
    value, Bindings, Component, ContextConfig, ContextError, LifecycleState, LockstepContext,
    PureFunction,
};
use lockstep_context::CompilerError;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// `v' = v * k`, emitting `v`
fn scaler(name: &str, v: f64, k: f64) -> Component {
    let update = PureFunction::new("advance_state", |b: &Bindings<'_>| {
        Ok(vec![b.get("v")? * b.scalar("k")?])
    })
    .with_parameters(&["k"])
    .with_compartments(&["v"])
    .with_outputs(&["v"]);
    Component::new(name)
        .with_parameter("k", value::scalar(k))
        .with_compartment("v", value::scalar(v))
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

/// `v' = v + 1`, `z' = z + 1`; reset only touches `z`
fn twin_counter(name: &str) -> Component {
    let update = PureFunction::new("advance_state", |b: &Bindings<'_>| {
        Ok(vec![b.get("v")? + 1.0, b.get("z")? + 1.0])
    })
    .with_compartments(&["v", "z"])
    .with_outputs(&["v", "z"]);
    let reset = PureFunction::new("reset", |_b: &Bindings<'_>| Ok(vec![value::scalar(0.0)]))
        .with_outputs(&["z"]);
    Component::new(name)
        .with_compartment("v", value::scalar(0.0))
        .with_compartment("z", value::scalar(0.0))
        .with_function(update)
        .with_function(reset)
}

fn state_of(ctx: &LockstepContext, actor: &str, slot: &str) -> f64 {
    value::first(ctx.get_actor(actor).unwrap().state(slot).unwrap())
}

#[test]
fn sync_back_then_rebuild_preserves_state() {
    init();
    let mut ctx =
        LockstepContext::build("solo", ContextConfig::default(), |m| m.add(scaler("z", 2.0, 0.5)))
            .unwrap();

    ctx.run(1).unwrap();
    assert_eq!(state_of(&ctx, "z", "v"), 1.0);
    assert_eq!(value::first(ctx.get_actor("z").unwrap().last_emitted("v").unwrap()), 1.0);

    assert_eq!(ctx.sync_back().unwrap(), 1);
    assert_eq!(value::first(ctx.model().compartment("z/v").unwrap()), 1.0);
    // parameters never flow back
    assert_eq!(value::first(ctx.model().component("z").unwrap().parameter("k").unwrap()), 0.5);

    ctx.rebuild().unwrap();
    assert_eq!(ctx.state(), LifecycleState::Built);
    assert_eq!(state_of(&ctx, "z", "v"), 1.0);
}

#[test]
fn rebuild_without_sync_back_starts_from_host_values() {
    let mut ctx =
        LockstepContext::build("solo", ContextConfig::default(), |m| m.add(scaler("z", 2.0, 0.5)))
            .unwrap();
    ctx.run(3).unwrap();
    ctx.rebuild().unwrap();
    assert_eq!(state_of(&ctx, "z", "v"), 2.0);
}

#[test]
fn failed_rebuild_keeps_previous_runtime() {
    init();
    let mut ctx = LockstepContext::build("loop", ContextConfig::default(), |m| {
        m.add(relay("a"))?;
        m.add(relay("b"))
    })
    .unwrap();
    ctx.run(1).unwrap();

    let err = ctx
        .update(|m| {
            m.connect("a/inputs", &["b/outputs"])?;
            m.connect("b/inputs", &["a/outputs"])
        })
        .unwrap_err();
    match err {
        ContextError::Compiler(CompilerError::CyclicWiring { actors }) => {
            assert_eq!(actors, vec!["a".to_string(), "b".to_string()]);
        }
        other => panic!("expected cyclic wiring, got {}", other),
    }

    // old network: no edges, still paused and runnable
    assert_eq!(ctx.state(), LifecycleState::Paused);
    assert!(ctx.runtime().unwrap().edges().is_empty());
    ctx.run(1).unwrap();
    assert_eq!(ctx.tick(), 2);

    ctx.set_lag("b", true);
    ctx.rebuild().unwrap();
    assert_eq!(ctx.runtime().unwrap().edges().len(), 2);
    ctx.run_with_input(&[("a", "inputs", value::scalar(3.0))], 2).unwrap();
    assert_eq!(state_of(&ctx, "a", "outputs"), 3.0);
    assert_eq!(state_of(&ctx, "b", "outputs"), 3.0);
}

#[test]
fn lifecycle_transitions() {
    init();
    let mut ctx =
        LockstepContext::build("solo", ContextConfig::default(), |m| m.add(scaler("z", 2.0, 0.5)))
            .unwrap();

    ctx.start().unwrap();
    assert_eq!(ctx.state(), LifecycleState::Running);
    assert!(matches!(ctx.start(), Err(ContextError::InvalidLifecycle { .. })));
    assert!(matches!(ctx.rebuild(), Err(ContextError::InvalidLifecycle { .. })));
    assert!(matches!(
        ctx.update(|m| m.add(scaler("y", 1.0, 1.0))),
        Err(ContextError::InvalidLifecycle { .. })
    ));
    assert!(ctx.model().component("y").is_none());

    ctx.pause().unwrap();
    assert_eq!(ctx.state(), LifecycleState::Paused);
    ctx.run(2).unwrap();
    assert_eq!(ctx.state(), LifecycleState::Paused);
    assert_eq!(ctx.tick(), 2);

    ctx.stop().unwrap();
    assert_eq!(ctx.state(), LifecycleState::Stopped);
    assert!(matches!(ctx.run(1), Err(ContextError::InvalidLifecycle { .. })));
    assert!(matches!(
        ctx.clamp("z", "v", value::scalar(1.0)),
        Err(ContextError::InvalidLifecycle { .. })
    ));
    assert!(ctx.reset().is_err());

    ctx.rebuild().unwrap();
    assert_eq!(ctx.state(), LifecycleState::Built);
    assert_eq!(ctx.tick(), 0);
}

#[test]
fn clamps_hold_until_cleared() {
    let mut ctx = LockstepContext::build("clamped", ContextConfig::default(), |m| {
        m.add(twin_counter("c"))
    })
    .unwrap();

    ctx.run_with_input(&[("c", "v", value::scalar(10.0))], 3).unwrap();
    assert_eq!(state_of(&ctx, "c", "v"), 11.0);
    assert_eq!(state_of(&ctx, "c", "z"), 3.0);

    ctx.clear_clamps();
    ctx.run(1).unwrap();
    assert_eq!(state_of(&ctx, "c", "v"), 12.0);

    assert!(ctx.clamp("c", "missing", value::scalar(0.0)).is_err());
    assert!(ctx.clamp("ghost", "v", value::scalar(0.0)).is_err());
}

#[test]
fn reset_only_touches_declared_outputs() {
    let mut ctx = LockstepContext::build("reset", ContextConfig::default(), |m| {
        m.add(twin_counter("c"))?;
        m.add(scaler("s", 2.0, 1.0))
    })
    .unwrap();
    ctx.run(2).unwrap();

    assert!(ctx.reset_actor("c").unwrap());
    assert_eq!(state_of(&ctx, "c", "v"), 2.0);
    assert_eq!(state_of(&ctx, "c", "z"), 0.0);

    assert!(!ctx.reset_actor("s").unwrap());
    assert_eq!(ctx.reset().unwrap(), 1);
    assert_eq!(ctx.tick(), 2);
}

#[test]
fn bad_input_triple_installs_no_clamps() {
    let mut ctx = LockstepContext::build("chain", ContextConfig::default(), |m| {
        m.add(relay("a"))?;
        m.add(relay("b"))?;
        m.connect("b/inputs", &["a/outputs"])
    })
    .unwrap();

    let err = ctx
        .run_with_input(
            &[("a", "inputs", value::scalar(5.0)), ("ghost", "inputs", value::scalar(1.0))],
            1,
        )
        .unwrap_err();
    assert!(matches!(err, ContextError::Runtime(_)));
    assert!(ctx.get_actor("a").unwrap().clamps().is_empty());
    assert_eq!(ctx.tick(), 0);

    ctx.run(1).unwrap();
    assert_eq!(state_of(&ctx, "b", "outputs"), 0.0);
}

#[test]
fn failed_update_leaves_model_and_runtime_in_step() {
    let mut ctx = LockstepContext::build("chain", ContextConfig::default(), |m| m.add(relay("a")))
        .unwrap();
    ctx.run(1).unwrap();

    let err = ctx
        .update(|m| {
            m.add(relay("c"))?;
            m.connect("c/nope", &["a/outputs"])
        })
        .unwrap_err();
    assert!(matches!(err, ContextError::Model(_)));

    assert!(ctx.model().component("c").is_none());
    assert!(ctx.get_actor("c").is_none());
    assert_eq!(ctx.state(), LifecycleState::Paused);
    assert_eq!(ctx.tick(), 1);
}
