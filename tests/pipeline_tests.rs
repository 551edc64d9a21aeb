// Host-side tests for pass graph validation, ordering and the frame ledger.

#![allow(dead_code)]
mod constants {
    include!("../src/core/constants.rs");
}
mod passes {
    include!("../src/core/passes.rs");
}

use passes::*;
use passes::PassId::*;

fn run(graph: &PassGraph, ledger: &mut FrameLedger) -> Result<Vec<PassId>, PipelineError> {
    let mut seen = Vec::new();
    graph.execute_frame(ledger, |pass| -> Result<(), PipelineError> {
        seen.push(pass.id);
        Ok(())
    })?;
    Ok(seen)
}

#[test]
fn standard_chain_runs_in_declared_order() {
    let graph = PassGraph::standard().expect("valid chain");
    assert_eq!(
        graph.ids(),
        vec![DepthPrepass, AuxScene, SceneColor, Displacement, DepthBlur, Chromatic, Bloom, Gamma]
    );
    assert_eq!(graph.order().last().map(|d| d.output), Some(PassOutput::Screen));
    assert!(graph
        .descriptor(DepthBlur)
        .is_some_and(|d| d.inputs.as_slice() == [Displacement, DepthPrepass]));
}

#[test]
fn passes_are_ordered_after_their_inputs() {
    let graph = PassGraph::new(vec![
        PassDescriptor::screen(Gamma, &[Bloom]),
        PassDescriptor::target(Bloom, &[SceneColor]),
        PassDescriptor::target(SceneColor, &[]),
    ])
    .expect("valid chain");
    assert_eq!(graph.ids(), vec![SceneColor, Bloom, Gamma]);
}

#[test]
fn rejects_malformed_chains() {
    let cases: Vec<(Vec<PassDescriptor>, PipelineError)> = vec![
        (
            vec![
                PassDescriptor::target(SceneColor, &[]),
                PassDescriptor::target(SceneColor, &[]),
                PassDescriptor::screen(Gamma, &[SceneColor]),
            ],
            PipelineError::DuplicatePass(SceneColor),
        ),
        (
            vec![PassDescriptor::screen(Gamma, &[Bloom])],
            PipelineError::UnknownInput {
                pass: Gamma,
                input: Bloom,
            },
        ),
        (
            vec![
                PassDescriptor::screen(Gamma, &[]),
                PassDescriptor::target(Bloom, &[Gamma]),
            ],
            PipelineError::ReadsScreen {
                pass: Bloom,
                input: Gamma,
            },
        ),
        (
            vec![PassDescriptor::target(SceneColor, &[])],
            PipelineError::NoScreenOutput,
        ),
        (
            vec![
                PassDescriptor::target(SceneColor, &[]),
                PassDescriptor::screen(Bloom, &[SceneColor]),
                PassDescriptor::screen(Gamma, &[SceneColor]),
            ],
            PipelineError::MultipleScreenOutputs,
        ),
        (
            vec![
                PassDescriptor::target(Bloom, &[Chromatic]),
                PassDescriptor::target(Chromatic, &[Bloom]),
                PassDescriptor::screen(Gamma, &[Bloom]),
            ],
            PipelineError::Cycle(vec![Bloom, Chromatic, Gamma]),
        ),
        (
            vec![
                PassDescriptor::screen(Gamma, &[]),
                PassDescriptor::target(SceneColor, &[]),
            ],
            PipelineError::ScreenNotLast(Gamma),
        ),
    ];
    for (descriptors, expected) in cases {
        assert_eq!(PassGraph::new(descriptors).err(), Some(expected));
    }
}

#[test]
fn every_input_is_written_earlier_in_the_same_frame() {
    let graph = PassGraph::standard().expect("valid chain");
    let mut ledger = FrameLedger::new();
    for frame in 1..=3 {
        let seen = run(&graph, &mut ledger).expect("frame runs");
        assert_eq!(seen, graph.ids());
        assert_eq!(ledger.frame(), frame);
        assert!(PassId::ALL.iter().all(|id| ledger.written_this_frame(*id)));
    }
}

#[test]
fn depth_from_previous_frame_is_stale() {
    let graph = PassGraph::standard().expect("valid chain");
    let mut ledger = FrameLedger::new();
    run(&graph, &mut ledger).expect("frame runs");

    ledger.begin_frame();
    for id in [AuxScene, SceneColor, Displacement] {
        ledger.record(id);
    }
    let blur = graph.descriptor(DepthBlur).expect("depth blur declared");
    assert_eq!(
        ledger.check_inputs(blur),
        Err(PipelineError::StaleInput {
            pass: DepthBlur,
            input: DepthPrepass,
        })
    );
    ledger.record(DepthPrepass);
    assert_eq!(ledger.check_inputs(blur), Ok(()));
}

#[test]
fn encode_failure_stops_the_frame() {
    let graph = PassGraph::standard().expect("valid chain");
    let mut ledger = FrameLedger::new();
    let result = graph.execute_frame(&mut ledger, |pass| {
        if pass.id == Chromatic {
            Err(PipelineError::UnknownParameter {
                pass: Chromatic,
                name: "boom".into(),
            })
        } else {
            Ok(())
        }
    });
    assert!(result.is_err());
    assert!(ledger.written_this_frame(DepthBlur));
    assert!(!ledger.written_this_frame(Chromatic));
    assert!(!ledger.written_this_frame(Gamma));
}

#[test]
fn resize_updates_every_target_and_resolution() {
    let mut graph = PassGraph::standard().expect("valid chain");
    graph.resize(1280, 720);
    assert_eq!(graph.resolution(), [1280.0, 720.0]);
    let targets: Vec<_> = graph.targets().collect();
    assert_eq!(targets.len(), graph.len() - 1);
    assert!(targets.iter().all(|(_, size)| *size == (1280, 720)));
    assert_eq!(graph.target_size(Gamma), None);

    graph.resize(0, 0);
    assert_eq!(graph.size(), (1, 1));
    assert!(graph.targets().all(|(_, size)| size == (1, 1)));
}

#[test]
fn pass_names_round_trip() {
    for id in PassId::ALL {
        assert_eq!(PassId::from_name(id.name()), Some(id));
    }
    assert_eq!(PassId::from_name("vignette"), None);
}

#[test]
fn post_params_are_set_by_pass_and_name() {
    let mut params = PostParams::default();
    params.set(Bloom, "strength", 1.7).expect("known parameter");
    assert_eq!(params.get(Bloom, "strength"), Ok(1.7));
    assert_eq!(params.bloom_strength, 1.7);

    params.set(DepthBlur, "directions", 5.6).expect("known parameter");
    assert_eq!(params.blur_directions, 6.0);
    params.set(DepthBlur, "quality", 0.0).expect("known parameter");
    assert_eq!(params.blur_quality, 1.0);
}

#[test]
fn post_params_reject_bad_values_and_names() {
    let mut params = PostParams::default();
    let before = params.clone();
    assert!(matches!(
        params.set(Chromatic, "radius", 1.0),
        Err(PipelineError::UnknownParameter { .. })
    ));
    assert!(matches!(
        params.set(Bloom, "strength", -0.1),
        Err(PipelineError::InvalidValue { .. })
    ));
    assert!(matches!(
        params.set(Bloom, "strength", f32::NAN),
        Err(PipelineError::InvalidValue { .. })
    ));
    assert!(matches!(
        params.set(Gamma, "gamma", 0.0),
        Err(PipelineError::InvalidValue { .. })
    ));
    assert_eq!(params, before);
}
