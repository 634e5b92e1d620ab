mod common;

use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::{ScriptedGenerator, WordCounter, config, init_tracing, record, wait_for};
use workbus::workers::generation::GenerationRequest;
use workbus::workers::token_count::TokenCountRequest;
use workbus::{
    Config, EventCode, Mediator, ModelConfig, Payload, QueueDiscipline, RuntimeError, Signal,
    WorkerState, WorkerSupervisor,
};

fn counter() -> Box<WordCounter> {
    Box::new(WordCounter {
        threads: Arc::new(Mutex::new(Vec::new())),
    })
}

#[test]
fn initialize_twice_constructs_and_registers_once() {
    init_tracing();
    let (generator, _journal, _stepper) = ScriptedGenerator::new();
    let sup = WorkerSupervisor::builder(config())
        .with_generation(generator)
        .with_token_count(counter())
        .build();
    assert!(sup.generation().is_none());

    sup.initialize().unwrap();
    let first = sup.generation().unwrap();
    sup.initialize().unwrap();
    let second = sup.generation().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert!(sup.is_initialized());

    let m = sup.mediator();
    for signal in [Signal::LoadRequested, Signal::Requested, Signal::UnloadRequested] {
        assert_eq!(m.handler_count(EventCode::Generation(signal)), 1);
        assert_eq!(m.handler_count(EventCode::TokenCount(signal)), 1);
    }
    assert_eq!(m.handler_count(EventCode::InterruptRequested), 2);
    assert_eq!(m.handler_count(EventCode::ShutdownRequested), 2);

    sup.shutdown().unwrap();
}

#[test]
fn workers_without_collaborators_are_not_constructed() {
    let sup = WorkerSupervisor::builder(config())
        .with_token_count(counter())
        .build();
    sup.initialize().unwrap();

    assert!(sup.token_count().is_some());
    assert!(sup.generation().is_none());
    assert!(sup.image().is_none());
    assert!(sup.mask_preview().is_none());
    assert!(sup.synthesis().is_none());
    assert!(sup.recognition().is_none());
    assert!(sup.indexing().is_none());
    assert_eq!(sup.states(), vec![("token_count", WorkerState::Idle)]);

    sup.shutdown().unwrap();
}

#[test]
fn requests_flow_through_the_shared_mediator() {
    let mediator = Arc::new(Mediator::default());
    let rx = record(
        &mediator,
        &[
            EventCode::Generation(Signal::Completed),
            EventCode::TokenCount(Signal::Completed),
        ],
    );
    let (generator, _journal, _stepper) = ScriptedGenerator::new();
    let sup = WorkerSupervisor::builder(config())
        .with_mediator(Arc::clone(&mediator))
        .with_generation(generator)
        .with_token_count(counter())
        .build();
    assert!(Arc::ptr_eq(&sup.mediator(), &mediator));
    sup.initialize().unwrap();

    let model = ModelConfig::new("tiny", "/models/tiny.gguf");
    mediator.emit(EventCode::Generation(Signal::LoadRequested), Payload::Load(model.clone()));
    mediator.emit(EventCode::TokenCount(Signal::LoadRequested), Payload::Load(model));

    mediator.emit(
        EventCode::TokenCount(Signal::Requested),
        Payload::TokenCount(TokenCountRequest::new("a b")),
    );
    let req = GenerationRequest::new("hello");
    let id = req.id;
    mediator.emit(EventCode::Generation(Signal::Requested), Payload::Generation(req));

    let counted = wait_for(&rx, EventCode::TokenCount(Signal::Completed));
    assert!(matches!(counted.payload(), Payload::TokensCounted(c) if c.tokens == 2));
    let generated = wait_for(&rx, EventCode::Generation(Signal::Completed));
    assert_eq!(generated.correlation_id(), Some(id));

    sup.shutdown().unwrap();
}

#[test]
fn shutdown_stops_every_worker_and_reports_success() {
    let (generator, _journal, _stepper) = ScriptedGenerator::new();
    let sup = WorkerSupervisor::builder(config())
        .with_generation(generator)
        .with_token_count(counter())
        .build();
    let rx = record(
        &sup.mediator(),
        &[EventCode::ShutdownRequested, EventCode::AllStoppedWithin],
    );
    sup.initialize().unwrap();

    sup.shutdown().unwrap();
    wait_for(&rx, EventCode::ShutdownRequested);
    wait_for(&rx, EventCode::AllStoppedWithin);

    for (name, state) in sup.states() {
        assert_eq!(state, WorkerState::Stopped, "{name}");
    }
    assert!(matches!(
        sup.initialize(),
        Err(RuntimeError::SupervisorStopped)
    ));
}

#[test]
fn shutdown_before_initialize_prevents_a_later_initialize() {
    let (generator, journal, _stepper) = ScriptedGenerator::new();
    let sup = WorkerSupervisor::builder(config())
        .with_generation(generator)
        .with_token_count(counter())
        .build();

    sup.shutdown().unwrap();
    let err = sup.initialize().unwrap_err();
    assert_eq!(err.as_label(), "runtime_supervisor_stopped");
    assert!(sup.generation().is_none());
    assert!(sup.token_count().is_none());
    assert!(sup.states().is_empty());
    assert!(journal.prompts().is_empty());
}

#[test]
fn shutdown_reports_workers_stuck_past_grace() {
    let mut cfg = config();
    cfg.grace = Duration::from_millis(50);
    let (generator, _journal, stepper) = ScriptedGenerator::new();
    let sup = WorkerSupervisor::builder(cfg)
        .with_generation(generator)
        .with_token_count(counter())
        .build();
    let rx = record(&sup.mediator(), &[EventCode::GraceExceeded]);
    sup.initialize().unwrap();

    let worker = sup.generation().unwrap();
    worker.load(ModelConfig::new("tiny", "/models/tiny.gguf"));
    worker.enqueue(GenerationRequest::new("block"));
    stepper.reached(0);

    match sup.shutdown() {
        Err(RuntimeError::GraceExceeded { grace, stuck }) => {
            assert_eq!(grace, Duration::from_millis(50));
            assert_eq!(stuck, vec!["generation".to_string()]);
        }
        other => panic!("unexpected result {other:?}"),
    }
    let ev = wait_for(&rx, EventCode::GraceExceeded);
    assert!(matches!(ev.payload(), Payload::Stuck(s) if s == &vec!["generation".to_string()]));

    stepper.release();
    worker.stop(Duration::from_secs(2)).unwrap();
}

#[test]
fn config_file_overrides_disciplines() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "grace_ms = 500\npoll_interval_ms = 5\n\n[workers.generation]\ndiscipline = \"latest-only\""
    )
    .unwrap();

    let cfg = Config::from_file(file.path()).unwrap();
    assert_eq!(cfg.grace, Duration::from_millis(500));

    let (generator, _journal, _stepper) = ScriptedGenerator::new();
    let sup = WorkerSupervisor::builder(cfg)
        .with_generation(generator)
        .build();
    sup.initialize().unwrap();
    assert_eq!(
        sup.generation().unwrap().discipline(),
        QueueDiscipline::LatestOnly
    );
    sup.shutdown().unwrap();
}
