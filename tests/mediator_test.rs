mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use common::record;
use workbus::{Event, EventCode, HandlerRef, Mediator, Payload, Signal};

const PING: EventCode = EventCode::Generation(Signal::Completed);

struct Panel {
    tag: &'static str,
    log: Arc<Mutex<Vec<&'static str>>>,
}

impl Panel {
    fn new(tag: &'static str, log: &Arc<Mutex<Vec<&'static str>>>) -> Arc<Self> {
        Arc::new(Self {
            tag,
            log: Arc::clone(log),
        })
    }

    fn on_event(&self, _ev: &Event) {
        self.log.lock().unwrap().push(self.tag);
    }

    fn explode(&self, _ev: &Event) {
        panic!("{} exploded", self.tag);
    }
}

#[test]
fn duplicate_registration_is_a_noop() {
    let m = Mediator::default();
    let log = Arc::new(Mutex::new(Vec::new()));
    let a = Panel::new("a", &log);

    let h1 = m.register(PING, HandlerRef::bind(&a, Panel::on_event));
    let h2 = m.register(PING, HandlerRef::bind(&a, Panel::on_event));
    assert_eq!(h1, h2);
    assert_eq!(m.handler_count(PING), 1);

    m.signal(PING);
    assert_eq!(*log.lock().unwrap(), vec!["a"]);
}

fn listener(tag: &'static str, log: &Arc<Mutex<Vec<&'static str>>>) -> HandlerRef {
    let log = Arc::clone(log);
    HandlerRef::func(move |_ev: &Event| log.lock().unwrap().push(tag))
}

#[test]
fn closures_from_one_site_are_distinct_handlers() {
    let m = Mediator::default();
    let log = Arc::new(Mutex::new(Vec::new()));

    let a = listener("panel_a", &log);
    m.register(PING, a.clone());
    m.register(PING, listener("panel_b", &log));
    // Re-registering the same instance is still a duplicate.
    m.register(PING, a.clone());
    assert_eq!(m.handler_count(PING), 2);

    m.signal(PING);
    assert_eq!(*log.lock().unwrap(), vec!["panel_a", "panel_b"]);

    m.unregister(PING, &a);
    m.signal(PING);
    assert_eq!(*log.lock().unwrap(), vec!["panel_a", "panel_b", "panel_b"]);
}

#[test]
fn handlers_fire_in_registration_order() {
    let m = Mediator::default();
    let log = Arc::new(Mutex::new(Vec::new()));
    let (a, b, c) = (Panel::new("a", &log), Panel::new("b", &log), Panel::new("c", &log));

    m.register(PING, HandlerRef::bind(&a, Panel::on_event));
    m.register(PING, HandlerRef::bind(&b, Panel::on_event));
    m.register(PING, HandlerRef::bind(&c, Panel::on_event));

    m.signal(PING);
    m.signal(PING);
    assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c", "a", "b", "c"]);
}

#[test]
fn unregister_removes_only_that_handler() {
    let m = Mediator::default();
    let log = Arc::new(Mutex::new(Vec::new()));
    let (a, b) = (Panel::new("a", &log), Panel::new("b", &log));

    m.register(PING, HandlerRef::bind(&a, Panel::on_event));
    m.register(PING, HandlerRef::bind(&b, Panel::on_event));
    m.unregister(PING, &HandlerRef::bind(&a, Panel::on_event));
    // Unknown registrations are ignored.
    m.unregister(EventCode::GraceExceeded, &HandlerRef::bind(&a, Panel::on_event));

    m.signal(PING);
    assert_eq!(*log.lock().unwrap(), vec!["b"]);
}

#[test]
fn panicking_handler_is_isolated_and_reported() {
    let m = Mediator::default();
    let panics = record(&m, &[EventCode::HandlerPanicked]);
    let log = Arc::new(Mutex::new(Vec::new()));
    let (a, b, c) = (Panel::new("a", &log), Panel::new("b", &log), Panel::new("c", &log));

    m.register(PING, HandlerRef::bind(&a, Panel::on_event));
    m.register(PING, HandlerRef::bind(&b, Panel::explode));
    m.register(PING, HandlerRef::bind(&c, Panel::on_event));

    m.signal(PING);
    assert_eq!(*log.lock().unwrap(), vec!["a", "c"]);

    let ev = panics.try_recv().expect("HandlerPanicked emitted synchronously");
    match ev.payload() {
        Payload::Panicked(p) => {
            assert_eq!(p.code, PING);
            assert!(p.handler.ends_with("Panel"));
            assert_eq!(&*p.info, "b exploded");
        }
        other => panic!("unexpected payload {other:?}"),
    }
}

#[test]
fn panic_inside_a_panic_handler_does_not_recurse() {
    let m = Mediator::default();
    let log = Arc::new(Mutex::new(Vec::new()));
    let (a, b) = (Panel::new("a", &log), Panel::new("b", &log));

    m.register(PING, HandlerRef::bind(&a, Panel::explode));
    m.register(EventCode::HandlerPanicked, HandlerRef::bind(&b, Panel::explode));

    m.signal(PING);
    m.signal(PING);
}

#[test]
fn dropped_receiver_is_skipped() {
    let m = Mediator::default();
    let log = Arc::new(Mutex::new(Vec::new()));
    let a = Panel::new("a", &log);
    m.register(PING, HandlerRef::bind(&a, Panel::on_event));
    drop(a);

    m.signal(PING);
    assert!(log.lock().unwrap().is_empty());
    assert_eq!(m.handler_count(PING), 0);
}

#[test]
fn concurrent_emit_and_register() {
    let m = Arc::new(Mediator::default());
    let hits = Arc::new(AtomicUsize::new(0));
    {
        let hits = Arc::clone(&hits);
        m.register(
            PING,
            HandlerRef::func(move |_ev: &Event| {
                hits.fetch_add(1, Ordering::SeqCst);
            }),
        );
    }

    let log = Arc::new(Mutex::new(Vec::new()));
    let panels: Vec<_> = (0..8).map(|_| Panel::new("late", &log)).collect();

    let mut joins = Vec::new();
    for (i, panel) in panels.iter().enumerate() {
        let m = Arc::clone(&m);
        let panel = Arc::clone(panel);
        joins.push(thread::spawn(move || {
            for n in 0..100 {
                if n == 50 {
                    m.register(
                        EventCode::Image(Signal::Completed),
                        HandlerRef::bind(&panel, Panel::on_event),
                    );
                }
                m.emit(PING, Payload::Worker(if i % 2 == 0 { "even" } else { "odd" }));
            }
        }));
    }
    for j in joins {
        j.join().unwrap();
    }

    assert_eq!(hits.load(Ordering::SeqCst), 800);
    assert_eq!(m.handler_count(EventCode::Image(Signal::Completed)), 8);
}

#[tokio::test]
async fn tap_observes_every_event_in_sequence() {
    let m = Mediator::default();
    let mut rx = m.subscribe();

    m.signal(EventCode::ShutdownRequested);
    m.emit(EventCode::GraceExceeded, Payload::Stuck(vec!["image".into()]));

    let first = tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .unwrap()
        .unwrap();
    let second = tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(first.code, EventCode::ShutdownRequested);
    assert_eq!(second.code, EventCode::GraceExceeded);
    assert!(second.seq > first.seq);
    assert!(matches!(second.payload(), Payload::Stuck(s) if s == &vec!["image".to_string()]));
}
