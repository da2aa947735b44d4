use std::time::{Duration, Instant};

use super::*;
use crate::engine::adapter::Engine;
use crate::protocol::message::MessageKind;
use crate::session::config::{SessionConfig, StartConfig};

struct Counter {
    iteration: u64,
    max: u64,
}

impl Engine for Counter {
    fn step(&mut self, batch: u32) -> TesseraResult<Vec<u8>> {
        self.iteration = (self.iteration + u64::from(batch)).min(self.max);
        Ok(vec![0; 4])
    }
    fn is_finished(&self) -> bool {
        self.iteration >= self.max
    }
    fn iteration(&self) -> u64 {
        self.iteration
    }
    fn accuracy(&self) -> f32 {
        0.5
    }
    fn width(&self) -> u32 {
        1
    }
    fn height(&self) -> u32 {
        1
    }
}

fn counter_factory() -> Arc<dyn EngineFactory> {
    Arc::new(
        |cfg: &StartConfig| -> TesseraResult<Box<dyn Engine>> {
            Ok(Box::new(Counter {
                iteration: 0,
                max: cfg.session.max_iterations,
            }))
        },
    )
}

fn snapshot(max_iterations: u64) -> StartConfig {
    StartConfig::new(
        vec![0; 4],
        1,
        1,
        SessionConfig {
            max_iterations,
            ..SessionConfig::default()
        },
    )
    .unwrap()
}

/// Poll until a terminal event arrives, collecting everything seen.
fn collect_until_terminal(handle: &SessionHandle) -> Vec<Event> {
    let deadline = Instant::now() + Duration::from_secs(10);
    let mut out = Vec::new();
    while Instant::now() < deadline {
        match handle.try_recv().unwrap() {
            Some(ev) => {
                let done = ev.is_terminal();
                out.push(ev);
                if done {
                    return out;
                }
            }
            None => std::thread::yield_now(),
        }
    }
    panic!("no terminal event within the deadline");
}

fn wait_ready(handle: &SessionHandle) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while Instant::now() < deadline {
        if let Some(ev) = handle.try_recv().unwrap() {
            assert_eq!(ev.kind(), MessageKind::Ready);
            return;
        }
        std::thread::yield_now();
    }
    panic!("background context never reported ready");
}

#[test]
fn handshake_then_run_to_finished() {
    let handle =
        spawn_session(SessionId(7), counter_factory(), EmitThrottle::new(Duration::ZERO)).unwrap();
    assert_eq!(handle.id(), SessionId(7));
    wait_ready(&handle);
    handle.send(Command::Start(snapshot(30))).unwrap();

    let events = collect_until_terminal(&handle);
    assert_eq!(events.len(), 3);
    assert_eq!(events[2].kind(), MessageKind::Finished);

    let retired = handle.release();
    assert_eq!(retired.id(), SessionId(7));
    assert_eq!(
        retired.join().unwrap(),
        SessionOutcome::Finished {
            iteration: 30,
            accuracy: 0.5
        }
    );
}

#[test]
fn init_failure_is_reported_before_any_progress() {
    let factory: Arc<dyn EngineFactory> = Arc::new(
        |_: &StartConfig| -> TesseraResult<Box<dyn Engine>> {
            Err(TesseraError::validation("no such strategy"))
        },
    );
    let handle = spawn_session(SessionId(1), factory, EmitThrottle::default()).unwrap();
    wait_ready(&handle);
    handle.send(Command::Start(snapshot(10))).unwrap();

    let events = collect_until_terminal(&handle);
    let [Event::Error(message)] = events.as_slice() else {
        panic!("expected a lone error event, got {events:?}");
    };
    assert!(message.starts_with("engine init error:"), "{message}");
    assert!(message.contains("no such strategy"));
    assert!(matches!(
        handle.release().join().unwrap(),
        SessionOutcome::Failed { .. }
    ));
}

#[test]
fn panicking_constructor_is_an_init_error() {
    let factory: Arc<dyn EngineFactory> = Arc::new(
        |_: &StartConfig| -> TesseraResult<Box<dyn Engine>> { panic!("ctor exploded") },
    );
    let handle = spawn_session(SessionId(2), factory, EmitThrottle::default()).unwrap();
    wait_ready(&handle);
    handle.send(Command::Start(snapshot(10))).unwrap();

    let events = collect_until_terminal(&handle);
    assert!(matches!(&events[..], [Event::Error(m)] if m.contains("ctor exploded")));
}

#[test]
fn stop_before_start_ends_the_context() {
    let handle = spawn_session(SessionId(3), counter_factory(), EmitThrottle::default()).unwrap();
    wait_ready(&handle);
    handle.send(Command::Stop).unwrap();
    assert_eq!(
        handle.release().join().unwrap(),
        SessionOutcome::Stopped { iteration: 0 }
    );
}

#[test]
fn releasing_the_handle_before_start_disconnects() {
    let handle = spawn_session(SessionId(4), counter_factory(), EmitThrottle::default()).unwrap();
    let retired = handle.release();
    let outcome = retired.join().unwrap();
    assert!(matches!(outcome, SessionOutcome::Disconnected { iteration: 0 }));
}

#[test]
fn background_thread_is_named_after_the_session() {
    let factory: Arc<dyn EngineFactory> = Arc::new(
        |_: &StartConfig| -> TesseraResult<Box<dyn Engine>> {
            Err(TesseraError::engine_init(
                std::thread::current().name().unwrap_or("").to_owned(),
            ))
        },
    );
    let handle = spawn_session(SessionId(9), factory, EmitThrottle::default()).unwrap();
    wait_ready(&handle);
    handle.send(Command::Start(snapshot(10))).unwrap();
    let events = collect_until_terminal(&handle);
    assert!(matches!(
        &events[..],
        [Event::Error(m)] if m == "engine init error: tessera-session-9"
    ));
}
