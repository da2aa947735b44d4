use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::thread::JoinHandle;

use anyhow::Context as _;

use crate::engine::adapter::EngineFactory;
use crate::foundation::core::SessionId;
use crate::foundation::error::{TesseraError, TesseraResult};
use crate::protocol::channel::{BackgroundEnd, Control, ForegroundEnd, transfer_channel};
use crate::protocol::message::{Command, Event};
use crate::session::scheduler::{
    BatchScheduler, EmitThrottle, OptimizationSession, SessionOutcome, panic_message,
    stop_was_queued,
};

/// Foreground handle to a live background context.
///
/// Dropping the handle (or calling [`SessionHandle::release`]) closes the control channel, which
/// the background context treats as a stop at its next checkpoint.
#[derive(Debug)]
pub struct SessionHandle {
    id: SessionId,
    port: ForegroundEnd,
    join: JoinHandle<SessionOutcome>,
}

/// A background context whose handle was released, kept only to be joined.
#[derive(Debug)]
pub struct RetiredSession {
    id: SessionId,
    join: JoinHandle<SessionOutcome>,
}

/// Spawn a background context for `id`.
///
/// The context emits [`Event::Ready`], then blocks until it receives [`Command::Start`], builds
/// its engine through `factory`, and runs the batch loop.
pub fn spawn_session(
    id: SessionId,
    factory: Arc<dyn EngineFactory>,
    throttle: EmitThrottle,
) -> TesseraResult<SessionHandle> {
    let (port, background) = transfer_channel();
    let join = std::thread::Builder::new()
        .name(format!("tessera-{id}"))
        .spawn(move || session_main(id, factory.as_ref(), &background, throttle))
        .with_context(|| format!("spawn background context for {id}"))?;
    tracing::debug!(%id, "background context spawned");
    Ok(SessionHandle { id, port, join })
}

impl SessionHandle {
    /// Session identifier.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Queue a control message. Never blocks.
    pub fn send(&self, cmd: Command) -> TesseraResult<()> {
        self.port.send(cmd)
    }

    /// Take the next event if one is pending. Never blocks.
    pub fn try_recv(&self) -> TesseraResult<Option<Event>> {
        self.port.try_recv()
    }

    /// `true` once the background context has exited.
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Drop the channel and keep only the join handle.
    pub fn release(self) -> RetiredSession {
        RetiredSession {
            id: self.id,
            join: self.join,
        }
    }
}

impl RetiredSession {
    /// Session identifier.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// `true` once the background context has exited.
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the background context and return how its loop ended.
    pub fn join(self) -> TesseraResult<SessionOutcome> {
        self.join.join().map_err(|panic| {
            TesseraError::state(format!(
                "background context {} panicked: {}",
                self.id,
                panic_message(panic.as_ref())
            ))
        })
    }
}

fn session_main(
    id: SessionId,
    factory: &dyn EngineFactory,
    port: &BackgroundEnd,
    throttle: EmitThrottle,
) -> SessionOutcome {
    if port.emit(Event::Ready).is_err() {
        if stop_was_queued(port) {
            return SessionOutcome::Stopped { iteration: 0 };
        }
        return SessionOutcome::Disconnected { iteration: 0 };
    }
    tracing::debug!(%id, "ready, waiting for start");

    let cfg = loop {
        match port.wait_control() {
            Control::Command(Command::Start(cfg)) => break cfg,
            Control::Command(Command::Stop) => return SessionOutcome::Stopped { iteration: 0 },
            Control::Idle => continue,
            Control::Disconnected => return SessionOutcome::Disconnected { iteration: 0 },
        }
    };
    tracing::debug!(%id, width = cfg.width, height = cfg.height, "start received");

    let created = cfg.validate().and_then(|()| {
        match catch_unwind(AssertUnwindSafe(|| factory.create(&cfg))) {
            Ok(res) => res,
            Err(panic) => Err(TesseraError::engine_init(format!(
                "engine constructor panicked: {}",
                panic_message(panic.as_ref())
            ))),
        }
    });
    let engine = match created {
        Ok(engine) => engine,
        Err(e) => {
            let message = match e {
                TesseraError::EngineInit(_) => e.to_string(),
                other => TesseraError::engine_init(other.to_string()).to_string(),
            };
            tracing::warn!(%id, error = %message, "engine init failed");
            if port.emit(Event::Error(message.clone())).is_err() {
                tracing::debug!(%id, "foreground gone before the error could be delivered");
            }
            return SessionOutcome::Failed { message };
        }
    };

    let session = OptimizationSession::new(id, engine, &cfg.session);
    // The engine keeps whatever it needs; the snapshot's pixel copy is released here.
    drop(cfg);
    BatchScheduler::with_throttle(session, port, throttle).run()
}

#[cfg(test)]
#[path = "../../tests/unit/session/worker.rs"]
mod tests;
