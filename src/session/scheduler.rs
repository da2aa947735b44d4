use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::{Duration, Instant};

use crate::engine::adapter::Engine;
use crate::foundation::core::{AlgorithmVariant, Bitmap, SessionId};
use crate::foundation::error::{TesseraError, TesseraResult};
use crate::protocol::channel::{BackgroundEnd, Control};
use crate::protocol::message::{Command, Event, ProgressPayload};
use crate::session::config::SessionConfig;

/// Minimum spacing between two non-terminal emissions.
pub const UPDATE_INTERVAL: Duration = Duration::from_millis(50);

/// Decides whether a batch result is sent to the foreground.
///
/// The first call always emits. A finished result always emits and resets the window.
#[derive(Clone, Copy, Debug)]
pub struct EmitThrottle {
    interval: Duration,
    last: Option<Instant>,
}

impl EmitThrottle {
    /// Throttle with the given minimum interval.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// `true` when an event should be emitted at `now`. Records the emission time when it is.
    pub fn should_emit(&mut self, now: Instant, finished: bool) -> bool {
        let due = match self.last {
            None => true,
            Some(t) => now.saturating_duration_since(t) >= self.interval,
        };
        if due || finished {
            self.last = Some(now);
            return true;
        }
        false
    }
}

impl Default for EmitThrottle {
    fn default() -> Self {
        Self::new(UPDATE_INTERVAL)
    }
}

/// One run of an engine, exclusively owned by its [`BatchScheduler`].
pub struct OptimizationSession {
    id: SessionId,
    engine: Box<dyn Engine>,
    max_iterations: u64,
    target_accuracy: f32,
    batch_size: u32,
    algorithm: AlgorithmVariant,
}

impl OptimizationSession {
    /// Bind an engine to the knobs it was created with.
    pub fn new(id: SessionId, engine: Box<dyn Engine>, cfg: &SessionConfig) -> Self {
        Self {
            id,
            engine,
            max_iterations: cfg.max_iterations,
            target_accuracy: cfg.target_accuracy,
            batch_size: cfg.batch_size,
            algorithm: cfg.algorithm,
        }
    }

    /// Session identifier.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Engine output size as `(width, height)`.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.engine.width(), self.engine.height())
    }

    /// Iterations per batch.
    pub fn batch_size(&self) -> u32 {
        self.batch_size
    }

    /// Strategy selector the engine was built with.
    pub fn algorithm(&self) -> AlgorithmVariant {
        self.algorithm
    }
}

/// How a session's batch loop ended.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SessionOutcome {
    /// The engine finished and the `finished` event was sent.
    Finished {
        /// Final iteration.
        iteration: u64,
        /// Final accuracy.
        accuracy: f32,
    },
    /// A `stop` command was observed at a checkpoint.
    Stopped {
        /// Iteration reached before the stop took effect.
        iteration: u64,
    },
    /// The engine failed; the `error` event carried `message`.
    Failed {
        /// Human-readable failure.
        message: String,
    },
    /// The foreground end went away. Treated as a stop.
    Disconnected {
        /// Iteration reached before the loop noticed.
        iteration: u64,
    },
}

struct BatchReadback {
    pixels: Vec<u8>,
    iteration: u64,
    accuracy: f32,
    width: u32,
    height: u32,
    finished: bool,
}

enum Checkpoint {
    Continue,
    Stop,
    Disconnected,
}

/// Drives an [`OptimizationSession`] in batches and streams results over a [`BackgroundEnd`].
pub struct BatchScheduler<'a> {
    session: OptimizationSession,
    port: &'a BackgroundEnd,
    throttle: EmitThrottle,
    emitted: u64,
    last_iteration: u64,
    last_accuracy: f32,
}

impl<'a> BatchScheduler<'a> {
    /// Scheduler with the standard 50 ms throttle.
    pub fn new(session: OptimizationSession, port: &'a BackgroundEnd) -> Self {
        Self::with_throttle(session, port, EmitThrottle::default())
    }

    /// Scheduler with a custom throttle.
    pub fn with_throttle(
        session: OptimizationSession,
        port: &'a BackgroundEnd,
        throttle: EmitThrottle,
    ) -> Self {
        Self {
            session,
            port,
            throttle,
            emitted: 0,
            last_iteration: 0,
            last_accuracy: 0.0,
        }
    }

    /// Run batches until the engine finishes, a stop is observed, or the engine fails.
    ///
    /// A stop only takes effect at the checkpoint before each batch, so one in-flight batch may
    /// complete (and emit) after the stop was sent.
    #[tracing::instrument(skip_all, fields(session = %self.session.id))]
    pub fn run(mut self) -> SessionOutcome {
        tracing::info!(
            batch_size = self.session.batch_size,
            max_iterations = self.session.max_iterations,
            target_accuracy = self.session.target_accuracy,
            algorithm = self.session.algorithm.0,
            "session started"
        );
        loop {
            match self.checkpoint() {
                Checkpoint::Continue => {}
                Checkpoint::Stop => {
                    tracing::info!(iteration = self.last_iteration, "session stopped");
                    return SessionOutcome::Stopped {
                        iteration: self.last_iteration,
                    };
                }
                Checkpoint::Disconnected => {
                    tracing::info!(iteration = self.last_iteration, "foreground gone, stopping");
                    return SessionOutcome::Disconnected {
                        iteration: self.last_iteration,
                    };
                }
            }

            let (payload, finished) = match self.run_batch() {
                Ok(r) => r,
                Err(e) => return self.fail(e),
            };

            if self.throttle.should_emit(Instant::now(), finished) {
                let (iteration, accuracy) = (payload.iteration, payload.accuracy);
                let ev = if finished {
                    Event::Finished(payload)
                } else {
                    Event::Progress(payload)
                };
                if self.port.emit(ev).is_err() {
                    return self.foreground_gone(iteration);
                }
                self.emitted += 1;
                tracing::debug!(iteration, accuracy, finished, "emitted");
            }

            if finished {
                let accuracy = self.last_accuracy;
                tracing::info!(
                    iteration = self.last_iteration,
                    accuracy,
                    emitted = self.emitted,
                    "session finished"
                );
                return SessionOutcome::Finished {
                    iteration: self.last_iteration,
                    accuracy,
                };
            }
        }
    }

    /// Yield, then drain queued control messages.
    fn checkpoint(&mut self) -> Checkpoint {
        std::thread::yield_now();
        loop {
            match self.port.poll_control() {
                Control::Idle => return Checkpoint::Continue,
                Control::Command(Command::Stop) => return Checkpoint::Stop,
                Control::Command(cmd @ Command::Start(_)) => {
                    tracing::debug!(kind = %cmd.kind(), "ignoring start for a running session");
                }
                Control::Disconnected => return Checkpoint::Disconnected,
            }
        }
    }

    /// Advance one batch and package its result with the engine's finished flag.
    ///
    /// The step and every read-back run under one `catch_unwind`, so a panicking accessor fails
    /// the batch like a panicking step.
    fn run_batch(&mut self) -> TesseraResult<(ProgressPayload, bool)> {
        let batch = self.session.batch_size;
        let engine = &mut self.session.engine;
        let read = catch_unwind(AssertUnwindSafe(|| {
            engine.step(batch).map(|pixels| BatchReadback {
                pixels,
                iteration: engine.iteration(),
                accuracy: engine.accuracy(),
                width: engine.width(),
                height: engine.height(),
                finished: engine.is_finished(),
            })
        }));
        let out = match read {
            Ok(Ok(out)) => out,
            Ok(Err(e @ TesseraError::EngineStep(_))) => return Err(e),
            Ok(Err(e)) => return Err(TesseraError::engine_step(e.to_string())),
            Err(panic) => {
                return Err(TesseraError::engine_step(format!(
                    "engine panicked: {}",
                    panic_message(panic.as_ref())
                )));
            }
        };

        if out.iteration < self.last_iteration {
            return Err(TesseraError::engine_step(format!(
                "iteration went backwards from {} to {}",
                self.last_iteration, out.iteration
            )));
        }
        self.last_iteration = out.iteration;
        self.last_accuracy = out.accuracy;

        let bitmap = Bitmap::from_rgba(out.width, out.height, out.pixels)
            .map_err(|e| TesseraError::engine_step(format!("malformed engine buffer: {e}")))?;
        let payload = ProgressPayload {
            iteration: out.iteration,
            accuracy: out.accuracy,
            bitmap,
            max_iterations: self.session.max_iterations,
            target_accuracy: self.session.target_accuracy,
        };
        Ok((payload, out.finished))
    }

    /// The foreground dropped its end. A stop it queued first still counts as a stop.
    fn foreground_gone(&self, iteration: u64) -> SessionOutcome {
        if stop_was_queued(self.port) {
            tracing::info!(iteration, "session stopped");
            return SessionOutcome::Stopped { iteration };
        }
        tracing::info!(iteration, "foreground gone, stopping");
        SessionOutcome::Disconnected { iteration }
    }

    fn fail(&self, err: TesseraError) -> SessionOutcome {
        let message = err.to_string();
        tracing::warn!(error = %message, iteration = self.last_iteration, "session failed");
        if self.port.emit(Event::Error(message.clone())).is_err() {
            tracing::debug!("foreground gone before the error could be delivered");
        }
        SessionOutcome::Failed { message }
    }
}

/// Drain the control queue and report whether a stop was waiting in it.
pub(crate) fn stop_was_queued(port: &BackgroundEnd) -> bool {
    loop {
        match port.poll_control() {
            Control::Command(Command::Stop) => return true,
            Control::Command(Command::Start(_)) => {}
            Control::Idle | Control::Disconnected => return false,
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/scheduler.rs"]
mod tests;
