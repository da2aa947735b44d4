use std::sync::Arc;

use crate::engine::adapter::EngineFactory;
use crate::foundation::core::{SessionId, rgba_len};
use crate::foundation::error::{TesseraError, TesseraResult};
use crate::lifecycle::progress::StatusDisplay;
use crate::lifecycle::state::RunState;
use crate::protocol::message::{Command, Event};
use crate::render::surface::Surface;
use crate::render::synchronizer::{RenderStats, RenderSynchronizer};
use crate::session::config::{SessionConfig, StartConfig};
use crate::session::scheduler::{EmitThrottle, SessionOutcome};
use crate::session::worker::{RetiredSession, SessionHandle, spawn_session};

struct SourceImage {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
}

struct ActiveSession {
    handle: SessionHandle,
    // Sent once the background context reports ready.
    pending_start: Option<StartConfig>,
}

/// Foreground owner of sessions, the render synchronizer, and the status display.
///
/// Every method is non-blocking except [`LifecycleController::shutdown`]. A host drives the
/// controller from its own loop: [`LifecycleController::pump_events`] whenever convenient and
/// [`LifecycleController::render_tick`] once per display refresh (or [`LifecycleController::tick`]
/// for both).
pub struct LifecycleController<S> {
    factory: Arc<dyn EngineFactory>,
    throttle: EmitThrottle,
    render: RenderSynchronizer<S>,
    state: RunState,
    status: StatusDisplay,
    config: SessionConfig,
    image: Option<SourceImage>,
    active: Option<ActiveSession>,
    retired: Vec<RetiredSession>,
    outcomes: Vec<(SessionId, SessionOutcome)>,
    last_terminal: Option<RunState>,
    next_id: u64,
}

impl<S: Surface> LifecycleController<S> {
    /// Idle controller that builds engines with `factory` and draws onto `surface`.
    pub fn new(factory: Arc<dyn EngineFactory>, surface: S) -> Self {
        Self {
            factory,
            throttle: EmitThrottle::default(),
            render: RenderSynchronizer::new(surface),
            state: RunState::Idle,
            status: StatusDisplay::idle(),
            config: SessionConfig::default(),
            image: None,
            active: None,
            retired: Vec::new(),
            outcomes: Vec::new(),
            last_terminal: None,
            next_id: 1,
        }
    }

    /// Replace the emission throttle used by sessions started afterwards.
    pub fn with_throttle(mut self, throttle: EmitThrottle) -> Self {
        self.throttle = throttle;
        self
    }

    /// Load a source image (packed RGBA8). Rejected while a session is running.
    ///
    /// Resets the surface to the image size, clears progress, and moves to `Ready`.
    #[tracing::instrument(skip(self, pixels), fields(bytes = pixels.len()))]
    pub fn load_image(&mut self, pixels: Vec<u8>, width: u32, height: u32) -> TesseraResult<()> {
        if self.state == RunState::Running {
            return Err(TesseraError::state("cannot load an image while a session is running"));
        }
        if width == 0 || height == 0 {
            return Err(TesseraError::validation(format!(
                "image must be non-empty, got {width}x{height}"
            )));
        }
        let expected = rgba_len(width, height)?;
        if pixels.len() != expected {
            return Err(TesseraError::validation(format!(
                "pixel buffer for {width}x{height} must be {expected} bytes, got {}",
                pixels.len()
            )));
        }

        self.state = self.state.transition(RunState::Ready)?;
        self.image = Some(SourceImage {
            pixels,
            width,
            height,
        });
        self.render.reset(width, height);
        self.status = StatusDisplay::ready();
        tracing::debug!("image loaded");
        Ok(())
    }

    /// Session knobs used by the next [`LifecycleController::start`].
    pub fn set_config(&mut self, config: SessionConfig) {
        self.config = config;
    }

    /// Current session knobs.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Validate, spawn a background context, and queue the start snapshot for the handshake.
    #[tracing::instrument(skip(self))]
    pub fn start(&mut self) -> TesseraResult<SessionId> {
        match self.state {
            RunState::Ready => {}
            RunState::Idle => return Err(TesseraError::state("no image loaded")),
            other => return Err(TesseraError::state(format!("cannot start while {other}"))),
        }
        let Some(image) = &self.image else {
            return Err(TesseraError::state("no image loaded"));
        };
        let snapshot = StartConfig::new(
            image.pixels.clone(),
            image.width,
            image.height,
            self.config.clone(),
        )?;

        let id = SessionId(self.next_id);
        let handle = spawn_session(id, Arc::clone(&self.factory), self.throttle)?;
        self.next_id += 1;

        self.state = self.state.transition(RunState::Running)?;
        self.active = Some(ActiveSession {
            handle,
            pending_start: Some(snapshot),
        });
        self.last_terminal = None;
        self.status.running();
        self.render.resume();
        tracing::info!(%id, config = ?self.config, "session starting");
        Ok(id)
    }

    /// User stop: tear the session down. The background context sees the stop at its next
    /// checkpoint.
    #[tracing::instrument(skip(self))]
    pub fn stop(&mut self) -> TesseraResult<()> {
        if self.state != RunState::Running {
            return Err(TesseraError::state(format!(
                "no session running (state {})",
                self.state
            )));
        }
        self.teardown(RunState::Stopping, "Stopped".to_owned());
        Ok(())
    }

    /// Drain every event that has arrived. Never blocks. Returns how many were handled.
    pub fn pump_events(&mut self) -> usize {
        let mut handled = 0;
        loop {
            let Some(active) = &mut self.active else {
                return handled;
            };
            let ev = match active.handle.try_recv() {
                Ok(Some(ev)) => ev,
                Ok(None) => return handled,
                Err(e) => {
                    tracing::warn!(error = %e, "session channel failed");
                    self.fail(e.to_string());
                    return handled;
                }
            };
            handled += 1;

            match ev {
                Event::Ready => {
                    let Some(snapshot) = active.pending_start.take() else {
                        tracing::debug!("duplicate ready ignored");
                        continue;
                    };
                    tracing::debug!(id = %active.handle.id(), "ready, sending start");
                    if let Err(e) = active.handle.send(Command::Start(snapshot)) {
                        tracing::warn!(error = %e, "start not delivered");
                        self.fail(e.to_string());
                        return handled;
                    }
                }
                Event::Progress(p) => {
                    self.status.record(&p);
                    self.render.deposit(p.bitmap);
                }
                Event::Finished(p) => {
                    self.status.record(&p);
                    self.render.deposit(p.bitmap);
                    self.teardown(RunState::Finished, "Finished!".to_owned());
                    return handled;
                }
                Event::Error(message) => {
                    self.fail(message);
                    return handled;
                }
            }
        }
    }

    /// One display refresh. Presents the newest pending frame while a session runs.
    pub fn render_tick(&mut self) -> bool {
        match self.render.on_tick() {
            Ok(presented) => presented,
            Err(e) => {
                tracing::warn!(error = %e, "present failed");
                if self.state == RunState::Running {
                    self.fail(e.to_string());
                }
                false
            }
        }
    }

    /// Pump events, render one tick, and reap exited contexts.
    pub fn tick(&mut self) -> bool {
        self.pump_events();
        let presented = self.render_tick();
        self.reap();
        presented
    }

    /// Join background contexts that have already exited. Never blocks.
    pub fn reap(&mut self) -> usize {
        let (done, live): (Vec<_>, Vec<_>) = std::mem::take(&mut self.retired)
            .into_iter()
            .partition(RetiredSession::is_finished);
        self.retired = live;
        let n = done.len();
        for r in done {
            if let Err(e) = self.record_join(r) {
                tracing::warn!(error = %e, "background context join failed");
            }
        }
        n
    }

    /// Stop any running session and join every background context. Blocks.
    #[tracing::instrument(skip(self))]
    pub fn shutdown(&mut self) -> TesseraResult<()> {
        if self.state == RunState::Running {
            self.stop()?;
        }
        let mut first_err = None;
        for r in std::mem::take(&mut self.retired) {
            if let Err(e) = self.record_join(r) {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Status texts and control states.
    pub fn status(&self) -> &StatusDisplay {
        &self.status
    }

    /// Terminal state of the most recent session, once it has ended.
    pub fn last_terminal(&self) -> Option<RunState> {
        self.last_terminal
    }

    /// Id of the running session.
    pub fn active_session(&self) -> Option<SessionId> {
        self.active.as_ref().map(|a| a.handle.id())
    }

    /// Background contexts released but not joined yet.
    pub fn retired_count(&self) -> usize {
        self.retired.len()
    }

    /// Loop outcomes of joined background contexts, in join order.
    pub fn outcomes(&self) -> &[(SessionId, SessionOutcome)] {
        &self.outcomes
    }

    /// Frame counters.
    pub fn render_stats(&self) -> RenderStats {
        self.render.stats()
    }

    /// Borrow the output surface.
    pub fn surface(&self) -> &S {
        self.render.surface()
    }

    /// Take the output surface. Running sessions are released, not joined.
    pub fn into_surface(mut self) -> S {
        if let Some(active) = self.active.take() {
            self.retired.push(active.handle.release());
        }
        let Self { render, .. } = self;
        render.into_surface()
    }

    fn fail(&mut self, message: String) {
        self.teardown(RunState::Errored, format!("Error: {message}"));
    }

    /// Common exit path: enter `terminal`, flush the last frame, signal stop and release the
    /// context, back to `Ready`.
    fn teardown(&mut self, terminal: RunState, status: String) {
        if let Err(e) = self.state.transition(terminal) {
            tracing::warn!(error = %e, "teardown outside a running session");
            return;
        }
        self.state = terminal;
        if let Err(e) = self.render.halt_and_flush() {
            tracing::warn!(error = %e, "final flush failed");
        }
        if let Some(active) = self.active.take() {
            let id = active.handle.id();
            if let Err(e) = active.handle.send(Command::Stop) {
                tracing::debug!(%id, error = %e, "stop not delivered, context already gone");
            }
            self.retired.push(active.handle.release());
            tracing::info!(%id, state = %terminal, "session ended");
        }

        if terminal == RunState::Errored {
            self.status.settle_failed(status);
        } else {
            self.status.settle(status);
        }
        self.last_terminal = Some(terminal);
        self.state = RunState::Ready;
    }

    fn record_join(&mut self, r: RetiredSession) -> TesseraResult<()> {
        let id = r.id();
        let outcome = r.join()?;
        tracing::debug!(%id, ?outcome, "background context joined");
        self.outcomes.push((id, outcome));
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/lifecycle/controller.rs"]
mod tests;
