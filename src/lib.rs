//! Tessera drives long-running iterative image approximation engines off the foreground thread.
//!
//! A session runs on its own background thread and advances an [`Engine`] in batches. Partial
//! results stream back through a throttled, ownership-moving [`transfer_channel`], and a
//! single-slot [`FrameMailbox`] coalesces them so the foreground presents at most one frame per
//! refresh tick without ever blocking:
//!
//! - Load an image into a [`LifecycleController`]
//! - [`LifecycleController::start`] a session
//! - Call [`LifecycleController::tick`] from the host's refresh loop
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub(crate) mod engine;
pub(crate) mod lifecycle;
pub(crate) mod protocol;
pub(crate) mod render;
pub(crate) mod session;

pub use crate::foundation::core::{AlgorithmVariant, Bitmap, SessionId, rgba_len};
pub use crate::foundation::error::{TesseraError, TesseraResult};

pub use crate::engine::adapter::{Engine, EngineFactory};
pub use crate::engine::polygon::{
    Metric, PolygonEngine, PolygonEngineFactory, PolygonEngineOpts, Strategy,
};
pub use crate::lifecycle::controller::LifecycleController;
pub use crate::lifecycle::progress::{StatusDisplay, progress_percent};
pub use crate::lifecycle::state::RunState;
pub use crate::protocol::channel::{BackgroundEnd, Control, ForegroundEnd, transfer_channel};
pub use crate::protocol::message::{Command, Event, MessageKind, ProgressPayload};
pub use crate::render::mailbox::FrameMailbox;
pub use crate::render::surface::{CanvasSurface, Surface};
pub use crate::render::synchronizer::{RenderStats, RenderSynchronizer};
pub use crate::session::config::{
    DEFAULT_BATCH_SIZE, DEFAULT_MAX_ITERATIONS, DEFAULT_TARGET_ACCURACY, SessionConfig,
    StartConfig,
};
pub use crate::session::scheduler::{
    BatchScheduler, EmitThrottle, OptimizationSession, SessionOutcome, UPDATE_INTERVAL,
};
pub use crate::session::worker::{RetiredSession, SessionHandle, spawn_session};
