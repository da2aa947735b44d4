use crate::foundation::error::TesseraResult;
use crate::session::config::StartConfig;

/// Capability contract of an iterative approximation engine.
///
/// Tessera never looks inside an engine: it advances it in batches from a background context and
/// forwards whatever pixels it reports. Implementations may block for the whole duration of
/// [`Engine::step`]; the scheduler only checks for cancellation between calls.
pub trait Engine: Send {
    /// Advance by up to `batch` iterations and return the current best image as packed RGBA8
    /// (`width * height * 4` bytes).
    ///
    /// `step(0)` must return the current best without advancing. Once the engine is finished,
    /// further calls return the final image unchanged.
    fn step(&mut self, batch: u32) -> TesseraResult<Vec<u8>>;

    /// `true` once the iteration cap or the accuracy target has been reached.
    fn is_finished(&self) -> bool;

    /// Iterations performed so far. Never decreases.
    fn iteration(&self) -> u64;

    /// Accuracy of the current best image in `[0, 1]`.
    fn accuracy(&self) -> f32;

    /// Output width in pixels.
    fn width(&self) -> u32;

    /// Output height in pixels.
    fn height(&self) -> u32;
}

/// Constructs an [`Engine`] from a start snapshot inside the background context.
///
/// Closures of the right shape implement this trait, which keeps test doubles small.
pub trait EngineFactory: Send + Sync {
    /// Build an engine for one session. Errors are reported as engine init failures.
    fn create(&self, cfg: &StartConfig) -> TesseraResult<Box<dyn Engine>>;
}

impl<F> EngineFactory for F
where
    F: Fn(&StartConfig) -> TesseraResult<Box<dyn Engine>> + Send + Sync,
{
    fn create(&self, cfg: &StartConfig) -> TesseraResult<Box<dyn Engine>> {
        self(cfg)
    }
}
