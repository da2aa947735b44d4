use std::fmt;
use std::path::Path;

use anyhow::Context as _;

use crate::foundation::core::{AlgorithmVariant, rgba_len};
use crate::foundation::error::{TesseraError, TesseraResult};

/// Default iteration cap when none is configured.
pub const DEFAULT_MAX_ITERATIONS: u64 = 50_000;
/// Default accuracy at which a session is considered converged.
pub const DEFAULT_TARGET_ACCURACY: f32 = 0.9;
/// Default number of engine iterations per batch.
pub const DEFAULT_BATCH_SIZE: u32 = 10;

/// User-tunable knobs for one optimization session.
///
/// Values are never clamped: [`SessionConfig::validate`] rejects out-of-range input instead.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Hard iteration cap, must be `> 0`.
    pub max_iterations: u64,
    /// Convergence threshold in `(0, 1]`.
    pub target_accuracy: f32,
    /// Iterations per batch (between emission/cancellation checks), must be `>= 1`.
    pub batch_size: u32,
    /// Engine strategy selector.
    pub algorithm: AlgorithmVariant,
    /// Optional RNG seed for engines that support deterministic runs.
    pub seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            target_accuracy: DEFAULT_TARGET_ACCURACY,
            batch_size: DEFAULT_BATCH_SIZE,
            algorithm: AlgorithmVariant::default(),
            seed: None,
        }
    }
}

impl SessionConfig {
    /// Check the bounds every engine relies on.
    pub fn validate(&self) -> TesseraResult<()> {
        if self.max_iterations == 0 {
            return Err(TesseraError::validation("max_iterations must be > 0"));
        }
        if !(self.target_accuracy > 0.0 && self.target_accuracy <= 1.0) {
            return Err(TesseraError::validation(format!(
                "target_accuracy must be in (0, 1], got {}",
                self.target_accuracy
            )));
        }
        if self.batch_size == 0 {
            return Err(TesseraError::validation("batch_size must be >= 1"));
        }
        Ok(())
    }

    /// Parse a JSON config document. Missing fields take their defaults.
    pub fn from_json_str(s: &str) -> TesseraResult<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Read and parse a JSON config file.
    pub fn from_json_file(path: &Path) -> TesseraResult<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read session config '{}'", path.display()))?;
        Self::from_json_str(&raw)
    }
}

/// Full configuration snapshot carried by the `start` command.
///
/// Owns its own copy of the source pixels so the foreground keeps its image untouched.
pub struct StartConfig {
    /// Source image, packed RGBA8.
    pub pixels: Vec<u8>,
    /// Source width in pixels.
    pub width: u32,
    /// Source height in pixels.
    pub height: u32,
    /// Session knobs.
    pub session: SessionConfig,
}

impl StartConfig {
    /// Build and validate a snapshot.
    pub fn new(
        pixels: Vec<u8>,
        width: u32,
        height: u32,
        session: SessionConfig,
    ) -> TesseraResult<Self> {
        let cfg = Self {
            pixels,
            width,
            height,
            session,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validate image dimensions, buffer length and session bounds.
    pub fn validate(&self) -> TesseraResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(TesseraError::validation(format!(
                "image must be non-empty, got {}x{}",
                self.width, self.height
            )));
        }
        let expected = rgba_len(self.width, self.height)?;
        if self.pixels.len() != expected {
            return Err(TesseraError::validation(format!(
                "pixel buffer for {}x{} must be {expected} bytes, got {}",
                self.width,
                self.height,
                self.pixels.len()
            )));
        }
        self.session.validate()
    }
}

impl fmt::Debug for StartConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StartConfig")
            .field("pixels", &format_args!("[{} bytes]", self.pixels.len()))
            .field("width", &self.width)
            .field("height", &self.height)
            .field("session", &self.session)
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/config.rs"]
mod tests;
