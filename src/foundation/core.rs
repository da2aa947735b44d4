use std::fmt;

use crate::foundation::error::{TesseraError, TesseraResult};

/// Identifier of one optimization session (one background context, one engine).
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Engine strategy selector.
///
/// The numeric mapping is owned by the engine; this layer only carries the value.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct AlgorithmVariant(pub u8);

/// Packed RGBA8 image owned by exactly one party at a time.
///
/// `Bitmap` is intentionally not `Clone`: it is moved from the engine into a progress event, from
/// the event into the frame mailbox, and from the mailbox to the surface. Dropping it releases the
/// buffer.
#[derive(Debug, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    data: Vec<u8>, // row-major, straight alpha
}

impl Bitmap {
    /// Wrap an engine-produced buffer without copying it.
    ///
    /// Fails when `data.len() != width * height * 4`.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> TesseraResult<Self> {
        let expected = rgba_len(width, height)?;
        if data.len() != expected {
            return Err(TesseraError::validation(format!(
                "bitmap {width}x{height} needs {expected} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Borrow the packed RGBA8 bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Give up the bitmap wrapper and take the raw buffer.
    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }
}

/// Byte length of a packed RGBA8 image, rejecting overflow.
pub fn rgba_len(width: u32, height: u32) -> TesseraResult<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|px| px.checked_mul(4))
        .ok_or_else(|| TesseraError::validation(format!("image {width}x{height} is too large")))
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
