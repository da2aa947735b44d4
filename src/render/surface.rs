use std::path::Path;

use anyhow::Context as _;
use image::{Rgba, RgbaImage};

use crate::foundation::core::Bitmap;
use crate::foundation::error::{TesseraError, TesseraResult};

/// Output target the render synchronizer composites frames onto.
pub trait Surface {
    /// Resize to `width x height` and clear to opaque black.
    fn reset(&mut self, width: u32, height: u32);

    /// Replace the visible contents with `frame`.
    fn present(&mut self, frame: &Bitmap) -> TesseraResult<()>;
}

/// In-memory RGBA canvas backed by an [`image::RgbaImage`].
#[derive(Clone, Debug)]
pub struct CanvasSurface {
    canvas: RgbaImage,
    presented: u64,
}

impl CanvasSurface {
    /// Opaque black canvas of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            canvas: blank(width, height),
            presented: 0,
        }
    }

    /// Current canvas contents.
    pub fn image(&self) -> &RgbaImage {
        &self.canvas
    }

    /// Number of frames composited since construction.
    pub fn presented(&self) -> u64 {
        self.presented
    }

    /// Take the canvas.
    pub fn into_image(self) -> RgbaImage {
        self.canvas
    }

    /// Write the canvas as PNG.
    pub fn save_png(&self, path: &Path) -> TesseraResult<()> {
        self.canvas
            .save_with_format(path, image::ImageFormat::Png)
            .with_context(|| format!("write png '{}'", path.display()))?;
        Ok(())
    }
}

impl Surface for CanvasSurface {
    fn reset(&mut self, width: u32, height: u32) {
        self.canvas = blank(width, height);
    }

    fn present(&mut self, frame: &Bitmap) -> TesseraResult<()> {
        if frame.width() != self.canvas.width() || frame.height() != self.canvas.height() {
            return Err(TesseraError::validation(format!(
                "frame {}x{} does not match surface {}x{}",
                frame.width(),
                frame.height(),
                self.canvas.width(),
                self.canvas.height()
            )));
        }
        self.canvas.copy_from_slice(frame.as_bytes());
        self.presented += 1;
        Ok(())
    }
}

fn blank(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255]))
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
