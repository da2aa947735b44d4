use crate::foundation::core::Bitmap;
use crate::foundation::error::TesseraResult;
use crate::render::mailbox::FrameMailbox;
use crate::render::surface::Surface;

/// Frame counters reported by [`RenderSynchronizer::stats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct RenderStats {
    /// Frames composited onto the surface.
    pub presented: u64,
    /// Frames overwritten in the mailbox before a tick consumed them.
    pub superseded: u64,
}

/// Composites the newest received frame once per refresh tick.
///
/// Event intake and the refresh clock run at independent rates; they only meet at the
/// [`FrameMailbox`]. Ticks only present while the synchronizer is scheduled (a session is
/// running). [`RenderSynchronizer::flush`] presents the pending frame regardless.
#[derive(Debug)]
pub struct RenderSynchronizer<S> {
    surface: S,
    mailbox: FrameMailbox,
    scheduled: bool,
    presented: u64,
}

impl<S: Surface> RenderSynchronizer<S> {
    /// Idle synchronizer drawing onto `surface`.
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            mailbox: FrameMailbox::new(),
            scheduled: false,
            presented: 0,
        }
    }

    /// Hand a received frame to the mailbox, superseding any unconsumed one.
    pub fn deposit(&mut self, frame: Bitmap) {
        if self.mailbox.deposit(frame) {
            tracing::trace!(superseded = self.mailbox.superseded(), "frame superseded");
        }
    }

    /// Start presenting on ticks.
    pub fn resume(&mut self) {
        self.scheduled = true;
    }

    /// Stop presenting on ticks. The pending frame, if any, is kept for [`Self::flush`].
    pub fn halt(&mut self) {
        self.scheduled = false;
    }

    /// `true` while ticks present frames.
    pub fn is_scheduled(&self) -> bool {
        self.scheduled
    }

    /// `true` while an unconsumed frame is held.
    pub fn has_pending(&self) -> bool {
        self.mailbox.is_pending()
    }

    /// One refresh tick. Presents the pending frame if scheduled; returns whether it did.
    pub fn on_tick(&mut self) -> TesseraResult<bool> {
        if !self.scheduled {
            return Ok(false);
        }
        self.present_pending()
    }

    /// Present the pending frame now, scheduled or not.
    pub fn flush(&mut self) -> TesseraResult<bool> {
        self.present_pending()
    }

    /// Halt ticking, then flush the last received frame.
    pub fn halt_and_flush(&mut self) -> TesseraResult<bool> {
        self.halt();
        self.flush()
    }

    /// Drop any pending frame and reset the surface to a new size.
    pub fn reset(&mut self, width: u32, height: u32) {
        self.mailbox.release();
        self.surface.reset(width, height);
    }

    /// Presented and superseded frame counts.
    pub fn stats(&self) -> RenderStats {
        RenderStats {
            presented: self.presented,
            superseded: self.mailbox.superseded(),
        }
    }

    /// Borrow the surface.
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Take the surface back.
    pub fn into_surface(self) -> S {
        self.surface
    }

    fn present_pending(&mut self) -> TesseraResult<bool> {
        let Some(frame) = self.mailbox.take() else {
            return Ok(false);
        };
        // The frame is released when it goes out of scope, presented or not.
        self.surface.present(&frame)?;
        self.presented += 1;
        Ok(true)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/synchronizer.rs"]
mod tests;
