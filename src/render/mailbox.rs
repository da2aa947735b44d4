use crate::foundation::core::Bitmap;

/// Single-slot frame handoff between event intake and the refresh tick.
///
/// Depositing over an unconsumed frame releases the old one first. Frames are never queued, so at
/// most one undisplayed bitmap is alive at any time.
#[derive(Debug, Default)]
pub struct FrameMailbox {
    slot: Option<Bitmap>,
    superseded: u64,
}

impl FrameMailbox {
    /// Empty mailbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `frame`, releasing any pending one. Returns `true` if a frame was superseded.
    pub fn deposit(&mut self, frame: Bitmap) -> bool {
        let had_pending = self.release();
        if had_pending {
            self.superseded += 1;
        }
        self.slot = Some(frame);
        had_pending
    }

    /// Take the pending frame, leaving the slot empty.
    pub fn take(&mut self) -> Option<Bitmap> {
        self.slot.take()
    }

    /// Drop the pending frame without presenting it. Returns `true` if one was held.
    pub fn release(&mut self) -> bool {
        self.slot.take().is_some()
    }

    /// `true` while an unconsumed frame is held.
    pub fn is_pending(&self) -> bool {
        self.slot.is_some()
    }

    /// Frames overwritten before they could be presented.
    pub fn superseded(&self) -> u64 {
        self.superseded
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/mailbox.rs"]
mod tests;
