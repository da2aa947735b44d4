use std::fmt;

use crate::foundation::core::Bitmap;
use crate::session::config::StartConfig;

/// Envelope type tag shared by every message on the transfer channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Foreground → background: begin a session.
    Start,
    /// Foreground → background: cancel at the next checkpoint.
    Stop,
    /// Background → foreground: context is up and waiting for `start`.
    Ready,
    /// Background → foreground: throttled intermediate state.
    Progress,
    /// Background → foreground: final state of a completed session.
    Finished,
    /// Background → foreground: the session failed.
    Error,
}

impl MessageKind {
    /// Wire name of the kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Ready => "ready",
            Self::Progress => "progress",
            Self::Finished => "finished",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Control messages, foreground → background.
#[derive(Debug)]
pub enum Command {
    /// Begin a session with the given snapshot.
    Start(StartConfig),
    /// Stop the running session.
    Stop,
}

impl Command {
    /// Envelope tag of this command.
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Start(_) => MessageKind::Start,
            Self::Stop => MessageKind::Stop,
        }
    }
}

/// Payload of `progress` and `finished` events.
///
/// Owns its bitmap; receiving the event transfers the buffer to the receiver.
#[derive(Debug)]
pub struct ProgressPayload {
    /// Engine iteration at emission time.
    pub iteration: u64,
    /// Engine accuracy at emission time, in `[0, 1]`.
    pub accuracy: f32,
    /// Current best image.
    pub bitmap: Bitmap,
    /// Session iteration cap, echoed for progress display.
    pub max_iterations: u64,
    /// Session accuracy target, echoed for progress display.
    pub target_accuracy: f32,
}

/// Data messages, background → foreground.
#[derive(Debug)]
pub enum Event {
    /// The background context is ready for `start`.
    Ready,
    /// Intermediate state.
    Progress(ProgressPayload),
    /// Final state; always the last event of a completed session.
    Finished(ProgressPayload),
    /// Human-readable failure message; always the last event of a failed session.
    Error(String),
}

impl Event {
    /// Envelope tag of this event.
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Ready => MessageKind::Ready,
            Self::Progress(_) => MessageKind::Progress,
            Self::Finished(_) => MessageKind::Finished,
            Self::Error(_) => MessageKind::Error,
        }
    }

    /// `true` for events that end a session.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished(_) | Self::Error(_))
    }

    /// Borrow the progress payload, if any.
    pub fn payload(&self) -> Option<&ProgressPayload> {
        match self {
            Self::Progress(p) | Self::Finished(p) => Some(p),
            Self::Ready | Self::Error(_) => None,
        }
    }
}
