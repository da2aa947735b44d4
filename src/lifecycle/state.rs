use std::fmt;

use crate::foundation::error::{TesseraError, TesseraResult};

/// Foreground view of the session lifecycle.
///
/// `Idle -> Ready -> Running -> {Stopping | Finished | Errored} -> Ready`. Loading another image
/// keeps the controller in `Ready`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// No image loaded.
    Idle,
    /// Image loaded, no session running.
    Ready,
    /// A background context owns a session.
    Running,
    /// The user stopped the session; teardown in progress.
    Stopping,
    /// The engine finished; teardown in progress.
    Finished,
    /// The session failed; teardown in progress.
    Errored,
}

impl RunState {
    /// `true` for the three states a running session can end in.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Stopping | Self::Finished | Self::Errored)
    }

    /// Whether `self -> next` is a legal transition.
    pub fn can_transition_to(self, next: Self) -> bool {
        use RunState::*;
        matches!(
            (self, next),
            (Idle, Ready)
                | (Ready, Ready)
                | (Ready, Running)
                | (Running, Stopping | Finished | Errored)
                | (Stopping | Finished | Errored, Ready)
        )
    }

    /// Checked transition.
    pub fn transition(self, next: Self) -> TesseraResult<Self> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TesseraError::state(format!(
                "illegal transition {self} -> {next}"
            )))
        }
    }

    /// Lower-case name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Ready => "ready",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Finished => "finished",
            Self::Errored => "errored",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/lifecycle/state.rs"]
mod tests;
