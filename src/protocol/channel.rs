use std::sync::mpsc;

use crate::foundation::error::{TesseraError, TesseraResult};
use crate::protocol::message::{Command, Event};

/// Create a linked pair of endpoints.
///
/// Both directions are FIFO and lossless. Nothing is shared between the two ends except the
/// queues: every payload is moved, so a bitmap sent by the background end can only be touched by
/// whoever receives it.
pub fn transfer_channel() -> (ForegroundEnd, BackgroundEnd) {
    let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
    let (evt_tx, evt_rx) = mpsc::channel::<Event>();
    (
        ForegroundEnd {
            commands: cmd_tx,
            events: evt_rx,
        },
        BackgroundEnd {
            commands: cmd_rx,
            events: evt_tx,
        },
    )
}

/// Foreground side: sends control, receives data. Never blocks.
#[derive(Debug)]
pub struct ForegroundEnd {
    commands: mpsc::Sender<Command>,
    events: mpsc::Receiver<Event>,
}

impl ForegroundEnd {
    /// Queue a control message for the background context.
    pub fn send(&self, cmd: Command) -> TesseraResult<()> {
        let kind = cmd.kind();
        self.commands.send(cmd).map_err(|_| {
            TesseraError::channel(format!("background context gone, '{kind}' not delivered"))
        })
    }

    /// Take the next event if one has arrived.
    ///
    /// Returns `Ok(None)` when nothing is pending and a channel error once the background context
    /// has exited and every event it sent has been drained.
    pub fn try_recv(&self) -> TesseraResult<Option<Event>> {
        match self.events.try_recv() {
            Ok(ev) => Ok(Some(ev)),
            Err(mpsc::TryRecvError::Empty) => Ok(None),
            Err(mpsc::TryRecvError::Disconnected) => Err(TesseraError::channel(
                "background context closed the channel without a terminal event",
            )),
        }
    }
}

/// Result of looking for a control message.
#[derive(Debug)]
pub enum Control {
    /// A command arrived.
    Command(Command),
    /// Nothing queued right now.
    Idle,
    /// The foreground end was dropped.
    Disconnected,
}

/// Background side: receives control, sends data.
#[derive(Debug)]
pub struct BackgroundEnd {
    commands: mpsc::Receiver<Command>,
    events: mpsc::Sender<Event>,
}

impl BackgroundEnd {
    /// Send an event, moving its payload to the foreground.
    pub fn emit(&self, ev: Event) -> TesseraResult<()> {
        let kind = ev.kind();
        self.events
            .send(ev)
            .map_err(|_| TesseraError::channel(format!("foreground gone, '{kind}' not delivered")))
    }

    /// Non-blocking check for a queued control message.
    pub fn poll_control(&self) -> Control {
        match self.commands.try_recv() {
            Ok(cmd) => Control::Command(cmd),
            Err(mpsc::TryRecvError::Empty) => Control::Idle,
            Err(mpsc::TryRecvError::Disconnected) => Control::Disconnected,
        }
    }

    /// Block until a control message arrives. Only used before a session starts.
    pub fn wait_control(&self) -> Control {
        match self.commands.recv() {
            Ok(cmd) => Control::Command(cmd),
            Err(mpsc::RecvError) => Control::Disconnected,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/protocol/channel.rs"]
mod tests;
