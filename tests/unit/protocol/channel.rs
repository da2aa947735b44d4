use super::*;
use crate::foundation::core::Bitmap;
use crate::protocol::message::{MessageKind, ProgressPayload};

fn payload(iteration: u64) -> ProgressPayload {
    ProgressPayload {
        iteration,
        accuracy: 0.5,
        bitmap: Bitmap::from_rgba(1, 1, vec![1, 2, 3, 255]).unwrap(),
        max_iterations: 100,
        target_accuracy: 0.9,
    }
}

#[test]
fn events_arrive_in_send_order() {
    let (fg, bg) = transfer_channel();
    bg.emit(Event::Ready).unwrap();
    bg.emit(Event::Progress(payload(1))).unwrap();
    bg.emit(Event::Finished(payload(2))).unwrap();

    let kinds: Vec<MessageKind> = std::iter::from_fn(|| fg.try_recv().unwrap())
        .map(|e| e.kind())
        .collect();
    assert_eq!(
        kinds,
        vec![MessageKind::Ready, MessageKind::Progress, MessageKind::Finished]
    );
    assert!(fg.try_recv().unwrap().is_none());
}

#[test]
fn bitmap_buffer_moves_across_the_channel() {
    let (fg, bg) = transfer_channel();
    let p = payload(1);
    let before = p.bitmap.as_bytes().as_ptr();
    bg.emit(Event::Progress(p)).unwrap();

    let Some(Event::Progress(got)) = fg.try_recv().unwrap() else {
        panic!("expected progress");
    };
    assert_eq!(got.bitmap.as_bytes().as_ptr(), before);
}

#[test]
fn control_polling_reports_idle_command_and_disconnect() {
    let (fg, bg) = transfer_channel();
    assert!(matches!(bg.poll_control(), Control::Idle));

    fg.send(Command::Stop).unwrap();
    assert!(matches!(bg.poll_control(), Control::Command(Command::Stop)));

    drop(fg);
    assert!(matches!(bg.poll_control(), Control::Disconnected));
    assert!(matches!(bg.wait_control(), Control::Disconnected));
}

#[test]
fn foreground_sees_channel_error_after_background_drops() {
    let (fg, bg) = transfer_channel();
    bg.emit(Event::Error("boom".to_owned())).unwrap();
    drop(bg);

    // Queued events are still delivered first.
    assert!(matches!(fg.try_recv().unwrap(), Some(Event::Error(_))));
    let err = fg.try_recv().unwrap_err();
    assert!(err.to_string().starts_with("channel error:"));
    assert!(fg.send(Command::Stop).is_err());
}

#[test]
fn emit_fails_once_foreground_is_gone() {
    let (fg, bg) = transfer_channel();
    drop(fg);
    let err = bg.emit(Event::Ready).unwrap_err();
    assert!(err.to_string().contains("'ready'"));
}

#[test]
fn message_kinds_use_wire_names() {
    assert_eq!(Command::Stop.kind().as_str(), "stop");
    assert_eq!(
        serde_json::to_string(&MessageKind::Finished).unwrap(),
        "\"finished\""
    );
    let ev = Event::Finished(payload(3));
    assert!(ev.is_terminal());
    assert_eq!(ev.payload().map(|p| p.iteration), Some(3));
    assert!(!Event::Ready.is_terminal());
    assert!(Event::Error("x".into()).payload().is_none());
}
