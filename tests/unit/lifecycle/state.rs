use super::*;

#[test]
fn happy_path_transitions_are_legal() {
    let s = RunState::Idle
        .transition(RunState::Ready)
        .and_then(|s| s.transition(RunState::Running))
        .and_then(|s| s.transition(RunState::Finished))
        .and_then(|s| s.transition(RunState::Ready))
        .unwrap();
    assert_eq!(s, RunState::Ready);
}

#[test]
fn every_terminal_state_returns_to_ready() {
    for t in [RunState::Stopping, RunState::Finished, RunState::Errored] {
        assert!(t.is_terminal());
        assert!(RunState::Running.can_transition_to(t));
        assert!(t.can_transition_to(RunState::Ready));
        assert!(!t.can_transition_to(RunState::Running));
    }
}

#[test]
fn illegal_transitions_are_state_errors() {
    let err = RunState::Idle.transition(RunState::Running).unwrap_err();
    assert_eq!(err.to_string(), "state error: illegal transition idle -> running");
    assert!(RunState::Running.transition(RunState::Ready).is_err());
    assert!(RunState::Running.transition(RunState::Running).is_err());
    assert!(RunState::Ready.transition(RunState::Finished).is_err());
}

#[test]
fn serializes_as_snake_case() {
    assert_eq!(
        serde_json::to_string(&RunState::Errored).unwrap(),
        "\"errored\""
    );
}
