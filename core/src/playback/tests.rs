use std::time::{Duration, Instant};

use super::*;
use crate::animator::SeekBarAnimator;
use crate::bridge::{Generation, MemoryHost, PageOptions};
use crate::link;

fn controller() -> (PlaybackController<MemoryHost>, MemoryHost) {
    let host = MemoryHost::new();
    let bridge = PlayerBridge::new(host.clone(), PageOptions::default());
    (PlaybackController::new(bridge, Duration::from_secs(15)), host)
}

fn video(id: &str) -> VideoId {
    VideoId::new(id).unwrap()
}

fn current(host: &MemoryHost) -> Generation {
    host.current().expect("a page should be mounted")
}

#[test]
fn test_load_starts_from_a_fresh_snapshot() {
    let (mut controller, host) = controller();
    controller.load(video("aaa")).unwrap();

    host.emit(current(&host), &BridgeMessage::PlayerReady);
    host.emit(current(&host), &BridgeMessage::Duration(300.0));
    host.emit(current(&host), &BridgeMessage::CurrentTime(42.0));
    host.emit(current(&host), &BridgeMessage::StateChange(PlaybackState::Playing));
    assert_eq!(controller.pump(), 4);
    assert!(controller.is_playing());

    controller.load(video("bbb")).unwrap();

    let snapshot = controller.snapshot().unwrap();
    assert_eq!(snapshot, &PlaybackSnapshot::new(video("bbb")));
    assert_eq!(snapshot.state, PlaybackState::Unstarted);
    assert!(!controller.is_ready());
}

#[test]
fn test_state_follows_last_state_change_in_any_interleaving() {
    let states = [PlaybackState::Buffering, PlaybackState::Playing, PlaybackState::Paused];
    let others = [
        BridgeMessage::Duration(200.0),
        BridgeMessage::CurrentTime(10.0),
        BridgeMessage::CurrentTime(9.0),
        BridgeMessage::PlayerReady,
    ];

    // Slide the non-state messages into every position around the state changes
    for offset in 0..=states.len() {
        let mut sequence: Vec<BridgeMessage> =
            states.iter().map(|s| BridgeMessage::StateChange(*s)).collect();
        for (i, message) in others.iter().enumerate() {
            let at = (offset + i).min(sequence.len());
            sequence.insert(at, *message);
        }

        let (mut controller, _host) = controller();
        controller.load(video("abc")).unwrap();
        for message in sequence {
            controller.on_message(message);
        }

        assert_eq!(controller.snapshot().unwrap().state, PlaybackState::Paused);
    }
}

#[test]
fn test_current_time_is_last_write_wins_and_clamped() {
    let mut snapshot = PlaybackSnapshot::new(video("abc"));

    snapshot.apply(&BridgeMessage::CurrentTime(-3.0));
    assert_eq!(snapshot.current_time_secs, 0.0);

    // Duration unknown: time stays at zero
    snapshot.apply(&BridgeMessage::CurrentTime(150.0));
    assert_eq!(snapshot.current_time_secs, 0.0);
    assert_eq!(snapshot.progress_label(), "00:00 / 00:00");

    snapshot.apply(&BridgeMessage::Duration(120.0));
    assert_eq!(snapshot.current_time_secs, 0.0);

    snapshot.apply(&BridgeMessage::CurrentTime(31.0));
    snapshot.apply(&BridgeMessage::CurrentTime(30.0));
    assert_eq!(snapshot.current_time_secs, 30.0);

    snapshot.apply(&BridgeMessage::CurrentTime(500.0));
    assert_eq!(snapshot.current_time_secs, 120.0);
}

#[test]
fn test_tick_arriving_before_duration_is_held_at_zero() {
    let (mut controller, host) = controller();
    controller.load(video("abc")).unwrap();

    host.emit(current(&host), &BridgeMessage::CurrentTime(150.0));
    controller.pump();
    let snapshot = controller.snapshot().unwrap();
    assert_eq!(snapshot.current_time_secs, 0.0);
    assert_eq!(snapshot.progress_label(), "00:00 / 00:00");

    host.emit(current(&host), &BridgeMessage::Duration(200.0));
    host.emit(current(&host), &BridgeMessage::CurrentTime(151.0));
    controller.pump();
    assert_eq!(controller.snapshot().unwrap().progress_label(), "02:31 / 03:20");
}

#[test]
fn test_fraction_is_zero_without_duration() {
    let mut snapshot = PlaybackSnapshot::new(video("abc"));
    snapshot.apply(&BridgeMessage::CurrentTime(12.0));
    assert_eq!(snapshot.fraction(), 0.0);

    snapshot.apply(&BridgeMessage::Duration(48.0));
    assert_eq!(snapshot.fraction(), 0.25);
}

#[test]
fn test_state_codes_round_trip_through_try_from() {
    for state in [
        PlaybackState::Unstarted,
        PlaybackState::Ended,
        PlaybackState::Playing,
        PlaybackState::Paused,
        PlaybackState::Buffering,
        PlaybackState::Cued,
    ] {
        assert_eq!(PlaybackState::try_from(state.code()), Ok(state));
    }
    assert_eq!(PlaybackState::try_from(4), Err(BridgeError::UnknownState(4)));
}

#[test]
fn test_commands_are_dropped_until_ready() {
    let (mut controller, host) = controller();

    assert_eq!(
        controller.request_play(),
        Ok(CommandOutcome::Dropped(DropReason::NothingLoaded))
    );

    controller.load(video("abc")).unwrap();
    assert_eq!(
        controller.request_play(),
        Ok(CommandOutcome::Dropped(DropReason::NotReady))
    );
    assert!(host.injected().is_empty());

    host.emit(current(&host), &BridgeMessage::PlayerReady);
    controller.pump();

    assert_eq!(controller.request_play(), Ok(CommandOutcome::Sent(PlayerCommand::Play)));
    assert_eq!(host.injected(), vec![(current(&host), PlayerCommand::Play)]);
}

#[test]
fn test_requests_do_not_touch_local_state() {
    let (mut controller, host) = controller();
    controller.load(video("abc")).unwrap();
    host.emit(current(&host), &BridgeMessage::PlayerReady);
    controller.pump();

    controller.request_play().unwrap();
    controller.request_play().unwrap();
    assert!(!controller.is_playing());
    assert_eq!(controller.snapshot().unwrap().state, PlaybackState::Unstarted);

    host.emit(current(&host), &BridgeMessage::StateChange(PlaybackState::Playing));
    controller.pump();
    assert!(controller.is_playing());
}

#[test]
fn test_toggle_follows_reported_state() {
    let (mut controller, host) = controller();
    controller.load(video("abc")).unwrap();
    host.emit(current(&host), &BridgeMessage::PlayerReady);
    controller.pump();

    assert_eq!(controller.toggle(), Ok(CommandOutcome::Sent(PlayerCommand::Play)));

    host.emit(current(&host), &BridgeMessage::StateChange(PlaybackState::Playing));
    controller.pump();
    assert_eq!(controller.toggle(), Ok(CommandOutcome::Sent(PlayerCommand::Pause)));

    host.emit(current(&host), &BridgeMessage::StateChange(PlaybackState::Buffering));
    controller.pump();
    assert_eq!(controller.toggle(), Ok(CommandOutcome::Sent(PlayerCommand::Play)));
}

#[test]
fn test_messages_from_torn_down_page_are_ignored() {
    let (mut controller, host) = controller();
    controller.load(video("aaa")).unwrap();
    let old = current(&host);

    controller.load(video("bbb")).unwrap();
    host.emit(old, &BridgeMessage::PlayerReady);
    host.emit(old, &BridgeMessage::Duration(90.0));
    host.emit(old, &BridgeMessage::StateChange(PlaybackState::Playing));

    assert_eq!(controller.pump(), 0);
    assert_eq!(controller.snapshot().unwrap(), &PlaybackSnapshot::new(video("bbb")));
    assert!(!controller.is_ready());
}

#[test]
fn test_reload_remounts_same_video() {
    let (mut controller, host) = controller();
    assert_eq!(controller.reload(), Err(BridgeError::NotMounted));

    controller.load(video("abc")).unwrap();
    let first = current(&host);
    controller.reload().unwrap();

    assert_ne!(current(&host), first);
    assert_eq!(host.loads().len(), 2);
    assert_eq!(controller.snapshot().unwrap().video_id, video("abc"));
}

#[test]
fn test_failed_load_leaves_nothing_loaded() {
    let (mut controller, host) = controller();
    controller.load(video("aaa")).unwrap();

    host.fail_loads(true);
    assert!(controller.load(video("bbb")).is_err());

    assert!(controller.snapshot().is_none());
    assert_eq!(controller.load_phase(Instant::now()), LoadPhase::Idle);
    assert_eq!(host.current(), None);
}

#[test]
fn test_load_phase_reports_stall_after_timeout() {
    let (mut controller, host) = controller();
    assert_eq!(controller.load_phase(Instant::now()), LoadPhase::Idle);

    controller.load(video("abc")).unwrap();
    let now = Instant::now();
    assert_eq!(controller.load_phase(now), LoadPhase::Loading);
    assert_eq!(controller.load_phase(now + Duration::from_secs(16)), LoadPhase::Stalled);

    host.emit(current(&host), &BridgeMessage::PlayerReady);
    controller.pump();
    assert_eq!(controller.load_phase(now + Duration::from_secs(16)), LoadPhase::Ready);
}

#[test]
fn test_paste_link_to_progress_scenario() {
    let (mut controller, host) = controller();
    let mut animator = SeekBarAnimator::new(Duration::from_millis(50));

    let id = link::parse("https://youtu.be/watch?v=abc123").unwrap();
    assert_eq!(id.as_str(), "abc123");
    controller.load(id).unwrap();
    animator.reset();
    assert_eq!(host.loads().last().unwrap().video_id.as_str(), "abc123");

    host.emit(current(&host), &BridgeMessage::PlayerReady);
    host.emit(current(&host), &BridgeMessage::Duration(120.0));
    controller.pump();
    assert_eq!(controller.snapshot().unwrap().progress_label(), "00:00 / 02:00");

    host.emit(current(&host), &BridgeMessage::CurrentTime(30.0));
    controller.pump();
    let snapshot = controller.snapshot().unwrap();
    assert_eq!(snapshot.progress_label(), "00:30 / 02:00");

    let start = Instant::now();
    animator.track(Some(snapshot), start);
    assert_eq!(animator.value(start + Duration::from_millis(50)), 0.25);
}

#[test]
fn test_stop_unmounts_and_forgets_video() {
    let (mut controller, host) = controller();
    controller.load(video("abc")).unwrap();
    let generation = current(&host);
    host.emit(generation, &BridgeMessage::PlayerReady);
    controller.pump();

    controller.stop();
    assert_eq!(host.unloaded(), vec![generation]);
    assert_eq!(host.current(), None);
    assert!(controller.snapshot().is_none());
    assert_eq!(controller.load_phase(Instant::now()), LoadPhase::Idle);
    assert_eq!(
        controller.request_play().unwrap(),
        CommandOutcome::Dropped(DropReason::NothingLoaded)
    );
}
