use std::sync::Once;
use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;
use relay_core::{
    update, AdmitError, AdmitResult, CommandKind, ControlOp, Effect, Engine, EngineConfig, Event,
    GapReason, Msg, NodeView,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(relay_logging::initialize_for_tests);
}

fn deliver(engine: &mut Engine, event: Event) -> AdmitResult {
    engine.admit(event).expect("well-formed event").result
}

fn turn_events() -> Vec<Event> {
    vec![
        Event::control(1, ControlOp::UserMessage, "u1").with_payload("list files"),
        Event::text(2, "m1", "Hel"),
        Event::text(3, "m1", "lo").complete(),
        Event::command(4, CommandKind::Console, "c1", "ls").complete(),
        Event::text(5, "m2", "done").complete(),
    ]
}

fn permutations(items: Vec<Event>) -> Vec<Vec<Event>> {
    if items.len() <= 1 {
        return vec![items];
    }
    let mut out = Vec::new();
    for index in 0..items.len() {
        let mut rest = items.clone();
        let head = rest.remove(index);
        for mut tail in permutations(rest) {
            tail.insert(0, head.clone());
            out.push(tail);
        }
    }
    out
}

fn node_ids(nodes: &[NodeView]) -> Vec<&str> {
    nodes.iter().map(|n| n.message_id.as_str()).collect()
}

#[test]
fn every_delivery_order_builds_the_same_document() {
    init_logging();
    let mut reference = Engine::default();
    for event in turn_events() {
        deliver(&mut reference, event);
    }
    let expected = reference.view();
    assert_eq!(node_ids(&expected.nodes), vec!["u1", "m1", "c1", "m2"]);
    assert_eq!(expected.nodes[1].content, "Hello");

    for order in permutations(turn_events()) {
        let mut engine = Engine::default();
        for event in order {
            deliver(&mut engine, event);
        }
        assert_eq!(engine.view(), expected);
        assert_eq!(engine.document(), reference.document());
        assert_eq!(engine.next_expected(), 6);
    }
}

#[test]
fn early_event_waits_for_the_gap() {
    init_logging();
    let mut engine = Engine::default();
    engine.switch_to(7);
    assert_eq!(engine.next_expected(), 1);

    let result = deliver(&mut engine, Event::text(2, "m1", "lo"));
    assert_eq!(result, AdmitResult::Buffered);
    assert!(engine.document().is_empty());
    assert_eq!(engine.buffered_len(), 1);

    let result = deliver(&mut engine, Event::text(1, "m1", "Hel"));
    assert_eq!(result, AdmitResult::Applied);
    assert_eq!(engine.document().node("m1").unwrap().content(), "Hello");
    assert_eq!(engine.next_expected(), 3);
    assert_eq!(engine.buffered_len(), 0);
}

#[test]
fn closing_a_gap_drains_all_consecutive_events() {
    init_logging();
    let mut engine = Engine::default();
    assert_eq!(deliver(&mut engine, Event::text(1, "m1", "a")), AdmitResult::Applied);
    assert_eq!(deliver(&mut engine, Event::text(3, "m1", "c")), AdmitResult::Buffered);
    assert_eq!(deliver(&mut engine, Event::text(4, "m1", "d")), AdmitResult::Buffered);
    assert_eq!(engine.next_expected(), 2);

    assert_eq!(deliver(&mut engine, Event::text(2, "m1", "b")), AdmitResult::Applied);
    assert_eq!(engine.next_expected(), 5);
    assert_eq!(engine.buffered_len(), 0);
    assert_eq!(engine.document().node("m1").unwrap().content(), "abcd");
}

#[test]
fn drain_stops_at_the_next_gap() {
    init_logging();
    let mut engine = Engine::default();
    for event in [
        Event::text(1, "m1", "a"),
        Event::text(3, "m1", "c"),
        Event::text(2, "m1", "b"),
    ] {
        deliver(&mut engine, event);
    }
    assert_eq!(engine.next_expected(), 4);

    deliver(&mut engine, Event::text(6, "m1", "f"));
    deliver(&mut engine, Event::text(4, "m1", "d"));
    assert_eq!(engine.next_expected(), 5);
    assert_eq!(engine.buffered_len(), 1);
    assert_eq!(engine.document().node("m1").unwrap().content(), "abcd");
}

#[test]
fn stale_and_duplicate_events_never_touch_the_document() {
    init_logging();
    let mut engine = Engine::default();
    for event in turn_events() {
        deliver(&mut engine, event);
    }
    let before = engine.clone();

    let result = deliver(&mut engine, Event::text(2, "m1", "XYZ"));
    assert_eq!(result, AdmitResult::Dropped);
    let result = deliver(&mut engine, Event::text(3, "m1", "lo").complete());
    assert_eq!(result, AdmitResult::Dropped);

    assert_eq!(engine, before);
}

#[test]
fn repeated_early_delivery_keeps_the_first_copy() {
    init_logging();
    let mut engine = Engine::default();
    assert_eq!(deliver(&mut engine, Event::text(2, "m1", "first")), AdmitResult::Buffered);
    assert_eq!(deliver(&mut engine, Event::text(2, "m1", "second")), AdmitResult::Buffered);
    deliver(&mut engine, Event::text(1, "m1", ">"));
    assert_eq!(engine.document().node("m1").unwrap().content(), ">first");
}

#[test]
fn clear_conversation_bypasses_the_gap_and_resets_the_cursor() {
    init_logging();
    let mut engine = Engine::default();
    deliver(&mut engine, Event::text(1, "m1", "old").complete());
    assert_eq!(deliver(&mut engine, Event::text(5, "m9", "stale")), AdmitResult::Buffered);
    assert_eq!(deliver(&mut engine, Event::text(12, "m2", "new")), AdmitResult::Buffered);

    let result = deliver(
        &mut engine,
        Event::control(10, ControlOp::ClearConversation, ""),
    );
    assert_eq!(result, AdmitResult::Applied);
    assert!(engine.document().is_empty());
    assert_eq!(engine.next_expected(), 11);
    // Anything buffered below the new baseline is gone; later events survive.
    assert_eq!(engine.buffered_len(), 1);

    deliver(&mut engine, Event::text(11, "m2", "brand "));
    assert_eq!(engine.next_expected(), 13);
    assert_eq!(engine.document().node("m2").unwrap().content(), "brand new");
    assert!(engine.document().node("m9").is_none());
}

#[test]
fn start_recreation_bypasses_ordering_even_when_behind_the_cursor() {
    init_logging();
    let mut engine = Engine::default();
    for seq in 1..=5 {
        deliver(&mut engine, Event::text(seq, "m1", "x"));
    }
    let result = deliver(&mut engine, Event::control(1, ControlOp::StartRecreation, ""));
    assert_eq!(result, AdmitResult::Applied);
    assert_eq!(engine.next_expected(), 2);
}

#[test]
fn full_buffer_refuses_events_and_requests_resync() {
    init_logging();
    let mut engine = Engine::new(EngineConfig {
        max_buffered: 2,
        ..EngineConfig::default()
    });
    engine.switch_to(3);
    assert_eq!(deliver(&mut engine, Event::text(3, "m1", "c")), AdmitResult::Buffered);
    assert_eq!(deliver(&mut engine, Event::text(4, "m1", "d")), AdmitResult::Buffered);

    let admission = engine.admit(Event::text(5, "m1", "e")).unwrap();
    assert_eq!(admission.result, AdmitResult::Dropped);
    assert_eq!(
        admission.effects,
        vec![Effect::ResyncRequested {
            conversation_id: Some(3),
            reason: GapReason::Capacity {
                limit: 2,
                waiting_for: 1,
            },
        }]
    );
    assert_eq!(engine.buffered_len(), 2);
    // A copy of something already held is not an overflow.
    assert_eq!(deliver(&mut engine, Event::text(4, "m1", "d")), AdmitResult::Buffered);
}

#[test]
fn stalled_gap_is_reported_once() {
    init_logging();
    let config = EngineConfig {
        stall_timeout_ms: 1_000,
        ..EngineConfig::default()
    };
    let t0 = Instant::now();
    let engine = Engine::new(config);
    let (engine, _) = update(engine, Msg::SwitchConversation(1));
    let (engine, _) = update(engine, Msg::Inbound(Event::text(3, "m1", "late")));

    let (engine, effects) = update(engine, Msg::Tick(t0));
    assert!(effects.is_empty());
    let (engine, effects) = update(engine, Msg::Tick(t0 + Duration::from_millis(500)));
    assert!(effects.is_empty());
    let (engine, effects) = update(engine, Msg::Tick(t0 + Duration::from_millis(1_000)));
    assert_eq!(
        effects,
        vec![Effect::ResyncRequested {
            conversation_id: Some(1),
            reason: GapReason::Stalled {
                waiting_for: 1,
                buffered: 1,
            },
        }]
    );
    let (engine, effects) = update(engine, Msg::Tick(t0 + Duration::from_secs(2)));
    assert!(effects.is_empty());

    let (engine, _) = update(engine, Msg::Inbound(Event::text(1, "m1", "a")));
    let (engine, _) = update(engine, Msg::Inbound(Event::text(2, "m1", "b")));
    assert_eq!(engine.buffered_len(), 0);
    let (_, effects) = update(engine, Msg::Tick(t0 + Duration::from_secs(30)));
    assert!(effects.is_empty());
}

#[test]
fn progress_restarts_the_stall_clock() {
    init_logging();
    let t0 = Instant::now();
    let mut engine = Engine::new(EngineConfig {
        stall_timeout_ms: 1_000,
        ..EngineConfig::default()
    });
    deliver(&mut engine, Event::text(3, "m1", "c"));
    assert!(engine.check_stall(t0).is_empty());

    deliver(&mut engine, Event::text(5, "m1", "e"));
    deliver(&mut engine, Event::text(1, "m1", "a"));
    deliver(&mut engine, Event::text(2, "m1", "b"));
    assert_eq!(engine.buffered_len(), 1);
    // Progress since the last check restarts the watch.
    assert!(engine.check_stall(t0 + Duration::from_millis(900)).is_empty());
    assert!(engine.check_stall(t0 + Duration::from_millis(1_500)).is_empty());
    assert_eq!(engine.check_stall(t0 + Duration::from_millis(1_900)).len(), 1);
}

#[test]
fn malformed_events_are_rejected_without_touching_the_buffer() {
    init_logging();
    let engine = Engine::default();
    let (engine, effects) = update(
        engine,
        Msg::Inbound(Event::command(1, CommandKind::EditFile, "e1", "x <- 1")),
    );
    assert_eq!(
        effects,
        vec![Effect::EventRejected {
            error: AdmitError::MissingFilename {
                sequence: 1,
                message_id: "e1".to_string(),
            },
        }]
    );
    assert_eq!(engine.next_expected(), 1);

    let mut engine = engine;
    let error = engine.admit(Event::text(4, "  ", "hi")).unwrap_err();
    assert_eq!(error.sequence(), 4);
    assert!(matches!(error, AdmitError::MissingMessageId { .. }));
    assert_eq!(engine.buffered_len(), 0);
    assert!(engine.document().is_empty());
}

#[test]
fn top_of_the_sequence_space_is_refused_without_moving_the_cursor() {
    init_logging();
    let mut engine = Engine::default();
    let result = deliver(
        &mut engine,
        Event::control(u64::MAX - 1, ControlOp::ClearConversation, ""),
    );
    assert_eq!(result, AdmitResult::Applied);
    assert_eq!(engine.next_expected(), u64::MAX);

    let (engine, effects) = update(engine, Msg::Inbound(Event::text(u64::MAX, "m1", "x")));
    assert_eq!(
        effects,
        vec![Effect::EventRejected {
            error: AdmitError::SequenceExhausted { sequence: u64::MAX },
        }]
    );
    assert_eq!(engine.next_expected(), u64::MAX);
    assert!(engine.document().is_empty());
}
