use std::sync::Once;

use relay_core::{
    update, CommandKind, ControlOp, Effect, Engine, Event, InteractionSerializer, Msg,
    PendingInteraction, WidgetState,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(relay_logging::initialize_for_tests);
}

fn feed(engine: Engine, events: Vec<Event>) -> (Engine, Vec<Effect>) {
    let mut all = Vec::new();
    let mut engine = engine;
    for event in events {
        let (next, effects) = update(engine, Msg::Inbound(event));
        engine = next;
        all.extend(effects);
    }
    (engine, all)
}

fn resolve(engine: Engine, message_id: &str) -> (Engine, Vec<Effect>) {
    update(
        engine,
        Msg::InteractionResolved {
            message_id: message_id.to_string(),
        },
    )
}

fn activated(message_id: &str, kind: CommandKind) -> Effect {
    Effect::InteractionActivated {
        message_id: message_id.to_string(),
        kind,
    }
}

fn widget(engine: &Engine, message_id: &str) -> Option<WidgetState> {
    engine.document().node(message_id)?.widget_state()
}

#[test]
fn proposals_activate_one_at_a_time_in_order() {
    init_logging();
    let (engine, effects) = feed(
        Engine::default(),
        vec![
            Event::command(1, CommandKind::Console, "A", "library("),
            Event::command(2, CommandKind::Console, "A", "dplyr)").complete(),
        ],
    );
    assert_eq!(effects, vec![activated("A", CommandKind::Console)]);

    let (engine, effects) = feed(
        engine,
        vec![
            Event::command(3, CommandKind::Terminal, "B", "git status").complete(),
            Event::command(4, CommandKind::Console, "C", "plot(x)").complete(),
        ],
    );
    assert!(effects.is_empty());
    assert_eq!(widget(&engine, "A"), Some(WidgetState::Active));
    assert_eq!(widget(&engine, "B"), Some(WidgetState::Queued));
    assert_eq!(widget(&engine, "C"), Some(WidgetState::Queued));
    let actionable: Vec<_> = engine
        .view()
        .nodes
        .into_iter()
        .filter(|n| n.is_actionable())
        .map(|n| n.message_id)
        .collect();
    assert_eq!(actionable, vec!["A".to_string()]);

    // Decisions on anything but the active head are stale callbacks.
    let (engine, effects) = resolve(engine, "B");
    assert!(effects.is_empty());
    assert_eq!(widget(&engine, "B"), Some(WidgetState::Queued));

    let (engine, effects) = resolve(engine, "A");
    assert_eq!(effects, vec![activated("B", CommandKind::Terminal)]);
    assert_eq!(widget(&engine, "A"), Some(WidgetState::Resolved));
    assert_eq!(widget(&engine, "B"), Some(WidgetState::Active));

    let (engine, effects) = resolve(engine, "B");
    assert_eq!(effects, vec![activated("C", CommandKind::Console)]);

    let (engine, effects) = resolve(engine, "C");
    assert!(effects.is_empty());
    assert!(engine.coordinator().live().serializer().is_empty());
}

#[test]
fn a_later_proposal_that_finishes_first_still_waits() {
    init_logging();
    let (engine, effects) = feed(
        Engine::default(),
        vec![
            Event::command(1, CommandKind::Console, "A", "read.csv("),
            Event::command(2, CommandKind::Console, "B", "nrow(df)").complete(),
        ],
    );
    assert!(effects.is_empty());
    assert_eq!(widget(&engine, "B"), Some(WidgetState::Queued));

    let (engine, effects) = feed(
        engine,
        vec![Event::command(3, CommandKind::Console, "A", "'data.csv')").complete()],
    );
    assert_eq!(effects, vec![activated("A", CommandKind::Console)]);

    let (_, effects) = resolve(engine, "A");
    assert_eq!(effects, vec![activated("B", CommandKind::Console)]);
}

#[test]
fn cancelled_proposals_never_become_active() {
    init_logging();
    let (engine, effects) = feed(
        Engine::default(),
        vec![
            Event::command(1, CommandKind::Terminal, "A", "make"),
            Event::command(2, CommandKind::Terminal, "B", "make test").complete(),
            Event::command(3, CommandKind::Terminal, "A", "").cancelled(),
        ],
    );
    assert_eq!(effects, vec![activated("B", CommandKind::Terminal)]);
    assert_eq!(widget(&engine, "A"), Some(WidgetState::Cancelled));
    assert_eq!(engine.document().node("A").unwrap().content(), "make");

    let (engine, effects) = feed(
        engine,
        vec![
            Event::command(4, CommandKind::Terminal, "C", "rm -rf build"),
            Event::command(5, CommandKind::Terminal, "C", "").cancelled(),
        ],
    );
    assert!(effects.is_empty());
    let (engine, effects) = resolve(engine, "B");
    assert!(effects.is_empty());
    assert!(engine.coordinator().live().serializer().is_empty());
}

#[test]
fn restored_decisions_are_not_offered_again() {
    init_logging();
    let (engine, effects) = feed(
        Engine::default(),
        vec![
            Event::command(1, CommandKind::Console, "c1", "install.packages('x')").complete(),
            Event::command(2, CommandKind::Console, "c2", "library(x)").complete(),
            Event::control(3, ControlOp::MarkResolved, "c1"),
        ],
    );
    assert_eq!(
        effects,
        vec![
            activated("c1", CommandKind::Console),
            activated("c2", CommandKind::Console),
        ]
    );
    assert_eq!(widget(&engine, "c1"), Some(WidgetState::Resolved));
    assert_eq!(widget(&engine, "c2"), Some(WidgetState::Active));

    let (engine, _) = feed(engine, vec![Event::control(4, ControlOp::MarkResolved, "c2")]);
    assert_eq!(widget(&engine, "c2"), Some(WidgetState::Resolved));
    assert!(engine.coordinator().live().serializer().active().is_none());

    // Unknown widgets are ignored.
    let (engine, effects) = feed(engine, vec![Event::control(5, ControlOp::MarkResolved, "zz")]);
    assert!(effects.is_empty());
    assert_eq!(engine.next_expected(), 6);
}

#[test]
fn serializer_keeps_the_active_head_in_place() {
    let mut serializer = InteractionSerializer::new();
    let mut late = PendingInteraction::new("late", CommandKind::Console, 10);
    late.ready = true;
    serializer.enqueue(late);
    assert_eq!(serializer.release().map(|p| p.message_id.clone()), Some("late".to_string()));

    serializer.enqueue(PendingInteraction::new("early", CommandKind::Console, 3));
    serializer.enqueue(PendingInteraction::new("mid", CommandKind::Console, 5));
    serializer.enqueue(PendingInteraction::new("mid", CommandKind::Console, 5));
    let ids: Vec<_> = serializer.pending().map(|p| p.message_id.as_str()).collect();
    assert_eq!(ids, vec!["late", "early", "mid"]);

    assert!(serializer.release().is_none());
    assert!(serializer.complete("late"));
    // "early" is not ready yet, so nothing activates.
    assert!(serializer.release().is_none());
    assert!(serializer.mark_ready("early"));
    assert_eq!(
        serializer.release().map(|p| p.message_id.clone()),
        Some("early".to_string())
    );
    assert!(!serializer.complete("mid"));
}

#[test]
fn stopping_the_head_edit_releases_the_next_proposal() {
    init_logging();
    let (engine, effects) = feed(
        Engine::default(),
        vec![
            Event::command(1, CommandKind::EditFile, "e1", "x <- 1").with_filename("a.R"),
            Event::command(2, CommandKind::Console, "c2", "print(1)").complete(),
        ],
    );
    assert!(effects.is_empty());
    assert_eq!(widget(&engine, "c2"), Some(WidgetState::Queued));

    let (engine, effects) = update(
        engine,
        Msg::CancelStreaming {
            message_id: "e1".to_string(),
        },
    );
    assert_eq!(effects, vec![activated("c2", CommandKind::Console)]);
    assert_eq!(widget(&engine, "e1"), Some(WidgetState::Cancelled));
    assert_eq!(widget(&engine, "c2"), Some(WidgetState::Active));

    let (engine, effects) = resolve(engine, "c2");
    assert!(effects.is_empty());
    assert_eq!(widget(&engine, "c2"), Some(WidgetState::Resolved));
    assert!(engine.coordinator().live().serializer().is_empty());
}

#[test]
fn a_cancelled_head_stream_releases_the_next_proposal() {
    init_logging();
    let (engine, effects) = feed(
        Engine::default(),
        vec![
            Event::command(1, CommandKind::EditFile, "e1", "y <- 2").with_filename("b.R"),
            Event::command(2, CommandKind::Terminal, "t2", "make").complete(),
            Event::command(3, CommandKind::EditFile, "e1", "")
                .with_filename("b.R")
                .cancelled(),
        ],
    );
    assert_eq!(effects, vec![activated("t2", CommandKind::Terminal)]);
    assert_eq!(widget(&engine, "e1"), Some(WidgetState::Cancelled));
    assert_eq!(widget(&engine, "t2"), Some(WidgetState::Active));
}
