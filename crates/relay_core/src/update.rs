use crate::{Effect, Engine, Msg};

/// Pure update function: applies a message to the engine and returns any effects.
pub fn update(mut engine: Engine, msg: Msg) -> (Engine, Vec<Effect>) {
    let effects = match msg {
        Msg::Inbound(event) => match engine.admit(event) {
            Ok(admission) => admission.effects,
            Err(error) => vec![Effect::EventRejected { error }],
        },
        Msg::SwitchConversation(conversation_id) => {
            engine.switch_to(conversation_id);
            Vec::new()
        }
        Msg::InteractionResolved { message_id } => engine.complete(&message_id),
        Msg::HistoryLoaded {
            conversation_id,
            events,
        } => engine.load_history(conversation_id, events),
        Msg::CancelStreaming { message_id } => engine.preserve_partial(&message_id).effects,
        Msg::ClearMessages => {
            engine.clear_messages();
            Vec::new()
        }
        Msg::ConversationDeleted(conversation_id) => {
            engine.forget(conversation_id);
            Vec::new()
        }
        Msg::Tick(now) => engine.check_stall(now),
        Msg::NoOp => Vec::new(),
    };

    (engine, effects)
}
