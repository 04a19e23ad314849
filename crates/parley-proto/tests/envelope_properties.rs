//! Property-based tests for the envelope codec.
//!
//! The channel receives text from an untrusted peer. Decoding must never
//! panic, and every failure must surface as a typed [`ProtocolError`] so the
//! client can log and drop the frame.

use parley_proto::{
    Envelope, EventName, InboundEvent, Message, OutboundEvent, ProtocolError, SendMessagePayload,
};
use proptest::prelude::*;

fn message_strategy() -> impl Strategy<Value = Message> {
    ("[a-z0-9]{1,8}", "[a-z0-9]{1,4}", "[a-z]{1,4}", ".{0,40}", any::<u64>()).prop_map(
        |(id, conversation, sender, text, sent_at)| Message {
            id: id.into(),
            conversation_id: conversation.into(),
            sender_id: sender.into(),
            text,
            sent_at,
            client_id: None,
        },
    )
}

proptest! {
    #[test]
    fn prop_decode_arbitrary_text_never_panics(text in ".{0,200}") {
        let _ = Envelope::decode(&text);
    }

    #[test]
    fn prop_arbitrary_event_names_fail_typed(name in "[a-zA-Z]{1,20}") {
        let envelope = Envelope { event: name.clone(), payload: serde_json::Value::Null };
        let result = InboundEvent::from_envelope(&envelope);

        match name.parse::<EventName>() {
            Ok(_) => prop_assert!(
                !matches!(result, Err(ProtocolError::UnknownEvent(_))),
                "known name {} reported as unknown", name
            ),
            Err(_) => prop_assert!(matches!(result, Err(ProtocolError::UnknownEvent(_)))),
        }
    }

    #[test]
    fn prop_message_survives_the_wire(message in message_strategy()) {
        let text = InboundEvent::Message(message.clone()).to_envelope().unwrap().encode().unwrap();
        let decoded = InboundEvent::from_envelope(&Envelope::decode(&text).unwrap()).unwrap();

        prop_assert_eq!(decoded, InboundEvent::Message(message));
    }
}

#[test]
fn send_message_carries_client_id() {
    let event = OutboundEvent::SendMessage(SendMessagePayload {
        conversation_id: "1".into(),
        sender_id: "me".into(),
        text: "yo".into(),
        client_id: "local-1".into(),
    });

    let envelope = event.to_envelope().unwrap();
    assert_eq!(envelope.payload["clientId"], "local-1");
    assert_eq!(envelope.payload["senderId"], "me");
    assert_eq!(OutboundEvent::from_envelope(&envelope).unwrap(), event);
}
