//! End-to-end scenarios driven through the client's event interface.

use std::sync::{
    Arc,
    atomic::{AtomicU8, Ordering},
};

use parley_client::{
    Client, ClientAction, ClientConfig, ClientError, ClientEvent, Environment, MergePolicy,
};
use parley_core::{ChannelAction, Delivery, Scope};
use parley_proto::{
    Conversation, ConversationId, InboundEvent, Message, OutboundEvent, Participant,
    TypingPayload, UnreadCountPayload,
};

/// Deterministic environment: fixed clock, counter-based randomness.
#[derive(Clone, Default)]
struct FixedEnv(Arc<AtomicU8>);

impl Environment for FixedEnv {
    fn unix_millis(&self) -> u64 {
        1_700_000_000_000
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        buffer.fill(self.0.fetch_add(1, Ordering::Relaxed));
    }
}

fn message(id: &str, conversation: &str, sender: &str, text: &str) -> Message {
    Message {
        id: id.into(),
        conversation_id: conversation.into(),
        sender_id: sender.into(),
        text: text.into(),
        sent_at: 0,
        client_id: None,
    }
}

fn inbound(event: InboundEvent) -> ClientEvent {
    ClientEvent::EnvelopeReceived(event.to_envelope().unwrap())
}

fn conversation(id: &str, other: &str) -> Conversation {
    Conversation {
        id: id.into(),
        participant_ids: vec!["me".into(), other.into()],
        other_participant: Participant {
            id: other.into(),
            display_name: other.to_uppercase(),
            avatar_url: None,
        },
        last_message_preview: None,
        unread_count: 0,
    }
}

fn outbound(actions: &[ClientAction]) -> Vec<OutboundEvent> {
    actions
        .iter()
        .filter_map(|a| match a {
            ClientAction::Channel(ChannelAction::Send(envelope)) => {
                Some(OutboundEvent::from_envelope(envelope).unwrap())
            },
            _ => None,
        })
        .collect()
}

fn joined(config: ClientConfig, room: &str, history: Vec<Message>) -> Client<FixedEnv> {
    let mut client = Client::new(FixedEnv::default(), config).unwrap();
    client.handle(ClientEvent::Connect).unwrap();
    client.handle(ClientEvent::ChannelConnected).unwrap();

    let actions = client.handle(ClientEvent::Activate(room.into())).unwrap();
    let activation = actions
        .iter()
        .find_map(|a| match a {
            ClientAction::FetchHistory { activation, .. } => Some(*activation),
            _ => None,
        })
        .unwrap();
    client.handle(ClientEvent::HistoryLoaded { activation, messages: history }).unwrap();
    assert!(client.room().is_joined());
    client
}

#[test]
fn hello_hi_yo_echo_replaced_in_place() {
    let history = vec![message("1", "c1", "alice", "hello"), message("2", "c1", "bob", "hi")];
    let mut client = joined(ClientConfig::new("me"), "c1", history);

    let actions = client.handle(ClientEvent::SendMessage("yo".into())).unwrap();
    let sent = outbound(&actions);
    let OutboundEvent::SendMessage(payload) = &sent[0] else {
        panic!("expected sendMessage, got {sent:?}");
    };
    assert_eq!(payload.text, "yo");
    assert_eq!(client.timeline().len(), 3);
    assert_eq!(client.timeline().entries()[2].delivery, Delivery::Pending);

    client.handle(inbound(InboundEvent::Message(message("3", "c1", "me", "yo")))).unwrap();

    let ids: Vec<_> = client.timeline().messages().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
    assert_eq!(client.timeline().pending_len(), 0);
}

#[test]
fn correlated_policy_reconciles_repeated_text() {
    let config = ClientConfig::new("me").with_merge_policy(MergePolicy::Correlated);
    let mut client = joined(config, "c1", Vec::new());

    let mut client_ids = Vec::new();
    for _ in 0..2 {
        let actions = client.handle(ClientEvent::SendMessage("ok".into())).unwrap();
        if let Some(OutboundEvent::SendMessage(payload)) = outbound(&actions).into_iter().next() {
            client_ids.push(payload.client_id);
        }
    }
    assert_eq!(client.timeline().len(), 2);

    for (i, client_id) in client_ids.into_iter().enumerate() {
        let mut echo = message(&format!("s{i}"), "c1", "me", "ok");
        echo.client_id = Some(client_id);
        client.handle(inbound(InboundEvent::Message(echo))).unwrap();
    }

    assert_eq!(client.timeline().len(), 2);
    assert_eq!(client.timeline().pending_len(), 0);
}

#[test]
fn room_isolation_after_switch() {
    let mut client = joined(ClientConfig::new("me"), "c1", Vec::new());

    let actions = client.handle(ClientEvent::Activate("c2".into())).unwrap();
    assert_eq!(outbound(&actions), vec![OutboundEvent::LeaveRoom("c1".into())]);

    client.handle(inbound(InboundEvent::Message(message("9", "c1", "bob", "late")))).unwrap();
    client
        .handle(inbound(InboundEvent::Typing(TypingPayload {
            conversation_id: "c1".into(),
            participant_id: "bob".into(),
        })))
        .unwrap();

    assert!(client.timeline().is_empty());
    assert!(!client.typing().anyone_typing());
    assert!(client.channel().active_scopes().iter().all(|s| *s == Scope::Session));
}

#[test]
fn messages_for_other_rooms_update_preview_only() {
    let mut client = joined(ClientConfig::new("me"), "c1", Vec::new());
    let roster = vec![conversation("c1", "bob"), conversation("c2", "cy")];
    client.handle(ClientEvent::RosterLoaded(roster)).unwrap();

    client.handle(inbound(InboundEvent::Message(message("5", "c2", "cy", "ping")))).unwrap();

    assert!(client.timeline().is_empty());
    let list = client.conversations();
    assert_eq!(list.rows[1].last_message, "ping");
    assert_eq!(list.rows[0].last_message, "No messages yet");
    assert!(list.rows[0].is_active);
}

#[test]
fn unread_zero_on_read_even_if_ack_fails() {
    let mut client = Client::new(FixedEnv::default(), ClientConfig::new("me")).unwrap();
    client.handle(ClientEvent::Connect).unwrap();
    client.handle(ClientEvent::ChannelConnected).unwrap();
    client
        .handle(inbound(InboundEvent::UpdateUnreadCount(UnreadCountPayload {
            conversation_id: "c7".into(),
            unread_count: 4,
        })))
        .unwrap();
    assert_eq!(client.ledger().count(&ConversationId::from("c7")), 4);

    let actions = client.handle(ClientEvent::OpenConversation("c7".into())).unwrap();
    assert!(actions.iter().any(|a| matches!(a, ClientAction::PostMarkRead { .. })));
    assert!(actions.iter().any(|a| matches!(a, ClientAction::FetchHistory { .. })));
    assert_eq!(client.ledger().count(&ConversationId::from("c7")), 0);

    let actions = client
        .handle(ClientEvent::ReadAckFailed { conversation_id: "c7".into(), reason: "500".into() })
        .unwrap();
    assert!(matches!(actions[0], ClientAction::Report(ClientError::ReadAckFailed { .. })));
    assert_eq!(client.ledger().count(&ConversationId::from("c7")), 0);
}

#[test]
fn own_typing_echo_ignored() {
    let mut client = joined(ClientConfig::new("me"), "c1", Vec::new());

    client
        .handle(inbound(InboundEvent::Typing(TypingPayload {
            conversation_id: "c1".into(),
            participant_id: "me".into(),
        })))
        .unwrap();
    assert!(!client.view().is_typing());

    client
        .handle(inbound(InboundEvent::Typing(TypingPayload {
            conversation_id: "c1".into(),
            participant_id: "bob".into(),
        })))
        .unwrap();
    assert!(client.view().is_typing());
}

#[test]
fn invalid_roster_entries_reported_and_skipped() {
    let mut client = Client::new(FixedEnv::default(), ClientConfig::new("me")).unwrap();
    let mut stranger = conversation("c9", "x");
    stranger.participant_ids = vec!["x".into(), "y".into()];

    let actions = client
        .handle(ClientEvent::RosterLoaded(vec![conversation("c1", "bob"), stranger]))
        .unwrap();

    assert!(actions.iter().any(|a| matches!(
        a,
        ClientAction::Report(ClientError::InvalidConversation { conversation_id })
            if conversation_id.as_str() == "c9"
    )));
    assert_eq!(client.conversations().rows.len(), 1);
}

#[test]
fn unknown_events_dropped() {
    let mut client = joined(ClientConfig::new("me"), "c1", Vec::new());
    let envelope = parley_proto::Envelope::decode(r#"{"event":"presence","payload":{}}"#).unwrap();

    assert!(client.handle(ClientEvent::EnvelopeReceived(envelope)).unwrap().is_empty());
}
