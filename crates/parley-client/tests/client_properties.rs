//! Property-based tests for the client state machine.
//!
//! Arbitrary interleavings of screen mounts, fetch results and transport
//! changes must never leave handlers behind or join before seeding.

use parley_client::{Client, ClientAction, ClientConfig, ClientEvent, Environment};
use parley_core::{ChannelAction, RoomState, Scope};
use parley_proto::{EventName, OutboundEvent};
use proptest::prelude::*;

#[derive(Clone)]
struct FixedEnv;

impl Environment for FixedEnv {
    fn unix_millis(&self) -> u64 {
        0
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        buffer.fill(1);
    }
}

#[derive(Debug, Clone)]
enum Step {
    Activate(u8),
    Deactivate,
    HistoryLoaded(u64),
    HistoryFailed(u64),
    Connected,
    Disconnected,
    Send,
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => (0u8..3).prop_map(Step::Activate),
        2 => Just(Step::Deactivate),
        3 => (1u64..8).prop_map(Step::HistoryLoaded),
        1 => (1u64..8).prop_map(Step::HistoryFailed),
        1 => Just(Step::Connected),
        1 => Just(Step::Disconnected),
        1 => Just(Step::Send),
    ]
}

fn to_event(step: &Step) -> ClientEvent {
    match step {
        Step::Activate(room) => ClientEvent::Activate(format!("c{room}").into()),
        Step::Deactivate => ClientEvent::Deactivate,
        Step::HistoryLoaded(activation) => {
            ClientEvent::HistoryLoaded { activation: *activation, messages: Vec::new() }
        },
        Step::HistoryFailed(activation) => {
            ClientEvent::HistoryFailed { activation: *activation, reason: "down".into() }
        },
        Step::Connected => ClientEvent::ChannelConnected,
        Step::Disconnected => ClientEvent::ChannelDisconnected { reason: "lost".into() },
        Step::Send => ClientEvent::SendMessage("hi".into()),
    }
}

proptest! {
    #[test]
    fn prop_room_handlers_only_for_active_room(steps in prop::collection::vec(step_strategy(), 0..60)) {
        let mut client = Client::new(FixedEnv, ClientConfig::new("me")).unwrap();
        client.handle(ClientEvent::Connect).unwrap();

        for step in &steps {
            let _ = client.handle(to_event(step));

            let room_scopes: Vec<Scope> = client
                .channel()
                .active_scopes()
                .into_iter()
                .filter(|s| *s != Scope::Session)
                .collect();

            match client.room().state() {
                RoomState::Joined { activation, .. } => {
                    prop_assert_eq!(room_scopes, vec![Scope::Activation(*activation)]);
                    prop_assert_eq!(client.channel().handlers(EventName::Message).count(), 2);
                },
                _ => prop_assert!(room_scopes.is_empty()),
            }
        }
    }

    #[test]
    fn prop_no_join_before_seed(steps in prop::collection::vec(step_strategy(), 0..60)) {
        let mut client = Client::new(FixedEnv, ClientConfig::new("me")).unwrap();
        client.handle(ClientEvent::Connect).unwrap();

        for step in &steps {
            let seeded_before = match client.room().state() {
                RoomState::Joining { seeded, .. } => *seeded,
                RoomState::Joined { .. } => true,
                RoomState::Idle | RoomState::Leaving { .. } => false,
            };
            let is_history = matches!(step, Step::HistoryLoaded(_) | Step::HistoryFailed(_));

            let Ok(actions) = client.handle(to_event(step)) else { continue };

            for action in &actions {
                if let ClientAction::Channel(ChannelAction::Send(envelope)) = action
                    && let Ok(OutboundEvent::JoinRoom(_)) = OutboundEvent::from_envelope(envelope)
                {
                    prop_assert!(seeded_before || is_history);
                    prop_assert!(client.room().is_joined() || seeded_before);
                }
            }
        }
    }
}
