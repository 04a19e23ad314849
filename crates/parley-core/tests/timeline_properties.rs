//! Property-based tests for the timeline and ledger.
//!
//! Arbitrary interleavings of local sends, server deliveries and foreign
//! conversation traffic must preserve dedup, ordering and isolation.
//! Ordering holds whenever keys are distinct; a repeated local text under the
//! default policy is covered by the unit tests in `timeline.rs`.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use parley_core::{
    Delivery, MergeOutcome, MergePolicy, Timeline, UnreadLedger, env::Environment,
};
use parley_proto::{ConversationId, Message, MessageId};
use proptest::prelude::*;

#[derive(Clone, Default)]
struct StepEnv(Arc<AtomicU64>);

impl Environment for StepEnv {
    fn unix_millis(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        let n = self.0.fetch_add(1, Ordering::Relaxed).to_le_bytes();
        for (i, byte) in buffer.iter_mut().enumerate() {
            *byte = n[i % n.len()];
        }
    }
}

#[derive(Debug, Clone)]
enum Op {
    Local { text: u8 },
    Remote { text: u8, sender: u8, foreign: bool },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        2 => (0u8..4).prop_map(|text| Op::Local { text }),
        3 => (0u8..4, 0u8..3, proptest::bool::weighted(0.2))
            .prop_map(|(text, sender, foreign)| Op::Remote { text, sender, foreign }),
    ]
}

/// Interleaving with a distinct key per send. `Echo` confirms an earlier
/// local send, picked by index.
#[derive(Debug, Clone)]
enum Mixed {
    Local,
    Remote,
    Echo(u8),
}

fn mixed_strategy() -> impl Strategy<Value = Mixed> {
    prop_oneof![
        2 => Just(Mixed::Local),
        2 => Just(Mixed::Remote),
        1 => any::<u8>().prop_map(Mixed::Echo),
    ]
}

fn sender_name(sender: u8) -> &'static str {
    match sender {
        0 => "me",
        1 => "alice",
        _ => "bob",
    }
}

fn remote(id: usize, text: u8, sender: u8, foreign: bool) -> Message {
    Message {
        id: MessageId::new(format!("s{id}")),
        conversation_id: if foreign { "other".into() } else { "c1".into() },
        sender_id: sender_name(sender).into(),
        text: format!("t{text}"),
        sent_at: 10_000 - id as u64,
        client_id: None,
    }
}

fn run(policy: MergePolicy, ops: &[Op]) -> Timeline {
    let env = StepEnv::default();
    let mut timeline = Timeline::new(policy);
    timeline.seed(ConversationId::from("c1"), Vec::new());

    for (i, op) in ops.iter().enumerate() {
        match op {
            Op::Local { text } => {
                let _ = timeline.append_local(&env, format!("t{text}"), "me".into());
            },
            Op::Remote { text, sender, foreign } => {
                let _ = timeline.merge_remote(remote(i, *text, *sender, *foreign));
            },
        }
    }
    timeline
}

proptest! {
    #[test]
    fn prop_no_two_entries_share_text_and_sender(ops in prop::collection::vec(op_strategy(), 0..60)) {
        let timeline = run(MergePolicy::TextAndSender, &ops);
        let entries = timeline.entries();

        for (i, a) in entries.iter().enumerate() {
            for b in &entries[i + 1..] {
                prop_assert!(!a.message.same_text_and_sender(&b.message));
            }
        }
    }

    #[test]
    fn prop_foreign_messages_never_enter(ops in prop::collection::vec(op_strategy(), 0..60)) {
        for policy in [MergePolicy::TextAndSender, MergePolicy::Correlated] {
            let timeline = run(policy, &ops);
            prop_assert!(timeline.messages().all(|m| m.conversation_id.as_str() == "c1"));
        }
    }

    #[test]
    fn prop_remote_messages_keep_arrival_order(texts in prop::collection::vec(0u8..200, 0..40)) {
        // Unique texts with decreasing timestamps: order must follow arrival.
        let mut timeline = Timeline::new(MergePolicy::TextAndSender);
        timeline.seed("c1".into(), Vec::new());

        let mut expected = Vec::new();
        for (i, text) in texts.iter().enumerate() {
            let outcome = timeline.merge_remote(remote(i, *text, 1, false));
            if let MergeOutcome::Appended { .. } = outcome {
                expected.push(format!("t{text}"));
            }
        }

        let actual: Vec<_> = timeline.messages().map(|m| m.text.clone()).collect();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn prop_mixed_local_and_remote_keep_first_seen_order(
        ops in prop::collection::vec(mixed_strategy(), 0..60),
    ) {
        // Distinct keys: no local send collides, so nothing may move.
        for policy in [MergePolicy::TextAndSender, MergePolicy::Correlated] {
            let env = StepEnv::default();
            let mut timeline = Timeline::new(policy);
            timeline.seed("c1".into(), Vec::new());

            let mut first_seen: Vec<String> = Vec::new();
            let mut sent: Vec<Message> = Vec::new();
            let mut echoed: Vec<String> = Vec::new();
            for (i, op) in ops.iter().enumerate() {
                match op {
                    Mixed::Local => {
                        let text = format!("l{i}");
                        sent.push(timeline.append_local(&env, text.clone(), "me".into()).unwrap());
                        first_seen.push(text);
                    },
                    Mixed::Remote => {
                        let mut message = remote(i, 0, 1, false);
                        message.text = format!("r{i}");
                        let outcome = timeline.merge_remote(message.clone());
                        first_seen.push(message.text);
                        let index = first_seen.len() - 1;
                        prop_assert_eq!(outcome, MergeOutcome::Appended { index });
                    },
                    Mixed::Echo(pick) => {
                        if sent.is_empty() {
                            continue;
                        }
                        let local = &sent[usize::from(*pick) % sent.len()];
                        let echo = Message { id: MessageId::new(format!("e{i}")), ..local.clone() };
                        let index = first_seen.iter().position(|t| *t == local.text).unwrap();
                        prop_assert_eq!(timeline.merge_remote(echo), MergeOutcome::Replaced { index });
                        echoed.push(local.text.clone());
                    },
                }
            }

            let actual: Vec<_> = timeline.messages().map(|m| m.text.clone()).collect();
            prop_assert_eq!(&actual, &first_seen);
            for entry in timeline.entries() {
                let text = &entry.message.text;
                let confirmed = !text.starts_with('l') || echoed.contains(text);
                prop_assert_eq!(entry.delivery == Delivery::Confirmed, confirmed);
            }
        }
    }

    #[test]
    fn prop_echo_confirms_every_local_send(texts in prop::collection::vec(0u8..4, 1..20)) {
        let env = StepEnv::default();
        let mut timeline = Timeline::new(MergePolicy::Correlated);
        timeline.seed("c1".into(), Vec::new());

        let sent: Vec<Message> = texts
            .iter()
            .map(|t| timeline.append_local(&env, format!("t{t}"), "me".into()).unwrap())
            .collect();
        prop_assert_eq!(timeline.len(), sent.len());

        for (i, local) in sent.iter().enumerate() {
            let mut echo = local.clone();
            echo.id = MessageId::new(format!("server-{i}"));
            let outcome = timeline.merge_remote(echo);
            prop_assert_eq!(outcome, MergeOutcome::Replaced { index: i });
        }

        prop_assert_eq!(timeline.len(), sent.len());
        prop_assert!(timeline.entries().iter().all(|e| e.delivery == Delivery::Confirmed));
    }

    #[test]
    fn prop_mark_read_always_zeroes(
        counts in prop::collection::vec((0u8..5, 0u32..50), 0..30),
        target in 0u8..5,
    ) {
        let mut ledger = UnreadLedger::new();
        for (conversation, count) in counts {
            ledger.apply_count(ConversationId::new(format!("c{conversation}")), count);
        }

        let target = ConversationId::new(format!("c{target}"));
        ledger.mark_read(&target);
        ledger.acknowledge(&target, false);

        prop_assert_eq!(ledger.count(&target), 0);
    }
}

#[test]
fn concrete_scenario_replaces_echo_in_place() {
    let env = StepEnv::default();
    let mut timeline = Timeline::default();
    let history = vec![remote(0, 0, 1, false), remote(1, 1, 2, false)];
    timeline.seed("c1".into(), history);

    let local = timeline.append_local(&env, "t2".into(), "me".into()).unwrap();
    assert_eq!(timeline.len(), 3);
    assert_eq!(timeline.entries()[2].delivery, Delivery::Pending);

    let echo = Message { id: "server-yo".into(), client_id: None, ..local };
    assert_eq!(timeline.merge_remote(echo), MergeOutcome::Replaced { index: 2 });

    let ids: Vec<_> = timeline.messages().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["s0", "s1", "server-yo"]);
}
