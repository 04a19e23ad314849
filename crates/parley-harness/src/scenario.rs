//! Seeded two-party conversation scenario.
//!
//! Starts one production [`Runtime`] per participant against a shared
//! [`SimServer`], lets `alice` open the conversation and send a seeded
//! sequence of messages while `bob` watches from the conversation list, then
//! has `bob` open the conversation. Every observable state the run settles in
//! is checked against [`InvariantRegistry::standard`].

use std::{sync::Arc, time::Duration};

use parley_app::{Runtime, RuntimeConfig, SessionError, SessionHandle};
use parley_client::{ClientConfig, ClientView};
use parley_core::{ChannelState, Delivery, MergePolicy, RoomState};
use parley_proto::{ConversationId, ParticipantId};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::{
    InvariantRegistry, SessionSnapshot, SimApi, SimDriver, SimEnv, SimServer, Violation,
};

const WORDS: &[&str] = &["hello", "hi", "yo", "on my way", "ok", "see you", "lol", "brb"];

/// Conversation used by the scenario.
pub const CONVERSATION: &str = "c-alice-bob";

/// Scenario failures that prevent a report.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// Runtime could not be built.
    #[error("session setup failed: {0}")]
    Setup(#[from] parley_client::ClientError),

    /// A session rejected a command.
    #[error("session command failed: {0}")]
    Session(#[from] SessionError),

    /// A session did not reach the expected state in time.
    #[error("timed out waiting for {what}")]
    Timeout {
        /// State being waited for.
        what: &'static str,
    },
}

/// Scenario parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioConfig {
    /// Seed for message texts, ids and timestamps.
    pub seed: u64,
    /// Number of messages `alice` sends.
    pub messages: usize,
    /// Merge policy both clients run with.
    pub merge_policy: MergePolicy,
    /// Upper bound on each wait for convergence.
    pub settle_timeout: Duration,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            messages: 16,
            merge_policy: MergePolicy::default(),
            settle_timeout: Duration::from_secs(5),
        }
    }
}

/// Outcome of a scenario run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioReport {
    /// Seed the run used.
    pub seed: u64,
    /// Messages sent by `alice`.
    pub sent: usize,
    /// Messages the server stored.
    pub stored: usize,
    /// Entries in `alice`'s timeline after convergence.
    pub sender_timeline: usize,
    /// Entries in `bob`'s timeline after opening the conversation.
    pub receiver_timeline: usize,
    /// `bob`'s unread count before opening the conversation.
    pub receiver_unread: u32,
    /// Invariant violations observed at any checkpoint.
    pub violations: Vec<Violation>,
}

impl ScenarioReport {
    /// `true` if no invariant was violated.
    pub fn is_ok(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Wait until the session's view satisfies `predicate`.
///
/// # Errors
///
/// - `ScenarioError::Timeout` if `timeout` elapses first or the runtime stops
pub async fn wait_for_view(
    handle: &SessionHandle,
    timeout: Duration,
    what: &'static str,
    predicate: impl FnMut(&ClientView) -> bool,
) -> Result<ClientView, ScenarioError> {
    let mut views = handle.subscribe();
    match tokio::time::timeout(timeout, views.wait_for(predicate)).await {
        Ok(Ok(view)) => Ok(view.clone()),
        Ok(Err(_)) | Err(_) => Err(ScenarioError::Timeout { what }),
    }
}

/// Start a runtime for `participant` on `server`.
///
/// # Errors
///
/// - `ScenarioError::Setup` if the identity is rejected
pub fn spawn_session(
    server: &SimServer,
    participant: &str,
    env: SimEnv,
    merge_policy: MergePolicy,
) -> Result<(SessionHandle, JoinHandle<()>), ScenarioError> {
    let api = Arc::new(SimApi::new(server.clone()));
    let (runtime, handle) = Runtime::new(
        SimDriver::new(server.clone()),
        env,
        api,
        ClientConfig::new(participant).with_merge_policy(merge_policy),
        RuntimeConfig::default(),
    )?;
    Ok((handle, tokio::spawn(runtime.run())))
}

/// Run the two-party scenario.
///
/// # Errors
///
/// - `ScenarioError::Timeout` if a session fails to converge
/// - `ScenarioError::Session` if a session rejects a command
pub async fn run_conversation(config: &ScenarioConfig) -> Result<ScenarioReport, ScenarioError> {
    let server = SimServer::new();
    server.add_participant("alice", "Alice");
    server.add_participant("bob", "Bob");
    server.create_conversation(CONVERSATION, "alice", "bob");

    let conversation = ConversationId::from(CONVERSATION);
    let alice_env = SimEnv::with_seed(config.seed);
    let (alice, alice_task) =
        spawn_session(&server, "alice", alice_env.clone(), config.merge_policy)?;
    let (bob, bob_task) = spawn_session(
        &server,
        "bob",
        SimEnv::with_seed(config.seed.wrapping_add(1)),
        config.merge_policy,
    )?;

    let registry = InvariantRegistry::standard();
    let mut violations = Vec::new();
    let mut checkpoint = |participant: &str, view: &ClientView| {
        let snapshot =
            SessionSnapshot::from_view(ParticipantId::from(participant), config.merge_policy, view);
        if let Err(found) = registry.check_all(&snapshot) {
            tracing::warn!(participant, count = found.len(), "invariant violations");
            violations.extend(found);
        }
    };

    let timeout = config.settle_timeout;
    for handle in [&alice, &bob] {
        wait_for_view(handle, timeout, "connected with roster", |v| {
            v.connection == ChannelState::Connected && !v.conversations.rows.is_empty()
        })
        .await?;
    }

    alice.open_conversation(conversation.clone()).await?;
    let view = wait_for_view(&alice, timeout, "sender join", |v| joined(v, &conversation)).await?;
    checkpoint("alice", &view);

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    for _ in 0..config.messages {
        let text = WORDS[rng.gen_range(0..WORDS.len())];
        alice.draft_changed(text).await?;
        alice.send_message(text).await?;
        alice_env.advance(rng.gen_range(1..=2_000));
        checkpoint("alice", &alice.view());
    }

    let sender_view = wait_for_view(&alice, timeout, "sender echoes", |v| {
        v.timeline.iter().all(|e| e.delivery == Delivery::Confirmed)
    })
    .await?;
    checkpoint("alice", &sender_view);

    let stored = server.history(&conversation).map(|m| m.len()).unwrap_or_default();
    let expected_unread = u32::try_from(config.messages).unwrap_or(u32::MAX);
    let before_open = wait_for_view(&bob, timeout, "receiver unread", |v| {
        v.conversations.total_unread == expected_unread
    })
    .await?;
    checkpoint("bob", &before_open);

    bob.open_conversation(conversation.clone()).await?;
    let receiver_view = wait_for_view(&bob, timeout, "receiver join", |v| {
        joined(v, &conversation) && v.conversations.total_unread == 0
    })
    .await?;
    checkpoint("bob", &receiver_view);

    for handle in [&alice, &bob] {
        handle.close().await?;
    }
    for task in [alice_task, bob_task] {
        if let Err(error) = task.await {
            tracing::warn!(%error, "session task failed");
        }
    }

    let report = ScenarioReport {
        seed: config.seed,
        sent: config.messages,
        stored,
        sender_timeline: sender_view.timeline.len(),
        receiver_timeline: receiver_view.timeline.len(),
        receiver_unread: before_open.conversations.total_unread,
        violations,
    };
    tracing::info!(
        seed = report.seed,
        sent = report.sent,
        stored = report.stored,
        sender_timeline = report.sender_timeline,
        receiver_timeline = report.receiver_timeline,
        violations = report.violations.len(),
        "scenario finished"
    );
    Ok(report)
}

fn joined(view: &ClientView, conversation: &ConversationId) -> bool {
    matches!(&view.room, RoomState::Joined { conversation_id, .. } if conversation_id == conversation)
}
