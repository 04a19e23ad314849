//! Generic runtime for session orchestration.
//!
//! The Runtime drives the session event loop, coordinating between:
//! - [`Client`]: chat state machine
//! - [`Driver`]: channel transport
//! - [`ChatApi`]: REST collaborator
//! - [`SessionHandle`]s held by screens
//!
//! Collaborator calls and channel handshakes run as spawned tasks whose
//! results re-enter the loop, so a slow history fetch or a hung handshake
//! never blocks live events or screen commands.

use std::{collections::VecDeque, sync::Arc};

use parley_client::{Client, ClientAction, ClientConfig, ClientError, ClientEvent, ClientView};
use parley_core::{ActivationId, ChannelAction, env::Environment};
use parley_proto::{ConversationId, ParticipantId};
use tokio::sync::{mpsc, watch};

use crate::{
    ChatApi, Driver, RuntimeConfig, SessionHandle,
    error::ApiError,
    handle::Command,
};

/// Outcome of a spawned handshake, tagged with the attempt it belongs to.
type HandshakeOutcome<C> = (u64, Result<C, String>);

/// Generic runtime that executes client actions through a Driver and ChatApi.
///
/// # Type Parameters
///
/// - `D`: Channel transport driver
/// - `E`: Environment for timestamps and ids
pub struct Runtime<D, E>
where
    D: Driver,
    E: Environment,
{
    driver: D,
    client: Client<E>,
    api: Arc<dyn ChatApi>,
    config: RuntimeConfig,
    commands: mpsc::Receiver<Command>,
    completions_tx: mpsc::UnboundedSender<ClientEvent>,
    completions: mpsc::UnboundedReceiver<ClientEvent>,
    handshakes_tx: mpsc::UnboundedSender<HandshakeOutcome<D::Connection>>,
    handshakes: mpsc::UnboundedReceiver<HandshakeOutcome<D::Connection>>,
    /// Latest handshake attempt. Outcomes of older attempts are dropped.
    handshake_seq: u64,
    view: watch::Sender<ClientView>,
}

impl<D, E> Runtime<D, E>
where
    D: Driver,
    E: Environment,
{
    /// Create a runtime and the handle screens use to talk to it.
    ///
    /// # Errors
    ///
    /// - `ClientError::Channel` if the configured identity is empty
    pub fn new(
        driver: D,
        env: E,
        api: Arc<dyn ChatApi>,
        client_config: ClientConfig,
        config: RuntimeConfig,
    ) -> Result<(Self, SessionHandle), ClientError> {
        let client = Client::new(env, client_config)?;
        let (view, view_rx) = watch::channel(client.view());
        let (commands_tx, commands) = mpsc::channel(config.command_buffer.max(1));
        let (completions_tx, completions) = mpsc::unbounded_channel();
        let (handshakes_tx, handshakes) = mpsc::unbounded_channel();

        let runtime = Self {
            driver,
            client,
            api,
            config,
            commands,
            completions_tx,
            completions,
            handshakes_tx,
            handshakes,
            handshake_seq: 0,
            view,
        };
        Ok((runtime, SessionHandle::new(commands_tx, view_rx)))
    }

    /// Run the event loop until the session is closed or every
    /// [`SessionHandle`] is dropped.
    pub async fn run(mut self) {
        if self.config.connect_on_start {
            self.apply(ClientEvent::Connect).await;
        }
        if self.config.fetch_roster_on_start {
            self.apply(ClientEvent::RefreshRoster).await;
        }

        loop {
            let connected = self.driver.is_connected();
            tokio::select! {
                command = self.commands.recv() => {
                    let Some(command) = command else {
                        tracing::info!("all session handles dropped");
                        break;
                    };
                    if self.handle_command(command).await {
                        break;
                    }
                },
                Some(event) = self.completions.recv() => {
                    self.apply(event).await;
                },
                Some((seq, outcome)) = self.handshakes.recv() => {
                    self.finish_handshake(seq, outcome).await;
                },
                envelope = self.driver.recv(), if connected => {
                    let event = match envelope {
                        Some(envelope) => ClientEvent::EnvelopeReceived(envelope),
                        None => ClientEvent::ChannelDisconnected {
                            reason: "connection closed by server".into(),
                        },
                    };
                    self.apply(event).await;
                },
            }
        }

        self.driver.stop();
        tracing::info!("runtime stopped");
    }

    /// Current render snapshot.
    pub fn view(&self) -> ClientView {
        self.client.view()
    }

    /// Returns `true` if the session was closed.
    async fn handle_command(&mut self, command: Command) -> bool {
        let Command { event, reply } = command;
        let closing = matches!(event, ClientEvent::Close);

        let result = match self.client.handle(event) {
            Ok(actions) => {
                self.execute(actions).await;
                Ok(())
            },
            Err(error) => {
                tracing::debug!(%error, "command rejected");
                Err(error)
            },
        };

        if reply.send(result).is_err() {
            tracing::debug!("command issuer went away");
        }
        closing
    }

    /// Feed an internally produced event into the client.
    async fn apply(&mut self, event: ClientEvent) {
        let actions = self.step(event);
        self.execute(actions).await;
    }

    async fn finish_handshake(&mut self, seq: u64, outcome: Result<D::Connection, String>) {
        if seq != self.handshake_seq {
            tracing::debug!(seq, latest = self.handshake_seq, "dropping stale handshake");
            return;
        }

        let event = match outcome {
            Ok(connection) => {
                self.driver.attach(connection);
                ClientEvent::ChannelConnected
            },
            Err(reason) => {
                tracing::warn!(%reason, "connect failed");
                ClientEvent::ChannelDisconnected { reason }
            },
        };
        self.apply(event).await;
    }

    fn step(&mut self, event: ClientEvent) -> Vec<ClientAction> {
        match self.client.handle(event) {
            Ok(actions) => actions,
            Err(error) => {
                tracing::warn!(%error, "client rejected event");
                Vec::new()
            },
        }
    }

    /// Execute client actions. Transport outcomes feed back into the client
    /// and their actions are executed in the same pass.
    async fn execute(&mut self, actions: Vec<ClientAction>) {
        let mut pending: VecDeque<ClientAction> = actions.into();
        let mut render = false;

        while let Some(action) = pending.pop_front() {
            match action {
                ClientAction::Channel(ChannelAction::Open { identity }) => {
                    self.spawn_handshake(&identity);
                    render = true;
                },
                ClientAction::Channel(ChannelAction::Send(envelope)) => {
                    if let Err(error) = self.driver.send(envelope).await {
                        tracing::warn!(%error, "send failed");
                        let event = ClientEvent::ChannelDisconnected { reason: error.to_string() };
                        pending.extend(self.step(event));
                    }
                },
                ClientAction::Channel(ChannelAction::Close) => {
                    self.handshake_seq = self.handshake_seq.wrapping_add(1);
                    self.driver.stop();
                },
                ClientAction::FetchHistory { conversation_id, activation } => {
                    self.spawn_history(conversation_id, activation);
                },
                ClientAction::FetchRoster { participant_id } => self.spawn_roster(participant_id),
                ClientAction::PostMarkRead { conversation_id, participant_id } => {
                    self.spawn_mark_read(conversation_id, participant_id);
                },
                ClientAction::ViewChanged => render = true,
                ClientAction::Report(error) => {
                    tracing::debug!(%error, transient = error.is_transient(), "surfaced to user");
                    render = true;
                },
            }
        }

        if render {
            self.view.send_replace(self.client.view());
        }
    }

    fn spawn_handshake(&mut self, identity: &ParticipantId) {
        self.handshake_seq = self.handshake_seq.wrapping_add(1);
        let seq = self.handshake_seq;
        let handshake = self.driver.connect(identity);
        let timeout = self.config.connect_timeout;
        let handshakes = self.handshakes_tx.clone();
        tokio::spawn(async move {
            let outcome = match tokio::time::timeout(timeout, handshake).await {
                Ok(Ok(connection)) => Ok(connection),
                Ok(Err(error)) => Err(error.to_string()),
                Err(_) => Err(format!("handshake timed out after {timeout:?}")),
            };
            if handshakes.send((seq, outcome)).is_err() {
                tracing::debug!("runtime stopped before handshake completed");
            }
        });
    }

    fn spawn_history(&self, conversation_id: ConversationId, activation: ActivationId) {
        let api = Arc::clone(&self.api);
        let timeout = self.config.fetch_timeout;
        self.spawn_completion(async move {
            let result =
                tokio::time::timeout(timeout, api.fetch_messages(&conversation_id)).await;
            match result.unwrap_or(Err(ApiError::Timeout(timeout))) {
                Ok(messages) => ClientEvent::HistoryLoaded { activation, messages },
                Err(error) => ClientEvent::HistoryFailed { activation, reason: error.to_string() },
            }
        });
    }

    fn spawn_roster(&self, participant_id: ParticipantId) {
        let api = Arc::clone(&self.api);
        let timeout = self.config.fetch_timeout;
        self.spawn_completion(async move {
            let result =
                tokio::time::timeout(timeout, api.fetch_conversations(&participant_id)).await;
            match result.unwrap_or(Err(ApiError::Timeout(timeout))) {
                Ok(roster) => ClientEvent::RosterLoaded(roster),
                Err(error) => ClientEvent::RosterFailed { reason: error.to_string() },
            }
        });
    }

    fn spawn_mark_read(&self, conversation_id: ConversationId, participant_id: ParticipantId) {
        let api = Arc::clone(&self.api);
        let timeout = self.config.fetch_timeout;
        self.spawn_completion(async move {
            let result =
                tokio::time::timeout(timeout, api.mark_read(&conversation_id, &participant_id))
                    .await;
            match result.unwrap_or(Err(ApiError::Timeout(timeout))) {
                Ok(()) => ClientEvent::ReadAcknowledged(conversation_id),
                Err(error) => {
                    ClientEvent::ReadAckFailed { conversation_id, reason: error.to_string() }
                },
            }
        });
    }

    fn spawn_completion<F>(&self, task: F)
    where
        F: std::future::Future<Output = ClientEvent> + Send + 'static,
    {
        let completions = self.completions_tx.clone();
        tokio::spawn(async move {
            if completions.send(task.await).is_err() {
                tracing::debug!("runtime stopped before fetch completed");
            }
        });
    }
}
