//! Screen-facing session handle.

use parley_client::{ClientError, ClientEvent, ClientView};
use parley_proto::ConversationId;
use tokio::sync::{mpsc, oneshot, watch};

use crate::error::SessionError;

/// Request from a screen to the runtime.
#[derive(Debug)]
pub(crate) struct Command {
    pub(crate) event: ClientEvent,
    pub(crate) reply: oneshot::Sender<Result<(), ClientError>>,
}

/// Clonable handle to a running session.
///
/// Every screen gets a clone of the same handle. Dropping all handles stops
/// the runtime.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    view: watch::Receiver<ClientView>,
}

impl SessionHandle {
    pub(crate) fn new(commands: mpsc::Sender<Command>, view: watch::Receiver<ClientView>) -> Self {
        Self { commands, view }
    }

    /// Latest render snapshot.
    pub fn view(&self) -> ClientView {
        self.view.borrow().clone()
    }

    /// Receiver notified on every snapshot change.
    pub fn subscribe(&self) -> watch::Receiver<ClientView> {
        self.view.clone()
    }

    /// (Re)open the channel.
    ///
    /// # Errors
    ///
    /// - `SessionError::Closed` if the runtime stopped
    /// - `SessionError::Client` if the session was closed
    pub async fn connect(&self) -> Result<(), SessionError> {
        self.request(ClientEvent::Connect).await
    }

    /// Conversation screen mounted.
    ///
    /// # Errors
    ///
    /// - `SessionError::Closed` if the runtime stopped
    pub async fn activate(
        &self,
        conversation_id: impl Into<ConversationId>,
    ) -> Result<(), SessionError> {
        self.request(ClientEvent::Activate(conversation_id.into())).await
    }

    /// Conversation screen unmounted.
    ///
    /// # Errors
    ///
    /// - `SessionError::Closed` if the runtime stopped
    pub async fn deactivate(&self) -> Result<(), SessionError> {
        self.request(ClientEvent::Deactivate).await
    }

    /// Conversation picked from the list: mark read and activate.
    ///
    /// # Errors
    ///
    /// - `SessionError::Closed` if the runtime stopped
    pub async fn open_conversation(
        &self,
        conversation_id: impl Into<ConversationId>,
    ) -> Result<(), SessionError> {
        self.request(ClientEvent::OpenConversation(conversation_id.into())).await
    }

    /// Send a message to the joined room.
    ///
    /// # Errors
    ///
    /// - `SessionError::Closed` if the runtime stopped
    /// - `SessionError::Client` with `NoActiveRoom` if no room is joined, or
    ///   with a timeline error for blank text
    pub async fn send_message(&self, text: impl Into<String>) -> Result<(), SessionError> {
        self.request(ClientEvent::SendMessage(text.into())).await
    }

    /// Draft text changed.
    ///
    /// # Errors
    ///
    /// - `SessionError::Closed` if the runtime stopped
    pub async fn draft_changed(&self, draft: impl Into<String>) -> Result<(), SessionError> {
        self.request(ClientEvent::DraftChanged(draft.into())).await
    }

    /// Mark a conversation read.
    ///
    /// # Errors
    ///
    /// - `SessionError::Closed` if the runtime stopped
    pub async fn mark_read(
        &self,
        conversation_id: impl Into<ConversationId>,
    ) -> Result<(), SessionError> {
        self.request(ClientEvent::MarkRead(conversation_id.into())).await
    }

    /// Fetch the conversation roster again.
    ///
    /// # Errors
    ///
    /// - `SessionError::Closed` if the runtime stopped
    pub async fn refresh_roster(&self) -> Result<(), SessionError> {
        self.request(ClientEvent::RefreshRoster).await
    }

    /// End the session and stop the runtime.
    ///
    /// # Errors
    ///
    /// - `SessionError::Closed` if the runtime already stopped
    pub async fn close(&self) -> Result<(), SessionError> {
        self.request(ClientEvent::Close).await
    }

    async fn request(&self, event: ClientEvent) -> Result<(), SessionError> {
        let (reply, response) = oneshot::channel();
        self.commands.send(Command { event, reply }).await.map_err(|_| SessionError::Closed)?;
        response.await.map_err(|_| SessionError::Closed)?.map_err(SessionError::from)
    }
}
