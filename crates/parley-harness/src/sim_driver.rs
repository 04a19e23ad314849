//! Simulation driver implementing the Driver trait.
//!
//! `SimDriver` connects a [`parley_app::Runtime`] to a [`SimServer`] in the
//! same process, so the production orchestration code runs unchanged in
//! tests.

use parley_app::{Driver, Handshake};
use parley_proto::{Envelope, ParticipantId};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::sim_server::{SimError, SimServer};

/// Error type for the simulation driver.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("sim driver: {0}")]
pub struct SimDriverError(#[from] pub SimError);

/// Simulation driver for one participant.
pub struct SimDriver {
    server: SimServer,
    identity: Option<ParticipantId>,
    inbox: Option<mpsc::UnboundedReceiver<Envelope>>,
}

impl SimDriver {
    /// Driver attached to `server`.
    pub fn new(server: SimServer) -> Self {
        Self { server, identity: None, inbox: None }
    }
}

impl Driver for SimDriver {
    type Error = SimDriverError;
    type Connection = (ParticipantId, mpsc::UnboundedReceiver<Envelope>);

    fn connect(&self, identity: &ParticipantId) -> Handshake<Self::Connection, Self::Error> {
        let result = self
            .server
            .connect(identity)
            .map(|inbox| (identity.clone(), inbox))
            .map_err(SimDriverError::from);
        Box::pin(async move { result })
    }

    fn attach(&mut self, (identity, inbox): Self::Connection) {
        self.identity = Some(identity);
        self.inbox = Some(inbox);
    }

    async fn send(&mut self, envelope: Envelope) -> Result<(), Self::Error> {
        let Some(identity) = &self.identity else {
            return Err(SimError::BadEvent("send before connect".into()).into());
        };
        if self.inbox.is_none() {
            return Err(SimError::NotConnected(identity.clone()).into());
        }
        self.server.receive(identity, &envelope)?;
        Ok(())
    }

    async fn recv(&mut self) -> Option<Envelope> {
        let inbox = self.inbox.as_mut()?;
        let envelope = inbox.recv().await;
        if envelope.is_none() {
            self.inbox = None;
        }
        envelope
    }

    fn is_connected(&self) -> bool {
        self.inbox.is_some()
    }

    fn stop(&mut self) {
        if let Some(identity) = &self.identity {
            self.server.disconnect(identity);
        }
        self.inbox = None;
    }
}

#[cfg(test)]
mod tests {
    use parley_proto::OutboundEvent;

    use super::*;

    #[tokio::test]
    async fn server_drop_closes_inbox() {
        let server = SimServer::new();
        let mut driver = SimDriver::new(server.clone());
        let connection = driver.connect(&"alice".into()).await.unwrap();
        assert!(!driver.is_connected());
        driver.attach(connection);
        assert!(driver.is_connected());

        server.disconnect(&"alice".into());

        assert!(driver.recv().await.is_none());
        assert!(!driver.is_connected());
        let envelope = OutboundEvent::JoinRoom("c1".into()).to_envelope().unwrap();
        assert!(driver.send(envelope).await.is_err());
    }

    #[tokio::test]
    async fn refused_connect_is_an_error() {
        let server = SimServer::new();
        server.refuse("bob");
        let driver = SimDriver::new(server);

        let err = driver.connect(&"bob".into()).await.unwrap_err();
        assert_eq!(err, SimDriverError(SimError::Refused("bob".into())));
        assert!(!driver.is_connected());
    }
}
