use tokio::sync::{mpsc, oneshot, watch};

use escolar_models::SessionState;

use crate::coordinator::{RefreshOutcome, ToSessionActor};
use crate::error::SessionError;

/// Cloneable access to a running session coordinator.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<ToSessionActor>,
    state: watch::Receiver<SessionState>,
}

impl SessionHandle {
    pub(crate) fn new(
        commands: mpsc::Sender<ToSessionActor>,
        state: watch::Receiver<SessionState>,
    ) -> Self {
        Self { commands, state }
    }

    /// Snapshot of the published state.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every published state.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    /// Waits until the published state satisfies `predicate`, checking the
    /// current state first.
    pub async fn wait_until(
        &self,
        predicate: impl FnMut(&SessionState) -> bool,
    ) -> Result<SessionState, SessionError> {
        let mut state = self.state.clone();
        let matched = state
            .wait_for(predicate)
            .await
            .map_err(|_| SessionError::Closed)?;
        Ok(matched.clone())
    }

    /// Re-runs resolution for the current subject. The loading state is
    /// already published when this returns [`RefreshOutcome::Started`].
    pub async fn refresh(&self) -> Result<RefreshOutcome, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(ToSessionActor::Refresh { reply }).await?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    /// Signs out of the provider and publishes an empty state. The state is
    /// cleared even when the provider call fails.
    pub async fn sign_out(&self) -> Result<(), SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(ToSessionActor::SignOut { reply }).await?;
        rx.await.map_err(|_| SessionError::Closed)?
    }

    pub async fn shutdown(&self) -> Result<(), SessionError> {
        self.send(ToSessionActor::Shutdown).await
    }

    async fn send(&self, msg: ToSessionActor) -> Result<(), SessionError> {
        self.commands
            .send(msg)
            .await
            .map_err(|_| SessionError::Closed)
    }
}
