//! The piece of session state that concurrent activities share.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::TetherError;
use crate::state::session::SessionPhase;

/// Cloneable handle to one session: its phase and its cancellation token.
///
/// Cancelling the token is the only teardown signal. Every activity
/// selects on [`cancelled`](Self::cancelled) next to its blocking read,
/// so no activity keeps using the transport after another began closing
/// it.
#[derive(Debug, Clone, Default)]
pub struct SessionHandle {
    phase: Arc<Mutex<SessionPhase>>,
    cancel: CancellationToken,
}

impl SessionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// A session that is also cancelled when `parent` is.
    pub fn with_parent(parent: &CancellationToken) -> Self {
        Self {
            phase: Arc::default(),
            cancel: parent.child_token(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionPhase> {
        // Transitions never panic mid-update, so a poisoned phase is still valid.
        self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the current phase.
    pub fn phase(&self) -> SessionPhase {
        self.lock().clone()
    }

    pub fn begin_handshake(&self) -> Result<(), TetherError> {
        self.lock().begin_handshake()
    }

    pub fn complete_handshake(&self) -> Result<(), TetherError> {
        self.lock().complete_handshake()
    }

    /// `true` while the handshake is done and nobody has cancelled.
    pub fn is_active(&self) -> bool {
        !self.cancel.is_cancelled() && self.lock().is_active()
    }

    /// Start teardown. Safe to call from several activities.
    pub fn close(&self) {
        let mut phase = self.lock();
        if phase.begin_close().is_err() && !phase.is_closed() {
            phase.force_close();
        }
        drop(phase);
        if !self.cancel.is_cancelled() {
            debug!("session cancelled");
        }
        self.cancel.cancel();
    }

    /// Mark the transport as released. Call once every activity ended.
    pub fn finish(&self) {
        let mut phase = self.lock();
        if phase.finish_close().is_err() {
            phase.force_close();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves once teardown has started.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }

    pub fn token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_phase_and_token() {
        let a = SessionHandle::new();
        let b = a.clone();

        a.begin_handshake().unwrap();
        b.complete_handshake().unwrap();
        assert!(a.is_active());

        b.close();
        assert!(a.is_cancelled());
        assert!(!a.is_active());
        assert_eq!(a.phase(), SessionPhase::Closing);

        a.finish();
        assert!(b.phase().is_closed());
    }

    #[test]
    fn close_before_handshake_goes_straight_to_closed() {
        let s = SessionHandle::new();
        s.close();
        assert!(s.phase().is_closed());
        s.finish();
        assert!(s.phase().is_closed());
    }

    #[test]
    fn parent_cancellation_reaches_the_session() {
        let shutdown = CancellationToken::new();
        let s = SessionHandle::with_parent(&shutdown);
        assert!(!s.is_cancelled());
        shutdown.cancel();
        assert!(s.is_cancelled());

        // Closing a session leaves the parent alone.
        let parent = CancellationToken::new();
        SessionHandle::with_parent(&parent).close();
        assert!(!parent.is_cancelled());
    }

    #[tokio::test]
    async fn cancelled_wakes_waiters() {
        let s = SessionHandle::new();
        let waiter = {
            let s = s.clone();
            tokio::spawn(async move { s.cancelled().await })
        };
        s.close();
        tokio::time::timeout(std::time::Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }
}
