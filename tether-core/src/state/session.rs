//! Session lifecycle shared by every process that speaks the protocol.
//!
//! Provides a `SessionPhase` enum with validated transitions that return
//! `Result` instead of panicking.

use std::time::Instant;

use crate::error::TetherError;

// ── SessionPhase ─────────────────────────────────────────────────

/// The current phase of a protocol session.
///
/// ```text
///  Idle ──► Handshaking ──► Active ──► Closing ──► Closed
///                │                        ▲
///                └────────────────────────┘
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// Transport accepted or opened; nothing exchanged yet.
    #[default]
    Idle,

    /// Waiting for HELLO (accepting side) or for its OK (initiating side).
    Handshaking,

    /// Handshake complete; commands may flow.
    Active {
        /// When the session entered the `Active` state.
        since: Instant,
    },

    /// Teardown in progress.
    Closing,

    /// Terminal state. The transport has been released.
    Closed,
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Handshaking => write!(f, "Handshaking"),
            Self::Active { .. } => write!(f, "Active"),
            Self::Closing => write!(f, "Closing"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}

impl SessionPhase {
    /// Returns `true` once the handshake has completed and until teardown.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// How long the session has been active. `None` outside `Active`.
    pub fn active_duration(&self) -> Option<std::time::Duration> {
        match self {
            Self::Active { since } => Some(since.elapsed()),
            _ => None,
        }
    }

    // ── Transitions ──────────────────────────────────────────────

    /// Valid from: `Idle`.
    pub fn begin_handshake(&mut self) -> Result<(), TetherError> {
        match self {
            Self::Idle => {
                *self = Self::Handshaking;
                Ok(())
            }
            _ => Err(TetherError::ProtocolViolation(
                "cannot handshake: not in Idle state",
            )),
        }
    }

    /// Valid from: `Handshaking`.
    pub fn complete_handshake(&mut self) -> Result<(), TetherError> {
        match self {
            Self::Handshaking => {
                *self = Self::Active {
                    since: Instant::now(),
                };
                Ok(())
            }
            _ => Err(TetherError::ProtocolViolation(
                "cannot complete handshake: not in Handshaking state",
            )),
        }
    }

    /// Valid from: `Handshaking`, `Active`. Repeating it is a no-op, since
    /// both relay activities may observe teardown.
    pub fn begin_close(&mut self) -> Result<(), TetherError> {
        match self {
            Self::Handshaking | Self::Active { .. } => {
                *self = Self::Closing;
                Ok(())
            }
            Self::Closing => Ok(()),
            _ => Err(TetherError::ProtocolViolation(
                "cannot close: not in Handshaking or Active state",
            )),
        }
    }

    /// Valid from: `Closing`.
    pub fn finish_close(&mut self) -> Result<(), TetherError> {
        match self {
            Self::Closing => {
                *self = Self::Closed;
                Ok(())
            }
            _ => Err(TetherError::ProtocolViolation(
                "cannot finish close: not in Closing state",
            )),
        }
    }

    /// Jump to `Closed` from any state, for transport failures.
    pub fn force_close(&mut self) {
        *self = Self::Closed;
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_lifecycle() {
        let mut phase = SessionPhase::Idle;

        phase.begin_handshake().unwrap();
        assert_eq!(phase, SessionPhase::Handshaking);

        phase.complete_handshake().unwrap();
        assert!(phase.is_active());
        assert!(phase.active_duration().is_some());

        phase.begin_close().unwrap();
        assert_eq!(phase, SessionPhase::Closing);

        phase.finish_close().unwrap();
        assert!(phase.is_closed());
    }

    #[test]
    fn cannot_activate_without_handshake() {
        let mut phase = SessionPhase::Idle;
        assert!(phase.complete_handshake().is_err());
    }

    #[test]
    fn cannot_handshake_twice() {
        let mut phase = SessionPhase::Active {
            since: Instant::now(),
        };
        assert!(phase.begin_handshake().is_err());
    }

    #[test]
    fn close_from_handshaking() {
        let mut phase = SessionPhase::Handshaking;
        phase.begin_close().unwrap();
        phase.finish_close().unwrap();
        assert!(phase.is_closed());
    }

    #[test]
    fn begin_close_is_idempotent() {
        let mut phase = SessionPhase::Closing;
        assert!(phase.begin_close().is_ok());
        assert_eq!(phase, SessionPhase::Closing);
    }

    #[test]
    fn closed_cannot_reopen() {
        let mut phase = SessionPhase::Closed;
        assert!(phase.begin_handshake().is_err());
        assert!(phase.begin_close().is_err());
    }

    #[test]
    fn force_close_from_any_state() {
        let mut phase = SessionPhase::Active {
            since: Instant::now(),
        };
        phase.force_close();
        assert!(phase.is_closed());
    }

    #[test]
    fn display_format() {
        assert_eq!(SessionPhase::Idle.to_string(), "Idle");
        assert_eq!(SessionPhase::Handshaking.to_string(), "Handshaking");
        assert_eq!(
            SessionPhase::Active {
                since: Instant::now()
            }
            .to_string(),
            "Active"
        );
        assert_eq!(SessionPhase::Closing.to_string(), "Closing");
        assert_eq!(SessionPhase::Closed.to_string(), "Closed");
    }
}
