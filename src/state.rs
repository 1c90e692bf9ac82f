// src/state.rs

use crate::models::SessionId;
use std::collections::HashSet;

/// Mutable state shared by every session of one shell.
///
/// Owned by the shell runtime and reached by handlers only through
/// `CommandContext`, never through a global.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ShellState {
    /// The privileged toggle flipped by the hidden `godmode` command.
    pub god_mode: bool,
    /// Sessions whose user ran `exit`; the frontend closes them.
    pub exit_requested: HashSet<SessionId>,
}

impl ShellState {
    /// A shell state with everything off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the state to how a fresh shell starts.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Records that the session's user ran `exit`.
    pub fn request_exit(&mut self, session: SessionId) {
        self.exit_requested.insert(session);
    }

    /// Consumes a pending exit request for the session.
    pub fn take_exit_request(&mut self, session: SessionId) -> bool {
        self.exit_requested.remove(&session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_restores_defaults() {
        let mut state = ShellState::new();
        state.god_mode = true;
        state.request_exit(SessionId::new());
        state.reset();
        assert_eq!(state, ShellState::default());
    }

    #[test]
    fn test_exit_request_is_consumed_once() {
        let mut state = ShellState::new();
        let session = SessionId::new();
        state.request_exit(session);
        assert!(state.take_exit_request(session));
        assert!(!state.take_exit_request(session));
    }
}
