// src/core/interceptor.rs

//! Suspend/resume protocol for commands that need another line from the user.
//!
//! A command registers a pending continuation for its session; the shell checks
//! for one on every raw input line before dispatching the line as a command.

use crate::models::SessionId;
use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use thiserror::Error;
use tokio::sync::oneshot;

/// Why an input request ended without a line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    /// A newer request for the same session replaced this one.
    #[error("InputError: the input request was replaced by a newer one")]
    Superseded,
    /// The command runs where no line can reach it, such as a background job.
    #[error("InputError: interactive input is not available here")]
    Unavailable,
}

/// How a line typed at the console resolves a yes/no question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmAnswer {
    /// Empty, `y`, `yes`, `1` or `true`.
    Yes,
    /// `n`, `no`, `0` or `false`.
    No,
    /// Anything else; the question should be asked again.
    Unclear,
}

/// Normalises and classifies a confirmation reply. An empty reply means yes.
pub fn classify_confirmation(line: &str) -> ConfirmAnswer {
    match line.trim().to_lowercase().as_str() {
        "" | "y" | "yes" | "1" | "true" => ConfirmAnswer::Yes,
        "n" | "no" | "0" | "false" => ConfirmAnswer::No,
        _ => ConfirmAnswer::Unclear,
    }
}

/// At most one pending input request per session.
#[derive(Debug, Default)]
pub struct InputInterceptor {
    pending: RefCell<HashMap<SessionId, oneshot::Sender<String>>>,
}

impl InputInterceptor {
    /// An interceptor with nothing pending.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the session's pending request immediately and returns a future
    /// for the next line. A request already pending for the session is replaced;
    /// its waiter resolves with `InputError::Superseded`.
    pub fn await_input(
        &self,
        session: SessionId,
    ) -> impl Future<Output = Result<String, InputError>> + 'static {
        let (tx, rx) = oneshot::channel();
        if self.pending.borrow_mut().insert(session, tx).is_some() {
            log::warn!("Session {}: replaced a pending input request", session);
        } else {
            log::debug!("Session {}: waiting for input", session);
        }
        async move { rx.await.map_err(|_| InputError::Superseded) }
    }

    /// Hands `line` to the session's pending request. Returns `false` when no
    /// request was pending, so the caller should dispatch the line instead.
    pub fn deliver(&self, session: SessionId, line: &str) -> bool {
        let Some(tx) = self.pending.borrow_mut().remove(&session) else {
            return false;
        };
        // The waiter gave up (its command was cancelled): dispatch the line.
        if tx.is_closed() || tx.send(line.to_string()).is_err() {
            log::debug!("Session {}: dropped an abandoned input request", session);
            return false;
        }
        true
    }

    /// Whether a live request is waiting in the session.
    pub fn has_pending(&self, session: SessionId) -> bool {
        self.pending
            .borrow()
            .get(&session)
            .is_some_and(|tx| !tx.is_closed())
    }

    /// Drops the session's pending request, if any.
    pub fn cancel(&self, session: SessionId) -> bool {
        self.pending.borrow_mut().remove(&session).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirmation_vocabulary() {
        for yes in ["y", "YES", " 1 ", "true", ""] {
            assert_eq!(classify_confirmation(yes), ConfirmAnswer::Yes, "{yes:?}");
        }
        for no in ["n", "No", "0", "FALSE"] {
            assert_eq!(classify_confirmation(no), ConfirmAnswer::No, "{no:?}");
        }
        assert_eq!(classify_confirmation("maybe"), ConfirmAnswer::Unclear);
    }

    #[tokio::test]
    async fn test_delivered_line_resolves_the_waiter() {
        let interceptor = InputInterceptor::new();
        let session = SessionId::new();
        let waiter = interceptor.await_input(session);

        assert!(interceptor.has_pending(session));
        assert!(interceptor.deliver(session, "answer"));
        assert_eq!(waiter.await, Ok("answer".to_string()));
        assert!(!interceptor.has_pending(session));
    }

    #[tokio::test]
    async fn test_new_request_supersedes_old_one() {
        let interceptor = InputInterceptor::new();
        let session = SessionId::new();
        let first = interceptor.await_input(session);
        let second = interceptor.await_input(session);

        assert!(interceptor.deliver(session, "line"));
        assert_eq!(first.await, Err(InputError::Superseded));
        assert_eq!(second.await, Ok("line".to_string()));
    }

    #[test]
    fn test_no_pending_request_means_dispatch() {
        let interceptor = InputInterceptor::new();
        let session = SessionId::new();
        assert!(!interceptor.deliver(session, "ls"));

        let _waiter = interceptor.await_input(session);
        assert!(!interceptor.deliver(SessionId::new(), "other session"));
        assert!(interceptor.cancel(session));
        assert!(!interceptor.deliver(session, "ls"));
    }

    #[test]
    fn test_abandoned_request_does_not_swallow_input() {
        let interceptor = InputInterceptor::new();
        let session = SessionId::new();
        drop(interceptor.await_input(session));

        assert!(!interceptor.has_pending(session));
        assert!(!interceptor.deliver(session, "ls"));
    }
}
