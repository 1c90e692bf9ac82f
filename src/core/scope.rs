//! # Execution Scope Manager
//!
//! Each console session owns at most one live foreground scope. A scope carries
//! a `CancellationToken`; commands observe it cooperatively, either by polling
//! `is_cancelled`, awaiting `cancelled`, or registering an `on_cancel` callback.
//! Nothing here ever stops a task preemptively.

use crate::models::SessionId;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;
use tokio::sync::Notify;

/// Marker error returned by cancellable operations. The dispatch boundary
/// swallows it instead of reporting it.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Operation was cancelled.")]
pub struct Cancelled;

type Callback = Box<dyn FnOnce()>;

struct TokenState {
    fired: Cell<bool>,
    callbacks: RefCell<Vec<Callback>>,
    notify: Notify,
}

/// A single-threaded cancellation signal shared between a scope and its command.
#[derive(Clone)]
pub struct CancellationToken {
    inner: Rc<TokenState>,
}

impl fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationToken")
            .field("fired", &self.inner.fired.get())
            .field("callbacks", &self.inner.callbacks.borrow().len())
            .finish()
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationToken {
    /// A signal that has not fired.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(TokenState {
                fired: Cell::new(false),
                callbacks: RefCell::new(Vec::new()),
                notify: Notify::new(),
            }),
        }
    }

    /// Whether the signal has fired.
    pub fn is_cancelled(&self) -> bool {
        self.inner.fired.get()
    }

    /// Returns `Err(Cancelled)` once the signal has fired, for use with `?`.
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }

    /// Registers a callback for cancellation. If the signal already fired, the
    /// callback runs immediately, so a late registration never misses it.
    pub fn on_cancel(&self, callback: impl FnOnce() + 'static) {
        if self.is_cancelled() {
            callback();
        } else {
            self.inner.callbacks.borrow_mut().push(Box::new(callback));
        }
    }

    /// Completes once the signal has fired.
    pub async fn cancelled(&self) {
        loop {
            // Register interest before checking, so a fire in between is not lost.
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }

    /// Fires the signal and runs every registered callback in registration
    /// order. Returns `false` when it had already fired.
    pub fn fire(&self) -> bool {
        if self.inner.fired.replace(true) {
            return false;
        }
        // Take the list first: a callback may register another one, which then
        // runs immediately instead of re-borrowing the list.
        let callbacks = std::mem::take(&mut *self.inner.callbacks.borrow_mut());
        for callback in callbacks {
            callback();
        }
        self.inner.notify.notify_waiters();
        true
    }
}

// --- SCOPES ---

/// Identifies one foreground scope. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(u64);

/// What `begin` hands to the dispatcher: the scope's id and its signal.
#[derive(Debug, Clone)]
pub struct ScopeHandle {
    /// Passed back to `finish` when the command ends.
    pub id: ScopeId,
    /// Fired when the scope is cancelled or superseded.
    pub token: CancellationToken,
}

/// What an interrupt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The active scope's signal fired.
    Cancelled,
    /// The active scope had already been cancelled.
    AlreadyCancelled,
    /// Nothing was running in the foreground.
    NoActiveScope,
}

/// Tracks the live foreground scope of every session.
#[derive(Debug, Default)]
pub struct ScopeManager {
    scopes: RefCell<HashMap<SessionId, ScopeHandle>>,
    next_id: Cell<u64>,
}

impl ScopeManager {
    /// A manager with no scopes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a fresh scope for `session`. A prior scope is retired first: its
    /// signal fires, so a stale foreground command stops at its next check.
    pub fn begin(&self, session: SessionId) -> ScopeHandle {
        let id = ScopeId(self.next_id.get() + 1);
        self.next_id.set(id.0);
        let handle = ScopeHandle {
            id,
            token: CancellationToken::new(),
        };

        let previous = self.scopes.borrow_mut().insert(session, handle.clone());
        if let Some(previous) = previous {
            log::debug!(
                "Session {}: retiring scope {:?} for new scope {:?}",
                session,
                previous.id,
                id
            );
            previous.token.fire();
        } else {
            log::debug!("Session {}: began scope {:?}", session, id);
        }
        handle
    }

    /// Fires the session's current scope. Idempotent.
    pub fn cancel(&self, session: SessionId) -> CancelOutcome {
        // Clone out of the map so callbacks may call back into the manager.
        let token = self
            .scopes
            .borrow()
            .get(&session)
            .map(|scope| scope.token.clone());
        match token {
            None => CancelOutcome::NoActiveScope,
            Some(token) if token.fire() => {
                log::debug!("Session {}: foreground scope cancelled", session);
                CancelOutcome::Cancelled
            }
            Some(_) => CancelOutcome::AlreadyCancelled,
        }
    }

    /// Releases the scope without firing it. A scope that has already been
    /// replaced by a newer one is left alone; returns whether anything was released.
    pub fn finish(&self, session: SessionId, scope: ScopeId) -> bool {
        let mut scopes = self.scopes.borrow_mut();
        match scopes.get(&session) {
            Some(current) if current.id == scope => {
                scopes.remove(&session);
                log::debug!("Session {}: finished scope {:?}", session, scope);
                true
            }
            _ => false,
        }
    }

    /// The signal of the session's live scope, if any.
    pub fn active(&self, session: SessionId) -> Option<CancellationToken> {
        self.scopes
            .borrow()
            .get(&session)
            .map(|scope| scope.token.clone())
    }

    /// Fires and forgets the session's scope, used when a session closes.
    pub fn discard(&self, session: SessionId) {
        let removed = self.scopes.borrow_mut().remove(&session);
        if let Some(scope) = removed {
            scope.token.fire();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_cancel_is_idempotent() {
        let scopes = ScopeManager::new();
        let session = SessionId::new();
        let handle = scopes.begin(session);

        assert_eq!(scopes.cancel(session), CancelOutcome::Cancelled);
        assert_eq!(scopes.cancel(session), CancelOutcome::AlreadyCancelled);
        assert!(handle.token.is_cancelled());
        assert_eq!(scopes.cancel(SessionId::new()), CancelOutcome::NoActiveScope);
    }

    #[test]
    fn test_callbacks_run_synchronously_in_order() {
        let scopes = ScopeManager::new();
        let session = SessionId::new();
        let handle = scopes.begin(session);
        let log = Rc::new(RefCell::new(Vec::new()));

        for label in ["first", "second"] {
            let log = Rc::clone(&log);
            handle.token.on_cancel(move || log.borrow_mut().push(label));
        }
        assert!(log.borrow().is_empty());

        scopes.cancel(session);
        assert_eq!(*log.borrow(), vec!["first", "second"]);

        // A second cancel does not run them again.
        scopes.cancel(session);
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn test_late_callback_fires_immediately() {
        let token = CancellationToken::new();
        token.fire();

        let hit = Rc::new(Cell::new(false));
        let flag = Rc::clone(&hit);
        token.on_cancel(move || flag.set(true));
        assert!(hit.get());
    }

    #[test]
    fn test_callback_registered_during_fire_runs() {
        let token = CancellationToken::new();
        let hit = Rc::new(Cell::new(0));

        let inner_token = token.clone();
        let counter = Rc::clone(&hit);
        token.on_cancel(move || {
            let counter = Rc::clone(&counter);
            inner_token.on_cancel(move || counter.set(counter.get() + 1));
        });
        token.fire();
        assert_eq!(hit.get(), 1);
    }

    #[test]
    fn test_begin_retires_previous_scope() {
        let scopes = ScopeManager::new();
        let session = SessionId::new();
        let old = scopes.begin(session);
        let new = scopes.begin(session);

        assert!(old.token.is_cancelled());
        assert!(!new.token.is_cancelled());

        // The retired scope cannot release the new one.
        assert!(!scopes.finish(session, old.id));
        assert!(scopes.active(session).is_some());
        assert!(scopes.finish(session, new.id));
        assert!(scopes.active(session).is_none());
    }

    #[test]
    fn test_finish_does_not_fire() {
        let scopes = ScopeManager::new();
        let session = SessionId::new();
        let handle = scopes.begin(session);
        assert!(scopes.finish(session, handle.id));
        assert!(!handle.token.is_cancelled());
        assert_eq!(scopes.cancel(session), CancelOutcome::NoActiveScope);
    }

    #[tokio::test]
    async fn test_cancelled_future_wakes_up() {
        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let token = CancellationToken::new();
                let waiter = token.clone();
                let task = tokio::task::spawn_local(async move {
                    waiter.cancelled().await;
                    "woken"
                });

                tokio::time::sleep(Duration::from_millis(5)).await;
                assert!(!task.is_finished());
                token.fire();
                assert_eq!(task.await.unwrap(), "woken");
            })
            .await;
    }
}
