// src/system/context.rs

//! The capability bundle every command handler receives.
//!
//! A context is cheap to clone. It never holds a borrow of shared state, so a
//! handler may keep it across any number of suspension points.

use crate::core::interceptor::{ConfirmAnswer, InputError, classify_confirmation};
use crate::core::jobs::{JobManager, JobSnapshot};
use crate::core::registry::Command;
use crate::core::scope::{CancellationToken, Cancelled};
use crate::models::{GroupId, JobId, OutputKind, SessionId};
use crate::system::shell::ShellCore;
use anyhow::Result;
use std::rc::Rc;
use std::time::Duration;

/// Where a command's output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputSink {
    /// The session's live console.
    Console,
    /// The captured buffer of a background job.
    Job(JobId),
}

/// Output, input, cancellation and session state for one running command.
#[derive(Clone)]
pub struct CommandContext {
    core: Rc<ShellCore>,
    session: SessionId,
    sink: OutputSink,
    token: CancellationToken,
    stdin: Option<Rc<[String]>>,
}

impl CommandContext {
    pub(crate) fn new(
        core: Rc<ShellCore>,
        session: SessionId,
        sink: OutputSink,
        token: CancellationToken,
        stdin: Option<Rc<[String]>>,
    ) -> Self {
        Self {
            core,
            session,
            sink,
            token,
            stdin,
        }
    }

    pub(crate) fn core(&self) -> &Rc<ShellCore> {
        &self.core
    }

    /// The session the command was typed in.
    pub fn session(&self) -> SessionId {
        self.session
    }

    /// The job this command runs as, when it was started in the background.
    pub fn job_id(&self) -> Option<JobId> {
        match self.sink {
            OutputSink::Console => None,
            OutputSink::Job(id) => Some(id),
        }
    }

    // --- OUTPUT ---

    /// Prints `text` as a new group. The text must already be markup-safe;
    /// SGR escape codes are rendered as styles.
    pub fn print(&self, text: &str) -> GroupId {
        self.append(text, OutputKind::Output)
    }

    /// Like `print`, styled as an error.
    pub fn print_error(&self, text: &str) -> GroupId {
        self.append(text, OutputKind::Error)
    }

    fn append(&self, text: &str, kind: OutputKind) -> GroupId {
        match self.sink {
            OutputSink::Console => {
                let mut console = self.core.console.borrow_mut();
                let group = match kind {
                    OutputKind::Output => console.print(text, self.session),
                    OutputKind::Error => console.print_error(text, self.session),
                };
                group.unwrap_or(GroupId(0))
            }
            // A closed session or a job cleared while its task still runs has no
            // buffer left; id 0 is never allocated, so later updates are no-ops.
            OutputSink::Job(id) => self.core.jobs.print(id, text, kind).unwrap_or(GroupId(0)),
        }
    }

    /// Replaces a group's content in place. Returns `false` if it no longer exists.
    pub fn update_message(&self, group: GroupId, text: &str) -> bool {
        match self.sink {
            OutputSink::Console => {
                self.core
                    .console
                    .borrow_mut()
                    .update_message(group, text, self.session)
            }
            OutputSink::Job(id) => self.core.jobs.update_output(id, group, text),
        }
    }

    /// Removes a group. Returns `false` if it no longer exists.
    pub fn delete_message(&self, group: GroupId) -> bool {
        match self.sink {
            OutputSink::Console => self
                .core
                .console
                .borrow_mut()
                .delete_message(group, self.session),
            OutputSink::Job(id) => self.core.jobs.delete_output(id, group),
        }
    }

    /// Empties the command's output target.
    pub fn clear(&self) {
        match self.sink {
            OutputSink::Console => self.core.console.borrow_mut().clear(self.session),
            OutputSink::Job(id) => self.core.jobs.clear_output(id),
        }
    }

    /// Copies a finished job's captured groups into this console.
    pub fn replay(&self, job: &JobSnapshot) {
        if self.sink != OutputSink::Console {
            return;
        }
        let mut console = self.core.console.borrow_mut();
        for group in &job.output {
            console.replay(group, self.session);
        }
    }

    // --- INPUT ---

    /// Suspends until the user enters the next line in this session. The line
    /// is consumed instead of being dispatched as a command. Cancelling the
    /// scope abandons the wait with `Cancelled`.
    pub async fn read_input(&self) -> Result<String> {
        if self.sink != OutputSink::Console {
            return Err(InputError::Unavailable.into());
        }
        self.token.check()?;

        let waiter = self.core.interceptor.await_input(self.session);
        let received = tokio::select! {
            line = waiter => Some(line),
            _ = self.token.cancelled() => None,
        };
        match received {
            Some(line) => Ok(line?),
            None => Err(Cancelled.into()),
        }
    }

    /// Prints `message` and suspends until the user answers yes or no. An
    /// empty answer counts as yes; anything unrecognised asks again.
    pub async fn confirm(&self, message: &str) -> Result<bool> {
        self.print(&format!("{} [Y/n]", message));
        loop {
            let answer = self.read_input().await?;
            match classify_confirmation(&answer) {
                ConfirmAnswer::Yes => return Ok(true),
                ConfirmAnswer::No => return Ok(false),
                ConfirmAnswer::Unclear => {
                    self.print("Please answer y or n.");
                }
            }
        }
    }

    /// Piped input lines, when the line was executed with input attached.
    pub fn stdin(&self) -> Option<&[String]> {
        self.stdin.as_deref()
    }

    // --- CANCELLATION ---

    /// The command's cancellation signal.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.token
    }

    /// Whether the command has been asked to stop.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Suspends for `duration`, or until the command is cancelled.
    pub async fn sleep(&self, duration: Duration) -> Result<(), Cancelled> {
        self.token.check()?;
        tokio::select! {
            _ = tokio::time::sleep(duration) => Ok(()),
            _ = self.token.cancelled() => Err(Cancelled),
        }
    }

    // --- VARIABLES ---

    /// Reads a session variable.
    pub fn get_var(&self, name: &str) -> Option<String> {
        self.core
            .with_session(self.session, |s| s.variables.get_var(name).map(String::from))
            .flatten()
    }

    /// Sets a session variable.
    pub fn set_var(&self, name: &str, value: &str) {
        self.core
            .with_session(self.session, |s| s.variables.set_var(name, value));
    }

    /// Removes a session variable. Returns whether it existed.
    pub fn unset_var(&self, name: &str) -> bool {
        self.core
            .with_session(self.session, |s| s.variables.unset_var(name))
            .unwrap_or(false)
    }

    /// Reads an environment variable.
    pub fn get_env(&self, name: &str) -> Option<String> {
        self.core
            .with_session(self.session, |s| s.variables.get_env(name).map(String::from))
            .flatten()
    }

    /// Sets an environment variable.
    pub fn set_env(&self, name: &str, value: &str) {
        self.core
            .with_session(self.session, |s| s.variables.set_env(name, value));
    }

    /// Removes an environment variable. Returns whether it existed.
    pub fn unset_env(&self, name: &str) -> bool {
        self.core
            .with_session(self.session, |s| s.variables.unset_env(name))
            .unwrap_or(false)
    }

    /// Session variables, sorted by name.
    pub fn vars(&self) -> Vec<(String, String)> {
        self.core
            .with_session(self.session, |s| collect_pairs(s.variables.vars()))
            .unwrap_or_default()
    }

    /// Environment variables, sorted by name.
    pub fn env_vars(&self) -> Vec<(String, String)> {
        self.core
            .with_session(self.session, |s| collect_pairs(s.variables.env()))
            .unwrap_or_default()
    }

    /// Expands variable references in a raw input line, ready for `tokenize`.
    pub fn expand_line(&self, line: &str) -> String {
        self.core
            .with_session(self.session, |s| s.variables.expand_for_tokenizer(line))
            .unwrap_or_else(|| line.to_string())
    }

    // --- ALIASES & COMMANDS ---

    /// Defines or replaces an alias, returning the previous target.
    pub fn set_alias(&self, name: &str, target: &str) -> Option<String> {
        self.core.registry.borrow_mut().set_alias(name, target)
    }

    /// Removes an alias. Returns whether it existed.
    pub fn remove_alias(&self, name: &str) -> bool {
        self.core.registry.borrow_mut().remove_alias(name)
    }

    /// The target of an alias.
    pub fn alias(&self, name: &str) -> Option<String> {
        self.core.registry.borrow().alias(name).map(String::from)
    }

    /// All aliases, sorted by name.
    pub fn aliases(&self) -> Vec<(String, String)> {
        collect_pairs(self.core.registry.borrow().aliases())
    }

    /// Looks a registered command up by name.
    pub fn command(&self, name: &str) -> Option<Rc<Command>> {
        self.core.registry.borrow().get(name)
    }

    /// Registered commands, sorted by name.
    pub fn commands(&self, include_hidden: bool) -> Vec<Rc<Command>> {
        self.core.registry.borrow().list(include_hidden)
    }

    // --- JOBS ---

    /// The shell's background jobs.
    pub fn jobs(&self) -> &Rc<JobManager> {
        &self.core.jobs
    }

    // --- SESSION STATE ---

    /// The session's input history, oldest first.
    pub fn history(&self) -> Vec<String> {
        self.core
            .with_session(self.session, |s| s.history.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Forgets the session's input history.
    pub fn clear_history(&self) {
        self.core.with_session(self.session, |s| s.history.clear());
    }

    /// Whether the privileged toggle is on.
    pub fn god_mode(&self) -> bool {
        self.core.state.borrow().god_mode
    }

    /// Flips the privileged toggle for every session.
    pub fn set_god_mode(&self, enabled: bool) {
        self.core.state.borrow_mut().god_mode = enabled;
    }

    /// Asks the frontend to close this session once the command returns.
    pub fn request_exit(&self) {
        self.core.state.borrow_mut().request_exit(self.session);
    }
}

fn collect_pairs<'a>(pairs: impl Iterator<Item = (&'a str, &'a str)>) -> Vec<(String, String)> {
    pairs
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
