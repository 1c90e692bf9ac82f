// src/system/shell.rs

//! # Shell Runtime
//!
//! Owns every component of the interpreter and runs the dispatch pipeline.
//!
//! All state lives in one `ShellCore` behind an `Rc`; tasks are spawned with
//! `spawn_local`, so the whole runtime must be driven from inside a tokio
//! `LocalSet`. Borrows of the `RefCell`s are always released before an `.await`.

use crate::cli::register_builtins;
use crate::core::arg_parser::{FlagError, SchemaError};
use crate::core::commons::escape_markup;
use crate::core::interceptor::InputInterceptor;
use crate::core::jobs::JobManager;
use crate::core::registry::{CommandRegistry, CommandSpec};
use crate::core::render::{ConsoleOutput, OutputEvent};
use crate::core::scope::{CancelOutcome, CancellationToken, Cancelled, ScopeManager};
use crate::core::tokenizer::{ParseError, strip_background_marker, tokenize};
use crate::core::variables::{VariableScope, VariableStore};
use crate::models::{JobId, SessionId, ShellConfig};
use crate::state::ShellState;
use crate::system::context::{CommandContext, OutputSink};
use anyhow::anyhow;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Why a dispatched line failed. Its message is what the console shows.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShellError {
    /// The line could not be tokenized.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// The arguments broke the command's flag schema.
    #[error(transparent)]
    Flag(#[from] FlagError),
    /// No command, after alias resolution, has this name.
    #[error("CommandNotFound: {0}")]
    CommandNotFound(String),
    /// The handler returned an error.
    #[error("{command}: {message}")]
    Handler {
        /// The canonical name of the command that failed.
        command: String,
        /// The handler's error with its context chain.
        message: String,
    },
}

/// Per-session state that is not output.
#[derive(Debug)]
pub(crate) struct SessionData {
    pub(crate) variables: VariableStore,
    pub(crate) history: VecDeque<String>,
}

/// Everything the runtime shares between the shell, its tasks and handlers.
pub(crate) struct ShellCore {
    pub(crate) config: ShellConfig,
    pub(crate) registry: RefCell<CommandRegistry>,
    pub(crate) scopes: ScopeManager,
    pub(crate) jobs: Rc<JobManager>,
    pub(crate) interceptor: InputInterceptor,
    pub(crate) console: RefCell<ConsoleOutput>,
    pub(crate) sessions: RefCell<HashMap<SessionId, SessionData>>,
    pub(crate) state: RefCell<ShellState>,
}

impl ShellCore {
    /// Runs `f` on the session's data; `None` if the session is not open.
    pub(crate) fn with_session<R>(
        &self,
        session: SessionId,
        f: impl FnOnce(&mut SessionData) -> R,
    ) -> Option<R> {
        self.sessions.borrow_mut().get_mut(&session).map(f)
    }

    fn push_history(&self, session: SessionId, line: &str) {
        let limit = self.config.history_limit;
        self.with_session(session, |s| {
            s.history.push_back(line.to_string());
            while s.history.len() > limit {
                s.history.pop_front();
            }
        });
    }

    fn console_print(&self, session: SessionId, text: &str) {
        self.console.borrow_mut().print(text, session);
    }

    fn console_print_error(&self, session: SessionId, text: &str) {
        self.console.borrow_mut().print_error(text, session);
    }
}

/// What happened to a raw input line.
#[derive(Debug)]
pub enum InputOutcome {
    /// A pending input request took the line.
    Consumed,
    /// The line runs as a new foreground task.
    Dispatched(JoinHandle<Result<(), ShellError>>),
}

/// The command interpreter. Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct Shell {
    core: Rc<ShellCore>,
}

impl Shell {
    /// A shell with no commands registered. Aliases from `config` are installed.
    pub fn new(config: ShellConfig) -> Self {
        let mut registry = CommandRegistry::new();
        for (name, target) in &config.aliases {
            registry.set_alias(name, target);
        }
        Self {
            core: Rc::new(ShellCore {
                config,
                registry: RefCell::new(registry),
                scopes: ScopeManager::new(),
                jobs: JobManager::new(),
                interceptor: InputInterceptor::new(),
                console: RefCell::new(ConsoleOutput::new()),
                sessions: RefCell::new(HashMap::new()),
                state: RefCell::new(ShellState::new()),
            }),
        }
    }

    /// A shell with the built-in command set.
    pub fn with_builtins(config: ShellConfig) -> Result<Self, SchemaError> {
        let shell = Self::new(config);
        register_builtins(&shell)?;
        Ok(shell)
    }

    /// The configuration the shell was built with.
    pub fn config(&self) -> &ShellConfig {
        &self.core.config
    }

    /// Registers (or replaces) a command.
    pub fn register(&self, spec: impl Into<CommandSpec>) -> Result<(), SchemaError> {
        self.core.registry.borrow_mut().register(spec)?;
        Ok(())
    }

    // --- SESSIONS ---

    /// Opens a session with the default environment and an empty console.
    pub fn open_session(&self) -> SessionId {
        let session = SessionId::new();
        self.core.sessions.borrow_mut().insert(
            session,
            SessionData {
                variables: VariableStore::with_defaults(&self.core.config),
                history: VecDeque::new(),
            },
        );
        self.core.console.borrow_mut().open(session);
        log::debug!("Opened session {}", session);
        session
    }

    /// Cancels the session's foreground command and running jobs, and drops
    /// all of its state.
    pub fn close_session(&self, session: SessionId) {
        self.core.scopes.discard(session);
        self.core.interceptor.cancel(session);
        let killed = self.core.jobs.kill_session_jobs(session);
        self.core.sessions.borrow_mut().remove(&session);
        self.core.console.borrow_mut().close(session);
        self.core.state.borrow_mut().take_exit_request(session);
        log::debug!("Closed session {} ({} jobs killed)", session, killed);
    }

    /// Whether the session exists and was not closed.
    pub fn is_open(&self, session: SessionId) -> bool {
        self.core.sessions.borrow().contains_key(&session)
    }

    // --- INPUT ---

    /// The raw-input event. A pending input request consumes the line;
    /// otherwise it is dispatched as a new foreground task and this returns at once.
    ///
    /// Must be called from inside a `LocalSet`.
    pub fn handle_input(&self, session: SessionId, line: &str) -> InputOutcome {
        if self.core.interceptor.deliver(session, line) {
            log::debug!("Session {}: input consumed by a waiting command", session);
            return InputOutcome::Consumed;
        }
        let core = Rc::clone(&self.core);
        let line = line.to_string();
        InputOutcome::Dispatched(tokio::task::spawn_local(async move {
            run_line(core, session, &line, None).await
        }))
    }

    /// Runs one line to completion in the current task.
    pub async fn execute(&self, session: SessionId, line: &str) -> Result<(), ShellError> {
        run_line(Rc::clone(&self.core), session, line, None).await
    }

    /// Like `execute`, with `input` available to the command as piped lines.
    pub async fn execute_with_input(
        &self,
        session: SessionId,
        line: &str,
        input: &[&str],
    ) -> Result<(), ShellError> {
        let stdin: Rc<[String]> = input.iter().map(|l| l.to_string()).collect();
        run_line(Rc::clone(&self.core), session, line, Some(stdin)).await
    }

    /// Cancels the session's foreground command (Ctrl+C).
    pub fn cancel(&self, session: SessionId) -> CancelOutcome {
        self.core.scopes.cancel(session)
    }

    /// Whether a command in the session is waiting for a line.
    pub fn has_pending_input(&self, session: SessionId) -> bool {
        self.core.interceptor.has_pending(session)
    }

    /// Starts `line` as a background job and returns its id immediately.
    pub fn create_job(&self, session: SessionId, line: &str) -> JobId {
        start_job(&self.core, session, line, None)
    }

    /// The background jobs of every session.
    pub fn jobs(&self) -> &Rc<JobManager> {
        &self.core.jobs
    }

    // --- OUTPUT & STATE ---

    /// Routes output changes of every session to the returned receiver.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<OutputEvent> {
        self.core.console.borrow_mut().subscribe()
    }

    /// The session's console as markup lines.
    pub fn output(&self, session: SessionId) -> Vec<String> {
        self.core
            .console
            .borrow()
            .buffer(session)
            .map(|b| b.markup_lines())
            .unwrap_or_default()
    }

    /// The session's console as plain text lines.
    pub fn plain_output(&self, session: SessionId) -> Vec<String> {
        self.core
            .console
            .borrow()
            .buffer(session)
            .map(|b| b.plain_lines())
            .unwrap_or_default()
    }

    /// The session's input history, oldest first.
    pub fn history(&self, session: SessionId) -> Vec<String> {
        self.core
            .with_session(session, |s| s.history.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Reads a session variable.
    pub fn var(&self, session: SessionId, name: &str) -> Option<String> {
        self.core
            .with_session(session, |s| s.variables.get_var(name).map(String::from))
            .flatten()
    }

    /// Reads an environment variable.
    pub fn env_var(&self, session: SessionId, name: &str) -> Option<String> {
        self.core
            .with_session(session, |s| s.variables.get_env(name).map(String::from))
            .flatten()
    }

    /// The prompt for the session, from the config template.
    pub fn prompt(&self, session: SessionId) -> String {
        let user = self.env_var(session, "USER").unwrap_or_default();
        let cwd = self.env_var(session, "PWD").unwrap_or_default();
        let home = self.env_var(session, "HOME").unwrap_or_default();
        crate::core::config::render_prompt(&self.core.config.prompt, &user, &cwd, &home)
    }

    /// Whether the privileged toggle is on.
    pub fn god_mode(&self) -> bool {
        self.core.state.borrow().god_mode
    }

    /// Consumes a pending `exit` request for the session.
    pub fn take_exit_request(&self, session: SessionId) -> bool {
        self.core.state.borrow_mut().take_exit_request(session)
    }

    /// Turns the privileged toggle off and drops pending exit requests.
    pub fn reset_state(&self) {
        self.core.state.borrow_mut().reset();
    }
}

// --- PIPELINE ---

/// The foreground pipeline for one input line.
async fn run_line(
    core: Rc<ShellCore>,
    session: SessionId,
    line: &str,
    stdin: Option<Rc<[String]>>,
) -> Result<(), ShellError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(());
    }
    core.push_history(session, line);

    let assignment = core
        .with_session(session, |s| s.variables.handle_assignment(line))
        .flatten();
    if let Some(assignment) = assignment {
        let report = match assignment.scope {
            VariableScope::Session => format!("{}={}", assignment.name, assignment.value),
            VariableScope::Environment => {
                format!("export {}={}", assignment.name, assignment.value)
            }
        };
        core.console_print(session, &escape_markup(&report));
        return Ok(());
    }

    if let Some(command) = strip_background_marker(line) {
        let id = start_job(&core, session, command, stdin);
        core.console_print(session, &format!("[{}] started", id));
        return Ok(());
    }

    let scope = core.scopes.begin(session);
    let guard_core = Rc::clone(&core);
    let _scope_guard = scopeguard::guard(scope.id, move |id| {
        guard_core.scopes.finish(session, id);
    });

    let ctx = CommandContext::new(
        Rc::clone(&core),
        session,
        OutputSink::Console,
        scope.token,
        stdin,
    );
    let result = dispatch(&ctx, line).await;
    if let Err(e) = &result {
        log::debug!("Session {}: '{}' failed: {}", session, line, e);
        core.console_print_error(session, &escape_markup(&e.to_string()));
    }
    result
}

fn start_job(
    core: &Rc<ShellCore>,
    session: SessionId,
    line: &str,
    stdin: Option<Rc<[String]>>,
) -> JobId {
    let job_core = Rc::clone(core);
    let job_line = line.to_string();
    core.jobs
        .create_job(session, line, move |id, token: CancellationToken| {
            let ctx = CommandContext::new(job_core, session, OutputSink::Job(id), token, stdin);
            async move {
                // Job errors are recorded on the job, not printed.
                dispatch(&ctx, &job_line).await.map_err(|e| anyhow!(e))
            }
        })
}

/// Expansion, tokenizing, alias resolution, lookup, parsing and invocation.
/// A handler that stops with `Cancelled` counts as a success.
async fn dispatch(ctx: &CommandContext, line: &str) -> Result<(), ShellError> {
    let expanded = ctx.expand_line(line);
    let tokens = tokenize(&expanded)?;
    let Some((name, rest)) = tokens.split_first() else {
        return Ok(());
    };

    let core = ctx.core();
    let resolution = core.registry.borrow().resolve(name);
    let command = core
        .registry
        .borrow()
        .get(&resolution.command)
        .ok_or_else(|| ShellError::CommandNotFound(resolution.command.clone()))?;

    let mut argv = resolution.args;
    argv.extend_from_slice(rest);
    let args = command.parse(&argv)?;

    log::debug!(
        "Session {}: dispatching '{}' with {:?}",
        ctx.session(),
        command.name,
        args
    );
    match command.invoke(args, ctx.clone()).await {
        Ok(()) => Ok(()),
        Err(e) if e.is::<Cancelled>() => {
            log::debug!("Session {}: '{}' was cancelled", ctx.session(), command.name);
            Ok(())
        }
        Err(e) => Err(ShellError::Handler {
            command: command.name.clone(),
            message: format!("{:#}", e),
        }),
    }
}
