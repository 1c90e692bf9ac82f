//! # Background Job Manager
//!
//! Wraps a command invocation as a tracked `spawn_local` task. Every job owns an
//! output buffer that its prints land in instead of the live console, and a
//! cancellation token that `kill_job` fires.
//!
//! Status moves `running -> completed | failed | killed` exactly once. Killing is
//! cooperative: the record is marked killed at once, but the task only stops
//! when it next observes its token. Whatever it returns afterwards is ignored.

use crate::core::render::{OutputBuffer, OutputGroup, UpdateOutcome};
use crate::core::scope::{CancellationToken, Cancelled};
use crate::models::{GroupId, JobId, JobStatus, OutputKind, SessionId};
use chrono::{DateTime, Local};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::future::Future;
use std::rc::Rc;
use thiserror::Error;
use tokio::sync::Notify;

/// Why a job reference could not be used.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    /// No job has this id.
    #[error("JobError: no such job: {0}")]
    NotFound(JobId),
    /// The text is not a job reference.
    #[error("JobError: invalid job id '{0}' (expected N or %N)")]
    InvalidId(String),
}

/// Parses a job reference as typed by a user: `3` or `%3`.
pub fn parse_job_id(text: &str) -> Result<JobId, JobError> {
    let digits = text.trim().strip_prefix('%').unwrap_or(text.trim());
    digits
        .parse::<u64>()
        .ok()
        .filter(|n| *n > 0)
        .map(JobId)
        .ok_or_else(|| JobError::InvalidId(text.to_string()))
}

/// What `kill_job` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillOutcome {
    /// The job was running and is now marked killed.
    Killed,
    /// The job had already settled; nothing changed.
    AlreadyFinished(JobStatus),
}

/// Which jobs `list` returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobFilter {
    /// Only jobs still running.
    Running,
    /// Every job, settled ones included.
    All,
}

struct JobRecord {
    session: SessionId,
    command: String,
    status: JobStatus,
    started_at: DateTime<Local>,
    ended_at: Option<DateTime<Local>>,
    output: OutputBuffer,
    error: Option<String>,
    token: CancellationToken,
}

/// A point-in-time copy of a job, safe to hold across suspension points.
#[derive(Debug, Clone)]
pub struct JobSnapshot {
    /// The job's id.
    pub id: JobId,
    /// The session that started the job.
    pub session: SessionId,
    /// The command line, without the `&`.
    pub command: String,
    /// Status at the time of the snapshot.
    pub status: JobStatus,
    /// When the job was spawned.
    pub started_at: DateTime<Local>,
    /// When the job settled, if it has.
    pub ended_at: Option<DateTime<Local>>,
    /// The groups the job printed.
    pub output: Vec<OutputGroup>,
    /// The handler's error, for failed jobs.
    pub error: Option<String>,
}

impl JobSnapshot {
    /// Captured output as plain text lines.
    pub fn output_lines(&self) -> Vec<String> {
        self.output
            .iter()
            .flat_map(|g| g.lines.iter().map(|l| l.plain()))
            .collect()
    }

    /// Run time so far, or in total once settled.
    pub fn elapsed(&self) -> chrono::Duration {
        self.ended_at.unwrap_or_else(Local::now) - self.started_at
    }
}

/// Every background job of the shell, keyed by id.
#[derive(Default)]
pub struct JobManager {
    jobs: RefCell<BTreeMap<JobId, JobRecord>>,
    next_id: Cell<u64>,
    settled: Notify,
}

impl JobManager {
    /// An empty manager. Job ids start at 1.
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Registers a running job and spawns `run` onto the local task set.
    /// Returns without waiting; the job first runs at the caller's next yield.
    ///
    /// Must be called from inside a `LocalSet`.
    pub fn create_job<F, Fut>(self: &Rc<Self>, session: SessionId, command: &str, run: F) -> JobId
    where
        F: FnOnce(JobId, CancellationToken) -> Fut,
        Fut: Future<Output = anyhow::Result<()>> + 'static,
    {
        // Ids are never reused, even after `clear_finished`.
        let id = JobId(self.next_id.get() + 1);
        self.next_id.set(id.0);
        let token = CancellationToken::new();

        self.jobs.borrow_mut().insert(
            id,
            JobRecord {
                session,
                command: command.to_string(),
                status: JobStatus::Running,
                started_at: Local::now(),
                ended_at: None,
                output: OutputBuffer::new(),
                error: None,
                token: token.clone(),
            },
        );
        log::debug!("Job {} started: {}", id, command);

        let task = run(id, token);
        let manager = Rc::clone(self);
        tokio::task::spawn_local(async move {
            let result = task.await;
            manager.settle(id, result);
        });
        id
    }

    fn settle(&self, id: JobId, result: anyhow::Result<()>) {
        {
            let mut jobs = self.jobs.borrow_mut();
            let Some(job) = jobs.get_mut(&id) else {
                return;
            };
            if job.status.is_terminal() {
                log::debug!("Job {} finished after being {}; result ignored.", id, job.status);
                return;
            }
            job.status = match result {
                Ok(()) => JobStatus::Completed,
                Err(e) if e.is::<Cancelled>() => JobStatus::Killed,
                Err(e) => {
                    job.error = Some(e.to_string());
                    JobStatus::Failed
                }
            };
            job.ended_at = Some(Local::now());
            log::debug!("Job {} settled as {}", id, job.status);
        }
        self.settled.notify_waiters();
    }

    /// Marks a running job killed and fires its token. A job that already
    /// settled is left as it is.
    pub fn kill_job(&self, id: JobId) -> Result<KillOutcome, JobError> {
        let token = {
            let mut jobs = self.jobs.borrow_mut();
            let job = jobs.get_mut(&id).ok_or(JobError::NotFound(id))?;
            if job.status.is_terminal() {
                return Ok(KillOutcome::AlreadyFinished(job.status));
            }
            job.status = JobStatus::Killed;
            job.ended_at = Some(Local::now());
            job.token.clone()
        };
        log::debug!("Job {} killed", id);
        token.fire();
        self.settled.notify_waiters();
        Ok(KillOutcome::Killed)
    }

    /// Kills every running job started from `session`.
    pub fn kill_session_jobs(&self, session: SessionId) -> usize {
        let running: Vec<JobId> = self
            .jobs
            .borrow()
            .iter()
            .filter(|(_, job)| job.session == session && job.status == JobStatus::Running)
            .map(|(id, _)| *id)
            .collect();
        running
            .into_iter()
            .filter(|id| matches!(self.kill_job(*id), Ok(KillOutcome::Killed)))
            .count()
    }

    /// A snapshot of one job.
    pub fn get(&self, id: JobId) -> Option<JobSnapshot> {
        self.jobs.borrow().get(&id).map(|job| snapshot(id, job))
    }

    /// Snapshots in id order.
    pub fn list(&self, filter: JobFilter) -> Vec<JobSnapshot> {
        self.jobs
            .borrow()
            .iter()
            .filter(|(_, job)| filter == JobFilter::All || job.status == JobStatus::Running)
            .map(|(id, job)| snapshot(*id, job))
            .collect()
    }

    /// Removes every job that is no longer running. Returns how many went.
    pub fn clear_finished(&self) -> usize {
        let mut jobs = self.jobs.borrow_mut();
        let before = jobs.len();
        jobs.retain(|_, job| job.status == JobStatus::Running);
        before - jobs.len()
    }

    /// Suspends until the job reaches a terminal state, then returns it.
    pub async fn wait(&self, id: JobId) -> Result<JobSnapshot, JobError> {
        loop {
            let notified = self.settled.notified();
            let job = self.get(id).ok_or(JobError::NotFound(id))?;
            if job.status.is_terminal() {
                return Ok(job);
            }
            notified.await;
        }
    }

    // --- JOB OUTPUT ---

    /// Appends to a job's captured output.
    pub fn print(&self, id: JobId, text: &str, kind: OutputKind) -> Option<GroupId> {
        self.jobs
            .borrow_mut()
            .get_mut(&id)
            .map(|job| job.output.print(text, kind))
    }

    /// Rewrites a group of a job's captured output.
    pub fn update_output(&self, id: JobId, group: GroupId, text: &str) -> bool {
        self.jobs
            .borrow_mut()
            .get_mut(&id)
            .is_some_and(|job| job.output.update(group, text) != UpdateOutcome::Missing)
    }

    /// Removes a group from a job's captured output.
    pub fn delete_output(&self, id: JobId, group: GroupId) -> bool {
        self.jobs
            .borrow_mut()
            .get_mut(&id)
            .is_some_and(|job| job.output.delete(group))
    }

    /// Empties a job's captured output.
    pub fn clear_output(&self, id: JobId) {
        if let Some(job) = self.jobs.borrow_mut().get_mut(&id) {
            job.output.clear();
        }
    }
}

fn snapshot(id: JobId, job: &JobRecord) -> JobSnapshot {
    JobSnapshot {
        id,
        session: job.session,
        command: job.command.clone(),
        status: job.status,
        started_at: job.started_at,
        ended_at: job.ended_at,
        output: job.output.groups().to_vec(),
        error: job.error.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::time::Duration;
    use tokio::task::LocalSet;

    #[test]
    fn test_parse_job_id() {
        assert_eq!(parse_job_id("3"), Ok(JobId(3)));
        assert_eq!(parse_job_id("%12"), Ok(JobId(12)));
        assert!(matches!(parse_job_id("%"), Err(JobError::InvalidId(_))));
        assert!(matches!(parse_job_id("0"), Err(JobError::InvalidId(_))));
        assert!(matches!(parse_job_id("abc"), Err(JobError::InvalidId(_))));
    }

    #[tokio::test]
    async fn test_job_runs_to_completion_with_captured_output() {
        LocalSet::new()
            .run_until(async {
                let jobs = JobManager::new();
                let printer = Rc::clone(&jobs);
                let id = jobs.create_job(SessionId::new(), "echo hi", move |id, _| async move {
                    printer.print(id, "hi", OutputKind::Output);
                    Ok(())
                });

                assert_eq!(jobs.get(id).unwrap().status, JobStatus::Running);

                let done = jobs.wait(id).await.unwrap();
                assert_eq!(done.status, JobStatus::Completed);
                assert_eq!(done.output_lines(), vec!["hi"]);
                assert!(done.ended_at.is_some());
            })
            .await;
    }

    #[tokio::test]
    async fn test_failing_job_records_error() {
        LocalSet::new()
            .run_until(async {
                let jobs = JobManager::new();
                let id = jobs.create_job(SessionId::new(), "boom", |_, _| async {
                    Err(anyhow!("it broke"))
                });
                let done = jobs.wait(id).await.unwrap();
                assert_eq!(done.status, JobStatus::Failed);
                assert_eq!(done.error.as_deref(), Some("it broke"));
            })
            .await;
    }

    #[tokio::test]
    async fn test_kill_is_final_and_fires_token() {
        LocalSet::new()
            .run_until(async {
                let jobs = JobManager::new();
                let id = jobs.create_job(SessionId::new(), "sleep 60", |_, token| async move {
                    token.cancelled().await;
                    // Whatever the task reports after a kill is ignored.
                    Ok(())
                });
                tokio::time::sleep(Duration::from_millis(1)).await;

                assert_eq!(jobs.kill_job(id), Ok(KillOutcome::Killed));
                assert_eq!(
                    jobs.kill_job(id),
                    Ok(KillOutcome::AlreadyFinished(JobStatus::Killed))
                );

                tokio::time::sleep(Duration::from_millis(1)).await;
                assert_eq!(jobs.get(id).unwrap().status, JobStatus::Killed);
                assert_eq!(jobs.kill_job(JobId(999)), Err(JobError::NotFound(JobId(999))));
            })
            .await;
    }

    #[tokio::test]
    async fn test_kill_after_completion_is_a_no_op() {
        LocalSet::new()
            .run_until(async {
                let jobs = JobManager::new();
                let id = jobs.create_job(SessionId::new(), "true", |_, _| async { Ok(()) });
                jobs.wait(id).await.unwrap();
                assert_eq!(
                    jobs.kill_job(id),
                    Ok(KillOutcome::AlreadyFinished(JobStatus::Completed))
                );
            })
            .await;
    }

    #[tokio::test]
    async fn test_listing_and_clearing() {
        LocalSet::new()
            .run_until(async {
                let jobs = JobManager::new();
                let session = SessionId::new();
                let quick = jobs.create_job(session, "quick", |_, _| async { Ok(()) });
                let slow = jobs.create_job(session, "slow", |_, token| async move {
                    token.cancelled().await;
                    Err(Cancelled.into())
                });
                jobs.wait(quick).await.unwrap();

                assert_eq!(jobs.list(JobFilter::All).len(), 2);
                let running = jobs.list(JobFilter::Running);
                assert_eq!(running.len(), 1);
                assert_eq!(running[0].id, slow);

                assert_eq!(jobs.clear_finished(), 1);
                assert_eq!(jobs.kill_session_jobs(session), 1);
                assert_eq!(jobs.clear_finished(), 1);
                assert!(jobs.list(JobFilter::All).is_empty());

                // Ids keep increasing after a clear.
                let next = jobs.create_job(session, "again", |_, _| async { Ok(()) });
                assert_eq!(next, JobId(3));
            })
            .await;
    }
}
