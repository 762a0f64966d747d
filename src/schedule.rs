//! Daily scheduling.
//!
//! A `tokio-cron-scheduler` job fires at the configured wall-clock time in a
//! fixed UTC offset and signals the run loop over a channel. The loop runs
//! the job under a timeout and logs run and success counts. Runs never
//! overlap: the loop awaits each one before taking the next trigger, and a
//! trigger that arrives while one is already queued is dropped.

use crate::error::{ConfigError, ScheduleError};
use chrono::{DateTime, Duration as TimeDelta, FixedOffset, NaiveTime, Timelike, Utc};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, instrument, warn};

/// Parse a `HH:MM` run time.
pub fn parse_daily_at(s: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
        .map_err(|e| ConfigError::Invalid(format!("run time {s:?} is not HH:MM: {e}")))
}

/// A fixed offset from whole hours.
pub fn offset_hours(hours: i32) -> Result<FixedOffset, ConfigError> {
    FixedOffset::east_opt(hours * 3600)
        .ok_or_else(|| ConfigError::Invalid(format!("UTC offset {hours}h is out of range")))
}

/// The next occurrence of `at` strictly after `now`, in `now`'s offset.
pub fn next_run_after(now: DateTime<FixedOffset>, at: NaiveTime) -> DateTime<FixedOffset> {
    let local_now = now.naive_local();
    let today = local_now.date().and_time(at);
    let next = if today > local_now {
        today
    } else {
        today + TimeDelta::days(1)
    };
    now + (next - local_now)
}

/// Six-field cron expression (seconds first) that fires daily at `at`.
pub fn daily_cron(at: NaiveTime) -> String {
    format!("0 {} {} * * *", at.minute(), at.hour())
}

/// The cron job behind the daily schedule. It only sends a trigger; the
/// run itself happens on the task that owns the receiver.
pub fn daily_trigger(
    at: NaiveTime,
    offset: FixedOffset,
    triggers: mpsc::Sender<()>,
) -> Result<Job, ScheduleError> {
    let job = Job::new_async_tz(daily_cron(at).as_str(), offset, move |_uuid, _lock| {
        let triggers = triggers.clone();
        Box::pin(async move {
            if triggers.try_send(()).is_err() {
                warn!("A run is already pending; dropping this trigger");
            }
        })
    })?;
    Ok(job)
}

/// How one scheduled run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Succeeded,
    Failed(String),
    TimedOut(Duration),
}

impl RunOutcome {
    pub fn failure_message(&self) -> Option<String> {
        match self {
            RunOutcome::Succeeded => None,
            RunOutcome::Failed(reason) => Some(reason.clone()),
            RunOutcome::TimedOut(limit) => {
                Some(format!("run exceeded the {}s time limit", limit.as_secs()))
            }
        }
    }
}

#[derive(Debug)]
pub struct Scheduler {
    at: NaiveTime,
    offset: FixedOffset,
    run_timeout: Duration,
    runs: u64,
    successes: u64,
}

impl Scheduler {
    pub fn new(at: NaiveTime, offset: FixedOffset, run_timeout: Duration) -> Self {
        Self {
            at,
            offset,
            run_timeout,
            runs: 0,
            successes: 0,
        }
    }

    pub fn runs(&self) -> u64 {
        self.runs
    }

    pub fn successes(&self) -> u64 {
        self.successes
    }

    /// Run one job under the time limit and record the outcome.
    #[instrument(level = "info", skip_all, fields(run = self.runs + 1))]
    pub async fn run_bounded<Fut, E>(&mut self, job: Fut) -> RunOutcome
    where
        Fut: Future<Output = Result<(), E>>,
        E: Display,
    {
        self.runs += 1;
        let outcome = match timeout(self.run_timeout, job).await {
            Ok(Ok(())) => {
                self.successes += 1;
                RunOutcome::Succeeded
            }
            Ok(Err(e)) => RunOutcome::Failed(e.to_string()),
            Err(_) => RunOutcome::TimedOut(self.run_timeout),
        };

        match outcome.failure_message() {
            None => info!(runs = self.runs, successes = self.successes, "Scheduled run finished"),
            Some(reason) => error!(
                runs = self.runs,
                successes = self.successes,
                %reason,
                "Scheduled run failed"
            ),
        }
        outcome
    }

    /// Run `job` every day at the configured time, forever.
    ///
    /// `on_failure` receives the reason whenever a run fails or times out.
    /// Returns only if the cron scheduler cannot be set up or stops.
    pub async fn run_daily<J, JFut, E, N, NFut>(
        &mut self,
        job: J,
        on_failure: N,
    ) -> Result<(), ScheduleError>
    where
        J: FnMut() -> JFut,
        JFut: Future<Output = Result<(), E>>,
        E: Display,
        N: FnMut(String) -> NFut,
        NFut: Future<Output = ()>,
    {
        let (triggers, pending) = mpsc::channel(1);
        let mut cron = JobScheduler::new().await?;
        cron.add(daily_trigger(self.at, self.offset, triggers)?).await?;
        cron.start().await?;
        info!(
            at = %self.at,
            offset = %self.offset,
            cron = %daily_cron(self.at),
            "Daily schedule active"
        );
        self.log_next_run();

        self.drain(pending, job, on_failure).await;
        cron.shutdown().await?;
        Ok(())
    }

    /// One run per received trigger, until every sender is gone.
    async fn drain<J, JFut, E, N, NFut>(
        &mut self,
        mut pending: mpsc::Receiver<()>,
        mut job: J,
        mut on_failure: N,
    ) where
        J: FnMut() -> JFut,
        JFut: Future<Output = Result<(), E>>,
        E: Display,
        N: FnMut(String) -> NFut,
        NFut: Future<Output = ()>,
    {
        while pending.recv().await.is_some() {
            let outcome = self.run_bounded(job()).await;
            if let Some(reason) = outcome.failure_message() {
                on_failure(reason).await;
            }
            self.log_next_run();
        }
    }

    fn log_next_run(&self) {
        let next = next_run_after(Utc::now().with_timezone(&self.offset), self.at);
        info!(next_run = %next.to_rfc3339(), "Waiting for next run");
    }
}
