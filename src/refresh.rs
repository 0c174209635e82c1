//! Background auto-refresh scheduling
//!
//! A `RefreshScheduler` calls a caller-supplied async refetch function once per
//! interval until stopped. The interval is external state observed through a
//! `watch` channel; the ticker task is the only place it is applied, so a change
//! swaps the single pending deadline instead of stacking a second timer. Progress
//! and failures are reported over an mpsc channel to the owning application.

use futures::future::{BoxFuture, FutureExt};
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Intervals shorter than this are raised to it
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

/// Intervals longer than this are lowered to it
pub const MAX_REFRESH_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Capacity of the message channel handed back by [`RefreshScheduler::spawn`]
const MESSAGE_CHANNEL_CAPACITY: usize = 32;

/// Zero-argument async operation invoked on every tick
pub type RefetchFn = Arc<dyn Fn() -> BoxFuture<'static, Result<(), String>> + Send + Sync>;

/// Wraps an async closure as a [`RefetchFn`], stringifying its error
pub fn refetch_fn<F, Fut, E>(f: F) -> RefetchFn
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
    E: Display + Send + 'static,
{
    Arc::new(move || {
        let fut = f();
        async move { fut.await.map_err(|e| e.to_string()) }.boxed()
    })
}

/// Messages sent from the scheduler to the owning application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshMessage {
    /// A tick fired and the refetch function was invoked
    RefreshStarted,
    /// The refetch function resolved successfully
    RefreshCompleted,
    /// The refetch function failed; the schedule keeps running
    RefreshError(String),
    /// A tick fired while the previous refetch was still running
    TickSkipped,
}

/// What to do when a tick fires while the previous refetch is still pending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlapPolicy {
    /// Drop the tick; at most one refetch runs at a time
    #[default]
    SkipIfInFlight,
    /// Start another refetch regardless
    Allow,
}

/// Observable scheduler state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleState {
    Stopped,
    Running,
}

/// Configuration for a refresh schedule
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Behaviour when ticks overlap a slow refetch
    pub overlap: OverlapPolicy,
    /// Whether the schedule starts running as soon as it is spawned
    pub enabled: bool,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            overlap: OverlapPolicy::SkipIfInFlight,
            enabled: true,
        }
    }
}

/// Controller owning the single ticker task of one refresh schedule
///
/// Dropping the scheduler cancels its timer. Refetch calls already in flight are
/// left to finish on their own.
pub struct RefreshScheduler {
    refetch: RefetchFn,
    interval: watch::Receiver<Duration>,
    overlap: OverlapPolicy,
    messages: mpsc::Sender<RefreshMessage>,
    ticker: Option<JoinHandle<()>>,
}

impl RefreshScheduler {
    /// Creates a scheduler and, if enabled, starts ticking
    ///
    /// # Arguments
    /// * `refetch` - Operation to call on every tick
    /// * `interval` - Live interval value; the sender stays with the caller
    /// * `config` - Overlap policy and whether to start immediately
    ///
    /// # Returns
    /// The scheduler plus the receiving end of its message channel.
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        refetch: RefetchFn,
        interval: watch::Receiver<Duration>,
        config: RefreshConfig,
    ) -> (Self, mpsc::Receiver<RefreshMessage>) {
        let (tx, rx) = mpsc::channel(MESSAGE_CHANNEL_CAPACITY);

        let mut scheduler = Self {
            refetch,
            interval,
            overlap: config.overlap,
            messages: tx,
            ticker: None,
        };

        if config.enabled {
            scheduler.start();
        }

        (scheduler, rx)
    }

    /// Current state of the schedule
    pub fn state(&self) -> ScheduleState {
        match self.ticker {
            Some(_) => ScheduleState::Running,
            None => ScheduleState::Stopped,
        }
    }

    /// Begins ticking with the current interval; no-op when already running
    ///
    /// The first refetch happens one full interval after this call.
    pub fn start(&mut self) {
        if self.ticker.is_some() {
            return;
        }

        let period = effective_interval(*self.interval.borrow());
        let ticker = Ticker {
            refetch: Arc::clone(&self.refetch),
            interval: self.interval.clone(),
            overlap: self.overlap,
            messages: self.messages.clone(),
            period,
            deadline: Instant::now() + period,
        };

        tracing::info!(interval_secs = period.as_secs_f64(), "auto-refresh started");
        self.ticker = Some(tokio::spawn(ticker.run()));
    }

    /// Cancels the pending timer; no-op when already stopped
    pub fn stop(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
            tracing::info!("auto-refresh stopped");
        }
    }

    /// Tears the schedule down for good
    pub fn shutdown(mut self) {
        self.stop();
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
    }
}

/// Clamps an interval into [`MIN_REFRESH_INTERVAL`, `MAX_REFRESH_INTERVAL`]
fn effective_interval(requested: Duration) -> Duration {
    if requested < MIN_REFRESH_INTERVAL {
        tracing::warn!(
            requested_ms = requested.as_millis() as u64,
            "refresh interval too short, using minimum"
        );
        MIN_REFRESH_INTERVAL
    } else if requested > MAX_REFRESH_INTERVAL {
        tracing::warn!(
            requested_secs = requested.as_secs(),
            "refresh interval too long, using maximum"
        );
        MAX_REFRESH_INTERVAL
    } else {
        requested
    }
}

/// Sends a message without waiting; a full or closed channel drops it
fn emit(messages: &mpsc::Sender<RefreshMessage>, msg: RefreshMessage) {
    if let Err(TrySendError::Full(msg)) = messages.try_send(msg) {
        tracing::debug!(?msg, "refresh message channel full, dropping");
    }
}

/// State owned by the background ticker task
struct Ticker {
    refetch: RefetchFn,
    interval: watch::Receiver<Duration>,
    overlap: OverlapPolicy,
    messages: mpsc::Sender<RefreshMessage>,
    period: Duration,
    deadline: Instant,
}

impl Ticker {
    async fn run(mut self) {
        let mut in_flight: Option<JoinHandle<()>> = None;
        let mut interval_open = true;

        loop {
            tokio::select! {
                _ = tokio::time::sleep_until(self.deadline) => {
                    self.advance_deadline();

                    let busy = in_flight.as_ref().is_some_and(|h| !h.is_finished());
                    if busy && self.overlap == OverlapPolicy::SkipIfInFlight {
                        tracing::debug!("previous refresh still running, skipping tick");
                        emit(&self.messages, RefreshMessage::TickSkipped);
                        continue;
                    }

                    in_flight = Some(tokio::spawn(run_tick(
                        Arc::clone(&self.refetch),
                        self.messages.clone(),
                    )));
                }
                changed = self.interval.changed(), if interval_open => {
                    if changed.is_err() {
                        // Owner went away; keep the last interval we saw
                        interval_open = false;
                        continue;
                    }
                    self.reconfigure();
                }
            }
        }
    }

    fn advance_deadline(&mut self) {
        let now = Instant::now();
        self.deadline += self.period;
        if self.deadline <= now {
            self.deadline = now + self.period;
        }
    }

    /// Replaces the pending deadline when the interval value changes
    fn reconfigure(&mut self) {
        let period = effective_interval(*self.interval.borrow_and_update());
        if period == self.period {
            return;
        }

        self.period = period;
        self.deadline = Instant::now() + period;
        tracing::info!(interval_secs = period.as_secs_f64(), "auto-refresh interval changed");
    }
}

/// Runs one refetch and reports its outcome
async fn run_tick(refetch: RefetchFn, messages: mpsc::Sender<RefreshMessage>) {
    emit(&messages, RefreshMessage::RefreshStarted);

    match refetch().await {
        Ok(()) => emit(&messages, RefreshMessage::RefreshCompleted),
        Err(e) => {
            tracing::warn!(error = %e, "auto-refresh failed");
            emit(&messages, RefreshMessage::RefreshError(e));
        }
    }
}

/// Checks for a pending refresh message without blocking
pub fn try_recv(receiver: &mut mpsc::Receiver<RefreshMessage>) -> Option<RefreshMessage> {
    receiver.try_recv().ok()
}
