//! Foreground session tracking.
//!
//! A [`SessionTracker`] polls a [`ForegroundProbe`] on a fixed interval and
//! turns focus changes into closed [`WindowSession`]s, one store write per
//! closed session. The transition rules live in [`TrackerState`] so they can
//! be exercised without a runtime.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use worklog_storage::{ActivityStore, WindowSession};

use crate::clock::{Clock, SystemClock};
use crate::monitor::{ForegroundProbe, ForegroundWindow};

/// Poll intervals below this are clamped up
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Stop waits this many poll intervals for the loop to exit
const STOP_GRACE_INTERVALS: u32 = 3;

/// The session currently holding focus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenSession {
    pub process_name: String,
    pub window_title: String,
    pub started_at: DateTime<Utc>,
}

impl OpenSession {
    fn open(window: ForegroundWindow, at: DateTime<Utc>) -> Self {
        Self {
            process_name: window.process_name,
            window_title: window.window_title,
            started_at: at,
        }
    }

    fn is_showing(&self, window: &ForegroundWindow) -> bool {
        self.process_name == window.process_name && self.window_title == window.window_title
    }

    fn close(self, at: DateTime<Utc>) -> WindowSession {
        WindowSession::closed(self.process_name, self.window_title, self.started_at, at)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TrackerState {
    #[default]
    Stopped,
    Running(Option<OpenSession>),
}

impl TrackerState {
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running(_))
    }

    #[must_use]
    pub fn open_session(&self) -> Option<&OpenSession> {
        match self {
            Self::Running(open) => open.as_ref(),
            Self::Stopped => None,
        }
    }

    /// Stopped -> Running with no session. Returns false if already running.
    pub fn begin(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        *self = Self::Running(None);
        true
    }

    /// Apply one probe sample taken at `now`.
    ///
    /// Returns the session this sample closed, if any. No signal, a matching
    /// window, or a stopped tracker leave the state untouched.
    pub fn observe(
        &mut self,
        sample: Option<ForegroundWindow>,
        now: DateTime<Utc>,
    ) -> Option<WindowSession> {
        let Self::Running(open) = self else {
            return None;
        };
        let window = sample?;
        if open.as_ref().is_some_and(|session| session.is_showing(&window)) {
            return None;
        }

        let closed = open.take().map(|session| session.close(now));
        *open = Some(OpenSession::open(window, now));
        closed
    }

    /// Running -> Stopped, closing the open session at `now`
    pub fn finish(&mut self, now: DateTime<Utc>) -> Option<WindowSession> {
        match std::mem::take(self) {
            Self::Running(open) => open.map(|session| session.close(now)),
            Self::Stopped => None,
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[must_use]
pub fn clamp_poll_interval(seconds: u64) -> Duration {
    Duration::from_secs(seconds).max(MIN_POLL_INTERVAL)
}

struct TrackerCore {
    probe: Arc<dyn ForegroundProbe>,
    store: Arc<dyn ActivityStore>,
    clock: Arc<dyn Clock>,
    poll_interval: Duration,
    state: Mutex<TrackerState>,
}

impl TrackerCore {
    async fn tick(&self) -> Result<Option<WindowSession>> {
        let sample = self.probe.sample().await;
        let now = self.clock.now();

        let Some(closed) = lock(&self.state).observe(sample, now) else {
            return Ok(None);
        };

        log::debug!(
            "Focus left {} - {} after {:.1}s",
            closed.process_name,
            closed.window_title,
            closed.duration_seconds.unwrap_or_default()
        );
        self.persist(&closed)?;
        Ok(Some(closed))
    }

    fn persist(&self, session: &WindowSession) -> Result<()> {
        self.store
            .insert_session(session)
            .with_context(|| format!("Failed to save session for {}", session.process_name))?;
        Ok(())
    }
}

async fn poll_loop(core: Arc<TrackerCore>, cancel: CancellationToken) {
    log::info!(
        "Tracking foreground windows with {} every {:?}",
        core.probe.name(),
        core.poll_interval
    );

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(core.poll_interval) => {}
        }

        if let Err(e) = core.tick().await {
            log::error!("Tracker tick failed: {e:#}");
        }
    }

    log::info!("Tracker loop stopped");
}

struct Worker {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owns the tracker state and its polling task
pub struct SessionTracker {
    core: Arc<TrackerCore>,
    worker: Mutex<Option<Worker>>,
}

impl SessionTracker {
    #[must_use]
    pub fn new(
        probe: Arc<dyn ForegroundProbe>,
        store: Arc<dyn ActivityStore>,
        poll_interval_seconds: u64,
    ) -> Self {
        Self::with_clock(probe, store, poll_interval_seconds, Arc::new(SystemClock))
    }

    #[must_use]
    pub fn with_clock(
        probe: Arc<dyn ForegroundProbe>,
        store: Arc<dyn ActivityStore>,
        poll_interval_seconds: u64,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            core: Arc::new(TrackerCore {
                probe,
                store,
                clock,
                poll_interval: clamp_poll_interval(poll_interval_seconds),
                state: Mutex::new(TrackerState::Stopped),
            }),
            worker: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.core.poll_interval
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        lock(&self.core.state).is_running()
    }

    #[must_use]
    pub fn state(&self) -> TrackerState {
        lock(&self.core.state).clone()
    }

    /// Begin tracking on a background task.
    ///
    /// Must be called from within a tokio runtime. Returns false when the
    /// tracker was already running.
    pub fn start(&self) -> bool {
        if !lock(&self.core.state).begin() {
            log::debug!("Tracker already running");
            return false;
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(poll_loop(Arc::clone(&self.core), cancel.clone()));

        // A loop left behind by a timed-out stop must not see the new state
        if let Some(stale) = lock(&self.worker).replace(Worker { cancel, handle }) {
            stale.cancel.cancel();
            stale.handle.abort();
        }
        true
    }

    /// Stop tracking and persist the session that was open.
    ///
    /// Waits up to three poll intervals for the loop to finish its current
    /// tick; past that the loop is abandoned with a warning. Returns false
    /// when the tracker was not running.
    pub async fn stop(&self) -> bool {
        let now = self.core.clock.now();
        let final_session = {
            let mut state = lock(&self.core.state);
            if !state.is_running() {
                return false;
            }
            state.finish(now)
        };

        let worker = lock(&self.worker).take();
        if let Some(Worker { cancel, mut handle }) = worker {
            cancel.cancel();
            let grace = self.core.poll_interval * STOP_GRACE_INTERVALS;
            match tokio::time::timeout(grace, &mut handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => log::warn!("Tracker loop ended abnormally: {e}"),
                Err(_) => {
                    log::warn!("Tracker loop did not stop within {grace:?}, abandoning it");
                    handle.abort();
                }
            }
        }

        if let Some(session) = final_session {
            if let Err(e) = self.core.persist(&session) {
                log::error!("Failed to save final session: {e:#}");
            }
        }
        true
    }

    /// Run a single poll step outside the loop.
    ///
    /// Returns the session closed by this step, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if a closed session could not be persisted. The
    /// in-memory state has already advanced by then.
    pub async fn tick(&self) -> Result<Option<WindowSession>> {
        self.core.tick().await
    }
}
