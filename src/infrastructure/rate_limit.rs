//! Fixed-window rate limiting with an injectable store and clock.
//!
//! Nothing here runs in the background on its own: expired windows are only
//! swept when [`RateLimiter::sweep`] is called or a [`Sweeper`] has been
//! explicitly started.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Source of the current instant.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|e| e.into_inner());
        *offset += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *self.offset.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Counter state for one key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowState {
    pub count: u32,
    pub window_start: Instant,
}

/// Storage for per-key counters.
pub trait RateLimitStore: Send + Sync + Debug {
    /// Record one hit for `key`, opening a new window if the old one expired.
    fn hit(&self, key: &str, now: Instant, window: Duration) -> WindowState;

    /// Drop every window that expired before `now`; returns how many.
    fn sweep(&self, now: Instant, window: Duration) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default)]
pub struct InMemoryRateLimitStore {
    windows: Mutex<HashMap<String, WindowState>>,
}

impl InMemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RateLimitStore for InMemoryRateLimitStore {
    fn hit(&self, key: &str, now: Instant, window: Duration) -> WindowState {
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());
        let state = windows.entry(key.to_string()).or_insert(WindowState {
            count: 0,
            window_start: now,
        });

        if now.saturating_duration_since(state.window_start) >= window {
            state.count = 0;
            state.window_start = now;
        }
        state.count = state.count.saturating_add(1);
        *state
    }

    fn sweep(&self, now: Instant, window: Duration) -> usize {
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());
        let before = windows.len();
        windows.retain(|_, state| now.saturating_duration_since(state.window_start) < window);
        before - windows.len()
    }

    fn len(&self) -> usize {
        self.windows.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// Configuration for rate limiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum number of requests allowed within the window.
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_secs(60),
        }
    }
}

/// Result of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitDecision::Allowed { .. })
    }
}

/// `tokio::time::interval` panics on a zero period.
const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    store: Arc<dyn RateLimitStore>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    /// In-memory store on the system clock
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_parts(
            config,
            Arc::new(InMemoryRateLimitStore::new()),
            Arc::new(SystemClock),
        )
    }

    pub fn with_parts(
        config: RateLimitConfig,
        store: Arc<dyn RateLimitStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            store,
            clock,
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Count a request against `key` and decide whether it may proceed.
    pub fn check(&self, key: &str) -> RateLimitDecision {
        let now = self.clock.now();
        let state = self.store.hit(key, now, self.config.window);

        if state.count > self.config.max_requests {
            let elapsed = now.saturating_duration_since(state.window_start);
            RateLimitDecision::Limited {
                retry_after: self.config.window.saturating_sub(elapsed),
            }
        } else {
            RateLimitDecision::Allowed {
                remaining: self.config.max_requests - state.count,
            }
        }
    }

    /// Evict expired windows now.
    pub fn sweep(&self) -> usize {
        self.store.sweep(self.clock.now(), self.config.window)
    }

    /// Start a periodic sweep. The task lives until the returned handle is
    /// stopped or dropped. Intervals shorter than 1 ms are raised to 1 ms.
    pub fn start_sweeper(&self, every: Duration) -> Sweeper {
        let every = every.max(MIN_SWEEP_INTERVAL);
        let limiter = self.clone();
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        info!(interval_ms = every.as_millis() as u64, "Starting rate limit sweeper");

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {
                        let evicted = limiter.sweep();
                        if evicted > 0 {
                            debug!(evicted, "Swept expired rate limit windows");
                        }
                    }
                }
            }
            debug!("Rate limit sweeper stopped");
        });

        Sweeper {
            shutdown: Some(shutdown_tx),
            task,
        }
    }
}

/// Handle to a running sweep task.
#[derive(Debug)]
pub struct Sweeper {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl Sweeper {
    /// Signal the task and wait for it to finish.
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Err(e) = (&mut self.task).await {
            warn!(error = %e, "Rate limit sweeper exited abnormally");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
