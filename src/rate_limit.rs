use crate::config::RateLimitConfig;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

/// Per-source sliding-window admission control.
///
/// Each source (a tab id, or `"popup"`) owns an ordered list of admission
/// timestamps. Entries older than the window are purged before every
/// decision, and a periodic sweep drops sources whose list has emptied.
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> RateLimitConfig {
        self.config
    }

    pub fn admit(&self, source: &str) -> bool {
        self.admit_at(source, Instant::now())
    }

    /// Admission decision against an explicit clock reading.
    pub fn admit_at(&self, source: &str, now: Instant) -> bool {
        let RateLimitConfig {
            limit,
            window,
            cooldown,
        } = self.config;
        let mut guard = self.windows.lock();
        let stamps = guard.entry(source.to_string()).or_default();
        stamps.retain(|stamp| now.saturating_duration_since(*stamp) < window);

        let Some(&last) = stamps.back() else {
            stamps.push_back(now);
            debug!(source, "rate window fresh");
            return true;
        };

        // Micro-bursts (double-click then panel open) ride on the previous admission.
        if now.saturating_duration_since(last) < cooldown {
            debug!(source, recent = stamps.len(), "within cooldown, admitting");
            return true;
        }

        if stamps.len() >= limit {
            let oldest_expired = stamps
                .front()
                .is_some_and(|oldest| now.saturating_duration_since(*oldest) >= window);
            if oldest_expired {
                stamps.clear();
                stamps.push_back(now);
                return true;
            }
            debug!(source, recent = stamps.len(), limit, "rate limit exceeded");
            return false;
        }

        stamps.push_back(now);
        true
    }

    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    /// Purges expired stamps and deletes sources left empty. Returns the
    /// number of sources removed.
    pub fn sweep_at(&self, now: Instant) -> usize {
        let window = self.config.window;
        let mut guard = self.windows.lock();
        let before = guard.len();
        guard.retain(|_, stamps| {
            stamps.retain(|stamp| now.saturating_duration_since(*stamp) < window);
            !stamps.is_empty()
        });
        let removed = before - guard.len();
        if removed > 0 {
            debug!(removed, remaining = guard.len(), "swept idle rate windows");
        }
        removed
    }

    pub fn tracked_sources(&self) -> usize {
        self.windows.lock().len()
    }

    /// Number of stamps currently recorded for `source`.
    pub fn recorded(&self, source: &str) -> usize {
        self.windows
            .lock()
            .get(source)
            .map(VecDeque::len)
            .unwrap_or(0)
    }

    /// Runs [`sweep`](Self::sweep) once per window until the task is aborted.
    pub fn spawn_sweeper(self: Arc<Self>) -> JoinHandle<()> {
        let period = self.config.window;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                self.sweep();
            }
        })
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}
