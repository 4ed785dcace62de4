use std::time::Duration;

pub const DEFAULT_RATE_LIMIT: usize = 60;
pub const DEFAULT_RATE_WINDOW: Duration = Duration::from_millis(60_000);
pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(100);
pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_FIELD_DELAY: Duration = Duration::from_millis(100);
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful and friendly assistant.";

/// Admission-control knobs for [`RateLimiter`](crate::RateLimiter).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Requests admitted per source within one window.
    pub limit: usize,
    pub window: Duration,
    /// Requests this close to the previous one are always admitted.
    pub cooldown: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_RATE_LIMIT,
            window: DEFAULT_RATE_WINDOW,
            cooldown: DEFAULT_COOLDOWN,
        }
    }
}

/// Everything [`LookupService`](crate::LookupService) needs besides the model.
#[derive(Debug, Clone)]
pub struct LookupConfig {
    pub rate_limit: RateLimitConfig,
    /// Retry budget handed to the fallback policy for every field.
    pub max_retries: u32,
    /// Pause between sequential side-panel field fetches.
    pub field_delay: Duration,
    /// System preamble used when a session is created.
    pub system_prompt: String,
    /// Capacity of the per-tab remembered-word store.
    pub tab_capacity: usize,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            rate_limit: RateLimitConfig::default(),
            max_retries: DEFAULT_MAX_RETRIES,
            field_delay: DEFAULT_FIELD_DELAY,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            tab_capacity: 1024,
        }
    }
}
