//! In-process fixed-window rate limiter.
//!
//! Each key owns one window. The first hit opens the window, every hit
//! increments its counter, and the window is replaced once it has elapsed.
//! Check-and-increment happens inside a single mutex critical section, so
//! concurrent requests in one process never lose an increment.
//!
//! State lives in memory only: it resets on restart and is not shared
//! between instances.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Requests allowed per window.
    pub limit: u32,
    pub window: Duration,
}

impl RateLimitConfig {
    pub const fn new(limit: u32, window_secs: u64) -> Self {
        Self {
            limit,
            window: Duration::from_secs(window_secs),
        }
    }

    /// Guest chat messages: 10 per minute.
    pub const CHAT: Self = Self::new(10, 60);
    /// Admin login attempts: 5 per five minutes.
    pub const AUTH: Self = Self::new(5, 300);
    /// Media uploads: 5 per minute.
    pub const UPLOAD: Self = Self::new(5, 60);
    /// General API traffic: 100 per minute.
    pub const API: Self = Self::new(100, 60);

    /// Parse `"<limit>/<window_secs>"`, e.g. `"10/60"`.
    pub fn parse(raw: &str) -> Option<Self> {
        let (limit, window) = raw.trim().split_once('/')?;
        let limit = limit.trim().parse().ok()?;
        let window: u64 = window.trim().parse().ok()?;
        (limit > 0 && window > 0).then(|| Self::new(limit, window))
    }
}

/// Outcome of a single [`RateLimiter::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Hits counted in the current window, including this one.
    pub count: u32,
    pub limit: u32,
    /// Whole seconds until the window resets; feeds `Retry-After`.
    pub reset_in_secs: u64,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    reset_at: Instant,
}

#[derive(Debug, Default)]
pub struct RateLimiter {
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&self, key: &str, config: &RateLimitConfig) -> RateLimitDecision {
        self.check_at(key, config, Instant::now())
    }

    /// [`check`](Self::check) against an explicit clock reading.
    pub fn check_at(&self, key: &str, config: &RateLimitConfig, now: Instant) -> RateLimitDecision {
        let mut windows = match self.windows.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let window = windows.entry(key.to_owned()).or_insert(Window {
            count: 0,
            reset_at: now + config.window,
        });
        if window.reset_at <= now {
            *window = Window {
                count: 0,
                reset_at: now + config.window,
            };
        }

        window.count = window.count.saturating_add(1);
        let remaining = window.reset_at.saturating_duration_since(now);

        RateLimitDecision {
            allowed: window.count <= config.limit,
            count: window.count,
            limit: config.limit,
            reset_in_secs: ceil_secs(remaining),
        }
    }

    /// Drop every window that has already elapsed. Returns how many were removed.
    pub fn sweep(&self, now: Instant) -> usize {
        let mut windows = match self.windows.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let before = windows.len();
        windows.retain(|_, w| w.reset_at > now);
        before - windows.len()
    }

    pub fn len(&self) -> usize {
        self.windows.lock().map(|w| w.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn ceil_secs(d: Duration) -> u64 {
    let secs = d.as_secs();
    if d.subsec_nanos() > 0 { secs + 1 } else { secs }
}
