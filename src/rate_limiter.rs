use std::sync::Mutex;
use std::time::Instant;

#[derive(Clone, Debug)]
pub struct Limits {
    pub requests_per_sec: u32,
    pub burst: u32,
}

/// Token bucket that rejects instead of waiting, so a hot route answers 429 right away.
#[derive(Debug)]
pub struct RateLimiter {
    limits: Limits,
    // (tokens, last refill)
    bucket: Mutex<(f64, Instant)>,
}

impl RateLimiter {
    pub fn new(limits: Limits) -> Self {
        let capacity = f64::from(limits.burst);
        Self {
            limits,
            bucket: Mutex::new((capacity, Instant::now())),
        }
    }

    /// Take one token if available.
    pub fn try_acquire(&self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    fn try_acquire_at(&self, now: Instant) -> bool {
        let capacity = f64::from(self.limits.burst);
        let refill_rate = f64::from(self.limits.requests_per_sec); // tokens per second
        let mut guard = self.bucket.lock().unwrap_or_else(|e| e.into_inner());
        let (ref mut tokens, ref mut last) = *guard;
        let elapsed = now.saturating_duration_since(*last).as_secs_f64();
        *tokens = (*tokens + elapsed * refill_rate).min(capacity);
        *last = now;
        if *tokens >= 1.0 {
            *tokens -= 1.0;
            true
        } else {
            false
        }
    }
}
