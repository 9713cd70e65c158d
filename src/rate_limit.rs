use std::time::{Duration, Instant};

use dashmap::DashMap;

const LOGIN_WINDOW: Duration = Duration::from_secs(15 * 60);
const LOGIN_MAX_FAILURES: u32 = 5;

/// Per-email login brute force limiter: 5 failures per 15 minutes.
pub struct LoginRateLimiter {
    /// email -> (failed_count, window_start)
    entries: DashMap<String, (u32, Instant)>,
    window: Duration,
    max_failures: u32,
}

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl LoginRateLimiter {
    pub fn new() -> Self {
        Self::with_limits(LOGIN_WINDOW, LOGIN_MAX_FAILURES)
    }

    pub fn with_limits(window: Duration, max_failures: u32) -> Self {
        Self {
            entries: DashMap::new(),
            window,
            max_failures,
        }
    }

    /// Returns Err with retry-after seconds when the email is locked out.
    /// Does NOT increment the counter; call `record_failure()` on a bad password.
    pub fn check(&self, email: &str) -> Result<(), u64> {
        let now = Instant::now();

        let Some(entry) = self.entries.get(&email.to_lowercase()) else {
            return Ok(());
        };
        let (count, start) = entry.value();

        if now.duration_since(*start) > self.window {
            return Ok(());
        }

        if *count >= self.max_failures {
            let elapsed = now.duration_since(*start).as_secs();
            return Err(self.window.as_secs().saturating_sub(elapsed));
        }

        Ok(())
    }

    pub fn record_failure(&self, email: &str) {
        let now = Instant::now();

        let mut entry = self.entries.entry(email.to_lowercase()).or_insert((0, now));
        let (count, start) = entry.value_mut();

        if now.duration_since(*start) > self.window {
            *count = 1;
            *start = now;
        } else {
            *count += 1;
        }
    }

    /// Successful login clears the failure history for that email.
    pub fn reset(&self, email: &str) {
        self.entries.remove(&email.to_lowercase());
    }

    pub fn cleanup(&self) {
        let now = Instant::now();
        let window = self.window;
        self.entries.retain(|_, (_, start)| now.duration_since(*start) < window);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locks_after_max_failures_case_insensitively() {
        let limiter = LoginRateLimiter::with_limits(Duration::from_secs(60), 3);
        for _ in 0..3 {
            assert!(limiter.check("HR@corp.id").is_ok());
            limiter.record_failure("hr@corp.id");
        }
        let retry_after = limiter.check("Hr@Corp.id").unwrap_err();
        assert!(retry_after <= 60);
    }

    #[test]
    fn reset_clears_lockout() {
        let limiter = LoginRateLimiter::with_limits(Duration::from_secs(60), 1);
        limiter.record_failure("a@b.c");
        assert!(limiter.check("a@b.c").is_err());
        limiter.reset("a@b.c");
        assert!(limiter.check("a@b.c").is_ok());
    }

    #[test]
    fn cleanup_drops_expired_windows() {
        let limiter = LoginRateLimiter::with_limits(Duration::from_millis(0), 1);
        limiter.record_failure("a@b.c");
        std::thread::sleep(Duration::from_millis(2));
        limiter.cleanup();
        assert!(limiter.entries.is_empty());
    }
}
