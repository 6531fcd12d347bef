//! Per-client login throttling backed by a keyed governor limiter.
//!
//! The limiter keeps one entry per client key. Entries whose quota has fully
//! replenished carry no information and are dropped by [`LoginRateLimiter::prune`],
//! which [`LoginRateLimiter::spawn_pruning`] runs on a timer.

use std::{num::NonZeroU32, sync::Arc, time::Duration};

use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use tokio::{task::JoinHandle, time::interval};
use tracing::{debug, warn};

use crate::{
    config::RateLimitConfig,
    error::{AppError, Result},
};

pub struct LoginRateLimiter {
    limiter: DefaultKeyedRateLimiter<String>,
}

impl LoginRateLimiter {
    /// Zero values in the config are raised to one.
    #[must_use]
    pub fn new(config: &RateLimitConfig) -> Self {
        let per_minute = NonZeroU32::new(config.login_per_minute).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(config.burst).unwrap_or(NonZeroU32::MIN);

        Self {
            limiter: RateLimiter::keyed(Quota::per_minute(per_minute).allow_burst(burst)),
        }
    }

    /// # Errors
    /// [`AppError::RateLimited`] once `client` has used up its quota.
    pub fn check(&self, client: &str) -> Result<()> {
        self.limiter.check_key(&client.to_string()).map_err(|_| {
            warn!(client = %client, "Login rate limit exceeded");
            AppError::RateLimited
        })
    }

    /// Drops clients whose quota is fully replenished.
    pub fn prune(&self) {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
    }

    /// Number of clients currently tracked.
    #[must_use]
    pub fn tracked_clients(&self) -> usize {
        self.limiter.len()
    }

    /// Runs [`prune`](Self::prune) every `period` until the task is aborted.
    pub fn spawn_pruning(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut timer = interval(period);

            loop {
                timer.tick().await;
                self.prune();
                debug!(clients = self.tracked_clients(), "Pruned login rate limiter");
            }
        })
    }
}

impl std::fmt::Debug for LoginRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRateLimiter").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(login_per_minute: u32, burst: u32) -> LoginRateLimiter {
        LoginRateLimiter::new(&RateLimitConfig {
            login_per_minute,
            burst,
            trust_proxy_headers: false,
        })
    }

    #[test]
    fn test_burst_then_limited() {
        let limiter = limiter(1, 2);

        assert!(limiter.check("10.0.0.1").is_ok());
        assert!(limiter.check("10.0.0.1").is_ok());
        assert!(matches!(limiter.check("10.0.0.1"), Err(AppError::RateLimited)));
        // other clients keep their own quota
        assert!(limiter.check("10.0.0.2").is_ok());
    }

    #[test]
    fn test_prune_forgets_replenished_clients() {
        // one cell per millisecond, so a single attempt is forgotten almost at once
        let limiter = limiter(60_000, 1);
        for n in 0..50 {
            limiter.check(&format!("10.0.1.{}", n)).unwrap();
        }
        assert_eq!(limiter.tracked_clients(), 50);

        std::thread::sleep(Duration::from_millis(20));
        limiter.prune();
        assert_eq!(limiter.tracked_clients(), 0);
    }

    #[test]
    fn test_prune_keeps_throttled_clients() {
        let limiter = limiter(1, 1);
        limiter.check("10.0.0.9").unwrap();
        assert!(limiter.check("10.0.0.9").is_err());

        limiter.prune();
        assert_eq!(limiter.tracked_clients(), 1);
        assert!(matches!(limiter.check("10.0.0.9"), Err(AppError::RateLimited)));
    }

    #[tokio::test]
    async fn test_pruning_task_runs_on_a_timer() {
        let limiter = Arc::new(limiter(60_000, 1));
        limiter.check("10.0.2.1").unwrap();

        let task = limiter.clone().spawn_pruning(Duration::from_millis(5));
        tokio::time::sleep(Duration::from_millis(50)).await;
        task.abort();

        assert_eq!(limiter.tracked_clients(), 0);
    }
}
