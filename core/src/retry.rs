//! Bounded attempt loops.

use std::time::Duration;

use tokio::time::Instant;

/// AttemptStrategy bounds how often and for how long an operation is attempted.
///
/// An attempt is allowed while fewer than `min` attempts were made, or while
/// the next attempt would still start within `total` of the first one.
/// Consecutive attempts are at least `delay` apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptStrategy {
    /// Minimum count of attempts, regardless of elapsed time.
    pub min: usize,
    /// Total wall-clock budget for all attempts.
    pub total: Duration,
    /// Delay between the start of two attempts.
    pub delay: Duration,
}

impl Default for AttemptStrategy {
    fn default() -> Self {
        Self {
            min: 5,
            total: Duration::from_secs(5),
            delay: Duration::from_millis(200),
        }
    }
}

impl AttemptStrategy {
    /// Begin a new sequence of attempts.
    pub fn start(&self) -> Attempt {
        let now = Instant::now();
        Attempt {
            strategy: *self,
            last: now,
            end: now + self.total,
            count: 0,
            force: false,
        }
    }
}

/// Attempt tracks the state of one sequence of attempts.
#[derive(Debug)]
pub struct Attempt {
    strategy: AttemptStrategy,
    last: Instant,
    end: Instant,
    count: usize,
    force: bool,
}

impl Attempt {
    /// Wait until the next attempt may start.
    ///
    /// Returns `false` once the strategy is exhausted. The first call never
    /// sleeps.
    pub async fn next(&mut self) -> bool {
        let now = Instant::now();
        let sleep = self.next_sleep(now);
        if !self.force && now + sleep >= self.end && self.strategy.min <= self.count {
            return false;
        }
        self.force = false;

        let mut now = now;
        if !sleep.is_zero() && self.count > 0 {
            tokio::time::sleep(sleep).await;
            now = Instant::now();
        }

        self.count += 1;
        self.last = now;
        true
    }

    /// Report whether another attempt is allowed, without waiting.
    ///
    /// A positive answer is binding: the following [`Attempt::next`] call
    /// returns `true` even if the budget runs out in between.
    pub fn has_next(&mut self) -> bool {
        if self.force || self.strategy.min > self.count {
            return true;
        }

        let now = Instant::now();
        if now + self.next_sleep(now) < self.end {
            self.force = true;
            return true;
        }
        false
    }

    /// Number of attempts started so far.
    pub fn count(&self) -> usize {
        self.count
    }

    fn next_sleep(&self, now: Instant) -> Duration {
        self.strategy
            .delay
            .saturating_sub(now.saturating_duration_since(self.last))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test(start_paused = true)]
    async fn test_attempt_respects_min_and_total() {
        let strategy = AttemptStrategy {
            min: 5,
            total: Duration::from_secs(5),
            delay: Duration::from_millis(200),
        };

        let started = Instant::now();
        let mut attempt = strategy.start();
        while attempt.next().await {}

        // Attempts start at 0ms, 200ms, ... 4800ms.
        assert_eq!(attempt.count(), 25);
        assert_eq!(started.elapsed(), Duration::from_millis(4800));
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_min_wins_over_zero_budget() {
        let strategy = AttemptStrategy {
            min: 3,
            total: Duration::ZERO,
            delay: Duration::from_millis(10),
        };

        let mut attempt = strategy.start();
        while attempt.next().await {}
        assert_eq!(attempt.count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_has_next_forces_next() {
        let strategy = AttemptStrategy {
            min: 1,
            total: Duration::from_millis(300),
            delay: Duration::from_millis(200),
        };

        let mut attempt = strategy.start();
        assert!(attempt.next().await);
        assert!(attempt.has_next());
        // Budget is gone by now, but has_next already promised one more.
        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(attempt.next().await);
        assert!(!attempt.has_next());
        assert_eq!(attempt.count(), 2);
    }
}
