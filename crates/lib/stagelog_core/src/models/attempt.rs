//! Login failure tracking per (handle, client address) pair.
//!
//! Failures accumulate inside a sliding window; reaching the limit
//! locks the pair for a fixed duration. A lock ends exactly at its
//! expiry instant, while the window expires strictly after
//! `first_failed_at + window`.

use chrono::{DateTime, Duration, Utc};

/// Lockout tuning. Defaults: 5 failures / 10 minute window / 15 minute lock.
#[derive(Debug, Clone, Copy)]
pub struct LockoutPolicy {
    pub max_failures: i32,
    pub failure_window: Duration,
    pub lock_duration: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_failures: 5,
            failure_window: Duration::minutes(10),
            lock_duration: Duration::minutes(15),
        }
    }
}

/// Database row for `login_attempts`, one per (handle, client address).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LoginAttempt {
    pub id: i64,
    pub user_handle: String,
    pub client_ip: String,
    pub fail_count: i32,
    pub first_failed_at: DateTime<Utc>,
    pub locked_until: Option<DateTime<Utc>>,
}

impl LoginAttempt {
    /// Record for the first observed failure of a pair (not yet persisted).
    pub fn first_failure(user_handle: &str, client_ip: &str, failed_at: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            user_handle: user_handle.to_string(),
            client_ip: client_ip.to_string(),
            fail_count: 1,
            first_failed_at: failed_at,
            locked_until: None,
        }
    }

    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| until > now)
    }

    pub fn is_lock_expired(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| until <= now)
    }

    pub fn is_window_expired(&self, now: DateTime<Utc>, window: Duration) -> bool {
        self.first_failed_at + window < now
    }

    /// Fold one more failure into the record. An expired lock or an
    /// expired window resets the counter to this failure; otherwise the
    /// counter increments and, on reaching the limit, sets the lock.
    pub fn record_failure(&mut self, failed_at: DateTime<Utc>, policy: &LockoutPolicy) {
        if self.is_lock_expired(failed_at) || self.is_window_expired(failed_at, policy.failure_window)
        {
            self.fail_count = 1;
            self.first_failed_at = failed_at;
            self.locked_until = None;
            return;
        }

        self.fail_count += 1;
        if self.fail_count >= policy.max_failures {
            self.locked_until = Some(failed_at + policy.lock_duration);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn policy() -> LockoutPolicy {
        LockoutPolicy::default()
    }

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 10, 0, 0).unwrap()
    }

    #[test]
    fn five_failures_within_window_lock_the_pair() {
        let t0 = base_time();
        let mut attempt = LoginAttempt::first_failure("user1", "1.2.3.4", t0);

        for minute in 1..=4 {
            attempt.record_failure(t0 + Duration::minutes(minute), &policy());
        }

        assert_eq!(attempt.fail_count, 5);
        assert!(attempt.is_locked(t0 + Duration::minutes(5)));
        // locked_until = time of the fifth failure + lock duration
        assert_eq!(
            attempt.locked_until,
            Some(t0 + Duration::minutes(4) + Duration::minutes(15))
        );
    }

    #[test]
    fn fourth_failure_does_not_lock_yet() {
        let t0 = base_time();
        let mut attempt = LoginAttempt::first_failure("user1", "1.2.3.4", t0);

        for minute in 1..=3 {
            attempt.record_failure(t0 + Duration::minutes(minute), &policy());
        }

        assert_eq!(attempt.fail_count, 4);
        assert!(!attempt.is_locked(t0 + Duration::minutes(4)));
    }

    #[test]
    fn failure_after_lock_expiry_resets_the_counter() {
        let t0 = base_time();
        let mut attempt = LoginAttempt::first_failure("user1", "1.2.3.4", t0);
        for minute in 1..=4 {
            attempt.record_failure(t0 + Duration::minutes(minute), &policy());
        }
        assert!(attempt.is_locked(t0 + Duration::minutes(5)));

        // lock ran out at +19min; a failure at +20min starts over
        let after_lock = t0 + Duration::minutes(20);
        attempt.record_failure(after_lock, &policy());

        assert_eq!(attempt.fail_count, 1);
        assert!(!attempt.is_locked(after_lock));
        assert_eq!(attempt.first_failed_at, after_lock);
    }

    #[test]
    fn lock_ends_exactly_at_its_expiry_instant() {
        let t0 = base_time();
        let mut attempt = LoginAttempt::first_failure("user1", "1.2.3.4", t0);
        for minute in 1..=4 {
            attempt.record_failure(t0 + Duration::minutes(minute), &policy());
        }
        let lock_end = attempt.locked_until.unwrap();

        assert!(attempt.is_locked(lock_end - Duration::seconds(1)));
        assert!(!attempt.is_locked(lock_end));
        assert!(attempt.is_lock_expired(lock_end));
    }

    #[test]
    fn failure_outside_the_window_resets_the_counter() {
        let t0 = base_time();
        let mut attempt = LoginAttempt::first_failure("user1", "1.2.3.4", t0);
        attempt.record_failure(t0 + Duration::minutes(1), &policy());

        attempt.record_failure(t0 + Duration::minutes(11), &policy());

        assert_eq!(attempt.fail_count, 1);
        assert_eq!(attempt.first_failed_at, t0 + Duration::minutes(11));
    }

    #[test]
    fn window_boundary_is_strict() {
        let t0 = base_time();
        let mut attempt = LoginAttempt::first_failure("user1", "1.2.3.4", t0);

        // exactly at first_failed_at + window: still inside
        attempt.record_failure(t0 + Duration::minutes(10), &policy());
        assert_eq!(attempt.fail_count, 2);

        assert!(attempt.is_window_expired(t0 + Duration::minutes(10) + Duration::seconds(1), Duration::minutes(10)));
    }

    #[test]
    fn distinct_pairs_are_independent_records() {
        let t0 = base_time();
        let mut first = LoginAttempt::first_failure("user1", "1.2.3.4", t0);
        for minute in 1..=4 {
            first.record_failure(t0 + Duration::minutes(minute), &policy());
        }
        let second = LoginAttempt::first_failure("user1", "5.6.7.8", t0 + Duration::minutes(5));

        assert!(first.is_locked(t0 + Duration::minutes(5)));
        assert!(!second.is_locked(t0 + Duration::minutes(5)));
        assert_eq!(second.fail_count, 1);
    }
}
