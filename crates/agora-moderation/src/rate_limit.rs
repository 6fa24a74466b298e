use chrono::{DateTime, Duration, Utc};

use agora_core::config::{RATE_LIMIT_MAX, RATE_LIMIT_WINDOW_SECS};

/// Result of evaluating one public-chat send attempt against the caller's
/// rate-limit counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitOutcome {
    /// Post is allowed; caller should persist the new counter and window
    /// start before inserting the message.
    Accept {
        new_count: i64,
        new_window_start: DateTime<Utc>,
    },
    /// Post is refused; `finish_time` is when the current window elapses.
    Refuse { finish_time: DateTime<Utc> },
}

/// Window = 60 minutes from `window_start`. Counter = `count`.
///
/// * counter >= max AND now < start+window -> refuse.
/// * counter >= max AND now >= start+window -> reset counter to 1, start <- now, accept.
/// * counter < max -> counter += 1, accept. The window start is NOT advanced
///   on accepted posts under the limit; only a reset moves it.
pub fn check_rate_limit(
    count: i64,
    window_start: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> RateLimitOutcome {
    let window = Duration::seconds(RATE_LIMIT_WINDOW_SECS);
    match window_start {
        Some(start) if count >= RATE_LIMIT_MAX && now < start + window => {
            RateLimitOutcome::Refuse {
                finish_time: start + window,
            }
        }
        Some(start) if count >= RATE_LIMIT_MAX => {
            let _ = start;
            RateLimitOutcome::Accept {
                new_count: 1,
                new_window_start: now,
            }
        }
        Some(start) => RateLimitOutcome::Accept {
            new_count: count + 1,
            new_window_start: start,
        },
        // No window yet opened: this is the caller's first public post.
        None => RateLimitOutcome::Accept {
            new_count: 1,
            new_window_start: now,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn first_post_opens_the_window() {
        let outcome = check_rate_limit(0, None, at(0));
        assert_eq!(
            outcome,
            RateLimitOutcome::Accept {
                new_count: 1,
                new_window_start: at(0)
            }
        );
    }

    #[test]
    fn under_limit_increments_without_moving_window() {
        let outcome = check_rate_limit(5, Some(at(0)), at(10));
        assert_eq!(
            outcome,
            RateLimitOutcome::Accept {
                new_count: 6,
                new_window_start: at(0)
            }
        );
    }

    #[test]
    fn at_limit_within_window_is_refused() {
        let outcome = check_rate_limit(20, Some(at(0)), at(100));
        assert_eq!(
            outcome,
            RateLimitOutcome::Refuse {
                finish_time: at(3600)
            }
        );
    }

    #[test]
    fn at_limit_after_window_resets() {
        let outcome = check_rate_limit(20, Some(at(0)), at(3601));
        assert_eq!(
            outcome,
            RateLimitOutcome::Accept {
                new_count: 1,
                new_window_start: at(3601)
            }
        );
    }
}
