//! Pure decision functions for the rate limiter and the cautions-to-ban
//! state machine. Nothing here touches the database: callers read a
//! `Membership`/counters, pass them in, and persist whatever the returned
//! decision says to persist.

pub mod ban;
pub mod rate_limit;

pub use ban::{apply_report, check_ban, BanOutcome, ReportOutcome};
pub use rate_limit::{check_rate_limit, RateLimitOutcome};
