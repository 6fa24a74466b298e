use chrono::{DateTime, Duration, Utc};

use agora_core::config::{BAN_DURATION_SECS, CAUTIONS_TO_BAN};
use agora_store::Membership;

/// Outcome of checking whether a membership is currently banned. `/send`
/// consults this before accepting a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BanOutcome {
    NotBanned,
    Banned,
    /// The ban had expired; the caller must persist the cleared state
    /// (`cautions=0, banned=false, banned_till=NULL`) before proceeding.
    Cleared,
}

/// If `banned=true` and `banned_till > now`, the membership is still
/// banned. If `banned_till <= now`, the ban has expired: BANNED -> CLEAN.
pub fn check_ban(membership: &Membership, now: DateTime<Utc>) -> BanOutcome {
    if !membership.banned {
        return BanOutcome::NotBanned;
    }
    match membership.banned_till {
        Some(till) if till > now => BanOutcome::Banned,
        _ => BanOutcome::Cleared,
    }
}

/// Outcome of a `/report` call against the cautions-to-ban state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    /// Still serving an earlier ban; idempotent, nothing to persist.
    AlreadyBanned,
    /// CLEAN -> WARNED1 or WARNED1 -> WARNED2.
    CautionAdded { cautions: i64 },
    /// WARNED2 -> BANNED. `cautions` is NOT reset on this transition.
    Banned { cautions: i64, banned_till: DateTime<Utc> },
}

/// CLEAN(0) -> WARNED1(1) -> WARNED2(2) -> BANNED(banned_till=now+4h).
/// A membership whose prior ban has already expired is treated as CLEAN
/// before the new caution is applied, mirroring the implicit
/// BANNED -> CLEAN transition `check_ban` performs on the read path.
pub fn apply_report(membership: &Membership, now: DateTime<Utc>) -> ReportOutcome {
    let still_banned = membership.banned
        && membership
            .banned_till
            .map(|till| till > now)
            .unwrap_or(false);
    if still_banned {
        return ReportOutcome::AlreadyBanned;
    }

    let prior_cautions = if membership.banned { 0 } else { membership.cautions };
    let cautions = prior_cautions + 1;
    if cautions >= CAUTIONS_TO_BAN {
        ReportOutcome::Banned {
            cautions,
            banned_till: now + Duration::seconds(BAN_DURATION_SECS),
        }
    } else {
        ReportOutcome::CautionAdded { cautions }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn membership(cautions: i64, banned: bool, banned_till: Option<DateTime<Utc>>) -> Membership {
        Membership {
            chat_id: 1,
            user_id: 1,
            last_connect: None,
            cautions,
            banned,
            banned_till,
        }
    }

    #[test]
    fn clean_membership_is_not_banned() {
        assert_eq!(check_ban(&membership(0, false, None), at(0)), BanOutcome::NotBanned);
    }

    #[test]
    fn active_ban_is_banned() {
        let m = membership(3, true, Some(at(100)));
        assert_eq!(check_ban(&m, at(0)), BanOutcome::Banned);
    }

    #[test]
    fn expired_ban_clears() {
        let m = membership(3, true, Some(at(0)));
        assert_eq!(check_ban(&m, at(100)), BanOutcome::Cleared);
    }

    #[test]
    fn first_report_adds_first_caution() {
        let m = membership(0, false, None);
        assert_eq!(apply_report(&m, at(0)), ReportOutcome::CautionAdded { cautions: 1 });
    }

    #[test]
    fn second_report_adds_second_caution() {
        let m = membership(1, false, None);
        assert_eq!(apply_report(&m, at(0)), ReportOutcome::CautionAdded { cautions: 2 });
    }

    #[test]
    fn third_report_bans_for_four_hours() {
        let m = membership(2, false, None);
        match apply_report(&m, at(0)) {
            ReportOutcome::Banned { cautions, banned_till } => {
                assert_eq!(cautions, 3);
                assert_eq!(banned_till, at(BAN_DURATION_SECS));
            }
            other => panic!("expected Banned, got {other:?}"),
        }
    }

    #[test]
    fn reporting_an_active_ban_is_idempotent() {
        let m = membership(3, true, Some(at(100)));
        assert_eq!(apply_report(&m, at(0)), ReportOutcome::AlreadyBanned);
    }
}
