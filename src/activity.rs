// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Commit activity classification over rolling windows.
///
/// Counts commits authored in the last 7 and 30 days relative to a supplied
/// instant. The weekly window is nested in the monthly one, so the weekly
/// tally never exceeds the monthly tally.
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::host::CommitRecord;

/// Length of the short activity window in days.
pub const WEEK_DAYS: i64 = 7;
/// Length of the long activity window in days.
pub const MONTH_DAYS: i64 = 30;

/// Formats accepted for timestamps that carry no offset.
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];

/// Commit counts inside the rolling windows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize,)]
pub struct CommitActivity
{
    pub weekly:  u64,
    pub monthly: u64,
    /// Commits skipped because their author timestamp was unusable.
    pub skipped: u64,
}

/// Parses a commit timestamp.
///
/// RFC 3339 values are converted to UTC. Values without offset information
/// are interpreted as UTC. Returns `None` for anything else.
///
/// # Example
///
/// ```
/// use repo_metrics::parse_timestamp;
///
/// let zoned = parse_timestamp("2024-05-01T12:00:00+02:00",).expect("valid timestamp",);
/// let naive = parse_timestamp("2024-05-01T10:00:00",).expect("valid timestamp",);
/// assert_eq!(zoned, naive);
/// ```
pub fn parse_timestamp(raw: &str,) -> Option<DateTime<Utc,>,>
{
    let trimmed = raw.trim();
    if let Ok(parsed,) = DateTime::parse_from_rfc3339(trimmed,) {
        return Some(parsed.with_timezone(&Utc,),);
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format,).ok(),)
        .map(|naive| naive.and_utc(),)
}

/// Classifies commits into the weekly and monthly windows ending at `now`.
///
/// Both comparisons are inclusive. Commits without a usable author
/// timestamp are skipped and counted in [`CommitActivity::skipped`].
pub fn tally_activity(commits: &[CommitRecord], now: DateTime<Utc,>,) -> CommitActivity
{
    let week_ago = now - Duration::days(WEEK_DAYS,);
    let month_ago = now - Duration::days(MONTH_DAYS,);

    let mut activity = CommitActivity::default();
    for commit in commits {
        let Some(authored_at,) = commit.authored_at.as_deref().and_then(parse_timestamp,) else {
            debug!("Skipping commit without a usable author timestamp: {:?}", commit.authored_at);
            activity.skipped += 1;
            continue;
        };

        if authored_at >= month_ago {
            activity.monthly += 1;
            if authored_at >= week_ago {
                activity.weekly += 1;
            }
        }
    }

    activity
}
