//! Shared helpers: id formatting, timestamp normalization and run naming

use chrono::{DateTime, NaiveDateTime, Utc};
use sha2::{Digest, Sha256};
use std::time::Duration;

/// Length of the hash suffix appended to generated run names
const RUN_HASH_LEN: usize = 8;

/// Formats a remote id with its object prefix, e.g. `TC-42`
pub fn format_pid(prefix: &str, id: u64) -> String {
    format!("{}-{}", prefix, id)
}

/// Normalizes a report timestamp to UTC
///
/// Accepts RFC 3339 timestamps with an offset as well as the offset-less
/// `YYYY-MM-DDTHH:MM:SS[.fff]` form JUnit producers usually emit, which is
/// taken to be UTC.
pub fn normalize_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Parses a non-negative decimal number of seconds
pub fn parse_seconds(raw: &str) -> Option<Duration> {
    let secs: f64 = raw.trim().replace(',', "").parse().ok()?;
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(secs).ok()
}

/// Formats a duration as seconds with millisecond precision
pub fn format_duration(duration: Duration) -> String {
    format!("{:.3}s", duration.as_secs_f64())
}

/// Stable run name for an upload
///
/// The suffix is derived from the report bytes, the project and the commit,
/// so uploading the same report twice produces the same name.
pub fn run_name(base: &str, report: &[u8], project_id: u64, commit: Option<&str>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(report);
    hasher.update(project_id.to_le_bytes());
    if let Some(commit) = commit {
        hasher.update(commit.as_bytes());
    }
    let digest = hex::encode(hasher.finalize());

    format!("{} {}", base, &digest[..RUN_HASH_LEN])
}
