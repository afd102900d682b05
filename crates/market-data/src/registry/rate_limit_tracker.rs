//! Per-provider rate-limit tracking from response headers.
//!
//! Every adapter feeds the headers of every response it receives into the
//! tracker. The tracker keeps the last observed limit state per provider and
//! classifies it into a [`RateLimitStatus`] the resolver consults before
//! calling a provider. The state is advisory: it decides whether a provider is
//! skipped, never whether a result is valid.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use log::{debug, warn};
use reqwest::header::HeaderMap;
use serde::Serialize;

/// Remaining-request count below which a provider is considered near its limit.
pub const DEFAULT_LOW_WATER_MARK: u64 = 10;

/// Reset values above this are absolute epoch seconds; below, seconds from now.
const EPOCH_RESET_THRESHOLD: f64 = 1_000_000_000.0;

const REMAINING_HEADERS: &[&str] = &["x-ratelimit-remaining", "ratelimit-remaining"];
const LIMIT_HEADERS: &[&str] = &["x-ratelimit-limit", "ratelimit-limit"];
const RESET_HEADERS: &[&str] = &["x-ratelimit-reset", "ratelimit-reset"];
const RETRY_AFTER_HEADER: &str = "retry-after";

/// Classification of a provider's tracked limit state.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RateLimitStatus {
    /// Nothing recorded yet.
    Unknown,
    /// Safe to call.
    Ok,
    /// Few requests left in the current window.
    NearLimit,
    /// No requests left until the reset time.
    Exhausted,
}

impl std::fmt::Display for RateLimitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown => write!(f, "UNKNOWN"),
            Self::Ok => write!(f, "OK"),
            Self::NearLimit => write!(f, "NEAR_LIMIT"),
            Self::Exhausted => write!(f, "EXHAUSTED"),
        }
    }
}

/// Limit state observed in one provider response.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitState {
    pub remaining: Option<u64>,
    pub reset_at: Option<DateTime<Utc>>,
    pub limit: Option<u64>,
    pub observed_at: DateTime<Utc>,
}

impl RateLimitState {
    /// Parse limit state out of response headers.
    ///
    /// Returns `None` when the response carries no rate-limit header at all.
    pub fn from_headers(headers: &HeaderMap, now: DateTime<Utc>) -> Option<Self> {
        let mut remaining = first_header(headers, REMAINING_HEADERS).and_then(parse_count);
        let limit = first_header(headers, LIMIT_HEADERS).and_then(parse_count);
        let mut reset_at =
            first_header(headers, RESET_HEADERS).and_then(|v| parse_reset(v, now));

        if let Some(retry_at) = headers
            .get(RETRY_AFTER_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| parse_retry_after(v, now))
        {
            // Retry-After is the provider telling us outright to stop
            remaining = remaining.or(Some(0));
            reset_at = Some(reset_at.map_or(retry_at, |r| r.max(retry_at)));
        }

        if remaining.is_none() && limit.is_none() && reset_at.is_none() {
            return None;
        }

        Some(Self {
            remaining,
            reset_at,
            limit,
            observed_at: now,
        })
    }

    /// Classify this state at time `now`.
    pub fn status_at(&self, now: DateTime<Utc>, low_water_mark: u64) -> RateLimitStatus {
        let reset_passed = self.reset_at.is_some_and(|reset| reset <= now);
        if reset_passed {
            return RateLimitStatus::Ok;
        }

        match self.remaining {
            None => RateLimitStatus::Ok,
            Some(0) if self.reset_at.is_some() => RateLimitStatus::Exhausted,
            // Zero left but no reset time: don't lock the provider out forever
            Some(0) => RateLimitStatus::NearLimit,
            Some(n) if n < low_water_mark => RateLimitStatus::NearLimit,
            Some(_) => RateLimitStatus::Ok,
        }
    }
}

fn first_header<'a>(headers: &'a HeaderMap, names: &[&str]) -> Option<&'a str> {
    names
        .iter()
        .find_map(|name| headers.get(*name))
        .and_then(|v| v.to_str().ok())
}

/// First entry of a possibly comma-separated list, e.g. `"100, 100;w=60"`.
fn first_entry(raw: &str) -> &str {
    raw.split(',')
        .next()
        .unwrap_or(raw)
        .split(';')
        .next()
        .unwrap_or(raw)
        .trim()
}

fn parse_count(raw: &str) -> Option<u64> {
    let entry = first_entry(raw);
    entry
        .parse::<u64>()
        .ok()
        .or_else(|| entry.parse::<f64>().ok().filter(|v| *v >= 0.0).map(|v| v as u64))
}

fn parse_reset(raw: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let value = first_entry(raw).parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0)?;
    if value > EPOCH_RESET_THRESHOLD {
        Some(
            Utc.timestamp_opt(value as i64, 0)
                .single()
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        )
    } else {
        Some(saturating_offset(
            now,
            ChronoDuration::try_milliseconds((value * 1000.0) as i64),
        ))
    }
}

fn parse_retry_after(raw: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        // Delay-seconds too large for any clock still means "not before then"
        let delta = trimmed
            .parse::<u64>()
            .ok()
            .and_then(|secs| i64::try_from(secs).ok())
            .and_then(ChronoDuration::try_seconds);
        return Some(saturating_offset(now, delta));
    }
    DateTime::parse_from_rfc2822(trimmed)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// `now + delta`, clamped to the latest representable instant on overflow.
fn saturating_offset(now: DateTime<Utc>, delta: Option<ChronoDuration>) -> DateTime<Utc> {
    delta
        .and_then(|d| now.checked_add_signed(d))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Process-wide cache of per-provider limit state.
///
/// Thread-safe; written by adapters after every response and read by the
/// resolver before every call. Concurrent writes are last-write-wins.
pub struct RateLimitTracker {
    states: Mutex<HashMap<String, RateLimitState>>,
    low_water_mark: u64,
}

impl RateLimitTracker {
    /// Create a tracker with the default low-water mark.
    pub fn new() -> Self {
        Self::with_low_water_mark(DEFAULT_LOW_WATER_MARK)
    }

    pub fn with_low_water_mark(low_water_mark: u64) -> Self {
        Self {
            states: Mutex::new(HashMap::new()),
            low_water_mark,
        }
    }

    pub fn low_water_mark(&self) -> u64 {
        self.low_water_mark
    }

    /// Lock the states mutex, recovering from poison if necessary.
    ///
    /// The worst case of a poisoned cache is a stale skip decision.
    fn lock_states(&self) -> MutexGuard<'_, HashMap<String, RateLimitState>> {
        self.states.lock().unwrap_or_else(|poisoned| {
            warn!("Rate-limit tracker mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Record the headers of a response from `provider_id`.
    ///
    /// Responses without rate-limit headers leave the state untouched.
    pub fn record(&self, provider_id: &str, headers: &HeaderMap) {
        self.record_at(provider_id, headers, Utc::now());
    }

    pub fn record_at(&self, provider_id: &str, headers: &HeaderMap, now: DateTime<Utc>) {
        let Some(state) = RateLimitState::from_headers(headers, now) else {
            return;
        };

        debug!(
            "Rate limit for '{}': remaining={:?} limit={:?} reset_at={:?}",
            provider_id, state.remaining, state.limit, state.reset_at
        );
        self.set_state(provider_id, state);
    }

    /// Overwrite the state for a provider.
    pub fn set_state(&self, provider_id: &str, state: RateLimitState) {
        self.lock_states().insert(provider_id.to_string(), state);
    }

    /// Last recorded state for a provider.
    pub fn state(&self, provider_id: &str) -> Option<RateLimitState> {
        self.lock_states().get(provider_id).cloned()
    }

    pub fn status(&self, provider_id: &str) -> RateLimitStatus {
        self.status_at(provider_id, Utc::now())
    }

    pub fn status_at(&self, provider_id: &str, now: DateTime<Utc>) -> RateLimitStatus {
        match self.lock_states().get(provider_id) {
            Some(state) => state.status_at(now, self.low_water_mark),
            None => RateLimitStatus::Unknown,
        }
    }
}

impl Default for RateLimitTracker {
    fn default() -> Self {
        Self::new()
    }
}
