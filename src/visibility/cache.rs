use std::collections::HashMap;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::predict::PredictionRecord;

const BASE_BACKOFF_SECS: f64 = 60.0;
const MAX_BACKOFF_SECS: f64 = 3600.0;
const MIN_BACKOFF_SECS: f64 = 1.0;
const JITTER_RATIO: f64 = 0.1;

/// Random source for backoff jitter.
pub trait Jitter {
    /// Uniform sample in `[-spread, spread]`.
    fn sample(&mut self, spread: f64) -> f64;
}

impl Jitter for StdRng {
    fn sample(&mut self, spread: f64) -> f64 {
        if spread <= 0.0 {
            return 0.0;
        }
        self.random_range(-spread..=spread)
    }
}

/// Cached prediction and failure bookkeeping for one satellite.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheEntry {
    pub record: Option<PredictionRecord>,
    /// `set` timestamp of `record`; `None` forces a refetch.
    pub expires_at: Option<i64>,
    /// Monotonic deadline before which no fetch is attempted.
    pub retry_after: Option<Duration>,
    pub fail_streak: u32,
}

impl CacheEntry {
    fn valid_at(&self, now_utc: i64) -> Option<PredictionRecord> {
        match (self.record, self.expires_at) {
            (Some(record), Some(expires_at)) if now_utc <= expires_at => Some(record),
            _ => None,
        }
    }

    fn in_backoff(&self, now_monotonic: Duration) -> bool {
        self.retry_after.is_some_and(|deadline| now_monotonic < deadline)
    }
}

/// Outcome of one cache lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lookup {
    /// Stored prediction still covers `now`.
    Hit(PredictionRecord),
    /// A recent failure has not cooled down yet.
    Backoff,
    /// Fetch needed but the cycle has no budget left.
    Deferred,
    Fetched(PredictionRecord),
    Failed,
}

impl Lookup {
    pub fn record(&self) -> Option<PredictionRecord> {
        match self {
            Lookup::Hit(record) | Lookup::Fetched(record) => Some(*record),
            _ => None,
        }
    }

    /// Whether the fetcher was called, i.e. whether this lookup used fetch budget.
    pub fn attempted_fetch(&self) -> bool {
        matches!(self, Lookup::Fetched(_) | Lookup::Failed)
    }
}

/// Per-satellite prediction cache with exponential backoff on fetch failures.
pub struct PredictionCache<J: Jitter = StdRng> {
    entries: HashMap<u32, CacheEntry>,
    jitter: J,
}

impl PredictionCache<StdRng> {
    pub fn new() -> Self {
        Self::with_jitter(StdRng::from_os_rng())
    }
}

impl Default for PredictionCache<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<J: Jitter> PredictionCache<J> {
    pub fn with_jitter(jitter: J) -> Self {
        Self {
            entries: HashMap::new(),
            jitter,
        }
    }

    #[cfg(test)]
    pub fn entry(&self, norad_id: u32) -> Option<&CacheEntry> {
        self.entries.get(&norad_id)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Returns a usable prediction for `norad_id`, calling `fetch` only when the
    /// cached one has expired, the satellite is not in backoff and
    /// `fetch_allowed` is set.
    pub fn resolve<F>(
        &mut self,
        norad_id: u32,
        now_utc: i64,
        now_monotonic: Duration,
        fetch_allowed: bool,
        fetch: F,
    ) -> Lookup
    where
        F: FnOnce() -> Option<PredictionRecord>,
    {
        let entry = self.entries.entry(norad_id).or_default();

        if let Some(record) = entry.valid_at(now_utc) {
            log::debug!("Cache hit for {}", norad_id);
            return Lookup::Hit(record);
        }
        if entry.in_backoff(now_monotonic) {
            log::debug!("Skipping {}: in backoff", norad_id);
            return Lookup::Backoff;
        }
        if !fetch_allowed {
            log::debug!("Deferring fetch for {}: cycle budget exhausted", norad_id);
            return Lookup::Deferred;
        }

        match fetch() {
            Some(record) => {
                let expires_at = record.set_timestamp();
                if expires_at.is_none() {
                    log::error!(
                        "Prediction for {} has no usable set timestamp, will refetch",
                        norad_id
                    );
                }
                *entry = CacheEntry {
                    record: Some(record),
                    expires_at,
                    retry_after: None,
                    fail_streak: 0,
                };
                Lookup::Fetched(record)
            }
            None => {
                entry.fail_streak = entry.fail_streak.saturating_add(1);
                let delay = backoff_delay(entry.fail_streak, &mut self.jitter);
                entry.retry_after = Some(now_monotonic + delay);
                log::warn!(
                    "Fetch for {} failed ({} in a row), backing off {:.0}s",
                    norad_id,
                    entry.fail_streak,
                    delay.as_secs_f64()
                );
                Lookup::Failed
            }
        }
    }
}

/// `min(3600, 60 * 2^(streak - 1))` seconds with ±10% jitter, never under 1s.
fn backoff_delay<J: Jitter>(fail_streak: u32, jitter: &mut J) -> Duration {
    let exponent = fail_streak.saturating_sub(1).min(16);
    let base = (BASE_BACKOFF_SECS * f64::from(1u32 << exponent)).min(MAX_BACKOFF_SECS);
    let jittered = base + jitter.sample(base * JITTER_RATIO);
    Duration::from_secs_f64(jittered.max(MIN_BACKOFF_SECS))
}
