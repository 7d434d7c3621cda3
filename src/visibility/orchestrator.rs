use std::time::Duration;

use rand::rngs::StdRng;

use crate::config::Config;
use crate::predict::{compute_window, Fetcher};
use crate::visibility::cache::{Jitter, PredictionCache};
use crate::visibility::scheduler::FetchScheduler;

/// A configured satellite that is above the elevation threshold right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleSatellite {
    pub norad_id: u32,
    pub tag: String,
}

/// Runs one visibility cycle at a time over the configured satellites.
///
/// Owns all state that survives between cycles: the prediction cache and the
/// scheduler cursor. Single-owner; wrap it in a lock if cycles ever run
/// concurrently.
pub struct VisibilityOrchestrator<F: Fetcher, J: Jitter = StdRng> {
    fetcher: F,
    cache: PredictionCache<J>,
    scheduler: FetchScheduler,
}

impl<F: Fetcher> VisibilityOrchestrator<F> {
    pub fn new(fetcher: F) -> Self {
        Self::with_cache(fetcher, PredictionCache::new())
    }
}

impl<F: Fetcher, J: Jitter> VisibilityOrchestrator<F, J> {
    pub fn with_cache(fetcher: F, cache: PredictionCache<J>) -> Self {
        Self {
            fetcher,
            cache,
            scheduler: FetchScheduler::new(),
        }
    }

    #[cfg(test)]
    pub fn cache(&self) -> &PredictionCache<J> {
        &self.cache
    }

    #[cfg(test)]
    pub fn scheduler(&self) -> &FetchScheduler {
        &self.scheduler
    }

    #[cfg(test)]
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Clears every cached prediction and rewinds the scheduler.
    #[allow(dead_code)]
    pub fn reset(&mut self) {
        self.cache.clear();
        self.scheduler.reset();
    }

    /// Returns the satellites visible at `now_utc`, in this cycle's rotation order.
    ///
    /// Fetches at most the cycle's budget; cache hits and backoff skips are free.
    pub fn evaluate_cycle(
        &mut self,
        config: &Config,
        now_utc: i64,
        now_monotonic: Duration,
    ) -> Vec<VisibleSatellite> {
        let plan = self
            .scheduler
            .plan_cycle(&config.satellite_ids(), config.max_fetches_per_cycle);
        let mut budget = plan.fetch_budget;
        let mut visible = Vec::new();

        let fetcher = &self.fetcher;
        let station = &config.station;

        for norad_id in plan.order {
            let Some(tag) = config.satellites.get(&norad_id) else {
                continue;
            };

            let lookup = self.cache.resolve(norad_id, now_utc, now_monotonic, budget > 0, || {
                fetcher.fetch(norad_id, station)
            });
            if lookup.attempted_fetch() {
                budget = budget.saturating_sub(1);
            }

            let Some(record) = lookup.record() else {
                continue;
            };

            match compute_window(&record, config.min_elevation_deg) {
                Some(window) if window.contains(now_utc) => {
                    log::debug!(
                        "{} visible ({}..{}, now {})",
                        norad_id,
                        window.enter,
                        window.exit,
                        now_utc
                    );
                    visible.push(VisibleSatellite {
                        norad_id,
                        tag: tag.clone(),
                    });
                }
                Some(_) => {}
                None => log::debug!("{} has no qualifying window", norad_id),
            }
        }

        visible
    }
}
