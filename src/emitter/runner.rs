use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::emitter::format::format_line;
use crate::emitter::sink::emit_to_all;
use crate::predict::Fetcher;
use crate::visibility::{Clock, Jitter, VisibilityOrchestrator};

/// Longest stretch the loop sleeps without checking for shutdown.
const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

/// Fixed-cadence loop: evaluate visibility, emit a line when anything is up,
/// sleep out the rest of the period.
pub struct Runner<F: Fetcher, J: Jitter, C: Clock> {
    pub config: Config,
    pub visibility: VisibilityOrchestrator<F, J>,
    pub clock: C,
}

impl<F: Fetcher, J: Jitter, C: Clock> Runner<F, J, C> {
    pub fn new(config: Config, visibility: VisibilityOrchestrator<F, J>, clock: C) -> Self {
        Self {
            config,
            visibility,
            clock,
        }
    }

    /// Runs one cycle and returns the emitted line, if any.
    pub fn tick(&mut self) -> Option<String> {
        let visible = self.visibility.evaluate_cycle(
            &self.config,
            self.clock.now_utc(),
            self.clock.now_monotonic(),
        );
        if visible.is_empty() {
            return None;
        }

        let line = format_line(&visible);
        let delivered = emit_to_all(&self.config.outputs, &line);
        log::debug!(
            "Emitted {:?} to {}/{} outputs",
            line,
            delivered,
            self.config.outputs.len()
        );
        Some(line)
    }

    /// Single cycle with no trailing sleep.
    pub fn run_once(&mut self) -> Option<String> {
        self.tick()
    }

    /// Runs cycles every `period` until `shutdown` is set.
    pub fn run_until(&mut self, shutdown: &AtomicBool) {
        log::info!(
            "Watching {} satellites every {}",
            self.config.satellites.len(),
            humantime::format_duration(self.config.period)
        );
        while !shutdown.load(Ordering::SeqCst) {
            let started = self.clock.now_monotonic();
            self.tick();
            let elapsed = self.clock.now_monotonic().saturating_sub(started);

            match self.config.period.checked_sub(elapsed) {
                Some(remaining) if !remaining.is_zero() => sleep_unless(remaining, shutdown),
                _ => log::warn!(
                    "Cycle took {:?}, longer than the {:?} period",
                    elapsed,
                    self.config.period
                ),
            }
        }
    }
}

fn sleep_unless(duration: Duration, shutdown: &AtomicBool) {
    let deadline = Instant::now() + duration;
    while !shutdown.load(Ordering::SeqCst) {
        let now = Instant::now();
        if now >= deadline {
            return;
        }
        thread::sleep((deadline - now).min(SHUTDOWN_POLL));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use crate::emitter::Sink;
    use crate::predict::testing::StaticFetcher;
    use crate::predict::{GroundStation, PassPoint, PredictionRecord};
    use crate::visibility::testing::ManualClock;
    use crate::visibility::PredictionCache;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::path::Path;
    use std::sync::Arc;

    fn config(output: &Path) -> Config {
        Config {
            station: GroundStation::new(37.8, -122.4).unwrap(),
            satellites: [(25544, "blue".to_string()), (48915, "pink".to_string())]
                .into_iter()
                .collect(),
            outputs: vec![Sink::File(output.to_path_buf())],
            min_elevation_deg: 28.0,
            max_fetches_per_cycle: Some(1),
            period: Duration::from_secs(10),
            api: ApiConfig::default(),
        }
    }

    fn runner(output: &Path, now: i64) -> Runner<StaticFetcher, StdRng, ManualClock> {
        let pass = |rise: i64| {
            PredictionRecord::new(
                PassPoint::new(rise, 10.0),
                PassPoint::new(rise + 100, 46.0),
                PassPoint::new(rise + 200, 10.0),
            )
        };
        let fetcher = StaticFetcher::new().with(25544, pass(1000)).with(48915, pass(1020));
        let visibility = VisibilityOrchestrator::with_cache(
            fetcher,
            PredictionCache::with_jitter(StdRng::seed_from_u64(3)),
        );
        Runner::new(config(output), visibility, ManualClock::new(now))
    }

    #[test]
    fn emits_sorted_line_once_both_are_fetched() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("lamp.txt");
        let mut runner = runner(&output, 1100);

        // One fetch per cycle: 25544 first, then 48915.
        assert_eq!(runner.run_once().as_deref(), Some("25544: blue"));
        runner.clock.advance(Duration::from_secs(10));
        assert_eq!(runner.tick().as_deref(), Some("25544: blue, 48915: pink"));

        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            "25544: blue\n25544: blue, 48915: pink\n"
        );
    }

    #[test]
    fn nothing_visible_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("lamp.txt");
        let mut runner = runner(&output, 5000);

        assert_eq!(runner.tick(), None);
        assert!(!output.exists());
    }

    #[test]
    fn stops_before_first_cycle_when_already_shut_down() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("lamp.txt");
        let mut runner = runner(&output, 1100);

        runner.run_until(&AtomicBool::new(true));

        assert!(runner.visibility.fetcher().calls().is_empty());
        assert!(!output.exists());
    }

    #[test]
    fn shutdown_interrupts_sleep() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("lamp.txt");
        let mut runner = runner(&output, 1100);
        runner.config.period = Duration::from_secs(3600);

        let shutdown = Arc::new(AtomicBool::new(false));
        let trigger = Arc::clone(&shutdown);
        let stopper = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            trigger.store(true, Ordering::SeqCst);
        });

        let started = Instant::now();
        runner.run_until(&shutdown);
        stopper.join().unwrap();

        assert!(started.elapsed() < Duration::from_secs(60));
        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            "25544: blue\n"
        );
    }
}
