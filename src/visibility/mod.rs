mod cache;
mod clock;
mod orchestrator;
mod scheduler;

pub use cache::Jitter;
#[cfg(test)]
pub use cache::PredictionCache;
pub use clock::{Clock, SystemClock};
pub use orchestrator::{VisibilityOrchestrator, VisibleSatellite};

#[cfg(test)]
pub(crate) use clock::testing;
