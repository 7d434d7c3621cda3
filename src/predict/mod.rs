mod error;
mod fetcher;
mod ground_station;
mod types;
mod window;

pub use fetcher::{Fetcher, PassesClient, ReqwestClient, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use ground_station::GroundStation;
pub use types::PredictionRecord;
#[cfg(test)]
pub use types::PassPoint;
pub use window::compute_window;

#[cfg(test)]
pub(crate) mod testing;
