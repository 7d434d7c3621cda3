use std::cell::RefCell;
use std::collections::HashMap;

use crate::predict::fetcher::Fetcher;
use crate::predict::ground_station::GroundStation;
use crate::predict::types::PredictionRecord;

/// Fetcher with canned answers per satellite that records every call.
///
/// Satellites without an answer behave like a failed fetch.
#[derive(Default)]
pub struct StaticFetcher {
    answers: HashMap<u32, Option<PredictionRecord>>,
    calls: RefCell<Vec<u32>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, norad_id: u32, record: PredictionRecord) -> Self {
        self.answers.insert(norad_id, Some(record));
        self
    }

    pub fn without(mut self, norad_id: u32) -> Self {
        self.answers.insert(norad_id, None);
        self
    }

    pub fn calls(&self) -> Vec<u32> {
        self.calls.borrow().clone()
    }
}

impl Fetcher for StaticFetcher {
    fn fetch(&self, norad_id: u32, _station: &GroundStation) -> Option<PredictionRecord> {
        self.calls.borrow_mut().push(norad_id);
        self.answers.get(&norad_id).copied().flatten()
    }
}
