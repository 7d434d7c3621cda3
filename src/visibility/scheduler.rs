/// Satellite order and fetch allowance for one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CyclePlan {
    pub order: Vec<u32>,
    pub fetch_budget: usize,
}

/// Round-robin over the configured satellites so a small per-cycle fetch budget
/// still reaches every satellite in turn.
#[derive(Debug, Default)]
pub struct FetchScheduler {
    cursor: usize,
}

impl FetchScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Rotates `ids` to start at the cursor and advances the cursor by one.
    ///
    /// `max_fetches` caps the budget; without it every satellite may be fetched.
    pub fn plan_cycle(&mut self, ids: &[u32], max_fetches: Option<usize>) -> CyclePlan {
        if ids.is_empty() {
            return CyclePlan {
                order: Vec::new(),
                fetch_budget: 0,
            };
        }

        let start = self.cursor % ids.len();
        let mut order = Vec::with_capacity(ids.len());
        order.extend_from_slice(&ids[start..]);
        order.extend_from_slice(&ids[..start]);

        self.cursor = (start + 1) % ids.len();

        let fetch_budget = max_fetches.map_or(ids.len(), |cap| cap.min(ids.len()));
        CyclePlan {
            order,
            fetch_budget,
        }
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
    }
}
