/// Fixed observer location passed to the pass prediction service.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundStation {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
}

impl Default for GroundStation {
    fn default() -> Self {
        Self {
            latitude_deg: 0.0,
            longitude_deg: 0.0,
        }
    }
}

impl GroundStation {
    /// Returns `None` when either coordinate is out of range or not finite.
    pub fn new(latitude_deg: f64, longitude_deg: f64) -> Option<Self> {
        if !(-90.0..=90.0).contains(&latitude_deg) || !(-180.0..=180.0).contains(&longitude_deg)
        {
            return None;
        }
        Some(Self {
            latitude_deg,
            longitude_deg,
        })
    }
}
