use crate::predict::types::PredictionRecord;

/// Inclusive span of UTC seconds during which a pass is at or above the
/// elevation threshold. `enter <= exit` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityWindow {
    pub enter: i64,
    pub exit: i64,
}

impl VisibilityWindow {
    pub fn contains(&self, now_utc: i64) -> bool {
        self.enter <= now_utc && now_utc <= self.exit
    }
}

/// Computes when the pass in `record` is above `min_elevation_deg`.
///
/// Returns `None` when the culmination never reaches the threshold, when any
/// field needed for the calculation is malformed, or when the ascending crossing
/// cannot be placed on the rise/culmination segment. A descending crossing that
/// cannot be placed keeps the satellite until `set`.
pub fn compute_window(
    record: &PredictionRecord,
    min_elevation_deg: f64,
) -> Option<VisibilityWindow> {
    let rise = record.rise.resolved()?;
    let culmination = record.culmination.resolved()?;
    let set = record.set.resolved()?;

    if culmination.1 < min_elevation_deg {
        return None;
    }

    let enter = if rise.1 >= min_elevation_deg {
        rise.0
    } else {
        crossing(rise, culmination, min_elevation_deg)?
    };

    let exit = if set.1 >= min_elevation_deg {
        set.0
    } else {
        crossing(culmination, set, min_elevation_deg).unwrap_or(set.0)
    };

    if enter > exit {
        log::debug!("Discarding inverted window {}..{}", enter, exit);
        return None;
    }

    Some(VisibilityWindow { enter, exit })
}

/// Time at which the elevation between two points equals `threshold`,
/// rounded to the nearest second. `None` if the span does not fit in an `i64`.
fn crossing(from: (i64, f64), to: (i64, f64), threshold: f64) -> Option<i64> {
    let (t1, a1) = from;
    let (t2, a2) = to;

    if a1 == a2 {
        return (a1 >= threshold).then_some(t1);
    }

    let fraction = (threshold - a1) / (a2 - a1);
    if !(0.0..=1.0).contains(&fraction) {
        return None;
    }

    let span = t2.checked_sub(t1)?;
    let offset = (fraction * span as f64).round() as i64;
    t1.checked_add(offset)
}
