use serde_json::Value;

/// One point of a pass: when it happens and how high the satellite is.
///
/// Both fields are `None` when the prediction service sent something missing or
/// non-numeric.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PassPoint {
    pub utc_timestamp: Option<i64>,
    pub elevation_deg: Option<f64>,
}

impl PassPoint {
    #[cfg(test)]
    pub fn new(utc_timestamp: i64, elevation_deg: f64) -> Self {
        Self {
            utc_timestamp: Some(utc_timestamp),
            elevation_deg: Some(elevation_deg),
        }
    }

    fn from_json(value: Option<&Value>) -> Self {
        let Some(point) = value else {
            return Self::default();
        };
        Self {
            utc_timestamp: point.get("utc_timestamp").and_then(parse_timestamp),
            elevation_deg: point.get("alt").and_then(parse_elevation),
        }
    }

    /// Both fields, or `None` if either is malformed.
    pub fn resolved(&self) -> Option<(i64, f64)> {
        Some((self.utc_timestamp?, self.elevation_deg?))
    }
}

/// A predicted pass (rise, culmination, set) for one satellite.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PredictionRecord {
    pub rise: PassPoint,
    pub culmination: PassPoint,
    pub set: PassPoint,
}

impl PredictionRecord {
    #[cfg(test)]
    pub fn new(rise: PassPoint, culmination: PassPoint, set: PassPoint) -> Self {
        Self {
            rise,
            culmination,
            set,
        }
    }

    /// Normalizes one pass object from the prediction service.
    ///
    /// Returns `None` only when `value` is not a JSON object. Malformed points are
    /// kept as empty fields so the record can still be cached.
    pub fn from_json(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        Some(Self {
            rise: PassPoint::from_json(object.get("rise")),
            culmination: PassPoint::from_json(object.get("culmination")),
            set: PassPoint::from_json(object.get("set")),
        })
    }

    pub fn set_timestamp(&self) -> Option<i64> {
        self.set.utc_timestamp
    }
}

fn parse_timestamp(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
                .map(|f| f.trunc() as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn parse_elevation(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.filter(|f| f.is_finite())
}
