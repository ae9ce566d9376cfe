use serde::{Deserialize, Serialize};

/// A pickup or dropoff point: a free-text label plus coordinates.
/// The label is what search matches against; the coordinates carry no
/// semantics inside the ledger and are passed through for map display.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Place {
    pub label: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Place {
    pub fn new(label: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            label: label.into(),
            latitude,
            longitude,
        }
    }
}
