/// A single upstream reading: a millisecond timestamp and an optional value.
///
/// `value` is `None` for the single "no value" condition this system
/// recognizes: missing data, an unparseable upstream value, `NaN`, or
/// `±infinity`. There is deliberately no separate "error" variant — callers
/// that need to distinguish sentinel-masked values do so upstream of this
/// type, via `TagSettings::error_value`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub timestamp_ms: i64,
    pub value: Option<f64>,
}

impl Sample {
    pub fn new(timestamp_ms: i64, value: Option<f64>) -> Self {
        Self {
            timestamp_ms,
            value,
        }
    }

    /// Parses a raw upstream value, collapsing non-finite floats to absent.
    pub fn parse_value(raw: &str) -> Option<f64> {
        raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
    }
}

/// Taglist metadata as published by the upstream source. The core treats
/// `tag` as an opaque key; `unit` and `register_data_type` are carried
/// through untouched for the UI.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TagInfo {
    #[serde(rename = "Tag")]
    pub tag: String,
    #[serde(rename = "Unit")]
    pub unit: Option<String>,
    #[serde(rename = "RegisterDataType")]
    pub register_data_type: Option<String>,
}
