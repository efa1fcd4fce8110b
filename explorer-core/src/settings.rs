//! User-facing preferences consumed by the WORKING table builder and
//! otherwise opaque to the core.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Site-wide presentation and UI preferences.
///
/// `data_offset` and `forward_fill` drive the WORKING rebuild; everything
/// else is opaque to the core and persisted purely for the UI's benefit.
/// `extra` absorbs any keys this version of the core doesn't know about, so
/// a round trip through `/site_settings` never drops data a newer or older
/// client wrote.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteSettings {
    #[serde(default = "default_data_offset")]
    pub data_offset: f64,
    #[serde(default)]
    pub forward_fill: bool,
    #[serde(default)]
    pub sort_order: Option<String>,
    #[serde(default)]
    pub grouping_mode: Option<String>,
    #[serde(default)]
    pub dark_mode: Option<bool>,
    #[serde(default)]
    pub poll_interval: Option<f64>,
    #[serde(default)]
    pub barge_name: Option<String>,
    #[serde(default)]
    pub barge_number: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn default_data_offset() -> f64 {
    1.0
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            data_offset: default_data_offset(),
            forward_fill: false,
            sort_order: None,
            grouping_mode: None,
            dark_mode: None,
            poll_interval: None,
            barge_name: None,
            barge_number: None,
            start_date: None,
            end_date: None,
            extra: serde_json::Map::new(),
        }
    }
}

/// Per-tag presentation parameters consumed by [`crate::working::build`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagSettings {
    #[serde(default)]
    pub scale_factors: HashMap<String, f64>,
    #[serde(default)]
    pub error_value: HashMap<String, f64>,
    #[serde(default)]
    pub max_decimal: HashMap<String, u32>,
    #[serde(default)]
    pub global_forward_fill: bool,
}

impl TagSettings {
    pub fn scale_for(&self, tag: &str) -> f64 {
        self.scale_factors.get(tag).copied().unwrap_or(1.0)
    }

    pub fn decimals_for(&self, tag: &str) -> u32 {
        self.max_decimal.get(tag).copied().unwrap_or(2)
    }

    pub fn sentinel_for(&self, tag: &str) -> Option<f64> {
        self.error_value.get(tag).copied()
    }
}
