use serde::{Deserialize, Serialize};

/// Latest price for one symbol. Missing numeric fields decode as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: String,

    #[serde(default)]
    pub price: f64,

    #[serde(default)]
    pub change: f64,

    #[serde(default)]
    pub change_percent: f64,
}

impl Quote {
    pub fn new(symbol: impl Into<String>, price: f64, change: f64, change_percent: f64) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            change,
            change_percent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub symbol: String,
    pub name: String,
    pub exchange: String,

    #[serde(rename = "type")]
    pub kind: String,
}

/// Chart x-axis value: a calendar date for daily and weekly bars, unix seconds
/// for intraday bars.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointTime {
    Date(String),
    Timestamp(i64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub time: PointTime,
    pub value: f64,
}
