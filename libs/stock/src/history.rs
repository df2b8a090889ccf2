use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;

use crate::{
    error::GatewayError,
    models::{PointTime, PricePoint},
};

const DAY_MILLIS: i64 = 24 * 60 * 60 * 1000;

/// Bar size requested from the chart endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interval {
    Minute1,
    Minute2,
    Day1,
    Week1,
}

impl Interval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::Minute1 => "1m",
            Interval::Minute2 => "2m",
            Interval::Day1 => "1d",
            Interval::Week1 => "1wk",
        }
    }

    /// Finest interval the provider serves for a window of this length.
    pub fn for_span(span: Duration) -> Self {
        let millis = span.num_milliseconds().max(0);
        let days = (millis + DAY_MILLIS - 1) / DAY_MILLIS;

        match days {
            0..=7 => Interval::Minute1,
            8..=60 => Interval::Minute2,
            61..=730 => Interval::Day1,
            _ => Interval::Week1,
        }
    }

    pub fn is_intraday(&self) -> bool {
        matches!(self, Interval::Minute1 | Interval::Minute2)
    }

    /// Chart time for a bar opening at `unix_seconds`.
    pub fn point_time(&self, unix_seconds: i64) -> PointTime {
        if self.is_intraday() {
            return PointTime::Timestamp(unix_seconds);
        }

        match DateTime::from_timestamp(unix_seconds, 0) {
            Some(dt) => PointTime::Date(dt.format("%Y-%m-%d").to_string()),
            None => PointTime::Timestamp(unix_seconds),
        }
    }
}

/// Resolved window and bar size for one history request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub interval: Interval,
}

impl HistoryRange {
    /// Window ending at `now`. `period1` defaults to a year back and is pulled
    /// back to one day before `now` if it lies in the future.
    pub fn resolve(period1: Option<&str>, now: DateTime<Utc>) -> Result<Self, GatewayError> {
        let start = match period1.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => parse_period(raw)
                .ok_or_else(|| GatewayError::InvalidDateRange(raw.to_string()))?,
            None => now - Duration::days(365),
        };

        Ok(Self::between(start, now))
    }

    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        let start = if start > end {
            end - Duration::days(1)
        } else {
            start
        };

        Self {
            start,
            end,
            interval: Interval::for_span(end - start),
        }
    }
}

fn parse_period(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Chart range buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangePreset {
    OneDay,
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
}

impl RangePreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            RangePreset::OneDay => "1D",
            RangePreset::OneMonth => "1M",
            RangePreset::ThreeMonths => "3M",
            RangePreset::SixMonths => "6M",
            RangePreset::OneYear => "1Y",
        }
    }

    pub fn lookback(&self) -> Duration {
        match self {
            RangePreset::OneDay => Duration::days(1),
            RangePreset::OneMonth => Duration::days(30),
            RangePreset::ThreeMonths => Duration::days(90),
            RangePreset::SixMonths => Duration::days(180),
            RangePreset::OneYear => Duration::days(365),
        }
    }

    pub fn range_ending(&self, now: DateTime<Utc>) -> HistoryRange {
        HistoryRange::between(now - self.lookback(), now)
    }
}

impl FromStr for RangePreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "1D" => Ok(RangePreset::OneDay),
            "1M" => Ok(RangePreset::OneMonth),
            "3M" => Ok(RangePreset::ThreeMonths),
            "6M" => Ok(RangePreset::SixMonths),
            "1Y" => Ok(RangePreset::OneYear),
            other => Err(format!("unknown range: {other}")),
        }
    }
}

/// Move across a series, first point to last.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSummary {
    pub latest: f64,
    pub change: f64,
    pub change_percent: f64,
}

impl PriceSummary {
    pub fn from_points(points: &[PricePoint]) -> Option<Self> {
        let first = points.first()?.value;
        let latest = points.last()?.value;
        let change = latest - first;
        let change_percent = if first == 0.0 {
            0.0
        } else {
            change / first * 100.0
        };

        Some(Self {
            latest,
            change,
            change_percent,
        })
    }
}
