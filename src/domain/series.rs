//! Canonical price series produced by the row normalizer.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPoint {
    pub timestamp: NaiveDateTime,
    /// `timestamp` rendered as `YYYY-MM-DD`.
    pub date_key: String,
    pub price: f64,
}

impl SeriesPoint {
    pub fn new(timestamp: NaiveDateTime, price: f64) -> Self {
        SeriesPoint {
            date_key: timestamp.format(DATE_KEY_FORMAT).to_string(),
            timestamp,
            price,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }
}

/// Wire shape of one series point: `{"date": "YYYY-MM-DD", "price": 123.4}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub date: String,
    pub price: f64,
}

/// Non-empty, timestamp-ordered sequence of [`SeriesPoint`].
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    points: Vec<SeriesPoint>,
}

impl Series {
    /// Wraps already-ordered points; `None` when `points` is empty.
    pub fn from_sorted(points: Vec<SeriesPoint>) -> Option<Self> {
        if points.is_empty() {
            None
        } else {
            Some(Series { points })
        }
    }

    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> &SeriesPoint {
        &self.points[0]
    }

    pub fn last(&self) -> &SeriesPoint {
        &self.points[self.points.len() - 1]
    }

    /// Inclusive (first, last) dates.
    pub fn date_range(&self) -> (NaiveDate, NaiveDate) {
        (self.first().date(), self.last().date())
    }

    /// Points whose date lies within the inclusive, optional bounds.
    pub fn within(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Option<Series> {
        let points = self
            .points
            .iter()
            .filter(|p| start.is_none_or(|s| p.date() >= s) && end.is_none_or(|e| p.date() <= e))
            .cloned()
            .collect();
        Series::from_sorted(points)
    }

    pub fn to_price_records(&self) -> Vec<PriceRecord> {
        self.points
            .iter()
            .map(|p| PriceRecord {
                date: p.date_key.clone(),
                price: p.price,
            })
            .collect()
    }
}
