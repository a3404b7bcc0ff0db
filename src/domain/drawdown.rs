//! Peak-relative drawdown over any dated value curve.

use crate::domain::series::SeriesPoint;
use chrono::NaiveDate;
use serde::Serialize;

/// A dated value the drawdown deriver can consume.
pub trait ValuePoint {
    fn date(&self) -> NaiveDate;
    fn value(&self) -> f64;
}

impl ValuePoint for SeriesPoint {
    fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    fn value(&self) -> f64 {
        self.price
    }
}

impl ValuePoint for (NaiveDate, f64) {
    fn date(&self) -> NaiveDate {
        self.0
    }

    fn value(&self) -> f64 {
        self.1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawdownPoint {
    pub date: NaiveDate,
    pub peak: f64,
    /// `(value - peak) / peak`, always <= 0.
    pub drawdown: f64,
}

/// Single left-to-right pass with a running peak seeded from the first value.
///
/// The first value must be positive. An empty input yields an empty output.
pub fn derive_drawdowns<P: ValuePoint>(points: &[P]) -> Vec<DrawdownPoint> {
    let Some(first) = points.first() else {
        return Vec::new();
    };

    let mut peak = first.value();
    points
        .iter()
        .map(|point| {
            let value = point.value();
            if value > peak {
                peak = value;
            }
            DrawdownPoint {
                date: point.date(),
                peak,
                drawdown: (value - peak) / peak,
            }
        })
        .collect()
}

/// Depth of the worst drawdown as a positive fraction; 0.0 when empty.
pub fn max_drawdown(drawdowns: &[DrawdownPoint]) -> f64 {
    drawdowns
        .iter()
        .map(|d| -d.drawdown)
        .fold(0.0_f64, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn curve(values: &[f64]) -> Vec<(NaiveDate, f64)> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| (start + chrono::Duration::days(i as i64), v))
            .collect()
    }

    #[test]
    fn known_drawdowns() {
        let dd = derive_drawdowns(&curve(&[100.0, 120.0, 90.0, 130.0, 80.0]));
        let values: Vec<f64> = dd.iter().map(|d| d.drawdown).collect();

        assert_relative_eq!(values[0], 0.0);
        assert_relative_eq!(values[1], 0.0);
        assert_relative_eq!(values[2], -0.25);
        assert_relative_eq!(values[3], 0.0);
        assert_relative_eq!(values[4], -50.0 / 130.0);
        assert_relative_eq!(dd[4].peak, 130.0);
    }

    #[test]
    fn dates_pass_through() {
        let input = curve(&[10.0, 9.0]);
        let dd = derive_drawdowns(&input);
        assert_eq!(dd[1].date, input[1].0);
    }

    #[test]
    fn empty_input_gives_empty_output() {
        let empty: Vec<(NaiveDate, f64)> = Vec::new();
        assert!(derive_drawdowns(&empty).is_empty());
        assert_eq!(max_drawdown(&[]), 0.0);
    }

    #[test]
    fn max_drawdown_is_deepest_trough() {
        let dd = derive_drawdowns(&curve(&[100.0, 110.0, 90.0, 95.0, 80.0, 100.0]));
        assert_relative_eq!(max_drawdown(&dd), 30.0 / 110.0);
    }

    #[test]
    fn works_on_series_points() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let points = vec![
            SeriesPoint::new(start.and_hms_opt(0, 0, 0).unwrap(), 50.0),
            SeriesPoint::new(start.succ_opt().unwrap().and_hms_opt(0, 0, 0).unwrap(), 40.0),
        ];
        let dd = derive_drawdowns(&points);
        assert_relative_eq!(dd[1].drawdown, -0.2);
    }

    proptest! {
        #[test]
        fn peaks_monotonic_and_drawdowns_non_positive(
            values in proptest::collection::vec(0.01f64..1e6, 1..64)
        ) {
            let dd = derive_drawdowns(&curve(&values));
            prop_assert_eq!(dd.len(), values.len());

            let mut prev_peak = f64::MIN;
            for (d, &v) in dd.iter().zip(&values) {
                prop_assert!(d.peak >= prev_peak);
                prop_assert!(d.drawdown <= 0.0);
                if v == d.peak {
                    prop_assert_eq!(d.drawdown, 0.0);
                }
                prev_peak = d.peak;
            }
        }

        #[test]
        fn drawdown_depends_only_on_prefix(
            values in proptest::collection::vec(0.01f64..1e6, 2..32),
            cut in 1usize..32
        ) {
            let cut = cut.min(values.len());
            let full = derive_drawdowns(&curve(&values));
            let prefix = derive_drawdowns(&curve(&values[..cut]));
            prop_assert_eq!(&full[..cut], &prefix[..]);
        }
    }
}
