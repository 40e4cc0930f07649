//! Statistical helpers for latency summaries and trend direction

use crate::analytics::error::{AnalyticsError, AnalyticsResult};
use serde::{Deserialize, Serialize};

/// Resolution-time percentiles in minutes
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Percentiles {
    pub p50: f64,
    pub p90: f64,
}

impl Percentiles {
    /// Calculate percentiles from a dataset; empty data yields zeros
    pub fn from_data(mut data: Vec<f64>) -> Self {
        if data.is_empty() {
            return Self::default();
        }

        data.sort_by(|a, b| a.total_cmp(b));

        Self {
            p50: percentile(&data, 50.0),
            p90: percentile(&data, 90.0),
        }
    }
}

/// Arithmetic mean; `None` for an empty dataset
pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(data.iter().sum::<f64>() / data.len() as f64)
}

/// Mean rounded to the nearest whole minute, 0 when empty
pub fn rounded_mean(data: &[f64]) -> i64 {
    mean(data).map(|m| m.round() as i64).unwrap_or(0)
}

/// Share of `part` in `whole` as a percentage with one decimal, 0 when
/// `whole` is zero
pub fn rate(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    ((part as f64 / whole as f64) * 1000.0).round() / 10.0
}

/// Direction of a fitted trend line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Rising,
    Falling,
    Flat,
}

/// Least-squares fit over an evenly spaced series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendAnalysis {
    /// Change per step
    pub slope: f64,
    pub intercept: f64,
    /// Coefficient of determination
    pub r_squared: f64,
    pub direction: TrendDirection,
}

impl TrendAnalysis {
    /// Slopes smaller than this (per step) count as flat
    const FLAT_THRESHOLD: f64 = 0.05;

    /// Fit a line through `values`, indexed 0..n
    pub fn analyze(values: &[f64]) -> AnalyticsResult<Self> {
        if values.len() < 2 {
            return Err(AnalyticsError::CalculationError(
                "Need at least 2 data points for trend analysis".to_string(),
            ));
        }

        let n = values.len() as f64;
        let mean_x = (n - 1.0) / 2.0;
        let mean_y = values.iter().sum::<f64>() / n;

        let mut numerator = 0.0;
        let mut denominator = 0.0;
        for (i, value) in values.iter().enumerate() {
            let x_diff = i as f64 - mean_x;
            numerator += x_diff * (value - mean_y);
            denominator += x_diff * x_diff;
        }

        let slope = if denominator != 0.0 {
            numerator / denominator
        } else {
            0.0
        };
        let intercept = mean_y - slope * mean_x;

        let mut ss_tot = 0.0;
        let mut ss_res = 0.0;
        for (i, value) in values.iter().enumerate() {
            let predicted = slope * i as f64 + intercept;
            ss_tot += (value - mean_y).powi(2);
            ss_res += (value - predicted).powi(2);
        }

        let r_squared = if ss_tot != 0.0 {
            1.0 - (ss_res / ss_tot)
        } else {
            0.0
        };

        let direction = if slope > Self::FLAT_THRESHOLD {
            TrendDirection::Rising
        } else if slope < -Self::FLAT_THRESHOLD {
            TrendDirection::Falling
        } else {
            TrendDirection::Flat
        };

        Ok(Self {
            slope,
            intercept,
            r_squared,
            direction,
        })
    }
}

/// Linear interpolation between closest ranks of sorted data
fn percentile(sorted_data: &[f64], percentile: f64) -> f64 {
    if sorted_data.is_empty() {
        return 0.0;
    }

    let index = (percentile / 100.0) * (sorted_data.len() - 1) as f64;
    let lower = index.floor() as usize;
    let upper = index.ceil() as usize;

    if lower == upper {
        sorted_data[lower]
    } else {
        let weight = index - lower as f64;
        sorted_data[lower] * (1.0 - weight) + sorted_data[upper] * weight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentiles() {
        let data = vec![10.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0];
        let percentiles = Percentiles::from_data(data);

        assert!((percentiles.p50 - 5.5).abs() < 0.01);
        assert!((percentiles.p90 - 9.1).abs() < 0.01);
        assert_eq!(Percentiles::from_data(vec![]), Percentiles::default());
    }

    #[test]
    fn test_rounded_mean() {
        assert_eq!(rounded_mean(&[]), 0);
        assert_eq!(rounded_mean(&[10.0, 11.0]), 11);
        assert_eq!(rounded_mean(&[10.2, 10.2]), 10);
    }

    #[test]
    fn test_rate() {
        assert_eq!(rate(0, 0), 0.0);
        assert_eq!(rate(1, 3), 33.3);
        assert_eq!(rate(4, 4), 100.0);
    }

    #[test]
    fn test_trend_analysis() {
        let trend = TrendAnalysis::analyze(&[2.0, 4.0, 6.0, 8.0, 10.0]).unwrap();
        assert!((trend.slope - 2.0).abs() < 0.01);
        assert!(trend.r_squared > 0.99);
        assert_eq!(trend.direction, TrendDirection::Rising);

        let flat = TrendAnalysis::analyze(&[3.0, 3.0, 3.0]).unwrap();
        assert_eq!(flat.direction, TrendDirection::Flat);

        assert!(TrendAnalysis::analyze(&[1.0]).is_err());
    }
}
