//! Daily incident-count forecast.
//!
//! A deliberately simple moving-average model: the mean of the last seven
//! observed days, damped on weekends, with a normal 95% band. It is a
//! placeholder, not a time-series model.

#![allow(clippy::cast_precision_loss)]

use std::collections::BTreeMap;

use chrono::{Datelike, Days, NaiveDate, Weekday};
use geo_incidents_analysis_models::{ForecastPoint, ForecastReport, InsufficientData};
use geo_incidents_incident_models::IncidentPoint;

use crate::{AnalysisEngine, AnalysisError, stats};

/// Default number of days to project.
pub const DEFAULT_FORECAST_DAYS: u32 = 7;

const MIN_INCIDENTS: usize = 7;
const MIN_DISTINCT_DAYS: usize = 3;
const BASELINE_WINDOW_DAYS: usize = 7;
const WEEKEND_FACTOR: f64 = 0.8;
const SINGLE_POINT_STD_RATIO: f64 = 0.2;
const Z_95: f64 = 1.96;

impl AnalysisEngine {
    /// Projects daily incident counts for the `days_to_predict` days after
    /// the last observed day.
    ///
    /// Too little history yields an empty report with an explanatory
    /// message rather than an error.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Computation`] if a projected date falls
    /// outside the supported calendar range.
    pub fn predict_time_series(
        &self,
        incidents: &[IncidentPoint],
        days_to_predict: u32,
    ) -> Result<ForecastReport, AnalysisError> {
        if incidents.len() < MIN_INCIDENTS {
            return Ok(ForecastReport::insufficient(InsufficientData::TooFewIncidents));
        }

        let daily = daily_counts(incidents);
        if daily.len() < MIN_DISTINCT_DAYS {
            return Ok(ForecastReport::insufficient(InsufficientData::TooFewDays));
        }

        let counts: Vec<f64> = daily.values().map(|&c| c as f64).collect();
        let window = &counts[counts.len().saturating_sub(BASELINE_WINDOW_DAYS)..];
        let mean = stats::mean(window);
        let std = if window.len() > 1 {
            stats::sample_std(window)
        } else {
            mean * SINGLE_POINT_STD_RATIO
        };

        let Some(&last_day) = daily.keys().next_back() else {
            return Ok(ForecastReport::insufficient(InsufficientData::TooFewDays));
        };

        let predictions = (1..=u64::from(days_to_predict))
            .map(|offset| -> Result<ForecastPoint, AnalysisError> {
                let date = last_day
                    .checked_add_days(Days::new(offset))
                    .ok_or_else(|| AnalysisError::Computation {
                        message: format!("{offset} days after {last_day} is out of range"),
                    })?;
                Ok(project(date, mean, std))
            })
            .collect::<Result<Vec<_>, _>>()?;

        log::debug!(
            "Forecast {days_to_predict} days from {} daily points (mean={mean:.2}, std={std:.2})",
            counts.len(),
        );

        Ok(ForecastReport {
            predictions,
            historical_mean: Some(stats::round_to(mean, 2)),
            historical_std: Some(stats::round_to(std, 2)),
            data_points_used: Some(counts.len()),
            message: None,
        })
    }
}

/// Incident counts per calendar day, oldest first.
fn daily_counts(incidents: &[IncidentPoint]) -> BTreeMap<NaiveDate, usize> {
    let mut daily = BTreeMap::new();
    for incident in incidents {
        *daily.entry(incident.created_on()).or_insert(0) += 1;
    }
    daily
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

fn project(date: NaiveDate, mean: f64, std: f64) -> ForecastPoint {
    let factor = if is_weekend(date) { WEEKEND_FACTOR } else { 1.0 };
    let predicted = mean * factor;
    let margin = Z_95 * std;

    ForecastPoint {
        date,
        predicted_count: stats::round_to(predicted, 1),
        confidence_interval_lower: stats::round_to((predicted - margin).max(0.0), 1),
        confidence_interval_upper: stats::round_to(predicted + margin, 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{engine, on_day};

    fn spread(days: &[(&str, usize)]) -> Vec<IncidentPoint> {
        days.iter()
            .flat_map(|(day, n)| (0..*n).map(move |i| on_day(&format!("{day}-{i}"), day)))
            .collect()
    }

    #[test]
    fn six_incidents_are_not_enough() {
        let incidents = spread(&[("2025-01-01", 2), ("2025-01-02", 2), ("2025-01-03", 2)]);
        let report = engine().predict_time_series(&incidents, 7).unwrap();
        assert!(report.predictions.is_empty());
        assert!(
            report
                .message
                .as_deref()
                .unwrap()
                .contains("minimum 7 incidents required")
        );
    }

    #[test]
    fn two_days_are_not_enough() {
        let incidents = spread(&[("2025-01-01", 4), ("2025-01-02", 4)]);
        let report = engine().predict_time_series(&incidents, 7).unwrap();
        assert!(report.predictions.is_empty());
        assert_eq!(
            report.message.as_deref(),
            Some("Insufficient daily variation for prediction")
        );
        assert!(report.historical_mean.is_none());
    }

    #[test]
    fn projects_mean_with_sample_std_band() {
        // Mon 6th .. Wed 8th January 2025: counts 2, 3, 4.
        let incidents = spread(&[("2025-01-06", 2), ("2025-01-07", 3), ("2025-01-08", 4)]);
        let report = engine().predict_time_series(&incidents, 7).unwrap();

        assert!(report.is_forecast());
        assert_eq!(report.data_points_used, Some(3));
        assert_eq!(report.historical_mean, Some(3.0));
        assert_eq!(report.historical_std, Some(1.0));
        assert_eq!(report.predictions.len(), 7);

        let first = &report.predictions[0];
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2025, 1, 9).unwrap());
        assert!((first.predicted_count - 3.0).abs() < 1e-9);
        assert!((first.confidence_interval_lower - 1.0).abs() < 1e-9);
        assert!((first.confidence_interval_upper - 5.0).abs() < 1e-9);
    }

    #[test]
    fn weekends_are_damped() {
        let incidents = spread(&[("2025-01-06", 2), ("2025-01-07", 3), ("2025-01-08", 4)]);
        let report = engine().predict_time_series(&incidents, 7).unwrap();

        // Thu 9, Fri 10, Sat 11, Sun 12, Mon 13 ...
        let saturday = &report.predictions[2];
        assert_eq!(saturday.date.weekday(), Weekday::Sat);
        assert!((saturday.predicted_count - 2.4).abs() < 1e-9);
        assert!((report.predictions[3].predicted_count - 2.4).abs() < 1e-9);
        assert!((report.predictions[4].predicted_count - 3.0).abs() < 1e-9);

        for point in &report.predictions {
            assert!(point.confidence_interval_lower <= point.predicted_count);
            assert!(point.predicted_count <= point.confidence_interval_upper);
            if is_weekend(point.date) {
                assert!(point.predicted_count <= 3.0);
            }
        }
    }

    #[test]
    fn baseline_uses_last_seven_days() {
        let incidents = spread(&[
            ("2025-02-01", 50),
            ("2025-02-02", 1),
            ("2025-02-03", 1),
            ("2025-02-04", 1),
            ("2025-02-05", 1),
            ("2025-02-06", 1),
            ("2025-02-07", 1),
            ("2025-02-08", 1),
        ]);
        let report = engine().predict_time_series(&incidents, 3).unwrap();

        assert_eq!(report.data_points_used, Some(8));
        assert_eq!(report.historical_mean, Some(1.0));
        assert_eq!(report.historical_std, Some(0.0));
        assert_eq!(report.predictions.len(), 3);
    }

    #[test]
    fn lower_bound_is_floored_at_zero() {
        let incidents = spread(&[("2025-03-03", 1), ("2025-03-04", 1), ("2025-03-05", 10)]);
        let report = engine().predict_time_series(&incidents, 1).unwrap();
        let point = &report.predictions[0];
        assert!(point.confidence_interval_lower.abs() < f64::EPSILON);
        assert!(point.confidence_interval_upper > point.predicted_count);
    }

    #[test]
    fn zero_day_horizon_is_empty_but_reports_statistics() {
        let incidents = spread(&[("2025-01-06", 2), ("2025-01-07", 3), ("2025-01-08", 4)]);
        let report = engine().predict_time_series(&incidents, 0).unwrap();
        assert!(report.predictions.is_empty());
        assert!(report.is_forecast());
        assert_eq!(report.historical_mean, Some(3.0));
    }
}
