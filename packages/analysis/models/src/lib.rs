#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Result types produced by the incident analysis engine.
//!
//! Field names mirror the JSON contract of the analysis API one-to-one, so
//! these types are serialized directly into responses.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use geo_incidents_incident_models::Coordinate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// One density cluster found by a clustering run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterResult {
    /// Run-local identifier, assigned in discovery order from 0.
    pub cluster_id: usize,
    /// Arithmetic mean of member coordinates.
    pub center: Coordinate,
    /// Number of member incidents.
    pub point_count: usize,
    /// Member incident ids, in input order.
    pub incidents: Vec<String>,
    /// Largest great-circle distance from the center to a member, in km.
    pub radius: f64,
    /// Mean ordinal severity of the members.
    pub avg_severity: f64,
}

/// Clusters plus the number of points left as noise.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusteringOutcome {
    /// Clusters in id order.
    pub clusters: Vec<ClusterResult>,
    /// Points reachable from no core point.
    pub noise_count: usize,
}

impl ClusteringOutcome {
    /// Total number of incidents assigned to some cluster.
    #[must_use]
    pub fn total_clustered(&self) -> usize {
        self.clusters.iter().map(|c| c.point_count).sum()
    }
}

/// A cluster ranked by composite count/severity intensity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotspotResult {
    /// Generated identifier.
    pub id: String,
    /// Cluster centroid.
    pub center: Coordinate,
    /// Composite score in `[0, 1]`.
    pub intensity: f64,
    /// Number of incidents in the hotspot.
    pub incident_count: usize,
    /// Radius in km, never below 0.1.
    pub radius: f64,
    /// Distinct category ids among the members.
    pub categories: Vec<String>,
}

/// Risk classification of a grid cell.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RiskLevel {
    /// Below the median cell density. Never emitted as a zone.
    Low,
    /// At or above the median cell density.
    Medium,
    /// At or above the 75th percentile cell density.
    High,
}

/// A medium- or high-risk grid cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskZone {
    /// Generated identifier.
    pub id: String,
    /// Closed rectangular ring: five vertices, the first repeated last.
    pub polygon: Vec<Coordinate>,
    /// Risk classification.
    pub risk_level: RiskLevel,
    /// Incidents inside the cell.
    pub incident_count: usize,
    /// `min(count / 10, 1)`, two decimals.
    pub prediction_confidence: f64,
    /// Incidents per category id, `"unknown"` for uncategorized.
    pub category_breakdown: BTreeMap<String, usize>,
}

/// Projected incident count for one future day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// Calendar day being predicted.
    pub date: NaiveDate,
    /// Expected incident count.
    pub predicted_count: f64,
    /// Lower bound of the 95% band, floored at 0.
    pub confidence_interval_lower: f64,
    /// Upper bound of the 95% band.
    pub confidence_interval_upper: f64,
}

/// Why a forecast could not be produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsufficientData {
    /// Fewer incidents than the forecaster's floor.
    TooFewIncidents,
    /// Incidents span too few distinct days.
    TooFewDays,
}

impl InsufficientData {
    /// Human-readable explanation returned to callers.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::TooFewIncidents => {
                "Insufficient data for prediction (minimum 7 incidents required)"
            }
            Self::TooFewDays => "Insufficient daily variation for prediction",
        }
    }
}

/// Output of the daily-count forecaster.
///
/// On the insufficient-data paths `predictions` is empty, `message` is set
/// and the summary statistics are absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastReport {
    /// One point per predicted day.
    pub predictions: Vec<ForecastPoint>,
    /// Mean of the baseline window, two decimals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub historical_mean: Option<f64>,
    /// Spread of the baseline window, two decimals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub historical_std: Option<f64>,
    /// Number of distinct days in the history.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_points_used: Option<usize>,
    /// Explanation when no forecast was produced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ForecastReport {
    /// An empty report explaining why no forecast was made.
    #[must_use]
    pub fn insufficient(reason: InsufficientData) -> Self {
        Self {
            message: Some(reason.message().to_string()),
            ..Self::default()
        }
    }

    /// Whether the report carries predictions.
    #[must_use]
    pub const fn is_forecast(&self) -> bool {
        self.message.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_report_serializes_without_statistics() {
        let report = ForecastReport::insufficient(InsufficientData::TooFewIncidents);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["predictions"], serde_json::json!([]));
        assert!(
            json["message"]
                .as_str()
                .unwrap()
                .starts_with("Insufficient data")
        );
        assert!(json.get("historical_mean").is_none());
        assert!(!report.is_forecast());
    }

    #[test]
    fn forecast_point_date_is_iso() {
        let point = ForecastPoint {
            date: NaiveDate::from_ymd_opt(2025, 1, 8).unwrap(),
            predicted_count: 3.0,
            confidence_interval_lower: 1.0,
            confidence_interval_upper: 5.0,
        };
        let json = serde_json::to_value(&point).unwrap();
        assert_eq!(json["date"], "2025-01-08");
    }

    #[test]
    fn risk_level_uses_lowercase_on_the_wire() {
        assert_eq!(
            serde_json::to_value(RiskLevel::High).unwrap(),
            serde_json::json!("high")
        );
        assert_eq!(RiskLevel::Medium.to_string(), "medium");
    }

    #[test]
    fn total_clustered_sums_point_counts() {
        let cluster = |id, n| ClusterResult {
            cluster_id: id,
            center: Coordinate::new(0.0, 0.0),
            point_count: n,
            incidents: Vec::new(),
            radius: 0.0,
            avg_severity: 1.0,
        };
        let outcome = ClusteringOutcome {
            clusters: vec![cluster(0, 4), cluster(1, 3)],
            noise_count: 2,
        };
        assert_eq!(outcome.total_clustered(), 7);
    }
}
