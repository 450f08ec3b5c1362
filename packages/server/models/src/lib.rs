#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the analysis server.
//!
//! Requests are validated here before anything reaches the engine: the
//! engine assumes well-formed coordinates and parameters.

use std::collections::BTreeMap;

use geo_incidents_analysis::forecast::DEFAULT_FORECAST_DAYS;
use geo_incidents_analysis::hotspots::DEFAULT_HOTSPOT_THRESHOLD;
use geo_incidents_analysis::risk_zones::DEFAULT_GRID_SIZE;
use geo_incidents_analysis_models::{ClusterResult, ClusteringOutcome, HotspotResult, RiskZone};
use geo_incidents_incident_models::IncidentPoint;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default analysis window echoed back by the risk-zone endpoint.
pub const DEFAULT_TIME_WINDOW_DAYS: u32 = 30;

/// Longest forecast horizon accepted.
pub const MAX_FORECAST_DAYS: u32 = 365;

/// A request that was rejected before analysis.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// An incident has an empty identifier.
    #[error("Incident at index {index} has an empty id")]
    MissingId {
        /// Position in the submitted list.
        index: usize,
    },

    /// An incident lies outside valid latitude/longitude ranges.
    #[error("Incident '{id}' has invalid coordinates ({latitude}, {longitude})")]
    InvalidCoordinate {
        /// Incident identifier.
        id: String,
        /// Submitted latitude.
        latitude: f64,
        /// Submitted longitude.
        longitude: f64,
    },

    /// A tuning parameter is out of range.
    #[error("Invalid {name}: {message}")]
    InvalidParameter {
        /// Parameter name as it appears on the wire.
        name: &'static str,
        /// What is wrong with it.
        message: String,
    },
}

/// Request-level checks run before a request reaches the engine.
pub trait Validate {
    /// Checks the request.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Checks every incident for a non-empty id and in-range coordinates.
///
/// # Errors
///
/// Returns the first offending incident as a [`ValidationError`].
pub fn validate_incidents(incidents: &[IncidentPoint]) -> Result<(), ValidationError> {
    for (index, incident) in incidents.iter().enumerate() {
        if incident.id.trim().is_empty() {
            return Err(ValidationError::MissingId { index });
        }
        if !(-90.0..=90.0).contains(&incident.latitude)
            || !(-180.0..=180.0).contains(&incident.longitude)
        {
            return Err(ValidationError::InvalidCoordinate {
                id: incident.id.clone(),
                latitude: incident.latitude,
                longitude: incident.longitude,
            });
        }
    }
    Ok(())
}

fn invalid(name: &'static str, message: impl Into<String>) -> ValidationError {
    ValidationError::InvalidParameter {
        name,
        message: message.into(),
    }
}

/// Body of `POST /api/analyze/clustering`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusteringRequest {
    /// Incidents to cluster.
    pub incidents: Vec<IncidentPoint>,
    /// Neighborhood radius override.
    #[serde(default)]
    pub eps: Option<f64>,
    /// Core-point threshold override.
    #[serde(default)]
    pub min_samples: Option<usize>,
}

impl Validate for ClusteringRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(eps) = self.eps
            && (!eps.is_finite() || eps < 0.0)
        {
            return Err(invalid("eps", "must be a non-negative number"));
        }
        validate_incidents(&self.incidents)
    }
}

/// Body of `POST /api/analyze/hotspots`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotspotRequest {
    /// Incidents to analyze.
    pub incidents: Vec<IncidentPoint>,
    /// Minimum intensity to report.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

const fn default_threshold() -> f64 {
    DEFAULT_HOTSPOT_THRESHOLD
}

impl Validate for HotspotRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(invalid("threshold", "must be between 0 and 1"));
        }
        validate_incidents(&self.incidents)
    }
}

/// Body of `POST /api/predict/risk-zones`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskZoneRequest {
    /// Incidents to grid.
    pub incidents: Vec<IncidentPoint>,
    /// Cell edge in degrees.
    #[serde(default = "default_grid_size")]
    pub grid_size: f64,
    /// Window the incidents were drawn from, echoed in the response.
    #[serde(default = "default_time_window_days")]
    pub time_window_days: u32,
}

const fn default_grid_size() -> f64 {
    DEFAULT_GRID_SIZE
}

const fn default_time_window_days() -> u32 {
    DEFAULT_TIME_WINDOW_DAYS
}

impl Validate for RiskZoneRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        if !self.grid_size.is_finite() || self.grid_size <= 0.0 {
            return Err(invalid("grid_size", "must be a positive number"));
        }
        validate_incidents(&self.incidents)
    }
}

/// Body of `POST /api/predict/time-series`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRequest {
    /// History to project from.
    pub historical_incidents: Vec<IncidentPoint>,
    /// Days to project.
    #[serde(default = "default_days_to_predict")]
    pub days_to_predict: u32,
}

const fn default_days_to_predict() -> u32 {
    DEFAULT_FORECAST_DAYS
}

impl Validate for PredictionRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=MAX_FORECAST_DAYS).contains(&self.days_to_predict) {
            return Err(invalid(
                "days_to_predict",
                format!("must be between 1 and {MAX_FORECAST_DAYS}"),
            ));
        }
        validate_incidents(&self.historical_incidents)
    }
}

/// Response of the clustering endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusteringResponse {
    /// Clusters in id order.
    pub clusters: Vec<ClusterResult>,
    /// Incidents left as noise.
    pub noise_points: usize,
    /// Incidents assigned to a cluster.
    pub total_clustered: usize,
}

impl From<ClusteringOutcome> for ClusteringResponse {
    fn from(outcome: ClusteringOutcome) -> Self {
        Self {
            total_clustered: outcome.total_clustered(),
            noise_points: outcome.noise_count,
            clusters: outcome.clusters,
        }
    }
}

/// Response of the hotspot endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotspotResponse {
    /// Hotspots, most intense first.
    pub hotspots: Vec<HotspotResult>,
    /// Size of the submitted incident list.
    pub total_incidents_analyzed: usize,
}

/// Response of the risk-zone endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskZoneResponse {
    /// Medium- and high-risk zones, busiest first.
    pub risk_zones: Vec<RiskZone>,
    /// The request's `time_window_days`.
    pub analysis_period_days: u32,
}

/// `GET /health` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiHealth {
    /// Always `"healthy"` while the process serves requests.
    pub status: String,
    /// Service name.
    pub service: String,
}

/// `GET /api/info` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiInfo {
    /// Service display name.
    pub name: String,
    /// Crate version.
    pub version: String,
    /// Human-readable list of analyses offered.
    pub capabilities: Vec<String>,
    /// Algorithm used per analysis.
    pub algorithms: BTreeMap<String, String>,
}

/// Error body returned with every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Description of the failure.
    pub error: String,
}

impl ApiError {
    /// Wraps a message.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

impl From<&ValidationError> for ApiError {
    fn from(e: &ValidationError) -> Self {
        Self::new(e.to_string())
    }
}
