#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Incident record types and the severity scale.
//!
//! This crate defines the canonical incident shape handed to the analysis
//! engine by the boundary layer. Records are immutable once loaded; every
//! analysis reads them by reference.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Severity label attached to an incident report.
///
/// The ordinal scale is fixed: low=1, medium=2, high=3, critical=4.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Severity {
    /// Level 1
    #[default]
    Low = 1,
    /// Level 2
    Medium = 2,
    /// Level 3
    High = 3,
    /// Level 4
    Critical = 4,
}

impl Severity {
    /// Returns the ordinal weight of this severity level.
    #[must_use]
    pub const fn value(self) -> u8 {
        self as u8
    }

    /// Ordinal weight as a float, for averaging.
    #[must_use]
    pub fn weight(self) -> f64 {
        f64::from(self.value())
    }

    /// Maps a free-form label to a severity, defaulting unknown labels to
    /// [`Severity::Low`].
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        label.trim().parse().unwrap_or_default()
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Low, Self::Medium, Self::High, Self::Critical]
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Self::from_label(&label))
    }
}

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a coordinate from latitude and longitude.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// A geolocated incident report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentPoint {
    /// Opaque identifier from the upstream tracking system.
    pub id: String,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Reported severity.
    pub severity: Severity,
    /// Category identifier, if the report was categorized.
    #[serde(default)]
    pub category_id: Option<String>,
    /// Wall-clock creation time. Offsets are dropped after parsing so the
    /// calendar date stays the reporter's local date.
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: NaiveDateTime,
}

impl IncidentPoint {
    /// Location of this incident.
    #[must_use]
    pub const fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    /// Calendar date the incident was created on.
    #[must_use]
    pub fn created_on(&self) -> NaiveDate {
        self.created_at.date()
    }
}

/// Error returned when a timestamp string matches none of the accepted
/// ISO-8601 shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidTimestampError {
    /// The rejected input.
    pub value: String,
}

impl std::fmt::Display for InvalidTimestampError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid timestamp '{}': expected an ISO-8601 date or date-time",
            self.value
        )
    }
}

impl std::error::Error for InvalidTimestampError {}

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parses an ISO-8601 timestamp into its wall-clock [`NaiveDateTime`].
///
/// Accepts RFC 3339 strings with an offset (the offset is dropped, not
/// applied), naive date-times, and bare dates (midnight).
///
/// # Errors
///
/// Returns [`InvalidTimestampError`] if the string matches no accepted
/// format.
pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime, InvalidTimestampError> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Ok(dt.naive_local());
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(dt);
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| InvalidTimestampError {
            value: s.to_string(),
        })
}

fn deserialize_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<NaiveDateTime, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}
