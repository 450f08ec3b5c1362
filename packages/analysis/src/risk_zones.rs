//! Grid-based risk zoning.
//!
//! Incidents are binned into square cells of `grid_size` degrees anchored
//! at the south-west corner of their bounding box. Cells at or above the
//! 75th percentile of per-cell counts are high risk, cells at or above the
//! median are medium risk, and the rest are dropped.

#![allow(clippy::cast_precision_loss)]

use std::collections::{BTreeMap, HashMap};

use geo_incidents_analysis_models::{RiskLevel, RiskZone};
use geo_incidents_incident_models::{Coordinate, IncidentPoint};
use geo_incidents_spatial::BoundingBox;

use crate::{AnalysisEngine, AnalysisError, stats};

/// Default cell edge in degrees (roughly 500 m at the equator).
pub const DEFAULT_GRID_SIZE: f64 = 0.005;

/// Category key used for incidents without a category.
pub const UNKNOWN_CATEGORY: &str = "unknown";

const MIN_INCIDENTS: usize = 3;
const FULL_CONFIDENCE_COUNT: f64 = 10.0;

/// Percentile cut points over the per-cell incident counts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskThresholds {
    /// 75th percentile.
    pub high: f64,
    /// 50th percentile.
    pub medium: f64,
}

impl RiskThresholds {
    /// Derives thresholds from per-cell counts. `None` when there are no
    /// cells.
    #[must_use]
    pub fn from_counts(counts: &[usize]) -> Option<Self> {
        let counts: Vec<f64> = counts.iter().map(|&c| c as f64).collect();
        Some(Self {
            high: stats::percentile(&counts, 75.0)?,
            medium: stats::percentile(&counts, 50.0)?,
        })
    }

    /// Classifies a cell by its incident count.
    #[must_use]
    pub fn classify(&self, count: usize) -> RiskLevel {
        let count = count as f64;
        if count >= self.high {
            RiskLevel::High
        } else if count >= self.medium {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

impl AnalysisEngine {
    /// Bins incidents into a `grid_size`-degree grid and returns the
    /// medium- and high-risk cells, busiest first.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidParameter`] if `grid_size` is not a
    /// positive finite number.
    pub fn generate_risk_zones(
        &self,
        incidents: &[IncidentPoint],
        grid_size: f64,
    ) -> Result<Vec<RiskZone>, AnalysisError> {
        if !grid_size.is_finite() || grid_size <= 0.0 {
            return Err(AnalysisError::InvalidParameter {
                message: format!("grid size must be a positive number, got {grid_size}"),
            });
        }

        if incidents.len() < MIN_INCIDENTS {
            return Ok(Vec::new());
        }

        let Some(bbox) = BoundingBox::of(incidents.iter().map(IncidentPoint::coordinate)) else {
            return Ok(Vec::new());
        };

        let cells = group_cells(incidents, &bbox, grid_size);

        let counts: Vec<usize> = cells.iter().map(|(_, members)| members.len()).collect();
        let Some(thresholds) = RiskThresholds::from_counts(&counts) else {
            return Ok(Vec::new());
        };

        log::debug!(
            "Binned {} incidents into {} cells (high>={}, medium>={})",
            incidents.len(),
            cells.len(),
            thresholds.high,
            thresholds.medium,
        );

        let mut zones: Vec<RiskZone> = cells
            .into_iter()
            .filter_map(|((cell_lat, cell_lng), members)| {
                let count = members.len();
                let risk_level = thresholds.classify(count);
                if risk_level == RiskLevel::Low {
                    return None;
                }

                let base_lat = (cell_lat as f64).mul_add(grid_size, bbox.min_lat);
                let base_lng = (cell_lng as f64).mul_add(grid_size, bbox.min_lng);

                Some(RiskZone {
                    id: self.next_id(),
                    polygon: cell_polygon(base_lat, base_lng, grid_size),
                    risk_level,
                    incident_count: count,
                    prediction_confidence: stats::round_to(
                        (count as f64 / FULL_CONFIDENCE_COUNT).min(1.0),
                        2,
                    ),
                    category_breakdown: category_breakdown(&members),
                })
            })
            .collect();

        zones.sort_by(|a, b| b.incident_count.cmp(&a.incident_count));

        Ok(zones)
    }
}

/// Incidents per grid cell, cells in the order the input first touches
/// them.
fn group_cells<'a>(
    incidents: &'a [IncidentPoint],
    bbox: &BoundingBox,
    grid_size: f64,
) -> Vec<((i64, i64), Vec<&'a IncidentPoint>)> {
    let mut cells: Vec<((i64, i64), Vec<&IncidentPoint>)> = Vec::new();
    let mut slots: HashMap<(i64, i64), usize> = HashMap::new();

    for incident in incidents {
        let cell = cell_of(incident, bbox, grid_size);
        let slot = *slots.entry(cell).or_insert_with(|| {
            cells.push((cell, Vec::new()));
            cells.len() - 1
        });
        cells[slot].1.push(incident);
    }

    cells
}

#[allow(clippy::cast_possible_truncation)]
fn cell_of(incident: &IncidentPoint, bbox: &BoundingBox, grid_size: f64) -> (i64, i64) {
    (
        ((incident.latitude - bbox.min_lat) / grid_size).floor() as i64,
        ((incident.longitude - bbox.min_lng) / grid_size).floor() as i64,
    )
}

/// Closed ring around the cell whose south-west corner is `(lat, lng)`.
fn cell_polygon(lat: f64, lng: f64, size: f64) -> Vec<Coordinate> {
    vec![
        Coordinate::new(lat, lng),
        Coordinate::new(lat + size, lng),
        Coordinate::new(lat + size, lng + size),
        Coordinate::new(lat, lng + size),
        Coordinate::new(lat, lng),
    ]
}

fn category_breakdown(members: &[&IncidentPoint]) -> BTreeMap<String, usize> {
    let mut breakdown = BTreeMap::new();
    for incident in members {
        let key = incident.category_id.as_deref().unwrap_or(UNKNOWN_CATEGORY);
        *breakdown.entry(key.to_string()).or_insert(0) += 1;
    }
    breakdown
}
