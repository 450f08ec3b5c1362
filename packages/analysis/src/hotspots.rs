//! Hotspot ranking on top of density clustering.
//!
//! Clusters are scored by `0.6 * relative size + 0.4 * relative mean
//! severity`, both relative to the largest value among the clusters of the
//! same run.

#![allow(clippy::cast_precision_loss)]

use std::collections::BTreeSet;

use geo_incidents_analysis_models::HotspotResult;
use geo_incidents_incident_models::IncidentPoint;

use crate::clustering::summarize;
use crate::{AnalysisEngine, AnalysisError, stats};

/// Default minimum intensity for a hotspot to be reported.
pub const DEFAULT_HOTSPOT_THRESHOLD: f64 = 0.5;

/// Minimum reported hotspot radius in km.
pub const MIN_HOTSPOT_RADIUS_KM: f64 = 0.1;

const COUNT_WEIGHT: f64 = 0.6;
const SEVERITY_WEIGHT: f64 = 0.4;
const MIN_INCIDENTS: usize = 3;
const HOTSPOT_MIN_SAMPLES: usize = 2;

impl AnalysisEngine {
    /// Ranks density clusters by intensity and keeps those scoring at
    /// least `threshold`, most intense first.
    ///
    /// Clustering always runs with the configured `eps` and a minimum
    /// neighborhood of two.
    ///
    /// # Errors
    ///
    /// Propagates [`AnalysisError`] from the clustering step.
    pub fn identify_hotspots(
        &self,
        incidents: &[IncidentPoint],
        threshold: f64,
    ) -> Result<Vec<HotspotResult>, AnalysisError> {
        if incidents.len() < MIN_INCIDENTS {
            return Ok(Vec::new());
        }

        let labeling = self.label(incidents, None, Some(HOTSPOT_MIN_SAMPLES))?;
        if labeling.clusters.is_empty() {
            return Ok(Vec::new());
        }

        let clusters: Vec<_> = labeling
            .clusters
            .iter()
            .map(|(id, members)| (summarize(*id, incidents, members), members))
            .collect();

        let max_count = clusters
            .iter()
            .map(|(c, _)| c.point_count)
            .max()
            .unwrap_or(0);
        let max_severity = clusters
            .iter()
            .map(|(c, _)| c.avg_severity)
            .fold(0.0, f64::max);

        let mut hotspots = Vec::new();
        for (cluster, members) in clusters {
            let count_score = if max_count > 0 {
                cluster.point_count as f64 / max_count as f64
            } else {
                0.0
            };
            let severity_score = if max_severity > 0.0 {
                cluster.avg_severity / max_severity
            } else {
                0.0
            };
            let intensity = stats::round_to(
                COUNT_WEIGHT * count_score + SEVERITY_WEIGHT * severity_score,
                3,
            );

            if intensity < threshold {
                continue;
            }

            let categories: BTreeSet<&str> = members
                .iter()
                .filter_map(|&i| incidents[i].category_id.as_deref())
                .collect();

            hotspots.push(HotspotResult {
                id: self.next_id(),
                center: cluster.center,
                intensity,
                incident_count: cluster.point_count,
                radius: cluster.radius.max(MIN_HOTSPOT_RADIUS_KM),
                categories: categories.into_iter().map(str::to_string).collect(),
            });
        }

        hotspots.sort_by(|a, b| b.intensity.total_cmp(&a.intensity));

        log::debug!(
            "Identified {} hotspots from {} clusters (threshold={threshold})",
            hotspots.len(),
            labeling.clusters.len(),
        );

        Ok(hotspots)
    }
}
