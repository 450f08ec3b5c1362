//! Density-based clustering of incident locations.
//!
//! Points are clustered on their standardized `(latitude, longitude)`
//! features: each axis is shifted to zero mean and scaled to unit variance
//! over the whole batch before neighborhoods are computed. Membership is
//! therefore decided in a unitless, population-relative space, while the
//! reported radius is a true great-circle distance. The two spaces are
//! intentionally not reconciled.

#![allow(clippy::cast_precision_loss)]

use geo_incidents_analysis_models::{ClusterResult, ClusteringOutcome};
use geo_incidents_incident_models::{Coordinate, IncidentPoint};
use geo_incidents_spatial::{NeighborIndex, haversine_km};

use crate::{AnalysisEngine, AnalysisError, stats};

/// Member indices of each cluster plus the number of noise points.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Labeling {
    /// `(cluster_id, member indices)`, listed in the order each cluster's
    /// first member appears in the input. Members ascend.
    pub clusters: Vec<(usize, Vec<usize>)>,
    pub noise_count: usize,
}

impl AnalysisEngine {
    /// Groups incidents into density clusters.
    ///
    /// `eps` and `min_samples` fall back to the engine's configured
    /// defaults when absent or zero. Fewer than two incidents produce no
    /// clusters and count every input as noise.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Computation`] if the coordinates cannot be
    /// standardized into finite features.
    pub fn cluster(
        &self,
        incidents: &[IncidentPoint],
        eps: Option<f64>,
        min_samples: Option<usize>,
    ) -> Result<ClusteringOutcome, AnalysisError> {
        let labeling = self.label(incidents, eps, min_samples)?;

        let clusters = labeling
            .clusters
            .iter()
            .map(|(cluster_id, members)| summarize(*cluster_id, incidents, members))
            .collect();

        Ok(ClusteringOutcome {
            clusters,
            noise_count: labeling.noise_count,
        })
    }

    pub(crate) fn label(
        &self,
        incidents: &[IncidentPoint],
        eps: Option<f64>,
        min_samples: Option<usize>,
    ) -> Result<Labeling, AnalysisError> {
        if incidents.len() < 2 {
            return Ok(Labeling {
                clusters: Vec::new(),
                noise_count: incidents.len(),
            });
        }

        let eps = eps
            .filter(|e| *e > 0.0)
            .unwrap_or(self.config.clustering_eps);
        let min_samples = min_samples
            .filter(|m| *m > 0)
            .unwrap_or(self.config.clustering_min_samples);

        let features: Vec<[f64; 2]> = incidents
            .iter()
            .map(|inc| [inc.latitude, inc.longitude])
            .collect();
        let scaled = standardize(&features)?;

        let labeling = group_labels(&dbscan(&scaled, eps, min_samples));

        log::debug!(
            "Clustered {} incidents (eps={eps}, min_samples={min_samples}): {} clusters, {} noise",
            incidents.len(),
            labeling.clusters.len(),
            labeling.noise_count,
        );

        Ok(labeling)
    }
}

/// Collects member indices per cluster label, clusters ordered by where
/// their first member sits in the input.
pub(crate) fn group_labels(labels: &[Option<usize>]) -> Labeling {
    let mut clusters: Vec<(usize, Vec<usize>)> = Vec::new();
    let mut slots: Vec<Option<usize>> = Vec::new();
    let mut noise_count = 0;

    for (idx, label) in labels.iter().enumerate() {
        let Some(id) = *label else {
            noise_count += 1;
            continue;
        };
        if slots.len() <= id {
            slots.resize(id + 1, None);
        }
        let slot = *slots[id].get_or_insert_with(|| {
            clusters.push((id, Vec::new()));
            clusters.len() - 1
        });
        clusters[slot].1.push(idx);
    }

    Labeling {
        clusters,
        noise_count,
    }
}

/// Shifts each feature axis to zero mean and scales it to unit population
/// variance. An axis with no spread keeps a scale of 1.
pub(crate) fn standardize(features: &[[f64; 2]]) -> Result<Vec<[f64; 2]>, AnalysisError> {
    let mut scaled = features.to_vec();

    for axis in 0..2 {
        let column: Vec<f64> = features.iter().map(|f| f[axis]).collect();
        let center = stats::mean(&column);
        let mut scale = stats::population_std(&column);

        // Float noise around a constant column must not be blown up to
        // unit variance.
        if scale < 10.0 * f64::EPSILON * center.abs().max(1.0) {
            scale = 1.0;
        }

        for row in &mut scaled {
            row[axis] = (row[axis] - center) / scale;
        }
    }

    if scaled.iter().flatten().any(|v| !v.is_finite()) {
        return Err(AnalysisError::Computation {
            message: "coordinate standardization produced non-finite features".to_string(),
        });
    }

    Ok(scaled)
}

/// Labels each feature with a cluster id, or `None` for noise.
///
/// A point is core when at least `min_samples` points (itself included)
/// lie within `eps`. Clusters grow from core points in input order; a
/// border point reachable from several clusters keeps the first one that
/// reached it.
pub(crate) fn dbscan(features: &[[f64; 2]], eps: f64, min_samples: usize) -> Vec<Option<usize>> {
    let index = NeighborIndex::build(features);
    let neighborhoods: Vec<Vec<usize>> = features.iter().map(|f| index.within(*f, eps)).collect();
    let is_core: Vec<bool> = neighborhoods
        .iter()
        .map(|n| n.len() >= min_samples)
        .collect();

    let mut labels: Vec<Option<usize>> = vec![None; features.len()];
    let mut next_id = 0;

    for seed in 0..features.len() {
        if labels[seed].is_some() || !is_core[seed] {
            continue;
        }

        let id = next_id;
        next_id += 1;
        labels[seed] = Some(id);

        let mut frontier = vec![seed];
        while let Some(point) = frontier.pop() {
            for &neighbor in &neighborhoods[point] {
                if labels[neighbor].is_none() {
                    labels[neighbor] = Some(id);
                    if is_core[neighbor] {
                        frontier.push(neighbor);
                    }
                }
            }
        }
    }

    labels
}

pub(crate) fn summarize(
    cluster_id: usize,
    incidents: &[IncidentPoint],
    members: &[usize],
) -> ClusterResult {
    let count = members.len() as f64;
    let center = Coordinate::new(
        members.iter().map(|&i| incidents[i].latitude).sum::<f64>() / count,
        members.iter().map(|&i| incidents[i].longitude).sum::<f64>() / count,
    );

    let radius = members
        .iter()
        .map(|&i| haversine_km(center, incidents[i].coordinate()))
        .fold(0.0, f64::max);

    let avg_severity = members
        .iter()
        .map(|&i| incidents[i].severity.weight())
        .sum::<f64>()
        / count;

    ClusterResult {
        cluster_id,
        center,
        point_count: members.len(),
        incidents: members.iter().map(|&i| incidents[i].id.clone()).collect(),
        radius,
        avg_severity,
    }
}
