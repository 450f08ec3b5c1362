#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Spatial and temporal analysis over geolocated incident reports.
//!
//! [`AnalysisEngine`] exposes four independent operations: density
//! clustering, hotspot ranking, grid risk zoning and a daily-count
//! forecast. Each is a pure, synchronous function of its input slice and
//! the engine's immutable [`AnalysisConfig`], so one engine can be shared
//! across threads behind an `Arc`.

pub mod clustering;
pub mod config;
pub mod forecast;
pub mod hotspots;
pub mod ids;
pub mod risk_zones;
mod stats;

use std::sync::Arc;

use thiserror::Error;

pub use config::AnalysisConfig;
pub use ids::{IdSource, SequentialIds, UuidIds};

/// Errors that can occur during analysis.
///
/// Insufficient input is not an error: those paths return empty results.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// A numeric step produced an unusable value.
    #[error("Computation failed: {message}")]
    Computation {
        /// Description of what went wrong.
        message: String,
    },

    /// A tuning parameter was outside its usable range.
    #[error("Invalid parameter: {message}")]
    InvalidParameter {
        /// Description of the rejected value.
        message: String,
    },
}

/// Entry point for all incident analyses.
pub struct AnalysisEngine {
    config: AnalysisConfig,
    ids: Arc<dyn IdSource>,
}

impl AnalysisEngine {
    /// Creates an engine that labels hotspots and zones with random UUIDs.
    #[must_use]
    pub fn new(config: AnalysisConfig) -> Self {
        Self::with_id_source(config, Arc::new(UuidIds))
    }

    /// Creates an engine with a caller-supplied identifier source.
    #[must_use]
    pub fn with_id_source(config: AnalysisConfig, ids: Arc<dyn IdSource>) -> Self {
        Self { config, ids }
    }

    /// Clustering defaults this engine was built with.
    #[must_use]
    pub const fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    fn next_id(&self) -> String {
        self.ids.next_id()
    }
}
