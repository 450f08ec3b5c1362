//! Process-wide clustering defaults.
//!
//! Read once at startup and handed to [`crate::AnalysisEngine::new`]; the
//! engine never consults the environment on its own.

use std::str::FromStr;

/// Default neighborhood radius in standardized coordinate units.
pub const DEFAULT_CLUSTERING_EPS: f64 = 0.01;

/// Default minimum neighborhood size for a core point.
pub const DEFAULT_CLUSTERING_MIN_SAMPLES: usize = 3;

/// Immutable clustering defaults.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisConfig {
    /// Neighborhood radius used when a request does not supply one.
    pub clustering_eps: f64,
    /// Minimum neighbors (self included) for a core point.
    pub clustering_min_samples: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            clustering_eps: DEFAULT_CLUSTERING_EPS,
            clustering_min_samples: DEFAULT_CLUSTERING_MIN_SAMPLES,
        }
    }
}

impl AnalysisConfig {
    /// Reads `CLUSTERING_EPS` and `CLUSTERING_MIN_SAMPLES` from the
    /// environment, falling back to defaults for missing or bad values.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Self::from_env`] over an arbitrary key lookup.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let clustering_eps = parse_or(&lookup, "CLUSTERING_EPS", defaults.clustering_eps)
            .filter(|eps: &f64| eps.is_finite() && *eps > 0.0)
            .unwrap_or_else(|| {
                log::warn!("CLUSTERING_EPS must be a positive number, using default");
                defaults.clustering_eps
            });

        let clustering_min_samples = parse_or(
            &lookup,
            "CLUSTERING_MIN_SAMPLES",
            defaults.clustering_min_samples,
        )
        .filter(|n: &usize| *n > 0)
        .unwrap_or_else(|| {
            log::warn!("CLUSTERING_MIN_SAMPLES must be a positive integer, using default");
            defaults.clustering_min_samples
        });

        Self {
            clustering_eps,
            clustering_min_samples,
        }
    }
}

/// `Some(default)` when the key is unset, `Some(parsed)` when it parses,
/// `None` when it is set but unusable.
fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key).map_or(Some(default), |raw| raw.trim().parse().ok())
}
