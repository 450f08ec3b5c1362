//! HTTP handler functions for the analysis API.

use std::collections::BTreeMap;

use actix_web::{HttpResponse, web};
use geo_incidents_analysis::AnalysisError;
use geo_incidents_server_models::{
    ApiError, ApiHealth, ApiInfo, ClusteringRequest, ClusteringResponse, HotspotRequest,
    HotspotResponse, PredictionRequest, RiskZoneRequest, RiskZoneResponse, Validate,
};

use crate::AppState;

/// `GET /health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        status: "healthy".to_string(),
        service: "ml-service".to_string(),
    })
}

/// `GET /api/info`
///
/// Describes the analyses this service offers.
pub async fn info() -> HttpResponse {
    let capabilities = [
        "DBSCAN clustering for incident grouping",
        "Hotspot identification with severity weighting",
        "Risk zone generation using grid analysis",
        "Time series prediction for incident forecasting",
    ];
    let algorithms: BTreeMap<String, String> = [
        ("clustering", "DBSCAN (Density-Based Spatial Clustering)"),
        ("hotspots", "Density + Severity weighted analysis"),
        ("risk_zones", "Grid-based density analysis"),
        ("time_series", "Moving average with confidence intervals"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    HttpResponse::Ok().json(ApiInfo {
        name: "Geo Incidents ML Service".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        capabilities: capabilities.iter().map(ToString::to_string).collect(),
        algorithms,
    })
}

/// `POST /api/analyze/clustering`
///
/// Groups nearby incidents that may represent persistent problem areas.
pub async fn analyze_clustering(
    state: web::Data<AppState>,
    body: web::Json<ClusteringRequest>,
) -> HttpResponse {
    let request = body.into_inner();
    if let Err(e) = request.validate() {
        return rejected(&e);
    }

    let engine = state.engine.clone();
    match run_analysis("Clustering", move || {
        engine.cluster(&request.incidents, request.eps, request.min_samples)
    })
    .await
    {
        Ok(outcome) => HttpResponse::Ok().json(ClusteringResponse::from(outcome)),
        Err(response) => response,
    }
}

/// `POST /api/analyze/hotspots`
///
/// Ranks dense areas by incident count and severity.
pub async fn analyze_hotspots(
    state: web::Data<AppState>,
    body: web::Json<HotspotRequest>,
) -> HttpResponse {
    let request = body.into_inner();
    if let Err(e) = request.validate() {
        return rejected(&e);
    }

    let total_incidents_analyzed = request.incidents.len();
    let engine = state.engine.clone();
    match run_analysis("Hotspot analysis", move || {
        engine.identify_hotspots(&request.incidents, request.threshold)
    })
    .await
    {
        Ok(hotspots) => HttpResponse::Ok().json(HotspotResponse {
            hotspots,
            total_incidents_analyzed,
        }),
        Err(response) => response,
    }
}

/// `POST /api/predict/risk-zones`
///
/// Flags grid cells with elevated incident density.
pub async fn predict_risk_zones(
    state: web::Data<AppState>,
    body: web::Json<RiskZoneRequest>,
) -> HttpResponse {
    let request = body.into_inner();
    if let Err(e) = request.validate() {
        return rejected(&e);
    }

    let analysis_period_days = request.time_window_days;
    let engine = state.engine.clone();
    match run_analysis("Risk zone prediction", move || {
        engine.generate_risk_zones(&request.incidents, request.grid_size)
    })
    .await
    {
        Ok(risk_zones) => HttpResponse::Ok().json(RiskZoneResponse {
            risk_zones,
            analysis_period_days,
        }),
        Err(response) => response,
    }
}

/// `POST /api/predict/time-series`
///
/// Projects daily incident counts for the coming days.
pub async fn predict_time_series(
    state: web::Data<AppState>,
    body: web::Json<PredictionRequest>,
) -> HttpResponse {
    let request = body.into_inner();
    if let Err(e) = request.validate() {
        return rejected(&e);
    }

    let engine = state.engine.clone();
    match run_analysis("Time series prediction", move || {
        engine.predict_time_series(&request.historical_incidents, request.days_to_predict)
    })
    .await
    {
        Ok(report) => HttpResponse::Ok().json(report),
        Err(response) => response,
    }
}

/// Runs a CPU-bound analysis on the blocking thread pool, turning any
/// failure into a logged 500 response.
async fn run_analysis<T, F>(operation: &'static str, job: F) -> Result<T, HttpResponse>
where
    F: FnOnce() -> Result<T, AnalysisError> + Send + 'static,
    T: Send + 'static,
{
    match web::block(job).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            log::error!("{operation} error: {e}");
            Err(HttpResponse::InternalServerError().json(ApiError::new(format!(
                "{operation} failed: {e}"
            ))))
        }
        Err(e) => {
            log::error!("{operation} worker failed: {e}");
            Err(HttpResponse::InternalServerError().json(ApiError::new(format!(
                "{operation} failed"
            ))))
        }
    }
}

fn rejected(e: &geo_incidents_server_models::ValidationError) -> HttpResponse {
    log::warn!("Rejected request: {e}");
    HttpResponse::UnprocessableEntity().json(ApiError::from(e))
}
