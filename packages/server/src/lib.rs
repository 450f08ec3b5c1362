#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the incident analysis engine.
//!
//! Accepts incident lists as JSON, validates them, and runs clustering,
//! hotspot, risk-zone and forecast analyses on the blocking thread pool.
//! The engine holds no mutable state, so a single instance is shared by
//! every worker.

pub mod config;
mod handlers;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, error, middleware, web};
use geo_incidents_analysis::{AnalysisConfig, AnalysisEngine};
use geo_incidents_server_models::ApiError;

pub use config::ServerConfig;

/// Largest accepted request body. Incident lists can be long.
const MAX_JSON_BYTES: usize = 32 * 1024 * 1024;

/// Shared application state.
pub struct AppState {
    /// Analysis engine configured from the environment at startup.
    pub engine: Arc<AnalysisEngine>,
}

/// Registers every API route plus the JSON extractor configuration.
pub fn configure(cfg: &mut web::ServiceConfig) {
    let json = web::JsonConfig::default()
        .limit(MAX_JSON_BYTES)
        .error_handler(|err, _req| {
            let body = ApiError::new(err.to_string());
            error::InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
        });

    cfg.app_data(json)
        .route("/health", web::get().to(handlers::health))
        .service(
            web::scope("/api")
                .route("/info", web::get().to(handlers::info))
                .route(
                    "/analyze/clustering",
                    web::post().to(handlers::analyze_clustering),
                )
                .route(
                    "/analyze/hotspots",
                    web::post().to(handlers::analyze_hotspots),
                )
                .route(
                    "/predict/risk-zones",
                    web::post().to(handlers::predict_risk_zones),
                )
                .route(
                    "/predict/time-series",
                    web::post().to(handlers::predict_time_series),
                ),
        );
}

/// Starts the analysis API server.
///
/// Initializes logging, reads clustering defaults and listener settings
/// from the environment, and runs the Actix-Web server until shutdown.
/// The caller provides the async runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind or
/// encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let engine = Arc::new(AnalysisEngine::new(AnalysisConfig::from_env()));
    log::info!(
        "Clustering defaults: eps={}, min_samples={}",
        engine.config().clustering_eps,
        engine.config().clustering_min_samples
    );

    let state = web::Data::new(AppState { engine });

    let ServerConfig { bind_addr, port } = ServerConfig::from_env();
    log::info!("Analysis service starting on {bind_addr}:{port}");

    let result = HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await;

    log::info!("Analysis service shutting down");
    result
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::test;
    use geo_incidents_analysis::SequentialIds;
    use serde_json::{Value, json};

    use super::*;

    fn state() -> web::Data<AppState> {
        web::Data::new(AppState {
            engine: Arc::new(AnalysisEngine::with_id_source(
                AnalysisConfig::default(),
                Arc::new(SequentialIds::new("test")),
            )),
        })
    }

    fn incident(id: &str, lat: f64, lng: f64, day: &str) -> Value {
        json!({
            "id": id,
            "latitude": lat,
            "longitude": lng,
            "severity": "medium",
            "created_at": format!("{day}T09:30:00Z"),
        })
    }

    fn stack(n: usize, lat: f64, lng: f64) -> Vec<Value> {
        (0..n)
            .map(|i| incident(&format!("inc-{i}"), lat, lng, "2025-01-01"))
            .collect()
    }

    macro_rules! app {
        () => {
            test::init_service(App::new().app_data(state()).configure(configure)).await
        };
    }

    #[actix_web::test]
    async fn health_reports_healthy() {
        let app = app!();
        let req = test::TestRequest::get().uri("/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "healthy");
    }

    #[actix_web::test]
    async fn info_lists_algorithms() {
        let app = app!();
        let req = test::TestRequest::get().uri("/api/info").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["capabilities"].as_array().map(Vec::len), Some(4));
        assert!(body["algorithms"]["clustering"].is_string());
    }

    #[actix_web::test]
    async fn single_incident_is_noise() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/api/analyze/clustering")
            .set_json(json!({ "incidents": stack(1, 10.0, 10.0) }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["clusters"], json!([]));
        assert_eq!(body["noise_points"], 1);
        assert_eq!(body["total_clustered"], 0);
    }

    #[actix_web::test]
    async fn dense_stack_is_one_cluster() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/api/analyze/clustering")
            .set_json(json!({ "incidents": stack(10, 10.0, 10.0), "eps": 0.01, "min_samples": 3 }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["clusters"].as_array().map(Vec::len), Some(1));
        assert_eq!(body["clusters"][0]["cluster_id"], 0);
        assert_eq!(body["clusters"][0]["point_count"], 10);
        assert_eq!(body["noise_points"], 0);
        assert_eq!(body["total_clustered"], 10);
    }

    #[actix_web::test]
    async fn hotspots_report_analyzed_total() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/api/analyze/hotspots")
            .set_json(json!({ "incidents": stack(3, 5.0, 5.0) }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["total_incidents_analyzed"], 3);
        assert_eq!(body["hotspots"][0]["id"], "test-1");
        assert_eq!(body["hotspots"][0]["incident_count"], 3);
    }

    #[actix_web::test]
    async fn risk_zones_below_minimum_are_empty() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/api/predict/risk-zones")
            .set_json(json!({ "incidents": stack(2, 5.0, 5.0) }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["risk_zones"], json!([]));
        assert_eq!(body["analysis_period_days"], 30);
    }

    #[actix_web::test]
    async fn short_history_returns_message() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/api/predict/time-series")
            .set_json(json!({ "historical_incidents": stack(6, 5.0, 5.0) }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["predictions"], json!([]));
        assert!(
            body["message"]
                .as_str()
                .is_some_and(|m| m.starts_with("Insufficient data"))
        );
    }

    #[actix_web::test]
    async fn forecast_returns_predictions() {
        let app = app!();
        let mut history = Vec::new();
        for (day, n) in [("2025-01-06", 2), ("2025-01-07", 3), ("2025-01-08", 4)] {
            for i in 0..n {
                history.push(incident(&format!("{day}-{i}"), 5.0, 5.0, day));
            }
        }
        let req = test::TestRequest::post()
            .uri("/api/predict/time-series")
            .set_json(json!({ "historical_incidents": history, "days_to_predict": 2 }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["predictions"].as_array().map(Vec::len), Some(2));
        assert_eq!(body["predictions"][0]["date"], "2025-01-09");
        assert_eq!(body["historical_mean"], 3.0);
        assert_eq!(body["data_points_used"], 3);
        assert!(body.get("message").is_none());
    }

    #[actix_web::test]
    async fn invalid_coordinates_are_unprocessable() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/api/analyze/hotspots")
            .set_json(json!({ "incidents": [incident("bad", 95.0, 0.0, "2025-01-01")] }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].as_str().is_some_and(|e| e.contains("bad")));
    }

    #[actix_web::test]
    async fn malformed_json_is_bad_request() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/api/analyze/clustering")
            .insert_header(("content-type", "application/json"))
            .set_payload("{\"incidents\": [")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].is_string());
    }
}
