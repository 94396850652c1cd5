use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::{get, post}, Json, Router};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower_http::trace::TraceLayer;

use crate::api::{error_response, ApiError, ApiSimulationRequest, ApiSimulationResponse};
use campaign_sim::SimulationEngine;

#[derive(Clone)]
struct AppState {
    engine: Arc<SimulationEngine>,
}

pub async fn serve(engine: SimulationEngine, args: crate::ServeArgs) -> Result<(), String> {
    let state = AppState {
        engine: Arc::new(engine),
    };

    let app = Router::new()
        .route("/api/health", get(health))
        .route("/api/simulate", post(simulate_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .map_err(|err| format!("invalid bind address: {}", err))?;

    tracing::info!(%addr, "simulation server listening");
    axum::serve(tokio::net::TcpListener::bind(addr).await.map_err(|err| {
        format!("failed to bind server: {}", err)
    })?, app)
    .await
    .map_err(|err| format!("server error: {}", err))?;

    Ok(())
}

async fn health() -> impl IntoResponse {
    StatusCode::OK
}

async fn simulate_handler(
    State(state): State<AppState>,
    Json(request): Json<ApiSimulationRequest>,
) -> Result<Json<ApiSimulationResponse>, (StatusCode, Json<ApiError>)> {
    let engine = match request.thresholds {
        Some(thresholds) => {
            let mut config = state.engine.config().clone();
            config.risk = thresholds;
            Arc::new(SimulationEngine::new(config))
        }
        None => state.engine.clone(),
    };
    let timeout = request
        .timeout_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| engine.default_timeout());

    match engine.run_with_timeout(request.context, timeout).await {
        Ok(result) => Ok(Json(ApiSimulationResponse::from_result(result))),
        Err(err) => {
            let (status, body) = error_response(&err);
            tracing::warn!(%status, error = %err, "simulation request failed");
            Err((status, Json(body)))
        }
    }
}
