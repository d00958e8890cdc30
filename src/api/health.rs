use crate::AppState;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    mode: &'static str,
    provider: &'static str,
    lookback_days: u32,
    trained_models: usize,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let service = &state.prediction_service;
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        mode: if service.is_live() { "live" } else { "demo" },
        provider: state.config.data_provider.name(),
        lookback_days: state.config.lookback_days,
        trained_models: service.trained_symbols().len(),
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/health", get(health))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "ok",
            version: "1.0.0",
            mode: "demo",
            provider: "yahoo",
            lookback_days: 180,
            trained_models: 2,
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"ok\""));
        assert!(json.contains("\"version\":\"1.0.0\""));
        assert!(json.contains("\"mode\":\"demo\""));
        assert!(json.contains("\"provider\":\"yahoo\""));
        assert!(json.contains("\"lookback_days\":180"));
        assert!(json.contains("\"trained_models\":2"));
    }
}
