use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use tracing::error;

use crate::state::AppState;

/// GET /
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "rapseglog-api",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Back office de logística: clientes, endereços, telefones, pedidos e entregas",
            "endpoints": {
                "health": "/health",
                "clientes": "/clientes[/:id]",
                "telefones": "/clientes/:id/telefones, /telefones/:id",
                "enderecos": "/clientes/:id/enderecos, /enderecos/:id",
                "pedidos": "/pedidos[/:id]",
                "entregas": "/entregas[/:id]"
            }
        }
    }))
}

/// GET /health - 503 while the database cannot be reached
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.repository.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "database_error": e.to_string()
                    }
                })),
            )
        }
    }
}
