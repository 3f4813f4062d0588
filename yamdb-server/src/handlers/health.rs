use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};
use tracing::warn;

use crate::AppState;

pub async fn health(
    State(state): State<AppState>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let mut health_status = json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "checks": {}
    });

    let Some(postgres) = state.postgres.as_ref() else {
        health_status["checks"]["database"] = json!({
            "status": "healthy",
            "type": "memory"
        });
        return Ok(Json(health_status));
    };

    match sqlx::query("SELECT 1").execute(postgres.pool()).await {
        Ok(_) => {
            health_status["checks"]["database"] = json!({
                "status": "healthy",
                "type": "postgres"
            });
            Ok(Json(health_status))
        }
        Err(e) => {
            warn!(error = %e, "database health check failed");
            health_status["status"] = json!("unhealthy");
            health_status["checks"]["database"] = json!({
                "status": "unhealthy",
                "type": "postgres",
                "error": e.to_string()
            });
            Err((StatusCode::SERVICE_UNAVAILABLE, Json(health_status)))
        }
    }
}
