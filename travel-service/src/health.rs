//! Liveness and readiness probes

use std::collections::HashMap;
use std::time::Duration;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

const DATABASE_PING_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub service: String,
    pub dependencies: HashMap<String, DependencyStatus>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DependencyStatus {
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Liveness probe; 200 while the process is up
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let response = HealthResponse {
        status: "healthy".to_string(),
        service: state.config().service.name.clone(),
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
    };

    (StatusCode::OK, Json(response))
}

/// Readiness probe; 503 when the database does not answer
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let database = ping_database(&state).await;
    let ready = database.healthy;

    let mut dependencies = HashMap::new();
    dependencies.insert("database".to_string(), database);

    let response = ReadinessResponse {
        ready,
        service: state.config().service.name.clone(),
        dependencies,
    };

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}

async fn ping_database(state: &AppState) -> DependencyStatus {
    let ping = sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(state.pool());

    match tokio::time::timeout(DATABASE_PING_TIMEOUT, ping).await {
        Ok(Ok(_)) => DependencyStatus {
            healthy: true,
            message: Some("Connected".to_string()),
        },
        Ok(Err(e)) => {
            tracing::error!(error = %e, "database health check failed");
            DependencyStatus {
                healthy: false,
                message: Some(format!("Connection failed: {}", e)),
            }
        }
        Err(_) => {
            tracing::error!("database health check timed out");
            DependencyStatus {
                healthy: false,
                message: Some("Connection timed out".to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "healthy".to_string(),
            service: "travel-service".to_string(),
            version: None,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json, serde_json::json!({"status": "healthy", "service": "travel-service"}));
    }

    #[test]
    fn test_readiness_response_serialization() {
        let mut dependencies = HashMap::new();
        dependencies.insert(
            "database".to_string(),
            DependencyStatus {
                healthy: false,
                message: Some("Connection timed out".to_string()),
            },
        );
        let response = ReadinessResponse {
            ready: false,
            service: "travel-service".to_string(),
            dependencies,
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["ready"], false);
        assert_eq!(json["dependencies"]["database"]["healthy"], false);
    }
}
