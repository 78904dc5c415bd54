use crate::errors::Error;
use crate::metrics;
use crate::model::{TelemetryQuery, TelemetryResponse};
use crate::store::{DeviceKey, TelemetryStore};
use crate::validate;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Debug, Clone)]
struct AppState {
    store: Arc<TelemetryStore>,
}

pub fn create_router(store: Arc<TelemetryStore>) -> Router {
    let state = AppState { store };

    Router::new()
        .route(
            "/complexes/:complex_id/devices/:device_id/telemetry",
            get(get_telemetry).post(post_telemetry),
        )
        .with_state(state)
}

async fn post_telemetry(
    State(state): State<AppState>,
    Path((complex_id, device_id)): Path<(u32, u32)>,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<TelemetryResponse>), Error> {
    let value = validate::telemetry_value(&body).map_err(|e| {
        metrics::READINGS_REJECTED_TOTAL.inc();
        warn!(complex_id, device_id, "Rejected telemetry: {}", e);
        e
    })?;

    let slot = state
        .store
        .record(DeviceKey::new(complex_id, device_id), value)?;
    metrics::READINGS_ACCEPTED_TOTAL.inc();
    metrics::DEVICES_TRACKED.set(state.store.device_count()? as f64);
    info!(complex_id, device_id, value, "Telemetry received");

    Ok((
        StatusCode::CREATED,
        Json(TelemetryResponse {
            id: device_id,
            complex_id,
            telemetry: vec![slot],
        }),
    ))
}

async fn get_telemetry(
    State(state): State<AppState>,
    Path((complex_id, device_id)): Path<(u32, u32)>,
    Query(params): Query<TelemetryQuery>,
) -> Result<Json<TelemetryResponse>, Error> {
    let telemetry = state
        .store
        .query(DeviceKey::new(complex_id, device_id), &params)?;

    Ok(Json(TelemetryResponse {
        id: device_id,
        complex_id,
        telemetry,
    }))
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            _ => {
                error!("API error: {}", self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}
