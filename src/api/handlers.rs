use axum::{extract::State, http::StatusCode, Json};
use tracing::{debug, error};

use crate::{
    api::types::{ApiErrorBody, HandshakeData, HandshakeRequest, HandshakeResponse},
    state::AppState,
    version::is_older,
};

/// Device check-in: records the device, hands back current settings and
/// whether the reported version is below the deprecation floor.
///
/// Unauthenticated by design — the device id is an opaque client-supplied
/// string and nothing stops a caller from using someone else's.
pub async fn handshake(
    State(state): State<AppState>,
    Json(req): Json<HandshakeRequest>,
) -> Result<Json<HandshakeResponse>, (StatusCode, Json<ApiErrorBody>)> {
    let (Some(device_id), Some(app_version)) =
        (req.device_id.as_deref(), req.app_version.as_deref())
    else {
        return Err(missing_parameters());
    };
    // Empty strings count as missing, nothing is written.
    if device_id.is_empty() || app_version.is_empty() {
        return Err(missing_parameters());
    }

    let device = state
        .db
        .upsert_device(device_id, app_version, req.fcm_token.as_deref())
        .await
        .map_err(internal_error)?;

    debug!(
        device_id = %device.device_id,
        version = %device.current_version,
        "handshake recorded"
    );

    let settings = state.db.load_settings().await.map_err(internal_error)?;
    let update_needed = is_older(app_version, &settings.deprecated_version);

    Ok(Json(HandshakeResponse {
        status: "success",
        data: HandshakeData {
            text: settings.app_text,
            configs: settings.v2ray_configs,
            update_needed,
            force_update: settings.force_update,
            server_version: settings.deprecated_version,
        },
    }))
}

fn missing_parameters() -> (StatusCode, Json<ApiErrorBody>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiErrorBody {
            status: "error",
            message: "Missing parameters",
        }),
    )
}

fn internal_error(err: anyhow::Error) -> (StatusCode, Json<ApiErrorBody>) {
    error!(?err, "handshake failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiErrorBody {
            status: "error",
            message: "Internal server error",
        }),
    )
}
