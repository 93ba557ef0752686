//! Inventory handlers: list volumes, free bytes, device classes.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{
    DeviceClassDto, DeviceClassListResponse, DeviceClassQuery, VolumeListResponse,
};
use crate::app_state::AppState;
use crate::domain::Capacity;
use crate::error::{ErrorResponse, LvmdError};

/// `GET /volumes`: List the volumes of a device class.
///
/// # Errors
///
/// Returns [`LvmdError::DeviceClassNotFound`] for an unknown class and
/// [`LvmdError::BackendUnavailable`] if the pool cannot be read.
#[utoipa::path(
    get,
    path = "/api/v1/volumes",
    tag = "Inventory",
    summary = "List volumes",
    description = "Returns every logical volume in the device class's pool with its size and tags.",
    params(DeviceClassQuery),
    responses(
        (status = 200, description = "Volumes in the pool", body = VolumeListResponse),
        (status = 404, description = "Device class not found", body = ErrorResponse),
        (status = 503, description = "Backend unavailable", body = ErrorResponse),
    )
)]
pub async fn list_volumes(
    State(state): State<AppState>,
    Query(query): Query<DeviceClassQuery>,
) -> Result<impl IntoResponse, LvmdError> {
    let volumes = state.inventory.list_volumes(&query.device_class).await?;
    Ok(Json(VolumeListResponse { volumes }))
}

/// `GET /free-bytes`: Free capacity of a device class.
///
/// # Errors
///
/// Returns [`LvmdError::DeviceClassNotFound`] for an unknown class and
/// [`LvmdError::BackendUnavailable`] if the pool cannot be read.
#[utoipa::path(
    get,
    path = "/api/v1/free-bytes",
    tag = "Inventory",
    summary = "Get free capacity",
    description = "Returns the pool's free bytes minus the device class's spare reservation, never below zero.",
    params(DeviceClassQuery),
    responses(
        (status = 200, description = "Free capacity", body = Capacity),
        (status = 404, description = "Device class not found", body = ErrorResponse),
        (status = 503, description = "Backend unavailable", body = ErrorResponse),
    )
)]
pub async fn free_bytes(
    State(state): State<AppState>,
    Query(query): Query<DeviceClassQuery>,
) -> Result<impl IntoResponse, LvmdError> {
    let capacity = state.inventory.free_capacity(&query.device_class).await?;
    Ok(Json(capacity))
}

/// `GET /device-classes`: List configured device classes.
#[utoipa::path(
    get,
    path = "/api/v1/device-classes",
    tag = "Inventory",
    summary = "List device classes",
    description = "Returns every configured device class in configuration order.",
    responses(
        (status = 200, description = "Configured device classes", body = DeviceClassListResponse),
    )
)]
pub async fn device_classes(State(state): State<AppState>) -> impl IntoResponse {
    let device_classes = state
        .inventory
        .device_classes()
        .iter()
        .map(DeviceClassDto::from)
        .collect();
    Json(DeviceClassListResponse { device_classes })
}

/// Inventory routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/volumes", get(list_volumes))
        .route("/free-bytes", get(free_bytes))
        .route("/device-classes", get(device_classes))
}
