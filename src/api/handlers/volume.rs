//! Volume mutation handlers: create, delete, resize.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, post};
use axum::{Json, Router};

use crate::api::dto::{CreateVolumeRequest, DeviceClassQuery, ResizeVolumeRequest};
use crate::app_state::AppState;
use crate::domain::Volume;
use crate::error::{ErrorResponse, LvmdError};

/// `POST /volumes`: Create a logical volume.
///
/// # Errors
///
/// Returns [`LvmdError`] on invalid input, unknown device class, name
/// clash, insufficient capacity or backend failure.
#[utoipa::path(
    post,
    path = "/api/v1/volumes",
    tag = "Volumes",
    summary = "Create a volume",
    description = "Creates a logical volume in the device class's pool using the class's stripe and creation defaults, then notifies watchers.",
    request_body = CreateVolumeRequest,
    responses(
        (status = 201, description = "Volume created", body = Volume),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Device class not found", body = ErrorResponse),
        (status = 409, description = "Volume already exists", body = ErrorResponse),
        (status = 507, description = "Not enough space in pool", body = ErrorResponse),
    )
)]
pub async fn create_volume(
    State(state): State<AppState>,
    Json(req): Json<CreateVolumeRequest>,
) -> Result<impl IntoResponse, LvmdError> {
    let volume = state
        .volumes
        .create_volume(&req.device_class, &req.name, req.size_bytes, &req.tags)
        .await?;
    Ok((StatusCode::CREATED, Json(volume)))
}

/// `DELETE /volumes/{name}`: Remove a logical volume.
///
/// # Errors
///
/// Returns [`LvmdError::VolumeNotFound`] if the volume does not exist.
#[utoipa::path(
    delete,
    path = "/api/v1/volumes/{name}",
    tag = "Volumes",
    summary = "Delete a volume",
    description = "Removes a logical volume and notifies watchers.",
    params(
        ("name" = String, Path, description = "Volume name"),
        DeviceClassQuery,
    ),
    responses(
        (status = 204, description = "Volume deleted"),
        (status = 404, description = "Device class or volume not found", body = ErrorResponse),
    )
)]
pub async fn delete_volume(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<DeviceClassQuery>,
) -> Result<impl IntoResponse, LvmdError> {
    state
        .volumes
        .remove_volume(&query.device_class, &name)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /volumes/{name}/resize`: Grow a logical volume.
///
/// # Errors
///
/// Returns [`LvmdError::VolumeNotFound`] if the volume does not exist and
/// [`LvmdError::InsufficientCapacity`] if the pool cannot cover the growth.
#[utoipa::path(
    post,
    path = "/api/v1/volumes/{name}/resize",
    tag = "Volumes",
    summary = "Resize a volume",
    description = "Grows a logical volume. Requests at or below the current size leave it unchanged.",
    params(
        ("name" = String, Path, description = "Volume name"),
    ),
    request_body = ResizeVolumeRequest,
    responses(
        (status = 200, description = "Volume after resize", body = Volume),
        (status = 404, description = "Device class or volume not found", body = ErrorResponse),
        (status = 507, description = "Not enough space in pool", body = ErrorResponse),
    )
)]
pub async fn resize_volume(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(req): Json<ResizeVolumeRequest>,
) -> Result<impl IntoResponse, LvmdError> {
    let volume = state
        .volumes
        .resize_volume(&req.device_class, &name, req.size_bytes)
        .await?;
    Ok(Json(volume))
}

/// Volume mutation routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/volumes", post(create_volume))
        .route("/volumes/{name}", delete(delete_volume))
        .route("/volumes/{name}/resize", post(resize_volume))
}
