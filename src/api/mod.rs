//! REST API layer: route handlers, DTOs, and router composition.
//!
//! Resource endpoints are mounted under `/api/v1`; `/health` sits at the
//! root. [`build_app`] adds the watch WebSocket and the HTTP middleware.

pub mod dto;
pub mod handlers;

use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::app_state::AppState;
use crate::ws::handler::watch_handler;

/// OpenAPI document covering every REST endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(title = "lvmd", description = "Host-local logical volume daemon"),
    paths(
        handlers::inventory::list_volumes,
        handlers::inventory::free_bytes,
        handlers::inventory::device_classes,
        handlers::volume::create_volume,
        handlers::volume::delete_volume,
        handlers::volume::resize_volume,
        handlers::system::health_handler,
    ),
    components(schemas(
        crate::domain::Volume,
        crate::domain::Capacity,
        crate::domain::WatchEvent,
        dto::VolumeListResponse,
        dto::CreateVolumeRequest,
        dto::ResizeVolumeRequest,
        dto::DeviceClassDto,
        dto::DeviceClassListResponse,
        handlers::system::HealthResponse,
        crate::error::ErrorResponse,
        crate::error::ErrorBody,
    )),
    tags(
        (name = "Inventory", description = "Volume and capacity queries"),
        (name = "Volumes", description = "Volume lifecycle"),
        (name = "System", description = "Service health"),
    )
)]
pub struct ApiDoc;

/// Builds the REST router: `/api/v1` resources plus system routes.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes())
}

/// Builds the complete application.
///
/// Unary REST requests are bounded by `request_timeout`; the watch
/// WebSocket is mounted outside that layer since it lives as long as its
/// connection.
pub fn build_app(state: AppState, request_timeout: Duration) -> Router {
    let rest = build_router().layer(TimeoutLayer::with_status_code(
        StatusCode::REQUEST_TIMEOUT,
        request_timeout,
    ));

    let app = Router::new()
        .merge(rest)
        .route("/api/v1/watch", get(watch_handler));

    #[cfg(feature = "swagger-ui")]
    let app = app.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    app.layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
