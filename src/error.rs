//! Daemon error types with HTTP status code mapping.
//!
//! [`LvmdError`] is the central error type for the daemon. Each variant
//! maps to a specific HTTP status code and structured JSON error response.
//! Volume-driver failures arrive as [`DriverError`] and are folded into the
//! matching variant through `From`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::driver::DriverError;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2001,
///     "message": "device class not found: ssd",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see [`LvmdError::error_code`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                    |
/// |-----------|-----------------|--------------------------------|
/// | 1000–1999 | Validation      | 400 Bad Request                |
/// | 2000–2999 | State/Not Found | 404 Not Found / 409 Conflict   |
/// | 3000–3999 | Server/Backend  | 500 / 503 Service Unavailable  |
/// | 4000–4999 | Capacity        | 507 Insufficient Storage       |
#[derive(Debug, thiserror::Error)]
pub enum LvmdError {
    /// No device class is registered under the requested name.
    #[error("device class not found: {0}")]
    DeviceClassNotFound(String),

    /// The named volume does not exist in the pool that was searched.
    #[error("volume {name} not found in pool {pool}")]
    VolumeNotFound {
        /// Pool (volume group) that was searched.
        pool: String,
        /// Requested volume name.
        name: String,
    },

    /// A volume with the same name already exists in the pool.
    #[error("volume {0} already exists")]
    VolumeExists(String),

    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The pool cannot satisfy the requested allocation.
    #[error("not enough space left in pool: free={free}, requested={requested}")]
    InsufficientCapacity {
        /// Bytes requested.
        requested: u64,
        /// Bytes the pool reported free.
        free: u64,
    },

    /// The volume-pool driver failed to answer.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Delivering an event to a watch subscriber failed.
    #[error("transport failure: {0}")]
    TransportFailure(String),

    /// Invalid startup configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl LvmdError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::DeviceClassNotFound(_) => 2001,
            Self::VolumeNotFound { .. } => 2002,
            Self::VolumeExists(_) => 2003,
            Self::Internal(_) => 3000,
            Self::BackendUnavailable(_) => 3001,
            Self::TransportFailure(_) => 3002,
            Self::Config(_) => 3003,
            Self::InsufficientCapacity { .. } => 4001,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::DeviceClassNotFound(_) | Self::VolumeNotFound { .. } => StatusCode::NOT_FOUND,
            Self::VolumeExists(_) => StatusCode::CONFLICT,
            Self::InsufficientCapacity { .. } => StatusCode::INSUFFICIENT_STORAGE,
            Self::BackendUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::TransportFailure(_) | Self::Config(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<DriverError> for LvmdError {
    fn from(err: DriverError) -> Self {
        match err {
            DriverError::VolumeNotFound { pool, name } => Self::VolumeNotFound { pool, name },
            DriverError::VolumeExists(name) => Self::VolumeExists(name),
            DriverError::InsufficientSpace { requested, free } => {
                Self::InsufficientCapacity { requested, free }
            }
            other => Self::BackendUnavailable(other.to_string()),
        }
    }
}

impl IntoResponse for LvmdError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::warn!(code = self.error_code(), error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let err = LvmdError::DeviceClassNotFound("ssd".to_string());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.error_code(), 2001);
        assert_eq!(err.to_string(), "device class not found: ssd");
    }

    #[test]
    fn backend_failure_maps_to_503() {
        let err = LvmdError::from(DriverError::PoolMissing("vg0".to_string()));
        let LvmdError::BackendUnavailable(msg) = &err else {
            panic!("expected BackendUnavailable, got {err:?}");
        };
        assert!(msg.contains("vg0"));
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn insufficient_space_keeps_numbers() {
        let err = LvmdError::from(DriverError::InsufficientSpace {
            requested: 10,
            free: 4,
        });
        assert!(matches!(
            err,
            LvmdError::InsufficientCapacity {
                requested: 10,
                free: 4
            }
        ));
        assert_eq!(err.status_code(), StatusCode::INSUFFICIENT_STORAGE);
    }

    #[test]
    fn missing_volume_names_the_pool() {
        let err = LvmdError::from(DriverError::VolumeNotFound {
            pool: "vg-ssd".to_string(),
            name: "v1".to_string(),
        });
        let LvmdError::VolumeNotFound { pool, name } = &err else {
            panic!("expected VolumeNotFound, got {err:?}");
        };
        assert_eq!(pool, "vg-ssd");
        assert_eq!(name, "v1");
        assert_eq!(err.to_string(), "volume v1 not found in pool vg-ssd");
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn into_response_sets_status() {
        let response = LvmdError::VolumeExists("v1".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
