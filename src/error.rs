//! Error types for the gateway and the contour pipeline.
//!
//! [`GatewayError`] is the HTTP-facing error; each variant maps to a status
//! code and a structured JSON body. The contour pipeline has its own
//! taxonomy ([`GenerationError`], [`FallbackFailure`], [`MalformedReport`])
//! which never reaches HTTP clients: generation failures are contained
//! inside [`crate::service::ContourPipeline`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{ReportId, StormId};

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2001,
///     "message": "storm not found: 6f1c...",
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
    /// Numeric error code.
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
/// | Range     | Category        | HTTP Status               |
/// |-----------|-----------------|---------------------------|
/// | 1000–1999 | Validation      | 400 Bad Request           |
/// | 2000–2999 | Not Found       | 404 Not Found             |
/// | 3000–3999 | Server          | 500 Internal Server Error |
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Storm with the given ID was not found.
    #[error("storm not found: {0}")]
    StormNotFound(StormId),

    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A submitted report failed validation.
    #[error(transparent)]
    MalformedReport(#[from] MalformedReport),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::MalformedReport(_) => 1002,
            Self::StormNotFound(_) => 2001,
            Self::Internal(_) => 3000,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::MalformedReport(_) => StatusCode::BAD_REQUEST,
            Self::StormNotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
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

/// Why a hail report was rejected before generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedField {
    /// Latitude is not finite or outside `[-90, 90]`.
    Latitude,
    /// Longitude is not finite or outside `[-180, 180]`.
    Longitude,
    /// Hail size is not finite or not positive.
    Size,
    /// Confidence is above 100.
    Confidence,
}

impl std::fmt::Display for MalformedField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Latitude => "latitude",
            Self::Longitude => "longitude",
            Self::Size => "size",
            Self::Confidence => "confidence",
        };
        f.write_str(name)
    }
}

/// A report with missing or invalid coordinates or size.
///
/// Filtered out before generation; one bad report never blocks the batch.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("malformed report {report_id}: invalid {field}")]
pub struct MalformedReport {
    /// Offending report.
    pub report_id: ReportId,
    /// First field that failed validation.
    pub field: MalformedField,
}

/// Failure of the smooth (primary) contour generator.
///
/// Always recovered by the pipeline through the fallback generator.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerationError {
    /// Fewer distinct report locations than interpolation needs.
    #[error("insufficient points for interpolation: {distinct} distinct, {required} required")]
    InsufficientPoints {
        /// Distinct locations found.
        distinct: usize,
        /// Minimum required.
        required: usize,
    },

    /// All report locations are collinear.
    #[error("degenerate input: all report locations are collinear")]
    Degenerate,

    /// The interpolation grid would exceed the configured size.
    #[error("interpolation grid {cols}x{rows} exceeds limit {limit}")]
    GridTooLarge {
        /// Grid columns required.
        cols: usize,
        /// Grid rows required.
        rows: usize,
        /// Configured per-axis limit.
        limit: usize,
    },

    /// The surface produced no contour at any tier.
    #[error("surface produced no contours")]
    EmptySurface,
}

/// Failure of the simple (fallback) generator. Treated as a logic defect.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FallbackFailure {
    /// Called with no valid reports.
    #[error("fallback generator called with no valid reports")]
    EmptyInput,
}

/// Error returned by a [`crate::contour::ContourGenerator`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ContourError {
    /// Primary generation failed; fallback may recover.
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// Fallback generation failed; the cycle emits nothing.
    #[error(transparent)]
    Fallback(#[from] FallbackFailure),
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_ranges() {
        let not_found = GatewayError::StormNotFound(StormId::new());
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(not_found.error_code(), 2001);

        let invalid = GatewayError::InvalidRequest("bad".to_string());
        assert_eq!(invalid.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(invalid.error_code(), 1001);
    }

    #[test]
    fn malformed_report_converts_to_bad_request() {
        let err: GatewayError = MalformedReport {
            report_id: ReportId::new(),
            field: MalformedField::Size,
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("invalid size"));
    }

    #[test]
    fn generation_error_messages() {
        let err = GenerationError::InsufficientPoints {
            distinct: 2,
            required: 3,
        };
        assert_eq!(
            err.to_string(),
            "insufficient points for interpolation: 2 distinct, 3 required"
        );
        let wrapped: ContourError = err.into();
        assert!(matches!(wrapped, ContourError::Generation(_)));
    }
}
