//! Client-facing HTTP error bodies.
//!
//! [`HttpError`] is what a handler returns to the client when binding or
//! validation fails. It serializes as
//! `{"code", "message", "status", "override", "errors", "action"}`.

use http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::{BindError, LocatedError};

/// Converts a phrase such as `Unprocessable Entity` into `UNPROCESSABLE_ENTITY`.
///
/// # Examples
///
/// ```
/// use request_binder::make_upper_snake_case;
///
/// assert_eq!(make_upper_snake_case("Not Found"), "NOT_FOUND");
/// assert_eq!(make_upper_snake_case("multi-status"), "MULTI_STATUS");
/// ```
pub fn make_upper_snake_case(text: &str) -> String {
    text.replace([' ', '-'], "_").to_uppercase()
}

/// Follow-up the client should take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    /// Navigate to `value`.
    Redirect,
}

/// A client action attached to an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// What to do.
    #[serde(rename = "type")]
    pub kind: ActionType,
    /// Text shown alongside the action.
    pub message: String,
    /// Action target, e.g. a URL.
    pub value: String,
}

impl Action {
    /// Creates a redirect action.
    pub fn redirect(message: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: ActionType::Redirect,
            message: message.into(),
            value: value.into(),
        }
    }
}

/// Structured error body returned to HTTP clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct HttpError {
    /// Machine-readable code, by default the upper-snake-case status reason.
    pub code: String,
    /// Human-readable summary.
    pub message: String,
    /// HTTP status code.
    pub status: u16,
    /// Whether clients should show `message` in place of their own text.
    #[serde(rename = "override")]
    pub override_message: bool,
    /// Field-level errors.
    pub errors: Vec<LocatedError>,
    /// Optional follow-up action.
    pub action: Option<Action>,
}

impl HttpError {
    /// Creates an error for `status` with the default code.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code: make_upper_snake_case(status.canonical_reason().unwrap_or("Unknown")),
            message: message.into(),
            status: status.as_u16(),
            override_message: false,
            errors: Vec::new(),
            action: None,
        }
    }

    /// `400 Bad Request`: the request could not be read as sent.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// `401 Unauthorized`.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    /// `403 Forbidden`.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    /// `404 Not Found`.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// `409 Conflict`: the request conflicts with existing state.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    /// `422 Unprocessable Entity` carrying field-level errors.
    pub fn unprocessable(message: impl Into<String>, errors: Vec<LocatedError>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message).with_errors(errors)
    }

    /// `422 Unprocessable Entity` wrapping an arbitrary validation failure.
    pub fn validation(err: &dyn std::error::Error) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("Validation failed: {err}"),
        )
    }

    /// `500 Internal Server Error` with the standard reason as message.
    pub fn internal_server_error() -> Self {
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        Self::new(status, status.canonical_reason().unwrap_or("Internal Server Error"))
    }

    /// Returns a copy with a different message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Replaces the default code.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    /// Replaces the field-level errors.
    pub fn with_errors(mut self, errors: Vec<LocatedError>) -> Self {
        self.errors = errors;
        self
    }

    /// Attaches a client action.
    pub fn with_action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    /// Sets the override flag.
    pub fn with_override(mut self, override_message: bool) -> Self {
        self.override_message = override_message;
        self
    }

    /// Returns the status as [`StatusCode`].
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<BindError> for HttpError {
    fn from(err: BindError) -> Self {
        Self::bad_request(err.to_string())
    }
}
