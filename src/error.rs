use std::fmt;
use std::io;

use serde::{Deserialize, Serialize};

/// Fatal errors that abort a bind before any field-level work is meaningful.
///
/// These are never aggregated. The HTTP layer surfaces them as
/// `400 Bad Request` (see [`HttpError`](crate::HttpError)).
#[derive(Debug, thiserror::Error)]
pub enum BindError {
    /// The request body could not be read.
    #[error("failed to read request body")]
    ReadBody(#[source] io::Error),
    /// The body is not empty and is not a JSON object.
    #[error("invalid JSON: {0}")]
    MalformedJson(#[source] serde_json::Error),
}

/// The request source a [`LocatedError`] points at.
///
/// Exactly one selector exists per error, so the serialized form carries
/// exactly one of `param`, `query`, `form`, `header` or `field`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    /// A path parameter.
    Param(String),
    /// A query-string parameter.
    Query(String),
    /// A form field.
    Form(String),
    /// A request header.
    Header(String),
    /// A key of the JSON body.
    Field(String),
}

impl Location {
    /// Returns the field or key name regardless of source.
    pub fn name(&self) -> &str {
        match self {
            Location::Param(name)
            | Location::Query(name)
            | Location::Form(name)
            | Location::Header(name)
            | Location::Field(name) => name,
        }
    }

    /// Returns the selector label used on the wire.
    pub fn selector(&self) -> &'static str {
        match self {
            Location::Param(_) => "param",
            Location::Query(_) => "query",
            Location::Form(_) => "form",
            Location::Header(_) => "header",
            Location::Field(_) => "field",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.selector(), self.name())
    }
}

/// One binding or validation failure tagged with its origin.
///
/// Serializes as `{"query": "page", "error": "must be a valid integer"}`.
///
/// # Examples
///
/// ```
/// use request_binder::{LocatedError, Location};
///
/// let err = LocatedError::new(Location::Param("id".to_string()), "invalid UUID format");
/// assert_eq!(err.location().selector(), "param");
/// assert_eq!(err.to_string(), "param 'id': invalid UUID format");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatedError {
    #[serde(flatten)]
    location: Location,
    #[serde(rename = "error")]
    message: String,
}

impl LocatedError {
    /// Creates a new located error.
    pub fn new(location: Location, message: impl Into<String>) -> Self {
        Self {
            location,
            message: message.into(),
        }
    }

    /// Returns where the error came from.
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Returns the human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for LocatedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

impl std::error::Error for LocatedError {}
