//! Binder configuration.
//!
//! Hosts usually deserialize [`BinderConfig`] from their own configuration
//! file; every field has a default so a partial document is fine.

use serde::{Deserialize, Serialize};

/// How a wide integer parse is narrowed into a smaller declared width.
///
/// Integers are always parsed as `i64`/`u64` first. `Wrap` then truncates
/// with two's-complement semantics (`"300"` into a `u8` becomes `44`), which
/// is what the binder has always done. `Reject` reports out-of-width text
/// with the same message as unparseable text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Narrowing {
    /// Truncate to the declared width.
    #[default]
    Wrap,
    /// Fail coercion when the value does not fit the declared width.
    Reject,
}

/// Settings shared by every bind performed through one [`Binder`](crate::Binder).
///
/// # Examples
///
/// ```
/// use request_binder::{BinderConfig, Narrowing};
///
/// let config: BinderConfig =
///     serde_json::from_str(r#"{"integer_narrowing": "reject"}"#).unwrap();
/// assert_eq!(config.integer_narrowing, Narrowing::Reject);
/// assert_eq!(config.failure_message, "Validation failed");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinderConfig {
    /// Narrowing policy for integer fields narrower than 64 bits.
    pub integer_narrowing: Narrowing,
    /// Message attached to the aggregated 422 error.
    pub failure_message: String,
}

impl Default for BinderConfig {
    fn default() -> Self {
        Self {
            integer_narrowing: Narrowing::default(),
            failure_message: "Validation failed".to_string(),
        }
    }
}
