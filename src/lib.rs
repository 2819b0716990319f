//! Multi-source request binding with field-level error aggregation.
//!
//! This crate turns one HTTP request (path parameters, query string, form
//! fields, headers and a JSON body) into a typed target value through:
//! - **Descriptors**: per-type field metadata naming where each field comes from
//! - **Coercion**: text-to-scalar conversion for source-bound fields
//! - **Structural checks**: unknown keys and coarse type mismatches in the body
//! - **Rules**: declarative semantic validation merged with binding errors
//!
//! A bind reports every bad field at once. Only an unreadable body or
//! malformed JSON stops it early.
//!
//! # Core Types
//!
//! - [`Binder`]: runs a bind and returns a [`BindOutcome`]
//! - [`Bindable`]: a target type with a shared [`TargetDescriptor`]
//! - [`RequestInputs`]: the non-body parts of a request
//! - [`LocatedError`]: one field-level error tagged with its source
//! - [`HttpError`]: the client-facing error body
//!
//! # Examples
//!
//! ```
//! use once_cell::sync::Lazy;
//! use request_binder::{
//!     Bindable, Binder, Field, Location, RequestInputs, Rule, RuleViolation, Rules,
//!     TargetDescriptor, Validate,
//! };
//!
//! #[derive(Debug, Default)]
//! struct UpdateUser {
//!     id: uuid::Uuid,
//!     notify: bool,
//!     email: String,
//! }
//!
//! impl Bindable for UpdateUser {
//!     fn descriptor() -> &'static TargetDescriptor<Self> {
//!         static DESCRIPTOR: Lazy<TargetDescriptor<UpdateUser>> = Lazy::new(|| {
//!             TargetDescriptor::new()
//!                 .field(Field::new("id", |t: &mut UpdateUser| &mut t.id).param("id"))
//!                 .field(Field::new("notify", |t: &mut UpdateUser| &mut t.notify).query("notify"))
//!                 .field(Field::json("email", |t: &mut UpdateUser| &mut t.email))
//!         });
//!         &DESCRIPTOR
//!     }
//! }
//!
//! impl Validate for UpdateUser {
//!     fn validate(&self) -> Result<(), Vec<RuleViolation>> {
//!         Rules::new()
//!             .check("email", &self.email, &[Rule::Required, Rule::Email])
//!             .finish()
//!     }
//! }
//!
//! let mut inputs = RequestInputs::new("req-42");
//! inputs.add_path_param("id", "123e4567-e89b-12d3-a456-426614174000");
//! inputs.with_query_string("notify=maybe");
//!
//! let err = Binder::default()
//!     .bind_and_validate::<UpdateUser, _>(&inputs, &br#"{"email": "nope"}"#[..])
//!     .unwrap_err();
//!
//! assert_eq!(err.status, 422);
//! assert_eq!(err.errors[0].location(), &Location::Query("notify".to_string()));
//! assert_eq!(err.errors[0].message(), "must be a valid boolean");
//! assert_eq!(err.errors[1].message(), "must be a valid email address");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod binder;
mod config;
mod error;
mod http;
mod logging;
mod request;
mod rules;

#[cfg(test)]
mod test_utils;

pub use binder::{
    parse_uuid, BindOutcome, Bindable, Binder, Coerce, CoerceOptions, CoercionError,
    CoercionKind, Field, JsonShape, JsonType, Source, TargetDescriptor,
};
pub use config::{BinderConfig, Narrowing};
pub use error::{BindError, LocatedError, Location};
pub use self::http::{make_upper_snake_case, Action, ActionType, HttpError};
pub use request::RequestInputs;
pub use rules::{
    is_valid_uuid, merge_violations, Inspect, Observed, Rule, RuleViolation, Rules, Validate,
};
