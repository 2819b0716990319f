use std::io::Read;

use serde_json::{Map, Value};

use super::coerce::CoerceOptions;
use super::descriptor::TargetDescriptor;
use super::resolve::resolve;
use super::structure::validate_structure;
use crate::config::BinderConfig;
use crate::error::{BindError, LocatedError};
use crate::http::HttpError;
use crate::logging::BindLog;
use crate::request::RequestInputs;
use crate::rules::{merge_violations, Validate};

/// A target type with a shared, compute-once descriptor.
///
/// # Examples
///
/// ```
/// use once_cell::sync::Lazy;
/// use request_binder::{Bindable, Field, TargetDescriptor};
///
/// #[derive(Debug, Default)]
/// struct GetUser {
///     id: uuid::Uuid,
///     expand: bool,
/// }
///
/// impl Bindable for GetUser {
///     fn descriptor() -> &'static TargetDescriptor<Self> {
///         static DESCRIPTOR: Lazy<TargetDescriptor<GetUser>> = Lazy::new(|| {
///             TargetDescriptor::new()
///                 .field(Field::new("id", |t: &mut GetUser| &mut t.id).param("id"))
///                 .field(Field::new("expand", |t: &mut GetUser| &mut t.expand).query("expand"))
///         });
///         &DESCRIPTOR
///     }
/// }
/// ```
pub trait Bindable: Default + Sized + 'static {
    /// Returns the descriptor shared by every bind of this type.
    fn descriptor() -> &'static TargetDescriptor<Self>;
}

/// A (possibly partially) bound target and every field-level error found.
///
/// Fields that failed to bind keep their default value. Do not trust the
/// target unless [`is_clean`](Self::is_clean) returns `true`.
#[derive(Debug, Clone, PartialEq)]
pub struct BindOutcome<T> {
    /// The bound target.
    pub target: T,
    /// Source-bound errors first, then body structure errors.
    pub errors: Vec<LocatedError>,
}

impl<T> BindOutcome<T> {
    /// Returns `true` when no field-level error was found.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the target when clean, the errors otherwise.
    ///
    /// # Errors
    ///
    /// Returns the collected errors when there is at least one.
    pub fn into_result(self) -> Result<T, Vec<LocatedError>> {
        if self.errors.is_empty() {
            Ok(self.target)
        } else {
            Err(self.errors)
        }
    }
}

/// Binds request inputs into typed targets, collecting every field error.
///
/// `Binder` holds only configuration, so one instance can serve concurrent
/// requests.
///
/// # Examples
///
/// ```
/// use once_cell::sync::Lazy;
/// use request_binder::{Bindable, Binder, Field, Location, RequestInputs, TargetDescriptor};
///
/// #[derive(Debug, Default)]
/// struct Rename {
///     id: u64,
///     name: String,
/// }
///
/// impl Bindable for Rename {
///     fn descriptor() -> &'static TargetDescriptor<Self> {
///         static DESCRIPTOR: Lazy<TargetDescriptor<Rename>> = Lazy::new(|| {
///             TargetDescriptor::new()
///                 .field(Field::new("id", |t: &mut Rename| &mut t.id).param("id"))
///                 .field(Field::json("name", |t: &mut Rename| &mut t.name))
///         });
///         &DESCRIPTOR
///     }
/// }
///
/// let mut inputs = RequestInputs::new("req-1");
/// inputs.add_path_param("id", "12");
///
/// let outcome = Binder::default()
///     .bind_bytes::<Rename>(&inputs, br#"{"name": "x", "extra": 1}"#)
///     .expect("body is valid JSON");
///
/// assert_eq!(outcome.target.id, 12);
/// assert_eq!(outcome.target.name, "x");
/// assert_eq!(outcome.errors.len(), 1);
/// assert_eq!(outcome.errors[0].location(), &Location::Field("extra".to_string()));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Binder {
    config: BinderConfig,
}

impl Binder {
    /// Creates a binder with the given configuration.
    pub fn new(config: BinderConfig) -> Self {
        Self { config }
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &BinderConfig {
        &self.config
    }

    /// Binds a fresh `T::default()` from `inputs` and `body`.
    ///
    /// # Errors
    ///
    /// Returns [`BindError`] when the body cannot be read or is not a JSON
    /// object. Field-level problems are reported in the outcome instead.
    pub fn bind<T: Bindable, R: Read>(
        &self,
        inputs: &RequestInputs,
        body: R,
    ) -> Result<BindOutcome<T>, BindError> {
        let mut target = T::default();
        let errors = self.bind_into(T::descriptor(), &mut target, inputs, body)?;
        Ok(BindOutcome { target, errors })
    }

    /// Binds from an in-memory body.
    ///
    /// # Errors
    ///
    /// Returns [`BindError::MalformedJson`] for a non-empty body that is not
    /// a JSON object.
    pub fn bind_bytes<T: Bindable>(
        &self,
        inputs: &RequestInputs,
        body: &[u8],
    ) -> Result<BindOutcome<T>, BindError> {
        self.bind(inputs, body)
    }

    /// Binds into an existing target with an explicit descriptor.
    ///
    /// Stages run strictly in order: read body, parse the outer object,
    /// validate its structure, bind source fields, decode body fields
    /// best-effort, aggregate. Only the first two can abort.
    ///
    /// # Errors
    ///
    /// Returns [`BindError`] when the body cannot be read or parsed. The
    /// target is not modified in that case.
    pub fn bind_into<T, R: Read>(
        &self,
        descriptor: &TargetDescriptor<T>,
        target: &mut T,
        inputs: &RequestInputs,
        mut body: R,
    ) -> Result<Vec<LocatedError>, BindError> {
        let log = BindLog::new(inputs.request_id(), descriptor.type_name());

        let mut raw = Vec::new();
        if let Err(err) = body.read_to_end(&mut raw) {
            log.warn(format_args!("failed to read request body: {err}"));
            return Err(BindError::ReadBody(err));
        }

        let object = if raw.is_empty() {
            None
        } else {
            match parse_body(&raw) {
                Ok(object) => object,
                Err(err) => {
                    log.warn(format_args!("rejecting malformed JSON body: {err}"));
                    return Err(BindError::MalformedJson(err));
                }
            }
        };

        let structural = object
            .as_ref()
            .map(|object| validate_structure(object, descriptor))
            .unwrap_or_default();
        log.debug(format_args!(
            "checked body structure: {} key(s), {} error(s)",
            object.as_ref().map_or(0, Map::len),
            structural.len()
        ));

        let opts = CoerceOptions {
            narrowing: self.config.integer_narrowing,
        };
        let mut errors = Vec::new();
        for field in descriptor.fields() {
            let Some((source, text)) = resolve(inputs, field) else {
                continue;
            };
            if let Err(err) = field.assign(target, text, opts) {
                errors.push(LocatedError::new(
                    source.locate(field.error_name()),
                    err.to_string(),
                ));
            }
        }
        log.debug(format_args!("bound source fields: {} error(s)", errors.len()));

        // Decode failures here were already reported as structural errors,
        // or are width/element problems the coarse check does not cover.
        if let Some(object) = &object {
            for (key, value) in object {
                let Some(field) = descriptor.json_field(key) else {
                    continue;
                };
                if let Err(err) = field.decode(target, value) {
                    log.debug(format_args!("left '{key}' unset: {err}"));
                }
            }
        }

        log.outcome(errors.len(), structural.len());
        errors.extend(structural);
        Ok(errors)
    }

    /// Binds, runs the target's rule validation and merges the results.
    ///
    /// Rule violations on fields that already failed to bind are dropped.
    ///
    /// # Errors
    ///
    /// - `400 Bad Request` when the body cannot be read or parsed.
    /// - `422 Unprocessable Entity` carrying every binding error followed by
    ///   every surviving rule violation.
    pub fn bind_and_validate<T: Bindable + Validate, R: Read>(
        &self,
        inputs: &RequestInputs,
        body: R,
    ) -> Result<T, HttpError> {
        let outcome = self.bind::<T, R>(inputs, body)?;
        let violations = outcome.target.validate().err().unwrap_or_default();
        let errors = merge_violations(T::descriptor(), outcome.errors, violations);

        if errors.is_empty() {
            Ok(outcome.target)
        } else {
            Err(HttpError::unprocessable(
                self.config.failure_message.clone(),
                errors,
            ))
        }
    }
}

/// Parses the outer body. `null` binds like an absent body; any other
/// non-object value is malformed.
fn parse_body(raw: &[u8]) -> Result<Option<Map<String, Value>>, serde_json::Error> {
    match serde_json::from_slice::<Value>(raw)? {
        Value::Null => Ok(None),
        other => serde_json::from_value(other).map(Some),
    }
}
