//! Declarative rule validation run after binding.
//!
//! Rules check the bound value (`required`, `min`, `email`, ...). Their
//! violations are reported in the same [`LocatedError`] shape as binding
//! errors, located on the source the field is bound from, and a field that
//! already failed to bind gets no rule violation on top.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

use crate::binder::TargetDescriptor;
use crate::error::{LocatedError, Location};

static UUID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("uuid pattern compiles")
});

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$",
    )
    .expect("email pattern compiles")
});

static E164_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+[1-9]?[0-9]{7,14}$").expect("e164 pattern compiles"));

/// Returns `true` for a canonical hyphenated UUID.
///
/// # Examples
///
/// ```
/// use request_binder::is_valid_uuid;
///
/// assert!(is_valid_uuid("123e4567-e89b-12d3-a456-426614174000"));
/// assert!(!is_valid_uuid("123e4567e89b12d3a456426614174000"));
/// ```
pub fn is_valid_uuid(text: &str) -> bool {
    UUID_RE.is_match(text)
}

/// The value a rule sees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Observed<'a> {
    /// An empty optional.
    Absent,
    /// Text.
    Text(&'a str),
    /// Signed integer.
    Signed(i64),
    /// Unsigned integer.
    Unsigned(u64),
    /// Floating point number.
    Float(f64),
    /// Boolean.
    Bool(bool),
    /// A collection, by length.
    Items(usize),
    /// A 16-byte identifier.
    Id(&'a [u8; 16]),
}

/// Exposes a field value to rules.
pub trait Inspect {
    /// Returns the rule-facing view of this value.
    fn observe(&self) -> Observed<'_>;
}

impl Inspect for str {
    fn observe(&self) -> Observed<'_> {
        Observed::Text(self)
    }
}

impl Inspect for String {
    fn observe(&self) -> Observed<'_> {
        Observed::Text(self)
    }
}

impl Inspect for bool {
    fn observe(&self) -> Observed<'_> {
        Observed::Bool(*self)
    }
}

impl Inspect for f32 {
    fn observe(&self) -> Observed<'_> {
        Observed::Float(f64::from(*self))
    }
}

impl Inspect for f64 {
    fn observe(&self) -> Observed<'_> {
        Observed::Float(*self)
    }
}

impl Inspect for [u8; 16] {
    fn observe(&self) -> Observed<'_> {
        Observed::Id(self)
    }
}

impl Inspect for Uuid {
    fn observe(&self) -> Observed<'_> {
        Observed::Id(self.as_bytes())
    }
}

impl<T: Inspect> Inspect for Option<T> {
    fn observe(&self) -> Observed<'_> {
        match self {
            Some(inner) => inner.observe(),
            None => Observed::Absent,
        }
    }
}

impl<T> Inspect for Vec<T> {
    fn observe(&self) -> Observed<'_> {
        Observed::Items(self.len())
    }
}

macro_rules! inspect_int {
    ($variant:ident, $wide:ty => $($ty:ty),*) => {$(
        impl Inspect for $ty {
            fn observe(&self) -> Observed<'_> {
                Observed::$variant(*self as $wide)
            }
        }
    )*};
}

inspect_int!(Signed, i64 => i8, i16, i32, i64, isize);
inspect_int!(Unsigned, u64 => u8, u16, u32, u64, usize);

/// A declarative validation rule.
#[derive(Debug, Clone, Copy)]
pub enum Rule {
    /// Non-empty text, non-zero number, `true`, non-empty collection, non-nil id.
    Required,
    /// Lower bound on text length (chars), number value or collection length.
    Min(i64),
    /// Upper bound on text length (chars), number value or collection length.
    Max(i64),
    /// Text (or a number's decimal form) must be one of the listed values.
    OneOf(&'static [&'static str]),
    /// Text must be an email address.
    Email,
    /// Text must be an E.164 phone number.
    E164,
    /// Text must be a canonical UUID.
    Uuid,
    /// Text must be a comma-separated list of canonical UUIDs.
    UuidList,
    /// Application-defined rule.
    Custom {
        /// Rule name used in the message.
        tag: &'static str,
        /// Optional rule parameter used in the message.
        param: Option<&'static str>,
        /// Returns `true` when the value passes.
        check: fn(&Observed<'_>) -> bool,
    },
}

impl Rule {
    /// Returns the rule's tag name.
    pub fn tag(&self) -> &'static str {
        match self {
            Rule::Required => "required",
            Rule::Min(_) => "min",
            Rule::Max(_) => "max",
            Rule::OneOf(_) => "oneof",
            Rule::Email => "email",
            Rule::E164 => "e164",
            Rule::Uuid => "uuid",
            Rule::UuidList => "uuidList",
            Rule::Custom { tag, .. } => *tag,
        }
    }

    /// Returns `true` when `value` satisfies this rule.
    ///
    /// An absent optional only fails `Required`; rules that do not apply to
    /// a value's kind pass.
    pub fn holds(&self, value: &Observed<'_>) -> bool {
        if let Rule::Custom { check, .. } = self {
            return check(value);
        }
        if let Observed::Absent = value {
            return !matches!(self, Rule::Required);
        }

        match self {
            Rule::Required => match *value {
                Observed::Text(text) => !text.is_empty(),
                Observed::Signed(n) => n != 0,
                Observed::Unsigned(n) => n != 0,
                Observed::Float(n) => n != 0.0,
                Observed::Bool(b) => b,
                Observed::Items(len) => len > 0,
                Observed::Id(bytes) => bytes.iter().any(|b| *b != 0),
                Observed::Absent => false,
            },
            Rule::Min(bound) => measure(value).map_or(true, |m| m >= *bound as f64),
            Rule::Max(bound) => measure(value).map_or(true, |m| m <= *bound as f64),
            Rule::OneOf(allowed) => match *value {
                Observed::Text(text) => allowed.contains(&text),
                Observed::Signed(n) => allowed.contains(&n.to_string().as_str()),
                Observed::Unsigned(n) => allowed.contains(&n.to_string().as_str()),
                Observed::Float(n) => allowed.contains(&n.to_string().as_str()),
                _ => true,
            },
            Rule::Email => text_matches(value, |text| EMAIL_RE.is_match(text)),
            Rule::E164 => text_matches(value, |text| E164_RE.is_match(text)),
            Rule::Uuid => text_matches(value, is_valid_uuid),
            Rule::UuidList => text_matches(value, |text| {
                text.split(',').all(|item| is_valid_uuid(item.trim()))
            }),
            Rule::Custom { .. } => true,
        }
    }

    fn message(&self, field: &str, value: &Observed<'_>) -> String {
        let text = matches!(value, Observed::Text(_));
        match self {
            Rule::Required => "is required".to_string(),
            Rule::Min(bound) if text => format!("must be at least {bound} characters"),
            Rule::Min(bound) => format!("must be at least {bound}"),
            Rule::Max(bound) if text => format!("must not exceed {bound} characters"),
            Rule::Max(bound) => format!("must not exceed {bound}"),
            Rule::OneOf(allowed) => format!("must be one of: {}", allowed.join(" ")),
            Rule::Email => "must be a valid email address".to_string(),
            Rule::E164 => "must be a valid phone number with country code".to_string(),
            Rule::Uuid => "must be a valid UUID".to_string(),
            Rule::UuidList => "must be a comma-separated list of valid UUIDs".to_string(),
            Rule::Custom { tag, param, .. } => match param {
                Some(param) => format!("{}: {tag}:{param}", field.to_lowercase()),
                None => format!("{}: {tag}", field.to_lowercase()),
            },
        }
    }
}

fn measure(value: &Observed<'_>) -> Option<f64> {
    match *value {
        Observed::Text(text) => Some(text.chars().count() as f64),
        Observed::Signed(n) => Some(n as f64),
        Observed::Unsigned(n) => Some(n as f64),
        Observed::Float(n) => Some(n),
        Observed::Items(len) => Some(len as f64),
        Observed::Bool(_) | Observed::Id(_) | Observed::Absent => None,
    }
}

fn text_matches(value: &Observed<'_>, pred: impl Fn(&str) -> bool) -> bool {
    match *value {
        Observed::Text(text) => pred(text),
        _ => true,
    }
}

/// One rule failure on one declared field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleViolation {
    field: &'static str,
    tag: &'static str,
    message: String,
}

impl RuleViolation {
    /// Creates a violation with a ready-made message.
    pub fn new(field: &'static str, tag: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            tag,
            message: message.into(),
        }
    }

    /// Returns the declared field name.
    pub fn field(&self) -> &'static str {
        self.field
    }

    /// Returns the failing rule's tag.
    pub fn tag(&self) -> &'static str {
        self.tag
    }

    /// Returns the client-facing message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for RuleViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.field, self.tag, self.message)
    }
}

impl std::error::Error for RuleViolation {}

/// A bound value that can check its own rules.
pub trait Validate {
    /// Checks every rule and returns all violations.
    ///
    /// # Errors
    ///
    /// Returns the violations, at most one per field.
    fn validate(&self) -> Result<(), Vec<RuleViolation>>;
}

/// Collects rule violations field by field.
///
/// Only the first failing rule of a field is reported.
///
/// # Examples
///
/// ```
/// use request_binder::{Rule, Rules};
///
/// let email = String::from("not-an-email");
/// let age: Option<u8> = None;
///
/// let violations = Rules::new()
///     .check("email", &email, &[Rule::Required, Rule::Email])
///     .check("age", &age, &[Rule::Min(18)])
///     .finish()
///     .unwrap_err();
///
/// assert_eq!(violations.len(), 1);
/// assert_eq!(violations[0].message(), "must be a valid email address");
/// ```
#[derive(Debug, Default)]
pub struct Rules {
    violations: Vec<RuleViolation>,
}

impl Rules {
    /// Starts an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks `value` against `rules` in order.
    pub fn check<V: Inspect + ?Sized>(
        mut self,
        field: &'static str,
        value: &V,
        rules: &[Rule],
    ) -> Self {
        let observed = value.observe();
        if let Some(rule) = rules.iter().find(|rule| !rule.holds(&observed)) {
            self.violations.push(RuleViolation::new(
                field,
                rule.tag(),
                rule.message(field, &observed),
            ));
        }
        self
    }

    /// Returns every collected violation.
    ///
    /// # Errors
    ///
    /// Returns the violations when there is at least one.
    pub fn finish(self) -> Result<(), Vec<RuleViolation>> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(self.violations)
        }
    }
}

/// Appends rule violations to binding errors.
///
/// Each violation is located on its field's highest-priority source tag (or
/// the JSON body) under the lower-cased field name. Violations on fields that
/// already carry a binding error are dropped.
pub fn merge_violations<T>(
    descriptor: &TargetDescriptor<T>,
    binding: Vec<LocatedError>,
    violations: Vec<RuleViolation>,
) -> Vec<LocatedError> {
    let surviving: Vec<LocatedError> = violations
        .into_iter()
        .filter_map(|violation| {
            let field = descriptor.field_named(violation.field);
            let location = match field {
                Some(field) => field.primary_source().locate(field.error_name()),
                None => Location::Field(violation.field.to_lowercase()),
            };
            let already_failed = binding.iter().any(|err| {
                *err.location() == location
                    || field.is_some_and(|field| descriptor.located_on(field, err.location()))
            });
            (!already_failed).then(|| LocatedError::new(location, violation.message))
        })
        .collect();

    let mut merged = binding;
    merged.extend(surviving);
    merged
}
