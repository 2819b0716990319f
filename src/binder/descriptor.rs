//! Per-type binding metadata.
//!
//! A [`TargetDescriptor`] lists every bindable field of a target type: where
//! its value comes from, how raw text is coerced into it, and which coarse
//! JSON type the body must carry for it. Descriptors depend only on the
//! target's shape, never on a request, so they are built once and shared.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

use super::coerce::{Coerce, CoerceOptions, CoercionError, CoercionKind};
use crate::error::Location;

/// Where a field's value comes from.
///
/// The declaration order is the resolution priority for fields that carry
/// more than one tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Source {
    /// Path parameter captured by the router.
    Param,
    /// Query-string parameter.
    Query,
    /// Form field.
    Form,
    /// Request header.
    Header,
    /// Key of the JSON body.
    Json,
}

impl Source {
    /// Builds the error location for a field name coming from this source.
    pub fn locate(self, name: impl Into<String>) -> Location {
        let name = name.into();
        match self {
            Source::Param => Location::Param(name),
            Source::Query => Location::Query(name),
            Source::Form => Location::Form(name),
            Source::Header => Location::Header(name),
            Source::Json => Location::Field(name),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Param => write!(f, "param"),
            Source::Query => write!(f, "query"),
            Source::Form => write!(f, "form"),
            Source::Header => write!(f, "header"),
            Source::Json => write!(f, "json"),
        }
    }
}

/// Coarse JSON value type used by structural validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JsonType {
    /// JSON string.
    String,
    /// JSON number, integer or not.
    Number,
    /// JSON `true`/`false`.
    Boolean,
    /// JSON array.
    Array,
    /// JSON object.
    Object,
    /// Any value, including `null`.
    Any,
}

impl fmt::Display for JsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            JsonType::String => "string",
            JsonType::Number => "number",
            JsonType::Boolean => "boolean",
            JsonType::Array => "array",
            JsonType::Object => "object",
            JsonType::Any => "any",
        };
        f.write_str(label)
    }
}

/// Declares the coarse JSON type a field type expects.
///
/// Nullable wrappers report their inner type. Implement this for nested
/// body types (usually returning [`JsonType::Object`]) or use
/// [`Field::json_as`] instead.
pub trait JsonShape {
    /// The coarse JSON type for this Rust type.
    fn json_type() -> JsonType;
}

macro_rules! json_shape {
    ($json:expr => $($ty:ty),*) => {$(
        impl JsonShape for $ty {
            fn json_type() -> JsonType {
                $json
            }
        }
    )*};
}

json_shape!(JsonType::String => String, char, Uuid);
json_shape!(JsonType::Boolean => bool);
json_shape!(JsonType::Number => i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);
json_shape!(JsonType::Any => Value);
json_shape!(JsonType::Object => serde_json::Map<String, Value>);

impl<T: JsonShape> JsonShape for Option<T> {
    fn json_type() -> JsonType {
        T::json_type()
    }
}

impl<T: JsonShape> JsonShape for Box<T> {
    fn json_type() -> JsonType {
        T::json_type()
    }
}

impl<T> JsonShape for Vec<T> {
    fn json_type() -> JsonType {
        JsonType::Array
    }
}

impl<T> JsonShape for VecDeque<T> {
    fn json_type() -> JsonType {
        JsonType::Array
    }
}

impl<T, S> JsonShape for HashSet<T, S> {
    fn json_type() -> JsonType {
        JsonType::Array
    }
}

impl<T> JsonShape for BTreeSet<T> {
    fn json_type() -> JsonType {
        JsonType::Array
    }
}

impl<T, const N: usize> JsonShape for [T; N] {
    fn json_type() -> JsonType {
        JsonType::Array
    }
}

impl<K, V, S> JsonShape for HashMap<K, V, S> {
    fn json_type() -> JsonType {
        JsonType::Object
    }
}

impl<K, V> JsonShape for BTreeMap<K, V> {
    fn json_type() -> JsonType {
        JsonType::Object
    }
}

type Assign<T> = Box<dyn Fn(&mut T, &str, CoerceOptions) -> Result<(), CoercionError> + Send + Sync>;
type Decode<T> = Box<dyn Fn(&mut T, &Value) -> Result<(), serde_json::Error> + Send + Sync>;

enum Binding<T> {
    Sourced {
        tags: Vec<(Source, &'static str)>,
        kind: CoercionKind,
        assign: Assign<T>,
    },
    Json {
        json_type: JsonType,
        decode: Decode<T>,
    },
}

/// One bindable field of a target type `T`.
///
/// A field is either source-bound (path, query, form or header, coerced from
/// text) or JSON-bound (decoded from the body key equal to its name); never
/// both.
///
/// # Examples
///
/// ```
/// use request_binder::{Field, Source};
///
/// #[derive(Default)]
/// struct ListUsers {
///     page: u32,
///     name: String,
/// }
///
/// let page = Field::new("page", |t: &mut ListUsers| &mut t.page)
///     .header("X-Page")
///     .query("page");
/// let name = Field::json("name", |t: &mut ListUsers| &mut t.name);
///
/// // Tags are kept in resolution order regardless of declaration order.
/// let sources: Vec<_> = page.sources().collect();
/// assert_eq!(sources, vec![(Source::Query, "page"), (Source::Header, "X-Page")]);
/// assert!(name.is_json());
/// ```
pub struct Field<T> {
    name: &'static str,
    binding: Binding<T>,
}

impl<T> Field<T> {
    /// Declares a source-bound field. Add at least one tag with
    /// [`param`](Self::param), [`query`](Self::query), [`form`](Self::form)
    /// or [`header`](Self::header); an untagged field is never bound.
    pub fn new<F, A>(name: &'static str, access: A) -> Self
    where
        F: Coerce + 'static,
        A: Fn(&mut T) -> &mut F + Send + Sync + 'static,
    {
        let assign: Assign<T> = Box::new(move |target, raw, opts| {
            // Coerce fully before touching the target so failures leave it as is.
            let value = F::coerce(raw, opts)?;
            *access(target) = value;
            Ok(())
        });
        Self {
            name,
            binding: Binding::Sourced {
                tags: Vec::new(),
                kind: F::kind(),
                assign,
            },
        }
    }

    /// Declares a JSON-bound field whose body key equals `name`.
    pub fn json<F, A>(name: &'static str, access: A) -> Self
    where
        F: DeserializeOwned + JsonShape + 'static,
        A: Fn(&mut T) -> &mut F + Send + Sync + 'static,
    {
        Self::json_as(name, F::json_type(), access)
    }

    /// Declares a JSON-bound field with an explicit expected JSON type.
    pub fn json_as<F, A>(name: &'static str, json_type: JsonType, access: A) -> Self
    where
        F: DeserializeOwned + 'static,
        A: Fn(&mut T) -> &mut F + Send + Sync + 'static,
    {
        let decode: Decode<T> = Box::new(move |target, value| {
            let decoded = F::deserialize(value)?;
            *access(target) = decoded;
            Ok(())
        });
        Self {
            name,
            binding: Binding::Json { json_type, decode },
        }
    }

    /// Resolves this field from a path parameter.
    pub fn param(self, tag: &'static str) -> Self {
        self.tag(Source::Param, tag)
    }

    /// Resolves this field from a query parameter.
    pub fn query(self, tag: &'static str) -> Self {
        self.tag(Source::Query, tag)
    }

    /// Resolves this field from a form field.
    pub fn form(self, tag: &'static str) -> Self {
        self.tag(Source::Form, tag)
    }

    /// Resolves this field from a header.
    pub fn header(self, tag: &'static str) -> Self {
        self.tag(Source::Header, tag)
    }

    /// # Panics
    ///
    /// Panics when called on a JSON-bound field.
    fn tag(mut self, source: Source, tag: &'static str) -> Self {
        match &mut self.binding {
            Binding::Sourced { tags, .. } => {
                tags.push((source, tag));
                tags.sort_by_key(|(source, _)| *source);
            }
            Binding::Json { .. } => {
                panic!("field '{}' is JSON-bound and cannot take a {source} tag", self.name)
            }
        }
        self
    }

    /// Returns the declared field name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the name used in error locations (lower-cased).
    pub fn error_name(&self) -> String {
        self.name.to_lowercase()
    }

    /// Returns `true` for JSON-bound fields.
    pub fn is_json(&self) -> bool {
        matches!(self.binding, Binding::Json { .. })
    }

    /// Returns the source tags in resolution order. Empty for JSON fields.
    pub fn sources(&self) -> impl Iterator<Item = (Source, &'static str)> + '_ {
        let tags: &[(Source, &'static str)] = match &self.binding {
            Binding::Sourced { tags, .. } => tags,
            Binding::Json { .. } => &[],
        };
        tags.iter().copied()
    }

    /// Returns the source used to report rule violations: the highest
    /// priority tag, or [`Source::Json`] when the field has none.
    pub fn primary_source(&self) -> Source {
        self.sources()
            .next()
            .map(|(source, _)| source)
            .unwrap_or(Source::Json)
    }

    /// Returns the coercion kind of a source-bound field.
    pub fn kind(&self) -> Option<&CoercionKind> {
        match &self.binding {
            Binding::Sourced { kind, .. } => Some(kind),
            Binding::Json { .. } => None,
        }
    }

    /// Returns the expected JSON type of a JSON-bound field.
    pub fn json_type(&self) -> Option<JsonType> {
        match &self.binding {
            Binding::Json { json_type, .. } => Some(*json_type),
            Binding::Sourced { .. } => None,
        }
    }

    /// Coerces `raw` and stores it. A failure leaves the target untouched.
    pub(crate) fn assign(
        &self,
        target: &mut T,
        raw: &str,
        opts: CoerceOptions,
    ) -> Result<(), CoercionError> {
        match &self.binding {
            Binding::Sourced { assign, .. } => assign(target, raw, opts),
            Binding::Json { .. } => Ok(()),
        }
    }

    /// Decodes a body value and stores it. A failure leaves the target untouched.
    pub(crate) fn decode(&self, target: &mut T, value: &Value) -> Result<(), serde_json::Error> {
        match &self.binding {
            Binding::Json { decode, .. } => decode(target, value),
            Binding::Sourced { .. } => Ok(()),
        }
    }
}

impl<T> fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("Field");
        out.field("name", &self.name);
        match &self.binding {
            Binding::Sourced { tags, kind, .. } => {
                out.field("sources", tags).field("kind", kind);
            }
            Binding::Json { json_type, .. } => {
                out.field("json_type", json_type);
            }
        }
        out.finish()
    }
}

/// Immutable binding metadata for a target type.
///
/// Build one per type and share it; see [`Bindable`](crate::Bindable) for the
/// usual compute-once pattern.
///
/// # Panics
///
/// [`field`](Self::field) panics when two fields share a name.
pub struct TargetDescriptor<T> {
    type_name: &'static str,
    fields: Vec<Field<T>>,
}

impl<T> TargetDescriptor<T> {
    /// Creates an empty descriptor named after `T`.
    pub fn new() -> Self {
        let full = std::any::type_name::<T>();
        let outer = full.split('<').next().unwrap_or(full);
        Self {
            type_name: outer.rsplit("::").next().unwrap_or(outer),
            fields: Vec::new(),
        }
    }

    /// Appends a field. Declaration order is error order.
    pub fn field(mut self, field: Field<T>) -> Self {
        assert!(
            self.field_named(field.name).is_none(),
            "duplicate field '{}' in {} descriptor",
            field.name,
            self.type_name
        );
        self.fields.push(field);
        self
    }

    /// Returns the short type name used in log events.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns all fields in declaration order.
    pub fn fields(&self) -> &[Field<T>] {
        &self.fields
    }

    /// Looks a field up by its declared name.
    pub fn field_named(&self, name: &str) -> Option<&Field<T>> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Looks up the JSON-bound field for a body key.
    pub fn json_field(&self, key: &str) -> Option<&Field<T>> {
        self.fields
            .iter()
            .find(|field| field.is_json() && field.name == key)
    }

    /// Returns `true` when `location` reports a binding failure of `field`.
    pub(crate) fn located_on(&self, field: &Field<T>, location: &Location) -> bool {
        match location {
            Location::Field(key) => field.is_json() && field.name == key,
            other => {
                other.name() == field.error_name()
                    && field
                        .sources()
                        .any(|(source, _)| source.locate(other.name()) == *other)
            }
        }
    }
}

impl<T> Default for TargetDescriptor<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for TargetDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetDescriptor")
            .field("type_name", &self.type_name)
            .field("fields", &self.fields)
            .finish()
    }
}
