//! Scalar coercion: one raw text value into one typed field value.

use std::fmt;

use uuid::Uuid;

use crate::config::Narrowing;

/// Why a raw value could not be coerced. `Display` is the client-facing text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CoercionError {
    /// Not 32 hex digits once hyphens are removed.
    #[error("invalid UUID format")]
    InvalidUuid,
    /// Not a base-10 signed integer (or out of range).
    #[error("must be a valid integer")]
    Integer,
    /// Not a base-10 unsigned integer (or out of range).
    #[error("must be a valid unsigned integer")]
    UnsignedInteger,
    /// Not a decimal floating point number.
    #[error("must be a valid number")]
    Number,
    /// Not one of the accepted boolean spellings.
    #[error("must be a valid boolean")]
    Boolean,
    /// The declared field type has no text coercion.
    #[error("unsupported type for binding")]
    Unsupported,
}

/// The coercion kind of a declared field, as recorded in a descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoercionKind {
    /// Raw text, unchanged.
    String,
    /// Signed integer of the given width in bits.
    Signed(u32),
    /// Unsigned integer of the given width in bits.
    Unsigned(u32),
    /// Floating point of the given width in bits.
    Float(u32),
    /// Boolean literal.
    Bool,
    /// Fixed-size 16-byte identifier.
    Identifier,
    /// Nullable wrapper around another kind.
    Optional(Box<CoercionKind>),
    /// No text coercion exists for this type.
    Unsupported,
}

impl fmt::Display for CoercionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoercionKind::String => write!(f, "string"),
            CoercionKind::Signed(bits) => write!(f, "i{bits}"),
            CoercionKind::Unsigned(bits) => write!(f, "u{bits}"),
            CoercionKind::Float(bits) => write!(f, "f{bits}"),
            CoercionKind::Bool => write!(f, "bool"),
            CoercionKind::Identifier => write!(f, "identifier"),
            CoercionKind::Optional(inner) => write!(f, "optional {inner}"),
            CoercionKind::Unsupported => write!(f, "unsupported"),
        }
    }
}

/// Options that change coercion results. Copied into every call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoerceOptions {
    /// Integer narrowing policy.
    pub narrowing: Narrowing,
}

/// A field type that can be produced from one textual request value.
///
/// Implementations are pure: they never touch global state and a failure
/// returns no partial value.
///
/// # Examples
///
/// ```
/// use request_binder::{Coerce, CoerceOptions, CoercionError};
///
/// let opts = CoerceOptions::default();
/// assert_eq!(i32::coerce("-17", opts), Ok(-17));
/// assert_eq!(bool::coerce("maybe", opts), Err(CoercionError::Boolean));
/// assert_eq!(Option::<u8>::coerce("7", opts), Ok(Some(7)));
/// ```
pub trait Coerce: Sized {
    /// The declared kind of this type.
    fn kind() -> CoercionKind;

    /// Converts raw text into a value of this type.
    ///
    /// # Errors
    ///
    /// Returns the [`CoercionError`] matching the declared kind.
    fn coerce(raw: &str, opts: CoerceOptions) -> Result<Self, CoercionError>;
}

impl Coerce for String {
    fn kind() -> CoercionKind {
        CoercionKind::String
    }

    fn coerce(raw: &str, _opts: CoerceOptions) -> Result<Self, CoercionError> {
        Ok(raw.to_string())
    }
}

impl<T: Coerce> Coerce for Option<T> {
    fn kind() -> CoercionKind {
        CoercionKind::Optional(Box::new(T::kind()))
    }

    fn coerce(raw: &str, opts: CoerceOptions) -> Result<Self, CoercionError> {
        T::coerce(raw, opts).map(Some)
    }
}

impl Coerce for bool {
    fn kind() -> CoercionKind {
        CoercionKind::Bool
    }

    fn coerce(raw: &str, _opts: CoerceOptions) -> Result<Self, CoercionError> {
        match raw {
            "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
            "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
            _ => Err(CoercionError::Boolean),
        }
    }
}

impl Coerce for f64 {
    fn kind() -> CoercionKind {
        CoercionKind::Float(64)
    }

    fn coerce(raw: &str, _opts: CoerceOptions) -> Result<Self, CoercionError> {
        raw.parse::<f64>().map_err(|_| CoercionError::Number)
    }
}

impl Coerce for f32 {
    fn kind() -> CoercionKind {
        CoercionKind::Float(32)
    }

    fn coerce(raw: &str, opts: CoerceOptions) -> Result<Self, CoercionError> {
        f64::coerce(raw, opts).map(|wide| wide as f32)
    }
}

macro_rules! coerce_signed {
    ($($ty:ty),*) => {$(
        impl Coerce for $ty {
            fn kind() -> CoercionKind {
                CoercionKind::Signed(<$ty>::BITS)
            }

            fn coerce(raw: &str, opts: CoerceOptions) -> Result<Self, CoercionError> {
                let wide = raw.parse::<i64>().map_err(|_| CoercionError::Integer)?;
                match opts.narrowing {
                    Narrowing::Wrap => Ok(wide as $ty),
                    Narrowing::Reject => <$ty>::try_from(wide).map_err(|_| CoercionError::Integer),
                }
            }
        }
    )*};
}

macro_rules! coerce_unsigned {
    ($($ty:ty),*) => {$(
        impl Coerce for $ty {
            fn kind() -> CoercionKind {
                CoercionKind::Unsigned(<$ty>::BITS)
            }

            fn coerce(raw: &str, opts: CoerceOptions) -> Result<Self, CoercionError> {
                // Unsigned text carries no sign, not even `+`.
                if raw.starts_with('+') {
                    return Err(CoercionError::UnsignedInteger);
                }
                let wide = raw
                    .parse::<u64>()
                    .map_err(|_| CoercionError::UnsignedInteger)?;
                match opts.narrowing {
                    Narrowing::Wrap => Ok(wide as $ty),
                    Narrowing::Reject => {
                        <$ty>::try_from(wide).map_err(|_| CoercionError::UnsignedInteger)
                    }
                }
            }
        }
    )*};
}

coerce_signed!(i8, i16, i32, i64, isize);
coerce_unsigned!(u8, u16, u32, u64, usize);

impl Coerce for [u8; 16] {
    fn kind() -> CoercionKind {
        CoercionKind::Identifier
    }

    fn coerce(raw: &str, _opts: CoerceOptions) -> Result<Self, CoercionError> {
        parse_uuid(raw)
    }
}

impl Coerce for Uuid {
    fn kind() -> CoercionKind {
        CoercionKind::Identifier
    }

    fn coerce(raw: &str, _opts: CoerceOptions) -> Result<Self, CoercionError> {
        parse_uuid(raw).map(Uuid::from_bytes)
    }
}

/// Collections cannot be bound from a single text value.
impl<T> Coerce for Vec<T> {
    fn kind() -> CoercionKind {
        CoercionKind::Unsupported
    }

    fn coerce(_raw: &str, _opts: CoerceOptions) -> Result<Self, CoercionError> {
        Err(CoercionError::Unsupported)
    }
}

/// Decodes a 16-byte identifier from text.
///
/// Hyphens are removed wherever they appear; the rest must be exactly 32
/// hex digits, decoded pairwise in order.
///
/// # Errors
///
/// Returns [`CoercionError::InvalidUuid`] for a wrong length or a non-hex digit.
///
/// # Examples
///
/// ```
/// use request_binder::parse_uuid;
///
/// let bytes = parse_uuid("00112233-4455-6677-8899-aabbccddeeff").unwrap();
/// assert_eq!(bytes[0], 0x00);
/// assert_eq!(bytes[15], 0xff);
/// assert!(parse_uuid("not-a-uuid").is_err());
/// ```
pub fn parse_uuid(raw: &str) -> Result<[u8; 16], CoercionError> {
    let digits: Vec<u8> = raw.bytes().filter(|b| *b != b'-').collect();
    if digits.len() != 32 {
        return Err(CoercionError::InvalidUuid);
    }

    let mut out = [0u8; 16];
    for (slot, pair) in out.iter_mut().zip(digits.chunks_exact(2)) {
        *slot = (hex_value(pair[0])? << 4) | hex_value(pair[1])?;
    }
    Ok(out)
}

fn hex_value(digit: u8) -> Result<u8, CoercionError> {
    match digit {
        b'0'..=b'9' => Ok(digit - b'0'),
        b'a'..=b'f' => Ok(digit - b'a' + 10),
        b'A'..=b'F' => Ok(digit - b'A' + 10),
        _ => Err(CoercionError::InvalidUuid),
    }
}
