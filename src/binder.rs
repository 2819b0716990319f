//! Multi-source request binding.
//!
//! This module provides:
//! - `Coerce`: text-to-field scalar coercion
//! - `TargetDescriptor` / `Field`: per-type binding metadata
//! - `Binder`: the orchestration that turns one request into a `BindOutcome`
//!
//! A bind never stops at the first bad field. Only an unreadable body or a
//! body that is not a JSON object aborts it.

mod coerce;
mod descriptor;
mod engine;
mod resolve;
mod structure;

pub use coerce::{parse_uuid, Coerce, CoerceOptions, CoercionError, CoercionKind};
pub use descriptor::{Field, JsonShape, JsonType, Source, TargetDescriptor};
pub use engine::{BindOutcome, Bindable, Binder};
