//! Shared fixtures and proptest strategies for unit tests.

use std::io::{self, Read};

use once_cell::sync::Lazy;
use proptest::prelude::*;
use uuid::Uuid;

use crate::binder::{Bindable, Field, TargetDescriptor};
use crate::rules::{Rule, RuleViolation, Rules, Validate};

/// A target covering every source and the common field kinds.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Probe {
    pub id: Uuid,
    pub page: u32,
    pub limit: u8,
    pub verbose: bool,
    pub name: String,
    pub age: i32,
    pub nickname: Option<String>,
}

impl Bindable for Probe {
    fn descriptor() -> &'static TargetDescriptor<Self> {
        static DESCRIPTOR: Lazy<TargetDescriptor<Probe>> = Lazy::new(|| {
            TargetDescriptor::new()
                .field(Field::new("id", |t: &mut Probe| &mut t.id).param("id"))
                .field(
                    Field::new("page", |t: &mut Probe| &mut t.page)
                        .query("page")
                        .header("X-Page"),
                )
                .field(Field::new("limit", |t: &mut Probe| &mut t.limit).query("limit"))
                .field(Field::new("verbose", |t: &mut Probe| &mut t.verbose).header("X-Verbose"))
                .field(Field::json("name", |t: &mut Probe| &mut t.name))
                .field(Field::json("age", |t: &mut Probe| &mut t.age))
                .field(Field::json("nickname", |t: &mut Probe| &mut t.nickname))
        });
        &DESCRIPTOR
    }
}

impl Validate for Probe {
    fn validate(&self) -> Result<(), Vec<RuleViolation>> {
        Rules::new()
            .check("page", &self.page, &[Rule::Max(100)])
            .check("name", &self.name, &[Rule::Required, Rule::Min(2)])
            .check("age", &self.age, &[Rule::Min(0)])
            .finish()
    }
}

/// A body whose read always fails.
pub(crate) struct FailingReader;

impl Read for FailingReader {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::ConnectionReset, "peer went away"))
    }
}

/// Text that no integer parser accepts.
pub(crate) fn arb_non_integer() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z_.][a-zA-Z0-9_.]{0,12}").unwrap()
}

/// A UUID rendered with hyphens in canonical positions.
pub(crate) fn arb_uuid_text() -> impl Strategy<Value = (String, [u8; 16])> {
    any::<[u8; 16]>().prop_map(|bytes| (Uuid::from_bytes(bytes).hyphenated().to_string(), bytes))
}
