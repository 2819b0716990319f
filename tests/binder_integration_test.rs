//! Integration tests for request binding.
//!
//! These tests drive complete requests through `Binder`, from raw inputs to
//! the bound target, the located error list and the client-facing error.

use std::io::{self, Read};
use std::thread;

use once_cell::sync::Lazy;
use request_binder::{
    BindError, Bindable, Binder, BinderConfig, Field, Location, Narrowing, RequestInputs, Rule,
    RuleViolation, Rules, TargetDescriptor, Validate,
};
use uuid::Uuid;

const SHOP: &str = "123e4567-e89b-12d3-a456-426614174000";
const CHANNELS: &[&str] = &["web", "store"];

#[derive(Debug, Clone, Default, PartialEq)]
struct CreateOrder {
    shop_id: Uuid,
    dry_run: bool,
    channel: String,
    quantity: u16,
    priority: Option<i8>,
    sku: String,
    notes: Option<String>,
    tags: Vec<String>,
    price: f64,
}

impl Bindable for CreateOrder {
    fn descriptor() -> &'static TargetDescriptor<Self> {
        static DESCRIPTOR: Lazy<TargetDescriptor<CreateOrder>> = Lazy::new(|| {
            TargetDescriptor::new()
                .field(Field::new("shopId", |t: &mut CreateOrder| &mut t.shop_id).param("shopId"))
                .field(Field::new("dryRun", |t: &mut CreateOrder| &mut t.dry_run).query("dryRun"))
                .field(
                    Field::new("channel", |t: &mut CreateOrder| &mut t.channel)
                        .header("X-Channel")
                        .form("channel")
                        .query("channel"),
                )
                .field(Field::new("quantity", |t: &mut CreateOrder| &mut t.quantity).form("quantity"))
                .field(
                    Field::new("priority", |t: &mut CreateOrder| &mut t.priority)
                        .header("X-Priority"),
                )
                .field(Field::json("sku", |t: &mut CreateOrder| &mut t.sku))
                .field(Field::json("notes", |t: &mut CreateOrder| &mut t.notes))
                .field(Field::json("tags", |t: &mut CreateOrder| &mut t.tags))
                .field(Field::json("price", |t: &mut CreateOrder| &mut t.price))
        });
        &DESCRIPTOR
    }
}

impl Validate for CreateOrder {
    fn validate(&self) -> Result<(), Vec<RuleViolation>> {
        Rules::new()
            .check("channel", &self.channel, &[Rule::Required, Rule::OneOf(CHANNELS)])
            .check("quantity", &self.quantity, &[Rule::Min(1), Rule::Max(500)])
            .check("sku", &self.sku, &[Rule::Required, Rule::Min(3)])
            .check("tags", &self.tags, &[Rule::Max(3)])
            .check("price", &self.price, &[Rule::Min(0)])
            .finish()
    }
}

struct BrokenPipe;

impl Read for BrokenPipe {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "client hung up"))
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn order_inputs() -> RequestInputs {
    let mut inputs = RequestInputs::new("req-order-001");
    inputs.add_path_param("shopId", SHOP);
    inputs.add_query_param("channel", "web");
    inputs.add_form_field("quantity", "2");
    inputs
}

fn bind(inputs: &RequestInputs, body: &str) -> request_binder::BindOutcome<CreateOrder> {
    init_tracing();
    Binder::default()
        .bind_bytes::<CreateOrder>(inputs, body.as_bytes())
        .expect("bind should not be fatal")
}

#[test]
fn unknown_key_is_reported_and_known_key_binds() {
    let outcome = bind(&RequestInputs::new("req-a"), r#"{"sku":"x","extra":1}"#);

    assert_eq!(outcome.target.sku, "x");
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].location(), &Location::Field("extra".to_string()));
    assert_eq!(outcome.errors[0].message(), "unknown field");
}

#[test]
fn type_mismatch_leaves_field_default() {
    let outcome = bind(&RequestInputs::new("req-b"), r#"{"price":"cheap"}"#);

    assert_eq!(outcome.target.price, 0.0);
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].location(), &Location::Field("price".to_string()));
    assert_eq!(outcome.errors[0].message(), "expected number but got string");
}

#[test]
fn bad_path_identifier_is_located_on_param() {
    let mut inputs = RequestInputs::new("req-c");
    inputs.add_path_param("shopId", "not-a-uuid");

    let outcome = bind(&inputs, "");

    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].location(), &Location::Param("shopid".to_string()));
    assert_eq!(outcome.errors[0].message(), "invalid UUID format");
    assert!(outcome.target.shop_id.is_nil());
}

#[test]
fn empty_request_binds_nothing() {
    let outcome = bind(&RequestInputs::new("req-d"), "");

    assert!(outcome.is_clean());
    assert_eq!(outcome.target, CreateOrder::default());
}

#[test]
fn malformed_body_is_fatal() {
    init_tracing();
    let binder = Binder::default();

    let result = binder.bind_bytes::<CreateOrder>(&order_inputs(), br#"{"a":"#);
    assert!(matches!(result, Err(BindError::MalformedJson(_))));

    let err = binder
        .bind_and_validate::<CreateOrder, _>(&order_inputs(), &br#"{"a":"#[..])
        .unwrap_err();
    assert_eq!(err.status, 400);
    assert_eq!(err.code, "BAD_REQUEST");
    assert!(err.message.starts_with("invalid JSON: "));
    assert!(err.errors.is_empty());
}

#[test]
fn unreadable_body_is_a_bad_request() {
    init_tracing();
    let err = Binder::default()
        .bind_and_validate::<CreateOrder, _>(&order_inputs(), BrokenPipe)
        .unwrap_err();

    assert_eq!(err.status, 400);
    assert_eq!(err.message, "failed to read request body");
}

#[test]
fn full_request_binds_every_source() {
    let mut inputs = order_inputs();
    inputs.add_query_param("dryRun", "T");
    inputs.add_header("x-priority", "-3");

    let outcome = bind(
        &inputs,
        r#"{"sku":"SKU-1","notes":"gift wrap","tags":["a","b"],"price":9.5}"#,
    );

    assert!(outcome.is_clean(), "unexpected errors: {:?}", outcome.errors);
    let order = outcome.target;
    assert_eq!(order.shop_id, Uuid::parse_str(SHOP).unwrap());
    assert!(order.dry_run);
    assert_eq!(order.channel, "web");
    assert_eq!(order.quantity, 2);
    assert_eq!(order.priority, Some(-3));
    assert_eq!(order.sku, "SKU-1");
    assert_eq!(order.notes.as_deref(), Some("gift wrap"));
    assert_eq!(order.tags, vec!["a", "b"]);
    assert_eq!(order.price, 9.5);
}

#[test]
fn sources_resolve_in_fixed_priority() {
    let mut inputs = RequestInputs::new("req-priority");
    inputs.add_header("X-Channel", "header");
    inputs.add_form_field("channel", "form");
    inputs.add_query_param("channel", "query");
    assert_eq!(bind(&inputs, "").target.channel, "query");

    let mut inputs = RequestInputs::new("req-priority");
    inputs.add_header("X-Channel", "header");
    inputs.add_form_field("channel", "form");
    assert_eq!(bind(&inputs, "").target.channel, "form");

    let mut inputs = RequestInputs::new("req-priority");
    inputs.add_header("X-Channel", "header");
    assert_eq!(bind(&inputs, "").target.channel, "header");
}

#[test]
fn empty_values_fall_through_to_next_source() {
    let mut inputs = RequestInputs::new("req-empty");
    inputs.add_query_param("channel", "");
    inputs.add_header("X-Channel", "store");

    assert_eq!(bind(&inputs, "").target.channel, "store");
}

#[test]
fn undeclared_sources_are_never_consulted() {
    let mut inputs = RequestInputs::new("req-undeclared");
    inputs.add_query_param("X-Priority", "4");
    inputs.add_form_field("dryRun", "true");

    let outcome = bind(&inputs, "");

    assert!(outcome.is_clean());
    assert_eq!(outcome.target.priority, None);
    assert!(!outcome.target.dry_run);
}

#[test]
fn every_independent_failure_is_reported_in_order() {
    let mut inputs = RequestInputs::new("req-many");
    inputs.add_path_param("shopId", "xyz");
    inputs.add_query_param("dryRun", "maybe");
    inputs.add_form_field("quantity", "-1");
    inputs.add_header("X-Priority", "high");

    let outcome = bind(&inputs, r#"{"colour":"red","tags":"a,b","sku":"ok-sku"}"#);
    let errors: Vec<(Location, &str)> = outcome
        .errors
        .iter()
        .map(|e| (e.location().clone(), e.message()))
        .collect();

    assert_eq!(
        errors,
        vec![
            (Location::Param("shopid".to_string()), "invalid UUID format"),
            (Location::Query("dryrun".to_string()), "must be a valid boolean"),
            (Location::Form("quantity".to_string()), "must be a valid unsigned integer"),
            (Location::Header("priority".to_string()), "must be a valid integer"),
            (Location::Field("colour".to_string()), "unknown field"),
            (Location::Field("tags".to_string()), "expected array but got string"),
        ]
    );
    assert_eq!(outcome.target.sku, "ok-sku");
    assert_eq!(outcome.target.priority, None);
}

#[test]
fn rule_violations_follow_binding_errors() {
    init_tracing();
    let mut inputs = RequestInputs::new("req-rules");
    inputs.add_query_param("channel", "web");
    inputs.add_form_field("quantity", "lots");

    let err = Binder::default()
        .bind_and_validate::<CreateOrder, _>(&inputs, &br#"{"tags":["a","b","c","d"]}"#[..])
        .unwrap_err();

    assert_eq!(err.status, 422);
    assert_eq!(err.code, "UNPROCESSABLE_ENTITY");
    assert_eq!(err.message, "Validation failed");

    let errors: Vec<(Location, &str)> = err
        .errors
        .iter()
        .map(|e| (e.location().clone(), e.message()))
        .collect();
    // `quantity` stays 0 and would fail `min`, but its binding error wins.
    assert_eq!(
        errors,
        vec![
            (Location::Form("quantity".to_string()), "must be a valid unsigned integer"),
            (Location::Field("sku".to_string()), "is required"),
            (Location::Field("tags".to_string()), "must not exceed 3"),
        ]
    );
}

#[test]
fn rule_violations_use_the_first_declared_source() {
    init_tracing();
    let mut inputs = RequestInputs::new("req-query");
    inputs.add_query_param("channel", "phone");
    inputs.add_form_field("quantity", "1");

    let mut inputs_by_header = RequestInputs::new("req-header");
    inputs_by_header.add_header("X-Channel", "fax");
    inputs_by_header.add_form_field("quantity", "1");

    for inputs in [inputs, inputs_by_header] {
        let err = Binder::default()
            .bind_and_validate::<CreateOrder, _>(&inputs, &br#"{"sku":"abc"}"#[..])
            .unwrap_err();

        assert_eq!(err.errors.len(), 1);
        assert_eq!(err.errors[0].location(), &Location::Query("channel".to_string()));
        assert_eq!(err.errors[0].message(), "must be one of: web store");
    }
}

#[test]
fn clean_request_passes_validation() {
    init_tracing();
    let order = Binder::default()
        .bind_and_validate::<CreateOrder, _>(&order_inputs(), &br#"{"sku":"abc","price":1}"#[..])
        .expect("valid order");

    assert_eq!(order.quantity, 2);
    assert_eq!(order.price, 1.0);
}

#[test]
fn configured_failure_message_is_used() {
    init_tracing();
    let binder = Binder::new(BinderConfig {
        failure_message: "Order rejected".to_string(),
        ..BinderConfig::default()
    });

    let err = binder
        .bind_and_validate::<CreateOrder, _>(&order_inputs(), &b""[..])
        .unwrap_err();

    assert_eq!(err.message, "Order rejected");
    assert_eq!(err.errors[0].message(), "is required");
}

#[test]
fn narrowing_policy_comes_from_configuration() {
    let mut inputs = RequestInputs::new("req-narrow");
    inputs.add_header("X-Priority", "200");

    assert_eq!(bind(&inputs, "").target.priority, Some(-56));

    let config: BinderConfig =
        serde_json::from_str(r#"{"integer_narrowing":"reject"}"#).expect("valid config");
    assert_eq!(config.integer_narrowing, Narrowing::Reject);

    let outcome = Binder::new(config)
        .bind_bytes::<CreateOrder>(&inputs, b"")
        .expect("bind should not be fatal");
    assert_eq!(outcome.target.priority, None);
    assert_eq!(outcome.errors[0].location(), &Location::Header("priority".to_string()));
    assert_eq!(outcome.errors[0].message(), "must be a valid integer");
}

#[test]
fn inputs_from_http_request_head() {
    let request = http::Request::builder()
        .uri("https://shop.example/orders?dryRun=1&channel=store&channel=web")
        .header("X-Priority", "7")
        .body(())
        .expect("valid request");
    let (parts, ()) = request.into_parts();

    let mut inputs = RequestInputs::from_http_parts("req-http", &parts);
    inputs.add_path_param("shopId", SHOP);
    inputs.with_form_body("quantity=12");

    let outcome = bind(&inputs, "");

    assert!(outcome.is_clean());
    assert!(outcome.target.dry_run);
    assert_eq!(outcome.target.channel, "store");
    assert_eq!(outcome.target.priority, Some(7));
    assert_eq!(outcome.target.quantity, 12);
}

#[test]
fn located_errors_serialize_with_one_selector() {
    let mut inputs = RequestInputs::new("req-json");
    inputs.add_query_param("dryRun", "nah");

    let outcome = bind(&inputs, r#"{"bogus":null}"#);

    assert_eq!(
        serde_json::to_value(&outcome.errors).expect("serializes"),
        serde_json::json!([
            {"query": "dryrun", "error": "must be a valid boolean"},
            {"field": "bogus", "error": "unknown field"},
        ])
    );
}

#[test]
fn concurrent_binds_share_one_descriptor() {
    init_tracing();
    let binder = Binder::default();
    let requests: Vec<(RequestInputs, String)> = (0..16)
        .map(|i| {
            let mut inputs = RequestInputs::new(format!("req-{i}"));
            inputs.add_form_field("quantity", i.to_string());
            if i % 3 == 0 {
                inputs.add_query_param("dryRun", "sometimes");
            }
            (inputs, format!(r#"{{"sku":"sku-{i}","extra{i}":true}}"#))
        })
        .collect();

    let sequential: Vec<_> = requests
        .iter()
        .map(|(inputs, body)| binder.bind_bytes::<CreateOrder>(inputs, body.as_bytes()).unwrap())
        .collect();

    let concurrent: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = requests
            .iter()
            .map(|(inputs, body)| {
                let binder = &binder;
                scope.spawn(move || binder.bind_bytes::<CreateOrder>(inputs, body.as_bytes()).unwrap())
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(sequential, concurrent);
    for (i, outcome) in concurrent.iter().enumerate() {
        assert_eq!(outcome.target.quantity, i as u16);
        assert_eq!(outcome.errors.len(), if i % 3 == 0 { 2 } else { 1 });
    }
}

#[derive(Debug, Default)]
struct SearchOrders {
    statuses: Vec<String>,
    limit: u8,
}

impl Bindable for SearchOrders {
    fn descriptor() -> &'static TargetDescriptor<Self> {
        static DESCRIPTOR: Lazy<TargetDescriptor<SearchOrders>> = Lazy::new(|| {
            TargetDescriptor::new()
                .field(Field::new("statuses", |t: &mut SearchOrders| &mut t.statuses).query("status"))
                .field(Field::new("limit", |t: &mut SearchOrders| &mut t.limit).query("limit"))
        });
        &DESCRIPTOR
    }
}

#[test]
fn collection_fields_cannot_bind_from_text() {
    init_tracing();
    let mut inputs = RequestInputs::new("req-search");
    inputs.with_query_string("status=open,closed&limit=20");

    let outcome = Binder::default()
        .bind_bytes::<SearchOrders>(&inputs, b"")
        .expect("bind should not be fatal");

    assert!(outcome.target.statuses.is_empty());
    assert_eq!(outcome.target.limit, 20);
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].location(), &Location::Query("statuses".to_string()));
    assert_eq!(outcome.errors[0].message(), "unsupported type for binding");
}

#[test]
fn null_body_is_not_malformed() {
    init_tracing();
    let err = Binder::default()
        .bind_and_validate::<CreateOrder, _>(&order_inputs(), &b"null"[..])
        .unwrap_err();

    // Binding succeeds; only the missing `sku` rule fails.
    assert_eq!(err.status, 422);
    assert_eq!(err.errors.len(), 1);
    assert_eq!(err.errors[0].location(), &Location::Field("sku".to_string()));

    let result = Binder::default().bind_bytes::<CreateOrder>(&order_inputs(), b"[]");
    assert!(matches!(result, Err(BindError::MalformedJson(_))));
}
