//! Request binding demonstration.
//!
//! This example walks one handler through the binding flow:
//! 1. Collect path, query and header inputs from an HTTP request head
//! 2. Bind them and the JSON body into a typed target
//! 3. Run rule validation on the bound value
//! 4. Render the client-facing error body
//!
//! Run with: `cargo run --example bind_request`

use once_cell::sync::Lazy;
use request_binder::{
    Bindable, Binder, Field, HttpError, RequestInputs, Rule, RuleViolation, Rules,
    TargetDescriptor, Validate,
};

#[derive(Debug, Default)]
struct UpdateProfile {
    user_id: uuid::Uuid,
    notify: bool,
    locale: String,
    email: String,
    phone: Option<String>,
}

impl Bindable for UpdateProfile {
    fn descriptor() -> &'static TargetDescriptor<Self> {
        static DESCRIPTOR: Lazy<TargetDescriptor<UpdateProfile>> = Lazy::new(|| {
            TargetDescriptor::new()
                .field(Field::new("userId", |t: &mut UpdateProfile| &mut t.user_id).param("userId"))
                .field(Field::new("notify", |t: &mut UpdateProfile| &mut t.notify).query("notify"))
                .field(
                    Field::new("locale", |t: &mut UpdateProfile| &mut t.locale)
                        .query("locale")
                        .header("Accept-Language"),
                )
                .field(Field::json("email", |t: &mut UpdateProfile| &mut t.email))
                .field(Field::json("phone", |t: &mut UpdateProfile| &mut t.phone))
        });
        &DESCRIPTOR
    }
}

impl Validate for UpdateProfile {
    fn validate(&self) -> Result<(), Vec<RuleViolation>> {
        Rules::new()
            .check("email", &self.email, &[Rule::Required, Rule::Email])
            .check("phone", &self.phone, &[Rule::E164])
            .finish()
    }
}

/// Simulates a router handing a request head and body to a handler
fn handle(
    uri: &str,
    user_id: &str,
    body: &str,
) -> Result<UpdateProfile, HttpError> {
    println!("\n=== Processing PATCH {uri} ===");

    // Step 1: Collect inputs
    let request = http::Request::builder()
        .method("PATCH")
        .uri(uri)
        .header("Accept-Language", "en-GB")
        .body(())
        .map_err(|err| HttpError::bad_request(err.to_string()))?;
    let (parts, ()) = request.into_parts();

    let mut inputs = RequestInputs::from_http_parts("req-demo-001", &parts);
    inputs.add_path_param("userId", user_id);
    println!("1. Collected inputs for {}", inputs.request_id());

    // Steps 2 and 3: Bind and validate
    let profile = Binder::default().bind_and_validate::<UpdateProfile, _>(&inputs, body.as_bytes())?;
    println!("2. ✓ Bound and validated");
    Ok(profile)
}

fn main() {
    println!("=== Request Binding Example ===");

    // Scenario 1: Valid request
    match handle(
        "/users/123e4567-e89b-12d3-a456-426614174000?notify=true",
        "123e4567-e89b-12d3-a456-426614174000",
        r#"{"email": "ada@example.com", "phone": "+442071838750"}"#,
    ) {
        Ok(profile) => println!(
            "   user={} notify={} locale={} email={} phone={:?}",
            profile.user_id, profile.notify, profile.locale, profile.email, profile.phone
        ),
        Err(err) => println!("   Unexpected error: {err}"),
    }

    // Scenario 2: Every field-level problem reported at once
    match handle(
        "/users/abc?notify=perhaps",
        "abc",
        r#"{"email": "ada", "nickname": "countess", "phone": 442071838750}"#,
    ) {
        Ok(profile) => println!("   Unexpected success: {profile:?}"),
        Err(err) => render(&err),
    }

    // Scenario 3: Malformed body aborts the bind
    match handle("/users/abc", "abc", r#"{"email": "#) {
        Ok(profile) => println!("   Unexpected success: {profile:?}"),
        Err(err) => render(&err),
    }

    println!("\n=== Example Complete ===");
}

/// Step 4: Render the error body a client would receive
fn render(err: &HttpError) {
    println!("   ✗ {} {}", err.status, err.code);
    match serde_json::to_string_pretty(err) {
        Ok(body) => println!("{body}"),
        Err(ser) => eprintln!("   failed to render error: {ser}"),
    }
}
