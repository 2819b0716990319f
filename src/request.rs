//! Raw request inputs handed to the binder by the HTTP layer.

use std::collections::HashMap;

use crate::binder::Source;

/// Framework-agnostic snapshot of a request's non-body inputs.
///
/// `RequestInputs` is the integration point between a web framework and the
/// binder. Framework code fills it from its own request type; the body is
/// passed to [`Binder::bind`](crate::Binder::bind) separately so it is read
/// exactly once.
///
/// Repeated query keys, form keys and headers keep their first value.
/// Header names are matched case-insensitively.
///
/// # Examples
///
/// ```
/// use request_binder::RequestInputs;
///
/// let mut inputs = RequestInputs::new("req-12345");
/// inputs.add_path_param("id", "42");
/// inputs.with_query_string("page=2&page=3&sort=name");
/// inputs.add_header("X-Tenant", "acme");
///
/// assert_eq!(inputs.query_param("page"), Some("2"));
/// assert_eq!(inputs.header("x-tenant"), Some("acme"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestInputs {
    request_id: String,
    path_params: HashMap<String, String>,
    query_params: HashMap<String, String>,
    form_fields: HashMap<String, String>,
    headers: HashMap<String, String>,
}

impl RequestInputs {
    /// Creates empty inputs for the given request id.
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            ..Self::default()
        }
    }

    /// Copies headers and the URI query string out of an `http` request head.
    ///
    /// Path parameters are not part of the request head; the router supplies
    /// them through [`add_path_param`](Self::add_path_param). Header values
    /// that are not visible ASCII are skipped.
    pub fn from_http_parts(request_id: impl Into<String>, parts: &http::request::Parts) -> Self {
        let mut inputs = Self::new(request_id);
        for (name, value) in &parts.headers {
            if let Ok(value) = value.to_str() {
                inputs.add_header(name.as_str(), value);
            }
        }
        if let Some(query) = parts.uri.query() {
            inputs.with_query_string(query);
        }
        inputs
    }

    /// Returns the request id used to tag log events.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Adds a path parameter captured by the router.
    pub fn add_path_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.path_params.insert(name.into(), value.into());
    }

    /// Adds a query parameter. A repeated key keeps its first value.
    pub fn add_query_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.query_params
            .entry(name.into())
            .or_insert_with(|| value.into());
    }

    /// Adds a form field. A repeated key keeps its first value.
    pub fn add_form_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.form_fields
            .entry(name.into())
            .or_insert_with(|| value.into());
    }

    /// Adds a header. Names are case-insensitive and the first value wins.
    pub fn add_header(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.headers
            .entry(name.as_ref().to_ascii_lowercase())
            .or_insert_with(|| value.into());
    }

    /// Parses an `application/x-www-form-urlencoded` query string.
    pub fn with_query_string(&mut self, query: &str) -> &mut Self {
        for (name, value) in url::form_urlencoded::parse(query.as_bytes()) {
            self.add_query_param(name, value);
        }
        self
    }

    /// Parses an `application/x-www-form-urlencoded` form body.
    pub fn with_form_body(&mut self, body: &str) -> &mut Self {
        for (name, value) in url::form_urlencoded::parse(body.as_bytes()) {
            self.add_form_field(name, value);
        }
        self
    }

    /// Returns a path parameter.
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }

    /// Returns the first value of a query parameter.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(String::as_str)
    }

    /// Returns the first value of a form field.
    pub fn form_field(&self, name: &str) -> Option<&str> {
        self.form_fields.get(name).map(String::as_str)
    }

    /// Returns the first value of a header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Looks a tag up in one source. The JSON body is not a lookup source.
    pub(crate) fn lookup(&self, source: Source, tag: &str) -> Option<&str> {
        match source {
            Source::Param => self.path_param(tag),
            Source::Query => self.query_param(tag),
            Source::Form => self.form_field(tag),
            Source::Header => self.header(tag),
            Source::Json => None,
        }
    }
}
