//! Request descriptors and the HTTP attempts built from them
//!
//! Domain request types implement [`ApiRequest`]. The client validates the
//! descriptor, serializes it and produces an [`HttpAttempt`]: plain data that
//! the transport turns into a fresh `reqwest::Request` for every attempt, so
//! retries always resend the same bytes.

use crate::error::{Error, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::{Method, Url};
use serde::Serialize;

/// `Content-Type` for requests carrying a JSON body
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// `Content-Type` sent on GET requests
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";

/// Authorization scheme prefix
pub const AUTH_SCHEME: &str = "GenieKey";

/// SDK name reported in the `User-Agent` header
pub const SDK_NAME: &str = "opsgenie-rust-sdk";

/// A request the client knows how to send
///
/// The descriptor itself is serialized as the JSON body for methods other
/// than GET and DELETE.
pub trait ApiRequest: Serialize {
    /// Reject the request before anything is sent
    fn validate(&self) -> Result<()>;

    /// HTTP method
    fn method(&self) -> Method;

    /// Path appended to the base URL, including the leading slash
    fn endpoint(&self) -> String;
}

/// One fully-built HTTP request, reusable across retries
#[derive(Debug, Clone)]
pub struct HttpAttempt {
    /// HTTP method
    pub method: Method,
    /// Full URL
    pub url: Url,
    /// Request headers
    pub headers: HeaderMap,
    /// JSON body, absent for GET and DELETE
    pub body: Option<Vec<u8>>,
}

impl HttpAttempt {
    /// Materialize a `reqwest::Request` for one attempt
    pub fn to_request(&self) -> reqwest::Request {
        let mut request = reqwest::Request::new(self.method.clone(), self.url.clone());
        *request.headers_mut() = self.headers.clone();
        if let Some(body) = &self.body {
            *request.body_mut() = Some(body.clone().into());
        }
        request
    }
}

/// Compiler that built this crate, e.g. `rustc1.85.0`
pub const RUNTIME_VERSION: &str = env!("OPSGENIE_RUSTC_VERSION");

/// `User-Agent` value for this build: `<sdk> <runtime> (<os>/<arch>)`
pub fn user_agent() -> String {
    format!(
        "{SDK_NAME} {RUNTIME_VERSION} ({}/{})",
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

fn carries_body(method: &Method) -> bool {
    *method != Method::GET && *method != Method::DELETE
}

/// Validate `request` and build the attempt the transport will send
pub fn build_request<R: ApiRequest>(
    request: &R,
    base_url: &str,
    api_key: &str,
    user_agent: &str,
) -> Result<HttpAttempt> {
    request.validate()?;

    let method = request.method();
    if ![Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE].contains(&method) {
        return Err(Error::build(format!("unsupported HTTP method {method}")));
    }

    let body = if carries_body(&method) {
        Some(serde_json::to_vec(request)?)
    } else {
        None
    };

    let raw_url = format!("{base_url}{}", request.endpoint());
    let url = Url::parse(&raw_url).map_err(|e| Error::build(format!("invalid URL {raw_url}: {e}")))?;

    let mut headers = HeaderMap::new();
    if carries_body(&method) {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
    }
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    let mut auth = HeaderValue::from_str(&format!("{AUTH_SCHEME} {api_key}"))
        .map_err(|_| Error::build("API key contains characters not allowed in a header"))?;
    auth.set_sensitive(true);
    headers.insert(AUTHORIZATION, auth);

    let agent = HeaderValue::from_str(user_agent)
        .map_err(|e| Error::build(format!("invalid User-Agent: {e}")))?;
    headers.insert(USER_AGENT, agent);

    if method == Method::GET {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
    }

    Ok(HttpAttempt {
        method,
        url,
        headers,
        body,
    })
}
