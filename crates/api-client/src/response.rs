//! Response receivers, status classification and metadata extraction

use crate::error::{ApiError, Error, Result};
use opsgenie_core::rate_limit::RateLimitState;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Request ID assigned by the service
pub const HEADER_REQUEST_ID: &str = "X-Request-Id";

/// Rate-limit posture, e.g. `NORMAL` or `THROTTLED`
pub const HEADER_RATE_LIMIT_STATE: &str = "X-RateLimit-State";

/// Server processing time
pub const HEADER_RESPONSE_TIME: &str = "X-Response-Time";

/// Error classification on failed responses
pub const HEADER_ERROR_TYPE: &str = "X-Opsgenie-Errortype";

/// A value the client fills from a successful response
///
/// The body is decoded with serde, then the metadata setters are called with
/// the response headers. Types usually embed a [`ResponseMeta`] and delegate
/// to it.
pub trait ApiResponse: DeserializeOwned {
    /// Store the `X-Request-Id` header
    fn set_request_id(&mut self, request_id: String);

    /// Store the `X-Response-Time` header
    fn set_response_time(&mut self, response_time: f32);

    /// Store the `X-RateLimit-State` header
    fn set_rate_limit_state(&mut self, state: String);
}

/// Response metadata taken from headers, never from the body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseMeta {
    /// `X-Request-Id`
    #[serde(skip)]
    pub request_id: String,
    /// `X-Response-Time`
    #[serde(skip)]
    pub response_time: f32,
    /// `X-RateLimit-State`
    #[serde(skip)]
    pub rate_limit_state: String,
}

impl ResponseMeta {
    /// Classified rate-limit state
    pub fn rate_limit(&self) -> RateLimitState {
        RateLimitState::from_header(&self.rate_limit_state)
    }
}

impl ApiResponse for ResponseMeta {
    fn set_request_id(&mut self, request_id: String) {
        self.request_id = request_id;
    }

    fn set_response_time(&mut self, response_time: f32) {
        self.response_time = response_time;
    }

    fn set_rate_limit_state(&mut self, state: String) {
        self.rate_limit_state = state;
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

/// Build the [`ApiError`] for a status of 300 or above, `None` otherwise
pub fn error_from_response(status: u16, headers: &HeaderMap, body: &[u8]) -> Option<ApiError> {
    if status < 300 {
        return None;
    }
    let mut error = ApiError::from_body(body);
    error.status_code = status.to_string();
    error.error_header = header_str(headers, HEADER_ERROR_TYPE).to_string();
    Some(error)
}

/// Copy response metadata headers into `result`
///
/// An absent request ID or rate-limit state is stored as the empty string.
/// The response time is only stored when the header parses as a number.
pub fn set_response_meta<T: ApiResponse>(headers: &HeaderMap, result: &mut T) {
    result.set_request_id(header_str(headers, HEADER_REQUEST_ID).to_string());
    result.set_rate_limit_state(header_str(headers, HEADER_RATE_LIMIT_STATE).to_string());
    if let Ok(response_time) = header_str(headers, HEADER_RESPONSE_TIME).trim().parse::<f32>() {
        result.set_response_time(response_time);
    }
}

/// Decode a success body into `result` and attach metadata
///
/// `result` is replaced by the freshly decoded value, so metadata the body
/// does not carry starts from its default. An unparseable `X-Response-Time`
/// therefore yields the default response time, not the previous one.
/// `result` is left untouched when the body does not decode.
pub fn parse<T: ApiResponse>(headers: &HeaderMap, body: &[u8], result: &mut T) -> Result<()> {
    let mut decoded: T = serde_json::from_slice(body).map_err(|e| Error::Parse(e.to_string()))?;
    set_response_meta(headers, &mut decoded);
    *result = decoded;
    Ok(())
}
