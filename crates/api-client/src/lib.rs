//! OpsGenie REST API client core
//!
//! This crate drives typed requests against the OpsGenie REST API. Domain
//! request and response types plug in through two small traits; the client
//! takes care of everything between them.
//!
//! # Features
//!
//! - **Region selection**: Default (US) or EU base URL
//! - **Retry with exponential backoff**: Transient failures and 429s are retried
//! - **Pluggable hooks**: Custom retry policy and backoff, as traits or plain functions
//! - **Cancellation**: Per-call deadline and cancellation token
//! - **Response metadata**: Request ID, response time and rate-limit state
//! - **Structured errors**: Every status of 300 or above becomes an [`ApiError`]
//!
//! # Example
//!
//! ```rust,no_run
//! use opsgenie_api_client::prelude::*;
//! use reqwest::Method;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize)]
//! struct GetHeartbeat {
//!     #[serde(skip)]
//!     name: String,
//! }
//!
//! impl ApiRequest for GetHeartbeat {
//!     fn validate(&self) -> Result<()> {
//!         Ok(Validator::new().required("name", &self.name).into_result()?)
//!     }
//!
//!     fn method(&self) -> Method {
//!         Method::GET
//!     }
//!
//!     fn endpoint(&self) -> String {
//!         format!("/v2/heartbeats/{}", self.name)
//!     }
//! }
//!
//! #[derive(Debug, Default, Deserialize)]
//! struct Heartbeat {
//!     data: serde_json::Value,
//!     #[serde(skip)]
//!     meta: ResponseMeta,
//! }
//!
//! impl ApiResponse for Heartbeat {
//!     fn set_request_id(&mut self, request_id: String) {
//!         self.meta.set_request_id(request_id);
//!     }
//!
//!     fn set_response_time(&mut self, response_time: f32) {
//!         self.meta.set_response_time(response_time);
//!     }
//!
//!     fn set_rate_limit_state(&mut self, state: String) {
//!         self.meta.set_rate_limit_state(state);
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = OpsGenieClient::new(Config::new("api-key").with_api_url(API_URL_EU))?;
//!
//!     let mut heartbeat = Heartbeat::default();
//!     let request = GetHeartbeat { name: "nightly".to_string() };
//!     client.exec(&RequestContext::background(), &request, &mut heartbeat).await?;
//!
//!     println!("{} ({})", heartbeat.data, heartbeat.meta.request_id);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod request;
pub mod response;
pub mod transport;

pub use client::OpsGenieClient;
pub use config::{ApiUrl, Config, API_URL, API_URL_EU};
pub use context::{ContextError, RequestContext};
pub use error::{ApiError, Error, Result};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::client::OpsGenieClient;
    pub use crate::config::{ApiUrl, Config, API_URL, API_URL_EU};
    pub use crate::context::{ContextError, RequestContext};
    pub use crate::error::{ApiError, Error, Result};
    pub use crate::logging::{init_tracing, LogSink, TracingSink};
    pub use crate::request::{ApiRequest, HttpAttempt};
    pub use crate::response::{ApiResponse, ResponseMeta};
    pub use crate::transport::{
        AttemptOutcome, Backoff, DefaultRetryPolicy, ExponentialBackoff, RetryDecision,
        RetryPolicy,
    };
    pub use opsgenie_core::rate_limit::RateLimitState;
    pub use opsgenie_core::validation::Validator;
}
