//! Main API client implementation

use crate::config::Config;
use crate::context::RequestContext;
use crate::error::{Error, Result};
use crate::logging::{parse_level, redact, LogSink, Logger, TracingSink, DEFAULT_LOG_LEVEL};
use crate::request::{build_request, user_agent, ApiRequest};
use crate::response::{error_from_response, parse, ApiResponse};
use crate::transport::RetryTransport;
use std::sync::Arc;
use tracing::instrument;
use tracing::level_filters::LevelFilter;
use uuid::Uuid;

/// OpsGenie API client
///
/// Cloning is cheap; clones share the HTTP connection pool and settings.
/// Every call goes through [`exec`](Self::exec):
/// - Request validation before anything is sent
/// - Retries with exponential backoff for transient failures
/// - Cancellation and deadlines through [`RequestContext`]
/// - Response metadata (request ID, response time, rate-limit state)
#[derive(Clone, Debug)]
pub struct OpsGenieClient {
    transport: RetryTransport,
    config: Arc<Config>,
    base_url: Arc<str>,
    user_agent: Arc<str>,
    logger: Logger,
}

impl OpsGenieClient {
    /// Create a client from `config`
    ///
    /// Fails when the API key is blank or the proxy URL does not parse.
    pub fn new(mut config: Config) -> Result<Self> {
        config.validate()?;

        let requested = config.log_level.trim().to_string();
        let (level, level_name) = parse_level(&requested).unwrap_or((LevelFilter::INFO, DEFAULT_LOG_LEVEL));
        config.log_level = level_name.to_string();

        let sink = config
            .log_sink
            .clone()
            .unwrap_or_else(|| Arc::new(TracingSink) as Arc<dyn LogSink>);
        let logger = Logger::new(level, sink);
        if !requested.is_empty() && parse_level(&requested).is_none() {
            logger.warn(&format!(
                "Error occurred: not a valid log level: \"{requested}\". Setting log level as info"
            ));
        }

        let http = Self::http_client(&config, &logger)?;

        let mut transport = RetryTransport::new(http, logger.clone())
            .with_retry_max(config.effective_retry_count())
            .with_wait_bounds(config.retry_wait_min, config.retry_wait_max);
        if let Some(policy) = &config.retry_policy {
            transport = transport.with_policy(Arc::clone(policy));
        }
        if let Some(backoff) = &config.backoff {
            transport = transport.with_backoff(Arc::clone(backoff));
        }

        let base_url = config.api_url.base_url();
        logger.info(&format!(
            "Client is configured with ApiKey: {}, ApiUrl: {}, ProxyUrl: {}, LogLevel: {}, RetryMaxCount: {}",
            redact(&config.api_key),
            base_url,
            config.proxy_url.as_deref().unwrap_or_default(),
            config.log_level,
            transport.retry_max()
        ));

        Ok(Self {
            transport,
            config: Arc::new(config),
            base_url: Arc::from(base_url),
            user_agent: Arc::from(user_agent()),
            logger,
        })
    }

    /// Create a client from `OPSGENIE_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(Config::from_env()?)
    }

    fn http_client(config: &Config, logger: &Logger) -> Result<reqwest::Client> {
        let proxy = config.proxy()?;

        if let Some(client) = &config.http_client {
            if proxy.is_none() {
                return Ok(client.clone());
            }
            logger.warn("Proxy URL is set, replacing the supplied HTTP client with a proxied one");
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(proxy) = proxy {
            builder = builder.proxy(proxy);
        }
        builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {e}")))
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = Arc::from(base_url);
        self
    }

    /// Configuration in effect, with the resolved log level name
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Base URL every endpoint is appended to
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `User-Agent` sent with every request
    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Retries allowed after the first attempt
    #[must_use]
    pub fn retry_max(&self) -> u32 {
        self.transport.retry_max()
    }

    /// Send `request` and decode the response into `result`
    ///
    /// On success `result` holds the decoded body plus response metadata. On
    /// any failure `result` is left as it was and the error is returned
    /// unchanged after being logged.
    #[instrument(skip_all, fields(call_id = %Uuid::new_v4(), endpoint = %request.endpoint()))]
    pub async fn exec<Req, Res>(
        &self,
        ctx: &RequestContext,
        request: &Req,
        result: &mut Res,
    ) -> Result<()>
    where
        Req: ApiRequest,
        Res: ApiResponse,
    {
        self.logger
            .debug(&format!("Starting to process request to {}", request.endpoint()));

        let outcome = self.execute(ctx, request, result).await;
        match &outcome {
            Ok(()) => self.logger.debug("Request processed"),
            Err(err @ Error::Validation(_)) => {
                self.logger.error(&format!("Request validation err: {err}"));
            }
            Err(err @ (Error::Build(_) | Error::Json(_))) => {
                self.logger.error(&format!("Could not create request: {err}"));
            }
            Err(err) => self.logger.error(&err.to_string()),
        }
        outcome
    }

    async fn execute<Req, Res>(
        &self,
        ctx: &RequestContext,
        request: &Req,
        result: &mut Res,
    ) -> Result<()>
    where
        Req: ApiRequest,
        Res: ApiResponse,
    {
        let attempt = build_request(request, &self.base_url, &self.config.api_key, &self.user_agent)?;

        let response = self.transport.execute(ctx, &attempt).await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();

        let body = tokio::select! {
            biased;
            err = ctx.done() => return Err(err.into()),
            body = response.bytes() => body,
        };

        let error_body = body.as_deref().unwrap_or_default();
        if let Some(api_error) = error_from_response(status, &headers, error_body) {
            return Err(api_error.into());
        }

        parse(&headers, &body?, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{API_URL, API_URL_EU};
    use crate::context::ContextError;
    use crate::response::ResponseMeta;
    use crate::transport::{AttemptOutcome, RetryDecision};
    use opsgenie_core::validation::Validator;
    use reqwest::Method;
    use serde::{Deserialize, Serialize};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;
    use tracing::Level;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const API_KEY: &str = "a871eb83-2d00-4b09-9fb9-7c134a369082";

    #[derive(Serialize)]
    struct GetHeartbeat {
        #[serde(skip)]
        name: String,
    }

    impl ApiRequest for GetHeartbeat {
        fn validate(&self) -> Result<()> {
            Ok(Validator::new().required("name", &self.name).into_result()?)
        }

        fn method(&self) -> Method {
            Method::GET
        }

        fn endpoint(&self) -> String {
            format!("/v2/heartbeats/{}", self.name)
        }
    }

    #[derive(Serialize)]
    struct AddHeartbeat {
        name: String,
        interval: u32,
    }

    impl ApiRequest for AddHeartbeat {
        fn validate(&self) -> Result<()> {
            if self.interval == 0 {
                return Err(Error::validation("Invalid request: interval must be positive"));
            }
            Ok(())
        }

        fn method(&self) -> Method {
            Method::POST
        }

        fn endpoint(&self) -> String {
            "/v2/heartbeats".to_string()
        }
    }

    #[derive(Serialize)]
    struct DeleteHeartbeat {
        #[serde(skip)]
        name: String,
    }

    impl ApiRequest for DeleteHeartbeat {
        fn validate(&self) -> Result<()> {
            Ok(())
        }

        fn method(&self) -> Method {
            Method::DELETE
        }

        fn endpoint(&self) -> String {
            format!("/v2/heartbeats/{}", self.name)
        }
    }

    #[derive(Debug, Default, Deserialize)]
    struct HeartbeatResult {
        data: HeartbeatData,
        #[serde(skip)]
        meta: ResponseMeta,
    }

    #[derive(Debug, Default, Deserialize)]
    struct HeartbeatData {
        name: String,
    }

    impl ApiResponse for HeartbeatResult {
        fn set_request_id(&mut self, request_id: String) {
            self.meta.set_request_id(request_id);
        }

        fn set_response_time(&mut self, response_time: f32) {
            self.meta.set_response_time(response_time);
        }

        fn set_rate_limit_state(&mut self, state: String) {
            self.meta.set_rate_limit_state(state);
        }
    }

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<(Level, String)>>>);

    impl LogSink for Recorder {
        fn log(&self, level: Level, message: &str) {
            self.0.lock().unwrap().push((level, message.to_string()));
        }
    }

    impl Recorder {
        fn lines(&self) -> Vec<(Level, String)> {
            self.0.lock().unwrap().clone()
        }
    }

    fn nightly() -> GetHeartbeat {
        GetHeartbeat {
            name: "nightly".to_string(),
        }
    }

    fn fast_config() -> Config {
        Config::new(API_KEY)
            .with_log_level("off")
            .with_retry_wait(Duration::from_millis(1), Duration::from_millis(5))
    }

    fn client_for(server: &MockServer, config: Config) -> OpsGenieClient {
        OpsGenieClient::new(config).unwrap().with_base_url(&server.uri())
    }

    fn heartbeat_body() -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_string(r#"{"data":{"name":"X"}}"#)
    }

    async fn request_count(server: &MockServer) -> usize {
        server.received_requests().await.unwrap().len()
    }

    #[tokio::test]
    async fn test_happy_get_populates_result_and_metadata() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/heartbeats/nightly"))
            .and(header("Authorization", format!("GenieKey {API_KEY}").as_str()))
            .and(header("Accept", "application/json"))
            .and(header("Content-Type", "application/x-www-form-urlencoded; charset=UTF-8"))
            .respond_with(
                heartbeat_body()
                    .insert_header("X-Request-Id", "rid-1")
                    .insert_header("X-RateLimit-State", "NORMAL")
                    .insert_header("X-Response-Time", "12.5"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, fast_config());
        let mut result = HeartbeatResult::default();
        client
            .exec(&RequestContext::background(), &nightly(), &mut result)
            .await
            .unwrap();

        assert_eq!(result.data.name, "X");
        assert_eq!(result.meta.request_id, "rid-1");
        assert!((result.meta.response_time - 12.5).abs() < f32::EPSILON);
        assert_eq!(result.meta.rate_limit_state, "NORMAL");

        let requests = server.received_requests().await.unwrap();
        let agent = requests[0].headers.get("user-agent").unwrap().to_str().unwrap();
        assert_eq!(agent, client.user_agent());
        assert!(requests[0].body.is_empty());
    }

    #[tokio::test]
    async fn test_transient_server_error_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(heartbeat_body().insert_header("X-Request-Id", "second"))
            .mount(&server)
            .await;

        let client = client_for(&server, fast_config());
        let mut result = HeartbeatResult::default();
        client
            .exec(&RequestContext::background(), &nightly(), &mut result)
            .await
            .unwrap();

        assert_eq!(result.meta.request_id, "second");
        assert_eq!(request_count(&server).await, 2);
    }

    #[tokio::test]
    async fn test_rate_limited_until_retries_run_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).set_body_string(r#"{"message":"limit"}"#))
            .expect(3)
            .mount(&server)
            .await;

        let client = client_for(&server, fast_config().with_retry_count(2));
        let mut result = HeartbeatResult::default();
        let err = client
            .exec(&RequestContext::background(), &nightly(), &mut result)
            .await
            .unwrap_err();

        let api_error = err.api_error().unwrap();
        assert_eq!(api_error.status_code, "429");
        assert_eq!(api_error.message, "limit");
        assert!(result.data.name.is_empty());
    }

    #[tokio::test]
    async fn test_default_retry_count_allows_five_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(5)
            .mount(&server)
            .await;

        let client = client_for(&server, fast_config());
        assert_eq!(client.retry_max(), 4);
        let err = client
            .exec(&RequestContext::background(), &nightly(), &mut HeartbeatResult::default())
            .await
            .unwrap_err();
        assert!(err.is_server_error());
    }

    #[tokio::test]
    async fn test_error_response_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(404)
                    .insert_header("X-Opsgenie-Errortype", "NotFound")
                    .set_body_string(
                        r#"{"message":"Heartbeat not found","took":0.5,"requestId":"abc","errors":{"name":"unknown"}}"#,
                    ),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, fast_config());
        let err = client
            .exec(&RequestContext::background(), &nightly(), &mut HeartbeatResult::default())
            .await
            .unwrap_err();

        assert!(err.is_client_error());
        let api_error = err.api_error().unwrap();
        assert_eq!(api_error.message, "Heartbeat not found");
        assert!((api_error.took - 0.5).abs() < f32::EPSILON);
        assert_eq!(api_error.request_id, "abc");
        assert_eq!(api_error.error_header, "NotFound");
        assert_eq!(api_error.errors.as_ref().unwrap()["name"], "unknown");
    }

    #[tokio::test]
    async fn test_not_implemented_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(501).set_body_string("not json"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, fast_config());
        let err = client
            .exec(&RequestContext::background(), &nightly(), &mut HeartbeatResult::default())
            .await
            .unwrap_err();
        let api_error = err.api_error().unwrap();
        assert_eq!(api_error.status_code, "501");
        assert!(api_error.message.is_empty());
    }

    #[tokio::test]
    async fn test_unparseable_success_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let client = client_for(&server, fast_config());
        let mut result = HeartbeatResult::default();
        let err = client
            .exec(&RequestContext::background(), &nightly(), &mut result)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Parse(_)));
        assert!(err.to_string().starts_with("Response could not be parsed, "));
        assert_eq!(result.meta, ResponseMeta::default());
    }

    #[tokio::test]
    async fn test_post_sends_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/heartbeats"))
            .and(header("Content-Type", "application/json; charset=utf-8"))
            .and(body_json(serde_json::json!({"name": "nightly", "interval": 10})))
            .respond_with(heartbeat_body())
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, fast_config());
        let request = AddHeartbeat {
            name: "nightly".to_string(),
            interval: 10,
        };
        client
            .exec(&RequestContext::background(), &request, &mut HeartbeatResult::default())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_delete_has_no_body_or_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v2/heartbeats/nightly"))
            .respond_with(heartbeat_body())
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, fast_config());
        let request = DeleteHeartbeat {
            name: "nightly".to_string(),
        };
        client
            .exec(&RequestContext::background(), &request, &mut HeartbeatResult::default())
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        assert!(requests[0].headers.get("content-type").is_none());
        assert!(requests[0].body.is_empty());
    }

    #[tokio::test]
    async fn test_validation_failure_sends_nothing() {
        let server = MockServer::start().await;
        let client = client_for(&server, fast_config());

        let err = client
            .exec(
                &RequestContext::background(),
                &GetHeartbeat { name: String::new() },
                &mut HeartbeatResult::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let err = client
            .exec(
                &RequestContext::background(),
                &AddHeartbeat {
                    name: "nightly".to_string(),
                    interval: 0,
                },
                &mut HeartbeatResult::default(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid request: interval must be positive");

        assert_eq!(request_count(&server).await, 0);
    }

    #[tokio::test]
    async fn test_cancelled_context_sends_nothing() {
        let server = MockServer::start().await;
        let client = client_for(&server, fast_config());
        let ctx = RequestContext::background();
        ctx.cancel();

        let err = client
            .exec(&ctx, &nightly(), &mut HeartbeatResult::default())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Context(ContextError::Canceled)));
        assert_eq!(request_count(&server).await, 0);
    }

    #[tokio::test]
    async fn test_nanosecond_deadline() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(heartbeat_body().set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let client = client_for(&server, fast_config());
        let ctx = RequestContext::with_timeout(Duration::from_nanos(1));
        let mut result = HeartbeatResult::default();
        let err = client.exec(&ctx, &nightly(), &mut result).await.unwrap_err();

        assert!(matches!(err, Error::Context(ContextError::DeadlineExceeded)));
        assert_eq!(err.to_string(), "context deadline exceeded");
        assert!(result.data.name.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_mid_flight_stops_retrying() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(heartbeat_body().set_delay(Duration::from_secs(10)))
            .mount(&server)
            .await;

        let client = client_for(&server, fast_config());
        let token = CancellationToken::new();
        let ctx = RequestContext::with_cancellation(token.clone());

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            token.cancel();
        });

        let started = std::time::Instant::now();
        let err = client
            .exec(&ctx, &nightly(), &mut HeartbeatResult::default())
            .await
            .unwrap_err();
        canceller.await.unwrap();

        assert!(matches!(err, Error::Context(ContextError::Canceled)));
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(request_count(&server).await <= 1);
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = OpsGenieClient::new(fast_config().with_retry_count(1))
            .unwrap()
            .with_base_url(&format!("http://{addr}"));
        let err = client
            .exec(&RequestContext::background(), &nightly(), &mut HeartbeatResult::default())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Transport(_)));
        assert!(err.is_retryable());
    }

    fn stop_always(_: &RequestContext, _: AttemptOutcome<'_>) -> RetryDecision {
        RetryDecision::Stop
    }

    struct CountingBackoff(Arc<AtomicU32>);

    impl crate::transport::Backoff for CountingBackoff {
        fn delay(
            &self,
            _attempt: u32,
            _min: Duration,
            _max: Duration,
            _last: Option<&reqwest::Response>,
        ) -> Duration {
            self.0.fetch_add(1, Ordering::SeqCst);
            Duration::ZERO
        }
    }

    #[tokio::test]
    async fn test_custom_retry_policy() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, fast_config().with_retry_policy(stop_always));
        let err = client
            .exec(&RequestContext::background(), &nightly(), &mut HeartbeatResult::default())
            .await
            .unwrap_err();
        assert_eq!(err.api_error().unwrap().status_code, "500");
    }

    #[tokio::test]
    async fn test_custom_backoff_called_between_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .expect(3)
            .mount(&server)
            .await;

        let calls = Arc::new(AtomicU32::new(0));
        let config = fast_config()
            .with_retry_count(2)
            .with_backoff(CountingBackoff(Arc::clone(&calls)));
        let client = client_for(&server, config);
        let _ = client
            .exec(&RequestContext::background(), &nightly(), &mut HeartbeatResult::default())
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retry_after_header_delays_next_attempt() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "1"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(heartbeat_body())
            .mount(&server)
            .await;

        let config = fast_config().with_retry_wait(Duration::from_millis(1), Duration::from_secs(2));
        let client = client_for(&server, config);
        let started = std::time::Instant::now();
        let mut result = HeartbeatResult::default();
        client
            .exec(&RequestContext::background(), &nightly(), &mut result)
            .await
            .unwrap();

        assert!(started.elapsed() >= Duration::from_millis(900));
        assert_eq!(result.data.name, "X");
        assert_eq!(request_count(&server).await, 2);
    }

    #[test]
    fn test_client_is_shareable() {
        fn assert_shareable<T: Send + Sync + Clone + 'static>() {}
        assert_shareable::<OpsGenieClient>();
    }

    #[tokio::test]
    async fn test_concurrent_calls_share_one_client() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/heartbeats/nightly"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"data":{"name":"nightly"}}"#)
                    .set_delay(Duration::from_millis(50)),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/heartbeats/hourly"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"data":{"name":"hourly"}}"#))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, fast_config());
        let other = client.clone();
        let nightly = nightly();
        let hourly = GetHeartbeat {
            name: "hourly".to_string(),
        };
        let ctx = RequestContext::background();
        let mut first = HeartbeatResult::default();
        let mut second = HeartbeatResult::default();

        let (a, b) = tokio::join!(
            client.exec(&ctx, &nightly, &mut first),
            other.exec(&ctx, &hourly, &mut second),
        );
        a.unwrap();
        b.unwrap();

        assert_eq!(first.data.name, "nightly");
        assert_eq!(second.data.name, "hourly");
    }

    #[test]
    fn test_missing_api_key() {
        let err = OpsGenieClient::new(Config::default()).unwrap_err();
        assert_eq!(err.to_string(), "API key cannot be blank");
    }

    #[test]
    fn test_unparseable_proxy() {
        let err = OpsGenieClient::new(Config::new(API_KEY).with_proxy_url("http://[::")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_region_selects_base_url() {
        let us = OpsGenieClient::new(Config::new(API_KEY)).unwrap();
        assert_eq!(us.base_url(), API_URL);

        let eu = OpsGenieClient::new(Config::new(API_KEY).with_api_url(API_URL_EU)).unwrap();
        assert_eq!(eu.base_url(), API_URL_EU);

        let other = OpsGenieClient::new(Config::new(API_KEY).with_api_url("https://example.com")).unwrap();
        assert_eq!(other.base_url(), API_URL);
    }

    #[test]
    fn test_proxy_replaces_injected_client() {
        let recorder = Recorder::default();
        let config = Config::new(API_KEY)
            .with_http_client(reqwest::Client::new())
            .with_proxy_url("http://proxy.internal:3128")
            .with_log_sink(recorder.clone());
        assert!(OpsGenieClient::new(config).is_ok());
        assert!(recorder
            .lines()
            .iter()
            .any(|(level, line)| *level == Level::WARN && line.contains("Proxy URL is set")));
    }

    #[tokio::test]
    async fn test_logging_through_sink() {
        let server = MockServer::start().await;
        let recorder = Recorder::default();
        let config = Config::new(API_KEY)
            .with_log_level("verbose")
            .with_log_sink(recorder.clone());
        let client = client_for(&server, config);

        assert_eq!(client.config().log_level, "info");

        let _ = client
            .exec(
                &RequestContext::background(),
                &GetHeartbeat { name: String::new() },
                &mut HeartbeatResult::default(),
            )
            .await;

        let lines = recorder.lines();
        assert_eq!(lines[0].0, Level::WARN);
        assert!(lines[0].1.contains("Setting log level as info"));

        let configured = &lines[1].1;
        assert!(configured.starts_with("Client is configured with ApiKey: ****9082"));
        assert!(!configured.contains(API_KEY));

        assert!(lines
            .iter()
            .any(|(level, line)| *level == Level::ERROR && line.starts_with("Request validation err: ")));
        assert!(lines.iter().all(|(level, _)| *level != Level::DEBUG));
    }

    #[test]
    fn test_level_name_written_back() {
        let client = OpsGenieClient::new(Config::new(API_KEY).with_log_level("WARNING")).unwrap();
        assert_eq!(client.config().log_level, "warn");

        let client = OpsGenieClient::new(Config::new(API_KEY)).unwrap();
        assert_eq!(client.config().log_level, "info");
    }
}
