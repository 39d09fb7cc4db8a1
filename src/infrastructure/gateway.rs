use crate::domain::models::AuthTokens;
use crate::infrastructure::config::ApiConfig;
use crate::infrastructure::credential_store::CredentialStore;
use crate::infrastructure::error::CoreError;
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use url::Url;

const REFRESH_PATH: &str = "refresh";
const AUTH_EXEMPT_SEGMENTS: &[&str] = &["refresh", "login", "logout", "register"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

/// A call against the workout service, addressed by path relative to the
/// configured base URL.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> Result<T, CoreError> {
        serde_json::from_str(&self.body).map_err(|error| {
            CoreError::InvalidPayload(format!("{error}; body={}", self.body))
        })
    }
}

/// A fully resolved outbound HTTP call, ready for a transport.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub bearer: Option<String>,
    pub body: Option<serde_json::Value>,
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<ApiResponse, CoreError>;
}

#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<ApiResponse, CoreError> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, request.url);
        if let Some(bearer) = &request.bearer {
            builder = builder.bearer_auth(bearer);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|error| CoreError::Network(format!("request failed: {error}")))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|error| CoreError::Network(format!("failed reading response body: {error}")))?;

        Ok(ApiResponse { status, body })
    }
}

#[derive(Debug, serde::Deserialize)]
struct RefreshResponsePayload {
    access_token: String,
    refresh_token: String,
    expires_in: Option<i64>,
}

type NowProvider = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Attaches the current access credential to every outbound call and
/// recovers from credential expiry without losing in-flight requests.
///
/// At most one refresh call is ever in flight: the first request to hit a
/// 401 performs it while every other 401 waits on the gate, then retries
/// once with whatever credential the refresh produced. A failed refresh
/// clears stored credentials, so queued waiters reject instead of
/// refreshing again.
pub struct AuthGateway<S, T>
where
    S: CredentialStore,
    T: HttpTransport,
{
    credentials: Arc<S>,
    transport: Arc<T>,
    api_base: Url,
    auth_base: Url,
    refresh_timeout: Option<Duration>,
    refresh_gate: Mutex<()>,
    now_provider: NowProvider,
}

impl<S, T> AuthGateway<S, T>
where
    S: CredentialStore,
    T: HttpTransport,
{
    pub fn new(
        workout_service_url: &str,
        auth_service_url: &str,
        credentials: Arc<S>,
        transport: Arc<T>,
    ) -> Result<Self, CoreError> {
        Ok(Self {
            credentials,
            transport,
            api_base: parse_base_url(workout_service_url)?,
            auth_base: parse_base_url(auth_service_url)?,
            refresh_timeout: None,
            refresh_gate: Mutex::new(()),
            now_provider: Arc::new(Utc::now),
        })
    }

    pub fn from_config(
        config: &ApiConfig,
        credentials: Arc<S>,
        transport: Arc<T>,
    ) -> Result<Self, CoreError> {
        let mut gateway = Self::new(
            &config.workout_service_url,
            &config.auth_service_url,
            credentials,
            transport,
        )?;
        gateway.refresh_timeout = config.refresh_timeout;
        Ok(gateway)
    }

    /// Bounds a single refresh call. Without one, a hung refresh stalls
    /// every queued request until the transport gives up on its own.
    pub fn with_refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = Some(timeout);
        self
    }

    pub fn with_now_provider(mut self, now_provider: NowProvider) -> Self {
        self.now_provider = now_provider;
        self
    }

    /// Sends a workout-service request, refreshing credentials and retrying
    /// once if the service rejects the current access token.
    ///
    /// A retried request that is rejected again is returned as-is; the
    /// protocol never refreshes twice for one original request.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, CoreError> {
        let access = self.credentials.load_tokens()?.map(|tokens| tokens.access_token);
        let response = self.dispatch(&self.api_base, &request, access.as_deref()).await?;
        if !response.is_unauthorized() || is_auth_request(&request.path) {
            return Ok(response);
        }

        tracing::debug!(path = %request.path, "access rejected, resolving fresh credential");
        let fresh = self.await_refreshed_token(access.as_deref()).await?;
        self.dispatch(&self.api_base, &request, Some(&fresh)).await
    }

    /// Sends a call to the auth service itself. These never participate in
    /// the refresh protocol.
    pub async fn send_auth(&self, request: ApiRequest) -> Result<ApiResponse, CoreError> {
        let access = self.credentials.load_tokens()?.map(|tokens| tokens.access_token);
        self.dispatch(&self.auth_base, &request, access.as_deref()).await
    }

    async fn dispatch(
        &self,
        base: &Url,
        request: &ApiRequest,
        bearer: Option<&str>,
    ) -> Result<ApiResponse, CoreError> {
        let url = build_endpoint(base, &request.path, &request.query)?;
        self.transport
            .execute(HttpRequest {
                method: request.method,
                url,
                bearer: bearer.map(ToOwned::to_owned),
                body: request.body.clone(),
            })
            .await
    }

    /// Serializes refresh attempts. The caller passes the access token its
    /// failed request used; if the stored token already differs, another
    /// request refreshed while we waited and the stored one is reused.
    async fn await_refreshed_token(&self, stale_access: Option<&str>) -> Result<String, CoreError> {
        let _gate = self.refresh_gate.lock().await;

        let Some(tokens) = self.credentials.load_tokens()? else {
            // a failed refresh already cleared the store
            return Err(CoreError::SessionEnded);
        };

        if stale_access.is_none_or(|stale| stale != tokens.access_token) {
            return Ok(tokens.access_token);
        }

        self.refresh(&tokens.refresh_token).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<String, CoreError> {
        let url = build_endpoint(&self.auth_base, REFRESH_PATH, &[])?;
        let request = HttpRequest {
            method: HttpMethod::Post,
            url,
            bearer: None,
            body: Some(serde_json::json!({ "refresh_token": refresh_token })),
        };

        let outcome = match self.refresh_timeout {
            Some(limit) => match tokio::time::timeout(limit, self.transport.execute(request)).await
            {
                Ok(result) => result,
                Err(_) => Err(CoreError::Network(format!(
                    "credential refresh timed out after {}ms",
                    limit.as_millis()
                ))),
            },
            None => self.transport.execute(request).await,
        };

        let response = match outcome {
            Ok(response) => response,
            Err(error) => return self.end_session(&error.to_string()),
        };
        if !response.is_success() {
            return self.end_session(&format!("http {}; body={}", response.status, response.body));
        }

        let payload: RefreshResponsePayload = match response.decode() {
            Ok(payload) => payload,
            Err(error) => return self.end_session(&error.to_string()),
        };

        let expires_at = payload
            .expires_in
            .filter(|seconds| *seconds > 0)
            .map(|seconds| (self.now_provider)() + ChronoDuration::seconds(seconds));
        let tokens = AuthTokens {
            access_token: payload.access_token,
            refresh_token: payload.refresh_token,
            expires_at,
        };
        self.credentials.save_tokens(&tokens)?;
        tracing::debug!("credential refresh succeeded");
        Ok(tokens.access_token)
    }

    fn end_session(&self, reason: &str) -> Result<String, CoreError> {
        tracing::warn!(%reason, "credential refresh failed, clearing stored credentials");
        if let Err(error) = self.credentials.delete_tokens() {
            tracing::warn!(%error, "failed clearing credentials after refresh failure");
        }
        Err(CoreError::SessionEnded)
    }
}

fn parse_base_url(value: &str) -> Result<Url, CoreError> {
    let url = Url::parse(value)
        .map_err(|error| CoreError::InvalidConfig(format!("invalid base url '{value}': {error}")))?;
    if url.cannot_be_a_base() {
        return Err(CoreError::InvalidConfig(format!(
            "base url '{value}' cannot carry path segments"
        )));
    }
    Ok(url)
}

fn build_endpoint(base: &Url, path: &str, query: &[(String, String)]) -> Result<Url, CoreError> {
    let mut url = base.clone();
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| CoreError::InvalidConfig("base url cannot be a base".to_string()))?;
        segments.pop_if_empty();
        for segment in path.split('/').filter(|segment| !segment.is_empty()) {
            segments.push(segment);
        }
    }
    for (key, value) in query {
        url.query_pairs_mut().append_pair(key, value);
    }
    Ok(url)
}

fn is_auth_request(path: &str) -> bool {
    let first = path
        .trim_start_matches('/')
        .split('/')
        .next()
        .unwrap_or_default();
    AUTH_EXEMPT_SEGMENTS.contains(&first)
}
