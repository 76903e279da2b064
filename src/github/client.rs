use crate::error::{AssignmeError, Result};
use crate::github::request::{self, ApiRequest, Verb};
use http::header::{AUTHORIZATION, USER_AGENT};
use http::{HeaderValue, Uri};
use hyper_rustls::HttpsConnectorBuilder;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use octocrab::service::middleware::base_uri::BaseUriLayer;
use octocrab::service::middleware::extra_headers::ExtraHeadersLayer;
use octocrab::{AuthState, OctoBody, Octocrab, OctocrabBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Opaque GitHub credential. Never printed.
#[derive(Clone)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: &str) -> Self {
        Self(token.trim().to_string())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            AssignmeError::Config(format!(
                "Cannot read credential file {}: {e}",
                path.display()
            ))
        })?;
        let credential = Self::new(&raw);
        if credential.0.is_empty() {
            return Err(AssignmeError::NotAuthenticated);
        }
        Ok(credential)
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// `token abc` or `Bearer abc` go out verbatim; a bare token gets the
    /// bearer scheme.
    fn has_scheme(&self) -> bool {
        self.0.contains(char::is_whitespace)
    }

    fn authorization(&self) -> Result<HeaderValue> {
        let raw = if self.has_scheme() {
            self.0.clone()
        } else {
            format!("Bearer {}", self.0)
        };
        let mut value = HeaderValue::from_str(&raw).map_err(|_| {
            AssignmeError::Config("Credential contains characters not allowed in a header".into())
        })?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

pub struct GithubClient {
    octocrab: Octocrab,
    verbose: bool,
}

/// Status and raw body of a completed call, whatever the status.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }

    pub fn error_message(&self) -> String {
        match serde_json::from_str::<ErrorBody>(&self.body) {
            Ok(err) => err.message,
            Err(_) if self.body.trim().is_empty() => "empty response body".to_string(),
            Err(_) => self.body.trim().to_string(),
        }
    }

    pub fn into_result(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(AssignmeError::Api {
                status: self.status,
                message: self.error_message(),
            })
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AuthenticatedUser {
    pub login: String,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RateLimit {
    pub resources: RateLimitResources,
}

#[derive(Debug, Deserialize)]
pub struct RateLimitResources {
    pub core: RateLimitResource,
}

#[derive(Debug, Deserialize)]
pub struct RateLimitResource {
    pub limit: u64,
    pub remaining: u64,
    pub reset: i64,
}

impl RateLimitResource {
    fn reset_time(&self) -> String {
        chrono::DateTime::from_timestamp(self.reset, 0)
            .map(|dt| dt.format("%H:%M:%S UTC").to_string())
            .unwrap_or_else(|| self.reset.to_string())
    }
}

impl GithubClient {
    pub fn new(credential: &Credential, verbose: bool) -> Result<Self> {
        Self::build(credential, None, verbose)
    }

    pub fn with_base_uri(credential: &Credential, base_uri: &str, verbose: bool) -> Result<Self> {
        Self::build(credential, Some(base_uri), verbose)
    }

    /// Assembles the octocrab service by hand. The stock builder always adds
    /// `User-Agent: octocrab` and appends extra headers after it, so the
    /// identification header would go out twice.
    fn build(credential: &Credential, base_uri: Option<&str>, verbose: bool) -> Result<Self> {
        let base_uri: Uri = base_uri
            .unwrap_or(request::API_BASE)
            .parse()
            .map_err(|e| AssignmeError::Config(format!("Invalid API URL: {e}")))?;
        let headers = vec![
            (USER_AGENT, HeaderValue::from_static(request::USER_AGENT)),
            (AUTHORIZATION, credential.authorization()?),
        ];

        let connector = HttpsConnectorBuilder::new()
            .with_native_roots()?
            .https_or_http()
            .enable_http1()
            .build();
        let service: Client<_, OctoBody> = Client::builder(TokioExecutor::new()).build(connector);

        let octocrab = OctocrabBuilder::new_empty()
            .with_service(service)
            .with_layer(&BaseUriLayer::new(base_uri))
            .with_layer(&ExtraHeadersLayer::new(Arc::new(headers)))
            .with_auth(AuthState::None)
            .build()
            .unwrap_or_else(|never| match never {});
        Ok(Self { octocrab, verbose })
    }

    /// Sends one request. Only transport failures are errors; the caller
    /// decides what a non-2xx status means.
    pub async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        debug!(verb = %request.verb, path = %request.path, "sending request");
        let path = request.path.as_str();
        let body = request.body.as_ref();
        let response = match request.verb {
            Verb::Get => self.octocrab._get(path).await?,
            Verb::Post => self.octocrab._post(path, body).await?,
            Verb::Put => self.octocrab._put(path, body).await?,
            Verb::Delete => self.octocrab._delete(path, body).await?,
        };

        let status = response.status().as_u16();
        let body = self.octocrab.body_to_string(response).await?;
        debug!(status, bytes = body.len(), "received response");
        Ok(ApiResponse { status, body })
    }

    pub async fn validate_token(&self) -> Result<AuthenticatedUser> {
        let user: AuthenticatedUser = self
            .octocrab
            .get("/user", None::<&()>)
            .await
            .map_err(|e| AssignmeError::GitHub(format!("Token validation failed: {e}")))?;
        Ok(user)
    }

    pub async fn get_rate_limit(&self) -> Result<RateLimit> {
        let rate_limit: RateLimit = self.octocrab.get("/rate_limit", None::<&()>).await?;
        Ok(rate_limit)
    }

    pub async fn check_rate_limit_if_verbose(&self) {
        if !self.verbose {
            return;
        }
        match self.get_rate_limit().await {
            Ok(rl) => {
                let core = &rl.resources.core;
                eprintln!(
                    "Rate limit: {}/{} remaining (resets at {})",
                    core.remaining,
                    core.limit,
                    core.reset_time()
                );
            }
            Err(e) => eprintln!("Could not check rate limit: {e}"),
        }
    }

    pub async fn warn_if_rate_limited(&self, needed: u64) -> Result<()> {
        let rl = self.get_rate_limit().await?;
        let core = &rl.resources.core;
        if core.remaining < needed {
            crate::display::warn(&format!(
                "Only {} API calls remaining, {needed} needed (resets at {})",
                core.remaining,
                core.reset_time()
            ));
        }
        Ok(())
    }
}
