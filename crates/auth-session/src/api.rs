//! HTTP client for the first-party backend.
//!
//! Every call takes the session's [`RequestConfig`], which carries the bearer
//! token installed by a successful password login.

use crate::{AuthError, AuthResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Describe a response body without echoing its content (it may carry tokens).
fn summarize_response_body(body: &str) -> String {
    let mut hasher = DefaultHasher::new();
    body.hash(&mut hasher);
    format!("len={},digest={:016x}", body.len(), hasher.finish())
}

/// Per-session request settings applied to every outgoing call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestConfig {
    bearer_token: Option<String>,
}

impl RequestConfig {
    /// Config carrying `token` as its bearer.
    pub fn with_bearer(token: &str) -> Self {
        Self {
            bearer_token: Some(token.to_string()),
        }
    }

    pub fn set_bearer(&mut self, token: &str) {
        self.bearer_token = Some(token.to_string());
    }

    pub fn clear_bearer(&mut self) {
        self.bearer_token = None;
    }

    pub fn bearer_token(&self) -> Option<&str> {
        self.bearer_token.as_deref()
    }

    /// Value for the `Authorization` header, if a bearer is installed.
    pub fn authorization_header(&self) -> Option<String> {
        self.bearer_token
            .as_ref()
            .map(|token| format!("Bearer {}", token))
    }

    fn apply(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.authorization_header() {
            Some(header) => request.header(reqwest::header::AUTHORIZATION, header),
            None => request,
        }
    }
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GoogleTokenRequest<'a> {
    access_token: &'a str,
}

/// `GET /user` response body.
#[derive(Debug, Clone, Deserialize)]
pub struct UserResponse {
    #[serde(deserialize_with = "deserialize_identifier")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub photo: Option<String>,
}

/// `POST /user/google` response body, in the provider's people-API shape.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleProfileResponse {
    #[serde(default)]
    pub email_addresses: Vec<GoogleEmailAddress>,
    #[serde(default)]
    pub names: Vec<GoogleName>,
    #[serde(default)]
    pub photos: Vec<GooglePhoto>,
    #[serde(default)]
    pub resource_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleEmailAddress {
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleName {
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GooglePhoto {
    #[serde(default)]
    pub url: Option<String>,
}

/// Accept identifiers sent either as JSON strings or numbers.
fn deserialize_identifier<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(id) => Ok(id),
        serde_json::Value::Number(id) => Ok(id.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number identifier, got {}",
            other
        ))),
    }
}

/// Client for the first-party backend.
#[derive(Clone)]
pub struct ApiClient {
    http_client: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a client rooted at `base_url` with a per-request timeout.
    pub fn new(base_url: Url, timeout: Duration) -> AuthResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: with_trailing_slash(base_url),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> AuthResult<Url> {
        Ok(self.base_url.join(path)?)
    }

    /// `POST /user/login`. Returns the issued first-party token.
    pub async fn login(
        &self,
        config: &RequestConfig,
        email: &str,
        password: &str,
    ) -> AuthResult<String> {
        let url = self.endpoint("user/login")?;
        debug!(url = %url, "Sending login request");

        let request = self
            .http_client
            .post(url)
            .json(&LoginRequest { email, password });
        let response = config.apply(request).send().await?;
        let body: LoginResponse = read_json(response, "login").await?;

        match body.token {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(AuthError::MalformedResponse(
                "Login response did not contain a token".to_string(),
            )),
        }
    }

    /// `GET /user` with the config's bearer.
    pub async fn current_user(&self, config: &RequestConfig) -> AuthResult<UserResponse> {
        let url = self.endpoint("user")?;
        debug!(url = %url, has_bearer = config.bearer_token().is_some(), "Fetching current user");

        let response = config.apply(self.http_client.get(url)).send().await?;
        read_json(response, "current user").await
    }

    /// `POST /user/google`, exchanging a Google access token for its profile.
    pub async fn exchange_google_token(
        &self,
        config: &RequestConfig,
        access_token: &str,
    ) -> AuthResult<GoogleProfileResponse> {
        let url = self.endpoint("user/google")?;
        debug!(url = %url, token_len = access_token.len(), "Exchanging Google token");

        let request = self
            .http_client
            .post(url)
            .json(&GoogleTokenRequest { access_token });
        let response = config.apply(request).send().await?;
        read_json(response, "google token exchange").await
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
    operation: &'static str,
) -> AuthResult<T> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        warn!(
            status = %status,
            operation,
            body_summary = %summarize_response_body(&body),
            "Backend request failed"
        );
        return Err(AuthError::from_status(status.as_u16(), &body));
    }

    serde_json::from_str(&body).map_err(|e| {
        AuthError::MalformedResponse(format!(
            "{} response: {} ({})",
            operation,
            e,
            summarize_response_body(&body)
        ))
    })
}
