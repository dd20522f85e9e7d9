//! Request helper: one network call, one JSON envelope, one outcome
//!
//! Every handler goes through [`fetch_json`]. Transport failures, unparseable
//! bodies and error envelopes all come back as a [`RequestError`] whose
//! `Display` is the message shown to the user.

use std::fmt;
use std::time::Duration;

use anyhow::Context;
use reqwest::header::{HeaderValue, ACCEPT, COOKIE};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::config::Config;
use crate::dom::FormData;

/// Parsed success envelope, passed to the handler unchanged
pub type Payload = Map<String, Value>;

/// HTTP methods the layer issues
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Parse a form `method` value; unknown verbs fall back to POST
    pub fn from_form(method: &str) -> Self {
        match method.to_ascii_uppercase().as_str() {
            "GET" => Self::Get,
            "PUT" => Self::Put,
            "PATCH" => Self::Patch,
            "DELETE" => Self::Delete,
            _ => Self::Post,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request issued on behalf of one user action
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub url: Url,
    pub method: Method,
    pub body: Option<FormData>,
}

impl ApiRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            url,
            method,
            body: None,
        }
    }

    pub fn with_form(mut self, body: FormData) -> Self {
        self.body = Some(body);
        self
    }
}

/// Raw response as seen by the helper
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Network-level failure (no response to parse)
#[derive(Debug)]
pub enum TransportError {
    /// Connection refused, DNS failure, TLS failure, ...
    Connect(String),
    /// The configured timeout elapsed
    Timeout,
    /// Anything else raised while sending or reading the body
    Other(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect(_) | Self::Other(_) => write!(f, "Failed to fetch"),
            Self::Timeout => write!(f, "Request timed out"),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else {
            Self::Other(e.to_string())
        }
    }
}

/// The single error channel of the request helper
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// The request never produced a response
    Transport(String),
    /// The body was not a JSON object (or not the expected shape)
    Parse,
    /// Well-formed response signaling failure; carries the display message
    Application(String),
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(message) | Self::Application(message) => f.write_str(message),
            Self::Parse => f.write_str("Server error"),
        }
    }
}

impl std::error::Error for RequestError {}

/// Network seam used by the request helper
pub trait Transport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}

/// Perform the call and normalize the outcome
pub async fn fetch_json<T: Transport>(
    transport: &T,
    request: ApiRequest,
) -> Result<Payload, RequestError> {
    let method = request.method;
    let url = request.url.clone();
    tracing::debug!("{} {}", method, url);

    let response = transport.send(request).await.map_err(|e| {
        tracing::debug!("Transport failure for {} {}: {:?}", method, url, e);
        RequestError::Transport(e.to_string())
    })?;

    let payload = match serde_json::from_str::<Value>(&response.body) {
        Ok(Value::Object(map)) => map,
        Ok(_) | Err(_) => {
            tracing::debug!(
                "Non-object response from {} {} (status {})",
                method,
                url,
                response.status
            );
            return Err(RequestError::Parse);
        }
    };

    let flagged = payload.get("status").and_then(Value::as_str) == Some("error");
    if !response.is_success() || flagged {
        return Err(RequestError::Application(envelope_message(&payload)));
    }

    Ok(payload)
}

/// The envelope's `message`, or "Error" when it is missing or falsy
fn envelope_message(payload: &Payload) -> String {
    match payload.get("message") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => "Error".to_string(),
        None | Some(Value::Null) | Some(Value::Bool(false)) | Some(Value::String(_)) => {
            "Error".to_string()
        }
        Some(other) => other.to_string(),
    }
}

/// Deserialize a typed view of a success payload
pub fn decode<T: DeserializeOwned>(payload: Payload) -> Result<T, RequestError> {
    serde_json::from_value(Value::Object(payload)).map_err(|e| {
        tracing::debug!("Unexpected payload shape: {}", e);
        RequestError::Parse
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Typed payloads
// ─────────────────────────────────────────────────────────────────────────────

/// POST /api/posts/{id}/like
#[derive(Debug, Clone, Deserialize)]
pub struct LikeResponse {
    pub likes: i64,
    #[serde(default)]
    pub liked: bool,
}

/// POST /api/follow/{id}
#[derive(Debug, Clone, Deserialize)]
pub struct FollowResponse {
    #[serde(default)]
    pub following: bool,
}

/// Ajax and comment form submissions
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FragmentResponse {
    #[serde(default)]
    pub redirect: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
}

impl FragmentResponse {
    pub fn redirect(&self) -> Option<&str> {
        self.redirect.as_deref().filter(|r| !r.is_empty())
    }

    pub fn html(&self) -> Option<&str> {
        self.html.as_deref().filter(|h| !h.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserHit {
    #[serde(default)]
    pub user_first_name: String,
    #[serde(default)]
    pub user_username: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostHit {
    #[serde(default)]
    pub post_message: String,
    #[serde(default)]
    pub user_username: String,
}

/// POST /api/search
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub users: Vec<UserHit>,
    #[serde(default)]
    pub posts: Vec<PostHit>,
}

// ─────────────────────────────────────────────────────────────────────────────
// HTTP transport
// ─────────────────────────────────────────────────────────────────────────────

/// reqwest-backed transport; form bodies go out as multipart like browser FormData
pub struct HttpTransport {
    client: reqwest::Client,
    cookie: Option<HeaderValue>,
}

impl HttpTransport {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .cookie_store(true)
            .build()
            .context("Failed to create HTTP client")?;

        let cookie = config
            .session_cookie
            .as_deref()
            .map(HeaderValue::from_str)
            .transpose()
            .context("Session cookie is not a valid header value")?;

        Ok(Self { client, cookie })
    }

    /// GET a page as text; non-2xx statuses are errors
    pub async fn fetch_page(&self, url: &Url) -> anyhow::Result<String> {
        let response = self.send(ApiRequest::new(Method::Get, url.clone())).await;
        let response = response
            .map_err(|e| anyhow::anyhow!("{} ({:?})", e, e))
            .with_context(|| format!("Failed to load {}", url))?;
        if !response.is_success() {
            anyhow::bail!("Loading {} returned status {}", url, response.status);
        }
        Ok(response.body)
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut url = request.url;
        let mut body = request.body;
        // GET cannot carry a body; encode the fields into the query instead
        if method == reqwest::Method::GET {
            if let Some(fields) = body.take() {
                let mut pairs = url.query_pairs_mut();
                for (name, value) in fields.iter() {
                    pairs.append_pair(name, value);
                }
            }
        }

        let mut builder = self
            .client
            .request(method, url)
            .header(ACCEPT, "application/json, text/html");
        if let Some(cookie) = &self.cookie {
            builder = builder.header(COOKIE, cookie.clone());
        }
        if let Some(fields) = body {
            let mut form = reqwest::multipart::Form::new();
            for (name, value) in fields.into_entries() {
                form = form.text(name, value);
            }
            builder = builder.multipart(form);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(ApiResponse { status, body })
    }
}
