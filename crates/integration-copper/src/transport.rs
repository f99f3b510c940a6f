use std::fmt;

use async_trait::async_trait;
use copper_core::CoreError;
use reqwest::{header, Client};
use serde_json::Value;
use tracing::debug;

use crate::config::CopperConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiMethod {
    Get,
    Post,
    Put,
}

impl ApiMethod {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
        }
    }
}

/// One call against the Copper REST API. `GET` requests carry `query`;
/// `POST`/`PUT` carry a JSON `body`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: ApiMethod,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: ApiMethod::Get,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: ApiMethod::Post,
            path: path.into(),
            query: Vec::new(),
            body: Some(body),
        }
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: ApiMethod::Put,
            path: path.into(),
            query: Vec::new(),
            body: Some(body),
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }
}

#[async_trait]
pub trait ApiTransport: Send + Sync {
    async fn execute(&self, request: ApiRequest) -> Result<Value, CoreError>;
}

#[derive(Clone)]
pub struct ReqwestApiTransport {
    config: CopperConfig,
    client: Client,
}

impl fmt::Debug for ReqwestApiTransport {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ReqwestApiTransport")
            .field("config", &self.config)
            .field("client", &self.client)
            .finish()
    }
}

impl ReqwestApiTransport {
    pub fn new(config: &CopperConfig) -> Result<Self, CoreError> {
        let mut headers = header::HeaderMap::new();
        let token = header::HeaderValue::from_str(&config.api_key).map_err(|error| {
            CoreError::Configuration(format!("COPPER_API_KEY is invalid: {error}"))
        })?;
        let email = header::HeaderValue::from_str(&config.user_email).map_err(|error| {
            CoreError::Configuration(format!("COPPER_USER_EMAIL is invalid: {error}"))
        })?;
        headers.insert("x-pw-accesstoken", token);
        headers.insert("x-pw-useremail", email);
        headers.insert(
            "x-pw-application",
            header::HeaderValue::from_static("developer_api"),
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .user_agent("integration-copper")
            .timeout(config.request_timeout)
            .default_headers(headers)
            .build()
            .map_err(|error| {
                CoreError::Configuration(format!("failed to build Copper HTTP client: {error}"))
            })?;

        Ok(Self {
            config: config.clone(),
            client,
        })
    }
}

#[async_trait]
impl ApiTransport for ReqwestApiTransport {
    async fn execute(&self, request: ApiRequest) -> Result<Value, CoreError> {
        let url = self.config.endpoint(&request.path);
        debug!(method = request.method.as_str(), path = %request.path, "calling Copper API");

        let mut builder = match request.method {
            ApiMethod::Get => self.client.get(&url),
            ApiMethod::Post => self.client.post(&url),
            ApiMethod::Put => self.client.put(&url),
        };
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = request.body.as_ref() {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|error| {
            CoreError::DependencyUnavailable(format!("Copper API request failed: {error}"))
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|error| {
            CoreError::DependencyUnavailable(format!("Copper API response read failed: {error}"))
        })?;

        if !status.is_success() {
            return Err(CoreError::Api {
                status: status.as_u16(),
                message: truncate_for_error(&body),
            });
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).map_err(|error| {
            CoreError::DependencyUnavailable(format!(
                "Copper API response was malformed JSON: {error}"
            ))
        })
    }
}

fn truncate_for_error(body: &str) -> String {
    const MAX_LEN: usize = 200;
    if body.chars().count() <= MAX_LEN {
        body.to_owned()
    } else {
        format!("{}...", body.chars().take(MAX_LEN).collect::<String>())
    }
}
