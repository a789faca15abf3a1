use std::sync::Arc;

use async_trait::async_trait;
use reqwest::cookie::Jar;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{Error, Result};

/// Client identifier sent with every request. The marker feed rejects
/// default library user agents.
pub const USER_AGENT: &str = concat!("furrymap-rs/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// A request relative to the transport's base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub form: Vec<(String, String)>,
}

impl Request {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            headers: Vec::new(),
            form: Vec::new(),
        }
    }

    pub fn post_form(path: impl Into<String>, form: Vec<(String, String)>) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            headers: Vec::new(),
            form,
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

/// Issues requests within one cookie scope and returns the body as text.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: Request) -> Result<String>;
}

/// reqwest-backed transport with its own cookie jar.
pub struct HttpTransport {
    base_url: String,
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .cookie_provider(Arc::new(Jar::default()))
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: Request) -> Result<String> {
        let url = format!("{}{}", self.base_url, request.path);
        debug!(method = ?request.method, %url, "Sending request");

        let mut builder = match request.method {
            Method::Get => self.http.get(&url),
            Method::Post => self.http.post(&url).form(&request.form),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let resp = builder.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Status { status, url });
        }
        Ok(resp.text().await?)
    }
}
