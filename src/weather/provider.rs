use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Current,
    Forecast,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Current => "weather",
            Endpoint::Forecast => "forecast",
        }
    }
}

/// Status and raw body, handed back unjudged so the pipeline owns the policy.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub status: u16,
    pub body: String,
}

pub type QueryParams = Vec<(&'static str, String)>;

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn get(&self, endpoint: Endpoint, params: &QueryParams) -> anyhow::Result<ProviderResponse>;
}

#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    http: Client,
    base_url: String,
}

impl OpenWeatherClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .context("build weather http client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    /// Transport errors drop the request URL: its query string carries the API key.
    async fn get(&self, endpoint: Endpoint, params: &QueryParams) -> anyhow::Result<ProviderResponse> {
        let url = format!("{}/{}", self.base_url, endpoint.path());
        let res = self
            .http
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .with_context(|| format!("send request to weather provider ({})", endpoint.path()))?;

        let status = res.status().as_u16();
        let body = res
            .text()
            .await
            .map_err(reqwest::Error::without_url)
            .context("read weather provider response body")?;
        debug!(endpoint = endpoint.path(), status, "weather provider responded");
        Ok(ProviderResponse { status, body })
    }
}
