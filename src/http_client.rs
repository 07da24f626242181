use std::time::Duration;

use anyhow::Context;
use governor::{
    clock::{QuantaClock, QuantaInstant},
    middleware::NoOpMiddleware,
    state::{InMemoryState, NotKeyed},
    RateLimiter,
};

const HTTP_REQUEST_TIMEOUT_SECONDS: u64 = 30;

type DirectRateLimiter =
    RateLimiter<NotKeyed, InMemoryState, QuantaClock, NoOpMiddleware<QuantaInstant>>;

/// Thin reqwest wrapper tying a client to a base url and an optional rate
/// limiter that is awaited before every request.
pub struct HttpClient {
    inner: reqwest::Client,
    base_url: reqwest::Url,
    rate_limiter: Option<DirectRateLimiter>,
}

impl HttpClient {
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::new()
    }

    pub async fn request<S: Into<String>>(
        &self,
        method: reqwest::Method,
        path: S,
    ) -> anyhow::Result<reqwest::RequestBuilder> {
        let path_owned = path.into();
        let url = self.base_url.join(path_owned.as_ref()).context(format!(
            "could not join {} and {} in an url",
            self.base_url, path_owned,
        ))?;

        if let Some(rate_limiter) = &self.rate_limiter {
            rate_limiter.until_ready().await;
        }

        Ok(self.inner.request(method, url))
    }
}

pub struct HttpClientBuilder {
    base_url: String,
    rate_limiter: Option<DirectRateLimiter>,
}

impl HttpClientBuilder {
    pub fn new() -> Self {
        Self {
            base_url: "".to_owned(),
            rate_limiter: None,
        }
    }

    pub fn base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn rate_limiter(mut self, rate_limiter: DirectRateLimiter) -> Self {
        self.rate_limiter = Some(rate_limiter);
        self
    }

    pub fn build(self) -> anyhow::Result<HttpClient> {
        let inner = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECONDS))
            .build()
            .context("could not build http client")?;

        Ok(HttpClient {
            inner,
            base_url: reqwest::Url::parse(self.base_url.as_str())
                .context(format!("could not parse url {}", self.base_url))?,
            rate_limiter: self.rate_limiter,
        })
    }
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
