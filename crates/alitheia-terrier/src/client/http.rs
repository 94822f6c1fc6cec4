//! HTTP layer: status mapping, retry, JSON decoding.
//!
//! Status codes are interpreted here and nowhere else; the accessor methods in
//! `client/mod.rs` only see `TerrierResult`.

use std::time::Duration;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::auth::Credentials;
use crate::error::{TerrierError, TerrierResult};

use super::helpers::resource_from_url;

/// Cap for server-provided Retry-After values.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(30);

/// Cap for exponential backoff between retries.
const MAX_BACKOFF: Duration = Duration::from_secs(10);

/// HTTP backend for making requests (holds reqwest client, credentials, retry budget).
#[derive(Debug, Clone)]
pub(crate) struct HttpBackend {
    pub(crate) client: reqwest::Client,
    pub(crate) base_url: String,
    pub(crate) credentials: Credentials,
    pub(crate) max_retries: u32,
}

impl HttpBackend {
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET and decode a JSON body.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: &str) -> TerrierResult<T> {
        let response = self.request::<()>(Method::GET, url, None).await?;
        decode(response, url).await
    }

    /// GET and decode a JSON body; 404 => None.
    pub(crate) async fn get_json_optional<T: DeserializeOwned>(
        &self,
        url: &str,
    ) -> TerrierResult<Option<T>> {
        match self.request::<()>(Method::GET, url, None).await {
            Ok(response) => decode(response, url).await.map(Some),
            Err(TerrierError::NotFound { resource }) => {
                debug!(resource = %resource, "resource not found");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// POST a JSON body and decode the JSON answer.
    pub(crate) async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> TerrierResult<T> {
        let response = self.request(Method::POST, url, Some(body)).await?;
        decode(response, url).await
    }

    /// POST a JSON body, ignoring the answer.
    pub(crate) async fn post_unit<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
    ) -> TerrierResult<()> {
        self.request(Method::POST, url, Some(body)).await?;
        Ok(())
    }

    /// Make a request, retrying transient failures with jittered backoff.
    ///
    /// Only GET is retried. Every POST is sent exactly once.
    pub(crate) async fn request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
    ) -> TerrierResult<reqwest::Response> {
        use rand::Rng;

        let max_retries = self.retry_budget(&method);
        let mut retries = 0;

        loop {
            let result = self.request_once(method.clone(), url, body).await;

            match result {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && retries < max_retries => {
                    retries += 1;

                    let backoff = match &e {
                        TerrierError::RateLimited {
                            retry_after: Some(retry_after),
                        } => {
                            let capped = (*retry_after).min(MAX_RETRY_AFTER);
                            let base_ms = capped.as_millis() as u64;
                            let jitter_factor: f64 =
                                rand::thread_rng().gen_range(0.9_f64..=1.1_f64);
                            let jittered_ms = ((base_ms as f64) * jitter_factor).round() as u64;
                            Duration::from_millis(jittered_ms.max(100))
                        }
                        _ => {
                            let base_backoff =
                                (Duration::from_millis(250) * (1u32 << retries.min(6))).min(MAX_BACKOFF);
                            let jittered_ms =
                                rand::thread_rng().gen_range(0..=base_backoff.as_millis() as u64);
                            Duration::from_millis(jittered_ms.max(10))
                        }
                    };

                    warn!(
                        error = %e,
                        retry = retries,
                        max_retries,
                        backoff_ms = backoff.as_millis(),
                        "retrying request"
                    );

                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn retry_budget(&self, method: &Method) -> u32 {
        if *method == Method::GET {
            self.max_retries
        } else {
            0
        }
    }

    async fn request_once<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
    ) -> TerrierResult<reqwest::Response> {
        let mut request = self.credentials.apply(self.client.request(method, url));

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        match status.as_u16() {
            200..=299 => Ok(response),

            401 | 403 => Err(TerrierError::Unauthorized {
                message: "credentials rejected by the framework".to_string(),
            }),

            404 => Err(TerrierError::NotFound {
                resource: resource_from_url(url, &self.base_url),
            }),

            429 => {
                let retry_after = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .map(Duration::from_secs);

                Err(TerrierError::RateLimited { retry_after })
            }

            _ => {
                let message = response.text().await.unwrap_or_else(|_| status.to_string());
                Err(TerrierError::Remote {
                    status: status.as_u16(),
                    message: message.chars().take(200).collect(),
                })
            }
        }
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response, url: &str) -> TerrierResult<T> {
    let text = response.text().await.map_err(|e| TerrierError::Network {
        message: format!("failed to read response body: {}", e),
    })?;
    serde_json::from_str(&text).map_err(|e| TerrierError::InvalidResponse {
        message: format!("failed to parse response from {}: {}", url, e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(max_retries: u32) -> HttpBackend {
        HttpBackend {
            client: reqwest::Client::new(),
            base_url: "http://localhost:8088/sqooss/ws".to_string(),
            credentials: Credentials::None,
            max_retries,
        }
    }

    #[test]
    fn test_only_get_is_retried() {
        let http = backend(3);
        assert_eq!(http.retry_budget(&Method::GET), 3);
        assert_eq!(http.retry_budget(&Method::POST), 0);
    }
}
