use crate::{EmbeddingBackend, JobError, Result as JobErrorResult};

use gp_config::EmbeddingConfig;

use std::error::Error as StdError;
use std::net::{IpAddr, SocketAddr};
use std::panic::Location;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use error_location::ErrorLocation;
use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use serde::{Deserialize, Serialize};

/// Embedding backend speaking `{model, input}` / `{embeddings}` over HTTP.
///
/// Only loopback hosts are reachable: IP literals are checked here, host
/// names are checked by the resolver every time a connection is dialled.
pub struct HttpEmbeddingBackend {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl HttpEmbeddingBackend {
    #[track_caller]
    pub fn new(endpoint: &str, model: &str, timeout: Duration) -> JobErrorResult<Self> {
        let url = reqwest::Url::parse(endpoint).map_err(|e| JobError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let host = url.host_str().ok_or_else(|| JobError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            message: "missing host".to_string(),
            location: ErrorLocation::from(Location::caller()),
        })?;

        if let Ok(ip) = host
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse::<IpAddr>()
            && !ip.is_loopback()
        {
            return Err(JobError::NonLoopbackHost {
                host: host.to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .no_proxy()
            .dns_resolver(Arc::new(LoopbackResolver))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            model: model.to_string(),
        })
    }

    pub fn from_config(config: &EmbeddingConfig) -> JobErrorResult<Self> {
        Self::new(
            &config.endpoint,
            &config.model,
            Duration::from_secs(config.timeout_secs),
        )
    }
}

#[async_trait]
impl EmbeddingBackend for HttpEmbeddingBackend {
    async fn embed(&self, input: &str) -> JobErrorResult<Vec<f32>> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&EmbedRequest {
                model: &self.model,
                input,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(JobError::backend(format!(
                "endpoint returned {}: {}",
                status.as_u16(),
                body
            )));
        }

        let parsed: EmbedResponse = response.json().await?;

        parsed
            .embeddings
            .into_iter()
            .next()
            .filter(|vector| !vector.is_empty())
            .ok_or_else(|| JobError::backend("response contained no embedding"))
    }
}

/// Resolves host names but refuses any answer that is not loopback
#[derive(Debug, Clone, Copy, Default)]
pub struct LoopbackResolver;

impl Resolve for LoopbackResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let host = name.as_str().to_string();

        Box::pin(async move {
            let addrs: Vec<SocketAddr> = tokio::net::lookup_host((host.as_str(), 0))
                .await?
                .collect();

            if addrs.is_empty() || addrs.iter().any(|addr| !addr.ip().is_loopback()) {
                let error: Box<dyn StdError + Send + Sync> = Box::new(JobError::NonLoopbackHost {
                    host,
                    location: ErrorLocation::from(Location::caller()),
                });
                return Err(error);
            }

            let addrs: Addrs = Box::new(addrs.into_iter());
            Ok(addrs)
        })
    }
}
