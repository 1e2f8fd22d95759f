//! HTTP client for the Kubernetes API server.

use crate::config::{Auth, ClientConfig};
use crate::error::{ClientError, ClientResult};
use crate::kubeconfig::Kubeconfig;
use crate::types::{PodList, ServiceList};
use reqwest::{header, Certificate, Client, Identity, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Read access to namespaced resources.
///
/// Implementations are shared by every tool handler and must be safe for
/// concurrent use.
#[async_trait::async_trait]
pub trait ResourceClient: Send + Sync {
    /// List all pods in a namespace
    async fn list_pods(&self, namespace: &str) -> ClientResult<PodList>;

    /// List all services in a namespace
    async fn list_services(&self, namespace: &str) -> ClientResult<ServiceList>;
}

/// Kubernetes API client.
#[derive(Debug, Clone)]
pub struct KubeClient {
    client: Client,
    config: Arc<ClientConfig>,
}

impl KubeClient {
    /// Create a new client with the given configuration.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let mut builder = Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.insecure_skip_tls_verify);

        match &config.auth {
            Auth::None => {}
            Auth::BearerToken(token) => {
                let mut value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|_| ClientError::Config("Invalid bearer token format".to_string()))?;
                value.set_sensitive(true);
                headers.insert(header::AUTHORIZATION, value);
            }
            Auth::ClientCertificate { cert_pem, key_pem } => {
                let mut pem = key_pem.clone();
                pem.push(b'\n');
                pem.extend_from_slice(cert_pem);
                builder = builder.identity(Identity::from_pem(&pem)?);
            }
        }

        if let Some(ca_pem) = &config.ca_pem {
            for cert in Certificate::from_pem_bundle(ca_pem)? {
                builder = builder.add_root_certificate(cert);
            }
        }

        let client = builder.default_headers(headers).build()?;

        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    /// Create a client from a kubeconfig file, `$HOME/.kube/config` when no path is given.
    pub fn from_kubeconfig(path: Option<&Path>) -> ClientResult<Self> {
        let path = Kubeconfig::resolve_path(path)?;
        debug!(path = %path.display(), "Loading kubeconfig");

        let kubeconfig = Kubeconfig::read_from(&path)?;
        Self::new(kubeconfig.to_client_config()?)
    }

    /// The API server this client talks to.
    pub fn server(&self) -> &Url {
        &self.config.server
    }

    /// Build `<server>/api/v1/namespaces/<namespace>/<resource>`.
    fn namespaced_url(&self, namespace: &str, resource: &str) -> ClientResult<Url> {
        let mut url = self.config.server.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::Config("API server URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["api", "v1", "namespaces", namespace, resource]);
        Ok(url)
    }

    /// Send a request, retrying failures that [`ClientError::is_retryable`] accepts.
    async fn execute_with_retry(&self, request_builder: RequestBuilder) -> ClientResult<Response> {
        let policy = &self.config.retry;
        let mut attempt = 0;

        loop {
            let request = request_builder
                .try_clone()
                .ok_or_else(|| ClientError::Config("Request cannot be cloned".to_string()))?;

            let (error, retry_after) = match request.send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status().as_u16();
                    let retry_after = retry_after(&response);
                    let body = response.text().await.unwrap_or_default();
                    (ClientError::from_response(status, &body), retry_after)
                }
                Err(e) => (ClientError::from(e), None),
            };

            if attempt >= policy.max_retries || !error.is_retryable() {
                return Err(error);
            }

            let delay = policy.delay(attempt, retry_after);
            warn!(
                error = %error,
                attempt = attempt + 1,
                delay_ms = delay.as_millis() as u64,
                "Request failed, retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> ClientResult<T> {
        debug!(url = %url, "GET request");

        let response = self.execute_with_retry(self.client.get(url)).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// `Retry-After` in seconds. The HTTP-date form is not used by the API server.
fn retry_after(response: &Response) -> Option<Duration> {
    let value = response.headers().get(header::RETRY_AFTER)?.to_str().ok()?;
    value.trim().parse().ok().map(Duration::from_secs)
}

#[async_trait::async_trait]
impl ResourceClient for KubeClient {
    async fn list_pods(&self, namespace: &str) -> ClientResult<PodList> {
        let url = self.namespaced_url(namespace, "pods")?;
        self.get(url).await
    }

    async fn list_services(&self, namespace: &str) -> ClientResult<ServiceList> {
        let url = self.namespaced_url(namespace, "services")?;
        self.get(url).await
    }
}
