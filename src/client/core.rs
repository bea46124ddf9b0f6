// File: src/client/core.rs
use crate::client::cert::NoVerifier;
use crate::client::middleware::{ApiHeadersLayer, ApiHeadersService};
use crate::config::Config;
use crate::error::{JournalError, Result};
use crate::model::{Event, EventPatch};

use http::{Method, Request, Uri};
use http_body_util::BodyExt;
use hyper_rustls::HttpsConnectorBuilder;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use tower_layer::Layer;

type HttpsClient = ApiHeadersService<
    Client<
        hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>,
        String,
    >,
>;

/// Characters left as-is in query values and path segments, as
/// `encodeURIComponent` does for the unreserved set.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

fn encode(s: &str) -> String {
    utf8_percent_encode(s, COMPONENT).to_string()
}

#[derive(Deserialize)]
struct EventsResponse {
    events: Vec<Event>,
}

/// JSON client for the backend's `/events` resources, scoped to one session.
#[derive(Clone, Debug)]
pub struct RemoteClient {
    http: HttpsClient,
    base_url: String,
    session_id: String,
    timeout: Duration,
    fetch_limit: Option<u32>,
}

impl RemoteClient {
    pub fn new(url: &str, session_id: &str, insecure: bool, timeout: Duration) -> Result<Self> {
        let session_id = session_id.trim();
        if session_id.is_empty() {
            return Err(JournalError::config("Remote backend requires a session id"));
        }

        let base_url = url.trim().trim_end_matches('/').to_string();
        let uri: Uri = base_url
            .parse()
            .map_err(|e: http::uri::InvalidUri| {
                JournalError::config(format!("Invalid backend URL '{}': {}", url, e))
            })?;
        if uri.scheme().is_none() || uri.authority().is_none() {
            return Err(JournalError::config(format!(
                "Backend URL '{}' must be absolute (http:// or https://)",
                url
            )));
        }

        let tls_config_builder = rustls::ClientConfig::builder();

        let tls_config = if insecure {
            tls_config_builder
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(NoVerifier))
                .with_no_client_auth()
        } else {
            let mut root_store = rustls::RootCertStore::empty();
            let result = rustls_native_certs::load_native_certs();
            root_store.add_parsable_certificates(result.certs);
            if root_store.is_empty() {
                return Err(JournalError::config("No valid system certificates found."));
            }
            tls_config_builder
                .with_root_certificates(root_store)
                .with_no_client_auth()
        };

        let https_connector = HttpsConnectorBuilder::new()
            .with_tls_config(tls_config)
            .https_or_http()
            .enable_http1()
            .build();

        let http_client = Client::builder(TokioExecutor::new()).build(https_connector);
        let http = ApiHeadersLayer::new(ApiHeadersLayer::default_user_agent()).layer(http_client);

        Ok(Self {
            http,
            base_url,
            session_id: session_id.to_string(),
            timeout,
            fetch_limit: None,
        })
    }

    /// Builds the client described by `config`.
    ///
    /// `Ok(None)` means local-only operation: no backend URL, or a URL
    /// without a session. A session without a URL is a configuration error.
    pub fn from_config(config: &Config) -> Result<Option<Self>> {
        let session = config.active_session();
        if config.backend_url.trim().is_empty() {
            if session.is_some() {
                return Err(JournalError::config(
                    "A session id is set but no backend_url is configured",
                ));
            }
            return Ok(None);
        }
        let Some(session) = session else {
            log::info!("No remote session configured; using local storage only");
            return Ok(None);
        };

        let client = Self::new(
            &config.backend_url,
            session,
            config.allow_insecure_certs,
            Duration::from_secs(config.timeout_secs.max(1)),
        )?
        .with_fetch_limit(config.remote_fetch_limit);
        Ok(Some(client))
    }

    pub fn with_fetch_limit(mut self, limit: Option<u32>) -> Self {
        self.fetch_limit = limit;
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn event_path(&self, id: &str) -> String {
        format!("/events/{}?session_id={}", encode(id), encode(&self.session_id))
    }

    /// Sends one request and returns the body of a 2xx response.
    /// Any other outcome, including a timeout, is a `RemoteCall` error.
    async fn send(&self, method: Method, path_and_query: &str, body: String) -> Result<Vec<u8>> {
        let uri = format!("{}{}", self.base_url, path_and_query);
        let req = Request::builder()
            .method(method.clone())
            .uri(&uri)
            .body(body)
            .map_err(|e| JournalError::remote(format!("{} {}: {}", method, uri, e)))?;

        log::debug!("{} {}", method, uri);
        let call = async {
            let resp = self
                .http
                .clone()
                .oneshot(req)
                .await
                .map_err(|e| JournalError::remote(format!("{} {}: {}", method, uri, e)))?;
            let status = resp.status();
            let bytes = resp
                .into_body()
                .collect()
                .await
                .map_err(|e| JournalError::remote(format!("{} {}: {}", method, uri, e)))?
                .to_bytes();
            if !status.is_success() {
                return Err(JournalError::remote(format!(
                    "{} {} returned {}",
                    method, uri, status
                )));
            }
            Ok(bytes.to_vec())
        };

        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| {
                JournalError::remote(format!(
                    "{} {} timed out after {:?}",
                    method, uri, self.timeout
                ))
            })?
    }

    /// `GET /events?session_id=<id>[&limit=<n>]`
    pub async fn fetch_events(&self) -> Result<Vec<Event>> {
        let mut path = format!("/events?session_id={}", encode(&self.session_id));
        if let Some(limit) = self.fetch_limit {
            path.push_str(&format!("&limit={}", limit));
        }
        let body = self.send(Method::GET, &path, String::new()).await?;
        let parsed: EventsResponse = serde_json::from_slice(&body)
            .map_err(|e| JournalError::remote(format!("Malformed events response: {}", e)))?;
        Ok(parsed.events)
    }

    /// `PUT /events/{id}?session_id=<id>` with the patch as body.
    pub async fn update_event(&self, id: &str, patch: &EventPatch) -> Result<()> {
        let body = serde_json::to_string(patch)
            .map_err(|e| JournalError::remote(format!("Cannot encode update: {}", e)))?;
        self.send(Method::PUT, &self.event_path(id), body).await?;
        Ok(())
    }

    /// `DELETE /events/{id}?session_id=<id>`
    pub async fn delete_event(&self, id: &str) -> Result<()> {
        self.send(Method::DELETE, &self.event_path(id), String::new())
            .await?;
        Ok(())
    }
}
