//! Request core shared by every service module.
//!
//! All traffic goes through [`ArchiveClient`]: one blocking `reqwest` client
//! configured from [`ClientConfig`]. Each helper sends exactly one request,
//! turns any non-2xx status into [`QueryError::HttpStatus`] and hands back the
//! body untouched. Nothing is retried.

use crate::config::ClientConfig;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::Url;
use serde::de::DeserializeOwned;
use skyquery_core::{QueryError, QueryResult};

/// Blocking client for the STScI archive services.
///
/// Service operations live in the [`ps1`](crate::ps1), [`mast`](crate::mast),
/// [`images`](crate::images) and [`hla`](crate::hla) modules as methods on
/// this type.
#[derive(Debug, Clone)]
pub struct ArchiveClient {
    http: Client,
    config: ClientConfig,
}

impl ArchiveClient {
    /// Client for the public STScI endpoints.
    pub fn new() -> QueryResult<Self> {
        Self::with_config(ClientConfig::default())
    }

    pub fn with_config(config: ClientConfig) -> QueryResult<Self> {
        let http = Client::builder()
            .user_agent(config.user_agent.as_str())
            // the blocking builder defaults to 30 s unless given None
            .timeout(config.timeout)
            // one connection per call; nothing is kept between requests
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| {
                QueryError::transport("(client setup)", &format!("Failed to create HTTP client: {}", e))
            })?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub(crate) fn get_text(&self, url: &Url) -> QueryResult<String> {
        let response = self.send(self.http.get(url.clone()), url.as_str())?;
        let body = response
            .text()
            .map_err(|e| QueryError::transport(url.as_str(), &format!("Failed to read response: {}", e)))?;
        log::trace!("{} bytes of text from {}", body.len(), url);
        Ok(body)
    }

    pub(crate) fn get_bytes(&self, url: &Url) -> QueryResult<Vec<u8>> {
        let response = self.send(self.http.get(url.clone()), url.as_str())?;
        let body = response
            .bytes()
            .map_err(|e| QueryError::transport(url.as_str(), &format!("Failed to read response: {}", e)))?;
        log::trace!("{} bytes from {}", body.len(), url);
        Ok(body.to_vec())
    }

    pub(crate) fn get_json<T: DeserializeOwned>(&self, url: &Url) -> QueryResult<T> {
        let body = self.get_text(url)?;
        serde_json::from_str(&body).map_err(|e| QueryError::parse("json", &e.to_string()))
    }

    pub(crate) fn post_form_text(&self, url: &str, form: &[(&str, &str)]) -> QueryResult<String> {
        let request = self
            .http
            .post(url)
            .header(reqwest::header::ACCEPT, "text/plain")
            .form(form);
        let response = self.send(request, url)?;
        let body = response
            .text()
            .map_err(|e| QueryError::transport(url, &format!("Failed to read response: {}", e)))?;
        log::trace!("{} bytes of text from {}", body.len(), url);
        Ok(body)
    }

    fn send(&self, request: RequestBuilder, url: &str) -> QueryResult<Response> {
        log::debug!("request: {}", url);
        let response = request
            .send()
            .map_err(|e| QueryError::transport(url, &format!("Network request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            log::debug!("HTTP {} from {}", status, url);
            return Err(QueryError::http_status(url, status.as_u16()));
        }
        Ok(response)
    }
}

/// Join `base` and query-string pairs into a URL.
///
/// Values are form-encoded. With no pairs, no `?` is appended.
pub(crate) fn build_url<K, V>(base: &str, params: &[(K, V)]) -> QueryResult<Url>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut url = Url::parse(base)
        .map_err(|e| QueryError::invalid_parameter("url", &format!("'{}': {}", base, e)))?;
    if !params.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (k, v) in params {
            pairs.append_pair(k.as_ref(), v.as_ref());
        }
    }
    Ok(url)
}
