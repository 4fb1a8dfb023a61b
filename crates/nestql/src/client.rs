//! Blocking HTTP client for the `_search` endpoint.
//!
//! Plain HTTP, no auth: the transport defaults match a local development
//! OpenSearch node.

use reqwest::{StatusCode, blocking::Client};
use serde_json::Value;
use thiserror::Error;

/// Errors from issuing a search request.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request could not be sent or the response body not read.
    #[error("search request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("search request returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: StatusCode,
        /// Response body, verbatim.
        body: String,
    },
}

/// A search client bound to one host and port.
pub struct SearchClient {
    /// Endpoint base, e.g. `http://localhost:9200`.
    base: String,
    /// Underlying HTTP client.
    http: Client,
}

impl SearchClient {
    /// Creates a client for the given host and port.
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            base: format!("http://{host}:{port}"),
            http: Client::new(),
        }
    }

    /// POSTs the request body to `<index>/_search` and returns the raw
    /// response body.
    pub fn search(
        &self,
        index: &str,
        body: &Value,
        source_includes: Option<&str>,
    ) -> Result<String, ClientError> {
        let url = format!("{}/{}/_search", self.base, index);
        let mut request = self.http.post(url).json(body);
        if let Some(csv) = source_includes {
            request = request.query(&[("_source_includes", csv)]);
        }

        let response = request.send()?;
        let status = response.status();
        let text = response.text()?;
        if !status.is_success() {
            return Err(ClientError::Status { status, body: text });
        }

        Ok(text)
    }
}
