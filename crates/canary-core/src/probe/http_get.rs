use std::time::Duration;

use async_trait::async_trait;
use canary_types::{CheckError, HttpGetAction, HttpHeader, Scheme};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::{Map, Value};
use tracing::debug;

use super::{Attempt, Prober};
use crate::container::ContainerHandle;

/// Sends a GET request to a published port.
///
/// Passes when a response arrives and every required response header is
/// present with exactly the expected value. Repeated headers are compared
/// with their values concatenated.
pub struct HttpGetProber {
    client: reqwest::Client,
    url: String,
    headers: HeaderMap,
    required: Vec<HttpHeader>,
}

impl HttpGetProber {
    pub fn new(action: &HttpGetAction, host: &str, timeout: Duration) -> Result<Self, CheckError> {
        let path = if action.path.starts_with('/') {
            action.path.clone()
        } else {
            format!("/{}", action.path)
        };
        let url = format!("{}://{}:{}{}", action.scheme.as_str(), host, action.port, path);

        let mut headers = HeaderMap::new();
        for h in &action.http_headers {
            let name = HeaderName::from_bytes(h.name.as_bytes()).map_err(|e| {
                CheckError::Evaluation(format!("invalid request header name '{}': {e}", h.name))
            })?;
            let value = HeaderValue::from_str(&h.value).map_err(|e| {
                CheckError::Evaluation(format!("invalid value for request header '{}': {e}", h.name))
            })?;
            // Last value wins for a repeated name
            headers.insert(name, value);
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            // Containers serve self-signed certificates
            .danger_accept_invalid_certs(action.scheme == Scheme::Https)
            .build()
            .map_err(|e| CheckError::Evaluation(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url,
            headers,
            required: action.response_http_headers.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Prober for HttpGetProber {
    async fn probe(&self, _container: &dyn ContainerHandle) -> Result<Attempt, CheckError> {
        let resp = match self
            .client
            .get(&self.url)
            .headers(self.headers.clone())
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                debug!(url = %self.url, error = %e, "HTTP probe request failed");
                return Ok(Attempt::new(false).with("error", e.to_string()));
            }
        };

        let status = resp.status();
        let passed = self
            .required
            .iter()
            .all(|h| header_matches(resp.headers(), h));

        Ok(Attempt::new(passed)
            .with("status", status.as_u16())
            .with("headers", headers_json(resp.headers())))
    }

    fn kind(&self) -> &'static str {
        "httpGet"
    }
}

fn header_matches(headers: &HeaderMap, expected: &HttpHeader) -> bool {
    let values: Vec<&str> = headers
        .get_all(expected.name.as_str())
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();
    !values.is_empty() && values.concat() == expected.value
}

fn headers_json(headers: &HeaderMap) -> Value {
    let mut map = Map::new();
    for name in headers.keys() {
        let values: Vec<Value> = headers
            .get_all(name)
            .iter()
            .map(|v| Value::String(String::from_utf8_lossy(v.as_bytes()).to_string()))
            .collect();
        map.insert(name.as_str().to_string(), Value::Array(values));
    }
    Value::Object(map)
}
