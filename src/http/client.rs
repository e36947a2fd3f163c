//! Single-shot HTTP client

use bytes::BytesMut;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Url};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::body::{JSON_CONTENT_TYPE, encode_body, parse_body};
use super::error::{HttpError, Result};
use super::types::{Body, HeadersMap, Request, RequestOptions, Response};
use crate::config::HttpConfig;
use crate::humanize::ByteSize;
use crate::observability::Metrics;

/// Issues one request per call and parses the response; never retries
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    base_url: Option<Url>,
    default_headers: HeaderMap,
    timeout: Duration,
    max_response_bytes: ByteSize,
    metrics: Arc<Metrics>,
}

impl HttpClient {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout.as_duration())
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(HttpError::Client)?;

        let base_url = config
            .base_url
            .as_deref()
            .map(|base| {
                Url::parse(base)
                    .map_err(|e| HttpError::InvalidArgument(format!("base_url {base:?}: {e}")))
            })
            .transpose()?;

        Ok(Self {
            client,
            base_url,
            default_headers: to_header_map(&config.default_headers)?,
            timeout: config.timeout.as_duration(),
            max_response_bytes: config.max_response_bytes,
            metrics: Arc::new(Metrics::new()),
        })
    }

    /// Share a metrics handle with other components
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub async fn get(&self, url: &str, options: RequestOptions) -> Result<Response> {
        self.execute(Request::get(url).with_options(options)).await
    }

    pub async fn post(
        &self,
        url: &str,
        body: Option<Body>,
        options: RequestOptions,
    ) -> Result<Response> {
        let mut request = Request::post(url).with_options(options);
        request.body = body;
        self.execute(request).await
    }

    /// Send a request and parse the response
    ///
    /// Argument errors are reported before any network I/O.
    pub async fn execute(&self, request: Request) -> Result<Response> {
        let url = self.resolve_url(&request.url)?;
        let url_text = url.to_string();
        let timeout = request.options.timeout.unwrap_or(self.timeout);

        if timeout.is_zero() {
            return Err(HttpError::InvalidArgument(
                "timeout must be greater than zero".to_string(),
            ));
        }

        let mut headers = self.default_headers.clone();
        headers.extend(to_header_map(&request.options.headers)?);

        let encoded = request.body.map(encode_body);
        if let Some(body) = &encoded {
            if body.is_json && !headers.contains_key(CONTENT_TYPE) {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
            }
        }

        let mut builder = self
            .client
            .request(request.method.as_reqwest(), url)
            .headers(headers)
            .timeout(timeout);
        if !request.options.params.is_empty() {
            builder = builder.query(&request.options.params);
        }
        if let Some(body) = encoded {
            builder = builder.body(body.bytes);
        }

        debug!(method = ?request.method, url = %url_text, "Sending request");
        self.metrics.http_request();

        let result = self.receive(builder, &url_text, timeout).await;
        if let Err(e) = &result {
            self.metrics.http_failure();
            warn!(url = %url_text, error = %e, "Request failed");
        }
        result
    }

    async fn receive(
        &self,
        builder: reqwest::RequestBuilder,
        url: &str,
        timeout: Duration,
    ) -> Result<Response> {
        let mut response = builder
            .send()
            .await
            .map_err(|e| HttpError::from_reqwest(url, timeout, e))?;

        let status = response.status().as_u16();
        if !(100..=599).contains(&status) {
            return Err(HttpError::Protocol {
                url: url.to_string(),
                reason: format!("status code {status} outside 100..=599"),
            });
        }

        let limit = self.max_response_bytes;
        let declared = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());
        if declared.is_some_and(|len| len > limit.as_u64()) {
            return Err(HttpError::BodyTooLarge {
                url: url.to_string(),
                limit,
            });
        }

        let headers = from_header_map(response.headers());

        // Chunked bodies carry no length; stop reading once the limit is passed.
        let mut bytes = BytesMut::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| HttpError::from_reqwest(url, timeout, e))?
        {
            if (bytes.len() + chunk.len()) as u64 > limit.as_u64() {
                return Err(HttpError::BodyTooLarge {
                    url: url.to_string(),
                    limit,
                });
            }
            bytes.extend_from_slice(&chunk);
        }

        debug!(url, status, size = bytes.len(), "Response received");

        Ok(Response {
            status,
            headers,
            body: parse_body(&bytes),
        })
    }

    /// Resolve a request URL, joining relative paths onto the base URL
    fn resolve_url(&self, raw: &str) -> Result<Url> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(HttpError::InvalidArgument("url must not be empty".to_string()));
        }

        let parsed = match &self.base_url {
            Some(base) => base.join(trimmed),
            None => Url::parse(trimmed),
        };
        let url =
            parsed.map_err(|e| HttpError::InvalidArgument(format!("url {trimmed:?}: {e}")))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(HttpError::InvalidArgument(format!(
                "unsupported url scheme {:?}",
                url.scheme()
            )));
        }

        Ok(url)
    }
}

fn to_header_map(headers: &HeadersMap) -> Result<HeaderMap> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| HttpError::InvalidArgument(format!("invalid header name {name:?}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| HttpError::InvalidArgument(format!("invalid value for header {name}")))?;
        map.insert(name, value);
    }
    Ok(map)
}

/// Flatten response headers; repeated headers are joined with ", "
fn from_header_map(headers: &HeaderMap) -> HeadersMap {
    let mut map = HeadersMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        map.entry(name.as_str().to_string())
            .and_modify(|existing: &mut String| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_with_base(base: Option<&str>) -> HttpClient {
        let config = HttpConfig {
            base_url: base.map(str::to_string),
            ..HttpConfig::default()
        };
        HttpClient::new(&config).unwrap()
    }

    #[test]
    fn test_resolve_absolute_url() {
        let client = client_with_base(None);
        let url = client.resolve_url("http://example.test/a").unwrap();
        assert_eq!(url.as_str(), "http://example.test/a");
    }

    #[test]
    fn test_resolve_relative_against_base() {
        let client = client_with_base(Some("http://api.example.test/v1/"));
        let url = client.resolve_url("items?page=2").unwrap();
        assert_eq!(url.as_str(), "http://api.example.test/v1/items?page=2");
    }

    #[test]
    fn test_resolve_rejects_empty_and_relative_without_base() {
        let client = client_with_base(None);
        assert!(matches!(
            client.resolve_url("   "),
            Err(HttpError::InvalidArgument(_))
        ));
        assert!(matches!(
            client.resolve_url("items"),
            Err(HttpError::InvalidArgument(_))
        ));
        assert!(matches!(
            client.resolve_url("ftp://example.test/file"),
            Err(HttpError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_invalid_base_url_rejected_at_construction() {
        let config = HttpConfig {
            base_url: Some("::nope".to_string()),
            ..HttpConfig::default()
        };
        assert!(matches!(
            HttpClient::new(&config),
            Err(HttpError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_header_map_round_trip_joins_duplicates() {
        let mut headers = HeaderMap::new();
        headers.append("set-cookie", HeaderValue::from_static("a=1"));
        headers.append("set-cookie", HeaderValue::from_static("b=2"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));

        let flat = from_header_map(&headers);
        assert_eq!(flat["set-cookie"], "a=1, b=2");
        assert_eq!(flat["content-type"], "text/plain");
    }

    #[test]
    fn test_invalid_header_name_is_invalid_argument() {
        let mut headers = HeadersMap::new();
        headers.insert("bad header".to_string(), "x".to_string());
        assert!(matches!(
            to_header_map(&headers),
            Err(HttpError::InvalidArgument(_))
        ));
    }
}
