//! [reqwest] backend for restree generated clients.
//!
//! ```no_run
//! use std::collections::HashMap;
//! use restree_dsl::{ClientConfig, ClientFactory, PathSegment, RequestBuilder, Resource};
//! use restree_reqwest::ReqwestClientFactory;
//!
//! let client = ReqwestClientFactory
//!     .create_client("localhost", 8080, "http", "/api", ClientConfig::default(), HashMap::new())
//!     .unwrap();
//! let response = PathSegment::new("animals", &RequestBuilder::new(client)).get().unwrap();
//! println!("{}", response.status());
//! ```

use std::{
    collections::HashMap,
    fs::File,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use http::{HeaderName, HeaderValue, header::CONTENT_TYPE};
use reqwest::{blocking, redirect};
use restree_dsl::{
    BinaryRequest, Body, Client, ClientConfig, ClientFactory, ConstructionError, Endpoint, Params,
    PayloadError, RequestDescriptor, Response, TransportError,
};

/// Creates [ReqwestClient]s. Each client gets its own connection pool.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReqwestClientFactory;

impl ClientFactory for ReqwestClientFactory {
    fn create_client(
        &self,
        host: &str,
        port: i32,
        protocol: &str,
        prefix: &str,
        config: ClientConfig,
        default_headers: HashMap<String, String>,
    ) -> Result<Arc<dyn Client>, ConstructionError> {
        let endpoint = Endpoint::new(host, port, protocol, prefix)?;
        let client: Arc<dyn Client> =
            Arc::new(ReqwestClient::new(endpoint, config, default_headers.into())?);
        Ok(client)
    }
}

/**
A [Client] on top of a blocking [reqwest] client.

Connection failures are retried up to [ClientConfig::max_request_retry] times,
unless the body is a stream, which can't be sent twice. `read_timeout` and the
total connection limit aren't supported by this backend and are ignored.
*/
pub struct ReqwestClient {
    endpoint: Endpoint,
    config: ClientConfig,
    default_headers: Params,
    inner: blocking::Client,
    closed: AtomicBool,
}

impl ReqwestClient {
    pub fn new(
        endpoint: Endpoint,
        config: ClientConfig,
        default_headers: Params,
    ) -> Result<Self, ConstructionError> {
        config.validate()?;
        check_headers(&default_headers)?;

        let redirect_policy = if config.follow_redirect {
            redirect::Policy::default()
        } else {
            redirect::Policy::none()
        };
        let mut builder = blocking::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .pool_idle_timeout(config.pooled_connection_idle_timeout)
            .redirect(redirect_policy)
            .danger_accept_invalid_certs(config.accept_any_certificate);
        if let Some(limit) = config.pool_limit_per_host() {
            builder = builder.pool_max_idle_per_host(limit);
        }
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.as_str());
        }
        let inner = builder
            .build()
            .map_err(|e| ConstructionError::Backend(e.to_string()))?;

        log::debug!("created reqwest client for {endpoint}");
        Ok(ReqwestClient {
            endpoint,
            config,
            default_headers,
            inner,
            closed: AtomicBool::new(false),
        })
    }

    fn send_once(
        &self,
        request: &RequestDescriptor,
        url: &reqwest::Url,
        headers: &Params,
    ) -> Result<Response, TransportError> {
        let mut req = self.inner.request(request.method().clone(), url.clone());
        for (name, value) in headers.pairs() {
            req = req.header(name, value);
        }
        if let Some(body) = request.body() {
            if headers.get_ignore_case(CONTENT_TYPE.as_str()).is_none() {
                req = req.header(CONTENT_TYPE, body.content_type());
            }
            req = req.body(to_reqwest_body(body)?);
        }

        let response = req.send().map_err(map_error)?;
        let status = response.status();
        let response_headers: Params = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.bytes().map_err(map_error)?;
        Ok(Response::new(status, response_headers, body))
    }
}

impl Client for ReqwestClient {
    fn execute(&self, request: &RequestDescriptor) -> Result<Response, TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }
        let url = self
            .endpoint
            .url_for(request)
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
        let headers = self.default_headers.merged_with(request.headers());
        let retries = if is_repeatable(request) {
            self.config.max_request_retry
        } else {
            0
        };

        let mut attempt = 0;
        loop {
            match self.send_once(request, &url, &headers) {
                Err(TransportError::Connect(reason)) if attempt < retries => {
                    attempt += 1;
                    log::warn!(
                        "{} {url} failed to connect ({reason}), retry {attempt}/{retries}",
                        request.method()
                    );
                }
                outcome => return outcome,
            }
        }
    }

    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    fn default_headers(&self) -> Params {
        self.default_headers.clone()
    }

    fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

/// Every default header must be sendable, so a bad one fails here and not on the first request.
fn check_headers(headers: &Params) -> Result<(), ConstructionError> {
    for (name, value) in headers.pairs() {
        let invalid = |reason: String| ConstructionError::InvalidHeader {
            name: name.to_string(),
            reason,
        };
        HeaderName::try_from(name).map_err(|e| invalid(e.to_string()))?;
        HeaderValue::try_from(value).map_err(|e| invalid(e.to_string()))?;
    }
    Ok(())
}

fn is_repeatable(request: &RequestDescriptor) -> bool {
    !matches!(request.body(), Some(Body::Binary(BinaryRequest::Stream(_))))
}

/// The file of a file-backed payload is opened here and closed when reqwest drops the body.
fn to_reqwest_body(body: &Body) -> Result<blocking::Body, TransportError> {
    let body = match body {
        Body::Json(value) => blocking::Body::from(
            serde_json::to_vec(value).map_err(|e| TransportError::InvalidRequest(e.to_string()))?,
        ),
        Body::Text(text) => blocking::Body::from(text.clone()),
        Body::Binary(BinaryRequest::File(path)) => {
            log::trace!("opening file payload {}", path.display());
            let file = File::open(path).map_err(PayloadError::from)?;
            let len = file.metadata().map_err(PayloadError::from)?.len();
            blocking::Body::sized(file, len)
        }
        Body::Binary(binary) => {
            let reader = binary.open()?;
            match binary.len_hint() {
                Some(len) => blocking::Body::sized(reader, len),
                None => blocking::Body::new(reader),
            }
        }
    };
    Ok(body)
}

fn map_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout(e.to_string())
    } else if e.is_connect() {
        TransportError::Connect(e.to_string())
    } else if e.is_builder() {
        TransportError::InvalidRequest(e.to_string())
    } else if e.is_redirect() || e.is_decode() || e.is_body() {
        TransportError::Protocol(e.to_string())
    } else {
        TransportError::Backend(Box::new(e))
    }
}
