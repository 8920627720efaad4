//! In-memory backend: records every request it is asked to execute and
//! answers with queued responses. Useful for tests of generated clients
//! and for simulating an API without a server.

use std::{
    collections::{HashMap, VecDeque},
    io::Read,
    sync::{
        Arc, Mutex, RwLock,
        atomic::{AtomicBool, Ordering},
    },
};

use http::StatusCode;

use crate::{
    client::{Client, ClientFactory, Endpoint},
    config::ClientConfig,
    descriptor::{Body, RequestDescriptor},
    error::{ConstructionError, TransportError},
    params::Params,
    response::Response,
};

/// A request as the stub saw it, binary body drained into memory.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub descriptor: RequestDescriptor,
    pub body: Option<Vec<u8>>,
}

pub struct StubClient {
    endpoint: Endpoint,
    config: ClientConfig,
    default_headers: RwLock<Params>,
    recorded: Mutex<Vec<RecordedRequest>>,
    responses: Mutex<VecDeque<Result<Response, TransportError>>>,
    closed: AtomicBool,
}

impl StubClient {
    pub fn new(endpoint: Endpoint, config: ClientConfig, default_headers: Params) -> Self {
        StubClient {
            endpoint,
            config,
            default_headers: RwLock::new(default_headers),
            recorded: Mutex::new(Vec::new()),
            responses: Mutex::new(VecDeque::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// queue the outcome of a future `execute` call; once the queue is empty,
    /// requests are answered with an empty `200 OK`
    pub fn enqueue(&self, outcome: Result<Response, TransportError>) {
        self.responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(outcome);
    }

    pub fn add_default_header(&self, key: impl Into<String>, value: impl Into<String>) {
        self.default_headers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .add(key, value);
    }

    pub fn recorded(&self) -> Vec<RecordedRequest> {
        self.recorded
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.recorded
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .last()
            .cloned()
    }

    fn drain_body(request: &RequestDescriptor) -> Result<Option<Vec<u8>>, TransportError> {
        let bytes = match request.body() {
            None => return Ok(None),
            Some(Body::Binary(binary)) => {
                let mut buf = Vec::new();
                binary.open()?.read_to_end(&mut buf)?;
                buf
            }
            Some(Body::Json(value)) => serde_json::to_vec(value)
                .map_err(|e| TransportError::InvalidRequest(e.to_string()))?,
            Some(Body::Text(text)) => text.clone().into_bytes(),
        };
        Ok(Some(bytes))
    }
}

impl Client for StubClient {
    fn execute(&self, request: &RequestDescriptor) -> Result<Response, TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }
        let body = Self::drain_body(request)?;
        log::trace!(
            "stub {} recording {} {}",
            self.endpoint,
            request.method(),
            request.path_and_query()
        );
        self.recorded
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(RecordedRequest {
                descriptor: request.clone(),
                body,
            });

        let next = self
            .responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        next.unwrap_or_else(|| Ok(Response::with_status(StatusCode::OK)))
    }

    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    fn default_headers(&self) -> Params {
        self.default_headers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

#[derive(Debug, Default, Clone)]
pub struct StubClientFactory;

impl StubClientFactory {
    pub fn new() -> Self {
        StubClientFactory
    }

    /// like [ClientFactory::create_client], but keeps the concrete type so
    /// callers can inspect what was recorded
    pub fn create_stub(
        &self,
        host: &str,
        port: i32,
        protocol: &str,
        prefix: &str,
        config: ClientConfig,
        default_headers: HashMap<String, String>,
    ) -> Result<Arc<StubClient>, ConstructionError> {
        let endpoint = Endpoint::new(host, port, protocol, prefix)?;
        config.validate()?;
        Ok(Arc::new(StubClient::new(
            endpoint,
            config,
            default_headers.into(),
        )))
    }
}

impl ClientFactory for StubClientFactory {
    fn create_client(
        &self,
        host: &str,
        port: i32,
        protocol: &str,
        prefix: &str,
        config: ClientConfig,
        default_headers: HashMap<String, String>,
    ) -> Result<Arc<dyn Client>, ConstructionError> {
        let client: Arc<dyn Client> =
            self.create_stub(host, port, protocol, prefix, config, default_headers)?;
        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use http::Method;
    use test_log::test;

    use super::*;
    use crate::{BinaryRequest, PayloadError, RequestBuilder};

    fn stub(host: &str) -> Arc<StubClient> {
        StubClientFactory::new()
            .create_stub(host, 80, "http", "", ClientConfig::default(), HashMap::new())
            .unwrap()
    }

    #[test]
    fn test_factory_clients_are_independent() {
        let a = stub("a.example.org");
        let b = stub("b.example.org");

        a.add_default_header("Authorization", "Bearer a");
        assert_eq!(Some("Bearer a"), a.default_headers().first("Authorization"));
        assert!(b.default_headers().is_empty());

        a.close();
        let request = RequestBuilder::new(b.clone()).seal(Method::GET);
        assert!(b.execute(&request).is_ok());
        assert!(matches!(a.execute(&request), Err(TransportError::Closed)));
    }

    #[test]
    fn test_default_headers_are_copied() -> anyhow::Result<()> {
        let mut headers = HashMap::new();
        headers.insert("X-Api-Key".to_string(), "secret".to_string());
        let client = StubClientFactory::new().create_client(
            "localhost",
            80,
            "http",
            "",
            ClientConfig::default(),
            headers.clone(),
        )?;
        headers.insert("X-Other".to_string(), "late".to_string());

        let defaults = client.default_headers();
        assert_eq!(Some("secret"), defaults.first("X-Api-Key"));
        assert!(!defaults.contains_key("X-Other"));
        Ok(())
    }

    #[test]
    fn test_factory_fails_fast() {
        let factory = StubClientFactory::new();
        let create = |host: &str, port: i32, protocol: &str| {
            factory.create_client(
                host,
                port,
                protocol,
                "",
                ClientConfig::default(),
                HashMap::new(),
            )
        };
        assert!(matches!(
            create("localhost", -1, "http"),
            Err(ConstructionError::InvalidPort(-1))
        ));
        assert!(matches!(
            create("", 80, "http"),
            Err(ConstructionError::EmptyHost)
        ));
        assert!(matches!(
            create("localhost", 80, "gopher"),
            Err(ConstructionError::UnsupportedProtocol(_))
        ));

        let config = ClientConfig {
            max_connections: -2,
            ..ClientConfig::default()
        };
        assert!(matches!(
            factory.create_client("localhost", 80, "http", "", config, HashMap::new()),
            Err(ConstructionError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_queued_responses_and_errors() {
        let client = stub("localhost");
        client.enqueue(Ok(Response::with_status(StatusCode::CREATED)));
        client.enqueue(Err(TransportError::Timeout("stubbed".to_string())));

        let builder = RequestBuilder::new(client.clone()).append_segment("animals");
        assert_eq!(
            StatusCode::CREATED,
            builder.execute(Method::POST).unwrap().status()
        );
        assert!(matches!(
            builder.execute(Method::POST),
            Err(TransportError::Timeout(_))
        ));
        assert_eq!(StatusCode::OK, builder.execute(Method::GET).unwrap().status());
        assert_eq!(3, client.recorded().len());
    }

    #[test]
    fn test_binary_bodies_are_drained() {
        let client = stub("localhost");
        let builder = RequestBuilder::new(client.clone())
            .append_segment("upload")
            .with_body(BinaryRequest::bytes(b"abc".to_vec()));
        builder.execute(Method::PUT).unwrap();
        assert_eq!(Some(b"abc".to_vec()), client.last_request().unwrap().body);

        let missing = builder.with_body(BinaryRequest::file("/no/such/file/anywhere"));
        assert!(matches!(
            missing.execute(Method::PUT),
            Err(TransportError::Payload(PayloadError::Io(_)))
        ));
        assert_eq!(1, client.recorded().len());
    }
}
