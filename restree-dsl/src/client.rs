//! The executor side of the DSL: a [Client] runs sealed requests against one
//! [Endpoint], and a [ClientFactory] is how generated code gets hold of one
//! without knowing which HTTP backend is behind it.

use std::{collections::HashMap, fmt, str::FromStr, sync::Arc};

use url::Url;

use crate::{
    config::ClientConfig,
    descriptor::RequestDescriptor,
    error::{ConstructionError, TransportError},
    params::Params,
    response::Response,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    Http,
    Https,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
        }
    }
}

impl FromStr for Protocol {
    type Err = ConstructionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(Protocol::Http),
            "https" => Ok(Protocol::Https),
            _ => Err(ConstructionError::UnsupportedProtocol(s.to_string())),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/**
The validated connection parameters of a client: where requests go, and the
path prefix every request path is appended to.
The prefix is stored normalized: empty, or starting with `/` and without a trailing `/`.
*/
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    protocol: Protocol,
    host: String,
    port: u16,
    prefix: String,
}

impl Endpoint {
    pub fn new(
        host: &str,
        port: i32,
        protocol: &str,
        prefix: &str,
    ) -> Result<Self, ConstructionError> {
        let host = host.trim();
        if host.is_empty() {
            return Err(ConstructionError::EmptyHost);
        }
        url::Host::parse(host).map_err(|e| ConstructionError::InvalidHost {
            host: host.to_string(),
            reason: e.to_string(),
        })?;

        let port = match u16::try_from(port) {
            Ok(p) if p > 0 => p,
            _ => return Err(ConstructionError::InvalidPort(port)),
        };

        Ok(Endpoint {
            protocol: protocol.parse()?,
            host: host.to_string(),
            port,
            prefix: normalize_prefix(prefix)?,
        })
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// `protocol://host:port/prefix/`
    pub fn base_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&format!("{self}{}/", self.prefix))
    }

    /// Absolute URL for `request`, prefix and query string included.
    pub fn url_for(&self, request: &RequestDescriptor) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(&self.to_string())?;
        url.set_path(&format!("{}{}", self.prefix, request.path()));
        if !request.query().is_empty() {
            url.set_query(Some(&request.query_string()));
        }
        Ok(url)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", self.protocol, self.host, self.port)
    }
}

fn normalize_prefix(prefix: &str) -> Result<String, ConstructionError> {
    if prefix
        .chars()
        .any(|c| c.is_whitespace() || c == '?' || c == '#')
    {
        return Err(ConstructionError::InvalidPrefix(prefix.to_string()));
    }
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        Ok(String::new())
    } else if trimmed.contains("//") {
        Err(ConstructionError::InvalidPrefix(prefix.to_string()))
    } else {
        Ok(format!("/{trimmed}"))
    }
}

/**
Executes sealed requests against a single [Endpoint].

Implementations may pool connections, retry or time out as they see fit, but
they must not alter the descriptor and `execute` must be callable from
several threads at once.
*/
pub trait Client: Send + Sync {
    fn execute(&self, request: &RequestDescriptor) -> Result<Response, TransportError>;

    fn endpoint(&self) -> &Endpoint;

    /// snapshot of the headers sent with every request
    fn default_headers(&self) -> Params;

    fn config(&self) -> &ClientConfig;

    /// release backend resources. Requests after closing fail with [TransportError::Closed].
    fn close(&self) {}
}

/**
Builds [Client]s. This is the only thing that needs replacing to run
generated code on a different HTTP backend.

Every call yields an independent client; nothing is shared between two
clients created by the same factory.
*/
pub trait ClientFactory {
    fn create_client(
        &self,
        host: &str,
        port: i32,
        protocol: &str,
        prefix: &str,
        config: ClientConfig,
        default_headers: HashMap<String, String>,
    ) -> Result<Arc<dyn Client>, ConstructionError>;
}

#[cfg(test)]
mod tests {
    use http::Method;

    use super::*;
    use crate::RequestBuilder;

    #[test]
    fn test_invalid_endpoints() {
        assert!(matches!(
            Endpoint::new("localhost", -1, "http", ""),
            Err(ConstructionError::InvalidPort(-1))
        ));
        assert!(matches!(
            Endpoint::new("localhost", 0, "http", ""),
            Err(ConstructionError::InvalidPort(0))
        ));
        assert!(matches!(
            Endpoint::new("localhost", 70000, "http", ""),
            Err(ConstructionError::InvalidPort(70000))
        ));
        assert!(matches!(
            Endpoint::new(" ", 80, "http", ""),
            Err(ConstructionError::EmptyHost)
        ));
        assert!(matches!(
            Endpoint::new("bad host", 80, "http", ""),
            Err(ConstructionError::InvalidHost { .. })
        ));
        assert!(matches!(
            Endpoint::new("localhost", 80, "ftp", ""),
            Err(ConstructionError::UnsupportedProtocol(_))
        ));
        assert!(matches!(
            Endpoint::new("localhost", 80, "http", "a b"),
            Err(ConstructionError::InvalidPrefix(_))
        ));
    }

    #[test]
    fn test_prefix_normalization() -> anyhow::Result<()> {
        for (prefix, expected) in [
            ("", ""),
            ("/", ""),
            ("api", "/api"),
            ("/api/", "/api"),
            ("api/v1", "/api/v1"),
        ] {
            let endpoint = Endpoint::new("localhost", 80, "HTTP", prefix)?;
            assert_eq!(expected, endpoint.prefix(), "prefix '{prefix}'");
            assert_eq!(Protocol::Http, endpoint.protocol());
        }
        Ok(())
    }

    #[test]
    fn test_urls() -> anyhow::Result<()> {
        let endpoint = Endpoint::new("example.org", 8443, "https", "/api")?;
        assert_eq!(
            "https://example.org:8443/api/",
            endpoint.base_url()?.as_str()
        );

        let client = crate::StubClient::new(
            endpoint.clone(),
            ClientConfig::default(),
            Params::new(),
        );
        let request = RequestBuilder::new(Arc::new(client))
            .append_segment("animals")
            .add_query_param("name", "rex")
            .seal(Method::GET);
        assert_eq!(
            "https://example.org:8443/api/animals?name=rex",
            endpoint.url_for(&request)?.as_str()
        );
        Ok(())
    }
}
