use http::Method;
use url::form_urlencoded;

use crate::{binary::BinaryRequest, params::Params};

/// A request body, as attached by [crate::RequestBuilder::with_body].
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Binary(BinaryRequest),
    /// structured payload, serialized by the client as `application/json`
    Json(serde_json::Value),
    Text(String),
}

impl Body {
    pub fn content_type(&self) -> &'static str {
        match self {
            Body::Binary(_) => "application/octet-stream",
            Body::Json(_) => "application/json",
            Body::Text(_) => "text/plain; charset=UTF-8",
        }
    }
}

impl From<BinaryRequest> for Body {
    fn from(value: BinaryRequest) -> Self {
        Body::Binary(value)
    }
}

impl From<serde_json::Value> for Body {
    fn from(value: serde_json::Value) -> Self {
        Body::Json(value)
    }
}

impl From<String> for Body {
    fn from(value: String) -> Self {
        Body::Text(value)
    }
}

impl From<&str> for Body {
    fn from(value: &str) -> Self {
        Body::Text(value.to_string())
    }
}

/**
A fully composed request, produced by [crate::RequestBuilder::seal].
There is no way to modify a descriptor once it exists; clients only ever
get a shared reference to it.
*/
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    method: Method,
    path: String,
    headers: Params,
    query: Params,
    body: Option<Body>,
}

impl RequestDescriptor {
    pub(crate) fn new(
        method: Method,
        path: String,
        headers: Params,
        query: Params,
        body: Option<Body>,
    ) -> Self {
        RequestDescriptor {
            method,
            path,
            headers,
            query,
            body,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// path relative to the client's endpoint prefix, always starting with `/`
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &Params {
        &self.headers
    }

    pub fn query(&self) -> &Params {
        &self.query
    }

    pub fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    /// `application/x-www-form-urlencoded` rendering of the query parameters,
    /// without the leading `?`. Multi-valued keys are repeated.
    pub fn query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.query.pairs())
            .finish()
    }

    pub fn path_and_query(&self) -> String {
        if self.query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.query_string())
        }
    }
}
