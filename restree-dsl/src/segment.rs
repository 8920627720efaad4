use std::fmt::Display;

use http::Method;
use serde::Serialize;

use crate::{
    builder::RequestBuilder,
    descriptor::{Body, RequestDescriptor},
    error::TransportError,
    response::Response,
};

/**
One node of a resource tree. It contributes a single path fragment (or
nothing, for pass-through nodes) to the builder branch it was created from,
and owns the resulting branch so child nodes can continue from it.

The parent builder is never modified: every constructor branches first.
*/
#[derive(Debug, Clone)]
pub struct PathSegment {
    fragment: String,
    builder: RequestBuilder,
}

impl PathSegment {
    /// node for a literal path fragment such as `rest`; surrounding `/` are dropped
    pub fn new(fragment: &str, parent: &RequestBuilder) -> Self {
        let fragment = fragment.trim_matches('/');
        PathSegment {
            fragment: fragment.to_string(),
            builder: parent.append_segment(fragment),
        }
    }

    /// node for a path parameter value such as the `42` in `/animals/42`;
    /// the value is percent-encoded so it always stays one path segment
    pub fn param(value: impl Display, parent: &RequestBuilder) -> Self {
        let fragment = urlencoding::encode(&value.to_string()).into_owned();
        PathSegment {
            builder: parent.append_segment(&fragment),
            fragment,
        }
    }

    /// pass-through node that continues from `parent` without adding to the path
    pub fn no_path(parent: &RequestBuilder) -> Self {
        PathSegment {
            fragment: String::new(),
            builder: parent.clone(),
        }
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    pub fn request_builder(&self) -> &RequestBuilder {
        &self.builder
    }

    // The fluent variants below copy this node and change the private copy
    // in place; the receiver is never touched.

    pub fn add_header(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut node = self.clone();
        node.builder.push_header(key, value);
        node
    }

    pub fn add_query_param(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut node = self.clone();
        node.builder.push_query_param(key, value);
        node
    }

    pub fn with_body(&self, body: impl Into<Body>) -> Self {
        let mut node = self.clone();
        node.builder.replace_body(body.into());
        node
    }
}

/**
Implemented by every (generated) resource type. A resource only needs to
expose its builder branch; the terminal request operations come for free.
*/
pub trait Resource {
    fn request_builder(&self) -> &RequestBuilder;

    /// the request `method` would send, without sending it
    fn descriptor(&self, method: Method) -> RequestDescriptor {
        self.request_builder().seal(method)
    }

    fn execute(&self, method: Method) -> Result<Response, TransportError> {
        self.request_builder().execute(method)
    }

    fn get(&self) -> Result<Response, TransportError> {
        self.execute(Method::GET)
    }

    fn delete(&self) -> Result<Response, TransportError> {
        self.execute(Method::DELETE)
    }

    fn head(&self) -> Result<Response, TransportError> {
        self.execute(Method::HEAD)
    }

    fn options(&self) -> Result<Response, TransportError> {
        self.execute(Method::OPTIONS)
    }

    fn post(&self, body: impl Into<Body>) -> Result<Response, TransportError>
    where
        Self: Sized,
    {
        self.request_builder()
            .with_body(body)
            .execute(Method::POST)
    }

    fn put(&self, body: impl Into<Body>) -> Result<Response, TransportError>
    where
        Self: Sized,
    {
        self.request_builder()
            .with_body(body)
            .execute(Method::PUT)
    }

    fn patch(&self, body: impl Into<Body>) -> Result<Response, TransportError>
    where
        Self: Sized,
    {
        self.request_builder()
            .with_body(body)
            .execute(Method::PATCH)
    }

    /// Serialize `value` as the JSON body of a request with `method`.
    /// A value that can't be serialized never reaches the client.
    fn send_json<T: Serialize + ?Sized>(
        &self,
        method: Method,
        value: &T,
    ) -> Result<Response, TransportError>
    where
        Self: Sized,
    {
        self.request_builder()
            .with_json_body(value)
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?
            .execute(method)
    }
}

impl Resource for PathSegment {
    fn request_builder(&self) -> &RequestBuilder {
        &self.builder
    }
}
