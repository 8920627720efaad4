use std::{fmt, sync::Arc};

use http::Method;
use serde::Serialize;

use crate::{
    client::Client,
    descriptor::{Body, RequestDescriptor},
    error::TransportError,
    params::Params,
    response::Response,
};

/**
Accumulates path fragments, headers, query parameters and a body for one request.

A builder is a value: every operation that adds state returns a new branch
and leaves the receiver as it was, so two branches taken from the same
ancestor never see each other's additions. The [Client] the builder will
dispatch to is shared between all branches.
*/
#[derive(Clone)]
pub struct RequestBuilder {
    client: Arc<dyn Client>,
    path: Vec<String>,
    headers: Params,
    query: Params,
    body: Option<Body>,
}

impl RequestBuilder {
    pub fn new(client: Arc<dyn Client>) -> Self {
        RequestBuilder {
            client,
            path: Vec::new(),
            headers: Params::new(),
            query: Params::new(),
            body: None,
        }
    }

    pub fn client(&self) -> &Arc<dyn Client> {
        &self.client
    }

    pub fn path_fragments(&self) -> &[String] {
        &self.path
    }

    pub fn headers(&self) -> &Params {
        &self.headers
    }

    pub fn query_params(&self) -> &Params {
        &self.query
    }

    pub fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    /// New branch with `fragment` appended to the path. Slashes around the
    /// fragment are ignored, and an empty fragment appends nothing.
    pub fn append_segment(&self, fragment: &str) -> RequestBuilder {
        let mut branch = self.clone();
        branch.push_segment(fragment);
        branch
    }

    pub fn add_header(&self, key: impl Into<String>, value: impl Into<String>) -> RequestBuilder {
        let mut branch = self.clone();
        branch.push_header(key, value);
        branch
    }

    /// New branch where `key` has `value` as its only header value.
    pub fn set_header(&self, key: impl Into<String>, value: impl Into<String>) -> RequestBuilder {
        let mut branch = self.clone();
        branch.headers.set(key, value);
        branch
    }

    pub fn add_query_param(
        &self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> RequestBuilder {
        let mut branch = self.clone();
        branch.push_query_param(key, value);
        branch
    }

    /// multi-valued query parameter, e.g. `?tag=a&tag=b`
    pub fn add_query_params<V: Into<String>>(
        &self,
        key: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> RequestBuilder {
        let mut branch = self.clone();
        branch.query.add_all(key, values);
        branch
    }

    /// Attach a body. Calling this again on the same branch replaces the body.
    pub fn with_body(&self, body: impl Into<Body>) -> RequestBuilder {
        let mut branch = self.clone();
        branch.replace_body(body.into());
        branch
    }

    pub fn with_json_body<T: Serialize + ?Sized>(
        &self,
        value: &T,
    ) -> Result<RequestBuilder, serde_json::Error> {
        let json = serde_json::to_value(value)?;
        Ok(self.with_body(Body::Json(json)))
    }

    // In-place variants, only ever applied to a branch nobody else holds yet.

    pub(crate) fn push_segment(&mut self, fragment: &str) {
        let fragment = fragment.trim_matches('/');
        if !fragment.is_empty() {
            self.path.push(fragment.to_string());
        }
    }

    pub(crate) fn push_header(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.headers.add(key, value);
    }

    pub(crate) fn push_query_param(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.query.add(key, value);
    }

    pub(crate) fn replace_body(&mut self, body: Body) {
        if self.body.is_some() {
            log::trace!("replacing previously attached request body");
        }
        self.body = Some(body);
    }

    /// The request path: all fragments, root first, separated by a single `/`.
    pub fn path(&self) -> String {
        format!("/{}", self.path.join("/"))
    }

    /// Freeze the accumulated state into a [RequestDescriptor] for `method`.
    /// The builder is left untouched, so sealing again gives an equal descriptor.
    pub fn seal(&self, method: Method) -> RequestDescriptor {
        RequestDescriptor::new(
            method,
            self.path(),
            self.headers.clone(),
            self.query.clone(),
            self.body.clone(),
        )
    }

    /// Seal with `method` and hand the descriptor to the bound client.
    /// Errors from the client are passed on as they are.
    pub fn execute(&self, method: Method) -> Result<Response, TransportError> {
        let descriptor = self.seal(method);
        log::debug!(
            "{} {} -> {}",
            descriptor.method(),
            descriptor.path_and_query(),
            self.client.endpoint()
        );
        self.client.execute(&descriptor)
    }
}

impl fmt::Debug for RequestBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestBuilder")
            .field("endpoint", self.client.endpoint())
            .field("path", &self.path)
            .field("headers", &self.headers)
            .field("query", &self.query)
            .field("body", &self.body)
            .finish()
    }
}
