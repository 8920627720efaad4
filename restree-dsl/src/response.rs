use bytes::Bytes;
use http::StatusCode;
use serde::de::DeserializeOwned;

use crate::params::Params;

/// What a [crate::Client] got back for a request.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    status: StatusCode,
    headers: Params,
    body: Bytes,
}

impl Response {
    pub fn new(status: StatusCode, headers: Params, body: impl Into<Bytes>) -> Self {
        Response {
            status,
            headers,
            body: body.into(),
        }
    }

    /// empty response with the given status
    pub fn with_status(status: StatusCode) -> Self {
        Response::new(status, Params::new(), Bytes::new())
    }

    pub fn json_of<T: serde::Serialize + ?Sized>(
        status: StatusCode,
        value: &T,
    ) -> Result<Self, serde_json::Error> {
        let body = serde_json::to_vec(value)?;
        let headers: Params = [("Content-Type", "application/json")].into_iter().collect();
        Ok(Response::new(status, headers, body))
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn headers(&self) -> &Params {
        &self.headers
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get_ignore_case("Content-Type")
            .and_then(|v| v.first())
            .map(String::as_str)
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn text(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.body)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}
