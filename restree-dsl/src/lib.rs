//! Runtime for generated REST clients.
//!
//! Generated code describes an API as a tree of resources. Each resource
//! wraps a [PathSegment], which owns a [RequestBuilder] branch carrying the
//! path so far. Walking the tree, adding headers, query parameters or a body
//! always yields new branches; the terminal calls on [Resource] seal the
//! branch into a [RequestDescriptor] and hand it to the [Client] the tree
//! was created with.
//!
//! ```
//! use std::collections::HashMap;
//! use restree_dsl::{ClientConfig, ClientFactory, PathSegment, RequestBuilder, Resource, StubClientFactory};
//!
//! let client = StubClientFactory::new()
//!     .create_client("localhost", 8080, "http", "/api", ClientConfig::default(), HashMap::new())
//!     .unwrap();
//! let root = RequestBuilder::new(client);
//! let animals = PathSegment::new("animals", &root).add_header("Accept", "application/json");
//! let response = animals.get().unwrap();
//! assert!(response.is_success());
//! ```

mod binary;
mod builder;
mod client;
mod config;
mod descriptor;
mod error;
mod params;
mod response;
mod segment;
pub mod stub;

pub use binary::BinaryRequest;
pub use builder::RequestBuilder;
pub use client::{Client, ClientFactory, Endpoint, Protocol};
pub use config::ClientConfig;
pub use descriptor::{Body, RequestDescriptor};
pub use error::{ConstructionError, PayloadError, TransportError};
pub use params::Params;
pub use response::Response;
pub use segment::{PathSegment, Resource};
pub use stub::{RecordedRequest, StubClient, StubClientFactory};

pub use http::{Method, StatusCode};
