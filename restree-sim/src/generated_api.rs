//! What generated client code looks like for a small animal shelter API:
//!
//! ```text
//! /rest/some/webservice      GET (query: firstName, age*), POST animal
//! /animals                   GET (query: kind), POST animal
//! /animals/{id}              GET, DELETE
//! /animals/{id}/photo        PUT binary
//! /files/upload              POST binary
//! ```
#![allow(dead_code)]

use std::{collections::HashMap, sync::Arc};

use http::StatusCode;
use restree_dsl::{
    BinaryRequest, Client, ClientConfig, ClientFactory, ConstructionError, PathSegment,
    RequestBuilder, Resource, Response, TransportError,
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_type")]
pub enum Animal {
    Cat(Cat),
    Dog(Dog),
}

impl Animal {
    pub fn name(&self) -> &str {
        match self {
            Animal::Cat(cat) => &cat.name,
            Animal::Dog(dog) => &dog.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cat {
    pub gender: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dog {
    #[serde(rename = "canBark")]
    pub can_bark: bool,
    pub gender: String,
    pub name: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("resource not found")]
    NotFound404,
    #[error("unexpected response status {}", .0.status())]
    UnknownResponse(Response),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("response body could not be decoded")]
    Decode(#[from] serde_json::Error),
}

fn expect_status(response: Response, expected: StatusCode) -> Result<Response, ApiError> {
    match response.status() {
        s if s == expected => Ok(response),
        StatusCode::NOT_FOUND => Err(ApiError::NotFound404),
        _ => Err(ApiError::UnknownResponse(response)),
    }
}

fn decode<T: DeserializeOwned>(response: Response, expected: StatusCode) -> Result<T, ApiError> {
    Ok(expect_status(response, expected)?.json()?)
}

/// Entry point of the generated client.
#[derive(Debug, Clone)]
pub struct SimApi {
    root: RequestBuilder,
}

impl SimApi {
    pub fn new(
        factory: &impl ClientFactory,
        host: &str,
        port: i32,
        protocol: &str,
        prefix: &str,
        config: ClientConfig,
        default_headers: HashMap<String, String>,
    ) -> Result<Self, ConstructionError> {
        log::debug!("creating {protocol} client for {host}:{port}{prefix}");
        let client = factory.create_client(host, port, protocol, prefix, config, default_headers)?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Arc<dyn Client>) -> Self {
        SimApi {
            root: RequestBuilder::new(client),
        }
    }

    pub fn rest(&self) -> RestResource {
        RestResource::new(&self.root)
    }

    pub fn animals(&self) -> AnimalsResource {
        AnimalsResource::new(&self.root)
    }

    pub fn files(&self) -> FilesResource {
        FilesResource::new(&self.root)
    }

    pub fn close(&self) {
        self.root.client().close();
    }
}

#[derive(Debug, Clone)]
pub struct RestResource {
    segment: PathSegment,
}

impl RestResource {
    pub fn new(parent: &RequestBuilder) -> Self {
        RestResource {
            segment: PathSegment::new("rest", parent),
        }
    }

    pub fn some(&self) -> SomeResource {
        SomeResource::new(self.segment.request_builder())
    }
}

impl Resource for RestResource {
    fn request_builder(&self) -> &RequestBuilder {
        self.segment.request_builder()
    }
}

#[derive(Debug, Clone)]
pub struct SomeResource {
    segment: PathSegment,
}

impl SomeResource {
    pub fn new(parent: &RequestBuilder) -> Self {
        SomeResource {
            segment: PathSegment::new("some", parent),
        }
    }

    /// continue from an already positioned builder without adding `some` again
    fn no_path(builder: &RequestBuilder) -> Self {
        SomeResource {
            segment: PathSegment::no_path(builder),
        }
    }

    pub fn add_header(&self, key: &str, value: &str) -> Self {
        Self::no_path(&self.segment.request_builder().add_header(key, value))
    }

    pub fn webservice(&self) -> WebserviceResource {
        WebserviceResource::new(self.segment.request_builder())
    }
}

impl Resource for SomeResource {
    fn request_builder(&self) -> &RequestBuilder {
        self.segment.request_builder()
    }
}

#[derive(Debug, Clone)]
pub struct WebserviceResource {
    segment: PathSegment,
}

impl WebserviceResource {
    pub fn new(parent: &RequestBuilder) -> Self {
        WebserviceResource {
            segment: PathSegment::new("webservice", parent),
        }
    }

    pub fn add_header(&self, key: &str, value: &str) -> Self {
        WebserviceResource {
            segment: self.segment.add_header(key, value),
        }
    }

    fn find_request(&self, first_name: &str, ages: &[u32]) -> RequestBuilder {
        self.segment
            .request_builder()
            .set_header("Accept", "application/json")
            .add_query_param("firstName", first_name)
            .add_query_params("age", ages.iter().map(u32::to_string))
    }

    pub fn find(&self, first_name: &str, ages: &[u32]) -> Result<Vec<Animal>, ApiError> {
        let response = self
            .find_request(first_name, ages)
            .execute(http::Method::GET)?;
        decode(response, StatusCode::OK)
    }

    pub fn post_animal(&self, animal: &Animal) -> Result<Response, ApiError> {
        let response = self.send_json(http::Method::POST, animal)?;
        expect_status(response, StatusCode::OK)
    }
}

impl Resource for WebserviceResource {
    fn request_builder(&self) -> &RequestBuilder {
        self.segment.request_builder()
    }
}

#[derive(Debug, Clone)]
pub struct AnimalsResource {
    segment: PathSegment,
}

impl AnimalsResource {
    pub fn new(parent: &RequestBuilder) -> Self {
        AnimalsResource {
            segment: PathSegment::new("animals", parent),
        }
    }

    pub fn list(&self, kind: Option<&str>) -> Result<Vec<Animal>, ApiError> {
        let builder = match kind {
            Some(kind) => self.segment.request_builder().add_query_param("kind", kind),
            None => self.segment.request_builder().clone(),
        };
        decode(builder.execute(http::Method::GET)?, StatusCode::OK)
    }

    pub fn create(&self, animal: &Animal) -> Result<Animal, ApiError> {
        let response = self.send_json(http::Method::POST, animal)?;
        decode(response, StatusCode::CREATED)
    }

    pub fn animal(&self, id: u64) -> AnimalResource {
        AnimalResource::new(id, self.segment.request_builder())
    }
}

impl Resource for AnimalsResource {
    fn request_builder(&self) -> &RequestBuilder {
        self.segment.request_builder()
    }
}

#[derive(Debug, Clone)]
pub struct AnimalResource {
    segment: PathSegment,
}

impl AnimalResource {
    pub fn new(id: u64, parent: &RequestBuilder) -> Self {
        AnimalResource {
            segment: PathSegment::param(id, parent),
        }
    }

    pub fn fetch(&self) -> Result<Animal, ApiError> {
        decode(self.get()?, StatusCode::OK)
    }

    pub fn remove(&self) -> Result<(), ApiError> {
        expect_status(self.delete()?, StatusCode::NO_CONTENT)?;
        Ok(())
    }

    pub fn photo(&self) -> PhotoResource {
        PhotoResource::new(self.segment.request_builder())
    }
}

impl Resource for AnimalResource {
    fn request_builder(&self) -> &RequestBuilder {
        self.segment.request_builder()
    }
}

#[derive(Debug, Clone)]
pub struct PhotoResource {
    segment: PathSegment,
}

impl PhotoResource {
    pub fn new(parent: &RequestBuilder) -> Self {
        PhotoResource {
            segment: PathSegment::new("photo", parent),
        }
    }

    pub fn upload(&self, image: BinaryRequest) -> Result<(), ApiError> {
        let response = self
            .segment
            .add_header("Content-Type", "image/png")
            .put(image)?;
        expect_status(response, StatusCode::NO_CONTENT)?;
        Ok(())
    }
}

impl Resource for PhotoResource {
    fn request_builder(&self) -> &RequestBuilder {
        self.segment.request_builder()
    }
}

#[derive(Debug, Clone)]
pub struct FilesResource {
    segment: PathSegment,
}

impl FilesResource {
    pub fn new(parent: &RequestBuilder) -> Self {
        FilesResource {
            segment: PathSegment::new("files", parent),
        }
    }

    pub fn upload(&self) -> UploadResource {
        UploadResource::new(self.segment.request_builder())
    }
}

impl Resource for FilesResource {
    fn request_builder(&self) -> &RequestBuilder {
        self.segment.request_builder()
    }
}

#[derive(Debug, Clone)]
pub struct UploadResource {
    segment: PathSegment,
}

impl UploadResource {
    pub fn new(parent: &RequestBuilder) -> Self {
        UploadResource {
            segment: PathSegment::new("upload", parent),
        }
    }

    pub fn send(&self, file: BinaryRequest) -> Result<Response, ApiError> {
        let response = self.post(file)?;
        expect_status(response, StatusCode::OK)
    }
}

impl Resource for UploadResource {
    fn request_builder(&self) -> &RequestBuilder {
        self.segment.request_builder()
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use restree_dsl::{Body, Method, StubClient, StubClientFactory};
    use serde_json::json;
    use test_log::test;

    use super::*;

    fn api() -> anyhow::Result<(Arc<StubClient>, SimApi)> {
        let stub = StubClientFactory::new().create_stub(
            "localhost",
            8281,
            "http",
            "",
            ClientConfig::default(),
            HashMap::new(),
        )?;
        Ok((stub.clone(), SimApi::with_client(stub)))
    }

    fn rex() -> Animal {
        Animal::Dog(Dog {
            can_bark: true,
            gender: "male".to_string(),
            name: "Rex".to_string(),
        })
    }

    #[test]
    fn test_animal_json() -> anyhow::Result<()> {
        let value = serde_json::to_value(rex())?;
        assert_eq!(
            json!({"_type": "Dog", "canBark": true, "gender": "male", "name": "Rex"}),
            value
        );
        let back: Animal = serde_json::from_value(value)?;
        assert_eq!(rex(), back);
        Ok(())
    }

    #[test]
    fn test_webservice_path() -> anyhow::Result<()> {
        let (_, api) = api()?;
        let webservice = api
            .rest()
            .some()
            .add_header("Accept-Language", "nl")
            .webservice();

        let descriptor = webservice.descriptor(Method::GET);
        assert_eq!("/rest/some/webservice", descriptor.path());
        assert_eq!(Some("nl"), descriptor.headers().first("Accept-Language"));

        // add_header on `some` branched; the plain walk has no header
        let plain = api.rest().some().webservice().descriptor(Method::GET);
        assert_eq!("/rest/some/webservice", plain.path());
        assert!(plain.headers().is_empty());
        Ok(())
    }

    #[test]
    fn test_find_with_query() -> anyhow::Result<()> {
        let (stub, api) = api()?;
        stub.enqueue(Ok(Response::json_of(StatusCode::OK, &vec![rex()])?));

        let found = api.rest().some().webservice().find("Rex", &[3, 4])?;
        assert_eq!(vec![rex()], found);

        let request = stub.last_request().unwrap().descriptor;
        assert_eq!(
            "/rest/some/webservice?firstName=Rex&age=3&age=4",
            request.path_and_query()
        );
        assert_eq!(Some("application/json"), request.headers().first("Accept"));
        Ok(())
    }

    #[test]
    fn test_create_and_fetch() -> anyhow::Result<()> {
        let (stub, api) = api()?;
        stub.enqueue(Ok(Response::json_of(StatusCode::CREATED, &rex())?));
        stub.enqueue(Ok(Response::json_of(StatusCode::OK, &rex())?));
        stub.enqueue(Ok(Response::with_status(StatusCode::NOT_FOUND)));

        assert_eq!(rex(), api.animals().create(&rex())?);
        assert_eq!(rex(), api.animals().animal(7).fetch()?);
        assert!(matches!(
            api.animals().animal(8).fetch(),
            Err(ApiError::NotFound404)
        ));

        let recorded = stub.recorded();
        assert_eq!(Method::POST, *recorded[0].descriptor.method());
        assert_eq!(
            Some(&Body::Json(serde_json::to_value(rex())?)),
            recorded[0].descriptor.body()
        );
        assert_eq!("/animals/7", recorded[1].descriptor.path());
        assert_eq!("/animals/8", recorded[2].descriptor.path());
        Ok(())
    }

    #[test]
    fn test_unexpected_status() -> anyhow::Result<()> {
        let (stub, api) = api()?;
        stub.enqueue(Ok(Response::with_status(StatusCode::INTERNAL_SERVER_ERROR)));
        match api.animals().animal(1).remove() {
            Err(ApiError::UnknownResponse(r)) => {
                assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, r.status())
            }
            other => panic!("expected unknown response, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn test_transport_error_reaches_the_caller() -> anyhow::Result<()> {
        let (stub, api) = api()?;
        stub.enqueue(Err(TransportError::Timeout("read timed out".to_string())));
        assert!(matches!(
            api.animals().list(Some("dog")),
            Err(ApiError::Transport(TransportError::Timeout(_)))
        ));
        assert_eq!(
            "/animals?kind=dog",
            stub.last_request().unwrap().descriptor.path_and_query()
        );
        Ok(())
    }

    #[test]
    fn test_photo_and_file_uploads() -> anyhow::Result<()> {
        let (stub, api) = api()?;
        stub.enqueue(Ok(Response::with_status(StatusCode::NO_CONTENT)));

        let mut tmp = tempfile::NamedTempFile::new()?;
        tmp.write_all(b"not really a png")?;
        api.animals()
            .animal(3)
            .photo()
            .upload(BinaryRequest::file(tmp.path()))?;

        let photo = stub.last_request().unwrap();
        assert_eq!(Method::PUT, *photo.descriptor.method());
        assert_eq!("/animals/3/photo", photo.descriptor.path());
        assert_eq!(Some("image/png"), photo.descriptor.headers().first("Content-Type"));
        assert_eq!(Some(b"not really a png".to_vec()), photo.body);

        api.files()
            .upload()
            .send(BinaryRequest::stream(Cursor::new(b"streamed".to_vec())))?;
        let upload = stub.last_request().unwrap();
        assert_eq!("/files/upload", upload.descriptor.path());
        assert_eq!(Some(b"streamed".to_vec()), upload.body);
        Ok(())
    }

    #[test]
    fn test_closed_client() -> anyhow::Result<()> {
        let (_, api) = api()?;
        api.close();
        assert!(matches!(
            api.animals().list(None),
            Err(ApiError::Transport(TransportError::Closed))
        ));
        Ok(())
    }

    #[test]
    fn test_construction_through_factory() {
        let api = SimApi::new(
            &StubClientFactory::new(),
            "localhost",
            -1,
            "http",
            "",
            ClientConfig::default(),
            HashMap::new(),
        );
        assert!(matches!(api, Err(ConstructionError::InvalidPort(-1))));
    }
}
