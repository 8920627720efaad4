mod generated_api;

use std::collections::HashMap;

use generated_api::{Animal, Cat, SimApi};
use restree_dsl::{Client, ClientConfig, Response, StatusCode, StubClientFactory};

/// Walks the generated resource tree against the in-memory backend and
/// prints what would have gone over the wire.
fn main() -> anyhow::Result<()> {
    let mut default_headers = HashMap::new();
    default_headers.insert("User-Agent".to_string(), "restree-sim".to_string());

    let stub = StubClientFactory::new().create_stub(
        "localhost",
        8281,
        "http",
        "/shelter",
        ClientConfig::default(),
        default_headers,
    )?;
    let api = SimApi::with_client(stub.clone());

    let tom = Animal::Cat(Cat {
        gender: "male".to_string(),
        name: "Tom".to_string(),
    });
    stub.enqueue(Ok(Response::json_of(StatusCode::CREATED, &tom)?));
    stub.enqueue(Ok(Response::json_of(StatusCode::OK, &vec![tom.clone()])?));

    let created = api.animals().create(&tom)?;
    println!("created {}", created.name());

    let found = api.rest().some().webservice().find("Tom", &[2])?;
    println!("found {} animal(s)", found.len());

    for recorded in stub.recorded() {
        let request = &recorded.descriptor;
        println!("{} {}", request.method(), stub.endpoint().url_for(request)?);
    }
    Ok(())
}
