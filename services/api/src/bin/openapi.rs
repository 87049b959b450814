//! services/api/src/bin/openapi.rs
//!
//! Dumps the mentorship API's OpenAPI document so frontend clients can be
//! generated without running the server. The output path defaults to
//! `openapi.json` and can be overridden with the first CLI argument.

use api_lib::web::rest::ApiDoc;
use utoipa::OpenApi;

const DEFAULT_OUTPUT: &str = "openapi.json";

fn write_document(
    mut api_doc: utoipa::openapi::OpenApi,
    path: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    api_doc.info.version = env!("CARGO_PKG_VERSION").to_string();
    let document = api_doc.to_pretty_json()?;
    std::fs::write(path, document)?;
    println!(
        "OpenAPI document for {} routes written to {}",
        api_doc.paths.paths.len(),
        path
    );
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_OUTPUT.to_string());
    write_document(ApiDoc::openapi(), &path)
}
