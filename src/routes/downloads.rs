use actix_web::{http::header, web, HttpResponse};
use serde::Deserialize;

use crate::services::resource_fetcher::{FetchError, ResourceFetcher, DEFAULT_DOWNLOAD_FILENAME};

#[derive(Deserialize, Debug)]
pub struct DownloadParameters {
    #[serde(default = "default_filename")]
    pub filename: String,
}

fn default_filename() -> String {
    String::from(DEFAULT_DOWNLOAD_FILENAME)
}

#[tracing::instrument(
    name = "Download a resource",
    skip(resource_id, parameters, resource_fetcher),
    fields(
        resource_id = %resource_id,
        filename = %parameters.filename,
    )
)]
pub async fn handle_download_resource(
    resource_id: web::Path<String>,
    parameters: web::Query<DownloadParameters>,
    resource_fetcher: web::Data<ResourceFetcher>,
) -> Result<HttpResponse, FetchError> {
    let payload = resource_fetcher
        .fetch(&resource_id, &parameters.filename)
        .await?;

    Ok(HttpResponse::Ok()
        .content_type(payload.content_type.as_str())
        .insert_header((header::CONTENT_DISPOSITION, payload.content_disposition()))
        .body(payload.bytes))
}
