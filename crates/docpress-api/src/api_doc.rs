//! OpenAPI documentation, served at `/api/openapi.json` and browsable at `/docs`.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use docpress_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Docpress API",
        version = "0.1.0",
        description = "Upload HTML, Markdown or DOCX documents, convert them to PDF, and list conversion jobs. Callers are identified by the x-user-id, x-user-name, x-user-role and x-user-full-name headers set by the gateway."
    ),
    paths(
        handlers::upload::upload_file,
        handlers::convert::convert_file,
        handlers::download::download_file,
        handlers::jobs::my_jobs,
        handlers::jobs::all_jobs,
    ),
    components(schemas(
        error::ErrorResponse,
        models::UploadResponse,
        models::ConvertResponse,
        models::DownloadLinkResponse,
        models::AllJobsResponse,
        models::ConversionJob,
        models::FileType,
        models::JobResult,
    )),
    tags(
        (name = "files", description = "Upload, conversion and download"),
        (name = "jobs", description = "Conversion history")
    )
)]
pub struct ApiDoc;
