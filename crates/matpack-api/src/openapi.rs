//! OpenAPI document generation.

use axum::response::IntoResponse;
use axum::Json;
use utoipa::OpenApi;

use crate::error::ApiErrorBody;
use crate::routes::generate;

/// OpenAPI documentation for the Matpack API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Matpack API",
        description = "Prototype API to package and serve raw simulation data \
                       files based on (composition, run, sub-run) selection.",
    ),
    paths(
        generate::schedule,
        generate::augment,
        generate::status,
        generate::download,
        generate::available,
    ),
    components(schemas(
        generate::ScheduleResponse,
        generate::StatusResponse,
        ApiErrorBody,
    )),
    tags(
        (name = "generate", description = "Run scheduling, status, and archive download")
    )
)]
pub struct ApiDoc;

/// Serves the OpenAPI document as JSON.
///
/// GET /openapi.json
pub async fn serve_openapi() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_document_contains_all_routes() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        assert!(paths.contains(&&"/v1/generate/{nc}".to_string()));
        assert!(paths.contains(&&"/v1/generate/{nc}/{run_id}/augment".to_string()));
        assert!(paths.contains(&&"/v1/generate/{nc}/{run_id}/status".to_string()));
        assert!(paths.contains(&&"/v1/generate/{nc}/{run_id}/{sub_run}/download".to_string()));
        assert!(paths.contains(&&"/v1/generate/available".to_string()));
    }
}
