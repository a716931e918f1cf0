// Bulk transfer API - import, export and pre-import validation

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use super::AppState;
use crate::catalog::{validate_records, ImportReport, ImportSource, ValidationReport};
use crate::parser::RawValue;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/import", post(import_media))
        .route("/export", get(export_media))
        .route("/validate", post(validate_media))
}

/// Either raw (possibly malformed) text or already structured records
#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub text: Option<String>,
    pub records: Option<Vec<RawValue>>,
}

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    #[serde(rename = "jsonData")]
    pub json_data: serde_json::Value,
}

/// POST /api/media/import
async fn import_media(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ImportRequest>,
) -> Result<Json<ImportReport>, (StatusCode, String)> {
    let source = match (request.text, request.records) {
        (Some(text), _) if !text.trim().is_empty() => ImportSource::Text(text),
        (_, Some(records)) => ImportSource::Records(records),
        _ => {
            return Err((
                StatusCode::BAD_REQUEST,
                "Provide either \"text\" or \"records\"".to_string(),
            ))
        }
    };

    let mut catalog = state.catalog.write().await;
    let report = catalog.import(source, state.config.import_options());

    if report.total == 0 {
        return Err((
            StatusCode::BAD_REQUEST,
            "No usable records found in the input".to_string(),
        ));
    }

    if report.success > 0 {
        state.persist(&catalog).await;
    }
    Ok(Json(report))
}

/// GET /api/media/export
async fn export_media(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let catalog = state.catalog.read().await;
    let body = catalog
        .export()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    tracing::info!("Exported {} bytes of catalog JSON", body.len());
    Ok((
        [
            (header::CONTENT_TYPE, "application/json"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"media-catalog.json\"",
            ),
        ],
        body,
    ))
}

/// POST /api/media/validate - `jsonData` may be the JSON text or the value itself
async fn validate_media(Json(request): Json<ValidateRequest>) -> Json<ValidationReport> {
    let report = match request.json_data {
        serde_json::Value::String(text) => validate_records(&text),
        value => validate_records(&value.to_string()),
    };
    Json(report)
}

#[cfg(test)]
mod tests {
    use super::super::create_router;
    use super::super::test_support::*;
    use super::*;
    use axum::http::Method;
    use serde_json::json;

    #[tokio::test]
    async fn test_import_text_then_recommend() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(vec![], dir.path());
        let app = create_router(state.clone());

        let text = "{id:1,title:\"Foo\",type:movie,poster:\"p.jpg\",year:2020},\n{id:2,title:\"Foo 2\",type:movie,poster:\"p2.jpg\",year:2021}";
        let (status, report) =
            request_json(&app, Method::POST, "/api/media/import", Some(json!({"text": text}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["success"], 2);
        assert_eq!(report["failed"], 0);
        assert!(dir.path().join("movies.json").exists());

        let (_, related) =
            request_json(&app, Method::GET, "/api/media/1/recommendations", None).await;
        assert_eq!(related.as_array().map(Vec::len), Some(1));
        assert_eq!(related[0]["id"], "2");
    }

    #[tokio::test]
    async fn test_import_records_reports_failures() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_router(test_state(vec![], dir.path()));

        let body = json!({"records": [
            {"title": "Heat", "type": "movie"},
            {"title": "No type"}
        ]});
        let (status, report) =
            request_json(&app, Method::POST, "/api/media/import", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["total"], 2);
        assert_eq!(report["success"], 1);
        assert_eq!(report["failed"], 1);
        assert_eq!(report["errors"][0], "item 2: missing required field 'type'");
    }

    #[tokio::test]
    async fn test_import_rejects_empty_input() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_router(test_state(vec![], dir.path()));

        let (status, _) =
            request(&app, Method::POST, "/api/media/import", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = request(
            &app,
            Method::POST,
            "/api/media/import",
            Some(json!({"text": "nothing to see here"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_export() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![
            crate::models::Media::new("a", "Alpha", crate::models::MediaType::Movie),
            crate::models::Media::new("b", "Alpha (2001)", crate::models::MediaType::Anime),
        ];
        let app = create_router(test_state(records, dir.path()));

        let (status, body) = request_json(&app, Method::GET, "/api/media/export", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().map(Vec::len), Some(2));
        assert_eq!(body[0]["id"], "a");
        assert_eq!(body[1]["id"], "b");
    }

    #[tokio::test]
    async fn test_validate() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_router(test_state(vec![], dir.path()));

        let (_, report) = request_json(
            &app,
            Method::POST,
            "/api/media/validate",
            Some(json!({"jsonData": "[{\"id\": \"1\", \"title\": \"A\", \"type\": \"movie\"}]"})),
        )
        .await;
        assert_eq!(report["isValid"], true);
        assert_eq!(report["count"], 1);

        let (_, report) = request_json(
            &app,
            Method::POST,
            "/api/media/validate",
            Some(json!({"jsonData": [{"id": "1"}]})),
        )
        .await;
        assert_eq!(report["isValid"], false);
        assert_eq!(report["errors"].as_array().map(Vec::len), Some(2));
    }
}
