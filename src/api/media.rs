// Catalog API - listing, lookup, CRUD, search and related titles

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use super::AppState;
use crate::catalog::{normalize_fields, require_fields, ListFilter, YearCount};
use crate::error::ValidationError;
use crate::models::{Episode, Media, MediaType, Partition};
use crate::parser::RawValue;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_media).post(create_media))
        .route("/search", get(search_media))
        .route("/years", get(get_years))
        .route(
            "/:id",
            get(get_media).put(replace_media).delete(delete_media),
        )
        .route("/:id/recommendations", get(get_recommendations))
        .route("/:id/episodes/:number", get(get_episode))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub partition: Option<String>,
    #[serde(rename = "type")]
    pub media_type: Option<String>,
    pub year: Option<String>,
    pub category: Option<String>,
    pub trending: Option<bool>,
    pub new: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct YearsQuery {
    #[serde(rename = "type")]
    pub media_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EpisodeResponse {
    pub episode: Episode,
    pub series: Media,
}

fn parse_param<T>(value: Option<&str>) -> Result<Option<T>, (StatusCode, String)>
where
    T: FromStr<Err = String>,
{
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::parse)
        .transpose()
        .map_err(|e| (StatusCode::BAD_REQUEST, e))
}

fn not_found(id: &str) -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, format!("Media {} not found", id))
}

fn rejected(errors: Vec<ValidationError>) -> (StatusCode, String) {
    let message = errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    (StatusCode::BAD_REQUEST, message)
}

/// GET /api/media
async fn list_media(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Media>>, (StatusCode, String)> {
    let filter = ListFilter {
        partition: parse_param::<Partition>(query.partition.as_deref())?,
        media_type: parse_param::<MediaType>(query.media_type.as_deref())?,
        year: query.year.filter(|y| !y.is_empty()),
        category: query.category.filter(|c| !c.is_empty()),
        trending: query.trending,
        is_new: query.new,
    };

    let catalog = state.catalog.read().await;
    let items = catalog.list(&filter).into_iter().cloned().collect();
    Ok(Json(items))
}

/// POST /api/media - create with a fresh id
async fn create_media(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RawValue>,
) -> Result<(StatusCode, Json<Media>), (StatusCode, String)> {
    let record = require_fields(&body, 1, &["title", "type"]).map_err(rejected)?;

    let mut media = normalize_fields(record);
    media.id = Uuid::new_v4().to_string();
    media.created_at = Utc::now();

    let mut catalog = state.catalog.write().await;
    catalog.insert(media.clone());
    state.persist(&catalog).await;

    tracing::info!("Created {} '{}' ({})", media.id, media.title, media.media_type);
    Ok((StatusCode::CREATED, Json(media)))
}

/// GET /api/media/:id
async fn get_media(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Media>, (StatusCode, String)> {
    let catalog = state.catalog.read().await;
    catalog
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| not_found(&id))
}

/// PUT /api/media/:id - whole-record replacement, may move partitions
async fn replace_media(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<RawValue>,
) -> Result<Json<Media>, (StatusCode, String)> {
    let record = require_fields(&body, 1, &["title", "type"]).map_err(rejected)?;

    let mut catalog = state.catalog.write().await;
    let created_at = catalog
        .get(&id)
        .map(|m| m.created_at)
        .ok_or_else(|| not_found(&id))?;

    let mut media = normalize_fields(record);
    media.id = id;
    if record.value("createdAt").is_none() {
        media.created_at = created_at;
    }

    catalog.insert(media.clone());
    state.persist(&catalog).await;

    tracing::debug!("Replaced {}", media.id);
    Ok(Json(media))
}

/// DELETE /api/media/:id
async fn delete_media(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    let mut catalog = state.catalog.write().await;
    let removed = catalog.remove(&id).ok_or_else(|| not_found(&id))?;
    state.persist(&catalog).await;

    tracing::info!("Deleted {} '{}'", removed.id, removed.title);
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/media/search?q=...&limit=...
async fn search_media(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Media>>, (StatusCode, String)> {
    let q = query
        .q
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| (StatusCode::BAD_REQUEST, "Search query is required".to_string()))?;

    let catalog = state.catalog.read().await;
    let results = catalog
        .search(&q, query.limit)
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(results))
}

/// GET /api/media/years?type=...
async fn get_years(
    State(state): State<Arc<AppState>>,
    Query(query): Query<YearsQuery>,
) -> Result<Json<Vec<YearCount>>, (StatusCode, String)> {
    let media_type = parse_param::<MediaType>(query.media_type.as_deref())?;
    let catalog = state.catalog.read().await;
    Ok(Json(catalog.years(media_type)))
}

/// GET /api/media/:id/recommendations - empty for unknown ids
async fn get_recommendations(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Json<Vec<Media>> {
    let catalog = state.catalog.read().await;
    Json(catalog.recommendations(&id, &state.config.ranking))
}

/// GET /api/media/:id/episodes/:number
async fn get_episode(
    State(state): State<Arc<AppState>>,
    Path((id, number)): Path<(String, i64)>,
) -> Result<Json<EpisodeResponse>, (StatusCode, String)> {
    let catalog = state.catalog.read().await;
    let (series, episode) = catalog.episode(&id, number).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            format!("Episode {} of {} not found", number, id),
        )
    })?;

    Ok(Json(EpisodeResponse {
        episode: episode.clone(),
        series: series.clone(),
    }))
}
