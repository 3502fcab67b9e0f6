use axum::{extract::{Path, State}, http::StatusCode, routing::{delete, get}, Json, Router};
use uuid::Uuid;

use super::AppState;
use crate::domain::{category::{CategoryId, Color, DEFAULT_ICON}, repository::BlobStore};
use crate::http::types::{ApiError, CategoryView, CreateCategoryBody, SelectionBody};

pub fn router<B: BlobStore>(state: AppState<B>) -> Router {
    Router::new()
        .route("/categories", get(list_categories::<B>).post(create_category::<B>))
        .route("/categories/:id", delete(delete_category::<B>))
        .route("/selection", get(get_selection::<B>).put(select_category::<B>))
        .with_state(state)
}

async fn list_categories<B: BlobStore>(State(state): State<AppState<B>>) -> Json<Vec<CategoryView>> {
    let store = state.store.lock().await;
    let selected = store.selected_category_id();
    Json(store.categories().iter().map(|c| CategoryView {
        todo_count: store.count_in_category(c.id),
        is_selected: selected == Some(c.id),
        category: c.clone(),
    }).collect())
}

async fn create_category<B: BlobStore>(State(state): State<AppState<B>>, Json(payload): Json<CreateCategoryBody>) -> Result<(StatusCode, Json<CategoryView>), ApiError> {
    let name = payload.name.trim();
    if name.is_empty() { return Err(ApiError::bad_request("name must not be empty")); }
    let color = match payload.color.as_deref() {
        Some(raw) => raw.parse::<Color>().map_err(|e| ApiError::bad_request(e.to_string()))?,
        None => Color::default(),
    };
    let icon = payload.icon.as_deref().map(str::trim).filter(|i| !i.is_empty()).unwrap_or(DEFAULT_ICON);
    let category = state.store.lock().await.create_category(name, color, icon).await;
    Ok((StatusCode::CREATED, Json(CategoryView { category, todo_count: 0, is_selected: false })))
}

async fn delete_category<B: BlobStore>(State(state): State<AppState<B>>, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    let deleted = state.store.lock().await.delete_category(id).await?;
    if deleted { Ok(StatusCode::NO_CONTENT) } else { Err(ApiError::not_found("Not found")) }
}

async fn get_selection<B: BlobStore>(State(state): State<AppState<B>>) -> Json<SelectionBody> {
    Json(SelectionBody { category_id: state.store.lock().await.selected_category_id() })
}

async fn select_category<B: BlobStore>(State(state): State<AppState<B>>, Json(payload): Json<SelectionBody>) -> Result<Json<SelectionBody>, ApiError> {
    let mut store = state.store.lock().await;
    if !store.select_category(payload.category_id).await { return Err(ApiError::not_found("unknown category")); }
    Ok(Json(SelectionBody { category_id: store.selected_category_id() }))
}

fn parse_id(s: &str) -> Result<CategoryId, ApiError> { Uuid::parse_str(s).map(CategoryId).map_err(|_| ApiError::bad_request("invalid id")) }
