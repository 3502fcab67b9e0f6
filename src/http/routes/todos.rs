use axum::{extract::{Path, State}, http::StatusCode, routing::{get, post, put}, Json, Router};
use chrono::Utc;
use uuid::Uuid;

use super::AppState;
use crate::application::todo_store::TodoStore;
use crate::domain::{repository::BlobStore, todo::{Todo, TodoId}};
use crate::http::types::{AddTodoBody, ApiError, ReorderBody, StatsView, TodoView, UpdateTodoBody};

pub fn router<B: BlobStore>(state: AppState<B>) -> Router {
    Router::new()
        .route("/todos", post(add_todo::<B>).get(list_todos::<B>))
        .route("/todos/reorder", post(reorder_todos::<B>))
        .route("/todos/clear-completed", post(clear_completed::<B>))
        .route("/todos/:id", put(update_todo::<B>).delete(delete_todo::<B>))
        .route("/todos/:id/toggle", post(toggle_todo::<B>))
        .route("/stats", get(stats::<B>))
        .with_state(state)
}

async fn list_todos<B: BlobStore>(State(state): State<AppState<B>>) -> Json<serde_json::Value> {
    let store = state.store.lock().await;
    Json(serde_json::json!({ "items": visible(&store) }))
}

async fn add_todo<B: BlobStore>(State(state): State<AppState<B>>, Json(payload): Json<AddTodoBody>) -> Result<Json<TodoView>, ApiError> {
    if payload.text.trim().is_empty() { return Err(ApiError::bad_request("text must not be empty")); }
    let todo = state.store.lock().await.add(&payload.text, payload.category_id).await;
    todo.map(view).map(Json).ok_or_else(|| ApiError::not_found("unknown category"))
}

async fn update_todo<B: BlobStore>(State(state): State<AppState<B>>, Path(id): Path<String>, Json(payload): Json<UpdateTodoBody>) -> Result<Json<TodoView>, ApiError> {
    let id = parse_id(&id)?;
    if payload.text.trim().is_empty() { return Err(ApiError::bad_request("text must not be empty")); }
    let todo = state.store.lock().await.update(id, &payload.text).await;
    todo.map(view).map(Json).ok_or_else(|| ApiError::not_found("Not found"))
}

async fn toggle_todo<B: BlobStore>(State(state): State<AppState<B>>, Path(id): Path<String>) -> Result<Json<TodoView>, ApiError> {
    let id = parse_id(&id)?;
    let todo = state.store.lock().await.toggle(id).await;
    todo.map(view).map(Json).ok_or_else(|| ApiError::not_found("Not found"))
}

async fn delete_todo<B: BlobStore>(State(state): State<AppState<B>>, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    let deleted = state.store.lock().await.delete(id).await;
    if deleted { Ok(StatusCode::NO_CONTENT) } else { Err(ApiError::not_found("Not found")) }
}

async fn reorder_todos<B: BlobStore>(State(state): State<AppState<B>>, Json(payload): Json<ReorderBody>) -> Result<Json<serde_json::Value>, ApiError> {
    let mut store = state.store.lock().await;
    if !store.reorder(&payload.source, payload.destination).await {
        return Err(ApiError::bad_request("reorder indices out of range"));
    }
    Ok(Json(serde_json::json!({ "items": visible(&store) })))
}

async fn clear_completed<B: BlobStore>(State(state): State<AppState<B>>) -> Json<serde_json::Value> {
    let removed = state.store.lock().await.clear_completed().await;
    Json(serde_json::json!({ "removed": removed }))
}

async fn stats<B: BlobStore>(State(state): State<AppState<B>>) -> Json<StatsView> {
    let store = state.store.lock().await;
    let stats = store.stats();
    Json(StatsView {
        summary: stats.to_string(),
        category_name: stats.category_name,
        completed: stats.completed,
        total: stats.total,
        has_completed: store.has_completed(),
    })
}

fn visible<B: BlobStore>(store: &TodoStore<B>) -> Vec<TodoView> {
    store.visible_todos().into_iter().cloned().map(view).collect()
}

fn view(todo: Todo) -> TodoView {
    let is_overdue = todo.is_overdue(Utc::now());
    TodoView { todo, is_overdue }
}

fn parse_id(s: &str) -> Result<TodoId, ApiError> { Uuid::parse_str(s).map(TodoId).map_err(|_| ApiError::bad_request("invalid id")) }
