//! JSON persistence of store state into a [`BlobStore`].
//!
//! Each collection lives under its own fixed key. The gateway reports every
//! failure; deciding to swallow them is up to the caller.

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{
    category::{Category, CategoryId},
    repository::BlobStore,
    todo::Todo,
};

pub const TODOS_KEY: &str = "MenuTodos_SavedTodos";
pub const CATEGORIES_KEY: &str = "MenuTodos_SavedCategories";
pub const SELECTED_CATEGORY_KEY: &str = "MenuTodos_SelectedCategory";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to encode {key}: {source}")]
    Encode { key: &'static str, source: serde_json::Error },
    #[error("failed to decode {key}: {source}")]
    Decode { key: &'static str, source: serde_json::Error },
    #[error("stored selection is not a category id: {0:?}")]
    InvalidSelection(String),
    #[error("blob store failure on {key}: {source}")]
    Backend { key: &'static str, source: anyhow::Error },
}

pub struct PersistenceGateway<B: BlobStore> {
    blobs: B,
}

impl<B: BlobStore> PersistenceGateway<B> {
    pub fn new(blobs: B) -> Self { Self { blobs } }

    pub fn blobs(&self) -> &B { &self.blobs }

    pub async fn save_todos(&self, todos: &[Todo]) -> Result<(), PersistError> {
        self.write(TODOS_KEY, &todos).await
    }

    /// `None` when nothing has been stored yet.
    pub async fn load_todos(&self) -> Result<Option<Vec<Todo>>, PersistError> {
        self.read(TODOS_KEY).await
    }

    pub async fn save_categories(&self, categories: &[Category]) -> Result<(), PersistError> {
        self.write(CATEGORIES_KEY, &categories).await
    }

    pub async fn load_categories(&self) -> Result<Option<Vec<Category>>, PersistError> {
        self.read(CATEGORIES_KEY).await
    }

    /// Stores the id as a plain UUID string; "all categories" removes the key.
    pub async fn save_selection(&self, selected: Option<CategoryId>) -> Result<(), PersistError> {
        let key = SELECTED_CATEGORY_KEY;
        let result = match selected {
            Some(id) => self.blobs.set(key, id.to_string().into_bytes()).await,
            None => self.blobs.remove(key).await,
        };
        result.map_err(|source| PersistError::Backend { key, source })
    }

    pub async fn load_selection(&self) -> Result<Option<CategoryId>, PersistError> {
        let key = SELECTED_CATEGORY_KEY;
        let Some(bytes) = self.blobs.get(key).await.map_err(|source| PersistError::Backend { key, source })? else {
            return Ok(None);
        };
        let raw = String::from_utf8_lossy(&bytes);
        Uuid::parse_str(raw.trim())
            .map(|id| Some(CategoryId(id)))
            .map_err(|_| PersistError::InvalidSelection(raw.into_owned()))
    }

    /// Moves todos that still carry the nil category id into `fallback`,
    /// saving the todos again when anything changed. Returns how many moved.
    pub async fn migrate_legacy(&self, todos: &mut [Todo], fallback: CategoryId) -> Result<usize, PersistError> {
        let mut moved = 0;
        for todo in todos.iter_mut().filter(|t| t.category_id.is_nil()) {
            todo.category_id = fallback;
            moved += 1;
        }
        if moved > 0 {
            self.save_todos(todos).await?;
        }
        Ok(moved)
    }

    async fn write<T: Serialize + ?Sized>(&self, key: &'static str, value: &T) -> Result<(), PersistError> {
        let bytes = serde_json::to_vec(value).map_err(|source| PersistError::Encode { key, source })?;
        self.blobs.set(key, bytes).await.map_err(|source| PersistError::Backend { key, source })
    }

    async fn read<T: DeserializeOwned>(&self, key: &'static str) -> Result<Option<T>, PersistError> {
        let Some(bytes) = self.blobs.get(key).await.map_err(|source| PersistError::Backend { key, source })? else {
            return Ok(None);
        };
        serde_json::from_slice(&bytes).map(Some).map_err(|source| PersistError::Decode { key, source })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::domain::category::Color;
    use crate::infrastructure::memory_store::InMemoryBlobStore;

    fn gateway() -> PersistenceGateway<InMemoryBlobStore> {
        PersistenceGateway::new(InMemoryBlobStore::new())
    }

    #[tokio::test]
    async fn todos_and_categories_round_trip() {
        let gw = gateway();
        let created = Utc.with_ymd_and_hms(2026, 10, 19, 7, 15, 0).unwrap() + Duration::milliseconds(250);
        let categories = Category::defaults(created);
        let mut done = Todo::new("Done".into(), None, categories[1].id, created);
        done.is_completed = true;
        let todos = vec![
            Todo::new("Call Max".into(), Some(created + Duration::days(1)), categories[0].id, created),
            done,
        ];

        gw.save_todos(&todos).await.unwrap();
        gw.save_categories(&categories).await.unwrap();

        assert_eq!(gw.load_todos().await.unwrap(), Some(todos));
        assert_eq!(gw.load_categories().await.unwrap(), Some(categories));
    }

    #[tokio::test]
    async fn writes_camel_case_records() {
        let gw = gateway();
        let now = Utc::now();
        let cat = Category::new("Errands", Color::rgb(0xFF, 0x88, 0), "cart.fill", now);
        gw.save_todos(&[Todo::new("x".into(), None, cat.id, now)]).await.unwrap();
        gw.save_categories(&[cat]).await.unwrap();

        let raw = gw.blobs().get(TODOS_KEY).await.unwrap().unwrap();
        let v: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        for field in ["id", "title", "isCompleted", "createdAt", "dueDate", "categoryId"] {
            assert!(v[0].get(field).is_some(), "missing {field}");
        }
        let raw = gw.blobs().get(CATEGORIES_KEY).await.unwrap().unwrap();
        let v: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(v[0]["color"], "#FF8800");
        assert_eq!(v[0]["systemIcon"], "cart.fill");
    }

    #[tokio::test]
    async fn missing_keys_load_as_none() {
        let gw = gateway();
        assert!(gw.load_todos().await.unwrap().is_none());
        assert!(gw.load_categories().await.unwrap().is_none());
        assert!(gw.load_selection().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn corrupt_blob_is_a_decode_error() {
        let gw = gateway();
        gw.blobs().set(TODOS_KEY, b"{not json".to_vec()).await.unwrap();
        assert!(matches!(gw.load_todos().await, Err(PersistError::Decode { key: TODOS_KEY, .. })));
    }

    #[tokio::test]
    async fn selection_is_plain_uuid_and_removed_for_all() {
        let gw = gateway();
        let id = CategoryId::new();
        gw.save_selection(Some(id)).await.unwrap();
        assert_eq!(gw.blobs().get(SELECTED_CATEGORY_KEY).await.unwrap(), Some(id.to_string().into_bytes()));
        assert_eq!(gw.load_selection().await.unwrap(), Some(id));

        gw.save_selection(None).await.unwrap();
        assert_eq!(gw.blobs().get(SELECTED_CATEGORY_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn migration_moves_nil_category_todos() {
        let gw = gateway();
        let now = Utc::now();
        let keep = CategoryId::new();
        let first = CategoryId::new();
        let mut todos = vec![
            Todo::new("legacy".into(), None, CategoryId::nil(), now),
            Todo::new("current".into(), None, keep, now),
        ];

        assert_eq!(gw.migrate_legacy(&mut todos, first).await.unwrap(), 1);
        assert_eq!(todos[0].category_id, first);
        assert_eq!(todos[1].category_id, keep);
        assert_eq!(gw.load_todos().await.unwrap(), Some(todos.clone()));

        gw.blobs().remove(TODOS_KEY).await.unwrap();
        assert_eq!(gw.migrate_legacy(&mut todos, first).await.unwrap(), 0);
        assert!(gw.load_todos().await.unwrap().is_none());
    }
}
