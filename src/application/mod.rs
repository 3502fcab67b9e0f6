pub mod persistence;
pub mod todo_store;

use std::sync::Arc;

use tokio::sync::Mutex;

use todo_store::TodoStore;

/// The store behind a single lock, so every caller's mutations are serialized.
pub type SharedStore<B> = Arc<Mutex<TodoStore<B>>>;

pub fn shared<B: crate::domain::repository::BlobStore>(store: TodoStore<B>) -> SharedStore<B> {
    Arc::new(Mutex::new(store))
}
