pub mod categories;
pub mod todos;

use crate::application::SharedStore;
use crate::domain::repository::BlobStore;

pub struct AppState<B: BlobStore> { pub store: SharedStore<B> }

impl<B: BlobStore> Clone for AppState<B> {
    fn clone(&self) -> Self { Self { store: self.store.clone() } }
}
