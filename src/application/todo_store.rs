use std::fmt;
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::persistence::PersistenceGateway;
use crate::domain::{
    category::{Category, CategoryError, CategoryId, CategoryRegistry, Color},
    clock::{Clock, SystemClock},
    repository::BlobStore,
    text_parser::TaskTextParser,
    todo::{move_items, Todo, TodoId},
};

const EVENT_CAPACITY: usize = 64;

/// Emitted after every successful mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    TodosChanged,
    CategoriesChanged,
    SelectionChanged,
}

/// Counts for the current view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoStats {
    pub category_name: String,
    pub completed: usize,
    pub total: usize,
}

impl fmt::Display for TodoStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.total == 0 {
            write!(f, "No tasks in {}", self.category_name)
        } else {
            write!(f, "{} of {} tasks completed", self.completed, self.total)
        }
    }
}

pub struct StoreOptions {
    pub parser: TaskTextParser,
    pub clock: Arc<dyn Clock>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self { parser: TaskTextParser::default(), clock: Arc::new(SystemClock) }
    }
}

/// Owns the todo list and the category registry.
///
/// Every mutation updates memory first, then writes the affected collection
/// through the [`PersistenceGateway`]. Write failures are logged and dropped,
/// leaving the last good stored state in place.
pub struct TodoStore<B: BlobStore> {
    todos: Vec<Todo>,
    categories: CategoryRegistry,
    gateway: PersistenceGateway<B>,
    parser: TaskTextParser,
    clock: Arc<dyn Clock>,
    events: broadcast::Sender<StoreEvent>,
}

impl<B: BlobStore> TodoStore<B> {
    pub async fn open(blobs: B) -> Self {
        Self::open_with(blobs, StoreOptions::default()).await
    }

    /// Loads categories (seeding defaults), then todos, then the selection,
    /// then rewrites legacy todos. Unreadable data is treated as absent.
    pub async fn open_with(blobs: B, options: StoreOptions) -> Self {
        let gateway = PersistenceGateway::new(blobs);
        let StoreOptions { parser, clock } = options;

        let loaded = gateway.load_categories().await.unwrap_or_else(|err| {
            warn!(%err, "ignoring stored categories");
            None
        });
        let (mut categories, seeded) = CategoryRegistry::from_loaded(loaded, clock.now());
        if seeded {
            info!("seeding default categories");
            if let Err(err) = gateway.save_categories(categories.list()).await {
                warn!(%err, "failed to save default categories");
            }
        }

        let mut todos = gateway
            .load_todos()
            .await
            .unwrap_or_else(|err| {
                warn!(%err, "ignoring stored todos");
                None
            })
            .unwrap_or_default();

        let stored = gateway.load_selection().await.unwrap_or_else(|err| {
            warn!(%err, "ignoring stored selection");
            None
        });
        categories.restore_selection(stored);

        if let Some(first) = categories.first().map(|c| c.id) {
            match gateway.migrate_legacy(&mut todos, first).await {
                Ok(0) => {}
                Ok(moved) => info!(moved, category = %first, "moved legacy todos into first category"),
                Err(err) => warn!(%err, "failed to save migrated todos"),
            }
        }

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        info!(todos = todos.len(), categories = categories.list().len(), "store ready");
        Self { todos, categories, gateway, parser, clock, events }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> { self.events.subscribe() }

    // Todos

    /// Parses `raw` and appends a new todo. Blank input is ignored.
    ///
    /// The todo lands in `category_id` if given, else the selected category,
    /// else the first one. An explicit id that names no category is refused.
    pub async fn add(&mut self, raw: &str, category_id: Option<CategoryId>) -> Option<Todo> {
        if raw.trim().is_empty() {
            debug!("ignoring blank todo");
            return None;
        }
        if let Some(id) = category_id.filter(|id| !self.categories.contains(*id)) {
            debug!(category = %id, "ignoring todo for unknown category");
            return None;
        }
        let target = category_id
            .or_else(|| self.categories.selected_id())
            .or_else(|| self.categories.first().map(|c| c.id))
            .unwrap_or_else(CategoryId::new);

        let now = self.clock.now();
        let parsed = self.parser.parse(raw, now);
        let todo = Todo::new(parsed.title, parsed.due_date, target, now);
        debug!(id = %todo.id, category = %target, due = ?todo.due_date, "added todo");
        self.todos.push(todo.clone());
        self.todos_changed().await;
        Some(todo)
    }

    pub async fn toggle(&mut self, id: TodoId) -> Option<Todo> {
        let todo = self.todos.iter_mut().find(|t| t.id == id)?;
        todo.is_completed = !todo.is_completed;
        let todo = todo.clone();
        debug!(%id, completed = todo.is_completed, "toggled todo");
        self.todos_changed().await;
        Some(todo)
    }

    /// Re-parses `raw` into the todo's title and due date.
    pub async fn update(&mut self, id: TodoId, raw: &str) -> Option<Todo> {
        if raw.trim().is_empty() {
            debug!(%id, "ignoring blank edit");
            return None;
        }
        let index = self.todos.iter().position(|t| t.id == id)?;
        let parsed = self.parser.parse(raw, self.clock.now());
        let todo = &mut self.todos[index];
        todo.title = parsed.title;
        todo.due_date = parsed.due_date;
        let todo = todo.clone();
        debug!(%id, "updated todo");
        self.todos_changed().await;
        Some(todo)
    }

    pub async fn delete(&mut self, id: TodoId) -> bool {
        let before = self.todos.len();
        self.todos.retain(|t| t.id != id);
        if self.todos.len() == before {
            return false;
        }
        debug!(%id, "deleted todo");
        self.todos_changed().await;
        true
    }

    /// Moves todos within the visible list. Todos hidden by the category
    /// filter keep their positions; the visible ones are rewritten into the
    /// slots they already occupied.
    pub async fn reorder(&mut self, source: &[usize], destination: usize) -> bool {
        let slots: Vec<usize> = (0..self.todos.len()).filter(|&i| self.is_visible(&self.todos[i])).collect();
        let mut order = slots.clone();
        if !move_items(&mut order, source, destination) {
            debug!(?source, destination, visible = slots.len(), "ignoring out of range reorder");
            return false;
        }
        let moved: Vec<Todo> = order.iter().map(|&i| self.todos[i].clone()).collect();
        for (slot, todo) in slots.into_iter().zip(moved) {
            self.todos[slot] = todo;
        }
        self.todos_changed().await;
        true
    }

    /// Drops completed todos in the selected category, or everywhere when
    /// no category is selected. Returns how many were removed.
    pub async fn clear_completed(&mut self) -> usize {
        let scope = self.categories.selected_id();
        let before = self.todos.len();
        self.todos.retain(|t| !(t.is_completed && scope.is_none_or(|id| t.category_id == id)));
        let removed = before - self.todos.len();
        if removed > 0 {
            debug!(removed, "cleared completed todos");
            self.todos_changed().await;
        }
        removed
    }

    // Categories

    pub async fn create_category(&mut self, name: &str, color: Color, icon: &str) -> Category {
        let category = self.categories.create(name, color, icon, self.clock.now());
        debug!(id = %category.id, name = %category.name, "created category");
        self.persist_categories().await;
        self.emit(StoreEvent::CategoriesChanged);
        category
    }

    /// Removes a category and moves its todos into the first remaining one.
    /// `Ok(false)` means no category had that id.
    pub async fn delete_category(&mut self, id: CategoryId) -> Result<bool, CategoryError> {
        let Some(removal) = self.categories.delete(id, &mut self.todos)? else { return Ok(false) };
        info!(
            category = %removal.removed.name,
            reassigned = removal.reassigned,
            to = %removal.reassigned_to,
            "deleted category"
        );
        self.persist_categories().await;
        self.emit(StoreEvent::CategoriesChanged);
        self.todos_changed().await;
        if removal.selection_moved {
            self.persist_selection().await;
            self.emit(StoreEvent::SelectionChanged);
        }
        Ok(true)
    }

    /// Selects a category, or all of them for `None`. Only the selection is
    /// written back. Unknown ids are ignored.
    pub async fn select_category(&mut self, id: Option<CategoryId>) -> bool {
        if !self.categories.select(id) {
            debug!(category = ?id, "ignoring selection of unknown category");
            return false;
        }
        self.persist_selection().await;
        self.emit(StoreEvent::SelectionChanged);
        true
    }

    // Queries

    pub fn todos(&self) -> &[Todo] { &self.todos }

    pub fn todo(&self, id: TodoId) -> Option<&Todo> { self.todos.iter().find(|t| t.id == id) }

    pub fn categories(&self) -> &[Category] { self.categories.list() }

    pub fn category(&self, id: CategoryId) -> Option<&Category> { self.categories.get(id) }

    pub fn selected_category_id(&self) -> Option<CategoryId> { self.categories.selected_id() }

    pub fn selected_category(&self) -> Option<&Category> { self.categories.selected() }

    /// Todos under the current filter, in store order.
    pub fn visible_todos(&self) -> Vec<&Todo> {
        self.todos.iter().filter(|t| self.is_visible(t)).collect()
    }

    pub fn count_in_category(&self, id: CategoryId) -> usize {
        self.todos.iter().filter(|t| t.category_id == id).count()
    }

    pub fn has_completed(&self) -> bool { self.visible().any(|t| t.is_completed) }

    pub fn completed_count(&self) -> usize { self.visible().filter(|t| t.is_completed).count() }

    pub fn total_count(&self) -> usize { self.visible().count() }

    pub fn stats(&self) -> TodoStats {
        TodoStats {
            category_name: self.selected_category().map_or_else(|| "All".to_string(), |c| c.name.clone()),
            completed: self.completed_count(),
            total: self.total_count(),
        }
    }

    fn visible(&self) -> impl Iterator<Item = &Todo> {
        self.todos.iter().filter(|t| self.is_visible(t))
    }

    fn is_visible(&self, todo: &Todo) -> bool {
        self.categories.selected_id().is_none_or(|id| todo.category_id == id)
    }

    async fn todos_changed(&self) {
        if let Err(err) = self.gateway.save_todos(&self.todos).await {
            warn!(%err, "failed to save todos");
        }
        self.emit(StoreEvent::TodosChanged);
    }

    async fn persist_categories(&self) {
        if let Err(err) = self.gateway.save_categories(self.categories.list()).await {
            warn!(%err, "failed to save categories");
        }
    }

    async fn persist_selection(&self) {
        if let Err(err) = self.gateway.save_selection(self.categories.selected_id()).await {
            warn!(%err, "failed to save selection");
        }
    }

    fn emit(&self, event: StoreEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}
