use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::category::CategoryId;
use super::timestamp;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct TodoId(pub Uuid);

impl Default for TodoId {
    fn default() -> Self { Self(Uuid::new_v4()) }
}

impl std::fmt::Display for TodoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { self.0.fmt(f) }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: TodoId,
    pub title: String,
    pub is_completed: bool,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp::option", default)]
    pub due_date: Option<DateTime<Utc>>,
    // Records written before categories existed carry no categoryId; they
    // decode to the nil id and are picked up by the legacy migration.
    #[serde(default = "CategoryId::nil")]
    pub category_id: CategoryId,
}

impl Todo {
    pub fn new(title: String, due_date: Option<DateTime<Utc>>, category_id: CategoryId, created_at: DateTime<Utc>) -> Self {
        Self { id: TodoId::default(), title, is_completed: false, created_at, due_date, category_id }
    }

    /// An open todo whose due date has already passed.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.is_completed && self.due_date.is_some_and(|due| due < now)
    }
}

/// Moves the items at `source` to the insertion offset `destination`, keeping
/// their relative order. `destination` is measured against the list before
/// removal, in `0..=len`.
///
/// Returns `false` and leaves `items` untouched when `source` is empty or any
/// index is out of range.
pub fn move_items<T>(items: &mut Vec<T>, source: &[usize], destination: usize) -> bool {
    let len = items.len();
    if source.is_empty() || destination > len || source.iter().any(|&i| i >= len) {
        return false;
    }
    let mut picked = vec![false; len];
    for &i in source { picked[i] = true; }
    let shift = picked[..destination].iter().filter(|&&p| p).count();

    let mut moving = Vec::new();
    let mut rest = Vec::with_capacity(len);
    for (i, item) in items.drain(..).enumerate() {
        if picked[i] { moving.push(item) } else { rest.push(item) }
    }
    let at = destination - shift;
    rest.splice(at..at, moving);
    *items = rest;
    true
}
