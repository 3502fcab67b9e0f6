use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use uuid::Uuid;

use super::timestamp;
use super::todo::Todo;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct CategoryId(pub Uuid);

impl CategoryId {
    pub fn new() -> Self { Self(Uuid::new_v4()) }

    /// The all-zero id carried by todos recorded before categories existed.
    pub fn nil() -> Self { Self(Uuid::nil()) }

    pub fn is_nil(&self) -> bool { self.0.is_nil() }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

/// 24-bit RGB color, persisted as `#RRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color { pub r: u8, pub g: u8, pub b: u8 }

impl Color {
    pub const BLUE: Color = Color::rgb(0x00, 0x7A, 0xFF);
    pub const ORANGE: Color = Color::rgb(0xFF, 0x95, 0x00);
    pub const GREEN: Color = Color::rgb(0x34, 0xC7, 0x59);
    pub const RED: Color = Color::rgb(0xFF, 0x3B, 0x30);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self { Self { r, g, b } }
}

impl Default for Color {
    fn default() -> Self { Color::BLUE }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid color {0:?}, expected #RRGGBB or #RGB")]
pub struct ParseColorError(String);

impl FromStr for Color {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseColorError(s.to_string());
        let hex = s.trim().trim_start_matches('#');
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) { return Err(err()); }
        let value = u32::from_str_radix(hex, 16).map_err(|_| err())?;
        match hex.len() {
            3 => {
                let nibble = |shift: u32| ((value >> shift) & 0xF) as u8 * 17;
                Ok(Color::rgb(nibble(8), nibble(4), nibble(0)))
            }
            6 => Ok(Color::rgb((value >> 16) as u8, (value >> 8) as u8, value as u8)),
            _ => Err(err()),
        }
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Color {
    // An unreadable color should not cost the user the whole category list.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(raw.parse().unwrap_or_default())
    }
}

pub const DEFAULT_ICON: &str = "folder.fill";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub color: Color,
    #[serde(rename = "systemIcon")]
    pub icon: String,
    pub is_default: bool,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Category {
    pub fn new(name: impl Into<String>, color: Color, icon: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self { id: CategoryId::new(), name: name.into(), color, icon: icon.into(), is_default: false, created_at }
    }

    /// Personal, Work, Shopping and Health, in that order.
    pub fn defaults(created_at: DateTime<Utc>) -> Vec<Category> {
        [
            ("Personal", Color::BLUE, "person.fill"),
            ("Work", Color::ORANGE, "briefcase.fill"),
            ("Shopping", Color::GREEN, "cart.fill"),
            ("Health", Color::RED, "heart.fill"),
        ]
        .into_iter()
        .map(|(name, color, icon)| Category { is_default: true, ..Category::new(name, color, icon, created_at) })
        .collect()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CategoryError {
    #[error("cannot delete the last category")]
    LastCategory,
}

/// Outcome of a successful [`CategoryRegistry::delete`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removal {
    pub removed: Category,
    pub reassigned_to: CategoryId,
    pub reassigned: usize,
    pub selection_moved: bool,
}

/// Ordered category set plus the current selection. Never empty.
#[derive(Debug, Clone)]
pub struct CategoryRegistry {
    categories: Vec<Category>,
    selected: Option<CategoryId>,
}

impl CategoryRegistry {
    /// Builds a registry from loaded categories, seeding the defaults when
    /// there are none. The second value is `true` when seeding happened.
    pub fn from_loaded(categories: Option<Vec<Category>>, now: DateTime<Utc>) -> (Self, bool) {
        match categories {
            Some(list) if !list.is_empty() => (Self { categories: list, selected: None }, false),
            _ => (Self { categories: Category::defaults(now), selected: None }, true),
        }
    }

    pub fn list(&self) -> &[Category] { &self.categories }

    pub fn get(&self, id: CategoryId) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn contains(&self, id: CategoryId) -> bool { self.get(id).is_some() }

    pub fn first(&self) -> Option<&Category> { self.categories.first() }

    pub fn selected_id(&self) -> Option<CategoryId> { self.selected }

    pub fn selected(&self) -> Option<&Category> {
        self.selected.and_then(|id| self.get(id))
    }

    pub fn create(&mut self, name: impl Into<String>, color: Color, icon: impl Into<String>, now: DateTime<Utc>) -> Category {
        let category = Category::new(name, color, icon, now);
        self.categories.push(category.clone());
        category
    }

    /// Points the selection at `id`, or at "all categories" for `None`.
    /// Returns `false` without changing anything when `id` is unknown.
    pub fn select(&mut self, id: Option<CategoryId>) -> bool {
        if let Some(id) = id {
            if !self.contains(id) { return false; }
        }
        self.selected = id;
        true
    }

    /// Restores a persisted selection, falling back to the first category
    /// when the stored id is absent or stale.
    pub fn restore_selection(&mut self, stored: Option<CategoryId>) {
        self.selected = stored.filter(|id| self.contains(*id)).or_else(|| self.first().map(|c| c.id));
    }

    /// Removes a category, moving its todos to the first remaining category.
    ///
    /// Returns `Ok(None)` when `id` is unknown.
    pub fn delete(&mut self, id: CategoryId, todos: &mut [Todo]) -> Result<Option<Removal>, CategoryError> {
        if self.categories.len() <= 1 {
            return Err(CategoryError::LastCategory);
        }
        let Some(index) = self.categories.iter().position(|c| c.id == id) else { return Ok(None) };
        let removed = self.categories.remove(index);
        let reassigned_to = self.categories[0].id;

        let mut reassigned = 0;
        for todo in todos.iter_mut().filter(|t| t.category_id == id) {
            todo.category_id = reassigned_to;
            reassigned += 1;
        }

        let selection_moved = self.selected == Some(id);
        if selection_moved {
            self.selected = Some(reassigned_to);
        }
        Ok(Some(Removal { removed, reassigned_to, reassigned, selection_moved }))
    }
}
