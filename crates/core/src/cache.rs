use std::collections::BTreeMap;

use crate::model::{Category, CategoryId};

/// Categories known to the client, keyed by id.
///
/// Owned by whoever drives the pages and handed to the renderer by shared
/// reference; only the page controllers write to it.
#[derive(Debug, Clone, Default)]
pub struct CategoryCache {
    entries: BTreeMap<CategoryId, Category>,
}

impl CategoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: CategoryId) -> Option<&Category> {
        self.entries.get(&id)
    }

    pub fn contains(&self, id: CategoryId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Categories in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn replace_all<I: IntoIterator<Item = Category>>(&mut self, categories: I) {
        self.entries = categories
            .into_iter()
            .map(|category| (category.id, category))
            .collect();
    }

    pub fn insert(&mut self, category: Category) {
        self.entries.insert(category.id, category);
    }

    pub fn remove(&mut self, id: CategoryId) -> Option<Category> {
        self.entries.remove(&id)
    }
}
