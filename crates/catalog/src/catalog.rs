use crate::item::CatalogItem;
use std::collections::HashMap;

/// Immutable, ordered snapshot of every known item.
///
/// Items are sorted newest first by creation time. Synchronization builds a
/// whole new catalog and swaps it in; nothing ever mutates one in place, so a
/// reader holding an older snapshot keeps seeing it exactly as it was.
#[derive(Debug, Default, Clone)]
pub struct Catalog {
    items: Vec<CatalogItem>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// Sort and index `items`. The sort is stable, so items created at the
    /// same moment keep their relative order. If two items share a name, the
    /// first one wins the lookup.
    pub fn new(mut items: Vec<CatalogItem>) -> Self {
        items.sort_by(|a, b| b.created.cmp(&a.created));
        let mut index = HashMap::with_capacity(items.len());
        for (position, item) in items.iter().enumerate() {
            index.entry(item.name.clone()).or_insert(position);
        }
        Self { items, index }
    }

    pub fn get(&self, name: &str) -> Option<&CatalogItem> {
        self.index.get(name).map(|&position| &self.items[position])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// The most recently created item.
    pub fn first(&self) -> Option<&CatalogItem> {
        self.items.first()
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
