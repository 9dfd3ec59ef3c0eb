use super::handle::Handle;
use std::collections::HashMap;

/// Append-only store of named resources addressed by [`Handle`].
///
/// Names are resolved once, when a material or pass is set up; the render
/// loop only ever deals in handles.
pub struct ResourceCache<T> {
    items: Vec<T>,
    names: HashMap<String, Handle<T>>,
}

impl<T> Default for ResourceCache<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            names: HashMap::new(),
        }
    }
}

impl<T> ResourceCache<T> {
    /// Inserts an item under `name`.  A later insert with the same name
    /// shadows the earlier one for lookups; the earlier handle stays valid.
    pub fn insert(&mut self, name: &str, item: T) -> Handle<T> {
        let idx = self.items.len() as u32;
        self.items.push(item);
        let handle = Handle::new(idx);
        if self.names.insert(name.to_owned(), handle).is_some() {
            log::warn!("Resource name {} is already in use; shadowing", name);
        }
        handle
    }

    pub fn find(&self, name: &str) -> Option<Handle<T>> {
        self.names.get(name).copied()
    }

    /// Get a reference to a resource by handle.
    /// Returns None if the handle is invalid.
    pub fn get(&self, h: Handle<T>) -> Option<&T> {
        self.items.get(h.idx())
    }

    /// Get a mutable reference to a resource by handle.
    /// Returns None if the handle is invalid.
    pub fn get_mut(&mut self, h: Handle<T>) -> Option<&mut T> {
        self.items.get_mut(h.idx())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.items.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
