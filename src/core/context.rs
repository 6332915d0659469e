//! # Context: results of the tasks that succeeded.
//!
//! [`Context`] maps task id → the value that task's handle returned. Only tasks
//! that reached `Succeeded` get an entry, so a context is equally the full result
//! of a clean run and the partial result of a failed one.
//!
//! Ids are expected to be unique across tasks. That is the caller's invariant:
//! a second success under the same id replaces the first.

use std::collections::hash_map;
use std::collections::HashMap;

/// Successful task results keyed by task id.
#[derive(Debug, Clone, PartialEq)]
pub struct Context<T> {
    entries: HashMap<String, T>,
}

impl<T> Default for Context<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<T> Context<T> {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a task's result, returning any value previously stored under the id.
    pub(crate) fn insert(&mut self, id: impl Into<String>, value: T) -> Option<T> {
        self.entries.insert(id.into(), value)
    }

    /// Returns the result of task `id`.
    pub fn get(&self, id: &str) -> Option<&T> {
        self.entries.get(id)
    }

    /// True if task `id` succeeded.
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Removes and returns the result of task `id`.
    pub fn remove(&mut self, id: &str) -> Option<T> {
        self.entries.remove(id)
    }

    /// Number of succeeded tasks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no task succeeded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sorted ids of the succeeded tasks.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Iterates over `(id, result)` pairs in arbitrary order.
    pub fn iter(&self) -> hash_map::Iter<'_, String, T> {
        self.entries.iter()
    }

    /// Unwraps into the underlying map.
    pub fn into_inner(self) -> HashMap<String, T> {
        self.entries
    }
}

impl<T> IntoIterator for Context<T> {
    type Item = (String, T);
    type IntoIter = hash_map::IntoIter<String, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Context<T> {
    type Item = (&'a String, &'a T);
    type IntoIter = hash_map::Iter<'a, String, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_id_overwrites() {
        let mut ctx = Context::new();
        assert!(ctx.insert("a", 1).is_none());
        assert_eq!(ctx.insert("a", 2), Some(1));
        assert_eq!(ctx.get("a"), Some(&2));
        assert_eq!(ctx.len(), 1);
    }

    #[test]
    fn ids_are_sorted() {
        let mut ctx = Context::new();
        ctx.insert("us-east", ());
        ctx.insert("eu-west", ());
        ctx.insert("ap-south", ());
        assert_eq!(ctx.ids(), vec!["ap-south", "eu-west", "us-east"]);
    }
}
