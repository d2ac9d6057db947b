//! Per-query cache of fetched todo lists

use crate::model::{QueryKey, Todo};
use std::collections::HashMap;

/// Normalized lists keyed by the view that fetched them
///
/// Every [`clear`](Self::clear) starts a new generation. A fetch records the
/// generation it started under and may only store its result if no clear
/// happened meanwhile.
#[derive(Debug, Default)]
pub(crate) struct QueryCache {
    entries: HashMap<QueryKey, Vec<Todo>>,
    generation: u64,
}

impl QueryCache {
    pub(crate) fn get(&self, key: &QueryKey) -> Option<Vec<Todo>> {
        self.entries.get(key).cloned()
    }

    pub(crate) const fn generation(&self) -> u64 {
        self.generation
    }

    /// Store `todos` for `key`; false if the cache was cleared since `generation`
    pub(crate) fn insert(&mut self, key: QueryKey, todos: Vec<Todo>, generation: u64) -> bool {
        if generation != self.generation {
            return false;
        }
        self.entries.insert(key, todos);
        true
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.generation += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(query: &str) -> QueryKey {
        QueryKey {
            query_string: query.to_string(),
            ..QueryKey::default()
        }
    }

    #[test]
    fn entries_are_keyed_by_query() {
        let mut cache = QueryCache::default();
        let todos = vec![Todo::placeholder("a", "c-1", "t")];

        assert!(cache.insert(key("cat"), todos.clone(), cache.generation()));
        assert_eq!(cache.get(&key("cat")), Some(todos));
        assert_eq!(cache.get(&key("")), None);
    }

    #[test]
    fn clear_drops_everything() {
        let mut cache = QueryCache::default();
        let generation = cache.generation();
        cache.insert(key(""), Vec::new(), generation);
        cache.insert(key("cat"), Vec::new(), generation);

        cache.clear();

        assert_eq!(cache.get(&key("")), None);
        assert_eq!(cache.get(&key("cat")), None);
    }

    #[test]
    fn results_from_before_a_clear_are_refused() {
        let mut cache = QueryCache::default();
        let started = cache.generation();

        cache.clear();

        assert!(!cache.insert(key(""), Vec::new(), started));
        assert_eq!(cache.get(&key("")), None);
    }
}
