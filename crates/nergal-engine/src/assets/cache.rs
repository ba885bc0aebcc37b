use std::collections::HashMap;
use std::hash::Hash;
use std::rc::Rc;

/// Id-keyed store of shared resources.
#[derive(Debug)]
pub struct ResourceCache<K, V> {
    entries: HashMap<K, Rc<V>>,
}

impl<K, V> Default for ResourceCache<K, V> {
    fn default() -> Self {
        Self { entries: HashMap::new() }
    }
}

impl<K: Copy + Eq + Hash, V> ResourceCache<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: K) -> Option<Rc<V>> {
        self.entries.get(&id).cloned()
    }

    /// Returns the cached entry for `id`, building it with `build` on a miss.
    ///
    /// A failed build leaves the cache untouched.
    pub fn get_or_try_insert_with<E>(
        &mut self,
        id: K,
        build: impl FnOnce() -> Result<V, E>,
    ) -> Result<Rc<V>, E> {
        if let Some(v) = self.entries.get(&id) {
            return Ok(v.clone());
        }
        let value = Rc::new(build()?);
        self.entries.insert(id, value.clone());
        Ok(value)
    }

    pub fn insert(&mut self, id: K, value: V) -> Rc<V> {
        let value = Rc::new(value);
        self.entries.insert(id, value.clone());
        value
    }

    /// Drops the cache's reference to `id`. Missing ids are ignored.
    pub fn free(&mut self, id: K) -> Option<Rc<V>> {
        self.entries.remove(&id)
    }

    /// Drops every entry and returns how many there were.
    pub fn free_all(&mut self) -> usize {
        let n = self.entries.len();
        self.entries.clear();
        n
    }

    #[inline]
    pub fn contains(&self, id: K) -> bool {
        self.entries.contains_key(&id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = K> + '_ {
        self.entries.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn builds_once_until_freed() {
        let builds = Cell::new(0);
        let mut cache: ResourceCache<u32, String> = ResourceCache::new();
        let build = || -> Result<String, ()> {
            builds.set(builds.get() + 1);
            Ok(format!("v{}", builds.get()))
        };

        let a = cache.get_or_try_insert_with(7, build).unwrap();
        let b = cache.get_or_try_insert_with(7, build).unwrap();
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(builds.get(), 1);

        cache.free(7);
        let c = cache.get_or_try_insert_with(7, build).unwrap();
        assert_eq!(builds.get(), 2);
        assert_eq!(*c, "v2");
        assert!(!Rc::ptr_eq(&a, &c));
    }

    #[test]
    fn failed_build_is_not_cached() {
        let mut cache: ResourceCache<u32, u8> = ResourceCache::new();
        assert!(cache.get_or_try_insert_with(1, || Err::<u8, _>("nope")).is_err());
        assert!(!cache.contains(1));
    }

    #[test]
    fn free_missing_is_noop() {
        let mut cache: ResourceCache<u32, u8> = ResourceCache::new();
        cache.insert(1, 1);
        assert!(cache.free(2).is_none());
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.free_all(), 1);
        assert!(cache.is_empty());
    }
}
