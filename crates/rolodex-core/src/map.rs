//! Multi-index map implementation and query surface
//!
//! A [`MultiIndexMap`] is a key-value map augmented with any number of named
//! secondary indices. Each index classifies values under a derived string key
//! produced by a caller-supplied key factory, so entries can be looked up by
//! primary key or by any registered classification without scanning the full
//! data set.

use std::collections::hash_map;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;
use std::ops;

use tracing::{debug, instrument};

use crate::error::{RolodexError, RolodexResult};
use crate::index::{Index, KeyFactory};

/// Statistics for a single registered index
#[derive(Debug, Clone)]
pub struct IndexStats {
    pub unique_keys: usize,
    pub indexed_entries: usize,
    pub average_entries_per_key: f64,
}

/// Overall statistics across the index registry
#[derive(Debug, Clone)]
pub struct RegistryStats {
    pub index_count: usize,
    pub total_unique_keys: usize,
    pub total_indexed_entries: usize,
    pub per_index: HashMap<String, IndexStats>,
    pub index_efficiency: f64,
}

/// A key-value map with named secondary string indices.
///
/// The map owns a **primary store** (`K -> V`, the single source of truth) and
/// an **index registry** (index name -> bucket map). Every mutation of the
/// primary store is mirrored into every registered index through its key
/// factory, and registering an index on a populated map backfills it from the
/// existing entries, so primary and index views stay mutually consistent at
/// all times.
///
/// Buckets hold primary keys only; the views returned by the query surface
/// resolve values through the primary store, so a value is stored exactly once
/// no matter how many indices classify it. A bucket is created lazily when its
/// first member arrives and dropped as soon as its last member leaves.
///
/// # Thread Safety
/// The map is **not** thread-safe and provides no internal synchronisation.
/// All operations are synchronous and run to completion; for concurrent use,
/// guard the whole structure behind a single exclusive lock (key factories are
/// `Send + Sync`, so the map can move into one when `K` and `V` allow it).
///
/// # Performance Characteristics
/// - **Insert / remove**: O(i) where i is the number of registered indices,
///   each index update O(1) amortised
/// - **Get by primary key**: O(1) average case, independent of indices
/// - **Index registration**: O(n) backfill over the current entries
/// - **Bucket lookup**: O(1) average case
///
/// # Usage Example
/// ```rust
/// use rolodex_core::MultiIndexMap;
///
/// #[derive(Clone)]
/// struct Contact {
///     name: String,
///     city: String,
/// }
///
/// let mut contacts = MultiIndexMap::new();
/// contacts.insert(
///     "alice",
///     Contact { name: "Alice".to_string(), city: "Lisbon".to_string() },
/// );
/// contacts.insert(
///     "bob",
///     Contact { name: "Bob".to_string(), city: "Porto".to_string() },
/// );
///
/// // Register an index over data that already exists; it is backfilled
/// contacts.add_index("by_city", |c: &Contact| c.city.clone()).unwrap();
///
/// let lisbon = contacts.lookup("by_city", "Lisbon").unwrap();
/// assert_eq!(lisbon.len(), 1);
/// assert_eq!(lisbon.get(&"alice").map(|c| c.name.as_str()), Some("Alice"));
/// ```
pub struct MultiIndexMap<K, V> {
    /// Primary store: the single source of truth for entries
    data: HashMap<K, V>,
    /// Index registry, keyed by index name
    indices: HashMap<String, Index<K, V>>,
}

impl<K, V> MultiIndexMap<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Creates a new empty map with no registered indices
    pub fn new() -> Self {
        Self { data: HashMap::new(), indices: HashMap::new() }
    }

    /// Creates a new map with pre-allocated capacity for entries
    pub fn with_capacity(capacity: usize) -> Self {
        Self { data: HashMap::with_capacity(capacity), indices: HashMap::new() }
    }

    /// Inserts or overwrites an entry, returning the displaced value if any.
    ///
    /// Every registered index is updated in the same call: a new entry joins
    /// the bucket for its derived key, and an overwrite whose derived key
    /// changed under some index moves the membership from the old bucket to
    /// the new one (creating it if absent). An overwrite whose derived key is
    /// unchanged leaves that index untouched, since bucket views resolve the
    /// refreshed value through the primary store.
    ///
    /// # Performance
    /// O(i) over the registered indices, each update O(1) amortised.
    ///
    /// # Example
    /// ```rust
    /// use rolodex_core::MultiIndexMap;
    ///
    /// let mut map = MultiIndexMap::new();
    /// map.add_index("by_parity", |v: &i64| (v % 2 == 0).to_string()).unwrap();
    ///
    /// assert_eq!(map.insert("answer", 41), None);
    /// assert_eq!(map.insert("answer", 42), Some(41));
    ///
    /// // The overwrite moved "answer" from the odd bucket to the even one
    /// assert!(map.try_lookup("by_parity", "false").is_none());
    /// assert!(map.lookup("by_parity", "true").unwrap().contains_key(&"answer"));
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let previous = self.data.get(&key);
        for index in self.indices.values_mut() {
            index.note_insert(&key, &value, previous);
        }
        self.data.insert(key, value)
    }

    /// Removes an entry, returning its value if it was present.
    ///
    /// The key is removed from the bucket that classified it in every
    /// registered index; a bucket left empty by the removal is dropped.
    /// Removing an absent key returns `None` and touches nothing.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let value = self.data.remove(key)?;
        for index in self.indices.values_mut() {
            index.note_remove(key, &value);
        }
        Some(value)
    }

    /// Empties the primary store and every index's bucket map.
    ///
    /// Index registrations (name and key factory) survive and keep applying
    /// to future insertions.
    #[instrument(skip(self))]
    pub fn clear(&mut self) {
        debug!(entries = self.data.len(), indices = self.indices.len(), "clearing map");
        self.data.clear();
        for index in self.indices.values_mut() {
            index.clear();
        }
    }

    /// Returns a reference to the value for `key`, if present
    pub fn get(&self, key: &K) -> Option<&V> {
        self.data.get(key)
    }

    /// Returns `true` if the primary store holds an entry for `key`
    pub fn contains_key(&self, key: &K) -> bool {
        self.data.contains_key(key)
    }

    /// Number of entries in the primary store
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the map holds no entries
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterates over all `(key, value)` entries in unspecified order.
    ///
    /// The iterator is lazy and restartable; independent iterations do not
    /// interfere with each other.
    pub fn iter(&self) -> hash_map::Iter<'_, K, V> {
        self.data.iter()
    }

    /// Iterates over all primary keys in unspecified order
    pub fn keys(&self) -> hash_map::Keys<'_, K, V> {
        self.data.keys()
    }

    /// Iterates over all values in unspecified order
    pub fn values(&self) -> hash_map::Values<'_, K, V> {
        self.data.values()
    }

    /// Registers a new index and backfills it from the existing entries.
    ///
    /// The key factory must be deterministic and side-effect-free; it is
    /// invoked once per value per relevant mutation. Registration is
    /// all-or-nothing: the index is built completely before it becomes
    /// visible, so no partially populated index is ever observable and a
    /// panicking key factory leaves the registry untouched.
    ///
    /// # Arguments
    /// * `name` - Unique index name; must contain at least one
    ///   non-whitespace character
    /// * `key_factory` - Derives the string bucket key for a value
    ///
    /// # Errors
    /// - [`RolodexError::InvalidArgument`] if `name` is empty or
    ///   whitespace-only
    /// - [`RolodexError::DuplicateIndex`] if `name` is already registered;
    ///   the existing index and its partitioning are left untouched
    ///
    /// # Performance
    /// O(n) over the current entries (backfill).
    ///
    /// # Example
    /// ```rust
    /// use rolodex_core::MultiIndexMap;
    ///
    /// let mut map = MultiIndexMap::new();
    /// map.insert(1, "pear".to_string());
    /// map.insert(2, "plum".to_string());
    /// map.insert(3, "fig".to_string());
    ///
    /// map.add_index("by_len", |v: &String| v.len().to_string()).unwrap();
    ///
    /// assert_eq!(map.lookup("by_len", "4").unwrap().len(), 2);
    /// assert!(map.add_index("by_len", |_: &String| "x".to_string()).is_err());
    /// ```
    #[instrument(skip(self, key_factory))]
    pub fn add_index<F>(&mut self, name: &str, key_factory: F) -> RolodexResult<()>
    where
        F: Fn(&V) -> String + Send + Sync + 'static,
    {
        if name.trim().is_empty() {
            return Err(RolodexError::invalid_argument(
                "name",
                "index name must contain at least one non-whitespace character",
            ));
        }
        if self.indices.contains_key(name) {
            return Err(RolodexError::duplicate_index(name));
        }

        // Built completely before it joins the registry, so callers never
        // observe a half-populated index.
        let factory: KeyFactory<V> = Box::new(key_factory);
        let mut index = Index::new(name.to_string(), factory);
        index.backfill(self.data.iter());

        debug!(index = name, backfilled = self.data.len(), "registered index");
        self.indices.insert(name.to_string(), index);
        Ok(())
    }

    /// Drops the named index and all its buckets.
    ///
    /// Returns `false` if no such index is registered; repeat calls are
    /// idempotent. The primary store is unaffected.
    #[instrument(skip(self))]
    pub fn remove_index(&mut self, name: &str) -> bool {
        let removed = self.indices.remove(name).is_some();
        if removed {
            debug!(index = name, "removed index");
        }
        removed
    }

    /// Returns `true` if an index with this name is registered
    pub fn contains_index(&self, name: &str) -> bool {
        self.indices.contains_key(name)
    }

    /// Number of registered indices
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Iterates over the names of all registered indices
    pub fn index_names(&self) -> impl Iterator<Item = &str> {
        self.indices.keys().map(String::as_str)
    }

    /// Returns the bucket view for a derived key, strict on both names.
    ///
    /// # Errors
    /// - [`RolodexError::IndexNotFound`] if `index_name` is unregistered
    /// - [`RolodexError::IndexKeyNotFound`] if the index holds no bucket for
    ///   `index_key`
    pub fn lookup(&self, index_name: &str, index_key: &str) -> RolodexResult<BucketView<'_, K, V>> {
        let index = self
            .indices
            .get(index_name)
            .ok_or_else(|| RolodexError::index_not_found(index_name))?;
        let (bucket_key, members) = index
            .bucket_entry(index_key)
            .ok_or_else(|| RolodexError::index_key_not_found(index_name, index_key))?;
        Ok(BucketView { index_key: bucket_key, members, data: &self.data })
    }

    /// Non-erroring bucket lookup.
    ///
    /// Returns `None` when the index is unregistered or the derived key has
    /// no bucket; it never fails.
    pub fn try_lookup(&self, index_name: &str, index_key: &str) -> Option<BucketView<'_, K, V>> {
        let index = self.indices.get(index_name)?;
        let (bucket_key, members) = index.bucket_entry(index_key)?;
        Some(BucketView { index_key: bucket_key, members, data: &self.data })
    }

    /// Returns whether the named index holds a bucket for `index_key`.
    ///
    /// Buckets are pruned when their last member leaves, so this reports
    /// `true` only for buckets with at least one entry.
    ///
    /// # Errors
    /// [`RolodexError::IndexNotFound`] if `index_name` is unregistered.
    pub fn contains_index_key(&self, index_name: &str, index_key: &str) -> RolodexResult<bool> {
        let index = self
            .indices
            .get(index_name)
            .ok_or_else(|| RolodexError::index_not_found(index_name))?;
        Ok(index.bucket(index_key).is_some())
    }

    /// All derived keys currently holding a bucket in the named index.
    ///
    /// # Errors
    /// [`RolodexError::IndexNotFound`] if `index_name` is unregistered.
    pub fn index_keys(&self, index_name: &str) -> RolodexResult<Vec<&str>> {
        let index = self
            .indices
            .get(index_name)
            .ok_or_else(|| RolodexError::index_not_found(index_name))?;
        Ok(index.bucket_keys().collect())
    }

    /// One bucket view per derived key in the named index.
    ///
    /// # Errors
    /// [`RolodexError::IndexNotFound`] if `index_name` is unregistered.
    pub fn index_values(&self, index_name: &str) -> RolodexResult<Vec<BucketView<'_, K, V>>> {
        let index = self
            .indices
            .get(index_name)
            .ok_or_else(|| RolodexError::index_not_found(index_name))?;
        Ok(self.collect_views(index))
    }

    /// Non-erroring variant of [`index_values`](Self::index_values); `None`
    /// if the index is unregistered
    pub fn try_index_values(&self, index_name: &str) -> Option<Vec<BucketView<'_, K, V>>> {
        let index = self.indices.get(index_name)?;
        Some(self.collect_views(index))
    }

    /// Returns statistics across the index registry for monitoring
    pub fn index_stats(&self) -> RegistryStats {
        let mut per_index = HashMap::new();
        let mut total_unique_keys = 0;
        let mut total_indexed_entries = 0;

        for (name, index) in &self.indices {
            let unique_keys = index.bucket_count();
            let indexed_entries = index.member_count();
            total_unique_keys += unique_keys;
            total_indexed_entries += indexed_entries;

            per_index.insert(
                name.clone(),
                IndexStats {
                    unique_keys,
                    indexed_entries,
                    average_entries_per_key: if unique_keys > 0 {
                        indexed_entries as f64 / unique_keys as f64
                    } else {
                        0.0
                    },
                },
            );
        }

        RegistryStats {
            index_count: self.indices.len(),
            total_unique_keys,
            total_indexed_entries,
            per_index,
            index_efficiency: if self.data.is_empty() {
                0.0
            } else {
                total_indexed_entries as f64 / self.data.len() as f64
            },
        }
    }

    fn collect_views<'a>(&'a self, index: &'a Index<K, V>) -> Vec<BucketView<'a, K, V>> {
        index
            .buckets()
            .map(|(bucket_key, members)| BucketView {
                index_key: bucket_key,
                members,
                data: &self.data,
            })
            .collect()
    }
}

impl<K, V> Default for MultiIndexMap<K, V>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for MultiIndexMap<K, V>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiIndexMap")
            .field("entries", &self.data)
            .field("indices", &self.indices.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Strict primary-key access, `map[&key]`.
///
/// # Panics
/// Panics if the key is not present, exactly as indexing a
/// `std::collections::HashMap` does. Use [`MultiIndexMap::get`] for the
/// non-panicking variant.
impl<K, V> ops::Index<&K> for MultiIndexMap<K, V>
where
    K: Eq + Hash + Clone,
{
    type Output = V;

    fn index(&self, key: &K) -> &V {
        self.get(key).expect("no entry found for key")
    }
}

impl<K, V> Extend<(K, V)> for MultiIndexMap<K, V>
where
    K: Eq + Hash + Clone,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K, V> FromIterator<(K, V)> for MultiIndexMap<K, V>
where
    K: Eq + Hash + Clone,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<'a, K, V> IntoIterator for &'a MultiIndexMap<K, V>
where
    K: Eq + Hash + Clone,
{
    type Item = (&'a K, &'a V);
    type IntoIter = hash_map::Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Read-only view of one bucket: the sub-map of entries sharing a derived key.
///
/// The view borrows the bucket's member set and the owning map's primary
/// store, so it always reflects the values currently stored and cannot be
/// used to mutate either. Obtain views through [`MultiIndexMap::lookup`],
/// [`MultiIndexMap::try_lookup`], or [`MultiIndexMap::index_values`].
pub struct BucketView<'a, K, V> {
    index_key: &'a str,
    members: &'a HashSet<K>,
    data: &'a HashMap<K, V>,
}

impl<'a, K, V> BucketView<'a, K, V>
where
    K: Eq + Hash,
{
    /// The derived key this bucket is filed under
    pub fn index_key(&self) -> &'a str {
        self.index_key
    }

    /// Number of entries classified under this bucket
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` if the bucket holds no entries
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Returns `true` if the bucket classifies the entry for `key`
    pub fn contains_key(&self, key: &K) -> bool {
        self.members.contains(key)
    }

    /// Returns the value for `key` if this bucket classifies it
    pub fn get(&self, key: &K) -> Option<&'a V> {
        if self.members.contains(key) { self.data.get(key) } else { None }
    }

    /// Iterates over the `(key, value)` entries of this bucket in
    /// unspecified order
    pub fn iter(&self) -> impl Iterator<Item = (&'a K, &'a V)> {
        self.members.iter().filter_map(|key| self.data.get(key).map(|value| (key, value)))
    }

    /// Iterates over the primary keys of this bucket
    pub fn keys(&self) -> impl Iterator<Item = &'a K> {
        self.members.iter()
    }

    /// Iterates over the values of this bucket
    pub fn values(&self) -> impl Iterator<Item = &'a V> {
        self.iter().map(|(_, value)| value)
    }
}

impl<K, V> Clone for BucketView<'_, K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V> Copy for BucketView<'_, K, V> {}

impl<K, V> fmt::Debug for BucketView<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BucketView")
            .field("index_key", &self.index_key)
            .field("entries", &self.members.len())
            .finish()
    }
}
