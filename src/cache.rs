//! Memoization helpers and the thread-local regex compilation cache.
//!
//! The main job of these caches is not speed but quiet logs: pattern
//! compilation logs what it builds, and a pattern referenced from several
//! places should only show up once.
//!
//! Entries are never evicted. Use these for small, bounded key spaces such as
//! the set of patterns in one configuration file.

use regex::Regex;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

/// Caches the results of a side-effect-free function by argument value.
///
/// The wrapped function runs at most once per distinct key for the lifetime
/// of the `Memo`.
pub struct Memo<K, V, F> {
    func: F,
    cache: RefCell<HashMap<K, V>>,
}

impl<K, V, F> Memo<K, V, F>
where
    K: Eq + Hash + Clone,
    V: Clone,
    F: Fn(&K) -> V,
{
    pub fn new(func: F) -> Self {
        Self {
            func,
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Return the cached result for `key`, computing it on first use.
    pub fn call(&self, key: &K) -> V {
        if let Some(value) = self.cache.borrow().get(key) {
            return value.clone();
        }

        // Borrow is released before calling out, so `func` may itself use
        // other memos without tripping the RefCell.
        let value = (self.func)(key);
        self.cache
            .borrow_mut()
            .entry(key.clone())
            .or_insert(value)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.cache.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.cache.borrow_mut().clear();
    }
}

impl<K, V, F> fmt::Debug for Memo<K, V, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memo")
            .field("entries", &self.cache.borrow().len())
            .finish()
    }
}

/// Cache keyed by the `Debug` text of an argument tuple.
///
/// Arguments of different types that print the same share one entry:
/// `1i32` and `1u64` are the same call as far as this cache is concerned.
/// Prefer [`Memo`] unless that behavior is what you want.
pub struct ReprMemo<V> {
    cache: RefCell<HashMap<String, V>>,
}

impl<V: Clone> ReprMemo<V> {
    pub fn new() -> Self {
        Self {
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn get_or_insert_with<A, F>(&self, args: &A, compute: F) -> V
    where
        A: fmt::Debug + ?Sized,
        F: FnOnce() -> V,
    {
        let key = format!("{args:?}");
        if let Some(value) = self.cache.borrow().get(&key) {
            return value.clone();
        }

        let value = compute();
        self.cache
            .borrow_mut()
            .entry(key)
            .or_insert(value)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.cache.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.borrow().is_empty()
    }
}

impl<V: Clone> Default for ReprMemo<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for ReprMemo<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReprMemo")
            .field("entries", &self.cache.borrow().len())
            .finish()
    }
}

type RegexResult = Result<Regex, regex::Error>;
type CompileFn = fn(&String) -> RegexResult;

fn compile_regex(source: &str) -> RegexResult {
    let compiled = Regex::new(source);
    match &compiled {
        Ok(_) => tracing::debug!(regex = %source, "compiled pattern"),
        Err(err) => tracing::debug!(regex = %source, error = %err, "pattern failed to compile"),
    }
    compiled
}

thread_local! {
    static REGEX_CACHE: Memo<String, RegexResult, CompileFn> =
        Memo::new((|source: &String| compile_regex(source)) as CompileFn);
}

/// Get a compiled regex from cache, or compile and cache it.
///
/// Failed compilations are cached too, so a broken pattern is reported once.
pub fn get_or_compile_regex(source: &str) -> RegexResult {
    REGEX_CACHE.with(|cache| cache.call(&source.to_string()))
}

/// Clear the regex cache (mainly for testing).
pub fn clear_cache() {
    REGEX_CACHE.with(|cache| cache.clear());
}

/// Number of cached regex compilations.
pub fn cache_size() -> usize {
    REGEX_CACHE.with(|cache| cache.len())
}
