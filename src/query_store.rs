use std::{
    any::Any,
    cell::RefCell,
    collections::{hash_map::Entry, HashMap},
    future::Future,
    rc::Rc,
};

use futures::future::LocalBoxFuture;
use leptos::*;

use crate::query::Spawner;
use crate::{DefaultQueryOptions, QueryError, QueryKey, QueryRecord, QueryState, QueryValue};

/// Provides a Query Store to the current scope.
pub fn provide_query_store() {
    provide_query_store_with_options(DefaultQueryOptions::default());
}

/// Provides a Query Store to the current scope with custom options.
pub fn provide_query_store_with_options(options: DefaultQueryOptions) {
    provide_context(QueryStore::with_options(options));
}

/// Retrieves a Query Store from the current scope.
pub fn use_query_store() -> QueryStore {
    use_context::<QueryStore>().expect("Query Store Missing.")
}

/// Holds every query, keyed by the canonical form of its [`QueryKey`].
///
/// Queries are created on first lookup and live as long as the store. Clones of a
/// store share the same queries.
///
/// Fetches are run with [`leptos::spawn_local`] unless another spawner is set with
/// [`set_spawner`](Self::set_spawner).
///
/// ```
/// use futures::executor::block_on;
/// use tiny_query::*;
///
/// // Run fetches to completion as soon as they start.
/// let store = QueryStore::new().set_spawner(|fetch| block_on(fetch));
/// let todo = store
///     .get_or_create(query_key!["todo", 1], || async { Ok::<_, String>("write docs") })
///     .unwrap();
///
/// let same = store
///     .get_or_create(query_key!["todo", 1], || async { Ok::<_, String>("ignored") })
///     .unwrap();
///
/// assert!(todo.ptr_eq(&same));
/// ```
#[derive(Clone)]
pub struct QueryStore {
    cache: Rc<RefCell<HashMap<String, Box<dyn Any>>>>,
    default_options: DefaultQueryOptions,
    spawner: Spawner,
}

impl Default for QueryStore {
    fn default() -> Self {
        Self::with_options(DefaultQueryOptions::default())
    }
}

impl QueryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store with custom default options.
    pub fn with_options(default_options: DefaultQueryOptions) -> Self {
        Self {
            cache: Rc::default(),
            default_options,
            spawner: Rc::new(|fetch: LocalBoxFuture<'static, ()>| spawn_local(fetch)),
        }
    }

    /// Replaces the function that runs fetches in the background.
    ///
    /// Only queries created afterwards use the new spawner.
    pub fn set_spawner(mut self, spawner: impl Fn(LocalBoxFuture<'static, ()>) + 'static) -> Self {
        self.spawner = Rc::new(spawner);
        self
    }

    /// Options that hooks fall back to when none are given.
    pub fn default_options(&self) -> DefaultQueryOptions {
        self.default_options
    }

    /// Returns the query for `key`, creating it with `fetcher` if it does not exist.
    ///
    /// The fetcher given when the query is created stays bound to it. Fetchers passed
    /// on later calls for the same key are dropped without being called.
    ///
    /// Fails with [`QueryError::TypeMismatch`] if the key already holds a query with
    /// different value or error types.
    pub fn get_or_create<V, E, F, Fu>(
        &self,
        key: QueryKey,
        fetcher: F,
    ) -> Result<QueryRecord<V, E>, QueryError>
    where
        V: QueryValue,
        E: QueryValue,
        F: Fn() -> Fu + 'static,
        Fu: Future<Output = Result<V, E>> + 'static,
    {
        let canonical = key.canonical()?;
        let mut cache = RefCell::try_borrow_mut(&self.cache).expect("get_or_create borrow_mut");

        match cache.entry(canonical) {
            Entry::Occupied(entry) => downcast(entry.key(), entry.get().as_ref()),
            Entry::Vacant(entry) => {
                let query = QueryRecord::new(key, fetcher, self.spawner.clone());
                entry.insert(Box::new(query.clone()));
                Ok(query)
            }
        }
    }

    /// Returns the query for `key` if it exists.
    pub fn get_query<V, E>(&self, key: &QueryKey) -> Result<Option<QueryRecord<V, E>>, QueryError>
    where
        V: QueryValue,
        E: QueryValue,
    {
        let canonical = key.canonical()?;
        let cache = RefCell::try_borrow(&self.cache).expect("get_query borrow");
        cache
            .get(&canonical)
            .map(|query| downcast(&canonical, query.as_ref()))
            .transpose()
    }

    /// Retrieve the current state for an existing query without subscribing to it.
    /// If the query does not exist, or holds other types, [`None`](Option::None) is returned.
    pub fn peek_query_state<V, E>(&self, key: &QueryKey) -> Option<Rc<QueryState<V, E>>>
    where
        V: QueryValue,
        E: QueryValue,
    {
        self.get_query::<V, E>(key)
            .ok()
            .flatten()
            .map(|query| query.get_snapshot())
    }

    /// Returns true if a query exists for `key`.
    pub fn contains(&self, key: &QueryKey) -> bool {
        match key.canonical() {
            Ok(canonical) => RefCell::try_borrow(&self.cache)
                .expect("contains borrow")
                .contains_key(&canonical),
            Err(_) => false,
        }
    }

    /// The number of queries in the store.
    pub fn len(&self) -> usize {
        RefCell::try_borrow(&self.cache).expect("len borrow").len()
    }

    /// Returns true if no query has been created yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for QueryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryStore")
            .field("size", &self.len())
            .field("default_options", &self.default_options)
            .finish()
    }
}

fn downcast<V, E>(key: &str, query: &dyn Any) -> Result<QueryRecord<V, E>, QueryError>
where
    V: QueryValue,
    E: QueryValue,
{
    match query.downcast_ref::<QueryRecord<V, E>>() {
        Some(query) => Ok(query.clone()),
        None => {
            let expected = std::any::type_name::<QueryRecord<V, E>>();
            logging::debug_warn!("Query {key} looked up as {expected}, which is not its type.");
            Err(QueryError::TypeMismatch {
                key: key.to_string(),
                expected,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query_key;
    use futures::executor::block_on;
    use std::cell::Cell;

    async fn fetch_number() -> Result<u32, String> {
        Ok(1)
    }

    fn store() -> QueryStore {
        QueryStore::new().set_spawner(|fetch| block_on(fetch))
    }

    #[test]
    fn same_key_returns_same_query() {
        let store = store();
        let first = store.get_or_create(query_key!["item", 1], fetch_number).unwrap();
        let second = store.get_or_create(query_key!["item", 1], fetch_number).unwrap();

        assert!(first.ptr_eq(&second));
        assert_eq!(1, store.len());
    }

    #[test]
    fn distinct_keys_return_distinct_queries() {
        let store = store();
        let keys = [
            query_key!["item", 1],
            query_key!["item", 2],
            query_key![1, "item"],
            query_key!["item", "1"],
            query_key!["item"],
        ];
        let queries: Vec<QueryRecord<u32, String>> = keys
            .iter()
            .map(|key| store.get_or_create(key.clone(), fetch_number).unwrap())
            .collect();

        for (i, a) in queries.iter().enumerate() {
            for b in queries.iter().skip(i + 1) {
                assert!(!a.ptr_eq(b));
            }
        }
        assert_eq!(keys.len(), store.len());
    }

    #[test]
    fn first_fetcher_wins() {
        let store = store();
        let second_called = Rc::new(Cell::new(false));

        let query = store
            .get_or_create(query_key!["answer"], || async { Ok::<u32, String>(42) })
            .unwrap();
        let again = store
            .get_or_create(query_key!["answer"], {
                let second_called = second_called.clone();
                move || {
                    second_called.set(true);
                    async { Ok::<u32, String>(0) }
                }
            })
            .unwrap();

        assert!(query.ptr_eq(&again));
        assert_eq!(Ok(42), block_on(again.fetch()));
        assert!(!second_called.get());
    }

    #[test]
    fn type_mismatch_is_an_error() {
        let store = store();
        store.get_or_create(query_key!["item", 1], fetch_number).unwrap();

        let result = store.get_or_create(query_key!["item", 1], || async {
            Ok::<String, String>("one".to_string())
        });
        assert!(matches!(result, Err(QueryError::TypeMismatch { ref key, .. }) if key == r#"["item",1]"#));
        assert_eq!(1, store.len());
    }

    #[test]
    fn peek_does_not_create() {
        let store = store();
        let key = query_key!["item", 1];

        assert!(store.peek_query_state::<u32, String>(&key).is_none());
        assert!(!store.contains(&key));
        assert!(store.is_empty());

        let query = store.get_or_create(key.clone(), fetch_number).unwrap();
        block_on(query.fetch()).unwrap();

        let state = store.peek_query_state::<u32, String>(&key).unwrap();
        assert_eq!(Some(&1), state.data());
        assert!(store.peek_query_state::<String, String>(&key).is_none());
        assert!(store.contains(&key));
    }

    #[test]
    fn clones_share_queries() {
        let store = store();
        let other = store.clone();
        let query = store.get_or_create(query_key!["item"], fetch_number).unwrap();
        let found = other
            .get_query::<u32, String>(&query_key!["item"])
            .unwrap()
            .unwrap();
        assert!(query.ptr_eq(&found));
    }

    #[test]
    fn separate_stores_do_not_share() {
        let a = store();
        let b = store();
        a.get_or_create(query_key!["item"], fetch_number).unwrap();
        assert!(b.is_empty());
    }

    #[test]
    fn fetches_go_through_the_spawner() {
        let spawned = Rc::new(Cell::new(0));
        let store = QueryStore::new().set_spawner({
            let spawned = spawned.clone();
            move |fetch| {
                spawned.set(spawned.get() + 1);
                block_on(fetch)
            }
        });
        let query = store.get_or_create(query_key!["item"], fetch_number).unwrap();

        drop(query.fetch());
        assert_eq!(1, spawned.get());
        assert_eq!(Some(&1), query.get_snapshot().data());
        assert!(!query.is_fetching());
    }
}
