use std::{future::Future, rc::Rc};

use crate::{
    QueryError, QueryKey, QueryOptions, QueryRecord, QueryState, QueryStore, QueryValue,
    Unsubscribe,
};

/// Connects one query to a view that re-renders on change.
///
/// Activating a binding looks the query up, subscribes `on_change` to it, and keeps
/// the subscription until [`deactivate`](Self::deactivate) is called or the binding
/// is dropped. The binding never owns the query; the store does.
///
/// [`use_query`](crate::use_query()) is this binding wired into Leptos. Other hosts
/// drive it directly:
///
/// ```
/// use futures::executor::LocalPool;
/// use futures::task::LocalSpawnExt;
/// use tiny_query::*;
///
/// let mut pool = LocalPool::new();
/// let spawner = pool.spawner();
/// let store = QueryStore::new().set_spawner(move |fetch| spawner.spawn_local(fetch).unwrap());
///
/// let binding = QueryBinding::activate(
///     &store,
///     query_key!["greeting"],
///     || async { Ok::<_, String>("hello") },
///     QueryOptions { enabled: true },
///     |state| println!("re-render: {:?}", state.status()),
/// )
/// .unwrap();
///
/// binding.ensure_fetch();
/// pool.run_until_stalled();
///
/// assert_eq!(Some(&"hello"), binding.snapshot().data());
/// ```
pub struct QueryBinding<V, E> {
    query: QueryRecord<V, E>,
    options: QueryOptions,
    unsubscribe: Unsubscribe,
}

impl<V, E> QueryBinding<V, E>
where
    V: QueryValue,
    E: QueryValue,
{
    /// Resolves the query for `key` in `store` and subscribes `on_change` to it.
    /// `on_change` receives the new snapshot after every state change.
    pub fn activate<F, Fu>(
        store: &QueryStore,
        key: QueryKey,
        fetcher: F,
        options: QueryOptions,
        on_change: impl Fn(Rc<QueryState<V, E>>) + 'static,
    ) -> Result<Self, QueryError>
    where
        F: Fn() -> Fu + 'static,
        Fu: Future<Output = Result<V, E>> + 'static,
    {
        let query = store.get_or_create(key, fetcher)?;
        let unsubscribe = query.subscribe({
            let query = query.downgrade();
            move || {
                if let Some(query) = query.upgrade() {
                    on_change(query.get_snapshot());
                }
            }
        });
        Ok(Self {
            query,
            options,
            unsubscribe,
        })
    }

    /// The query's current state.
    pub fn snapshot(&self) -> Rc<QueryState<V, E>> {
        self.query.get_snapshot()
    }

    /// The bound query.
    pub fn query(&self) -> &QueryRecord<V, E> {
        &self.query
    }

    /// Returns true if the binding should start a fetch: the query is enabled, has
    /// nothing to show yet, and nobody is fetching it.
    pub fn needs_fetch(&self) -> bool {
        self.options.enabled
            && self.is_active()
            && self.snapshot().is_pending()
            && !self.query.is_fetching()
    }

    /// Starts a fetch if [`needs_fetch`](Self::needs_fetch) holds. Returns true if
    /// a fetch was started.
    ///
    /// Run this after every state read. Concurrent bindings racing on the same
    /// query still share one fetch because [`QueryRecord::fetch`] joins.
    pub fn ensure_fetch(&self) -> bool {
        if !self.needs_fetch() {
            return false;
        }
        self.refetch();
        true
    }

    /// Fetches regardless of state or options, joining a fetch that is already running.
    pub fn refetch(&self) {
        // The store's spawner drives the fetch; failures land in the query state.
        drop(self.query.fetch());
    }

    /// Returns true until the binding is deactivated.
    pub fn is_active(&self) -> bool {
        self.unsubscribe.is_subscribed()
    }

    /// Stops receiving updates. Later calls do nothing.
    /// A fetch that is already running is not affected.
    pub fn deactivate(&self) {
        self.unsubscribe.unsubscribe();
    }
}

impl<V, E> Drop for QueryBinding<V, E> {
    fn drop(&mut self) {
        self.unsubscribe.unsubscribe();
    }
}
