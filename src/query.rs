use std::{
    cell::RefCell,
    future::Future,
    rc::{Rc, Weak},
};

use futures::future::{FutureExt, LocalBoxFuture, Shared};

use crate::{
    subscription::{Subscribers, Unsubscribe},
    QueryKey, QueryState, QueryValue,
};

/// The future returned by [`QueryRecord::fetch`].
///
/// Every caller that joins an in-flight fetch receives a clone of the same future.
/// The fetch is driven by the store's spawner, so awaiting it is optional.
pub type FetchFuture<V, E> = Shared<LocalBoxFuture<'static, Result<V, E>>>;

pub(crate) type Fetcher<V, E> = Rc<dyn Fn() -> LocalBoxFuture<'static, Result<V, E>>>;

/// Runs a fetch to completion in the background.
pub(crate) type Spawner = Rc<dyn Fn(LocalBoxFuture<'static, ()>)>;

/// The cached state and fetch lifecycle for a single [`QueryKey`].
///
/// A `QueryRecord` is a cheap handle: clones refer to the same query.
#[derive(Clone)]
pub struct QueryRecord<V, E> {
    inner: Rc<Inner<V, E>>,
}

struct Inner<V, E> {
    key: QueryKey,
    fetcher: Fetcher<V, E>,
    spawner: Spawner,
    state: RefCell<Rc<QueryState<V, E>>>,
    in_flight: RefCell<Option<FetchFuture<V, E>>>,
    subscribers: Subscribers,
}

impl<V, E> QueryRecord<V, E>
where
    V: QueryValue,
    E: QueryValue,
{
    pub(crate) fn new<F, Fu>(key: QueryKey, fetcher: F, spawner: Spawner) -> Self
    where
        F: Fn() -> Fu + 'static,
        Fu: Future<Output = Result<V, E>> + 'static,
    {
        let fetcher: Fetcher<V, E> = Rc::new(move || fetcher().boxed_local());
        QueryRecord {
            inner: Rc::new(Inner {
                key,
                fetcher,
                spawner,
                state: RefCell::new(Rc::new(QueryState::new())),
                in_flight: RefCell::new(None),
                subscribers: Subscribers::default(),
            }),
        }
    }

    /// The key this query was created for.
    pub fn key(&self) -> &QueryKey {
        &self.inner.key
    }

    /// Registers a callback that runs after every state change.
    ///
    /// Callbacks take no arguments; read the new state with [`get_snapshot`](Self::get_snapshot).
    pub fn subscribe(&self, callback: impl Fn() + 'static) -> Unsubscribe {
        self.inner.subscribers.subscribe(callback)
    }

    /// The number of active subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }

    /// The current state.
    ///
    /// The same `Rc` is returned until the state changes, so [`Rc::ptr_eq`] can be
    /// used to detect updates.
    pub fn get_snapshot(&self) -> Rc<QueryState<V, E>> {
        self.inner.state.borrow().clone()
    }

    /// Returns true while a fetch started by [`fetch`](Self::fetch) has not settled.
    pub fn is_fetching(&self) -> bool {
        self.inner.in_flight.borrow().is_some()
    }

    /// Fetches the query.
    ///
    /// If a fetch is already running, the running fetch is returned and the fetcher
    /// is not called again. Otherwise the state moves to loading, subscribers are
    /// notified, and the fetch is handed to the store's spawner, which invokes the
    /// fetcher. The fetch runs to completion whether or not the returned future is
    /// awaited or dropped.
    ///
    /// Once the fetcher settles the state is updated, subscribers are notified,
    /// and only then does the returned future resolve. A failure is stored in the
    /// state and also returned to the caller.
    pub fn fetch(&self) -> FetchFuture<V, E> {
        if let Some(in_flight) = self.inner.in_flight.borrow().as_ref() {
            return in_flight.clone();
        }

        let fetcher = self.inner.fetcher.clone();
        let query = self.downgrade();
        let future = async move {
            let result = fetcher().await;
            match query.upgrade() {
                Some(query) => query.settle(&result),
                None => leptos::logging::debug_warn!(
                    "Query was dropped before its fetch settled; result discarded."
                ),
            }
            result
        }
        .boxed_local()
        .shared();

        // Registered before notifying so that subscribers reacting to the loading
        // state join this fetch instead of starting another one.
        *self.inner.in_flight.borrow_mut() = Some(future.clone());
        self.set_state(|state| state.loading());
        (self.inner.spawner)(future.clone().map(|_| ()).boxed_local());
        future
    }

    fn settle(&self, result: &Result<V, E>) {
        match result {
            Ok(data) => self.set_state(|_| QueryState::succeeded(data.clone())),
            Err(error) => self.set_state(|state| state.failed(error.clone())),
        }
        self.inner.in_flight.borrow_mut().take();
    }

    // Subscribers are notified after the borrow is released so they can read the snapshot.
    fn set_state(&self, update: impl FnOnce(&QueryState<V, E>) -> QueryState<V, E>) {
        {
            let mut state = self.inner.state.borrow_mut();
            let next = update(&state);
            *state = Rc::new(next);
        }
        self.inner.subscribers.notify();
    }

    /// Returns true if both handles refer to the same query.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// A handle that does not keep the query alive.
    pub fn downgrade(&self) -> WeakQueryRecord<V, E> {
        WeakQueryRecord {
            inner: Rc::downgrade(&self.inner),
        }
    }
}

impl<V, E> std::fmt::Debug for QueryRecord<V, E>
where
    V: std::fmt::Debug,
    E: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryRecord")
            .field("key", &self.inner.key)
            .field("state", &self.inner.state.borrow())
            .field("fetching", &self.inner.in_flight.borrow().is_some())
            .field("subscribers", &self.inner.subscribers.len())
            .finish()
    }
}

/// A non-owning [`QueryRecord`] handle.
#[derive(Clone)]
pub struct WeakQueryRecord<V, E> {
    inner: Weak<Inner<V, E>>,
}

impl<V, E> WeakQueryRecord<V, E> {
    /// Returns the query if it is still alive.
    pub fn upgrade(&self) -> Option<QueryRecord<V, E>> {
        self.inner.upgrade().map(|inner| QueryRecord { inner })
    }
}
