use std::rc::Rc;

use leptos::*;

use crate::{QueryState, QueryStatus};

/// Reactive query result.
#[derive(Clone)]
pub struct QueryResult<V, E, R>
where
    V: 'static,
    E: 'static,
    R: RefetchFn,
{
    /// The current state of the query.
    /// The `Rc` changes identity on every state transition.
    pub state: Signal<Rc<QueryState<V, E>>>,
    /// The last successfully fetched value. None if it has not been fetched yet.
    pub data: Signal<Option<V>>,
    /// The error of the last failed fetch.
    pub error: Signal<Option<E>>,
    /// The current status.
    pub status: Signal<QueryStatus>,

    /// Refetch the query.
    pub refetch: R,
}

/// Convenience Trait alias for a Query Result's refetch function.
pub trait RefetchFn: Fn() + Clone {}
impl<R: Fn() + Clone> RefetchFn for R {}
