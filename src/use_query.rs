use crate::query_binding::QueryBinding;
use crate::query_result::QueryResult;
use crate::{
    use_query_store, QueryError, QueryKey, QueryOptions, QueryState, QueryValue, RefetchFn,
};
use leptos::*;
use std::future::Future;
use std::rc::Rc;

/// Reads a query from the [`QueryStore`](crate::QueryStore) provided in context.
///
/// On first read the query is fetched unless it already has data, is already being
/// fetched, or `options.enabled` is false. The returned signals update whenever
/// the query changes. The subscription ends when the calling scope is cleaned up;
/// a fetch that is still running completes and stays in the store.
///
/// The fetcher is only used if this call creates the query. Every later
/// `use_query` for the same key shares the first fetcher.
///
/// Example
/// ```
/// use leptos::*;
/// use tiny_query::*;
///
/// #[derive(Debug, Clone)]
/// struct Todo {
///     id: u32,
///     todo: String,
///     completed: bool,
/// }
///
/// async fn get_todo(id: u32) -> Result<Todo, String> {
///     todo!()
/// }
///
/// #[component]
/// fn TodoView(id: u32) -> impl IntoView {
///     let query = use_query(query_key!["todo", id], move || get_todo(id), QueryOptions::default())
///         .expect("todo query");
///
///     move || match query.state.get().status() {
///         QueryStatus::Loading => "loading".into_view(),
///         QueryStatus::Error => format!("error, {:?}", query.error.get()).into_view(),
///         QueryStatus::Success => format!("{:?}", query.data.get()).into_view(),
///     }
/// }
/// ```
pub fn use_query<V, E, F, Fu>(
    key: QueryKey,
    fetcher: F,
    options: QueryOptions,
) -> Result<QueryResult<V, E, impl RefetchFn>, QueryError>
where
    V: QueryValue,
    E: QueryValue,
    F: Fn() -> Fu + 'static,
    Fu: Future<Output = Result<V, E>> + 'static,
{
    let store = use_query_store();
    let state = RwSignal::new(Rc::new(QueryState::new()));

    let binding = QueryBinding::activate(&store, key, fetcher, options, move |snapshot| {
        // Owner may already be gone when a detached fetch settles.
        if state.try_set(snapshot).is_some() {
            logging::debug_warn!("Query state changed after its view was disposed.");
        }
    })?;
    state.set_untracked(binding.snapshot());
    let binding = Rc::new(binding);

    // Fetch on first read.
    create_isomorphic_effect({
        let binding = binding.clone();
        move |_| {
            if state.with(|state| state.is_pending()) {
                binding.ensure_fetch();
            }
        }
    });

    on_cleanup({
        let binding = binding.clone();
        move || binding.deactivate()
    });

    let state: Signal<Rc<QueryState<V, E>>> = state.into();

    Ok(QueryResult {
        state,
        data: Signal::derive(move || state.with(|state| state.data().cloned())),
        error: Signal::derive(move || state.with(|state| state.error().cloned())),
        status: Signal::derive(move || state.with(|state| state.status())),
        refetch: move || binding.refetch(),
    })
}
