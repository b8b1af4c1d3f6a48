#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! # About Tiny Query
//!
//! Tiny Query is a small asynchronous query cache with a binding for [Leptos](https://github.com/leptos-rs/leptos).
//!
//! Modeled on [Tanstack Query](https://tanstack.com/query/latest/), minus everything but the core.
//!
//! A Query provides:
//! - caching, one entry per key
//! - de-duplication of concurrent fetches for the same key
//! - subscriptions to state changes
//!
//! There is no retry, invalidation, expiry or garbage collection: entries live as
//! long as their [`QueryStore`].
//!
//! ## The main entry points are:
//! - [`QueryStore`] - Creates and holds [`QueryRecord`]s, one per [`QueryKey`].
//! - [`use_query`][crate::use_query::use_query()] - Reads a query inside a Leptos component.
//! - [`QueryBinding`] - The same binding for hosts other than Leptos.
//!
//! # Feature Flags
//! - `csr` Client-side rendering.
//! - `ssr` Server-side rendering.
//! - `hydrate` Hydration.
//!
//! # A Simple Example
//!
//! In the root of your App, provide a query store with [provide_query_store]:
//!
//! ```rust
//! use tiny_query::*;
//! use leptos::*;
//!
//! #[component]
//! pub fn App() -> impl IntoView {
//!     // Provides Query Store for entire app.
//!     provide_query_store();
//!
//!     // Rest of App...
//! }
//! ```
//!
//! Then read a query anywhere below it:
//!
//! ```rust
//! use leptos::*;
//! use tiny_query::*;
//!
//! #[derive(Debug, Clone)]
//! struct Track {
//!     name: String,
//! }
//!
//! async fn get_track(id: i32) -> Result<Track, String> {
//!     todo!()
//! }
//!
//! #[component]
//! fn TrackView(id: i32) -> impl IntoView {
//!     let QueryResult { data, .. } =
//!         use_query(query_key!["track", id], move || get_track(id), QueryOptions::default())
//!             .expect("track query");
//!
//!     view! {
//!        <div>
//!            {move || data.get().map(|track| view! { <h2>{track.name}</h2> })}
//!        </div>
//!     }
//! }
//! ```
//!
//! Outside of a view, queries can be used directly. Fetches run on
//! [`leptos::spawn_local`] unless the store is given another spawner:
//!
//! ```rust
//! use futures::executor::block_on;
//! use tiny_query::*;
//!
//! let store = QueryStore::new().set_spawner(|fetch| block_on(fetch));
//! let query = store
//!     .get_or_create(query_key!["item", 1], || async { Ok::<_, String>(1) })
//!     .unwrap();
//!
//! let calls = std::rc::Rc::new(std::cell::Cell::new(0));
//! let _unsubscribe = query.subscribe({
//!     let calls = calls.clone();
//!     move || calls.set(calls.get() + 1)
//! });
//!
//! assert_eq!(Ok(1), block_on(query.fetch()));
//! assert_eq!(QueryStatus::Success, query.get_snapshot().status());
//! // Loading, then success.
//! assert_eq!(2, calls.get());
//! ```

mod error;
mod query;
mod query_binding;
mod query_key;
mod query_options;
mod query_result;
mod query_state;
mod query_store;
mod subscription;
mod use_query;

pub use error::*;
pub use query::*;
pub use query_binding::*;
pub use query_key::*;
pub use query_options::*;
pub use query_result::*;
pub use query_state::*;
pub use query_store::*;
pub use subscription::Unsubscribe;
pub use use_query::*;

/// Convenience trait for query value and error requirements.
pub trait QueryValue: std::fmt::Debug + Clone + 'static {}
impl<V> QueryValue for V where V: std::fmt::Debug + Clone + 'static {}
