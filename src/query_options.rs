/// Default options for all queries under this store.
#[derive(Debug, Clone, Copy)]
pub struct DefaultQueryOptions {
    /// Whether queries fetch on their own when first read.
    pub enabled: bool,
}

impl Default for DefaultQueryOptions {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/**
 * Options for a query [`use_query()`](crate::use_query())
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// When false, the query never fetches on its own.
    /// It can still be fetched with [`QueryResult::refetch`](crate::QueryResult::refetch).
    /// Default comes from the provided store, or true.
    pub enabled: bool,
}

impl QueryOptions {
    /// Set enabled.
    pub fn set_enabled(self, enabled: bool) -> Self {
        QueryOptions { enabled }
    }
}

impl From<DefaultQueryOptions> for QueryOptions {
    fn from(defaults: DefaultQueryOptions) -> Self {
        QueryOptions {
            enabled: defaults.enabled,
        }
    }
}

impl Default for QueryOptions {
    fn default() -> Self {
        // Use store wide defaults if they exist.
        leptos::use_context::<crate::QueryStore>()
            .map(|store| store.default_options())
            .unwrap_or_default()
            .into()
    }
}
