/// Errors raised while looking a query up in a [`QueryStore`](crate::QueryStore).
///
/// Failures of the fetcher itself are not represented here: they are stored in the
/// query's [`QueryState`](crate::QueryState) and returned from the fetch future.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// The key is already registered with different value or error types.
    #[error("query {key} is registered with a different type, expected {expected}")]
    TypeMismatch {
        /// Canonical form of the key.
        key: String,
        /// The record type that was asked for.
        expected: &'static str,
    },
    /// The key could not be serialized to its canonical form.
    #[error("invalid query key: {0}")]
    Key(#[from] serde_json::Error),
}
