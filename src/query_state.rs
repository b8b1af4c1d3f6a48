/// Where a query is in its fetch lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryStatus {
    /// No result yet, or a new fetch has been started.
    Loading,
    /// The last fetch resolved successfully.
    Success,
    /// The last fetch failed.
    Error,
}

impl QueryStatus {
    /// Lowercase name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryStatus::Loading => "loading",
            QueryStatus::Success => "success",
            QueryStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for QueryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A snapshot of a query.
///
/// States are only produced by the query lifecycle, which guarantees that a
/// [`Success`](QueryStatus::Success) state carries data and an
/// [`Error`](QueryStatus::Error) state carries an error.
///
/// A new fetch re-enters [`Loading`](QueryStatus::Loading) without clearing the
/// data or error of the previous cycle.
#[derive(Clone, PartialEq, Eq)]
pub struct QueryState<V, E> {
    data: Option<V>,
    status: QueryStatus,
    error: Option<E>,
}

impl<V, E> Default for QueryState<V, E> {
    fn default() -> Self {
        Self {
            data: None,
            status: QueryStatus::Loading,
            error: None,
        }
    }
}

impl<V, E> QueryState<V, E> {
    /// The initial state of every query.
    pub fn new() -> Self {
        Self::default()
    }

    /// The last successfully fetched value, if any.
    pub fn data(&self) -> Option<&V> {
        self.data.as_ref()
    }

    /// The current status.
    pub fn status(&self) -> QueryStatus {
        self.status
    }

    /// The error of the last failed fetch, if any.
    pub fn error(&self) -> Option<&E> {
        self.error.as_ref()
    }

    /// Returns true if the status is [`Loading`](QueryStatus::Loading).
    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading
    }

    /// Returns true if the status is [`Success`](QueryStatus::Success).
    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }

    /// Returns true if the status is [`Error`](QueryStatus::Error).
    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }

    /// Loading with no data to show.
    /// This is the condition under which a binding starts a fetch on its own.
    pub fn is_pending(&self) -> bool {
        self.is_loading() && self.data.is_none()
    }
}

impl<V: Clone, E: Clone> QueryState<V, E> {
    // Overwrites status only.
    pub(crate) fn loading(&self) -> Self {
        Self {
            data: self.data.clone(),
            status: QueryStatus::Loading,
            error: self.error.clone(),
        }
    }

    pub(crate) fn succeeded(data: V) -> Self {
        Self {
            data: Some(data),
            status: QueryStatus::Success,
            error: None,
        }
    }

    // Previous data is kept.
    pub(crate) fn failed(&self, error: E) -> Self {
        Self {
            data: self.data.clone(),
            status: QueryStatus::Error,
            error: Some(error),
        }
    }
}

impl<V, E> std::fmt::Debug for QueryState<V, E>
where
    V: std::fmt::Debug,
    E: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryState")
            .field("data", &self.data)
            .field("status", &self.status)
            .field("error", &self.error)
            .finish()
    }
}
