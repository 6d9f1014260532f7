use wgt_store::StoreError;

/// Errors from domain providers and their accessors.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// A mutator was called before the domain finished loading.
    #[error("{domain} is not ready yet")]
    NotReady { domain: &'static str },

    /// The provider owning the domain has been unmounted.
    #[error("{domain} provider has been unmounted")]
    Unmounted { domain: &'static str },

    /// No provider for the domain is mounted in the scope.
    #[error("no {domain} provider is mounted in this scope")]
    MissingProvider { domain: &'static str },

    /// The initial load from storage failed.
    #[error("loading {domain} failed: {reason}")]
    LoadFailed { domain: &'static str, reason: String },

    /// Writing a change back to storage failed.
    #[error("persisting {domain} failed: {source}")]
    Persist {
        domain: &'static str,
        #[source]
        source: StoreError,
    },

    /// A background task was cancelled or panicked.
    #[error("{domain} background task aborted: {reason}")]
    TaskAborted { domain: &'static str, reason: String },

    /// Providers need a Tokio runtime to load and persist.
    #[error("no Tokio runtime is running")]
    NoRuntime,

    /// The exchange-rate or wallpaper source failed.
    #[error("data source error: {0}")]
    Source(String),

    /// Storage error outside of a provider write.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Result alias for state operations.
pub type StateResult<T> = Result<T, StateError>;
