use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    State(#[from] wgt_state::StateError),

    #[error("store error: {0}")]
    Store(#[from] wgt_store::StoreError),
}

pub type DashboardResult<T> = Result<T, DashboardError>;
