//! Reasoner error types.

use pythinfer_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReasonerError {
    /// The configured backend selector names a backend this build does not
    /// provide. Only `rl-inprocess` is first-class.
    #[error("unsupported inference backend '{name}'; only 'rl-inprocess' is available")]
    UnsupportedBackend { name: String },

    /// The backend violated its view contract; indicates an internal bug.
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, ReasonerError>;
