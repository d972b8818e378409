use thiserror::Error;

use crate::api::FetchError;
use crate::cache::StoreError;
use crate::location::LocationError;
use crate::parser::ParseError;

/// Why a refresh cycle ended without a list.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Location(#[from] LocationError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("A refresh is already in progress")]
    RefreshInProgress,

    #[error("Refresh cancelled")]
    Cancelled,
}
