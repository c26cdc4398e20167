//! Errors surfaced by the desk controller.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The backing store rejected a read or write.
    #[error("persistence error: {0:#}")]
    Persistence(#[from] anyhow::Error),

    /// Intake data failed validation.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An update by segment id matched no stored row.
    #[error("segment not found: {0}")]
    SegmentNotFound(String),

    /// A mutation for this segment id is still in flight.
    #[error("a change to segment {0} is already in progress")]
    MutationPending(String),

    /// Settings could not be read or written.
    #[error("configuration error: {0}")]
    Config(String),
}
