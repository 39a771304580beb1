use thiserror::Error;

/// Reasons a raw event record cannot become a [`crate::ScoredEvent`].
///
/// Callers skip the record and keep a diagnostic count; a malformed
/// record never aborts the stream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("record has no device_id")]
    MissingDeviceId,

    #[error("record has no timestamp")]
    MissingTimestamp,

    #[error("unparseable timestamp: '{0}'")]
    InvalidTimestamp(String),

    #[error("{0}")]
    InvalidState(String),
}
