#![forbid(unsafe_code)]

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StateError>;

/// Errors surfaced by the tracker.
///
/// Every variant is a programming or configuration defect, never a transient
/// condition; nothing here is worth retrying. Variants carry stringified
/// details rather than source errors so a single recorded fault can be
/// cloned into every rejected dirtiness query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// A watched field name has no watch point on the supplied record.
    #[error("watched field `{field}` does not exist on the record")]
    UnknownField { field: String },

    /// The record type does not serialize to a plain field map.
    #[error("record does not serialize to a plain field map")]
    NotARecord,

    /// The record could not be captured as a plain-data snapshot.
    #[error("baseline checkpoint failed: {detail}")]
    Checkpoint { detail: String },

    /// A watched field's new value could not be projected to plain data.
    #[error("projection of watched field `{field}` failed: {detail}")]
    Projection { field: String, detail: String },

    /// No baseline checkpoint has been taken yet.
    #[error("no baseline checkpoint has been taken")]
    NoBaseline,
}
