#![forbid(unsafe_code)]

//! The record seam: how a caller-defined struct exposes its fields to the
//! tracker.

use serde::Serialize;

use crate::field::WatchPoint;

/// A record whose fields can be tracked for dirtiness.
///
/// `Serialize` supplies the plain-data projection used for baseline
/// snapshots and per-field comparison; the record must serialize to a field
/// map (a struct with named fields does). Members that cannot be
/// represented as plain data (non-finite floats degrade to null, maps with
/// non-string keys fail outright) will not round-trip; the tracker surfaces
/// that as a checkpoint or projection error rather than guessing.
///
/// # Example
///
/// ```
/// use serde::Serialize;
/// use statewatch::{Trackable, Watched, WatchPoint};
///
/// #[derive(Serialize)]
/// struct Draft {
///     title: Watched<String>,
///     votes: Watched<u32>,
///     reviewer_note: String, // plain field: never interceptable
/// }
///
/// impl Trackable for Draft {
///     fn watch_points(&mut self) -> Vec<(&'static str, &mut dyn WatchPoint)> {
///         vec![
///             ("title", &mut self.title as &mut dyn WatchPoint),
///             ("votes", &mut self.votes as &mut dyn WatchPoint),
///         ]
///     }
/// }
/// ```
pub trait Trackable: Serialize {
    /// Name-addressable handles to every interceptable field.
    ///
    /// The names must match the field names the record serializes under;
    /// the container fails fast with
    /// [`StateError::UnknownField`](crate::StateError::UnknownField) when a
    /// watched name is missing from this list.
    fn watch_points(&mut self) -> Vec<(&'static str, &mut dyn WatchPoint)>;
}
