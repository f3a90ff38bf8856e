#![forbid(unsafe_code)]

//! Dirty-state tracking for mutable records.
//!
//! Given a record and a set of watched fields fixed at construction,
//! [`StateContainer`] exposes a continuously updated boolean stream that is
//! `true` whenever any watched field differs from the value it held at the
//! last clean checkpoint (construction, or an explicit
//! [`undo_changes`](StateContainer::undo_changes)).
//!
//! Watched fields are wrapped in [`Watched<V>`], which notifies the
//! container synchronously on every write. Comparison happens on a
//! plain-data projection of each field (a serde round-trip), so anything
//! the record cannot represent as plain data surfaces as an explicit
//! checkpoint or projection error rather than a silent wrong answer.
//!
//! Single-threaded by design: the whole pipeline — field write, dirtiness
//! recompute, subscriber notification — runs synchronously inside the call
//! stack of the triggering write.
//!
//! # Example
//!
//! ```
//! use serde::Serialize;
//! use statewatch::{StateContainer, Trackable, Watched, WatchPoint};
//!
//! #[derive(Serialize)]
//! struct Draft {
//!     title: Watched<String>,
//!     votes: Watched<u32>,
//!     reviewer_note: String,
//! }
//!
//! impl Trackable for Draft {
//!     fn watch_points(&mut self) -> Vec<(&'static str, &mut dyn WatchPoint)> {
//!         vec![
//!             ("title", &mut self.title as &mut dyn WatchPoint),
//!             ("votes", &mut self.votes as &mut dyn WatchPoint),
//!         ]
//!     }
//! }
//!
//! let draft = Draft {
//!     title: Watched::new("untitled".to_owned()),
//!     votes: Watched::new(0),
//!     reviewer_note: String::new(),
//! };
//! let mut container = StateContainer::new(draft, &["title", "votes"])?;
//! assert!(!container.is_dirty()?);
//!
//! let _sub = container.dirty_state().subscribe(|dirty| {
//!     println!("dirty: {dirty}");
//! });
//!
//! container.record_mut().title.set("final".to_owned());
//! assert!(container.is_dirty()?);
//!
//! container.undo_changes()?; // accept the current state as clean
//! assert!(!container.is_dirty()?);
//! # Ok::<(), statewatch::StateError>(())
//! ```

pub mod container;
mod dirty;
pub mod error;
pub mod field;
pub mod record;
pub mod signal;
mod snapshot;

pub use container::StateContainer;
pub use error::{Result, StateError};
pub use field::{Tap, WatchPoint, Watched};
pub use record::Trackable;
pub use signal::{Signal, Subscription};
