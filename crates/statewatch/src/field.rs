#![forbid(unsafe_code)]

//! Watched-field wrappers: the mutation interceptor.
//!
//! # Design
//!
//! [`Watched<V>`] replaces direct field storage with an accessor pair: reads
//! go through [`get()`](Watched::get) (or `Deref`), writes go through
//! [`set()`](Watched::set) / [`update()`](Watched::update). A write stores
//! the value and then synchronously notifies the installed [`Tap`], before
//! the call returns. Fields without an installed tap are ordinary storage.
//!
//! Taps are installed by the container through the [`WatchPoint`] seam and
//! carry the field's name plus a shared change sink. Installation is
//! idempotent: installing over an existing tap replaces it, never stacks.
//!
//! # Invariants
//!
//! 1. Every write through `set`/`update` notifies the tap, including writes
//!    that store a value equal to the current one. Filtering identical
//!    values is the dirtiness evaluator's job, not the interceptor's.
//! 2. Reads never notify.
//! 3. Interception state never crosses instance boundaries: cloning or
//!    deserializing a `Watched` yields a wrapper with no tap installed.
//! 4. Serialization is transparent: `Watched<V>` serializes exactly as `V`.

use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use serde_json::Value;

/// Destination for watched-field write notifications.
///
/// Implemented by the container's change hub; sealed to the crate.
pub(crate) trait ChangeSink {
    /// Called synchronously after a watched field stores a new value.
    /// `projection` is the plain-data rendition of that value, or the
    /// serialization error that prevented producing one.
    fn field_written(&self, field: &str, projection: serde_json::Result<Value>);
}

/// A change tap installed on a watched field: the field's name plus the
/// sink that wants to hear about writes to it.
///
/// Taps are created by the container during interception install; they
/// cannot be constructed outside this crate.
pub struct Tap {
    pub(crate) field: Rc<str>,
    pub(crate) sink: Rc<dyn ChangeSink>,
}

impl Clone for Tap {
    fn clone(&self) -> Self {
        Self {
            field: Rc::clone(&self.field),
            sink: Rc::clone(&self.sink),
        }
    }
}

impl fmt::Debug for Tap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tap").field("field", &self.field).finish_non_exhaustive()
    }
}

/// A field that can have a change tap installed on it.
///
/// [`Watched<V>`] implements this; a record type exposes its interceptable
/// fields as `&mut dyn WatchPoint` handles through
/// [`Trackable::watch_points`](crate::Trackable::watch_points). A wrapper
/// type around a `Watched` can implement it by delegating to the inner
/// field.
pub trait WatchPoint {
    /// Install (or replace) the change tap for this field.
    fn install(&mut self, tap: Tap);
}

/// An interceptable field: a value plus an optionally installed change tap.
///
/// Compose `Watched<V>` into a record type for every field that should be
/// eligible for dirtiness tracking. Writes must go through
/// [`set`](Self::set) or [`update`](Self::update) to be observed; there is
/// deliberately no `DerefMut`.
pub struct Watched<V> {
    value: V,
    tap: Option<Tap>,
}

impl<V> Watched<V> {
    pub fn new(value: V) -> Self {
        Self { value, tap: None }
    }

    /// Read the current value. Never notifies.
    #[must_use]
    pub fn get(&self) -> &V {
        &self.value
    }

    /// Unwrap the field, discarding any installed tap.
    pub fn into_inner(self) -> V {
        self.value
    }
}

impl<V: Serialize> Watched<V> {
    /// Store `value`, then synchronously notify the installed tap (if any)
    /// before returning.
    pub fn set(&mut self, value: V) {
        self.value = value;
        self.notify();
    }

    /// Mutate the value in place through `f`, then notify. The in-place
    /// equivalent of an ordinary field write for non-`Copy` values.
    pub fn update(&mut self, f: impl FnOnce(&mut V)) {
        f(&mut self.value);
        self.notify();
    }

    fn notify(&self) {
        if let Some(tap) = &self.tap {
            tap.sink
                .field_written(&tap.field, serde_json::to_value(&self.value));
        }
    }
}

impl<V> WatchPoint for Watched<V> {
    fn install(&mut self, tap: Tap) {
        self.tap = Some(tap);
    }
}

impl<V> Deref for Watched<V> {
    type Target = V;

    fn deref(&self) -> &V {
        &self.value
    }
}

impl<V> From<V> for Watched<V> {
    fn from(value: V) -> Self {
        Self::new(value)
    }
}

impl<V: Default> Default for Watched<V> {
    fn default() -> Self {
        Self::new(V::default())
    }
}

impl<V: Clone> Clone for Watched<V> {
    /// An independent copy is not intercepted; the tap stays behind.
    fn clone(&self) -> Self {
        Self::new(self.value.clone())
    }
}

impl<V: PartialEq> PartialEq for Watched<V> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<V: fmt::Debug> fmt::Debug for Watched<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watched")
            .field("value", &self.value)
            .field("tapped", &self.tap.is_some())
            .finish()
    }
}

impl<V: Serialize> Serialize for Watched<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for Watched<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        V::deserialize(deserializer).map(Self::new)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
