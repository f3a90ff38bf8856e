#![forbid(unsafe_code)]

//! The public container: live slot, baseline, and the dirty-state stream.
//!
//! # Design
//!
//! [`StateContainer<T>`] owns the live record and a shared change hub. The
//! hub holds the watched-field list, an incrementally maintained plain-data
//! projection of the live record (the *live view*), the baseline snapshot,
//! and the outgoing dirty [`Signal`]. Watched fields carry taps pointing
//! back at the hub, so an ordinary `Watched::set` on the record flows
//! synchronously through: write → projection → live view update → dirtiness
//! recompute → emission.
//!
//! Clean/Dirty is always derived from the evaluator on demand; there is no
//! stored flag that could desynchronize from the underlying data.
//!
//! # Invariants
//!
//! 1. A freshly constructed container is clean: a record is never dirty
//!    relative to itself.
//! 2. Whenever a new instance enters the live slot, taps are installed on
//!    its watched fields before the caller can observe it, and an emission
//!    fires immediately.
//! 3. Whole-object replacement keeps the existing baseline; only
//!    construction and [`undo_changes`](StateContainer::undo_changes) take
//!    checkpoints.
//! 4. Reads never emit.
//!
//! # Failure Modes
//!
//! - **Unknown watched field**: fail fast at construction/replacement, per
//!   the configuration-error policy. Nothing is half-installed.
//! - **Checkpoint or projection failure**: the container records the fault
//!   and rejects dirtiness queries with it until an operation fully
//!   revalidates baseline and live view. The dirty signal stays silent
//!   while faulted; it never reports a speculative clean.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::{Map, Value};

use crate::dirty::fields_differ;
use crate::error::{Result, StateError};
use crate::field::{ChangeSink, Tap};
use crate::record::Trackable;
use crate::signal::Signal;
use crate::snapshot::{BaselineStore, structural_copy};

/// Tracks one mutable record against its last clean checkpoint and exposes
/// the result as a replay-latest boolean stream.
///
/// See the [crate docs](crate) for a usage example.
pub struct StateContainer<T: Trackable> {
    record: T,
    watched: Vec<Rc<str>>,
    hub: Rc<ChangeHub>,
}

/// Shared state reachable from the field taps.
struct ChangeHub {
    state: RefCell<HubState>,
    dirty: Signal<bool>,
}

struct HubState {
    watched: Vec<Rc<str>>,
    /// Plain-data projection of the live record, maintained per write.
    live_view: Map<String, Value>,
    baseline: BaselineStore,
    /// Set when a checkpoint or projection failed; cleared only by an
    /// operation that revalidates both baseline and live view.
    fault: Option<StateError>,
}

impl HubState {
    fn evaluate(&self) -> Result<bool> {
        if let Some(fault) = &self.fault {
            return Err(fault.clone());
        }
        let baseline = match self.baseline.current() {
            Ok(snapshot) => Some(snapshot),
            // Unreachable through the public API, which checkpoints at
            // construction; dirtiness against no baseline is false.
            Err(StateError::NoBaseline) => None,
            Err(other) => return Err(other),
        };
        Ok(fields_differ(Some(&self.live_view), baseline, &self.watched))
    }
}

impl ChangeSink for ChangeHub {
    fn field_written(&self, field: &str, projection: serde_json::Result<Value>) {
        let dirty = {
            let mut state = self.state.borrow_mut();
            match projection {
                Ok(value) => {
                    state.live_view.insert(field.to_owned(), value);
                }
                Err(err) => {
                    tracing::warn!(
                        field,
                        %err,
                        "watched-field projection failed; dirtiness queries rejected until the next checkpoint"
                    );
                    state.fault = Some(StateError::Projection {
                        field: field.to_owned(),
                        detail: err.to_string(),
                    });
                }
            }
            state.evaluate()
        };
        if let Ok(dirty) = dirty {
            tracing::trace!(field, dirty, "watched field written");
            self.dirty.emit(dirty);
        }
    }
}

impl<T: Trackable> StateContainer<T> {
    /// Track `record`, watching the named fields.
    ///
    /// Installs interception on the watched fields, takes the initial
    /// baseline checkpoint, and seeds the dirty stream with `false`.
    ///
    /// Fails fast with [`StateError::UnknownField`] when a watched name has
    /// no watch point on the record, and with a checkpoint error when the
    /// record cannot be captured as plain data.
    pub fn new(record: T, watched_fields: &[&str]) -> Result<Self> {
        let watched: Vec<Rc<str>> = watched_fields.iter().map(|f| Rc::from(*f)).collect();
        let mut record = record;

        let live_view = structural_copy(&record)?;
        let mut baseline = BaselineStore::default();
        baseline.checkpoint(&record)?;

        let hub = Rc::new(ChangeHub {
            state: RefCell::new(HubState {
                watched: watched.clone(),
                live_view,
                baseline,
                fault: None,
            }),
            dirty: Signal::new(false),
        });
        Self::install_taps(&mut record, &watched, &hub)?;

        Ok(Self {
            record,
            watched,
            hub,
        })
    }

    /// The live record. Reads never emit.
    #[must_use]
    pub fn record(&self) -> &T {
        &self.record
    }

    /// Mutable access to the live record.
    ///
    /// Writes to watched fields must go through [`Watched::set`] or
    /// [`Watched::update`] to be observed; overwriting a whole `Watched`
    /// field bypasses its tap.
    ///
    /// [`Watched::set`]: crate::Watched::set
    /// [`Watched::update`]: crate::Watched::update
    pub fn record_mut(&mut self) -> &mut T {
        &mut self.record
    }

    /// The names this container watches, in construction order.
    pub fn watched_fields(&self) -> impl Iterator<Item = &str> {
        self.watched.iter().map(|f| f.as_ref())
    }

    /// Replace the live record wholesale.
    ///
    /// Interception moves to the new instance and an emission fires
    /// immediately. The baseline is **not** re-checkpointed: the new
    /// record's watched fields are judged against the prior clean point, so
    /// a replacement whose watched values match the old baseline reads
    /// clean. On error the container is left unchanged.
    pub fn replace(&mut self, record: T) -> Result<()> {
        let mut record = record;
        let live_view = structural_copy(&record)?;
        Self::install_taps(&mut record, &self.watched, &self.hub)?;

        self.record = record;
        let dirty = {
            let mut state = self.hub.state.borrow_mut();
            state.live_view = live_view;
            // A projection fault concerned the old live view only; this one
            // was rebuilt from a successful serialization. Checkpoint faults
            // stay: the baseline is still missing.
            if matches!(state.fault, Some(StateError::Projection { .. })) {
                state.fault = None;
            }
            state.evaluate()
        };
        if let Ok(dirty) = dirty {
            tracing::trace!(dirty, "live record replaced");
            self.hub.dirty.emit(dirty);
        }
        Ok(())
    }

    /// Accept the current live state as the new clean baseline.
    ///
    /// Re-baseline semantics: the live record becomes its own checkpoint
    /// and the container reports clean. Previously pristine values are
    /// **not** restored. Also reinstalls interception and clears any
    /// outstanding fault.
    pub fn undo_changes(&mut self) -> Result<()> {
        let live_view = structural_copy(&self.record)?;
        Self::install_taps(&mut self.record, &self.watched, &self.hub)?;

        {
            let mut state = self.hub.state.borrow_mut();
            state.baseline.store(live_view.clone());
            state.live_view = live_view;
            state.fault = None;
        }
        // Live equals its own baseline by construction.
        self.hub.dirty.emit(false);
        Ok(())
    }

    /// Current dirtiness, derived on demand.
    ///
    /// Returns the recorded fault while the container lacks a valid
    /// baseline or live view.
    pub fn is_dirty(&self) -> Result<bool> {
        self.hub.state.borrow().evaluate()
    }

    /// Handle to the dirty-state stream.
    ///
    /// Multicast and replay-latest: each new subscriber immediately
    /// receives the current dirty value, then every recomputed value as
    /// emissions occur. The stream never completes and never errors.
    #[must_use]
    pub fn dirty_state(&self) -> Signal<bool> {
        self.hub.dirty.clone()
    }

    fn install_taps(record: &mut T, watched: &[Rc<str>], hub: &Rc<ChangeHub>) -> Result<()> {
        let sink: Rc<dyn ChangeSink> = Rc::clone(hub) as Rc<dyn ChangeSink>;
        let mut points = record.watch_points();
        for field in watched {
            let (_, point) = points
                .iter_mut()
                .find(|(name, _)| *name == field.as_ref())
                .ok_or_else(|| StateError::UnknownField {
                    field: field.to_string(),
                })?;
            point.install(Tap {
                field: Rc::clone(field),
                sink: Rc::clone(&sink),
            });
        }
        Ok(())
    }
}

impl<T: Trackable + std::fmt::Debug> std::fmt::Debug for StateContainer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateContainer")
            .field("record", &self.record)
            .field("watched", &self.watched)
            .field("dirty", &self.hub.state.borrow().evaluate())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
