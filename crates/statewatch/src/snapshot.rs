#![forbid(unsafe_code)]

//! Baseline store and the structural copy it is built on.
//!
//! # Design
//!
//! A checkpoint is a serialization round-trip: the whole record (all
//! fields, not only watched ones) is projected to a `serde_json` field map.
//! The result shares no structure with the live record and is never mutated
//! after capture.
//!
//! # Failure Modes
//!
//! - **Unrepresentable member**: a field that cannot serialize (e.g. a map
//!   with non-string keys) fails the checkpoint at the moment it is taken;
//!   the previously stored snapshot, if any, is retained.
//! - **Non-record type**: a record that serializes to something other than
//!   a field map is a configuration error, surfaced as
//!   [`StateError::NotARecord`].

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Result, StateError};

/// Produce a structurally independent plain-data copy of `record`.
pub(crate) fn structural_copy<T: Serialize>(record: &T) -> Result<Map<String, Value>> {
    let root = serde_json::to_value(record).map_err(|err| StateError::Checkpoint {
        detail: err.to_string(),
    })?;
    match root {
        Value::Object(fields) => Ok(fields),
        _ => Err(StateError::NotARecord),
    }
}

/// Holds the single most recent clean checkpoint.
#[derive(Debug, Default)]
pub(crate) struct BaselineStore {
    snapshot: Option<Map<String, Value>>,
}

impl BaselineStore {
    /// Capture and store a structurally independent copy of `record`.
    /// On failure the previous snapshot is retained untouched.
    pub(crate) fn checkpoint<T: Serialize>(&mut self, record: &T) -> Result<()> {
        self.snapshot = Some(structural_copy(record)?);
        Ok(())
    }

    /// Store an already-produced plain-data snapshot.
    pub(crate) fn store(&mut self, snapshot: Map<String, Value>) {
        self.snapshot = Some(snapshot);
    }

    /// The stored snapshot; fails only if no checkpoint was ever taken.
    pub(crate) fn current(&self) -> Result<&Map<String, Value>> {
        self.snapshot.as_ref().ok_or(StateError::NoBaseline)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    #[derive(Serialize)]
    struct Plain {
        flag: bool,
        count: u32,
        label: String,
        note: Option<String>,
    }

    #[test]
    fn checkpoint_copies_every_field() {
        let record = Plain {
            flag: false,
            count: 0,
            label: String::new(),
            note: None,
        };
        let mut store = BaselineStore::default();
        store.checkpoint(&record).unwrap();

        let snapshot = store.current().unwrap();
        assert_eq!(snapshot.get("flag"), Some(&json!(false)));
        assert_eq!(snapshot.get("count"), Some(&json!(0)));
        assert_eq!(snapshot.get("label"), Some(&json!("")));
        assert_eq!(snapshot.get("note"), Some(&json!(null)));
    }

    #[test]
    fn snapshot_is_independent_of_later_mutation() {
        let mut record = Plain {
            flag: true,
            count: 1,
            label: "a".into(),
            note: None,
        };
        let mut store = BaselineStore::default();
        store.checkpoint(&record).unwrap();

        record.count = 99;
        record.label.push('b');
        assert_eq!(store.current().unwrap().get("count"), Some(&json!(1)));
        assert_eq!(store.current().unwrap().get("label"), Some(&json!("a")));
    }

    #[test]
    fn numeric_extremes_survive() {
        #[derive(Serialize)]
        struct Extremes {
            big: f64,
            min: i64,
        }
        let mut store = BaselineStore::default();
        store
            .checkpoint(&Extremes {
                big: f64::MAX,
                min: i64::MIN,
            })
            .unwrap();
        let snapshot = store.current().unwrap();
        assert_eq!(snapshot.get("big"), Some(&json!(f64::MAX)));
        assert_eq!(snapshot.get("min"), Some(&json!(i64::MIN)));
    }

    #[test]
    fn current_before_any_checkpoint_fails() {
        let store = BaselineStore::default();
        assert_eq!(store.current().unwrap_err(), StateError::NoBaseline);
    }

    #[test]
    fn non_record_type_is_rejected() {
        let mut store = BaselineStore::default();
        let err = store.checkpoint(&42u32).unwrap_err();
        assert_eq!(err, StateError::NotARecord);
    }

    #[test]
    fn failed_checkpoint_retains_previous_snapshot() {
        #[derive(Serialize)]
        struct Gnarly {
            table: BTreeMap<(u8, u8), u32>,
        }

        let mut store = BaselineStore::default();
        store
            .checkpoint(&Plain {
                flag: true,
                count: 3,
                label: "keep".into(),
                note: None,
            })
            .unwrap();

        let mut table = BTreeMap::new();
        table.insert((1, 2), 3); // tuple keys cannot become JSON object keys
        let err = store.checkpoint(&Gnarly { table }).unwrap_err();
        assert!(matches!(err, StateError::Checkpoint { .. }));
        assert_eq!(store.current().unwrap().get("label"), Some(&json!("keep")));
    }
}
