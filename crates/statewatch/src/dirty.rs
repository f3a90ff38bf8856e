#![forbid(unsafe_code)]

//! The dirtiness evaluator: a pure comparison of live record against
//! baseline across the watched fields. No side effects, no dependency on
//! interception state.

use std::rc::Rc;

use serde_json::{Map, Value};

/// `true` iff at least one watched field's projected value differs between
/// `live` and `baseline`.
///
/// Either side being absent means dirtiness cannot be established yet and
/// yields `false`. An empty watch set is never dirty, whatever the record
/// contents. Comparison is per-field `Value` equality of the projection;
/// there is no diffing inside a field's value.
pub(crate) fn fields_differ(
    live: Option<&Map<String, Value>>,
    baseline: Option<&Map<String, Value>>,
    watched: &[Rc<str>],
) -> bool {
    let (Some(live), Some(baseline)) = (live, baseline) else {
        return false;
    };
    watched
        .iter()
        .any(|field| live.get(field.as_ref()) != baseline.get(field.as_ref()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
