//! Cross-revision checks against the currently-live document.
//!
//! The one place the rule engine consults state outside the document
//! under validation: the caller supplies the attributes of the live
//! revisions it knows about, and the check stays a pure function of
//! those inputs.

use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::records::TxcAttributes;

/// Attributes of a live (currently published) document, as supplied by
/// the caller's revision store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LiveAttributes {
    /// Revision number of the live document
    pub revision_number: i64,
    /// Modification timestamp of the live document
    pub modification_datetime: NaiveDateTime,
    /// Service codes the live document declares
    pub service_codes: Vec<String>,
    /// Line names the live document declares
    pub line_names: Vec<String>,
}

impl LiveAttributes {
    /// True when the live document describes the same service-code and
    /// line-name set as the draft, compared as sets.
    pub fn matches(&self, draft: &TxcAttributes) -> bool {
        let set = |values: &[String]| values.iter().cloned().collect::<BTreeSet<String>>();
        set(&self.service_codes) == set(&draft.service_codes)
            && set(&self.line_names) == set(&draft.line_names)
    }
}

/// A draft whose revision number does not supersede the live document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevisionConflict {
    /// The highest matching live revision number
    pub live_revision: i64,
    /// The draft's revision number
    pub draft_revision: i64,
}

/// Compares a draft's revision attributes against the live documents.
///
/// When one or more live documents match the draft's service-code and
/// line-name set, the draft's revision number must be strictly greater
/// than the highest live one; otherwise exactly one conflict is
/// returned, regardless of how many live revisions matched. A draft
/// with no matching live document is new and never conflicts.
pub fn check_revision(draft: &TxcAttributes, live: &[LiveAttributes]) -> Option<RevisionConflict> {
    let live_revision = live
        .iter()
        .filter(|attrs| attrs.matches(draft))
        .map(|attrs| attrs.revision_number)
        .max()?;
    if draft.revision_number > live_revision {
        return None;
    }
    Some(RevisionConflict {
        live_revision,
        draft_revision: draft.revision_number,
    })
}
