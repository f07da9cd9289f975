//! The PTI rule engine: semantic checks layered on structural validity.
//!
//! - [`catalogue`] - the declarative observation catalogue
//! - [`PtiValidator`] / [`DocumentView`] - evaluation with memoised
//!   cross-section accessors
//! - [`LiveAttributes`] / [`check_revision`] - cross-revision checks

pub mod catalogue;
mod evaluator;
mod revision;

pub use catalogue::{default_catalogue, Observation, Rule, RuleCatalogue};
pub use evaluator::{DocumentView, PtiValidator};
pub use revision::{check_revision, LiveAttributes, RevisionConflict};
