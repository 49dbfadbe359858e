//! Question reconciliation
//!
//! Makes the backend question set of a survey match a [`Draft`](crate::builder::Draft):
//! [`plan`] diffs the two, [`sync_draft`] applies the plan through a
//! [`QuestionStore`] one operation at a time.

pub mod operation;
pub mod payload;
pub mod reconcile;

pub use operation::Operation;
pub use payload::{QuestionPayload, build_payload, element_from_question};
pub use reconcile::{QuestionStore, SyncPlan, SyncReport, plan, sync_draft};
