//! Survey builder
//!
//! The builder works on a [`Draft`]: ordered pages of ordered elements plus
//! survey metadata and styling. Option lists come from the
//! [`resolver`], visibility and requirement rules from the [`evaluator`],
//! and the [`preview`] renderer combines both into the widget sequence a
//! respondent would see.

pub mod draft;
pub mod element;
pub mod evaluator;
pub mod loader;
pub mod preview;
pub mod resolver;
pub mod template;

pub use draft::{Draft, Page, ScheduleWindow, StyleSettings, SurveyMeta};
pub use element::{
    ConditionalRequired, DataSource, DisplayCondition, Element, ElementId, ElementType,
    OptionLayout,
};
pub use evaluator::{AnswerKey, AnswerValue, Answers, RenderSlot};
pub use loader::{DraftLoader, DraftOrigin};
pub use preview::{PreviewPage, PreviewWidget};
pub use resolver::{MasterData, Selection};

/// Rejected builder edits
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuilderError {
    #[error("page {0} does not exist")]
    PageNotFound(usize),
    #[error("element '{0}' does not exist")]
    ElementNotFound(ElementId),
    #[error("a draft must keep at least one page")]
    LastPage,
    #[error("options of '{0}' come from master data and cannot be edited")]
    ManagedOptions(ElementId),
    #[error("option index {index} is out of range for '{id}'")]
    OptionOutOfRange { id: ElementId, index: usize },
    #[error("schedule end must be after its start")]
    InvalidSchedule,
}
