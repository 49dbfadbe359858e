//! Survey backend REST API
//!
//! Typed wrappers around every endpoint group the console uses. All calls
//! go through [`SurveyClient`] and return `Result<T, ApiError>`.

pub mod auth;
pub mod client;
pub mod constants;
pub mod error;
pub mod events;
pub mod master_data;
pub mod models;
pub mod query;
pub mod questions;
pub mod users;

pub use client::{ApiResult, SurveyClient};
pub use error::ApiError;
pub use models::{
    Application, BusinessUnit, Department, Division, Event, EventInput, EventStatus, Function,
    ImportSummary, MasterDataKind, Question, User, UserInput, UserProfile,
};
pub use query::{Filter, ListQuery, Paged, QueryBuilder};
