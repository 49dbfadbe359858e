//! Client-side listing: filtering and pagination of fetched collections
//!
//! Follows the same pattern as the rest of the API module: a reusable
//! [`ListQuery`] built through a fluent [`QueryBuilder`].

pub mod builder;
pub mod filters;
pub mod result;

pub use builder::{ListQuery, QueryBuilder};
pub use filters::{Filter, Listable};
pub use result::Paged;
