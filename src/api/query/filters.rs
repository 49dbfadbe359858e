//! Filters applied to listed records

use crate::api::models::{Application, BusinessUnit, Department, Division, Event, Function, User};

/// A record that can be searched and filtered by status
pub trait Listable {
    /// Text fields matched by free-text search
    fn search_text(&self) -> Vec<&str>;

    fn status(&self) -> Option<&str> {
        None
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Case-insensitive substring over the record's search fields
    Search(String),
    /// Case-insensitive status equality
    Status(String),

    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
}

impl Filter {
    pub fn search(text: impl Into<String>) -> Self {
        Self::Search(text.into())
    }

    pub fn status(status: impl Into<String>) -> Self {
        Self::Status(status.into())
    }

    pub fn and(filters: Vec<Filter>) -> Self {
        Self::And(filters)
    }

    pub fn or(filters: Vec<Filter>) -> Self {
        Self::Or(filters)
    }

    pub fn not(filter: Filter) -> Self {
        Self::Not(Box::new(filter))
    }

    pub fn matches<T: Listable>(&self, item: &T) -> bool {
        match self {
            Self::Search(text) => {
                let needle = text.trim().to_lowercase();
                needle.is_empty()
                    || item
                        .search_text()
                        .iter()
                        .any(|field| field.to_lowercase().contains(&needle))
            }
            Self::Status(status) => item
                .status()
                .is_some_and(|s| s.eq_ignore_ascii_case(status.trim())),
            Self::And(filters) => filters.iter().all(|f| f.matches(item)),
            Self::Or(filters) => filters.iter().any(|f| f.matches(item)),
            Self::Not(filter) => !filter.matches(item),
        }
    }
}

impl Listable for Event {
    fn search_text(&self) -> Vec<&str> {
        let mut fields = vec![self.title.as_str()];
        if let Some(description) = &self.description {
            fields.push(description);
        }
        fields
    }

    fn status(&self) -> Option<&str> {
        Some(self.status.as_str())
    }
}

impl Listable for User {
    fn search_text(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str(), self.email.as_str(), self.role.as_str()];
        if let Some(department) = &self.department {
            fields.push(department);
        }
        fields
    }

    fn status(&self) -> Option<&str> {
        Some(if self.is_active { "active" } else { "inactive" })
    }
}

macro_rules! listable_by_name {
    ($($record:ty),*) => {
        $(
            impl Listable for $record {
                fn search_text(&self) -> Vec<&str> {
                    vec![self.name.as_str()]
                }

                fn status(&self) -> Option<&str> {
                    Some(if self.is_active { "active" } else { "inactive" })
                }
            }
        )*
    };
}

listable_by_name!(BusinessUnit, Division, Department, Function, Application);
