//! Operation types for question reconciliation

use crate::builder::ElementId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single change needed to make the remote question set match a draft.
/// Create and update carry the element id only; payloads are built when
/// the operation runs so they see ids remapped by earlier creates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Create a question for a local element
    Create {
        element: ElementId,
    },
    /// Update the remote question backing an element
    Update {
        element: ElementId,
        /// Remote question id
        question_id: String,
    },
    /// Delete a remote question with no local counterpart
    Delete {
        question_id: String,
        /// Title of the remote question, for reporting
        title: String,
    },
}

impl Operation {
    pub fn create(element: ElementId) -> Self {
        Self::Create { element }
    }

    pub fn update(element: ElementId, question_id: impl Into<String>) -> Self {
        Self::Update {
            element,
            question_id: question_id.into(),
        }
    }

    pub fn delete(question_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self::Delete {
            question_id: question_id.into(),
            title: title.into(),
        }
    }

    /// Local element this operation applies to
    pub fn element(&self) -> Option<&ElementId> {
        match self {
            Self::Create { element } | Self::Update { element, .. } => Some(element),
            Self::Delete { .. } => None,
        }
    }

    /// Get the HTTP method for this operation
    pub fn http_method(&self) -> &'static str {
        match self {
            Self::Create { .. } => "POST",
            Self::Update { .. } => "PUT",
            Self::Delete { .. } => "DELETE",
        }
    }

    /// Get the operation type as a string
    pub fn operation_type(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
        }
    }

    pub fn is_delete(&self) -> bool {
        matches!(self, Self::Delete { .. })
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create { element } => write!(f, "create {}", element),
            Self::Update { element, question_id } => {
                write!(f, "update question {} from {}", question_id, element)
            }
            Self::Delete { question_id, title } => {
                write!(f, "delete question {} ('{}')", question_id, title)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_metadata() {
        let create = Operation::create(ElementId::new("tmp-1"));
        assert_eq!(create.http_method(), "POST");
        assert_eq!(create.element(), Some(&ElementId::new("tmp-1")));

        let delete = Operation::delete("9", "Old question");
        assert!(delete.is_delete());
        assert_eq!(delete.operation_type(), "delete");
        assert_eq!(delete.element(), None);
        assert_eq!(delete.to_string(), "delete question 9 ('Old question')");
    }
}
