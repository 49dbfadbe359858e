//! Form element model for the survey builder
//!
//! An element is a single field on a page. Its `element_type` is fixed at
//! creation, the remaining fields are edited freely by the builder.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix carried by ids of elements that exist as remote questions
pub const REMOTE_ID_PREFIX: &str = "q-";

/// Prefix for client-side ids of unsaved elements
pub const TEMP_ID_PREFIX: &str = "tmp-";

pub const RATING_MIN_SCALE: u8 = 3;
pub const RATING_MAX_SCALE: u8 = 10;
pub const RATING_DEFAULT_SCALE: u8 = 5;

/// Stable element identifier, unique within a draft
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh client-side id for an element that has not been saved yet
    pub fn temporary() -> Self {
        Self(format!("{}{}", TEMP_ID_PREFIX, uuid::Uuid::new_v4().simple()))
    }

    /// Id for an element backed by the remote question `question_id`
    pub fn remote(question_id: &str) -> Self {
        Self(format!("{}{}", REMOTE_ID_PREFIX, question_id))
    }

    /// Remote question id encoded in this element id, if any
    pub fn remote_question_id(&self) -> Option<&str> {
        self.0
            .strip_prefix(REMOTE_ID_PREFIX)
            .filter(|id| !id.is_empty())
    }

    pub fn is_temporary(&self) -> bool {
        self.0.starts_with(TEMP_ID_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementType {
    Hero,
    Text,
    Choice,
    Checkbox,
    Dropdown,
    Rating,
    Likert,
    Matrix,
    Date,
    Signature,
}

impl ElementType {
    pub const ALL: [ElementType; 10] = [
        ElementType::Hero,
        ElementType::Text,
        ElementType::Choice,
        ElementType::Checkbox,
        ElementType::Dropdown,
        ElementType::Rating,
        ElementType::Likert,
        ElementType::Matrix,
        ElementType::Date,
        ElementType::Signature,
    ];

    /// Types whose options are a list of selectable values
    pub fn is_selectable(self) -> bool {
        matches!(self, Self::Choice | Self::Checkbox | Self::Dropdown)
    }

    /// Types that honour `option_layout`
    pub fn has_layout(self) -> bool {
        matches!(self, Self::Choice | Self::Checkbox)
    }

    /// Whether an answer to this type can hold several values
    pub fn is_multi_valued(self) -> bool {
        matches!(self, Self::Checkbox)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hero => "hero",
            Self::Text => "text",
            Self::Choice => "choice",
            Self::Checkbox => "checkbox",
            Self::Dropdown => "dropdown",
            Self::Rating => "rating",
            Self::Likert => "likert",
            Self::Matrix => "matrix",
            Self::Date => "date",
            Self::Signature => "signature",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(value.trim()))
    }

    fn default_options(self) -> Vec<String> {
        let labels: &[&str] = match self {
            Self::Choice | Self::Checkbox | Self::Dropdown => &["Option 1", "Option 2"],
            Self::Likert => &["Statement 1", "Statement 2"],
            Self::Matrix => &["Column 1", "Column 2"],
            Self::Rating => return vec![RATING_DEFAULT_SCALE.to_string()],
            _ => &[],
        };
        labels.iter().map(|s| s.to_string()).collect()
    }

    fn default_title(self) -> &'static str {
        match self {
            Self::Hero => "Welcome",
            Self::Text => "Text question",
            Self::Choice => "Single choice question",
            Self::Checkbox => "Multiple choice question",
            Self::Dropdown => "Dropdown question",
            Self::Rating => "Rating question",
            Self::Likert => "Likert question",
            Self::Matrix => "Matrix question",
            Self::Date => "Date",
            Self::Signature => "Signature",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a selectable element takes its options from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    #[default]
    Manual,
    Bu,
    Division,
    Department,
    Function,
    AppDepartment,
    AppFunction,
}

impl DataSource {
    pub const ALL: [DataSource; 7] = [
        DataSource::Manual,
        DataSource::Bu,
        DataSource::Division,
        DataSource::Department,
        DataSource::Function,
        DataSource::AppDepartment,
        DataSource::AppFunction,
    ];

    /// Sources listing applications mapped to a department or function
    pub fn is_mapped_application(self) -> bool {
        matches!(self, Self::AppDepartment | Self::AppFunction)
    }

    pub fn is_manual(self) -> bool {
        matches!(self, Self::Manual)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Bu => "bu",
            Self::Division => "division",
            Self::Department => "department",
            Self::Function => "function",
            Self::AppDepartment => "app_department",
            Self::AppFunction => "app_function",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionLayout {
    #[default]
    Vertical,
    Horizontal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayCondition {
    #[default]
    Always,
    AfterMappedSelection,
}

/// Requirement triggered by a low rating on another element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalRequired {
    pub source_id: ElementId,
    pub threshold: u8,
}

impl ConditionalRequired {
    pub fn new(source_id: ElementId, threshold: u8) -> Self {
        Self {
            source_id,
            threshold: threshold.clamp(1, 10),
        }
    }

    /// Whether a rating value triggers the requirement.
    /// Zero and non-finite values count as unanswered.
    pub fn is_triggered_by(&self, value: f64) -> bool {
        value.is_finite() && value >= 1.0 && value <= f64::from(self.threshold) - 1.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: ElementId,
    #[serde(rename = "type")]
    pub element_type: ElementType,
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub data_source: DataSource,
    #[serde(default)]
    pub option_layout: OptionLayout,
    #[serde(default)]
    pub display_condition: DisplayCondition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditional_required: Option<ConditionalRequired>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Element {
    /// New element with a temporary id and the defaults for its type
    pub fn new(element_type: ElementType) -> Self {
        Self::with_id(ElementId::temporary(), element_type)
    }

    pub fn with_id(id: ElementId, element_type: ElementType) -> Self {
        Self {
            id,
            element_type,
            title: element_type.default_title().to_string(),
            subtitle: String::new(),
            required: false,
            options: element_type.default_options(),
            data_source: DataSource::Manual,
            option_layout: OptionLayout::Vertical,
            display_condition: DisplayCondition::Always,
            conditional_required: None,
            image: None,
        }
    }

    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_data_source(mut self, data_source: DataSource) -> Self {
        self.data_source = data_source;
        self
    }

    pub fn with_display_condition(mut self, condition: DisplayCondition) -> Self {
        self.display_condition = condition;
        self
    }

    pub fn with_conditional_required(mut self, source_id: ElementId, threshold: u8) -> Self {
        self.conditional_required = Some(ConditionalRequired::new(source_id, threshold));
        self
    }

    /// Maximum rating value, read from the first option
    pub fn rating_scale(&self) -> u8 {
        self.options
            .first()
            .and_then(|raw| raw.trim().parse::<u8>().ok())
            .unwrap_or(RATING_DEFAULT_SCALE)
            .clamp(RATING_MIN_SCALE, RATING_MAX_SCALE)
    }

    pub fn set_rating_scale(&mut self, scale: u8) {
        self.options = vec![scale.clamp(RATING_MIN_SCALE, RATING_MAX_SCALE).to_string()];
    }

    /// Whether option edits are allowed for this element
    pub fn options_editable(&self) -> bool {
        !self.element_type.is_selectable() || self.data_source.is_manual()
    }

    /// Whether this element drives per-application repetition
    pub fn is_mapped_selector(&self) -> bool {
        self.element_type.is_selectable() && self.data_source.is_mapped_application()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_id_roundtrip() {
        let id = ElementId::remote("42");
        assert_eq!(id.as_str(), "q-42");
        assert_eq!(id.remote_question_id(), Some("42"));
        assert!(!id.is_temporary());

        let temp = ElementId::temporary();
        assert!(temp.is_temporary());
        assert_eq!(temp.remote_question_id(), None);
        assert_eq!(ElementId::new("q-").remote_question_id(), None);
    }

    #[test]
    fn test_type_defaults() {
        let choice = Element::new(ElementType::Choice);
        assert_eq!(choice.options, vec!["Option 1", "Option 2"]);

        let rating = Element::new(ElementType::Rating);
        assert_eq!(rating.rating_scale(), 5);

        let text = Element::new(ElementType::Text);
        assert!(text.options.is_empty());
    }

    #[test]
    fn test_rating_scale_is_clamped() {
        let mut rating = Element::new(ElementType::Rating).with_options(["25"]);
        assert_eq!(rating.rating_scale(), 10);

        rating.set_rating_scale(1);
        assert_eq!(rating.options, vec!["3"]);

        let garbage = Element::new(ElementType::Rating).with_options(["lots"]);
        assert_eq!(garbage.rating_scale(), 5);
    }

    #[test]
    fn test_threshold_window() {
        let rule = ConditionalRequired::new(ElementId::new("r"), 7);
        for value in 1..=6 {
            assert!(rule.is_triggered_by(f64::from(value)));
        }
        for value in [0.0, 7.0, 8.0, 9.0, 10.0, f64::NAN, f64::INFINITY] {
            assert!(!rule.is_triggered_by(value));
        }
        assert_eq!(ConditionalRequired::new(ElementId::new("r"), 40).threshold, 10);
    }

    #[test]
    fn test_serde_uses_wire_names() {
        let element = Element::with_id(ElementId::new("e1"), ElementType::Dropdown)
            .with_data_source(DataSource::AppDepartment)
            .with_display_condition(DisplayCondition::AfterMappedSelection);
        let json = serde_json::to_value(&element).unwrap();
        assert_eq!(json["type"], "dropdown");
        assert_eq!(json["dataSource"], "app_department");
        assert_eq!(json["displayCondition"], "after_mapped_selection");
        assert_eq!(json["optionLayout"], "vertical");
    }

    #[test]
    fn test_parse_names() {
        assert_eq!(ElementType::parse("Likert"), Some(ElementType::Likert));
        assert_eq!(DataSource::parse("app_function"), Some(DataSource::AppFunction));
        assert_eq!(DataSource::parse("nope"), None);
    }
}
