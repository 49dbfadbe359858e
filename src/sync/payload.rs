//! Question payload mapping in both directions
//!
//! Type-specific data travels in the question's `options` field:
//! selectable types send `{options, dataSource, optionLayout, ...}`,
//! likert sends `{rows}`, matrix `{columns}`, rating `{scale}` and hero
//! `{image}`. Every shape may also carry `displayCondition` and
//! `conditionalRequired`.

use crate::api::models::Question;
use crate::builder::element::{
    ConditionalRequired, DataSource, DisplayCondition, Element, ElementId, ElementType,
    OptionLayout, RATING_MAX_SCALE, RATING_MIN_SCALE,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of a question create or update request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionPayload {
    pub question_type: String,
    pub title: String,
    pub subtitle: String,
    pub required: bool,
    pub page_number: usize,
    pub order: usize,
    pub options: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rows: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    columns: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    scale: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data_source: Option<DataSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    option_layout: Option<OptionLayout>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    display_condition: Option<DisplayCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    conditional_required: Option<ConditionalRequired>,
}

impl WireOptions {
    fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn scale(&self) -> Option<u8> {
        let scale: f64 = match self.scale.as_ref()? {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => s.trim().parse().ok()?,
            _ => return None,
        };
        if !scale.is_finite() {
            return None;
        }
        Some(scale.round().clamp(f64::from(RATING_MIN_SCALE), f64::from(RATING_MAX_SCALE)) as u8)
    }
}

/// Build the request body for an element at a position in the draft
pub fn build_payload(element: &Element, page_number: usize, order: usize) -> QuestionPayload {
    let mut wire = WireOptions {
        display_condition: (element.display_condition != DisplayCondition::Always)
            .then_some(element.display_condition),
        conditional_required: element.conditional_required.clone(),
        ..WireOptions::default()
    };

    match element.element_type {
        ElementType::Choice | ElementType::Checkbox | ElementType::Dropdown => {
            wire.options = Some(element.options.clone());
            wire.data_source = Some(element.data_source);
            wire.option_layout = Some(element.option_layout);
            wire.display_condition = Some(element.display_condition);
        }
        ElementType::Likert => wire.rows = Some(element.options.clone()),
        ElementType::Matrix => wire.columns = Some(element.options.clone()),
        ElementType::Rating => wire.scale = Some(Value::from(element.rating_scale())),
        ElementType::Hero => wire.image = element.image.clone(),
        ElementType::Text | ElementType::Date | ElementType::Signature => {}
    }

    let options = if wire.is_empty() {
        None
    } else {
        serde_json::to_value(&wire).ok()
    };

    QuestionPayload {
        question_type: element.element_type.as_str().to_string(),
        title: element.title.clone(),
        subtitle: element.subtitle.clone(),
        required: element.required,
        page_number,
        order,
        options,
    }
}

/// Rebuild a draft element from a remote question
pub fn element_from_question(question: &Question) -> Element {
    let element_type = ElementType::parse(&question.question_type).unwrap_or_else(|| {
        log::warn!(
            "Unknown question type '{}' on question {}, treating as text",
            question.question_type,
            question.id
        );
        ElementType::Text
    });

    let mut element = Element::with_id(ElementId::remote(&question.id), element_type);
    element.title = question.title.clone();
    element.subtitle = question.subtitle.clone().unwrap_or_default();
    element.required = question.required;

    let wire = match &question.options {
        None | Some(Value::Null) => WireOptions::default(),
        // Older questions store a bare list of option labels
        Some(Value::Array(items)) => WireOptions {
            options: Some(
                items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect(),
            ),
            ..WireOptions::default()
        },
        Some(value) => serde_json::from_value(value.clone()).unwrap_or_else(|e| {
            log::warn!("Ignoring unreadable options on question {}: {}", question.id, e);
            WireOptions::default()
        }),
    };

    match element_type {
        ElementType::Choice | ElementType::Checkbox | ElementType::Dropdown => {
            if let Some(options) = wire.options.clone().filter(|o| !o.is_empty()) {
                element.options = options;
            }
            element.data_source = wire.data_source.unwrap_or_default();
            element.option_layout = wire.option_layout.unwrap_or_default();
        }
        ElementType::Likert => {
            if let Some(rows) = wire.rows.clone().or_else(|| wire.options.clone()) {
                element.options = rows;
            }
        }
        ElementType::Matrix => {
            if let Some(columns) = wire.columns.clone().or_else(|| wire.options.clone()) {
                element.options = columns;
            }
        }
        ElementType::Rating => {
            if let Some(scale) = wire.scale() {
                element.set_rating_scale(scale);
            }
        }
        ElementType::Hero => element.image = wire.image.clone(),
        ElementType::Text | ElementType::Date | ElementType::Signature => {}
    }

    element.display_condition = wire.display_condition.unwrap_or_default();
    element.conditional_required = wire
        .conditional_required
        .map(|rule| ConditionalRequired::new(rule.source_id, rule.threshold));
    element
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_choice_payload_carries_metadata() {
        let element = Element::with_id(ElementId::new("tmp-1"), ElementType::Checkbox)
            .with_options(["A", "B"])
            .with_data_source(DataSource::AppFunction);
        let payload = build_payload(&element, 2, 3);

        assert_eq!(payload.question_type, "checkbox");
        assert_eq!(payload.page_number, 2);
        assert_eq!(payload.order, 3);
        assert_eq!(
            payload.options,
            Some(json!({
                "options": ["A", "B"],
                "dataSource": "app_function",
                "optionLayout": "vertical",
                "displayCondition": "always"
            }))
        );
    }

    #[test]
    fn test_plain_types_send_null_options() {
        let text = Element::with_id(ElementId::new("t"), ElementType::Text);
        assert_eq!(build_payload(&text, 1, 0).options, None);

        let follow_up = text.with_conditional_required(ElementId::new("q-4"), 6);
        assert_eq!(
            build_payload(&follow_up, 1, 0).options,
            Some(json!({"conditionalRequired": {"sourceId": "q-4", "threshold": 6}}))
        );
    }

    #[test]
    fn test_rating_and_matrix_shapes() {
        let rating = Element::with_id(ElementId::new("r"), ElementType::Rating).with_options(["12"]);
        assert_eq!(build_payload(&rating, 1, 0).options, Some(json!({"scale": 10})));

        let matrix = Element::with_id(ElementId::new("m"), ElementType::Matrix);
        assert_eq!(
            build_payload(&matrix, 1, 0).options,
            Some(json!({"columns": ["Column 1", "Column 2"]}))
        );
    }

    #[test]
    fn test_question_to_element() {
        let question = Question {
            id: "31".to_string(),
            question_type: "dropdown".to_string(),
            title: "Department".to_string(),
            subtitle: None,
            required: true,
            page_number: 1,
            order: 0,
            options: Some(json!({"options": ["X"], "dataSource": "department"})),
        };
        let element = element_from_question(&question);
        assert_eq!(element.id.as_str(), "q-31");
        assert_eq!(element.data_source, DataSource::Department);
        assert_eq!(element.options, vec!["X"]);
        assert!(element.required);
    }

    #[test]
    fn test_legacy_options_and_unknown_type() {
        let question = Question {
            id: "5".to_string(),
            question_type: "slider".to_string(),
            title: "Legacy".to_string(),
            subtitle: Some("old".to_string()),
            required: false,
            page_number: 1,
            order: 0,
            options: Some(json!(["a", "b"])),
        };
        let element = element_from_question(&question);
        assert_eq!(element.element_type, ElementType::Text);
        assert_eq!(element.subtitle, "old");

        let rating = Question {
            question_type: "rating".to_string(),
            options: Some(json!({"scale": "7"})),
            ..question
        };
        assert_eq!(element_from_question(&rating).rating_scale(), 7);
    }

    #[test]
    fn test_float_rating_scale_is_rounded() {
        let question = Question {
            id: "6".to_string(),
            question_type: "rating".to_string(),
            title: "Score".to_string(),
            subtitle: None,
            required: false,
            page_number: 1,
            order: 0,
            options: Some(json!({"scale": 7.0})),
        };
        assert_eq!(element_from_question(&question).rating_scale(), 7);

        let large = Question {
            options: Some(json!({"scale": 11.6})),
            ..question.clone()
        };
        assert_eq!(element_from_question(&large).rating_scale(), 10);

        let fractional = Question {
            options: Some(json!({"scale": "3.4"})),
            ..question
        };
        assert_eq!(element_from_question(&fractional).rating_scale(), 3);
    }
}
