//! Conditional requirement and repetition planning
//!
//! Answers are stored under an [`AnswerKey`]: the element id plus, for
//! elements repeated per mapped application, the application value.

use super::draft::Page;
use super::element::{DisplayCondition, Element, ElementId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// Composite identity of one rendered answer slot
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnswerKey {
    pub element: ElementId,
    pub repetition: Option<String>,
}

impl AnswerKey {
    pub fn base(element: ElementId) -> Self {
        Self {
            element,
            repetition: None,
        }
    }

    pub fn repeated(element: ElementId, value: impl Into<String>) -> Self {
        Self {
            element,
            repetition: Some(value.into()),
        }
    }

    /// Display form used for widget ids: `id__<percent-encoded value>`
    pub fn widget_id(&self) -> String {
        match &self.repetition {
            Some(value) => format!("{}__{}", self.element, urlencoding::encode(value)),
            None => self.element.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Number(f64),
    Text(String),
    List(Vec<String>),
}

impl AnswerValue {
    /// Numeric reading of the answer; numeric strings count
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
            Self::List(_) => None,
        }
    }

    /// Selected values with empty strings dropped
    pub fn values(&self) -> Vec<String> {
        match self {
            Self::Number(n) => vec![n.to_string()],
            Self::Text(s) if s.trim().is_empty() => Vec::new(),
            Self::Text(s) => vec![s.clone()],
            Self::List(items) => items
                .iter()
                .filter(|item| !item.trim().is_empty())
                .cloned()
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Number(n) => !n.is_finite(),
            _ => self.values().is_empty(),
        }
    }
}

impl From<&str> for AnswerValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<f64> for AnswerValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<Vec<&str>> for AnswerValue {
    fn from(values: Vec<&str>) -> Self {
        Self::List(values.into_iter().map(str::to_string).collect())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Answers {
    values: HashMap<AnswerKey, AnswerValue>,
}

impl Answers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: AnswerKey, value: impl Into<AnswerValue>) {
        self.values.insert(key, value.into());
    }

    pub fn get(&self, key: &AnswerKey) -> Option<&AnswerValue> {
        self.values.get(key)
    }

    pub fn remove(&mut self, key: &AnswerKey) -> Option<AnswerValue> {
        self.values.remove(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Read answers from a JSON object keyed by element id. A nested
    /// object holds per-repetition answers keyed by repetition value.
    pub fn from_json(value: &Value) -> anyhow::Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| anyhow::anyhow!("Answers must be a JSON object"))?;

        let mut answers = Self::new();
        for (id, raw) in object {
            let element = ElementId::new(id.as_str());
            match raw {
                Value::Object(repetitions) => {
                    for (repetition, raw) in repetitions {
                        let value: AnswerValue = serde_json::from_value(raw.clone())?;
                        answers.set(AnswerKey::repeated(element.clone(), repetition.as_str()), value);
                    }
                }
                Value::Null => {}
                other => {
                    let value: AnswerValue = serde_json::from_value(other.clone())?;
                    answers.set(AnswerKey::base(element), value);
                }
            }
        }
        Ok(answers)
    }
}

/// One rendered instance of an element
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSlot<'a> {
    pub element: &'a Element,
    pub key: AnswerKey,
    /// Key whose rating drives the conditional requirement
    pub required_source: Option<AnswerKey>,
    /// Effective requirement given the current answers
    pub required: bool,
}

/// Index of the element driving per-application repetition on a page
pub fn mapped_selector(elements: &[Element]) -> Option<usize> {
    elements.iter().position(Element::is_mapped_selector)
}

/// `required`, or a triggered conditional requirement read from `source`
pub fn effective_required(element: &Element, source: Option<&AnswerKey>, answers: &Answers) -> bool {
    if element.required {
        return true;
    }
    let Some(rule) = element.conditional_required.as_ref() else {
        return false;
    };
    source
        .and_then(|key| answers.get(key))
        .and_then(AnswerValue::as_number)
        .is_some_and(|value| rule.is_triggered_by(value))
}

/// Distinct selected values in first-selection order
fn selected_values(answer: Option<&AnswerValue>) -> Vec<String> {
    let mut seen = HashSet::new();
    answer
        .map(AnswerValue::values)
        .unwrap_or_default()
        .into_iter()
        .filter(|value| seen.insert(value.clone()))
        .collect()
}

fn slot<'a>(element: &'a Element, key: AnswerKey, source: Option<AnswerKey>, answers: &Answers) -> RenderSlot<'a> {
    let required = effective_required(element, source.as_ref(), answers);
    RenderSlot {
        element,
        key,
        required_source: source,
        required,
    }
}

fn base_slot<'a>(element: &'a Element, answers: &Answers) -> RenderSlot<'a> {
    let source = element
        .conditional_required
        .as_ref()
        .map(|rule| AnswerKey::base(rule.source_id.clone()));
    slot(element, AnswerKey::base(element.id.clone()), source, answers)
}

/// Render plan for a page. Repeated elements form one block per selected
/// value, placed where the first repeated element sits.
pub fn plan_page<'a>(page: &'a Page, answers: &Answers) -> Vec<RenderSlot<'a>> {
    let Some(selector) = mapped_selector(&page.elements) else {
        return page.elements.iter().map(|e| base_slot(e, answers)).collect();
    };

    let (head, tail) = page.elements.split_at(selector + 1);
    let mut slots: Vec<RenderSlot<'a>> = head.iter().map(|e| base_slot(e, answers)).collect();

    let selector_key = AnswerKey::base(page.elements[selector].id.clone());
    let values = selected_values(answers.get(&selector_key));

    let repeated: Vec<&Element> = tail
        .iter()
        .filter(|e| e.display_condition == DisplayCondition::AfterMappedSelection)
        .collect();
    let repeated_ids: HashSet<&ElementId> = repeated.iter().map(|e| &e.id).collect();

    let mut block_emitted = false;
    for element in tail {
        if element.display_condition != DisplayCondition::AfterMappedSelection {
            slots.push(base_slot(element, answers));
            continue;
        }
        if block_emitted {
            continue;
        }
        block_emitted = true;

        for value in &values {
            for &repeated_element in &repeated {
                let key = AnswerKey::repeated(repeated_element.id.clone(), value.as_str());
                // Rules pointing at another repeated element follow the same repetition
                let source = repeated_element.conditional_required.as_ref().map(|rule| {
                    if repeated_ids.contains(&rule.source_id) {
                        AnswerKey::repeated(rule.source_id.clone(), value.as_str())
                    } else {
                        AnswerKey::base(rule.source_id.clone())
                    }
                });
                slots.push(slot(repeated_element, key, source, answers));
            }
        }
    }

    slots
}

/// Keys of required slots that have no usable answer
pub fn missing_required(slots: &[RenderSlot<'_>], answers: &Answers) -> Vec<AnswerKey> {
    slots
        .iter()
        .filter(|slot| slot.required)
        .filter(|slot| answers.get(&slot.key).is_none_or(AnswerValue::is_empty))
        .map(|slot| slot.key.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::element::{DataSource, ElementType};
    use serde_json::json;

    fn mapped_page() -> Page {
        let mut page = Page::new(1);
        page.elements = vec![
            Element::with_id(ElementId::new("dept"), ElementType::Dropdown)
                .with_data_source(DataSource::Department),
            Element::with_id(ElementId::new("apps"), ElementType::Checkbox)
                .with_data_source(DataSource::AppDepartment),
            Element::with_id(ElementId::new("score"), ElementType::Rating)
                .with_display_condition(DisplayCondition::AfterMappedSelection),
            Element::with_id(ElementId::new("why"), ElementType::Text)
                .with_display_condition(DisplayCondition::AfterMappedSelection)
                .with_conditional_required(ElementId::new("score"), 7),
            Element::with_id(ElementId::new("closing"), ElementType::Text),
        ];
        page
    }

    #[test]
    fn test_threshold_seven() {
        let element = Element::with_id(ElementId::new("t"), ElementType::Text)
            .with_conditional_required(ElementId::new("r"), 7);
        let source = AnswerKey::base(ElementId::new("r"));

        for value in 1..=6 {
            let mut answers = Answers::new();
            answers.set(source.clone(), f64::from(value));
            assert!(effective_required(&element, Some(&source), &answers));
        }
        for value in [0.0_f64, 7.0, 8.0, 9.0, 10.0] {
            let mut answers = Answers::new();
            answers.set(source.clone(), value);
            assert!(!effective_required(&element, Some(&source), &answers));
        }
        assert!(!effective_required(&element, Some(&source), &Answers::new()));
    }

    #[test]
    fn test_numeric_strings_count() {
        let element = Element::with_id(ElementId::new("t"), ElementType::Text)
            .with_conditional_required(ElementId::new("r"), 4);
        let source = AnswerKey::base(ElementId::new("r"));
        let mut answers = Answers::new();
        answers.set(source.clone(), " 2 ");
        assert!(effective_required(&element, Some(&source), &answers));
        answers.set(source.clone(), "n/a");
        assert!(!effective_required(&element, Some(&source), &answers));
    }

    #[test]
    fn test_no_selection_hides_repeated_elements() {
        let page = mapped_page();
        let slots = plan_page(&page, &Answers::new());
        let ids: Vec<&str> = slots.iter().map(|s| s.element.id.as_str()).collect();
        assert_eq!(ids, vec!["dept", "apps", "closing"]);
    }

    #[test]
    fn test_repetition_per_selected_application() {
        let page = mapped_page();
        let mut answers = Answers::new();
        answers.set(
            AnswerKey::base(ElementId::new("apps")),
            vec!["App A", "", "App B", "App A"],
        );
        answers.set(AnswerKey::repeated(ElementId::new("score"), "App B"), 3.0_f64);

        let slots = plan_page(&page, &answers);
        let widgets: Vec<String> = slots.iter().map(|s| s.key.widget_id()).collect();
        assert_eq!(
            widgets,
            vec![
                "dept",
                "apps",
                "score__App%20A",
                "why__App%20A",
                "score__App%20B",
                "why__App%20B",
                "closing",
            ]
        );

        let why_a = &slots[3];
        assert_eq!(
            why_a.required_source,
            Some(AnswerKey::repeated(ElementId::new("score"), "App A"))
        );
        assert!(!why_a.required);
        assert!(slots[5].required);
    }

    #[test]
    fn test_rule_on_unrepeated_source_keeps_base_key() {
        let mut page = mapped_page();
        page.elements[3].conditional_required = Some(crate::builder::element::ConditionalRequired::new(
            ElementId::new("dept"),
            5,
        ));
        let mut answers = Answers::new();
        answers.set(AnswerKey::base(ElementId::new("apps")), "CRM");

        let slots = plan_page(&page, &answers);
        let why = slots.iter().find(|s| s.element.id.as_str() == "why").unwrap();
        assert_eq!(why.required_source, Some(AnswerKey::base(ElementId::new("dept"))));
    }

    #[test]
    fn test_missing_required() {
        let mut page = Page::new(1);
        page.elements = vec![
            Element::with_id(ElementId::new("name"), ElementType::Text).required(true),
            Element::with_id(ElementId::new("note"), ElementType::Text),
        ];
        let mut answers = Answers::new();
        let slots = plan_page(&page, &answers);
        assert_eq!(missing_required(&slots, &answers), vec![AnswerKey::base(ElementId::new("name"))]);

        answers.set(AnswerKey::base(ElementId::new("name")), "Ada");
        let slots = plan_page(&page, &answers);
        assert!(missing_required(&slots, &answers).is_empty());
    }

    #[test]
    fn test_answers_from_json() {
        let answers = Answers::from_json(&json!({
            "apps": ["CRM", "ERP"],
            "score": {"CRM": 4, "ERP": "9"},
            "skip": null
        }))
        .unwrap();
        assert_eq!(answers.len(), 3);
        let erp = answers
            .get(&AnswerKey::repeated(ElementId::new("score"), "ERP"))
            .unwrap();
        assert_eq!(erp.as_number(), Some(9.0));
    }

    #[test]
    fn test_widget_ids_differ_per_value() {
        let a = AnswerKey::repeated(ElementId::new("q-1"), "R&D / Ops");
        let b = AnswerKey::repeated(ElementId::new("q-1"), "R&D Ops");
        assert_ne!(a.widget_id(), b.widget_id());
        assert!(a.widget_id().starts_with("q-1__"));
        assert!(!a.widget_id().contains(' '));
    }
}
