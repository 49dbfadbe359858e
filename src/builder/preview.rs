//! Respondent-side preview of a draft

use super::draft::Draft;
use super::element::{DataSource, ElementId, ElementType, OptionLayout};
use super::evaluator::{self, AnswerKey, AnswerValue, Answers};
use super::resolver::{self, MasterData, Selection};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewWidget {
    pub widget_id: String,
    #[serde(skip)]
    pub key: Option<AnswerKey>,
    pub element_id: ElementId,
    #[serde(rename = "type")]
    pub element_type: ElementType,
    pub title: String,
    /// Repetition value this instance belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    pub subtitle: String,
    pub required: bool,
    pub options: Vec<String>,
    pub layout: OptionLayout,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewPage {
    pub id: usize,
    pub title: String,
    pub widgets: Vec<PreviewWidget>,
}

/// Build the selection context from answers to master-data elements.
/// The first answered element of each source wins; application lists
/// are left for the caller to fetch.
pub fn selection_from_answers(draft: &Draft, answers: &Answers) -> Selection {
    let mut selection = Selection::default();

    for (_, _, element) in draft.elements() {
        let slot = match element.data_source {
            DataSource::Bu => &mut selection.business_unit,
            DataSource::Division => &mut selection.division,
            DataSource::Department => &mut selection.department,
            DataSource::Function => &mut selection.function,
            _ => continue,
        };
        if slot.is_some() {
            continue;
        }
        *slot = answers
            .get(&AnswerKey::base(element.id.clone()))
            .map(AnswerValue::values)
            .and_then(|values| values.into_iter().next());
    }

    selection
}

pub fn render(draft: &Draft, master: &MasterData, selection: &Selection, answers: &Answers) -> Vec<PreviewPage> {
    draft
        .pages
        .iter()
        .map(|page| {
            let widgets = evaluator::plan_page(page, answers)
                .into_iter()
                .map(|slot| {
                    let element = slot.element;
                    let options = if element.element_type.is_selectable() {
                        resolver::resolve_options(element, master, selection)
                    } else if element.element_type == ElementType::Rating {
                        Vec::new()
                    } else {
                        element.options.clone()
                    };
                    let scale = (element.element_type == ElementType::Rating)
                        .then(|| element.rating_scale());

                    PreviewWidget {
                        widget_id: slot.key.widget_id(),
                        element_id: element.id.clone(),
                        element_type: element.element_type,
                        title: element.title.clone(),
                        context: slot.key.repetition.clone(),
                        subtitle: element.subtitle.clone(),
                        required: slot.required,
                        options,
                        layout: element.option_layout,
                        scale,
                        key: Some(slot.key),
                    }
                })
                .collect();

            PreviewPage {
                id: page.id,
                title: page.title.clone(),
                widgets,
            }
        })
        .collect()
}

/// Keys of required widgets without an answer, across all pages
pub fn missing_required(pages: &[PreviewPage], answers: &Answers) -> Vec<AnswerKey> {
    pages
        .iter()
        .flat_map(|page| page.widgets.iter())
        .filter(|widget| widget.required)
        .filter_map(|widget| widget.key.clone())
        .filter(|key| answers.get(key).is_none_or(AnswerValue::is_empty))
        .collect()
}
