//! Seed content for surveys that predate the builder

use super::draft::Draft;
use super::element::{DataSource, DisplayCondition, Element, ElementType};

/// Whether `title` contains one of the configured fragments, ignoring case
pub fn matches_legacy_title(title: &str, fragments: &[String]) -> bool {
    let title = title.to_lowercase();
    fragments
        .iter()
        .map(|fragment| fragment.trim().to_lowercase())
        .filter(|fragment| !fragment.is_empty())
        .any(|fragment| title.contains(&fragment))
}

/// Application satisfaction survey: respondent details, a mapped
/// application selector with a rating per application, and a follow-up
/// that becomes required for low ratings.
pub fn legacy_template(survey_id: &str, title: &str) -> Draft {
    let mut draft = Draft::new(survey_id, title);
    draft.meta.description = "Tell us how the applications you use every day are working for you.".to_string();

    let intro = [
        Element::new(ElementType::Hero).titled(title),
        Element::new(ElementType::Dropdown)
            .titled("Business unit")
            .required(true)
            .with_data_source(DataSource::Bu),
        Element::new(ElementType::Dropdown)
            .titled("Division")
            .required(true)
            .with_data_source(DataSource::Division),
        Element::new(ElementType::Dropdown)
            .titled("Department")
            .required(true)
            .with_data_source(DataSource::Department),
    ];
    for element in intro {
        draft.pages[0].elements.push(element);
    }

    let applications_page = draft.add_page();
    draft.pages[applications_page - 1].title = "Applications".to_string();

    let selector = Element::new(ElementType::Checkbox)
        .titled("Which applications do you use?")
        .required(true)
        .with_data_source(DataSource::AppDepartment);
    let rating = Element::new(ElementType::Rating)
        .titled("How satisfied are you with this application?")
        .required(true)
        .with_display_condition(DisplayCondition::AfterMappedSelection);
    let follow_up = Element::new(ElementType::Text)
        .titled("What should be improved?")
        .with_display_condition(DisplayCondition::AfterMappedSelection)
        .with_conditional_required(rating.id.clone(), 7);
    draft.pages[applications_page - 1]
        .elements
        .extend([selector, rating, follow_up]);

    let closing_page = draft.add_page();
    draft.pages[closing_page - 1].elements.push(
        Element::new(ElementType::Text).titled("Anything else you would like to share?"),
    );

    draft
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::evaluator::mapped_selector;

    #[test]
    fn test_title_matching() {
        let fragments = vec!["App Satisfaction".to_string(), "  ".to_string()];
        assert!(matches_legacy_title("2025 app satisfaction survey", &fragments));
        assert!(!matches_legacy_title("Engagement pulse", &fragments));
        assert!(!matches_legacy_title("anything", &[]));
    }

    #[test]
    fn test_template_shape() {
        let draft = legacy_template("7", "App Satisfaction");
        assert_eq!(draft.pages.len(), 3);
        assert_eq!(draft.pages[1].title, "Applications");
        assert_eq!(draft.pages[2].title, "Page 3");

        let page = &draft.pages[1];
        assert_eq!(mapped_selector(&page.elements), Some(0));
        let rule = page.elements[2].conditional_required.as_ref().unwrap();
        assert_eq!(rule.source_id, page.elements[1].id);
        assert_eq!(rule.threshold, 7);
    }
}
