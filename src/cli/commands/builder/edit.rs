//! Draft editing commands

use super::{element_id, open_draft, save_draft};
use crate::builder::draft::image_data_url;
use crate::builder::resolver::{self, Selection};
use crate::builder::{
    ConditionalRequired, DataSource, DisplayCondition, Draft, Element, ElementType, MasterData,
    OptionLayout,
};
use crate::cli::app::AppContext;
use crate::cli::ui;
use anyhow::{Result, bail};
use std::path::{Path, PathBuf};

/// Load the draft, apply one change and cache the result
pub(super) async fn apply<F>(ctx: &mut AppContext, survey: &str, change: F) -> Result<()>
where
    F: FnOnce(&mut Draft) -> Result<String>,
{
    let mut draft = open_draft(ctx, survey).await?;
    let message = change(&mut draft)?;
    save_draft(ctx, &draft).await?;
    ui::success(message);
    Ok(())
}

async fn fetch_master(ctx: &mut AppContext) -> Result<MasterData> {
    let result = ctx.session.require_auth()?.master_data().await;
    ctx.settle(result).await
}

pub(super) fn add_page(draft: &mut Draft, at: Option<usize>) -> Result<String> {
    let id = match at {
        Some(position) => draft.insert_page(position)?,
        None => draft.add_page(),
    };
    Ok(format!("Added page {}", id))
}

pub(super) fn remove_page(draft: &mut Draft, page: usize) -> Result<String> {
    let removed = draft.remove_page(page)?;
    Ok(format!(
        "Removed '{}' with {} elements",
        removed.title,
        removed.elements.len()
    ))
}

pub(super) fn move_page(draft: &mut Draft, page: usize, to: usize) -> Result<String> {
    draft.move_page(page, to)?;
    Ok(format!("Moved page {} to position {}", page, to))
}

pub(super) fn rename_page(draft: &mut Draft, page: usize, title: String) -> Result<String> {
    let title = title.trim().to_string();
    if title.is_empty() {
        bail!("Page title cannot be empty");
    }
    draft.page_mut(page)?.title = title.clone();
    Ok(format!("Page {} is now '{}'", page, title))
}

pub(super) struct NewElement {
    pub page: usize,
    pub element_type: ElementType,
    pub title: Option<String>,
    pub required: bool,
    pub options: Vec<String>,
    pub source: Option<DataSource>,
    pub after_selection: bool,
}

fn build_element(new: NewElement) -> Result<Element> {
    let mut element = Element::new(new.element_type).required(new.required);
    if let Some(title) = new.title {
        element.title = title;
    }
    if !new.options.is_empty() {
        if new.element_type == ElementType::Rating {
            bail!("Use edit-element --scale for ratings");
        }
        element.options = new.options;
    }
    if new.after_selection {
        element.display_condition = DisplayCondition::AfterMappedSelection;
    }
    if new.source.is_some_and(|s| !s.is_manual()) && !new.element_type.is_selectable() {
        bail!(
            "Only choice, checkbox and dropdown elements take a data source, not {}",
            new.element_type.as_str()
        );
    }
    Ok(element)
}

pub(super) async fn add_element_command(ctx: &mut AppContext, survey: &str, new: NewElement) -> Result<()> {
    let page = new.page;
    let source = new.source;
    let mut element = build_element(new)?;
    if let Some(source) = source {
        let master = if source.is_manual() {
            MasterData::default()
        } else {
            fetch_master(ctx).await?
        };
        resolver::switch_data_source(&mut element, source, &master, &Selection::default());
    }

    apply(ctx, survey, |draft| {
        let id = draft.add_element(page, element)?;
        Ok(format!("Added element {} to page {}", id, page))
    })
    .await
}

pub(super) struct ElementChanges {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub required: Option<bool>,
    pub layout: Option<OptionLayout>,
    pub scale: Option<u8>,
    pub image: Option<PathBuf>,
}

pub(super) fn edit_element(draft: &mut Draft, raw_id: &str, changes: ElementChanges) -> Result<String> {
    let id = element_id(draft, raw_id);
    let element = draft.element_mut(&id)?;

    if let Some(title) = changes.title {
        element.title = title;
    }
    if let Some(subtitle) = changes.subtitle {
        element.subtitle = subtitle;
    }
    if let Some(required) = changes.required {
        element.required = required;
    }
    if let Some(layout) = changes.layout {
        if !element.element_type.has_layout() {
            bail!("{} elements have no option layout", element.element_type.as_str());
        }
        element.option_layout = layout;
    }
    if let Some(scale) = changes.scale {
        if element.element_type != ElementType::Rating {
            bail!("Only rating elements have a scale");
        }
        element.set_rating_scale(scale);
    }
    if let Some(path) = changes.image {
        if element.element_type != ElementType::Hero {
            bail!("Only hero elements carry a cover image");
        }
        element.image = Some(image_data_url(&path)?);
    }
    Ok(format!("Updated {}", id))
}

pub(super) fn remove_element(draft: &mut Draft, raw_id: &str) -> Result<String> {
    let id = element_id(draft, raw_id);
    let removed = draft.remove_element(&id)?;
    Ok(format!("Removed '{}'", removed.title))
}

pub(super) fn move_element(draft: &mut Draft, raw_id: &str, page: usize, index: Option<usize>) -> Result<String> {
    let id = element_id(draft, raw_id);
    draft.move_element(&id, page, index.unwrap_or(usize::MAX))?;
    Ok(format!("Moved {} to page {}", id, page))
}

pub(super) fn duplicate_element(draft: &mut Draft, raw_id: &str) -> Result<String> {
    let id = element_id(draft, raw_id);
    let copy = draft.duplicate_element(&id)?;
    Ok(format!("Copied {} as {}", id, copy))
}

pub(super) fn add_option(draft: &mut Draft, raw_id: &str, label: String) -> Result<String> {
    let id = element_id(draft, raw_id);
    draft.add_option(&id, label.clone())?;
    Ok(format!("Added option '{}' to {}", label, id))
}

pub(super) fn set_option(draft: &mut Draft, raw_id: &str, index: usize, label: String) -> Result<String> {
    let id = element_id(draft, raw_id);
    draft.set_option(&id, index, label.clone())?;
    Ok(format!("Option {} of {} is now '{}'", index, id, label))
}

pub(super) fn remove_option(draft: &mut Draft, raw_id: &str, index: usize) -> Result<String> {
    let id = element_id(draft, raw_id);
    if !draft.remove_option(&id, index)? {
        bail!("{} must keep at least one option", id);
    }
    Ok(format!("Removed option {} from {}", index, id))
}

pub(super) async fn set_source_command(
    ctx: &mut AppContext,
    survey: &str,
    raw_id: &str,
    source: DataSource,
) -> Result<()> {
    let master = if source.is_manual() {
        MasterData::default()
    } else {
        fetch_master(ctx).await?
    };

    apply(ctx, survey, |draft| {
        let id = element_id(draft, raw_id);
        let element = draft.element_mut(&id)?;
        if !element.element_type.is_selectable() {
            bail!("{} elements have no data source", element.element_type.as_str());
        }
        resolver::switch_data_source(element, source, &master, &Selection::default());
        Ok(format!(
            "{} now takes options from {} ({} options)",
            id,
            source.as_str(),
            element.options.len()
        ))
    })
    .await
}

pub(super) fn require_when(draft: &mut Draft, raw_id: &str, rating: Option<&str>, threshold: u8) -> Result<String> {
    let id = element_id(draft, raw_id);
    let Some(rating) = rating else {
        draft.element_mut(&id)?.conditional_required = None;
        return Ok(format!("Cleared the requirement rule of {}", id));
    };

    let rating_id = element_id(draft, rating);
    if rating_id == id {
        bail!("An element cannot depend on itself");
    }
    if draft.element(&rating_id)?.element_type != ElementType::Rating {
        bail!("{} is not a rating element", rating_id);
    }

    let rule = ConditionalRequired::new(rating_id.clone(), threshold);
    let message = format!(
        "{} is required for ratings of {} from 1 to {}",
        id,
        rating_id,
        rule.threshold.saturating_sub(1)
    );
    draft.element_mut(&id)?.conditional_required = Some(rule);
    Ok(message)
}

pub(super) struct MetaChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub target_respondents: Option<u32>,
    pub target_score: Option<u32>,
}

pub(super) fn update_meta(draft: &mut Draft, changes: MetaChanges) -> Result<String> {
    if let Some(title) = changes.title {
        if title.trim().is_empty() {
            bail!("Survey title cannot be empty");
        }
        draft.meta.title = title;
    }
    if let Some(description) = changes.description {
        draft.meta.description = description;
    }
    if changes.target_respondents.is_some() {
        draft.meta.target_respondents = changes.target_respondents;
    }
    if let Some(score) = changes.target_score {
        if score > 100 {
            bail!("Target score must be between 0 and 100");
        }
        draft.meta.target_score = Some(score);
    }
    Ok(format!("Updated details of '{}'", draft.meta.title))
}

pub(super) fn update_style(
    draft: &mut Draft,
    logo: Option<&Path>,
    background: Option<&Path>,
    font: Option<String>,
) -> Result<String> {
    if let Some(path) = logo {
        draft.style.logo = Some(image_data_url(path)?);
    }
    if let Some(path) = background {
        draft.style.background = Some(image_data_url(path)?);
    }
    if let Some(font) = font {
        draft.style.font_family = font;
    }
    Ok("Updated survey style".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ElementId;

    fn draft() -> Draft {
        let mut draft = Draft::new("s1", "Survey");
        draft
            .add_element(1, Element::with_id(ElementId::new("rate"), ElementType::Rating))
            .unwrap();
        draft
            .add_element(1, Element::with_id(ElementId::new("why"), ElementType::Text))
            .unwrap();
        draft
    }

    #[test]
    fn test_require_when_sets_and_clears_rule() {
        let mut draft = draft();
        require_when(&mut draft, "why", Some("rate"), 7).unwrap();
        let rule = draft.element(&ElementId::new("why")).unwrap().conditional_required.clone();
        assert_eq!(rule, Some(ConditionalRequired::new(ElementId::new("rate"), 7)));

        require_when(&mut draft, "why", None, 7).unwrap();
        assert!(draft.element(&ElementId::new("why")).unwrap().conditional_required.is_none());
    }

    #[test]
    fn test_require_when_needs_rating_source() {
        let mut draft = draft();
        assert!(require_when(&mut draft, "rate", Some("why"), 7).is_err());
        assert!(require_when(&mut draft, "why", Some("why"), 7).is_err());
    }

    #[test]
    fn test_data_source_only_for_selectable() {
        let new = NewElement {
            page: 1,
            element_type: ElementType::Text,
            title: None,
            required: false,
            options: Vec::new(),
            source: Some(DataSource::Department),
            after_selection: false,
        };
        assert!(build_element(new).is_err());
    }

    #[test]
    fn test_page_edits() {
        let mut draft = draft();
        add_page(&mut draft, None).unwrap();
        add_page(&mut draft, Some(1)).unwrap();
        assert_eq!(draft.pages.len(), 3);
        assert_eq!(draft.pages[1].elements.len(), 2);
        rename_page(&mut draft, 3, "Closing".to_string()).unwrap();
        assert!(rename_page(&mut draft, 3, " ".to_string()).is_err());
        move_page(&mut draft, 3, 1).unwrap();
        assert_eq!(draft.pages[0].title, "Closing");
    }
}
