//! Draft and page model
//!
//! Page ids are always the contiguous sequence 1..N. Every structural edit
//! ends with [`Draft::renumber_pages`], which also moves auto titles along
//! with their page.

use super::BuilderError;
use super::element::{Element, ElementId};
use anyhow::{Context, Result};
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

pub fn auto_page_title(id: usize) -> String {
    format!("Page {}", id)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: usize,
    pub title: String,
    #[serde(default)]
    pub elements: Vec<Element>,
}

impl Page {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            title: auto_page_title(id),
            elements: Vec::new(),
        }
    }

    /// Whether the title is the generated one for the page's current id
    pub fn has_auto_title(&self) -> bool {
        self.title == auto_page_title(self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ScheduleWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, BuilderError> {
        if end <= start {
            return Err(BuilderError::InvalidSchedule);
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at <= self.end
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyMeta {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub target_respondents: Option<u32>,
    #[serde(default)]
    pub target_score: Option<u32>,
    #[serde(default)]
    pub schedule: Option<ScheduleWindow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleSettings {
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub background: Option<String>,
    #[serde(default = "default_font_family")]
    pub font_family: String,
}

fn default_font_family() -> String {
    "Inter".to_string()
}

impl Default for StyleSettings {
    fn default() -> Self {
        Self {
            logo: None,
            background: None,
            font_family: default_font_family(),
        }
    }
}

/// Inline an image file as a data URL
pub fn image_data_url(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read image: {}", path.display()))?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    let mime = match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        other => anyhow::bail!("Unsupported image type: '{}'", other),
    };

    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    Ok(format!("data:{};base64,{}", mime, encoded))
}

/// The editable unit of a builder session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub survey_id: String,
    pub meta: SurveyMeta,
    pub pages: Vec<Page>,
    #[serde(default)]
    pub style: StyleSettings,
}

impl Draft {
    pub fn new(survey_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            survey_id: survey_id.into(),
            meta: SurveyMeta {
                title: title.into(),
                ..SurveyMeta::default()
            },
            pages: vec![Page::new(1)],
            style: StyleSettings::default(),
        }
    }

    // Page operations

    pub fn page(&self, page_id: usize) -> Result<&Page, BuilderError> {
        page_id
            .checked_sub(1)
            .and_then(|index| self.pages.get(index))
            .ok_or(BuilderError::PageNotFound(page_id))
    }

    pub fn page_mut(&mut self, page_id: usize) -> Result<&mut Page, BuilderError> {
        page_id
            .checked_sub(1)
            .and_then(|index| self.pages.get_mut(index))
            .ok_or(BuilderError::PageNotFound(page_id))
    }

    /// Append an empty page and return its id
    pub fn add_page(&mut self) -> usize {
        let id = self.pages.len() + 1;
        self.pages.push(Page::new(id));
        id
    }

    /// Insert an empty page so that it gets id `page_id`
    pub fn insert_page(&mut self, page_id: usize) -> Result<usize, BuilderError> {
        if page_id == 0 || page_id > self.pages.len() + 1 {
            return Err(BuilderError::PageNotFound(page_id));
        }
        self.pages.insert(page_id - 1, Page::new(page_id));
        self.renumber_pages();
        Ok(page_id)
    }

    pub fn remove_page(&mut self, page_id: usize) -> Result<Page, BuilderError> {
        self.page(page_id)?;
        if self.pages.len() == 1 {
            return Err(BuilderError::LastPage);
        }
        let removed = self.pages.remove(page_id - 1);

        let removed_ids: HashSet<&ElementId> = removed.elements.iter().map(|e| &e.id).collect();
        self.clear_references(|source| removed_ids.contains(source));
        self.renumber_pages();
        Ok(removed)
    }

    /// Move a page so that it ends up with id `new_position`
    pub fn move_page(&mut self, page_id: usize, new_position: usize) -> Result<(), BuilderError> {
        self.page(page_id)?;
        if new_position == 0 || new_position > self.pages.len() {
            return Err(BuilderError::PageNotFound(new_position));
        }
        let page = self.pages.remove(page_id - 1);
        self.pages.insert(new_position - 1, page);
        self.renumber_pages();
        Ok(())
    }

    /// Reassign ids 1..N by position; auto titles follow the new id
    pub fn renumber_pages(&mut self) {
        for (index, page) in self.pages.iter_mut().enumerate() {
            let id = index + 1;
            if page.has_auto_title() {
                page.title = auto_page_title(id);
            }
            page.id = id;
        }
    }

    // Element operations

    pub fn add_element(&mut self, page_id: usize, element: Element) -> Result<ElementId, BuilderError> {
        let id = element.id.clone();
        self.page_mut(page_id)?.elements.push(element);
        Ok(id)
    }

    pub fn insert_element(
        &mut self,
        page_id: usize,
        index: usize,
        element: Element,
    ) -> Result<ElementId, BuilderError> {
        let id = element.id.clone();
        let page = self.page_mut(page_id)?;
        let index = index.min(page.elements.len());
        page.elements.insert(index, element);
        Ok(id)
    }

    /// Page id and index of an element
    pub fn locate(&self, id: &ElementId) -> Option<(usize, usize)> {
        self.pages.iter().find_map(|page| {
            page.elements
                .iter()
                .position(|e| &e.id == id)
                .map(|index| (page.id, index))
        })
    }

    pub fn element(&self, id: &ElementId) -> Result<&Element, BuilderError> {
        self.elements()
            .map(|(_, _, element)| element)
            .find(|e| &e.id == id)
            .ok_or_else(|| BuilderError::ElementNotFound(id.clone()))
    }

    pub fn element_mut(&mut self, id: &ElementId) -> Result<&mut Element, BuilderError> {
        self.pages
            .iter_mut()
            .flat_map(|page| page.elements.iter_mut())
            .find(|e| &e.id == id)
            .ok_or_else(|| BuilderError::ElementNotFound(id.clone()))
    }

    /// Remove an element and drop rules that referenced it
    pub fn remove_element(&mut self, id: &ElementId) -> Result<Element, BuilderError> {
        let (page_id, index) = self
            .locate(id)
            .ok_or_else(|| BuilderError::ElementNotFound(id.clone()))?;
        let removed = self.page_mut(page_id)?.elements.remove(index);
        self.clear_references(|source| source == id);
        Ok(removed)
    }

    pub fn move_element(
        &mut self,
        id: &ElementId,
        page_id: usize,
        index: usize,
    ) -> Result<(), BuilderError> {
        self.page(page_id)?;
        let (from_page, from_index) = self
            .locate(id)
            .ok_or_else(|| BuilderError::ElementNotFound(id.clone()))?;
        let element = self.page_mut(from_page)?.elements.remove(from_index);
        let target = self.page_mut(page_id)?;
        let index = index.min(target.elements.len());
        target.elements.insert(index, element);
        Ok(())
    }

    /// Copy an element right after itself under a fresh id
    pub fn duplicate_element(&mut self, id: &ElementId) -> Result<ElementId, BuilderError> {
        let (page_id, index) = self
            .locate(id)
            .ok_or_else(|| BuilderError::ElementNotFound(id.clone()))?;
        let mut copy = self.page(page_id)?.elements[index].clone();
        copy.id = ElementId::temporary();
        let new_id = copy.id.clone();
        self.page_mut(page_id)?.elements.insert(index + 1, copy);
        Ok(new_id)
    }

    /// Flattened (page id, order within page, element) sequence
    pub fn elements(&self) -> impl Iterator<Item = (usize, usize, &Element)> {
        self.pages.iter().flat_map(|page| {
            page.elements
                .iter()
                .enumerate()
                .map(move |(order, element)| (page.id, order, element))
        })
    }

    pub fn element_count(&self) -> usize {
        self.pages.iter().map(|p| p.elements.len()).sum()
    }

    // Option editing

    pub fn add_option(&mut self, id: &ElementId, label: impl Into<String>) -> Result<(), BuilderError> {
        let element = self.editable_options(id)?;
        element.options.push(label.into());
        Ok(())
    }

    pub fn set_option(
        &mut self,
        id: &ElementId,
        index: usize,
        label: impl Into<String>,
    ) -> Result<(), BuilderError> {
        let element = self.editable_options(id)?;
        let slot = element
            .options
            .get_mut(index)
            .ok_or_else(|| BuilderError::OptionOutOfRange { id: id.clone(), index })?;
        *slot = label.into();
        Ok(())
    }

    /// Remove an option; removing the last remaining option does nothing.
    /// Returns whether an option was removed.
    pub fn remove_option(&mut self, id: &ElementId, index: usize) -> Result<bool, BuilderError> {
        let element = self.editable_options(id)?;
        if index >= element.options.len() {
            return Err(BuilderError::OptionOutOfRange { id: id.clone(), index });
        }
        if element.options.len() == 1 {
            return Ok(false);
        }
        element.options.remove(index);
        Ok(true)
    }

    fn editable_options(&mut self, id: &ElementId) -> Result<&mut Element, BuilderError> {
        let element = self.element_mut(id)?;
        if !element.options_editable() {
            return Err(BuilderError::ManagedOptions(id.clone()));
        }
        Ok(element)
    }

    // Identity maintenance

    /// Give every later duplicate id a fresh temporary id.
    /// First occurrences keep their id so rule references stay valid.
    /// Returns the (old, new) pairs that were assigned.
    pub fn normalize_ids(&mut self) -> Vec<(ElementId, ElementId)> {
        let mut seen = HashSet::new();
        let mut repaired = Vec::new();

        for element in self.pages.iter_mut().flat_map(|p| p.elements.iter_mut()) {
            if !seen.insert(element.id.clone()) {
                let fresh = ElementId::temporary();
                log::warn!("Duplicate element id '{}' reassigned to '{}'", element.id, fresh);
                repaired.push((element.id.clone(), fresh.clone()));
                element.id = fresh.clone();
                seen.insert(fresh);
            }
        }

        repaired
    }

    /// Rename an element and every rule that points at it
    pub fn remap_id(&mut self, old: &ElementId, new: &ElementId) {
        for element in self.pages.iter_mut().flat_map(|p| p.elements.iter_mut()) {
            if &element.id == old {
                element.id = new.clone();
            }
            if let Some(rule) = element.conditional_required.as_mut() {
                if &rule.source_id == old {
                    rule.source_id = new.clone();
                }
            }
        }
    }

    fn clear_references(&mut self, is_gone: impl Fn(&ElementId) -> bool) {
        for element in self.pages.iter_mut().flat_map(|p| p.elements.iter_mut()) {
            if element
                .conditional_required
                .as_ref()
                .is_some_and(|rule| is_gone(&rule.source_id))
            {
                element.conditional_required = None;
            }
        }
    }
}
