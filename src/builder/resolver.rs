//! Master-data option resolution
//!
//! Each [`DataSource`] has exactly one resolution arm. The output is always
//! deduplicated case-insensitively, keeping the first casing seen.

use super::element::{DataSource, Element};
use crate::api::models::{BusinessUnit, Department, Division, Function};
use std::collections::{HashMap, HashSet};

/// Reference tables fetched from the backend
#[derive(Debug, Clone, Default)]
pub struct MasterData {
    pub business_units: Vec<BusinessUnit>,
    pub divisions: Vec<Division>,
    pub departments: Vec<Department>,
    pub functions: Vec<Function>,
}

/// Upstream selections that narrow dependent option lists.
/// Selections hold option labels as a respondent would pick them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub business_unit: Option<String>,
    pub division: Option<String>,
    pub department: Option<String>,
    pub function: Option<String>,
    /// Applications fetched for the current department
    pub department_applications: Vec<String>,
    /// Applications fetched for the current function
    pub function_applications: Vec<String>,
}

impl MasterData {
    fn business_unit_by_name(&self, name: &str) -> Option<&BusinessUnit> {
        self.business_units
            .iter()
            .find(|bu| bu.name.eq_ignore_ascii_case(name.trim()))
    }

    fn division_by_id(&self, id: &str) -> Option<&Division> {
        self.divisions.iter().find(|d| d.id == id)
    }

    /// Active divisions, narrowed to a business unit when one is selected
    fn visible_divisions(&self, selection: &Selection) -> Vec<&Division> {
        let business_unit = selection
            .business_unit
            .as_deref()
            .filter(|name| !name.trim().is_empty());

        let bu_id = match business_unit {
            Some(name) => match self.business_unit_by_name(name) {
                Some(bu) => Some(bu.id.as_str()),
                None => return Vec::new(),
            },
            None => None,
        };

        self.divisions
            .iter()
            .filter(|d| d.is_active)
            .filter(|d| bu_id.is_none_or(|id| d.business_unit_id.as_deref() == Some(id)))
            .collect()
    }

    /// Resolve a department label back to its record. Labels may carry a
    /// "(Division)" suffix when the plain name is ambiguous.
    pub fn department_by_label(&self, label: &str) -> Option<&Department> {
        let label = label.trim();
        self.departments.iter().find(|dept| {
            if dept.name.eq_ignore_ascii_case(label) {
                return true;
            }
            dept.division_id
                .as_deref()
                .and_then(|id| self.division_by_id(id))
                .is_some_and(|division| {
                    format!("{} ({})", dept.name, division.name).eq_ignore_ascii_case(label)
                })
        })
    }

    fn department_labels(&self, selection: &Selection) -> Vec<String> {
        let mut divisions = self.visible_divisions(selection);
        if let Some(selected) = selection
            .division
            .as_deref()
            .filter(|name| !name.trim().is_empty())
        {
            divisions.retain(|d| d.name.eq_ignore_ascii_case(selected.trim()));
        }

        let division_names: HashMap<&str, &str> = divisions
            .iter()
            .map(|d| (d.id.as_str(), d.name.as_str()))
            .collect();

        let departments: Vec<(&Department, &str)> = self
            .departments
            .iter()
            .filter(|dept| dept.is_active)
            .filter_map(|dept| {
                let division_id = dept.division_id.as_deref()?;
                division_names.get(division_id).map(|name| (dept, *name))
            })
            .collect();

        // Names shared by departments of different divisions need a suffix
        let mut divisions_per_name: HashMap<String, HashSet<&str>> = HashMap::new();
        for (dept, division) in &departments {
            divisions_per_name
                .entry(dept.name.to_lowercase())
                .or_default()
                .insert(*division);
        }

        departments
            .into_iter()
            .map(|(dept, division)| {
                let ambiguous = divisions_per_name
                    .get(&dept.name.to_lowercase())
                    .is_some_and(|set| set.len() > 1);
                if ambiguous {
                    format!("{} ({})", dept.name, division)
                } else {
                    dept.name.clone()
                }
            })
            .collect()
    }
}

/// Concrete option list for an element in the current selection context
pub fn resolve_options(element: &Element, master: &MasterData, selection: &Selection) -> Vec<String> {
    let resolved = match element.data_source {
        DataSource::Manual => element.options.clone(),
        DataSource::Bu => master
            .business_units
            .iter()
            .filter(|bu| bu.is_active)
            .map(|bu| bu.name.clone())
            .collect(),
        DataSource::Division => master
            .visible_divisions(selection)
            .into_iter()
            .map(|d| d.name.clone())
            .collect(),
        DataSource::Department => master.department_labels(selection),
        DataSource::Function => master
            .functions
            .iter()
            .filter(|f| f.is_active)
            .map(|f| f.name.clone())
            .collect(),
        DataSource::AppDepartment => mapped_applications(
            element,
            selection.department.as_deref(),
            &selection.department_applications,
        ),
        DataSource::AppFunction => mapped_applications(
            element,
            selection.function.as_deref(),
            &selection.function_applications,
        ),
    };

    dedupe_case_insensitive(resolved)
}

fn mapped_applications(element: &Element, upstream: Option<&str>, fetched: &[String]) -> Vec<String> {
    if upstream.is_none_or(|value| value.trim().is_empty()) {
        return Vec::new();
    }
    if fetched.is_empty() {
        element.options.clone()
    } else {
        fetched.to_vec()
    }
}

/// Switch an element's data source and refresh its options right away.
/// Options are left untouched when nothing resolves, so a selectable
/// element never ends up without options.
pub fn switch_data_source(
    element: &mut Element,
    data_source: DataSource,
    master: &MasterData,
    selection: &Selection,
) {
    log::debug!("Switching '{}' to data source {}", element.id, data_source.as_str());
    element.data_source = data_source;
    if !element.element_type.is_selectable() {
        return;
    }

    let resolved = resolve_options(element, master, selection);
    if !resolved.is_empty() {
        element.options = resolved;
    }
}

/// Drop case-insensitive duplicates, keeping first casing and order
pub fn dedupe_case_insensitive<I>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|value| seen.insert(value.to_lowercase()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::element::ElementType;

    fn bu(id: &str, name: &str) -> BusinessUnit {
        BusinessUnit {
            id: id.to_string(),
            name: name.to_string(),
            is_active: true,
        }
    }

    fn division(id: &str, bu: &str, name: &str) -> Division {
        Division {
            id: id.to_string(),
            business_unit_id: Some(bu.to_string()),
            name: name.to_string(),
            is_active: true,
        }
    }

    fn department(id: &str, division: &str, name: &str) -> Department {
        Department {
            id: id.to_string(),
            division_id: Some(division.to_string()),
            name: name.to_string(),
            is_active: true,
        }
    }

    fn master() -> MasterData {
        MasterData {
            business_units: vec![bu("1", "Retail"), bu("2", "Wholesale")],
            divisions: vec![
                division("10", "1", "North"),
                division("11", "1", "South"),
                division("20", "2", "Export"),
            ],
            departments: vec![
                department("100", "10", "Finance"),
                department("101", "11", "Finance"),
                department("102", "11", "Marketing"),
                department("200", "20", "Logistics"),
            ],
            functions: vec![Function {
                id: "f1".to_string(),
                name: "Audit".to_string(),
                is_active: true,
            }],
        }
    }

    fn selection_with_bu(name: &str) -> Selection {
        Selection {
            business_unit: Some(name.to_string()),
            ..Selection::default()
        }
    }

    #[test]
    fn test_department_names_are_disambiguated() {
        let element = Element::new(ElementType::Dropdown).with_data_source(DataSource::Department);
        let options = resolve_options(&element, &master(), &selection_with_bu("Retail"));
        assert_eq!(
            options,
            vec!["Finance (North)", "Finance (South)", "Marketing"]
        );
    }

    #[test]
    fn test_selected_division_narrows_departments() {
        let element = Element::new(ElementType::Dropdown).with_data_source(DataSource::Department);
        let mut selection = selection_with_bu("Retail");
        selection.division = Some("South".to_string());
        let options = resolve_options(&element, &master(), &selection);
        assert_eq!(options, vec!["Finance", "Marketing"]);
    }

    #[test]
    fn test_divisions_follow_business_unit() {
        let element = Element::new(ElementType::Choice).with_data_source(DataSource::Division);
        let data = master();
        assert_eq!(
            resolve_options(&element, &data, &selection_with_bu("wholesale")),
            vec!["Export"]
        );
        assert_eq!(
            resolve_options(&element, &data, &Selection::default()),
            vec!["North", "South", "Export"]
        );
        assert!(resolve_options(&element, &data, &selection_with_bu("Unknown")).is_empty());
    }

    #[test]
    fn test_inactive_entries_are_skipped() {
        let mut data = master();
        data.business_units[1].is_active = false;
        let element = Element::new(ElementType::Dropdown).with_data_source(DataSource::Bu);
        assert_eq!(resolve_options(&element, &data, &Selection::default()), vec!["Retail"]);
    }

    #[test]
    fn test_mapped_applications_fallback() {
        let element = Element::new(ElementType::Checkbox)
            .with_options(["Static App"])
            .with_data_source(DataSource::AppDepartment);
        let data = master();

        assert!(resolve_options(&element, &data, &Selection::default()).is_empty());

        let mut selection = Selection {
            department: Some("Finance".to_string()),
            ..Selection::default()
        };
        assert_eq!(resolve_options(&element, &data, &selection), vec!["Static App"]);

        selection.department_applications = vec!["CRM".to_string(), "crm".to_string(), "ERP".to_string()];
        assert_eq!(resolve_options(&element, &data, &selection), vec!["CRM", "ERP"]);
    }

    #[test]
    fn test_switch_data_source_overwrites_options() {
        let mut element = Element::new(ElementType::Dropdown);
        let data = master();
        switch_data_source(&mut element, DataSource::Bu, &data, &Selection::default());
        assert_eq!(element.options, vec!["Retail", "Wholesale"]);
        assert!(!element.options_editable());

        // Nothing resolves yet: existing options stay in place
        switch_data_source(&mut element, DataSource::AppFunction, &data, &Selection::default());
        assert_eq!(element.options, vec!["Retail", "Wholesale"]);
    }

    #[test]
    fn test_department_label_lookup() {
        let data = master();
        assert_eq!(data.department_by_label("Finance (South)").unwrap().id, "101");
        assert_eq!(data.department_by_label("marketing").unwrap().id, "102");
        assert!(data.department_by_label("Legal").is_none());
    }

    #[test]
    fn test_dedupe_keeps_first_casing() {
        let values = vec!["Alpha".to_string(), "ALPHA".to_string(), "beta".to_string()];
        assert_eq!(dedupe_case_insensitive(values), vec!["Alpha", "beta"]);
    }
}
