//! Master-data endpoints: business units, divisions, departments,
//! functions, applications and the application mappings

use super::client::{ApiResult, SurveyClient};
use super::constants::paths;
use super::error::ApiError;
use super::models::{Application, BusinessUnit, Department, Division, Function, MasterDataKind};
use crate::builder::MasterData;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

impl SurveyClient {
    pub async fn list_master<T: DeserializeOwned>(&self, kind: MasterDataKind) -> ApiResult<Vec<T>> {
        self.get(kind.path(), &[]).await
    }

    /// Create a record with a name and, for nested collections, a parent id
    pub async fn create_master(
        &self,
        kind: MasterDataKind,
        name: &str,
        parent_id: Option<&str>,
    ) -> ApiResult<Value> {
        let body = master_body(kind, name, parent_id, true)?;
        log::info!("Creating {} '{}'", kind.path(), name);
        self.post(kind.path(), &body).await
    }

    pub async fn update_master(
        &self,
        kind: MasterDataKind,
        id: &str,
        name: &str,
        active: bool,
    ) -> ApiResult<Value> {
        let body = master_body(kind, name, None, active)?;
        self.put(&format!("{}/{}", kind.path(), id), &body).await
    }

    pub async fn delete_master(&self, kind: MasterDataKind, id: &str) -> ApiResult<()> {
        log::info!("Deleting {} {}", kind.path(), id);
        self.delete(&format!("{}/{}", kind.path(), id)).await
    }

    pub async fn business_units(&self) -> ApiResult<Vec<BusinessUnit>> {
        self.list_master(MasterDataKind::BusinessUnits).await
    }

    pub async fn divisions(&self) -> ApiResult<Vec<Division>> {
        self.list_master(MasterDataKind::Divisions).await
    }

    pub async fn departments(&self) -> ApiResult<Vec<Department>> {
        self.list_master(MasterDataKind::Departments).await
    }

    pub async fn functions(&self) -> ApiResult<Vec<Function>> {
        self.list_master(MasterDataKind::Functions).await
    }

    pub async fn applications(&self) -> ApiResult<Vec<Application>> {
        self.list_master(MasterDataKind::Applications).await
    }

    /// Fetch the four reference tables used by the option resolver
    pub async fn master_data(&self) -> ApiResult<MasterData> {
        Ok(MasterData {
            business_units: self.business_units().await?,
            divisions: self.divisions().await?,
            departments: self.departments().await?,
            functions: self.functions().await?,
        })
    }

    /// Application names mapped to a department
    pub async fn applications_for_department(&self, department: &str) -> ApiResult<Vec<String>> {
        self.mapped_applications(paths::MAPPED_BY_DEPARTMENT, "department", department)
            .await
    }

    /// Application names mapped to a function
    pub async fn applications_for_function(&self, function: &str) -> ApiResult<Vec<String>> {
        self.mapped_applications(paths::MAPPED_BY_FUNCTION, "function", function)
            .await
    }

    async fn mapped_applications(&self, path: &str, key: &str, value: &str) -> ApiResult<Vec<String>> {
        if value.trim().is_empty() {
            return Ok(Vec::new());
        }
        let records: Vec<Value> = self.get(path, &[(key, value)]).await?;
        Ok(application_names(&records))
    }
}

fn master_body(
    kind: MasterDataKind,
    name: &str,
    parent_id: Option<&str>,
    active: bool,
) -> ApiResult<Value> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::validation("Name is required"));
    }

    let mut body = Map::new();
    body.insert("Name".to_string(), json!(name));
    body.insert("IsActive".to_string(), json!(active));
    if let (Some(field), Some(parent)) = (kind.parent_field(), parent_id) {
        body.insert(field.to_string(), json!(parent));
    }
    Ok(Value::Object(body))
}

/// Mapping lookups return either plain names or application records
fn application_names(records: &[Value]) -> Vec<String> {
    records
        .iter()
        .filter_map(|record| match record {
            Value::String(name) => Some(name.clone()),
            Value::Object(map) => map
                .get("Name")
                .or_else(|| map.get("ApplicationName"))
                .or_else(|| map.get("name"))
                .and_then(|n| n.as_str())
                .map(str::to_string),
            _ => None,
        })
        .filter(|name| !name.trim().is_empty())
        .collect()
}
