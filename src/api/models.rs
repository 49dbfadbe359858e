//! Wire models for the survey backend

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Envelope wrapped around every backend response
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub details: Option<Value>,
}

impl ApiEnvelope {
    /// Best available human readable failure message
    pub fn failure_message(&self) -> Option<String> {
        self.error
            .clone()
            .filter(|e| !e.trim().is_empty())
            .or_else(|| self.message.clone())
    }
}

/// Backend ids arrive as numbers or strings; both become strings
pub fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("invalid id: {}", other))),
    }
}

fn optional_id_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!("invalid id: {}", other))),
    }
}

fn default_true() -> bool {
    true
}

// Auth

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(deserialize_with = "id_string", alias = "UserId", alias = "userId")]
    pub id: String,
    #[serde(alias = "Email")]
    pub email: String,
    #[serde(default, alias = "Name", alias = "FullName")]
    pub name: String,
    #[serde(default, alias = "Role")]
    pub role: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(alias = "accessToken", alias = "token")]
    pub access_token: String,
    #[serde(default, alias = "refreshToken")]
    pub refresh_token: Option<String>,
    pub user: UserProfile,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshResponse {
    #[serde(alias = "accessToken", alias = "token")]
    pub access_token: String,
    #[serde(default, alias = "refreshToken")]
    pub refresh_token: Option<String>,
}

// Events

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Draft,
    Scheduled,
    Active,
    Closed,
    #[serde(other)]
    Unknown,
}

impl EventStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Scheduled => "scheduled",
            Self::Active => "active",
            Self::Closed => "closed",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(deserialize_with = "id_string", alias = "EventId", alias = "SurveyId")]
    pub id: String,
    #[serde(alias = "Title")]
    pub title: String,
    #[serde(default, alias = "Description")]
    pub description: Option<String>,
    #[serde(default = "default_status", alias = "Status")]
    pub status: EventStatus,
    #[serde(default, alias = "StartDate")]
    pub start_date: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default, alias = "EndDate")]
    pub end_date: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default, alias = "TargetRespondents")]
    pub target_respondents: Option<u32>,
    #[serde(default, alias = "TargetScore")]
    pub target_score: Option<u32>,
    #[serde(default, alias = "ResponseCount")]
    pub response_count: u32,
}

fn default_status() -> EventStatus {
    EventStatus::Draft
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct EventInput {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_respondents: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_score: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QrCode {
    pub url: String,
    /// PNG image as a data URL
    #[serde(default)]
    pub image: Option<String>,
}

// Questions

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    #[serde(deserialize_with = "id_string", alias = "QuestionId", alias = "question_id")]
    pub id: String,
    #[serde(alias = "QuestionType", alias = "type")]
    pub question_type: String,
    #[serde(default, alias = "Title")]
    pub title: String,
    #[serde(default, alias = "Subtitle")]
    pub subtitle: Option<String>,
    #[serde(default, alias = "Required", alias = "is_required")]
    pub required: bool,
    #[serde(default = "first_page", alias = "PageNumber")]
    pub page_number: usize,
    #[serde(default, alias = "Order", alias = "question_order")]
    pub order: usize,
    #[serde(default, alias = "Options")]
    pub options: Option<Value>,
}

fn first_page() -> usize {
    1
}

// Master data

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BusinessUnit {
    #[serde(rename = "BusinessUnitId", alias = "Id", deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Division {
    #[serde(rename = "DivisionId", alias = "Id", deserialize_with = "id_string")]
    pub id: String,
    #[serde(default, deserialize_with = "optional_id_string")]
    pub business_unit_id: Option<String>,
    pub name: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Department {
    #[serde(rename = "DepartmentId", alias = "Id", deserialize_with = "id_string")]
    pub id: String,
    #[serde(default, deserialize_with = "optional_id_string")]
    pub division_id: Option<String>,
    pub name: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Function {
    #[serde(rename = "FunctionId", alias = "Id", deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Application {
    #[serde(rename = "ApplicationId", alias = "Id", deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Master-data collections managed through the generic CRUD endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum MasterDataKind {
    BusinessUnits,
    Divisions,
    Departments,
    Functions,
    Applications,
}

impl MasterDataKind {
    pub fn path(self) -> &'static str {
        match self {
            Self::BusinessUnits => "business-units",
            Self::Divisions => "divisions",
            Self::Departments => "departments",
            Self::Functions => "functions",
            Self::Applications => "applications",
        }
    }

    /// Field on a record that links it to its parent collection
    pub fn parent_field(self) -> Option<&'static str> {
        match self {
            Self::Divisions => Some("BusinessUnitId"),
            Self::Departments => Some("DivisionId"),
            _ => None,
        }
    }
}

// Users

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(deserialize_with = "id_string", alias = "UserId")]
    pub id: String,
    #[serde(alias = "Email")]
    pub email: String,
    #[serde(default, alias = "Name", alias = "FullName")]
    pub name: String,
    #[serde(default, alias = "Role")]
    pub role: String,
    #[serde(default, alias = "Department")]
    pub department: Option<String>,
    #[serde(default = "default_true", alias = "IsActive")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UserInput {
    pub email: String,
    pub name: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImportSummary {
    #[serde(default)]
    pub created: u32,
    #[serde(default)]
    pub updated: u32,
    #[serde(default)]
    pub failed: u32,
    #[serde(default)]
    pub errors: Vec<String>,
}
