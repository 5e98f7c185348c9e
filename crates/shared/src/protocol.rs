use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{RequestStatus, StudentId};

/// Body of `POST /`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub id: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Body of `POST /signup`. Field names follow the service's column names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupForm {
    pub id: String,
    pub nom: String,
    pub prenom: String,
    pub email: String,
    pub tel: String,
    pub mdp: String,
    pub confirmer_mdp: String,
    pub sexe: String,
    pub date_naissance: String,
    pub classe: String,
    pub specialite: String,
    pub faculte: String,
}

/// Raw field values of the internship request form, exactly as the student
/// typed them. Body of `POST /registration/{id}` and the optional
/// `formData` echoed by `GET /registration/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationFormData {
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub stage_type: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub presenter_vous: String,
    #[serde(default)]
    pub direction: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistrationStatusResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub situation: Option<i64>,
    #[serde(
        default,
        rename = "formData",
        skip_serializing_if = "Option::is_none"
    )]
    pub form_data: Option<RegistrationFormData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RegistrationStatusResponse {
    pub fn status(&self) -> Option<RequestStatus> {
        self.situation.and_then(RequestStatus::from_situation_code)
    }
}

/// `{success, message}` reply of the mutating endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AckResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// One row of `GET /encadreur-dashboard`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternRequest {
    pub ids: StudentId,
    #[serde(default)]
    pub date_debut: String,
    #[serde(default)]
    pub date_fin: String,
    #[serde(default)]
    pub nature_stage: String,
    #[serde(default)]
    pub pays: String,
    #[serde(default)]
    pub presenter_vous: String,
    #[serde(default)]
    pub direction: String,
    #[serde(default)]
    pub situation: Option<bool>,
}

impl InternRequest {
    pub fn status(&self) -> RequestStatus {
        RequestStatus::from_decision(self.situation)
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        parse_wire_date(&self.date_debut)
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        parse_wire_date(&self.date_fin)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Vec<InternRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Body of `PUT /encadreur-dashboard/{id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub situation: bool,
}

/// Accepts `YYYY-MM-DD` and any timestamp that starts with one, which is how
/// the service serializes SQL `DATE` columns.
pub fn parse_wire_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let prefix = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
