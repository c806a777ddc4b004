//! Contains the data models for API requests and responses.

use serde::{Deserialize, Serialize};

/// Response for `/health`.
#[derive(Serialize, Debug)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
}

/// Returned when a simulation page is opened.
#[derive(Serialize, Debug)]
pub struct SimulationStarted {
    pub session_id: String,
    pub scenario: &'static str,
    /// Lure page the front end should render.
    pub page: &'static str,
    /// Form action for the lure page.
    pub capture: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

/// Form posted by every lure page. Scenario-specific fields are optional.
#[derive(Deserialize, Debug, Default)]
pub struct CaptureForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub platform: Option<String>,
    pub target: Option<String>,
    pub employee_id: Option<String>,
}

/// Educational page shown after every accepted submission.
#[derive(Serialize, Debug)]
pub struct Debrief {
    pub scenario: &'static str,
    pub email: String,
    pub headline: String,
    pub red_flags: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<String>,
}

/// Invalid form submission; `retry` points back at the lure page.
#[derive(Serialize, Debug)]
pub struct ValidationErrorResponse {
    pub error: &'static str,
    pub retry: String,
}
