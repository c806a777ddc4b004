//! Defines the Axum API routes and handlers.

use crate::attempt_log::{AttemptLogger, AttemptRecord, secret_length};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::tracker::AttemptTracker;
use crate::web::capture_rate_limit::{ClientAddress, capture_rate_limit_middleware};
use crate::web::models::{
    CaptureForm, Debrief, HealthResponse, SimulationStarted, ValidationErrorResponse,
};
use crate::web::scenario::Scenario;
use crate::web::validation::is_valid_email;
use axum::{
    Extension, Form, Json, Router,
    extract::{Path, State, rejection::FormRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::TypedHeader;
use axum_extra::headers::{Cookie, UserAgent};
use std::sync::Arc;

/// Most recent in-memory records served by `/admin/logs`.
pub const ADMIN_MEMORY_LIMIT: usize = 50;
/// Most recent durable records served by `/admin/simulation-logs`.
pub const ADMIN_STORE_LIMIT: usize = 100;
pub const SESSION_COOKIE: &str = "session_id";

/// Helper to create a JSON error response with a message and status code
pub(crate) fn json_error(message: &str, status: StatusCode) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

pub struct AppStateInner {
    pub tracker: AttemptTracker,
    pub logger: AttemptLogger,
    pub clock: Arc<dyn Clock>,
    /// Enables the admin log endpoints.
    pub debug: bool,
    pub log_attempts: bool,
}
pub type AppState = Arc<AppStateInner>;

impl AppStateInner {
    pub fn from_config(config: &Config) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &Config, clock: Arc<dyn Clock>) -> Self {
        let sim = &config.simulation;
        let tracker = AttemptTracker::with_clock(sim.max_attempts_per_ip, sim.rate_limit_window(), clock.clone())
            .with_max_addresses(sim.max_tracked_addresses);
        Self {
            tracker,
            logger: AttemptLogger::open(sim.log_path.clone()),
            clock,
            debug: config.server.debug,
            log_attempts: sim.log_attempts,
        }
    }
}

/// Creates the Axum router with all the API endpoints.
pub fn create_router(state: AppState) -> Router {
    let capture_limit = axum::middleware::from_fn_with_state(state.clone(), capture_rate_limit_middleware);
    Router::new()
        .route("/health", get(health))
        .route("/simulation", get(start_login))
        .route("/simulation/social-media/{platform}", get(start_social))
        .route("/simulation/urgency-attack", get(start_urgent))
        .route("/simulation/spear-phishing/{target}", get(start_spear))
        .route("/capture", post(capture_login).route_layer(capture_limit.clone()))
        .route("/capture-social", post(capture_social).route_layer(capture_limit.clone()))
        .route("/capture-urgent", post(capture_urgent).route_layer(capture_limit.clone()))
        .route("/capture-spear", post(capture_spear).route_layer(capture_limit))
        .route("/admin/logs", get(admin_logs))
        .route("/admin/simulation-logs", get(admin_simulation_logs))
        .fallback(not_found)
        .with_state(state)
}

/// For tests: create a router around a prepared state
pub fn app_with_state(state: AppState) -> Router {
    create_router(state)
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: state.clock.now_wallclock().to_rfc3339(),
    })
}

async fn not_found() -> Response {
    json_error("Not found", StatusCode::NOT_FOUND)
}

// --- Simulation pages ---

async fn start_login() -> Response {
    start_simulation(Scenario::Login)
}

async fn start_social(Path(platform): Path<String>) -> Response {
    if !Scenario::is_known_platform(&platform) {
        tracing::debug!(platform = %platform, "No dedicated page for platform, using generic login");
    }
    start_simulation(Scenario::Social { platform })
}

async fn start_urgent() -> Response {
    start_simulation(Scenario::Urgent)
}

async fn start_spear(Path(target): Path<String>) -> Response {
    start_simulation(Scenario::Spear { target, employee_id: String::new() })
}

fn start_simulation(scenario: Scenario) -> Response {
    let session_id = uuid::Uuid::new_v4().simple().to_string();
    tracing::info!(scenario = scenario.name(), session = %session_id, "Simulation started");

    let (platform, target) = match &scenario {
        Scenario::Social { platform } => (Some(platform.clone()), None),
        Scenario::Spear { target, .. } => (None, Some(target.clone())),
        _ => (None, None),
    };
    let body = SimulationStarted {
        session_id: session_id.clone(),
        scenario: scenario.name(),
        page: scenario.page(),
        capture: scenario.capture_path(),
        platform,
        target,
    };
    let cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, session_id);
    ([(header::SET_COOKIE, cookie)], Json(body)).into_response()
}

// --- Capture endpoints ---

/// Who sent a submission. Built from request metadata, never from the form.
struct Submitter {
    address: String,
    user_agent: String,
    session_id: String,
}

impl Submitter {
    fn new(
        address: ClientAddress,
        user_agent: Option<TypedHeader<UserAgent>>,
        cookies: Option<TypedHeader<Cookie>>,
    ) -> Self {
        Self {
            address: address.0,
            user_agent: user_agent
                .map(|TypedHeader(ua)| ua.as_str().to_string())
                .unwrap_or_else(|| "Unknown".to_string()),
            session_id: cookies
                .and_then(|TypedHeader(c)| c.get(SESSION_COOKIE).map(str::to_string))
                .unwrap_or_else(|| "unknown".to_string()),
        }
    }
}

async fn capture_login(
    State(state): State<AppState>,
    Extension(address): Extension<ClientAddress>,
    user_agent: Option<TypedHeader<UserAgent>>,
    cookies: Option<TypedHeader<Cookie>>,
    form: Result<Form<CaptureForm>, FormRejection>,
) -> Response {
    let submitter = Submitter::new(address, user_agent, cookies);
    let form = form_or_empty(form);
    capture(&state, submitter, form, Scenario::Login).await
}

async fn capture_social(
    State(state): State<AppState>,
    Extension(address): Extension<ClientAddress>,
    user_agent: Option<TypedHeader<UserAgent>>,
    cookies: Option<TypedHeader<Cookie>>,
    form: Result<Form<CaptureForm>, FormRejection>,
) -> Response {
    let submitter = Submitter::new(address, user_agent, cookies);
    let form = form_or_empty(form);
    let platform = form.platform.clone().unwrap_or_else(|| "unknown".to_string());
    capture(&state, submitter, form, Scenario::Social { platform }).await
}

async fn capture_urgent(
    State(state): State<AppState>,
    Extension(address): Extension<ClientAddress>,
    user_agent: Option<TypedHeader<UserAgent>>,
    cookies: Option<TypedHeader<Cookie>>,
    form: Result<Form<CaptureForm>, FormRejection>,
) -> Response {
    let submitter = Submitter::new(address, user_agent, cookies);
    let form = form_or_empty(form);
    capture(&state, submitter, form, Scenario::Urgent).await
}

async fn capture_spear(
    State(state): State<AppState>,
    Extension(address): Extension<ClientAddress>,
    user_agent: Option<TypedHeader<UserAgent>>,
    cookies: Option<TypedHeader<Cookie>>,
    form: Result<Form<CaptureForm>, FormRejection>,
) -> Response {
    let submitter = Submitter::new(address, user_agent, cookies);
    let form = form_or_empty(form);
    let scenario = Scenario::Spear {
        target: form.target.clone().unwrap_or_else(|| "employee".to_string()),
        employee_id: form.employee_id.clone().unwrap_or_default(),
    };
    capture(&state, submitter, form, scenario).await
}

/// An admitted attempt is always logged, so an unreadable body counts as an
/// empty submission rather than an extractor rejection.
fn form_or_empty(form: Result<Form<CaptureForm>, FormRejection>) -> CaptureForm {
    match form {
        Ok(Form(form)) => form,
        Err(e) => {
            tracing::debug!("Unreadable capture form, treating as empty: {}", e);
            CaptureForm::default()
        }
    }
}

/// Shared capture flow: log the attempt, validate, then debrief.
///
/// The attempt is logged before validation so incomplete submissions are
/// still visible to reviewers.
async fn capture(state: &AppState, submitter: Submitter, form: CaptureForm, scenario: Scenario) -> Response {
    let email = form.email.trim();

    if state.log_attempts {
        let record = AttemptRecord {
            timestamp: state.clock.now_wallclock(),
            source_address: submitter.address,
            subject_identifier: email.to_string(),
            secret_length: secret_length(&form.password),
            client_descriptor: submitter.user_agent,
            outcome: true,
            correlation_id: submitter.session_id,
        };
        // Already reported by the logger; the debrief is shown regardless.
        let _ = state.logger.append(record).await;
    }

    if email.is_empty() || form.password.is_empty() {
        return invalid_submission("Please fill in all fields.", &scenario);
    }
    if !is_valid_email(email) {
        return invalid_submission("Please enter a valid email address.", &scenario);
    }

    let (platform, target, employee_id) = match &scenario {
        Scenario::Social { platform } => (Some(platform.clone()), None, None),
        Scenario::Spear { target, employee_id } => {
            (None, Some(target.clone()), Some(employee_id.clone()))
        }
        _ => (None, None, None),
    };
    let debrief = Debrief {
        scenario: scenario.name(),
        email: email.to_string(),
        headline: scenario.headline(),
        red_flags: scenario.red_flags(),
        platform,
        target,
        employee_id,
    };
    (StatusCode::OK, Json(debrief)).into_response()
}

fn invalid_submission(message: &'static str, scenario: &Scenario) -> Response {
    let body = ValidationErrorResponse {
        error: message,
        retry: scenario.simulation_path(),
    };
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

// --- Admin endpoints ---

/// GET /admin/logs -- recent in-memory attempts, debug mode only
async fn admin_logs(State(state): State<AppState>) -> Response {
    if !state.debug {
        return json_error("Access denied", StatusCode::FORBIDDEN);
    }
    Json(state.logger.recent(ADMIN_MEMORY_LIMIT).await).into_response()
}

/// GET /admin/simulation-logs -- recent durable attempts, debug mode only
async fn admin_simulation_logs(State(state): State<AppState>) -> Response {
    if !state.debug {
        return json_error("Access denied", StatusCode::FORBIDDEN);
    }
    match state.logger.recent_from_store(ADMIN_STORE_LIMIT).await {
        Ok(records) => Json(records).into_response(),
        Err(e) => {
            tracing::error!("Failed to read attempt store: {}", e);
            json_error(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
