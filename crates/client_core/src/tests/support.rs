//! In-process stand-in for the internship service.

use std::{collections::HashMap, sync::Arc, time::Duration};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::json;
use shared::{
    domain::StudentId,
    protocol::{
        InternRequest, LoginRequest, RegistrationFormData, SignupForm, StatusUpdateRequest,
    },
};
use tokio::{net::TcpListener, sync::Mutex};

use crate::{session::MemorySessionStorage, ApiClient, Desk};

#[derive(Default)]
pub struct MockState {
    /// id -> (password, role)
    pub users: HashMap<String, (String, String)>,
    /// id -> (situation code, echoed form)
    pub registrations: HashMap<String, (i64, Option<RegistrationFormData>)>,
    pub dashboard: Vec<InternRequest>,
    pub dashboard_rejects: bool,
    pub update_rejects: bool,
    pub submit_rejects: Option<String>,
    pub submit_delay: Option<Duration>,
    pub signup_status: Option<StatusCode>,
    pub received_forms: Vec<(String, RegistrationFormData)>,
    pub received_updates: Vec<(String, bool)>,
    pub received_signups: Vec<SignupForm>,
}

pub type SharedMock = Arc<Mutex<MockState>>;

async fn handle_login(
    State(state): State<SharedMock>,
    Json(payload): Json<LoginRequest>,
) -> impl IntoResponse {
    let state = state.lock().await;
    match state.users.get(&payload.id) {
        Some((password, role)) if *password == payload.password => (
            StatusCode::OK,
            Json(json!({ "success": true, "role": role, "message": "ok" })),
        ),
        Some(_) => (
            StatusCode::OK,
            Json(json!({ "success": false, "message": "Mot de passe incorrect" })),
        ),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "success": false, "message": "Utilisateur inconnu" })),
        ),
    }
}

async fn handle_signup(
    State(state): State<SharedMock>,
    Json(payload): Json<SignupForm>,
) -> impl IntoResponse {
    let mut state = state.lock().await;
    let status = state.signup_status.unwrap_or(StatusCode::OK);
    state.received_signups.push(payload);
    (status, Json(json!({ "success": status.is_success() })))
}

async fn handle_registration_status(
    State(state): State<SharedMock>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let state = state.lock().await;
    match state.registrations.get(&id) {
        Some((situation, form)) => Json(json!({
            "success": true,
            "situation": situation,
            "formData": form,
        })),
        None => Json(json!({ "success": true })),
    }
}

async fn handle_registration_submit(
    State(state): State<SharedMock>,
    Path(id): Path<String>,
    Json(payload): Json<RegistrationFormData>,
) -> impl IntoResponse {
    let delay = state.lock().await.submit_delay;
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let mut state = state.lock().await;
    if let Some(message) = state.submit_rejects.clone() {
        return Json(json!({ "success": false, "message": message }));
    }
    state.received_forms.push((id.clone(), payload.clone()));
    state.registrations.insert(id, (2, Some(payload)));
    Json(json!({ "success": true, "message": "enregistré" }))
}

async fn handle_dashboard(State(state): State<SharedMock>) -> impl IntoResponse {
    let state = state.lock().await;
    if state.dashboard_rejects {
        return Json(json!({ "success": false }));
    }
    Json(json!({ "success": true, "data": state.dashboard }))
}

async fn handle_status_update(
    State(state): State<SharedMock>,
    Path(id): Path<String>,
    Json(payload): Json<StatusUpdateRequest>,
) -> impl IntoResponse {
    let mut state = state.lock().await;
    if state.update_rejects {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "success": false, "message": "base indisponible" })),
        );
    }
    state.received_updates.push((id.clone(), payload.situation));
    if let Some(row) = state
        .dashboard
        .iter_mut()
        .find(|row| row.ids == StudentId::new(id.clone()))
    {
        row.situation = Some(payload.situation);
    }
    (
        StatusCode::OK,
        Json(json!({ "success": true, "message": "Situation mise à jour" })),
    )
}

pub async fn spawn_mock(state: MockState) -> (String, SharedMock) {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let shared = Arc::new(Mutex::new(state));
    let app = Router::new()
        .route("/", post(handle_login))
        .route("/signup", post(handle_signup))
        .route(
            "/registration/:id",
            get(handle_registration_status).post(handle_registration_submit),
        )
        .route("/encadreur-dashboard", get(handle_dashboard))
        .route("/encadreur-dashboard/:id", put(handle_status_update))
        .with_state(shared.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}"), shared)
}

/// Desk backed by in-memory session storage and the given service url.
pub fn desk_for(base_url: &str) -> (Desk, Arc<MemorySessionStorage>) {
    let storage = Arc::new(MemorySessionStorage::default());
    let api = ApiClient::new(base_url).expect("api client");
    (Desk::new(api, storage.clone()), storage)
}

/// An address nothing listens on.
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    format!("http://{addr}")
}

pub fn intern(ids: &str, pays: &str, direction: &str, situation: Option<bool>) -> InternRequest {
    InternRequest {
        ids: StudentId::new(ids),
        date_debut: "2023-01-01".into(),
        date_fin: "2023-06-01".into(),
        nature_stage: "Stage pratique".into(),
        pays: pays.into(),
        presenter_vous: format!("Étudiant {ids} motivé, curieux et prêt à rejoindre l'équipe."),
        direction: direction.into(),
        situation,
    }
}

pub fn valid_form() -> RegistrationFormData {
    RegistrationFormData {
        start_date: "2024-02-01".into(),
        end_date: "2024-06-30".into(),
        stage_type: "PFE".into(),
        country: "Maroc".into(),
        presenter_vous: "Je suis étudiante en génie logiciel et je souhaite rejoindre votre direction."
            .into(),
        direction: "Informatique".into(),
    }
}
