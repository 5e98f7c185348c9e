//! Student request form: local state, submission, and status polling.

use std::str::FromStr;

use shared::{
    domain::{RequestStatus, StudentId},
    protocol::RegistrationFormData,
};
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

use crate::{
    api::ApiClient,
    error::ClientError,
    session::{SessionHolder, View},
    validation::{validate_registration, ValidRegistration, ValidationError},
    DeskEvent,
};

pub const SAVED_MESSAGE: &str = "Les données ont été enregistrées avec succès !";
pub const SEND_FAILURE_MESSAGE: &str =
    "Erreur lors de l'envoi des données. Vérifiez votre connexion.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Success,
    Error,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: &'static str,
}

impl StatusMessage {
    pub fn for_status(status: RequestStatus) -> Self {
        match status {
            RequestStatus::Accepted => Self {
                kind: StatusKind::Success,
                text: "Votre demande de stage a été acceptée !",
            },
            RequestStatus::Rejected => Self {
                kind: StatusKind::Error,
                text: "Votre demande de stage a été refusée.",
            },
            RequestStatus::Pending => Self {
                kind: StatusKind::Pending,
                text: "Votre demande de stage est en cours d'examen.",
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    StartDate,
    EndDate,
    StageType,
    Country,
    PresenterVous,
    Direction,
}

impl FromStr for FormField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "startDate" | "start-date" => Ok(Self::StartDate),
            "endDate" | "end-date" => Ok(Self::EndDate),
            "stageType" | "stage-type" => Ok(Self::StageType),
            "country" => Ok(Self::Country),
            "presenterVous" | "presenter-vous" | "introduction" => Ok(Self::PresenterVous),
            "direction" => Ok(Self::Direction),
            other => Err(format!("unknown form field: {other}")),
        }
    }
}

/// Everything the request view renders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationSnapshot {
    pub user_id: Option<StudentId>,
    pub form: RegistrationFormData,
    pub status: Option<RequestStatus>,
    pub status_message: Option<StatusMessage>,
    pub error: Option<String>,
    pub success: Option<String>,
    pub form_submitted: bool,
    pub loading: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitOutcome {
    /// Status read back right after saving; `None` if that read failed.
    pub status: Option<RequestStatus>,
}

pub struct RegistrationController {
    api: ApiClient,
    session: SessionHolder,
    events: broadcast::Sender<DeskEvent>,
    inner: Mutex<RegistrationSnapshot>,
}

impl RegistrationController {
    pub fn new(
        api: ApiClient,
        session: SessionHolder,
        events: broadcast::Sender<DeskEvent>,
    ) -> Self {
        Self {
            api,
            session,
            events,
            inner: Mutex::new(RegistrationSnapshot::default()),
        }
    }

    /// View entry: picks up the session and the current request status.
    /// Without a session the caller is sent back to the login view.
    pub async fn load(&self) -> Result<View, ClientError> {
        let Some(user_id) = self.session.user_id().await? else {
            let mut state = self.inner.lock().await;
            state.user_id = None;
            state.error = Some(ValidationError::MissingSession.to_string());
            return Ok(View::Login);
        };

        self.inner.lock().await.user_id = Some(user_id.clone());
        if let Err(err) = self.fetch_status(&user_id, true).await {
            warn!(user_id = %user_id, error = %err, "failed to fetch request status");
        }
        Ok(View::Registration)
    }

    /// Re-reads the request status for the loaded session.
    pub async fn poll_status(&self) -> Result<Option<RequestStatus>, ClientError> {
        let user_id = self.require_user().await?;
        self.fetch_status(&user_id, false).await
    }

    pub async fn set_field(&self, field: FormField, value: impl Into<String>) {
        let mut state = self.inner.lock().await;
        let value = value.into();
        match field {
            FormField::StartDate => state.form.start_date = value,
            FormField::EndDate => state.form.end_date = value,
            FormField::StageType => state.form.stage_type = value,
            FormField::Country => state.form.country = value,
            FormField::PresenterVous => state.form.presenter_vous = value,
            FormField::Direction => state.form.direction = value,
        }
        state.error = None;
        state.success = None;
    }

    pub async fn set_form(&self, form: RegistrationFormData) {
        let mut state = self.inner.lock().await;
        state.form = form;
        state.error = None;
        state.success = None;
    }

    /// Validates the form, sends its normalized values, then reads the status
    /// back. Refused while a previous submission is in flight and once the
    /// request has been resolved.
    pub async fn submit(&self) -> Result<SubmitOutcome, ClientError> {
        let (user_id, form) = {
            let mut state = self.inner.lock().await;
            if state.loading {
                return Err(ClientError::Busy);
            }
            let valid = match Self::check_submittable(&state) {
                Ok(valid) => valid,
                Err(err) => {
                    state.error = Some(err.to_string());
                    return Err(err.into());
                }
            };
            let Some(user_id) = state.user_id.clone() else {
                return Err(ValidationError::MissingSession.into());
            };
            state.form = valid.to_form_data();
            state.loading = true;
            state.error = None;
            state.success = None;
            (user_id, state.form.clone())
        };

        let outcome = self.send_form(&user_id, &form).await;
        self.inner.lock().await.loading = false;
        outcome
    }

    /// Starts a fresh request ("Nouvelle demande").
    pub async fn reset(&self) {
        let mut state = self.inner.lock().await;
        state.form = RegistrationFormData::default();
        state.form_submitted = false;
        state.status = None;
        state.status_message = None;
        state.success = None;
        state.error = None;
    }

    pub async fn snapshot(&self) -> RegistrationSnapshot {
        self.inner.lock().await.clone()
    }

    fn check_submittable(
        state: &RegistrationSnapshot,
    ) -> Result<ValidRegistration, ValidationError> {
        if state.user_id.is_none() {
            return Err(ValidationError::MissingSession);
        }
        if state.status.is_some_and(RequestStatus::is_resolved) {
            return Err(ValidationError::RequestResolved);
        }
        validate_registration(&state.form)
    }

    async fn send_form(
        &self,
        user_id: &StudentId,
        form: &RegistrationFormData,
    ) -> Result<SubmitOutcome, ClientError> {
        match self.api.submit_registration(user_id, form).await {
            Ok(ack) if ack.success => {
                {
                    let mut state = self.inner.lock().await;
                    state.success = Some(SAVED_MESSAGE.to_string());
                    state.form_submitted = true;
                }
                info!(user_id = %user_id, "request saved");
                let _ = self.events.send(DeskEvent::RegistrationSaved {
                    user_id: user_id.clone(),
                });

                let status = match self.fetch_status(user_id, false).await {
                    Ok(status) => status,
                    Err(err) => {
                        warn!(user_id = %user_id, error = %err, "status refresh after save failed");
                        None
                    }
                };
                Ok(SubmitOutcome { status })
            }
            Ok(ack) => {
                let message = ack.message.unwrap_or_else(|| "inconnue".to_string());
                warn!(user_id = %user_id, %message, "request rejected by server");
                self.inner.lock().await.error = Some(format!("Erreur : {message}"));
                Err(ClientError::rejected(Some(message)))
            }
            Err(err) => {
                warn!(user_id = %user_id, error = %err, "request submission failed");
                self.inner.lock().await.error = Some(SEND_FAILURE_MESSAGE.to_string());
                Err(err)
            }
        }
    }

    async fn fetch_status(
        &self,
        user_id: &StudentId,
        prefill: bool,
    ) -> Result<Option<RequestStatus>, ClientError> {
        let response = self.api.registration_status(user_id).await?;
        if !response.success {
            return Err(ClientError::rejected(response.message));
        }

        let status = response.status();
        {
            let mut state = self.inner.lock().await;
            if let Some(status) = status {
                state.status = Some(status);
                state.status_message = Some(StatusMessage::for_status(status));
            }
            if prefill && status == Some(RequestStatus::Pending) {
                if let Some(form) = response.form_data {
                    state.form = form;
                    state.form_submitted = true;
                }
            }
        }

        let _ = self.events.send(DeskEvent::StatusChanged {
            user_id: user_id.clone(),
            status,
        });
        Ok(status)
    }

    async fn require_user(&self) -> Result<StudentId, ClientError> {
        if let Some(user_id) = self.inner.lock().await.user_id.clone() {
            return Ok(user_id);
        }
        self.session
            .user_id()
            .await?
            .ok_or_else(|| ValidationError::MissingSession.into())
    }
}

#[cfg(test)]
#[path = "tests/registration_tests.rs"]
mod tests;
