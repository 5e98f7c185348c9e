//! Supervisor dashboard: request list, local search/filter, decisions.

use shared::{
    domain::{RequestStatus, StatusFilter, StudentId},
    protocol::InternRequest,
};
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

use crate::{api::ApiClient, error::ClientError, validation::ValidationError, DeskEvent};

pub const LOAD_REJECTED_MESSAGE: &str = "Erreur lors du chargement des stagiaires.";
pub const LOAD_FAILED_MESSAGE: &str = "Erreur de connexion au serveur.";
pub const UPDATE_FAILED_MESSAGE: &str = "Erreur lors de la mise à jour du stagiaire.";

/// Case-insensitive substring match on the free-text columns.
pub fn matches_search(request: &InternRequest, search: &str) -> bool {
    let needle = search.to_lowercase();
    [
        &request.presenter_vous,
        &request.direction,
        &request.nature_stage,
        &request.pays,
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(&needle))
}

pub fn filter_requests<'a>(
    requests: &'a [InternRequest],
    search: &str,
    filter: StatusFilter,
) -> Vec<&'a InternRequest> {
    requests
        .iter()
        .filter(|request| matches_search(request, search) && filter.matches(request.status()))
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestStats {
    pub total: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub pending: usize,
}

impl RequestStats {
    pub fn from_requests(requests: &[InternRequest]) -> Self {
        requests
            .iter()
            .fold(Self::default(), |mut stats, request| {
                stats.total += 1;
                match request.status() {
                    RequestStatus::Accepted => stats.accepted += 1,
                    RequestStatus::Rejected => stats.rejected += 1,
                    RequestStatus::Pending => stats.pending += 1,
                }
                stats
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub ids: StudentId,
    pub status: RequestStatus,
    pub notice: &'static str,
    pub server_message: Option<String>,
}

#[derive(Debug, Clone, Default)]
struct ReviewState {
    requests: Vec<InternRequest>,
    search: String,
    filter: StatusFilter,
    selected: Option<StudentId>,
    loading: bool,
    error: Option<String>,
}

pub struct ReviewController {
    api: ApiClient,
    events: broadcast::Sender<DeskEvent>,
    inner: Mutex<ReviewState>,
}

impl ReviewController {
    pub fn new(api: ApiClient, events: broadcast::Sender<DeskEvent>) -> Self {
        Self {
            api,
            events,
            inner: Mutex::new(ReviewState::default()),
        }
    }

    /// Replaces the local list with the server's. On failure the previous
    /// list is kept and the error message is set.
    pub async fn load(&self) -> Result<usize, ClientError> {
        {
            let mut state = self.inner.lock().await;
            if state.loading {
                return Err(ClientError::Busy);
            }
            state.loading = true;
            state.error = None;
        }

        let result = self.api.list_requests().await;
        let mut state = self.inner.lock().await;
        state.loading = false;
        match result {
            Ok(response) if response.success => {
                let count = response.data.len();
                state.requests = response.data;
                if let Some(selected) = state.selected.clone() {
                    if !state.requests.iter().any(|request| request.ids == selected) {
                        state.selected = None;
                    }
                }
                info!(count, "review list loaded");
                Ok(count)
            }
            Ok(response) => {
                warn!("review list rejected by server");
                state.error = Some(LOAD_REJECTED_MESSAGE.to_string());
                Err(ClientError::rejected(response.message))
            }
            Err(err) => {
                warn!(error = %err, "review list load failed");
                state.error = Some(LOAD_FAILED_MESSAGE.to_string());
                Err(err)
            }
        }
    }

    pub async fn set_search(&self, search: impl Into<String>) {
        self.inner.lock().await.search = search.into();
    }

    pub async fn set_filter(&self, filter: StatusFilter) {
        self.inner.lock().await.filter = filter;
    }

    /// Rows passing the current search term and status filter.
    pub async fn visible(&self) -> Vec<InternRequest> {
        let state = self.inner.lock().await;
        filter_requests(&state.requests, &state.search, state.filter)
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn requests(&self) -> Vec<InternRequest> {
        self.inner.lock().await.requests.clone()
    }

    pub async fn stats(&self) -> RequestStats {
        RequestStats::from_requests(&self.inner.lock().await.requests)
    }

    pub async fn error(&self) -> Option<String> {
        self.inner.lock().await.error.clone()
    }

    pub async fn select(&self, ids: &StudentId) -> Option<InternRequest> {
        let mut state = self.inner.lock().await;
        let found = state
            .requests
            .iter()
            .find(|request| &request.ids == ids)
            .cloned();
        state.selected = found.as_ref().map(|request| request.ids.clone());
        found
    }

    pub async fn selected(&self) -> Option<InternRequest> {
        let state = self.inner.lock().await;
        let ids = state.selected.as_ref()?;
        state.requests.iter().find(|request| &request.ids == ids).cloned()
    }

    pub async fn accept(&self, ids: &StudentId) -> Result<Decision, ClientError> {
        self.decide(ids, RequestStatus::Accepted).await
    }

    pub async fn reject(&self, ids: &StudentId) -> Result<Decision, ClientError> {
        self.decide(ids, RequestStatus::Rejected).await
    }

    /// Sends a supervisor decision and applies it locally once the service
    /// confirms it.
    pub async fn decide(
        &self,
        ids: &StudentId,
        next: RequestStatus,
    ) -> Result<Decision, ClientError> {
        let Some(accepted) = next.decision() else {
            return Err(ValidationError::BackToPending.into());
        };

        {
            let mut state = self.inner.lock().await;
            if state.loading {
                return Err(ClientError::Busy);
            }
            let Some(current) = state
                .requests
                .iter()
                .find(|request| &request.ids == ids)
                .map(InternRequest::status)
            else {
                return Err(ValidationError::UnknownRequest(ids.to_string()).into());
            };
            if !current.can_transition_to(next) {
                return Err(ValidationError::DecisionUnchanged(decided_label(current)).into());
            }
            state.loading = true;
            state.error = None;
        }

        let result = self.api.update_status(ids, accepted).await;
        let mut state = self.inner.lock().await;
        state.loading = false;
        match result {
            Ok(ack) if ack.success => {
                if let Some(request) = state.requests.iter_mut().find(|request| &request.ids == ids)
                {
                    request.situation = Some(accepted);
                }
                drop(state);

                let notice = if accepted {
                    "Stagiaire accepté avec succès"
                } else {
                    "Stagiaire refusé"
                };
                info!(ids = %ids, status = ?next, "decision recorded");
                let decision = Decision {
                    ids: ids.clone(),
                    status: next,
                    notice,
                    server_message: ack.message,
                };
                let _ = self.events.send(DeskEvent::RequestDecided {
                    ids: ids.clone(),
                    status: next,
                });
                Ok(decision)
            }
            Ok(ack) => {
                warn!(ids = %ids, "decision rejected by server");
                state.error = Some(UPDATE_FAILED_MESSAGE.to_string());
                Err(ClientError::rejected(ack.message))
            }
            Err(err) => {
                warn!(ids = %ids, error = %err, "decision update failed");
                state.error = Some(UPDATE_FAILED_MESSAGE.to_string());
                Err(err)
            }
        }
    }
}

fn decided_label(status: RequestStatus) -> &'static str {
    match status {
        RequestStatus::Accepted => "accepté",
        RequestStatus::Rejected => "refusé",
        RequestStatus::Pending => "en attente de décision",
    }
}

#[cfg(test)]
#[path = "tests/review_tests.rs"]
mod tests;
