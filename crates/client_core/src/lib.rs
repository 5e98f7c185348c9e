use std::sync::Arc;

use shared::domain::{RequestStatus, Session, StudentId};
use tokio::sync::broadcast;

pub mod api;
pub mod error;
pub mod format;
pub mod registration;
pub mod review;
pub mod session;
pub mod signup;
pub mod validation;

pub use api::ApiClient;
pub use error::ClientError;
pub use registration::{RegistrationController, RegistrationSnapshot, StatusMessage};
pub use review::{filter_requests, RequestStats, ReviewController};
pub use session::{LoginController, LoginForm, SessionHolder, SessionStorage, View};
pub use signup::SignupController;

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeskEvent {
    LoggedIn {
        session: Session,
        view: View,
    },
    LoggedOut,
    StatusChanged {
        user_id: StudentId,
        status: Option<RequestStatus>,
    },
    RegistrationSaved {
        user_id: StudentId,
    },
    RequestDecided {
        ids: StudentId,
        status: RequestStatus,
    },
}

/// Wires the API client and session storage into the per-view controllers.
pub struct Desk {
    api: ApiClient,
    session: SessionHolder,
    events: broadcast::Sender<DeskEvent>,
}

impl Desk {
    pub fn new(api: ApiClient, storage: Arc<dyn SessionStorage>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            api,
            session: SessionHolder::new(storage),
            events,
        }
    }

    pub fn session(&self) -> &SessionHolder {
        &self.session
    }

    pub fn login(&self) -> LoginController {
        LoginController::new(self.api.clone(), self.session.clone(), self.events.clone())
    }

    pub fn signup(&self) -> SignupController {
        SignupController::new(self.api.clone())
    }

    pub fn registration(&self) -> RegistrationController {
        RegistrationController::new(self.api.clone(), self.session.clone(), self.events.clone())
    }

    pub fn review(&self) -> ReviewController {
        ReviewController::new(self.api.clone(), self.events.clone())
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<DeskEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
