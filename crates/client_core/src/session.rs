use std::{collections::HashMap, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use shared::domain::{Role, Session, StudentId};
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

use crate::{api::ApiClient, error::ClientError, validation::validate_login, DeskEvent};

pub const SAVED_ID_KEY: &str = "saved_id";
pub const USER_ID_KEY: &str = "user_id";
pub const USER_ROLE_KEY: &str = "user_role";

/// String key/value persistence with browser `localStorage` semantics.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    async fn get_item(&self, key: &str) -> Result<Option<String>>;
    async fn set_item(&self, key: &str, value: &str) -> Result<()>;
    async fn remove_item(&self, key: &str) -> Result<()>;
}

#[async_trait]
impl SessionStorage for storage::Storage {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        storage::Storage::get_item(self, key).await
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        storage::Storage::set_item(self, key, value).await
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        storage::Storage::remove_item(self, key).await.map(|_| ())
    }
}

/// Process-local storage, used when nothing should outlive the process.
#[derive(Default)]
pub struct MemorySessionStorage {
    items: Mutex<HashMap<String, String>>,
}

#[async_trait]
impl SessionStorage for MemorySessionStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.lock().await.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.items
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        self.items.lock().await.remove(key);
        Ok(())
    }
}

/// Screen a user lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Login,
    Registration,
    SupervisorDashboard,
    AdminDashboard,
}

impl View {
    pub fn for_role(role: &str) -> Result<Self, ClientError> {
        match Role::from_wire(role) {
            Some(Role::Student) => Ok(Self::Registration),
            Some(Role::Supervisor) => Ok(Self::SupervisorDashboard),
            Some(Role::Admin) => Ok(Self::AdminDashboard),
            None => Err(ClientError::UnknownRole(role.to_string())),
        }
    }
}

/// Reads and writes the session keys. Cheap to clone.
#[derive(Clone)]
pub struct SessionHolder {
    storage: Arc<dyn SessionStorage>,
}

impl SessionHolder {
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self { storage }
    }

    pub async fn current(&self) -> Result<Option<Session>, ClientError> {
        let Some(user_id) = self.read(USER_ID_KEY).await? else {
            return Ok(None);
        };
        let role = self.read(USER_ROLE_KEY).await?.unwrap_or_default();
        Ok(Some(Session {
            user_id: StudentId(user_id),
            role,
        }))
    }

    pub async fn user_id(&self) -> Result<Option<StudentId>, ClientError> {
        Ok(self.read(USER_ID_KEY).await?.map(StudentId))
    }

    pub async fn saved_id(&self) -> Result<Option<String>, ClientError> {
        self.read(SAVED_ID_KEY).await
    }

    pub async fn remember(&self, id: &str, remember_me: bool) -> Result<(), ClientError> {
        let result = if remember_me {
            self.storage.set_item(SAVED_ID_KEY, id).await
        } else {
            self.storage.remove_item(SAVED_ID_KEY).await
        };
        result.map_err(ClientError::Storage)
    }

    pub async fn open(&self, session: &Session) -> Result<(), ClientError> {
        self.storage
            .set_item(USER_ID_KEY, session.user_id.as_str())
            .await
            .map_err(ClientError::Storage)?;
        self.storage
            .set_item(USER_ROLE_KEY, &session.role)
            .await
            .map_err(ClientError::Storage)
    }

    /// Drops the session but keeps the remembered identifier.
    pub async fn close(&self) -> Result<(), ClientError> {
        self.storage
            .remove_item(USER_ID_KEY)
            .await
            .map_err(ClientError::Storage)?;
        self.storage
            .remove_item(USER_ROLE_KEY)
            .await
            .map_err(ClientError::Storage)
    }

    async fn read(&self, key: &str) -> Result<Option<String>, ClientError> {
        self.storage.get_item(key).await.map_err(ClientError::Storage)
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub id: String,
    pub password: String,
    pub remember_me: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub session: Session,
    pub view: View,
}

pub struct LoginController {
    api: ApiClient,
    session: SessionHolder,
    events: broadcast::Sender<DeskEvent>,
}

impl LoginController {
    pub fn new(
        api: ApiClient,
        session: SessionHolder,
        events: broadcast::Sender<DeskEvent>,
    ) -> Self {
        Self {
            api,
            session,
            events,
        }
    }

    /// Form pre-filled from the remembered identifier.
    pub async fn initial_form(&self) -> Result<LoginForm, ClientError> {
        Ok(match self.session.saved_id().await? {
            Some(id) => LoginForm {
                id,
                password: String::new(),
                remember_me: true,
            },
            None => LoginForm::default(),
        })
    }

    /// Authenticates, stores the session, and picks the landing view. The
    /// session is stored before the role is checked, so an unrecognized
    /// role still leaves the identifier in storage.
    pub async fn login(&self, form: &LoginForm) -> Result<LoginOutcome, ClientError> {
        validate_login(&form.id, &form.password)?;

        let response = self.api.login(&form.id, &form.password).await?;
        if !response.success {
            warn!(user_id = %form.id, "login rejected by server");
            return Err(ClientError::rejected(response.message));
        }

        self.session.remember(&form.id, form.remember_me).await?;
        let session = Session {
            user_id: StudentId::new(form.id.clone()),
            role: response.role.unwrap_or_default(),
        };
        self.session.open(&session).await?;

        let view = View::for_role(&session.role)?;
        info!(user_id = %session.user_id, role = %session.role, ?view, "logged in");
        let _ = self.events.send(DeskEvent::LoggedIn {
            session: session.clone(),
            view,
        });
        Ok(LoginOutcome { session, view })
    }

    pub async fn logout(&self) -> Result<(), ClientError> {
        self.session.close().await?;
        info!("logged out");
        let _ = self.events.send(DeskEvent::LoggedOut);
        Ok(())
    }
}

/// User-facing text for a failed login.
pub fn login_failure_message(err: &ClientError) -> String {
    match err {
        ClientError::Validation(validation) => validation.to_string(),
        ClientError::Server { status: None, .. } => err
            .server_message()
            .unwrap_or("Identifiants invalides")
            .to_string(),
        ClientError::Server { .. } => err
            .server_message()
            .unwrap_or("Erreur d'authentification.")
            .to_string(),
        ClientError::UnknownRole(_) => "Rôle inconnu.".to_string(),
        ClientError::Offline(_) => {
            "Pas de connexion Internet. Vérifiez votre connexion réseau.".to_string()
        }
        _ => "Erreur serveur. Veuillez réessayer plus tard.".to_string(),
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
