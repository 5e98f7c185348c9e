use anyhow::{bail, Result};
use client_core::{ClientError, Desk, RegistrationController, View};
use shared::domain::{Role, StageType, StudentId};

pub const LOGIN_HINT: &str = "Veuillez vous connecter : `stage-desk login`";

/// Identifier of the stored session, provided it carries `expected`.
pub async fn require_role(desk: &Desk, expected: Role) -> Result<StudentId> {
    let Some(session) = desk.session().current().await? else {
        bail!("ID utilisateur introuvable. Veuillez vous connecter.");
    };
    if session.role() != Some(expected) {
        bail!(
            "Accès réservé au rôle « {} » (session : « {} »).",
            expected.as_wire(),
            session.role
        );
    }
    Ok(session.user_id)
}

/// Opens the student's request view. With `fresh`, a resolved request is
/// set aside so a new one can be filed.
pub async fn open_request(desk: &Desk, fresh: bool) -> Result<RegistrationController> {
    let controller = desk.registration();
    if controller.load().await? == View::Login {
        bail!(LOGIN_HINT);
    }
    if fresh {
        controller.reset().await;
    }
    Ok(controller)
}

pub fn submit_failure_message(err: &ClientError, shown: Option<String>) -> String {
    match err {
        ClientError::Busy => "Une soumission est déjà en cours.".to_string(),
        _ => shown.unwrap_or_else(|| err.to_string()),
    }
}

/// Display name of a stage type, or the raw text if it is not one.
pub fn stage_label(raw: &str) -> &str {
    raw.parse::<StageType>()
        .map(StageType::label)
        .unwrap_or(raw)
}

#[cfg(test)]
#[path = "tests/commands_tests.rs"]
mod tests;
