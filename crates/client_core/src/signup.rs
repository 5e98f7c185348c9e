use shared::protocol::SignupForm;
use tracing::{info, warn};

use crate::{api::ApiClient, error::ClientError, validation::validate_signup};

pub const SIGNUP_OK_MESSAGE: &str = "Étudiant ajouté avec succès !";
pub const SIGNUP_FAILED_MESSAGE: &str = "Erreur lors de l'ajout de l'étudiant.";

pub struct SignupController {
    api: ApiClient,
}

impl SignupController {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Creates the student account. On success the form is cleared; the
    /// student still has to log in.
    pub async fn submit(&self, form: &mut SignupForm) -> Result<(), ClientError> {
        validate_signup(form)?;

        let ack = self.api.signup(form).await.map_err(|err| {
            warn!(student_id = %form.id, error = %err, "sign-up failed");
            err
        })?;
        if !ack.success {
            warn!(student_id = %form.id, "sign-up rejected by server");
            return Err(ClientError::rejected(ack.message));
        }

        info!(student_id = %form.id, "student account created");
        *form = SignupForm::default();
        Ok(())
    }
}

/// User-facing text for a failed sign-up.
pub fn signup_failure_message(err: &ClientError) -> String {
    match err {
        ClientError::Validation(validation) => validation.to_string(),
        _ => SIGNUP_FAILED_MESSAGE.to_string(),
    }
}
