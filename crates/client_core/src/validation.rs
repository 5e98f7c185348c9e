//! Local form checks run before anything is sent to the service.

use chrono::NaiveDate;
use shared::{
    domain::StageType,
    protocol::{RegistrationFormData, SignupForm},
};
use thiserror::Error;

pub const MIN_INTRODUCTION_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Veuillez remplir tous les champs.")]
    MissingCredentials,
    #[error("Le champ « {0} » est obligatoire.")]
    MissingField(&'static str),
    #[error("La date « {0} » est invalide.")]
    InvalidDate(&'static str),
    #[error("Type de stage inconnu : {0}.")]
    UnknownStageType(String),
    #[error("La date de début doit être antérieure à la date de fin.")]
    EndNotAfterStart,
    #[error("Votre présentation doit contenir au moins 50 caractères.")]
    IntroductionTooShort { chars: usize },
    #[error("Tous les champs sont obligatoires.")]
    SignupIncomplete,
    #[error("Les mots de passe ne correspondent pas.")]
    PasswordMismatch,
    #[error("ID utilisateur introuvable. Veuillez vous connecter.")]
    MissingSession,
    #[error("Votre demande a déjà été traitée. Commencez une nouvelle demande pour la modifier.")]
    RequestResolved,
    #[error("Stagiaire introuvable : {0}.")]
    UnknownRequest(String),
    #[error("Ce stagiaire est déjà {0}.")]
    DecisionUnchanged(&'static str),
    #[error("Une demande traitée ne peut pas revenir en attente.")]
    BackToPending,
}

/// A request form that passed every local check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidRegistration {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub stage_type: StageType,
    pub country: String,
    pub introduction: String,
    pub direction: String,
}

impl ValidRegistration {
    /// The form as it goes on the wire: trimmed values, ISO dates and the
    /// service's spelling of the stage type.
    pub fn to_form_data(&self) -> RegistrationFormData {
        RegistrationFormData {
            start_date: self.start_date.format("%Y-%m-%d").to_string(),
            end_date: self.end_date.format("%Y-%m-%d").to_string(),
            stage_type: self.stage_type.as_wire().to_string(),
            country: self.country.clone(),
            presenter_vous: self.introduction.clone(),
            direction: self.direction.clone(),
        }
    }
}

pub fn validate_login(id: &str, password: &str) -> Result<(), ValidationError> {
    if id.trim().is_empty() || password.trim().is_empty() {
        return Err(ValidationError::MissingCredentials);
    }
    Ok(())
}

pub fn validate_registration(
    form: &RegistrationFormData,
) -> Result<ValidRegistration, ValidationError> {
    let start_raw = required(&form.start_date, "Date de début")?;
    let end_raw = required(&form.end_date, "Date de fin")?;
    let stage_raw = required(&form.stage_type, "Type de stage")?;
    let country = required(&form.country, "Pays")?;
    required(&form.presenter_vous, "Présentez-vous")?;
    let direction = required(&form.direction, "Direction")?;

    let start_date = parse_form_date(start_raw, "Date de début")?;
    let end_date = parse_form_date(end_raw, "Date de fin")?;
    let stage_type = stage_raw
        .parse::<StageType>()
        .map_err(|_| ValidationError::UnknownStageType(stage_raw.to_string()))?;

    if start_date >= end_date {
        return Err(ValidationError::EndNotAfterStart);
    }

    let chars = form.presenter_vous.chars().count();
    if chars < MIN_INTRODUCTION_CHARS {
        return Err(ValidationError::IntroductionTooShort { chars });
    }

    Ok(ValidRegistration {
        start_date,
        end_date,
        stage_type,
        country: country.to_string(),
        introduction: form.presenter_vous.clone(),
        direction: direction.to_string(),
    })
}

pub fn validate_signup(form: &SignupForm) -> Result<(), ValidationError> {
    let fields = [
        &form.id,
        &form.nom,
        &form.prenom,
        &form.email,
        &form.tel,
        &form.mdp,
        &form.confirmer_mdp,
        &form.sexe,
        &form.date_naissance,
        &form.classe,
        &form.specialite,
        &form.faculte,
    ];
    if fields.iter().any(|value| value.is_empty()) {
        return Err(ValidationError::SignupIncomplete);
    }
    if form.mdp != form.confirmer_mdp {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}

fn required<'a>(value: &'a str, label: &'static str) -> Result<&'a str, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField(label));
    }
    Ok(trimmed)
}

fn parse_form_date(raw: &str, label: &'static str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| ValidationError::InvalidDate(label))
}

#[cfg(test)]
#[path = "tests/validation_tests.rs"]
mod tests;
