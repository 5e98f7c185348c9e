use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};

/// Identifier typed by the student at sign-up. The dashboard endpoint sends
/// it back as either a JSON string or a number, so both are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct StudentId(pub String);

impl StudentId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for StudentId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Int(i64),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Text(value) => StudentId(value),
            Repr::Int(value) => StudentId(value.to_string()),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "etudiant")]
    Student,
    #[serde(rename = "encadreur")]
    Supervisor,
    #[serde(rename = "admin")]
    Admin,
}

impl Role {
    /// Maps the role string returned by the login endpoint. Unknown roles
    /// yield `None`; callers decide how to surface them.
    pub fn from_wire(raw: &str) -> Option<Self> {
        match raw {
            "etudiant" => Some(Self::Student),
            "encadreur" => Some(Self::Supervisor),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    pub fn as_wire(self) -> &'static str {
        match self {
            Self::Student => "etudiant",
            Self::Supervisor => "encadreur",
            Self::Admin => "admin",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageType {
    #[serde(rename = "initiation")]
    Initiation,
    #[serde(rename = "perfectionnement")]
    Perfectionnement,
    #[serde(rename = "PFE")]
    Pfe,
}

impl StageType {
    pub fn as_wire(self) -> &'static str {
        match self {
            Self::Initiation => "initiation",
            Self::Perfectionnement => "perfectionnement",
            Self::Pfe => "PFE",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Initiation => "Initiation",
            Self::Perfectionnement => "Perfectionnement",
            Self::Pfe => "Projet de Fin d'Études (PFE)",
        }
    }
}

impl FromStr for StageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "initiation" => Ok(Self::Initiation),
            "perfectionnement" => Ok(Self::Perfectionnement),
            "PFE" | "pfe" => Ok(Self::Pfe),
            other => Err(format!("unknown stage type: {other}")),
        }
    }
}

/// Outcome of supervisor review for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
}

impl RequestStatus {
    /// Situation codes of `GET /registration/{id}`: 0 rejected, 1 accepted,
    /// 2 pending. Anything else means no known request.
    pub fn from_situation_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Rejected),
            1 => Some(Self::Accepted),
            2 => Some(Self::Pending),
            _ => None,
        }
    }

    /// Dashboard rows carry the decision as a nullable boolean.
    pub fn from_decision(decision: Option<bool>) -> Self {
        match decision {
            Some(true) => Self::Accepted,
            Some(false) => Self::Rejected,
            None => Self::Pending,
        }
    }

    pub fn decision(self) -> Option<bool> {
        match self {
            Self::Accepted => Some(true),
            Self::Rejected => Some(false),
            Self::Pending => None,
        }
    }

    pub fn is_resolved(self) -> bool {
        self != Self::Pending
    }

    /// Supervisor decisions never lead back to `Pending`, and re-issuing the
    /// current decision is not a transition.
    pub fn can_transition_to(self, next: RequestStatus) -> bool {
        next != Self::Pending && next != self
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "En attente",
            Self::Accepted => "Accepté",
            Self::Rejected => "Refusé",
        }
    }
}

/// Status selector of the review dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(RequestStatus),
}

impl StatusFilter {
    pub fn matches(self, status: RequestStatus) -> bool {
        match self {
            Self::All => true,
            Self::Only(expected) => expected == status,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "accepted" => Ok(Self::Only(RequestStatus::Accepted)),
            "rejected" => Ok(Self::Only(RequestStatus::Rejected)),
            "pending" => Ok(Self::Only(RequestStatus::Pending)),
            other => Err(format!("unknown status filter: {other}")),
        }
    }
}

/// Authenticated identity kept in local storage between commands. The role
/// is stored verbatim so an unrecognized value can still be reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: StudentId,
    pub role: String,
}

impl Session {
    pub fn role(&self) -> Option<Role> {
        Role::from_wire(&self.role)
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
