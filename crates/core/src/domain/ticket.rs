use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Unanchored ticket id pattern, ASCII case-insensitive.
pub const TICKET_ID_PATTERN: &str = r"(?i-u)NVA-[A-Z0-9]{6,10}";

pub const SYNTHESIZED_DESCRIPTION: &str =
    "Ticket creado desde el chat. El equipo de soporte revisará tu solicitud en las próximas 24–48 horas.";

static EXACT_TICKET_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("^(?:{TICKET_ID_PATTERN})$")).expect("ticket id pattern compiles")
});

/// Support ticket identifier, always stored uppercase.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TicketId(String);

impl TicketId {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim();
        if EXACT_TICKET_ID.is_match(trimmed) {
            Ok(Self(trimmed.to_ascii_uppercase()))
        } else {
            Err(DomainError::InvalidTicketId(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TicketId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TicketId> for String {
    fn from(value: TicketId) -> Self {
        value.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketCategory {
    Return,
    Warranty,
    Delivery,
    Defect,
    Setup,
    Other,
}

impl TicketCategory {
    pub const ALL: [TicketCategory; 6] = [
        Self::Return,
        Self::Warranty,
        Self::Delivery,
        Self::Defect,
        Self::Setup,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Return => "return",
            Self::Warranty => "warranty",
            Self::Delivery => "delivery",
            Self::Defect => "defect",
            Self::Setup => "setup",
            Self::Other => "other",
        }
    }

    /// Subject line used when a ticket is recovered from prose.
    pub fn default_subject(&self) -> &'static str {
        match self {
            Self::Delivery => "Problema con entrega",
            Self::Return => "Solicitud de devolución",
            Self::Warranty => "Reclamación de garantía",
            Self::Defect => "Producto defectuoso",
            Self::Setup => "Ayuda con configuración",
            Self::Other => "Solicitud de asistencia",
        }
    }
}

impl FromStr for TicketCategory {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == normalized)
            .ok_or_else(|| DomainError::InvariantViolation(format!("unknown ticket category `{value}`")))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl FromStr for TicketPriority {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(DomainError::InvariantViolation(format!("unknown ticket priority `{other}`"))),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    #[default]
    Open,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketRecord {
    pub ticket_id: TicketId,
    pub category: TicketCategory,
    pub subject: String,
    pub description: String,
    pub priority: TicketPriority,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
}

impl TicketRecord {
    /// Record for a ticket whose id was only seen in assistant prose.
    ///
    /// Subject and description come from fixed labels, never from the prose.
    pub fn synthesized(ticket_id: TicketId, category: TicketCategory, created_at: DateTime<Utc>) -> Self {
        Self {
            ticket_id,
            category,
            subject: category.default_subject().to_string(),
            description: SYNTHESIZED_DESCRIPTION.to_string(),
            priority: TicketPriority::Medium,
            status: TicketStatus::Open,
            created_at,
        }
    }
}
