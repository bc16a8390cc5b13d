use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::IdentityId;

/// Backend-assigned ticket key
pub type TicketId = i64;

/// Kind of request being filed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TicketType {
    #[default]
    #[serde(rename = "INCIDENTE")]
    Incident,
    #[serde(rename = "REQUERIMIENTO")]
    Requirement,
    #[serde(rename = "CONSULTA")]
    Inquiry,
}

impl TicketType {
    pub fn all() -> &'static [TicketType] {
        &[
            TicketType::Incident,
            TicketType::Requirement,
            TicketType::Inquiry,
        ]
    }

    /// Value sent to and received from the backend
    pub fn as_wire(&self) -> &'static str {
        match self {
            TicketType::Incident => "INCIDENTE",
            TicketType::Requirement => "REQUERIMIENTO",
            TicketType::Inquiry => "CONSULTA",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TicketType::Incident => "Incident",
            TicketType::Requirement => "Requirement",
            TicketType::Inquiry => "Inquiry",
        }
    }
}

/// Priority level declared by the requester
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PriorityLevel {
    #[serde(rename = "BAJA")]
    Low,
    #[default]
    #[serde(rename = "MEDIA")]
    Medium,
    #[serde(rename = "ALTA")]
    High,
    #[serde(rename = "URGENCIA")]
    Urgent,
}

impl PriorityLevel {
    pub fn all() -> &'static [PriorityLevel] {
        &[
            PriorityLevel::Low,
            PriorityLevel::Medium,
            PriorityLevel::High,
            PriorityLevel::Urgent,
        ]
    }

    pub fn as_wire(&self) -> &'static str {
        match self {
            PriorityLevel::Low => "BAJA",
            PriorityLevel::Medium => "MEDIA",
            PriorityLevel::High => "ALTA",
            PriorityLevel::Urgent => "URGENCIA",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PriorityLevel::Low => "Low",
            PriorityLevel::Medium => "Medium",
            PriorityLevel::High => "High",
            PriorityLevel::Urgent => "Urgent",
        }
    }
}

/// Requester fields embedded in a ticket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentitySummary {
    pub id: IdentityId,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "correo")]
    pub email: String,
}

/// A stored attachment, downloadable from the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRef {
    pub id: i64,
    #[serde(rename = "nombreOriginal")]
    pub original_name: String,
    /// Path relative to the backend base address
    pub url: String,
}

impl AttachmentRef {
    /// Absolute download link for this attachment
    pub fn download_url(&self, base_url: &str) -> String {
        if self.url.starts_with("http://") || self.url.starts_with("https://") {
            self.url.clone()
        } else {
            format!("{}{}", base_url.trim_end_matches('/'), self.url)
        }
    }
}

/// A persisted ticket as returned by the backend. Read-only on this side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    #[serde(rename = "tipo")]
    pub ticket_type: TicketType,
    #[serde(rename = "nivelPrioridad")]
    pub priority_level: PriorityLevel,
    #[serde(
        rename = "prioridadCalculada",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub computed_priority: Option<f64>,
    #[serde(rename = "fechaCreacion")]
    pub created_at: String,
    #[serde(rename = "descripcion", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "usuario")]
    pub requester: IdentitySummary,
    #[serde(rename = "archivos", default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<AttachmentRef>>,
}

impl Ticket {
    /// Creation time parsed as a local timestamp, if the backend sent one we understand
    pub fn created_at_local(&self) -> Option<NaiveDateTime> {
        let raw = self.created_at.trim();
        // Offsets and zone suffixes are dropped; the backend stores local time.
        let raw = raw.trim_end_matches('Z');
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    }

    /// Creation time formatted for display, e.g. `13 Jan 2026, 10:35`
    pub fn created_at_display(&self) -> String {
        self.created_at_local()
            .map(|dt| dt.format("%-d %b %Y, %H:%M").to_string())
            .unwrap_or_else(|| self.created_at.clone())
    }

    /// Computed priority without a trailing `.0` for whole numbers
    pub fn computed_priority_display(&self) -> Option<String> {
        self.computed_priority.map(|p| {
            if p.fract() == 0.0 {
                format!("{}", p as i64)
            } else {
                format!("{p:.2}")
            }
        })
    }

    pub fn attachment_refs(&self) -> &[AttachmentRef] {
        self.attachments.as_deref().unwrap_or(&[])
    }

    pub fn has_description(&self) -> bool {
        self.description
            .as_deref()
            .is_some_and(|d| !d.trim().is_empty())
    }
}
