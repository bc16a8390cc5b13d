//! Client side of the intake backend contract
//!
//! This module provides:
//! - The `TicketBackend` trait the wizard and workspace talk to
//! - `HttpBackend`, the reqwest implementation
//! - `MockBackend`, an in-memory implementation that records every call
//! - Error handling shared by all of them

pub mod error;
mod http;
pub mod mock;

pub use error::ApiError;
pub use http::HttpBackend;
pub use mock::{BackendCall, MockBackend};

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Serialize;

use crate::types::{
    AttachmentCandidate, Identity, IdentityId, NewIdentity, PriorityLevel, Ticket, TicketType,
};

/// Multipart field carrying the JSON ticket body
pub const TICKET_PART_NAME: &str = "solicitud";
/// Multipart field repeated once per attached file
pub const FILE_PART_NAME: &str = "archivos";

/// JSON body describing a ticket, shared by the regular and synthetic endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketRequest {
    #[serde(rename = "tipo")]
    pub ticket_type: TicketType,
    #[serde(rename = "nivelPrioridad")]
    pub priority_level: PriorityLevel,
    #[serde(rename = "usuarioId")]
    pub identity_id: IdentityId,
    /// Serialized as `null` when absent
    #[serde(rename = "descripcion")]
    pub description: Option<String>,
}

/// Everything needed for `POST /solicitudes`: the JSON part plus files in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketSubmission {
    pub request: TicketRequest,
    pub files: Vec<AttachmentCandidate>,
}

/// Trait for the backend that stores identities and tickets
///
/// Implementations must be shareable across tasks: the TUI issues each call
/// from a spawned task and reports the result back to the event loop.
#[async_trait]
pub trait TicketBackend: Send + Sync {
    /// `POST /usuarios`
    async fn create_identity(&self, identity: &NewIdentity) -> Result<Identity, ApiError>;

    /// `POST /solicitudes` as multipart
    async fn create_ticket(&self, submission: &TicketSubmission) -> Result<Ticket, ApiError>;

    /// `POST /solicitudes/prueba?fechaCreacion=...` with a fabricated creation time
    async fn create_synthetic_ticket(
        &self,
        request: &TicketRequest,
        created_at: NaiveDateTime,
    ) -> Result<(), ApiError>;

    /// `GET /solicitudes/ordenadas`, already sorted by descending computed priority
    async fn list_ordered_tickets(&self) -> Result<Vec<Ticket>, ApiError>;
}
