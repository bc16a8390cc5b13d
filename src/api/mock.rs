//! In-memory backend for tests and offline demos

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDateTime;

use super::{ApiError, TicketBackend, TicketRequest, TicketSubmission};
use crate::types::{
    AttachmentRef, Identity, IdentitySummary, NewIdentity, Ticket, TicketId,
};

/// A call received by the mock, in arrival order
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    CreateIdentity(NewIdentity),
    CreateTicket {
        request: TicketRequest,
        file_names: Vec<String>,
    },
    CreateSyntheticTicket {
        request: TicketRequest,
        created_at: NaiveDateTime,
    },
    ListOrderedTickets,
}

/// Mock implementation for testing
///
/// Identities and tickets get sequential ids. Failures are scripted by call
/// number (1-based, counted across every endpoint) so a test can make the
/// n-th request of a sequence fail.
#[derive(Default, Clone)]
pub struct MockBackend {
    /// Record of calls received
    pub calls: Arc<Mutex<Vec<BackendCall>>>,
    /// Identities created so far
    pub identities: Arc<Mutex<Vec<Identity>>>,
    /// Tickets returned by the ordered listing, in listing order
    pub tickets: Arc<Mutex<Vec<Ticket>>>,
    /// Call number -> error to return instead of succeeding
    failures: Arc<Mutex<HashMap<usize, ApiError>>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock whose listing returns `tickets` as given
    pub fn with_tickets(tickets: Vec<Ticket>) -> Self {
        let mock = Self::new();
        *mock.tickets.lock().unwrap() = tickets;
        mock
    }

    /// Make the `call_number`-th call (1-based) fail with `error`
    pub fn fail_on_call(&self, call_number: usize, error: ApiError) {
        self.failures.lock().unwrap().insert(call_number, error);
    }

    /// Replace the tickets returned by the listing
    pub fn set_tickets(&self, tickets: Vec<Ticket>) {
        *self.tickets.lock().unwrap() = tickets;
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn recorded_calls(&self) -> Vec<BackendCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Record a call and return the scripted failure for it, if any
    fn record(&self, call: BackendCall) -> Result<(), ApiError> {
        let mut calls = self.calls.lock().unwrap();
        calls.push(call);
        let number = calls.len();
        match self.failures.lock().unwrap().remove(&number) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn next_ticket_id(&self) -> TicketId {
        self.tickets
            .lock()
            .unwrap()
            .iter()
            .map(|t| t.id)
            .max()
            .unwrap_or(0)
            + 1
    }

    fn summary_for(&self, identity_id: i64) -> IdentitySummary {
        self.identities
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.id == identity_id)
            .map(|i| IdentitySummary {
                id: i.id,
                name: i.name.clone(),
                email: i.email.clone(),
            })
            .unwrap_or(IdentitySummary {
                id: identity_id,
                name: String::new(),
                email: String::new(),
            })
    }

    fn store_ticket(&self, request: &TicketRequest, created_at: String, file_names: &[String]) -> Ticket {
        let id = self.next_ticket_id();
        let attachments = if file_names.is_empty() {
            None
        } else {
            Some(
                file_names
                    .iter()
                    .enumerate()
                    .map(|(i, name)| AttachmentRef {
                        id: i as i64 + 1,
                        original_name: name.clone(),
                        url: format!("/archivos/{id}/{}", i + 1),
                    })
                    .collect(),
            )
        };
        let ticket = Ticket {
            id,
            ticket_type: request.ticket_type,
            priority_level: request.priority_level,
            computed_priority: None,
            created_at,
            description: request.description.clone(),
            requester: self.summary_for(request.identity_id),
            attachments,
        };
        self.tickets.lock().unwrap().push(ticket.clone());
        ticket
    }
}

#[async_trait]
impl TicketBackend for MockBackend {
    async fn create_identity(&self, identity: &NewIdentity) -> Result<Identity, ApiError> {
        self.record(BackendCall::CreateIdentity(identity.clone()))?;

        let mut identities = self.identities.lock().unwrap();
        let created = Identity {
            id: identities.len() as i64 + 1,
            name: identity.name.clone(),
            email: identity.email.clone(),
            phone: identity.phone.clone(),
        };
        identities.push(created.clone());
        Ok(created)
    }

    async fn create_ticket(&self, submission: &TicketSubmission) -> Result<Ticket, ApiError> {
        let file_names: Vec<String> = submission.files.iter().map(|f| f.name.clone()).collect();
        self.record(BackendCall::CreateTicket {
            request: submission.request.clone(),
            file_names: file_names.clone(),
        })?;

        let now = chrono::Local::now().naive_local();
        Ok(self.store_ticket(
            &submission.request,
            now.format(crate::config::LOCAL_TIMESTAMP_FORMAT).to_string(),
            &file_names,
        ))
    }

    async fn create_synthetic_ticket(
        &self,
        request: &TicketRequest,
        created_at: NaiveDateTime,
    ) -> Result<(), ApiError> {
        self.record(BackendCall::CreateSyntheticTicket {
            request: request.clone(),
            created_at,
        })?;

        self.store_ticket(
            request,
            created_at
                .format(crate::config::LOCAL_TIMESTAMP_FORMAT)
                .to_string(),
            &[],
        );
        Ok(())
    }

    async fn list_ordered_tickets(&self) -> Result<Vec<Ticket>, ApiError> {
        self.record(BackendCall::ListOrderedTickets)?;
        Ok(self.tickets.lock().unwrap().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PriorityLevel, TicketType};

    fn new_identity(name: &str) -> NewIdentity {
        NewIdentity {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            phone: None,
        }
    }

    #[tokio::test]
    async fn test_assigns_sequential_identity_ids() {
        let mock = MockBackend::new();
        let a = mock.create_identity(&new_identity("Ana")).await.unwrap();
        let b = mock.create_identity(&new_identity("Luis")).await.unwrap();
        assert_eq!((a.id, b.id), (1, 2));
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_scripted_failure_hits_only_that_call() {
        let mock = MockBackend::new();
        mock.fail_on_call(2, ApiError::transport("POST /usuarios", "reset"));

        assert!(mock.create_identity(&new_identity("Ana")).await.is_ok());
        assert!(mock.create_identity(&new_identity("Luis")).await.is_err());
        assert!(mock.create_identity(&new_identity("Sofia")).await.is_ok());
        // The failed call created nothing
        assert_eq!(mock.identities.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_tickets_reference_their_requester() {
        let mock = MockBackend::new();
        let identity = mock.create_identity(&new_identity("Ana")).await.unwrap();
        let request = TicketRequest {
            ticket_type: TicketType::Inquiry,
            priority_level: PriorityLevel::Low,
            identity_id: identity.id,
            description: Some("hola".to_string()),
        };
        let created_at =
            NaiveDateTime::parse_from_str("2026-01-03T10:35:00", "%Y-%m-%dT%H:%M:%S").unwrap();
        mock.create_synthetic_ticket(&request, created_at)
            .await
            .unwrap();

        let listed = mock.list_ordered_tickets().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].requester.name, "Ana");
        assert_eq!(listed[0].created_at, "2026-01-03T10:35:00");
    }
}
