//! Second wizard step: the ticket itself plus its attachments

use crate::api::{ApiError, TicketBackend, TicketRequest, TicketSubmission};
use crate::types::{Identity, IdentityId, PriorityLevel, Ticket, TicketType};

use super::attachments::AttachmentSet;
use super::contact_form::FormError;

/// Fallback shown when the backend rejects a ticket without a message
pub const TICKET_FAILED: &str = "Failed to create ticket";

/// Fields the user edits on the ticket step. The requester comes from the
/// identity created on the contact step, and files live in an `AttachmentSet`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionDraft {
    pub ticket_type: TicketType,
    pub priority_level: PriorityLevel,
    pub description: String,
}

impl SubmissionDraft {
    /// Blank descriptions are sent as `null`
    pub fn to_request(&self, identity_id: IdentityId) -> TicketRequest {
        let description = self.description.trim();
        TicketRequest {
            ticket_type: self.ticket_type,
            priority_level: self.priority_level,
            identity_id,
            description: (!description.is_empty()).then(|| self.description.clone()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TicketForm {
    pub draft: SubmissionDraft,
    busy: bool,
}

impl TicketForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Snapshot the draft and attachments into a submission for `identity`
    pub fn begin_submit(
        &mut self,
        identity: &Identity,
        attachments: &AttachmentSet,
    ) -> Result<TicketSubmission, FormError> {
        if self.busy {
            return Err(FormError::Busy);
        }
        self.busy = true;
        Ok(TicketSubmission {
            request: self.draft.to_request(identity.id),
            files: attachments.items().to_vec(),
        })
    }

    /// Apply the backend's answer. Success resets the draft and empties the
    /// attachments; failure leaves both untouched.
    pub fn finish_submit(
        &mut self,
        result: Result<Ticket, ApiError>,
        attachments: &mut AttachmentSet,
    ) -> Result<Ticket, String> {
        self.busy = false;
        match result {
            Ok(ticket) => {
                tracing::info!(
                    ticket_id = ticket.id,
                    files = attachments.len(),
                    "Ticket created"
                );
                self.reset();
                attachments.clear();
                Ok(ticket)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Ticket creation failed");
                Err(e.user_message(TICKET_FAILED))
            }
        }
    }

    pub async fn submit(
        &mut self,
        identity: &Identity,
        attachments: &mut AttachmentSet,
        backend: &dyn TicketBackend,
    ) -> Result<Ticket, String> {
        let submission = self
            .begin_submit(identity, attachments)
            .map_err(|e| e.to_string())?;
        let result = backend.create_ticket(&submission).await;
        self.finish_submit(result, attachments)
    }

    pub fn reset(&mut self) {
        self.draft = SubmissionDraft::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{BackendCall, MockBackend};
    use crate::config::AttachmentsConfig;
    use crate::types::AttachmentCandidate;

    fn identity() -> Identity {
        Identity {
            id: 7,
            name: "Ana".to_string(),
            email: "ana@x.com".to_string(),
            phone: None,
        }
    }

    fn attachments_with(names: &[&str]) -> AttachmentSet {
        let mut set = AttachmentSet::from_config(&AttachmentsConfig::default());
        set.add(
            names
                .iter()
                .map(|n| AttachmentCandidate::new(*n, b"data".to_vec()))
                .collect(),
        )
        .unwrap();
        set
    }

    #[test]
    fn test_draft_defaults() {
        let draft = SubmissionDraft::default();
        assert_eq!(draft.ticket_type, TicketType::Incident);
        assert_eq!(draft.priority_level, PriorityLevel::Medium);
        assert!(draft.description.is_empty());
    }

    #[test]
    fn test_blank_description_becomes_null() {
        let draft = SubmissionDraft {
            description: " \n ".to_string(),
            ..Default::default()
        };
        assert_eq!(draft.to_request(7).description, None);

        let empty = SubmissionDraft::default();
        assert_eq!(empty.to_request(7).description, None);

        let padded = SubmissionDraft {
            description: "  Printer jam ".to_string(),
            ..Default::default()
        };
        assert_eq!(padded.to_request(7).description.as_deref(), Some("  Printer jam "));
    }

    #[tokio::test]
    async fn test_submit_sends_files_in_order_and_resets() {
        let backend = MockBackend::new();
        let mut form = TicketForm::new();
        form.draft.ticket_type = TicketType::Inquiry;
        form.draft.description = "Printer jam".to_string();
        let mut attachments = attachments_with(&["a.png", "b.pdf"]);

        let ticket = form
            .submit(&identity(), &mut attachments, &backend)
            .await
            .unwrap();

        assert_eq!(ticket.attachment_refs().len(), 2);
        assert_eq!(form.draft, SubmissionDraft::default());
        assert!(attachments.is_empty());
        assert_eq!(
            backend.recorded_calls(),
            vec![BackendCall::CreateTicket {
                request: TicketRequest {
                    ticket_type: TicketType::Inquiry,
                    priority_level: PriorityLevel::Medium,
                    identity_id: 7,
                    description: Some("Printer jam".to_string()),
                },
                file_names: vec!["a.png".to_string(), "b.pdf".to_string()],
            }]
        );
    }

    #[tokio::test]
    async fn test_failure_keeps_draft_and_attachments() {
        let backend = MockBackend::new();
        backend.fail_on_call(1, ApiError::request("POST /solicitudes", 500, ""));
        let mut form = TicketForm::new();
        form.draft.description = "keep me".to_string();
        let mut attachments = attachments_with(&["a.png"]);

        let err = form
            .submit(&identity(), &mut attachments, &backend)
            .await
            .unwrap_err();

        assert_eq!(err, TICKET_FAILED);
        assert_eq!(form.draft.description, "keep me");
        assert_eq!(attachments.len(), 1);
        assert!(!form.is_busy());
    }

    #[test]
    fn test_busy_refuses_second_begin() {
        let mut form = TicketForm::new();
        let attachments = attachments_with(&[]);
        assert!(form.begin_submit(&identity(), &attachments).is_ok());
        assert_eq!(
            form.begin_submit(&identity(), &attachments),
            Err(FormError::Busy)
        );
    }
}
