//! Step controller for contact -> ticket -> confirmation

use std::time::{Duration, Instant};

use crate::api::{ApiError, TicketBackend, TicketSubmission};
use crate::config::Config;
use crate::types::{AttachmentCandidate, Identity, NewIdentity, Ticket};

use super::attachments::AttachmentSet;
use super::contact_form::{ContactForm, FormError};
use super::messages::{MessageKind, MessageSlot, StatusMessage};
use super::ticket_form::TicketForm;

pub const CONTACT_CREATED: &str = "Contact created successfully!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    Contact,
    Ticket,
    Confirmation,
}

impl WizardStep {
    pub fn title(&self) -> &'static str {
        match self {
            WizardStep::Contact => "Contact details",
            WizardStep::Ticket => "Ticket details",
            WizardStep::Confirmation => "Submitted",
        }
    }

    /// 1-based position shown in the progress header
    pub fn number(&self) -> usize {
        match self {
            WizardStep::Contact => 1,
            WizardStep::Ticket => 2,
            WizardStep::Confirmation => 3,
        }
    }
}

/// Drives the intake wizard.
///
/// The ticket step is only reachable once an identity has been created. After
/// a successful contact submission the step advances on the first `tick` at or
/// past the configured delay, so the success message can be read first.
#[derive(Debug, Clone)]
pub struct WizardController {
    step: WizardStep,
    identity: Option<Identity>,
    submitted: Option<Ticket>,
    pub contact: ContactForm,
    pub ticket: TicketForm,
    pub attachments: AttachmentSet,
    messages: MessageSlot,
    advance_delay: Duration,
    advance_at: Option<Instant>,
    /// Bumped whenever the ticket draft is discarded or submitted
    draft: u64,
}

impl WizardController {
    pub fn new(attachments: AttachmentSet, advance_delay: Duration, message_ttl: Duration) -> Self {
        Self {
            step: WizardStep::Contact,
            identity: None,
            submitted: None,
            contact: ContactForm::new(),
            ticket: TicketForm::new(),
            attachments,
            messages: MessageSlot::new(message_ttl),
            advance_delay,
            advance_at: None,
            draft: 0,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            AttachmentSet::from_config(&config.attachments),
            config.ui.advance_delay(),
            config.ui.message_ttl(),
        )
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// The ticket accepted by the backend, while on the confirmation step
    pub fn submitted_ticket(&self) -> Option<&Ticket> {
        self.submitted.as_ref()
    }

    pub fn message(&self, now: Instant) -> Option<&StatusMessage> {
        self.messages.current(now)
    }

    pub fn show_message(&mut self, kind: MessageKind, text: impl Into<String>, now: Instant) {
        self.messages.show(kind, text, now);
    }

    /// True between a successful contact submission and the step change
    /// Identifies the current ticket draft. File reads started under an
    /// older draft are dropped by `add_attachments_to`.
    pub fn draft_id(&self) -> u64 {
        self.draft
    }

    pub fn is_advancing(&self) -> bool {
        self.advance_at.is_some()
    }

    pub fn is_busy(&self) -> bool {
        self.contact.is_busy() || self.ticket.is_busy()
    }

    /// Start a contact submission. Validation problems are also shown as an
    /// error message.
    pub fn begin_contact_submit(&mut self, now: Instant) -> Result<NewIdentity, FormError> {
        if self.step != WizardStep::Contact {
            return Err(FormError::WrongStep);
        }
        if self.advance_at.is_some() {
            return Err(FormError::Busy);
        }
        self.contact.begin_submit().inspect_err(|e| {
            if *e != FormError::Busy {
                self.messages.show(MessageKind::Error, e.to_string(), now);
            }
        })
    }

    /// Apply the contact result; returns whether it succeeded
    pub fn finish_contact_submit(&mut self, result: Result<Identity, ApiError>, now: Instant) -> bool {
        match self.contact.finish_submit(result) {
            Ok(identity) => {
                self.identity = Some(identity);
                self.messages.show(MessageKind::Success, CONTACT_CREATED, now);
                self.advance_at = Some(now + self.advance_delay);
                true
            }
            Err(message) => {
                self.messages.show(MessageKind::Error, message, now);
                false
            }
        }
    }

    /// Perform any due step change and expire old messages.
    /// Returns true if the step changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.messages.tick(now);

        match self.advance_at {
            Some(deadline) if now >= deadline => {
                self.advance_at = None;
                if self.step == WizardStep::Contact && self.identity.is_some() {
                    self.step = WizardStep::Ticket;
                    tracing::debug!("Wizard advanced to ticket step");
                    return true;
                }
                false
            }
            _ => false,
        }
    }

    /// Append files chosen by the user. Rejected batches surface as an error message.
    ///
    /// Only the ticket step accepts files, and not while its submission is in flight.
    pub fn add_attachments(&mut self, candidates: Vec<AttachmentCandidate>, now: Instant) -> bool {
        if self.step != WizardStep::Ticket {
            tracing::debug!(step = ?self.step, "Ignored attachments outside the ticket step");
            return false;
        }
        if self.ticket.is_busy() {
            self.messages.show(
                MessageKind::Error,
                "Wait for the current submission to finish before adding files",
                now,
            );
            return false;
        }
        match self.attachments.add(candidates) {
            Ok(_) => true,
            Err(e) => {
                self.messages.show(MessageKind::Error, e.to_string(), now);
                false
            }
        }
    }

    /// Like `add_attachments`, for files read under draft `draft_id`
    pub fn add_attachments_to(
        &mut self,
        draft_id: u64,
        candidates: Vec<AttachmentCandidate>,
        now: Instant,
    ) -> bool {
        if draft_id != self.draft {
            tracing::debug!(
                files = candidates.len(),
                "Dropped attachments read for a discarded draft"
            );
            return false;
        }
        self.add_attachments(candidates, now)
    }

    pub fn remove_attachment(&mut self, index: usize) -> Option<AttachmentCandidate> {
        self.attachments.remove(index)
    }

    pub fn begin_ticket_submit(&mut self) -> Result<TicketSubmission, FormError> {
        if self.step != WizardStep::Ticket {
            return Err(FormError::WrongStep);
        }
        let identity = self.identity.as_ref().ok_or(FormError::NoIdentity)?;
        self.ticket.begin_submit(identity, &self.attachments)
    }

    /// Apply the ticket result; success moves to the confirmation step
    pub fn finish_ticket_submit(&mut self, result: Result<Ticket, ApiError>, now: Instant) -> bool {
        match self.ticket.finish_submit(result, &mut self.attachments) {
            Ok(ticket) => {
                self.submitted = Some(ticket);
                self.draft += 1;
                self.step = WizardStep::Confirmation;
                self.messages.clear();
                true
            }
            Err(message) => {
                self.messages.show(MessageKind::Error, message, now);
                false
            }
        }
    }

    /// Ticket step back to the contact step. The draft and attachments are discarded.
    pub fn back(&mut self) -> bool {
        if self.step != WizardStep::Ticket || self.ticket.is_busy() {
            return false;
        }
        self.ticket.reset();
        self.attachments.clear();
        self.draft += 1;
        self.step = WizardStep::Contact;
        true
    }

    /// Confirmation back to a fresh contact step with no identity bound
    pub fn create_another(&mut self) -> bool {
        if self.step != WizardStep::Confirmation {
            return false;
        }
        self.identity = None;
        self.submitted = None;
        self.advance_at = None;
        self.contact.clear();
        self.ticket.reset();
        self.attachments.clear();
        self.messages.clear();
        self.draft += 1;
        self.step = WizardStep::Contact;
        true
    }

    /// Submit the contact step against `backend` in one call
    pub async fn submit_contact(&mut self, backend: &dyn TicketBackend) -> bool {
        let Ok(request) = self.begin_contact_submit(Instant::now()) else {
            return false;
        };
        let result = backend.create_identity(&request).await;
        self.finish_contact_submit(result, Instant::now())
    }

    /// Submit the ticket step against `backend` in one call
    pub async fn submit_ticket(&mut self, backend: &dyn TicketBackend) -> bool {
        let submission = match self.begin_ticket_submit() {
            Ok(submission) => submission,
            Err(e) => {
                self.messages.show(MessageKind::Error, e.to_string(), Instant::now());
                return false;
            }
        };
        let result = backend.create_ticket(&submission).await;
        self.finish_ticket_submit(result, Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockBackend;

    fn wizard() -> WizardController {
        WizardController::from_config(&Config::default())
    }

    fn fill_contact(wizard: &mut WizardController) {
        wizard.contact.name = "Ana".to_string();
        wizard.contact.email = "ana@x.com".to_string();
    }

    fn identity() -> Identity {
        Identity {
            id: 1,
            name: "Ana".to_string(),
            email: "ana@x.com".to_string(),
            phone: None,
        }
    }

    fn at_ticket_step(t0: Instant) -> WizardController {
        let mut wizard = wizard();
        fill_contact(&mut wizard);
        wizard.begin_contact_submit(t0).unwrap();
        wizard.finish_contact_submit(Ok(identity()), t0);
        wizard.tick(t0 + Duration::from_secs(1));
        assert_eq!(wizard.step(), WizardStep::Ticket);
        wizard
    }

    fn file(name: &str) -> AttachmentCandidate {
        AttachmentCandidate::new(name, b"x".to_vec())
    }

    #[test]
    fn test_advances_only_after_delay() {
        let mut wizard = wizard();
        fill_contact(&mut wizard);
        let t0 = Instant::now();

        wizard.begin_contact_submit(t0).unwrap();
        assert!(wizard.finish_contact_submit(Ok(identity()), t0));
        assert_eq!(wizard.message(t0).unwrap().text, CONTACT_CREATED);
        assert_eq!(wizard.step(), WizardStep::Contact);

        assert!(!wizard.tick(t0 + Duration::from_millis(999)));
        assert_eq!(wizard.step(), WizardStep::Contact);

        assert!(wizard.tick(t0 + Duration::from_millis(1000)));
        assert_eq!(wizard.step(), WizardStep::Ticket);
        assert_eq!(wizard.identity().unwrap().id, 1);
    }

    #[test]
    fn test_no_resubmit_while_advance_pending() {
        let mut wizard = wizard();
        fill_contact(&mut wizard);
        let t0 = Instant::now();
        wizard.begin_contact_submit(t0).unwrap();
        wizard.finish_contact_submit(Ok(identity()), t0);

        fill_contact(&mut wizard);
        assert_eq!(wizard.begin_contact_submit(t0), Err(FormError::Busy));
    }

    #[test]
    fn test_contact_failure_stays_on_contact() {
        let mut wizard = wizard();
        fill_contact(&mut wizard);
        let t0 = Instant::now();
        wizard.begin_contact_submit(t0).unwrap();

        let failed = wizard.finish_contact_submit(
            Err(ApiError::transport("POST /usuarios", "connection refused")),
            t0,
        );
        assert!(!failed);
        assert!(!wizard.tick(t0 + Duration::from_secs(2)));
        assert_eq!(wizard.step(), WizardStep::Contact);
        assert!(wizard.identity().is_none());
        assert_eq!(wizard.contact.name, "Ana");
    }

    #[test]
    fn test_validation_error_is_shown() {
        let mut wizard = wizard();
        let t0 = Instant::now();
        assert!(wizard.begin_contact_submit(t0).is_err());
        assert_eq!(wizard.message(t0).unwrap().kind, MessageKind::Error);
        assert_eq!(wizard.message(t0).unwrap().text, "Name is required");
    }

    #[test]
    fn test_ticket_step_requires_identity() {
        let mut wizard = wizard();
        assert_eq!(wizard.begin_ticket_submit(), Err(FormError::WrongStep));
        assert!(!wizard.back());
        assert!(!wizard.create_another());
    }

    #[test]
    fn test_oversized_attachment_message() {
        let t0 = Instant::now();
        let mut wizard = at_ticket_step(t0);
        let huge = AttachmentCandidate {
            name: "huge.iso".to_string(),
            size_bytes: 11 * 1024 * 1024,
            content: Vec::new(),
        };
        assert!(!wizard.add_attachments(vec![huge], t0));
        assert!(wizard.attachments.is_empty());
        assert_eq!(
            wizard.message(t0).unwrap().text,
            "Some files exceed the maximum allowed size (10 MB)"
        );
    }

    #[test]
    fn test_attachments_only_on_ticket_step() {
        let t0 = Instant::now();
        let mut wizard = wizard();
        assert!(!wizard.add_attachments(vec![file("early.txt")], t0));
        assert!(wizard.attachments.is_empty());

        let mut wizard = at_ticket_step(t0);
        assert!(wizard.add_attachments(vec![file("ok.txt")], t0));
        assert_eq!(wizard.attachments.len(), 1);
    }

    #[test]
    fn test_read_for_discarded_draft_is_dropped() {
        let t0 = Instant::now();
        let mut wizard = at_ticket_step(t0);
        let draft = wizard.draft_id();

        // The read finishes after the user went back and returned
        assert!(wizard.back());
        fill_contact(&mut wizard);
        wizard.begin_contact_submit(t0).unwrap();
        wizard.finish_contact_submit(Ok(identity()), t0);
        wizard.tick(t0 + Duration::from_secs(1));
        assert_eq!(wizard.step(), WizardStep::Ticket);

        assert!(!wizard.add_attachments_to(draft, vec![file("stale.txt")], t0));
        assert!(wizard.attachments.is_empty());

        let current = wizard.draft_id();
        assert!(wizard.add_attachments_to(current, vec![file("fresh.txt")], t0));
        assert_eq!(wizard.attachments.items()[0].name, "fresh.txt");
    }

    #[test]
    fn test_no_attachments_while_submitting() {
        let t0 = Instant::now();
        let mut wizard = at_ticket_step(t0);
        let draft = wizard.draft_id();
        wizard.begin_ticket_submit().unwrap();

        assert!(!wizard.add_attachments_to(draft, vec![file("late.txt")], t0));
        assert!(wizard.attachments.is_empty());
        assert_eq!(wizard.message(t0).unwrap().kind, MessageKind::Error);
    }

    #[test]
    fn test_contact_submit_off_step_is_wrong_step() {
        let t0 = Instant::now();
        let mut wizard = at_ticket_step(t0);
        fill_contact(&mut wizard);
        assert_eq!(wizard.begin_contact_submit(t0), Err(FormError::WrongStep));
    }

    #[tokio::test]
    async fn test_full_flow_and_create_another() {
        let backend = MockBackend::new();
        let mut wizard = wizard();
        fill_contact(&mut wizard);

        assert!(wizard.submit_contact(&backend).await);
        wizard.tick(Instant::now() + Duration::from_secs(2));
        assert_eq!(wizard.step(), WizardStep::Ticket);

        wizard.ticket.draft.description = "Printer jam".to_string();
        assert!(wizard.add_attachments(
            vec![AttachmentCandidate::new("jam.png", vec![1, 2, 3])],
            Instant::now()
        ));
        assert!(wizard.submit_ticket(&backend).await);
        assert_eq!(wizard.step(), WizardStep::Confirmation);
        assert!(wizard.attachments.is_empty());
        assert_eq!(wizard.submitted_ticket().unwrap().attachment_refs().len(), 1);

        assert!(wizard.create_another());
        assert_eq!(wizard.step(), WizardStep::Contact);
        assert!(wizard.identity().is_none());
        assert!(wizard.contact.name.is_empty());
    }

    #[tokio::test]
    async fn test_back_discards_draft() {
        let backend = MockBackend::new();
        let mut wizard = wizard();
        fill_contact(&mut wizard);
        wizard.submit_contact(&backend).await;
        wizard.tick(Instant::now() + Duration::from_secs(2));

        wizard.ticket.draft.description = "draft".to_string();
        wizard.add_attachments(
            vec![AttachmentCandidate::new("a.txt", b"x".to_vec())],
            Instant::now(),
        );
        assert!(wizard.back());

        assert_eq!(wizard.step(), WizardStep::Contact);
        assert!(wizard.ticket.draft.description.is_empty());
        assert!(wizard.attachments.is_empty());
    }

    #[tokio::test]
    async fn test_ticket_failure_stays_on_ticket_step() {
        let backend = MockBackend::new();
        backend.fail_on_call(
            2,
            ApiError::request("POST /solicitudes", 400, r#"{"message":"Descripción demasiado larga"}"#),
        );
        let mut wizard = wizard();
        fill_contact(&mut wizard);
        wizard.submit_contact(&backend).await;
        wizard.tick(Instant::now() + Duration::from_secs(2));

        wizard.ticket.draft.description = "x".repeat(10);
        assert!(!wizard.submit_ticket(&backend).await);
        assert_eq!(wizard.step(), WizardStep::Ticket);
        assert_eq!(
            wizard.message(Instant::now()).unwrap().text,
            "Descripción demasiado larga"
        );
        assert_eq!(wizard.ticket.draft.description.len(), 10);
    }
}
