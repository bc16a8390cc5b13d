//! Intake forms and the wizard that sequences them: contact details, then
//! the ticket, then a confirmation.
//!
//! Everything here is UI-independent. Submissions are split into
//! `begin_*` (validate and snapshot a request) and `finish_*` (apply the
//! backend result) so the TUI can run the request on a background task.

pub mod attachments;
pub mod contact_form;
pub mod messages;
pub mod ticket_form;
pub mod wizard;

pub use attachments::{read_candidates, AttachmentError, AttachmentSet};
pub use contact_form::{ContactForm, FormError};
pub use messages::{MessageKind, MessageSlot, StatusMessage};
pub use ticket_form::{SubmissionDraft, TicketForm};
pub use wizard::{WizardController, WizardStep};
