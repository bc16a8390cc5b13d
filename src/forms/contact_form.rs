//! First wizard step: collect the requester's contact details

use thiserror::Error;

use crate::api::{ApiError, TicketBackend};
use crate::types::{Identity, NewIdentity};

/// Fallback shown when the backend rejects a contact without a message
pub const CONTACT_FAILED: &str = "Failed to create contact";

/// Local problems that stop a submission before any request is sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("A submission is already in progress")]
    Busy,

    #[error("Not available at this step")]
    WrongStep,

    #[error("Create a contact before filing a ticket")]
    NoIdentity,
}

/// Contact form state. Phone is optional; blank phone is omitted from the request.
#[derive(Debug, Clone, Default)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    busy: bool,
}

impl ContactForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Build the request, checking the required fields
    pub fn validate(&self) -> Result<NewIdentity, FormError> {
        let name = self.name.trim();
        let email = self.email.trim();
        let phone = self.phone.trim();

        if name.is_empty() {
            return Err(FormError::MissingField("Name"));
        }
        if email.is_empty() {
            return Err(FormError::MissingField("Email"));
        }

        Ok(NewIdentity {
            name: name.to_string(),
            email: email.to_string(),
            phone: (!phone.is_empty()).then(|| phone.to_string()),
        })
    }

    /// Validate and mark the form busy. While busy, further attempts are refused.
    pub fn begin_submit(&mut self) -> Result<NewIdentity, FormError> {
        if self.busy {
            return Err(FormError::Busy);
        }
        let request = self.validate()?;
        self.busy = true;
        Ok(request)
    }

    /// Apply the backend's answer. On success the fields are cleared; on
    /// failure they are kept and the user-facing message is returned.
    pub fn finish_submit(&mut self, result: Result<Identity, ApiError>) -> Result<Identity, String> {
        self.busy = false;
        match result {
            Ok(identity) => {
                tracing::info!(identity_id = identity.id, "Contact created");
                self.clear();
                Ok(identity)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Contact creation failed");
                Err(e.user_message(CONTACT_FAILED))
            }
        }
    }

    /// Submit in one step against `backend`
    pub async fn submit(&mut self, backend: &dyn TicketBackend) -> Result<Identity, String> {
        let request = self.begin_submit().map_err(|e| e.to_string())?;
        let result = backend.create_identity(&request).await;
        self.finish_submit(result)
    }

    pub fn clear(&mut self) {
        self.name.clear();
        self.email.clear();
        self.phone.clear();
    }
}
