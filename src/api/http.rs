//! reqwest implementation of the backend contract

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::{ApiError, TicketBackend, TicketRequest, TicketSubmission, FILE_PART_NAME, TICKET_PART_NAME};
use crate::config::{Config, LOCAL_TIMESTAMP_FORMAT};
use crate::types::{Identity, NewIdentity, Ticket};

const CREATE_IDENTITY: &str = "POST /usuarios";
const CREATE_TICKET: &str = "POST /solicitudes";
const CREATE_SYNTHETIC_TICKET: &str = "POST /solicitudes/prueba";
const LIST_ORDERED: &str = "GET /solicitudes/ordenadas";

/// HTTP client for the intake backend
pub struct HttpBackend {
    base_url: String,
    client: Client,
}

impl HttpBackend {
    /// Create a client for `base_url` with a per-request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::transport("client setup", e.to_string()))?;
        Ok(Self { base_url, client })
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::new(
            config.base_url(),
            Duration::from_secs(config.api.timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Map non-2xx responses to `ApiError::Request`, keeping the body's message
    async fn check(endpoint: &str, response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!(endpoint, status = status.as_u16(), "Backend rejected request");
        Err(ApiError::request(endpoint, status.as_u16(), &body))
    }

    async fn decode<T: DeserializeOwned>(endpoint: &str, response: Response) -> Result<T, ApiError> {
        response
            .json()
            .await
            .map_err(|e| ApiError::decode(endpoint, e.to_string()))
    }

    /// Build the multipart body. The boundary and content-type header are
    /// left to reqwest.
    fn multipart_form(submission: &TicketSubmission) -> Result<Form, ApiError> {
        let json = serde_json::to_string(&submission.request)
            .map_err(|e| ApiError::decode(CREATE_TICKET, e.to_string()))?;

        let ticket_part = Part::text(json)
            .file_name("solicitud.json")
            .mime_str("application/json")
            .map_err(|e| ApiError::decode(CREATE_TICKET, e.to_string()))?;

        let mut form = Form::new().part(TICKET_PART_NAME, ticket_part);

        for file in &submission.files {
            let part = Part::bytes(file.content.clone())
                .file_name(file.name.clone())
                .mime_str(file.content_type())
                .map_err(|e| ApiError::decode(CREATE_TICKET, e.to_string()))?;
            form = form.part(FILE_PART_NAME, part);
        }

        Ok(form)
    }
}

#[async_trait]
impl TicketBackend for HttpBackend {
    async fn create_identity(&self, identity: &NewIdentity) -> Result<Identity, ApiError> {
        debug!(endpoint = CREATE_IDENTITY, "Creating identity");

        let response = self
            .client
            .post(self.url("/usuarios"))
            .json(identity)
            .send()
            .await
            .map_err(|e| ApiError::transport(CREATE_IDENTITY, e.to_string()))?;

        let response = Self::check(CREATE_IDENTITY, response).await?;
        Self::decode(CREATE_IDENTITY, response).await
    }

    async fn create_ticket(&self, submission: &TicketSubmission) -> Result<Ticket, ApiError> {
        debug!(
            endpoint = CREATE_TICKET,
            identity_id = submission.request.identity_id,
            files = submission.files.len(),
            "Creating ticket"
        );

        let form = Self::multipart_form(submission)?;
        let response = self
            .client
            .post(self.url("/solicitudes"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ApiError::transport(CREATE_TICKET, e.to_string()))?;

        let response = Self::check(CREATE_TICKET, response).await?;
        Self::decode(CREATE_TICKET, response).await
    }

    async fn create_synthetic_ticket(
        &self,
        request: &TicketRequest,
        created_at: NaiveDateTime,
    ) -> Result<(), ApiError> {
        let created_at = created_at.format(LOCAL_TIMESTAMP_FORMAT).to_string();
        debug!(
            endpoint = CREATE_SYNTHETIC_TICKET,
            created_at = %created_at,
            "Creating synthetic ticket"
        );

        let response = self
            .client
            .post(self.url("/solicitudes/prueba"))
            .query(&[("fechaCreacion", created_at.as_str())])
            .json(request)
            .send()
            .await
            .map_err(|e| ApiError::transport(CREATE_SYNTHETIC_TICKET, e.to_string()))?;

        Self::check(CREATE_SYNTHETIC_TICKET, response).await?;
        Ok(())
    }

    async fn list_ordered_tickets(&self) -> Result<Vec<Ticket>, ApiError> {
        debug!(endpoint = LIST_ORDERED, "Loading ordered tickets");

        let response = self
            .client
            .get(self.url("/solicitudes/ordenadas"))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| ApiError::transport(LIST_ORDERED, e.to_string()))?;

        let response = Self::check(LIST_ORDERED, response).await?;
        Self::decode(LIST_ORDERED, response).await
    }
}
