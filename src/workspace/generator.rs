//! Synthetic ticket generator for demos and manual testing.
//!
//! Creates ten identities from a fixed roster, each followed by one ticket
//! with a fabricated creation time, so the priority ordering has realistic
//! ages to work with. Requests are issued strictly one after another.

use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike};
use thiserror::Error;

use crate::api::{ApiError, TicketBackend, TicketRequest};
use crate::config::GeneratorConfig;
use crate::types::{Identity, NewIdentity, PriorityLevel, TicketType};

/// Two requests per roster entry
pub const REQUESTS_PER_ENTRY: usize = 2;

struct RosterEntry {
    name: &'static str,
    email: &'static str,
    description: &'static str,
}

const ROSTER: [RosterEntry; 10] = [
    RosterEntry {
        name: "Pedro Pérez",
        email: "pedro@example.com",
        description: "Se daño el carro ñañaña",
    },
    RosterEntry {
        name: "María González",
        email: "maria@example.com",
        description: "Necesito actualizar mi información de contacto",
    },
    RosterEntry {
        name: "Juan Rodríguez",
        email: "juan@example.com",
        description: "¿Cómo puedo cambiar mi contraseña?",
    },
    RosterEntry {
        name: "Ana Martínez",
        email: "ana@example.com",
        description: "El sistema no está funcionando correctamente",
    },
    RosterEntry {
        name: "Carlos López",
        email: "carlos@example.com",
        description: "Solicito acceso a nuevos módulos",
    },
    RosterEntry {
        name: "Laura Sánchez",
        email: "laura@example.com",
        description: "Tengo una pregunta sobre facturación",
    },
    RosterEntry {
        name: "Diego Fernández",
        email: "diego@example.com",
        description: "Error al iniciar sesión",
    },
    RosterEntry {
        name: "Sofía Ramírez",
        email: "sofia@example.com",
        description: "Necesito ayuda con la configuración",
    },
    RosterEntry {
        name: "Luis Torres",
        email: "luis@example.com",
        description: "Problema con la impresora",
    },
    RosterEntry {
        name: "Carmen Díaz",
        email: "carmen@example.com",
        description: "Consulta sobre políticas de la empresa",
    },
];

/// Age of each roster entry's ticket as (days, hours) before the reference
const AGE_SCHEDULE: [(i64, i64); 10] = [
    (10, 0),
    (8, 0),
    (6, 0),
    (4, 0),
    (3, 0),
    (2, 0),
    (1, 0),
    (0, 12),
    (0, 6),
    (0, 2),
];

const TYPE_CYCLE: [TicketType; 3] = [
    TicketType::Incident,
    TicketType::Requirement,
    TicketType::Inquiry,
];

const LEVEL_CYCLE: [PriorityLevel; 4] = [
    PriorityLevel::Low,
    PriorityLevel::Medium,
    PriorityLevel::High,
    PriorityLevel::Urgent,
];

/// Minute every fabricated timestamp is pinned to
const FABRICATED_MINUTE: u32 = 35;

/// One identity and the ticket filed for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedTicket {
    pub identity: NewIdentity,
    pub ticket_type: TicketType,
    pub priority_level: PriorityLevel,
    pub description: String,
    pub created_at: NaiveDateTime,
}

impl PlannedTicket {
    fn request_for(&self, identity: &Identity) -> TicketRequest {
        TicketRequest {
            ticket_type: self.ticket_type,
            priority_level: self.priority_level,
            identity_id: identity.id,
            description: Some(self.description.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationStep {
    CreateIdentity,
    CreateTicket,
}

impl std::fmt::Display for GenerationStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationStep::CreateIdentity => write!(f, "creating contact"),
            GenerationStep::CreateTicket => write!(f, "creating ticket"),
        }
    }
}

/// The run stopped at `request` (1-based). Earlier requests stay applied.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Synthetic data stopped at request {request} of {total} ({step}): {}", source.user_message("request rejected"))]
pub struct GenerationError {
    pub request: usize,
    pub total: usize,
    pub step: GenerationStep,
    #[source]
    pub source: ApiError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationReport {
    pub identities: Vec<Identity>,
    pub tickets_created: usize,
}

impl GenerationReport {
    pub fn summary(&self) -> String {
        format!(
            "Generated {} synthetic tickets for {} contacts",
            self.tickets_created,
            self.identities.len()
        )
    }
}

#[derive(Debug, Clone)]
pub struct SyntheticGenerator {
    reference: NaiveDateTime,
}

impl SyntheticGenerator {
    pub fn new(reference: NaiveDateTime) -> Self {
        Self { reference }
    }

    pub fn from_config(config: &GeneratorConfig) -> anyhow::Result<Self> {
        Ok(Self::new(config.reference()?))
    }

    pub fn total_requests(&self) -> usize {
        ROSTER.len() * REQUESTS_PER_ENTRY
    }

    /// Creation time for an entry: reference minus its age, at minute 35
    fn fabricated_time(&self, days: i64, hours: i64) -> NaiveDateTime {
        let shifted = self.reference - Duration::days(days) - Duration::hours(hours);
        let pinned = NaiveTime::from_hms_opt(shifted.hour(), FABRICATED_MINUTE, 0)
            .unwrap_or_else(|| shifted.time());
        shifted.date().and_time(pinned)
    }

    /// The full request plan, in issue order
    pub fn plan(&self) -> Vec<PlannedTicket> {
        ROSTER
            .iter()
            .zip(AGE_SCHEDULE.iter())
            .enumerate()
            .map(|(i, (entry, (days, hours)))| PlannedTicket {
                identity: NewIdentity {
                    name: entry.name.to_string(),
                    email: entry.email.to_string(),
                    phone: Some(format!("+34 600 {i:06}")),
                },
                ticket_type: TYPE_CYCLE[i % TYPE_CYCLE.len()],
                priority_level: LEVEL_CYCLE[i % LEVEL_CYCLE.len()],
                description: entry.description.to_string(),
                created_at: self.fabricated_time(*days, *hours),
            })
            .collect()
    }

    /// Issue the plan against `backend`, stopping at the first failure
    pub async fn run(&self, backend: &dyn TicketBackend) -> Result<GenerationReport, GenerationError> {
        let plan = self.plan();
        let total = plan.len() * REQUESTS_PER_ENTRY;
        let mut report = GenerationReport {
            identities: Vec::with_capacity(plan.len()),
            tickets_created: 0,
        };

        tracing::info!(total, "Generating synthetic tickets");

        for (i, planned) in plan.iter().enumerate() {
            let identity_request = i * REQUESTS_PER_ENTRY + 1;
            let identity = backend
                .create_identity(&planned.identity)
                .await
                .map_err(|source| GenerationError {
                    request: identity_request,
                    total,
                    step: GenerationStep::CreateIdentity,
                    source,
                })?;

            backend
                .create_synthetic_ticket(&planned.request_for(&identity), planned.created_at)
                .await
                .map_err(|source| GenerationError {
                    request: identity_request + 1,
                    total,
                    step: GenerationStep::CreateTicket,
                    source,
                })?;

            report.identities.push(identity);
            report.tickets_created += 1;
        }

        tracing::info!(tickets = report.tickets_created, "Synthetic tickets generated");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{BackendCall, MockBackend};
    use crate::config::LOCAL_TIMESTAMP_FORMAT;

    fn generator() -> SyntheticGenerator {
        SyntheticGenerator::from_config(&GeneratorConfig::default()).unwrap()
    }

    #[test]
    fn test_plan_timestamps() {
        let stamps: Vec<String> = generator()
            .plan()
            .iter()
            .map(|p| p.created_at.format(LOCAL_TIMESTAMP_FORMAT).to_string())
            .collect();
        assert_eq!(
            stamps,
            vec![
                "2026-01-03T10:35:00",
                "2026-01-05T10:35:00",
                "2026-01-07T10:35:00",
                "2026-01-09T10:35:00",
                "2026-01-10T10:35:00",
                "2026-01-11T10:35:00",
                "2026-01-12T10:35:00",
                "2026-01-12T22:35:00",
                "2026-01-13T04:35:00",
                "2026-01-13T08:35:00",
            ]
        );
    }

    #[test]
    fn test_plan_rotates_types_and_levels() {
        let plan = generator().plan();
        assert_eq!(plan.len(), 10);
        assert_eq!(plan[0].ticket_type, TicketType::Incident);
        assert_eq!(plan[1].ticket_type, TicketType::Requirement);
        assert_eq!(plan[2].ticket_type, TicketType::Inquiry);
        assert_eq!(plan[3].ticket_type, TicketType::Incident);
        assert_eq!(plan[0].priority_level, PriorityLevel::Low);
        assert_eq!(plan[3].priority_level, PriorityLevel::Urgent);
        assert_eq!(plan[4].priority_level, PriorityLevel::Low);
        assert_eq!(plan[9].priority_level, PriorityLevel::Medium);
        assert_eq!(plan[0].identity.phone.as_deref(), Some("+34 600 000000"));
        assert_eq!(plan[9].identity.email, "carmen@example.com");
    }

    #[tokio::test]
    async fn test_run_issues_requests_in_order() {
        let backend = MockBackend::new();
        let report = generator().run(&backend).await.unwrap();

        assert_eq!(report.tickets_created, 10);
        assert_eq!(report.identities.len(), 10);

        let calls = backend.recorded_calls();
        assert_eq!(calls.len(), 20);
        for (n, call) in calls.iter().enumerate() {
            match (n % 2, call) {
                (0, BackendCall::CreateIdentity(_)) => {}
                (1, BackendCall::CreateSyntheticTicket { request, .. }) => {
                    // Each ticket belongs to the identity created just before it
                    assert_eq!(request.identity_id, (n / 2) as i64 + 1);
                }
                other => panic!("unexpected call at {n}: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_failure_at_seventh_request_stops_the_run() {
        let backend = MockBackend::new();
        backend.fail_on_call(7, ApiError::request("POST /usuarios", 500, ""));

        let err = generator().run(&backend).await.unwrap_err();

        assert_eq!(err.request, 7);
        assert_eq!(err.total, 20);
        assert_eq!(err.step, GenerationStep::CreateIdentity);
        assert_eq!(backend.call_count(), 7);
        // Three full pairs were created before the failure
        assert_eq!(backend.identities.lock().unwrap().len(), 3);
        assert_eq!(backend.tickets.lock().unwrap().len(), 3);
        assert!(err.to_string().starts_with("Synthetic data stopped at request 7 of 20"));
    }

    #[tokio::test]
    async fn test_ticket_failure_reports_even_request_number() {
        let backend = MockBackend::new();
        backend.fail_on_call(
            4,
            ApiError::transport("POST /solicitudes/prueba", "connection reset"),
        );

        let err = generator().run(&backend).await.unwrap_err();
        assert_eq!(err.request, 4);
        assert_eq!(err.step, GenerationStep::CreateTicket);
        assert_eq!(backend.call_count(), 4);
        assert!(err.to_string().contains("Connection error: connection reset"));
    }
}
