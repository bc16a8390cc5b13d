//! Integration tests for the HTTP backend client
//!
//! These tests verify that:
//! - Identity and ticket bodies use the backend's field names
//! - Ticket submissions are multipart with the JSON part first, then one
//!   part per file in order
//! - Synthetic tickets carry their creation time as a query parameter
//! - Error bodies are surfaced with the backend message or a fallback
//!
//! Each test starts its own axum server on an ephemeral local port.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDateTime;
use serde_json::{json, Value};

use intake::api::{ApiError, HttpBackend, TicketBackend, TicketRequest, TicketSubmission};
use intake::config::{GeneratorConfig, LOCAL_TIMESTAMP_FORMAT};
use intake::types::{AttachmentCandidate, NewIdentity, PriorityLevel, TicketType};
use intake::workspace::{LoadState, SyntheticGenerator, TicketWorkspace};

// ─── Fake backend ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct RecordedPart {
    name: String,
    file_name: Option<String>,
    content_type: Option<String>,
    body: Vec<u8>,
}

#[derive(Default)]
struct Recorded {
    requests: usize,
    fail_at: Option<usize>,
    identities: Vec<Value>,
    parts: Vec<RecordedPart>,
    synthetic: Vec<(HashMap<String, String>, Value)>,
}

type Shared = Arc<Mutex<Recorded>>;

/// Count the request and report whether it is the one scripted to fail
fn next_request_fails(state: &Shared) -> bool {
    let mut recorded = state.lock().unwrap();
    recorded.requests += 1;
    recorded.fail_at == Some(recorded.requests)
}

fn ticket_json(id: i64, priority: f64) -> Value {
    json!({
        "id": id,
        "tipo": "INCIDENTE",
        "nivelPrioridad": "ALTA",
        "prioridadCalculada": priority,
        "fechaCreacion": "2026-01-12T10:35:00",
        "descripcion": null,
        "usuario": {"id": 1, "nombre": "Pedro Pérez", "correo": "pedro@example.com"},
        "archivos": []
    })
}

async fn create_identity(
    State(state): State<Shared>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    if next_request_fails(&state) {
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "scripted"})),
        ));
    }
    if body["correo"] == "dup@example.com" {
        return Err((
            StatusCode::CONFLICT,
            Json(json!({"message": "El correo ya está registrado"})),
        ));
    }

    let mut recorded = state.lock().unwrap();
    recorded.identities.push(body.clone());
    let id = recorded.identities.len() as i64;
    Ok(Json(json!({
        "id": id,
        "nombre": body["nombre"],
        "correo": body["correo"],
        "telefono": body.get("telefono").cloned().unwrap_or(Value::Null),
    })))
}

async fn create_ticket(State(state): State<Shared>, mut multipart: Multipart) -> Json<Value> {
    next_request_fails(&state);
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let body = field.bytes().await.unwrap().to_vec();
        state.lock().unwrap().parts.push(RecordedPart {
            name,
            file_name,
            content_type,
            body,
        });
    }

    let mut ticket = ticket_json(99, 4.0);
    let files: Vec<Value> = state
        .lock()
        .unwrap()
        .parts
        .iter()
        .filter(|p| p.name == "archivos")
        .enumerate()
        .map(|(i, p)| json!({"id": i + 1, "nombreOriginal": p.file_name, "url": format!("/archivos/{}", i + 1)}))
        .collect();
    ticket["archivos"] = Value::Array(files);
    Json(ticket)
}

async fn create_synthetic(
    State(state): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> StatusCode {
    if next_request_fails(&state) {
        return StatusCode::BAD_GATEWAY;
    }
    state.lock().unwrap().synthetic.push((query, body));
    StatusCode::CREATED
}

async fn list_ordered(State(state): State<Shared>) -> Json<Value> {
    next_request_fails(&state);
    // Backend order is authoritative; note id 2 comes first
    Json(json!([ticket_json(2, 9.5), ticket_json(1, 3.0)]))
}

async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

async fn start_backend() -> (HttpBackend, Shared) {
    let state: Shared = Arc::default();
    let router = Router::new()
        .route("/usuarios", post(create_identity))
        .route("/solicitudes", post(create_ticket))
        .route("/solicitudes/prueba", post(create_synthetic))
        .route("/solicitudes/ordenadas", get(list_ordered))
        .with_state(state.clone());
    let base_url = spawn(router).await;
    let backend = HttpBackend::new(base_url, Duration::from_secs(5)).unwrap();
    (backend, state)
}

fn new_identity(email: &str, phone: Option<&str>) -> NewIdentity {
    NewIdentity {
        name: "Juan Pérez".to_string(),
        email: email.to_string(),
        phone: phone.map(str::to_string),
    }
}

// ─── Identity ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_identity_body_and_response() {
    let (backend, state) = start_backend().await;

    let identity = backend
        .create_identity(&new_identity("juan@example.com", None))
        .await
        .unwrap();

    assert_eq!(identity.id, 1);
    assert_eq!(identity.name, "Juan Pérez");
    assert_eq!(identity.phone, None);
    assert_eq!(
        state.lock().unwrap().identities[0],
        json!({"nombre": "Juan Pérez", "correo": "juan@example.com"})
    );
}

#[tokio::test]
async fn test_identity_conflict_surfaces_backend_message() {
    let (backend, _state) = start_backend().await;

    let err = backend
        .create_identity(&new_identity("dup@example.com", Some("+34 600 000001")))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(409));
    assert_eq!(
        err.user_message("Failed to create contact"),
        "El correo ya está registrado"
    );
}

// ─── Ticket submission ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_ticket_multipart_parts_in_order() {
    let (backend, state) = start_backend().await;
    let submission = TicketSubmission {
        request: TicketRequest {
            ticket_type: TicketType::Incident,
            priority_level: PriorityLevel::Urgent,
            identity_id: 12,
            description: None,
        },
        files: vec![
            AttachmentCandidate::new("captura.png", vec![0x89, b'P', b'N', b'G']),
            AttachmentCandidate::new("notas.txt", b"hola".to_vec()),
        ],
    };

    let ticket = backend.create_ticket(&submission).await.unwrap();
    assert_eq!(ticket.id, 99);
    assert_eq!(ticket.attachment_refs().len(), 2);

    let parts = state.lock().unwrap().parts.clone();
    let names: Vec<&str> = parts.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["solicitud", "archivos", "archivos"]);

    let json_part = &parts[0];
    assert_eq!(json_part.file_name.as_deref(), Some("solicitud.json"));
    assert_eq!(json_part.content_type.as_deref(), Some("application/json"));
    let body: Value = serde_json::from_slice(&json_part.body).unwrap();
    assert_eq!(
        body,
        json!({"tipo": "INCIDENTE", "nivelPrioridad": "URGENCIA", "usuarioId": 12, "descripcion": null})
    );

    assert_eq!(parts[1].file_name.as_deref(), Some("captura.png"));
    assert_eq!(parts[1].content_type.as_deref(), Some("image/png"));
    assert_eq!(parts[2].file_name.as_deref(), Some("notas.txt"));
    assert_eq!(parts[2].body, b"hola");
}

#[tokio::test]
async fn test_ticket_without_files_has_only_json_part() {
    let (backend, state) = start_backend().await;
    let submission = TicketSubmission {
        request: TicketRequest {
            ticket_type: TicketType::Inquiry,
            priority_level: PriorityLevel::Low,
            identity_id: 1,
            description: Some("¿Horario?".to_string()),
        },
        files: Vec::new(),
    };

    backend.create_ticket(&submission).await.unwrap();

    let parts = state.lock().unwrap().parts.clone();
    assert_eq!(parts.len(), 1);
    let body: Value = serde_json::from_slice(&parts[0].body).unwrap();
    assert_eq!(body["descripcion"], "¿Horario?");
}

// ─── Synthetic data ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_synthetic_ticket_passes_creation_time_as_query() {
    let (backend, state) = start_backend().await;
    let created_at =
        NaiveDateTime::parse_from_str("2026-01-03T10:35:00", LOCAL_TIMESTAMP_FORMAT).unwrap();
    let request = TicketRequest {
        ticket_type: TicketType::Requirement,
        priority_level: PriorityLevel::Medium,
        identity_id: 3,
        description: Some("Solicito acceso a nuevos módulos".to_string()),
    };

    backend
        .create_synthetic_ticket(&request, created_at)
        .await
        .unwrap();

    let (query, body) = state.lock().unwrap().synthetic[0].clone();
    assert_eq!(query.get("fechaCreacion").map(String::as_str), Some("2026-01-03T10:35:00"));
    assert_eq!(body["usuarioId"], 3);
    assert_eq!(body["tipo"], "REQUERIMIENTO");
}

#[tokio::test]
async fn test_generator_over_http_stops_at_failing_request() {
    let (backend, state) = start_backend().await;
    state.lock().unwrap().fail_at = Some(7);
    let generator = SyntheticGenerator::from_config(&GeneratorConfig::default()).unwrap();

    let err = generator.run(&backend).await.unwrap_err();

    assert_eq!(err.request, 7);
    let recorded = state.lock().unwrap();
    assert_eq!(recorded.requests, 7);
    assert_eq!(recorded.identities.len(), 3);
    assert_eq!(recorded.synthetic.len(), 3);
}

#[tokio::test]
async fn test_generator_over_http_completes() {
    let (backend, state) = start_backend().await;
    let generator = SyntheticGenerator::from_config(&GeneratorConfig::default()).unwrap();

    let report = generator.run(&backend).await.unwrap();

    assert_eq!(report.tickets_created, 10);
    let recorded = state.lock().unwrap();
    assert_eq!(recorded.requests, 20);
    let stamps: Vec<&str> = recorded
        .synthetic
        .iter()
        .map(|(q, _)| q["fechaCreacion"].as_str())
        .collect();
    assert_eq!(stamps.first(), Some(&"2026-01-03T10:35:00"));
    assert_eq!(stamps.last(), Some(&"2026-01-13T08:35:00"));
}

// ─── Listing ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_workspace_keeps_backend_order() {
    let (backend, _state) = start_backend().await;
    let mut workspace = TicketWorkspace::new(Duration::from_secs(5));

    workspace.load(&backend).await;

    assert_eq!(workspace.state(), &LoadState::Loaded);
    let ids: Vec<i64> = workspace.tickets().iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![2, 1]);
    assert!(!workspace.is_expanded(2));
    assert!(!workspace.is_expanded(1));
}

#[tokio::test]
async fn test_listing_server_error_uses_fallback() {
    let router = Router::new().route(
        "/solicitudes/ordenadas",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let backend = HttpBackend::new(spawn(router).await, Duration::from_secs(5)).unwrap();
    let mut workspace = TicketWorkspace::new(Duration::from_secs(5));

    workspace.load(&backend).await;

    assert_eq!(
        workspace.state(),
        &LoadState::Errored("Failed to load tickets".to_string())
    );
}

#[tokio::test]
async fn test_undecodable_listing_is_a_connection_error() {
    let router = Router::new().route("/solicitudes/ordenadas", get(|| async { "not json" }));
    let backend = HttpBackend::new(spawn(router).await, Duration::from_secs(5)).unwrap();

    let err = backend.list_ordered_tickets().await.unwrap_err();

    assert!(matches!(err, ApiError::Decode { .. }), "got {err:?}");
    assert!(err
        .user_message("Failed to load tickets")
        .starts_with("Connection error: "));
}
