//! Priority-ordered ticket workspace.
//!
//! Holds the collection exactly as the backend orders it, the set of expanded
//! ticket ids, a selection cursor, and the synthetic generator's run state.

pub mod generator;

pub use generator::{GenerationError, GenerationReport, GenerationStep, SyntheticGenerator};

use std::collections::HashSet;
use std::time::{Duration, Instant};

use crate::api::{ApiError, TicketBackend};
use crate::forms::{MessageKind, MessageSlot, StatusMessage};
use crate::types::{Ticket, TicketId};

/// Fallback shown when the listing fails without a backend message
pub const LOAD_FAILED: &str = "Failed to load tickets";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Loaded,
    Errored(String),
}

#[derive(Debug, Clone)]
pub struct TicketWorkspace {
    tickets: Vec<Ticket>,
    expanded: HashSet<TicketId>,
    state: LoadState,
    fetch_in_flight: bool,
    generating: bool,
    selected: usize,
    messages: MessageSlot,
}

impl TicketWorkspace {
    pub fn new(message_ttl: Duration) -> Self {
        Self {
            tickets: Vec::new(),
            expanded: HashSet::new(),
            state: LoadState::Loading,
            fetch_in_flight: false,
            generating: false,
            selected: 0,
            messages: MessageSlot::new(message_ttl),
        }
    }

    pub fn tickets(&self) -> &[Ticket] {
        &self.tickets
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn is_fetching(&self) -> bool {
        self.fetch_in_flight
    }

    pub fn is_generating(&self) -> bool {
        self.generating
    }

    pub fn message(&self, now: Instant) -> Option<&StatusMessage> {
        self.messages.current(now)
    }

    pub fn tick(&mut self, now: Instant) {
        self.messages.tick(now);
    }

    /// Enter `Loading`. Returns false if a fetch is already in flight.
    pub fn begin_load(&mut self) -> bool {
        if self.fetch_in_flight {
            return false;
        }
        self.fetch_in_flight = true;
        self.state = LoadState::Loading;
        true
    }

    /// Retry is only offered from the errored state
    pub fn retry(&mut self) -> bool {
        matches!(self.state, LoadState::Errored(_)) && self.begin_load()
    }

    /// Replace the collection. Expanded ids that are still present stay
    /// expanded; the rest are dropped.
    pub fn finish_load(&mut self, result: Result<Vec<Ticket>, ApiError>) {
        self.fetch_in_flight = false;
        match result {
            Ok(tickets) => {
                let present: HashSet<TicketId> = tickets.iter().map(|t| t.id).collect();
                self.expanded.retain(|id| present.contains(id));
                self.tickets = tickets;
                self.selected = self.selected.min(self.tickets.len().saturating_sub(1));
                self.state = LoadState::Loaded;
                tracing::debug!(count = self.tickets.len(), "Tickets loaded");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Ticket listing failed");
                self.state = LoadState::Errored(e.user_message(LOAD_FAILED));
            }
        }
    }

    pub async fn load(&mut self, backend: &dyn TicketBackend) {
        if self.begin_load() {
            let result = backend.list_ordered_tickets().await;
            self.finish_load(result);
        }
    }

    /// Flip one ticket's expansion; returns the new state
    pub fn toggle(&mut self, id: TicketId) -> bool {
        if self.expanded.remove(&id) {
            false
        } else {
            self.expanded.insert(id);
            true
        }
    }

    pub fn is_expanded(&self, id: TicketId) -> bool {
        self.expanded.contains(&id)
    }

    pub fn expand_all(&mut self) {
        self.expanded = self.tickets.iter().map(|t| t.id).collect();
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected_ticket(&self) -> Option<&Ticket> {
        self.tickets.get(self.selected)
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.tickets.len() {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn toggle_selected(&mut self) -> Option<bool> {
        let id = self.selected_ticket()?.id;
        Some(self.toggle(id))
    }

    /// Mark a generator run as started. Returns false if one is already running.
    pub fn begin_generation(&mut self, now: Instant) -> bool {
        if self.generating {
            return false;
        }
        self.generating = true;
        self.messages
            .show(MessageKind::Info, "Generating synthetic tickets...", now);
        true
    }

    /// Report the run's outcome. Returns true when the collection should be
    /// reloaded, which is only after a complete run.
    pub fn finish_generation(
        &mut self,
        result: Result<GenerationReport, GenerationError>,
        now: Instant,
    ) -> bool {
        self.generating = false;
        match result {
            Ok(report) => {
                self.messages.show(MessageKind::Success, report.summary(), now);
                true
            }
            Err(e) => {
                tracing::warn!(request = e.request, error = %e.source, "Synthetic generation aborted");
                self.messages.show(MessageKind::Error, e.to_string(), now);
                false
            }
        }
    }

    /// Run the generator and reload on success
    pub async fn generate(&mut self, generator: &SyntheticGenerator, backend: &dyn TicketBackend) {
        if !self.begin_generation(Instant::now()) {
            return;
        }
        let result = generator.run(backend).await;
        if self.finish_generation(result, Instant::now()) {
            self.load(backend).await;
        }
    }
}
