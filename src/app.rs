use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame, Terminal,
};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::api::{ApiError, TicketBackend};
use crate::config::Config;
use crate::forms::{read_candidates, AttachmentError, FormError, MessageKind, WizardController};
use crate::types::{AttachmentCandidate, Identity, Ticket};
use crate::ui::{install_panic_hook, TerminalGuard, WizardAction, WizardView, WorkspaceView};
use crate::workspace::{GenerationError, GenerationReport, SyntheticGenerator, TicketWorkspace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveView {
    Wizard,
    Workspace,
}

/// Completion of a background task, delivered to the event loop
#[derive(Debug)]
pub enum BackendEvent {
    ContactCreated(Result<Identity, ApiError>),
    TicketCreated(Result<Ticket, ApiError>),
    TicketsLoaded(Result<Vec<Ticket>, ApiError>),
    GenerationFinished(Result<GenerationReport, GenerationError>),
    /// Files read for the ticket draft identified by `draft_id`
    AttachmentsRead {
        draft_id: u64,
        result: Result<Vec<AttachmentCandidate>, AttachmentError>,
    },
}

pub struct App {
    config: Config,
    backend: Arc<dyn TicketBackend>,
    generator: SyntheticGenerator,
    wizard: WizardController,
    wizard_view: WizardView,
    workspace: TicketWorkspace,
    workspace_view: WorkspaceView,
    view: ActiveView,
    workspace_requested: bool,
    events_tx: UnboundedSender<BackendEvent>,
    events_rx: UnboundedReceiver<BackendEvent>,
    should_quit: bool,
}

impl App {
    pub fn new(config: Config, backend: Arc<dyn TicketBackend>) -> Result<Self> {
        let generator = SyntheticGenerator::from_config(&config.generator)?;
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Ok(Self {
            wizard: WizardController::from_config(&config),
            wizard_view: WizardView::new(),
            workspace: TicketWorkspace::new(config.ui.message_ttl()),
            workspace_view: WorkspaceView::new(config.base_url()),
            view: ActiveView::Wizard,
            workspace_requested: false,
            generator,
            backend,
            config,
            events_tx,
            events_rx,
            should_quit: false,
        })
    }

    pub fn view(&self) -> ActiveView {
        self.view
    }

    pub fn wizard(&self) -> &WizardController {
        &self.wizard
    }

    pub fn workspace(&self) -> &TicketWorkspace {
        &self.workspace
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub async fn run(&mut self) -> Result<()> {
        install_panic_hook();
        let _guard = TerminalGuard::new()?;
        let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
        terminal.clear()?;

        let tick_rate = Duration::from_millis(self.config.ui.refresh_rate_ms);
        tracing::info!(base_url = self.config.base_url(), "TUI started");

        while !self.should_quit {
            let now = Instant::now();
            terminal.draw(|f| self.draw(f, now))?;

            if event::poll(tick_rate)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key);
                    }
                }
            }

            self.drain_events();
            self.tick(Instant::now());
        }

        terminal.show_cursor()?;
        Ok(())
    }

    fn draw(&mut self, frame: &mut Frame, now: Instant) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(5)])
            .split(frame.area());

        let tab = |label: &'static str, active: bool| {
            if active {
                Span::styled(
                    format!(" {label} "),
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                )
            } else {
                Span::styled(format!(" {label} "), Style::default().fg(Color::Gray))
            }
        };
        let header = Line::from(vec![
            Span::styled(
                " Intake ",
                Style::default()
                    .fg(Color::LightRed)
                    .add_modifier(Modifier::BOLD),
            ),
            tab("New request", self.view == ActiveView::Wizard),
            tab("Tickets", self.view == ActiveView::Workspace),
            Span::styled(
                "  Ctrl+T switch  Ctrl+C quit",
                Style::default().fg(Color::DarkGray),
            ),
        ]);
        frame.render_widget(Paragraph::new(header), chunks[0]);

        match self.view {
            ActiveView::Wizard => self.wizard_view.render(frame, chunks[1], &self.wizard, now),
            ActiveView::Workspace => {
                self.workspace_view
                    .render(frame, chunks[1], &self.workspace, now)
            }
        }
    }

    /// Apply due deadlines and expire messages
    pub fn tick(&mut self, now: Instant) {
        if self.wizard.tick(now) {
            self.wizard_view.follow_step(self.wizard.step());
        }
        self.workspace.tick(now);
    }

    /// Apply every completion that has arrived, without waiting
    pub fn drain_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply_event(event, Instant::now());
        }
    }

    /// Wait for the next completion and apply it
    pub async fn next_event(&mut self) -> bool {
        match self.events_rx.recv().await {
            Some(event) => {
                self.apply_event(event, Instant::now());
                true
            }
            None => false,
        }
    }

    fn apply_event(&mut self, event: BackendEvent, now: Instant) {
        match event {
            BackendEvent::ContactCreated(result) => {
                if self.wizard.finish_contact_submit(result, now) {
                    self.wizard_view.reset_contact();
                }
            }
            BackendEvent::TicketCreated(result) => {
                if self.wizard.finish_ticket_submit(result, now) {
                    self.wizard_view.reset_ticket();
                    if self.workspace_requested {
                        self.request_load();
                    }
                }
            }
            BackendEvent::TicketsLoaded(result) => self.workspace.finish_load(result),
            BackendEvent::GenerationFinished(result) => {
                if self.workspace.finish_generation(result, now) {
                    self.request_load();
                }
            }
            BackendEvent::AttachmentsRead { draft_id, result } => match result {
                Ok(candidates) => {
                    self.wizard.add_attachments_to(draft_id, candidates, now);
                }
                Err(e) if draft_id == self.wizard.draft_id() => {
                    self.wizard.show_message(MessageKind::Error, e.to_string(), now);
                }
                Err(_) => {}
            },
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') if ctrl => {
                self.should_quit = true;
                return;
            }
            KeyCode::Char('t') if ctrl => {
                self.toggle_view();
                return;
            }
            KeyCode::F(2) => {
                self.toggle_view();
                return;
            }
            _ => {}
        }

        match self.view {
            ActiveView::Wizard => {
                let action = self.wizard_view.handle_key(key, &self.wizard);
                self.perform(action);
            }
            ActiveView::Workspace => self.handle_workspace_key(key),
        }
    }

    fn toggle_view(&mut self) {
        match self.view {
            ActiveView::Wizard => self.show_workspace(),
            ActiveView::Workspace => self.view = ActiveView::Wizard,
        }
    }

    fn show_workspace(&mut self) {
        self.view = ActiveView::Workspace;
        if !self.workspace_requested {
            self.workspace_requested = true;
            self.request_load();
        }
    }

    fn handle_workspace_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Down | KeyCode::Char('j') => self.workspace.select_next(),
            KeyCode::Up | KeyCode::Char('k') => self.workspace.select_prev(),
            KeyCode::Enter | KeyCode::Char(' ') => {
                self.workspace.toggle_selected();
            }
            KeyCode::Char('r') | KeyCode::Char('R') => self.request_load(),
            KeyCode::Char('g') | KeyCode::Char('G') => self.request_generation(),
            KeyCode::Char('c') | KeyCode::Char('C') => self.view = ActiveView::Wizard,
            _ => {}
        }
    }

    fn perform(&mut self, action: WizardAction) {
        let now = Instant::now();
        match action {
            WizardAction::None => {}
            WizardAction::SubmitContact => {
                self.wizard_view.write_contact(&mut self.wizard.contact);
                if let Ok(request) = self.wizard.begin_contact_submit(now) {
                    let backend = Arc::clone(&self.backend);
                    let tx = self.events_tx.clone();
                    tokio::spawn(async move {
                        let result = backend.create_identity(&request).await;
                        let _ = tx.send(BackendEvent::ContactCreated(result));
                    });
                }
            }
            WizardAction::SubmitTicket => {
                self.wizard_view.write_draft(&mut self.wizard.ticket.draft);
                match self.wizard.begin_ticket_submit() {
                    Ok(submission) => {
                        let backend = Arc::clone(&self.backend);
                        let tx = self.events_tx.clone();
                        tokio::spawn(async move {
                            let result = backend.create_ticket(&submission).await;
                            let _ = tx.send(BackendEvent::TicketCreated(result));
                        });
                    }
                    Err(FormError::Busy | FormError::WrongStep) => {}
                    Err(e) => self
                        .wizard
                        .show_message(MessageKind::Error, e.to_string(), now),
                }
            }
            WizardAction::AddAttachments(paths) => self.read_attachments(paths),
            WizardAction::RemoveAttachment(index) => {
                if let Some(removed) = self.wizard.remove_attachment(index) {
                    tracing::debug!(file = %removed.name, "Attachment removed");
                }
            }
            WizardAction::Back => {
                if self.wizard.back() {
                    self.wizard_view.reset_ticket();
                }
            }
            WizardAction::CreateAnother => {
                if self.wizard.create_another() {
                    self.wizard_view.reset_contact();
                    self.wizard_view.reset_ticket();
                }
            }
        }
    }

    /// File contents are read off the event loop
    fn read_attachments(&mut self, paths: Vec<PathBuf>) {
        let max_file_bytes = self.wizard.attachments.max_file_bytes();
        let draft_id = self.wizard.draft_id();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = tokio::task::spawn_blocking(move || read_candidates(&paths, max_file_bytes))
                .await
                .unwrap_or_else(|e| {
                    Err(AttachmentError::Unreadable {
                        path: PathBuf::new(),
                        message: e.to_string(),
                    })
                });
            let _ = tx.send(BackendEvent::AttachmentsRead { draft_id, result });
        });
    }

    fn request_load(&mut self) {
        if !self.workspace.begin_load() {
            return;
        }
        let backend = Arc::clone(&self.backend);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = backend.list_ordered_tickets().await;
            let _ = tx.send(BackendEvent::TicketsLoaded(result));
        });
    }

    fn request_generation(&mut self) {
        if !self.workspace.begin_generation(Instant::now()) {
            return;
        }
        let backend = Arc::clone(&self.backend);
        let generator = self.generator.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = generator.run(backend.as_ref()).await;
            let _ = tx.send(BackendEvent::GenerationFinished(result));
        });
    }
}
