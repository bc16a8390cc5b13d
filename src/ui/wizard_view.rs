//! Wizard screens: contact form, ticket form, confirmation

use std::path::PathBuf;
use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use super::form_field::FormField;
use super::{centered_rect, message_line};
use crate::forms::{ContactForm, SubmissionDraft, WizardController, WizardStep};
use crate::types::{PriorityLevel, TicketType};

/// What the app should do in response to a key on the wizard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardAction {
    None,
    SubmitContact,
    SubmitTicket,
    AddAttachments(Vec<PathBuf>),
    RemoveAttachment(usize),
    Back,
    CreateAnother,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContactFocus {
    Name,
    Email,
    Phone,
    Submit,
}

impl ContactFocus {
    const ORDER: [ContactFocus; 4] = [
        ContactFocus::Name,
        ContactFocus::Email,
        ContactFocus::Phone,
        ContactFocus::Submit,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TicketFocus {
    Type,
    Priority,
    Description,
    FilePath,
    Attachments,
    Back,
    Submit,
}

impl TicketFocus {
    const ORDER: [TicketFocus; 7] = [
        TicketFocus::Type,
        TicketFocus::Priority,
        TicketFocus::Description,
        TicketFocus::FilePath,
        TicketFocus::Attachments,
        TicketFocus::Back,
        TicketFocus::Submit,
    ];
}

fn cycle<T: Copy + PartialEq>(order: &[T], current: T, forward: bool) -> T {
    let idx = order.iter().position(|f| *f == current).unwrap_or(0);
    let next = if forward {
        (idx + 1) % order.len()
    } else {
        (idx + order.len() - 1) % order.len()
    };
    order[next]
}

/// Split a comma-separated path list, expanding a leading `~/`
pub fn parse_paths(input: &str) -> Vec<PathBuf> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| match (s.strip_prefix("~/"), dirs::home_dir()) {
            (Some(rest), Some(home)) => home.join(rest),
            _ => PathBuf::from(s),
        })
        .collect()
}

/// Widgets and focus for the wizard. Values are copied into the
/// `WizardController` forms right before a submission.
pub struct WizardView {
    name: FormField,
    email: FormField,
    phone: FormField,
    contact_focus: ContactFocus,

    ticket_type: FormField,
    priority: FormField,
    description: FormField,
    file_path: FormField,
    attachments_state: ListState,
    ticket_focus: TicketFocus,

    shown_step: WizardStep,
}

impl Default for WizardView {
    fn default() -> Self {
        Self::new()
    }
}

impl WizardView {
    pub fn new() -> Self {
        let mut view = Self {
            name: FormField::text_input("Full name"),
            email: FormField::text_input("name@example.com"),
            phone: FormField::text_input("Optional"),
            contact_focus: ContactFocus::Name,
            ticket_type: FormField::text_input(""),
            priority: FormField::text_input(""),
            description: FormField::text_area("Describe the request (optional)"),
            file_path: FormField::text_input("Paths separated by commas, Enter to attach"),
            attachments_state: ListState::default(),
            ticket_focus: TicketFocus::Type,
            shown_step: WizardStep::Contact,
        };
        view.reset_ticket();
        view
    }

    pub fn reset_contact(&mut self) {
        self.name.set_value("");
        self.email.set_value("");
        self.phone.set_value("");
        self.contact_focus = ContactFocus::Name;
    }

    /// Back to the draft defaults
    pub fn reset_ticket(&mut self) {
        let draft = SubmissionDraft::default();
        let types: Vec<String> = TicketType::all().iter().map(|t| t.label().to_string()).collect();
        let levels: Vec<String> = PriorityLevel::all()
            .iter()
            .map(|l| l.label().to_string())
            .collect();
        let type_idx = TicketType::all()
            .iter()
            .position(|t| *t == draft.ticket_type)
            .unwrap_or(0);
        let level_idx = PriorityLevel::all()
            .iter()
            .position(|l| *l == draft.priority_level)
            .unwrap_or(0);

        self.ticket_type = FormField::enum_select(types, type_idx);
        self.priority = FormField::enum_select(levels, level_idx);
        self.description = FormField::text_area("Describe the request (optional)");
        self.file_path.set_value("");
        self.attachments_state = ListState::default();
        self.ticket_focus = TicketFocus::Type;
    }

    /// Reset focus when the wizard moved to another step
    pub fn follow_step(&mut self, step: WizardStep) {
        if step != self.shown_step {
            match step {
                WizardStep::Contact => self.contact_focus = ContactFocus::Name,
                WizardStep::Ticket => self.ticket_focus = TicketFocus::Type,
                WizardStep::Confirmation => {}
            }
            self.shown_step = step;
        }
    }

    pub fn write_contact(&self, form: &mut ContactForm) {
        form.name = self.name.value();
        form.email = self.email.value();
        form.phone = self.phone.value();
    }

    pub fn write_draft(&self, draft: &mut SubmissionDraft) {
        draft.ticket_type = TicketType::all()
            .get(self.ticket_type.selected_index())
            .copied()
            .unwrap_or_default();
        draft.priority_level = PriorityLevel::all()
            .get(self.priority.selected_index())
            .copied()
            .unwrap_or_default();
        draft.description = self.description.value();
    }

    pub fn handle_key(&mut self, key: KeyEvent, wizard: &WizardController) -> WizardAction {
        self.follow_step(wizard.step());

        let submit_shortcut =
            key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('s');

        match wizard.step() {
            WizardStep::Contact => {
                if submit_shortcut {
                    return WizardAction::SubmitContact;
                }
                self.handle_contact_key(key)
            }
            WizardStep::Ticket => {
                if submit_shortcut {
                    return WizardAction::SubmitTicket;
                }
                self.handle_ticket_key(key, wizard.attachments.len())
            }
            WizardStep::Confirmation => match key.code {
                KeyCode::Enter | KeyCode::Char('n') | KeyCode::Char(' ') => {
                    WizardAction::CreateAnother
                }
                _ => WizardAction::None,
            },
        }
    }

    fn handle_contact_key(&mut self, key: KeyEvent) -> WizardAction {
        match key.code {
            KeyCode::Tab | KeyCode::Down => {
                self.contact_focus = cycle(&ContactFocus::ORDER, self.contact_focus, true);
                WizardAction::None
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.contact_focus = cycle(&ContactFocus::ORDER, self.contact_focus, false);
                WizardAction::None
            }
            KeyCode::Enter => {
                if self.contact_focus == ContactFocus::Submit {
                    WizardAction::SubmitContact
                } else {
                    self.contact_focus = cycle(&ContactFocus::ORDER, self.contact_focus, true);
                    WizardAction::None
                }
            }
            _ => {
                let field = match self.contact_focus {
                    ContactFocus::Name => &mut self.name,
                    ContactFocus::Email => &mut self.email,
                    ContactFocus::Phone => &mut self.phone,
                    ContactFocus::Submit => return WizardAction::None,
                };
                field.handle_key(key);
                WizardAction::None
            }
        }
    }

    fn handle_ticket_key(&mut self, key: KeyEvent, attachment_count: usize) -> WizardAction {
        match key.code {
            KeyCode::Tab => {
                self.ticket_focus = cycle(&TicketFocus::ORDER, self.ticket_focus, true);
                return WizardAction::None;
            }
            KeyCode::BackTab => {
                self.ticket_focus = cycle(&TicketFocus::ORDER, self.ticket_focus, false);
                return WizardAction::None;
            }
            KeyCode::Esc => return WizardAction::Back,
            _ => {}
        }

        match self.ticket_focus {
            TicketFocus::Type => {
                self.ticket_type.handle_key(key);
                WizardAction::None
            }
            TicketFocus::Priority => {
                self.priority.handle_key(key);
                WizardAction::None
            }
            TicketFocus::Description => {
                self.description.handle_key(key);
                WizardAction::None
            }
            TicketFocus::FilePath => {
                if key.code == KeyCode::Enter {
                    let paths = parse_paths(&self.file_path.value());
                    if paths.is_empty() {
                        return WizardAction::None;
                    }
                    self.file_path.set_value("");
                    WizardAction::AddAttachments(paths)
                } else {
                    self.file_path.handle_key(key);
                    WizardAction::None
                }
            }
            TicketFocus::Attachments => {
                let selected = self.attachments_state.selected().unwrap_or(0);
                match key.code {
                    KeyCode::Down | KeyCode::Char('j') if attachment_count > 0 => {
                        self.attachments_state
                            .select(Some((selected + 1).min(attachment_count - 1)));
                        WizardAction::None
                    }
                    KeyCode::Up | KeyCode::Char('k') if attachment_count > 0 => {
                        self.attachments_state.select(Some(selected.saturating_sub(1)));
                        WizardAction::None
                    }
                    KeyCode::Delete | KeyCode::Backspace | KeyCode::Char('d')
                        if selected < attachment_count =>
                    {
                        let remaining = attachment_count - 1;
                        self.attachments_state.select(if remaining == 0 {
                            None
                        } else {
                            Some(selected.min(remaining - 1))
                        });
                        WizardAction::RemoveAttachment(selected)
                    }
                    _ => WizardAction::None,
                }
            }
            TicketFocus::Back => match key.code {
                KeyCode::Enter | KeyCode::Char(' ') => WizardAction::Back,
                _ => WizardAction::None,
            },
            TicketFocus::Submit => match key.code {
                KeyCode::Enter | KeyCode::Char(' ') => WizardAction::SubmitTicket,
                _ => WizardAction::None,
            },
        }
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect, wizard: &WizardController, now: Instant) {
        self.follow_step(wizard.step());

        let step = wizard.step();
        let block = Block::default()
            .title(format!(" New request  ·  Step {}/3: {} ", step.number(), step.title()))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(1)])
            .split(inner);

        match step {
            WizardStep::Contact => self.render_contact(frame, chunks[0], wizard),
            WizardStep::Ticket => self.render_ticket(frame, chunks[0], wizard),
            WizardStep::Confirmation => render_confirmation(frame, chunks[0], wizard),
        }

        frame.render_widget(Paragraph::new(message_line(wizard.message(now))), chunks[1]);
    }

    fn render_contact(&mut self, frame: &mut Frame, area: Rect, wizard: &WizardController) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(0),
            ])
            .split(area);

        let focus = self.contact_focus;
        render_label(frame, chunks[0], "Name *", focus == ContactFocus::Name);
        self.name.render(frame, chunks[1], focus == ContactFocus::Name);
        render_label(frame, chunks[3], "Email *", focus == ContactFocus::Email);
        self.email.render(frame, chunks[4], focus == ContactFocus::Email);
        render_label(frame, chunks[6], "Phone", focus == ContactFocus::Phone);
        self.phone.render(frame, chunks[7], focus == ContactFocus::Phone);

        let label = if wizard.contact.is_busy() {
            "Creating..."
        } else if wizard.is_advancing() {
            "Continuing..."
        } else {
            "Continue"
        };
        render_button(frame, chunks[9], label, focus == ContactFocus::Submit);

        render_hint(
            frame,
            chunks[10],
            "Tab/Shift+Tab: move  Enter: next/submit  Ctrl+S: submit",
        );
    }

    fn render_ticket(&mut self, frame: &mut Frame, area: Rect, wizard: &WizardController) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(self.priority.render_height()),
                Constraint::Length(1),
                Constraint::Length(self.description.render_height()),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(3),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(area);

        let focus = self.ticket_focus;

        let selectors = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[1]);
        let labels = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[0]);
        render_label(frame, labels[0], "Type", focus == TicketFocus::Type);
        render_label(frame, labels[1], "Priority", focus == TicketFocus::Priority);
        self.ticket_type
            .render(frame, selectors[0], focus == TicketFocus::Type);
        self.priority
            .render(frame, selectors[1], focus == TicketFocus::Priority);

        render_label(frame, chunks[2], "Description", focus == TicketFocus::Description);
        self.description
            .render(frame, chunks[3], focus == TicketFocus::Description);

        render_label(frame, chunks[4], "Attach files", focus == TicketFocus::FilePath);
        self.file_path
            .render(frame, chunks[5], focus == TicketFocus::FilePath);
        render_hint(frame, chunks[6], &wizard.attachments.hint());

        self.render_attachments(frame, chunks[7], wizard, focus == TicketFocus::Attachments);

        let buttons = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[8]);
        render_button(frame, buttons[0], "Back", focus == TicketFocus::Back);
        let submit = if wizard.ticket.is_busy() {
            "Submitting..."
        } else {
            "Submit ticket"
        };
        render_button(frame, buttons[1], submit, focus == TicketFocus::Submit);

        render_hint(
            frame,
            chunks[9],
            "Tab: move  ←/→: choose  Del: remove file  Esc: back  Ctrl+S: submit",
        );
    }

    fn render_attachments(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        wizard: &WizardController,
        focused: bool,
    ) {
        let set = &wizard.attachments;
        let items: Vec<ListItem> = set
            .items()
            .iter()
            .map(|c| {
                let name_style = if set.is_suggested_kind(&c.name) {
                    Style::default()
                } else {
                    Style::default().fg(Color::Yellow)
                };
                ListItem::new(Line::from(vec![
                    Span::styled(c.name.clone(), name_style),
                    Span::styled(
                        format!("  {}", c.size_display()),
                        Style::default().fg(Color::DarkGray),
                    ),
                ]))
            })
            .collect();

        if self.attachments_state.selected().is_none() && !items.is_empty() {
            self.attachments_state.select(Some(0));
        }

        let border = if focused { Color::Cyan } else { Color::Gray };
        let list = List::new(items)
            .block(
                Block::default()
                    .title(format!("Selected files ({})", set.len()))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(border)),
            )
            .highlight_style(if focused {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            })
            .highlight_symbol("> ");

        frame.render_stateful_widget(list, area, &mut self.attachments_state);
    }
}

fn render_confirmation(frame: &mut Frame, area: Rect, wizard: &WizardController) {
    let popup = centered_rect(60, 50, area);

    let mut lines = vec![
        Line::from(Span::styled(
            "Your request has been submitted",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    if let Some(identity) = wizard.identity() {
        lines.push(Line::from(format!("Thank you, {}.", identity.name)));
    }
    if let Some(ticket) = wizard.submitted_ticket() {
        lines.push(Line::from(format!(
            "Ticket #{} ({}, {}) was received.",
            ticket.id,
            ticket.ticket_type.label(),
            ticket.priority_level.label()
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "[Enter] Create another request",
        Style::default().fg(Color::Cyan),
    )));

    let para = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(para, popup);
}

fn render_label(frame: &mut Frame, area: Rect, text: &str, focused: bool) {
    let style = if focused {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };
    frame.render_widget(Paragraph::new(Span::styled(text.to_string(), style)), area);
}

fn render_button(frame: &mut Frame, area: Rect, text: &str, focused: bool) {
    let style = if focused {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Cyan)
    };
    frame.render_widget(
        Paragraph::new(Span::styled(format!("[ {text} ]"), style)).alignment(Alignment::Center),
        area,
    );
}

fn render_hint(frame: &mut Frame, area: Rect, text: &str) {
    frame.render_widget(
        Paragraph::new(Span::styled(
            text.to_string(),
            Style::default().fg(Color::DarkGray),
        )),
        area,
    );
}
