//! Ticket workspace screen: the ordered list with expandable rows

use std::time::Instant;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use super::{centered_rect, message_line};
use crate::types::{PriorityLevel, Ticket};
use crate::workspace::{LoadState, TicketWorkspace};

fn level_color(level: PriorityLevel) -> Color {
    match level {
        PriorityLevel::Urgent => Color::Red,
        PriorityLevel::High => Color::Yellow,
        PriorityLevel::Medium => Color::White,
        PriorityLevel::Low => Color::Gray,
    }
}

/// Lines for one ticket: a summary row, plus details when expanded
pub fn ticket_lines(ticket: &Ticket, expanded: bool, base_url: &str) -> Vec<Line<'static>> {
    let marker = if expanded { "▼" } else { "▶" };
    let priority = ticket
        .computed_priority_display()
        .unwrap_or_else(|| "-".to_string());

    let mut lines = vec![Line::from(vec![
        Span::styled(format!("{marker} "), Style::default().fg(Color::DarkGray)),
        Span::styled(
            format!("#{:<4}", ticket.id),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("{:>6} ", priority),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            format!("{:<8} ", ticket.priority_level.label()),
            Style::default().fg(level_color(ticket.priority_level)),
        ),
        Span::raw(format!("{:<12} ", ticket.ticket_type.label())),
        Span::raw(ticket.requester.name.clone()),
        Span::styled(
            format!("  {}", ticket.created_at_display()),
            Style::default().fg(Color::DarkGray),
        ),
    ])];

    if expanded {
        let detail = Style::default().fg(Color::Gray);
        lines.push(Line::from(Span::styled(
            format!("    Requester: {} <{}>", ticket.requester.name, ticket.requester.email),
            detail,
        )));
        let description = if ticket.has_description() {
            ticket.description.clone().unwrap_or_default()
        } else {
            "(no description)".to_string()
        };
        for (i, text) in description.lines().enumerate() {
            let prefix = if i == 0 { "    Description: " } else { "                 " };
            lines.push(Line::from(Span::styled(format!("{prefix}{text}"), detail)));
        }
        let refs = ticket.attachment_refs();
        if refs.is_empty() {
            lines.push(Line::from(Span::styled("    Attachments: none", detail)));
        } else {
            lines.push(Line::from(Span::styled(
                format!("    Attachments ({}):", refs.len()),
                detail,
            )));
            for attachment in refs {
                lines.push(Line::from(vec![
                    Span::styled(format!("      {}  ", attachment.original_name), detail),
                    Span::styled(
                        attachment.download_url(base_url),
                        Style::default()
                            .fg(Color::Blue)
                            .add_modifier(Modifier::UNDERLINED),
                    ),
                ]));
            }
        }
    }

    lines
}

pub struct WorkspaceView {
    list_state: ListState,
    base_url: String,
}

impl WorkspaceView {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            list_state: ListState::default(),
            base_url: base_url.into(),
        }
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect, workspace: &TicketWorkspace, now: Instant) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),
                Constraint::Length(1),
                Constraint::Length(2),
            ])
            .split(area);

        match workspace.state() {
            LoadState::Loading if workspace.tickets().is_empty() => {
                render_notice(frame, chunks[0], "Loading tickets...", Color::Gray, None);
            }
            LoadState::Errored(message) => {
                render_notice(
                    frame,
                    chunks[0],
                    message,
                    Color::Red,
                    Some("[r] Retry"),
                );
            }
            _ => self.render_list(frame, chunks[0], workspace),
        }

        frame.render_widget(
            Paragraph::new(message_line(workspace.message(now))),
            chunks[1],
        );

        let generate = if workspace.is_generating() {
            Span::styled("  Generating...", Style::default().fg(Color::Yellow))
        } else {
            Span::raw("")
        };
        let help = Span::styled(
            "  [j/k] Move [Enter] Expand [r]efresh [g]enerate test data [c]reate [Ctrl+T] Wizard [q]uit",
            Style::default().fg(Color::DarkGray),
        );
        frame.render_widget(
            Paragraph::new(Line::from(vec![generate, help]))
                .block(Block::default().borders(Borders::TOP)),
            chunks[2],
        );
    }

    fn render_list(&mut self, frame: &mut Frame, area: Rect, workspace: &TicketWorkspace) {
        let tickets = workspace.tickets();
        let title = if workspace.is_fetching() {
            format!("Tickets by priority ({})  refreshing...", tickets.len())
        } else {
            format!("Tickets by priority ({})", tickets.len())
        };
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));

        if tickets.is_empty() {
            let para = Paragraph::new(Line::from(Span::styled(
                "No tickets yet. Press [g] to generate test data or [c] to create one.",
                Style::default().fg(Color::DarkGray),
            )))
            .block(block);
            frame.render_widget(para, area);
            return;
        }

        let items: Vec<ListItem> = tickets
            .iter()
            .map(|t| ListItem::new(ticket_lines(t, workspace.is_expanded(t.id), &self.base_url)))
            .collect();

        self.list_state.select(Some(workspace.selected_index()));
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
        frame.render_stateful_widget(list, area, &mut self.list_state);
    }
}

fn render_notice(frame: &mut Frame, area: Rect, text: &str, color: Color, action: Option<&str>) {
    let popup = centered_rect(60, 30, area);
    let mut lines = vec![Line::from(Span::styled(
        text.to_string(),
        Style::default().fg(color),
    ))];
    if let Some(action) = action {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            action.to_string(),
            Style::default().fg(Color::Cyan),
        )));
    }
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(ratatui::layout::Alignment::Center)
            .block(Block::default().borders(Borders::ALL)),
        popup,
    );
}
