pub mod form_field;
pub mod terminal_guard;
pub mod wizard_view;
pub mod workspace_view;

pub use terminal_guard::{install_panic_hook, TerminalGuard};
pub use wizard_view::{WizardAction, WizardView};
pub use workspace_view::WorkspaceView;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
};

use crate::forms::{MessageKind, StatusMessage};

/// Helper to create a centered rect
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Status line for the transient message slot
pub(crate) fn message_line(message: Option<&StatusMessage>) -> Line<'static> {
    match message {
        Some(message) => {
            let (icon, color) = match message.kind {
                MessageKind::Success => ("✓", Color::Green),
                MessageKind::Error => ("✗", Color::Red),
                MessageKind::Info => ("i", Color::Cyan),
            };
            Line::from(Span::styled(
                format!(" {icon} {}", message.text),
                Style::default().fg(color),
            ))
        }
        None => Line::from(""),
    }
}
