//! Reusable form field widgets for the wizard

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};
use tui_textarea::TextArea;

/// A form field widget that can handle different input types
pub enum FormField {
    /// Single-line text input. `cursor_pos` counts characters, not bytes.
    TextInput {
        value: String,
        cursor_pos: usize,
        placeholder: String,
    },
    /// Multi-line text input using tui-textarea
    TextArea {
        textarea: Box<TextArea<'static>>,
        placeholder: String,
    },
    /// Selection from a fixed list of labels
    EnumSelect {
        options: Vec<String>,
        selected: usize,
        list_state: ListState,
    },
}

impl FormField {
    pub fn text_input(placeholder: impl Into<String>) -> Self {
        FormField::TextInput {
            value: String::new(),
            cursor_pos: 0,
            placeholder: placeholder.into(),
        }
    }

    pub fn text_area(placeholder: impl Into<String>) -> Self {
        FormField::TextArea {
            textarea: Box::new(TextArea::default()),
            placeholder: placeholder.into(),
        }
    }

    pub fn enum_select(options: Vec<String>, selected: usize) -> Self {
        let selected = selected.min(options.len().saturating_sub(1));
        let mut list_state = ListState::default();
        list_state.select(Some(selected));
        FormField::EnumSelect {
            options,
            selected,
            list_state,
        }
    }

    /// Get the current value as a string
    pub fn value(&self) -> String {
        match self {
            FormField::TextInput { value, .. } => value.clone(),
            FormField::TextArea { textarea, .. } => textarea.lines().join("\n"),
            FormField::EnumSelect {
                options, selected, ..
            } => options.get(*selected).cloned().unwrap_or_default(),
        }
    }

    /// Index of the chosen option; 0 for text fields
    pub fn selected_index(&self) -> usize {
        match self {
            FormField::EnumSelect { selected, .. } => *selected,
            _ => 0,
        }
    }

    /// Set the value from a string
    pub fn set_value(&mut self, new_value: &str) {
        match self {
            FormField::TextInput {
                value, cursor_pos, ..
            } => {
                *value = new_value.to_string();
                *cursor_pos = value.chars().count();
            }
            FormField::TextArea { textarea, .. } => {
                textarea.select_all();
                textarea.cut();
                textarea.insert_str(new_value);
            }
            FormField::EnumSelect {
                options,
                selected,
                list_state,
            } => {
                if let Some(idx) = options.iter().position(|o| o == new_value) {
                    *selected = idx;
                    list_state.select(Some(idx));
                }
            }
        }
    }

    /// Handle a key event, returns true if the key was consumed
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match self {
            FormField::TextInput {
                value, cursor_pos, ..
            } => match key.code {
                KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                    value.insert(byte_offset(value, *cursor_pos), c);
                    *cursor_pos += 1;
                    true
                }
                KeyCode::Backspace => {
                    if *cursor_pos > 0 {
                        *cursor_pos -= 1;
                        value.remove(byte_offset(value, *cursor_pos));
                    }
                    true
                }
                KeyCode::Delete => {
                    if *cursor_pos < value.chars().count() {
                        value.remove(byte_offset(value, *cursor_pos));
                    }
                    true
                }
                KeyCode::Left => {
                    *cursor_pos = cursor_pos.saturating_sub(1);
                    true
                }
                KeyCode::Right => {
                    if *cursor_pos < value.chars().count() {
                        *cursor_pos += 1;
                    }
                    true
                }
                KeyCode::Home => {
                    *cursor_pos = 0;
                    true
                }
                KeyCode::End => {
                    *cursor_pos = value.chars().count();
                    true
                }
                _ => false,
            },
            // TextArea handles its own key events, including Enter as newline
            FormField::TextArea { textarea, .. } => textarea.input(key),
            FormField::EnumSelect {
                options,
                selected,
                list_state,
            } => match key.code {
                KeyCode::Up | KeyCode::Left | KeyCode::Char('k') => {
                    if *selected > 0 {
                        *selected -= 1;
                        list_state.select(Some(*selected));
                    }
                    true
                }
                KeyCode::Down | KeyCode::Right | KeyCode::Char('j') => {
                    if *selected < options.len().saturating_sub(1) {
                        *selected += 1;
                        list_state.select(Some(*selected));
                    }
                    true
                }
                _ => false,
            },
        }
    }

    /// Get the height needed to render this field
    pub fn render_height(&self) -> u16 {
        match self {
            FormField::TextInput { .. } => 1,
            FormField::TextArea { .. } => 5,
            FormField::EnumSelect { options, .. } => (options.len() as u16).min(4),
        }
    }

    /// Render the field
    pub fn render(&mut self, frame: &mut Frame, area: Rect, focused: bool) {
        let border_color = if focused { Color::Cyan } else { Color::Gray };

        match self {
            FormField::TextInput {
                value,
                cursor_pos,
                placeholder,
            } => {
                let content = if value.is_empty() && !focused {
                    Line::from(Span::styled(
                        placeholder.as_str(),
                        Style::default().fg(Color::DarkGray),
                    ))
                } else {
                    let mut text = value.clone();
                    if focused {
                        text.insert(byte_offset(&text, *cursor_pos), '|');
                    }
                    Line::from(text)
                };

                let para = Paragraph::new(content).style(Style::default().fg(if focused {
                    Color::White
                } else {
                    Color::Gray
                }));
                frame.render_widget(para, area);
            }
            FormField::TextArea {
                textarea,
                placeholder,
            } => {
                textarea.set_cursor_line_style(Style::default());
                textarea.set_cursor_style(if focused {
                    Style::default().add_modifier(Modifier::REVERSED)
                } else {
                    Style::default()
                });
                textarea.set_block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(border_color)),
                );

                if textarea.lines().iter().all(|l| l.is_empty()) && !focused {
                    textarea.set_placeholder_text(placeholder.clone());
                    textarea.set_placeholder_style(Style::default().fg(Color::DarkGray));
                }

                frame.render_widget(&**textarea, area);
            }
            FormField::EnumSelect {
                options,
                selected,
                list_state,
            } => {
                let items: Vec<ListItem> = options
                    .iter()
                    .enumerate()
                    .map(|(i, opt)| {
                        let style = if i == *selected {
                            Style::default().add_modifier(Modifier::BOLD)
                        } else {
                            Style::default().fg(Color::Gray)
                        };
                        ListItem::new(Span::styled(opt.as_str(), style))
                    })
                    .collect();

                let highlight = if focused {
                    Style::default()
                        .add_modifier(Modifier::REVERSED)
                        .fg(Color::Cyan)
                } else {
                    Style::default().add_modifier(Modifier::BOLD)
                };
                let list = List::new(items)
                    .highlight_style(highlight)
                    .highlight_symbol("> ");

                frame.render_stateful_widget(list, area, list_state);
            }
        }
    }
}

/// Byte offset of the `char_idx`-th character, or the end of the string
fn byte_offset(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}
