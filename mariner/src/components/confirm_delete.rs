use crossterm::event::KeyCode;
use mariner_core::Action;
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use tui_dispatch::EventKind;
use tui_dispatch_components::centered_rect;

use super::Component;

pub struct ConfirmDeleteProps<'a> {
    pub name: &'a str,
    pub is_focused: bool,
}

pub struct ConfirmDelete;

impl Component<Action> for ConfirmDelete {
    type Props<'a> = ConfirmDeleteProps<'a>;

    fn handle_event(
        &mut self,
        event: &EventKind,
        props: Self::Props<'_>,
    ) -> impl IntoIterator<Item = Action> {
        if !props.is_focused {
            return None;
        }
        match event {
            EventKind::Key(key) => match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => Some(Action::PortDeleteConfirm),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    Some(Action::PortDeleteCancel)
                }
                _ => None,
            },
            _ => None,
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, props: Self::Props<'_>) {
        let modal = centered_rect(46, 5, area);
        frame.render_widget(Clear, modal);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Delete port ")
            .title_alignment(Alignment::Center);
        let text = vec![
            Line::from(vec![
                Span::raw("Delete "),
                Span::raw(format!("\"{}\"", props.name)).bold(),
                Span::raw("?"),
            ]),
            Line::from(vec![
                Span::styled("y", Style::default().fg(Color::Cyan).bold()),
                Span::styled(" yes  ", Style::default().fg(Color::DarkGray)),
                Span::styled("n", Style::default().fg(Color::Cyan).bold()),
                Span::styled(" no", Style::default().fg(Color::DarkGray)),
            ]),
        ];
        frame.render_widget(Paragraph::new(text).block(block).centered(), modal);
    }
}
