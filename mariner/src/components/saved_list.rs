use std::rc::Rc;

use crossterm::event::KeyCode;
use mariner_core::{Action, SavedPort};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use tui_dispatch::EventKind;
use tui_dispatch_components::{SelectList, SelectListProps, SelectListStyle};

use super::{Component, HelpBar, HelpBarProps};

pub struct SavedListProps<'a> {
    pub ports: &'a [SavedPort],
    pub selected: usize,
    pub notice: Option<&'a str>,
    pub is_focused: bool,
}

#[derive(Default)]
pub struct SavedList {
    list: SelectList<SavedPort>,
}

impl SavedList {
    pub fn new() -> Self {
        Self::default()
    }

    fn row(port: &SavedPort) -> Line<'static> {
        let muted = Style::default().fg(Color::DarkGray);
        Line::from(vec![
            Span::styled(format!("{:<20}", port.name), Style::default().fg(Color::Cyan)),
            Span::raw(format!("{}, {} {}", port.city, port.state, port.zipcode)),
            Span::styled(format!("  {}", port.zone_code), muted),
            Span::styled(
                port.station_id
                    .as_deref()
                    .map(|id| format!(" · {id}"))
                    .unwrap_or_default(),
                muted,
            ),
        ])
    }

    fn list_props<'a>(
        ports: &'a [SavedPort],
        selected: usize,
        is_focused: bool,
    ) -> SelectListProps<'a, SavedPort, Action> {
        SelectListProps {
            is_focused,
            style: SelectListStyle::borderless(),
            ..SelectListProps::new(ports, selected, Rc::new(Action::PortSelect), &Self::row)
        }
    }
}

impl Component<Action> for SavedList {
    type Props<'a> = SavedListProps<'a>;

    fn handle_event(
        &mut self,
        event: &EventKind,
        props: Self::Props<'_>,
    ) -> impl IntoIterator<Item = Action> {
        if !props.is_focused {
            return Vec::new();
        }
        if let EventKind::Key(key) = event {
            match key.code {
                KeyCode::Enter if !props.ports.is_empty() => return vec![Action::PortConfirm],
                KeyCode::Char('d') | KeyCode::Delete if !props.ports.is_empty() => {
                    return vec![Action::PortDeleteRequest]
                }
                KeyCode::Char('/') | KeyCode::Esc => return vec![Action::DisplayNewSearch],
                KeyCode::Char('q') => return vec![Action::Quit],
                _ => {}
            }
        }
        self.list
            .handle_event(event, Self::list_props(props.ports, props.selected, true))
            .into_iter()
            .collect()
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, props: Self::Props<'_>) {
        let chunks = Layout::vertical([
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" Saved ports ");
        let inner = block.inner(chunks[0]);
        frame.render_widget(block, chunks[0]);
        self.list.render(
            frame,
            inner,
            Self::list_props(props.ports, props.selected, props.is_focused),
        );

        if props.ports.is_empty() {
            frame.render_widget(
                Paragraph::new("No saved ports yet. Press p on a forecast to save one.")
                    .style(Style::default().fg(Color::DarkGray)),
                chunks[1],
            );
        } else if let Some(notice) = props.notice {
            frame.render_widget(
                Paragraph::new(notice.to_string()).style(Style::default().fg(Color::Green)),
                chunks[1],
            );
        }

        let mut help = HelpBar;
        help.render(
            frame,
            chunks[2],
            HelpBarProps {
                keys: &[
                    ("↑/↓", "select"),
                    ("enter", "load"),
                    ("d", "delete"),
                    ("/", "new search"),
                    ("q", "quit"),
                ],
            },
        );
    }
}
