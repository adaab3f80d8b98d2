use std::rc::Rc;

use crossterm::event::KeyCode;
use mariner_core::{Action, Location, ZoneCandidate};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use tui_dispatch::EventKind;
use tui_dispatch_components::{SelectList, SelectListProps, SelectListStyle};

use super::{Component, HelpBar, HelpBarProps};

pub struct ZoneListProps<'a> {
    pub location: Option<&'a Location>,
    pub zones: &'a [ZoneCandidate],
    pub selected: usize,
    /// Station lookup still running.
    pub stations_pending: bool,
    pub is_focused: bool,
}

#[derive(Default)]
pub struct ZoneList {
    list: SelectList<ZoneCandidate>,
}

impl ZoneList {
    pub fn new() -> Self {
        Self::default()
    }

    fn row(zone: &ZoneCandidate) -> Line<'static> {
        Line::from(vec![
            Span::styled(format!("{:<8}", zone.code), Style::default().fg(Color::Cyan)),
            Span::raw(format!("{:>6.1} mi  ", zone.distance_miles)),
            Span::raw(zone.name.clone()),
        ])
    }

    fn list_props<'a>(
        zones: &'a [ZoneCandidate],
        selected: usize,
        is_focused: bool,
    ) -> SelectListProps<'a, ZoneCandidate, Action> {
        SelectListProps {
            is_focused,
            style: SelectListStyle::borderless(),
            ..SelectListProps::new(zones, selected, Rc::new(Action::ZoneSelect), &Self::row)
        }
    }
}

impl Component<Action> for ZoneList {
    type Props<'a> = ZoneListProps<'a>;

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
                KeyCode::Enter => return vec![Action::ZoneConfirm],
                KeyCode::Esc | KeyCode::Char('/') | KeyCode::Char('s') => {
                    return vec![Action::DisplayNewSearch]
                }
                KeyCode::Char('q') => return vec![Action::Quit],
                _ => {}
            }
        }
        self.list
            .handle_event(event, Self::list_props(props.zones, props.selected, true))
            .into_iter()
            .collect()
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, props: Self::Props<'_>) {
        let chunks = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);

        let mut header = vec![Span::styled(" Zones near ", Style::default().fg(Color::DarkGray))];
        if let Some(location) = props.location {
            header.push(Span::raw(location.display_name.clone()).bold());
        }
        if props.stations_pending {
            header.push(Span::styled(
                "  (finding tide stations…)",
                Style::default().fg(Color::DarkGray),
            ));
        }
        frame.render_widget(Paragraph::new(Line::from(header)), chunks[0]);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" Marine zones ");
        let inner = block.inner(chunks[1]);
        frame.render_widget(block, chunks[1]);
        self.list.render(
            frame,
            inner,
            Self::list_props(props.zones, props.selected, props.is_focused),
        );

        let mut help = HelpBar;
        help.render(
            frame,
            chunks[2],
            HelpBarProps {
                keys: &[("↑/↓", "select"), ("enter", "forecast"), ("/", "new search"), ("q", "quit")],
            },
        );
    }
}
