use std::rc::Rc;

use crossterm::event::KeyCode;
use mariner_core::Action;
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Style, Stylize},
    text::Line,
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use tui_dispatch::EventKind;
use tui_dispatch_components::{centered_rect, TextInput, TextInputProps, TextInputStyle};

use super::{end_key, input_frame, Component, HelpBar, HelpBarProps};

const PLACEHOLDER: &str = "Zip code or City, ST";

pub struct SearchViewProps<'a> {
    pub query: &'a str,
    pub notice: Option<&'a str>,
    pub is_focused: bool,
}

#[derive(Default)]
pub struct SearchView {
    input: TextInput,
}

impl SearchView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called when the screen is entered with a query already in state.
    pub fn reset(&mut self, query: &str) {
        self.input = TextInput::new();
        let props = Self::input_props(query, true);
        let _ = self.input.handle_event(&end_key(), props);
    }

    fn input_props(query: &str, is_focused: bool) -> TextInputProps<'_, Action> {
        TextInputProps {
            value: query,
            placeholder: PLACEHOLDER,
            is_focused,
            style: TextInputStyle::borderless(),
            on_change: Rc::new(Action::SearchQueryChange),
            on_submit: Rc::new(|_| Action::SearchSubmit),
            on_cursor_move: None,
            on_cancel: None,
        }
    }
}

impl Component<Action> for SearchView {
    type Props<'a> = SearchViewProps<'a>;

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
                KeyCode::Esc => return vec![Action::Quit],
                KeyCode::Tab => return vec![Action::PortsOpen],
                _ => {}
            }
        }
        self.input
            .handle_event(event, Self::input_props(props.query, true))
            .into_iter()
            .collect()
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, props: Self::Props<'_>) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Rgb(80, 80, 100)))
            .title(" ⚓ Mariner ")
            .title_style(Style::default().fg(Color::Cyan).bold())
            .title_alignment(Alignment::Center);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let chunks = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).split(inner);
        let form = centered_rect(44, 6, chunks[0]);
        let rows = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(form);

        frame.render_widget(
            Paragraph::new("Marine forecast, tides and alerts").centered(),
            rows[0],
        );
        let input_area = input_frame(frame, rows[1], "Location", props.is_focused);
        self.input
            .render(frame, input_area, Self::input_props(props.query, props.is_focused));
        if let Some(notice) = props.notice {
            frame.render_widget(
                Paragraph::new(Line::from(notice).fg(Color::Green)).centered(),
                rows[3],
            );
        }

        let mut help = HelpBar;
        help.render(
            frame,
            chunks[1],
            HelpBarProps {
                keys: &[("enter", "search"), ("tab", "saved ports"), ("esc", "quit")],
            },
        );
    }
}
