use std::rc::Rc;

use crossterm::event::KeyCode;
use mariner_core::Action;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Style},
    widgets::{Clear, Paragraph},
    Frame,
};
use tui_dispatch::EventKind;
use tui_dispatch_components::{centered_rect, TextInput, TextInputProps, TextInputStyle};

use super::{end_key, input_frame, Component};

pub struct SavePromptProps<'a> {
    pub name: &'a str,
    /// "City, ST zip · ZONE" of what is being saved.
    pub subject: &'a str,
    pub is_focused: bool,
}

/// Modal name input over the dashboard.
#[derive(Default)]
pub struct SavePrompt {
    input: TextInput,
}

impl SavePrompt {
    pub fn new() -> Self {
        Self::default()
    }

    /// The reducer pre-fills the name; start editing at its end.
    pub fn reset(&mut self, name: &str) {
        self.input = TextInput::new();
        let props = Self::input_props(name, true);
        let _ = self.input.handle_event(&end_key(), props);
    }

    fn input_props(name: &str, is_focused: bool) -> TextInputProps<'_, Action> {
        TextInputProps {
            value: name,
            placeholder: "Port name",
            is_focused,
            style: TextInputStyle::borderless(),
            on_change: Rc::new(Action::SaveNameChange),
            on_submit: Rc::new(|_| Action::SaveSubmit),
            on_cursor_move: None,
            on_cancel: None,
        }
    }
}

impl Component<Action> for SavePrompt {
    type Props<'a> = SavePromptProps<'a>;

    fn handle_event(
        &mut self,
        event: &EventKind,
        props: Self::Props<'_>,
    ) -> impl IntoIterator<Item = Action> {
        if !props.is_focused {
            return Vec::new();
        }
        if let EventKind::Key(key) = event {
            if key.code == KeyCode::Esc {
                return vec![Action::SaveCancel];
            }
        }
        self.input
            .handle_event(event, Self::input_props(props.name, true))
            .into_iter()
            .collect()
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, props: Self::Props<'_>) {
        let modal = centered_rect(50, 6, area);
        frame.render_widget(Clear, modal);
        let chunks = Layout::vertical([
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(modal);

        let input_area = input_frame(frame, chunks[0], "Save port as", props.is_focused);
        self.input
            .render(frame, input_area, Self::input_props(props.name, props.is_focused));
        frame.render_widget(
            Paragraph::new(props.subject.to_string()).style(Style::default().fg(Color::DarkGray)),
            chunks[1],
        );
        frame.render_widget(
            Paragraph::new("enter save · esc cancel")
                .style(Style::default().fg(Color::DarkGray))
                .centered(),
            chunks[2],
        );
    }
}
