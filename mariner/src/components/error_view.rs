use crossterm::event::KeyCode;
use mariner_core::Action;
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use tui_dispatch::EventKind;
use tui_dispatch_components::centered_rect;

use super::Component;

pub struct ErrorViewProps<'a> {
    pub message: &'a str,
    pub is_focused: bool,
}

pub struct ErrorView;

impl Component<Action> for ErrorView {
    type Props<'a> = ErrorViewProps<'a>;

    fn handle_event(
        &mut self,
        event: &EventKind,
        props: Self::Props<'_>,
    ) -> impl IntoIterator<Item = Action> {
        if !props.is_focused {
            return None;
        }
        match event {
            EventKind::Key(key) if key.code == KeyCode::Char('q') => Some(Action::Quit),
            EventKind::Key(_) => Some(Action::ErrorDismiss),
            _ => None,
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, props: Self::Props<'_>) {
        let modal = centered_rect(60, 9, area);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red))
            .title(" Error ")
            .title_style(Style::default().fg(Color::Red).bold())
            .title_alignment(Alignment::Center);

        let text = vec![
            Line::default(),
            Line::raw(props.message.to_string()),
            Line::default(),
            Line::styled(
                "Press any key to search again, q to quit",
                Style::default().fg(Color::DarkGray),
            ),
        ];
        frame.render_widget(
            Paragraph::new(text)
                .block(block)
                .centered()
                .wrap(Wrap { trim: true }),
            modal,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tui_dispatch::testing::{key, RenderHarness};

    fn send(k: &str) -> Vec<Action> {
        let props = ErrorViewProps {
            message: "zipcode 99999 not found",
            is_focused: true,
        };
        ErrorView
            .handle_event(&EventKind::Key(key(k)), props)
            .into_iter()
            .collect()
    }

    #[test]
    fn test_any_key_dismisses_except_quit() {
        assert_eq!(send("enter"), vec![Action::ErrorDismiss]);
        assert_eq!(send("x"), vec![Action::ErrorDismiss]);
        assert_eq!(send("q"), vec![Action::Quit]);
    }

    #[test]
    fn test_render_message() {
        let mut render = RenderHarness::new(70, 15);
        let output = render.render_to_string_plain(|frame| {
            let props = ErrorViewProps {
                message: "zipcode 99999 not found",
                is_focused: true,
            };
            ErrorView.render(frame, frame.area(), props);
        });
        assert!(output.contains("Error"), "{output}");
        assert!(output.contains("zipcode 99999 not found"), "{output}");
    }
}
