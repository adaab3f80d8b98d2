use crossterm::event::KeyCode;
use mariner_core::{Action, LoadingFlags};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tui_dispatch::EventKind;
use tui_dispatch_components::centered_rect;

use super::{spinner, Component, HelpBar, HelpBarProps};

pub struct LoadingViewProps<'a> {
    /// What is being looked up: the search query, port name or zone.
    pub subject: &'a str,
    pub loading: LoadingFlags,
    pub tick: u32,
    pub is_focused: bool,
}

pub struct LoadingView;

impl LoadingView {
    fn status_line(label: &str, pending: bool, tick: u32) -> Line<'static> {
        let (mark, style) = if pending {
            (spinner(tick), Style::default().fg(Color::Yellow))
        } else {
            ("✓", Style::default().fg(Color::Green))
        };
        Line::from(vec![
            Span::styled(format!("{mark} "), style),
            Span::raw(label.to_string()),
        ])
    }
}

impl Component<Action> for LoadingView {
    type Props<'a> = LoadingViewProps<'a>;

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
                KeyCode::Esc | KeyCode::Char('/') => Some(Action::DisplayNewSearch),
                KeyCode::Char('q') => Some(Action::Quit),
                _ => None,
            },
            _ => None,
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, props: Self::Props<'_>) {
        let chunks = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).split(area);

        let mut lines = vec![
            Line::from(vec![
                Span::styled(format!("{} ", spinner(props.tick)), Style::default().fg(Color::Cyan)),
                Span::raw("Looking up "),
                Span::raw(props.subject.to_string()).bold(),
            ]),
            Line::default(),
        ];
        if props.loading.any() {
            lines.push(Self::status_line("Marine forecast", props.loading.weather, props.tick));
            lines.push(Self::status_line("Tides", props.loading.tides, props.tick));
            lines.push(Self::status_line("Alerts", props.loading.alerts, props.tick));
        }

        let body = centered_rect(50, lines.len() as u16, chunks[0]);
        frame.render_widget(Paragraph::new(lines), body);

        let mut help = HelpBar;
        help.render(
            frame,
            chunks[1],
            HelpBarProps {
                keys: &[("esc", "cancel"), ("q", "quit")],
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tui_dispatch::testing::{key, RenderHarness};

    #[test]
    fn test_escape_cancels() {
        let props = LoadingViewProps {
            subject: "02633",
            loading: LoadingFlags::default(),
            tick: 0,
            is_focused: true,
        };
        let actions: Vec<_> = LoadingView
            .handle_event(&EventKind::Key(key("esc")), props)
            .into_iter()
            .collect();
        assert_eq!(actions, vec![Action::DisplayNewSearch]);
    }

    #[test]
    fn test_render_shows_pending_fetches() {
        let mut render = RenderHarness::new(60, 10);
        let output = render.render_to_string_plain(|frame| {
            let props = LoadingViewProps {
                subject: "ANZ254",
                loading: LoadingFlags {
                    weather: true,
                    tides: false,
                    alerts: true,
                },
                tick: 0,
                is_focused: true,
            };
            LoadingView.render(frame, frame.area(), props);
        });
        assert!(output.contains("Looking up ANZ254"), "{output}");
        assert!(output.contains("✓ Tides"), "{output}");
        assert!(output.contains("◐ Alerts"), "{output}");
    }
}
