use crossterm::event::{KeyCode, KeyModifiers};
use mariner_core::Action;
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use tui_dispatch::EventKind;
use tui_dispatch_components::centered_rect;

use super::{spinner, Component};

pub struct ProvisioningViewProps<'a> {
    pub log: &'a [String],
    pub tick: u32,
}

/// First-launch setup. Only Ctrl+C gets out; everything else waits.
pub struct ProvisioningView;

impl Component<Action> for ProvisioningView {
    type Props<'a> = ProvisioningViewProps<'a>;

    fn handle_event(
        &mut self,
        event: &EventKind,
        _props: Self::Props<'_>,
    ) -> impl IntoIterator<Item = Action> {
        match event {
            EventKind::Key(key)
                if key.code == KeyCode::Char('c')
                    && key.modifiers.contains(KeyModifiers::CONTROL) =>
            {
                Some(Action::Quit)
            }
            _ => None,
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, props: Self::Props<'_>) {
        let height = props.log.len() as u16 + 6;
        let modal = centered_rect(72, height, area);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Rgb(80, 80, 100)))
            .title(format!(" {} Building local index ", spinner(props.tick)))
            .title_style(Style::default().fg(Color::Cyan).bold())
            .title_alignment(Alignment::Center);
        frame.render_widget(block.clone(), modal);
        let inner = block.inner(modal);

        let chunks = Layout::vertical([
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(inner);

        frame.render_widget(
            Paragraph::new("Downloading marine zones, tide stations and zip codes.")
                .style(Style::default().fg(Color::DarkGray)),
            chunks[0],
        );

        let last = props.log.len().saturating_sub(1);
        let lines: Vec<Line> = props
            .log
            .iter()
            .enumerate()
            .map(|(i, line)| {
                let (mark, style) = if i == last {
                    (spinner(props.tick), Style::default())
                } else {
                    ("✓", Style::default().fg(Color::DarkGray))
                };
                Line::from(vec![
                    Span::styled(format!("{mark} "), Style::default().fg(Color::Green)),
                    Span::styled(line.clone(), style),
                ])
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), chunks[1]);

        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled("ctrl+c", Style::default().fg(Color::Cyan).bold()),
                Span::styled(" abort", Style::default().fg(Color::DarkGray)),
            ]))
            .centered(),
            chunks[2],
        );
    }
}
