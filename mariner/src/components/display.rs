//! The dashboard: current conditions, the forecast, tides and alerts for
//! the selected zone.

use crossterm::event::KeyCode;
use mariner_core::{
    Action, Alert, ForecastPeriod, LoadingFlags, Location, StationCandidate, TideEvent,
    TideKind, WeatherSnapshot, ZoneCandidate,
};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use tui_dispatch::EventKind;

use super::{spinner, Component, HelpBar, HelpBarProps};

const BORDER: Color = Color::Rgb(80, 80, 100);

pub struct MarineDisplayProps<'a> {
    pub location: Option<&'a Location>,
    pub zone: Option<&'a ZoneCandidate>,
    pub station: Option<&'a StationCandidate>,
    pub weather: Option<&'a WeatherSnapshot>,
    pub forecast: &'a [ForecastPeriod],
    pub tides: Option<&'a [TideEvent]>,
    pub alerts: Option<&'a [Alert]>,
    pub loading: LoadingFlags,
    pub warnings: &'a [String],
    pub notice: Option<&'a str>,
    pub tick: u32,
    pub is_focused: bool,
}

#[derive(Default)]
pub struct MarineDisplay {
    /// First forecast line shown.
    scroll: u16,
}

impl MarineDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset_scroll(&mut self) {
        self.scroll = 0;
    }

    fn panel(title: &str, pending: bool, tick: u32) -> Block<'static> {
        let title = if pending {
            format!(" {title} {} ", spinner(tick))
        } else {
            format!(" {title} ")
        };
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(BORDER))
            .title(title)
            .title_style(Style::default().fg(Color::Cyan).bold())
    }

    fn header(props: &MarineDisplayProps<'_>) -> Vec<Line<'static>> {
        let label = Style::default().fg(Color::DarkGray);
        let mut place = vec![Span::styled("Location ", label)];
        match props.location {
            Some(location) => place.push(Span::raw(location.display_name.clone()).bold()),
            None => place.push(Span::raw("unknown")),
        }
        let station = match props.station {
            Some(station) => format!(
                "{} {} ({}, {:.1} mi)",
                station.id, station.name, station.state, station.distance_miles
            ),
            None => "none nearby".to_string(),
        };
        vec![
            Line::from(place),
            Line::from(vec![Span::styled("Tide station ", label), Span::raw(station)]),
        ]
    }

    fn conditions(props: &MarineDisplayProps<'_>) -> Vec<Line<'static>> {
        let Some(weather) = props.weather else {
            return vec![Line::styled(
                if props.loading.weather {
                    "Fetching forecast…"
                } else {
                    "Forecast unavailable"
                },
                Style::default().fg(Color::DarkGray),
            )];
        };

        let label = Style::default().fg(Color::DarkGray);
        let mut lines = vec![Line::from(Span::styled(
            weather.period.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ))];
        if let Some(wind) = &weather.wind {
            lines.push(Line::from(vec![Span::styled("Wind  ", label), Span::raw(wind.clone())]));
        }
        if let Some(seas) = &weather.seas {
            lines.push(Line::from(vec![Span::styled("Seas  ", label), Span::raw(seas.clone())]));
        }
        if let Some(issued) = &weather.issued {
            lines.push(Line::styled(format!("Issued {issued}"), label));
        }
        lines.push(Line::default());

        for period in props.forecast {
            lines.push(Line::from(Span::styled(
                period.name.clone(),
                Style::default().fg(Color::Yellow).bold(),
            )));
            lines.push(Line::raw(period.text.clone()));
        }
        lines
    }

    fn tide_lines(props: &MarineDisplayProps<'_>) -> Vec<Line<'static>> {
        let muted = Style::default().fg(Color::DarkGray);
        match props.tides {
            None if props.loading.tides => vec![Line::styled("Fetching tides…", muted)],
            None if props.station.is_none() => vec![Line::styled("No tide station nearby", muted)],
            None => vec![Line::styled("Tides unavailable", muted)],
            Some([]) => vec![Line::styled("No predictions", muted)],
            Some(events) => events.iter().map(tide_line).collect(),
        }
    }

    fn alert_lines(props: &MarineDisplayProps<'_>) -> Vec<Line<'static>> {
        let muted = Style::default().fg(Color::DarkGray);
        match props.alerts {
            None if props.loading.alerts => vec![Line::styled("Fetching alerts…", muted)],
            None => vec![Line::styled("Alerts unavailable", muted)],
            Some([]) => vec![Line::styled("No active marine alerts", Style::default().fg(Color::Green))],
            Some(alerts) => alerts
                .iter()
                .flat_map(|alert| {
                    let mut lines = vec![Line::from(vec![
                        Span::styled("⚠ ", Style::default().fg(Color::Red)),
                        Span::styled(alert.event.clone(), Style::default().fg(Color::Red).bold()),
                    ])];
                    if !alert.headline.is_empty() {
                        lines.push(Line::raw(alert.headline.clone()));
                    }
                    if let Some(expires) = &alert.expires {
                        lines.push(Line::styled(format!("Until {expires}"), muted));
                    }
                    lines
                })
                .collect(),
        }
    }

    fn status_line(props: &MarineDisplayProps<'_>) -> Option<Line<'static>> {
        if let Some(warning) = props.warnings.first() {
            let more = props.warnings.len() - 1;
            let text = if more > 0 {
                format!("{warning} (+{more} more)")
            } else {
                warning.clone()
            };
            return Some(Line::styled(text, Style::default().fg(Color::Yellow)));
        }
        props
            .notice
            .map(|notice| Line::styled(notice.to_string(), Style::default().fg(Color::Green)))
    }
}

fn tide_line(event: &TideEvent) -> Line<'static> {
    let color = match event.kind {
        TideKind::High => Color::Cyan,
        TideKind::Low => Color::Blue,
    };
    Line::from(vec![
        Span::raw(event.time.format("%a %d %b %H:%M").to_string()),
        Span::styled(format!("  {:<4}", event.kind.label()), Style::default().fg(color)),
        Span::raw(format!("{:>6.1} ft", event.height_ft)),
    ])
}

impl Component<Action> for MarineDisplay {
    type Props<'a> = MarineDisplayProps<'a>;

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
                KeyCode::Char('r') | KeyCode::F(5) => {
                    self.reset_scroll();
                    Some(Action::DisplayRefresh)
                }
                KeyCode::Char('p') => Some(Action::SavePromptOpen),
                KeyCode::Char('s') | KeyCode::Char('/') => Some(Action::DisplayNewSearch),
                KeyCode::Char('l') => Some(Action::PortsOpen),
                KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
                KeyCode::Down | KeyCode::Char('j') => {
                    self.scroll = self.scroll.saturating_add(1);
                    None
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    self.scroll = self.scroll.saturating_sub(1);
                    None
                }
                _ => None,
            },
            EventKind::Scroll { delta, .. } => {
                self.scroll = self.scroll.saturating_add_signed(*delta as i16);
                None
            }
            _ => None,
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, props: Self::Props<'_>) {
        let title = match props.zone {
            Some(zone) => format!(" ⚓ {} · {} ", zone.code, zone.name),
            None => " ⚓ Mariner ".to_string(),
        };
        let outer = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(BORDER))
            .title(title)
            .title_style(Style::default().fg(Color::Cyan).bold())
            .title_alignment(Alignment::Center);
        frame.render_widget(outer.clone(), area);
        let inner = outer.inner(area);

        let status = Self::status_line(&props);
        let rows = Layout::vertical([
            Constraint::Length(2),
            Constraint::Min(4),
            Constraint::Length(u16::from(status.is_some())),
            Constraint::Length(1),
        ])
        .split(inner);

        frame.render_widget(Paragraph::new(Self::header(&props)), rows[0]);

        let columns =
            Layout::horizontal([Constraint::Percentage(55), Constraint::Percentage(45)]).split(rows[1]);

        let conditions = Self::conditions(&props);
        let conditions_block = Self::panel("Marine forecast", props.loading.weather, props.tick);
        let viewport = conditions_block.inner(columns[0]).height;
        let max_scroll = (conditions.len() as u16).saturating_sub(viewport);
        self.scroll = self.scroll.min(max_scroll);
        frame.render_widget(
            Paragraph::new(conditions)
                .block(conditions_block)
                .wrap(Wrap { trim: true })
                .scroll((self.scroll, 0)),
            columns[0],
        );

        let tides = Self::tide_lines(&props);
        let side = Layout::vertical([
            Constraint::Length(tides.len() as u16 + 2),
            Constraint::Min(3),
        ])
        .split(columns[1]);
        frame.render_widget(
            Paragraph::new(tides).block(Self::panel("Tides", props.loading.tides, props.tick)),
            side[0],
        );
        frame.render_widget(
            Paragraph::new(Self::alert_lines(&props))
                .block(Self::panel("Alerts", props.loading.alerts, props.tick))
                .wrap(Wrap { trim: true }),
            side[1],
        );

        if let Some(status) = status {
            frame.render_widget(Paragraph::new(status), rows[2]);
        }

        let mut help = HelpBar;
        help.render(
            frame,
            rows[3],
            HelpBarProps {
                keys: &[
                    ("r", "refresh"),
                    ("p", "save port"),
                    ("l", "ports"),
                    ("s", "search"),
                    ("q", "quit"),
                ],
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mariner_core::testing::fixtures;
    use tui_dispatch::testing::{key, RenderHarness};

    struct Data {
        location: Location,
        zone: ZoneCandidate,
        station: StationCandidate,
        weather: mariner_core::MarineWeather,
        tides: Vec<TideEvent>,
        alerts: Vec<Alert>,
    }

    fn data() -> Data {
        Data {
            location: fixtures::chatham(),
            zone: fixtures::zone("ANZ254", 3.1),
            station: fixtures::station("8447435", 0.1),
            weather: fixtures::weather("ANZ254"),
            tides: fixtures::tides(),
            alerts: vec![fixtures::alert("Small Craft Advisory")],
        }
    }

    fn props(data: &Data) -> MarineDisplayProps<'_> {
        MarineDisplayProps {
            location: Some(&data.location),
            zone: Some(&data.zone),
            station: Some(&data.station),
            weather: Some(&data.weather.current),
            forecast: &data.weather.forecast,
            tides: Some(&data.tides),
            alerts: Some(&data.alerts),
            loading: LoadingFlags::default(),
            warnings: &[],
            notice: None,
            tick: 0,
            is_focused: true,
        }
    }

    fn send(k: &str) -> Vec<Action> {
        let data = data();
        MarineDisplay::new()
            .handle_event(&EventKind::Key(key(k)), props(&data))
            .into_iter()
            .collect()
    }

    #[test]
    fn test_keys() {
        assert_eq!(send("r"), vec![Action::DisplayRefresh]);
        assert_eq!(send("p"), vec![Action::SavePromptOpen]);
        assert_eq!(send("s"), vec![Action::DisplayNewSearch]);
        assert_eq!(send("l"), vec![Action::PortsOpen]);
        assert_eq!(send("q"), vec![Action::Quit]);
        assert!(send("x").is_empty());
    }

    #[test]
    fn test_render_full_dashboard() {
        let data = data();
        let mut view = MarineDisplay::new();
        let mut render = RenderHarness::new(100, 30);
        let output = render.render_to_string_plain(|frame| {
            view.render(frame, frame.area(), props(&data));
        });
        assert!(output.contains("ANZ254"), "{output}");
        assert!(output.contains("Chatham, MA 02633"), "{output}");
        assert!(output.contains("8447435 Chatham, Lydia Cove"), "{output}");
        assert!(output.contains("Wind  SW winds 10 to 15 kt"), "{output}");
        assert!(output.contains("Seas  Seas 2 to 3 ft"), "{output}");
        assert!(output.contains("Sat 13 Jul 04:12  High"), "{output}");
        assert!(output.contains("0.2 ft"), "{output}");
        assert!(output.contains("Small Craft Advisory"), "{output}");
    }

    #[test]
    fn test_render_partial_failure() {
        let data = data();
        let warnings = vec!["Weather unavailable: server returned status 503".to_string()];
        let mut view = MarineDisplay::new();
        let mut render = RenderHarness::new(100, 30);
        let output = render.render_to_string_plain(|frame| {
            let props = MarineDisplayProps {
                weather: None,
                forecast: &[],
                alerts: Some(&[]),
                warnings: &warnings,
                ..props(&data)
            };
            view.render(frame, frame.area(), props);
        });
        assert!(output.contains("Forecast unavailable"), "{output}");
        assert!(output.contains("No active marine alerts"), "{output}");
        assert!(output.contains("Weather unavailable: server returned status 503"), "{output}");
    }

    #[test]
    fn test_render_without_station() {
        let data = data();
        let mut view = MarineDisplay::new();
        let mut render = RenderHarness::new(100, 30);
        let output = render.render_to_string_plain(|frame| {
            let props = MarineDisplayProps {
                station: None,
                tides: None,
                notice: Some("Saved port \"Home\""),
                ..props(&data)
            };
            view.render(frame, frame.area(), props);
        });
        assert!(output.contains("none nearby"), "{output}");
        assert!(output.contains("No tide station nearby"), "{output}");
        assert!(output.contains("Saved port \"Home\""), "{output}");
    }
}
