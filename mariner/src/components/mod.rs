//! Screen views.
//!
//! Every view is a [`Component`]: props borrowed from [`AppState`] go in,
//! actions come out of `handle_event`, and `render` draws nothing but what the
//! props say. Cursor positions and scroll offsets are the only state a
//! component keeps for itself. Text entry and lists are the stock
//! `tui_dispatch_components` widgets.
//!
//! [`AppState`]: mariner_core::AppState

use crossterm::event::KeyCode;
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders},
    Frame,
};
pub use tui_dispatch::Component;
use tui_dispatch::EventKind;

pub mod app;
pub mod confirm_delete;
pub mod display;
pub mod error_view;
pub mod help_bar;
pub mod loading;
pub mod provisioning;
pub mod save_prompt;
pub mod saved_list;
pub mod search;
pub mod zone_list;

pub use app::{App, AppProps};
pub use confirm_delete::{ConfirmDelete, ConfirmDeleteProps};
pub use display::{MarineDisplay, MarineDisplayProps};
pub use error_view::{ErrorView, ErrorViewProps};
pub use help_bar::{HelpBar, HelpBarProps};
pub use loading::{LoadingView, LoadingViewProps};
pub use provisioning::{ProvisioningView, ProvisioningViewProps};
pub use save_prompt::{SavePrompt, SavePromptProps};
pub use saved_list::{SavedList, SavedListProps};
pub use search::{SearchView, SearchViewProps};
pub use zone_list::{ZoneList, ZoneListProps};

pub const SPINNERS: [&str; 4] = ["◐", "◓", "◑", "◒"];

pub fn spinner(tick: u32) -> &'static str {
    SPINNERS[(tick as usize / 2) % SPINNERS.len()]
}

/// Titled border around a text input; returns the area inside it.
fn input_frame(frame: &mut Frame, area: Rect, title: &str, is_focused: bool) -> Rect {
    let color = if is_focused { Color::Cyan } else { Color::DarkGray };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(format!(" {title} "));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    inner
}

/// Moves a text input's cursor past a value it did not type itself.
fn end_key() -> EventKind {
    EventKind::Key(KeyCode::End.into())
}
