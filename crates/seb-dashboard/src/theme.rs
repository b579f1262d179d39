use ratatui::style::{Color, Modifier, Style};
use seb_core::{BotStatus, ChannelState};

#[derive(Clone, Copy)]
pub struct Theme {
    pub bg: Color,
    pub surface: Color,
    pub border: Color,
    pub title: Color,
    pub text: Color,
    pub muted: Color,
    pub cpu: Color,
    pub ram: Color,
    pub badge_fg: Color,
    pub badge_bg: Color,
    pub empty_marker: Color,
    pub ok: Color,
    pub warn: Color,
    pub critical: Color,
}

pub fn dashboard_theme() -> Theme {
    Theme {
        bg: Color::Rgb(10, 12, 24),
        surface: Color::Rgb(18, 20, 36),
        border: Color::Rgb(71, 85, 105),
        title: Color::Rgb(191, 219, 254),
        text: Color::Rgb(226, 232, 240),
        muted: Color::Rgb(204, 204, 204),
        cpu: Color::Rgb(0, 255, 255),
        ram: Color::Rgb(255, 0, 255),
        badge_fg: Color::Rgb(10, 12, 24),
        badge_bg: Color::Rgb(0, 255, 255),
        empty_marker: Color::Rgb(255, 0, 255),
        ok: Color::Rgb(34, 197, 94),
        warn: Color::Rgb(245, 158, 11),
        critical: Color::Rgb(239, 68, 68),
    }
}

pub fn title_style(theme: Theme) -> Style {
    Style::default()
        .fg(theme.title)
        .add_modifier(Modifier::BOLD)
}

pub fn status_color(status: &BotStatus, theme: Theme) -> Color {
    match status {
        BotStatus::Active | BotStatus::Running => theme.ok,
        BotStatus::Idle | BotStatus::Inactive => theme.warn,
        BotStatus::Error => theme.critical,
        BotStatus::Other(_) => theme.muted,
    }
}

pub fn channel_color(state: &ChannelState, theme: Theme) -> Color {
    match state {
        ChannelState::Open => theme.ok,
        ChannelState::Connecting => theme.warn,
        ChannelState::Closed | ChannelState::Errored(_) => theme.critical,
    }
}
