use crate::config::Config;
use crate::feed::FeedEvent;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use seb_core::{Channel, ChannelState, ControlAction, DashboardState};
use std::{collections::BTreeMap, time::Instant};
use tracing::{debug, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Page {
    Dashboard,
    Tasks,
}

impl Page {
    pub fn title(self) -> &'static str {
        match self {
            Page::Dashboard => "Dashboard",
            Page::Tasks => "Tasks",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Page::Dashboard => Page::Tasks,
            Page::Tasks => Page::Dashboard,
        }
    }
}

/// What the main loop should do after a key press.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppCommand {
    Nothing,
    Quit,
    Trigger(ControlAction),
    RefreshTasks,
}

pub struct App {
    pub config: Config,
    pub state: DashboardState,
    pub channels: BTreeMap<Channel, ChannelState>,
    pub page: Page,
    pub help_open: bool,
    pub task_scroll: u16,
    pub pending_actions: usize,
}

impl App {
    pub fn new(config: Config) -> Self {
        let channels = Channel::ALL
            .iter()
            .map(|channel| (*channel, ChannelState::Connecting))
            .collect();
        Self {
            config,
            state: DashboardState::new(),
            channels,
            page: Page::Dashboard,
            help_open: false,
            task_scroll: 0,
            pending_actions: 0,
        }
    }

    pub fn channel_state(&self, channel: Channel) -> &ChannelState {
        self.channels
            .get(&channel)
            .unwrap_or(&ChannelState::Connecting)
    }

    pub fn apply_feed(&mut self, event: FeedEvent, now: Instant) {
        match event {
            FeedEvent::ChannelState { channel, state } => {
                debug!(event = "channel_state", channel = %channel, state = state.label());
                self.channels.insert(channel, state);
            }
            FeedEvent::Message { channel, data } => {
                if let Err(err) = self.state.apply_channel_message(channel, &data, now) {
                    warn!(event = "payload_rejected", channel = %channel, error = %err);
                }
            }
            FeedEvent::Tasks(result) => {
                self.state.apply_task_refresh(result, now);
                let max_scroll = self.max_task_scroll();
                if self.task_scroll > max_scroll {
                    self.task_scroll = max_scroll;
                }
            }
            FeedEvent::ActionFinished { action, result } => {
                self.pending_actions = self.pending_actions.saturating_sub(1);
                info!(event = "control_action_done", action = %action, ok = result.is_ok());
                self.state.apply_action_outcome(action, &result, now);
            }
        }
    }

    pub fn handle_event(&mut self, event: Event) -> AppCommand {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
            _ => AppCommand::Nothing,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> AppCommand {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return AppCommand::Quit;
        }
        if matches!(key.code, KeyCode::Char('?') | KeyCode::F(1)) {
            self.help_open = !self.help_open;
            return AppCommand::Nothing;
        }
        if key.code == KeyCode::Esc && self.help_open {
            self.help_open = false;
            return AppCommand::Nothing;
        }
        if self.help_open {
            return AppCommand::Nothing;
        }

        match key.code {
            KeyCode::Char('q') => AppCommand::Quit,
            KeyCode::Char('1') => {
                self.page = Page::Dashboard;
                AppCommand::Nothing
            }
            KeyCode::Char('2') => {
                self.page = Page::Tasks;
                AppCommand::Nothing
            }
            KeyCode::Tab => {
                self.page = self.page.next();
                AppCommand::Nothing
            }
            KeyCode::Char('s') => self.trigger(ControlAction::Start),
            KeyCode::Char('x') => self.trigger(ControlAction::Stop),
            KeyCode::Char('R') => self.trigger(ControlAction::ResetTasks),
            KeyCode::Char('r') if self.page == Page::Tasks => AppCommand::RefreshTasks,
            KeyCode::Down | KeyCode::Char('j') if self.page == Page::Tasks => {
                self.task_scroll = self.task_scroll.saturating_add(1).min(self.max_task_scroll());
                AppCommand::Nothing
            }
            KeyCode::Up | KeyCode::Char('k') if self.page == Page::Tasks => {
                self.task_scroll = self.task_scroll.saturating_sub(1);
                AppCommand::Nothing
            }
            KeyCode::Char('g') if self.page == Page::Tasks => {
                self.task_scroll = 0;
                AppCommand::Nothing
            }
            _ => AppCommand::Nothing,
        }
    }

    fn trigger(&mut self, action: ControlAction) -> AppCommand {
        self.pending_actions += 1;
        AppCommand::Trigger(action)
    }

    fn max_task_scroll(&self) -> u16 {
        let lines = crate::ui::task_line_count(&self.state.tasks);
        u16::try_from(lines.saturating_sub(1)).unwrap_or(u16::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;
    use seb_core::{tasks::parse_task_listing, ActionResponse};
    use std::path::PathBuf;
    use std::time::Duration;

    fn test_config() -> Config {
        Config {
            base_url: "http://127.0.0.1:5000".to_string(),
            task_poll: Duration::from_millis(5000),
            log_dir: PathBuf::from("/tmp"),
            debug: false,
        }
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn channels_start_connecting_and_track_updates() {
        let mut app = App::new(test_config());
        assert_eq!(
            app.channel_state(Channel::ChartMetrics),
            &ChannelState::Connecting
        );
        app.apply_feed(
            FeedEvent::ChannelState {
                channel: Channel::ChartMetrics,
                state: ChannelState::Open,
            },
            Instant::now(),
        );
        assert!(app.channel_state(Channel::ChartMetrics).is_open());
        assert_eq!(
            app.channel_state(Channel::ContextMetrics),
            &ChannelState::Connecting
        );
    }

    #[test]
    fn malformed_message_notifies_once_and_keeps_chart() {
        let mut app = App::new(test_config());
        let now = Instant::now();
        app.apply_feed(
            FeedEvent::Message {
                channel: Channel::ChartMetrics,
                data: r#"{"cpu_percent": 5, "ram_percent": 6}"#.to_string(),
            },
            now,
        );
        app.apply_feed(
            FeedEvent::Message {
                channel: Channel::ChartMetrics,
                data: "garbage".to_string(),
            },
            now,
        );
        assert_eq!(app.state.chart.len(), 1);
        assert_eq!(app.state.notifier.issued(), 1);
    }

    #[test]
    fn control_keys_request_actions() {
        let mut app = App::new(test_config());
        assert_eq!(
            app.handle_key(press(KeyCode::Char('s'))),
            AppCommand::Trigger(ControlAction::Start)
        );
        assert_eq!(
            app.handle_key(press(KeyCode::Char('x'))),
            AppCommand::Trigger(ControlAction::Stop)
        );
        assert_eq!(
            app.handle_key(press(KeyCode::Char('R'))),
            AppCommand::Trigger(ControlAction::ResetTasks)
        );
        assert_eq!(app.pending_actions, 3);

        app.apply_feed(
            FeedEvent::ActionFinished {
                action: ControlAction::Start,
                result: Ok(ActionResponse {
                    message: Some("SocialEarningBot already initiated".to_string()),
                    error: None,
                }),
            },
            Instant::now(),
        );
        assert_eq!(app.pending_actions, 2);
        assert_eq!(
            app.state.notifier.last_message(),
            Some("SocialEarningBot already initiated")
        );
    }

    #[test]
    fn help_overlay_swallows_keys() {
        let mut app = App::new(test_config());
        app.handle_key(press(KeyCode::Char('?')));
        assert!(app.help_open);
        assert_eq!(app.handle_key(press(KeyCode::Char('q'))), AppCommand::Nothing);
        app.handle_key(press(KeyCode::Esc));
        assert!(!app.help_open);
        assert_eq!(app.handle_key(press(KeyCode::Char('q'))), AppCommand::Quit);
    }

    #[test]
    fn ctrl_c_quits() {
        let mut app = App::new(test_config());
        let key = KeyEvent {
            modifiers: KeyModifiers::CONTROL,
            ..press(KeyCode::Char('c'))
        };
        assert_eq!(app.handle_key(key), AppCommand::Quit);
    }

    #[test]
    fn refresh_and_top_keys_only_act_on_tasks_page() {
        let mut app = App::new(test_config());
        let listing = parse_task_listing(r#"{"message": {"1": {}, "2": {}}}"#).expect("parse");
        app.apply_feed(FeedEvent::Tasks(Ok(listing)), Instant::now());
        app.page = Page::Tasks;
        app.handle_key(press(KeyCode::Char('j')));
        app.handle_key(press(KeyCode::Char('j')));
        assert_eq!(app.task_scroll, 2);

        app.page = Page::Dashboard;
        assert_eq!(app.handle_key(press(KeyCode::Char('r'))), AppCommand::Nothing);
        app.handle_key(press(KeyCode::Char('g')));
        assert_eq!(app.task_scroll, 2);

        app.page = Page::Tasks;
        assert_eq!(
            app.handle_key(press(KeyCode::Char('r'))),
            AppCommand::RefreshTasks
        );
        app.handle_key(press(KeyCode::Char('g')));
        assert_eq!(app.task_scroll, 0);
    }

    #[test]
    fn page_navigation_and_task_scroll() {
        let mut app = App::new(test_config());
        app.handle_key(press(KeyCode::Tab));
        assert_eq!(app.page, Page::Tasks);

        let listing = parse_task_listing(r#"{"message": {"1": {}, "2": {}}}"#).expect("parse");
        app.apply_feed(FeedEvent::Tasks(Ok(listing)), Instant::now());
        for _ in 0..100 {
            app.handle_key(press(KeyCode::Char('j')));
        }
        let scrolled = app.task_scroll;
        assert!(scrolled > 0);
        assert!(usize::from(scrolled) < crate::ui::task_line_count(&app.state.tasks));

        app.apply_feed(
            FeedEvent::Tasks(Ok(parse_task_listing(r#"{"message": {}}"#).expect("parse"))),
            Instant::now(),
        );
        assert_eq!(app.task_scroll, 0);

        app.handle_key(press(KeyCode::Char('1')));
        assert_eq!(app.page, Page::Dashboard);
    }
}
