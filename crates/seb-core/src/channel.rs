use std::fmt;
use std::time::Duration;

pub const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
pub const MAX_BACKOFF: Duration = Duration::from_secs(10);

/// The three server-push streams the dashboard listens to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Channel {
    ChartMetrics,
    ContextMetrics,
    ActivePlatform,
}

impl Channel {
    pub const ALL: [Channel; 3] = [
        Channel::ChartMetrics,
        Channel::ContextMetrics,
        Channel::ActivePlatform,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Channel::ChartMetrics => "/api/chart-metrics",
            Channel::ContextMetrics => "/api/context-metrics",
            Channel::ActivePlatform => "/api/active-platform",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Channel::ChartMetrics => "chart",
            Channel::ContextMetrics => "context",
            Channel::ActivePlatform => "platforms",
        }
    }

    /// Toast raised when one of this channel's payloads cannot be applied.
    pub fn failure_message(self) -> &'static str {
        match self {
            Channel::ChartMetrics => "Failed to fetch Chart Metrics",
            Channel::ContextMetrics => "Failed to fetch Content Metrics",
            Channel::ActivePlatform => "Failed to fetch Active Platforms",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ChannelState {
    #[default]
    Connecting,
    Open,
    Closed,
    Errored(String),
}

impl ChannelState {
    pub fn label(&self) -> &'static str {
        match self {
            ChannelState::Connecting => "connecting",
            ChannelState::Open => "open",
            ChannelState::Closed => "closed",
            ChannelState::Errored(_) => "errored",
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, ChannelState::Open)
    }
}

/// Reconnect delay: doubles from one second up to a ten second cap and
/// resets after a successful connect. A server `retry:` hint replaces the
/// next delay once.
#[derive(Clone, Debug)]
pub struct Backoff {
    current: Duration,
    hint: Option<Duration>,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            current: INITIAL_BACKOFF,
            hint: None,
        }
    }
}

impl Backoff {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.current = INITIAL_BACKOFF;
    }

    pub fn set_hint(&mut self, hint: Duration) {
        self.hint = Some(hint);
    }

    /// Delay to wait now; advances the schedule for the following attempt.
    pub fn next_delay(&mut self) -> Duration {
        if let Some(hint) = self.hint.take() {
            return hint;
        }
        let delay = self.current;
        self.current = next_backoff(self.current);
        delay
    }
}

pub fn next_backoff(current: Duration) -> Duration {
    let next = current + current;
    if next > MAX_BACKOFF {
        MAX_BACKOFF
    } else {
        next
    }
}
