use crate::channel::Channel;
use crate::control::{outcome_message, ActionResponse, ControlAction};
use crate::error::PayloadError;
use crate::metrics::{parse_chart_metrics, TimeSeriesBuffer};
use crate::notify::Notifier;
use crate::platforms::{parse_active_platforms, PlatformRenderPlan};
use crate::status::{parse_context_metrics, StatusSnapshot};
use crate::tasks::TaskListing;
use std::time::Instant;

/// Every state slice the dashboard renders. Each slice has exactly one
/// writer: the channel or poller that feeds it.
#[derive(Clone, Debug, Default)]
pub struct DashboardState {
    pub chart: TimeSeriesBuffer,
    pub status: Option<StatusSnapshot>,
    pub platforms: PlatformRenderPlan,
    pub tasks: TaskListing,
    pub notifier: Notifier,
    tasks_failing: bool,
}

impl DashboardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one pushed payload. On error the slice keeps its previous
    /// contents and a single notification is raised.
    pub fn apply_channel_message(
        &mut self,
        channel: Channel,
        data: &str,
        now: Instant,
    ) -> Result<(), PayloadError> {
        let applied = match channel {
            Channel::ChartMetrics => parse_chart_metrics(data).map(|metrics| {
                self.chart.append(metrics.cpu_percent, metrics.ram_percent);
            }),
            Channel::ContextMetrics => parse_context_metrics(data).map(|snapshot| {
                self.status = Some(snapshot);
            }),
            Channel::ActivePlatform => parse_active_platforms(data).map(|plan| {
                self.platforms = plan;
            }),
        };
        if applied.is_err() {
            self.notifier.notify(channel.failure_message(), now);
        }
        applied
    }

    /// Replaces the task listing on success. A failed refresh keeps the last
    /// listing and notifies once per outage rather than once per poll.
    pub fn apply_task_refresh(&mut self, result: Result<TaskListing, String>, now: Instant) {
        match result {
            Ok(listing) => {
                self.tasks = listing;
                self.tasks_failing = false;
            }
            Err(detail) => {
                if !self.tasks_failing {
                    let message = format!("Task list unavailable: {detail}");
                    self.notifier.notify(message, now);
                }
                self.tasks_failing = true;
            }
        }
    }

    pub fn tasks_failing(&self) -> bool {
        self.tasks_failing
    }

    pub fn apply_action_outcome(
        &mut self,
        action: ControlAction,
        result: &Result<ActionResponse, String>,
        now: Instant,
    ) {
        self.notifier.notify(outcome_message(action, result), now);
    }
}
