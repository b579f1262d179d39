use crate::config::{endpoint, Config};
use futures_util::StreamExt;
use reqwest::{header::ACCEPT, Client};
use seb_core::{
    tasks::{parse_task_listing, TaskListing},
    ActionResponse, Backoff, Channel, ChannelState, ControlAction, SseFrameDecoder,
};
use std::time::Duration;
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{interval, sleep, MissedTickBehavior},
};
use tracing::{debug, info, warn};

pub const FEED_QUEUE_CAPACITY: usize = 256;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const LAST_EVENT_ID: &str = "Last-Event-ID";

#[derive(Debug)]
pub enum FeedEvent {
    ChannelState {
        channel: Channel,
        state: ChannelState,
    },
    Message {
        channel: Channel,
        data: String,
    },
    Tasks(Result<TaskListing, String>),
    ActionFinished {
        action: ControlAction,
        result: Result<ActionResponse, String>,
    },
}

pub fn build_client() -> reqwest::Result<Client> {
    Client::builder().connect_timeout(CONNECT_TIMEOUT).build()
}

/// Every background task feeding the UI. Dropping it aborts them all.
pub struct FeedTasks {
    client: Client,
    base_url: String,
    tx: mpsc::Sender<FeedEvent>,
    handles: Vec<JoinHandle<()>>,
}

impl FeedTasks {
    pub fn spawn(
        client: Client,
        config: &Config,
        tx: mpsc::Sender<FeedEvent>,
        refresh_rx: mpsc::Receiver<()>,
    ) -> Self {
        let mut handles = Vec::with_capacity(Channel::ALL.len() + 1);
        for channel in Channel::ALL {
            let url = config.endpoint(channel.path());
            handles.push(tokio::spawn(subscription_loop(
                client.clone(),
                url,
                channel,
                tx.clone(),
            )));
        }
        handles.push(tokio::spawn(task_poll_loop(
            client.clone(),
            config.endpoint("/api/task/list"),
            config.task_poll,
            tx.clone(),
            refresh_rx,
        )));
        Self {
            client,
            base_url: config.base_url.clone(),
            tx,
            handles,
        }
    }

    /// Fire-and-forget: the outcome comes back as [`FeedEvent::ActionFinished`].
    pub fn trigger(&mut self, action: ControlAction) {
        self.handles.retain(|handle| !handle.is_finished());
        let url = endpoint(&self.base_url, action.path());
        info!(event = "control_action", action = %action, url = %url);
        self.handles.push(spawn_action(
            self.client.clone(),
            url,
            action,
            self.tx.clone(),
        ));
    }

    pub fn shutdown(&mut self) {
        for handle in self.handles.drain(..) {
            handle.abort();
        }
    }
}

impl Drop for FeedTasks {
    fn drop(&mut self) {
        self.shutdown();
    }
}

pub async fn subscription_loop(
    client: Client,
    url: String,
    channel: Channel,
    tx: mpsc::Sender<FeedEvent>,
) {
    let mut backoff = Backoff::new();
    let mut last_event_id: Option<String> = None;

    loop {
        if send_state(&tx, channel, ChannelState::Connecting).await.is_err() {
            return;
        }

        let mut request = client.get(&url).header(ACCEPT, "text/event-stream");
        if let Some(id) = last_event_id.as_deref() {
            request = request.header(LAST_EVENT_ID, id);
        }
        let response = match request.send().await.and_then(|r| r.error_for_status()) {
            Ok(response) => response,
            Err(err) => {
                warn!(event = "sse_connect_error", channel = %channel, error = %err);
                if send_state(&tx, channel, ChannelState::Errored(err.to_string()))
                    .await
                    .is_err()
                {
                    return;
                }
                sleep(backoff.next_delay()).await;
                continue;
            }
        };
        backoff.reset();
        info!(event = "sse_open", channel = %channel, url = %url);
        if send_state(&tx, channel, ChannelState::Open).await.is_err() {
            return;
        }

        let mut decoder = SseFrameDecoder::default();
        let mut body = response.bytes_stream();
        let end_state = loop {
            let chunk = match body.next().await {
                Some(Ok(chunk)) => chunk,
                Some(Err(err)) => break ChannelState::Errored(err.to_string()),
                None => break ChannelState::Closed,
            };
            let report = decoder.push_chunk(&chunk);
            for err in report.errors {
                warn!(event = "sse_decode_error", channel = %channel, error = %err);
            }
            if let Some(retry) = report.retry {
                backoff.set_hint(retry);
            }
            for event in report.events {
                if !event.is_message() {
                    debug!(event = "sse_event_skipped", channel = %channel, kind = %event.event);
                    continue;
                }
                let message = FeedEvent::Message {
                    channel,
                    data: event.data,
                };
                if tx.send(message).await.is_err() {
                    return;
                }
            }
            if let Some(id) = decoder.last_event_id() {
                last_event_id = Some(id.to_string());
            }
        };

        let dropped = decoder.finish();
        if dropped > 0 {
            debug!(event = "sse_partial_dropped", channel = %channel, bytes = dropped);
        }
        warn!(event = "sse_closed", channel = %channel, state = end_state.label());
        if send_state(&tx, channel, end_state).await.is_err() {
            return;
        }
        sleep(backoff.next_delay()).await;
    }
}

async fn send_state(
    tx: &mpsc::Sender<FeedEvent>,
    channel: Channel,
    state: ChannelState,
) -> Result<(), mpsc::error::SendError<FeedEvent>> {
    tx.send(FeedEvent::ChannelState { channel, state }).await
}

pub async fn task_poll_loop(
    client: Client,
    url: String,
    period: Duration,
    tx: mpsc::Sender<FeedEvent>,
    mut refresh_rx: mpsc::Receiver<()>,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut refresh_open = true;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            request = refresh_rx.recv(), if refresh_open => {
                if request.is_none() {
                    refresh_open = false;
                    continue;
                }
                ticker.reset();
            }
        }

        let result = fetch_tasks(&client, &url).await;
        match &result {
            Ok(listing) => debug!(event = "task_list", count = listing.len()),
            Err(err) => warn!(event = "task_list_error", url = %url, error = %err),
        }
        if tx.send(FeedEvent::Tasks(result)).await.is_err() {
            return;
        }
    }
}

pub async fn fetch_tasks(client: &Client, url: &str) -> Result<TaskListing, String> {
    let response = client.get(url).send().await.map_err(|err| err.to_string())?;
    let status = response.status();
    let body = response.text().await.map_err(|err| err.to_string())?;
    if !status.is_success() {
        let detail = serde_json::from_str::<ActionResponse>(&body)
            .ok()
            .and_then(|parsed| parsed.error.or(parsed.message))
            .unwrap_or_else(|| status.to_string());
        return Err(format!("HTTP {}: {detail}", status.as_u16()));
    }
    parse_task_listing(&body).map_err(|err| err.to_string())
}

pub fn spawn_action(
    client: Client,
    url: String,
    action: ControlAction,
    tx: mpsc::Sender<FeedEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let result = run_action(&client, &url).await;
        if let Err(err) = &result {
            warn!(event = "control_action_error", action = %action, error = %err);
        }
        let _ = tx.send(FeedEvent::ActionFinished { action, result }).await;
    })
}

/// Any decodable body counts as an answer, including error statuses: the
/// bot reports refusals through `message`.
pub async fn run_action(client: &Client, url: &str) -> Result<ActionResponse, String> {
    let response = client.get(url).send().await.map_err(|err| err.to_string())?;
    response
        .json::<ActionResponse>()
        .await
        .map_err(|err| err.to_string())
}
