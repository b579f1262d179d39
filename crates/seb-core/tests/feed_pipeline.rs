use seb_core::{
    platforms::EMPTY_PLATFORMS_LABEL, Channel, DashboardState, SseFrameDecoder, CHART_WINDOW,
    TOAST_DURATION,
};
use std::time::{Duration, Instant};

fn chart_stream(samples: usize) -> Vec<u8> {
    let mut body = Vec::new();
    for idx in 0..samples {
        body.extend_from_slice(
            format!(
                "data: {{\"cpu_percent\": {}, \"ram_percent\": {}}}\n\n",
                idx % 100,
                (idx * 3) % 100
            )
            .as_bytes(),
        );
    }
    body
}

fn feed(state: &mut DashboardState, channel: Channel, body: &[u8], chunk: usize, now: Instant) {
    let mut decoder = SseFrameDecoder::default();
    for piece in body.chunks(chunk) {
        let report = decoder.push_chunk(piece);
        assert!(report.errors.is_empty());
        for event in report.events {
            let _ = state.apply_channel_message(channel, &event.data, now);
        }
    }
}

#[test]
fn chart_window_holds_latest_twelve_samples() {
    let mut state = DashboardState::new();
    let now = Instant::now();
    feed(&mut state, Channel::ChartMetrics, &chart_stream(20), 7, now);

    let snapshot = state.chart.snapshot();
    assert_eq!(snapshot.len(), CHART_WINDOW);
    assert_eq!(snapshot.cpu.len(), snapshot.ram.len());
    assert_eq!(snapshot.cpu.first(), Some(&8.0));
    assert_eq!(snapshot.cpu.last(), Some(&19.0));
    assert_eq!(state.notifier.issued(), 0);
}

#[test]
fn one_bad_event_does_not_break_the_stream() {
    let mut state = DashboardState::new();
    let now = Instant::now();
    let mut body = chart_stream(2);
    body.extend_from_slice(b"data: {\"cpu_percent\": \"high\"}\n\n");
    body.extend_from_slice(&chart_stream(1));
    feed(&mut state, Channel::ChartMetrics, &body, 5, now);

    assert_eq!(state.chart.len(), 3);
    assert_eq!(state.notifier.issued(), 1);
    assert!(state.notifier.visible(now + Duration::from_millis(2999)));
    assert!(!state.notifier.visible(now + TOAST_DURATION));
}

#[test]
fn channels_update_independent_slices() {
    let mut state = DashboardState::new();
    let now = Instant::now();
    feed(
        &mut state,
        Channel::ActivePlatform,
        b"data: {\"active_platform\": \"Instagram\"}\n\n",
        64,
        now,
    );
    feed(
        &mut state,
        Channel::ContextMetrics,
        b"data: {\"status\": \"active\", \"uptime\": \"00:00:09\"}\n\n",
        3,
        now,
    );

    assert_eq!(state.platforms.badges(), ["Instagram".to_string()]);
    assert_eq!(
        state.status.as_ref().map(|s| s.uptime.as_str()),
        Some("00:00:09")
    );
    assert!(state.chart.is_empty());

    feed(
        &mut state,
        Channel::ActivePlatform,
        b"data: {}\n\n",
        64,
        now,
    );
    assert!(state.platforms.is_empty());
    assert_eq!(EMPTY_PLATFORMS_LABEL, "None");
}
