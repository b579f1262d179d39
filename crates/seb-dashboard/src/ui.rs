use crate::app::{App, Page};
use crate::theme::{self, Theme};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    symbols,
    text::{Line, Span, Text},
    widgets::{Axis, Block, Borders, Chart, Clear, Dataset, GraphType, Paragraph, Wrap},
    Frame,
};
use seb_core::{
    metrics::{ChartSnapshot, PERCENT_MAX, PERCENT_MIN},
    platforms::EMPTY_PLATFORMS_LABEL,
    status::{POSTED_TASK_PLACEHOLDER, UPTIME_PLACEHOLDER, USAGE_PLACEHOLDER},
    tasks::EMPTY_TASKS_LABEL,
    Channel, PlatformRenderPlan, TaskListing,
};
use std::time::Instant;

const TASK_CARD_LINES: usize = 8;

pub fn render(frame: &mut Frame, app: &App, now: Instant) {
    let size = frame.size();
    let theme = theme::dashboard_theme();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(size);

    frame.render_widget(render_header(app, theme), layout[0]);
    match app.page {
        Page::Dashboard => render_dashboard(frame, app, theme, layout[1]),
        Page::Tasks => frame.render_widget(render_tasks(app, theme), layout[1]),
    }
    frame.render_widget(render_footer(app, theme, now), layout[2]);

    if app.help_open {
        render_help_overlay(frame, theme);
    }
}

fn panel(title: &'static str, theme: Theme) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border))
        .style(Style::default().bg(theme.surface))
        .title(Span::styled(title, theme::title_style(theme)))
}

fn render_header(app: &App, theme: Theme) -> Paragraph<'static> {
    let status_line = match app.state.status.as_ref() {
        Some(snapshot) => Line::from(vec![
            Span::styled("Bot: ", Style::default().fg(theme.muted)),
            Span::styled(
                snapshot.status.label(),
                Style::default()
                    .fg(theme::status_color(&snapshot.status, theme))
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("   Page: {}   Server: {}", app.page.title(), app.config.base_url),
                Style::default().fg(theme.text),
            ),
        ]),
        None => Line::from(vec![
            Span::styled("Bot: ", Style::default().fg(theme.muted)),
            Span::styled("WAITING", Style::default().fg(theme.muted)),
            Span::styled(
                format!("   Page: {}   Server: {}", app.page.title(), app.config.base_url),
                Style::default().fg(theme.text),
            ),
        ]),
    };

    let mut channel_spans = vec![Span::styled("Streams: ", Style::default().fg(theme.muted))];
    for channel in Channel::ALL {
        let state = app.channel_state(channel);
        channel_spans.push(Span::styled(
            format!("{}:{} ", channel.as_str(), state.label()),
            Style::default().fg(theme::channel_color(state, theme)),
        ));
    }
    if app.pending_actions > 0 {
        channel_spans.push(Span::styled(
            format!(" requests in flight: {}", app.pending_actions),
            Style::default().fg(theme.warn),
        ));
    }

    Paragraph::new(Text::from(vec![status_line, Line::from(channel_spans)]))
        .style(Style::default().fg(theme.text).bg(theme.bg))
        .block(panel("SocialEarningBot", theme).style(Style::default().bg(theme.bg)))
}

fn render_dashboard(frame: &mut Frame, app: &App, theme: Theme, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(8), Constraint::Length(9)])
        .split(area);
    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(rows[1]);

    let snapshot = app.state.chart.snapshot();
    render_chart(frame, &snapshot, theme, rows[0]);
    frame.render_widget(render_metrics(app, theme), bottom[0]);
    frame.render_widget(render_platforms(&app.state.platforms, theme), bottom[1]);
}

fn render_chart(frame: &mut Frame, snapshot: &ChartSnapshot, theme: Theme, area: Rect) {
    let cpu = snapshot.cpu_points();
    let ram = snapshot.ram_points();
    let datasets = vec![
        Dataset::default()
            .name("CPU %")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(theme.cpu))
            .data(&cpu),
        Dataset::default()
            .name("RAM %")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(theme.ram))
            .data(&ram),
    ];
    let x_max = snapshot.len().saturating_sub(1).max(1) as f64;
    let chart = Chart::new(datasets)
        .block(panel("CPU / RAM", theme))
        .x_axis(
            Axis::default()
                .style(Style::default().fg(theme.muted))
                .bounds([0.0, x_max])
                .labels(
                    x_axis_labels(&snapshot.labels)
                        .into_iter()
                        .map(Span::from)
                        .collect(),
                ),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(theme.muted))
                .bounds([PERCENT_MIN, PERCENT_MAX])
                .labels(vec![Span::from("0%"), Span::from("50%"), Span::from("100%")]),
        );
    frame.render_widget(chart, area);
}

/// First, middle and last time labels; the axis is categorical so only a
/// few ticks fit.
pub fn x_axis_labels(labels: &[String]) -> Vec<String> {
    match labels.len() {
        0 => Vec::new(),
        1 | 2 => labels.to_vec(),
        len => vec![
            labels[0].clone(),
            labels[len / 2].clone(),
            labels[len - 1].clone(),
        ],
    }
}

fn render_metrics(app: &App, theme: Theme) -> Paragraph<'static> {
    let snapshot = app.state.status.as_ref();
    let tasks = snapshot
        .map(|s| s.tasks_completed.to_string())
        .unwrap_or_else(|| "0".to_string());
    let uptime = snapshot
        .map(|s| s.uptime.clone())
        .unwrap_or_else(|| UPTIME_PLACEHOLDER.to_string());
    let cpu = snapshot
        .map(|s| s.cpu_usage.clone())
        .unwrap_or_else(|| USAGE_PLACEHOLDER.to_string());
    let ram = snapshot
        .map(|s| s.ram_usage.clone())
        .unwrap_or_else(|| USAGE_PLACEHOLDER.to_string());
    let status = snapshot
        .map(|s| s.status.label())
        .unwrap_or_else(|| USAGE_PLACEHOLDER.to_string());
    let posted = snapshot
        .map(|s| s.posted_task_label().to_string())
        .unwrap_or_else(|| POSTED_TASK_PLACEHOLDER.to_string());

    let row = |label: &'static str, value: String| {
        Line::from(vec![
            Span::styled(format!("{label:<16}"), Style::default().fg(theme.muted)),
            Span::styled(value, Style::default().fg(theme.text)),
        ])
    };
    Paragraph::new(Text::from(vec![
        row("Tasks completed", tasks),
        row("Uptime", uptime),
        row("CPU", cpu),
        row("RAM", ram),
        row("Status", status),
        row("Posted tasks", posted),
    ]))
    .block(panel("Metrics", theme))
}

pub fn platform_spans(plan: &PlatformRenderPlan, theme: Theme) -> Vec<Span<'static>> {
    match plan {
        PlatformRenderPlan::Empty => vec![Span::styled(
            EMPTY_PLATFORMS_LABEL,
            Style::default()
                .fg(theme.empty_marker)
                .add_modifier(Modifier::BOLD),
        )],
        PlatformRenderPlan::Badges(badges) => {
            let mut spans = Vec::with_capacity(badges.len() * 2);
            for badge in badges {
                if !spans.is_empty() {
                    spans.push(Span::raw(" "));
                }
                spans.push(Span::styled(
                    format!(" {badge} "),
                    Style::default()
                        .fg(theme.badge_fg)
                        .bg(theme.badge_bg)
                        .add_modifier(Modifier::BOLD),
                ));
            }
            spans
        }
    }
}

fn render_platforms(plan: &PlatformRenderPlan, theme: Theme) -> Paragraph<'static> {
    Paragraph::new(Line::from(platform_spans(plan, theme)))
        .wrap(Wrap { trim: true })
        .block(panel("Active platforms", theme))
}

pub fn task_line_count(listing: &TaskListing) -> usize {
    if listing.is_empty() {
        1
    } else {
        listing.len() * TASK_CARD_LINES
    }
}

pub fn task_lines(listing: &TaskListing, theme: Theme) -> Vec<Line<'static>> {
    if listing.is_empty() {
        return vec![Line::from(Span::styled(
            EMPTY_TASKS_LABEL,
            Style::default().fg(theme.muted),
        ))];
    }
    let field = |label: &'static str, value: &str| {
        Line::from(vec![
            Span::styled(format!("  {label:<12}"), Style::default().fg(theme.muted)),
            Span::styled(value.to_string(), Style::default().fg(theme.text)),
        ])
    };
    let mut lines = Vec::with_capacity(task_line_count(listing));
    for task in listing.render_order() {
        lines.push(Line::from(Span::styled(
            format!("Task ID: {}", task.id),
            theme::title_style(theme),
        )));
        lines.push(field("File:", &task.proof));
        lines.push(field("Type:", &task.kind));
        lines.push(field("Status:", &task.status));
        lines.push(field("User-ID:", &task.user));
        lines.push(field("Submitting:", &task.submitting));
        lines.push(Line::from(Span::styled(
            format!("  {}", task.message),
            Style::default().fg(theme.cpu),
        )));
        lines.push(Line::from(""));
    }
    lines
}

fn render_tasks(app: &App, theme: Theme) -> Paragraph<'static> {
    let title = if app.state.tasks_failing() {
        "Tasks (refresh failing)"
    } else {
        "Tasks"
    };
    Paragraph::new(Text::from(task_lines(&app.state.tasks, theme)))
        .style(Style::default().fg(theme.text).bg(theme.surface))
        .block(panel(title, theme))
        .scroll((app.task_scroll, 0))
}

fn render_footer(app: &App, theme: Theme, now: Instant) -> Paragraph<'static> {
    let footer = match app.state.notifier.current(now) {
        Some(message) => Paragraph::new(Line::from(Span::styled(
            format!(" {message} "),
            Style::default()
                .fg(theme.bg)
                .bg(theme.cpu)
                .add_modifier(Modifier::BOLD),
        ))),
        None => Paragraph::new(Line::from(Span::styled(
            " s start  x stop  R reset tasks  1/2 pages  r refresh  ? help  q quit",
            Style::default().fg(theme.muted),
        ))),
    };
    footer.style(Style::default().bg(theme.bg))
}

fn render_help_overlay(frame: &mut Frame, theme: Theme) {
    let area = centered_rect(64, 60, frame.size());
    let heading = |text: &'static str| {
        Line::from(Span::styled(
            text,
            Style::default()
                .fg(theme.cpu)
                .add_modifier(Modifier::BOLD),
        ))
    };
    let lines = vec![
        heading("Bot control"),
        Line::from("  s        start bot"),
        Line::from("  x        stop bot"),
        Line::from("  R        reset task queue"),
        Line::from(""),
        heading("Navigation"),
        Line::from("  1 / 2    dashboard / tasks"),
        Line::from("  Tab      cycle page"),
        Line::from("  j / k    scroll (tasks page)"),
        Line::from("  g        back to top (tasks page)"),
        Line::from("  r        refresh task list (tasks page)"),
        Line::from(""),
        heading("Exit"),
        Line::from("  ? or F1  toggle this help"),
        Line::from("  Esc      close help"),
        Line::from("  q        quit"),
    ];
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(Text::from(lines))
            .style(Style::default().fg(theme.text).bg(theme.surface))
            .block(panel("Help", theme))
            .wrap(Wrap { trim: false }),
        area,
    );
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100u16.saturating_sub(percent_y)) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100u16.saturating_sub(percent_y)) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100u16.saturating_sub(percent_x)) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100u16.saturating_sub(percent_x)) / 2),
        ])
        .split(vertical[1])[1]
}
