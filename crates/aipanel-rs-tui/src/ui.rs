//! Rendering routines for the panel TUI.

use crate::app::{App, InputTarget};
use aipanel_rs_core::SampleBuffers;
use aipanel_rs_protocol::ResourceKind;
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Axis, Block, BorderType, Borders, Chart, Dataset, GraphType, LegendPosition, Paragraph,
    Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap,
};

const PRIMARY: Color = Color::Rgb(236, 91, 43); // #EC5B2B
const SECONDARY: Color = Color::Rgb(238, 121, 72); // #EE7948
const TEXT: Color = Color::Rgb(238, 238, 238); // #eeeeee
const TEXT_MUTED: Color = Color::Rgb(128, 128, 128); // #808080
const BORDER: Color = Color::Rgb(60, 60, 60); // #3c3c3c
const BORDER_ACTIVE: Color = Color::Rgb(238, 121, 72); // #EE7948
const YELLOW: Color = Color::Rgb(229, 192, 123); // #e5c07b
const GREEN: Color = Color::Rgb(120, 220, 140);
const RED: Color = Color::Rgb(255, 110, 110);

const HEADER_HEIGHT: u16 = 5; // 3 inner lines + 2 border lines
const CHART_HEIGHT: u16 = 12;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Draw the entire TUI frame.
pub fn draw(frame: &mut Frame<'_>, app: &mut App, samples: &SampleBuffers) {
    let area = frame.area();
    let chart_height = if app.session.graph_visible {
        CHART_HEIGHT
    } else {
        0
    };

    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT), // header bar
            Constraint::Min(0),                // transcript
            Constraint::Length(chart_height),  // usage chart
            Constraint::Length(3),             // input
            Constraint::Length(1),             // status bar
        ])
        .split(area);

    draw_header(frame, app, samples, root[0]);
    draw_transcript(frame, app, root[1]);
    if app.session.graph_visible {
        draw_chart(frame, samples, root[2]);
    }
    draw_input(frame, app, root[3]);
    draw_status_bar(frame, app, root[4]);
}

/// Header: title, selectors and toggles on the left, CPU gauge on the right.
fn draw_header(frame: &mut Frame<'_>, app: &App, samples: &SampleBuffers, area: Rect) {
    let cpu_widget_width: u16 = 22;
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(cpu_widget_width)])
        .split(area);

    let left_block = Block::default()
        .borders(Borders::TOP | Borders::LEFT | Borders::BOTTOM)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER));
    let inner = left_block.inner(cols[0]);
    frame.render_widget(left_block, cols[0]);

    let label_style = Style::default().fg(TEXT_MUTED);
    let value_style = Style::default().fg(TEXT);

    let attachment = match app.session.attachment().get() {
        Some(attachment) => format!("{} ({} chars)", attachment.name, attachment.char_count()),
        None => "none".to_string(),
    };
    let (tube_label, tube_bg) = if app.session.unrestricted {
        (" ModelTube ON ", PRIMARY)
    } else {
        (" ModelTube OFF ", BORDER)
    };

    let lines = vec![
        Line::from(vec![
            Span::styled(
                format!(" {}", app.title),
                Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("  v{VERSION}"), label_style),
        ]),
        Line::from(vec![
            Span::styled(" backend ", label_style),
            Span::styled(app.session.backend.label(), value_style),
            Span::styled("  mode ", label_style),
            Span::styled(app.session.mode().label(), value_style),
        ]),
        Line::from(vec![
            Span::styled(" file ", label_style),
            Span::styled(attachment, value_style),
            Span::raw("  "),
            Span::styled(
                tube_label,
                Style::default()
                    .fg(Color::Rgb(10, 10, 10))
                    .bg(tube_bg)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
    ];
    frame.render_widget(Paragraph::new(lines), inner);

    let cpu = samples
        .buffer(ResourceKind::Cpu)
        .latest()
        .map(|sample| sample.value)
        .unwrap_or(0.0);
    draw_cpu_widget(frame, cpu, cols[1]);
}

/// Compact CPU gauge fed by the latest sample.
fn draw_cpu_widget(frame: &mut Frame<'_>, cpu: f64, area: Rect) {
    let cpu_color = if cpu < 50.0 {
        GREEN
    } else if cpu < 80.0 {
        YELLOW
    } else {
        RED
    };

    let block = Block::default()
        .borders(Borders::TOP | Borders::RIGHT | Borders::BOTTOM)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER))
        .title(Span::styled(" CPU ", Style::default().fg(TEXT_MUTED)));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let bar_width = inner.width.saturating_sub(2);
    let filled = ((cpu / 100.0) * f64::from(bar_width)).round() as u16;
    let empty = bar_width.saturating_sub(filled);

    let lines = vec![
        Line::from(Span::styled(
            format!(" {cpu:5.1}%"),
            Style::default().fg(cpu_color).add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::raw(" "),
            Span::styled("█".repeat(filled as usize), Style::default().fg(cpu_color)),
            Span::styled("░".repeat(empty as usize), Style::default().fg(BORDER)),
        ]),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
}

/// Draw the transcript with border and scrollbar.
fn draw_transcript(frame: &mut Frame<'_>, app: &mut App, area: Rect) {
    let lines = app.render_lines();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER))
        .title(Span::styled(" Transcript ", Style::default().fg(TEXT_MUTED)));

    let inner = block.inner(area);
    let content_width = inner.width.saturating_sub(1); // -1 for scrollbar
    let content_height = inner.height as usize;

    let total_lines = Paragraph::new(lines.clone())
        .wrap(Wrap { trim: false })
        .line_count(content_width)
        .max(1);

    let max_scroll = total_lines.saturating_sub(content_height) as u16;
    app.update_scroll_bounds(max_scroll);
    let scroll = app.scroll;

    let text_area = Rect {
        width: content_width,
        ..inner
    };
    let transcript = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));

    frame.render_widget(block, area);
    frame.render_widget(transcript, text_area);

    if total_lines > content_height {
        let mut scrollbar_state = ScrollbarState::default()
            .content_length(total_lines)
            .position(scroll as usize)
            .viewport_content_length(content_height);
        let scrollbar_area = Rect {
            x: inner.x + inner.width.saturating_sub(1),
            y: inner.y,
            width: 1,
            height: inner.height,
        };
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .style(Style::default().fg(BORDER))
                .thumb_style(Style::default().fg(TEXT_MUTED)),
            scrollbar_area,
            &mut scrollbar_state,
        );
    }
}

fn series_color(kind: ResourceKind) -> Color {
    match kind {
        ResourceKind::Cpu => Color::Cyan,
        ResourceKind::Memory => Color::Magenta,
        ResourceKind::Gpu => Color::Yellow,
    }
}

fn series_name(kind: ResourceKind, samples: &SampleBuffers) -> String {
    let simulated = samples
        .buffer(kind)
        .latest()
        .is_some_and(|sample| sample.simulated);
    if simulated {
        format!("{} (simulated)", kind.label())
    } else {
        kind.label().to_string()
    }
}

/// Usage chart: one line per resource, percent on y, sample slot on x.
fn draw_chart(frame: &mut Frame<'_>, samples: &SampleBuffers, area: Rect) {
    let series: Vec<(ResourceKind, Vec<(f64, f64)>)> = ResourceKind::ALL
        .iter()
        .map(|kind| (*kind, samples.series(*kind)))
        .collect();

    let datasets: Vec<Dataset<'_>> = series
        .iter()
        .map(|(kind, points)| {
            Dataset::default()
                .name(series_name(*kind, samples))
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(series_color(*kind)))
                .data(points)
        })
        .collect();

    let span = samples.capacity() as f64;
    let axis_style = Style::default().fg(TEXT_MUTED);
    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(BORDER))
                .title(Span::styled(" Usage % ", Style::default().fg(TEXT_MUTED))),
        )
        .x_axis(
            Axis::default()
                .style(axis_style)
                .bounds([0.0, span])
                .labels(["0".to_string(), format!("{}", samples.capacity())]),
        )
        .y_axis(
            Axis::default()
                .style(axis_style)
                .bounds([0.0, 100.0])
                .labels(["0", "50", "100"]),
        )
        .legend_position(Some(LegendPosition::TopLeft))
        .hidden_legend_constraints((Constraint::Ratio(1, 2), Constraint::Ratio(3, 4)));

    frame.render_widget(chart, area);
}

fn draw_input(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let attaching = app.target == InputTarget::AttachPath;
    let title = if attaching {
        " Attach file (Enter load, Esc cancel) "
    } else {
        " Prompt "
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(if attaching { PRIMARY } else { BORDER_ACTIVE }))
        .title(Span::styled(title, Style::default().fg(SECONDARY)));
    let inner = block.inner(area);

    let prompt_style = Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD);
    let placeholder = if attaching {
        "Path to a text file..."
    } else if app.session.mode().requires_attachment() {
        "Optional note; the attached file is processed..."
    } else {
        "Type a prompt or /help..."
    };
    let input_text = if app.input.is_empty() {
        Line::from(vec![
            Span::styled(" ", prompt_style),
            Span::styled(placeholder, Style::default().fg(TEXT_MUTED)),
        ])
    } else {
        Line::from(vec![
            Span::styled(" ", prompt_style),
            Span::styled(app.input.as_str(), Style::default().fg(TEXT)),
        ])
    };

    frame.render_widget(block, area);
    frame.render_widget(Paragraph::new(input_text), inner);

    let cursor = u16::try_from(app.input.chars().count()).unwrap_or(u16::MAX);
    frame.set_cursor_position((inner.x.saturating_add(1).saturating_add(cursor), inner.y));
}

fn draw_status_bar(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let status_color = match app.status() {
        "running" => PRIMARY,
        _ => TEXT_MUTED,
    };

    let key_style = Style::default().fg(TEXT_MUTED);
    let hint_style = Style::default().fg(BORDER);
    let shortcuts = vec![
        Span::styled(" Enter", key_style),
        Span::styled(" send", hint_style),
        Span::styled("  Tab", key_style),
        Span::styled(" mode", hint_style),
        Span::styled("  Ctrl+B", key_style),
        Span::styled(" backend", hint_style),
        Span::styled("  Ctrl+O", key_style),
        Span::styled(" attach", hint_style),
        Span::styled("  PgUp/PgDn", key_style),
        Span::styled(" scroll", hint_style),
        Span::styled("  Esc", key_style),
        Span::styled(" quit", hint_style),
    ];

    let right_text = format!(" {} pending · {} ", app.pending, app.status());
    let right_len = right_text.chars().count() as u16;
    let left_area = Rect {
        width: area.width.saturating_sub(right_len),
        ..area
    };
    let right_area = Rect {
        x: area.x + area.width.saturating_sub(right_len),
        width: right_len.min(area.width),
        ..area
    };

    frame.render_widget(Paragraph::new(Line::from(shortcuts)), left_area);
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            right_text,
            Style::default().fg(status_color),
        ))),
        right_area,
    );
}
