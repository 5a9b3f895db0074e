use std::sync::OnceLock;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;
use tui_banner::Banner;

use agentnet_core::types::AgentKind;

use crate::app::{App, PushStatus};

/// Cached banner, rendered once.
struct BannerCache {
    lines: Vec<String>,
    width: u16,
    height: u16,
}

fn cached_banner() -> &'static BannerCache {
    static CACHE: OnceLock<BannerCache> = OnceLock::new();
    CACHE.get_or_init(|| {
        let text = Banner::new("AGENTNET")
            .map(|b| b.style(tui_banner::Style::NeonCyber).render())
            .unwrap_or_else(|_| String::from("AGENTNET"));
        let lines: Vec<String> = text.lines().map(|l| l.to_string()).collect();
        let width = lines
            .iter()
            .map(|l| l.chars().count() as u16)
            .max()
            .unwrap_or(8);
        let height = lines.len() as u16;
        BannerCache {
            lines,
            width,
            height,
        }
    })
}

/// Draw the TUI layout.
pub fn draw(f: &mut Frame, app: &App) {
    let area = f.area();
    let banner = cached_banner();

    // Full art when it fits with room to spare, a title line otherwise,
    // nothing on very small terminals.
    let min_body_rows: u16 = 10;
    let banner_height = if area.height < min_body_rows + 3 {
        0
    } else if area.width >= banner.width + 2 && area.height >= banner.height + 1 + min_body_rows * 2 {
        banner.height + 1
    } else {
        2
    };

    let mut constraints = Vec::with_capacity(4);
    if banner_height > 0 {
        constraints.push(Constraint::Length(banner_height));
    }
    constraints.extend([
        Constraint::Min(1),
        Constraint::Length(1),
        Constraint::Length(3),
    ]);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);
    let (body, status, input) = if banner_height > 0 {
        draw_banner(f, chunks[0], banner_height);
        (chunks[1], chunks[2], chunks[3])
    } else {
        (chunks[0], chunks[1], chunks[2])
    };

    let panels = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(body);

    draw_graph(f, app, panels[0]);
    draw_transcript(f, app, panels[1]);
    draw_status_bar(f, app, status);
    draw_input(f, app, input);
}

fn draw_banner(f: &mut Frame, area: Rect, banner_height: u16) {
    let banner = cached_banner();

    let lines: Vec<Line> = if banner_height > 2 && area.width >= banner.width {
        banner
            .lines
            .iter()
            .map(|l| Line::from(Span::styled(l.clone(), Style::default().fg(Color::Cyan))))
            .collect()
    } else {
        vec![Line::from(vec![
            Span::styled(
                " AGENTNET",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                "  AI Agent Network Builder",
                Style::default().fg(Color::DarkGray),
            ),
        ])]
    };

    let widget = Paragraph::new(lines).block(Block::default().borders(Borders::BOTTOM));
    f.render_widget(widget, area);
}

fn kind_color(kind: AgentKind) -> Color {
    match kind {
        AgentKind::Input => Color::Green,
        AgentKind::LlmAgent => Color::Magenta,
        AgentKind::Output => Color::Yellow,
        AgentKind::Agent => Color::White,
    }
}

fn draw_graph(f: &mut Frame, app: &App, area: Rect) {
    let graph = app.session.graph();
    let mut lines: Vec<Line> = Vec::new();

    for node in graph.nodes() {
        let marker = if node.selected { "▶ " } else { "  " };
        let mut style = Style::default().fg(kind_color(node.kind));
        if node.selected {
            style = style.add_modifier(Modifier::BOLD);
        }
        lines.push(Line::from(vec![
            Span::raw(marker),
            Span::styled(node.label.clone(), style),
            Span::styled(
                format!(
                    "  [{}] {} @ ({:.0},{:.0})",
                    node.id, node.kind, node.position.x, node.position.y
                ),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
        if let Some(role) = &node.role {
            lines.push(Line::from(Span::styled(
                format!("    {}", role),
                Style::default().fg(Color::Gray),
            )));
        }
    }

    if !graph.edges().is_empty() {
        lines.push(Line::from(""));
    }
    for edge in graph.edges() {
        lines.push(Line::from(vec![
            Span::styled(format!("  {} ", edge.id), Style::default().fg(Color::DarkGray)),
            Span::raw(format!(
                "{} → {}",
                graph.label_of(&edge.source),
                graph.label_of(&edge.target)
            )),
        ]));
    }

    let title = format!(" Graph ({} nodes, {} edges) ", graph.nodes().len(), graph.edges().len());
    let widget = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: false });
    f.render_widget(widget, area);
}

fn draw_transcript(f: &mut Frame, app: &App, area: Rect) {
    let lines: Vec<Line> = app
        .session
        .log()
        .entries()
        .iter()
        .map(|entry| {
            let system = entry.from == "System";
            let text_style = if system {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default().fg(Color::White)
            };
            Line::from(vec![
                Span::styled(
                    format!("[{}] ", entry.time_label()),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(
                    format!("{} → {}: ", entry.from, entry.to),
                    Style::default().fg(Color::Cyan),
                ),
                Span::styled(entry.message.clone(), text_style),
            ])
        })
        .collect();

    // Stick to the bottom unless the user scrolled up.
    let visible_height = area.height.saturating_sub(2) as usize;
    let scroll = lines
        .len()
        .saturating_sub(visible_height)
        .saturating_sub(app.scroll_offset);

    let widget = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" Messages "))
        .scroll((scroll as u16, 0));
    f.render_widget(widget, area);
}

fn draw_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let run = app.session.run_session();
    let status_text = if let Some(notice) = &app.notice {
        format!(" {}", notice)
    } else if run.in_flight {
        let spinner = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
        let idx = (app.tick_count / 2) % spinner.len();
        let entry = run
            .entry
            .as_deref()
            .map(|id| app.session.graph().label_of(id))
            .unwrap_or("?");
        format!(" {} Running flow from {}...", spinner[idx], entry)
    } else if app.session.form().is_pending() {
        " Creating agent...".to_string()
    } else {
        let push = match app.push {
            PushStatus::Connecting => "connecting",
            PushStatus::Connected => "live",
            PushStatus::Offline => "offline",
        };
        format!(" Push: {} | /agent /connect /run | /quit to exit", push)
    };

    let status =
        Paragraph::new(status_text).style(Style::default().bg(Color::DarkGray).fg(Color::White));
    f.render_widget(status, area);
}

fn draw_input(f: &mut Frame, app: &App, area: Rect) {
    let title = match app.session.graph().selected() {
        Some(node) => format!(" Input (as {}) ", node.label),
        None => " Input ".to_string(),
    };
    let input = Paragraph::new(app.input.buffer.as_str())
        .block(Block::default().borders(Borders::ALL).title(title))
        .style(Style::default().fg(Color::White));
    f.render_widget(input, area);

    let cursor_x = area.x + 1 + app.input.cursor as u16;
    let cursor_y = area.y + 1;
    f.set_cursor_position((cursor_x.min(area.x + area.width.saturating_sub(2)), cursor_y));
}
