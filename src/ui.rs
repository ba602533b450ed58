use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, List, ListItem, Paragraph},
    Frame,
};

use crate::app::{format_time, App, InputMode};
use crate::conversation::Conversation;
use crate::delivery::{status_mark, MarkShape, MarkTone};
use crate::filter::ChannelFilter;
use crate::input::COMMANDS;
use crate::message::{Channel, DeliveryStatus, Message};
use crate::resolver;
use crate::templates::Template;
use crate::typing::Clock;

// Layout constants
const SIDEBAR_AUTO_HIDE_WIDTH: u16 = 60;
const MIN_CHAT_WIDTH: u16 = 30;

/// Accent colour of a messaging channel.
pub fn channel_color(channel: Channel) -> Color {
    match channel {
        Channel::Telegram => Color::LightBlue,
        Channel::Whatsapp => Color::Green,
        Channel::Email => Color::Yellow,
        Channel::Instagram => Color::Magenta,
    }
}

/// Map a receipt status to its display symbol and color. Read receipts take
/// the accent colour of the channel the message went out on.
fn status_symbol(
    status: Option<DeliveryStatus>,
    channel: Option<Channel>,
    color: bool,
) -> (&'static str, Color) {
    let mark = status_mark(status);
    let sym = match mark.shape {
        MarkShape::Single => "\u{2713}",         // ✓
        MarkShape::Double => "\u{2713}\u{2713}", // ✓✓
    };
    if !color {
        return (sym, Color::DarkGray);
    }
    let fg = match mark.tone {
        MarkTone::Muted => Color::DarkGray,
        MarkTone::Solid => Color::Gray,
        MarkTone::Neutral => Color::White,
        MarkTone::Accent => channel.map_or(Color::Cyan, channel_color),
    };
    (sym, fg)
}

/// Hash a sender name to one of ~8 distinct colors.
fn sender_color(name: &str) -> Color {
    let hash: u32 = name.bytes().fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u32));
    const COLORS: [Color; 8] = [
        Color::Cyan,
        Color::Magenta,
        Color::Yellow,
        Color::Blue,
        Color::LightRed,
        Color::LightGreen,
        Color::LightCyan,
        Color::LightMagenta,
    ];
    COLORS[(hash as usize) % COLORS.len()]
}

/// Truncate a string to fit within `max_width` chars, appending `…` if truncated.
fn truncate(s: &str, max_width: usize) -> String {
    if s.chars().count() <= max_width {
        s.to_string()
    } else if max_width <= 1 {
        "…".to_string()
    } else {
        let mut truncated: String = s.chars().take(max_width - 1).collect();
        truncated.push('…');
        truncated
    }
}

/// Build a centered separator line: `───── label ─────`
fn build_separator(label: &str, width: usize, style: Style) -> Line<'static> {
    let pad_total = width.saturating_sub(label.chars().count());
    let pad_left = pad_total / 2;
    let pad_right = pad_total - pad_left;
    Line::from(Span::styled(
        format!("{}{}{}", "─".repeat(pad_left), label, "─".repeat(pad_right)),
        style,
    ))
}

/// Create a centered popup overlay: clears the area, returns the Rect and a styled Block.
fn centered_popup(
    frame: &mut Frame, area: Rect, pref_width: u16, pref_height: u16, title: &str,
) -> (Rect, Block<'static>) {
    let w = pref_width.min(area.width.saturating_sub(4));
    let h = pref_height.min(area.height.saturating_sub(2));
    let x = (area.width.saturating_sub(w)) / 2;
    let y = (area.height.saturating_sub(h)) / 2;
    let popup_area = Rect::new(x, y, w, h);
    frame.render_widget(Clear, popup_area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title.to_string())
        .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .style(Style::default().bg(Color::Black));
    (popup_area, block)
}

/// One sidebar entry, copied out of the inbox so drawing only needs `&App`.
struct SidebarRow {
    client_id: String,
    name: String,
    unread: usize,
    channel: Channel,
}

/// Everything derived from the inbox that a frame needs.
struct Snapshot {
    rows: Vec<SidebarRow>,
    active: Option<Conversation>,
    active_name: String,
    active_plan: Option<String>,
    suggestion: Option<&'static Template>,
    typing: bool,
    total_chats: usize,
    total_unread: usize,
}

fn snapshot<C: Clock>(app: &mut App<C>) -> Snapshot {
    let total_chats = app.inbox.conversations().len();
    let total_unread = app.inbox.total_unread();
    let visible: Vec<(String, usize, Channel)> = app
        .inbox
        .visible_conversations()
        .iter()
        .map(|c| (c.client_id.clone(), c.unread_count, c.active_channel))
        .collect();
    let rows = visible
        .into_iter()
        .map(|(client_id, unread, channel)| SidebarRow {
            name: app.inbox.display_name(&client_id).to_string(),
            client_id,
            unread,
            channel,
        })
        .collect();

    let active = app.inbox.active_conversation().cloned();
    let active_name = active
        .as_ref()
        .map(|c| app.inbox.display_name(&c.client_id).to_string())
        .unwrap_or_default();
    let active_plan = active
        .as_ref()
        .and_then(|c| app.inbox.directory().get(&c.client_id))
        .and_then(|p| p.plan.clone());
    let typing = active.as_ref().is_some_and(|c| app.inbox.is_typing(&c.client_id));
    let suggestion = app.inbox.suggestion();

    Snapshot {
        rows,
        active,
        active_name,
        active_plan,
        suggestion,
        typing,
        total_chats,
        total_unread,
    }
}

pub fn draw<C: Clock>(frame: &mut Frame, app: &mut App<C>) {
    let snap = snapshot(app);
    let app: &App<C> = app;
    let size = frame.area();

    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // body
            Constraint::Length(1), // status bar
        ])
        .split(size);

    let sidebar_auto_hidden = size.width < SIDEBAR_AUTO_HIDE_WIDTH;
    let show_sidebar = app.sidebar_visible && !sidebar_auto_hidden;

    let input_area = if show_sidebar {
        let horizontal = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(app.sidebar_width),
                Constraint::Min(MIN_CHAT_WIDTH),
            ])
            .split(outer[0]);

        draw_sidebar(frame, app, &snap, horizontal[0]);
        draw_chat_area(frame, app, &snap, horizontal[1])
    } else {
        draw_chat_area(frame, app, &snap, outer[0])
    };

    draw_status_bar(frame, app, &snap, outer[1], sidebar_auto_hidden);

    if app.autocomplete_visible && !app.autocomplete_candidates.is_empty() {
        draw_autocomplete(frame, app, input_area);
    }

    if app.show_help {
        draw_help(frame, size);
    }
}

fn draw_sidebar<C: Clock>(frame: &mut Frame, app: &App<C>, snap: &Snapshot, area: Rect) {
    // "▸ • " prefix, channel tag and unread count
    let max_name_width = (area.width as usize).saturating_sub(10);
    let active_id = app.inbox.active_client();

    let items: Vec<ListItem> = snap
        .rows
        .iter()
        .map(|row| {
            let is_active = active_id == Some(row.client_id.as_str());
            let has_unread = row.unread > 0;

            let mut spans = Vec::new();
            if is_active {
                spans.push(Span::styled(
                    "▸ ",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                ));
            } else {
                spans.push(Span::raw("  "));
            }

            if has_unread && !is_active {
                spans.push(Span::styled("• ", Style::default().fg(Color::Yellow)));
            } else {
                spans.push(Span::raw("  "));
            }

            let name_style = if is_active {
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
            } else if has_unread {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::Gray)
            };
            spans.push(Span::styled(truncate(&row.name, max_name_width), name_style));

            if has_unread {
                spans.push(Span::styled(
                    format!(" ({})", row.unread),
                    Style::default().fg(Color::Yellow),
                ));
            }
            spans.push(Span::styled(
                format!(" {}", channel_tag(row.channel)),
                Style::default().fg(channel_color(row.channel)),
            ));

            ListItem::new(Line::from(spans))
        })
        .collect();

    let title = if app.inbox.search().is_empty() {
        " Clients ".to_string()
    } else {
        format!(" Clients /{} ", app.inbox.search())
    };

    let sidebar = List::new(items).block(
        Block::default()
            .borders(Borders::RIGHT)
            .border_type(BorderType::Rounded)
            .title(title)
            .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
    );

    frame.render_widget(sidebar, area);
}

/// Two-letter channel marker for narrow columns.
fn channel_tag(channel: Channel) -> &'static str {
    match channel {
        Channel::Telegram => "tg",
        Channel::Whatsapp => "wa",
        Channel::Email => "em",
        Channel::Instagram => "ig",
    }
}

fn draw_chat_area<C: Clock>(frame: &mut Frame, app: &App<C>, snap: &Snapshot, area: Rect) -> Rect {
    let suggestion_height = if snap.suggestion.is_some() { 1 } else { 0 };
    let chat_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),                    // messages (typing line rendered inside)
            Constraint::Length(suggestion_height), // quick-reply hint
            Constraint::Length(3),                 // input
        ])
        .split(area);

    draw_messages(frame, app, snap, chat_layout[0]);
    if let Some(template) = snap.suggestion {
        draw_suggestion(frame, template, chat_layout[1]);
    }
    draw_input(frame, app, chat_layout[2]);
    chat_layout[2]
}

fn draw_messages<C: Clock>(frame: &mut Frame, app: &App<C>, snap: &Snapshot, area: Rect) {
    let Some(conv) = &snap.active else {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .title(" coach-inbox ")
            .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
        let inner = block.inner(area);
        frame.render_widget(block, area);
        draw_welcome(frame, snap, inner);
        return;
    };

    let mut title = vec![
        Span::styled(
            format!(" {} ", snap.active_name),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("via {} ", conv.active_channel),
            Style::default().fg(channel_color(conv.active_channel)),
        ),
    ];
    if let Some(plan) = &snap.active_plan {
        title.push(Span::styled(format!("· {plan} "), Style::default().fg(Color::DarkGray)));
    }
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(Line::from(title));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let inner_width = inner.width as usize;
    let mut lines: Vec<Line> = Vec::new();
    let mut prev_date: Option<String> = None;
    // Oldest first by timestamp, whatever order they were stored in
    let ordered: Vec<&Message> =
        resolver::newest_first(&conv.messages).into_iter().rev().collect();
    let first_unread = ordered.iter().position(|m| m.is_unread_from_client());

    for (i, msg) in ordered.into_iter().enumerate() {
        let local = msg.timestamp().with_timezone(&chrono::Local);
        let date_str = local.format("%b %d, %Y").to_string();
        if prev_date.as_ref() != Some(&date_str) {
            if prev_date.is_some() {
                let label = format!(" {date_str} ");
                lines.push(build_separator(&label, inner_width, Style::default().fg(Color::DarkGray)));
            }
            prev_date = Some(date_str);
        }

        if first_unread == Some(i) && i > 0 {
            lines.push(build_separator(
                " new messages ",
                inner_width,
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ));
        }

        let mut spans = Vec::new();
        if msg.is_from_coach() && app.show_receipts {
            let (sym, color) = status_symbol(msg.delivery_status(), msg.channel(), app.color_receipts);
            spans.push(Span::styled(format!("{sym:<2} "), Style::default().fg(color)));
        }

        spans.push(Span::styled(
            format!("[{}] ", format_time(msg.timestamp())),
            Style::default().fg(Color::DarkGray),
        ));

        let (sender, sender_fg) = if msg.is_from_coach() {
            (app.coach_name.as_str(), Color::Green)
        } else {
            (snap.active_name.as_str(), sender_color(&snap.active_name))
        };
        spans.push(Span::styled(
            format!("<{sender}>"),
            Style::default().fg(sender_fg).add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw(format!(" {}", msg.text())));

        if let Some(channel) = msg.channel() {
            if channel != conv.active_channel {
                spans.push(Span::styled(
                    format!(" [{channel}]"),
                    Style::default().fg(channel_color(channel)),
                ));
            }
        }

        lines.push(Line::from(spans));
    }

    if snap.typing {
        lines.push(Line::from(Span::styled(
            format!("  {} is typing…", snap.active_name),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    // Keep the newest lines on screen
    let height = inner.height as usize;
    let skip = lines.len().saturating_sub(height);
    let visible: Vec<Line> = lines.into_iter().skip(skip).collect();
    frame.render_widget(Paragraph::new(visible), inner);
}

fn draw_welcome(frame: &mut Frame, snap: &Snapshot, area: Rect) {
    let dim = Style::default().fg(Color::DarkGray);
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "  Welcome back, coach",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    if snap.total_unread > 0 {
        lines.push(Line::from(Span::styled(
            format!("  {} unread across {} clients", snap.total_unread, snap.total_chats),
            Style::default().fg(Color::Yellow),
        )));
    } else {
        lines.push(Line::from(Span::styled("  Inbox zero. Nice work.", dim)));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("  Tab to open the next conversation", dim)));
    lines.push(Line::from(Span::styled("  /join <name> to open a client", dim)));
    lines.push(Line::from(Span::styled("  /help for all commands", dim)));
    frame.render_widget(Paragraph::new(lines), area);
}

fn draw_suggestion(frame: &mut Frame, template: &Template, area: Rect) {
    let line = Line::from(vec![
        Span::styled(" Suggested: ", Style::default().fg(Color::DarkGray)),
        Span::styled(template.title, Style::default().fg(Color::Cyan)),
        Span::styled("  (Ctrl+T or /template)", Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_input<C: Clock>(frame: &mut Frame, app: &App<C>, area: Rect) {
    let border_color = match app.mode {
        InputMode::Insert => Color::Cyan,
        InputMode::Normal => Color::Yellow,
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(border_color));

    let inner_width = area.width.saturating_sub(2) as usize;
    let prefix = "> ";
    let prefix_len = prefix.len();
    let text_width = inner_width.saturating_sub(prefix_len);
    let scroll_offset = app.input_cursor.saturating_sub(text_width);

    if app.input_buffer.is_empty() {
        let placeholder = match app.mode {
            InputMode::Normal => "  Press i to type, / for commands",
            InputMode::Insert => "  Type a reply...",
        };
        let input = Paragraph::new(Span::styled(placeholder, Style::default().fg(Color::DarkGray)))
            .block(block);
        frame.render_widget(input, area);
    } else {
        // Scroll the visible window so the cursor is always on screen
        let visible: String = app
            .input_buffer
            .chars()
            .skip(scroll_offset)
            .take(text_width)
            .collect();
        let input = Paragraph::new(format!("{prefix}{visible}"))
            .style(Style::default().fg(Color::White))
            .block(block);
        frame.render_widget(input, area);
    }

    if app.mode == InputMode::Insert {
        let cursor_x = area.x + 1 + prefix_len as u16 + (app.input_cursor - scroll_offset) as u16;
        frame.set_cursor_position((cursor_x, area.y + 1));
    }
}

fn draw_status_bar<C: Clock>(
    frame: &mut Frame,
    app: &App<C>,
    snap: &Snapshot,
    area: Rect,
    sidebar_auto_hidden: bool,
) {
    let sep = || Span::styled(" │ ", Style::default().fg(Color::DarkGray));
    let mut segments: Vec<Span> = Vec::new();

    match app.mode {
        InputMode::Normal => segments.push(Span::styled(
            " [NORMAL] ",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
        InputMode::Insert => segments.push(Span::styled(
            " [INSERT] ",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )),
    }
    segments.push(Span::styled("│ ", Style::default().fg(Color::DarkGray)));

    if let Some(ref err) = app.connection_error {
        segments.push(Span::styled(" ● ", Style::default().fg(Color::Red)));
        let display: String = err.chars().take(30).collect();
        segments.push(Span::styled(format!("error: {display}"), Style::default().fg(Color::Red)));
    } else if app.connected {
        segments.push(Span::styled(" ● ", Style::default().fg(Color::Green)));
        segments.push(Span::styled("connected", Style::default().fg(Color::White)));
    } else {
        segments.push(Span::styled(" ● ", Style::default().fg(Color::Red)));
        segments.push(Span::styled("disconnected", Style::default().fg(Color::White)));
    }

    segments.push(sep());
    if snap.active.is_some() {
        segments.push(Span::styled(snap.active_name.clone(), Style::default().fg(Color::Cyan)));
    } else {
        segments.push(Span::styled("no conversation", Style::default().fg(Color::DarkGray)));
    }

    segments.push(sep());
    segments.push(Span::styled(
        format!("{} chats", snap.total_chats),
        Style::default().fg(Color::Gray),
    ));
    if snap.total_unread > 0 {
        segments.push(Span::styled(
            format!(", {} unread", snap.total_unread),
            Style::default().fg(Color::Yellow),
        ));
    }

    if let ChannelFilter::Only(channel) = app.inbox.channel_filter() {
        segments.push(sep());
        segments.push(Span::styled(
            format!("only {channel}"),
            Style::default().fg(channel_color(channel)),
        ));
    }

    if !app.status_message.is_empty() {
        segments.push(sep());
        segments.push(Span::styled(app.status_message.clone(), Style::default().fg(Color::Gray)));
    }

    if sidebar_auto_hidden && app.sidebar_visible {
        segments.push(sep());
        segments.push(Span::styled("[+]", Style::default().fg(Color::DarkGray)));
    }

    let status = Paragraph::new(Line::from(segments))
        .style(Style::default().fg(Color::White).bg(Color::DarkGray));
    frame.render_widget(status, area);
}

fn draw_autocomplete<C: Clock>(frame: &mut Frame, app: &App<C>, input_area: Rect) {
    let candidates = &app.autocomplete_candidates;
    let count = candidates.len();
    let terminal_width = frame.area().width;

    let mut lines: Vec<Line> = Vec::with_capacity(count);
    let mut max_content_width: usize = 0;
    for (i, &cmd_idx) in candidates.iter().enumerate() {
        let cmd = &COMMANDS[cmd_idx];
        let args_part = if cmd.args.is_empty() {
            String::new()
        } else {
            format!(" {}", cmd.args)
        };
        let left = format!("  {}{}", cmd.name, args_part);
        let right = format!("  {}", cmd.description);
        max_content_width = max_content_width.max(left.len() + right.len() + 2);

        let is_selected = i == app.autocomplete_index;
        let (style, desc_style) = if is_selected {
            (
                Style::default().bg(Color::DarkGray).fg(Color::White).add_modifier(Modifier::BOLD),
                Style::default().bg(Color::DarkGray).fg(Color::Cyan),
            )
        } else {
            (Style::default().fg(Color::Gray), Style::default().fg(Color::DarkGray))
        };

        lines.push(Line::from(vec![Span::styled(left, style), Span::styled(right, desc_style)]));
    }

    let popup_width = (max_content_width as u16 + 2).min(terminal_width.saturating_sub(2)).max(20);
    let popup_height = (count as u16) + 2;
    let area = Rect::new(
        input_area.x,
        input_area.y.saturating_sub(popup_height),
        popup_width,
        popup_height,
    );

    frame.render_widget(Clear, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Cyan))
        .style(Style::default().bg(Color::Black));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_help(frame: &mut Frame, area: Rect) {
    let shortcuts: &[(&str, &str)] = &[
        ("Tab / Shift+Tab", "Next / prev conversation"),
        ("Ctrl+T", "Insert suggested reply"),
        ("Up / Down", "Recall input history"),
        ("Ctrl+Left/Right", "Resize sidebar"),
        ("Esc, j / k", "Normal mode, switch chats"),
        ("Ctrl+C", "Quit"),
    ];

    let key_col_width = 22;
    let desc_col_width = 30;
    let pref_width = (key_col_width + desc_col_width + 6) as u16;
    let pref_height = (COMMANDS.len() + shortcuts.len() + 5) as u16 + 2;

    let (popup_area, block) = centered_popup(frame, area, pref_width, pref_height, " Help ");

    let header_style = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
    let key_style = Style::default().fg(Color::Cyan);
    let desc_style = Style::default().fg(Color::Gray);

    let row = |key: String, desc: &str| {
        Line::from(vec![
            Span::styled(format!("  {key:<key_col_width$}"), key_style),
            Span::styled(desc.to_string(), desc_style),
        ])
    };

    let mut lines: Vec<Line> = vec![Line::from(Span::styled("  Commands", header_style))];
    for cmd in COMMANDS {
        let key = if cmd.args.is_empty() {
            cmd.name.to_string()
        } else {
            format!("{} {}", cmd.name, cmd.args)
        };
        lines.push(row(key, cmd.description));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("  Shortcuts", header_style)));
    for &(key, desc) in shortcuts {
        lines.push(row(key.to_string(), desc));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "  Press any key to close",
        Style::default().fg(Color::DarkGray),
    )));

    frame.render_widget(Paragraph::new(lines).block(block), popup_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::directory::{ClientDirectory, ClientProfile};
    use crate::store::MessageStore;
    use crate::typing::ManualClock;
    use chrono::Utc;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use rstest::rstest;
    use std::time::Duration;

    fn test_app() -> (App<ManualClock>, ManualClock) {
        let now = Utc::now();
        let mut store = MessageStore::new();
        store
            .receive("c1", "I missed leg day", Some(Channel::Email), now - chrono::Duration::minutes(3))
            .unwrap();
        store
            .receive("c2", "Thanks!", Some(Channel::Instagram), now - chrono::Duration::minutes(9))
            .unwrap();
        store.mark_read("c2");
        let directory = [("c1", ClientProfile { name: "Emma Davis".to_string(), plan: None })]
            .into_iter()
            .collect();
        let clock = ManualClock::new();
        let mut app = App::new(store, directory, clock.clone(), &Config::default());
        app.set_connected();
        (app, clock)
    }

    fn render(app: &mut App<ManualClock>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    #[rstest]
    #[case(None, "✓", Color::DarkGray)]
    #[case(Some(DeliveryStatus::Sending), "✓", Color::DarkGray)]
    #[case(Some(DeliveryStatus::Sent), "✓", Color::Gray)]
    #[case(Some(DeliveryStatus::Delivered), "✓✓", Color::White)]
    #[case(Some(DeliveryStatus::Read), "✓✓", Color::Green)]
    fn receipt_symbols(
        #[case] status: Option<DeliveryStatus>,
        #[case] sym: &str,
        #[case] color: Color,
    ) {
        assert_eq!(status_symbol(status, Some(Channel::Whatsapp), true), (sym, color));
    }

    #[test]
    fn read_receipt_uses_channel_accent() {
        for channel in Channel::ALL {
            let (_, fg) = status_symbol(Some(DeliveryStatus::Read), Some(channel), true);
            assert_eq!(fg, channel_color(channel));
        }
        let (_, fg) = status_symbol(Some(DeliveryStatus::Read), Some(Channel::Email), false);
        assert_eq!(fg, Color::DarkGray);
    }

    #[test]
    fn truncate_counts_chars() {
        assert_eq!(truncate("Olivia", 10), "Olivia");
        assert_eq!(truncate("Olivia Brown", 6), "Olivi…");
        assert_eq!(truncate("Zoë Ødegård", 4), "Zoë…");
    }

    #[test]
    fn sidebar_lists_clients_with_fallback_names() {
        let (mut app, _) = test_app();
        let screen = render(&mut app);
        assert!(screen.contains("Emma Davis (1) em"));
        // No directory entry: the raw id stands in
        assert!(screen.contains("c2 ig"));
        assert!(screen.contains("2 chats, 1 unread"));
        assert!(screen.contains("Welcome back, coach"));
    }

    #[test]
    fn open_conversation_shows_suggestion_and_typing() {
        let (mut app, clock) = test_app();
        app.next_conversation();
        clock.advance(Duration::from_millis(600));
        app.tick();
        let screen = render(&mut app);
        assert!(screen.contains("Emma Davis via email"));
        assert!(screen.contains("<Emma Davis> I missed leg day"));
        assert!(screen.contains("Emma Davis is typing…"));
        assert!(screen.contains("Suggested: Get back on track"));
    }

    #[test]
    fn coach_replies_show_receipts() {
        let (mut app, _) = test_app();
        app.next_conversation();
        let sent = app.inbox.send("Let's reschedule", None).unwrap();
        app.inbox.apply_receipt(sent.id(), DeliveryStatus::Delivered).unwrap();
        let screen = render(&mut app);
        assert!(screen.contains("✓✓ "));
        assert!(screen.contains("<Coach> Let's reschedule"));
    }

    #[test]
    fn thread_is_drawn_in_timestamp_order() {
        let now = Utc::now();
        let mut store = MessageStore::new();
        store
            .receive("c1", "Week two check-in", Some(Channel::Email), now - chrono::Duration::minutes(2))
            .unwrap();
        // Stored after the client message but older than it
        store
            .send("c1", "Great first week", Channel::Email, now - chrono::Duration::minutes(5))
            .unwrap();
        let mut directory = ClientDirectory::new();
        directory.insert("c1", ClientProfile { name: "Emma Davis".to_string(), plan: None });
        let mut app = App::new(store, directory, ManualClock::new(), &Config::default());
        app.next_conversation();

        let screen = render(&mut app);
        let row = |needle: &str| screen.lines().position(|l| l.contains(needle)).unwrap();
        let coach = row("<Coach> Great first week");
        let marker = row(" new messages ");
        let client = row("<Emma Davis> Week two check-in");
        assert!(coach < marker && marker < client, "{screen}");
    }

    #[test]
    fn conversation_title_shows_client_plan() {
        let mut store = MessageStore::new();
        store.receive("c1", "Ready for week three", Some(Channel::Email), Utc::now()).unwrap();
        let mut directory = ClientDirectory::new();
        directory.insert(
            "c1",
            ClientProfile { name: "Emma Davis".to_string(), plan: Some("Premium".to_string()) },
        );
        let mut app = App::new(store, directory, ManualClock::new(), &Config::default());
        app.next_conversation();
        assert_eq!(
            app.inbox.directory().get("c1").and_then(|p| p.plan.as_deref()),
            Some("Premium")
        );
        assert!(render(&mut app).contains("Emma Davis via email · Premium"));
    }

    #[test]
    fn narrow_terminal_hides_sidebar() {
        let (mut app, _) = test_app();
        let mut terminal = Terminal::new(TestBackend::new(50, 12)).unwrap();
        terminal.draw(|f| draw(f, &mut app)).unwrap();
        let buffer = terminal.backend().buffer();
        let first_row: String = (0..buffer.area.width).map(|x| buffer[(x, 0)].symbol()).collect();
        assert!(!first_row.contains("Clients"));
    }
}
