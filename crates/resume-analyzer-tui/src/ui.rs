use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};
use resume_analyzer_core::{
    ChatRole, Turn, TurnState, UploadCoordinator, UploadPhase, ACCEPTED_EXTENSIONS,
};

use crate::app::{App, FocusPane, InputMode};

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.chars().peekable();
    let mut current_text = String::new();

    while let Some(c) = chars.next() {
        if c == '*' && chars.peek() == Some(&'*') {
            chars.next();

            let mut bold_text = String::new();
            let mut found_close = false;
            while let Some(c) = chars.next() {
                if c == '*' && chars.peek() == Some(&'*') {
                    chars.next();
                    found_close = true;
                    break;
                }
                bold_text.push(c);
            }

            if found_close && !bold_text.is_empty() {
                if !current_text.is_empty() {
                    spans.push(Span::raw(std::mem::take(&mut current_text)));
                }
                spans.push(Span::styled(
                    bold_text,
                    Style::default().add_modifier(Modifier::BOLD),
                ));
            } else {
                // No closing **, treat as literal
                current_text.push_str("**");
                current_text.push_str(&bold_text);
            }
        } else {
            current_text.push(c);
        }
    }

    if !current_text.is_empty() {
        spans.push(Span::raw(current_text));
    }

    Line::from(spans)
}

fn border_color(focused: bool) -> Color {
    if focused { Color::Cyan } else { Color::DarkGray }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    let [upload_area, chat_area] = Layout::horizontal([
        Constraint::Percentage(40),
        Constraint::Percentage(60),
    ])
    .areas(body_area);

    render_header(app, frame, header_area);
    render_upload_panel(app, frame, upload_area);
    render_chat_panel(app, frame, chat_area);
    render_footer(app, frame, footer_area);

    // Popups
    if app.confirm_reset {
        render_reset_confirm(frame, area);
    } else if app.picker.is_some() {
        render_picker(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let (health_text, health_color) = match app.backend_healthy {
        Some(true) => ("online", Color::Green),
        Some(false) => ("unreachable", Color::Red),
        None => ("checking", Color::Yellow),
    };

    let title = Line::from(vec![
        Span::styled(" AI Resume Analyzer ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!(" session {} ", app.session_token.short()),
            Style::default().fg(Color::White),
        ),
        Span::styled(format!(" {} ", app.backend_url), Style::default().fg(Color::Gray)),
        Span::styled(health_text, Style::default().fg(health_color)),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = match app.input_mode {
        InputMode::Normal => (" NORMAL ", Style::default().bg(Color::Blue).fg(Color::White)),
        InputMode::Editing => (" INSERT ", Style::default().bg(Color::Yellow).fg(Color::Black)),
    };

    let hints = if app.confirm_reset {
        " y confirm reset · any other key cancels"
    } else if app.picker.is_some() {
        " j/k move · Enter open/mark · Space mark · h up · a all files · s select · Esc cancel"
    } else if app.input_mode == InputMode::Editing {
        " Enter send · Shift+Enter newline · Esc stop typing"
    } else {
        " f choose files · u upload · i type · Tab switch · R reset session · q quit"
    };

    let footer = Line::from(vec![
        Span::styled(mode_text, mode_style),
        Span::styled(hints, Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(footer), area);
}

fn render_upload_panel(app: &App, frame: &mut Frame, area: Rect) {
    let focused = app.focus == FocusPane::Upload;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color(focused)))
        .title(" Upload resumes ");

    let accepted: Vec<String> = ACCEPTED_EXTENSIONS.iter().map(|e| format!(".{e}")).collect();

    let mut lines = vec![
        Line::from(Span::styled(
            format!("Accepted: {}", accepted.join(", ")),
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(vec![
            Span::styled("Files are stored only for ", Style::default().fg(Color::DarkGray)),
            Span::styled("your session", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(".", Style::default().fg(Color::DarkGray)),
        ]),
        Line::default(),
        Line::from(Span::styled(
            app.upload.selected_summary(),
            Style::default().fg(Color::White).bold(),
        )),
    ];

    for file in app.upload.selected() {
        lines.push(Line::from(format!("  • {}", file.name)));
    }
    lines.push(Line::default());

    match app.upload.phase() {
        UploadPhase::Uploading => {
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                format!("Uploading{}", dots),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
            )));
        }
        UploadPhase::Ready => {
            lines.push(Line::from(Span::styled(
                "Press u to upload",
                Style::default().fg(Color::DarkGray),
            )));
        }
        UploadPhase::Idle => {}
    }

    if let Some(status) = upload_status_line(&app.upload) {
        lines.push(Line::default());
        lines.push(status);
    }

    let panel = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(panel, area);
}

/// Result of the last upload: green on success, red on failure
fn upload_status_line(upload: &UploadCoordinator) -> Option<Line<'static>> {
    let status = upload.status()?;
    let color = if upload.status_is_error() { Color::Red } else { Color::Green };
    Some(Line::from(Span::styled(
        status.to_string(),
        Style::default().fg(color),
    )))
}

fn turn_lines(turn: &Turn, busy: bool, animation_frame: u8, lines: &mut Vec<Line<'static>>) {
    match turn.role {
        ChatRole::User => {
            lines.push(Line::from(Span::styled(
                "You:",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )));
        }
        ChatRole::Assistant => {
            lines.push(Line::from(Span::styled(
                "AI:",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )));
        }
    }

    match &turn.state {
        TurnState::Pending if busy => {
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                format!("Thinking{}", dots),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }
        TurnState::Pending => {
            lines.push(Line::from(Span::styled(
                "Thinking...",
                Style::default().fg(Color::DarkGray),
            )));
        }
        TurnState::Resolved(text) => {
            for line in text.lines() {
                lines.push(parse_markdown_line(line));
            }
        }
        TurnState::Failed(message) => {
            for line in message.lines() {
                lines.push(Line::from(Span::styled(
                    line.to_string(),
                    Style::default().fg(Color::Red),
                )));
            }
        }
    }
    lines.push(Line::default());
}

fn render_chat_panel(app: &mut App, frame: &mut Frame, area: Rect) {
    let compose_lines = app.conversation.compose().text().split('\n').count().max(1);
    let input_height = (compose_lines.min(5) + 2) as u16;

    let [transcript_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(input_height),
    ])
    .areas(area);

    // Store chat area dimensions for scroll calculations (inner size minus borders)
    app.chat_height = transcript_area.height.saturating_sub(2);
    app.chat_width = transcript_area.width.saturating_sub(2);
    app.follow_transcript();

    let focused = app.focus == FocusPane::Chat;
    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color(focused)))
        .title(" Chat ");

    let busy = app.conversation.is_busy();
    let chat_text = if app.conversation.turns().is_empty() {
        Text::from(Span::styled(
            "Upload your resumes, then ask a question about them...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut lines: Vec<Line> = Vec::new();
        for turn in app.conversation.turns() {
            turn_lines(turn, busy, app.animation_frame, &mut lines);
        }
        Text::from(lines)
    };

    let chat = Paragraph::new(chat_text)
        .block(chat_block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));
    frame.render_widget(chat, transcript_area);

    render_compose(app, frame, input_area);
}

fn render_compose(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let title = if app.conversation.is_busy() {
        " Waiting for answer... "
    } else {
        " Type your message (i to focus) "
    };
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if editing { Color::Yellow } else { Color::DarkGray }))
        .title(title);

    let compose = app.conversation.compose();
    let text = compose.text();

    // Locate the cursor as (row, column) within the multi-line buffer
    let before: String = text.chars().take(compose.cursor()).collect();
    let cursor_row = before.matches('\n').count();
    let cursor_col = before.rsplit('\n').next().map(|s| s.chars().count()).unwrap_or(0);

    let inner_height = area.height.saturating_sub(2) as usize;
    let inner_width = area.width.saturating_sub(2) as usize;

    // Keep the cursor row and column visible
    let row_offset = if inner_height == 0 { 0 } else { (cursor_row + 1).saturating_sub(inner_height) };
    let col_offset = if inner_width == 0 { 0 } else { (cursor_col + 1).saturating_sub(inner_width) };

    let visible: Vec<Line> = text
        .split('\n')
        .skip(row_offset)
        .take(inner_height.max(1))
        .map(|line| Line::from(line.chars().skip(col_offset).take(inner_width).collect::<String>()))
        .collect();

    let input = Paragraph::new(Text::from(visible))
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);
    frame.render_widget(input, area);

    // Show cursor when editing
    if editing {
        frame.set_cursor_position((
            area.x + 1 + (cursor_col - col_offset) as u16,
            area.y + 1 + (cursor_row - row_offset) as u16,
        ));
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let [area] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(area);
    let [area] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    area
}

fn render_picker(app: &mut App, frame: &mut Frame, area: Rect) {
    let Some(picker) = app.picker.as_mut() else {
        return;
    };

    let popup = centered(area, area.width.saturating_sub(10).min(80), area.height.saturating_sub(4).min(24));
    frame.render_widget(Clear, popup);

    let filter = if picker.show_all {
        "all files".to_string()
    } else {
        ACCEPTED_EXTENSIONS.iter().map(|e| format!("*.{e}")).collect::<Vec<_>>().join(" ")
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(" {} [{}] ", picker.dir.display(), filter))
        .title_bottom(format!(" {} marked ", picker.marked().len()));

    if let Some(error) = &picker.error {
        let message = Paragraph::new(Span::styled(error.clone(), Style::default().fg(Color::Red)))
            .block(block)
            .wrap(Wrap { trim: true });
        frame.render_widget(message, popup);
        return;
    }

    let items: Vec<ListItem> = picker
        .entries
        .iter()
        .map(|entry| {
            if entry.is_dir {
                ListItem::new(format!("    {}/", entry.name)).style(Style::default().fg(Color::Blue))
            } else if picker.is_marked(&entry.path) {
                ListItem::new(format!("[x] {}", entry.name)).style(Style::default().fg(Color::Green))
            } else {
                ListItem::new(format!("[ ] {}", entry.name))
            }
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Cyan)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, popup, &mut picker.state);
}

fn render_reset_confirm(frame: &mut Frame, area: Rect) {
    let popup = centered(area, 52, 5);
    frame.render_widget(Clear, popup);

    let text = Text::from(vec![
        Line::from("Start a new session?"),
        Line::from(Span::styled(
            "Uploaded documents and chat history stay with the old one.",
            Style::default().fg(Color::DarkGray),
        )),
    ]);
    let dialog = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red))
                .title(" Reset session (y/n) "),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(dialog, popup);
}
