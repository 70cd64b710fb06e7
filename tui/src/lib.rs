//! TUI rendering for Parley using ratatui.

mod input;
mod theme;

pub use input::{InputPump, apply_event, handle_events};
pub use theme::{Glyphs, Palette, glyphs, palette, spinner_frame, styles};

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Margin, Position, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{
        Block, BorderType, Borders, Padding, Paragraph, Scrollbar, ScrollbarOrientation,
        ScrollbarState, Wrap,
    },
};
use unicode_width::UnicodeWidthStr;

use parley_engine::{App, Entry, InputMode, NoticeLevel, ScrollState};
use parley_types::Role;

const INPUT_HEIGHT: u16 = 3;

/// Main draw function
pub fn draw(frame: &mut Frame, app: &mut App) {
    let palette = palette();
    let glyphs = glyphs(app.options().ascii_only);

    let bg_block = Block::default().style(Style::default().bg(palette.bg_dark));
    frame.render_widget(bg_block, frame.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Min(1),               // Messages
            Constraint::Length(INPUT_HEIGHT), // Input
            Constraint::Length(1),            // Status bar
        ])
        .split(frame.area());

    draw_messages(frame, app, chunks[0], &palette, &glyphs);
    draw_input(frame, app, chunks[1], &palette, &glyphs);
    draw_status_bar(frame, app, chunks[2], &palette, &glyphs);
}

fn draw_messages(
    frame: &mut Frame,
    app: &mut App,
    area: Rect,
    palette: &Palette,
    glyphs: &Glyphs,
) {
    let ascii_only = app.options().ascii_only;
    let spinner = spinner_frame(app.frame(), ascii_only);

    let mut lines: Vec<Line> = Vec::new();
    for (i, entry) in app.transcript().entries().iter().enumerate() {
        if i > 0 {
            lines.push(Line::from(""));
        }
        let (icon, name_style) = match entry.role() {
            Role::User => (glyphs.user, theme::styles::user_name(palette)),
            Role::Assistant => (glyphs.assistant, theme::styles::assistant_name(palette)),
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{icon} "), name_style),
            Span::styled(entry.role().display_name(), name_style),
        ]));

        match entry {
            Entry::Placeholder(_) => lines.push(Line::from(vec![
                Span::styled(format!("  {spinner} "), Style::default().fg(palette.primary)),
                Span::styled(
                    entry.text().to_string(),
                    Style::default()
                        .fg(palette.text_muted)
                        .add_modifier(Modifier::ITALIC),
                ),
            ])),
            Entry::Message { text, .. } => {
                for line in text.lines() {
                    lines.push(Line::from(Span::styled(
                        format!("  {line}"),
                        Style::default().fg(palette.text_primary),
                    )));
                }
            }
        }
    }

    let messages_block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(palette.bg_border))
        .style(Style::default().bg(palette.bg_panel))
        .padding(Padding::horizontal(1));

    let inner = messages_block.inner(area);
    let total_lines = wrapped_line_count(&lines, inner.width);
    let max_scroll = total_lines.saturating_sub(inner.height);
    app.transcript_mut().clamp_scroll(max_scroll);
    let scroll_offset = match app.transcript().scroll() {
        ScrollState::AutoBottom => max_scroll,
        ScrollState::Manual { lines_from_bottom } => {
            max_scroll.saturating_sub(lines_from_bottom)
        }
    };

    let messages = Paragraph::new(lines)
        .block(messages_block)
        .wrap(Wrap { trim: false })
        .scroll((scroll_offset, 0));
    frame.render_widget(messages, area);

    if max_scroll > 0 {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some(glyphs.arrow_up))
            .end_symbol(Some(glyphs.arrow_down))
            .track_symbol(Some(glyphs.track))
            .thumb_symbol(glyphs.thumb)
            .style(Style::default().fg(palette.text_muted));

        // content_length is the scrollable range so the thumb sits at the bottom
        // when following the tail.
        let mut scrollbar_state =
            ScrollbarState::new(max_scroll as usize).position(scroll_offset as usize);
        frame.render_stateful_widget(
            scrollbar,
            area.inner(Margin {
                vertical: 1,
                horizontal: 0,
            }),
            &mut scrollbar_state,
        );
    }
}

fn wrapped_line_count(lines: &[Line], width: u16) -> u16 {
    let width = width.max(1) as usize;
    let mut total: u16 = 0;

    for line in lines {
        let line_width = line.width();
        let rows = if line_width == 0 {
            1
        } else {
            ((line_width - 1) / width) + 1
        };
        total = total.saturating_add(rows as u16);
    }

    total
}

fn draw_input(frame: &mut Frame, app: &App, area: Rect, palette: &Palette, glyphs: &Glyphs) {
    let locked = app.is_locked() && app.mode() == InputMode::Insert;

    let (title, border_color, shown, hint) = match app.mode() {
        InputMode::CredentialEntry => {
            let secret = app.secret();
            let masked = glyphs.mask.repeat(secret.grapheme_count());
            let hint = secret
                .is_empty()
                .then(|| app.masked_credential())
                .flatten()
                .map(|current| format!("current: {current}"));
            (
                " API key · Enter save · Esc cancel ",
                palette.warning,
                masked,
                hint,
            )
        }
        InputMode::Insert if locked => (
            " waiting for reply ",
            palette.text_disabled,
            app.draft().text().to_string(),
            None,
        ),
        InputMode::Insert => (
            " Message ",
            palette.green,
            app.draft().text().to_string(),
            app.draft()
                .is_empty()
                .then(|| "Type a message, or /help".to_string()),
        ),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(border_color))
        .title(Span::styled(title, Style::default().fg(border_color)));
    let inner = block.inner(area);

    let prompt = format!("{} ", glyphs.prompt);
    let prompt_width = prompt.width() as u16;
    let text_style = if locked {
        Style::default().fg(palette.text_disabled)
    } else {
        Style::default().fg(palette.text_primary)
    };

    let caret = match app.mode() {
        InputMode::CredentialEntry => glyphs.mask.width() * app.secret().grapheme_count(),
        InputMode::Insert => app.draft().before_cursor().width(),
    } as u16;
    let room = inner.width.saturating_sub(prompt_width).max(1);
    let h_scroll = caret.saturating_sub(room - 1);

    let body = match hint {
        Some(hint) => Span::styled(hint, Style::default().fg(palette.text_muted)),
        None => Span::styled(shown, text_style),
    };
    let line = Line::from(vec![
        Span::styled(prompt, Style::default().fg(border_color)),
        body,
    ]);
    frame.render_widget(Paragraph::new(line).block(block).scroll((0, h_scroll)), area);

    if !locked {
        frame.set_cursor_position(Position::new(
            inner.x + prompt_width + caret.saturating_sub(h_scroll),
            inner.y,
        ));
    }
}

fn draw_status_bar(
    frame: &mut Frame,
    app: &App,
    area: Rect,
    palette: &Palette,
    glyphs: &Glyphs,
) {
    let (key_glyph, key_label, key_color) = if app.masked_credential().is_some() {
        (glyphs.status_ready, "key set", palette.green)
    } else {
        (glyphs.status_missing, "no key", palette.warning)
    };

    let mut spans = vec![
        Span::styled(
            format!(" {} ", app.options().model),
            Style::default().fg(palette.gemini).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("{} ", glyphs.separator), styles::key_hint(palette)),
        Span::styled(format!("{key_glyph} {key_label} "), Style::default().fg(key_color)),
        Span::styled(format!("{} ", glyphs.separator), styles::key_hint(palette)),
    ];

    match app.notice() {
        Some(notice) => {
            let color = match notice.level {
                NoticeLevel::Info => palette.text_secondary,
                NoticeLevel::Warning => palette.warning,
                NoticeLevel::Error => palette.error,
            };
            spans.push(Span::styled(notice.text.clone(), Style::default().fg(color)));
        }
        None => {
            for (key, action) in [("Enter", " send  "), ("/help", " commands  "), ("Esc", " quit")] {
                spans.push(Span::styled(key, styles::key_highlight(palette)));
                spans.push(Span::styled(action, styles::key_hint(palette)));
            }
        }
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
