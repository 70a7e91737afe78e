//! Rendering routines for the Moneta TUI.

use crate::app::App;
use moneta_core::{PRODUCT_CHOICES, QuestionKind, Role, SurveySession};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, BorderType, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap,
};

// ── Theme colors (dark mode) ──────────────────────────────────────────

const PRIMARY: Color = Color::Rgb(64, 169, 107); // #40A96B
const SECONDARY: Color = Color::Rgb(229, 192, 123); // #e5c07b
const USER_ACCENT: Color = Color::Rgb(97, 175, 239); // #61afef
const TEXT: Color = Color::Rgb(238, 238, 238); // #eeeeee
const TEXT_MUTED: Color = Color::Rgb(128, 128, 128); // #808080
const BORDER: Color = Color::Rgb(60, 60, 60); // #3c3c3c
const BORDER_ACTIVE: Color = Color::Rgb(229, 192, 123); // #e5c07b

const HEADER_HEIGHT: u16 = 7; // 5 inner lines + 2 border lines
const FOLLOW_UP_HEIGHT: u16 = 3;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const HERO_ART: [&str; 2] = [
    " █▀▄▀█ █▀▀█ █▀▀▄ █▀▀▀ ▀▀█▀▀ █▀▀█",
    " █ ▀ █ █▄▄█ █  █ █▄▄▄   █   █▄▄█",
];

/// Draw the entire TUI frame.
pub fn draw(frame: &mut Frame<'_>, app: &mut App) {
    let area = frame.area();

    if app.follow_up.is_some() {
        let root = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(HEADER_HEIGHT),    // header bar
                Constraint::Min(0),                   // chat
                Constraint::Length(FOLLOW_UP_HEIGHT), // product panel
                Constraint::Length(3),                // input
                Constraint::Length(1),                // status bar
            ])
            .split(area);

        draw_header(frame, app, root[0]);
        draw_chat(frame, app, root[1]);
        draw_follow_up(frame, app, root[2]);
        draw_input(frame, app, root[3]);
        draw_status_bar(frame, app, root[4]);
    } else {
        let root = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(HEADER_HEIGHT), // header bar
                Constraint::Min(0),                // chat
                Constraint::Length(3),             // input
                Constraint::Length(1),             // status bar
            ])
            .split(area);

        draw_header(frame, app, root[0]);
        draw_chat(frame, app, root[1]);
        draw_input(frame, app, root[2]);
        draw_status_bar(frame, app, root[3]);
    }

    if let Some(survey) = app.survey.as_ref() {
        draw_survey_modal(frame, survey, area);
    }
}

/// Draw the header with the banner and connection info.
fn draw_header(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let label_style = Style::default().fg(TEXT_MUTED);
    let value_style = Style::default().fg(TEXT);
    let art_style = Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD);

    let mut lines: Vec<Line<'_>> = Vec::new();
    for (i, art_line) in HERO_ART.iter().enumerate() {
        if i == HERO_ART.len() - 1 {
            lines.push(Line::from(vec![
                Span::styled(*art_line, art_style),
                Span::styled(format!("  v{VERSION}"), label_style),
            ]));
        } else {
            lines.push(Line::from(Span::styled(*art_line, art_style)));
        }
    }
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("  mode ", label_style),
        Span::styled(app.mode.as_str(), Style::default().fg(SECONDARY)),
        Span::styled("  backend ", label_style),
        Span::styled(app.base_url.as_str(), value_style),
    ]));
    lines.push(Line::from(vec![
        Span::styled("  data ", label_style),
        Span::styled(app.data_dir.as_str(), value_style),
    ]));

    frame.render_widget(Paragraph::new(lines), inner);
}

/// Draw the chat transcript with border and scrollbar.
fn draw_chat(frame: &mut Frame<'_>, app: &mut App, area: Rect) {
    let lines = transcript_lines(app);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER))
        .title(Span::styled(" Chat ", Style::default().fg(TEXT_MUTED)));

    let inner = block.inner(area);
    let content_width = inner.width.saturating_sub(1); // -1 for scrollbar
    let content_height = inner.height as usize;

    // ratatui's own line_count gives the exact wrapped total, avoiding any
    // mismatch with a hand-written wrap estimator.
    let total_lines = Paragraph::new(lines.clone())
        .wrap(Wrap { trim: false })
        .line_count(content_width)
        .max(1);

    let max_scroll = total_lines.saturating_sub(content_height) as u16;
    app.update_scroll_bounds(max_scroll);
    let scroll = app.scroll;

    let chat_inner = Rect {
        width: inner.width.saturating_sub(1),
        ..inner
    };

    let chat = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));

    frame.render_widget(block, area);
    frame.render_widget(chat, chat_inner);

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

/// Render the whole transcript as styled lines.
fn transcript_lines(app: &App) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for entry in &app.entries {
        lines.extend(message_lines(&entry.content, entry.role));
        lines.push(Line::from(""));
    }
    if app.busy {
        lines.push(Line::from(Span::styled(
            "    …",
            Style::default().fg(TEXT_MUTED),
        )));
    }
    lines
}

/// Render one message bubble: the avatar glyph plus the content, verbatim.
///
/// Pure function of its inputs; the role only selects styling.
pub fn message_lines(content: &str, role: Role) -> Vec<Line<'static>> {
    let (glyph, accent) = match role {
        Role::User => (" U ", USER_ACCENT),
        Role::Assistant => (" A ", PRIMARY),
    };
    let avatar_style = Style::default()
        .fg(Color::Rgb(10, 10, 10))
        .bg(accent)
        .add_modifier(Modifier::BOLD);
    let text_style = Style::default().fg(TEXT);

    let mut lines = Vec::new();
    for (i, part) in content.split('\n').enumerate() {
        if i == 0 {
            lines.push(Line::from(vec![
                Span::styled(glyph, avatar_style),
                Span::raw(" "),
                Span::styled(part.to_string(), text_style),
            ]));
        } else {
            lines.push(Line::from(vec![
                Span::raw("    "),
                Span::styled(part.to_string(), text_style),
            ]));
        }
    }
    lines
}

/// Draw the survey modal centered over the frame.
fn draw_survey_modal(frame: &mut Frame<'_>, survey: &SurveySession, area: Rect) {
    let question = survey.current();
    let multi = question.kind == QuestionKind::Multi;

    let mut lines: Vec<Line<'_>> = Vec::new();
    lines.push(Line::from(Span::styled(
        format!(" {}", question.guidance),
        Style::default().fg(TEXT_MUTED),
    )));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!(" {}", question.prompt),
        Style::default().fg(TEXT).add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(""));

    for (index, option) in question.options.iter().enumerate() {
        let selected = multi && survey.is_selected(index);
        let marker = if multi {
            if selected { "[x]" } else { "[ ]" }
        } else {
            "   "
        };
        let style = if selected {
            Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(TEXT)
        };
        lines.push(Line::from(vec![
            Span::styled(
                format!(" {} ", index + 1),
                Style::default().fg(SECONDARY).add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("{marker} "), style),
            Span::styled(option.label.to_string(), style),
        ]));
    }

    lines.push(Line::from(""));
    let hint = if survey.is_armed() {
        "Enter to finish"
    } else if multi {
        "Digits toggle options, Enter continues (pick at least one)"
    } else {
        "Press a digit to answer"
    };
    lines.push(Line::from(Span::styled(
        format!(" {hint}  Esc dismisses"),
        Style::default().fg(TEXT_MUTED).add_modifier(Modifier::ITALIC),
    )));

    let title = format!(
        " Risk Profile Survey — {}/{} ",
        survey.index() + 1,
        survey.question_count()
    );
    let width = area.width.saturating_sub(6).clamp(20, 78);
    let height = (lines.len() as u16 + 2).min(area.height.saturating_sub(2));
    let modal_area = Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(PRIMARY))
        .title(Span::styled(
            title,
            Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD),
        ))
        .style(Style::default().bg(Color::Rgb(20, 20, 20)));

    let modal = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(block);
    frame.render_widget(modal, modal_area);
}

/// Draw the post-survey product panel.
fn draw_follow_up(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER_ACTIVE))
        .title(Span::styled(
            " Pick a product ",
            Style::default().fg(SECONDARY),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(panel) = app.follow_up.as_ref() else {
        return;
    };

    let line = match panel.free_text.as_ref() {
        Some(text) => Line::from(vec![
            Span::styled(" product: ", Style::default().fg(TEXT_MUTED)),
            Span::styled(text.clone(), Style::default().fg(TEXT)),
            Span::styled(
                "  (Enter to submit, Esc to go back)",
                Style::default().fg(TEXT_MUTED),
            ),
        ]),
        None => {
            let mut spans = Vec::new();
            for (index, product) in PRODUCT_CHOICES.iter().enumerate() {
                spans.push(Span::styled(
                    format!(" {} ", index + 1),
                    Style::default().fg(SECONDARY).add_modifier(Modifier::BOLD),
                ));
                spans.push(Span::styled(*product, Style::default().fg(TEXT)));
            }
            spans.push(Span::styled(
                format!(" {} ", PRODUCT_CHOICES.len() + 1),
                Style::default().fg(SECONDARY).add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::styled("Type your own", Style::default().fg(TEXT)));
            Line::from(spans)
        }
    };

    frame.render_widget(Paragraph::new(line), inner);
}

/// Draw the input box with border and cursor.
fn draw_input(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let is_active = app.survey.is_none() && app.follow_up.is_none();
    let border_color = if is_active { BORDER_ACTIVE } else { BORDER };
    let title = if app.survey.is_some() {
        " Survey in progress "
    } else {
        " Input "
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(border_color))
        .title(Span::styled(
            title,
            Style::default().fg(if is_active { SECONDARY } else { TEXT_MUTED }),
        ));

    let inner = block.inner(area);

    let input_text = if app.input.is_empty() && is_active {
        Line::from(vec![
            Span::raw(" "),
            Span::styled("Type a message...", Style::default().fg(TEXT_MUTED)),
        ])
    } else {
        Line::from(vec![
            Span::raw(" "),
            Span::styled(app.input.as_str(), Style::default().fg(TEXT)),
        ])
    };

    frame.render_widget(block, area);
    frame.render_widget(Paragraph::new(input_text), inner);

    if is_active {
        frame.set_cursor_position((inner.x + 1 + app.input.len() as u16, inner.y));
    }
}

/// Draw the status bar at the bottom.
fn draw_status_bar(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let status_color = match app.status.as_str() {
        "idle" => TEXT_MUTED,
        "waiting for advisor" | "reporting risk profile" => PRIMARY,
        _ => SECONDARY,
    };

    let shortcuts = vec![
        Span::styled(" Ctrl+C", Style::default().fg(TEXT_MUTED)),
        Span::styled(" quit", Style::default().fg(BORDER)),
        Span::styled("  Ctrl+N", Style::default().fg(TEXT_MUTED)),
        Span::styled(" new chat", Style::default().fg(BORDER)),
        Span::styled("  Ctrl+T", Style::default().fg(TEXT_MUTED)),
        Span::styled(" mode", Style::default().fg(BORDER)),
        Span::styled("  Ctrl+S", Style::default().fg(TEXT_MUTED)),
        Span::styled(" survey", Style::default().fg(BORDER)),
        Span::styled("  PgUp/PgDn", Style::default().fg(TEXT_MUTED)),
        Span::styled(" scroll", Style::default().fg(BORDER)),
    ];

    let right_text = format!(" {} ", app.status);
    let right_len = right_text.len() as u16;
    let left_area = Rect {
        width: area.width.saturating_sub(right_len),
        ..area
    };
    let right_area = Rect {
        x: area.x + area.width.saturating_sub(right_len),
        width: right_len,
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

#[cfg(test)]
mod tests {
    use super::message_lines;
    use moneta_core::Role;
    use pretty_assertions::assert_eq;

    #[test]
    fn renderer_picks_avatar_by_role() {
        let user = message_lines("hello", Role::User);
        assert_eq!(user.len(), 1);
        assert_eq!(user[0].spans[0].content, " U ");
        assert_eq!(user[0].spans[2].content, "hello");

        let assistant = message_lines("hi", Role::Assistant);
        assert_eq!(assistant[0].spans[0].content, " A ");
    }

    #[test]
    fn renderer_keeps_content_verbatim() {
        let lines = message_lines("**not markdown**\nsecond line", Role::Assistant);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].spans[2].content, "**not markdown**");
        assert_eq!(lines[1].spans[1].content, "second line");
    }
}
