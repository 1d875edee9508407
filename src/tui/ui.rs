// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use super::app::App;
use super::widgets::{CountdownGrid, centered_rect, create_help_widget};
use crate::models::ReleaseItem;
use crate::upcoming::{Card, SECTION_TITLE, UpcomingSection};

pub const CARD_HEIGHT: u16 = 6;
pub const LOG_PANE_HEIGHT: u16 = 8;

pub fn draw(frame: &mut Frame, app: &mut App) {
    let size = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Footer
        ])
        .split(size);

    draw_header(frame, chunks[0]);

    let section_area = if app.show_logs {
        let content = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(LOG_PANE_HEIGHT)])
            .split(chunks[1]);
        draw_logs_panel(frame, app, content[1]);
        content[0]
    } else {
        chunks[1]
    };

    draw_upcoming_section(
        frame,
        section_area,
        &app.section,
        app.card_columns,
        app.selected_index,
    );
    draw_footer(frame, app, chunks[2]);

    if app.show_detail {
        if let Some(item) = app.selected_item() {
            draw_detail_overlay(frame, size, item);
        }
    }

    if app.show_help {
        draw_help_overlay(frame, size);
    }
}

fn draw_header(frame: &mut Frame, area: Rect) {
    let header = Paragraph::new("KHMERZOON")
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Blue)),
        );

    frame.render_widget(header, area);
}

/// Draws the titled card grid. Loading, failed and empty sections leave
/// the area untouched.
pub fn draw_upcoming_section(
    frame: &mut Frame,
    area: Rect,
    section: &UpcomingSection,
    columns: usize,
    selected: usize,
) {
    if !section.is_visible() {
        return;
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
        .title(Span::styled(
            format!(" {} ", SECTION_TITLE),
            Style::default().add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let cards = section.cards();
    let columns = columns.max(1);
    let total_rows = cards.len().div_ceil(columns);
    let visible_rows = usize::from(inner.height / CARD_HEIGHT).max(1);

    // Keep the selected card's row on screen
    let selected_row = selected / columns;
    let first_row = selected_row.saturating_sub(visible_rows - 1);
    let last_row = (first_row + visible_rows).min(total_rows);

    let row_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(CARD_HEIGHT); visible_rows])
        .split(inner);

    for (slot, row) in (first_row..last_row).enumerate() {
        let Some(row_area) = row_areas.get(slot) else {
            break;
        };

        let cell_areas = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Ratio(1, columns as u32); columns])
            .split(*row_area);

        for (column, cell) in cell_areas.iter().enumerate() {
            let index = row * columns + column;
            if let Some(card) = cards.get(index) {
                draw_card(frame, *cell, card, index == selected);
            }
        }
    }
}

fn draw_card(frame: &mut Frame, area: Rect, card: &Card<'_>, selected: bool) {
    let border_style = if selected {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(format!(" {} ", card.item.title));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Type and date
            Constraint::Length(1),
            Constraint::Min(0), // Countdown
        ])
        .split(inner);

    let meta = Line::from(vec![
        Span::styled(
            format!("[{}] ", card.item.content_type),
            Style::default().fg(Color::Magenta),
        ),
        Span::styled(release_label(card.item), Style::default().fg(Color::Gray)),
    ]);
    frame.render_widget(Paragraph::new(meta), parts[0]);
    frame.render_widget(CountdownGrid::new(card.countdown), parts[2]);
}

fn draw_logs_panel(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Logs ");

    let inner = block.inner(area);
    frame.render_widget(block, area);

    // Most recent entries that fit
    let visible = usize::from(inner.height);
    let start = app.logs.len().saturating_sub(visible);

    let lines: Vec<Line> = app.logs[start..]
        .iter()
        .map(|(time, message)| {
            Line::from(vec![
                Span::styled(
                    format!("{} ", time.format("%H:%M:%S")),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(message.clone(), Style::default().fg(Color::Gray)),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

fn release_label(item: &ReleaseItem) -> String {
    match item.release_time() {
        Some(time) => time.format("%Y-%m-%d %H:%M UTC").to_string(),
        None => item.release_date.clone(),
    }
}

fn draw_footer(frame: &mut Frame, app: &App, area: Rect) {
    let footer_text = if let Some(msg) = &app.status_message {
        msg.clone()
    } else {
        let count = app.section.items().len();
        if count == 0 {
            " r: Reload | ?: Help | q: Quit ".to_string()
        } else {
            format!(
                " Release {} of {} | ←→↑↓: Navigate | Enter: Details | r: Reload | q: Quit ",
                app.selected_index + 1,
                count
            )
        }
    };

    let footer = Paragraph::new(footer_text)
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(footer, area);
}

fn draw_detail_overlay(frame: &mut Frame, area: Rect, item: &ReleaseItem) {
    let detail_area = centered_rect(60, 50, area);
    frame.render_widget(Clear, detail_area);

    let label = Style::default().fg(Color::Yellow);
    let mut lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("Type:     ", label),
            Span::raw(item.content_type.to_string()),
        ]),
        Line::from(vec![
            Span::styled("Release:  ", label),
            Span::raw(release_label(item)),
        ]),
        Line::from(vec![
            Span::styled("Status:   ", label),
            Span::raw(item.status.as_str()),
        ]),
    ];

    if let Some(poster) = &item.poster_url {
        lines.push(Line::from(vec![
            Span::styled("Poster:   ", label),
            Span::raw(poster.clone()),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(
        item.description
            .clone()
            .unwrap_or_else(|| "No description available.".to_string()),
    ));

    let detail = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(format!(" {} ", item.title)),
        )
        .wrap(Wrap { trim: true });

    frame.render_widget(detail, detail_area);
}

fn draw_help_overlay(frame: &mut Frame, area: Rect) {
    let help_area = centered_rect(60, 80, area);
    frame.render_widget(Clear, help_area);
    frame.render_widget(create_help_widget(), help_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::countdown::{AVAILABLE_NOW, Clock, DEFAULT_TICK};
    use crate::store::{MemoryStore, Query, RemoteStore};
    use crate::upcoming::UPCOMING_TABLE;
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use ratatui::{Terminal, backend::TestBackend, buffer::Buffer};
    use serde_json::{Value, json};
    use std::sync::{Arc, Mutex};

    struct FixedClock;

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).unwrap()
        }
    }

    struct SteppingClock(Mutex<DateTime<Utc>>);

    impl SteppingClock {
        fn advance(&self, secs: i64) {
            *self.0.lock().unwrap() += chrono::Duration::seconds(secs);
        }
    }

    impl Clock for SteppingClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    struct RejectingStore;

    #[async_trait]
    impl RemoteStore for RejectingStore {
        async fn select(&self, _query: &Query) -> anyhow::Result<Vec<Value>> {
            anyhow::bail!("503 Service Unavailable")
        }
    }

    fn section_with(store: Arc<dyn RemoteStore>) -> UpcomingSection {
        UpcomingSection::new(store, Arc::new(FixedClock), UPCOMING_TABLE, DEFAULT_TICK)
    }

    fn render(section: &UpcomingSection) -> Buffer {
        let mut terminal = Terminal::new(TestBackend::new(90, 20)).unwrap();
        terminal
            .draw(|frame| {
                let area = frame.area();
                draw_upcoming_section(frame, area, section, 3, 0)
            })
            .unwrap();
        terminal.backend().buffer().clone()
    }

    fn text(buf: &Buffer) -> String {
        let mut out = String::new();
        for y in 0..buf.area.height {
            for x in 0..buf.area.width {
                out.push_str(buf[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    fn is_blank(buf: &Buffer) -> bool {
        text(buf).chars().all(char::is_whitespace)
    }

    #[tokio::test]
    async fn nothing_is_drawn_while_loading() {
        let mut section = section_with(Arc::new(
            MemoryStore::new().with_table(UPCOMING_TABLE, Vec::new()),
        ));
        section.mount();
        assert!(is_blank(&render(&section)));
    }

    #[tokio::test]
    async fn empty_result_draws_nothing() {
        let mut section = section_with(Arc::new(
            MemoryStore::new().with_table(UPCOMING_TABLE, Vec::new()),
        ));
        section.mount();
        section.settle().await;

        let buf = render(&section);
        assert!(is_blank(&buf));
        assert!(!text(&buf).contains(SECTION_TITLE));
    }

    #[tokio::test]
    async fn rejected_query_draws_nothing() {
        let mut section = section_with(Arc::new(RejectingStore));
        section.mount();
        section.settle().await;

        assert!(is_blank(&render(&section)));
    }

    #[tokio::test(start_paused = true)]
    async fn three_rows_draw_three_cards_in_order() {
        let store = MemoryStore::new().with_table(
            UPCOMING_TABLE,
            vec![
                json!({"id": "b", "title": "Second Feature", "content_type": "movie",
                       "release_date": "2026-10-21T08:00:00Z", "status": "upcoming"}),
                json!({"id": "a", "title": "First Feature", "content_type": "series",
                       "release_date": "2026-10-20T09:30:00Z", "status": "upcoming"}),
                json!({"id": "c", "title": "Third Feature", "content_type": "movie",
                       "release_date": "2026-10-22T08:00:00Z", "status": "upcoming"}),
            ],
        );
        let clock = Arc::new(SteppingClock(Mutex::new(FixedClock.now())));
        let mut section = UpcomingSection::new(
            Arc::new(store),
            clock.clone(),
            UPCOMING_TABLE,
            DEFAULT_TICK,
        );
        section.mount();
        section.settle().await;

        let rendered = text(&render(&section));
        assert!(rendered.contains(SECTION_TITLE));

        let first = rendered.find("First Feature").unwrap();
        let second = rendered.find("Second Feature").unwrap();
        let third = rendered.find("Third Feature").unwrap();
        assert!(first < second && second < third);
        assert!(!rendered.contains(AVAILABLE_NOW));
        assert_eq!(section.running_timers(), 3);

        // Each card carries its own countdown
        let cards = section.cards();
        assert_eq!(cards[0].countdown.to_string(), "1d 01h 30m 00s");
        assert_eq!(cards[1].countdown.to_string(), "2d 00h 00m 00s");
        assert_eq!(cards[2].countdown.to_string(), "3d 00h 00m 00s");

        let mut updates: Vec<_> = ["a", "b", "c"]
            .iter()
            .map(|id| section.timer(id).unwrap().subscribe())
            .collect();

        clock.advance(1);
        tokio::time::advance(DEFAULT_TICK).await;
        for receiver in &mut updates {
            receiver.changed().await.unwrap();
        }

        let cards = section.cards();
        assert_eq!(cards[0].countdown.to_string(), "1d 01h 29m 59s");
        assert_eq!(cards[1].countdown.to_string(), "1d 23h 59m 59s");
        assert_eq!(cards[2].countdown.to_string(), "2d 23h 59m 59s");
        assert!(text(&render(&section)).contains("59"));
    }

    fn render_app(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(90, 30)).unwrap();
        terminal.draw(|frame| draw(frame, app)).unwrap();
        text(terminal.backend().buffer())
    }

    #[tokio::test]
    async fn log_pane_shows_failures_only_when_toggled() {
        let mut section = section_with(Arc::new(RejectingStore));
        section.mount();
        let mut app = App::new(section, 3);
        while !app.async_tick().await {
            tokio::task::yield_now().await;
        }

        let hidden = render_app(&mut app);
        assert!(!hidden.contains(" Logs "));
        assert!(!hidden.contains("503"));
        assert!(!hidden.contains(SECTION_TITLE));

        app.show_logs = true;
        let shown = render_app(&mut app);
        assert!(shown.contains(" Logs "));
        assert!(shown.contains("Failed to load upcoming releases: 503"));
        assert!(!shown.contains(SECTION_TITLE));
    }

    #[tokio::test]
    async fn unparseable_date_renders_available_now() {
        let store = MemoryStore::new().with_table(
            UPCOMING_TABLE,
            vec![json!({"id": 1, "title": "Mystery", "content_type": "movie",
                        "release_date": "2026-12-01T00:00:00Z", "status": "upcoming"})],
        );
        let mut section = section_with(Arc::new(store));
        section.mount();
        section.settle().await;
        assert!(!text(&render(&section)).contains(AVAILABLE_NOW));

        let card = Card {
            item: &section.items()[0],
            countdown: crate::countdown::Countdown::for_target("TBA", FixedClock.now()),
        };
        let mut terminal = Terminal::new(TestBackend::new(40, 8)).unwrap();
        terminal
            .draw(|frame| {
                let area = frame.area();
                draw_card(frame, area, &card, false)
            })
            .unwrap();
        let rendered = text(terminal.backend().buffer());
        assert!(rendered.contains(AVAILABLE_NOW));
        assert!(!rendered.contains("Days"));
    }
}
