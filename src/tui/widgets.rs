// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use crate::countdown::{AVAILABLE_NOW, Countdown};

pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Four-cell days/hours/minutes/seconds grid, or the availability notice.
pub struct CountdownGrid {
    countdown: Countdown,
}

impl CountdownGrid {
    pub fn new(countdown: Countdown) -> Self {
        Self { countdown }
    }
}

impl Widget for CountdownGrid {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let remaining = match self.countdown {
            Countdown::Remaining(remaining) => remaining,
            Countdown::AvailableNow => {
                Paragraph::new(AVAILABLE_NOW)
                    .style(
                        Style::default()
                            .fg(Color::Green)
                            .add_modifier(Modifier::BOLD),
                    )
                    .alignment(Alignment::Center)
                    .render(area, buf);
                return;
            }
        };

        let cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 4); 4])
            .split(area);

        let values = [
            (remaining.days, "Days"),
            (remaining.hours, "Hours"),
            (remaining.minutes, "Min"),
            (remaining.seconds, "Sec"),
        ];

        for ((value, label), cell) in values.iter().zip(cells.iter()) {
            Paragraph::new(vec![
                Line::from(Span::styled(
                    format!("{:02}", value),
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(*label, Style::default().fg(Color::DarkGray))),
            ])
            .alignment(Alignment::Center)
            .render(*cell, buf);
        }
    }
}

pub fn get_help_lines() -> Vec<Line<'static>> {
    vec![
        Line::from(""),
        Line::from(vec![Span::styled(
            "KHMERZOON - Help",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Navigation:",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )]),
        Line::from("  ←/h →/l   - Previous / next release"),
        Line::from("  ↑/k ↓/j   - Move a row up / down"),
        Line::from("  Home/End  - Jump to first / last"),
        Line::from("  Enter     - Show release details"),
        Line::from("  r         - Reload upcoming releases"),
        Line::from("  L         - Toggle the log pane"),
        Line::from("  q/Esc     - Quit application"),
        Line::from("  ?/F1      - Toggle this help"),
        Line::from("  Ctrl+C    - Force quit"),
        Line::from(""),
        Line::from("Press Esc, ? or F1 to close this help"),
    ]
}

pub fn create_help_widget() -> Paragraph<'static> {
    Paragraph::new(get_help_lines())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Blue))
                .title(" Help "),
        )
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: false })
}
