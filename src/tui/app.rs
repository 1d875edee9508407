// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::upcoming::{FetchState, UpcomingSection};

const MAX_LOGS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Quit,
    Refresh,
}

pub struct App {
    pub section: UpcomingSection,
    pub card_columns: usize,
    pub selected_index: usize,
    pub show_help: bool,
    pub show_detail: bool,
    pub show_logs: bool,
    pub status_message: Option<String>,
    pub logs: Vec<(DateTime<Local>, String)>,
}

impl App {
    pub fn new(section: UpcomingSection, card_columns: u16) -> Self {
        Self {
            section,
            card_columns: usize::from(card_columns.max(1)),
            selected_index: 0,
            show_help: false,
            show_detail: false,
            show_logs: false,
            status_message: None,
            logs: Vec::new(),
        }
    }

    pub fn add_log(&mut self, message: String) {
        tracing::debug!("{}", message);
        self.logs.push((Local::now(), message));
        if self.logs.len() > MAX_LOGS {
            self.logs.remove(0);
        }
    }

    pub fn start(&mut self) {
        self.section.mount();
        self.status_message = Some("Loading upcoming releases...".to_string());
    }

    pub fn refresh(&mut self) {
        self.section.refresh();
        self.show_detail = false;
        self.status_message = Some("Reloading upcoming releases...".to_string());
        self.add_log("Refreshing upcoming releases".to_string());
    }

    /// Collects background work. Returns true if a redraw is needed.
    pub async fn async_tick(&mut self) -> bool {
        if !self.section.poll().await {
            return false;
        }

        match self.section.state() {
            FetchState::Success(items) => {
                let count = items.len();
                self.status_message = None;
                self.add_log(format!("Loaded {} upcoming releases", count));
            }
            FetchState::Error(e) => {
                let message = format!("Failed to load upcoming releases: {}", e);
                self.status_message = None;
                self.add_log(message);
            }
            FetchState::Idle | FetchState::Loading => {}
        }

        let count = self.section.items().len();
        if count == 0 {
            self.selected_index = 0;
            self.show_detail = false;
        } else if self.selected_index >= count {
            self.selected_index = count - 1;
        }

        true
    }

    pub fn selected_item(&self) -> Option<&crate::models::ReleaseItem> {
        self.section.items().get(self.selected_index)
    }

    fn move_selection(&mut self, delta: isize) {
        let count = self.section.items().len();
        if count == 0 {
            return;
        }
        let target = self.selected_index as isize + delta;
        self.selected_index = target.clamp(0, count as isize - 1) as usize;
    }

    pub async fn handle_key_event(&mut self, key: KeyEvent) -> Option<Action> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Some(Action::Quit);
        }

        if self.show_help {
            if matches!(
                key.code,
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::F(1) | KeyCode::Char('q')
            ) {
                self.show_help = false;
            }
            return None;
        }

        if self.show_detail {
            if matches!(
                key.code,
                KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') | KeyCode::Backspace
            ) {
                self.show_detail = false;
            }
            return None;
        }

        let columns = self.card_columns as isize;
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Some(Action::Quit),
            KeyCode::Char('?') | KeyCode::F(1) => self.show_help = true,
            KeyCode::Char('L') => self.show_logs = !self.show_logs,
            KeyCode::Char('r') => return Some(Action::Refresh),
            KeyCode::Left | KeyCode::Char('h') => self.move_selection(-1),
            KeyCode::Right | KeyCode::Char('l') => self.move_selection(1),
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(-columns),
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(columns),
            KeyCode::Home => self.selected_index = 0,
            KeyCode::End => {
                self.selected_index = self.section.items().len().saturating_sub(1);
            }
            KeyCode::Enter => {
                if self.selected_item().is_some() {
                    self.show_detail = true;
                }
            }
            _ => {}
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::countdown::{Clock, DEFAULT_TICK};
    use crate::store::MemoryStore;
    use crate::upcoming::UPCOMING_TABLE;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use std::sync::Arc;

    struct FixedClock;

    impl Clock for FixedClock {
        fn now(&self) -> chrono::DateTime<Utc> {
            Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).unwrap()
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    async fn loaded_app(count: u32) -> App {
        let rows = (1..=count)
            .map(|i| {
                json!({
                    "id": i,
                    "title": format!("Release {}", i),
                    "content_type": "movie",
                    "release_date": format!("2026-11-{:02}T00:00:00Z", i),
                    "status": "upcoming",
                })
            })
            .collect();
        let section = UpcomingSection::new(
            Arc::new(MemoryStore::new().with_table(UPCOMING_TABLE, rows)),
            Arc::new(FixedClock),
            UPCOMING_TABLE,
            DEFAULT_TICK,
        );
        let mut app = App::new(section, 3);
        app.start();
        while !app.async_tick().await {
            tokio::task::yield_now().await;
        }
        app
    }

    #[tokio::test]
    async fn loading_clears_status() {
        let app = loaded_app(2).await;
        assert_eq!(app.status_message, None);
        assert_eq!(app.logs.last().unwrap().1, "Loaded 2 upcoming releases");
    }

    #[tokio::test]
    async fn log_pane_toggles() {
        let mut app = loaded_app(1).await;
        assert!(!app.show_logs);

        app.handle_key_event(key(KeyCode::Char('L'))).await;
        assert!(app.show_logs);
        app.handle_key_event(key(KeyCode::Char('L'))).await;
        assert!(!app.show_logs);
    }

    #[test]
    fn log_buffer_is_bounded() {
        let section = UpcomingSection::new(
            Arc::new(MemoryStore::new()),
            Arc::new(FixedClock),
            UPCOMING_TABLE,
            DEFAULT_TICK,
        );
        let mut app = App::new(section, 3);
        for i in 0..(MAX_LOGS + 5) {
            app.add_log(format!("entry {}", i));
        }

        assert_eq!(app.logs.len(), MAX_LOGS);
        assert_eq!(app.logs[0].1, "entry 5");
    }

    #[tokio::test]
    async fn selection_moves_within_grid() {
        let mut app = loaded_app(7).await;

        app.handle_key_event(key(KeyCode::Down)).await;
        assert_eq!(app.selected_index, 3);
        app.handle_key_event(key(KeyCode::Right)).await;
        assert_eq!(app.selected_index, 4);
        app.handle_key_event(key(KeyCode::Down)).await;
        assert_eq!(app.selected_index, 6);
        app.handle_key_event(key(KeyCode::Home)).await;
        assert_eq!(app.selected_index, 0);
        app.handle_key_event(key(KeyCode::Left)).await;
        assert_eq!(app.selected_index, 0);
        app.handle_key_event(key(KeyCode::End)).await;
        assert_eq!(app.selected_index, 6);
    }

    #[tokio::test]
    async fn detail_and_help_capture_keys() {
        let mut app = loaded_app(2).await;

        app.handle_key_event(key(KeyCode::Enter)).await;
        assert!(app.show_detail);
        assert_eq!(app.handle_key_event(key(KeyCode::Char('q'))).await, None);
        assert!(!app.show_detail);

        app.handle_key_event(key(KeyCode::Char('?'))).await;
        assert!(app.show_help);
        assert_eq!(app.handle_key_event(key(KeyCode::Char('r'))).await, None);
        app.handle_key_event(key(KeyCode::Esc)).await;
        assert!(!app.show_help);

        assert_eq!(
            app.handle_key_event(key(KeyCode::Char('r'))).await,
            Some(Action::Refresh)
        );
        assert_eq!(
            app.handle_key_event(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL))
                .await,
            Some(Action::Quit)
        );
    }
}
