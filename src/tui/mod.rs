// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

pub mod app;
pub mod event;
pub mod ui;
pub mod widgets;

use anyhow::Result;
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io;
use std::time::Duration;

pub use app::{Action, App};
pub use event::{Event, EventHandler};

pub struct Tui {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    pub event_handler: EventHandler,
}

impl Tui {
    pub fn new(tick_ms: u64) -> Result<Self> {
        let backend = CrosstermBackend::new(io::stdout());
        let terminal = Terminal::new(backend)?;
        let event_handler = EventHandler::new(tick_ms);
        Ok(Self {
            terminal,
            event_handler,
        })
    }

    pub fn init(&mut self) -> Result<()> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen)?;
        self.terminal.hide_cursor()?;
        self.terminal.clear()?;
        Ok(())
    }

    pub fn draw(&mut self, app: &mut App) -> Result<()> {
        self.terminal.draw(|frame| ui::draw(frame, app))?;
        Ok(())
    }

    pub fn exit(&mut self) -> Result<()> {
        disable_raw_mode()?;
        execute!(io::stdout(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

pub async fn run_tui(mut app: App, tick_ms: u64) -> Result<()> {
    let mut tui = Tui::new(tick_ms)?;
    tui.init()?;

    app.start();
    let res = run_app(&mut tui, &mut app, tick_ms).await;

    tui.exit()?;

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

async fn run_app(tui: &mut Tui, app: &mut App, tick_ms: u64) -> Result<()> {
    tui.draw(app)?;

    loop {
        let event =
            tokio::time::timeout(Duration::from_millis(tick_ms), tui.event_handler.next()).await;

        let should_redraw = match event {
            Ok(Ok(Event::Key(key_event))) => {
                match app.handle_key_event(key_event).await {
                    Some(Action::Quit) => break,
                    Some(Action::Refresh) => app.refresh(),
                    None => {}
                }
                true
            }
            Ok(Ok(Event::Resize(_, _))) => true,
            // Countdowns advance on their own timers; ticks pick them up
            Ok(Ok(Event::Tick)) => {
                app.async_tick().await;
                true
            }
            Ok(Err(e)) => return Err(e),
            Err(_) => app.async_tick().await,
        };

        if should_redraw {
            tui.draw(app)?;
        }
    }

    Ok(())
}
