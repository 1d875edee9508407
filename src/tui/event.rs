// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::Result;
use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub enum Event {
    Tick,
    Key(KeyEvent),
    Resize(u16, u16),
}

/// Forwards terminal input on a channel, interleaved with periodic ticks.
pub struct EventHandler {
    receiver: mpsc::UnboundedReceiver<Event>,
    task: JoinHandle<()>,
}

impl EventHandler {
    pub fn new(tick_rate: u64) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(tick_rate));
            loop {
                // crossterm polling blocks, keep it off the async workers
                let polled = tokio::task::spawn_blocking(|| {
                    if event::poll(Duration::from_millis(50)).unwrap_or(false) {
                        event::read().ok()
                    } else {
                        None
                    }
                })
                .await
                .unwrap_or(None);

                let event = match polled {
                    Some(CrosstermEvent::Key(key)) if key.kind != KeyEventKind::Release => {
                        Some(Event::Key(key))
                    }
                    Some(CrosstermEvent::Resize(width, height)) => {
                        Some(Event::Resize(width, height))
                    }
                    _ => None,
                };

                if let Some(event) = event {
                    if sender.send(event).is_err() {
                        break;
                    }
                    continue;
                }

                interval.tick().await;
                if sender.send(Event::Tick).is_err() {
                    break;
                }
            }
        });

        Self { receiver, task }
    }

    pub async fn next(&mut self) -> Result<Event> {
        self.receiver
            .recv()
            .await
            .ok_or_else(|| anyhow::anyhow!("Event channel closed"))
    }
}

impl Drop for EventHandler {
    fn drop(&mut self) {
        self.task.abort();
    }
}
