// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::countdown::{Clock, Countdown, CountdownTimer};
use crate::models::ReleaseItem;
use crate::store::{Query, RemoteStore};

pub const UPCOMING_TABLE: &str = "upcoming_releases";
pub const UPCOMING_LIMIT: usize = 10;
pub const SECTION_TITLE: &str = "Upcoming Releases";

/// The fixed upcoming-releases query, with the lower bound frozen at `now`.
pub fn upcoming_query(table: &str, now: DateTime<Utc>) -> Query {
    Query::table(table)
        .eq("status", "upcoming")
        .gte("release_date", now.to_rfc3339_opts(SecondsFormat::Millis, true))
        .order_asc("release_date")
        .limit(UPCOMING_LIMIT)
}

pub async fn fetch_upcoming(
    store: &dyn RemoteStore,
    table: &str,
    now: DateTime<Utc>,
) -> Result<Vec<ReleaseItem>> {
    let rows = store.select(&upcoming_query(table, now)).await?;

    let items = rows
        .into_iter()
        .filter_map(|row| match serde_json::from_value::<ReleaseItem>(row) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!("Skipping malformed upcoming release row: {}", e);
                None
            }
        })
        .collect::<Vec<_>>();

    debug!("Fetched {} upcoming releases", items.len());
    Ok(items)
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchState {
    Idle,
    Loading,
    Success(Vec<ReleaseItem>),
    Error(String),
}

#[derive(Debug, Clone, Copy)]
pub struct Card<'a> {
    pub item: &'a ReleaseItem,
    pub countdown: Countdown,
}

/// View model for the upcoming-releases section. One fetch per mount or
/// refresh, one countdown timer per fetched item.
pub struct UpcomingSection {
    store: Arc<dyn RemoteStore>,
    clock: Arc<dyn Clock>,
    table: String,
    countdown_period: Duration,
    state: FetchState,
    pending: Option<JoinHandle<Result<Vec<ReleaseItem>>>>,
    timers: Vec<CountdownTimer>,
}

impl UpcomingSection {
    pub fn new(
        store: Arc<dyn RemoteStore>,
        clock: Arc<dyn Clock>,
        table: impl Into<String>,
        countdown_period: Duration,
    ) -> Self {
        Self {
            store,
            clock,
            table: table.into(),
            countdown_period,
            state: FetchState::Idle,
            pending: None,
            timers: Vec::new(),
        }
    }

    pub fn state(&self) -> &FetchState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, FetchState::Loading)
    }

    /// Starts the fetch. Ignored if one is already in flight or the
    /// section has settled.
    pub fn mount(&mut self) {
        if matches!(self.state, FetchState::Idle) {
            self.start_fetch();
        }
    }

    /// Re-runs the query regardless of the current state.
    pub fn refresh(&mut self) {
        self.cancel_pending();
        self.start_fetch();
    }

    fn start_fetch(&mut self) {
        let store = self.store.clone();
        let table = self.table.clone();
        let now = self.clock.now();

        debug!("Fetching upcoming releases from {} as of {}", table, now);
        self.state = FetchState::Loading;
        self.pending = Some(tokio::spawn(async move {
            fetch_upcoming(store.as_ref(), &table, now).await
        }));
    }

    fn cancel_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }

    /// Collects a finished fetch. Returns true when the state changed.
    pub async fn poll(&mut self) -> bool {
        let finished = self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.is_finished());

        if finished { self.settle().await } else { false }
    }

    /// Waits for the in-flight fetch, if any. Returns true when the state
    /// changed.
    pub async fn settle(&mut self) -> bool {
        let Some(pending) = self.pending.take() else {
            return false;
        };

        let outcome = match pending.await {
            Ok(result) => result,
            Err(e) => Err(anyhow::anyhow!("Fetch task failed: {}", e)),
        };

        self.timers.clear();
        match outcome {
            Ok(items) => {
                self.timers = items
                    .iter()
                    .map(|item| {
                        CountdownTimer::start(
                            &item.release_date,
                            self.clock.clone(),
                            self.countdown_period,
                        )
                    })
                    .collect();
                self.state = FetchState::Success(items);
            }
            Err(e) => {
                warn!("Failed to load upcoming releases: {:#}", e);
                self.state = FetchState::Error(format!("{:#}", e));
            }
        }

        true
    }

    pub fn items(&self) -> &[ReleaseItem] {
        match &self.state {
            FetchState::Success(items) => items,
            _ => &[],
        }
    }

    /// The section only renders for a non-empty successful fetch.
    pub fn is_visible(&self) -> bool {
        !self.items().is_empty()
    }

    pub fn cards(&self) -> Vec<Card<'_>> {
        self.items()
            .iter()
            .zip(&self.timers)
            .map(|(item, timer)| Card {
                item,
                countdown: timer.latest(),
            })
            .collect()
    }

    pub fn timer(&self, id: &str) -> Option<&CountdownTimer> {
        self.items()
            .iter()
            .position(|item| item.id == id)
            .and_then(|index| self.timers.get(index))
    }

    pub fn running_timers(&self) -> usize {
        self.timers.iter().filter(|t| t.is_running()).count()
    }
}

impl Drop for UpcomingSection {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}
