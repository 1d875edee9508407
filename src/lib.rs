// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

pub mod config;
pub mod countdown;
pub mod models;
pub mod setup;
pub mod store;
pub mod tui;
pub mod upcoming;

pub use config::Config;
pub use countdown::{Clock, Countdown, CountdownTimer, SystemClock, TimeRemaining};
pub use models::{ContentType, ReleaseItem, ReleaseStatus};
pub use store::{MemoryStore, Query, RemoteStore, RestStore};
pub use tui::run_tui;
pub use upcoming::{FetchState, UpcomingSection};
