// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use super::{CommandContext, OutputFormat};
use anyhow::Result;
use chrono::Utc;
use serde_json::json;

use khmerzoon::Countdown;
use khmerzoon::upcoming::fetch_upcoming;

pub struct UpcomingCommand {
    pub format: OutputFormat,
}

impl UpcomingCommand {
    pub async fn execute(self, context: CommandContext) -> Result<()> {
        let store = context.store(matches!(self.format, OutputFormat::Text))?;
        let now = Utc::now();

        let items = fetch_upcoming(store.as_ref(), context.table(), now).await?;

        match self.format {
            OutputFormat::Json => {
                let results: Vec<_> = items
                    .iter()
                    .map(|item| {
                        let countdown = Countdown::for_target(&item.release_date, now);
                        let remaining = match countdown {
                            Countdown::Remaining(r) => json!({
                                "days": r.days,
                                "hours": r.hours,
                                "minutes": r.minutes,
                                "seconds": r.seconds,
                            }),
                            Countdown::AvailableNow => serde_json::Value::Null,
                        };
                        json!({
                            "item": item,
                            "remaining": remaining,
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&results)?);
            }
            OutputFormat::Text => {
                // An empty section has no output at all
                for item in &items {
                    println!(
                        "{:>8} | {:<6} | {:<32} | {}",
                        item.id,
                        item.content_type,
                        item.title,
                        Countdown::for_target(&item.release_date, now)
                    );
                }
            }
        }

        Ok(())
    }
}
