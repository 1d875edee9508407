// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::Result;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use khmerzoon::{CountdownTimer, SystemClock};

pub struct CountdownCommand {
    pub target: String,
    pub once: bool,
    pub period: Duration,
}

impl CountdownCommand {
    pub async fn execute(self) -> Result<()> {
        let timer = CountdownTimer::start(&self.target, Arc::new(SystemClock), self.period);

        if self.once {
            println!("{}", timer.latest());
            return Ok(());
        }

        let mut updates = timer.subscribe();
        let mut stdout = std::io::stdout();

        loop {
            let countdown = *updates.borrow_and_update();
            write!(stdout, "\r\x1b[2K{}", countdown)?;
            stdout.flush()?;

            if countdown.is_available() {
                break;
            }

            tokio::select! {
                changed = updates.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = tokio::signal::ctrl_c() => break,
            }
        }

        writeln!(stdout)?;
        Ok(())
    }
}
