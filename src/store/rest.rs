// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::{Context, Result};
use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::{Filter, Query, RemoteStore};
use crate::config::BackendConfig;

const MAX_RESPONSE_BYTES: usize = 8 * 1024 * 1024;
const MAX_ERROR_BODY_BYTES: usize = 4 * 1024;

fn filter_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Reads at most `MAX_ERROR_BODY_BYTES` of a failed response's body.
async fn read_error_body(response: reqwest::Response) -> String {
    let mut body = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(Ok(chunk)) = futures_util::StreamExt::next(&mut stream).await {
        let room = MAX_ERROR_BODY_BYTES - body.len();
        body.extend_from_slice(&chunk[..chunk.len().min(room)]);
        if body.len() >= MAX_ERROR_BODY_BYTES {
            break;
        }
    }

    String::from_utf8_lossy(&body).into_owned()
}

/// Client for a PostgREST-style `/rest/v1` endpoint.
#[derive(Debug)]
pub struct RestStore {
    client: Client,
    base_url: Url,
    anon_key: String,
    show_progress: bool,
}

impl RestStore {
    pub fn new(server_url: &str, anon_key: impl Into<String>) -> Result<Self> {
        let mut base_url = Url::parse(server_url).with_context(|| "Invalid backend URL")?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Backend URL cannot be used as a base: {}", server_url);
        }

        // Url::join treats a path without a trailing slash as a file
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .user_agent(concat!("khmerzoon/", env!("CARGO_PKG_VERSION")))
                .build()?,
            base_url,
            anon_key: anon_key.into(),
            show_progress: false,
        })
    }

    pub fn from_config(config: &BackendConfig) -> Result<Self> {
        Self::new(&config.url, config.anon_key.clone())
    }

    pub fn enable_progress(&mut self) {
        self.show_progress = true;
    }

    pub fn request_url(&self, query: &Query) -> Result<Url> {
        let mut url = self
            .base_url
            .join(&format!("rest/v1/{}", query.table))
            .with_context(|| format!("Invalid table name: {}", query.table))?;

        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("select", "*");

            for filter in &query.filters {
                let (op, value) = match filter {
                    Filter::Eq(_, value) => ("eq", value),
                    Filter::Gte(_, value) => ("gte", value),
                };
                pairs.append_pair(filter.column(), &format!("{}.{}", op, filter_value(value)));
            }

            if let Some(order) = &query.order {
                let direction = if order.ascending { "asc" } else { "desc" };
                pairs.append_pair("order", &format!("{}.{}", order.column, direction));
            }

            if let Some(limit) = query.limit {
                pairs.append_pair("limit", &limit.to_string());
            }
        }

        Ok(url)
    }

    fn spinner(&self) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg} [{elapsed_precise}] {bytes}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Sending request...");
        pb
    }
}

#[async_trait]
impl RemoteStore for RestStore {
    async fn select(&self, query: &Query) -> Result<Vec<Value>> {
        let url = self.request_url(query)?;
        debug!("Requesting: {} (table: {})", url, query.table);

        let pb = self.spinner();

        let response = self
            .client
            .get(url.clone())
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .header("Accept", "application/json")
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url))?;

        if !response.status().is_success() {
            pb.finish_and_clear();
            let status = response.status();
            let body = read_error_body(response).await;
            return Err(anyhow::anyhow!(
                "HTTP request failed with status: {} {}",
                status,
                body.trim()
            ));
        }

        pb.set_message("Downloading...");

        let mut response_bytes = Vec::new();
        let mut stream = response.bytes_stream();

        while let Some(chunk_result) = futures_util::StreamExt::next(&mut stream).await {
            let chunk = chunk_result.with_context(|| "Failed to read response chunk")?;

            if response_bytes.len() + chunk.len() > MAX_RESPONSE_BYTES {
                pb.finish_and_clear();
                anyhow::bail!(
                    "Response from {} exceeds {} bytes",
                    query.table,
                    MAX_RESPONSE_BYTES
                );
            }

            response_bytes.extend_from_slice(&chunk);
            pb.set_position(response_bytes.len() as u64);
        }

        pb.finish_and_clear();
        debug!("Response size: {} bytes", response_bytes.len());

        if response_bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(anyhow::anyhow!("Empty response from server"));
        }

        let rows: Vec<Value> = serde_json::from_slice(&response_bytes).map_err(|e| {
            warn!(
                "JSON parsing failed at line {}, column {}: {}",
                e.line(),
                e.column(),
                e
            );
            anyhow::anyhow!("Failed to parse rows from {}: {}", query.table, e)
        })?;

        Ok(rows)
    }
}
