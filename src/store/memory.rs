// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;
use tracing::warn;

use super::{Filter, Query, RemoteStore};
use crate::models::parse_timestamp;

fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => {
            match (parse_timestamp(a), parse_timestamp(b)) {
                (Some(a), Some(b)) => Some(a.cmp(&b)),
                (None, None) => Some(a.cmp(b)),
                // Free text never orders against a timestamp
                _ => None,
            }
        }
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn matches(row: &Value, filter: &Filter) -> bool {
    let Some(cell) = row.get(filter.column()) else {
        return false;
    };

    match filter {
        Filter::Eq(_, expected) => compare_values(cell, expected) == Some(Ordering::Equal),
        Filter::Gte(_, bound) => matches!(
            compare_values(cell, bound),
            Some(Ordering::Greater | Ordering::Equal)
        ),
    }
}

/// Evaluates queries against rows held in memory, one table per key.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Vec<Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(self, table: impl Into<String>, rows: Vec<Value>) -> Self {
        self.insert_table(table, rows);
        self
    }

    pub fn insert_table(&self, table: impl Into<String>, rows: Vec<Value>) {
        let table = table.into();
        match self.tables.write() {
            Ok(mut tables) => {
                tables.insert(table, rows);
            }
            Err(poisoned) => {
                warn!("Memory store lock poisoned, recovering to insert {}", table);
                poisoned.into_inner().insert(table, rows);
                self.tables.clear_poison();
            }
        }
    }

    /// Loads a JSON array of rows from `path` as `table`.
    pub fn load_fixture<P: AsRef<Path>>(table: &str, path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).with_context(|| {
            format!("Failed to read fixture file: {}", path.as_ref().display())
        })?;

        let rows: Vec<Value> = serde_json::from_str(&content)
            .with_context(|| "Fixture file must contain a JSON array of rows")?;

        Ok(Self::new().with_table(table, rows))
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn select(&self, query: &Query) -> Result<Vec<Value>> {
        let tables = self
            .tables
            .read()
            .map_err(|_| anyhow::anyhow!("Memory store lock poisoned"))?;

        let rows = tables
            .get(&query.table)
            .ok_or_else(|| anyhow::anyhow!("Unknown table: {}", query.table))?;

        let mut selected: Vec<Value> = rows
            .iter()
            .filter(|row| query.filters.iter().all(|filter| matches(row, filter)))
            .cloned()
            .collect();

        if let Some(order) = &query.order {
            selected.sort_by(|a, b| {
                let ordering = match (a.get(&order.column), b.get(&order.column)) {
                    (Some(a), Some(b)) => compare_values(a, b).unwrap_or(Ordering::Equal),
                    // Nulls sort last, as Postgres does for ascending order
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                };
                if order.ascending {
                    ordering
                } else {
                    ordering.reverse()
                }
            });
        }

        if let Some(limit) = query.limit {
            selected.truncate(limit);
        }

        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn plans() -> MemoryStore {
        MemoryStore::new().with_table(
            "plans",
            vec![
                json!({"id": 1, "name": "Basic", "price": 2.99, "active": true}),
                json!({"id": 2, "name": "Premium", "price": 9.99, "active": true}),
                json!({"id": 3, "name": "Legacy", "price": 1.5, "active": false}),
                json!({"id": 4, "name": "Family", "price": 12, "active": true}),
            ],
        )
    }

    #[tokio::test]
    async fn filters_orders_and_limits() {
        let store = plans();
        let rows = store
            .select(
                &Query::table("plans")
                    .eq("active", true)
                    .gte("price", 2.99)
                    .order_desc("price")
                    .limit(2),
            )
            .await
            .unwrap();

        let names: Vec<&str> = rows.iter().filter_map(|r| r["name"].as_str()).collect();
        assert_eq!(names, vec!["Family", "Premium"]);
    }

    #[tokio::test]
    async fn timestamps_compare_as_instants() {
        let store = MemoryStore::new().with_table(
            "events",
            vec![
                json!({"id": "a", "at": "2026-10-19T09:00:00+02:00"}),
                json!({"id": "b", "at": "2026-10-19T08:00:00Z"}),
                json!({"id": "c", "at": "2026-10-19T06:59:59Z"}),
            ],
        );

        let rows = store
            .select(
                &Query::table("events")
                    .gte("at", "2026-10-19T07:00:00Z")
                    .order_asc("at"),
            )
            .await
            .unwrap();

        let ids: Vec<&str> = rows.iter().filter_map(|r| r["id"].as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn undated_text_never_passes_a_timestamp_bound() {
        let store = MemoryStore::new().with_table(
            "events",
            vec![
                json!({"id": "tba", "at": "TBA"}),
                json!({"id": "old", "at": "2020-01-01T00:00:00Z"}),
                json!({"id": "next", "at": "2026-10-20T00:00:00Z"}),
            ],
        );

        let rows = store
            .select(&Query::table("events").gte("at", "2026-10-19T08:00:00.000Z"))
            .await
            .unwrap();

        let ids: Vec<&str> = rows.iter().filter_map(|r| r["id"].as_str()).collect();
        assert_eq!(ids, vec!["next"]);
    }

    #[test]
    fn insert_recovers_from_a_poisoned_lock() {
        let store = MemoryStore::new();
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = store.tables.write().unwrap();
            panic!("poison the lock");
        }));
        assert!(store.tables.is_poisoned());

        store.insert_table("events", vec![json!({"id": 1})]);
        assert!(!store.tables.is_poisoned());
        assert_eq!(store.tables.read().unwrap()["events"].len(), 1);
    }

    #[tokio::test]
    async fn missing_column_never_matches() {
        let store = plans();
        let rows = store
            .select(&Query::table("plans").eq("tier", "gold"))
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn unknown_table_is_an_error() {
        let store = plans();
        let err = store.select(&Query::table("users")).await.unwrap_err();
        assert!(err.to_string().contains("Unknown table"));
    }

    #[test]
    fn loads_fixture_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.json");
        std::fs::write(&path, r#"[{"id": 1}, {"id": 2}]"#).unwrap();

        let store = MemoryStore::load_fixture("upcoming_releases", &path).unwrap();
        let tables = store.tables.read().unwrap();
        assert_eq!(tables["upcoming_releases"].len(), 2);
    }

    #[test]
    fn rejects_non_array_fixture() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.json");
        std::fs::write(&path, r#"{"id": 1}"#).unwrap();

        assert!(MemoryStore::load_fixture("upcoming_releases", &path).is_err());
    }
}
