//! List table columns and cell rendering.
//!
//! The list view shows a fixed column set: Name, Kind, Group, Age, Namespace, Shard.
//! Cells are rendered from the raw resource; anything missing renders as `-`.

#![forbid(unsafe_code)]

use chrono::{DateTime, Utc};

use crate::Resource;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    Name,
    Kind,
    Group,
    Age,
    Namespace,
    Shard,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnSpec {
    pub kind: ColumnKind,
    pub label: &'static str,
    /// Minimum width in characters for plain-text tables.
    pub width: usize,
}

fn col(kind: ColumnKind, label: &'static str, width: usize) -> ColumnSpec {
    ColumnSpec { kind, label, width }
}

/// Columns of the resource list, in display order.
pub fn list_columns() -> Vec<ColumnSpec> {
    vec![
        col(ColumnKind::Name, "NAME", 24),
        col(ColumnKind::Kind, "KIND", 14),
        col(ColumnKind::Group, "GROUP", 16),
        col(ColumnKind::Age, "AGE", 5),
        col(ColumnKind::Namespace, "NAMESPACE", 14),
        col(ColumnKind::Shard, "SHARD", 6),
    ]
}

/// Render one cell of a row.
pub fn render_cell(r: &Resource, kind: ColumnKind, now: DateTime<Utc>) -> String {
    let s = match kind {
        ColumnKind::Name => r.name().map(str::to_string),
        ColumnKind::Kind => r.kind().map(str::to_string),
        ColumnKind::Group => r.resource_group().map(str::to_string),
        ColumnKind::Age => return render_age(r.created_at(), now),
        ColumnKind::Namespace => r.namespace().map(str::to_string),
        ColumnKind::Shard => r.shard_id(),
    };
    s.unwrap_or_else(|| "-".to_string())
}

/// Compact age of a `created_at` timestamp: `42m`, `3h`, `5d`.
///
/// Missing or unparsable timestamps render as `-`; timestamps in the future clamp to `0m`.
pub fn render_age(created_at: Option<&str>, now: DateTime<Utc>) -> String {
    let Some(ts) = created_at.and_then(parse_ts) else { return "-".to_string() };
    let minutes = (now - ts).num_minutes().max(0);
    if minutes < 60 { return format!("{}m", minutes); }
    let hours = minutes / 60;
    if hours < 24 { return format!("{}h", hours); }
    format!("{}d", hours / 24)
}

fn parse_ts(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Backends commonly emit naive UTC timestamps without an offset
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|n| n.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-05-10T12:00:00Z").unwrap().with_timezone(&Utc)
    }

    #[test]
    fn age_buckets() {
        assert_eq!(render_age(Some("2024-05-10T11:18:00Z"), now()), "42m");
        assert_eq!(render_age(Some("2024-05-10T09:00:00Z"), now()), "3h");
        assert_eq!(render_age(Some("2024-05-05T11:00:00Z"), now()), "5d");
        assert_eq!(render_age(Some("2024-05-10T12:00:00.123456"), now()), "0m");
    }

    #[test]
    fn age_missing_or_garbage_is_dash() {
        assert_eq!(render_age(None, now()), "-");
        assert_eq!(render_age(Some("yesterday"), now()), "-");
    }

    #[test]
    fn future_timestamps_clamp() {
        assert_eq!(render_age(Some("2024-05-11T12:00:00Z"), now()), "0m");
    }

    #[test]
    fn cells_fall_back_to_dash() {
        let r = Resource::try_from(json!({"name": "web", "kind": "pod", "shard_id": 3})).unwrap();
        assert_eq!(render_cell(&r, ColumnKind::Name, now()), "web");
        assert_eq!(render_cell(&r, ColumnKind::Group, now()), "-");
        assert_eq!(render_cell(&r, ColumnKind::Shard, now()), "3");
        assert_eq!(render_cell(&r, ColumnKind::Age, now()), "-");
    }
}
